mod apply;
mod invariants;
mod maintenance;

use std::collections::BTreeSet;

use log::debug;

use muse_common::{
    asset::{Asset, AssetId, Price},
    config::{
        DEFAULT_MBD_INTEREST_RATE, HUNDRED_PERCENT, MAINNET_CHAIN_ID, MAX_PROXY_RECURSION_DEPTH,
        MBD_INTEREST_COMPOUND_INTERVAL_SEC, MBD_SYMBOL, MUSE_SYMBOL, NULL_ACCOUNT,
    },
    crypto::Hash,
    operation::Operation,
    time::TimePointSec,
};

use crate::{
    db::{MultiIndex, Table, UniqueIndex},
    error::BlockchainError,
    fork::ForkDatabase,
    object::*,
};

/// The typed, indexed, in-memory object store plus everything needed to
/// drive deterministic block application: undo sessions, fork history and
/// the virtual-operation stream.
///
/// Exactly one block or transaction application runs at a time; sessions
/// are strictly LIFO and must not cross threads.
pub struct Database {
    chain_id: Hash,

    pub accounts: Table<AccountObject>,
    pub assets: Table<AssetObject>,
    pub contents: Table<ContentObject>,
    pub content_votes: Table<ContentVoteObject>,
    pub content_approvals: Table<ContentApproveObject>,
    pub witnesses: Table<WitnessObject>,
    pub witness_votes: Table<WitnessVoteObject>,
    pub witness_schedules: Table<WitnessScheduleObject>,
    pub streaming_platforms: Table<StreamingPlatformObject>,
    pub streaming_platform_votes: Table<StreamingPlatformVoteObject>,
    pub reports: Table<ReportObject>,
    pub limit_orders: Table<LimitOrderObject>,
    pub convert_requests: Table<ConvertRequestObject>,
    pub feed_histories: Table<FeedHistoryObject>,
    pub proposals: Table<ProposalObject>,
    pub escrows: Table<EscrowObject>,
    pub recovery_requests: Table<AccountRecoveryRequestObject>,
    pub owner_authority_histories: Table<OwnerAuthorityHistoryObject>,
    pub change_recovery_requests: Table<ChangeRecoveryAccountRequestObject>,
    pub withdraw_routes: Table<WithdrawVestingRouteObject>,
    pub balances: Table<BalanceObject>,
    pub block_summaries: Table<BlockSummaryObject>,
    pub transactions: Table<TransactionObject>,
    pub dynamic_globals: Table<DynamicGlobalPropertyObject>,

    pub(crate) fork_db: ForkDatabase,
    // history stream of applier-emitted operations, (block_num, op)
    virtual_operations: Vec<(u32, Operation)>,
    // block currently being applied, 0 outside block application
    pub(crate) applying_block_num: u32,
}

// Runs a table method on every table; the session layer keeps all undo
// stacks moving in lockstep. The `?` form propagates per-table errors.
macro_rules! for_each_table {
    ($db:expr, $method:ident $(, $fallible:tt)?) => {{
        for_each_table!(@one $db, $method $(, $fallible)?; accounts);
        for_each_table!(@one $db, $method $(, $fallible)?; assets);
        for_each_table!(@one $db, $method $(, $fallible)?; contents);
        for_each_table!(@one $db, $method $(, $fallible)?; content_votes);
        for_each_table!(@one $db, $method $(, $fallible)?; content_approvals);
        for_each_table!(@one $db, $method $(, $fallible)?; witnesses);
        for_each_table!(@one $db, $method $(, $fallible)?; witness_votes);
        for_each_table!(@one $db, $method $(, $fallible)?; witness_schedules);
        for_each_table!(@one $db, $method $(, $fallible)?; streaming_platforms);
        for_each_table!(@one $db, $method $(, $fallible)?; streaming_platform_votes);
        for_each_table!(@one $db, $method $(, $fallible)?; reports);
        for_each_table!(@one $db, $method $(, $fallible)?; limit_orders);
        for_each_table!(@one $db, $method $(, $fallible)?; convert_requests);
        for_each_table!(@one $db, $method $(, $fallible)?; feed_histories);
        for_each_table!(@one $db, $method $(, $fallible)?; proposals);
        for_each_table!(@one $db, $method $(, $fallible)?; escrows);
        for_each_table!(@one $db, $method $(, $fallible)?; recovery_requests);
        for_each_table!(@one $db, $method $(, $fallible)?; owner_authority_histories);
        for_each_table!(@one $db, $method $(, $fallible)?; change_recovery_requests);
        for_each_table!(@one $db, $method $(, $fallible)?; withdraw_routes);
        for_each_table!(@one $db, $method $(, $fallible)?; balances);
        for_each_table!(@one $db, $method $(, $fallible)?; block_summaries);
        for_each_table!(@one $db, $method $(, $fallible)?; transactions);
        for_each_table!(@one $db, $method $(, $fallible)?; dynamic_globals);
    }};
    (@one $db:expr, $method:ident; $field:ident) => {
        $db.$field.$method();
    };
    (@one $db:expr, $method:ident, ?; $field:ident) => {
        $db.$field.$method()?;
    };
}

// Secondary-index projections; plain functions so the generic indices
// stay pure and deterministic.
fn account_by_name(account: &AccountObject) -> String {
    account.name.clone()
}

fn account_by_next_withdrawal(account: &AccountObject) -> BTreeSet<TimePointSec> {
    std::iter::once(account.next_vesting_withdrawal).collect()
}

fn asset_by_symbol(asset: &AssetObject) -> String {
    asset.symbol.clone()
}

fn content_by_url(content: &ContentObject) -> String {
    content.url.clone()
}

fn content_vote_by_pair(vote: &ContentVoteObject) -> (u64, String) {
    (vote.content, vote.voter.clone())
}

fn content_approval_by_pair(approval: &ContentApproveObject) -> (String, String) {
    (approval.content.clone(), approval.approver.clone())
}

fn witness_by_owner(witness: &WitnessObject) -> String {
    witness.owner.clone()
}

fn witness_vote_by_pair(vote: &WitnessVoteObject) -> (String, String) {
    (vote.account.clone(), vote.witness.clone())
}

fn platform_by_owner(platform: &StreamingPlatformObject) -> String {
    platform.owner.clone()
}

fn platform_vote_by_pair(vote: &StreamingPlatformVoteObject) -> (String, String) {
    (vote.account.clone(), vote.streaming_platform.clone())
}

fn report_by_created(report: &ReportObject) -> BTreeSet<TimePointSec> {
    std::iter::once(report.created).collect()
}

fn order_by_account(order: &LimitOrderObject) -> (String, u32) {
    (order.seller.clone(), order.order_id)
}

fn order_by_price(order: &LimitOrderObject) -> (Price, u64) {
    (order.sell_price, order.id)
}

fn order_by_expiration(order: &LimitOrderObject) -> BTreeSet<TimePointSec> {
    std::iter::once(order.expiration).collect()
}

fn convert_by_account(request: &ConvertRequestObject) -> (String, u32) {
    (request.owner.clone(), request.request_id)
}

fn convert_by_date(request: &ConvertRequestObject) -> BTreeSet<TimePointSec> {
    std::iter::once(request.conversion_date).collect()
}

fn proposal_by_expiration(proposal: &ProposalObject) -> BTreeSet<TimePointSec> {
    std::iter::once(proposal.expiration_time).collect()
}

fn escrow_by_pair(escrow: &EscrowObject) -> (String, u32) {
    (escrow.from.clone(), escrow.escrow_id)
}

fn recovery_by_account(request: &AccountRecoveryRequestObject) -> String {
    request.account_to_recover.clone()
}

fn recovery_by_expiration(request: &AccountRecoveryRequestObject) -> BTreeSet<TimePointSec> {
    std::iter::once(request.expires).collect()
}

fn owner_history_by_account(history: &OwnerAuthorityHistoryObject) -> BTreeSet<String> {
    std::iter::once(history.account.clone()).collect()
}

fn change_recovery_by_account(request: &ChangeRecoveryAccountRequestObject) -> String {
    request.account_to_recover.clone()
}

fn change_recovery_by_effective(
    request: &ChangeRecoveryAccountRequestObject,
) -> BTreeSet<TimePointSec> {
    std::iter::once(request.effective_on).collect()
}

fn route_by_pair(route: &WithdrawVestingRouteObject) -> (String, String) {
    (route.from_account.clone(), route.to_account.clone())
}

fn route_by_from(route: &WithdrawVestingRouteObject) -> BTreeSet<String> {
    std::iter::once(route.from_account.clone()).collect()
}

fn transaction_by_id(tx: &TransactionObject) -> Hash {
    tx.trx_id.clone()
}

fn transaction_by_expiration(tx: &TransactionObject) -> BTreeSet<TimePointSec> {
    std::iter::once(tx.expiration).collect()
}

impl Database {
    pub fn new(chain_id: Hash) -> Self {
        let mut db = Database {
            chain_id,
            accounts: Table::default(),
            assets: Table::default(),
            contents: Table::default(),
            content_votes: Table::default(),
            content_approvals: Table::default(),
            witnesses: Table::default(),
            witness_votes: Table::default(),
            witness_schedules: Table::default(),
            streaming_platforms: Table::default(),
            streaming_platform_votes: Table::default(),
            reports: Table::default(),
            limit_orders: Table::default(),
            convert_requests: Table::default(),
            feed_histories: Table::default(),
            proposals: Table::default(),
            escrows: Table::default(),
            recovery_requests: Table::default(),
            owner_authority_histories: Table::default(),
            change_recovery_requests: Table::default(),
            withdraw_routes: Table::default(),
            balances: Table::default(),
            block_summaries: Table::default(),
            transactions: Table::default(),
            dynamic_globals: Table::default(),
            fork_db: ForkDatabase::default(),
            virtual_operations: Vec::new(),
            applying_block_num: 0,
        };

        db.accounts.register_index(UniqueIndex::new(account_by_name));
        db.accounts
            .register_index(MultiIndex::new(account_by_next_withdrawal));
        db.assets.register_index(UniqueIndex::new(asset_by_symbol));
        db.contents.register_index(UniqueIndex::new(content_by_url));
        db.contents.register_index(content_by_genre_index());
        db.contents.register_index(content_by_category_index());
        db.content_votes
            .register_index(UniqueIndex::new(content_vote_by_pair));
        db.content_approvals
            .register_index(UniqueIndex::new(content_approval_by_pair));
        db.witnesses.register_index(UniqueIndex::new(witness_by_owner));
        db.witness_votes
            .register_index(UniqueIndex::new(witness_vote_by_pair));
        db.streaming_platforms
            .register_index(UniqueIndex::new(platform_by_owner));
        db.streaming_platform_votes
            .register_index(UniqueIndex::new(platform_vote_by_pair));
        db.reports.register_index(MultiIndex::new(report_by_created));
        db.limit_orders
            .register_index(UniqueIndex::new(order_by_account));
        db.limit_orders.register_index(UniqueIndex::new(order_by_price));
        db.limit_orders
            .register_index(MultiIndex::new(order_by_expiration));
        db.convert_requests
            .register_index(UniqueIndex::new(convert_by_account));
        db.convert_requests
            .register_index(MultiIndex::new(convert_by_date));
        db.proposals
            .register_index(MultiIndex::new(proposal_by_expiration));
        db.escrows.register_index(UniqueIndex::new(escrow_by_pair));
        db.recovery_requests
            .register_index(UniqueIndex::new(recovery_by_account));
        db.recovery_requests
            .register_index(MultiIndex::new(recovery_by_expiration));
        db.owner_authority_histories
            .register_index(MultiIndex::new(owner_history_by_account));
        db.change_recovery_requests
            .register_index(UniqueIndex::new(change_recovery_by_account));
        db.change_recovery_requests
            .register_index(MultiIndex::new(change_recovery_by_effective));
        db.withdraw_routes
            .register_index(UniqueIndex::new(route_by_pair));
        db.withdraw_routes.register_index(MultiIndex::new(route_by_from));
        db.transactions
            .register_index(UniqueIndex::new(transaction_by_id));
        db.transactions
            .register_index(MultiIndex::new(transaction_by_expiration));

        db
    }

    pub fn mainnet() -> Self {
        Database::new(MAINNET_CHAIN_ID.clone())
    }

    pub fn chain_id(&self) -> &Hash {
        &self.chain_id
    }

    // ---- undo sessions ----

    /// Push a new undo scope on every table.
    pub fn start_undo_session(&mut self) {
        for_each_table!(self, begin_undo);
    }

    /// Revert the innermost scope on every table.
    pub fn undo_session(&mut self) -> Result<(), BlockchainError> {
        for_each_table!(self, undo_level, ?);
        Ok(())
    }

    /// Fold the innermost scope into its parent (or commit it when it is
    /// the outermost).
    pub fn merge_session(&mut self) -> Result<(), BlockchainError> {
        for_each_table!(self, merge_level, ?);
        Ok(())
    }

    /// Make the oldest retained scope irreversible.
    pub(crate) fn commit_oldest_session(&mut self) {
        for_each_table!(self, commit_oldest);
    }

    pub fn undo_depth(&self) -> usize {
        self.accounts.undo_depth()
    }

    // ---- dynamic globals ----

    pub fn dgp(&self) -> &DynamicGlobalPropertyObject {
        self.dynamic_globals.find(0).expect("genesis created the globals")
    }

    pub fn modify_dgp(&mut self, mutate: impl FnOnce(&mut DynamicGlobalPropertyObject)) {
        self.dynamic_globals
            .modify(0, mutate)
            .expect("genesis created the globals");
    }

    pub fn head_block_num(&self) -> u32 {
        self.dgp().head_block_number
    }

    pub fn head_block_id(&self) -> Hash {
        self.dgp().head_block_id.clone()
    }

    pub fn head_block_time(&self) -> TimePointSec {
        self.dgp().time
    }

    pub fn feed_history(&self) -> &FeedHistoryObject {
        self.feed_histories.find(0).expect("genesis created the feed history")
    }

    pub fn witness_schedule(&self) -> &WitnessScheduleObject {
        self.witness_schedules
            .find(0)
            .expect("genesis created the schedule")
    }

    // ---- lookups ----

    pub fn find_account(&self, name: &str) -> Option<&AccountObject> {
        let index = self
            .accounts
            .index::<UniqueIndex<AccountObject, String>>()
            .expect("registered in new");
        index
            .find(&name.to_owned())
            .and_then(|instance| self.accounts.find(instance))
    }

    pub fn get_account(&self, name: &str) -> Result<&AccountObject, BlockchainError> {
        self.find_account(name)
            .ok_or_else(|| BlockchainError::UnknownAccount(name.to_owned()))
    }

    pub fn account_instance(&self, name: &str) -> Result<u64, BlockchainError> {
        Ok(self.get_account(name)?.id)
    }

    pub fn modify_account(
        &mut self,
        name: &str,
        mutate: impl FnOnce(&mut AccountObject),
    ) -> Result<(), BlockchainError> {
        let instance = self.account_instance(name)?;
        self.accounts.modify(instance, mutate)
    }

    pub fn find_witness(&self, owner: &str) -> Option<&WitnessObject> {
        let index = self
            .witnesses
            .index::<UniqueIndex<WitnessObject, String>>()
            .expect("registered in new");
        index
            .find(&owner.to_owned())
            .and_then(|instance| self.witnesses.find(instance))
    }

    pub fn get_witness(&self, owner: &str) -> Result<&WitnessObject, BlockchainError> {
        self.find_witness(owner)
            .ok_or_else(|| BlockchainError::UnknownWitness(owner.to_owned()))
    }

    pub fn find_streaming_platform(&self, owner: &str) -> Option<&StreamingPlatformObject> {
        let index = self
            .streaming_platforms
            .index::<UniqueIndex<StreamingPlatformObject, String>>()
            .expect("registered in new");
        index
            .find(&owner.to_owned())
            .and_then(|instance| self.streaming_platforms.find(instance))
    }

    pub fn get_streaming_platform(
        &self,
        owner: &str,
    ) -> Result<&StreamingPlatformObject, BlockchainError> {
        self.find_streaming_platform(owner)
            .ok_or_else(|| BlockchainError::UnknownStreamingPlatform(owner.to_owned()))
    }

    pub fn find_content_by_url(&self, url: &str) -> Option<&ContentObject> {
        let index = self
            .contents
            .index::<UniqueIndex<ContentObject, String>>()
            .expect("registered in new");
        index
            .find(&url.to_owned())
            .and_then(|instance| self.contents.find(instance))
    }

    pub fn get_content_by_url(&self, url: &str) -> Result<&ContentObject, BlockchainError> {
        self.find_content_by_url(url)
            .ok_or_else(|| BlockchainError::UnknownContent(url.to_owned()))
    }

    pub fn find_asset(&self, asset_id: AssetId) -> Option<&AssetObject> {
        self.assets.find(asset_id.instance())
    }

    pub fn get_asset(&self, asset_id: AssetId) -> Result<&AssetObject, BlockchainError> {
        self.find_asset(asset_id)
            .ok_or_else(|| BlockchainError::UnknownAsset(asset_id.to_string()))
    }

    pub fn find_asset_by_symbol(&self, symbol: &str) -> Option<&AssetObject> {
        let index = self
            .assets
            .index::<UniqueIndex<AssetObject, String>>()
            .expect("registered in new");
        index
            .find(&symbol.to_owned())
            .and_then(|instance| self.assets.find(instance))
    }

    // ---- balances and supply ----

    /// Credit or debit a liquid balance, refusing to overdraw. Funds sent
    /// to the null account are burned.
    pub fn adjust_balance(&mut self, name: &str, delta: Asset) -> Result<(), BlockchainError> {
        if name == NULL_ACCOUNT && delta.amount > 0 {
            return self.adjust_supply(delta.negate());
        }

        self.pay_mbd_interest_if_due(name, delta.asset_id)?;

        let instance = self.account_instance(name)?;
        let account = self.accounts.get(instance)?;
        let current = account.balance(delta.asset_id);
        let updated = current
            .checked_add(delta.amount)
            .ok_or(muse_common::asset::AmountError::Overflow)?;
        if updated < 0 {
            return Err(BlockchainError::InsufficientFunds {
                account: name.to_owned(),
                available: Asset::new(current, delta.asset_id),
                required: delta.negate(),
            });
        }
        self.accounts.modify(instance, |account| {
            if updated == 0 {
                account.balances.remove(&delta.asset_id);
            } else {
                account.balances.insert(delta.asset_id, updated);
            }
        })
    }

    /// Track supply created or destroyed outside of plain transfers.
    pub fn adjust_supply(&mut self, delta: Asset) -> Result<(), BlockchainError> {
        if delta.asset_id == MUSE_SYMBOL {
            self.modify_dgp(|dgp| {
                dgp.current_supply.amount += delta.amount;
                dgp.virtual_supply.amount += delta.amount;
            });
            return Ok(());
        }
        if delta.asset_id == MBD_SYMBOL {
            self.modify_dgp(|dgp| {
                dgp.current_mbd_supply.amount += delta.amount;
            });
            self.update_virtual_supply();
            return Ok(());
        }
        // user-issued assets track supply on their own row
        let instance = delta.asset_id.instance();
        let updated = self
            .assets
            .get(instance)?
            .current_supply
            .checked_add(delta.amount)
            .ok_or(muse_common::asset::AmountError::Overflow)?;
        self.assets.modify(instance, |asset| {
            asset.current_supply = updated;
        })
    }

    /// virtual supply = MUSE supply + MBD supply valued at the median
    /// feed.
    pub(crate) fn update_virtual_supply(&mut self) {
        let median = self.feed_history().current_median_history;
        let dgp = self.dgp();
        let mbd_as_muse = match median {
            Some(price) => dgp
                .current_mbd_supply
                .multiply(&price)
                .map(|asset| asset.amount)
                .unwrap_or(0),
            None => 0,
        };
        let supply = dgp.current_supply.amount;
        self.modify_dgp(|dgp| {
            dgp.virtual_supply.amount = supply + mbd_as_muse;
        });
    }

    /// Convert liquid MUSE into vesting shares for `name` at the current
    /// vesting share price. Returns the shares created.
    pub fn create_vesting(&mut self, name: &str, muse: Asset) -> Result<Asset, BlockchainError> {
        if muse.asset_id != MUSE_SYMBOL {
            return Err(muse_common::asset::AmountError::AssetIdMismatch {
                left: muse.asset_id,
                right: MUSE_SYMBOL,
            }
            .into());
        }
        let price = self.dgp().vesting_share_price();
        let new_vesting = muse.multiply(&price)?;

        let instance = self.account_instance(name)?;
        self.accounts.modify(instance, |account| {
            account.vesting_shares += new_vesting.amount;
        })?;
        self.modify_dgp(|dgp| {
            dgp.total_vesting_fund_muse.amount += muse.amount;
            dgp.total_vesting_shares.amount += new_vesting.amount;
        });
        self.adjust_proxied_witness_votes(name, new_vesting.amount)?;
        Ok(new_vesting)
    }

    // ---- witness vote weights ----

    /// Apply a vesting-stake delta to the witness votes it backs,
    /// following the voter's proxy chain to the account that actually
    /// votes.
    pub fn adjust_proxied_witness_votes(
        &mut self,
        name: &str,
        delta: i64,
    ) -> Result<(), BlockchainError> {
        if delta == 0 {
            return Ok(());
        }
        let mut current = name.to_owned();
        for _ in 0..=MAX_PROXY_RECURSION_DEPTH {
            let account = self.get_account(&current)?;
            if !account.has_proxy() {
                return self.adjust_witness_votes(&current, delta);
            }
            let next = account.proxy.clone();
            self.modify_account(&next, |account| {
                account.proxied_vsf_votes += delta;
            })?;
            current = next;
        }
        Ok(())
    }

    /// Adjust every witness the account votes for by `delta`.
    pub fn adjust_witness_votes(&mut self, name: &str, delta: i64) -> Result<(), BlockchainError> {
        let votes: Vec<String> = self
            .witness_votes
            .iter()
            .filter(|vote| vote.account == name)
            .map(|vote| vote.witness.clone())
            .collect();
        for witness in votes {
            let instance = self
                .find_witness(&witness)
                .map(|w| w.id)
                .ok_or_else(|| BlockchainError::UnknownWitness(witness.clone()))?;
            self.witnesses.modify(instance, |witness| {
                witness.votes += delta;
            })?;
        }
        Ok(())
    }

    // ---- MBD interest ----

    // Simple interest on liquid MBD, paid lazily when a balance is
    // touched after at least one full compound interval.
    fn pay_mbd_interest_if_due(
        &mut self,
        name: &str,
        asset_id: AssetId,
    ) -> Result<(), BlockchainError> {
        if asset_id != MBD_SYMBOL {
            return Ok(());
        }
        let now = self.head_block_time();
        let Some(account) = self.find_account(name) else {
            return Ok(());
        };
        let balance = account.balance(MBD_SYMBOL);
        let last_payment = account.mbd_last_interest_payment;
        let elapsed = now.elapsed_since(last_payment);
        if balance <= 0 || elapsed < MBD_INTEREST_COMPOUND_INTERVAL_SEC {
            // start the clock on first touch
            if last_payment == TimePointSec::zero() {
                self.modify_account(name, |account| {
                    account.mbd_last_interest_payment = now;
                })?;
            }
            return Ok(());
        }

        let interest = (balance as i128
            * DEFAULT_MBD_INTEREST_RATE as i128
            * elapsed as i128
            / HUNDRED_PERCENT as i128
            / (365 * 24 * 3600) as i128) as i64;
        self.modify_account(name, |account| {
            account.mbd_last_interest_payment = now;
            if interest > 0 {
                *account.balances.entry(MBD_SYMBOL).or_insert(0) += interest;
            }
        })?;
        if interest > 0 {
            debug!("paid {interest} MBD interest to {name}");
            self.adjust_supply(Asset::new(interest, MBD_SYMBOL))?;
            self.push_virtual_operation(Operation::Interest(
                muse_common::operation::InterestOperation {
                    owner: name.to_owned(),
                    interest: Asset::new(interest, MBD_SYMBOL),
                },
            ));
        }
        Ok(())
    }

    // ---- virtual operation stream ----

    pub fn push_virtual_operation(&mut self, op: Operation) {
        debug_assert!(op.is_virtual());
        let block = if self.applying_block_num > 0 {
            self.applying_block_num
        } else {
            self.head_block_num() + 1
        };
        self.virtual_operations.push((block, op));
    }

    pub fn virtual_operations(&self) -> &[(u32, Operation)] {
        &self.virtual_operations
    }

    /// Digest of the complete object store, every table in primary-key
    /// order. Two databases are in the same state iff their digests
    /// match; apply-then-undo must restore the digest exactly.
    pub fn state_digest(&self) -> Hash {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.accounts.state_repr());
        hasher.update(self.assets.state_repr());
        hasher.update(self.contents.state_repr());
        hasher.update(self.content_votes.state_repr());
        hasher.update(self.content_approvals.state_repr());
        hasher.update(self.witnesses.state_repr());
        hasher.update(self.witness_votes.state_repr());
        hasher.update(self.witness_schedules.state_repr());
        hasher.update(self.streaming_platforms.state_repr());
        hasher.update(self.streaming_platform_votes.state_repr());
        hasher.update(self.reports.state_repr());
        hasher.update(self.limit_orders.state_repr());
        hasher.update(self.convert_requests.state_repr());
        hasher.update(self.feed_histories.state_repr());
        hasher.update(self.proposals.state_repr());
        hasher.update(self.escrows.state_repr());
        hasher.update(self.recovery_requests.state_repr());
        hasher.update(self.owner_authority_histories.state_repr());
        hasher.update(self.change_recovery_requests.state_repr());
        hasher.update(self.withdraw_routes.state_repr());
        hasher.update(self.balances.state_repr());
        hasher.update(self.block_summaries.state_repr());
        hasher.update(self.transactions.state_repr());
        hasher.update(self.dynamic_globals.state_repr());
        Hash::new(hasher.finalize().into())
    }
}
