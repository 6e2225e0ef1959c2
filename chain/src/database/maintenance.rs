use std::collections::BTreeMap;

use log::{debug, trace};

use muse_common::{
    asset::{Asset, Price},
    block::SignedBlock,
    config::{
        BLOCKS_PER_HOUR, CONTENT_APR_PERCENT, CURATE_APR_PERCENT,
        FEED_HISTORY_WINDOW, HUNDRED_PERCENT, IRREVERSIBLE_THRESHOLD, LIQUIDITY_APR_PERCENT,
        MAX_FEED_AGE_SEC, MAX_WITNESSES, MBD_SYMBOL, MIN_FEEDS, MUSE_SYMBOL,
        PRODUCER_APR_PERCENT, VESTING_APR_PERCENT, VESTING_WITHDRAW_INTERVAL_SECONDS,
        VESTS_SYMBOL,
    },
    operation::{
        ContentRewardOperation, CurateRewardOperation, FillConvertRequestOperation,
        FillVestingWithdrawOperation, Operation, PlayingRewardOperation,
    },
    time::TimePointSec,
};

use crate::{
    compound::{calc_percent_reward_per_block, calc_percent_reward_per_day},
    db::MultiIndex,
    error::BlockchainError,
    evaluator,
    object::{
        AccountObject, ConvertRequestObject, LimitOrderObject, ProposalObject, ReportObject,
        TransactionObject,
    },
    witness_schedule::update_witness_schedule,
};

use super::Database;

// Window of play reports that feed the daily content payout
const REPORT_WINDOW_SEC: u32 = 24 * 60 * 60;

impl Database {
    /// Scheduled per-block work, run after the block's transactions:
    /// rewards, withdrawals, conversions, payouts and expirations.
    pub(super) fn per_block_processing(
        &mut self,
        block: &SignedBlock,
        slot: u64,
    ) -> Result<(), BlockchainError> {
        let previous_time = self.head_block_time();
        self.update_global_dynamic_data(block, slot)?;
        let now = self.head_block_time();

        self.pay_producer_reward(block)?;
        self.accrue_vesting_fund()?;
        self.process_vesting_withdrawals()?;
        self.process_conversions()?;

        // boundaries are crossed by time so that empty slots still count;
        // with a full schedule they coincide with the block-count cadence
        let day = 24 * 60 * 60;
        if now.seconds() as u64 / day > previous_time.seconds() as u64 / day {
            self.process_content_cashout()?;
            self.process_curation_rewards()?;
        }
        let hour = BLOCKS_PER_HOUR * muse_common::config::BLOCK_INTERVAL;
        if now.seconds() as u64 / hour > previous_time.seconds() as u64 / hour {
            self.update_median_feed()?;
            self.pay_liquidity_reward()?;
        }
        if self.head_block_num() as u64 % MAX_WITNESSES as u64 == 0 {
            update_witness_schedule(self)?;
        }

        self.clear_expired_transactions()?;
        self.clear_expired_orders()?;
        self.clear_expired_recovery_requests()?;
        self.apply_due_recovery_account_changes()?;
        self.process_expired_proposals()?;
        self.prune_report_window()?;

        self.update_virtual_supply();
        self.update_last_irreversible_block()?;
        Ok(())
    }

    fn update_global_dynamic_data(
        &mut self,
        block: &SignedBlock,
        slot: u64,
    ) -> Result<(), BlockchainError> {
        // witnesses scheduled for the skipped slots missed their turn
        for missed_slot in 1..slot {
            if let Some(name) = crate::witness_schedule::get_scheduled_witness(self, missed_slot) {
                if let Some(witness) = self.find_witness(&name) {
                    let instance = witness.id;
                    self.witnesses.modify(instance, |witness| {
                        witness.total_missed += 1;
                    })?;
                }
            }
        }

        let id = block.id();
        let num = block.block_num();
        let timestamp = block.header().timestamp;
        let witness_name = block.header().witness.clone();

        self.modify_dgp(|dgp| {
            dgp.head_block_number = num;
            dgp.head_block_id = id.clone();
            dgp.time = timestamp;
            dgp.current_witness = witness_name.clone();
            dgp.current_aslot += slot;
            // participation over the 128 most recent slots
            dgp.recent_slots_filled = (dgp.recent_slots_filled << slot.min(127)) | 1;
            dgp.participation_count = dgp.recent_slots_filled.count_ones() as u8;
        });

        // tapos ring entry for this block
        let summary_slot = num as u64 & 0xffff;
        if self.block_summaries.find(summary_slot).is_some() {
            self.block_summaries.modify(summary_slot, |summary| {
                summary.block_id = id.clone();
            })?;
        } else {
            // instances below the ring position are created on demand
            while self.block_summaries.next_instance() < summary_slot {
                self.block_summaries.create(|_| {});
            }
            self.block_summaries.create(|summary| {
                summary.block_id = id.clone();
            });
        }

        let witness_instance = self.get_witness(&block.header().witness)?.id;
        self.witnesses.modify(witness_instance, |witness| {
            witness.last_confirmed_block_num = num;
        })
    }

    // The producer is paid in vesting shares so stake backs the schedule.
    fn pay_producer_reward(&mut self, block: &SignedBlock) -> Result<(), BlockchainError> {
        let reward = calc_percent_reward_per_block(
            PRODUCER_APR_PERCENT,
            self.dgp().virtual_supply.amount,
        )
        .max(100);
        self.adjust_supply(Asset::new(reward, MUSE_SYMBOL))?;
        let producer = block.header().witness.clone();
        self.create_vesting(&producer, Asset::new(reward, MUSE_SYMBOL))?;
        Ok(())
    }

    // Vesting inflation raises the fund without creating shares, which
    // lifts the vesting share price for every holder.
    fn accrue_vesting_fund(&mut self) -> Result<(), BlockchainError> {
        if self.dgp().total_vesting_shares.amount <= 0 {
            return Ok(());
        }
        let reward =
            calc_percent_reward_per_block(VESTING_APR_PERCENT, self.dgp().virtual_supply.amount);
        if reward <= 0 {
            return Ok(());
        }
        self.adjust_supply(Asset::new(reward, MUSE_SYMBOL))?;
        self.modify_dgp(|dgp| {
            dgp.total_vesting_fund_muse.amount += reward;
        });
        Ok(())
    }

    fn process_vesting_withdrawals(&mut self) -> Result<(), BlockchainError> {
        let now = self.head_block_time();
        let due: Vec<u64> = {
            let index = self
                .accounts
                .index::<MultiIndex<AccountObject, TimePointSec>>()
                .expect("registered in new");
            index.values_up_to(&now).collect()
        };

        for instance in due {
            let account = self.accounts.get(instance)?.clone();
            let withdrawable = (account.to_withdraw - account.withdrawn)
                .min(account.vesting_withdraw_rate)
                .min(account.vesting_shares);
            if withdrawable <= 0 {
                self.accounts.modify(instance, |account| {
                    account.vesting_withdraw_rate = 0;
                    account.to_withdraw = 0;
                    account.withdrawn = 0;
                    account.next_vesting_withdrawal = TimePointSec::maximum();
                })?;
                continue;
            }

            let price = self.dgp().vesting_share_price();
            let mut routed_shares = 0i64;

            for route in evaluator::routes_from(self, &account.name) {
                let route_shares =
                    ((withdrawable as i128 * route.percent as i128) / HUNDRED_PERCENT as i128) as i64;
                if route_shares == 0 {
                    continue;
                }
                routed_shares += route_shares;
                let withdrawn_asset = Asset::new(route_shares, VESTS_SYMBOL);
                if route.auto_vest {
                    // shares move between accounts without touching the fund
                    self.accounts.modify(instance, |account| {
                        account.vesting_shares -= route_shares;
                    })?;
                    self.modify_account(&route.to_account, |account| {
                        account.vesting_shares += route_shares;
                    })?;
                    self.adjust_proxied_witness_votes(&route.to_account, route_shares)?;
                    self.push_virtual_operation(Operation::FillVestingWithdraw(
                        FillVestingWithdrawOperation {
                            from_account: account.name.clone(),
                            to_account: route.to_account.clone(),
                            withdrawn: withdrawn_asset,
                            deposited: withdrawn_asset,
                        },
                    ));
                } else {
                    let muse = withdrawn_asset.multiply(&price)?;
                    self.accounts.modify(instance, |account| {
                        account.vesting_shares -= route_shares;
                    })?;
                    self.modify_dgp(|dgp| {
                        dgp.total_vesting_shares.amount -= route_shares;
                        dgp.total_vesting_fund_muse.amount -= muse.amount;
                    });
                    self.adjust_balance(&route.to_account, muse)?;
                    self.push_virtual_operation(Operation::FillVestingWithdraw(
                        FillVestingWithdrawOperation {
                            from_account: account.name.clone(),
                            to_account: route.to_account.clone(),
                            withdrawn: withdrawn_asset,
                            deposited: muse,
                        },
                    ));
                }
            }

            // whatever is not routed converts to liquid MUSE for the
            // withdrawing account itself
            let remainder_shares = withdrawable - routed_shares;
            if remainder_shares > 0 {
                let withdrawn_asset = Asset::new(remainder_shares, VESTS_SYMBOL);
                let muse = withdrawn_asset.multiply(&price)?;
                self.accounts.modify(instance, |account| {
                    account.vesting_shares -= remainder_shares;
                })?;
                self.modify_dgp(|dgp| {
                    dgp.total_vesting_shares.amount -= remainder_shares;
                    dgp.total_vesting_fund_muse.amount -= muse.amount;
                });
                self.adjust_balance(&account.name, muse)?;
                self.push_virtual_operation(Operation::FillVestingWithdraw(
                    FillVestingWithdrawOperation {
                        from_account: account.name.clone(),
                        to_account: account.name.clone(),
                        withdrawn: withdrawn_asset,
                        deposited: muse,
                    },
                ));
            }

            self.adjust_proxied_witness_votes(&account.name, -withdrawable)?;

            self.accounts.modify(instance, |account| {
                account.withdrawn += withdrawable;
                if account.withdrawn >= account.to_withdraw || account.vesting_shares == 0 {
                    account.vesting_withdraw_rate = 0;
                    account.to_withdraw = 0;
                    account.withdrawn = 0;
                    account.next_vesting_withdrawal = TimePointSec::maximum();
                } else {
                    account.next_vesting_withdrawal = account
                        .next_vesting_withdrawal
                        .add_seconds(VESTING_WITHDRAW_INTERVAL_SECONDS);
                }
            })?;
            trace!("processed vesting withdrawal for {}", account.name);
        }
        Ok(())
    }

    fn process_conversions(&mut self) -> Result<(), BlockchainError> {
        let Some(median) = self.feed_history().current_median_history else {
            return Ok(());
        };
        let now = self.head_block_time();
        let due: Vec<u64> = {
            let index = self
                .convert_requests
                .index::<MultiIndex<ConvertRequestObject, TimePointSec>>()
                .expect("registered in new");
            index.values_up_to(&now).collect()
        };

        for instance in due {
            let request = self.convert_requests.get(instance)?.clone();
            let converted = request.amount.multiply(&median)?;
            self.modify_dgp(|dgp| {
                dgp.current_mbd_supply.amount -= request.amount.amount;
                dgp.current_supply.amount += converted.amount;
            });
            self.adjust_balance(&request.owner, converted)?;
            self.convert_requests.remove(instance)?;
            self.push_virtual_operation(Operation::FillConvertRequest(
                FillConvertRequestOperation {
                    owner: request.owner.clone(),
                    request_id: request.request_id,
                    amount_in: request.amount,
                    amount_out: converted,
                },
            ));
        }
        Ok(())
    }

    // Daily content settlement: the day's reward pool splits over the
    // contents played in the report window, each share dividing into the
    // platform cut, the composition side and the master side.
    fn process_content_cashout(&mut self) -> Result<(), BlockchainError> {
        let pool = calc_percent_reward_per_day(
            CONTENT_APR_PERCENT,
            self.dgp().virtual_supply.amount,
        );
        if pool <= 0 {
            return Ok(());
        }

        // plays per content and per (content, platform) over the window
        let mut plays_by_content: BTreeMap<u64, u64> = BTreeMap::new();
        let mut plays_by_platform: BTreeMap<(u64, String), u64> = BTreeMap::new();
        for report in self.reports.iter() {
            *plays_by_content.entry(report.content).or_insert(0) += 1;
            *plays_by_platform
                .entry((report.content, report.streaming_platform.clone()))
                .or_insert(0) += 1;
        }
        let total_plays: u64 = plays_by_content.values().sum();
        if total_plays == 0 {
            return Ok(());
        }

        for (content_instance, plays) in plays_by_content {
            let content = self.contents.get(content_instance)?.clone();
            if content.disabled {
                continue;
            }
            let share = ((pool as i128 * plays as i128) / total_plays as i128) as i64;
            if share <= 0 {
                continue;
            }
            self.adjust_supply(Asset::new(share, MUSE_SYMBOL))?;

            // platform cut, pro rata by the platforms' reported plays
            let platform_pool =
                ((share as i128 * content.playing_reward as i128) / HUNDRED_PERCENT as i128) as i64;
            let mut platform_paid = 0i64;
            if platform_pool > 0 {
                for ((reported_content, platform), platform_plays) in &plays_by_platform {
                    if *reported_content != content_instance {
                        continue;
                    }
                    let cut = ((platform_pool as i128 * *platform_plays as i128)
                        / plays as i128) as i64;
                    if cut <= 0 {
                        continue;
                    }
                    platform_paid += cut;
                    self.adjust_balance(platform, Asset::new(cut, MUSE_SYMBOL))?;
                    self.push_virtual_operation(Operation::PlayingReward(PlayingRewardOperation {
                        platform: platform.clone(),
                        url: content.url.clone(),
                        payout: Asset::new(cut, MUSE_SYMBOL),
                    }));
                }
            }

            let remainder = share - platform_paid;
            let comp_cut = if content.comp_meta.third_party_publishers {
                ((remainder as i128 * content.publishers_share as i128) / HUNDRED_PERCENT as i128)
                    as i64
            } else {
                0
            };
            let master_cut = remainder - comp_cut;

            self.pay_content_side(
                content_instance,
                &content.url,
                master_cut,
                &content.distributions_master,
                false,
            )?;
            self.pay_content_side(
                content_instance,
                &content.url,
                comp_cut,
                &content.distributions_comp,
                true,
            )?;
        }
        debug!("settled daily content rewards: pool {pool}");
        Ok(())
    }

    // Pay one side of a content: through its distribution list when one
    // is declared, otherwise accumulating on the content row.
    fn pay_content_side(
        &mut self,
        content_instance: u64,
        url: &str,
        amount: i64,
        distributions: &[muse_common::operation::Distribution],
        comp_side: bool,
    ) -> Result<(), BlockchainError> {
        if amount <= 0 {
            return Ok(());
        }
        if distributions.is_empty() {
            return self.contents.modify(content_instance, |content| {
                if comp_side {
                    content.accumulated_balance_comp.amount += amount;
                } else {
                    content.accumulated_balance_master.amount += amount;
                }
            });
        }
        let mut paid = 0i64;
        for distribution in distributions {
            let cut =
                ((amount as i128 * distribution.bp as i128) / HUNDRED_PERCENT as i128) as i64;
            if cut <= 0 {
                continue;
            }
            paid += cut;
            self.adjust_balance(&distribution.payee, Asset::new(cut, MUSE_SYMBOL))?;
            self.push_virtual_operation(Operation::ContentReward(ContentRewardOperation {
                payee: distribution.payee.clone(),
                url: url.to_owned(),
                payout: Asset::new(cut, MUSE_SYMBOL),
            }));
        }
        // rounding dust stays on the content row
        let dust = amount - paid;
        if dust > 0 {
            self.contents.modify(content_instance, |content| {
                if comp_side {
                    content.accumulated_balance_comp.amount += dust;
                } else {
                    content.accumulated_balance_master.amount += dust;
                }
            })?;
        }
        Ok(())
    }

    // Daily curation: the reserve pays the flagged votes on contents
    // whose curation window is still open, pro rata by absolute weight.
    fn process_curation_rewards(&mut self) -> Result<(), BlockchainError> {
        let pool =
            calc_percent_reward_per_day(CURATE_APR_PERCENT, self.dgp().virtual_supply.amount);
        if pool <= 0 {
            return Ok(());
        }
        let now = self.head_block_time();

        let mut eligible: Vec<(u64, String, String, u64)> = Vec::new();
        let mut total_weight = 0u64;
        for vote in self.content_votes.iter() {
            if !vote.marked_for_curation_reward || vote.weight <= 0 {
                continue;
            }
            let Some(content) = self.contents.find(vote.content) else {
                continue;
            };
            if content.disabled || !content.curation_rewards
                || now >= content.curation_reward_expiration
            {
                continue;
            }
            let weight = vote.weight.unsigned_abs() as u64;
            total_weight += weight;
            eligible.push((vote.id, vote.voter.clone(), content.url.clone(), weight));
        }
        if total_weight == 0 {
            return Ok(());
        }

        for (vote_instance, voter, url, weight) in eligible {
            let reward = ((pool as i128 * weight as i128) / total_weight as i128) as i64;
            if reward <= 0 {
                continue;
            }
            self.adjust_supply(Asset::new(reward, MUSE_SYMBOL))?;
            self.adjust_balance(&voter, Asset::new(reward, MUSE_SYMBOL))?;
            self.content_votes.modify(vote_instance, |vote| {
                vote.marked_for_curation_reward = false;
            })?;
            self.push_virtual_operation(Operation::CurateReward(CurateRewardOperation {
                curator: voter.clone(),
                url,
                reward: Asset::new(reward, MUSE_SYMBOL),
            }));
        }
        Ok(())
    }

    // Hourly feed rotation: median of the active witnesses' fresh feeds
    // enters the 7-day window; the conversion price is the window median.
    fn update_median_feed(&mut self) -> Result<(), BlockchainError> {
        let now = self.head_block_time();
        let active = self.witness_schedule().current_shuffled_witnesses.clone();

        let mut feeds: Vec<Price> = Vec::new();
        for name in &active {
            let Some(witness) = self.find_witness(name) else {
                continue;
            };
            let Some(rate) = witness.mbd_exchange_rate else {
                continue;
            };
            if now.elapsed_since(witness.last_mbd_exchange_update) > MAX_FEED_AGE_SEC {
                continue;
            }
            // normalize to MBD base so all feeds share one axis
            let rate = if rate.base.asset_id == MBD_SYMBOL {
                rate
            } else {
                rate.invert()
            };
            feeds.push(rate);
        }
        if feeds.len() < MIN_FEEDS {
            return Ok(());
        }
        feeds.sort();
        let median_feed = feeds[feeds.len() / 2];

        self.feed_histories.modify(0, |history| {
            history.price_history.push(median_feed);
            if history.price_history.len() > FEED_HISTORY_WINDOW {
                history.price_history.remove(0);
            }
            let mut window = history.price_history.clone();
            window.sort();
            history.current_median_history = Some(window[window.len() / 2]);
        })
    }

    // The liquidity APR is zero: the hook stays so the hourly boundary
    // remains part of the schedule contract.
    fn pay_liquidity_reward(&mut self) -> Result<(), BlockchainError> {
        if LIQUIDITY_APR_PERCENT == 0 {
            return Ok(());
        }
        Ok(())
    }

    fn clear_expired_transactions(&mut self) -> Result<(), BlockchainError> {
        let now = self.head_block_time();
        let expired: Vec<u64> = {
            let index = self
                .transactions
                .index::<MultiIndex<TransactionObject, TimePointSec>>()
                .expect("registered in new");
            index.values_up_to(&now).collect()
        };
        for instance in expired {
            self.transactions.remove(instance)?;
        }
        Ok(())
    }

    fn clear_expired_orders(&mut self) -> Result<(), BlockchainError> {
        let now = self.head_block_time();
        let expired: Vec<u64> = {
            let index = self
                .limit_orders
                .index::<MultiIndex<LimitOrderObject, TimePointSec>>()
                .expect("registered in new");
            index.values_up_to(&now).collect()
        };
        for instance in expired {
            evaluator::cancel_order(self, instance)?;
        }
        Ok(())
    }

    fn clear_expired_recovery_requests(&mut self) -> Result<(), BlockchainError> {
        let now = self.head_block_time();
        let expired: Vec<u64> = self
            .recovery_requests
            .iter()
            .filter(|request| request.expires <= now)
            .map(|request| request.id)
            .collect();
        for instance in expired {
            self.recovery_requests.remove(instance)?;
        }
        Ok(())
    }

    fn apply_due_recovery_account_changes(&mut self) -> Result<(), BlockchainError> {
        let now = self.head_block_time();
        let due: Vec<(u64, String, String)> = self
            .change_recovery_requests
            .iter()
            .filter(|request| request.effective_on <= now)
            .map(|request| {
                (
                    request.id,
                    request.account_to_recover.clone(),
                    request.recovery_account.clone(),
                )
            })
            .collect();
        for (instance, account, recovery_account) in due {
            self.modify_account(&account, |account| {
                account.recovery_account = recovery_account.clone();
            })?;
            self.change_recovery_requests.remove(instance)?;
        }
        Ok(())
    }

    // An expiring proposal gets one final execution attempt, then leaves
    // the table either way.
    fn process_expired_proposals(&mut self) -> Result<(), BlockchainError> {
        let now = self.head_block_time();
        let expired: Vec<u64> = {
            let index = self
                .proposals
                .index::<MultiIndex<ProposalObject, TimePointSec>>()
                .expect("registered in new");
            index.values_up_to(&now).collect()
        };
        for instance in expired {
            let executed = evaluator::try_execute_proposal(self, instance)?;
            if !executed {
                self.proposals.remove(instance)?;
            }
        }
        Ok(())
    }

    // Reports age out of the 24h window; the play counters they backed
    // shrink with them.
    fn prune_report_window(&mut self) -> Result<(), BlockchainError> {
        let cutoff = self.head_block_time().sub_seconds(REPORT_WINDOW_SEC);
        let stale: Vec<(u64, u64)> = {
            let index = self
                .reports
                .index::<MultiIndex<ReportObject, TimePointSec>>()
                .expect("registered in new");
            index
                .values_before(&cutoff)
                .filter_map(|instance| {
                    self.reports
                        .find(instance)
                        .map(|report| (instance, report.content))
                })
                .collect()
        };
        for (instance, content_instance) in stale {
            self.reports.remove(instance)?;
            if self.contents.find(content_instance).is_some() {
                self.contents.modify(content_instance, |content| {
                    content.times_played_24 = content.times_played_24.saturating_sub(1);
                })?;
            }
        }
        Ok(())
    }

    // A block is irreversible once 51% of the scheduled witnesses have
    // produced on top of it.
    fn update_last_irreversible_block(&mut self) -> Result<(), BlockchainError> {
        let schedule = self.witness_schedule().current_shuffled_witnesses.clone();
        let mut confirmed: Vec<u32> = schedule
            .iter()
            .filter_map(|name| self.find_witness(name))
            .map(|witness| witness.last_confirmed_block_num)
            .collect();
        if confirmed.is_empty() {
            return Ok(());
        }
        confirmed.sort_unstable();
        let offset = ((HUNDRED_PERCENT - IRREVERSIBLE_THRESHOLD) as usize * confirmed.len())
            / HUNDRED_PERCENT as usize;
        let candidate = confirmed[offset];
        if candidate > self.dgp().last_irreversible_block_num {
            self.modify_dgp(|dgp| {
                dgp.last_irreversible_block_num = candidate;
            });
        }
        // recent blocks stay available for fork switching as long as the
        // undo history can still unwind to them
        let keep_above = self
            .head_block_num()
            .saturating_sub(muse_common::config::MAX_UNDO_HISTORY as u32);
        self.fork_db.prune(keep_above);
        Ok(())
    }
}
