use std::collections::{BTreeMap, BTreeSet};

use muse_common::{
    asset::{Asset, AssetId},
    authority::Authority,
    config::{MUSE_SYMBOL, VESTS_SYMBOL},
    crypto::PublicKey,
    time::TimePointSec,
};

use super::{chain_object, object_types, IMPLEMENTATION_SPACE, PROTOCOL_SPACE};

/// An account: identity, authorities, balances and voting state.
#[derive(Clone, Debug)]
pub struct AccountObject {
    pub id: u64,
    pub name: String,
    pub owner: Authority,
    pub active: Authority,
    pub basic: Authority,
    pub memo_key: PublicKey,
    pub json_metadata: String,
    pub recovery_account: String,
    pub last_owner_update: TimePointSec,
    pub created: TimePointSec,

    // liquid balances per asset; absent key means zero
    pub balances: BTreeMap<AssetId, i64>,

    // vesting state, amounts in VESTS satoshis
    pub vesting_shares: i64,
    pub vesting_withdraw_rate: i64,
    pub next_vesting_withdrawal: TimePointSec,
    pub withdrawn: i64,
    pub to_withdraw: i64,
    pub withdraw_routes: u16,

    // witness voting; empty proxy votes directly
    pub proxy: String,
    pub proxied_vsf_votes: i64,
    pub witnesses_voted_for: u16,
    pub streaming_platforms_voted_for: u16,

    pub friends: BTreeSet<String>,
    pub pending_friend_requests: BTreeSet<String>,

    pub mbd_last_interest_payment: TimePointSec,
    pub challenged: bool,
    pub last_vote_time: TimePointSec,
}

impl Default for AccountObject {
    fn default() -> Self {
        AccountObject {
            id: 0,
            name: String::new(),
            owner: Authority::default(),
            active: Authority::default(),
            basic: Authority::default(),
            memo_key: PublicKey::zero(),
            json_metadata: String::new(),
            recovery_account: String::new(),
            last_owner_update: TimePointSec::zero(),
            created: TimePointSec::zero(),
            balances: BTreeMap::new(),
            vesting_shares: 0,
            vesting_withdraw_rate: 0,
            next_vesting_withdrawal: TimePointSec::maximum(),
            withdrawn: 0,
            to_withdraw: 0,
            withdraw_routes: 0,
            proxy: String::new(),
            proxied_vsf_votes: 0,
            witnesses_voted_for: 0,
            streaming_platforms_voted_for: 0,
            friends: BTreeSet::new(),
            pending_friend_requests: BTreeSet::new(),
            mbd_last_interest_payment: TimePointSec::zero(),
            challenged: false,
            last_vote_time: TimePointSec::zero(),
        }
    }
}

impl AccountObject {
    pub fn balance(&self, asset_id: AssetId) -> i64 {
        self.balances.get(&asset_id).copied().unwrap_or(0)
    }

    pub fn balance_asset(&self, asset_id: AssetId) -> Asset {
        Asset::new(self.balance(asset_id), asset_id)
    }

    pub fn vesting_shares_asset(&self) -> Asset {
        Asset::new(self.vesting_shares, VESTS_SYMBOL)
    }

    pub fn has_proxy(&self) -> bool {
        !self.proxy.is_empty()
    }

    /// Stake behind this account's witness votes: own vesting shares plus
    /// everything proxied to it.
    pub fn witness_vote_weight(&self) -> i64 {
        self.vesting_shares + self.proxied_vsf_votes
    }
}

chain_object!(AccountObject, PROTOCOL_SPACE, object_types::ACCOUNT);

/// A standing instruction to divert part of each vesting withdrawal
/// tranche to another account.
#[derive(Clone, Debug, Default)]
pub struct WithdrawVestingRouteObject {
    pub id: u64,
    pub from_account: String,
    pub to_account: String,
    pub percent: u16,
    pub auto_vest: bool,
}

chain_object!(
    WithdrawVestingRouteObject,
    IMPLEMENTATION_SPACE,
    object_types::WITHDRAW_VESTING_ROUTE
);

/// A genesis balance redeemable by whoever controls its key.
#[derive(Clone, Debug)]
pub struct BalanceObject {
    pub id: u64,
    pub owner_key: PublicKey,
    pub balance: Asset,
    pub last_claim_date: TimePointSec,
}

impl Default for BalanceObject {
    fn default() -> Self {
        BalanceObject {
            id: 0,
            owner_key: PublicKey::zero(),
            balance: Asset::zero(MUSE_SYMBOL),
            last_claim_date: TimePointSec::zero(),
        }
    }
}

chain_object!(BalanceObject, IMPLEMENTATION_SPACE, object_types::BALANCE);
