use muse_common::{
    asset::{Asset, Price},
    config::{MBD_SYMBOL, MUSE_SYMBOL, VESTS_SYMBOL},
    crypto::Hash,
    time::TimePointSec,
};

use super::{chain_object, object_types, IMPLEMENTATION_SPACE};

/// Chain-wide counters maintained by the block applier. A single row at
/// instance 0.
#[derive(Clone, Debug)]
pub struct DynamicGlobalPropertyObject {
    pub id: u64,
    pub head_block_number: u32,
    pub head_block_id: Hash,
    pub time: TimePointSec,
    pub current_witness: String,

    // MUSE supply plus the MUSE value of the MBD supply at the feed
    pub virtual_supply: Asset,
    pub current_supply: Asset,
    pub current_mbd_supply: Asset,

    pub total_vesting_fund_muse: Asset,
    pub total_vesting_shares: Asset,

    pub current_aslot: u64,
    // bitmap of the 128 most recent slots, for participation accounting
    pub recent_slots_filled: u128,
    pub participation_count: u8,

    pub last_irreversible_block_num: u32,
    pub maximum_block_size: u32,
}

impl Default for DynamicGlobalPropertyObject {
    fn default() -> Self {
        DynamicGlobalPropertyObject {
            id: 0,
            head_block_number: 0,
            head_block_id: Hash::zero(),
            time: TimePointSec::zero(),
            current_witness: String::new(),
            virtual_supply: Asset::zero(MUSE_SYMBOL),
            current_supply: Asset::zero(MUSE_SYMBOL),
            current_mbd_supply: Asset::zero(MBD_SYMBOL),
            total_vesting_fund_muse: Asset::zero(MUSE_SYMBOL),
            total_vesting_shares: Asset::zero(VESTS_SYMBOL),
            current_aslot: 0,
            recent_slots_filled: u128::MAX,
            participation_count: 128,
            last_irreversible_block_num: 0,
            maximum_block_size: 65_536,
        }
    }
}

impl DynamicGlobalPropertyObject {
    /// VESTS per MUSE. Before any vesting exists the price is one to one.
    pub fn vesting_share_price(&self) -> Price {
        if self.total_vesting_shares.amount <= 0 || self.total_vesting_fund_muse.amount <= 0 {
            return Price::new(
                Asset::new(1_000_000, VESTS_SYMBOL),
                Asset::new(1_000_000, MUSE_SYMBOL),
            );
        }
        Price::new(self.total_vesting_shares, self.total_vesting_fund_muse)
    }
}

chain_object!(
    DynamicGlobalPropertyObject,
    IMPLEMENTATION_SPACE,
    object_types::DYNAMIC_GLOBAL_PROPERTY
);

/// Median price feed and its 7-day hourly window. A single row at
/// instance 0.
#[derive(Clone, Debug, Default)]
pub struct FeedHistoryObject {
    pub id: u64,
    pub current_median_history: Option<Price>,
    pub price_history: Vec<Price>,
}

chain_object!(
    FeedHistoryObject,
    IMPLEMENTATION_SPACE,
    object_types::FEED_HISTORY
);

/// Ring of recent block ids keyed by `block_num & 0xffff`; transactions
/// reference these for tapos.
#[derive(Clone, Debug, Default)]
pub struct BlockSummaryObject {
    pub id: u64,
    pub block_id: Hash,
}

chain_object!(
    BlockSummaryObject,
    IMPLEMENTATION_SPACE,
    object_types::BLOCK_SUMMARY
);

/// An applied transaction retained until its expiration passes, the
/// duplicate-inclusion guard.
#[derive(Clone, Debug, Default)]
pub struct TransactionObject {
    pub id: u64,
    pub trx_id: Hash,
    pub expiration: TimePointSec,
}

chain_object!(
    TransactionObject,
    IMPLEMENTATION_SPACE,
    object_types::TRANSACTION
);
