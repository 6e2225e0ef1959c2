use muse_common::{
    asset::Asset,
    config::MUSE_SYMBOL,
    time::TimePointSec,
};

use super::{chain_object, object_types, IMPLEMENTATION_SPACE};

/// Funds held by a third-party agent until released back or onwards.
#[derive(Clone, Debug)]
pub struct EscrowObject {
    pub id: u64,
    pub escrow_id: u32,
    pub from: String,
    pub to: String,
    pub agent: String,
    pub balance: Asset,
    pub pending_fee: Asset,
    pub disputed: bool,
    pub expiration: TimePointSec,
}

impl Default for EscrowObject {
    fn default() -> Self {
        EscrowObject {
            id: 0,
            escrow_id: 0,
            from: String::new(),
            to: String::new(),
            agent: String::new(),
            balance: Asset::zero(MUSE_SYMBOL),
            pending_fee: Asset::zero(MUSE_SYMBOL),
            disputed: false,
            expiration: TimePointSec::maximum(),
        }
    }
}

chain_object!(EscrowObject, IMPLEMENTATION_SPACE, object_types::ESCROW);
