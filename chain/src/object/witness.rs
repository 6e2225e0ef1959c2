use muse_common::{
    asset::Price,
    block::Version,
    crypto::PublicKey,
    operation::ChainProperties,
    time::TimePointSec,
};

use super::{chain_object, object_types, IMPLEMENTATION_SPACE, PROTOCOL_SPACE};

/// A block-producer candidacy. The top voted candidates plus one
/// timeshare slot form each scheduling round.
#[derive(Clone, Debug)]
pub struct WitnessObject {
    pub id: u64,
    pub owner: String,
    pub created: TimePointSec,
    pub url: String,
    pub votes: i64,
    pub signing_key: PublicKey,
    pub props: ChainProperties,

    // last published MUSE/MBD observation
    pub mbd_exchange_rate: Option<Price>,
    pub last_mbd_exchange_update: TimePointSec,

    pub total_missed: u32,
    pub last_confirmed_block_num: u32,
    pub running_version: Version,

    // timeshare bookkeeping: the round in which this witness last held
    // the runner-up slot
    pub virtual_scheduled_round: u64,
}

impl Default for WitnessObject {
    fn default() -> Self {
        WitnessObject {
            id: 0,
            owner: String::new(),
            created: TimePointSec::zero(),
            url: String::new(),
            votes: 0,
            signing_key: PublicKey::zero(),
            props: ChainProperties::default(),
            mbd_exchange_rate: None,
            last_mbd_exchange_update: TimePointSec::zero(),
            total_missed: 0,
            last_confirmed_block_num: 0,
            running_version: Version::default(),
            virtual_scheduled_round: 0,
        }
    }
}

chain_object!(WitnessObject, PROTOCOL_SPACE, object_types::WITNESS);

/// Marks that `account` approves `witness`.
#[derive(Clone, Debug, Default)]
pub struct WitnessVoteObject {
    pub id: u64,
    pub witness: String,
    pub account: String,
}

chain_object!(
    WitnessVoteObject,
    IMPLEMENTATION_SPACE,
    object_types::WITNESS_VOTE
);

/// The active round: shuffled producer order and the medians of the
/// active witnesses' published chain properties.
#[derive(Clone, Debug, Default)]
pub struct WitnessScheduleObject {
    pub id: u64,
    pub current_shuffled_witnesses: Vec<String>,
    pub next_shuffle_block_num: u64,
    pub median_props: ChainProperties,
    pub majority_version: Version,
    pub current_round: u64,
}

chain_object!(
    WitnessScheduleObject,
    IMPLEMENTATION_SPACE,
    object_types::WITNESS_SCHEDULE
);
