mod account;
mod asset;
mod content;
mod escrow;
mod global_property;
mod market;
mod proposal;
mod recovery;
mod streaming_platform;
mod witness;

use std::fmt::{Display, Error as FmtError, Formatter};

use serde::{Deserialize, Serialize};

pub use account::{AccountObject, BalanceObject, WithdrawVestingRouteObject};
pub use asset::AssetObject;
pub use content::{
    content_by_category_index, content_by_genre_index, content_genres, ContentApproveObject,
    ContentByCategoryIndex, ContentByGenreIndex, ContentObject, ContentVoteObject,
};
pub use escrow::EscrowObject;
pub use global_property::{
    BlockSummaryObject, DynamicGlobalPropertyObject, FeedHistoryObject, TransactionObject,
};
pub use market::{ConvertRequestObject, LimitOrderObject};
pub use proposal::ProposalObject;
pub use recovery::{
    AccountRecoveryRequestObject, ChangeRecoveryAccountRequestObject, OwnerAuthorityHistoryObject,
};
pub use streaming_platform::{ReportObject, StreamingPlatformObject, StreamingPlatformVoteObject};
pub use witness::{WitnessObject, WitnessScheduleObject, WitnessVoteObject};

// User-visible entities
pub const PROTOCOL_SPACE: u8 = 1;
// Evaluator-maintained entities
pub const IMPLEMENTATION_SPACE: u8 = 2;

/// Dense 48-bit identifier of a row: (space, type, instance). Instances
/// are assigned sequentially per table and never reused, except when an
/// undone session releases the ids it created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    pub space: u8,
    pub ty: u8,
    pub instance: u64,
}

impl ObjectId {
    pub const fn new(space: u8, ty: u8, instance: u64) -> Self {
        ObjectId { space, ty, instance }
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{}.{}.{}", self.space, self.ty, self.instance)
    }
}

/// A row type owned by exactly one table.
pub trait ChainObject: Clone + std::fmt::Debug + Default + 'static {
    const SPACE: u8;
    const TYPE: u8;

    fn instance(&self) -> u64;
    fn set_instance(&mut self, instance: u64);

    fn object_id(&self) -> ObjectId {
        ObjectId::new(Self::SPACE, Self::TYPE, self.instance())
    }
}

// Object type tags. The asset table is pinned at 2.28 by the textual
// asset format; the others are internal.
pub mod object_types {
    pub const ACCOUNT: u8 = 2;
    pub const WITNESS: u8 = 3;
    pub const PROPOSAL: u8 = 4;

    pub const DYNAMIC_GLOBAL_PROPERTY: u8 = 0;
    pub const CONTENT: u8 = 1;
    pub const CONTENT_VOTE: u8 = 2;
    pub const CONTENT_APPROVE: u8 = 3;
    pub const STREAMING_PLATFORM: u8 = 4;
    pub const STREAMING_PLATFORM_VOTE: u8 = 5;
    pub const REPORT: u8 = 6;
    pub const LIMIT_ORDER: u8 = 7;
    pub const CONVERT_REQUEST: u8 = 8;
    pub const FEED_HISTORY: u8 = 9;
    pub const WITNESS_VOTE: u8 = 10;
    pub const WITNESS_SCHEDULE: u8 = 11;
    pub const ESCROW: u8 = 12;
    pub const ACCOUNT_RECOVERY_REQUEST: u8 = 13;
    pub const OWNER_AUTHORITY_HISTORY: u8 = 14;
    pub const CHANGE_RECOVERY_ACCOUNT_REQUEST: u8 = 15;
    pub const WITHDRAW_VESTING_ROUTE: u8 = 16;
    pub const BALANCE: u8 = 17;
    pub const BLOCK_SUMMARY: u8 = 18;
    pub const TRANSACTION: u8 = 19;
    pub const ASSET: u8 = 28;
}

/// Declares the boilerplate identity of a chain object struct. Every
/// object carries its instance in an `id` field.
macro_rules! chain_object {
    ($object:ident, $space:expr, $ty:expr) => {
        impl crate::object::ChainObject for $object {
            const SPACE: u8 = $space;
            const TYPE: u8 = $ty;

            fn instance(&self) -> u64 {
                self.id
            }

            fn set_instance(&mut self, instance: u64) {
                self.id = instance;
            }
        }
    };
}

pub(crate) use chain_object;
