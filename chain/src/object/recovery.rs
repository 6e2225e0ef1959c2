use muse_common::{authority::Authority, time::TimePointSec};

use super::{chain_object, object_types, IMPLEMENTATION_SPACE};

/// Pending owner-key recovery, filed by the recovery partner. Expires
/// after one day if the account holder does not complete it.
#[derive(Clone, Debug, Default)]
pub struct AccountRecoveryRequestObject {
    pub id: u64,
    pub account_to_recover: String,
    pub new_owner_authority: Authority,
    pub expires: TimePointSec,
}

chain_object!(
    AccountRecoveryRequestObject,
    IMPLEMENTATION_SPACE,
    object_types::ACCOUNT_RECOVERY_REQUEST
);

/// A superseded owner authority and when it stopped being valid; the
/// recovery window checks against these rows.
#[derive(Clone, Debug, Default)]
pub struct OwnerAuthorityHistoryObject {
    pub id: u64,
    pub account: String,
    pub previous_owner_authority: Authority,
    pub last_valid_time: TimePointSec,
}

chain_object!(
    OwnerAuthorityHistoryObject,
    IMPLEMENTATION_SPACE,
    object_types::OWNER_AUTHORITY_HISTORY
);

/// Scheduled change of the recovery partner, effective after 30 days.
#[derive(Clone, Debug, Default)]
pub struct ChangeRecoveryAccountRequestObject {
    pub id: u64,
    pub account_to_recover: String,
    pub recovery_account: String,
    pub effective_on: TimePointSec,
}

chain_object!(
    ChangeRecoveryAccountRequestObject,
    IMPLEMENTATION_SPACE,
    object_types::CHANGE_RECOVERY_ACCOUNT_REQUEST
);
