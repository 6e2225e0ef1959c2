use std::collections::BTreeSet;

use muse_common::{crypto::PublicKey, operation::Operation, time::TimePointSec};

use super::{chain_object, object_types, PROTOCOL_SPACE};

/// A pending proposed transaction collecting approvals. Once the
/// available approvals satisfy every required authority of the inner
/// operations, the inner transaction is applied atomically.
#[derive(Clone, Debug, Default)]
pub struct ProposalObject {
    pub id: u64,
    pub proposed_ops: Vec<Operation>,
    pub expiration_time: TimePointSec,
    pub review_period_time: Option<TimePointSec>,

    // authority sets captured from the inner operations at creation
    pub required_active_approvals: BTreeSet<String>,
    pub required_owner_approvals: BTreeSet<String>,
    pub required_basic_approvals: BTreeSet<String>,

    // approvals granted so far
    pub available_active_approvals: BTreeSet<String>,
    pub available_owner_approvals: BTreeSet<String>,
    pub available_key_approvals: BTreeSet<PublicKey>,
}

chain_object!(ProposalObject, PROTOCOL_SPACE, object_types::PROPOSAL);
