use log::debug;

use muse_common::{
    config::MAX_TIME_UNTIL_EXPIRATION,
    operation::{
        Operation, ProposalCreateOperation, ProposalDeleteOperation, ProposalUpdateOperation,
    },
};

use crate::{
    authority_check::{AuthorityLevel, SignState},
    database::Database,
    error::BlockchainError,
};

pub fn apply_proposal_create(
    db: &mut Database,
    op: &ProposalCreateOperation,
) -> Result<(), BlockchainError> {
    let now = db.head_block_time();
    if op.expiration_time <= now {
        return Err(BlockchainError::Evaluate(
            "proposal expiration is in the past".to_owned(),
        ));
    }
    if op.expiration_time > now.add_seconds(MAX_TIME_UNTIL_EXPIRATION) {
        return Err(BlockchainError::Evaluate(
            "proposal expiration is too far in the future".to_owned(),
        ));
    }
    if let Some(review) = op.review_period_seconds {
        if review >= op.expiration_time.elapsed_since(now) {
            return Err(BlockchainError::Evaluate(
                "review period must end before the proposal expires".to_owned(),
            ));
        }
    }

    // capture the authority sets the inner operations will need
    let required = Operation::required_authorities(&op.proposed_ops);
    for name in required
        .active
        .iter()
        .chain(&required.owner)
        .chain(&required.basic)
    {
        db.get_account(name)?;
    }

    let review_period_time = op
        .review_period_seconds
        .map(|seconds| op.expiration_time.sub_seconds(seconds));
    db.proposals.create(|proposal| {
        proposal.proposed_ops = op.proposed_ops.clone();
        proposal.expiration_time = op.expiration_time;
        proposal.review_period_time = review_period_time;
        proposal.required_active_approvals = required.active.clone();
        proposal.required_owner_approvals = required.owner.clone();
        proposal.required_basic_approvals = required.basic.clone();
    });
    Ok(())
}

/// Apply the inner transaction if the collected approvals satisfy every
/// required authority. All-or-nothing: a failing inner operation leaves
/// the proposal pending and the state untouched.
pub fn try_execute_proposal(db: &mut Database, instance: u64) -> Result<bool, BlockchainError> {
    let proposal = db.proposals.get(instance)?.clone();

    let mut state = SignState::new(db, proposal.available_key_approvals.iter().cloned())
        .with_approvals(
            proposal.available_active_approvals.clone(),
            proposal.available_owner_approvals.clone(),
        );
    let authorized = proposal
        .required_owner_approvals
        .iter()
        .all(|name| state.check_account_authority(name, AuthorityLevel::Owner))
        && proposal
            .required_active_approvals
            .iter()
            .all(|name| state.check_account_authority(name, AuthorityLevel::Active))
        && proposal
            .required_basic_approvals
            .iter()
            .all(|name| state.check_account_authority(name, AuthorityLevel::Basic));
    if !authorized {
        return Ok(false);
    }

    db.start_undo_session();
    let result: Result<(), BlockchainError> = proposal
        .proposed_ops
        .iter()
        .try_for_each(|op| super::apply_operation(db, op));
    match result {
        Ok(()) => {
            db.merge_session()?;
            db.proposals.remove(instance)?;
            debug!("proposal {instance} executed");
            Ok(true)
        }
        Err(err) => {
            db.undo_session()?;
            debug!("proposal {instance} not executed: {err}");
            Ok(false)
        }
    }
}

pub fn apply_proposal_update(
    db: &mut Database,
    op: &ProposalUpdateOperation,
) -> Result<(), BlockchainError> {
    let proposal = db.proposals.get(op.proposal)?.clone();

    // added approvals must be relevant to the proposal
    for name in &op.active_approvals_to_add {
        if !proposal.required_active_approvals.contains(name)
            && !proposal.required_basic_approvals.contains(name)
        {
            return Err(BlockchainError::Evaluate(format!(
                "active approval of {name} is not required by this proposal"
            )));
        }
    }
    for name in &op.owner_approvals_to_add {
        if !proposal.required_owner_approvals.contains(name) {
            return Err(BlockchainError::Evaluate(format!(
                "owner approval of {name} is not required by this proposal"
            )));
        }
    }
    for name in op
        .active_approvals_to_remove
        .iter()
        .chain(&op.owner_approvals_to_remove)
    {
        if !proposal.available_active_approvals.contains(name)
            && !proposal.available_owner_approvals.contains(name)
        {
            return Err(BlockchainError::Evaluate(format!(
                "{name} has no approval to revoke on this proposal"
            )));
        }
    }

    // once the review period has begun, approvals may only be revoked
    if let Some(review_period_time) = proposal.review_period_time {
        let in_review = db.head_block_time() >= review_period_time;
        let adds = !op.active_approvals_to_add.is_empty()
            || !op.owner_approvals_to_add.is_empty()
            || !op.key_approvals_to_add.is_empty();
        if in_review && adds {
            return Err(BlockchainError::Evaluate(
                "approvals cannot be added during the review period".to_owned(),
            ));
        }
    }

    db.proposals.modify(op.proposal, |proposal| {
        for name in &op.active_approvals_to_add {
            proposal.available_active_approvals.insert(name.clone());
        }
        for name in &op.active_approvals_to_remove {
            proposal.available_active_approvals.remove(name);
        }
        for name in &op.owner_approvals_to_add {
            proposal.available_owner_approvals.insert(name.clone());
        }
        for name in &op.owner_approvals_to_remove {
            proposal.available_owner_approvals.remove(name);
        }
        for key in &op.key_approvals_to_add {
            proposal.available_key_approvals.insert(key.clone());
        }
        for key in &op.key_approvals_to_remove {
            proposal.available_key_approvals.remove(key);
        }
    })?;

    // without a review period the proposal executes as soon as the
    // approvals suffice
    let proposal = db.proposals.get(op.proposal)?;
    if proposal.review_period_time.is_none() {
        try_execute_proposal(db, op.proposal)?;
    }
    Ok(())
}

pub fn apply_proposal_delete(
    db: &mut Database,
    op: &ProposalDeleteOperation,
) -> Result<(), BlockchainError> {
    let proposal = db.proposals.get(op.proposal)?;
    let entitled = if op.using_owner_authority {
        proposal.required_owner_approvals.contains(&op.vetoer)
    } else {
        proposal.required_active_approvals.contains(&op.vetoer)
            || proposal.required_basic_approvals.contains(&op.vetoer)
            || proposal.required_owner_approvals.contains(&op.vetoer)
    };
    if !entitled {
        return Err(BlockchainError::Evaluate(format!(
            "{} holds no required authority on this proposal",
            op.vetoer
        )));
    }
    db.proposals.remove(op.proposal)
}
