use muse_common::{
    config::{
        ACCOUNT_RECOVERY_REQUEST_EXPIRATION_PERIOD_SEC, CHANGE_RECOVERY_ACCOUNT_DELAY_SEC,
        OWNER_AUTH_RECOVERY_PERIOD_SEC, OWNER_UPDATE_LIMIT_SEC,
    },
    operation::{
        ChangeRecoveryAccountOperation, RecoverAccountOperation, RequestAccountRecoveryOperation,
    },
};

use crate::{
    database::Database,
    db::{MultiIndex, UniqueIndex},
    error::BlockchainError,
    object::{
        AccountRecoveryRequestObject, ChangeRecoveryAccountRequestObject,
        OwnerAuthorityHistoryObject,
    },
};

fn find_recovery_request(db: &Database, account: &str) -> Option<u64> {
    db.recovery_requests
        .index::<UniqueIndex<AccountRecoveryRequestObject, String>>()
        .expect("registered in new")
        .find(&account.to_owned())
}

pub fn apply_request_account_recovery(
    db: &mut Database,
    op: &RequestAccountRecoveryOperation,
) -> Result<(), BlockchainError> {
    let account = db.get_account(&op.account_to_recover)?;
    // only the designated recovery partner may file
    if account.recovery_account != op.recovery_account {
        return Err(BlockchainError::Evaluate(format!(
            "{} is not the recovery partner of {}",
            op.recovery_account, op.account_to_recover
        )));
    }
    for name in op.new_owner_authority.account_auths.keys() {
        db.get_account(name)?;
    }

    let expires = db
        .head_block_time()
        .add_seconds(ACCOUNT_RECOVERY_REQUEST_EXPIRATION_PERIOD_SEC);
    match find_recovery_request(db, &op.account_to_recover) {
        Some(instance) => db.recovery_requests.modify(instance, |request| {
            request.new_owner_authority = op.new_owner_authority.clone();
            request.expires = expires;
        }),
        None => {
            db.recovery_requests.create(|request| {
                request.account_to_recover = op.account_to_recover.clone();
                request.new_owner_authority = op.new_owner_authority.clone();
                request.expires = expires;
            });
            Ok(())
        }
    }
}

pub fn apply_recover_account(
    db: &mut Database,
    op: &RecoverAccountOperation,
) -> Result<(), BlockchainError> {
    let now = db.head_block_time();
    let account = db.get_account(&op.account_to_recover)?;

    // owner rotations (recoveries included) are rate limited
    if account.last_owner_update != muse_common::time::TimePointSec::zero()
        && now.elapsed_since(account.last_owner_update) < OWNER_UPDATE_LIMIT_SEC
    {
        return Err(BlockchainError::Evaluate(
            "owner authority can only be updated once an hour".to_owned(),
        ));
    }

    let request_instance = find_recovery_request(db, &op.account_to_recover).ok_or_else(|| {
        BlockchainError::Evaluate(format!(
            "no recovery request is pending for {}",
            op.account_to_recover
        ))
    })?;
    let request = db.recovery_requests.get(request_instance)?;
    if request.new_owner_authority != op.new_owner_authority {
        return Err(BlockchainError::Evaluate(
            "new owner authority does not match the pending request".to_owned(),
        ));
    }

    // the proven authority must have been the owner within the recovery
    // window; the current owner qualifies as well
    let current_owner = account.owner.clone();
    let recent_ok = op.recent_owner_authority == current_owner || {
        let index = db
            .owner_authority_histories
            .index::<MultiIndex<OwnerAuthorityHistoryObject, String>>()
            .expect("registered in new");
        index
            .find(&op.account_to_recover)
            .iter()
            .filter_map(|instance| db.owner_authority_histories.find(*instance))
            .any(|history| {
                history.previous_owner_authority == op.recent_owner_authority
                    && now.elapsed_since(history.last_valid_time) <= OWNER_AUTH_RECOVERY_PERIOD_SEC
            })
    };
    if !recent_ok {
        return Err(BlockchainError::Evaluate(
            "recent owner authority was not valid within the recovery window".to_owned(),
        ));
    }

    let name = op.account_to_recover.clone();
    db.owner_authority_histories.create(|history| {
        history.account = name;
        history.previous_owner_authority = current_owner;
        history.last_valid_time = now;
    });
    db.modify_account(&op.account_to_recover, |account| {
        account.owner = op.new_owner_authority.clone();
        account.last_owner_update = now;
    })?;
    db.recovery_requests.remove(request_instance)
}

pub fn apply_change_recovery_account(
    db: &mut Database,
    op: &ChangeRecoveryAccountOperation,
) -> Result<(), BlockchainError> {
    db.get_account(&op.new_recovery_account)?;
    db.get_account(&op.account_to_recover)?;

    let effective_on = db
        .head_block_time()
        .add_seconds(CHANGE_RECOVERY_ACCOUNT_DELAY_SEC);
    let existing = db
        .change_recovery_requests
        .index::<UniqueIndex<ChangeRecoveryAccountRequestObject, String>>()
        .expect("registered in new")
        .find(&op.account_to_recover);
    match existing {
        Some(instance) => db.change_recovery_requests.modify(instance, |request| {
            request.recovery_account = op.new_recovery_account.clone();
            request.effective_on = effective_on;
        }),
        None => {
            db.change_recovery_requests.create(|request| {
                request.account_to_recover = op.account_to_recover.clone();
                request.recovery_account = op.new_recovery_account.clone();
                request.effective_on = effective_on;
            });
            Ok(())
        }
    }
}
