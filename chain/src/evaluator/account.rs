use log::debug;

use muse_common::{
    asset::Asset,
    authority::Authority,
    config::{
        ACTIVE_CHALLENGE_FEE, MIN_ACCOUNT_CREATION_FEE, MUSE_SYMBOL, OWNER_CHALLENGE_FEE,
        OWNER_UPDATE_LIMIT_SEC,
    },
    operation::{
        AccountCreateOperation, AccountUpdateOperation, BalanceClaimOperation,
        ChallengeAuthorityOperation, FriendshipOperation, ProveAuthorityOperation,
        UnfriendOperation,
    },
};

use crate::{database::Database, error::BlockchainError};

// Referenced authority accounts must exist before they can guard anything
fn check_authority_accounts(db: &Database, authority: &Authority) -> Result<(), BlockchainError> {
    for name in authority.account_auths.keys() {
        db.get_account(name)?;
    }
    Ok(())
}

pub fn apply_account_create(
    db: &mut Database,
    op: &AccountCreateOperation,
) -> Result<(), BlockchainError> {
    db.get_account(&op.creator)?;
    if db.find_account(&op.new_account_name).is_some() {
        return Err(BlockchainError::DuplicateEntity(format!(
            "account {}",
            op.new_account_name
        )));
    }

    let required_fee = db
        .witness_schedule()
        .median_props
        .account_creation_fee
        .amount
        .max(MIN_ACCOUNT_CREATION_FEE);
    if op.fee.amount < required_fee {
        return Err(BlockchainError::Evaluate(format!(
            "account creation fee {} is below the required {}",
            op.fee.amount, required_fee
        )));
    }

    check_authority_accounts(db, &op.owner)?;
    check_authority_accounts(db, &op.active)?;
    check_authority_accounts(db, &op.basic)?;

    db.adjust_balance(&op.creator, op.fee.negate())?;

    let now = db.head_block_time();
    db.accounts.create(|account| {
        account.name = op.new_account_name.clone();
        account.owner = op.owner.clone();
        account.active = op.active.clone();
        account.basic = op.basic.clone();
        account.memo_key = op.memo_key.clone();
        account.json_metadata = op.json_metadata.clone();
        account.recovery_account = op.creator.clone();
        account.created = now;
    });

    // the creation fee seeds the new account's vesting
    if op.fee.amount > 0 {
        db.create_vesting(&op.new_account_name, op.fee)?;
    }
    debug!("created account {}", op.new_account_name);
    Ok(())
}

pub fn apply_account_update(
    db: &mut Database,
    op: &AccountUpdateOperation,
) -> Result<(), BlockchainError> {
    let account = db.get_account(&op.account)?;
    let now = db.head_block_time();

    if let Some(owner) = &op.owner {
        // owner rotation is rate limited and archived for recovery
        if now.elapsed_since(account.last_owner_update) < OWNER_UPDATE_LIMIT_SEC
            && account.last_owner_update != muse_common::time::TimePointSec::zero()
        {
            return Err(BlockchainError::Evaluate(
                "owner authority can only be updated once an hour".to_owned(),
            ));
        }
        check_authority_accounts(db, owner)?;
        let previous = account.owner.clone();
        let name = op.account.clone();
        db.owner_authority_histories.create(|history| {
            history.account = name;
            history.previous_owner_authority = previous;
            history.last_valid_time = now;
        });
    }
    if let Some(active) = &op.active {
        check_authority_accounts(db, active)?;
    }
    if let Some(basic) = &op.basic {
        check_authority_accounts(db, basic)?;
    }

    db.modify_account(&op.account, |account| {
        if let Some(owner) = &op.owner {
            account.owner = owner.clone();
            account.last_owner_update = now;
        }
        if let Some(active) = &op.active {
            account.active = active.clone();
        }
        if let Some(basic) = &op.basic {
            account.basic = basic.clone();
        }
        if let Some(memo_key) = &op.memo_key {
            account.memo_key = memo_key.clone();
        }
        if !op.json_metadata.is_empty() {
            account.json_metadata = op.json_metadata.clone();
        }
    })
}

pub fn apply_challenge_authority(
    db: &mut Database,
    op: &ChallengeAuthorityOperation,
) -> Result<(), BlockchainError> {
    db.get_account(&op.challenged)?;
    let fee = if op.require_owner {
        OWNER_CHALLENGE_FEE
    } else {
        ACTIVE_CHALLENGE_FEE
    };
    db.adjust_balance(&op.challenger, Asset::new(-fee, MUSE_SYMBOL))?;
    db.adjust_supply(Asset::new(-fee, MUSE_SYMBOL))?;
    db.modify_account(&op.challenged, |account| {
        account.challenged = true;
    })
}

pub fn apply_prove_authority(
    db: &mut Database,
    op: &ProveAuthorityOperation,
) -> Result<(), BlockchainError> {
    let account = db.get_account(&op.challenged)?;
    if !account.challenged {
        return Err(BlockchainError::Evaluate(format!(
            "account {} is not challenged",
            op.challenged
        )));
    }
    db.modify_account(&op.challenged, |account| {
        account.challenged = false;
    })
}

pub fn apply_friendship(db: &mut Database, op: &FriendshipOperation) -> Result<(), BlockchainError> {
    db.get_account(&op.whom)?;
    let who = db.get_account(&op.who)?;

    if who.friends.contains(&op.whom) {
        return Ok(());
    }
    // reciprocal offer completes the friendship, otherwise it stays
    // pending on the receiving side
    if who.pending_friend_requests.contains(&op.whom) {
        db.modify_account(&op.who, |account| {
            account.pending_friend_requests.remove(&op.whom);
            account.friends.insert(op.whom.clone());
        })?;
        db.modify_account(&op.whom, |account| {
            account.friends.insert(op.who.clone());
        })?;
        return Ok(());
    }
    db.modify_account(&op.whom, |account| {
        account.pending_friend_requests.insert(op.who.clone());
    })
}

pub fn apply_unfriend(db: &mut Database, op: &UnfriendOperation) -> Result<(), BlockchainError> {
    db.get_account(&op.who)?;
    db.get_account(&op.whom)?;
    db.modify_account(&op.who, |account| {
        account.friends.remove(&op.whom);
        account.pending_friend_requests.remove(&op.whom);
    })?;
    db.modify_account(&op.whom, |account| {
        account.friends.remove(&op.who);
        account.pending_friend_requests.remove(&op.who);
    })
}

pub fn apply_balance_claim(
    db: &mut Database,
    op: &BalanceClaimOperation,
) -> Result<(), BlockchainError> {
    db.get_account(&op.deposit_to_account)?;
    let balance = db.balances.get(op.balance_to_claim)?;
    if balance.owner_key != op.balance_owner_key {
        return Err(BlockchainError::Evaluate(
            "claimed key does not own this balance".to_owned(),
        ));
    }
    if balance.balance != op.total_claimed {
        return Err(BlockchainError::Evaluate(format!(
            "balance must be claimed in full: {} available",
            balance.balance
        )));
    }
    let amount = balance.balance;
    db.balances.remove(op.balance_to_claim)?;
    db.adjust_balance(&op.deposit_to_account, amount)
}
