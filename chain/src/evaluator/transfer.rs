use log::trace;

use muse_common::{
    asset::Asset,
    config::{
        HUNDRED_PERCENT, MAX_WITHDRAW_ROUTES, VESTING_WITHDRAW_INTERVALS,
        VESTING_WITHDRAW_INTERVAL_SECONDS, VESTS_SYMBOL,
    },
    operation::{
        EscrowDisputeOperation, EscrowReleaseOperation, EscrowTransferOperation,
        SetWithdrawVestingRouteOperation, TransferOperation, TransferToVestingOperation,
        WithdrawVestingOperation,
    },
    time::TimePointSec,
};

use crate::{
    database::Database,
    db::{MultiIndex, UniqueIndex},
    error::BlockchainError,
    object::{AccountObject, EscrowObject, WithdrawVestingRouteObject},
};

// Asset holding restrictions were never enforced on the recorded chain;
// this stays permissive for compatibility.
pub(crate) fn is_authorized_asset(
    _db: &Database,
    _account: &AccountObject,
    _asset_instance: u64,
) -> bool {
    true
}

pub fn apply_transfer(db: &mut Database, op: &TransferOperation) -> Result<(), BlockchainError> {
    if op.amount.asset_id == VESTS_SYMBOL {
        return Err(BlockchainError::Evaluate(
            "vesting shares are not transferable".to_owned(),
        ));
    }
    let asset = db.get_asset(op.amount.asset_id)?;
    if asset.is_transfer_restricted() && asset.issuer != op.from && asset.issuer != op.to {
        return Err(BlockchainError::Evaluate(format!(
            "asset {} only moves to or from its issuer",
            asset.symbol
        )));
    }

    let from = db.get_account(&op.from)?;
    if !is_authorized_asset(db, from, op.amount.asset_id.instance()) {
        return Err(BlockchainError::Evaluate("unauthorized asset".to_owned()));
    }
    db.get_account(&op.to)?;

    db.adjust_balance(&op.from, op.amount.negate())?;
    db.adjust_balance(&op.to, op.amount)?;
    trace!("transferred {} from {} to {}", op.amount, op.from, op.to);
    Ok(())
}

pub fn apply_transfer_to_vesting(
    db: &mut Database,
    op: &TransferToVestingOperation,
) -> Result<(), BlockchainError> {
    let to = if op.to.is_empty() { &op.from } else { &op.to };
    db.get_account(&op.from)?;
    db.get_account(to)?;

    db.adjust_balance(&op.from, op.amount.negate())?;
    let to = to.clone();
    db.create_vesting(&to, op.amount)?;
    Ok(())
}

pub fn apply_withdraw_vesting(
    db: &mut Database,
    op: &WithdrawVestingOperation,
) -> Result<(), BlockchainError> {
    let account = db.get_account(&op.account)?;

    if op.vesting_shares.amount == 0 {
        // cancel a running withdrawal
        if account.vesting_withdraw_rate == 0 {
            return Err(BlockchainError::Evaluate(
                "no withdrawal to cancel".to_owned(),
            ));
        }
        return db.modify_account(&op.account, |account| {
            account.vesting_withdraw_rate = 0;
            account.to_withdraw = 0;
            account.withdrawn = 0;
            account.next_vesting_withdrawal = TimePointSec::maximum();
        });
    }

    if account.vesting_shares < op.vesting_shares.amount {
        return Err(BlockchainError::InsufficientFunds {
            account: op.account.clone(),
            available: account.vesting_shares_asset(),
            required: op.vesting_shares,
        });
    }

    // 13 weekly tranches; integer division pushes the remainder into the
    // final tranche via the to_withdraw bookkeeping
    let mut rate = op.vesting_shares.amount / VESTING_WITHDRAW_INTERVALS as i64;
    if rate == 0 {
        rate = 1;
    }
    let now = db.head_block_time();
    db.modify_account(&op.account, |account| {
        account.vesting_withdraw_rate = rate;
        account.to_withdraw = op.vesting_shares.amount;
        account.withdrawn = 0;
        account.next_vesting_withdrawal = now.add_seconds(VESTING_WITHDRAW_INTERVAL_SECONDS);
    })
}

fn find_route(db: &Database, from: &str, to: &str) -> Option<u64> {
    db.withdraw_routes
        .index::<UniqueIndex<WithdrawVestingRouteObject, (String, String)>>()
        .expect("registered in new")
        .find(&(from.to_owned(), to.to_owned()))
}

pub(crate) fn routes_from(db: &Database, from: &str) -> Vec<WithdrawVestingRouteObject> {
    let index = db
        .withdraw_routes
        .index::<MultiIndex<WithdrawVestingRouteObject, String>>()
        .expect("registered in new");
    index
        .find(&from.to_owned())
        .iter()
        .filter_map(|instance| db.withdraw_routes.find(*instance))
        .cloned()
        .collect()
}

pub fn apply_set_withdraw_vesting_route(
    db: &mut Database,
    op: &SetWithdrawVestingRouteOperation,
) -> Result<(), BlockchainError> {
    db.get_account(&op.from_account)?;
    db.get_account(&op.to_account)?;

    let existing = find_route(db, &op.from_account, &op.to_account);
    match existing {
        None if op.percent == 0 => {
            return Err(BlockchainError::Evaluate("no route to remove".to_owned()))
        }
        None => {
            let routes = db.get_account(&op.from_account)?.withdraw_routes;
            if routes as usize >= MAX_WITHDRAW_ROUTES {
                return Err(BlockchainError::Evaluate(format!(
                    "accounts may have at most {MAX_WITHDRAW_ROUTES} withdraw routes"
                )));
            }
            db.withdraw_routes.create(|route| {
                route.from_account = op.from_account.clone();
                route.to_account = op.to_account.clone();
                route.percent = op.percent;
                route.auto_vest = op.auto_vest;
            });
            db.modify_account(&op.from_account, |account| {
                account.withdraw_routes += 1;
            })?;
        }
        Some(instance) if op.percent == 0 => {
            db.withdraw_routes.remove(instance)?;
            db.modify_account(&op.from_account, |account| {
                account.withdraw_routes -= 1;
            })?;
        }
        Some(instance) => {
            db.withdraw_routes.modify(instance, |route| {
                route.percent = op.percent;
                route.auto_vest = op.auto_vest;
            })?;
        }
    }

    // combined routing may not exceed 100%
    let total: u32 = routes_from(db, &op.from_account)
        .iter()
        .map(|route| route.percent as u32)
        .sum();
    if total > HUNDRED_PERCENT {
        return Err(BlockchainError::Evaluate(format!(
            "withdraw routes exceed 100%: {total} bp"
        )));
    }
    Ok(())
}

fn find_escrow(db: &Database, from: &str, escrow_id: u32) -> Option<u64> {
    db.escrows
        .index::<UniqueIndex<EscrowObject, (String, u32)>>()
        .expect("registered in new")
        .find(&(from.to_owned(), escrow_id))
}

pub fn apply_escrow_transfer(
    db: &mut Database,
    op: &EscrowTransferOperation,
) -> Result<(), BlockchainError> {
    db.get_account(&op.to)?;
    db.get_account(&op.agent)?;
    db.get_account(&op.from)?;
    if find_escrow(db, &op.from, op.escrow_id).is_some() {
        return Err(BlockchainError::DuplicateEntity(format!(
            "escrow {}:{}",
            op.from, op.escrow_id
        )));
    }
    if op.expiration <= db.head_block_time() {
        return Err(BlockchainError::Evaluate(
            "escrow expiration is in the past".to_owned(),
        ));
    }

    db.adjust_balance(&op.from, op.amount.negate())?;
    db.adjust_balance(&op.from, op.fee.negate())?;

    db.escrows.create(|escrow| {
        escrow.escrow_id = op.escrow_id;
        escrow.from = op.from.clone();
        escrow.to = op.to.clone();
        escrow.agent = op.agent.clone();
        escrow.balance = op.amount;
        escrow.pending_fee = op.fee;
        escrow.expiration = op.expiration;
    });
    Ok(())
}

pub fn apply_escrow_dispute(
    db: &mut Database,
    op: &EscrowDisputeOperation,
) -> Result<(), BlockchainError> {
    let instance = find_escrow(db, &op.from, op.escrow_id)
        .ok_or_else(|| BlockchainError::Evaluate("unknown escrow".to_owned()))?;
    let escrow = db.escrows.get(instance)?;
    if escrow.to != op.to || (op.who != escrow.from && op.who != escrow.to) {
        return Err(BlockchainError::Evaluate(
            "only the escrow parties may dispute".to_owned(),
        ));
    }
    if escrow.disputed {
        return Err(BlockchainError::Evaluate("escrow already disputed".to_owned()));
    }
    if escrow.expiration <= db.head_block_time() {
        return Err(BlockchainError::Evaluate(
            "expired escrows cannot be disputed".to_owned(),
        ));
    }
    db.escrows.modify(instance, |escrow| {
        escrow.disputed = true;
    })
}

pub fn apply_escrow_release(
    db: &mut Database,
    op: &EscrowReleaseOperation,
) -> Result<(), BlockchainError> {
    let instance = find_escrow(db, &op.from, op.escrow_id)
        .ok_or_else(|| BlockchainError::Evaluate("unknown escrow".to_owned()))?;
    let escrow = db.escrows.get(instance)?.clone();
    if escrow.to != op.to {
        return Err(BlockchainError::Evaluate("escrow party mismatch".to_owned()));
    }
    if op.amount.asset_id != escrow.balance.asset_id || op.amount.amount > escrow.balance.amount {
        return Err(BlockchainError::InsufficientFunds {
            account: format!("escrow {}:{}", escrow.from, escrow.escrow_id),
            available: escrow.balance,
            required: op.amount,
        });
    }

    let expired = escrow.expiration <= db.head_block_time();
    // disputed escrows are settled by the agent towards the receiver;
    // before expiration either party releases to the other; afterwards
    // the releasing party reclaims to itself
    let receiver = if escrow.disputed {
        if op.who != escrow.agent {
            return Err(BlockchainError::Evaluate(
                "disputed escrows are released by the agent".to_owned(),
            ));
        }
        escrow.to.clone()
    } else if op.who == escrow.from || op.who == escrow.to {
        if expired {
            op.who.clone()
        } else if op.who == escrow.from {
            escrow.to.clone()
        } else {
            escrow.from.clone()
        }
    } else {
        return Err(BlockchainError::Evaluate(
            "only the escrow parties may release".to_owned(),
        ));
    };

    db.adjust_balance(&receiver, op.amount)?;
    let remaining = escrow.balance.amount - op.amount.amount;
    if remaining == 0 {
        // settle the agent fee and close
        if escrow.pending_fee.amount > 0 {
            db.adjust_balance(&escrow.agent, escrow.pending_fee)?;
        }
        db.escrows.remove(instance)?;
    } else {
        db.escrows.modify(instance, |escrow| {
            escrow.balance.amount = remaining;
        })?;
    }
    Ok(())
}
