use log::debug;

use muse_common::{
    config::{MAX_ACCOUNT_WITNESS_VOTES, MAX_PROXY_RECURSION_DEPTH},
    operation::{
        AccountWitnessProxyOperation, AccountWitnessVoteOperation, WitnessUpdateOperation,
    },
};

use crate::{
    database::Database, db::UniqueIndex, error::BlockchainError, object::WitnessVoteObject,
};

pub fn apply_witness_update(
    db: &mut Database,
    op: &WitnessUpdateOperation,
) -> Result<(), BlockchainError> {
    db.get_account(&op.owner)?;

    if let Some(witness) = db.find_witness(&op.owner) {
        let instance = witness.id;
        return db.witnesses.modify(instance, |witness| {
            witness.url = op.url.clone();
            witness.signing_key = op.block_signing_key.clone();
            witness.props = op.props.clone();
        });
    }

    if op.fee.amount > 0 {
        db.adjust_balance(&op.owner, op.fee.negate())?;
        db.adjust_supply(op.fee.negate())?;
    }
    let now = db.head_block_time();
    db.witnesses.create(|witness| {
        witness.owner = op.owner.clone();
        witness.created = now;
        witness.url = op.url.clone();
        witness.signing_key = op.block_signing_key.clone();
        witness.props = op.props.clone();
    });
    debug!("registered witness {}", op.owner);
    Ok(())
}

fn find_witness_vote(db: &Database, account: &str, witness: &str) -> Option<u64> {
    db.witness_votes
        .index::<UniqueIndex<WitnessVoteObject, (String, String)>>()
        .expect("registered in new")
        .find(&(account.to_owned(), witness.to_owned()))
}

pub fn apply_account_witness_vote(
    db: &mut Database,
    op: &AccountWitnessVoteOperation,
) -> Result<(), BlockchainError> {
    let account = db.get_account(&op.account)?;
    if account.has_proxy() {
        return Err(BlockchainError::Evaluate(
            "cannot vote for witnesses while a proxy is set".to_owned(),
        ));
    }
    let weight = account.witness_vote_weight();
    let voted_for = account.witnesses_voted_for;
    let witness_instance = db.get_witness(&op.witness)?.id;

    let existing = find_witness_vote(db, &op.account, &op.witness);
    match (op.approve, existing) {
        (true, Some(_)) => Err(BlockchainError::Evaluate(format!(
            "{} already votes for witness {}",
            op.account, op.witness
        ))),
        (true, None) => {
            if voted_for as usize >= MAX_ACCOUNT_WITNESS_VOTES {
                return Err(BlockchainError::Evaluate(format!(
                    "accounts may vote for at most {MAX_ACCOUNT_WITNESS_VOTES} witnesses"
                )));
            }
            db.witness_votes.create(|vote| {
                vote.witness = op.witness.clone();
                vote.account = op.account.clone();
            });
            db.witnesses.modify(witness_instance, |witness| {
                witness.votes += weight;
            })?;
            db.modify_account(&op.account, |account| {
                account.witnesses_voted_for += 1;
            })
        }
        (false, Some(vote_instance)) => {
            db.witness_votes.remove(vote_instance)?;
            db.witnesses.modify(witness_instance, |witness| {
                witness.votes -= weight;
            })?;
            db.modify_account(&op.account, |account| {
                account.witnesses_voted_for -= 1;
            })
        }
        (false, None) => Err(BlockchainError::Evaluate(format!(
            "{} does not vote for witness {}",
            op.account, op.witness
        ))),
    }
}

pub fn apply_account_witness_proxy(
    db: &mut Database,
    op: &AccountWitnessProxyOperation,
) -> Result<(), BlockchainError> {
    let account = db.get_account(&op.account)?;
    if account.proxy == op.proxy {
        return Err(BlockchainError::Evaluate(
            "proxy must change".to_owned(),
        ));
    }
    let weight = account.witness_vote_weight();

    if !op.proxy.is_empty() {
        // the proxy chain must stay shallow and acyclic
        let mut current = op.proxy.clone();
        for _ in 0..MAX_PROXY_RECURSION_DEPTH {
            if current == op.account {
                return Err(BlockchainError::Evaluate(
                    "proxy chain may not loop back".to_owned(),
                ));
            }
            let next = db.get_account(&current)?;
            if !next.has_proxy() {
                break;
            }
            current = next.proxy.clone();
        }
        if current == op.account {
            return Err(BlockchainError::Evaluate(
                "proxy chain may not loop back".to_owned(),
            ));
        }
    }

    // pull this account's stake out of wherever it currently lands
    db.adjust_proxied_witness_votes(&op.account, -weight)?;

    if !op.proxy.is_empty() {
        // delegating clears direct votes; their weight left with the
        // adjustment above
        let votes: Vec<u64> = db
            .witness_votes
            .iter()
            .filter(|vote| vote.account == op.account)
            .map(|vote| vote.id)
            .collect();
        for instance in votes {
            db.witness_votes.remove(instance)?;
        }
        db.modify_account(&op.account, |account| {
            account.witnesses_voted_for = 0;
        })?;
    }

    db.modify_account(&op.account, |account| {
        account.proxy = op.proxy.clone();
    })?;

    // and push it along the new chain
    db.adjust_proxied_witness_votes(&op.account, weight)
}
