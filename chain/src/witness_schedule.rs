use sha2::{Digest, Sha256};

use muse_common::config::{MAX_VOTED_WITNESSES, MAX_WITNESSES};

use crate::{database::Database, error::BlockchainError};

/// Recompute the production order at a round boundary: the top voted
/// witnesses plus one timeshare slot for the runner-up that has waited
/// the longest, shuffled deterministically from the head block id.
pub fn update_witness_schedule(db: &mut Database) -> Result<(), BlockchainError> {
    let round = db.head_block_num() as u64 / MAX_WITNESSES as u64;

    // rank by (votes desc, name asc); the name tiebreak keeps the order
    // identical on every node
    let mut ranked: Vec<(i64, String)> = db
        .witnesses
        .iter()
        .map(|witness| (witness.votes, witness.owner.clone()))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    let mut active: Vec<String> = ranked
        .iter()
        .take(MAX_VOTED_WITNESSES)
        .map(|(_, name)| name.clone())
        .collect();

    // timeshare slot: among the remaining candidates, pick the one that
    // has waited the most rounds since it last held the slot
    let runner_up = ranked
        .iter()
        .skip(MAX_VOTED_WITNESSES)
        .filter_map(|(_, name)| db.find_witness(name))
        .min_by_key(|witness| (witness.virtual_scheduled_round, witness.owner.clone()))
        .map(|witness| witness.owner.clone());
    if let Some(name) = runner_up {
        let instance = db.get_witness(&name)?.id;
        db.witnesses.modify(instance, |witness| {
            witness.virtual_scheduled_round = round;
        })?;
        active.push(name);
    }

    if active.is_empty() {
        return Ok(());
    }

    // deterministic shuffle seeded from the head block id
    let seed = db.head_block_id();
    for i in 0..active.len().saturating_sub(1) {
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update((i as u64).to_le_bytes());
        let digest = hasher.finalize();
        let value = u64::from_le_bytes(digest[..8].try_into().expect("sha256 is 32 bytes"));
        let j = i + (value as usize) % (active.len() - i);
        active.swap(i, j);
    }

    // medians of the active witnesses' published properties
    let mut creation_fees: Vec<i64> = Vec::with_capacity(active.len());
    let mut block_sizes: Vec<u32> = Vec::with_capacity(active.len());
    for name in &active {
        let witness = db.get_witness(name)?;
        creation_fees.push(witness.props.account_creation_fee.amount);
        block_sizes.push(witness.props.maximum_block_size);
    }
    creation_fees.sort_unstable();
    block_sizes.sort_unstable();
    let median_fee = creation_fees[creation_fees.len() / 2];
    let median_block_size = block_sizes[block_sizes.len() / 2];

    db.witness_schedules.modify(0, |schedule| {
        schedule.current_shuffled_witnesses = active;
        schedule.current_round = round;
        schedule.next_shuffle_block_num =
            (round + 1) * MAX_WITNESSES as u64;
        schedule.median_props.account_creation_fee.amount = median_fee;
        schedule.median_props.maximum_block_size = median_block_size;
    })?;
    db.modify_dgp(|dgp| {
        dgp.maximum_block_size = median_block_size;
    });
    Ok(())
}

/// Witness scheduled for a slot counted from the block after head.
pub fn get_scheduled_witness(db: &Database, slot_num: u64) -> Option<String> {
    let schedule = db.witness_schedule();
    if schedule.current_shuffled_witnesses.is_empty() {
        return None;
    }
    let current_aslot = db.dgp().current_aslot + slot_num;
    let index = current_aslot as usize % schedule.current_shuffled_witnesses.len();
    Some(schedule.current_shuffled_witnesses[index].clone())
}
