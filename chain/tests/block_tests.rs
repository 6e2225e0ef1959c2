// Block application, scheduling, tapos, duplicates and fork switching.

mod common;

use common::TestNet;
use muse_chain::{genesis, BlockchainError, Database};
use muse_common::{
    block::{BlockHeaderExtension, Version},
    config::{MUSE_SYMBOL, TESTNET_CHAIN_ID},
    crypto::PrivateKey,
};

#[test]
fn produces_and_applies_blocks() {
    let mut net = TestNet::new();
    assert_eq!(net.db.head_block_num(), 0);

    let block = net.produce_block();
    assert_eq!(net.db.head_block_num(), 1);
    assert_eq!(net.db.head_block_id(), block.id());
    assert_eq!(net.db.dgp().current_witness, "initminer");

    net.produce_blocks(10);
    assert_eq!(net.db.head_block_num(), 11);
    net.db.validate_invariants().unwrap();
}

#[test]
fn producer_reward_vests_for_the_witness() {
    let mut net = TestNet::new();
    net.produce_block();
    let vested = net.db.get_account("initminer").unwrap().vesting_shares;
    assert!(vested > 0, "producer reward should vest");

    let supply = net.db.dgp().current_supply.amount;
    assert!(supply > 0);
    net.db.validate_invariants().unwrap();
}

#[test]
fn rejects_wrong_signer_and_wrong_witness() {
    let mut net = TestNet::new();
    let wrong_key = PrivateKey::from_seed("not the init key");
    let err = net
        .db
        .generate_block(1, "initminer", &wrong_key, Vec::new())
        .unwrap_err();
    assert!(matches!(err, BlockchainError::InvalidBlock(_)));

    let err = net
        .db
        .generate_block(1, "nobody", &genesis::init_key(), Vec::new())
        .unwrap_err();
    assert!(matches!(err, BlockchainError::UnexpectedWitness(_)));
}

#[test]
fn rejects_unknown_hardfork_blocks() {
    let mut net = TestNet::new();
    let mut block = net.produce_block();
    // craft a follow-up block that claims a future rule set
    net.db.pop_block().unwrap();

    block.signed_header.header.extensions = vec![BlockHeaderExtension::HardforkVersion(
        Version::new(9, 9, 9),
    )];
    block
        .signed_header
        .sign(&genesis::init_key());
    let err = net.db.push_block(block).unwrap_err();
    assert!(matches!(err, BlockchainError::UnknownHardfork(_)));
}

#[test]
fn transactions_in_blocks_move_funds() {
    let mut net = TestNet::new();
    net.create_account("alice");
    net.create_account("bob");
    net.fund("alice", 1_000_000);

    net.transfer("alice", "bob", 400_000);
    assert_eq!(net.balance("alice", MUSE_SYMBOL), 600_000);
    assert_eq!(net.balance("bob", MUSE_SYMBOL), 400_000);
    net.db.validate_invariants().unwrap();
}

#[test]
fn duplicate_transaction_is_rejected() {
    let mut net = TestNet::new();
    net.create_account("alice");
    net.create_account("bob");
    net.fund("alice", 1_000_000);

    let tx = net.sign_tx(
        vec![muse_common::operation::Operation::Transfer(
            muse_common::operation::TransferOperation {
                from: "alice".to_owned(),
                to: "bob".to_owned(),
                amount: muse_common::asset::Asset::new(1_000, MUSE_SYMBOL),
                memo: String::new(),
            },
        )],
        &["alice"],
    );
    net.produce_block_with(vec![tx.clone()]).unwrap();

    let err = net.produce_block_with(vec![tx]).unwrap_err();
    assert!(matches!(err, BlockchainError::DuplicateTransaction));
    // the failed block left no trace
    assert_eq!(net.balance("bob", MUSE_SYMBOL), 1_000);
}

#[test]
fn failing_transaction_unwinds_the_whole_block() {
    let mut net = TestNet::new();
    net.create_account("alice");
    net.create_account("bob");
    net.fund("alice", 1_000);
    let before = net.db.state_digest();

    let good = net.sign_tx(
        vec![muse_common::operation::Operation::Transfer(
            muse_common::operation::TransferOperation {
                from: "alice".to_owned(),
                to: "bob".to_owned(),
                amount: muse_common::asset::Asset::new(500, MUSE_SYMBOL),
                memo: String::new(),
            },
        )],
        &["alice"],
    );
    let overdraft = net.sign_tx(
        vec![muse_common::operation::Operation::Transfer(
            muse_common::operation::TransferOperation {
                from: "alice".to_owned(),
                to: "bob".to_owned(),
                amount: muse_common::asset::Asset::new(1_000, MUSE_SYMBOL),
                memo: "too much".to_owned(),
            },
        )],
        &["alice"],
    );

    let err = net.produce_block_with(vec![good, overdraft]).unwrap_err();
    assert!(matches!(err, BlockchainError::InsufficientFunds { .. }));
    assert_eq!(net.db.state_digest(), before);
    assert_eq!(net.balance("bob", MUSE_SYMBOL), 0);
}

#[test]
fn unsigned_transaction_is_rejected() {
    let mut net = TestNet::new();
    net.create_account("alice");
    net.create_account("bob");
    net.fund("alice", 1_000_000);

    let tx = net.sign_tx(
        vec![muse_common::operation::Operation::Transfer(
            muse_common::operation::TransferOperation {
                from: "alice".to_owned(),
                to: "bob".to_owned(),
                amount: muse_common::asset::Asset::new(1_000, MUSE_SYMBOL),
                memo: String::new(),
            },
        )],
        &[],
    );
    let err = net.produce_block_with(vec![tx]).unwrap_err();
    assert!(matches!(err, BlockchainError::MissingActiveAuthority(_)));
}

#[test]
fn skipped_slots_mark_missed_witnesses() {
    let mut net = TestNet::new();
    net.produce_block();
    let missed_before = net.db.get_witness("initminer").unwrap().total_missed;

    net.produce_block_at_slot(5);
    let missed_after = net.db.get_witness("initminer").unwrap().total_missed;
    assert_eq!(missed_after, missed_before + 4);
}

// Two nodes share a history, then one extends further; feeding its longer
// branch to the other must switch it over atomically.
#[test]
fn longer_side_branch_wins() {
    let mut a = TestNet::new();
    let mut b = Database::new(TESTNET_CHAIN_ID.clone());
    genesis::init_genesis(&mut b).unwrap();

    // shared prefix
    for _ in 0..3 {
        let block = a.produce_block();
        b.push_block(block).unwrap();
    }

    // `a` continues on slot 1, `b` produces a competing branch on slot 2
    let fork_base = a.db.head_block_id();
    a.produce_block();
    let a_head = a.db.head_block_id();

    let b1 = b
        .generate_block(2, "initminer", &genesis::init_key(), Vec::new())
        .unwrap();
    let b2 = b
        .generate_block(1, "initminer", &genesis::init_key(), Vec::new())
        .unwrap();
    assert_eq!(b1.header().previous, fork_base);

    // b's branch is longer: a switches to it
    a.db.push_block(b1.clone()).unwrap();
    assert_eq!(a.db.head_block_id(), a_head, "equal length does not switch");
    a.db.push_block(b2.clone()).unwrap();
    assert_eq!(a.db.head_block_num(), 5);
    assert_eq!(a.db.head_block_id(), b2.id());
    assert_eq!(a.db.state_digest(), b.state_digest());
}
