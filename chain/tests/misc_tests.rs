// Escrow, friendship bookkeeping, consensus no-ops and genesis balance
// claims.

mod common;

use common::TestNet;
use muse_chain::BlockchainError;
use muse_common::{
    asset::Asset,
    config::MUSE_SYMBOL,
    crypto::PrivateKey,
    operation::{
        BalanceClaimOperation, CustomJsonOperation, EscrowDisputeOperation,
        EscrowReleaseOperation, EscrowTransferOperation, FriendshipOperation, Operation,
        UnfriendOperation,
    },
};

fn escrow_setup() -> TestNet {
    let mut net = TestNet::new();
    for name in ["alice", "bob", "judge"] {
        net.create_account(name);
    }
    net.fund("alice", 1_000_000);
    net.push_tx(
        vec![Operation::EscrowTransfer(EscrowTransferOperation {
            from: "alice".to_owned(),
            to: "bob".to_owned(),
            agent: "judge".to_owned(),
            escrow_id: 1,
            amount: Asset::new(100_000, MUSE_SYMBOL),
            fee: Asset::new(1_000, MUSE_SYMBOL),
            json_meta: String::new(),
            expiration: net.db.head_block_time().add_seconds(3_000),
        })],
        &["alice"],
    )
    .expect("escrow");
    net
}

#[test]
fn escrow_holds_and_releases_funds() {
    let mut net = escrow_setup();
    assert_eq!(net.balance("alice", MUSE_SYMBOL), 899_000);

    // alice releases to bob; the agent fee settles on close
    net.push_tx(
        vec![Operation::EscrowRelease(EscrowReleaseOperation {
            from: "alice".to_owned(),
            to: "bob".to_owned(),
            escrow_id: 1,
            who: "alice".to_owned(),
            amount: Asset::new(100_000, MUSE_SYMBOL),
        })],
        &["alice"],
    )
    .expect("release");

    assert_eq!(net.balance("bob", MUSE_SYMBOL), 100_000);
    assert_eq!(net.balance("judge", MUSE_SYMBOL), 1_000);
    assert!(net.db.escrows.is_empty());
    net.db.validate_invariants().unwrap();
}

#[test]
fn disputed_escrow_is_settled_by_the_agent() {
    let mut net = escrow_setup();
    net.push_tx(
        vec![Operation::EscrowDispute(EscrowDisputeOperation {
            from: "alice".to_owned(),
            to: "bob".to_owned(),
            escrow_id: 1,
            who: "bob".to_owned(),
        })],
        &["bob"],
    )
    .expect("dispute");

    // the parties may no longer release
    let release = |who: &str| {
        Operation::EscrowRelease(EscrowReleaseOperation {
            from: "alice".to_owned(),
            to: "bob".to_owned(),
            escrow_id: 1,
            who: who.to_owned(),
            amount: Asset::new(100_000, MUSE_SYMBOL),
        })
    };
    let err = net.push_tx(vec![release("alice")], &["alice"]).unwrap_err();
    assert!(matches!(err, BlockchainError::Evaluate(_)));

    net.push_tx(vec![release("judge")], &["judge"]).expect("agent settles");
    assert_eq!(net.balance("bob", MUSE_SYMBOL), 100_000);
}

#[test]
fn friendship_requires_reciprocity() {
    let mut net = TestNet::new();
    net.create_account("alice");
    net.create_account("bob");

    let offer = |who: &str, whom: &str| {
        Operation::Friendship(FriendshipOperation {
            who: who.to_owned(),
            whom: whom.to_owned(),
        })
    };
    net.push_tx(vec![offer("alice", "bob")], &["alice"]).expect("offer");
    let bob = net.db.get_account("bob").unwrap();
    assert!(bob.pending_friend_requests.contains("alice"));
    assert!(bob.friends.is_empty());

    net.push_tx(vec![offer("bob", "alice")], &["bob"]).expect("accept");
    assert!(net.db.get_account("bob").unwrap().friends.contains("alice"));
    assert!(net.db.get_account("alice").unwrap().friends.contains("bob"));

    net.push_tx(
        vec![Operation::Unfriend(UnfriendOperation {
            who: "alice".to_owned(),
            whom: "bob".to_owned(),
        })],
        &["alice"],
    )
    .expect("unfriend");
    assert!(net.db.get_account("bob").unwrap().friends.is_empty());
    assert!(net.db.get_account("alice").unwrap().friends.is_empty());
}

#[test]
fn custom_json_is_a_consensus_noop() {
    let mut net = TestNet::new();
    net.create_account("alice");
    let before = net.db.state_digest();

    let tx = net.sign_tx(
        vec![Operation::CustomJson(CustomJsonOperation {
            required_auths: Default::default(),
            required_basic_auths: ["alice".to_owned()].into_iter().collect(),
            id: "follow".to_owned(),
            json: r#"{"follower":"alice","following":"bob"}"#.to_owned(),
        })],
        &["alice"],
    );
    net.produce_block_with(vec![tx]).expect("custom json");

    // only block bookkeeping changed; undoing the block restores all
    net.db.pop_block().unwrap();
    assert_eq!(net.db.state_digest(), before);
}

#[test]
fn genesis_balances_are_claimed_in_full_by_their_key() {
    let mut net = TestNet::new();
    net.create_account("alice");

    let owner_key = PrivateKey::from_seed("cold-wallet");
    let public = owner_key.public_key();
    // a premined balance object, the migration path for snapshot funds
    net.db
        .adjust_supply(Asset::new(777_000, MUSE_SYMBOL))
        .unwrap();
    let balance_instance = {
        let public = public.clone();
        net.db
            .balances
            .create(move |balance| {
                balance.owner_key = public;
                balance.balance = Asset::new(777_000, MUSE_SYMBOL);
            })
            .id
    };

    let claim = |amount: i64| {
        Operation::BalanceClaim(BalanceClaimOperation {
            deposit_to_account: "alice".to_owned(),
            balance_to_claim: balance_instance,
            balance_owner_key: public.clone(),
            total_claimed: Asset::new(amount, MUSE_SYMBOL),
        })
    };

    // partial claims are refused
    let mut tx = net.sign_tx(vec![claim(1)], &["alice"]);
    tx.sign(&owner_key, net.db.chain_id());
    assert!(net.produce_block_with(vec![tx]).is_err());

    let mut tx = net.sign_tx(vec![claim(777_000)], &["alice"]);
    tx.sign(&owner_key, net.db.chain_id());
    net.produce_block_with(vec![tx]).expect("full claim");

    assert_eq!(net.balance("alice", MUSE_SYMBOL), 777_000);
    assert!(net.db.balances.is_empty());
    net.db.validate_invariants().unwrap();
}
