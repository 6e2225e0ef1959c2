// Undo-session semantics of the object store: identifier reuse after an
// abandoned session, merge folding and snapshot restoration.

mod common;

use common::TestNet;
use muse_chain::object::ChainObject;

#[test]
fn undo_test() {
    let mut net = TestNet::new();
    let db = &mut net.db;

    db.start_undo_session();
    let id1 = db
        .streaming_platforms
        .create(|_| {
            // no owner right now
        })
        .instance();
    // abandon changes
    db.undo_session().unwrap();

    // a new session reuses the released identifier
    db.start_undo_session();
    let id2 = db.streaming_platforms.create(|_| {}).instance();
    assert_eq!(id1, id2);
    db.undo_session().unwrap();
}

#[test]
fn merge_test() {
    let mut net = TestNet::new();
    let db = &mut net.db;

    db.start_undo_session();
    db.streaming_platforms.create(|platform| {
        platform.owner = "42".to_owned();
    });
    db.merge_session().unwrap();

    let platform = net.db.find_streaming_platform("42").expect("kept after merge");
    assert_eq!(platform.owner, "42");
}

#[test]
fn nested_merge_folds_into_parent() {
    let mut net = TestNet::new();
    let db = &mut net.db;
    let before = db.state_digest();

    db.start_undo_session();
    db.streaming_platforms.create(|platform| {
        platform.owner = "outer".to_owned();
    });

    db.start_undo_session();
    db.streaming_platforms.create(|platform| {
        platform.owner = "inner".to_owned();
    });
    // fold the inner session into the outer one
    db.merge_session().unwrap();
    assert!(db.find_streaming_platform("inner").is_some());

    // undoing the outer session now reverts both
    db.undo_session().unwrap();
    assert!(db.find_streaming_platform("outer").is_none());
    assert!(db.find_streaming_platform("inner").is_none());
    assert_eq!(db.state_digest(), before);
}

#[test]
fn undo_restores_modified_and_removed_rows() {
    let mut net = TestNet::new();
    let db = &mut net.db;

    let id = db
        .streaming_platforms
        .create(|platform| {
            platform.owner = "spotify".to_owned();
        })
        .instance();
    let before = db.state_digest();

    db.start_undo_session();
    db.streaming_platforms
        .modify(id, |platform| {
            platform.votes = 99;
        })
        .unwrap();
    db.streaming_platforms.remove(id).unwrap();
    assert!(db.find_streaming_platform("spotify").is_none());

    db.undo_session().unwrap();
    let platform = db.find_streaming_platform("spotify").expect("restored");
    assert_eq!(platform.votes, 0);
    assert_eq!(db.state_digest(), before);
}

#[test]
fn secondary_indices_follow_undo() {
    let mut net = TestNet::new();
    let db = &mut net.db;

    db.start_undo_session();
    db.streaming_platforms.create(|platform| {
        platform.owner = "deezer".to_owned();
    });
    assert!(db.find_streaming_platform("deezer").is_some());
    db.undo_session().unwrap();

    // the by-owner index must not keep a dangling entry
    assert!(db.find_streaming_platform("deezer").is_none());
}

#[test]
fn block_apply_then_pop_restores_state() {
    let mut net = TestNet::new();
    net.produce_block();
    let before = net.db.state_digest();
    let head = net.db.head_block_num();

    net.produce_block();
    assert_eq!(net.db.head_block_num(), head + 1);
    assert_ne!(net.db.state_digest(), before);

    net.db.pop_block().unwrap();
    assert_eq!(net.db.head_block_num(), head);
    assert_eq!(net.db.state_digest(), before);
}

#[test]
fn invariants_hold_through_activity() {
    let mut net = TestNet::new();
    net.create_account("alice");
    net.create_account("bob");
    net.fund("alice", 5_000_000);
    net.transfer("alice", "bob", 1_000_000);
    net.produce_blocks(25);

    net.db.validate_invariants().unwrap();
}
