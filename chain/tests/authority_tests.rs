// Recursive authority resolution against recovered signature keys.

mod common;

use common::TestNet;
use muse_chain::authority_check::{verify_authority, AuthorityLevel, SignState};
use muse_chain::BlockchainError;
use muse_common::{
    authority::Authority,
    crypto::PrivateKey,
    operation::RequiredAuthorities,
};

fn key(name: &str) -> muse_common::crypto::PublicKey {
    PrivateKey::from_seed(name).public_key()
}

// Account x's active requires y's active, y's requires z's. A signature
// by z satisfies x at depth two; a fourth account in the chain is beyond
// the signature check depth.
#[test]
fn authority_depth_is_capped_at_two() {
    let mut net = TestNet::new();
    for name in ["xxx", "yyy", "zzz", "www"] {
        net.create_account(name);
    }
    let db = &mut net.db;

    db.modify_account("xxx", |account| {
        account.active = Authority::single_account("yyy");
    })
    .unwrap();
    db.modify_account("yyy", |account| {
        account.active = Authority::single_account("zzz");
    })
    .unwrap();

    let mut required = RequiredAuthorities::default();
    required.active.insert("xxx".to_owned());

    // z's key reaches x through two account hops
    verify_authority(db, &required, &[key("zzz")]).unwrap();

    // a third hop through w is rejected
    db.modify_account("zzz", |account| {
        account.active = Authority::single_account("www");
    })
    .unwrap();
    let err = verify_authority(db, &required, &[key("www")]).unwrap_err();
    assert!(matches!(err, BlockchainError::MissingActiveAuthority(name) if name == "xxx"));
}

#[test]
fn owner_satisfies_active_satisfies_basic() {
    let mut net = TestNet::new();
    net.create_account("alice");
    net.db
        .modify_account("alice", |account| {
            account.owner = Authority::single_key(key("alice-owner"));
            account.active = Authority::single_key(key("alice-active"));
            account.basic = Authority::single_key(key("alice-basic"));
        })
        .unwrap();
    let db = &net.db;

    let mut basic_required = RequiredAuthorities::default();
    basic_required.basic.insert("alice".to_owned());

    for signer in ["alice-basic", "alice-active", "alice-owner"] {
        verify_authority(db, &basic_required, &[key(signer)]).unwrap();
    }

    let mut owner_required = RequiredAuthorities::default();
    owner_required.owner.insert("alice".to_owned());
    verify_authority(db, &owner_required, &[key("alice-owner")]).unwrap();
    assert!(matches!(
        verify_authority(db, &owner_required, &[key("alice-active")]),
        Err(BlockchainError::MissingOwnerAuthority(_))
    ));
}

#[test]
fn weighted_multisig_threshold() {
    let mut net = TestNet::new();
    net.create_account("vault");
    net.db
        .modify_account("vault", |account| {
            account.active = Authority::new(2)
                .add_key(key("k1"), 1)
                .add_key(key("k2"), 1)
                .add_key(key("k3"), 1);
        })
        .unwrap();

    let mut required = RequiredAuthorities::default();
    required.active.insert("vault".to_owned());

    assert!(matches!(
        verify_authority(&net.db, &required, &[key("k1")]),
        Err(BlockchainError::MissingActiveAuthority(_))
    ));
    verify_authority(&net.db, &required, &[key("k1"), key("k3")]).unwrap();
}

#[test]
fn duplicate_and_irrelevant_signatures() {
    let mut net = TestNet::new();
    net.create_account("alice");
    let db = &net.db;

    let mut required = RequiredAuthorities::default();
    required.active.insert("alice".to_owned());

    assert!(matches!(
        verify_authority(db, &required, &[key("alice"), key("alice")]),
        Err(BlockchainError::DuplicateSignature)
    ));
    assert!(matches!(
        verify_authority(db, &required, &[key("alice"), key("stranger")]),
        Err(BlockchainError::IrrelevantSignature(_))
    ));
}

#[test]
fn proposal_approvals_count_as_account_authority() {
    let mut net = TestNet::new();
    net.create_account("alice");
    let db = &net.db;

    let mut state = SignState::new(db, std::iter::empty::<muse_common::crypto::PublicKey>())
        .with_approvals(
        ["alice".to_owned()].into_iter().collect(),
        Default::default(),
    );
    assert!(state.check_account_authority("alice", AuthorityLevel::Active));
    assert!(!state.check_account_authority("alice", AuthorityLevel::Owner));
}
