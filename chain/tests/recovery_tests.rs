// Owner-key theft recovery: history tracking, the recovery partner's
// request and the joint proof of old and new authorities.

mod common;

use common::TestNet;
use muse_chain::BlockchainError;
use muse_common::{
    authority::Authority,
    config::{ACCOUNT_RECOVERY_REQUEST_EXPIRATION_PERIOD_SEC, OWNER_UPDATE_LIMIT_SEC},
    crypto::{PrivateKey, PublicKey},
    operation::{
        AccountUpdateOperation, ChangeRecoveryAccountOperation, Operation,
        RecoverAccountOperation, RequestAccountRecoveryOperation,
    },
    transaction::{SignedTransaction, Transaction},
};

fn key(seed: &str) -> PublicKey {
    PrivateKey::from_seed(seed).public_key()
}

// Replace alice's owner authority, signing with her current owner key.
fn rotate_owner(net: &mut TestNet, signer_seed: &str, new_seed: &str) -> Result<(), BlockchainError> {
    let op = Operation::AccountUpdate(AccountUpdateOperation {
        account: "alice".to_owned(),
        owner: Some(Authority::single_key(key(new_seed))),
        active: None,
        basic: None,
        memo_key: None,
        json_metadata: String::new(),
    });
    let mut tx = Transaction {
        expiration: net.db.head_block_time().add_seconds(60),
        operations: vec![op],
        ..Transaction::default()
    };
    tx.set_reference_block(&net.db.head_block_id());
    let mut signed = SignedTransaction::new(tx);
    signed.sign(&PrivateKey::from_seed(signer_seed), net.db.chain_id());
    net.produce_block_with(vec![signed]).map(|_| ())
}

#[test]
fn owner_updates_are_rate_limited_and_archived() {
    let mut net = TestNet::new();
    net.create_account("alice");

    rotate_owner(&mut net, "alice", "alice-new").expect("first rotation");
    // a second rotation within the hour is refused
    let err = rotate_owner(&mut net, "alice-new", "alice-newer").unwrap_err();
    assert!(matches!(err, BlockchainError::Evaluate(_)));

    // an hour later it goes through, leaving a history trail
    net.produce_block_at_slot(OWNER_UPDATE_LIMIT_SEC as u64 / 3 + 10);
    rotate_owner(&mut net, "alice-new", "alice-newer").expect("after limit");
    assert!(net.db.owner_authority_histories.len() >= 2);
}

#[test]
fn stolen_account_recovers_with_recent_authority() {
    let mut net = TestNet::new();
    net.create_account("alice");
    let original_owner = net.db.get_account("alice").unwrap().owner.clone();

    // the thief rotates the owner key
    rotate_owner(&mut net, "alice", "thief").expect("theft");

    // initminer created alice and is her recovery partner
    net.push_tx(
        vec![Operation::RequestAccountRecovery(
            RequestAccountRecoveryOperation {
                recovery_account: "initminer".to_owned(),
                account_to_recover: "alice".to_owned(),
                new_owner_authority: Authority::single_key(key("alice-rescued")),
            },
        )],
        &["initminer"],
    )
    .expect("recovery request");

    // past the rate limit, alice proves old + new authority together
    net.produce_block_at_slot(OWNER_UPDATE_LIMIT_SEC as u64 / 3 + 10);
    let op = Operation::RecoverAccount(RecoverAccountOperation {
        account_to_recover: "alice".to_owned(),
        new_owner_authority: Authority::single_key(key("alice-rescued")),
        recent_owner_authority: original_owner,
    });
    let mut tx = Transaction {
        expiration: net.db.head_block_time().add_seconds(60),
        operations: vec![op],
        ..Transaction::default()
    };
    tx.set_reference_block(&net.db.head_block_id());
    let mut signed = SignedTransaction::new(tx);
    signed.sign(&PrivateKey::from_seed("alice"), net.db.chain_id());
    signed.sign(&PrivateKey::from_seed("alice-rescued"), net.db.chain_id());
    net.produce_block_with(vec![signed]).expect("recovery");

    let alice = net.db.get_account("alice").unwrap();
    assert_eq!(alice.owner, Authority::single_key(key("alice-rescued")));
    assert!(net.db.recovery_requests.is_empty());
}

#[test]
fn only_the_recovery_partner_may_file() {
    let mut net = TestNet::new();
    net.create_account("alice");
    net.create_account("mallory");

    let err = net
        .push_tx(
            vec![Operation::RequestAccountRecovery(
                RequestAccountRecoveryOperation {
                    recovery_account: "mallory".to_owned(),
                    account_to_recover: "alice".to_owned(),
                    new_owner_authority: Authority::single_key(key("mallory")),
                },
            )],
            &["mallory"],
        )
        .unwrap_err();
    assert!(matches!(err, BlockchainError::Evaluate(_)));
}

#[test]
fn recovery_requests_expire() {
    let mut net = TestNet::new();
    net.create_account("alice");
    net.push_tx(
        vec![Operation::RequestAccountRecovery(
            RequestAccountRecoveryOperation {
                recovery_account: "initminer".to_owned(),
                account_to_recover: "alice".to_owned(),
                new_owner_authority: Authority::single_key(key("alice-rescued")),
            },
        )],
        &["initminer"],
    )
    .unwrap();
    assert_eq!(net.db.recovery_requests.len(), 1);

    net.produce_block_at_slot(
        ACCOUNT_RECOVERY_REQUEST_EXPIRATION_PERIOD_SEC as u64 / 3 + 10,
    );
    assert!(net.db.recovery_requests.is_empty());
}

#[test]
fn changing_the_recovery_partner_takes_thirty_days() {
    let mut net = TestNet::new();
    net.create_account("alice");
    net.create_account("guardian");

    net.push_tx(
        vec![Operation::ChangeRecoveryAccount(
            ChangeRecoveryAccountOperation {
                account_to_recover: "alice".to_owned(),
                new_recovery_account: "guardian".to_owned(),
            },
        )],
        &["alice"],
    )
    .expect("change request");
    assert_eq!(
        net.db.get_account("alice").unwrap().recovery_account,
        "initminer"
    );

    // thirty days later the change lands
    net.produce_block_at_slot(30 * 24 * 60 * 60 / 3 + 10);
    assert_eq!(
        net.db.get_account("alice").unwrap().recovery_account,
        "guardian"
    );
}
