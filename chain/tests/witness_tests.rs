// Witness declarations, stake-weighted votes and proxy chains.

mod common;

use common::TestNet;
use muse_chain::BlockchainError;
use muse_common::{
    asset::Asset,
    config::MUSE_SYMBOL,
    crypto::PrivateKey,
    operation::{
        AccountWitnessProxyOperation, AccountWitnessVoteOperation, ChainProperties, Operation,
        TransferToVestingOperation, WitnessUpdateOperation,
    },
};

fn declare_witness(net: &mut TestNet, owner: &str) {
    net.push_tx(
        vec![Operation::WitnessUpdate(WitnessUpdateOperation {
            owner: owner.to_owned(),
            url: format!("https://{owner}.example"),
            block_signing_key: PrivateKey::from_seed(owner).public_key(),
            props: ChainProperties::default(),
            fee: Asset::new(0, MUSE_SYMBOL),
        })],
        &[owner],
    )
    .expect("witness declaration");
}

fn power_up(net: &mut TestNet, who: &str, amount: i64) {
    net.fund(who, amount);
    net.push_tx(
        vec![Operation::TransferToVesting(TransferToVestingOperation {
            from: who.to_owned(),
            to: String::new(),
            amount: Asset::new(amount, MUSE_SYMBOL),
        })],
        &[who],
    )
    .expect("power up");
}

fn vote(net: &mut TestNet, account: &str, witness: &str, approve: bool) -> Result<(), BlockchainError> {
    net.push_tx(
        vec![Operation::AccountWitnessVote(AccountWitnessVoteOperation {
            account: account.to_owned(),
            witness: witness.to_owned(),
            approve,
        })],
        &[account],
    )
    .map(|_| ())
}

#[test]
fn witness_votes_carry_stake() {
    let mut net = TestNet::new();
    net.create_account("carol");
    net.create_account("wit");
    declare_witness(&mut net, "wit");
    power_up(&mut net, "carol", 1_000_000);

    let stake = net.db.get_account("carol").unwrap().witness_vote_weight();
    vote(&mut net, "carol", "wit", true).unwrap();
    assert_eq!(net.db.get_witness("wit").unwrap().votes, stake);

    // voting twice is refused, unvoting clears the stake
    assert!(vote(&mut net, "carol", "wit", true).is_err());
    vote(&mut net, "carol", "wit", false).unwrap();
    assert_eq!(net.db.get_witness("wit").unwrap().votes, 0);
}

#[test]
fn new_vesting_follows_existing_votes() {
    let mut net = TestNet::new();
    net.create_account("carol");
    net.create_account("wit");
    declare_witness(&mut net, "wit");
    power_up(&mut net, "carol", 1_000_000);
    vote(&mut net, "carol", "wit", true).unwrap();

    let votes_before = net.db.get_witness("wit").unwrap().votes;
    power_up(&mut net, "carol", 2_000_000);
    let votes_after = net.db.get_witness("wit").unwrap().votes;
    assert!(votes_after > votes_before, "vesting gains adjust the vote");
}

#[test]
fn proxy_redirects_stake_and_clears_votes() {
    let mut net = TestNet::new();
    for name in ["carol", "dave", "wit"] {
        net.create_account(name);
    }
    declare_witness(&mut net, "wit");
    power_up(&mut net, "carol", 1_000_000);
    power_up(&mut net, "dave", 500_000);

    vote(&mut net, "carol", "wit", true).unwrap();
    vote(&mut net, "dave", "wit", true).unwrap();
    let both = net.db.get_witness("wit").unwrap().votes;

    // carol delegates to dave: her direct votes clear, her stake now
    // backs dave's votes
    net.push_tx(
        vec![Operation::AccountWitnessProxy(AccountWitnessProxyOperation {
            account: "carol".to_owned(),
            proxy: "dave".to_owned(),
        })],
        &["carol"],
    )
    .expect("proxy");

    let carol = net.db.get_account("carol").unwrap();
    assert_eq!(carol.witnesses_voted_for, 0);
    assert_eq!(carol.proxy, "dave");
    let dave = net.db.get_account("dave").unwrap();
    assert!(dave.proxied_vsf_votes > 0);
    assert_eq!(net.db.get_witness("wit").unwrap().votes, both);

    // while proxied, carol cannot vote directly
    assert!(vote(&mut net, "carol", "wit", true).is_err());
}

#[test]
fn proxy_cycles_are_rejected() {
    let mut net = TestNet::new();
    for name in ["aaa", "bbb", "ccc"] {
        net.create_account(name);
    }
    let set_proxy = |net: &mut TestNet, account: &str, proxy: &str| {
        net.push_tx(
            vec![Operation::AccountWitnessProxy(AccountWitnessProxyOperation {
                account: account.to_owned(),
                proxy: proxy.to_owned(),
            })],
            &[account],
        )
    };
    set_proxy(&mut net, "aaa", "bbb").expect("a to b");
    set_proxy(&mut net, "bbb", "ccc").expect("b to c");
    let err = set_proxy(&mut net, "ccc", "aaa").unwrap_err();
    assert!(matches!(err, BlockchainError::Evaluate(_)));
}

#[test]
fn schedule_ranks_by_votes() {
    let mut net = TestNet::new();
    net.create_account("carol");
    net.create_account("wit");
    declare_witness(&mut net, "wit");
    power_up(&mut net, "carol", 5_000_000);
    vote(&mut net, "carol", "wit", true).unwrap();

    // a full round re-shuffles the schedule; both witnesses are active
    // since there are fewer than twenty-one candidates
    net.produce_blocks(25);
    let schedule = net.db.witness_schedule();
    assert!(schedule
        .current_shuffled_witnesses
        .contains(&"wit".to_owned()));
    assert!(schedule
        .current_shuffled_witnesses
        .contains(&"initminer".to_owned()));
}
