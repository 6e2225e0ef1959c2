// Content lifecycle: registration, management edits, votes, play reports
// and the daily settlement.

mod common;

use common::TestNet;
use muse_chain::BlockchainError;
use muse_common::{
    asset::Asset,
    config::MUSE_SYMBOL,
    operation::{
        AlbumMetadata, ContentDisableOperation, ContentOperation, ContentUpdateOperation,
        Distribution, ManagementVote, Operation, PublisherMetadata, Side,
        StreamingPlatformReportOperation, StreamingPlatformUpdateOperation, TrackMetadata,
        VoteOperation,
    },
};

const URL: &str = "ipfs://QmFirstTrack";

fn content_op() -> Operation {
    Operation::Content(ContentOperation {
        uploader: "uploader".to_owned(),
        url: URL.to_owned(),
        album_meta: AlbumMetadata {
            album_title: "Album".to_owned(),
            album_type: Some("lp".to_owned()),
            genre_1: 7,
            genre_2: None,
        },
        track_meta: TrackMetadata {
            track_title: "Track".to_owned(),
            genre_1: 7,
            genre_2: Some(12),
            duration_seconds: Some(240),
        },
        comp_meta: PublisherMetadata {
            composition_title: "Track".to_owned(),
            third_party_publishers: false,
        },
        distributions: vec![
            Distribution { payee: "alice".to_owned(), bp: 6000 },
            Distribution { payee: "bob".to_owned(), bp: 4000 },
        ],
        management: vec![ManagementVote { voter: "carol".to_owned(), percentage: 100 }],
        management_threshold: 51,
        distributions_comp: None,
        management_comp: None,
        management_threshold_comp: None,
        playing_reward: 1000,
        publishers_share: 5000,
    })
}

fn setup() -> TestNet {
    let mut net = TestNet::new();
    for name in ["uploader", "alice", "bob", "carol", "listener", "webstream"] {
        net.create_account(name);
    }
    net.push_tx(vec![content_op()], &["uploader"]).expect("content");

    net.fund("webstream", 20_000_000);
    net.push_tx(
        vec![Operation::StreamingPlatformUpdate(
            StreamingPlatformUpdateOperation {
                owner: "webstream".to_owned(),
                url: "https://webstream.example".to_owned(),
                fee: Asset::new(10_000_000, MUSE_SYMBOL),
            },
        )],
        &["webstream"],
    )
    .expect("platform");
    net
}

fn report_op(play_time: u32) -> Operation {
    Operation::StreamingPlatformReport(StreamingPlatformReportOperation {
        streaming_platform: "webstream".to_owned(),
        consumer: "listener".to_owned(),
        content: URL.to_owned(),
        playlist_creator: None,
        play_time,
    })
}

#[test]
fn registers_content_with_indices() {
    let net = setup();
    let content = net.db.get_content_by_url(URL).unwrap();
    assert_eq!(content.uploader, "uploader");
    assert_eq!(content.track_title, "Track");

    // both genre projections and the category are indexed
    let by_genre = net
        .db
        .contents
        .index::<muse_chain::object::ContentByGenreIndex>()
        .unwrap();
    assert!(by_genre.find(&7).contains(&content.id));
    assert!(by_genre.find(&12).contains(&content.id));
    assert!(by_genre.find(&99).is_empty());

    let by_category = net
        .db
        .contents
        .index::<muse_chain::object::ContentByCategoryIndex>()
        .unwrap();
    assert!(by_category.find(&"lp".to_owned()).contains(&content.id));
}

#[test]
fn duplicate_url_is_rejected() {
    let mut net = setup();
    let err = net.push_tx(vec![content_op()], &["uploader"]).unwrap_err();
    assert!(matches!(err, BlockchainError::DuplicateEntity(_)));
}

#[test]
fn master_managers_edit_master_metadata() {
    let mut net = setup();

    let update = Operation::ContentUpdate(ContentUpdateOperation {
        side: Side::Master,
        url: URL.to_owned(),
        new_album_meta: None,
        new_track_meta: Some(TrackMetadata {
            track_title: "Track (Remaster)".to_owned(),
            genre_1: 8,
            genre_2: None,
            duration_seconds: Some(245),
        }),
        new_comp_meta: None,
        new_distributions: Vec::new(),
        new_management: Vec::new(),
        new_threshold: 0,
        new_playing_reward: 0,
        new_publishers_share: 0,
    });

    // the uploader is not a manager; only carol's side may edit
    let err = net.push_tx(vec![update.clone()], &["uploader"]).unwrap_err();
    assert!(matches!(err, BlockchainError::MissingContentAuthority(_)));

    net.push_tx(vec![update], &["carol"]).expect("manager edit");
    let content = net.db.get_content_by_url(URL).unwrap();
    assert_eq!(content.track_title, "Track (Remaster)");

    // the genre index re-linked to the new projection
    let by_genre = net
        .db
        .contents
        .index::<muse_chain::object::ContentByGenreIndex>()
        .unwrap();
    assert!(by_genre.find(&8).contains(&content.id));
    assert!(by_genre.find(&12).is_empty());
}

#[test]
fn votes_are_limited_and_tracked() {
    let mut net = setup();
    let vote = |weight: i16| {
        Operation::Vote(VoteOperation {
            voter: "bob".to_owned(),
            url: URL.to_owned(),
            weight,
        })
    };

    net.push_tx(vec![vote(5000)], &["bob"]).expect("vote");
    // five adjustments are allowed on top of the original vote
    for change in 0..5i16 {
        net.push_tx(vec![vote(6000 + change)], &["bob"]).expect("re-vote");
    }
    let err = net.push_tx(vec![vote(1)], &["bob"]).unwrap_err();
    assert!(matches!(err, BlockchainError::Evaluate(_)));
}

#[test]
fn reports_count_plays_and_reject_bad_input() {
    let mut net = setup();
    net.push_tx(vec![report_op(180), report_op(240)], &["webstream"])
        .expect("reports");
    let content = net.db.get_content_by_url(URL).unwrap();
    assert_eq!(content.times_played, 2);
    assert_eq!(content.times_played_24, 2);

    // play_time of zero and of more than an hour never validate
    let tx = net.sign_tx(vec![report_op(0)], &["webstream"]);
    assert!(net.produce_block_with(vec![tx]).is_err());
    let tx = net.sign_tx(vec![report_op(3601)], &["webstream"]);
    assert!(net.produce_block_with(vec![tx]).is_err());
}

#[test]
fn disabled_content_accepts_nothing() {
    let mut net = setup();
    net.push_tx(
        vec![Operation::ContentDisable(ContentDisableOperation {
            url: URL.to_owned(),
        })],
        &["carol"],
    )
    .expect("disable");

    let err = net.push_tx(vec![report_op(100)], &["webstream"]).unwrap_err();
    assert!(matches!(err, BlockchainError::Evaluate(_)));

    let err = net
        .push_tx(
            vec![Operation::Vote(VoteOperation {
                voter: "bob".to_owned(),
                url: URL.to_owned(),
                weight: 100,
            })],
            &["bob"],
        )
        .unwrap_err();
    assert!(matches!(err, BlockchainError::Evaluate(_)));
}

#[test]
fn daily_settlement_pays_declared_distribution() {
    let mut net = setup();
    // a supply worth settling over
    net.fund("initminer", 10_000_000_000);

    net.push_tx(vec![report_op(200), report_op(200), report_op(200)], &["webstream"])
        .expect("reports");

    let alice_before = net.balance("alice", MUSE_SYMBOL);
    let bob_before = net.balance("bob", MUSE_SYMBOL);
    let platform_before = net.balance("webstream", MUSE_SYMBOL);

    net.cross_time_boundary(24 * 60 * 60);

    let alice_gain = net.balance("alice", MUSE_SYMBOL) - alice_before;
    let bob_gain = net.balance("bob", MUSE_SYMBOL) - bob_before;
    let platform_gain = net.balance("webstream", MUSE_SYMBOL) - platform_before;

    assert!(alice_gain > 0, "master payee must be paid");
    assert!(platform_gain > 0, "platform cut must be paid");
    // 60/40 split of the master side
    assert!((alice_gain as f64 / bob_gain as f64 - 1.5).abs() < 0.01);

    // settlement is new supply, fully accounted for
    net.db.validate_invariants().unwrap();

    // the history stream explains the payout
    let names: Vec<&str> = net
        .db
        .virtual_operations()
        .iter()
        .map(|(_, op)| op.name())
        .collect();
    assert!(names.contains(&"content_reward"));
    assert!(names.contains(&"playing_reward"));
}

#[test]
fn empty_distribution_accumulates_on_the_content() {
    let mut net = TestNet::new();
    for name in ["uploader", "carol", "listener", "webstream"] {
        net.create_account(name);
    }
    let mut op = match content_op() {
        Operation::Content(op) => op,
        _ => unreachable!(),
    };
    op.distributions = Vec::new();
    net.push_tx(vec![Operation::Content(op)], &["uploader"]).expect("content");

    net.fund("webstream", 20_000_000);
    net.push_tx(
        vec![Operation::StreamingPlatformUpdate(
            StreamingPlatformUpdateOperation {
                owner: "webstream".to_owned(),
                url: "https://webstream.example".to_owned(),
                fee: Asset::new(10_000_000, MUSE_SYMBOL),
            },
        )],
        &["webstream"],
    )
    .expect("platform");
    net.fund("initminer", 10_000_000_000);
    net.push_tx(vec![report_op(300)], &["webstream"]).expect("report");

    net.cross_time_boundary(24 * 60 * 60);

    let content = net.db.get_content_by_url(URL).unwrap();
    assert!(content.accumulated_balance_master.amount > 0);
    net.db.validate_invariants().unwrap();
}
