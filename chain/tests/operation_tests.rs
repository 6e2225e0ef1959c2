// Pure validate() contracts of the operation model.

use muse_common::{
    asset::Asset,
    config::{MBD_SYMBOL, MUSE_SYMBOL},
    operation::{
        AlbumMetadata, ContentOperation, Distribution, ManagementVote, Operation,
        PublisherMetadata, TrackMetadata, TransferOperation, ValidateError, VoteOperation,
    },
};

fn base_content_op() -> ContentOperation {
    ContentOperation {
        uploader: "uploader".to_owned(),
        url: "ipfs://QmTrack".to_owned(),
        album_meta: AlbumMetadata {
            album_title: "First Album".to_owned(),
            album_type: Some("single".to_owned()),
            genre_1: 1,
            genre_2: None,
        },
        track_meta: TrackMetadata {
            track_title: "First Song".to_owned(),
            genre_1: 1,
            genre_2: Some(2),
            duration_seconds: Some(180),
        },
        comp_meta: PublisherMetadata {
            composition_title: "First Song".to_owned(),
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
    }
}

#[test]
fn content_distribution_sum() {
    // 6000 + 4000 bp validates
    base_content_op().validate().unwrap();

    // 6000 + 4001 bp does not
    let mut op = base_content_op();
    op.distributions[1].bp = 4001;
    assert_eq!(op.validate(), Err(ValidateError::DistributionSum(10_001)));

    // an empty list is also fine, the share accumulates
    let mut op = base_content_op();
    op.distributions.clear();
    op.validate().unwrap();
}

#[test]
fn content_management_sum() {
    let mut op = base_content_op();
    op.management = vec![
        ManagementVote { voter: "carol".to_owned(), percentage: 60 },
        ManagementVote { voter: "dave".to_owned(), percentage: 30 },
    ];
    assert_eq!(op.validate(), Err(ValidateError::ManagementSum(90)));
}

#[test]
fn content_splits_are_bounded() {
    let mut op = base_content_op();
    op.playing_reward = 10_000;
    assert_eq!(op.validate(), Err(ValidateError::SplitTooLarge(10_000)));

    let mut op = base_content_op();
    op.publishers_share = 12_000;
    assert_eq!(op.validate(), Err(ValidateError::SplitTooLarge(12_000)));
}

#[test]
fn content_third_party_side_requires_management() {
    let mut op = base_content_op();
    op.comp_meta.third_party_publishers = true;
    assert_eq!(
        op.validate(),
        Err(ValidateError::MissingField("management_comp"))
    );

    op.management_comp = Some(vec![ManagementVote {
        voter: "emily".to_owned(),
        percentage: 100,
    }]);
    op.management_threshold_comp = Some(51);
    op.validate().unwrap();
}

#[test]
fn content_url_must_be_ipfs() {
    let mut op = base_content_op();
    op.url = "https://example.com/track".to_owned();
    assert!(matches!(op.validate(), Err(ValidateError::InvalidUrl(_))));
}

#[test]
fn transfer_validate() {
    let op = TransferOperation {
        from: "alice".to_owned(),
        to: "bob".to_owned(),
        amount: Asset::new(100, MUSE_SYMBOL),
        memo: "thanks".to_owned(),
    };
    op.validate().unwrap();

    let negative = TransferOperation {
        amount: Asset::new(-1, MUSE_SYMBOL),
        ..op.clone()
    };
    assert_eq!(negative.validate(), Err(ValidateError::NonPositiveAmount));

    let bad_name = TransferOperation {
        to: "NotValid".to_owned(),
        ..op.clone()
    };
    assert!(matches!(
        bad_name.validate(),
        Err(ValidateError::InvalidAccountName(_))
    ));

    let huge_memo = TransferOperation {
        memo: "m".repeat(4096),
        ..op
    };
    assert!(matches!(
        huge_memo.validate(),
        Err(ValidateError::MemoTooLarge(_))
    ));
}

#[test]
fn vote_weight_bounds() {
    let mut op = VoteOperation {
        voter: "alice".to_owned(),
        url: "ipfs://QmTrack".to_owned(),
        weight: 10_000,
    };
    op.validate().unwrap();
    op.weight = -10_000;
    op.validate().unwrap();

    // the wire type caps at i16, so only slightly beyond the bound fits
    op.weight = 10_001;
    assert_eq!(op.validate(), Err(ValidateError::WeightOutOfRange(10_001)));
}

#[test]
fn operation_wire_and_json_round_trips() {
    let ops = vec![
        Operation::Content(base_content_op()),
        Operation::Transfer(TransferOperation {
            from: "alice".to_owned(),
            to: "bob".to_owned(),
            amount: Asset::new(123_456_000, MBD_SYMBOL),
            memo: "röund trip ünicode".to_owned(),
        }),
        Operation::Vote(VoteOperation {
            voter: "alice".to_owned(),
            url: "ipfs://QmTrack".to_owned(),
            weight: -42,
        }),
    ];
    for op in ops {
        use muse_common::serializer::Serializer;
        let bytes = op.to_bytes();
        assert_eq!(bytes.len(), op.size());
        assert_eq!(Operation::from_bytes(&bytes).unwrap(), op);

        let json = serde_json::to_string(&op).unwrap();
        let parsed: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, op);
    }
}
