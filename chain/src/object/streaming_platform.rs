use muse_common::time::TimePointSec;

use super::{chain_object, object_types, IMPLEMENTATION_SPACE};

/// A registered streaming platform, entitled to submit play reports.
#[derive(Clone, Debug, Default)]
pub struct StreamingPlatformObject {
    pub id: u64,
    pub owner: String,
    pub created: TimePointSec,
    pub url: String,
    pub votes: i64,
}

chain_object!(
    StreamingPlatformObject,
    IMPLEMENTATION_SPACE,
    object_types::STREAMING_PLATFORM
);

/// Marks that `account` approves `streaming_platform`.
#[derive(Clone, Debug, Default)]
pub struct StreamingPlatformVoteObject {
    pub id: u64,
    pub streaming_platform: String,
    pub account: String,
}

chain_object!(
    StreamingPlatformVoteObject,
    IMPLEMENTATION_SPACE,
    object_types::STREAMING_PLATFORM_VOTE
);

/// One play report: a consumer listened to a content on a platform.
/// Reports in the current window drive the daily content payout.
#[derive(Clone, Debug, Default)]
pub struct ReportObject {
    pub id: u64,
    pub streaming_platform: String,
    pub consumer: String,
    pub content: u64,
    pub created: TimePointSec,
    pub play_time: u32,
    pub playlist_creator: Option<String>,
}

chain_object!(ReportObject, IMPLEMENTATION_SPACE, object_types::REPORT);
