use std::collections::BTreeSet;

use muse_common::{
    asset::Asset,
    authority::Authority,
    config::MUSE_SYMBOL,
    operation::{AlbumMetadata, Distribution, PublisherMetadata, TrackMetadata},
    time::TimePointSec,
};

use crate::db::MultiIndex;

use super::{chain_object, object_types, IMPLEMENTATION_SPACE};

/// A registered track: master side metadata and payees, optional
/// third-party composition side, play counters and reward accumulators.
#[derive(Clone, Debug)]
pub struct ContentObject {
    pub id: u64,
    pub uploader: String,
    pub url: String,
    pub accumulated_balance_master: Asset,
    pub accumulated_balance_comp: Asset,

    pub album_meta: AlbumMetadata,
    pub track_meta: TrackMetadata,
    pub comp_meta: PublisherMetadata,
    // copy of track_meta.track_title, the by-title query key
    pub track_title: String,

    pub last_update: TimePointSec,
    pub created: TimePointSec,
    pub last_played: TimePointSec,

    pub distributions_master: Vec<Distribution>,
    pub distributions_comp: Vec<Distribution>,

    pub playing_reward: u16,
    pub publishers_share: u16,

    pub manage_master: Authority,
    pub manage_comp: Authority,

    pub times_played: u64,
    pub times_played_24: u32,

    pub curation_rewards: bool,
    pub curation_reward_expiration: TimePointSec,

    pub allow_votes: bool,
    pub disabled: bool,
}

impl Default for ContentObject {
    fn default() -> Self {
        ContentObject {
            id: 0,
            uploader: String::new(),
            url: String::new(),
            accumulated_balance_master: Asset::zero(MUSE_SYMBOL),
            accumulated_balance_comp: Asset::zero(MUSE_SYMBOL),
            album_meta: AlbumMetadata::default(),
            track_meta: TrackMetadata::default(),
            comp_meta: PublisherMetadata::default(),
            track_title: String::new(),
            last_update: TimePointSec::zero(),
            created: TimePointSec::zero(),
            last_played: TimePointSec::zero(),
            distributions_master: Vec::new(),
            distributions_comp: Vec::new(),
            playing_reward: 1000,
            publishers_share: 5000,
            manage_master: Authority::default(),
            manage_comp: Authority::default(),
            times_played: 0,
            times_played_24: 0,
            curation_rewards: true,
            curation_reward_expiration: TimePointSec::zero(),
            allow_votes: true,
            disabled: false,
        }
    }
}

chain_object!(ContentObject, IMPLEMENTATION_SPACE, object_types::CONTENT);

/// Union of the album and track genres; the by-genre projection.
pub fn content_genres(content: &ContentObject) -> BTreeSet<u32> {
    let mut genres = BTreeSet::new();
    genres.insert(content.album_meta.genre_1);
    if let Some(genre) = content.album_meta.genre_2 {
        genres.insert(genre);
    }
    genres.insert(content.track_meta.genre_1);
    if let Some(genre) = content.track_meta.genre_2 {
        genres.insert(genre);
    }
    genres
}

fn content_category(content: &ContentObject) -> BTreeSet<String> {
    content.album_meta.album_type.iter().cloned().collect()
}

/// Content rows by genre, diff-relinked on every mutation.
pub type ContentByGenreIndex = MultiIndex<ContentObject, u32>;

pub fn content_by_genre_index() -> ContentByGenreIndex {
    MultiIndex::new(content_genres)
}

/// Content rows by the optional album type.
pub type ContentByCategoryIndex = MultiIndex<ContentObject, String>;

pub fn content_by_category_index() -> ContentByCategoryIndex {
    MultiIndex::new(content_category)
}

/// Marks that `voter` has voted on `content`; voters cannot vote on the
/// same content more than once per payout period, only adjust.
#[derive(Clone, Debug, Default)]
pub struct ContentVoteObject {
    pub id: u64,
    pub content: u64,
    pub voter: String,
    pub weight: i16,
    pub num_changes: u8,
    pub marked_for_curation_reward: bool,
    pub last_update: TimePointSec,
}

chain_object!(
    ContentVoteObject,
    IMPLEMENTATION_SPACE,
    object_types::CONTENT_VOTE
);

/// A curator's approval of a content url.
#[derive(Clone, Debug, Default)]
pub struct ContentApproveObject {
    pub id: u64,
    pub content: String,
    pub approver: String,
}

chain_object!(
    ContentApproveObject,
    IMPLEMENTATION_SPACE,
    object_types::CONTENT_APPROVE
);
