use serde::{Deserialize, Serialize};

use super::{RequiredAuthorities, ValidateError};
use crate::{
    asset::Asset,
    config::{HUNDRED_PERCENT, MAX_LISTENING_PERIOD, MIN_STREAMING_PLATFORM_CREATION_FEE, MUSE_SYMBOL},
    serializer::{Reader, ReaderError, Serializer, Writer},
    utils::{is_valid_account_name, is_valid_content_url},
};

const MAX_TITLE_LENGTH: usize = 256;

fn validate_title(title: &str) -> Result<(), ValidateError> {
    if title.is_empty() || title.len() >= MAX_TITLE_LENGTH {
        return Err(ValidateError::TitleLength(title.len()));
    }
    Ok(())
}

fn validate_account_name(name: &str) -> Result<(), ValidateError> {
    if !is_valid_account_name(name) {
        return Err(ValidateError::InvalidAccountName(name.to_owned()));
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<(), ValidateError> {
    if !is_valid_content_url(url) {
        return Err(ValidateError::InvalidUrl(url.to_owned()));
    }
    Ok(())
}

// Distribution lists must sum to exactly 10000 bp, or be empty (the share
// then accumulates on the content row until a list is set).
fn validate_distributions(
    distributions: &[Distribution],
    allow_empty: bool,
) -> Result<(), ValidateError> {
    let mut total: u32 = 0;
    for distribution in distributions {
        validate_account_name(&distribution.payee)?;
        total += distribution.bp as u32;
    }
    if total == HUNDRED_PERCENT || (allow_empty && total == 0) {
        Ok(())
    } else {
        Err(ValidateError::DistributionSum(total))
    }
}

fn validate_management(votes: &[ManagementVote]) -> Result<(), ValidateError> {
    let mut total: u32 = 0;
    for vote in votes {
        validate_account_name(&vote.voter)?;
        total += vote.percentage as u32;
    }
    if total == 100 {
        Ok(())
    } else {
        Err(ValidateError::ManagementSum(total))
    }
}

fn validate_split(split: u16) -> Result<(), ValidateError> {
    if split as u32 >= HUNDRED_PERCENT {
        return Err(ValidateError::SplitTooLarge(split));
    }
    Ok(())
}

/// Master-side album metadata. Genres feed the by-genre index, the album
/// type feeds the by-category index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumMetadata {
    pub album_title: String,
    pub album_type: Option<String>,
    pub genre_1: u32,
    pub genre_2: Option<u32>,
}

impl AlbumMetadata {
    pub fn validate_meta(&self) -> Result<(), ValidateError> {
        validate_title(&self.album_title)
    }
}

impl Serializer for AlbumMetadata {
    fn write(&self, writer: &mut Writer) {
        self.album_title.write(writer);
        self.album_type.write(writer);
        writer.write_u32(&self.genre_1);
        self.genre_2.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(AlbumMetadata {
            album_title: reader.read()?,
            album_type: reader.read()?,
            genre_1: reader.read_u32()?,
            genre_2: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.album_title.size() + self.album_type.size() + 4 + self.genre_2.size()
    }
}

/// Master-side track metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub track_title: String,
    pub genre_1: u32,
    pub genre_2: Option<u32>,
    pub duration_seconds: Option<u32>,
}

impl TrackMetadata {
    pub fn validate_meta(&self) -> Result<(), ValidateError> {
        validate_title(&self.track_title)
    }
}

impl Serializer for TrackMetadata {
    fn write(&self, writer: &mut Writer) {
        self.track_title.write(writer);
        writer.write_u32(&self.genre_1);
        self.genre_2.write(writer);
        self.duration_seconds.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(TrackMetadata {
            track_title: reader.read()?,
            genre_1: reader.read_u32()?,
            genre_2: reader.read()?,
            duration_seconds: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.track_title.size() + 4 + self.genre_2.size() + self.duration_seconds.size()
    }
}

/// Publisher-side composition metadata. When `third_party_publishers` is
/// set the composition side carries its own distribution and management.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherMetadata {
    pub composition_title: String,
    pub third_party_publishers: bool,
}

impl PublisherMetadata {
    pub fn validate_meta(&self) -> Result<(), ValidateError> {
        validate_title(&self.composition_title)
    }
}

impl Serializer for PublisherMetadata {
    fn write(&self, writer: &mut Writer) {
        self.composition_title.write(writer);
        writer.write_bool(self.third_party_publishers);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(PublisherMetadata {
            composition_title: reader.read()?,
            third_party_publishers: reader.read_bool()?,
        })
    }

    fn size(&self) -> usize {
        self.composition_title.size() + 1
    }
}

/// One payee of a distribution list, share in basis points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub payee: String,
    pub bp: u16,
}

impl Serializer for Distribution {
    fn write(&self, writer: &mut Writer) {
        self.payee.write(writer);
        writer.write_u16(self.bp);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(Distribution {
            payee: reader.read()?,
            bp: reader.read_u16()?,
        })
    }

    fn size(&self) -> usize {
        self.payee.size() + 2
    }
}

/// One manager of a content side, integer percentage; a side's percentages
/// sum to exactly 100 and become authority weights.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementVote {
    pub voter: String,
    pub percentage: u8,
}

impl Serializer for ManagementVote {
    fn write(&self, writer: &mut Writer) {
        self.voter.write(writer);
        writer.write_u8(self.percentage);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(ManagementVote {
            voter: reader.read()?,
            percentage: reader.read_u8()?,
        })
    }

    fn size(&self) -> usize {
        self.voter.size() + 1
    }
}

/// Which side of a content row an update targets.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Master,
    Publisher,
}

impl Serializer for Side {
    fn write(&self, writer: &mut Writer) {
        writer.write_u8(match self {
            Side::Master => 0,
            Side::Publisher => 1,
        });
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        match reader.read_u8()? {
            0 => Ok(Side::Master),
            1 => Ok(Side::Publisher),
            _ => Err(ReaderError::InvalidValue),
        }
    }

    fn size(&self) -> usize {
        1
    }
}

/// Vote on a content row, weight in basis points of the voter's voting
/// power, negative for a downvote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOperation {
    pub voter: String,
    pub url: String,
    pub weight: i16,
}

impl VoteOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.voter)?;
        if self.weight.unsigned_abs() as u32 > HUNDRED_PERCENT {
            return Err(ValidateError::WeightOutOfRange(self.weight));
        }
        validate_url(&self.url)
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.basic.insert(self.voter.clone());
    }
}

impl Serializer for VoteOperation {
    fn write(&self, writer: &mut Writer) {
        self.voter.write(writer);
        self.url.write(writer);
        writer.write_i16(self.weight);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(VoteOperation {
            voter: reader.read()?,
            url: reader.read()?,
            weight: reader.read_i16()?,
        })
    }

    fn size(&self) -> usize {
        self.voter.size() + self.url.size() + 2
    }
}

/// Registers a track: ipfs url, master metadata, optional third-party
/// composition side, payee distributions and management lists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentOperation {
    pub uploader: String,
    pub url: String,
    pub album_meta: AlbumMetadata,
    pub track_meta: TrackMetadata,
    pub comp_meta: PublisherMetadata,
    pub distributions: Vec<Distribution>,
    pub management: Vec<ManagementVote>,
    pub management_threshold: u32,
    pub distributions_comp: Option<Vec<Distribution>>,
    pub management_comp: Option<Vec<ManagementVote>>,
    pub management_threshold_comp: Option<u32>,
    pub playing_reward: u16,
    pub publishers_share: u16,
}

impl ContentOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.uploader)?;
        self.album_meta.validate_meta()?;
        self.track_meta.validate_meta()?;
        self.comp_meta.validate_meta()?;
        validate_url(&self.url)?;

        validate_distributions(&self.distributions, true)?;
        validate_management(&self.management)?;

        if self.comp_meta.third_party_publishers {
            if let Some(distributions_comp) = &self.distributions_comp {
                validate_distributions(distributions_comp, true)?;
            }
            let management_comp = self
                .management_comp
                .as_ref()
                .ok_or(ValidateError::MissingField("management_comp"))?;
            if self.management_threshold_comp.is_none() {
                return Err(ValidateError::MissingField("management_threshold_comp"));
            }
            validate_management(management_comp)?;
        }

        validate_split(self.playing_reward)?;
        validate_split(self.publishers_share)
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.basic.insert(self.uploader.clone());
    }
}

impl Serializer for ContentOperation {
    fn write(&self, writer: &mut Writer) {
        self.uploader.write(writer);
        self.url.write(writer);
        self.album_meta.write(writer);
        self.track_meta.write(writer);
        self.comp_meta.write(writer);
        self.distributions.write(writer);
        self.management.write(writer);
        writer.write_u32(&self.management_threshold);
        self.distributions_comp.write(writer);
        self.management_comp.write(writer);
        self.management_threshold_comp.write(writer);
        writer.write_u16(self.playing_reward);
        writer.write_u16(self.publishers_share);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(ContentOperation {
            uploader: reader.read()?,
            url: reader.read()?,
            album_meta: reader.read()?,
            track_meta: reader.read()?,
            comp_meta: reader.read()?,
            distributions: reader.read()?,
            management: reader.read()?,
            management_threshold: reader.read_u32()?,
            distributions_comp: reader.read()?,
            management_comp: reader.read()?,
            management_threshold_comp: reader.read()?,
            playing_reward: reader.read_u16()?,
            publishers_share: reader.read_u16()?,
        })
    }

    fn size(&self) -> usize {
        self.uploader.size()
            + self.url.size()
            + self.album_meta.size()
            + self.track_meta.size()
            + self.comp_meta.size()
            + self.distributions.size()
            + self.management.size()
            + 4
            + self.distributions_comp.size()
            + self.management_comp.size()
            + self.management_threshold_comp.size()
            + 2
            + 2
    }
}

/// Edits one side of a content row. The publisher side may never touch
/// master metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentUpdateOperation {
    pub side: Side,
    pub url: String,
    pub new_album_meta: Option<AlbumMetadata>,
    pub new_track_meta: Option<TrackMetadata>,
    pub new_comp_meta: Option<PublisherMetadata>,
    pub new_distributions: Vec<Distribution>,
    pub new_management: Vec<ManagementVote>,
    pub new_threshold: u32,
    pub new_playing_reward: u16,
    pub new_publishers_share: u16,
}

impl ContentUpdateOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_url(&self.url)?;

        if self.side == Side::Publisher
            && (self.new_album_meta.is_some() || self.new_track_meta.is_some())
        {
            return Err(ValidateError::PublisherEditsMasterSide);
        }

        if let Some(album_meta) = &self.new_album_meta {
            album_meta.validate_meta()?;
        }
        if let Some(track_meta) = &self.new_track_meta {
            track_meta.validate_meta()?;
        }
        if let Some(comp_meta) = &self.new_comp_meta {
            comp_meta.validate_meta()?;
        }

        if !self.new_distributions.is_empty() {
            validate_distributions(&self.new_distributions, false)?;
        }
        if !self.new_management.is_empty() {
            validate_management(&self.new_management)?;
        }
        validate_split(self.new_playing_reward)?;
        validate_split(self.new_publishers_share)
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        match self.side {
            Side::Master => auths.master_content.insert(self.url.clone()),
            Side::Publisher => auths.comp_content.insert(self.url.clone()),
        };
    }
}

impl Serializer for ContentUpdateOperation {
    fn write(&self, writer: &mut Writer) {
        self.side.write(writer);
        self.url.write(writer);
        self.new_album_meta.write(writer);
        self.new_track_meta.write(writer);
        self.new_comp_meta.write(writer);
        self.new_distributions.write(writer);
        self.new_management.write(writer);
        writer.write_u32(&self.new_threshold);
        writer.write_u16(self.new_playing_reward);
        writer.write_u16(self.new_publishers_share);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(ContentUpdateOperation {
            side: reader.read()?,
            url: reader.read()?,
            new_album_meta: reader.read()?,
            new_track_meta: reader.read()?,
            new_comp_meta: reader.read()?,
            new_distributions: reader.read()?,
            new_management: reader.read()?,
            new_threshold: reader.read_u32()?,
            new_playing_reward: reader.read_u16()?,
            new_publishers_share: reader.read_u16()?,
        })
    }

    fn size(&self) -> usize {
        self.side.size()
            + self.url.size()
            + self.new_album_meta.size()
            + self.new_track_meta.size()
            + self.new_comp_meta.size()
            + self.new_distributions.size()
            + self.new_management.size()
            + 4
            + 2
            + 2
    }
}

/// Records an approval of a content row by a curator account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentApproveOperation {
    pub approver: String,
    pub url: String,
}

impl ContentApproveOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.approver)?;
        validate_url(&self.url)
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.basic.insert(self.approver.clone());
    }
}

impl Serializer for ContentApproveOperation {
    fn write(&self, writer: &mut Writer) {
        self.approver.write(writer);
        self.url.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(ContentApproveOperation {
            approver: reader.read()?,
            url: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.approver.size() + self.url.size()
    }
}

/// Takes a content row out of circulation; disabled content accepts no
/// further reports or votes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDisableOperation {
    pub url: String,
}

impl ContentDisableOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_url(&self.url)
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.master_content.insert(self.url.clone());
    }
}

impl Serializer for ContentDisableOperation {
    fn write(&self, writer: &mut Writer) {
        self.url.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(ContentDisableOperation { url: reader.read()? })
    }

    fn size(&self) -> usize {
        self.url.size()
    }
}

/// Registers or updates a streaming platform backed by a creation fee.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreamingPlatformUpdateOperation {
    pub owner: String,
    pub url: String,
    pub fee: Asset,
}

impl StreamingPlatformUpdateOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.owner)?;
        if self.url.is_empty() || self.url.len() > crate::config::MAX_STREAMING_PLATFORM_URL_LENGTH {
            return Err(ValidateError::InvalidUrl(self.url.clone()));
        }
        if self.fee.asset_id != MUSE_SYMBOL
            || self.fee.amount < MIN_STREAMING_PLATFORM_CREATION_FEE
        {
            return Err(ValidateError::InsufficientFee);
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.owner.clone());
    }
}

impl Serializer for StreamingPlatformUpdateOperation {
    fn write(&self, writer: &mut Writer) {
        self.owner.write(writer);
        self.url.write(writer);
        self.fee.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(StreamingPlatformUpdateOperation {
            owner: reader.read()?,
            url: reader.read()?,
            fee: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.owner.size() + self.url.size() + self.fee.size()
    }
}

/// Approves or withdraws approval of a streaming platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStreamingPlatformVoteOperation {
    pub account: String,
    pub streaming_platform: String,
    pub approve: bool,
}

impl AccountStreamingPlatformVoteOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.account)?;
        validate_account_name(&self.streaming_platform)
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.account.clone());
    }
}

impl Serializer for AccountStreamingPlatformVoteOperation {
    fn write(&self, writer: &mut Writer) {
        self.account.write(writer);
        self.streaming_platform.write(writer);
        writer.write_bool(self.approve);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(AccountStreamingPlatformVoteOperation {
            account: reader.read()?,
            streaming_platform: reader.read()?,
            approve: reader.read_bool()?,
        })
    }

    fn size(&self) -> usize {
        self.account.size() + self.streaming_platform.size() + 1
    }
}

/// A play report submitted by a streaming platform: consumer listened to
/// a content for `play_time` seconds, optionally via a playlist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingPlatformReportOperation {
    pub streaming_platform: String,
    pub consumer: String,
    pub content: String,
    pub playlist_creator: Option<String>,
    pub play_time: u32,
}

impl StreamingPlatformReportOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.streaming_platform)?;
        validate_account_name(&self.consumer)?;
        validate_url(&self.content)?;
        if let Some(playlist_creator) = &self.playlist_creator {
            validate_account_name(playlist_creator)?;
        }
        if self.play_time == 0 || self.play_time > MAX_LISTENING_PERIOD {
            return Err(ValidateError::InvalidPlayTime(self.play_time));
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.basic.insert(self.streaming_platform.clone());
    }
}

impl Serializer for StreamingPlatformReportOperation {
    fn write(&self, writer: &mut Writer) {
        self.streaming_platform.write(writer);
        self.consumer.write(writer);
        self.content.write(writer);
        self.playlist_creator.write(writer);
        writer.write_u32(&self.play_time);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(StreamingPlatformReportOperation {
            streaming_platform: reader.read()?,
            consumer: reader.read()?,
            content: reader.read()?,
            playlist_creator: reader.read()?,
            play_time: reader.read_u32()?,
        })
    }

    fn size(&self) -> usize {
        self.streaming_platform.size()
            + self.consumer.size()
            + self.content.size()
            + self.playlist_creator.size()
            + 4
    }
}
