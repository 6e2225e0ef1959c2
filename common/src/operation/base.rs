use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{RequiredAuthorities, ValidateError};
use crate::{
    asset::Asset,
    authority::Authority,
    block::SignedBlockHeader,
    config::{HUNDRED_PERCENT, MAX_MEMO_SIZE, MAX_WITNESS_URL_LENGTH, MUSE_SYMBOL, VESTS_SYMBOL},
    crypto::{Hashable, PublicKey},
    serializer::{Reader, ReaderError, Serializer, Writer},
    time::TimePointSec,
    utils::is_valid_account_name,
};

fn validate_account_name(name: &str) -> Result<(), ValidateError> {
    if !is_valid_account_name(name) {
        return Err(ValidateError::InvalidAccountName(name.to_owned()));
    }
    Ok(())
}

fn validate_memo(memo: &str) -> Result<(), ValidateError> {
    if memo.len() >= MAX_MEMO_SIZE {
        return Err(ValidateError::MemoTooLarge(memo.len()));
    }
    Ok(())
}

/// Moves a liquid amount between two accounts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferOperation {
    pub from: String,
    pub to: String,
    pub amount: Asset,
    pub memo: String,
}

impl TransferOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.from)?;
        validate_account_name(&self.to)?;
        if self.amount.amount <= 0 {
            return Err(ValidateError::NonPositiveAmount);
        }
        validate_memo(&self.memo)
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.from.clone());
    }
}

impl Serializer for TransferOperation {
    fn write(&self, writer: &mut Writer) {
        self.from.write(writer);
        self.to.write(writer);
        self.amount.write(writer);
        self.memo.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(TransferOperation {
            from: reader.read()?,
            to: reader.read()?,
            amount: reader.read()?,
            memo: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.from.size() + self.to.size() + self.amount.size() + self.memo.size()
    }
}

/// Burns liquid MUSE and mints vesting shares for `to` (or `from` when
/// `to` is empty) at the current vesting share price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferToVestingOperation {
    pub from: String,
    pub to: String,
    pub amount: Asset,
}

impl TransferToVestingOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.from)?;
        if self.amount.asset_id != MUSE_SYMBOL {
            return Err(ValidateError::WrongAssetType("amount must be MUSE"));
        }
        if !self.to.is_empty() {
            validate_account_name(&self.to)?;
        }
        if self.amount.amount <= 0 {
            return Err(ValidateError::NonPositiveAmount);
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.from.clone());
    }
}

impl Serializer for TransferToVestingOperation {
    fn write(&self, writer: &mut Writer) {
        self.from.write(writer);
        self.to.write(writer);
        self.amount.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(TransferToVestingOperation {
            from: reader.read()?,
            to: reader.read()?,
            amount: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.from.size() + self.to.size() + self.amount.size()
    }
}

/// Schedules withdrawal of vesting shares over 13 weekly tranches.
/// A zero amount cancels a running withdrawal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WithdrawVestingOperation {
    pub account: String,
    pub vesting_shares: Asset,
}

impl WithdrawVestingOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.account)?;
        if self.vesting_shares.asset_id != VESTS_SYMBOL {
            return Err(ValidateError::WrongAssetType("amount must be VESTS"));
        }
        if self.vesting_shares.amount < 0 {
            return Err(ValidateError::NonPositiveAmount);
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.account.clone());
    }
}

impl Serializer for WithdrawVestingOperation {
    fn write(&self, writer: &mut Writer) {
        self.account.write(writer);
        self.vesting_shares.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(WithdrawVestingOperation {
            account: reader.read()?,
            vesting_shares: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.account.size() + self.vesting_shares.size()
    }
}

/// Routes a share of future vesting withdrawals to another account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetWithdrawVestingRouteOperation {
    pub from_account: String,
    pub to_account: String,
    pub percent: u16,
    pub auto_vest: bool,
}

impl SetWithdrawVestingRouteOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.from_account)?;
        validate_account_name(&self.to_account)?;
        if self.percent as u32 > HUNDRED_PERCENT {
            return Err(ValidateError::PercentOutOfRange(self.percent));
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.from_account.clone());
    }
}

impl Serializer for SetWithdrawVestingRouteOperation {
    fn write(&self, writer: &mut Writer) {
        self.from_account.write(writer);
        self.to_account.write(writer);
        writer.write_u16(self.percent);
        writer.write_bool(self.auto_vest);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(SetWithdrawVestingRouteOperation {
            from_account: reader.read()?,
            to_account: reader.read()?,
            percent: reader.read_u16()?,
            auto_vest: reader.read_bool()?,
        })
    }

    fn size(&self) -> usize {
        self.from_account.size() + self.to_account.size() + 2 + 1
    }
}

/// Creates a new account; the creation fee is vested for the new account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountCreateOperation {
    pub fee: Asset,
    pub creator: String,
    pub new_account_name: String,
    pub owner: Authority,
    pub active: Authority,
    pub basic: Authority,
    pub memo_key: PublicKey,
    pub json_metadata: String,
}

impl AccountCreateOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.creator)?;
        validate_account_name(&self.new_account_name)?;
        if self.fee.asset_id != MUSE_SYMBOL {
            return Err(ValidateError::WrongAssetType("fee must be MUSE"));
        }
        if self.fee.amount < 0 {
            return Err(ValidateError::NonPositiveAmount);
        }
        self.owner.validate()?;
        self.active.validate()?;
        self.basic.validate()?;
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.creator.clone());
    }
}

impl Serializer for AccountCreateOperation {
    fn write(&self, writer: &mut Writer) {
        self.fee.write(writer);
        self.creator.write(writer);
        self.new_account_name.write(writer);
        self.owner.write(writer);
        self.active.write(writer);
        self.basic.write(writer);
        self.memo_key.write(writer);
        self.json_metadata.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(AccountCreateOperation {
            fee: reader.read()?,
            creator: reader.read()?,
            new_account_name: reader.read()?,
            owner: reader.read()?,
            active: reader.read()?,
            basic: reader.read()?,
            memo_key: reader.read()?,
            json_metadata: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.fee.size()
            + self.creator.size()
            + self.new_account_name.size()
            + self.owner.size()
            + self.active.size()
            + self.basic.size()
            + self.memo_key.size()
            + self.json_metadata.size()
    }
}

/// Updates an account's authorities, memo key or metadata. Replacing the
/// owner authority requires the owner authority itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountUpdateOperation {
    pub account: String,
    pub owner: Option<Authority>,
    pub active: Option<Authority>,
    pub basic: Option<Authority>,
    pub memo_key: Option<PublicKey>,
    pub json_metadata: String,
}

impl AccountUpdateOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.account)?;
        if let Some(owner) = &self.owner {
            owner.validate()?;
        }
        if let Some(active) = &self.active {
            active.validate()?;
        }
        if let Some(basic) = &self.basic {
            basic.validate()?;
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        if self.owner.is_some() {
            auths.owner.insert(self.account.clone());
        } else {
            auths.active.insert(self.account.clone());
        }
    }
}

impl Serializer for AccountUpdateOperation {
    fn write(&self, writer: &mut Writer) {
        self.account.write(writer);
        self.owner.write(writer);
        self.active.write(writer);
        self.basic.write(writer);
        self.memo_key.write(writer);
        self.json_metadata.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(AccountUpdateOperation {
            account: reader.read()?,
            owner: reader.read()?,
            active: reader.read()?,
            basic: reader.read()?,
            memo_key: reader.read()?,
            json_metadata: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.account.size()
            + self.owner.size()
            + self.active.size()
            + self.basic.size()
            + self.memo_key.size()
            + self.json_metadata.size()
    }
}

/// Chain parameters a witness publishes with its declaration; the active
/// set's medians govern account creation fees and block sizes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainProperties {
    pub account_creation_fee: Asset,
    pub maximum_block_size: u32,
}

impl Default for ChainProperties {
    fn default() -> Self {
        ChainProperties {
            account_creation_fee: Asset::new(crate::config::MIN_ACCOUNT_CREATION_FEE, MUSE_SYMBOL),
            maximum_block_size: 65_536,
        }
    }
}

impl ChainProperties {
    pub fn validate(&self) -> Result<(), ValidateError> {
        if self.account_creation_fee.asset_id != MUSE_SYMBOL {
            return Err(ValidateError::WrongAssetType("fee must be MUSE"));
        }
        if self.account_creation_fee.amount < crate::config::MIN_ACCOUNT_CREATION_FEE {
            return Err(ValidateError::InsufficientFee);
        }
        Ok(())
    }
}

impl Serializer for ChainProperties {
    fn write(&self, writer: &mut Writer) {
        self.account_creation_fee.write(writer);
        writer.write_u32(&self.maximum_block_size);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(ChainProperties {
            account_creation_fee: reader.read()?,
            maximum_block_size: reader.read_u32()?,
        })
    }

    fn size(&self) -> usize {
        self.account_creation_fee.size() + 4
    }
}

/// Declares or updates a block-producer candidacy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WitnessUpdateOperation {
    pub owner: String,
    pub url: String,
    pub block_signing_key: PublicKey,
    pub props: ChainProperties,
    pub fee: Asset,
}

impl WitnessUpdateOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.owner)?;
        if self.url.is_empty() || self.url.len() > MAX_WITNESS_URL_LENGTH {
            return Err(ValidateError::InvalidUrl(self.url.clone()));
        }
        if self.fee.asset_id != MUSE_SYMBOL || self.fee.amount < 0 {
            return Err(ValidateError::WrongAssetType("fee must be non-negative MUSE"));
        }
        self.props.validate()
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.owner.clone());
    }
}

impl Serializer for WitnessUpdateOperation {
    fn write(&self, writer: &mut Writer) {
        self.owner.write(writer);
        self.url.write(writer);
        self.block_signing_key.write(writer);
        self.props.write(writer);
        self.fee.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(WitnessUpdateOperation {
            owner: reader.read()?,
            url: reader.read()?,
            block_signing_key: reader.read()?,
            props: reader.read()?,
            fee: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.owner.size()
            + self.url.size()
            + self.block_signing_key.size()
            + self.props.size()
            + self.fee.size()
    }
}

/// Approves or withdraws approval of a witness. Unavailable while the
/// account delegates through a proxy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountWitnessVoteOperation {
    pub account: String,
    pub witness: String,
    pub approve: bool,
}

impl AccountWitnessVoteOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.account)?;
        validate_account_name(&self.witness)
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.account.clone());
    }
}

impl Serializer for AccountWitnessVoteOperation {
    fn write(&self, writer: &mut Writer) {
        self.account.write(writer);
        self.witness.write(writer);
        writer.write_bool(self.approve);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(AccountWitnessVoteOperation {
            account: reader.read()?,
            witness: reader.read()?,
            approve: reader.read_bool()?,
        })
    }

    fn size(&self) -> usize {
        self.account.size() + self.witness.size() + 1
    }
}

/// Delegates witness voting to a proxy; an empty proxy votes directly
/// again. Setting a proxy clears direct votes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountWitnessProxyOperation {
    pub account: String,
    pub proxy: String,
}

impl AccountWitnessProxyOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.account)?;
        if !self.proxy.is_empty() {
            validate_account_name(&self.proxy)?;
        }
        if self.proxy == self.account {
            return Err(ValidateError::SelfReference("proxy"));
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.account.clone());
    }
}

impl Serializer for AccountWitnessProxyOperation {
    fn write(&self, writer: &mut Writer) {
        self.account.write(writer);
        self.proxy.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(AccountWitnessProxyOperation {
            account: reader.read()?,
            proxy: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.account.size() + self.proxy.size()
    }
}

/// Opaque binary payload; a consensus no-op interpreted off-chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomOperation {
    pub required_auths: BTreeSet<String>,
    pub id: u16,
    pub data: Vec<u8>,
}

impl CustomOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        if self.required_auths.is_empty() {
            return Err(ValidateError::EmptyRequiredAuths);
        }
        for name in &self.required_auths {
            validate_account_name(name)?;
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.extend(self.required_auths.iter().cloned());
    }
}

impl Serializer for CustomOperation {
    fn write(&self, writer: &mut Writer) {
        self.required_auths.write(writer);
        writer.write_u16(self.id);
        self.data.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(CustomOperation {
            required_auths: reader.read()?,
            id: reader.read_u16()?,
            data: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.required_auths.size() + 2 + self.data.size()
    }
}

/// Json payload variant of `custom`; also a consensus no-op.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomJsonOperation {
    pub required_auths: BTreeSet<String>,
    pub required_basic_auths: BTreeSet<String>,
    pub id: String,
    pub json: String,
}

impl CustomJsonOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        if self.required_auths.is_empty() && self.required_basic_auths.is_empty() {
            return Err(ValidateError::EmptyRequiredAuths);
        }
        for name in self.required_auths.iter().chain(&self.required_basic_auths) {
            validate_account_name(name)?;
        }
        if self.id.len() > 32 {
            return Err(ValidateError::IdTooLong(self.id.len()));
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.extend(self.required_auths.iter().cloned());
        auths.basic.extend(self.required_basic_auths.iter().cloned());
    }
}

impl Serializer for CustomJsonOperation {
    fn write(&self, writer: &mut Writer) {
        self.required_auths.write(writer);
        self.required_basic_auths.write(writer);
        self.id.write(writer);
        self.json.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(CustomJsonOperation {
            required_auths: reader.read()?,
            required_basic_auths: reader.read()?,
            id: reader.read()?,
            json: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.required_auths.size()
            + self.required_basic_auths.size()
            + self.id.size()
            + self.json.size()
    }
}

/// Proof that a witness signed two different blocks for the same slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportOverProductionOperation {
    pub reporter: String,
    pub first_block: SignedBlockHeader,
    pub second_block: SignedBlockHeader,
}

impl ReportOverProductionOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.reporter)?;
        validate_account_name(&self.first_block.header.witness)?;
        if self.first_block.header.witness != self.second_block.header.witness
            || self.first_block.header.timestamp != self.second_block.header.timestamp
        {
            return Err(ValidateError::InvalidOverProductionProof);
        }
        if self.first_block.hash() == self.second_block.hash() {
            return Err(ValidateError::InvalidOverProductionProof);
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.basic.insert(self.reporter.clone());
    }
}

impl Serializer for ReportOverProductionOperation {
    fn write(&self, writer: &mut Writer) {
        self.reporter.write(writer);
        self.first_block.write(writer);
        self.second_block.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(ReportOverProductionOperation {
            reporter: reader.read()?,
            first_block: reader.read()?,
            second_block: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.reporter.size() + self.first_block.size() + self.second_block.size()
    }
}

/// Posts a bond to force another account to prove control of its keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeAuthorityOperation {
    pub challenger: String,
    pub challenged: String,
    pub require_owner: bool,
}

impl ChallengeAuthorityOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.challenger)?;
        validate_account_name(&self.challenged)?;
        if self.challenger == self.challenged {
            return Err(ValidateError::SelfReference("challenged"));
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.challenger.clone());
    }
}

impl Serializer for ChallengeAuthorityOperation {
    fn write(&self, writer: &mut Writer) {
        self.challenger.write(writer);
        self.challenged.write(writer);
        writer.write_bool(self.require_owner);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(ChallengeAuthorityOperation {
            challenger: reader.read()?,
            challenged: reader.read()?,
            require_owner: reader.read_bool()?,
        })
    }

    fn size(&self) -> usize {
        self.challenger.size() + self.challenged.size() + 1
    }
}

/// Clears a pending authority challenge by exercising the challenged
/// authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProveAuthorityOperation {
    pub challenged: String,
    pub require_owner: bool,
}

impl ProveAuthorityOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.challenged)
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        if self.require_owner {
            auths.owner.insert(self.challenged.clone());
        } else {
            auths.active.insert(self.challenged.clone());
        }
    }
}

impl Serializer for ProveAuthorityOperation {
    fn write(&self, writer: &mut Writer) {
        self.challenged.write(writer);
        writer.write_bool(self.require_owner);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(ProveAuthorityOperation {
            challenged: reader.read()?,
            require_owner: reader.read_bool()?,
        })
    }

    fn size(&self) -> usize {
        self.challenged.size() + 1
    }
}

/// Filed by the recovery partner to start an owner-key recovery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestAccountRecoveryOperation {
    pub recovery_account: String,
    pub account_to_recover: String,
    pub new_owner_authority: Authority,
}

impl RequestAccountRecoveryOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.recovery_account)?;
        validate_account_name(&self.account_to_recover)?;
        self.new_owner_authority.validate()?;
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.recovery_account.clone());
    }
}

impl Serializer for RequestAccountRecoveryOperation {
    fn write(&self, writer: &mut Writer) {
        self.recovery_account.write(writer);
        self.account_to_recover.write(writer);
        self.new_owner_authority.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(RequestAccountRecoveryOperation {
            recovery_account: reader.read()?,
            account_to_recover: reader.read()?,
            new_owner_authority: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.recovery_account.size()
            + self.account_to_recover.size()
            + self.new_owner_authority.size()
    }
}

/// Completes a pending recovery by proving a recent owner authority.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecoverAccountOperation {
    pub account_to_recover: String,
    pub new_owner_authority: Authority,
    pub recent_owner_authority: Authority,
}

impl RecoverAccountOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.account_to_recover)?;
        if self.new_owner_authority == self.recent_owner_authority {
            return Err(ValidateError::SelfReference("new_owner_authority"));
        }
        if self.new_owner_authority.is_impossible() || self.recent_owner_authority.is_impossible() {
            return Err(ValidateError::ImpossibleAuthority);
        }
        self.new_owner_authority.validate()?;
        self.recent_owner_authority.validate()?;
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.other.push(self.new_owner_authority.clone());
        auths.other.push(self.recent_owner_authority.clone());
    }
}

impl Serializer for RecoverAccountOperation {
    fn write(&self, writer: &mut Writer) {
        self.account_to_recover.write(writer);
        self.new_owner_authority.write(writer);
        self.recent_owner_authority.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(RecoverAccountOperation {
            account_to_recover: reader.read()?,
            new_owner_authority: reader.read()?,
            recent_owner_authority: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.account_to_recover.size()
            + self.new_owner_authority.size()
            + self.recent_owner_authority.size()
    }
}

/// Changes the recovery partner; effective after a 30 day delay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecoveryAccountOperation {
    pub account_to_recover: String,
    pub new_recovery_account: String,
}

impl ChangeRecoveryAccountOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.account_to_recover)?;
        validate_account_name(&self.new_recovery_account)
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.owner.insert(self.account_to_recover.clone());
    }
}

impl Serializer for ChangeRecoveryAccountOperation {
    fn write(&self, writer: &mut Writer) {
        self.account_to_recover.write(writer);
        self.new_recovery_account.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(ChangeRecoveryAccountOperation {
            account_to_recover: reader.read()?,
            new_recovery_account: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.account_to_recover.size() + self.new_recovery_account.size()
    }
}

/// Places funds with a third-party agent until released or disputed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EscrowTransferOperation {
    pub from: String,
    pub to: String,
    pub agent: String,
    pub escrow_id: u32,
    pub amount: Asset,
    pub fee: Asset,
    pub json_meta: String,
    pub expiration: TimePointSec,
}

impl EscrowTransferOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.from)?;
        validate_account_name(&self.to)?;
        validate_account_name(&self.agent)?;
        if self.fee.amount < 0 || self.amount.amount < 0 {
            return Err(ValidateError::NonPositiveAmount);
        }
        if self.from == self.agent || self.to == self.agent {
            return Err(ValidateError::SelfReference("agent"));
        }
        if self.fee.asset_id != self.amount.asset_id {
            return Err(ValidateError::WrongAssetType("fee and amount must match"));
        }
        if self.amount.asset_id == VESTS_SYMBOL {
            return Err(ValidateError::WrongAssetType("VESTS cannot be escrowed"));
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.from.clone());
    }
}

impl Serializer for EscrowTransferOperation {
    fn write(&self, writer: &mut Writer) {
        self.from.write(writer);
        self.to.write(writer);
        self.agent.write(writer);
        writer.write_u32(&self.escrow_id);
        self.amount.write(writer);
        self.fee.write(writer);
        self.json_meta.write(writer);
        self.expiration.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(EscrowTransferOperation {
            from: reader.read()?,
            to: reader.read()?,
            agent: reader.read()?,
            escrow_id: reader.read_u32()?,
            amount: reader.read()?,
            fee: reader.read()?,
            json_meta: reader.read()?,
            expiration: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.from.size()
            + self.to.size()
            + self.agent.size()
            + 4
            + self.amount.size()
            + self.fee.size()
            + self.json_meta.size()
            + self.expiration.size()
    }
}

/// Raises a dispute on an escrow; only the agent may release afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowDisputeOperation {
    pub from: String,
    pub to: String,
    pub escrow_id: u32,
    pub who: String,
}

impl EscrowDisputeOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.from)?;
        validate_account_name(&self.to)?;
        validate_account_name(&self.who)?;
        if self.who != self.from && self.who != self.to {
            return Err(ValidateError::SelfReference("who"));
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.who.clone());
    }
}

impl Serializer for EscrowDisputeOperation {
    fn write(&self, writer: &mut Writer) {
        self.from.write(writer);
        self.to.write(writer);
        writer.write_u32(&self.escrow_id);
        self.who.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(EscrowDisputeOperation {
            from: reader.read()?,
            to: reader.read()?,
            escrow_id: reader.read_u32()?,
            who: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.from.size() + self.to.size() + 4 + self.who.size()
    }
}

/// Releases escrowed funds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EscrowReleaseOperation {
    pub from: String,
    pub to: String,
    pub escrow_id: u32,
    pub who: String,
    pub amount: Asset,
}

impl EscrowReleaseOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.from)?;
        validate_account_name(&self.to)?;
        validate_account_name(&self.who)?;
        if self.amount.amount <= 0 {
            return Err(ValidateError::NonPositiveAmount);
        }
        if self.amount.asset_id == VESTS_SYMBOL {
            return Err(ValidateError::WrongAssetType("VESTS cannot be escrowed"));
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.who.clone());
    }
}

impl Serializer for EscrowReleaseOperation {
    fn write(&self, writer: &mut Writer) {
        self.from.write(writer);
        self.to.write(writer);
        writer.write_u32(&self.escrow_id);
        self.who.write(writer);
        self.amount.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(EscrowReleaseOperation {
            from: reader.read()?,
            to: reader.read()?,
            escrow_id: reader.read_u32()?,
            who: reader.read()?,
            amount: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.from.size() + self.to.size() + 4 + self.who.size() + self.amount.size()
    }
}

/// Offers or confirms a mutual friendship between two accounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendshipOperation {
    pub who: String,
    pub whom: String,
}

impl FriendshipOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.who)?;
        validate_account_name(&self.whom)?;
        if self.who == self.whom {
            return Err(ValidateError::SelfReference("whom"));
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.basic.insert(self.who.clone());
    }
}

impl Serializer for FriendshipOperation {
    fn write(&self, writer: &mut Writer) {
        self.who.write(writer);
        self.whom.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(FriendshipOperation {
            who: reader.read()?,
            whom: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.who.size() + self.whom.size()
    }
}

/// Dissolves a friendship (or withdraws a pending offer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnfriendOperation {
    pub who: String,
    pub whom: String,
}

impl UnfriendOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.who)?;
        validate_account_name(&self.whom)?;
        if self.who == self.whom {
            return Err(ValidateError::SelfReference("whom"));
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.basic.insert(self.who.clone());
    }
}

impl Serializer for UnfriendOperation {
    fn write(&self, writer: &mut Writer) {
        self.who.write(writer);
        self.whom.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(UnfriendOperation {
            who: reader.read()?,
            whom: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.who.size() + self.whom.size()
    }
}

/// Redeems a genesis balance object into a live account. The claimed key
/// must sign the transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceClaimOperation {
    pub deposit_to_account: String,
    pub balance_to_claim: u64,
    pub balance_owner_key: PublicKey,
    pub total_claimed: Asset,
}

impl BalanceClaimOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.deposit_to_account)?;
        if self.balance_owner_key == PublicKey::zero() {
            return Err(ValidateError::MissingField("balance_owner_key"));
        }
        if self.total_claimed.amount < 0 {
            return Err(ValidateError::NonPositiveAmount);
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.deposit_to_account.clone());
        auths
            .other
            .push(Authority::single_key(self.balance_owner_key.clone()));
    }
}

impl Serializer for BalanceClaimOperation {
    fn write(&self, writer: &mut Writer) {
        self.deposit_to_account.write(writer);
        writer.write_u64(&self.balance_to_claim);
        self.balance_owner_key.write(writer);
        self.total_claimed.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(BalanceClaimOperation {
            deposit_to_account: reader.read()?,
            balance_to_claim: reader.read_u64()?,
            balance_owner_key: reader.read()?,
            total_claimed: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.deposit_to_account.size()
            + 8
            + self.balance_owner_key.size()
            + self.total_claimed.size()
    }
}
