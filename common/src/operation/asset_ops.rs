use serde::{Deserialize, Serialize};

use super::{RequiredAuthorities, ValidateError};
use crate::{
    asset::{is_valid_symbol, Asset, AssetId},
    config::{HUNDRED_PERCENT, MAX_ASSET_PRECISION, MAX_SHARE_SUPPLY},
    serializer::{Reader, ReaderError, Serializer, Writer},
    utils::is_valid_account_name,
};

fn validate_account_name(name: &str) -> Result<(), ValidateError> {
    if !is_valid_account_name(name) {
        return Err(ValidateError::InvalidAccountName(name.to_owned()));
    }
    Ok(())
}

// Issuer permission bits
pub const CHARGE_MARKET_FEE: u16 = 0x01;
pub const WHITE_LIST: u16 = 0x02;
pub const OVERRIDE_AUTHORITY: u16 = 0x04;
pub const TRANSFER_RESTRICTED: u16 = 0x08;
pub const DISABLE_FORCE_SETTLE: u16 = 0x10;
pub const GLOBAL_SETTLE: u16 = 0x20;
pub const DISABLE_CONFIDENTIAL: u16 = 0x40;

pub const ASSET_ISSUER_PERMISSION_MASK: u16 = CHARGE_MARKET_FEE
    | WHITE_LIST
    | OVERRIDE_AUTHORITY
    | TRANSFER_RESTRICTED
    | DISABLE_FORCE_SETTLE
    | GLOBAL_SETTLE
    | DISABLE_CONFIDENTIAL;
pub const UIA_ASSET_ISSUER_PERMISSION_MASK: u16 =
    CHARGE_MARKET_FEE | TRANSFER_RESTRICTED | DISABLE_CONFIDENTIAL;

/// Options shared by every asset. A flag may only be flipped while the
/// matching permission bit is still held by the issuer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetOptions {
    pub max_supply: i64,
    pub market_fee_percent: u16,
    pub max_market_fee: i64,
    pub issuer_permissions: u16,
    pub flags: u16,
    pub description: String,
}

impl Default for AssetOptions {
    fn default() -> Self {
        AssetOptions {
            max_supply: MAX_SHARE_SUPPLY,
            market_fee_percent: 0,
            max_market_fee: MAX_SHARE_SUPPLY,
            issuer_permissions: UIA_ASSET_ISSUER_PERMISSION_MASK,
            flags: 0,
            description: String::new(),
        }
    }
}

impl AssetOptions {
    pub fn validate(&self) -> Result<(), ValidateError> {
        if self.max_supply <= 0 || self.max_supply > MAX_SHARE_SUPPLY {
            return Err(ValidateError::ExcessiveShareSupply);
        }
        if self.market_fee_percent as u32 > HUNDRED_PERCENT {
            return Err(ValidateError::PercentOutOfRange(self.market_fee_percent));
        }
        if self.max_market_fee < 0 || self.max_market_fee > MAX_SHARE_SUPPLY {
            return Err(ValidateError::ExcessiveShareSupply);
        }
        // no high bits whose meaning is not known
        if self.issuer_permissions & !ASSET_ISSUER_PERMISSION_MASK != 0 {
            return Err(ValidateError::UnknownPermissionBits(self.issuer_permissions));
        }
        Ok(())
    }
}

impl Serializer for AssetOptions {
    fn write(&self, writer: &mut Writer) {
        writer.write_i64(&self.max_supply);
        writer.write_u16(self.market_fee_percent);
        writer.write_i64(&self.max_market_fee);
        writer.write_u16(self.issuer_permissions);
        writer.write_u16(self.flags);
        self.description.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(AssetOptions {
            max_supply: reader.read_i64()?,
            market_fee_percent: reader.read_u16()?,
            max_market_fee: reader.read_i64()?,
            issuer_permissions: reader.read_u16()?,
            flags: reader.read_u16()?,
            description: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        8 + 2 + 8 + 2 + 2 + self.description.size()
    }
}

/// Registers a new user-issued asset under a unique symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetCreateOperation {
    pub issuer: String,
    pub symbol: String,
    pub precision: u8,
    pub common_options: AssetOptions,
}

impl AssetCreateOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.issuer)?;
        if !is_valid_symbol(&self.symbol) {
            return Err(ValidateError::InvalidSymbol(self.symbol.clone()));
        }
        self.common_options.validate()?;
        if self.precision > MAX_ASSET_PRECISION {
            return Err(ValidateError::PrecisionTooLarge(self.precision));
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.issuer.clone());
    }
}

impl Serializer for AssetCreateOperation {
    fn write(&self, writer: &mut Writer) {
        self.issuer.write(writer);
        self.symbol.write(writer);
        writer.write_u8(self.precision);
        self.common_options.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(AssetCreateOperation {
            issuer: reader.read()?,
            symbol: reader.read()?,
            precision: reader.read_u8()?,
            common_options: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.issuer.size() + self.symbol.size() + 1 + self.common_options.size()
    }
}

/// Updates an asset's options and optionally hands it to a new issuer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetUpdateOperation {
    pub issuer: String,
    pub asset_to_update: AssetId,
    pub new_issuer: Option<String>,
    pub new_options: AssetOptions,
}

impl AssetUpdateOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.issuer)?;
        if let Some(new_issuer) = &self.new_issuer {
            validate_account_name(new_issuer)?;
            if new_issuer == &self.issuer {
                return Err(ValidateError::SelfReference("new_issuer"));
            }
        }
        self.new_options.validate()
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.issuer.clone());
    }
}

impl Serializer for AssetUpdateOperation {
    fn write(&self, writer: &mut Writer) {
        self.issuer.write(writer);
        self.asset_to_update.write(writer);
        self.new_issuer.write(writer);
        self.new_options.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(AssetUpdateOperation {
            issuer: reader.read()?,
            asset_to_update: reader.read()?,
            new_issuer: reader.read()?,
            new_options: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.issuer.size()
            + self.asset_to_update.size()
            + self.new_issuer.size()
            + self.new_options.size()
    }
}

/// Mints supply of an asset to an account, within the maximum supply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetIssueOperation {
    pub issuer: String,
    pub asset_to_issue: Asset,
    pub issue_to_account: String,
}

impl AssetIssueOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.issuer)?;
        validate_account_name(&self.issue_to_account)?;
        if self.asset_to_issue.amount <= 0 {
            return Err(ValidateError::NonPositiveAmount);
        }
        if self.asset_to_issue.amount > MAX_SHARE_SUPPLY {
            return Err(ValidateError::ExcessiveShareSupply);
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.issuer.clone());
    }
}

impl Serializer for AssetIssueOperation {
    fn write(&self, writer: &mut Writer) {
        self.issuer.write(writer);
        self.asset_to_issue.write(writer);
        self.issue_to_account.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(AssetIssueOperation {
            issuer: reader.read()?,
            asset_to_issue: reader.read()?,
            issue_to_account: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.issuer.size() + self.asset_to_issue.size() + self.issue_to_account.size()
    }
}

/// Takes an amount out of circulation, returning it to unissued supply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetReserveOperation {
    pub issuer: String,
    pub payer: String,
    pub amount_to_reserve: Asset,
}

impl AssetReserveOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.issuer)?;
        validate_account_name(&self.payer)?;
        if self.amount_to_reserve.amount <= 0 {
            return Err(ValidateError::NonPositiveAmount);
        }
        if self.amount_to_reserve.amount > MAX_SHARE_SUPPLY {
            return Err(ValidateError::ExcessiveShareSupply);
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.issuer.clone());
    }
}

impl Serializer for AssetReserveOperation {
    fn write(&self, writer: &mut Writer) {
        self.issuer.write(writer);
        self.payer.write(writer);
        self.amount_to_reserve.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(AssetReserveOperation {
            issuer: reader.read()?,
            payer: reader.read()?,
            amount_to_reserve: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.issuer.size() + self.payer.size() + self.amount_to_reserve.size()
    }
}
