use serde::{Deserialize, Serialize};

use super::{RequiredAuthorities, ValidateError};
use crate::{
    asset::{Asset, Price},
    config::{MBD_SYMBOL, MUSE_SYMBOL, VESTS_SYMBOL},
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

// The internal market only trades MBD against other liquid assets;
// vesting shares never enter the book.
fn validate_market_pair(a: &Asset, b: &Asset) -> Result<(), ValidateError> {
    if a.asset_id != MBD_SYMBOL && b.asset_id != MBD_SYMBOL {
        return Err(ValidateError::WrongAssetType("one side must be MBD"));
    }
    if a.asset_id == VESTS_SYMBOL || b.asset_id == VESTS_SYMBOL {
        return Err(ValidateError::WrongAssetType("VESTS cannot be traded"));
    }
    Ok(())
}

/// Places a limit order defined by the amount sold and the minimum
/// amount received.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LimitOrderCreateOperation {
    pub owner: String,
    pub order_id: u32,
    pub amount_to_sell: Asset,
    pub min_to_receive: Asset,
    pub fill_or_kill: bool,
    pub expiration: TimePointSec,
}

impl LimitOrderCreateOperation {
    pub fn sell_price(&self) -> Price {
        Price::new(self.amount_to_sell, self.min_to_receive)
    }

    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.owner)?;
        validate_market_pair(&self.amount_to_sell, &self.min_to_receive)?;
        self.sell_price().validate()?;
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.owner.clone());
    }
}

impl Serializer for LimitOrderCreateOperation {
    fn write(&self, writer: &mut Writer) {
        self.owner.write(writer);
        writer.write_u32(&self.order_id);
        self.amount_to_sell.write(writer);
        self.min_to_receive.write(writer);
        writer.write_bool(self.fill_or_kill);
        self.expiration.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(LimitOrderCreateOperation {
            owner: reader.read()?,
            order_id: reader.read_u32()?,
            amount_to_sell: reader.read()?,
            min_to_receive: reader.read()?,
            fill_or_kill: reader.read_bool()?,
            expiration: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.owner.size()
            + 4
            + self.amount_to_sell.size()
            + self.min_to_receive.size()
            + 1
            + self.expiration.size()
    }
}

/// Places a limit order defined by an explicit exchange rate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LimitOrderCreate2Operation {
    pub owner: String,
    pub order_id: u32,
    pub amount_to_sell: Asset,
    pub exchange_rate: Price,
    pub fill_or_kill: bool,
    pub expiration: TimePointSec,
}

impl LimitOrderCreate2Operation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.owner)?;
        if self.amount_to_sell.asset_id != self.exchange_rate.base.asset_id {
            return Err(ValidateError::WrongAssetType(
                "sell amount must be the base of the exchange rate",
            ));
        }
        self.exchange_rate.validate()?;
        validate_market_pair(&self.exchange_rate.base, &self.exchange_rate.quote)?;

        // must not round to nothing
        let receives = self.amount_to_sell.multiply(&self.exchange_rate)?;
        if receives.amount <= 0 {
            return Err(ValidateError::NonPositiveAmount);
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.owner.clone());
    }
}

impl Serializer for LimitOrderCreate2Operation {
    fn write(&self, writer: &mut Writer) {
        self.owner.write(writer);
        writer.write_u32(&self.order_id);
        self.amount_to_sell.write(writer);
        self.exchange_rate.write(writer);
        writer.write_bool(self.fill_or_kill);
        self.expiration.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(LimitOrderCreate2Operation {
            owner: reader.read()?,
            order_id: reader.read_u32()?,
            amount_to_sell: reader.read()?,
            exchange_rate: reader.read()?,
            fill_or_kill: reader.read_bool()?,
            expiration: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.owner.size()
            + 4
            + self.amount_to_sell.size()
            + self.exchange_rate.size()
            + 1
            + self.expiration.size()
    }
}

/// Cancels an open limit order, refunding whatever is still for sale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderCancelOperation {
    pub owner: String,
    pub order_id: u32,
}

impl LimitOrderCancelOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.owner)
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.owner.clone());
    }
}

impl Serializer for LimitOrderCancelOperation {
    fn write(&self, writer: &mut Writer) {
        self.owner.write(writer);
        writer.write_u32(&self.order_id);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(LimitOrderCancelOperation {
            owner: reader.read()?,
            order_id: reader.read_u32()?,
        })
    }

    fn size(&self) -> usize {
        self.owner.size() + 4
    }
}

/// A witness publishes its MUSE/MBD price observation. The median over
/// the active witnesses drives MBD conversions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedPublishOperation {
    pub publisher: String,
    pub exchange_rate: Price,
}

impl FeedPublishOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.publisher)?;
        let base = self.exchange_rate.base.asset_id;
        let quote = self.exchange_rate.quote.asset_id;
        let muse_mbd = base == MUSE_SYMBOL && quote == MBD_SYMBOL;
        let mbd_muse = base == MBD_SYMBOL && quote == MUSE_SYMBOL;
        if !muse_mbd && !mbd_muse {
            return Err(ValidateError::WrongAssetType("feed must price MUSE against MBD"));
        }
        self.exchange_rate.validate()?;
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.publisher.clone());
    }
}

impl Serializer for FeedPublishOperation {
    fn write(&self, writer: &mut Writer) {
        self.publisher.write(writer);
        self.exchange_rate.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(FeedPublishOperation {
            publisher: reader.read()?,
            exchange_rate: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.publisher.size() + self.exchange_rate.size()
    }
}

/// Burns MBD now to receive MUSE after the conversion delay at the
/// median feed. Only the MBD to MUSE direction exists; the opposite
/// would let traders ride market swings without moving the price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvertOperation {
    pub owner: String,
    pub request_id: u32,
    pub amount: Asset,
}

impl ConvertOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.owner)?;
        if self.amount.asset_id != MBD_SYMBOL {
            return Err(ValidateError::WrongAssetType("amount must be MBD"));
        }
        if self.amount.amount <= 0 {
            return Err(ValidateError::NonPositiveAmount);
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.owner.clone());
    }
}

impl Serializer for ConvertOperation {
    fn write(&self, writer: &mut Writer) {
        self.owner.write(writer);
        writer.write_u32(&self.request_id);
        self.amount.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(ConvertOperation {
            owner: reader.read()?,
            request_id: reader.read_u32()?,
            amount: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.owner.size() + 4 + self.amount.size()
    }
}
