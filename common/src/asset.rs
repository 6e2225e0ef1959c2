use std::{
    cmp::Ordering,
    fmt::{Display, Error as FmtError, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::{
        ASSET_PRECISION, ASSET_PRECISION_SCALE, MAX_ASSET_SYMBOL_LENGTH, MAX_SHARE_SUPPLY,
        MIN_ASSET_SYMBOL_LENGTH, MUSE_SYMBOL,
    },
    serializer::{varuint_size, Reader, ReaderError, Serializer, Writer},
};

// Object table holding asset rows; asset ids print as "2.28.<instance>"
pub const ASSET_OBJECT_SPACE: u8 = 2;
pub const ASSET_OBJECT_TYPE: u8 = 28;

// Instances are 48 bit
pub const MAX_INSTANCE_ID: u64 = (1 << 48) - 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount overflow")]
    Overflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Asset id mismatch: {left} vs {right}")]
    AssetIdMismatch { left: AssetId, right: AssetId },

    #[error("Invalid asset string: {0}")]
    InvalidAssetString(String),

    #[error("Invalid price")]
    InvalidPrice,
}

/// Identifier of an asset row, the 48-bit instance within table 2.28.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(u64);

impl AssetId {
    pub const fn new(instance: u64) -> Self {
        AssetId(instance)
    }

    pub const fn instance(&self) -> u64 {
        self.0
    }
}

impl Display for AssetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{}.{}.{}", ASSET_OBJECT_SPACE, ASSET_OBJECT_TYPE, self.0)
    }
}

impl FromStr for AssetId {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AmountError::InvalidAssetString(s.to_owned());
        let mut parts = s.split('.');
        let _space = parts.next().ok_or_else(invalid)?;
        let _ty = parts.next().ok_or_else(invalid)?;
        let instance: u64 = parts
            .next()
            .ok_or_else(invalid)?
            .parse()
            .map_err(|_| invalid())?;
        if parts.next().is_some() || instance > MAX_INSTANCE_ID {
            return Err(invalid());
        }
        Ok(AssetId(instance))
    }
}

impl Serializer for AssetId {
    fn write(&self, writer: &mut Writer) {
        writer.write_varuint(self.0);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let instance = reader.read_varuint()?;
        if instance > MAX_INSTANCE_ID {
            return Err(ReaderError::InvalidValue);
        }
        Ok(AssetId(instance))
    }

    fn size(&self) -> usize {
        varuint_size(self.0)
    }
}

/// A signed amount of a single asset at fixed precision 10^6.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Asset {
    pub amount: i64,
    pub asset_id: AssetId,
}

impl Asset {
    pub const fn new(amount: i64, asset_id: AssetId) -> Self {
        Asset { amount, asset_id }
    }

    pub const fn zero(asset_id: AssetId) -> Self {
        Asset::new(0, asset_id)
    }

    pub const fn decimals(&self) -> u8 {
        ASSET_PRECISION
    }

    pub const fn precision(&self) -> i64 {
        ASSET_PRECISION_SCALE
    }

    fn check_same_asset(&self, other: &Asset) -> Result<(), AmountError> {
        if self.asset_id != other.asset_id {
            return Err(AmountError::AssetIdMismatch {
                left: self.asset_id,
                right: other.asset_id,
            });
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Asset) -> Result<Asset, AmountError> {
        self.check_same_asset(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(AmountError::Overflow)?;
        Ok(Asset::new(amount, self.asset_id))
    }

    pub fn checked_sub(&self, other: &Asset) -> Result<Asset, AmountError> {
        self.check_same_asset(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(AmountError::Overflow)?;
        Ok(Asset::new(amount, self.asset_id))
    }

    pub fn negate(&self) -> Asset {
        Asset::new(-self.amount, self.asset_id)
    }

    // Defined ordering only makes sense for equal asset ids; mismatches are
    // caller bugs surfaced through checked comparisons in evaluators.
    pub fn checked_cmp(&self, other: &Asset) -> Result<Ordering, AmountError> {
        self.check_same_asset(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    /// Scale this amount through a price. Defined only when the asset id
    /// matches one side of the price; the result is denominated in the
    /// opposite side. Uses a 128 bit intermediate to avoid rounding drift.
    pub fn multiply(&self, price: &Price) -> Result<Asset, AmountError> {
        if self.asset_id == price.base.asset_id {
            if price.base.amount <= 0 {
                return Err(AmountError::DivisionByZero);
            }
            let result = (self.amount as i128 * price.quote.amount as i128)
                / price.base.amount as i128;
            let amount = i64::try_from(result).map_err(|_| AmountError::Overflow)?;
            Ok(Asset::new(amount, price.quote.asset_id))
        } else if self.asset_id == price.quote.asset_id {
            if price.quote.amount <= 0 {
                return Err(AmountError::DivisionByZero);
            }
            let result = (self.amount as i128 * price.base.amount as i128)
                / price.quote.amount as i128;
            let amount = i64::try_from(result).map_err(|_| AmountError::Overflow)?;
            Ok(Asset::new(amount, price.base.asset_id))
        } else {
            Err(AmountError::AssetIdMismatch {
                left: self.asset_id,
                right: price.base.asset_id,
            })
        }
    }

    pub fn to_real(&self) -> f64 {
        self.amount as f64 / self.precision() as f64
    }
}

impl Default for Asset {
    fn default() -> Self {
        Asset::new(0, MUSE_SYMBOL)
    }
}

impl Display for Asset {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        let sign = if self.amount < 0 { "-" } else { "" };
        let magnitude = self.amount.unsigned_abs();
        let scale = ASSET_PRECISION_SCALE as u64;
        write!(
            f,
            "{}{}.{:06} {}",
            sign,
            magnitude / scale,
            magnitude % scale,
            self.asset_id
        )
    }
}

impl FromStr for Asset {
    type Err = AmountError;

    fn from_str(from: &str) -> Result<Self, Self::Err> {
        let invalid = || AmountError::InvalidAssetString(from.to_owned());
        let s = from.trim();
        let (amount_part, id_part) = s.split_once(' ').ok_or_else(invalid)?;

        let (negative, amount_part) = match amount_part.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, amount_part),
        };

        let (int_part, fract_part) = match amount_part.split_once('.') {
            Some((i, f)) => (i, f),
            None => (amount_part, ""),
        };

        let int_value: i64 = int_part.parse().map_err(|_| invalid())?;
        let mut amount = int_value
            .checked_mul(ASSET_PRECISION_SCALE)
            .ok_or(AmountError::Overflow)?;

        if !fract_part.is_empty() {
            // digits beyond the fixed precision are truncated
            let digits = fract_part.len().min(ASSET_PRECISION as usize);
            let mut fraction = String::from(&fract_part[..digits]);
            while fraction.len() < ASSET_PRECISION as usize {
                fraction.push('0');
            }
            let fract_value: i64 = fraction.parse().map_err(|_| invalid())?;
            amount = amount.checked_add(fract_value).ok_or(AmountError::Overflow)?;
        }

        if negative {
            amount = -amount;
        }

        Ok(Asset::new(amount, id_part.parse()?))
    }
}

impl Serialize for Asset {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'a> Deserialize<'a> for Asset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl Serializer for Asset {
    fn write(&self, writer: &mut Writer) {
        writer.write_i64(&self.amount);
        self.asset_id.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(Asset {
            amount: reader.read_i64()?,
            asset_id: AssetId::read(reader)?,
        })
    }

    fn size(&self) -> usize {
        8 + self.asset_id.size()
    }
}

/// Exchange rate between two different assets, an ordered (base, quote)
/// pair. Comparison cross-multiplies in 128 bit so equal rates written
/// with different magnitudes compare equal.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Price {
    pub base: Asset,
    pub quote: Asset,
}

impl Price {
    pub const fn new(base: Asset, quote: Asset) -> Self {
        Price { base, quote }
    }

    pub fn validate(&self) -> Result<(), AmountError> {
        if self.base.amount <= 0 || self.quote.amount <= 0 {
            return Err(AmountError::InvalidPrice);
        }
        if self.base.asset_id == self.quote.asset_id {
            return Err(AmountError::InvalidPrice);
        }
        Ok(())
    }

    pub const fn invert(&self) -> Price {
        Price {
            base: self.quote,
            quote: self.base,
        }
    }

    pub fn max(base: AssetId, quote: AssetId) -> Price {
        Price::new(Asset::new(MAX_SHARE_SUPPLY, base), Asset::new(1, quote))
    }

    pub fn min(base: AssetId, quote: AssetId) -> Price {
        Price::new(Asset::new(1, base), Asset::new(MAX_SHARE_SUPPLY, quote))
    }

    pub fn to_real(&self) -> f64 {
        self.base.to_real() / self.quote.to_real()
    }
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Price {}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.base.asset_id, self.quote.asset_id)
            .cmp(&(other.base.asset_id, other.quote.asset_id))
            .then_with(|| {
                let lhs = other.quote.amount as i128 * self.base.amount as i128;
                let rhs = self.quote.amount as i128 * other.base.amount as i128;
                lhs.cmp(&rhs)
            })
    }
}

impl Serializer for Price {
    fn write(&self, writer: &mut Writer) {
        self.base.write(writer);
        self.quote.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(Price {
            base: Asset::read(reader)?,
            quote: Asset::read(reader)?,
        })
    }

    fn size(&self) -> usize {
        self.base.size() + self.quote.size()
    }
}

/// Valid ticker symbols contain [A-Z0-9] plus at most one '.', start and
/// end with a letter, and are 3 to 8 characters long.
pub fn is_valid_symbol(symbol: &str) -> bool {
    if symbol.len() < MIN_ASSET_SYMBOL_LENGTH || symbol.len() > MAX_ASSET_SYMBOL_LENGTH {
        return false;
    }

    let bytes = symbol.as_bytes();
    if !bytes[0].is_ascii_uppercase() || !bytes[bytes.len() - 1].is_ascii_uppercase() {
        return false;
    }

    let mut dot_already_present = false;
    for &c in bytes {
        if c.is_ascii_uppercase() || c.is_ascii_digit() {
            continue;
        }
        if c == b'.' {
            if dot_already_present {
                return false;
            }
            dot_already_present = true;
            continue;
        }
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MBD_SYMBOL, VESTS_SYMBOL};

    #[test]
    fn asset_string_round_trip() {
        assert_eq!(Asset::default().to_string(), "0.000000 2.28.0");

        let muse: Asset = "123.456 2.28.0".parse().unwrap();
        assert_eq!(muse.amount, 123_456_000);
        assert_eq!(muse.asset_id, MUSE_SYMBOL);
        assert_eq!(muse.to_string(), "123.456000 2.28.0");

        let mbd: Asset = "654.321 2.28.2".parse().unwrap();
        assert_eq!(mbd.asset_id, MBD_SYMBOL);
        assert_eq!(mbd.to_string(), "654.321000 2.28.2");

        assert_eq!("0.456 2.28.0".parse::<Asset>().unwrap().amount, 456_000);
        assert_eq!("0.056 2.28.0".parse::<Asset>().unwrap().amount, 56_000);
        assert_eq!(Asset::new(50, MUSE_SYMBOL).to_string(), "0.000050 2.28.0");
        assert_eq!(
            Asset::new(50_000_000, MUSE_SYMBOL).to_string(),
            "50.000000 2.28.0"
        );

        // fraction digits beyond the precision are truncated
        let vests: Asset = "123.456789 2.28.1".parse().unwrap();
        assert_eq!(vests.asset_id, VESTS_SYMBOL);
        assert_eq!(vests.amount, 123_456_789);
        let vests: Asset = "123.45678 2.28.1".parse().unwrap();
        assert_eq!(vests.amount, 123_456_780);

        // integer-only form
        assert_eq!("123 2.28.0".parse::<Asset>().unwrap().amount, 123_000_000);

        // negative amounts keep their sign through the fraction
        let negative: Asset = "-0.500000 2.28.0".parse().unwrap();
        assert_eq!(negative.amount, -500_000);
        assert_eq!(negative.to_string(), "-0.500000 2.28.0");
    }

    #[test]
    fn asset_string_rejects_garbage() {
        assert!("123.456".parse::<Asset>().is_err());
        assert!("abc 2.28.0".parse::<Asset>().is_err());
        assert!("1.0 2.28".parse::<Asset>().is_err());
        assert!("1.0 2.28.0.1".parse::<Asset>().is_err());
        // instance beyond 48 bits
        assert!("1.0 2.28.281474976710656".parse::<Asset>().is_err());
    }

    #[test]
    fn checked_arithmetic() {
        let a = Asset::new(2, MUSE_SYMBOL);
        let b = Asset::new(3, MUSE_SYMBOL);
        assert_eq!(a.checked_add(&b).unwrap().amount, 5);
        assert_eq!(a.checked_sub(&b).unwrap().amount, -1);

        let mismatched = Asset::new(1, MBD_SYMBOL);
        assert!(matches!(
            a.checked_add(&mismatched),
            Err(AmountError::AssetIdMismatch { .. })
        ));
        assert!(Asset::new(i64::MAX, MUSE_SYMBOL)
            .checked_add(&Asset::new(1, MUSE_SYMBOL))
            .is_err());
    }

    #[test]
    fn price_ordering_cross_multiplies() {
        let a = MUSE_SYMBOL;
        let b = MBD_SYMBOL;
        // 2/3 < 3/4 because 2*4 < 3*3
        let lhs = Price::new(Asset::new(2, a), Asset::new(3, b));
        let rhs = Price::new(Asset::new(3, a), Asset::new(4, b));
        assert!(lhs < rhs);
        assert!(rhs > lhs);

        // same rate at different magnitudes compares equal
        let doubled = Price::new(Asset::new(4, a), Asset::new(6, b));
        assert_eq!(lhs, doubled);
    }

    #[test]
    fn multiply_through_price() {
        let rate = Price::new(
            Asset::new(2, MUSE_SYMBOL),
            Asset::new(6, MBD_SYMBOL),
        );
        let paid = Asset::new(10, MUSE_SYMBOL).multiply(&rate).unwrap();
        assert_eq!(paid, Asset::new(30, MBD_SYMBOL));

        let back = Asset::new(30, MBD_SYMBOL).multiply(&rate).unwrap();
        assert_eq!(back, Asset::new(10, MUSE_SYMBOL));

        let unrelated = Asset::new(1, VESTS_SYMBOL);
        assert!(unrelated.multiply(&rate).is_err());
    }

    #[test]
    fn symbol_grammar() {
        for valid in ["MUSE", "EUR.USD", "ABC", "A2B", "AB2C.DEF"] {
            assert!(is_valid_symbol(valid), "{valid} should be valid");
        }
        for invalid in ["A", "AB", "lower", "A..B", "AB1", "1AB", ".ABC", "ABCDEFGHI", "AB-C"] {
            assert!(!is_valid_symbol(invalid), "{invalid} should be invalid");
        }
    }
}
