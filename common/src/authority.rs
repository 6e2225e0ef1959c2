use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::MAX_AUTHORITY_MEMBERSHIP,
    crypto::PublicKey,
    serializer::{Reader, ReaderError, Serializer, Writer},
    utils::is_valid_account_name,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthorityError {
    #[error("Authority threshold must be positive")]
    ZeroThreshold,

    #[error("Authority weights must be positive")]
    ZeroWeight,

    #[error("Authority has too many members: {0}")]
    TooManyMembers(usize),

    #[error("Authority cannot be satisfied: threshold {threshold} exceeds total weight {total}")]
    Impossible { threshold: u32, total: u64 },

    #[error("Invalid account name in authority: {0}")]
    InvalidAccountName(String),
}

/// Threshold-weighted set of keys and account references. A permission is
/// granted once the combined weight of satisfied members reaches the
/// threshold; account members resolve recursively through that account's
/// own authority, bounded by the signature check depth.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub weight_threshold: u32,
    pub account_auths: IndexMap<String, u16>,
    pub key_auths: IndexMap<PublicKey, u16>,
}

impl Authority {
    pub fn new(weight_threshold: u32) -> Self {
        Authority {
            weight_threshold,
            account_auths: IndexMap::new(),
            key_auths: IndexMap::new(),
        }
    }

    // Single key with weight 1, threshold 1
    pub fn single_key(key: PublicKey) -> Self {
        let mut authority = Authority::new(1);
        authority.key_auths.insert(key, 1);
        authority
    }

    // Single account reference with weight 1, threshold 1
    pub fn single_account(name: impl Into<String>) -> Self {
        let mut authority = Authority::new(1);
        authority.account_auths.insert(name.into(), 1);
        authority
    }

    pub fn add_key(mut self, key: PublicKey, weight: u16) -> Self {
        self.key_auths.insert(key, weight);
        self
    }

    pub fn add_account(mut self, name: impl Into<String>, weight: u16) -> Self {
        self.account_auths.insert(name.into(), weight);
        self
    }

    pub fn num_members(&self) -> usize {
        self.account_auths.len() + self.key_auths.len()
    }

    fn total_weight(&self) -> u64 {
        self.account_auths
            .values()
            .chain(self.key_auths.values())
            .map(|w| *w as u64)
            .sum()
    }

    pub fn is_impossible(&self) -> bool {
        self.total_weight() < self.weight_threshold as u64
    }

    pub fn validate(&self) -> Result<(), AuthorityError> {
        if self.weight_threshold == 0 {
            return Err(AuthorityError::ZeroThreshold);
        }
        if self.num_members() > MAX_AUTHORITY_MEMBERSHIP {
            return Err(AuthorityError::TooManyMembers(self.num_members()));
        }
        for (name, weight) in &self.account_auths {
            if !is_valid_account_name(name) {
                return Err(AuthorityError::InvalidAccountName(name.clone()));
            }
            if *weight == 0 {
                return Err(AuthorityError::ZeroWeight);
            }
        }
        if self.key_auths.values().any(|w| *w == 0) {
            return Err(AuthorityError::ZeroWeight);
        }
        if self.is_impossible() {
            return Err(AuthorityError::Impossible {
                threshold: self.weight_threshold,
                total: self.total_weight(),
            });
        }
        Ok(())
    }
}

impl Serializer for Authority {
    fn write(&self, writer: &mut Writer) {
        writer.write_u32(&self.weight_threshold);
        self.account_auths.write(writer);
        self.key_auths.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(Authority {
            weight_threshold: reader.read_u32()?,
            account_auths: reader.read()?,
            key_auths: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        4 + self.account_auths.size() + self.key_auths.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;

    fn key(seed: &str) -> PublicKey {
        PrivateKey::from_seed(seed).public_key()
    }

    #[test]
    fn validates_weights_and_threshold() {
        let good = Authority::single_key(key("alice")).add_account("bob", 1);
        good.validate().unwrap();

        assert!(matches!(
            Authority::new(0).validate(),
            Err(AuthorityError::ZeroThreshold)
        ));
        assert!(matches!(
            Authority::single_key(key("a")).add_account("bob", 0).validate(),
            Err(AuthorityError::ZeroWeight)
        ));
        assert!(matches!(
            Authority::single_account("NotValid").validate(),
            Err(AuthorityError::InvalidAccountName(_))
        ));
    }

    #[test]
    fn impossible_authority() {
        let mut authority = Authority::new(3);
        authority.key_auths.insert(key("alice"), 1);
        authority.key_auths.insert(key("bob"), 1);
        assert!(authority.is_impossible());
        assert!(matches!(
            authority.validate(),
            Err(AuthorityError::Impossible { threshold: 3, total: 2 })
        ));
    }

    #[test]
    fn member_cap() {
        let mut authority = Authority::new(1);
        for i in 0..11 {
            authority.key_auths.insert(key(&format!("seed-{i}")), 1);
        }
        assert!(matches!(
            authority.validate(),
            Err(AuthorityError::TooManyMembers(11))
        ));
    }

    #[test]
    fn wire_round_trip() {
        let authority = Authority::new(2)
            .add_key(key("alice"), 1)
            .add_key(key("bob"), 1)
            .add_account("carol", 2);
        let bytes = authority.to_bytes();
        assert_eq!(bytes.len(), authority.size());
        assert_eq!(Authority::from_bytes(&bytes).unwrap(), authority);
    }
}
