use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Error as FmtError, Formatter},
    str::FromStr,
};

use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hash::{hash, Hash};
use crate::serializer::{Reader, ReaderError, Serializer, Writer};

pub const PUBLIC_KEY_SIZE: usize = 33; // compressed secp256k1 point
pub const SIGNATURE_SIZE: usize = 65; // recovery id + r + s

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Invalid secret key material")]
    InvalidSecretKey,

    #[error("Invalid public key encoding")]
    InvalidPublicKey,

    #[error("Invalid signature encoding")]
    InvalidSignature,

    #[error("Signature recovery failed")]
    RecoveryFailed,
}

/// Compressed secp256k1 public key, the identity carried by authorities
/// and recovered from transaction signatures.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    pub const fn new(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        PublicKey(bytes)
    }

    // All-zero sentinel, never a valid curve point
    pub const fn zero() -> Self {
        PublicKey([0; PUBLIC_KEY_SIZE])
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn parse(&self) -> Result<libsecp256k1::PublicKey, KeyError> {
        libsecp256k1::PublicKey::parse_compressed(&self.0).map_err(|_| KeyError::InvalidPublicKey)
    }

    pub fn verify(&self, digest: &Hash, signature: &Signature) -> bool {
        let Ok(key) = self.parse() else {
            return false;
        };
        let message = libsecp256k1::Message::parse(digest.as_bytes());
        let Ok(sig) = signature.parse() else {
            return false;
        };
        libsecp256k1::verify(&message, &sig.0, &key)
    }
}

impl Default for PublicKey {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| "Invalid hex string")?;
        let bytes: [u8; PUBLIC_KEY_SIZE] =
            bytes.try_into().map_err(|_| "Invalid public key length")?;
        Ok(PublicKey::new(bytes))
    }
}

impl Serializer for PublicKey {
    fn write(&self, writer: &mut Writer) {
        writer.write_bytes(&self.0);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(PublicKey::new(reader.read_bytes_33()?))
    }

    fn size(&self) -> usize {
        PUBLIC_KEY_SIZE
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'a> Deserialize<'a> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let hex = String::deserialize(deserializer)?;
        PublicKey::from_str(&hex).map_err(SerdeError::custom)
    }
}

/// Secp256k1 secret key. Never part of consensus state; lives in wallets
/// and test fixtures only.
#[derive(Clone)]
pub struct PrivateKey(libsecp256k1::SecretKey);

impl PrivateKey {
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, KeyError> {
        libsecp256k1::SecretKey::parse(bytes)
            .map(PrivateKey)
            .map_err(|_| KeyError::InvalidSecretKey)
    }

    // Deterministic key from a seed string, for genesis and tests
    pub fn from_seed(seed: &str) -> Self {
        let digest = hash(seed.as_bytes());
        // a sha256 output is a valid scalar for any practical seed
        Self::from_bytes(digest.as_bytes()).expect("seed produced an invalid scalar")
    }

    pub fn public_key(&self) -> PublicKey {
        let key = libsecp256k1::PublicKey::from_secret_key(&self.0);
        PublicKey::new(key.serialize_compressed())
    }

    pub fn sign(&self, digest: &Hash) -> Signature {
        let message = libsecp256k1::Message::parse(digest.as_bytes());
        let (signature, recovery_id) = libsecp256k1::sign(&message, &self.0);
        let mut bytes = [0u8; SIGNATURE_SIZE];
        bytes[0] = recovery_id.serialize();
        bytes[1..].copy_from_slice(&signature.serialize());
        Signature::new(bytes)
    }
}

/// Compact ECDSA signature: one recovery-id byte followed by r || s.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    pub const fn new(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Signature(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    fn parse(&self) -> Result<(libsecp256k1::Signature, libsecp256k1::RecoveryId), KeyError> {
        let recovery_id =
            libsecp256k1::RecoveryId::parse(self.0[0]).map_err(|_| KeyError::InvalidSignature)?;
        let body: [u8; 64] = self.0[1..].try_into().map_err(|_| KeyError::InvalidSignature)?;
        let signature = libsecp256k1::Signature::parse_standard(&body)
            .map_err(|_| KeyError::InvalidSignature)?;
        Ok((signature, recovery_id))
    }

    /// Recover the signing public key from the digest. This is the only
    /// signature entry point the chain uses: authority checking operates on
    /// recovered keys.
    pub fn recover(&self, digest: &Hash) -> Result<PublicKey, KeyError> {
        let (signature, recovery_id) = self.parse()?;
        let message = libsecp256k1::Message::parse(digest.as_bytes());
        let key = libsecp256k1::recover(&message, &signature, &recovery_id)
            .map_err(|_| KeyError::RecoveryFailed)?;
        Ok(PublicKey::new(key.serialize_compressed()))
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}

impl Serializer for Signature {
    fn write(&self, writer: &mut Writer) {
        writer.write_bytes(&self.0);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(Signature::new(reader.read_bytes_65()?))
    }

    fn size(&self) -> usize {
        SIGNATURE_SIZE
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'a> Deserialize<'a> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let hex = String::deserialize(deserializer)?;
        let bytes = hex::decode(hex).map_err(SerdeError::custom)?;
        let bytes: [u8; SIGNATURE_SIZE] = bytes
            .try_into()
            .map_err(|_| SerdeError::custom("Invalid signature length"))?;
        Ok(Signature::new(bytes))
    }
}
