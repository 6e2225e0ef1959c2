use std::fmt::{Display, Error as FmtError, Formatter};

use serde::{Deserialize, Serialize};

use crate::{
    crypto::{hash, Hash, Hashable, KeyError, PrivateKey, PublicKey, Signature},
    serializer::{Reader, ReaderError, Serializer, Writer},
    time::TimePointSec,
    transaction::SignedTransaction,
};

/// Protocol version, carried in header extensions so witnesses can signal
/// which rule set they run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u16,
}

impl Version {
    pub const fn new(major: u8, minor: u8, patch: u16) -> Self {
        Version { major, minor, patch }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serializer for Version {
    fn write(&self, writer: &mut Writer) {
        writer.write_u8(self.major);
        writer.write_u8(self.minor);
        writer.write_u16(self.patch);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(Version {
            major: reader.read_u8()?,
            minor: reader.read_u8()?,
            patch: reader.read_u16()?,
        })
    }

    fn size(&self) -> usize {
        4
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockHeaderExtension {
    Void,
    Version(Version),
    HardforkVersion(Version),
}

impl Serializer for BlockHeaderExtension {
    fn write(&self, writer: &mut Writer) {
        match self {
            BlockHeaderExtension::Void => writer.write_u8(0),
            BlockHeaderExtension::Version(version) => {
                writer.write_u8(1);
                version.write(writer);
            }
            BlockHeaderExtension::HardforkVersion(version) => {
                writer.write_u8(2);
                version.write(writer);
            }
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        match reader.read_u8()? {
            0 => Ok(BlockHeaderExtension::Void),
            1 => Ok(BlockHeaderExtension::Version(reader.read()?)),
            2 => Ok(BlockHeaderExtension::HardforkVersion(reader.read()?)),
            _ => Err(ReaderError::InvalidValue),
        }
    }

    fn size(&self) -> usize {
        match self {
            BlockHeaderExtension::Void => 1,
            BlockHeaderExtension::Version(version)
            | BlockHeaderExtension::HardforkVersion(version) => 1 + version.size(),
        }
    }
}

/// Block header: parent link, slot timestamp, scheduled witness and the
/// merkle root over the carried transactions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub previous: Hash,
    pub timestamp: TimePointSec,
    pub witness: String,
    pub transaction_merkle_root: Hash,
    pub extensions: Vec<BlockHeaderExtension>,
}

impl BlockHeader {
    /// Block number, embedded in the first four bytes of every block id.
    pub fn block_num(&self) -> u32 {
        num_from_id(&self.previous) + 1
    }
}

pub fn num_from_id(block_id: &Hash) -> u32 {
    let bytes = block_id.as_bytes();
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

impl Serializer for BlockHeader {
    fn write(&self, writer: &mut Writer) {
        self.previous.write(writer);
        self.timestamp.write(writer);
        self.witness.write(writer);
        self.transaction_merkle_root.write(writer);
        self.extensions.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(BlockHeader {
            previous: reader.read()?,
            timestamp: reader.read()?,
            witness: reader.read()?,
            transaction_merkle_root: reader.read()?,
            extensions: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.previous.size()
            + self.timestamp.size()
            + self.witness.size()
            + self.transaction_merkle_root.size()
            + self.extensions.size()
    }
}

impl Hashable for BlockHeader {}

/// Header plus the producing witness's signature over the header digest.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SignedBlockHeader {
    #[serde(flatten)]
    pub header: BlockHeader,
    pub witness_signature: Option<Signature>,
}

impl SignedBlockHeader {
    pub fn new(header: BlockHeader) -> Self {
        SignedBlockHeader {
            header,
            witness_signature: None,
        }
    }

    pub fn sign(&mut self, key: &PrivateKey) {
        self.witness_signature = Some(key.sign(&self.header.hash()));
    }

    /// Key that produced this block, recovered from the signature.
    pub fn signee(&self) -> Result<PublicKey, KeyError> {
        let signature = self
            .witness_signature
            .as_ref()
            .ok_or(KeyError::InvalidSignature)?;
        signature.recover(&self.header.hash())
    }

    /// Block id: header digest with the block number stamped into the
    /// first four bytes, so ids sort and index by height.
    pub fn id(&self) -> Hash {
        let mut bytes = self.hash().to_bytes();
        bytes[..4].copy_from_slice(&self.header.block_num().to_be_bytes());
        Hash::new(bytes)
    }

    pub fn block_num(&self) -> u32 {
        self.header.block_num()
    }
}

impl Serializer for SignedBlockHeader {
    fn write(&self, writer: &mut Writer) {
        self.header.write(writer);
        self.witness_signature.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(SignedBlockHeader {
            header: reader.read()?,
            witness_signature: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.header.size() + self.witness_signature.size()
    }
}

impl Hashable for SignedBlockHeader {}

/// A complete block as produced by a witness.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SignedBlock {
    #[serde(flatten)]
    pub signed_header: SignedBlockHeader,
    pub transactions: Vec<SignedTransaction>,
}

impl SignedBlock {
    pub fn id(&self) -> Hash {
        self.signed_header.id()
    }

    pub fn block_num(&self) -> u32 {
        self.signed_header.block_num()
    }

    pub fn header(&self) -> &BlockHeader {
        &self.signed_header.header
    }

    /// Merkle root over the block's transaction ids; the empty block
    /// commits to the zero hash.
    pub fn calculate_merkle_root(&self) -> Hash {
        merkle_root(self.transactions.iter().map(|tx| tx.id()).collect())
    }
}

impl Serializer for SignedBlock {
    fn write(&self, writer: &mut Writer) {
        self.signed_header.write(writer);
        self.transactions.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(SignedBlock {
            signed_header: reader.read()?,
            transactions: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.signed_header.size() + self.transactions.size()
    }
}

/// Pairwise merkle tree; an odd node is promoted unchanged.
pub fn merkle_root(mut layer: Vec<Hash>) -> Hash {
    if layer.is_empty() {
        return Hash::zero();
    }
    while layer.len() > 1 {
        let mut next = Vec::with_capacity(layer.len().div_ceil(2));
        for pair in layer.chunks(2) {
            match pair {
                [left, right] => {
                    let mut bytes = Vec::with_capacity(64);
                    bytes.extend_from_slice(left.as_bytes());
                    bytes.extend_from_slice(right.as_bytes());
                    next.push(hash(&bytes));
                }
                [single] => next.push(single.clone()),
                _ => unreachable!(),
            }
        }
        layer = next;
    }
    layer.remove(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merkle_root_shapes() {
        assert_eq!(merkle_root(vec![]), Hash::zero());

        let a = hash(b"a");
        let b = hash(b"b");
        let c = hash(b"c");

        assert_eq!(merkle_root(vec![a.clone()]), a);

        let mut pair = Vec::new();
        pair.extend_from_slice(a.as_bytes());
        pair.extend_from_slice(b.as_bytes());
        let ab = hash(&pair);
        assert_eq!(merkle_root(vec![a.clone(), b.clone()]), ab);

        // odd node is promoted
        let mut abc = Vec::new();
        abc.extend_from_slice(ab.as_bytes());
        abc.extend_from_slice(c.as_bytes());
        assert_eq!(merkle_root(vec![a, b, c]), hash(&abc));
    }

    #[test]
    fn block_num_embedded_in_id() {
        let mut header = BlockHeader::default();
        let mut parent = [0u8; 32];
        parent[..4].copy_from_slice(&41u32.to_be_bytes());
        header.previous = Hash::new(parent);
        header.witness = "initminer".to_owned();

        let mut signed = SignedBlockHeader::new(header);
        signed.sign(&PrivateKey::from_seed("init_key"));
        assert_eq!(signed.block_num(), 42);
        assert_eq!(num_from_id(&signed.id()), 42);
        assert_eq!(
            signed.signee().unwrap(),
            PrivateKey::from_seed("init_key").public_key()
        );
    }

    #[test]
    fn header_extension_round_trip() {
        let extensions = vec![
            BlockHeaderExtension::Void,
            BlockHeaderExtension::Version(Version::new(0, 0, 1)),
            BlockHeaderExtension::HardforkVersion(Version::new(0, 1, 0)),
        ];
        let bytes = extensions.to_bytes();
        assert_eq!(Vec::<BlockHeaderExtension>::from_bytes(&bytes).unwrap(), extensions);
    }
}
