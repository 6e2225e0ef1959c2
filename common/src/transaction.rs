use serde::{Deserialize, Serialize};

use crate::{
    crypto::{hash, Hash, Hashable, KeyError, PrivateKey, PublicKey, Signature},
    operation::{Operation, RequiredAuthorities, ValidateError},
    serializer::{Reader, ReaderError, Serializer, Writer},
    time::TimePointSec,
};

/// Unsigned transaction. The tapos fields (`ref_block_num`,
/// `ref_block_prefix`) anchor it to a recent block so it cannot be
/// replayed onto a competing fork.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub expiration: TimePointSec,
    pub operations: Vec<Operation>,
}

impl Transaction {
    /// Pure validation of the transaction shape and every operation.
    pub fn validate(&self) -> Result<(), ValidateError> {
        if self.operations.is_empty() {
            return Err(ValidateError::MissingField("operations"));
        }
        for op in &self.operations {
            op.validate()?;
        }
        Ok(())
    }

    pub fn required_authorities(&self) -> RequiredAuthorities {
        Operation::required_authorities(&self.operations)
    }

    /// Anchor this transaction to a block: the low 16 bits of its number
    /// and four bytes of its id.
    pub fn set_reference_block(&mut self, block_id: &Hash) {
        let bytes = block_id.as_bytes();
        self.ref_block_num = u16::from_be_bytes([bytes[2], bytes[3]]);
        self.ref_block_prefix = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    }

    /// Signing digest: sha256(chain_id || transaction-without-signatures).
    pub fn digest(&self, chain_id: &Hash) -> Hash {
        let mut writer = Writer::with_capacity(32 + self.size());
        writer.write_bytes(chain_id.as_bytes());
        self.write(&mut writer);
        hash(writer.as_bytes())
    }

    /// Transaction id, independent of the chain and of signatures.
    pub fn id(&self) -> Hash {
        self.hash()
    }
}

impl Serializer for Transaction {
    fn write(&self, writer: &mut Writer) {
        writer.write_u16(self.ref_block_num);
        writer.write_u32(&self.ref_block_prefix);
        self.expiration.write(writer);
        self.operations.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(Transaction {
            ref_block_num: reader.read_u16()?,
            ref_block_prefix: reader.read_u32()?,
            expiration: reader.read()?,
            operations: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        2 + 4 + self.expiration.size() + self.operations.size()
    }
}

impl Hashable for Transaction {}

/// Transaction plus its compact signatures, the form that travels in
/// blocks and over the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub signatures: Vec<Signature>,
}

impl SignedTransaction {
    pub fn new(transaction: Transaction) -> Self {
        SignedTransaction {
            transaction,
            signatures: Vec::new(),
        }
    }

    pub fn sign(&mut self, key: &PrivateKey, chain_id: &Hash) {
        let digest = self.transaction.digest(chain_id);
        self.signatures.push(key.sign(&digest));
    }

    /// Candidate public keys recovered from the attached signatures.
    /// Order follows the signature list; duplicate detection is the
    /// authority checker's business.
    pub fn recover_keys(&self, chain_id: &Hash) -> Result<Vec<PublicKey>, KeyError> {
        let digest = self.transaction.digest(chain_id);
        self.signatures
            .iter()
            .map(|signature| signature.recover(&digest))
            .collect()
    }

    pub fn id(&self) -> Hash {
        self.transaction.id()
    }
}

impl Serializer for SignedTransaction {
    fn write(&self, writer: &mut Writer) {
        self.transaction.write(writer);
        self.signatures.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(SignedTransaction {
            transaction: reader.read()?,
            signatures: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.transaction.size() + self.signatures.size()
    }
}

impl Hashable for SignedTransaction {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::config::{MAINNET_CHAIN_ID, MUSE_SYMBOL, TESTNET_CHAIN_ID};
    use crate::operation::TransferOperation;

    fn sample() -> Transaction {
        Transaction {
            ref_block_num: 7,
            ref_block_prefix: 0xdead_beef,
            expiration: TimePointSec::new(60),
            operations: vec![Operation::Transfer(TransferOperation {
                from: "alice".into(),
                to: "bob".into(),
                amount: Asset::new(100, MUSE_SYMBOL),
                memo: String::new(),
            })],
        }
    }

    #[test]
    fn digest_mixes_chain_id() {
        let tx = sample();
        assert_ne!(tx.digest(&MAINNET_CHAIN_ID), tx.digest(&TESTNET_CHAIN_ID));
        // signatures do not change the digest
        let mut signed = SignedTransaction::new(tx.clone());
        signed.sign(&PrivateKey::from_seed("alice"), &MAINNET_CHAIN_ID);
        assert_eq!(signed.transaction.digest(&MAINNET_CHAIN_ID), tx.digest(&MAINNET_CHAIN_ID));
    }

    #[test]
    fn signing_recovers_the_key() {
        let key = PrivateKey::from_seed("alice");
        let mut signed = SignedTransaction::new(sample());
        signed.sign(&key, &MAINNET_CHAIN_ID);

        let keys = signed.recover_keys(&MAINNET_CHAIN_ID).unwrap();
        assert_eq!(keys, vec![key.public_key()]);

        // recovery against the wrong chain yields a different key
        let other = signed.recover_keys(&TESTNET_CHAIN_ID).unwrap();
        assert_ne!(other, keys);
    }

    #[test]
    fn wire_round_trip() {
        let mut signed = SignedTransaction::new(sample());
        signed.sign(&PrivateKey::from_seed("alice"), &MAINNET_CHAIN_ID);
        let bytes = signed.to_bytes();
        assert_eq!(bytes.len(), signed.size());
        assert_eq!(SignedTransaction::from_bytes(&bytes).unwrap(), signed);
    }

    #[test]
    fn reference_block_fields() {
        let mut tx = sample();
        let mut id_bytes = [0u8; 32];
        id_bytes[..8].copy_from_slice(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);
        tx.set_reference_block(&Hash::new(id_bytes));
        assert_eq!(tx.ref_block_num, 0x0203);
        assert_eq!(tx.ref_block_prefix, u32::from_le_bytes([4, 5, 6, 7]));
    }
}
