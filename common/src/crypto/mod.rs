mod hash;
mod key;

pub use hash::{hash, Hash, Hashable, HASH_SIZE};
pub use key::{KeyError, PrivateKey, PublicKey, Signature, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
