use thiserror::Error;

use muse_common::{
    asset::{AmountError, Asset},
    authority::AuthorityError,
    crypto::KeyError,
    operation::ValidateError,
    serializer::ReaderError,
};

use crate::object::ObjectId;

/// Error taxonomy of the chain core. A `Validate` or missing-authority
/// error rejects the transaction before any state is touched; evaluator
/// errors unwind the open undo session; arithmetic errors are fatal to
/// the whole block; applier errors leave the previous head untouched.
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error("Missing required active authority of {0}")]
    MissingActiveAuthority(String),

    #[error("Missing required owner authority of {0}")]
    MissingOwnerAuthority(String),

    #[error("Missing required basic authority of {0}")]
    MissingBasicAuthority(String),

    #[error("Missing required authority over content {0}")]
    MissingContentAuthority(String),

    #[error("Missing required other authority")]
    MissingOtherAuthority,

    #[error("Irrelevant signature included: {0}")]
    IrrelevantSignature(String),

    #[error("Duplicate signature included")]
    DuplicateSignature,

    #[error("Signature recovery failed: {0}")]
    Signature(#[from] KeyError),

    #[error("Insufficient funds: {account} has {available}, needs {required}")]
    InsufficientFunds {
        account: String,
        available: Asset,
        required: Asset,
    },

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown witness: {0}")]
    UnknownWitness(String),

    #[error("Unknown streaming platform: {0}")]
    UnknownStreamingPlatform(String),

    #[error("Unknown content: {0}")]
    UnknownContent(String),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Unknown object: {0}")]
    UnknownEntity(ObjectId),

    #[error("Object already exists: {0}")]
    DuplicateEntity(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Evaluation rejected: {0}")]
    Evaluate(String),

    #[error(transparent)]
    Arithmetic(#[from] AmountError),

    #[error(transparent)]
    Authority(#[from] AuthorityError),

    #[error("Transaction expired at {expiration}, head time {now}")]
    TransactionExpired { expiration: u32, now: u32 },

    #[error("Transaction expiration too far in the future")]
    TransactionExpirationTooFar,

    #[error("Transaction tapos mismatch")]
    TaposMismatch,

    #[error("Duplicate transaction")]
    DuplicateTransaction,

    #[error("Block does not link to the current head")]
    UnlinkableBlock,

    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Block is not signed by the scheduled witness {0}")]
    UnexpectedWitness(String),

    #[error("There are no blocks to pop")]
    PopEmptyChain,

    #[error("Chain attempted to apply an unknown hardfork: {0}")]
    UnknownHardfork(String),

    #[error("Undo sessions are not nested correctly")]
    NoOpenSession,

    #[error(transparent)]
    Decode(#[from] ReaderError),
}

impl BlockchainError {
    /// Arithmetic faults abort the whole block instead of just the
    /// offending transaction.
    pub fn is_fatal_to_block(&self) -> bool {
        matches!(self, BlockchainError::Arithmetic(_))
    }
}
