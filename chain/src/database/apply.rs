use log::{debug, info, warn};

use muse_common::{
    block::{BlockHeaderExtension, SignedBlock, Version},
    config::{BLOCKCHAIN_VERSION, BLOCK_INTERVAL, MAX_TIME_UNTIL_EXPIRATION, MAX_UNDO_HISTORY},
    crypto::Hash,
    time::TimePointSec,
    transaction::SignedTransaction,
};

use crate::{
    authority_check::verify_authority,
    db::UniqueIndex,
    error::BlockchainError,
    evaluator,
    object::TransactionObject,
    witness_schedule::get_scheduled_witness,
};

use super::Database;

impl Database {
    // ---- slot arithmetic ----

    /// Timestamp of the slot counted from the block after head. Slot 0
    /// is the head block itself.
    pub fn get_slot_time(&self, slot: u64) -> TimePointSec {
        let interval = BLOCK_INTERVAL as u32;
        let head_time = self.head_block_time();
        // head timestamps are always slot aligned relative to genesis
        head_time.add_seconds(slot as u32 * interval)
    }

    /// Slot number a timestamp falls into, 0 when it is not after head.
    pub fn get_slot_at_time(&self, when: TimePointSec) -> u64 {
        let first_slot_time = self.get_slot_time(1);
        if when < first_slot_time {
            return 0;
        }
        (when.elapsed_since(first_slot_time) as u64 / BLOCK_INTERVAL) + 1
    }

    // ---- transactions ----

    /// Apply a loose transaction outside a block: its own session, merged
    /// on success and unwound on failure.
    pub fn apply_transaction(&mut self, tx: &SignedTransaction) -> Result<(), BlockchainError> {
        self.start_undo_session();
        match self.apply_transaction_inner(tx) {
            Ok(()) => self.merge_session(),
            Err(err) => {
                self.undo_session()?;
                Err(err)
            }
        }
    }

    fn check_tapos(&self, tx: &SignedTransaction) -> Result<(), BlockchainError> {
        let summary = self.block_summaries.find(tx.transaction.ref_block_num as u64);
        match summary {
            Some(summary) => {
                let bytes = summary.block_id.as_bytes();
                let prefix = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
                if prefix != tx.transaction.ref_block_prefix {
                    return Err(BlockchainError::TaposMismatch);
                }
            }
            None => {
                // before any block landed in this slot of the ring, only
                // the genesis reference is acceptable
                if tx.transaction.ref_block_num != 0 || tx.transaction.ref_block_prefix != 0 {
                    return Err(BlockchainError::TaposMismatch);
                }
            }
        }
        Ok(())
    }

    pub(super) fn apply_transaction_inner(
        &mut self,
        tx: &SignedTransaction,
    ) -> Result<(), BlockchainError> {
        tx.transaction.validate()?;

        let now = self.head_block_time();
        let expiration = tx.transaction.expiration;
        if expiration <= now {
            return Err(BlockchainError::TransactionExpired {
                expiration: expiration.seconds(),
                now: now.seconds(),
            });
        }
        if expiration > now.add_seconds(MAX_TIME_UNTIL_EXPIRATION) {
            return Err(BlockchainError::TransactionExpirationTooFar);
        }
        self.check_tapos(tx)?;

        let trx_id = tx.id();
        let dup = self
            .transactions
            .index::<UniqueIndex<TransactionObject, Hash>>()
            .expect("registered in new")
            .contains(&trx_id);
        if dup {
            return Err(BlockchainError::DuplicateTransaction);
        }

        let keys = tx.recover_keys(self.chain_id())?;
        let required = tx.transaction.required_authorities();
        verify_authority(self, &required, &keys)?;

        for op in &tx.transaction.operations {
            op.validate()?;
            evaluator::apply_operation(self, op)?;
        }

        self.transactions.create(|obj| {
            obj.trx_id = trx_id;
            obj.expiration = expiration;
        });
        Ok(())
    }

    // ---- blocks ----

    /// Ingest a block: extend the head, park it on a side branch, or
    /// switch forks when the side branch takes the lead.
    pub fn push_block(&mut self, block: SignedBlock) -> Result<bool, BlockchainError> {
        let id = block.id();

        if block.header().previous == self.head_block_id() {
            self.fork_db.push(block.clone())?;
            match self.apply_block(&block) {
                Ok(()) => {
                    self.fork_db.set_head(id);
                    return Ok(true);
                }
                Err(err) => return Err(err),
            }
        }

        self.fork_db.push(block.clone())?;
        if block.block_num() <= self.head_block_num() {
            debug!("parked block {} on a side branch", block.block_num());
            return Ok(false);
        }
        self.switch_forks(id)?;
        Ok(true)
    }

    /// Pop to the common ancestor, then apply the longer branch. A failed
    /// re-apply restores the original chain.
    fn switch_forks(&mut self, new_head: Hash) -> Result<(), BlockchainError> {
        let branch = self.fork_db.branch_to(&new_head);
        let Some(first) = branch.first() else {
            return Err(BlockchainError::UnlinkableBlock);
        };
        let ancestor = first.header().previous.clone();
        info!(
            "switching forks to {} (common ancestor {})",
            new_head, ancestor
        );

        // unwind the current chain down to the ancestor, remembering the
        // blocks so the switch can be rolled back
        let mut popped: Vec<SignedBlock> = Vec::new();
        while self.head_block_id() != ancestor {
            let head_id = self.head_block_id();
            let block = self
                .fork_db
                .find(&head_id)
                .cloned()
                .ok_or(BlockchainError::PopEmptyChain)?;
            self.pop_block()?;
            popped.push(block);
        }

        let mut applied = 0usize;
        let mut failure: Option<BlockchainError> = None;
        for block in &branch {
            match self.apply_block(block) {
                Ok(()) => applied += 1,
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        match failure {
            None => {
                self.fork_db.set_head(new_head);
                Ok(())
            }
            Some(err) => {
                warn!("fork switch failed, restoring the original chain: {err}");
                for _ in 0..applied {
                    self.pop_block()?;
                }
                for block in popped.iter().rev() {
                    self.apply_block(block)?;
                }
                let head = self.head_block_id();
                self.fork_db.set_head(head);
                Err(err)
            }
        }
    }

    /// Undo the head block, restoring the previous head.
    pub fn pop_block(&mut self) -> Result<(), BlockchainError> {
        if self.undo_depth() == 0 || self.head_block_num() == 0 {
            return Err(BlockchainError::PopEmptyChain);
        }
        let num = self.head_block_num();
        self.undo_session()?;
        debug!("popped block {num}");
        Ok(())
    }

    fn check_block_header(&self, block: &SignedBlock) -> Result<u64, BlockchainError> {
        let header = block.header();
        if header.previous != self.head_block_id() {
            return Err(BlockchainError::UnlinkableBlock);
        }

        // refuse rule sets this build does not know
        for extension in &header.extensions {
            if let BlockHeaderExtension::HardforkVersion(version) = extension {
                let known = Version::new(
                    BLOCKCHAIN_VERSION.0,
                    BLOCKCHAIN_VERSION.1,
                    BLOCKCHAIN_VERSION.2,
                );
                if *version > known {
                    return Err(BlockchainError::UnknownHardfork(version.to_string()));
                }
            }
        }

        if block.calculate_merkle_root() != header.transaction_merkle_root {
            return Err(BlockchainError::InvalidBlock(
                "merkle root mismatch".to_owned(),
            ));
        }

        let slot = self.get_slot_at_time(header.timestamp);
        if slot == 0 || self.get_slot_time(slot) != header.timestamp {
            return Err(BlockchainError::InvalidBlock(format!(
                "timestamp {} is not slot aligned after head",
                header.timestamp
            )));
        }

        let scheduled = get_scheduled_witness(self, slot)
            .ok_or_else(|| BlockchainError::InvalidBlock("empty witness schedule".to_owned()))?;
        if scheduled != header.witness {
            return Err(BlockchainError::UnexpectedWitness(scheduled));
        }
        let witness = self.get_witness(&header.witness)?;
        let signer = block.signed_header.signee()?;
        if signer != witness.signing_key {
            return Err(BlockchainError::InvalidBlock(format!(
                "block is not signed by the key of witness {}",
                header.witness
            )));
        }
        Ok(slot)
    }

    /// Deterministically apply one block on the current head. On success
    /// the block's undo session is retained so it can be popped on a
    /// fork switch; any failure unwinds the whole block.
    pub fn apply_block(&mut self, block: &SignedBlock) -> Result<(), BlockchainError> {
        let slot = self.check_block_header(block)?;

        self.start_undo_session();
        self.applying_block_num = block.block_num();
        let result = self.apply_block_inner(block, slot);
        self.applying_block_num = 0;
        match result {
            Ok(()) => {
                while self.undo_depth() > MAX_UNDO_HISTORY {
                    self.commit_oldest_session();
                }
                debug!(
                    "applied block {} with {} transactions",
                    block.block_num(),
                    block.transactions.len()
                );
                Ok(())
            }
            Err(err) => {
                self.undo_session()?;
                Err(err)
            }
        }
    }

    fn apply_block_inner(
        &mut self,
        block: &SignedBlock,
        slot: u64,
    ) -> Result<(), BlockchainError> {
        for tx in &block.transactions {
            self.apply_transaction_inner(tx)?;
        }
        self.per_block_processing(block, slot)
    }

    /// Produce and apply a block in the given slot, signed with the
    /// witness's key. The block-production path of a producing node.
    pub fn generate_block(
        &mut self,
        slot: u64,
        witness: &str,
        key: &muse_common::crypto::PrivateKey,
        transactions: Vec<SignedTransaction>,
    ) -> Result<SignedBlock, BlockchainError> {
        let scheduled = get_scheduled_witness(self, slot)
            .ok_or_else(|| BlockchainError::InvalidBlock("empty witness schedule".to_owned()))?;
        if scheduled != witness {
            return Err(BlockchainError::UnexpectedWitness(scheduled));
        }

        let mut block = SignedBlock {
            signed_header: muse_common::block::SignedBlockHeader::new(
                muse_common::block::BlockHeader {
                    previous: self.head_block_id(),
                    timestamp: self.get_slot_time(slot),
                    witness: witness.to_owned(),
                    transaction_merkle_root: Hash::zero(),
                    extensions: Vec::new(),
                },
            ),
            transactions,
        };
        block.signed_header.header.transaction_merkle_root = block.calculate_merkle_root();
        block.signed_header.sign(key);

        self.push_block(block.clone())?;
        Ok(block)
    }
}
