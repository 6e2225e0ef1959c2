use std::collections::BTreeMap;

use muse_common::{block::SignedBlock, crypto::Hash};

use crate::error::BlockchainError;

/// Index of recently seen blocks linked by their `previous` ids. Blocks
/// arriving on side branches are parked here until their branch outgrows
/// the main chain; pruning follows the last irreversible block.
#[derive(Default)]
pub struct ForkDatabase {
    items: BTreeMap<Hash, SignedBlock>,
    head: Option<Hash>,
}

impl ForkDatabase {
    /// Track a block. Returns an error when it does not link to any
    /// known block.
    pub fn push(&mut self, block: SignedBlock) -> Result<(), BlockchainError> {
        let id = block.id();
        if self.head.is_some()
            && !self.items.contains_key(&block.header().previous)
            && self
                .items
                .values()
                .all(|known| known.id() != block.header().previous)
        {
            // genesis links to the zero hash
            if block.block_num() != 1 {
                return Err(BlockchainError::UnlinkableBlock);
            }
        }
        self.items.insert(id, block);
        Ok(())
    }

    pub fn set_head(&mut self, id: Hash) {
        self.head = Some(id);
    }

    pub fn head(&self) -> Option<&Hash> {
        self.head.as_ref()
    }

    pub fn find(&self, id: &Hash) -> Option<&SignedBlock> {
        self.items.get(id)
    }

    /// Chain of tracked blocks ending in `id`, walking `previous` links
    /// back to the oldest tracked ancestor. Newest last.
    pub fn branch_to(&self, id: &Hash) -> Vec<SignedBlock> {
        let mut branch = Vec::new();
        let mut current = id.clone();
        while let Some(block) = self.items.get(&current) {
            branch.push(block.clone());
            current = block.header().previous.clone();
        }
        branch.reverse();
        branch
    }

    /// Highest block number of any branch extending through `id`.
    pub fn block_num(&self, id: &Hash) -> Option<u32> {
        self.items.get(id).map(|block| block.block_num())
    }

    /// Drop everything at or below the irreversible height.
    pub fn prune(&mut self, last_irreversible: u32) {
        self.items
            .retain(|_, block| block.block_num() > last_irreversible);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
