use std::collections::{BTreeMap, VecDeque};

use crate::{
    db::{SecondaryIndex, UndoLevel},
    error::BlockchainError,
    object::ChainObject,
};

/// Typed table of one object kind. The `BTreeMap` primary is the single
/// source of truth; registered secondary indices are derived views kept
/// in sync through the mutation hooks, including during undo.
pub struct Table<T: ChainObject> {
    rows: BTreeMap<u64, T>,
    next_instance: u64,
    indices: Vec<Box<dyn SecondaryIndex<T>>>,
    undo: VecDeque<UndoLevel<T>>,
}

impl<T: ChainObject> Default for Table<T> {
    fn default() -> Self {
        Table {
            rows: BTreeMap::new(),
            next_instance: 0,
            indices: Vec::new(),
            undo: VecDeque::new(),
        }
    }
}

impl<T: ChainObject> Table<T> {
    pub fn register_index<I: SecondaryIndex<T>>(&mut self, index: I) {
        debug_assert!(self.rows.is_empty(), "indices are registered before genesis");
        self.indices.push(Box::new(index));
    }

    /// Borrow a registered secondary index by its concrete type.
    pub fn index<I: SecondaryIndex<T>>(&self) -> Option<&I> {
        self.indices
            .iter()
            .find_map(|index| index.as_any().downcast_ref::<I>())
    }

    pub fn create(&mut self, init: impl FnOnce(&mut T)) -> &T {
        let instance = self.next_instance;
        self.next_instance += 1;

        let mut obj = T::default();
        obj.set_instance(instance);
        init(&mut obj);
        // the initializer must not reassign the identity
        debug_assert_eq!(obj.instance(), instance);

        if let Some(level) = self.undo.back_mut() {
            level.on_create(instance);
        }
        for index in &mut self.indices {
            index.object_inserted(&obj);
        }
        self.rows.insert(instance, obj);
        &self.rows[&instance]
    }

    pub fn find(&self, instance: u64) -> Option<&T> {
        self.rows.get(&instance)
    }

    pub fn get(&self, instance: u64) -> Result<&T, BlockchainError> {
        self.rows.get(&instance).ok_or_else(|| {
            BlockchainError::UnknownEntity(crate::object::ObjectId::new(
                T::SPACE,
                T::TYPE,
                instance,
            ))
        })
    }

    pub fn modify(
        &mut self,
        instance: u64,
        mutate: impl FnOnce(&mut T),
    ) -> Result<(), BlockchainError> {
        let Some(row) = self.rows.get(&instance) else {
            return Err(BlockchainError::UnknownEntity(crate::object::ObjectId::new(
                T::SPACE,
                T::TYPE,
                instance,
            )));
        };
        let old = row.clone();

        for index in &mut self.indices {
            index.about_to_modify(&old);
        }
        let row = self.rows.get_mut(&instance).expect("checked above");
        mutate(row);
        debug_assert_eq!(row.instance(), instance, "mutations must not change identity");
        let row = &self.rows[&instance];
        for index in &mut self.indices {
            index.object_modified(row);
        }

        if let Some(level) = self.undo.back_mut() {
            level.on_modify(instance, &old);
        }
        Ok(())
    }

    pub fn remove(&mut self, instance: u64) -> Result<(), BlockchainError> {
        let Some(row) = self.rows.remove(&instance) else {
            return Err(BlockchainError::UnknownEntity(crate::object::ObjectId::new(
                T::SPACE,
                T::TYPE,
                instance,
            )));
        };
        for index in &mut self.indices {
            index.object_removed(&row);
        }
        if let Some(level) = self.undo.back_mut() {
            level.on_remove(instance, row);
        }
        Ok(())
    }

    /// Deterministic iteration in instance order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn next_instance(&self) -> u64 {
        self.next_instance
    }

    /// Canonical textual rendering of the table contents in primary-key
    /// order, including the instance counter. Snapshot-equality checks
    /// compare these; the cold-storage format itself is out of scope.
    pub fn state_repr(&self) -> String {
        format!("{};{:?}", self.next_instance, self.rows)
    }

    // ---- undo scopes, driven by the database session layer ----

    pub fn begin_undo(&mut self) {
        self.undo.push_back(UndoLevel::new(self.next_instance));
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Revert the innermost scope, restoring rows and the instance
    /// counter and firing the index hooks for every restoration.
    pub fn undo_level(&mut self) -> Result<(), BlockchainError> {
        let level = self.undo.pop_back().ok_or(BlockchainError::NoOpenSession)?;

        for (instance, old) in level.old_values.into_iter().rev() {
            for index in &mut self.indices {
                index.about_to_modify(&self.rows[&instance]);
            }
            self.rows.insert(instance, old);
            let row = &self.rows[&instance];
            for index in &mut self.indices {
                index.object_modified(row);
            }
        }
        for instance in level.new_ids.into_iter().rev() {
            if let Some(row) = self.rows.remove(&instance) {
                for index in &mut self.indices {
                    index.object_removed(&row);
                }
            }
        }
        for (instance, old) in level.removed {
            for index in &mut self.indices {
                index.object_inserted(&old);
            }
            self.rows.insert(instance, old);
        }
        self.next_instance = level.old_next_instance;
        Ok(())
    }

    /// Fold the innermost scope into its parent, or commit it when it is
    /// the outermost.
    pub fn merge_level(&mut self) -> Result<(), BlockchainError> {
        let level = self.undo.pop_back().ok_or(BlockchainError::NoOpenSession)?;
        if let Some(parent) = self.undo.back_mut() {
            level.squash_into(parent);
        }
        Ok(())
    }

    /// Drop the oldest retained scope; its changes become irreversible.
    pub fn commit_oldest(&mut self) {
        self.undo.pop_front();
    }
}
