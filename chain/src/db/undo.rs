use std::collections::{BTreeMap, BTreeSet};

use crate::object::ChainObject;

/// One undo scope of a table: the prior state of every row first touched
/// inside the scope, plus the instance counter to restore. Only the first
/// touch per scope is recorded; later mutations of the same row are
/// already covered by it.
#[derive(Clone, Debug)]
pub struct UndoLevel<T: ChainObject> {
    // rows modified in this scope, keyed by instance, holding the value
    // they had when the scope opened
    pub(super) old_values: BTreeMap<u64, T>,
    // rows removed in this scope, holding their scope-entry value
    pub(super) removed: BTreeMap<u64, T>,
    // rows created in this scope
    pub(super) new_ids: BTreeSet<u64>,
    pub(super) old_next_instance: u64,
}

impl<T: ChainObject> UndoLevel<T> {
    pub(super) fn new(next_instance: u64) -> Self {
        UndoLevel {
            old_values: BTreeMap::new(),
            removed: BTreeMap::new(),
            new_ids: BTreeSet::new(),
            old_next_instance: next_instance,
        }
    }

    pub(super) fn on_create(&mut self, instance: u64) {
        self.new_ids.insert(instance);
    }

    pub(super) fn on_modify(&mut self, instance: u64, old: &T) {
        if self.new_ids.contains(&instance) || self.old_values.contains_key(&instance) {
            return;
        }
        self.old_values.insert(instance, old.clone());
    }

    pub(super) fn on_remove(&mut self, instance: u64, old: T) {
        if self.new_ids.remove(&instance) {
            // created and removed inside the same scope, nothing to restore
            return;
        }
        if let Some(original) = self.old_values.remove(&instance) {
            self.removed.insert(instance, original);
            return;
        }
        self.removed.insert(instance, old);
    }

    /// Fold this scope into its parent so that undoing the parent undoes
    /// both.
    pub(super) fn squash_into(self, parent: &mut UndoLevel<T>) {
        for instance in self.new_ids {
            parent.new_ids.insert(instance);
        }
        for (instance, old) in self.old_values {
            if parent.new_ids.contains(&instance) || parent.old_values.contains_key(&instance) {
                continue;
            }
            parent.old_values.insert(instance, old);
        }
        for (instance, old) in self.removed {
            if parent.new_ids.remove(&instance) {
                continue;
            }
            if let Some(original) = parent.old_values.remove(&instance) {
                parent.removed.insert(instance, original);
                continue;
            }
            parent.removed.insert(instance, old);
        }
    }
}
