use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeBounds;

use crate::object::ChainObject;

/// Observer view over a table. The primary map owns the rows; an index
/// only stores identifiers derived from a pure projection of the row.
///
/// Mutation protocol: the table calls `about_to_modify` with the prior
/// row, applies the mutation, then calls `object_modified` with the new
/// row; the index re-links exactly the difference of the two projections.
pub trait SecondaryIndex<T: ChainObject>: Any {
    fn object_inserted(&mut self, obj: &T);
    fn about_to_modify(&mut self, before: &T);
    fn object_modified(&mut self, after: &T);
    fn object_removed(&mut self, obj: &T);

    fn as_any(&self) -> &dyn Any;
}

/// Index over a single-valued projection where at most one live row maps
/// to each key (account by name, asset by symbol, order book position).
pub struct UniqueIndex<T: ChainObject, K: Ord + Clone + 'static> {
    key_fn: fn(&T) -> K,
    map: BTreeMap<K, u64>,
    in_progress: BTreeMap<u64, K>,
}

impl<T: ChainObject, K: Ord + Clone + 'static> UniqueIndex<T, K> {
    pub fn new(key_fn: fn(&T) -> K) -> Self {
        UniqueIndex {
            key_fn,
            map: BTreeMap::new(),
            in_progress: BTreeMap::new(),
        }
    }

    pub fn find(&self, key: &K) -> Option<u64> {
        self.map.get(key).copied()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Ordered range scan over the projected keys.
    pub fn range<R: RangeBounds<K>>(&self, range: R) -> impl DoubleEndedIterator<Item = (&K, u64)> {
        self.map.range(range).map(|(key, instance)| (key, *instance))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, u64)> {
        self.map.iter().map(|(key, instance)| (key, *instance))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<T: ChainObject, K: Ord + Clone + 'static> SecondaryIndex<T> for UniqueIndex<T, K> {
    fn object_inserted(&mut self, obj: &T) {
        self.map.insert((self.key_fn)(obj), obj.instance());
    }

    fn about_to_modify(&mut self, before: &T) {
        self.in_progress
            .insert(before.instance(), (self.key_fn)(before));
    }

    fn object_modified(&mut self, after: &T) {
        let Some(previous) = self.in_progress.remove(&after.instance()) else {
            return;
        };
        let current = (self.key_fn)(after);
        if current != previous {
            self.map.remove(&previous);
            self.map.insert(current, after.instance());
        }
    }

    fn object_removed(&mut self, obj: &T) {
        self.map.remove(&(self.key_fn)(obj));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Index over a multi-valued projection: each row maps to a set of keys
/// and each key to the set of matching rows (content by genre).
pub struct MultiIndex<T: ChainObject, K: Ord + Clone + 'static> {
    keys_fn: fn(&T) -> BTreeSet<K>,
    map: BTreeMap<K, BTreeSet<u64>>,
    in_progress: BTreeMap<u64, BTreeSet<K>>,
}

impl<T: ChainObject, K: Ord + Clone + 'static> MultiIndex<T, K> {
    pub fn new(keys_fn: fn(&T) -> BTreeSet<K>) -> Self {
        MultiIndex {
            keys_fn,
            map: BTreeMap::new(),
            in_progress: BTreeMap::new(),
        }
    }

    pub fn find(&self, key: &K) -> &BTreeSet<u64> {
        static EMPTY: std::sync::OnceLock<BTreeSet<u64>> = std::sync::OnceLock::new();
        self.map
            .get(key)
            .unwrap_or_else(|| EMPTY.get_or_init(BTreeSet::new))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }

    /// Instances whose key is at or below `key`, in key order. The shape
    /// of every due-by-time sweep.
    pub fn values_up_to<'a>(&'a self, key: &K) -> impl Iterator<Item = u64> + 'a {
        self.map
            .range((std::ops::Bound::Unbounded, std::ops::Bound::Included(key)))
            .flat_map(|(_, set)| set.iter().copied())
    }

    /// Instances whose key is strictly below `key`, in key order.
    pub fn values_before<'a>(&'a self, key: &K) -> impl Iterator<Item = u64> + 'a {
        self.map
            .range((std::ops::Bound::Unbounded, std::ops::Bound::Excluded(key)))
            .flat_map(|(_, set)| set.iter().copied())
    }

    fn add(&mut self, keys: &BTreeSet<K>, instance: u64) {
        for key in keys {
            self.map.entry(key.clone()).or_default().insert(instance);
        }
    }

    fn remove(&mut self, keys: &BTreeSet<K>, instance: u64) {
        for key in keys {
            if let Some(set) = self.map.get_mut(key) {
                set.remove(&instance);
                if set.is_empty() {
                    self.map.remove(key);
                }
            }
        }
    }
}

impl<T: ChainObject, K: Ord + Clone + 'static> SecondaryIndex<T> for MultiIndex<T, K> {
    fn object_inserted(&mut self, obj: &T) {
        let keys = (self.keys_fn)(obj);
        self.add(&keys, obj.instance());
    }

    fn about_to_modify(&mut self, before: &T) {
        self.in_progress
            .insert(before.instance(), (self.keys_fn)(before));
    }

    fn object_modified(&mut self, after: &T) {
        let Some(previous) = self.in_progress.remove(&after.instance()) else {
            return;
        };
        let current = (self.keys_fn)(after);
        // re-link only the difference of the two projections
        let stale: BTreeSet<K> = previous.difference(&current).cloned().collect();
        let fresh: BTreeSet<K> = current.difference(&previous).cloned().collect();
        self.remove(&stale, after.instance());
        self.add(&fresh, after.instance());
    }

    fn object_removed(&mut self, obj: &T) {
        let keys = (self.keys_fn)(obj);
        self.remove(&keys, obj.instance());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
