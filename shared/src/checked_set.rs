use std::collections::BTreeSet;

/// An ordered set which treats inserting a present key or removing an absent
/// key as a programming error
#[derive(Debug, Clone)]
pub struct CheckedSet<K: Ord> {
    inner: BTreeSet<K>,
}

impl<K: Ord> CheckedSet<K> {
    pub fn new() -> Self {
        Self {
            inner: BTreeSet::new(),
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    pub fn insert(&mut self, key: K) {
        if self.inner.contains(&key) {
            panic!("Cannot insert and replace given key. Check first.")
        }

        self.inner.insert(key);
    }

    pub fn remove(&mut self, key: &K) {
        if !self.inner.contains(key) {
            panic!("Cannot remove given non-existent key. Check first.")
        }

        self.inner.remove(key);
    }

    pub fn iter(&self) -> std::collections::btree_set::Iter<'_, K> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K: Ord> Default for CheckedSet<K> {
    fn default() -> Self {
        Self::new()
    }
}
