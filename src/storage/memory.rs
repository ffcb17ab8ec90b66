//! In-memory [`PersistentMap`] for storages that never touch disk

use super::{MapKey, MapValue, PersistentMap};
use crate::error::Result;
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct MemoryMap<K, V> {
    entries: BTreeMap<K, V>,
}

impl<K: MapKey, V: MapValue> MemoryMap<K, V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: MapKey, V: MapValue> Default for MemoryMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: MapKey, V: MapValue> PersistentMap<K, V> for MemoryMap<K, V> {
    fn get(&self, key: &K) -> Result<Option<V>> {
        Ok(self.entries.get(key).cloned())
    }

    fn contains_key(&self, key: &K) -> Result<bool> {
        Ok(self.entries.contains_key(key))
    }

    fn put(&mut self, key: K, value: V) -> Result<()> {
        self.entries.insert(key, value);
        Ok(())
    }

    fn remove(&mut self, key: &K) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<K>> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn flush(&mut self, _memory_caches_only: bool) -> Result<()> {
        Ok(())
    }

    fn clean(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}
