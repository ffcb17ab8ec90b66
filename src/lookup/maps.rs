//! Typed maps of the lookup index
//!
//! `FileToIdMap` and `IdToFileMap` together form the file <-> id bijection;
//! `LookupMap` holds the file-id sets per symbol. Each wraps a
//! [`PersistentMap`] so the engine underneath is replaceable.

use super::{FileId, LookupSymbolKey};
use crate::error::Result;
use crate::paths::PathConverter;
use crate::storage::PersistentMap;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Ordered set of file ids stored per symbol
pub type FileIdSet = BTreeSet<FileId>;

pub struct FileToIdMap {
    storage: Box<dyn PersistentMap<String, FileId>>,
    converter: Arc<dyn PathConverter>,
}

impl FileToIdMap {
    pub fn new(
        storage: Box<dyn PersistentMap<String, FileId>>,
        converter: Arc<dyn PathConverter>,
    ) -> Self {
        Self { storage, converter }
    }

    pub fn get(&self, file: &Path) -> Result<Option<FileId>> {
        self.get_stored(&self.converter.to_stored(file))
    }

    pub fn get_stored(&self, stored: &str) -> Result<Option<FileId>> {
        self.storage.get(&stored.to_string())
    }

    pub fn insert_stored(&mut self, stored: String, id: FileId) -> Result<()> {
        self.storage.put(stored, id)
    }

    pub fn remove_stored(&mut self, stored: &str) -> Result<()> {
        self.storage.remove(&stored.to_string())
    }

    /// Snapshot of every stored path and its id, ordered by path.
    pub fn to_map(&self) -> Result<BTreeMap<String, FileId>> {
        let mut snapshot = BTreeMap::new();
        for key in self.storage.keys()? {
            if let Some(id) = self.storage.get(&key)? {
                snapshot.insert(key, id);
            }
        }
        Ok(snapshot)
    }

    pub fn flush(&mut self, memory_caches_only: bool) -> Result<()> {
        self.storage.flush(memory_caches_only)
    }

    pub fn clean(&mut self) -> Result<()> {
        self.storage.clean()
    }
}

pub struct IdToFileMap {
    storage: Box<dyn PersistentMap<FileId, String>>,
    converter: Arc<dyn PathConverter>,
}

impl IdToFileMap {
    pub fn new(
        storage: Box<dyn PersistentMap<FileId, String>>,
        converter: Arc<dyn PathConverter>,
    ) -> Self {
        Self { storage, converter }
    }

    /// Caller-side file for `id`, if the id is still valid.
    pub fn get(&self, id: FileId) -> Result<Option<PathBuf>> {
        Ok(self
            .get_stored(id)?
            .map(|stored| self.converter.to_file(&stored)))
    }

    pub fn get_stored(&self, id: FileId) -> Result<Option<String>> {
        self.storage.get(&id)
    }

    pub fn contains(&self, id: FileId) -> Result<bool> {
        self.storage.contains_key(&id)
    }

    pub fn insert_stored(&mut self, id: FileId, stored: String) -> Result<()> {
        self.storage.put(id, stored)
    }

    pub fn remove(&mut self, id: FileId) -> Result<()> {
        self.storage.remove(&id)
    }

    /// Every valid id, ascending.
    pub fn ids(&self) -> Result<Vec<FileId>> {
        self.storage.keys()
    }

    pub fn flush(&mut self, memory_caches_only: bool) -> Result<()> {
        self.storage.flush(memory_caches_only)
    }

    pub fn clean(&mut self) -> Result<()> {
        self.storage.clean()
    }
}

pub struct LookupMap {
    storage: Box<dyn PersistentMap<LookupSymbolKey, FileIdSet>>,
}

impl LookupMap {
    pub fn new(storage: Box<dyn PersistentMap<LookupSymbolKey, FileIdSet>>) -> Self {
        Self { storage }
    }

    pub fn get(&self, key: &LookupSymbolKey) -> Result<Option<FileIdSet>> {
        self.storage.get(key)
    }

    /// Replace the id set stored for `key`.
    pub fn put(&mut self, key: LookupSymbolKey, ids: FileIdSet) -> Result<()> {
        self.storage.put(key, ids)
    }

    /// Union `ids` into whatever is already stored for `key`.
    pub fn append(&mut self, key: LookupSymbolKey, ids: FileIdSet) -> Result<()> {
        let merged = match self.storage.get(&key)? {
            Some(mut existing) => {
                if ids.is_subset(&existing) {
                    return Ok(());
                }
                existing.extend(ids);
                existing
            }
            None => ids,
        };
        self.storage.put(key, merged)
    }

    pub fn remove(&mut self, key: &LookupSymbolKey) -> Result<()> {
        self.storage.remove(key)
    }

    /// Every symbol key, ordered by scope then name.
    pub fn keys(&self) -> Result<Vec<LookupSymbolKey>> {
        self.storage.keys()
    }

    pub fn flush(&mut self, memory_caches_only: bool) -> Result<()> {
        self.storage.flush(memory_caches_only)
    }

    pub fn clean(&mut self) -> Result<()> {
        self.storage.clean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::IdentityPathConverter;
    use crate::storage::MemoryMap;

    #[test]
    fn test_append_is_union() {
        let mut map = LookupMap::new(Box::new(MemoryMap::<LookupSymbolKey, FileIdSet>::new()));
        let key = LookupSymbolKey::new("foo", "pkg");

        map.append(key.clone(), FileIdSet::from([0, 2])).unwrap();
        map.append(key.clone(), FileIdSet::from([1, 2])).unwrap();

        assert_eq!(map.get(&key).unwrap(), Some(FileIdSet::from([0, 1, 2])));
    }

    #[test]
    fn test_file_to_id_snapshot_is_sorted_by_path() {
        let converter: Arc<dyn PathConverter> = Arc::new(IdentityPathConverter);
        let mut map = FileToIdMap::new(Box::new(MemoryMap::<String, FileId>::new()), converter);

        map.insert_stored("b.kt".to_string(), 0).unwrap();
        map.insert_stored("a.kt".to_string(), 1).unwrap();

        let snapshot: Vec<_> = map.to_map().unwrap().into_iter().collect();
        assert_eq!(
            snapshot,
            vec![("a.kt".to_string(), 1), ("b.kt".to_string(), 0)]
        );
        assert_eq!(map.get(Path::new("b.kt")).unwrap(), Some(0));
    }
}
