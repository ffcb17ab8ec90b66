//! Persistent key-value maps backing the lookup index
//!
//! Every map the index uses goes through [`PersistentMap`], so the
//! on-disk engine (redb) and the in-memory one are interchangeable.
//! Several typed maps are registered against one [`StorageRoot`]
//! directory, one database file per map.

mod memory;
mod redb_map;

pub use memory::MemoryMap;
pub use redb_map::RedbMap;

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Typed key-value map with an explicit flush/clean lifecycle.
pub trait PersistentMap<K, V>: Send {
    fn get(&self, key: &K) -> Result<Option<V>>;

    fn contains_key(&self, key: &K) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Insert or overwrite.
    fn put(&mut self, key: K, value: V) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&mut self, key: &K) -> Result<()>;

    /// All live keys, in ascending key order.
    fn keys(&self) -> Result<Vec<K>>;

    /// Push buffered writes to the engine. With `memory_caches_only`
    /// the writes become visible but are not forced to disk.
    fn flush(&mut self, memory_caches_only: bool) -> Result<()>;

    /// Drop every entry, including unflushed ones.
    fn clean(&mut self) -> Result<()>;
}

/// Bounds a type needs to be stored as a map key.
pub trait MapKey: Serialize + DeserializeOwned + Ord + Clone + Send + 'static {}
impl<T> MapKey for T where T: Serialize + DeserializeOwned + Ord + Clone + Send + 'static {}

/// Bounds a type needs to be stored as a map value.
pub trait MapValue: Serialize + DeserializeOwned + Clone + Send + 'static {}
impl<T> MapValue for T where T: Serialize + DeserializeOwned + Clone + Send + 'static {}

/// Directory holding every map file of one index.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    dir: PathBuf,
}

impl StorageRoot {
    /// Use `dir` as the storage root, creating it if needed.
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a plain file under the root
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Open (or create) the on-disk map called `name`.
    pub fn open_map<K: MapKey, V: MapValue>(&self, name: &'static str) -> Result<RedbMap<K, V>> {
        RedbMap::open(&self.file(&format!("{name}.redb")), name)
    }
}
