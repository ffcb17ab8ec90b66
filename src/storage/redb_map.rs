//! redb-backed [`PersistentMap`]
//!
//! Each map lives in its own database file with a single table named after
//! the map. Keys and values are bitcode-encoded. Writes, including a
//! `clean`, go to an ordered write-back buffer and reach the database in one
//! transaction on flush.

use super::{MapKey, MapValue, PersistentMap};
use crate::error::Result;
use redb::{Database, Durability, ReadableTable, TableDefinition};
use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::path::Path;
use tracing::debug;

type RawTable = TableDefinition<'static, &'static [u8], &'static [u8]>;

pub struct RedbMap<K, V> {
    name: &'static str,
    db: Database,
    /// Unflushed writes: encoded key -> encoded value, `None` for a removal
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    /// The table is dropped on the next flush, before `pending` is applied
    cleared: bool,
    /// A non-durable commit happened since the last durable one
    volatile: bool,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K: MapKey, V: MapValue> RedbMap<K, V> {
    /// Open or create the map stored at `path`.
    pub fn open(path: &Path, name: &'static str) -> Result<Self> {
        let db = Database::create(path)?;
        Ok(Self {
            name,
            db,
            pending: BTreeMap::new(),
            cleared: false,
            volatile: false,
            _types: PhantomData,
        })
    }

    fn table(&self) -> RawTable {
        TableDefinition::new(self.name)
    }

    fn read_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(pending) = self.pending.get(key) {
            return Ok(pending.clone());
        }
        if self.cleared {
            return Ok(None);
        }

        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(self.table()) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value = table.get(key)?.map(|v| v.value().to_vec());
        Ok(value)
    }

    fn stored_keys(&self) -> Result<BTreeSet<Vec<u8>>> {
        let mut keys = BTreeSet::new();
        if self.cleared {
            return Ok(keys);
        }
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(self.table()) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(keys),
            Err(e) => return Err(e.into()),
        };
        for item in table.iter()? {
            let (key, _) = item?;
            keys.insert(key.value().to_vec());
        }
        Ok(keys)
    }
}

impl<K: MapKey, V: MapValue> PersistentMap<K, V> for RedbMap<K, V> {
    fn get(&self, key: &K) -> Result<Option<V>> {
        let raw_key = bitcode::serialize(key)?;
        match self.read_raw(&raw_key)? {
            Some(bytes) => Ok(Some(bitcode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn contains_key(&self, key: &K) -> Result<bool> {
        let raw_key = bitcode::serialize(key)?;
        Ok(self.read_raw(&raw_key)?.is_some())
    }

    fn put(&mut self, key: K, value: V) -> Result<()> {
        let raw_key = bitcode::serialize(&key)?;
        let raw_value = bitcode::serialize(&value)?;
        self.pending.insert(raw_key, Some(raw_value));
        Ok(())
    }

    fn remove(&mut self, key: &K) -> Result<()> {
        let raw_key = bitcode::serialize(key)?;
        self.pending.insert(raw_key, None);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<K>> {
        let mut raw_keys = self.stored_keys()?;
        for (key, value) in &self.pending {
            if value.is_some() {
                raw_keys.insert(key.clone());
            } else {
                raw_keys.remove(key);
            }
        }

        let mut keys = raw_keys
            .iter()
            .map(|k| bitcode::deserialize(k))
            .collect::<std::result::Result<Vec<K>, _>>()?;
        keys.sort();
        Ok(keys)
    }

    fn flush(&mut self, memory_caches_only: bool) -> Result<()> {
        if self.pending.is_empty() && !self.cleared && (memory_caches_only || !self.volatile) {
            return Ok(());
        }

        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(if memory_caches_only {
            Durability::None
        } else {
            Durability::Immediate
        });
        if self.cleared {
            write_txn.delete_table(self.table())?;
        }
        {
            let mut table = write_txn.open_table(self.table())?;
            for (key, value) in &self.pending {
                match value {
                    Some(value) => {
                        table.insert(key.as_slice(), value.as_slice())?;
                    }
                    None => {
                        table.remove(key.as_slice())?;
                    }
                }
            }
        }
        write_txn.commit()?;

        debug!(
            "Flushed {} pending writes to {} (cleared: {}, durable: {})",
            self.pending.len(),
            self.name,
            self.cleared,
            !memory_caches_only
        );
        self.pending.clear();
        self.cleared = false;
        self.volatile = memory_caches_only;
        Ok(())
    }

    fn clean(&mut self) -> Result<()> {
        self.pending.clear();
        self.cleared = true;
        Ok(())
    }
}
