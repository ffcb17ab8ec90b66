//! Persistent lookup storage
//!
//! Owns the three index maps and the counters record of one data
//! directory. Every operation runs under a single mutex: `get` may rewrite
//! the entry it read, and `add_all` / GC touch several maps that have to
//! stay a bijection relative to each other.

use super::counters::{Counters, COUNTERS_FILE_NAME};
use super::gc::{self, GcReport};
use super::maps::{FileIdSet, FileToIdMap, IdToFileMap, LookupMap};
use super::{FileId, LookupMultimap, LookupSymbol, LookupSymbolKey};
use crate::config::IndexConfig;
use crate::error::Result;
use crate::paths::PathConverter;
use crate::storage::{MemoryMap, StorageRoot};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub const FILE_TO_ID_MAP: &str = "file-to-id";
pub const ID_TO_FILE_MAP: &str = "id-to-file";
pub const LOOKUPS_MAP: &str = "lookups";

/// The maps and counters guarded by the storage lock
pub(crate) struct IndexMaps {
    pub(crate) file_to_id: FileToIdMap,
    pub(crate) id_to_file: IdToFileMap,
    pub(crate) lookups: LookupMap,
    pub(crate) counters: Counters,
}

impl IndexMaps {
    /// Id of the stored path, allocating `size++` for a new one.
    pub(crate) fn add_stored_if_needed(&mut self, stored: String) -> Result<FileId> {
        if let Some(id) = self.file_to_id.get_stored(&stored)? {
            return Ok(id);
        }
        let id = self.counters.next_id()?;
        self.id_to_file.insert_stored(id, stored.clone())?;
        self.file_to_id.insert_stored(stored, id)?;
        Ok(id)
    }

    /// Counters go first; the maps are flushed even when that fails.
    fn flush(&mut self, memory_caches_only: bool) -> Result<()> {
        let counters = self.counters.flush();
        let maps = self
            .file_to_id
            .flush(memory_caches_only)
            .and(self.id_to_file.flush(memory_caches_only))
            .and(self.lookups.flush(memory_caches_only));
        counters.and(maps)
    }

    /// The emptied maps are committed before the counters record goes, so
    /// ids never restart from zero under surviving entries.
    fn clean(&mut self) -> Result<()> {
        self.file_to_id.clean()?;
        self.id_to_file.clean()?;
        self.lookups.clean()?;
        self.file_to_id.flush(false)?;
        self.id_to_file.flush(false)?;
        self.lookups.flush(false)?;
        self.counters.clean()
    }
}

/// Size summary of an index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Next id to allocate (historical high-water mark)
    pub size: FileId,
    /// Files currently holding an id
    pub files: usize,
    /// Symbols with an entry in the lookup index
    pub symbols: usize,
}

/// Maintenance-only operations, kept off the production API.
pub trait LookupMaintenance {
    /// Full compaction: drop dead ids and renumber the rest densely.
    fn force_gc(&self) -> Result<GcReport>;

    /// Deterministic text rendering of the lookup entries for `symbols`
    /// (every entry when empty) and both id maps.
    fn dump(&self, symbols: &BTreeSet<LookupSymbol>) -> Result<String>;

    /// Bijection and id-range violations, empty for a healthy index.
    fn check_consistency(&self) -> Result<Vec<String>>;
}

pub struct LookupStorage {
    maps: Mutex<IndexMaps>,
    converter: Arc<dyn PathConverter>,
    config: IndexConfig,
    data_dir: Option<PathBuf>,
    closed: bool,
}

impl LookupStorage {
    /// Open or create the index stored under `target_data_dir`.
    pub fn open(target_data_dir: &Path, converter: Arc<dyn PathConverter>) -> Result<Self> {
        Self::with_config(target_data_dir, converter, IndexConfig::default())
    }

    pub fn with_config(
        target_data_dir: &Path,
        converter: Arc<dyn PathConverter>,
        config: IndexConfig,
    ) -> Result<Self> {
        let root = StorageRoot::new(target_data_dir)?;
        let counters = Counters::load(&root.file(COUNTERS_FILE_NAME))?;

        let maps = IndexMaps {
            file_to_id: FileToIdMap::new(
                Box::new(root.open_map::<String, FileId>(FILE_TO_ID_MAP)?),
                Arc::clone(&converter),
            ),
            id_to_file: IdToFileMap::new(
                Box::new(root.open_map::<FileId, String>(ID_TO_FILE_MAP)?),
                Arc::clone(&converter),
            ),
            lookups: LookupMap::new(Box::new(
                root.open_map::<LookupSymbolKey, FileIdSet>(LOOKUPS_MAP)?,
            )),
            counters,
        };
        debug!(
            "Opened lookup storage at {} (size={})",
            target_data_dir.display(),
            maps.counters.size
        );

        Ok(Self {
            maps: Mutex::new(maps),
            converter,
            config,
            data_dir: Some(root.dir().to_path_buf()),
            closed: false,
        })
    }

    /// Storage that never touches disk
    pub fn in_memory(converter: Arc<dyn PathConverter>) -> Self {
        Self::in_memory_with_config(converter, IndexConfig::default())
    }

    pub fn in_memory_with_config(converter: Arc<dyn PathConverter>, config: IndexConfig) -> Self {
        let maps = IndexMaps {
            file_to_id: FileToIdMap::new(
                Box::new(MemoryMap::<String, FileId>::new()),
                Arc::clone(&converter),
            ),
            id_to_file: IdToFileMap::new(
                Box::new(MemoryMap::<FileId, String>::new()),
                Arc::clone(&converter),
            ),
            lookups: LookupMap::new(Box::new(MemoryMap::<LookupSymbolKey, FileIdSet>::new())),
            counters: Counters::in_memory(),
        };

        Self {
            maps: Mutex::new(maps),
            converter,
            config,
            data_dir: None,
            closed: false,
        }
    }

    // A poisoned lock means a thread panicked mid-update and the maps may
    // no longer be a bijection. Nothing sensible can continue from there.
    fn lock(&self) -> MutexGuard<'_, IndexMaps> {
        self.maps
            .lock()
            .expect("lookup storage lock poisoned: a thread panicked while holding this lock")
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Paths of the live files that looked up `symbol`.
    ///
    /// Dead ids are skipped. When the index is large and most ids of the
    /// entry are dead, the entry is rewritten with only the live ones.
    pub fn get(&self, symbol: &LookupSymbol) -> Result<BTreeSet<String>> {
        let mut maps = self.lock();
        let key = symbol.key();
        let Some(ids) = maps.lookups.get(&key)? else {
            return Ok(BTreeSet::new());
        };

        let mut paths = BTreeSet::new();
        let mut live = FileIdSet::new();
        for &id in &ids {
            if let Some(file) = maps.id_to_file.get(id)? {
                paths.insert(file.to_string_lossy().into_owned());
                live.insert(id);
            }
        }

        if self
            .config
            .gc
            .should_compact(maps.counters.size, live.len(), ids.len())
        {
            debug!(
                "Compacting lookup entry {}: {} of {} ids live",
                key,
                live.len(),
                ids.len()
            );
            maps.lookups.put(key, live)?;
        }

        Ok(paths)
    }

    /// Record one compilation's lookups.
    ///
    /// Every path in `all_paths` gets an id first, in sorted order so that
    /// repeated identical runs assign identical ids. The id sets are then
    /// unioned into the index, symbols in sorted order.
    pub fn add_all<I>(&self, lookups: &LookupMultimap, all_paths: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut maps = self.lock();

        let sorted_paths: BTreeSet<String> = all_paths
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        let mut path_to_id: FxHashMap<String, FileId> = FxHashMap::default();
        for path in sorted_paths {
            let id = maps.add_stored_if_needed(self.converter.to_stored(Path::new(&path)))?;
            path_to_id.insert(path, id);
        }

        for (symbol, paths) in lookups {
            let mut ids = FileIdSet::new();
            for path in paths {
                let id = match path_to_id.get(&**path) {
                    Some(&id) => id,
                    None => {
                        debug!("Lookup path {} missing from compiled paths", path);
                        let id = maps
                            .add_stored_if_needed(self.converter.to_stored(Path::new(&**path)))?;
                        path_to_id.insert(path.to_string(), id);
                        id
                    }
                };
                ids.insert(id);
            }
            maps.lookups.append(symbol.key(), ids)?;
        }

        debug!(
            "Recorded {} symbols from {} files (size={})",
            lookups.len(),
            path_to_id.len(),
            maps.counters.size
        );
        Ok(())
    }

    /// Id of `file`, allocating a new one if it has none.
    pub fn add_file_if_needed(&self, file: &Path) -> Result<FileId> {
        let stored = self.converter.to_stored(file);
        self.lock().add_stored_if_needed(stored)
    }

    /// Forget the ids of `files`. Their references in the lookup index go
    /// stale and are dropped lazily. Unknown files are ignored.
    pub fn remove_lookups_from<I>(&self, files: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        let mut maps = self.lock();
        let mut removed = 0usize;
        for file in files {
            let stored = self.converter.to_stored(file.as_ref());
            let Some(id) = maps.file_to_id.get_stored(&stored)? else {
                continue;
            };
            maps.id_to_file.remove(id)?;
            maps.file_to_id.remove_stored(&stored)?;
            removed += 1;
        }
        debug!("Removed {} files from lookup storage", removed);
        Ok(())
    }

    pub fn stats(&self) -> Result<IndexStats> {
        let maps = self.lock();
        Ok(IndexStats {
            size: maps.counters.size,
            files: maps.id_to_file.ids()?.len(),
            symbols: maps.lookups.keys()?.len(),
        })
    }

    /// Next id to allocate
    pub fn size(&self) -> FileId {
        self.lock().counters.size
    }

    pub fn flush(&self, memory_caches_only: bool) -> Result<()> {
        self.lock().flush(memory_caches_only)
    }

    /// Drop every map entry and the counters record.
    pub fn clean(&self) -> Result<()> {
        self.lock().clean()?;
        info!("Cleaned lookup storage");
        Ok(())
    }

    /// Durable flush, then release the storage.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.flush(false)
    }
}

impl LookupMaintenance for LookupStorage {
    fn force_gc(&self) -> Result<GcReport> {
        let mut maps = self.lock();
        gc::collect(&mut maps)
    }

    fn dump(&self, symbols: &BTreeSet<LookupSymbol>) -> Result<String> {
        let mut maps = self.lock();
        maps.flush(false)?;

        let mut out = String::new();

        out.push_str("====== Lookups\n");
        let keys: Vec<LookupSymbolKey> = if symbols.is_empty() {
            maps.lookups.keys()?
        } else {
            symbols.iter().map(LookupSymbol::key).collect()
        };
        for key in keys {
            match maps.lookups.get(&key)? {
                Some(ids) => {
                    let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
                    let _ = writeln!(out, "{} -> {}", key, ids.join(", "));
                }
                None => {
                    let _ = writeln!(out, "{} -> (none)", key);
                }
            }
        }

        out.push_str("====== File to id\n");
        for (stored, id) in maps.file_to_id.to_map()? {
            let _ = writeln!(out, "{} -> {}", stored, id);
        }

        out.push_str("====== Id to file\n");
        for id in maps.id_to_file.ids()? {
            let stored = maps.id_to_file.get_stored(id)?.unwrap_or_default();
            let _ = writeln!(out, "{} -> {}", id, stored);
        }

        Ok(out)
    }

    fn check_consistency(&self) -> Result<Vec<String>> {
        let maps = self.lock();
        let mut problems = Vec::new();
        let size = maps.counters.size;

        for (stored, id) in maps.file_to_id.to_map()? {
            if id >= size {
                problems.push(format!("{stored} has id {id} >= size {size}"));
            }
            match maps.id_to_file.get_stored(id)? {
                Some(back) if back == stored => {}
                Some(back) => problems.push(format!("{stored} -> {id} maps back to {back}")),
                None => problems.push(format!("{stored} -> {id} has no reverse entry")),
            }
        }
        for id in maps.id_to_file.ids()? {
            let Some(stored) = maps.id_to_file.get_stored(id)? else {
                continue;
            };
            if maps.file_to_id.get_stored(&stored)? != Some(id) {
                problems.push(format!("id {id} -> {stored} has no matching forward entry"));
            }
        }

        Ok(problems)
    }
}

impl Drop for LookupStorage {
    fn drop(&mut self) {
        if self.closed || !self.config.flush_on_drop {
            return;
        }
        let maps = match self.maps.get_mut() {
            Ok(maps) => maps,
            Err(_) => return,
        };
        if let Err(e) = maps.flush(false) {
            warn!("Failed to flush lookup storage on drop: {}", e);
        }
    }
}
