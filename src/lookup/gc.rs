//! Garbage collection of stale file ids
//!
//! Removing a file only drops it from the id maps; the lookup index keeps
//! its id until something cleans it up. Two mechanisms do that:
//!
//! - lazy compaction: a `get` that finds mostly dead ids in one entry
//!   rewrites that entry (see [`GcPolicy::should_compact`])
//! - full collection: [`collect`] drops every dead id and renumbers the
//!   survivors to `0..live_files`, run on explicit request only

use super::maps::FileIdSet;
use super::storage::IndexMaps;
use super::FileId;
use crate::error::Result;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Below this id high-water mark lazy compaction never kicks in
pub const MINIMUM_GARBAGE_COLLECTIBLE_SIZE: usize = 10_000;

/// Lazy compaction rewrites an entry once its valid fraction drops below this
pub const DELETED_TO_SIZE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcPolicy {
    pub minimum_collectible_size: usize,
    pub deleted_to_size_threshold: f64,
}

impl Default for GcPolicy {
    fn default() -> Self {
        Self {
            minimum_collectible_size: MINIMUM_GARBAGE_COLLECTIBLE_SIZE,
            deleted_to_size_threshold: DELETED_TO_SIZE_THRESHOLD,
        }
    }
}

impl GcPolicy {
    /// Whether a `get` that kept `valid` of `total` ids should rewrite the
    /// entry. `size` is the current id high-water mark.
    pub fn should_compact(&self, size: FileId, valid: usize, total: usize) -> bool {
        if total == 0 || size as usize <= self.minimum_collectible_size {
            return false;
        }
        (valid as f64 / total as f64) < self.deleted_to_size_threshold
    }
}

/// Outcome of a full collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GcReport {
    /// Live files, equal to the new id high-water mark
    pub live_files: usize,
    /// Dead id references dropped from the lookup index
    pub dropped_references: usize,
    /// Symbols removed because none of their files survived
    pub removed_symbols: usize,
}

/// Full compaction: drop dead ids, renumber live files densely in path
/// order, rewrite the lookup index through the translation table.
pub(crate) fn collect(maps: &mut IndexMaps) -> Result<GcReport> {
    let mut report = GcReport::default();
    let keys = maps.lookups.keys()?;

    for key in &keys {
        let Some(ids) = maps.lookups.get(key)? else {
            continue;
        };
        let mut live = FileIdSet::new();
        for id in &ids {
            if maps.id_to_file.contains(*id)? {
                live.insert(*id);
            }
        }
        if live.len() != ids.len() {
            report.dropped_references += ids.len() - live.len();
            maps.lookups.put(key.clone(), live)?;
        }
    }

    let old_file_to_id = maps.file_to_id.to_map()?;
    maps.id_to_file.clean()?;
    maps.file_to_id.clean()?;
    maps.counters.size = 0;

    let mut old_to_new: FxHashMap<FileId, FileId> =
        FxHashMap::with_capacity_and_hasher(old_file_to_id.len(), Default::default());
    // BTreeMap iteration is already sorted by stored path
    for (stored, old_id) in old_file_to_id {
        let new_id = maps.add_stored_if_needed(stored)?;
        old_to_new.insert(old_id, new_id);
    }

    for key in keys {
        let Some(ids) = maps.lookups.get(&key)? else {
            continue;
        };
        let translated: FileIdSet = ids
            .iter()
            .filter_map(|id| old_to_new.get(id).copied())
            .collect();
        if translated.is_empty() {
            maps.lookups.remove(&key)?;
            report.removed_symbols += 1;
        } else if translated != ids {
            maps.lookups.put(key, translated)?;
        }
    }

    report.live_files = old_to_new.len();
    info!(
        "Lookup GC: {} live files, dropped {} stale references, removed {} symbols",
        report.live_files, report.dropped_references, report.removed_symbols
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_index_never_compacts() {
        let policy = GcPolicy::default();
        assert!(!policy.should_compact(100, 0, 10));
        assert!(!policy.should_compact(10_000, 1, 10));
    }

    #[test]
    fn test_large_index_compacts_mostly_dead_entries() {
        let policy = GcPolicy::default();
        assert!(policy.should_compact(10_001, 4, 10));
        assert!(!policy.should_compact(10_001, 5, 10));
        assert!(!policy.should_compact(10_001, 0, 0));
    }

    #[test]
    fn test_policy_from_partial_toml() {
        let policy: GcPolicy = toml::from_str("minimum_collectible_size = 5").unwrap();
        assert_eq!(policy.minimum_collectible_size, 5);
        assert_eq!(policy.deleted_to_size_threshold, DELETED_TO_SIZE_THRESHOLD);
    }
}
