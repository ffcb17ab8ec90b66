//! Index configuration
//!
//! Loaded from, in increasing priority:
//! 1. built-in defaults
//! 2. user config (`~/.config/lookup-index/config.toml`)
//! 3. `lookup-index.toml` in the data directory
//! 4. environment variables
//!
//! Files are merged key by key, so a later file only overrides the settings
//! it names.
//!
//! ```toml
//! # lookup-index.toml
//! flush_on_drop = true
//!
//! [gc]
//! minimum_collectible_size = 10000
//! deleted_to_size_threshold = 0.5
//! ```

use crate::error::{IndexError, Result};
use crate::lookup::GcPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = "lookup-index.toml";

pub const ENV_GC_MIN_SIZE: &str = "LOOKUP_INDEX_GC_MIN_SIZE";
pub const ENV_GC_THRESHOLD: &str = "LOOKUP_INDEX_GC_THRESHOLD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Lazy compaction thresholds
    pub gc: GcPolicy,
    /// Durably flush when a storage is dropped without `close`
    pub flush_on_drop: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            gc: GcPolicy::default(),
            flush_on_drop: true,
        }
    }
}

impl IndexConfig {
    /// Load config for the index in `data_dir` from all sources.
    ///
    /// Unreadable files are skipped with a warning.
    pub fn load(data_dir: &Path) -> Self {
        let files = Self::user_config_path()
            .into_iter()
            .chain(std::iter::once(data_dir.join(CONFIG_FILE_NAME)));
        let mut config = Self::from_files(files);
        config.apply_env();
        config
    }

    /// Merge the files that exist, later ones taking priority.
    pub fn from_files<I>(files: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
    {
        let mut merged = toml::Table::new();
        for file in files {
            let path = file.as_ref();
            if !path.exists() {
                continue;
            }
            if let Some(layer) = load_layer(path) {
                merge_tables(&mut merged, layer);
            }
        }

        match toml::Value::Table(merged).try_into() {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring merged index config: {}", e);
                Self::default()
            }
        }
    }

    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lookup-index").join("config.toml"))
    }

    fn apply_env(&mut self) {
        if let Some(size) = env_parse::<usize>(ENV_GC_MIN_SIZE) {
            self.gc.minimum_collectible_size = size;
        }
        if let Some(threshold) = env_parse::<f64>(ENV_GC_THRESHOLD) {
            self.gc.deleted_to_size_threshold = threshold;
        }
    }
}

/// Read one config file as a raw table. A file that does not describe a
/// valid config on its own is skipped as a whole.
fn load_layer(path: &Path) -> Option<toml::Table> {
    let loaded = std::fs::read_to_string(path)
        .map_err(IndexError::from)
        .and_then(|content| Ok(content.parse::<toml::Table>()?))
        .and_then(|table| {
            toml::Value::Table(table.clone()).try_into::<IndexConfig>()?;
            Ok(table)
        });
    match loaded {
        Ok(table) => {
            debug!("Loaded index config from {}", path.display());
            Some(table)
        }
        Err(e) => {
            warn!("Failed to load {}: {}", path.display(), e);
            None
        }
    }
}

fn merge_tables(base: &mut toml::Table, layer: toml::Table) {
    for (key, value) in layer {
        match value {
            toml::Value::Table(layer_table) => match base.get_mut(&key) {
                Some(toml::Value::Table(base_table)) => merge_tables(base_table, layer_table),
                _ => {
                    base.insert(key, toml::Value::Table(layer_table));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let value = std::env::var(name).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", name, value);
            None
        }
    }
}
