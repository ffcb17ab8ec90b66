//! Durable id high-water mark
//!
//! The record is a small text file: the next id to allocate on the first
//! line, then a reserved legacy field that is always written as `0` and
//! ignored on read.

use super::FileId;
use crate::error::{IndexError, Result};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const COUNTERS_FILE_NAME: &str = "counters.tab";

#[derive(Debug)]
pub struct Counters {
    /// Backing file, `None` for storages that never touch disk
    path: Option<PathBuf>,
    /// Next id to allocate
    pub size: FileId,
}

impl Counters {
    /// Restore counters from `path`, starting at zero if the record is absent.
    pub fn load(path: &Path) -> Result<Self> {
        let size = if path.exists() {
            read_size(path).map_err(|e| IndexError::counters(path, e))?
        } else {
            0
        };
        debug!("Loaded lookup counters from {}: size={}", path.display(), size);

        Ok(Self {
            path: Some(path.to_path_buf()),
            size,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            size: 0,
        }
    }

    /// Hand out the next id. Fails once the id space is used up; a GC
    /// renumbers the live files from zero again.
    pub fn next_id(&mut self) -> Result<FileId> {
        let id = self.size;
        self.size = id
            .checked_add(1)
            .ok_or(IndexError::IdSpaceExhausted { size: id })?;
        Ok(id)
    }

    /// Persist `size`. Nothing is written while it is still zero.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if self.size == 0 {
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, format!("{}\n0", self.size))?;
        Ok(())
    }

    /// Delete the record and restart allocation from zero.
    pub fn clean(&mut self) -> Result<()> {
        self.size = 0;
        match &self.path {
            Some(path) => match std::fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
            None => Ok(()),
        }
    }
}

fn read_size(path: &Path) -> io::Result<FileId> {
    let content = std::fs::read_to_string(path)?;
    let first = content.lines().next().unwrap_or("").trim();
    first.parse::<FileId>().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid size field {first:?}: {e}"),
        )
    })
}
