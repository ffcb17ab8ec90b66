//! Conversion between caller file paths and the strings stored in the index

use std::path::{Component, Path, PathBuf};

/// Bidirectional mapping between a file and its stored path string.
///
/// `to_file(to_stored(p))` must name the same file as `p`.
pub trait PathConverter: Send + Sync {
    fn to_stored(&self, file: &Path) -> String;

    fn to_file(&self, stored: &str) -> PathBuf;
}

/// Stores paths exactly as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPathConverter;

impl PathConverter for IdentityPathConverter {
    fn to_stored(&self, file: &Path) -> String {
        file.to_string_lossy().into_owned()
    }

    fn to_file(&self, stored: &str) -> PathBuf {
        PathBuf::from(stored)
    }
}

/// Stores files under `root` as `/`-separated relative paths, so the index
/// survives moving the project directory. Files outside `root` are stored
/// as given.
#[derive(Debug, Clone)]
pub struct RelativePathConverter {
    root: PathBuf,
}

impl RelativePathConverter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PathConverter for RelativePathConverter {
    fn to_stored(&self, file: &Path) -> String {
        match file.strip_prefix(&self.root) {
            Ok(relative) => relative
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => file.to_string_lossy().into_owned(),
        }
    }

    fn to_file(&self, stored: &str) -> PathBuf {
        let path = Path::new(stored);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        stored
            .split('/')
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}
