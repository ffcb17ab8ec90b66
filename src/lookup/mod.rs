//! Symbol lookups and the persistent index over them
//!
//! A lookup is a use of a declared `name` inside a lexical `scope`. The
//! index remembers, for every `(name, scope)` pair, which files looked it
//! up, so an incremental build can find the files affected by a changed
//! declaration.

pub mod counters;
pub mod gc;
pub mod maps;
pub mod storage;

pub use gc::{GcPolicy, GcReport};
pub use storage::{IndexStats, LookupMaintenance, LookupStorage};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Caller-facing symbol: a `name` looked up in `scope`.
///
/// Ordered by scope, then name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupSymbol {
    pub name: Arc<str>,
    pub scope: Arc<str>,
}

impl LookupSymbol {
    pub fn new(name: impl Into<Arc<str>>, scope: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            scope: scope.into(),
        }
    }

    pub(crate) fn key(&self) -> LookupSymbolKey {
        LookupSymbolKey::new(&self.name, &self.scope)
    }
}

impl Ord for LookupSymbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.scope
            .cmp(&other.scope)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for LookupSymbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LookupSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.scope, self.name)
    }
}

/// Storage key of the lookup index. Same identity as [`LookupSymbol`],
/// kept separate so the on-disk encoding can change independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupSymbolKey {
    pub name: String,
    pub scope: String,
}

impl LookupSymbolKey {
    pub fn new(name: &str, scope: &str) -> Self {
        Self {
            name: name.to_string(),
            scope: scope.to_string(),
        }
    }
}

impl Ord for LookupSymbolKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.scope
            .cmp(&other.scope)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for LookupSymbolKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LookupSymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.scope, self.name)
    }
}

impl From<&LookupSymbol> for LookupSymbolKey {
    fn from(symbol: &LookupSymbol) -> Self {
        symbol.key()
    }
}

/// Symbol -> paths of the files that looked it up during one compilation.
pub type LookupMultimap = BTreeMap<LookupSymbol, BTreeSet<Arc<str>>>;

/// Dense surrogate key for a stored file path
pub type FileId = u32;

/// Source position of a lookup. Only meaningful to trackers that ask for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    /// Placeholder for lookups reported without a position
    pub const NONE: Position = Position { line: 0, column: 0 };

    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Kind of scope a lookup happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Package,
    Classifier,
}
