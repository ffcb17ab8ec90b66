//! Per-compilation lookup recording
//!
//! The compiler reports every name lookup to a [`LookupTracker`].
//! [`LookupRecorder`] sits in front of another tracker, buffers the lookups
//! in memory with interned strings, and forwards each event unchanged. At
//! the end of the pass the buffer goes to
//! [`LookupStorage::add_all`](crate::lookup::LookupStorage::add_all).
//!
//! # Example
//!
//! ```ignore
//! let mut recorder = LookupRecorder::new(NoopLookupTracker);
//! recorder.record("A.kt", Position::NONE, "pkg", ScopeKind::Package, "foo");
//! storage.add_all(&recorder.lookups(), &compiled_paths)?;
//! ```

pub mod interner;

pub use interner::{StrKey, StringInterner};

use crate::lookup::{LookupMultimap, LookupSymbol, Position, ScopeKind};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Receiver of lookup events from semantic analysis
pub trait LookupTracker {
    /// Whether `record` needs real positions. Computing them costs the
    /// compiler time, so trackers that ignore them say so.
    fn requires_position(&self) -> bool;

    fn record(
        &mut self,
        file_path: &str,
        position: Position,
        scope_fq_name: &str,
        scope_kind: ScopeKind,
        name: &str,
    );
}

/// Tracker that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLookupTracker;

impl LookupTracker for NoopLookupTracker {
    fn requires_position(&self) -> bool {
        false
    }

    fn record(&mut self, _: &str, _: Position, _: &str, _: ScopeKind, _: &str) {}
}

impl<T: LookupTracker + ?Sized> LookupTracker for Box<T> {
    fn requires_position(&self) -> bool {
        (**self).requires_position()
    }

    fn record(
        &mut self,
        file_path: &str,
        position: Position,
        scope_fq_name: &str,
        scope_kind: ScopeKind,
        name: &str,
    ) {
        (**self).record(file_path, position, scope_fq_name, scope_kind, name)
    }
}

/// Interned `(name, scope)` pair
type SymbolKeys = (StrKey, StrKey);

/// Buffers one compilation's lookups. Not shared between threads or
/// sessions; create a fresh one per compilation.
#[derive(Debug, Default)]
pub struct LookupRecorder<T = NoopLookupTracker> {
    inner: T,
    /// Scope and symbol names
    symbols: StringInterner,
    /// File paths, kept apart from names
    paths: StringInterner,
    lookups: FxHashMap<SymbolKeys, FxHashSet<StrKey>>,
}

impl<T: LookupTracker> LookupRecorder<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            symbols: StringInterner::new(),
            paths: StringInterner::new(),
            lookups: FxHashMap::default(),
        }
    }

    /// Distinct symbols recorded so far
    pub fn len(&self) -> usize {
        self.lookups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }

    /// Everything recorded, with one shared string per distinct name,
    /// scope and path.
    pub fn lookups(&mut self) -> LookupMultimap {
        let mut result = LookupMultimap::new();
        for (&(name, scope), files) in &self.lookups {
            let symbol = LookupSymbol::new(self.symbols.shared(name), self.symbols.shared(scope));
            let paths = result.entry(symbol).or_default();
            for &file in files {
                paths.insert(self.paths.shared(file));
            }
        }
        result
    }

    /// Every file path that reported at least one lookup
    pub fn paths(&mut self) -> BTreeSet<Arc<str>> {
        let keys: FxHashSet<StrKey> = self.lookups.values().flatten().copied().collect();
        keys.into_iter().map(|k| self.paths.shared(k)).collect()
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Give back the wrapped tracker, discarding the buffer.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: LookupTracker> LookupTracker for LookupRecorder<T> {
    fn requires_position(&self) -> bool {
        self.inner.requires_position()
    }

    fn record(
        &mut self,
        file_path: &str,
        position: Position,
        scope_fq_name: &str,
        scope_kind: ScopeKind,
        name: &str,
    ) {
        let scope = self.symbols.intern(scope_fq_name);
        let name = self.symbols.intern(name);
        let file = self.paths.intern(file_path);

        self.lookups.entry((name, scope)).or_default().insert(file);

        self.inner.record(
            self.paths.resolve(file),
            position,
            self.symbols.resolve(scope),
            scope_kind,
            self.symbols.resolve(name),
        );
    }
}
