//! String interning for lookup recording
//!
//! A compilation reports the same scope names, symbol names and file paths
//! over and over. Each unique string is stored once and referenced by a
//! 4-byte key; shared `Arc<str>` handles are only created when the
//! recorded lookups are handed over.

use lasso::{Rodeo, Spur};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A string key - small (4 bytes) reference to an interned string
pub type StrKey = Spur;

/// Single-threaded interner scoped to one compilation session
#[derive(Debug, Default)]
pub struct StringInterner {
    inner: Rodeo,
    shared: FxHashMap<StrKey, Arc<str>>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning the existing key if it was seen before
    #[inline]
    pub fn intern(&mut self, s: &str) -> StrKey {
        self.inner.get_or_intern(s)
    }

    #[inline]
    pub fn resolve(&self, key: StrKey) -> &str {
        self.inner.resolve(&key)
    }

    /// Key of an already-interned string
    #[inline]
    pub fn get(&self, s: &str) -> Option<StrKey> {
        self.inner.get(s)
    }

    /// Shared handle for `key`. Every call for the same key returns the
    /// same allocation.
    pub fn shared(&mut self, key: StrKey) -> Arc<str> {
        if let Some(existing) = self.shared.get(&key) {
            return Arc::clone(existing);
        }
        let handle: Arc<str> = Arc::from(self.inner.resolve(&key));
        self.shared.insert(key, Arc::clone(&handle));
        handle
    }

    /// Number of unique strings interned
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interner_deduplication() {
        let mut interner = StringInterner::new();

        let k1 = interner.intern("src/main.kt");
        let k2 = interner.intern("src/main.kt");
        let k3 = interner.intern("src/lib.kt");

        assert_eq!(k1, k2);
        assert_ne!(k1, k3);
        assert_eq!(interner.len(), 2);
        assert_eq!(interner.resolve(k3), "src/lib.kt");
        assert_eq!(interner.get("src/lib.kt"), Some(k3));
        assert_eq!(interner.get("missing"), None);
    }

    #[test]
    fn test_shared_handles_are_one_allocation() {
        let mut interner = StringInterner::new();
        let key = interner.intern("pkg.Foo");

        let a = interner.shared(key);
        let b = interner.shared(key);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(&*a, "pkg.Foo");
    }
}
