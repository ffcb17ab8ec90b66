//! Lookup index - incremental compilation support
//!
//! Records which source files looked up which `(name, scope)` symbols during
//! a compilation, in a persistent on-disk index, so the next incremental
//! build can tell which files to recompile when a declaration changes.
//!
//! - [`recorder::LookupRecorder`] collects lookups during one compilation
//! - [`lookup::LookupStorage`] persists them and answers queries
//! - [`lookup::LookupMaintenance`] holds GC and diagnostic operations

pub mod config;
pub mod error;
pub mod lookup;
pub mod paths;
pub mod recorder;
pub mod storage;

pub use config::IndexConfig;
pub use error::{IndexError, Result};
pub use lookup::{
    FileId, GcPolicy, GcReport, IndexStats, LookupMaintenance, LookupMultimap, LookupStorage,
    LookupSymbol, Position, ScopeKind,
};
pub use paths::{IdentityPathConverter, PathConverter, RelativePathConverter};
pub use recorder::{LookupRecorder, LookupTracker, NoopLookupTracker};
