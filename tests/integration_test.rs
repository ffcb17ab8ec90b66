//! Integration tests for the lookup index
//!
//! These drive the public API the way a compiler driver does: record
//! lookups during a pass, hand them to an on-disk storage, reopen it in a
//! later "build", and compact it.
//!
//! Each test uses its own temp directory.

use lookup_index::{
    IdentityPathConverter, LookupMaintenance, LookupRecorder, LookupStorage, LookupSymbol,
    LookupTracker, NoopLookupTracker, PathConverter, Position, RelativePathConverter, ScopeKind,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn identity() -> Arc<dyn PathConverter> {
    Arc::new(IdentityPathConverter)
}

/// One simulated compilation pass over a handful of files
fn compile(storage: &LookupStorage, events: &[(&str, &str, &str)]) {
    let mut recorder = LookupRecorder::new(NoopLookupTracker);
    for (file, scope, name) in events {
        recorder.record(file, Position::NONE, scope, ScopeKind::Package, name);
    }
    let paths = recorder.paths();
    storage
        .add_all(&recorder.lookups(), &paths)
        .expect("add lookups");
}

fn strings(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_recorder_to_storage_round_trip() {
    let dir = TempDir::new().unwrap();
    let storage = LookupStorage::open(dir.path(), identity()).unwrap();

    compile(
        &storage,
        &[
            ("A.kt", "pkg", "foo"),
            ("B.kt", "pkg", "foo"),
            ("B.kt", "pkg.Bar", "baz"),
        ],
    );

    assert_eq!(
        storage.get(&LookupSymbol::new("foo", "pkg")).unwrap(),
        strings(&["A.kt", "B.kt"])
    );
    assert_eq!(
        storage.get(&LookupSymbol::new("baz", "pkg.Bar")).unwrap(),
        strings(&["B.kt"])
    );
}

#[test]
fn test_flush_and_reopen_preserves_results() {
    let dir = TempDir::new().unwrap();
    let symbol = LookupSymbol::new("foo", "pkg");

    let before = {
        let storage = LookupStorage::open(dir.path(), identity()).unwrap();
        compile(&storage, &[("A.kt", "pkg", "foo"), ("B.kt", "pkg", "foo")]);
        storage.flush(false).unwrap();
        storage.get(&symbol).unwrap()
    };

    let storage = LookupStorage::open(dir.path(), identity()).unwrap();
    assert_eq!(storage.get(&symbol).unwrap(), before);

    // Id allocation continues where the previous process stopped
    assert_eq!(storage.add_file_if_needed(Path::new("C.kt")).unwrap(), 2);
}

#[test]
fn test_identical_builds_produce_identical_dumps() {
    let events = [
        ("Z.kt", "pkg", "foo"),
        ("A.kt", "pkg", "foo"),
        ("M.kt", "other", "bar"),
        ("A.kt", "other", "bar"),
    ];

    let dumps: Vec<String> = (0..2)
        .map(|_| {
            let dir = TempDir::new().unwrap();
            let storage = LookupStorage::open(dir.path(), identity()).unwrap();
            storage.clean().unwrap();
            compile(&storage, &events);
            storage.dump(&BTreeSet::new()).unwrap()
        })
        .collect();

    assert_eq!(dumps[0], dumps[1]);
    assert!(dumps[0].contains("A.kt -> 0\nM.kt -> 1\nZ.kt -> 2\n"));
}

#[test]
fn test_removed_file_disappears_without_gc() {
    let dir = TempDir::new().unwrap();
    let storage = LookupStorage::open(dir.path(), identity()).unwrap();
    compile(&storage, &[("A.kt", "pkg", "foo"), ("B.kt", "pkg", "foo")]);

    storage
        .remove_lookups_from([PathBuf::from("A.kt")])
        .unwrap();
    storage.flush(false).unwrap();
    drop(storage);

    let storage = LookupStorage::open(dir.path(), identity()).unwrap();
    assert_eq!(
        storage.get(&LookupSymbol::new("foo", "pkg")).unwrap(),
        strings(&["B.kt"])
    );
}

#[test]
fn test_gc_makes_ids_dense_on_disk() {
    let dir = TempDir::new().unwrap();
    let storage = LookupStorage::open(dir.path(), identity()).unwrap();
    compile(
        &storage,
        &[
            ("A.kt", "pkg", "foo"),
            ("B.kt", "pkg", "bar"),
            ("C.kt", "pkg", "foo"),
            ("D.kt", "pkg", "baz"),
        ],
    );
    storage.remove_lookups_from(["A.kt", "B.kt"]).unwrap();

    let report = storage.force_gc().unwrap();
    assert_eq!(report.live_files, 2);
    storage.close().unwrap();

    let storage = LookupStorage::open(dir.path(), identity()).unwrap();
    assert_eq!(storage.size(), 2);
    assert!(storage.check_consistency().unwrap().is_empty());

    let dump = storage.dump(&BTreeSet::new()).unwrap();
    assert_eq!(
        dump,
        "\
====== Lookups
pkg#baz -> 1
pkg#foo -> 0
====== File to id
C.kt -> 0
D.kt -> 1
====== Id to file
0 -> C.kt
1 -> D.kt
"
    );
}

#[test]
fn test_relative_paths_survive_project_move() {
    let dir = TempDir::new().unwrap();
    let index = dir.path().join("index");
    let symbol = LookupSymbol::new("foo", "pkg");

    {
        let converter: Arc<dyn PathConverter> = Arc::new(RelativePathConverter::new("/old/project"));
        let storage = LookupStorage::open(&index, converter).unwrap();
        storage
            .add_file_if_needed(Path::new("/old/project/src/A.kt"))
            .unwrap();
        compile(&storage, &[("/old/project/src/A.kt", "pkg", "foo")]);
        storage.close().unwrap();
    }

    let converter: Arc<dyn PathConverter> = Arc::new(RelativePathConverter::new("/new/project"));
    let storage = LookupStorage::open(&index, converter).unwrap();
    let expected = Path::new("/new/project/src/A.kt")
        .to_string_lossy()
        .into_owned();
    assert_eq!(storage.get(&symbol).unwrap(), BTreeSet::from([expected]));
    assert_eq!(storage.size(), 1);
}

#[test]
fn test_clean_on_fresh_directory() {
    let dir = TempDir::new().unwrap();
    let storage = LookupStorage::open(&dir.path().join("never-used"), identity()).unwrap();

    storage.clean().unwrap();
    storage.flush(false).unwrap();
    storage.flush(true).unwrap();
    storage.clean().unwrap();
    assert!(storage.get(&LookupSymbol::new("foo", "pkg")).unwrap().is_empty());
}
