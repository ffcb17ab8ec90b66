//! CLI contract tests
//!
//! Builds an index through the library, then runs the binary against it.

use lookup_index::{IdentityPathConverter, LookupMultimap, LookupStorage, LookupSymbol};
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

fn lookup_index_bin() -> String {
    env!("CARGO_BIN_EXE_lookup-index").to_string()
}

fn setup_index() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();

    let storage = LookupStorage::open(dir.path(), Arc::new(IdentityPathConverter)).unwrap();
    let mut lookups = LookupMultimap::new();
    lookups.insert(
        LookupSymbol::new("foo", "pkg"),
        ["A.kt", "B.kt"].into_iter().map(Arc::<str>::from).collect(),
    );
    lookups.insert(
        LookupSymbol::new("bar", "pkg"),
        ["B.kt"].into_iter().map(Arc::<str>::from).collect(),
    );
    storage.add_all(&lookups, ["A.kt", "B.kt"]).unwrap();
    storage.remove_lookups_from(["A.kt"]).unwrap();
    storage.close().unwrap();

    dir
}

fn run(dir: &Path, args: &[&str]) -> (i32, String) {
    let output = Command::new(lookup_index_bin())
        .arg(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("LOOKUP_INDEX_ROOT")
        .env_remove("LOOKUP_INDEX_GC_MIN_SIZE")
        .env_remove("LOOKUP_INDEX_GC_THRESHOLD")
        .env("XDG_CONFIG_HOME", dir)
        .output()
        .expect("run lookup-index");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).into_owned(),
    )
}

#[test]
fn test_query_skips_removed_files() {
    let dir = setup_index();
    let (code, stdout) = run(dir.path(), &["query", "pkg", "foo"]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "B.kt\n");
}

#[test]
fn test_stats_json() {
    let dir = setup_index();
    let (code, stdout) = run(dir.path(), &["stats", "--json"]);
    assert_eq!(code, 0);

    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(stats["size"], 2);
    assert_eq!(stats["files"], 1);
    assert_eq!(stats["symbols"], 2);
}

#[test]
fn test_stats_text_shows_gc_policy() {
    let dir = setup_index();
    std::fs::write(
        dir.path().join("lookup-index.toml"),
        "[gc]\nminimum_collectible_size = 7\n",
    )
    .unwrap();

    let (code, stdout) = run(dir.path(), &["stats"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Lazy GC: entries under 50% live once past 7 ids"));
}

#[test]
fn test_dump_single_symbol() {
    let dir = setup_index();
    let (code, stdout) = run(dir.path(), &["dump", "--symbol", "pkg#bar"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("====== Lookups\npkg#bar -> 1\n"));
    assert!(stdout.contains("====== Id to file\n1 -> B.kt\n"));
}

#[test]
fn test_gc_then_check() {
    let dir = setup_index();

    let (code, _) = run(dir.path(), &["gc"]);
    assert_eq!(code, 0);

    let (code, stdout) = run(dir.path(), &["dump"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("====== File to id\nB.kt -> 0\n"));

    let (code, _) = run(dir.path(), &["check"]);
    assert_eq!(code, 0);
}

#[test]
fn test_clean_dry_run_keeps_data() {
    let dir = setup_index();

    let (code, stdout) = run(dir.path(), &["clean", "--dry-run"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Dry run"));

    let (_, stdout) = run(dir.path(), &["query", "pkg", "foo"]);
    assert_eq!(stdout, "B.kt\n");

    let (code, _) = run(dir.path(), &["clean"]);
    assert_eq!(code, 0);
    let (_, stdout) = run(dir.path(), &["query", "pkg", "foo"]);
    assert_eq!(stdout, "");
}

#[test]
fn test_missing_index_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _) = run(&dir.path().join("nope"), &["stats"]);
    assert_ne!(code, 0);
}
