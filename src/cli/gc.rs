//! GC and check commands

use anyhow::Result;
use console::style;
use lookup_index::{LookupMaintenance, LookupStorage};

pub fn run(storage: &LookupStorage) -> Result<()> {
    let before = storage.stats()?;
    let report = storage.force_gc()?;
    storage.flush(false)?;

    println!(
        "Compacted: {} live files (ids {} -> {}), {} stale references dropped, {} symbols removed",
        style(report.live_files).cyan(),
        before.size,
        storage.size(),
        report.dropped_references,
        report.removed_symbols
    );
    Ok(())
}

pub fn check(storage: &LookupStorage) -> Result<()> {
    let problems = storage.check_consistency()?;
    if problems.is_empty() {
        println!("{} file <-> id maps are consistent", style("[OK]").green());
        return Ok(());
    }

    for problem in &problems {
        println!("{} {}", style("[!!]").red(), problem);
    }
    anyhow::bail!("{} consistency problems found", problems.len())
}
