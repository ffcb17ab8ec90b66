//! Clean command - drop all index data

use anyhow::Result;
use std::path::Path;

pub fn run(data_dir: &Path, root: Option<&Path>, dry_run: bool) -> Result<()> {
    if !data_dir.is_dir() {
        println!("No lookup index at {}.", data_dir.display());
        return Ok(());
    }

    let storage = super::open(data_dir, root)?;
    let stats = storage.stats()?;

    if dry_run {
        println!(
            "Would remove {} symbols and {} files from {}.",
            stats.symbols,
            stats.files,
            data_dir.display()
        );
        println!("\nDry run - nothing removed. Run without --dry-run to delete.");
        return Ok(());
    }

    storage.clean()?;
    storage.close()?;
    println!(
        "Removed {} symbols and {} files from {}.",
        stats.symbols,
        stats.files,
        data_dir.display()
    );
    Ok(())
}
