//! Stats command - index size summary

use anyhow::Result;
use console::style;
use lookup_index::LookupStorage;

pub fn run(storage: &LookupStorage, json: bool) -> Result<()> {
    let stats = storage.stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    if let Some(dir) = storage.data_dir() {
        println!("\n  Index: {}", style(dir.display()).cyan());
    }
    println!("  Symbols: {}", style(stats.symbols).cyan());
    println!("  Live files: {}", style(stats.files).cyan());
    println!("  Next file id: {}", style(stats.size).cyan());

    let gc = &storage.config().gc;
    println!(
        "  Lazy GC: entries under {:.0}% live once past {} ids",
        gc.deleted_to_size_threshold * 100.0,
        gc.minimum_collectible_size
    );

    let stale = (stats.size as usize).saturating_sub(stats.files);
    if stale > 0 {
        println!(
            "  {} {} ids retired since the last GC",
            style("[!!]").yellow(),
            stale
        );
    } else {
        println!("  {} id space is dense", style("[OK]").green());
    }

    Ok(())
}
