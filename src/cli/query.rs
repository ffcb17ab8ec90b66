//! Query command - files that looked up a symbol

use anyhow::Result;
use lookup_index::{LookupStorage, LookupSymbol};

pub fn run(storage: &LookupStorage, scope: &str, name: &str) -> Result<()> {
    let symbol = LookupSymbol::new(name, scope);
    let paths = storage.get(&symbol)?;

    if paths.is_empty() {
        eprintln!("No files looked up {}", symbol);
        return Ok(());
    }
    for path in paths {
        println!("{}", path);
    }
    Ok(())
}
