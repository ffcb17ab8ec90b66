//! Dump command - deterministic text rendering of the index

use anyhow::{bail, Result};
use lookup_index::{LookupMaintenance, LookupStorage, LookupSymbol};
use std::collections::BTreeSet;

pub fn run(storage: &LookupStorage, symbols: &[String]) -> Result<()> {
    let symbols = symbols
        .iter()
        .map(|s| parse_symbol(s))
        .collect::<Result<BTreeSet<_>>>()?;

    print!("{}", storage.dump(&symbols)?);
    Ok(())
}

/// Parse `scope#name`. The scope may itself contain `#`, the name may not.
fn parse_symbol(s: &str) -> Result<LookupSymbol> {
    match s.rsplit_once('#') {
        Some((scope, name)) if !name.is_empty() => Ok(LookupSymbol::new(name, scope)),
        _ => bail!("'{}' is not a symbol, expected SCOPE#NAME", s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbol() {
        let symbol = parse_symbol("pkg.Foo#bar").unwrap();
        assert_eq!(&*symbol.scope, "pkg.Foo");
        assert_eq!(&*symbol.name, "bar");

        assert_eq!(&*parse_symbol("#bar").unwrap().scope, "");
        assert!(parse_symbol("bar").is_err());
        assert!(parse_symbol("pkg#").is_err());
    }
}
