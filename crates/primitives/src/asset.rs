//! Ticker symbol type.

use std::borrow::Borrow;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Stock ticker symbol.
///
/// Symbols are normalized to upper case on construction so that `aapl` and
/// `AAPL` address the same price column.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new symbol.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Get the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn symbol_from_str() {
        let sym: Symbol = "AAPL".into();
        assert_eq!(sym.as_str(), "AAPL");
    }

    #[test]
    fn symbol_is_normalized() {
        assert_eq!(Symbol::new(" msft "), Symbol::new("MSFT"));
        assert_eq!(Symbol::new("brk-b").to_string(), "BRK-B");
    }

    #[test]
    fn symbol_set_lookup_by_str() {
        let set: BTreeSet<Symbol> = ["GOOGL", "AAPL"].into_iter().map(Symbol::from).collect();
        assert!(set.contains("AAPL"));
        assert_eq!(set.iter().next().map(Symbol::as_str), Some("AAPL"));
    }
}
