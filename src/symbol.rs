use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Symbol identifying a price series in the snapshot.
///
/// Covers both stock tickers (e.g., "AAPL", "BRK-B") and market index
/// identifiers (e.g., "^GSPC", "ES=F").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol after validating its format.
    ///
    /// # Errors
    /// Returns an error if the symbol is empty or contains characters other
    /// than alphanumerics, `.`, `-`, `_`, `^` and `=`.
    pub fn new(symbol: impl Into<String>) -> Result<Self, SymbolError> {
        let symbol = symbol.into();
        Self::validate(&symbol)?;
        Ok(Symbol(symbol))
    }

    fn validate(symbol: &str) -> Result<(), SymbolError> {
        if symbol.is_empty() {
            return Err(SymbolError::Empty);
        }

        if !symbol
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '^' | '='))
        {
            return Err(SymbolError::InvalidCharacters(symbol.to_string()));
        }

        Ok(())
    }

    /// Returns the symbol as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Lets `HashMap<Symbol, _>` be queried with a plain `&str`.
impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Symbol::new(value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// Errors that can occur when creating or validating symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    /// The symbol is empty
    Empty,
    /// The symbol contains invalid characters
    InvalidCharacters(String),
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolError::Empty => write!(f, "Symbol cannot be empty"),
            SymbolError::InvalidCharacters(symbol) => {
                write!(f, "Symbol '{}' contains invalid characters", symbol)
            }
        }
    }
}

impl std::error::Error for SymbolError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_symbol_creation_valid() {
        let symbol = Symbol::new("AAPL").unwrap();
        assert_eq!(symbol.as_str(), "AAPL");
    }

    #[test]
    fn test_index_and_futures_symbols_are_valid() {
        assert!(Symbol::new("^GSPC").is_ok());
        assert!(Symbol::new("ES=F").is_ok());
        assert!(Symbol::new("BRK-B").is_ok());
    }

    #[test]
    fn test_symbol_creation_empty_string() {
        assert_eq!(Symbol::new("").unwrap_err(), SymbolError::Empty);
    }

    #[test]
    fn test_symbol_validation_invalid_characters() {
        let result = Symbol::new("AAPL@");
        assert_eq!(
            result.unwrap_err(),
            SymbolError::InvalidCharacters("AAPL@".to_string())
        );
    }

    #[test]
    fn test_symbol_display() {
        let symbol = Symbol::new("MSFT").unwrap();
        assert_eq!(format!("{}", symbol), "MSFT");
    }

    #[test]
    fn test_symbol_map_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(Symbol::new("AAPL").unwrap(), "Apple Inc.");
        assert_eq!(map.get("AAPL"), Some(&"Apple Inc."));
        assert_eq!(map.get("aapl"), None);
    }

    #[test]
    fn test_symbol_deserialize_rejects_invalid() {
        let ok: Result<Symbol, _> = serde_json::from_str("\"^GSPC\"");
        assert!(ok.is_ok());
        let bad: Result<Symbol, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }
}
