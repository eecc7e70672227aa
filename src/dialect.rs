//! Dialect configuration and the grammar cache.
//!
//! A [`Grammar`] fixes everything dialect-specific at construction time:
//! which quote characters introduce identifiers, whether double-quoted
//! strings are literals, what square brackets mean, and the `all_columns`
//! legacy flag. Instances are immutable and shared; construction happens at
//! most once per `(dialect, all_columns)` key.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// A named SQL variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// ANSI-ish default: double quotes are identifiers.
    Generic,
    /// Double-quoted strings are literals, backticks are identifiers.
    MySql,
    /// Square brackets are identifiers.
    SqlServer,
    /// Double-quoted strings are literals, backticks are identifiers,
    /// square brackets are array literals.
    BigQuery,
}

impl Dialect {
    /// Resolves a dialect by name, e.g. for callers configured with strings.
    pub fn from_name(name: &str) -> Result<Dialect> {
        match name.to_ascii_lowercase().as_str() {
            "generic" | "ansi" | "common" => Ok(Dialect::Generic),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlserver" | "mssql" | "tsql" => Ok(Dialect::SqlServer),
            "bigquery" => Ok(Dialect::BigQuery),
            other => Err(Error::ConfigError(format!("unknown dialect {other:?}"))),
        }
    }
}

/// What square brackets denote in the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketMode {
    /// `[name]` is a quoted identifier.
    Identifier,
    /// `[1, 2]` is an array literal; `a[1]` is a subscript.
    Array,
}

/// The per-dialect parsing configuration. Logically immutable once built.
#[derive(Debug)]
pub struct Grammar {
    pub dialect: Dialect,
    /// True if `"..."` is a string literal rather than an identifier.
    pub double_quoted_strings: bool,
    /// True if `` `...` `` is a quoted identifier.
    pub backquote_identifiers: bool,
    /// Meaning of square brackets.
    pub brackets: BracketMode,
    /// Legacy flag: bare `*` parses to [`Node::All`](crate::parsing::ast::Node::All)
    /// when set; otherwise to an explicit all-columns node that can carry
    /// an `EXCEPT` list.
    pub all_columns: bool,
}

impl Grammar {
    fn build(dialect: Dialect, all_columns: bool) -> Grammar {
        tracing::debug!(?dialect, all_columns, "building grammar");
        match dialect {
            Dialect::Generic => Grammar {
                dialect,
                double_quoted_strings: false,
                backquote_identifiers: true,
                brackets: BracketMode::Array,
                all_columns,
            },
            Dialect::MySql => Grammar {
                dialect,
                double_quoted_strings: true,
                backquote_identifiers: true,
                brackets: BracketMode::Array,
                all_columns,
            },
            Dialect::SqlServer => Grammar {
                dialect,
                double_quoted_strings: false,
                backquote_identifiers: false,
                brackets: BracketMode::Identifier,
                all_columns,
            },
            Dialect::BigQuery => Grammar {
                dialect,
                double_quoted_strings: true,
                backquote_identifiers: true,
                brackets: BracketMode::Array,
                all_columns,
            },
        }
    }

    /// Returns the cached grammar for the key, building it on first use.
    /// Construction is serialized by the cache lock, so a grammar is never
    /// observed half-built; lookups after construction clone an `Arc`.
    pub fn get(dialect: Dialect, all_columns: bool) -> Result<Arc<Grammar>> {
        static CACHE: OnceLock<Mutex<HashMap<(Dialect, bool), Arc<Grammar>>>> = OnceLock::new();
        let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
        let mut cache = cache
            .lock()
            .map_err(|_| Error::Internal("grammar cache poisoned".into()))?;
        Ok(cache
            .entry((dialect, all_columns))
            .or_insert_with(|| Arc::new(Grammar::build(dialect, all_columns)))
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_returns_same_instance() {
        let a = Grammar::get(Dialect::MySql, false).unwrap();
        let b = Grammar::get(Dialect::MySql, false).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let c = Grammar::get(Dialect::MySql, true).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn dialect_names() {
        assert_eq!(Dialect::from_name("MySQL").unwrap(), Dialect::MySql);
        assert_eq!(Dialect::from_name("mssql").unwrap(), Dialect::SqlServer);
        assert!(matches!(
            Dialect::from_name("oracle9"),
            Err(Error::ConfigError(_))
        ));
    }
}
