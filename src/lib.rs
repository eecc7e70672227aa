//! SQL parsing and formatting over a canonical, dialect-neutral tree.
//!
//! Parsing turns SQL text into [`Statement`] trees in which every operator
//! is a call node with a canonical name, so `a + b` and `ADD(a, b)` have a
//! single representation and downstream code never matches on surface
//! syntax. Formatting renders a tree back to SQL, inserting parentheses
//! only where precedence demands them. The dialect affects the lexical
//! layer (quoting, what brackets mean), never the shape of the tree.
//!
//! ```
//! use sqltree::{format, parse, Parsed};
//!
//! let Parsed::One(statement) = parse("SELECT a + b FROM t")? else {
//!     panic!("expected one statement");
//! };
//! assert_eq!(format(&statement)?, "SELECT a + b FROM t");
//! # Ok::<(), sqltree::Error>(())
//! ```

pub mod dialect;
pub mod error;
pub mod formatting;
pub mod keywords;
pub mod parsing;
pub mod scrub;

pub use dialect::{Dialect, Grammar};
pub use error::{Error, Result};
pub use formatting::{FormatOptions, Formatter};
pub use parsing::ast::{Node, Statement};
pub use parsing::Parser;
pub use scrub::{CallStyle, ScrubOptions};

use parsing::splitter::{self, Segment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-call parsing configuration. Defaults parse NULL to the null marker,
/// keep single arguments unlisted, and use the explicit all-columns node.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Replacement for SQL NULL in the output tree.
    pub null: Option<Node>,
    /// Call argument shaping.
    pub calls: CallStyle,
    /// Parse bare `*` to the legacy atom instead of the explicit
    /// all-columns node.
    pub all_columns: bool,
    /// Renames applied to canonical call names (keys lowercase).
    pub fmap: HashMap<String, String>,
}

/// The result of parsing a script: zero, one, or many statements. Scripts
/// are all-or-nothing; a parse error anywhere yields no trees at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Parsed {
    /// The input held no statements (empty, or only directives).
    None,
    /// Exactly one statement.
    One(Statement),
    /// Two or more statements, in input order.
    Many(Vec<Statement>),
}

impl Parsed {
    /// All parsed statements, in input order.
    pub fn into_vec(self) -> Vec<Statement> {
        match self {
            Parsed::None => Vec::new(),
            Parsed::One(statement) => vec![statement],
            Parsed::Many(statements) => statements,
        }
    }

    /// The single parsed statement, or an error if there was not exactly
    /// one.
    pub fn one(self) -> Result<Statement> {
        match self {
            Parsed::One(statement) => Ok(statement),
            Parsed::None => Err(Error::ParseError("no statement in input".into())),
            Parsed::Many(statements) => Err(Error::ParseError(format!(
                "expected one statement, found {}",
                statements.len()
            ))),
        }
    }
}

/// Parses SQL in the generic dialect with default options.
pub fn parse(sql: &str) -> Result<Parsed> {
    parse_with(sql, Dialect::Generic, &ParseOptions::default())
}

/// Parses SQL in the MySQL dialect with default options.
pub fn parse_mysql(sql: &str) -> Result<Parsed> {
    parse_with(sql, Dialect::MySql, &ParseOptions::default())
}

/// Parses SQL in the SQL Server dialect with default options.
pub fn parse_sqlserver(sql: &str) -> Result<Parsed> {
    parse_with(sql, Dialect::SqlServer, &ParseOptions::default())
}

/// Parses SQL in the BigQuery dialect with default options.
pub fn parse_bigquery(sql: &str) -> Result<Parsed> {
    parse_with(sql, Dialect::BigQuery, &ParseOptions::default())
}

/// Parses a SQL script: splits it on statement boundaries (honoring
/// `DELIMITER` directives, which themselves produce no tree), parses each
/// piece, and applies the scrub pass.
pub fn parse_with(sql: &str, dialect: Dialect, options: &ParseOptions) -> Result<Parsed> {
    let grammar = Grammar::get(dialect, options.all_columns)?;
    let scrub_options = ScrubOptions {
        null: options.null.clone(),
        calls: options.calls,
        fmap: options.fmap.clone(),
    };
    let mut statements = Vec::new();
    for segment in splitter::split(sql) {
        match segment {
            Segment::Directive { .. } => {}
            Segment::Statement(text) => {
                let statement = Parser::parse(&text, &grammar)?;
                statements.push(scrub::scrub_statement(statement, &scrub_options));
            }
        }
    }
    tracing::debug!(count = statements.len(), ?dialect, "parsed script");
    match statements.len() {
        0 => Ok(Parsed::None),
        1 => Ok(Parsed::One(statements.remove(0))),
        _ => Ok(Parsed::Many(statements)),
    }
}

/// Formats a statement with default options.
pub fn format(statement: &Statement) -> Result<String> {
    format_with(statement, &FormatOptions::default())
}

/// Formats a statement with the given options.
pub fn format_with(statement: &Statement, options: &FormatOptions) -> Result<String> {
    Formatter::new(options).format_statement(statement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_parses_to_none() {
        assert_eq!(parse("").unwrap(), Parsed::None);
        assert_eq!(parse("  ;;  ").unwrap(), Parsed::None);
    }

    #[test]
    fn scripts_parse_to_many() {
        let Parsed::Many(statements) = parse("SELECT 1; SELECT 2;").unwrap() else {
            panic!("expected many");
        };
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn script_errors_are_all_or_nothing() {
        assert!(parse("SELECT 1; SELECT FROM FROM;").is_err());
    }

    #[test]
    fn delimiter_directives_produce_no_tree() {
        let parsed = parse_mysql("DELIMITER ;;\nSELECT 1;;\nDELIMITER ;").unwrap();
        assert!(matches!(parsed, Parsed::One(_)));
    }
}
