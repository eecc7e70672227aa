//! Error types for parsing and formatting

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input does not match the grammar. Fatal to the statement; a
    /// multi-statement call fails as a whole.
    #[error("SQL parse error: {0}")]
    ParseError(String),

    /// A canonical node violates a structural invariant (e.g. an empty
    /// identifier path, or a query with no clauses). These indicate a
    /// malformed hand-built tree, not a user-facing SQL mistake.
    #[error("malformed tree: {0}")]
    ShapeError(String),

    /// An unrecognized dialect or flag combination was requested.
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("internal error: {0}")]
    Internal(String),
}
