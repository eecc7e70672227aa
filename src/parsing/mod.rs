//! SQL parsing: script splitting, lexing, and the recursive-descent parser
//! that builds the canonical tree.

pub mod ast;
pub mod lexer;
mod parser;
pub mod splitter;

pub use parser::Parser;
