//! Data type parsing, shared by CAST expressions and column definitions.

use super::token_helper::TokenHelper;
use crate::error::{Error, Result};
use crate::parsing::ast::{DataType, Node};
use crate::parsing::lexer::Token;

/// Parser trait for SQL data types.
pub trait TypeParser<'a>: TokenHelper<'a> {
    /// Parses a data type name with optional parameters. Multi-word names
    /// (`DOUBLE PRECISION`, `CHARACTER VARYING`) fold into a single
    /// underscore-joined canonical name.
    fn parse_datatype(&mut self) -> Result<DataType> {
        let mut name = self.next_any_ident()?.to_ascii_lowercase();
        match name.as_str() {
            "double" if self.next_word("PRECISION") => name = "double_precision".into(),
            "character" | "char" if self.next_word("VARYING") => {
                name = format!("{name}_varying");
            }
            _ => {}
        }
        let mut args = Vec::new();
        if self.next_is(Token::OpenParen) {
            args.push(self.parse_type_arg()?);
            while self.next_is(Token::Comma) {
                args.push(self.parse_type_arg()?);
            }
            self.expect(Token::CloseParen)?;
        }
        Ok(DataType { name, args })
    }

    /// One type parameter: a length/precision number, or a word such as
    /// `VARCHAR(MAX)`.
    fn parse_type_arg(&mut self) -> Result<Node> {
        match self.next()? {
            Token::Number(text) => text
                .parse::<i64>()
                .map(Node::Integer)
                .map_err(|_| Error::ParseError(format!("invalid type parameter {text}"))),
            Token::Ident(word) => Ok(Node::name(word.to_ascii_lowercase())),
            token => Err(Error::ParseError(format!(
                "expected type parameter, found {token}"
            ))),
        }
    }
}
