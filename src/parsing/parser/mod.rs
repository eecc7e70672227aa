//! The recursive-descent SQL parser, split across focused traits:
//! - expr_parser: expression parsing with operator precedence
//! - query_parser: SELECT, FROM sources, set operations, ordered clauses
//! - dml_parser: INSERT, UPDATE, DELETE, MERGE, SET, transactions
//! - ddl_parser: CREATE, DROP, and procedural constructs
//! - type_parser: data types
//! - token_helper: base trait for token navigation

pub mod ddl_parser;
pub mod dml_parser;
pub mod expr_parser;
pub mod query_parser;
pub mod token_helper;
pub mod type_parser;

use self::ddl_parser::DdlParser;
use self::dml_parser::DmlParser;
use self::expr_parser::ExpressionParser;
use self::query_parser::QueryParser;
use self::token_helper::TokenHelper;
use self::type_parser::TypeParser;
use super::ast::{DataType, Node, OrderItem, Query, Statement, TableRef};
use super::lexer::{Lexer, Token};
use crate::dialect::Grammar;
use crate::error::{Error, Result};
use std::iter::Peekable;

/// The parser takes tokens from the lexer and builds the canonical tree for
/// one statement. It only ensures the syntax is well-formed; names are not
/// resolved and dialect differences beyond the grammar flags are preserved
/// as-is in the tree.
pub struct Parser<'a> {
    lexer: Peekable<Lexer<'a>>,
    grammar: &'a Grammar,
}

impl<'a> Parser<'a> {
    /// Parses the input string as a single statement, ending with an
    /// optional semicolon.
    pub fn parse(statement: &'a str, grammar: &'a Grammar) -> Result<Statement> {
        let mut parser = Self::new(statement, grammar);
        let statement = parser.parse_statement()?;
        parser.next_is(Token::Semicolon);
        if let Some(token) = parser.lexer.next().transpose()? {
            return Err(Error::ParseError(format!("unexpected token {token}")));
        }
        Ok(statement)
    }

    /// Creates a new parser for the given string.
    pub fn new(input: &'a str, grammar: &'a Grammar) -> Parser<'a> {
        Parser {
            lexer: Lexer::new(input, grammar).peekable(),
            grammar,
        }
    }

    /// Parses a single statement, dispatching on the leading word.
    pub fn parse_statement(&mut self) -> Result<Statement> {
        let word = match TokenHelper::peek(self)?.cloned() {
            Some(Token::Ident(word)) => word.to_ascii_lowercase(),
            Some(Token::OpenParen) => {
                return Ok(Statement::Query(Box::new(QueryParser::parse_query(self)?)));
            }
            Some(token) => {
                return Err(Error::ParseError(format!(
                    "expected statement, found {token}"
                )));
            }
            None => return Err(Error::ParseError("expected statement".into())),
        };
        match word.as_str() {
            "select" | "with" | "values" => {
                Ok(Statement::Query(Box::new(QueryParser::parse_query(self)?)))
            }
            "insert" => self.parse_insert(),
            "update" => self.parse_update(),
            "delete" => self.parse_delete(),
            "merge" => self.parse_merge(),
            "create" => self.parse_create(),
            "drop" => self.parse_drop(),
            "set" => self.parse_set(),
            "start" => self.parse_start_transaction(),
            "commit" => {
                self.next()?;
                self.next_word("WORK");
                Ok(Statement::Commit)
            }
            "rollback" => {
                self.next()?;
                self.next_word("WORK");
                Ok(Statement::Rollback)
            }
            "explain" => {
                self.next()?;
                Ok(Statement::Explain(Box::new(self.parse_statement()?)))
            }
            "describe" | "desc" => {
                self.next()?;
                Ok(Statement::Describe(self.next_name()?))
            }
            "begin" => {
                self.next()?;
                if self.next_word("WORK") || self.next_word("TRANSACTION") {
                    return Ok(Statement::StartTransaction);
                }
                match TokenHelper::peek(self)?.cloned() {
                    None | Some(Token::Semicolon) => Ok(Statement::StartTransaction),
                    _ => self.parse_block(None),
                }
            }
            "declare" => self.parse_declare(),
            "if" => self.parse_if(),
            "leave" => self.parse_leave(),
            "return" => self.parse_return(),
            _ => {
                // A bare identifier can only be a block label.
                let label = self.next_any_ident()?;
                if !self.next_is(Token::Colon) {
                    return Err(Error::ParseError(format!(
                        "expected statement, found {label}"
                    )));
                }
                self.expect_word("BEGIN")?;
                self.parse_block(Some(label))
            }
        }
    }
}

impl<'a> TokenHelper<'a> for Parser<'a> {
    fn tokens(&mut self) -> &mut Peekable<Lexer<'a>> {
        &mut self.lexer
    }

    fn grammar(&self) -> &Grammar {
        self.grammar
    }
}

impl<'a> ExpressionParser<'a> for Parser<'a> {
    fn parse_query(&mut self) -> Result<Query> {
        QueryParser::parse_query(self)
    }

    fn parse_order_items(&mut self) -> Result<Vec<OrderItem>> {
        QueryParser::parse_order_items(self)
    }

    fn parse_datatype(&mut self) -> Result<DataType> {
        TypeParser::parse_datatype(self)
    }
}

impl<'a> QueryParser<'a> for Parser<'a> {
    fn parse_expression(&mut self) -> Result<Node> {
        ExpressionParser::parse_expression(self)
    }
}

impl<'a> DmlParser<'a> for Parser<'a> {
    fn parse_expression(&mut self) -> Result<Node> {
        ExpressionParser::parse_expression(self)
    }

    fn parse_query(&mut self) -> Result<Query> {
        QueryParser::parse_query(self)
    }

    fn parse_values_rows(&mut self) -> Result<Vec<Vec<Node>>> {
        QueryParser::parse_values_rows(self)
    }

    fn parse_table_ref(&mut self) -> Result<TableRef> {
        QueryParser::parse_table_ref(self)
    }

    fn parse_column_list(&mut self) -> Result<Vec<String>> {
        QueryParser::parse_column_list(self)
    }
}

impl<'a> DdlParser<'a> for Parser<'a> {
    fn parse_expression(&mut self) -> Result<Node> {
        ExpressionParser::parse_expression(self)
    }

    fn parse_query(&mut self) -> Result<Query> {
        QueryParser::parse_query(self)
    }

    fn parse_datatype(&mut self) -> Result<DataType> {
        TypeParser::parse_datatype(self)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        Parser::parse_statement(self)
    }

    fn parse_column_list(&mut self) -> Result<Vec<String>> {
        QueryParser::parse_column_list(self)
    }
}

impl<'a> TypeParser<'a> for Parser<'a> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::parsing::ast::{QueryBody, SetOp};

    fn parse(sql: &str) -> Statement {
        let grammar = Grammar::get(Dialect::Generic, false).unwrap();
        Parser::parse(sql, &grammar).unwrap()
    }

    #[test]
    fn select_statement() {
        let Statement::Query(query) = parse("SELECT a, b FROM t WHERE id = 1") else {
            panic!("expected query");
        };
        let QueryBody::Select(select) = query.body else {
            panic!("expected select");
        };
        assert_eq!(select.items.len(), 2);
        assert!(select.r#where.is_some());
    }

    #[test]
    fn insert_statement() {
        let statement = parse("INSERT INTO t (a, b) VALUES (1, 'x')");
        assert!(matches!(statement, Statement::Insert(_)));
    }

    #[test]
    fn create_table_statement() {
        let Statement::CreateTable(create) = parse(
            "CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR(20) NOT NULL)",
        ) else {
            panic!("expected create table");
        };
        assert_eq!(create.columns.len(), 2);
        assert!(create.columns[0].primary_key);
        assert_eq!(create.columns[1].nullable, Some(false));
    }

    #[test]
    fn union_all_flattens() {
        let Statement::Query(query) = parse("SELECT 1 UNION ALL SELECT 2 UNION ALL SELECT 3")
        else {
            panic!("expected query");
        };
        let QueryBody::SetOp { op, parts } = query.body else {
            panic!("expected set op");
        };
        assert_eq!(op, SetOp::UnionAll);
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn trailing_garbage_is_an_error() {
        let grammar = Grammar::get(Dialect::Generic, false).unwrap();
        assert!(Parser::parse("SELECT 1 1", &grammar).is_err());
        assert!(Parser::parse("SELECT 1 !", &grammar).is_err());
    }

    #[test]
    fn labeled_block() {
        let Statement::Block(block) = parse("loop1: BEGIN SELECT 1; END loop1") else {
            panic!("expected block");
        };
        assert_eq!(block.label.as_deref(), Some("loop1"));
        assert_eq!(block.body.len(), 1);
    }
}
