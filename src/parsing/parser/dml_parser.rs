//! DML statement parsing: INSERT, UPDATE, DELETE, MERGE, SET, and
//! transaction control.

use super::token_helper::TokenHelper;
use crate::error::{Error, Result};
use crate::parsing::ast::{
    Assignment, Delete, Insert, InsertSource, Merge, MergeClause, Node, Query, Statement,
    TableRef, Update,
};
use crate::parsing::lexer::Token;

/// Parser trait for DML statements.
pub trait DmlParser<'a>: TokenHelper<'a> {
    /// Parses an expression; provided by the expression parser.
    fn parse_expression(&mut self) -> Result<Node>;

    /// Parses a query; provided by the query parser.
    fn parse_query(&mut self) -> Result<Query>;

    /// Parses VALUES rows; provided by the query parser.
    fn parse_values_rows(&mut self) -> Result<Vec<Vec<Node>>>;

    /// Parses a FROM source; provided by the query parser.
    fn parse_table_ref(&mut self) -> Result<TableRef>;

    /// Parses an optional parenthesized column list; provided by the query
    /// parser.
    fn parse_column_list(&mut self) -> Result<Vec<String>>;

    /// Parses an INSERT statement. `INSERT OVERWRITE [TABLE]` replaces the
    /// target instead of appending.
    fn parse_insert(&mut self) -> Result<Statement> {
        self.expect_word("INSERT")?;
        let overwrite = self.next_word("OVERWRITE");
        if overwrite {
            self.next_word("TABLE");
        } else {
            self.next_word("INTO");
        }
        let table = self.next_name()?;
        let columns = self.parse_column_list()?;

        let source = if self.next_word("DEFAULT") {
            self.expect_word("VALUES")?;
            InsertSource::Default
        } else if self.next_word("VALUES") {
            InsertSource::Values(self.parse_values_rows()?)
        } else if self.peek_word("SELECT")
            || self.peek_word("WITH")
            || self.peek()? == Some(&Token::OpenParen)
        {
            InsertSource::Query(Box::new(self.parse_query()?))
        } else {
            return Err(Error::ParseError(
                "expected VALUES, SELECT, or DEFAULT VALUES after INSERT".into(),
            ));
        };
        Ok(Statement::Insert(Box::new(Insert {
            table,
            columns,
            overwrite,
            source,
        })))
    }

    /// Parses an UPDATE statement.
    fn parse_update(&mut self) -> Result<Statement> {
        self.expect_word("UPDATE")?;
        let table = self.next_name()?;
        self.expect_word("SET")?;
        let set = self.parse_assignments()?;
        let r#where = if self.next_word("WHERE") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Statement::Update(Box::new(Update {
            table,
            set,
            r#where,
        })))
    }

    /// Parses a DELETE statement.
    fn parse_delete(&mut self) -> Result<Statement> {
        self.expect_word("DELETE")?;
        self.expect_word("FROM")?;
        let table = self.next_name()?;
        let r#where = if self.next_word("WHERE") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Statement::Delete(Box::new(Delete { table, r#where })))
    }

    /// Parses a MERGE statement.
    fn parse_merge(&mut self) -> Result<Statement> {
        self.expect_word("MERGE")?;
        self.next_word("INTO");
        let into = self.parse_table_ref()?;
        self.expect_word("USING")?;
        let using = self.parse_table_ref()?;
        self.expect_word("ON")?;
        let on = self.parse_expression()?;

        let mut clauses = Vec::new();
        while self.next_word("WHEN") {
            clauses.push(self.parse_merge_clause()?);
        }
        if clauses.is_empty() {
            return Err(Error::ParseError("MERGE requires WHEN clauses".into()));
        }
        Ok(Statement::Merge(Box::new(Merge {
            into,
            using,
            on,
            clauses,
        })))
    }

    /// Parses one WHEN clause of a MERGE (the WHEN already consumed).
    fn parse_merge_clause(&mut self) -> Result<MergeClause> {
        if self.next_word("MATCHED") {
            let predicate = if self.next_word("AND") {
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.expect_word("THEN")?;
            if self.next_word("UPDATE") {
                self.expect_word("SET")?;
                let set = self.parse_assignments()?;
                return Ok(MergeClause::MatchedUpdate { predicate, set });
            }
            self.expect_word("DELETE")?;
            return Ok(MergeClause::MatchedDelete { predicate });
        }
        self.expect_word("NOT")?;
        self.expect_word("MATCHED")?;
        let predicate = if self.next_word("AND") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_word("THEN")?;
        self.expect_word("INSERT")?;
        let columns = self.parse_column_list()?;
        self.expect_word("VALUES")?;
        self.expect(Token::OpenParen)?;
        let mut values = vec![self.parse_expression()?];
        while self.next_is(Token::Comma) {
            values.push(self.parse_expression()?);
        }
        self.expect(Token::CloseParen)?;
        Ok(MergeClause::NotMatchedInsert {
            predicate,
            columns,
            values,
        })
    }

    /// Parses a comma-separated list of `target = value` assignments.
    fn parse_assignments(&mut self) -> Result<Vec<Assignment>> {
        let mut assignments = Vec::new();
        loop {
            let target = self.next_name()?;
            self.expect(Token::Equal)?;
            let value = self.parse_expression()?;
            assignments.push(Assignment { target, value });
            if !self.next_is(Token::Comma) {
                return Ok(assignments);
            }
        }
    }

    /// Parses a SET statement (session or variable assignments).
    fn parse_set(&mut self) -> Result<Statement> {
        self.expect_word("SET")?;
        Ok(Statement::Set(self.parse_assignments()?))
    }

    /// Parses START TRANSACTION.
    fn parse_start_transaction(&mut self) -> Result<Statement> {
        self.expect_word("START")?;
        self.expect_word("TRANSACTION")?;
        Ok(Statement::StartTransaction)
    }
}
