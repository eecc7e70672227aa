//! DDL statement parsing (CREATE, DROP) and the procedural constructs used
//! in stored routine bodies.

use super::token_helper::TokenHelper;
use crate::error::{Error, Result};
use crate::parsing::ast::{
    Block, ColumnDef, CreateTable, CreateView, DataType, Declare, DeclareHandler, HandlerAction,
    IfStatement, Node, ObjectKind, Param, ParamMode, Query, Routine, Statement, TableConstraint,
    TableOption,
};
use crate::parsing::lexer::Token;

/// Parser trait for DDL and procedural statements.
pub trait DdlParser<'a>: TokenHelper<'a> {
    /// Parses an expression; provided by the expression parser.
    fn parse_expression(&mut self) -> Result<Node>;

    /// Parses a query; provided by the query parser.
    fn parse_query(&mut self) -> Result<Query>;

    /// Parses a data type; provided by the type parser.
    fn parse_datatype(&mut self) -> Result<DataType>;

    /// Parses any statement; provided by the parser core. Used for routine
    /// bodies and block contents.
    fn parse_statement(&mut self) -> Result<Statement>;

    /// Parses an optional parenthesized column list; provided by the query
    /// parser.
    fn parse_column_list(&mut self) -> Result<Vec<String>>;

    /// Parses a CREATE statement.
    fn parse_create(&mut self) -> Result<Statement> {
        self.expect_word("CREATE")?;
        let or_replace = self.next_words(&["OR", "REPLACE"])?;
        if self.next_word("TABLE") {
            return self.parse_create_table();
        }
        if self.next_word("VIEW") {
            return self.parse_create_view(or_replace);
        }
        if self.next_word("SCHEMA") || self.next_word("DATABASE") {
            let if_not_exists = self.next_words(&["IF", "NOT", "EXISTS"])?;
            let name = self.next_name()?;
            return Ok(Statement::CreateSchema {
                name,
                if_not_exists,
            });
        }
        if self.next_word("PROCEDURE") {
            let routine = self.parse_routine(false)?;
            return Ok(Statement::CreateProcedure(Box::new(routine)));
        }
        if self.next_word("FUNCTION") {
            let routine = self.parse_routine(true)?;
            return Ok(Statement::CreateFunction(Box::new(routine)));
        }
        match self.peek()? {
            Some(token) => Err(Error::ParseError(format!(
                "unsupported CREATE target {token}"
            ))),
            None => Err(Error::ParseError("unexpected end of input".into())),
        }
    }

    fn parse_create_table(&mut self) -> Result<Statement> {
        let if_not_exists = self.next_words(&["IF", "NOT", "EXISTS"])?;
        let name = self.next_name()?;
        let mut columns = Vec::new();
        let mut constraints = Vec::new();
        let mut options = Vec::new();

        if self.next_is(Token::OpenParen) {
            loop {
                if let Some(constraint) = self.parse_table_constraint()? {
                    constraints.push(constraint);
                } else {
                    let (column, inline) = self.parse_column_def()?;
                    columns.push(column);
                    constraints.extend(inline);
                }
                if !self.next_is(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::CloseParen)?;
            options = self.parse_table_options()?;
        }

        let query = if self.next_word("AS") {
            Some(Box::new(self.parse_query()?))
        } else {
            None
        };
        Ok(Statement::CreateTable(Box::new(CreateTable {
            name,
            if_not_exists,
            columns,
            constraints,
            options,
            query,
        })))
    }

    /// Parses a table-level constraint if one starts here, else None and the
    /// next element is a column definition. An optional `CONSTRAINT name`
    /// prefix is accepted; the name is not retained.
    fn parse_table_constraint(&mut self) -> Result<Option<TableConstraint>> {
        if self.next_word("CONSTRAINT") {
            self.next_ident()?;
            // The constraint body itself is now mandatory.
            return match self.parse_table_constraint()? {
                Some(constraint) => Ok(Some(constraint)),
                None => Err(Error::ParseError("expected constraint body".into())),
            };
        }
        if self.next_words(&["PRIMARY", "KEY"])? {
            return Ok(Some(TableConstraint::PrimaryKey(self.parse_column_list()?)));
        }
        if self.peek_word("UNIQUE") {
            self.next()?;
            self.next_word("KEY");
            return Ok(Some(TableConstraint::Unique(self.parse_column_list()?)));
        }
        if self.next_words(&["FOREIGN", "KEY"])? {
            let columns = self.parse_column_list()?;
            self.expect_word("REFERENCES")?;
            let table = self.next_name()?;
            let ref_columns = self.parse_column_list()?;
            return Ok(Some(TableConstraint::ForeignKey {
                columns,
                table,
                ref_columns,
            }));
        }
        if self.next_word("CHECK") {
            self.expect(Token::OpenParen)?;
            let condition = self.parse_expression()?;
            self.expect(Token::CloseParen)?;
            return Ok(Some(TableConstraint::Check(condition)));
        }
        Ok(None)
    }

    /// Parses a column definition, returning the column and any inline
    /// REFERENCES rewritten as a table-level foreign key.
    fn parse_column_def(&mut self) -> Result<(ColumnDef, Vec<TableConstraint>)> {
        let name = self.next_any_ident()?;
        let datatype = self.parse_datatype()?;
        let mut column = ColumnDef {
            name,
            datatype,
            primary_key: false,
            nullable: None,
            default: None,
            unique: false,
            autoincrement: false,
        };
        let mut inline = Vec::new();
        loop {
            if self.next_words(&["PRIMARY", "KEY"])? {
                column.primary_key = true;
            } else if self.next_word("NOT") {
                self.expect_word("NULL")?;
                column.nullable = Some(false);
            } else if self.next_word("NULL") {
                column.nullable = Some(true);
            } else if self.next_word("UNIQUE") {
                column.unique = true;
            } else if self.next_word("DEFAULT") {
                column.default = Some(self.parse_expression()?);
            } else if self.next_word("AUTO_INCREMENT") || self.next_word("AUTOINCREMENT") {
                column.autoincrement = true;
            } else if self.next_word("REFERENCES") {
                let table = self.next_name()?;
                let ref_columns = self.parse_column_list()?;
                inline.push(TableConstraint::ForeignKey {
                    columns: vec![column.name.clone()],
                    table,
                    ref_columns,
                });
            } else {
                return Ok((column, inline));
            }
        }
    }

    /// Parses trailing table options (`ENGINE = InnoDB`, `DEFAULT CHARSET =
    /// utf8`). Option names canonicalize to lowercase; `DEFAULT x` folds to
    /// `default_x`.
    fn parse_table_options(&mut self) -> Result<Vec<TableOption>> {
        let mut options = Vec::new();
        loop {
            let name = if self.next_word("DEFAULT") {
                format!("default_{}", self.next_any_ident()?.to_ascii_lowercase())
            } else if self.peek_word("AS") {
                return Ok(options);
            } else if let Some(word) = self.next_ident_if_any() {
                word.to_ascii_lowercase()
            } else {
                return Ok(options);
            };
            self.next_is(Token::Equal);
            let value = self.parse_expression()?;
            options.push(TableOption { name, value });
        }
    }

    fn parse_create_view(&mut self, or_replace: bool) -> Result<Statement> {
        let name = self.next_name()?;
        self.expect_word("AS")?;
        let query = Box::new(self.parse_query()?);
        Ok(Statement::CreateView(Box::new(CreateView {
            name,
            or_replace,
            query,
        })))
    }

    /// Parses a stored procedure or function (the introducing keyword
    /// already consumed).
    fn parse_routine(&mut self, is_function: bool) -> Result<Routine> {
        let name = self.next_name()?;
        let mut params = Vec::new();
        self.expect(Token::OpenParen)?;
        if !self.next_is(Token::CloseParen) {
            loop {
                params.push(self.parse_param()?);
                if !self.next_is(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::CloseParen)?;
        }
        let returns = if is_function {
            self.expect_word("RETURNS")?;
            Some(self.parse_datatype()?)
        } else {
            None
        };
        let body = self.parse_statement()?;
        Ok(Routine {
            name,
            params,
            returns,
            body,
        })
    }

    fn parse_param(&mut self) -> Result<Param> {
        let mode = if self.next_word("IN") {
            Some(ParamMode::In)
        } else if self.next_word("OUT") {
            Some(ParamMode::Out)
        } else if self.next_word("INOUT") {
            Some(ParamMode::InOut)
        } else {
            None
        };
        let name = self.next_any_ident()?;
        let datatype = self.parse_datatype()?;
        Ok(Param {
            mode,
            name,
            datatype,
        })
    }

    /// Parses a DROP statement.
    fn parse_drop(&mut self) -> Result<Statement> {
        self.expect_word("DROP")?;
        let kind = if self.next_word("TABLE") {
            ObjectKind::Table
        } else if self.next_word("VIEW") {
            ObjectKind::View
        } else if self.next_word("SCHEMA") || self.next_word("DATABASE") {
            ObjectKind::Schema
        } else if self.next_word("INDEX") {
            ObjectKind::Index
        } else {
            return Err(Error::ParseError("unsupported DROP target".into()));
        };
        let if_exists = self.next_words(&["IF", "EXISTS"])?;
        let mut names = vec![self.next_name()?];
        while self.next_is(Token::Comma) {
            names.push(self.next_name()?);
        }
        Ok(Statement::Drop {
            kind,
            names,
            if_exists,
        })
    }

    /// Parses a `BEGIN ... END [label]` block (BEGIN already consumed).
    fn parse_block(&mut self, label: Option<String>) -> Result<Statement> {
        let body = self.parse_statement_list(&["END"])?;
        self.expect_word("END")?;
        if label.is_some() {
            self.next_ident_if_any();
        }
        Ok(Statement::Block(Block { label, body }))
    }

    /// Parses semicolon-separated statements until one of the terminator
    /// words or end of input.
    fn parse_statement_list(&mut self, terminators: &[&str]) -> Result<Vec<Statement>> {
        let mut body = Vec::new();
        loop {
            while self.next_is(Token::Semicolon) {}
            if self.peek()?.is_none() || terminators.iter().any(|word| self.peek_word(word)) {
                return Ok(body);
            }
            body.push(self.parse_statement()?);
        }
    }

    /// Parses DECLARE: either a variable declaration or a condition handler.
    fn parse_declare(&mut self) -> Result<Statement> {
        self.expect_word("DECLARE")?;
        if self.next_word("CONTINUE") {
            return self.parse_handler(HandlerAction::Continue);
        }
        if self.next_word("EXIT") {
            return self.parse_handler(HandlerAction::Exit);
        }
        let mut names = vec![self.next_ident()?];
        while self.next_is(Token::Comma) {
            names.push(self.next_ident()?);
        }
        let datatype = self.parse_datatype()?;
        let default = if self.next_word("DEFAULT") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Statement::Declare(Declare {
            names,
            datatype,
            default,
        }))
    }

    /// Parses `HANDLER FOR condition statement` after the action word.
    fn parse_handler(&mut self, action: HandlerAction) -> Result<Statement> {
        self.expect_word("HANDLER")?;
        self.expect_word("FOR")?;
        let condition = if self.next_word("NOT") {
            self.expect_word("FOUND")?;
            "NOT FOUND".to_string()
        } else if self.next_word("SQLEXCEPTION") {
            "SQLEXCEPTION".to_string()
        } else if self.next_word("SQLWARNING") {
            "SQLWARNING".to_string()
        } else if self.next_word("SQLSTATE") {
            match self.next()? {
                Token::String { value, .. } => format!("SQLSTATE '{value}'"),
                token => {
                    return Err(Error::ParseError(format!(
                        "expected SQLSTATE value, found {token}"
                    )));
                }
            }
        } else {
            return Err(Error::ParseError("expected handler condition".into()));
        };
        let body = self.parse_statement()?;
        Ok(Statement::DeclareHandler(Box::new(DeclareHandler {
            action,
            condition,
            body,
        })))
    }

    /// Parses `IF ... THEN ... [ELSEIF ...] [ELSE ...] END IF`.
    fn parse_if(&mut self) -> Result<Statement> {
        self.expect_word("IF")?;
        let mut branches = Vec::new();
        loop {
            let condition = self.parse_expression()?;
            self.expect_word("THEN")?;
            let body = self.parse_statement_list(&["ELSEIF", "ELSE", "END"])?;
            branches.push((condition, body));
            if !self.next_word("ELSEIF") {
                break;
            }
        }
        let else_branch = if self.next_word("ELSE") {
            Some(self.parse_statement_list(&["END"])?)
        } else {
            None
        };
        self.expect_word("END")?;
        self.expect_word("IF")?;
        Ok(Statement::If(Box::new(IfStatement {
            branches,
            else_branch,
        })))
    }

    fn parse_leave(&mut self) -> Result<Statement> {
        self.expect_word("LEAVE")?;
        Ok(Statement::Leave(self.next_any_ident()?))
    }

    fn parse_return(&mut self) -> Result<Statement> {
        self.expect_word("RETURN")?;
        match self.peek()? {
            None | Some(Token::Semicolon) => Ok(Statement::Return(None)),
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("end") => {
                Ok(Statement::Return(None))
            }
            _ => Ok(Statement::Return(Some(self.parse_expression()?))),
        }
    }
}
