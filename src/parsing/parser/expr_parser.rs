//! Expression parsing with operator precedence climbing.
//!
//! Operators are resolved through the shared precedence table in
//! [`crate::keywords`]; every operator folds into a canonical [`Call`] node
//! named by its canonical operator name, so `a + b` and `ADD(a, b)` have no
//! distinct representations. All binary operators are left-associative;
//! chains of associative operators (AND, OR, +, *, ||, &, |) are flattened
//! into one n-ary node.

use super::token_helper::TokenHelper;
use crate::dialect::BracketMode;
use crate::error::{Error, Result};
use crate::keywords::{self, Precedence};
use crate::parsing::ast::{
    Aggregate, Args, Call, Case, DataType, Frame, Name, Node, NullsOrder, OrderItem, Query,
    StringLiteral, Window, Windowed,
};
use crate::parsing::lexer::Token;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Operators whose chains collapse into a single n-ary node.
const ASSOCIATIVE: &[&str] = &["add", "and", "binary_and", "binary_or", "concat", "mul", "or"];

/// Parser trait for expressions.
pub trait ExpressionParser<'a>: TokenHelper<'a> {
    /// Parses a full query; provided by the query parser.
    fn parse_query(&mut self) -> Result<Query>;

    /// Parses ORDER BY items (without the leading keywords); provided by the
    /// query parser.
    fn parse_order_items(&mut self) -> Result<Vec<OrderItem>>;

    /// Parses a data type; provided by the type parser.
    fn parse_datatype(&mut self) -> Result<DataType>;

    /// Parses an expression.
    fn parse_expression(&mut self) -> Result<Node> {
        self.parse_expression_at(0)
    }

    /// Parses an expression, consuming operators of at least the given
    /// precedence.
    fn parse_expression_at(&mut self, min_precedence: Precedence) -> Result<Node> {
        let mut lhs = self.parse_prefix()?;
        while let Some(op) = self.peek_infix_op()? {
            if keywords::precedence(op) < min_precedence {
                break;
            }
            lhs = self.parse_infix(lhs, op)?;
        }
        Ok(lhs)
    }

    /// Identifies the infix operator starting at the next token, without
    /// consuming anything. `NOT` needs a second token of lookahead to tell
    /// `NOT LIKE` from `NOT IN` and friends.
    fn peek_infix_op(&mut self) -> Result<Option<&'static str>> {
        let array_brackets = self.grammar().brackets == BracketMode::Array;
        let Some(token) = self.peek()? else {
            return Ok(None);
        };
        Ok(match token {
            Token::Plus => Some("add"),
            Token::Minus => Some("sub"),
            Token::Asterisk => Some("mul"),
            Token::Slash => Some("div"),
            Token::Percent => Some("mod"),
            Token::Equal => Some("eq"),
            Token::NotEqual => Some("neq"),
            Token::GreaterThan => Some("gt"),
            Token::GreaterOrEqual => Some("gte"),
            Token::LessThan => Some("lt"),
            Token::LessOrEqual => Some("lte"),
            Token::Concat => Some("concat"),
            Token::Ampersand => Some("binary_and"),
            Token::Pipe => Some("binary_or"),
            Token::OpenBracket if array_brackets => Some("get"),
            Token::Ident(word) => match word.to_ascii_lowercase().as_str() {
                "and" => Some("and"),
                "or" => Some("or"),
                "like" => Some("like"),
                "ilike" => Some("ilike"),
                "rlike" => Some("rlike"),
                "regexp" => Some("regexp"),
                "in" => Some("in"),
                "between" => Some("between"),
                "collate" => Some("collate"),
                "is" => Some("missing"),
                "not" => self.peek_negated_op(),
                _ => None,
            },
            _ => None,
        })
    }

    /// Looks one token past a leading `NOT` to identify the negated infix
    /// operator, if any.
    fn peek_negated_op(&mut self) -> Option<&'static str> {
        let mut lookahead = self.tokens().clone();
        lookahead.next();
        match lookahead.next()?.ok()? {
            Token::Ident(word) => match word.to_ascii_lowercase().as_str() {
                "like" => Some("not_like"),
                "ilike" => Some("not_ilike"),
                "rlike" => Some("not_rlike"),
                "regexp" => Some("not_regexp"),
                "in" => Some("nin"),
                "between" => Some("not_between"),
                _ => None,
            },
            _ => None,
        }
    }

    /// Parses the infix operator identified by `peek_infix_op` and its right
    /// operand, returning the combined node.
    fn parse_infix(&mut self, lhs: Node, op: &'static str) -> Result<Node> {
        let precedence = keywords::precedence(op);
        match op {
            "missing" => {
                self.expect_word("IS")?;
                let negated = self.next_word("NOT");
                self.expect_word("NULL")?;
                let name = if negated { "exists" } else { "missing" };
                Ok(Node::unary(name, lhs))
            }
            "get" => {
                self.expect(Token::OpenBracket)?;
                let index = self.parse_expression()?;
                self.expect(Token::CloseBracket)?;
                Ok(Node::binary("get", lhs, index))
            }
            "collate" => {
                self.expect_word("COLLATE")?;
                let collation = self.next_any_ident()?;
                Ok(Node::binary("collate", lhs, Node::name(collation)))
            }
            "in" | "nin" => {
                if op == "nin" {
                    self.expect_word("NOT")?;
                }
                self.expect_word("IN")?;
                let rhs = self.parse_in_operand()?;
                Ok(Node::binary(op, lhs, rhs))
            }
            "between" | "not_between" => {
                if op == "not_between" {
                    self.expect_word("NOT")?;
                }
                self.expect_word("BETWEEN")?;
                let low = self.parse_expression_at(precedence + 1)?;
                self.expect_word("AND")?;
                let high = self.parse_expression_at(precedence + 1)?;
                Ok(Node::call(op, [lhs, low, high]))
            }
            "like" | "not_like" | "ilike" | "not_ilike" | "rlike" | "not_rlike" | "regexp"
            | "not_regexp" => {
                if op.starts_with("not_") {
                    self.expect_word("NOT")?;
                }
                self.expect_word(op.trim_start_matches("not_"))?;
                let rhs = self.parse_expression_at(precedence + 1)?;
                let mut call = Call::new(op, Args::Many(vec![lhs, rhs]));
                if self.next_word("ESCAPE") {
                    let escape = self.parse_expression_at(precedence + 1)?;
                    call.kwargs.push(("escape".into(), escape));
                }
                Ok(call.into())
            }
            _ => {
                // Plain binary operator: one token, left-associative.
                self.next()?;
                let rhs = self.parse_expression_at(precedence + 1)?;
                Ok(combine(op, lhs, rhs))
            }
        }
    }

    /// Parses the operand of [NOT] IN: a parenthesized subquery, a
    /// parenthesized value list, or a single expression.
    fn parse_in_operand(&mut self) -> Result<Node> {
        if !self.next_is(Token::OpenParen) {
            return self.parse_expression_at(keywords::precedence("in") + 1);
        }
        if self.peek_query_start() {
            let query = self.parse_query()?;
            self.expect(Token::CloseParen)?;
            return Ok(query.into());
        }
        let mut items = vec![self.parse_expression()?];
        while self.next_is(Token::Comma) {
            items.push(self.parse_expression()?);
        }
        self.expect(Token::CloseParen)?;
        Ok(Node::List(items))
    }

    /// True if the next word opens a query (SELECT, WITH, VALUES).
    fn peek_query_start(&mut self) -> bool {
        self.peek_word("SELECT") || self.peek_word("WITH") || self.peek_word("VALUES")
    }

    /// Parses a prefix expression: a literal, a name, a unary operator, or
    /// one of the special syntactic forms.
    fn parse_prefix(&mut self) -> Result<Node> {
        match self.next()? {
            Token::Number(text) => number_node(&text),
            Token::String { value, encoding } => {
                Ok(Node::Literal(StringLiteral { value, encoding }))
            }
            Token::QuotedIdent(name) => self.parse_name_tail(name),
            Token::Minus => {
                if matches!(self.peek()?, Some(Token::Number(_))) {
                    if let Token::Number(text) = self.next()? {
                        return number_node(&format!("-{text}"));
                    }
                }
                let operand = self.parse_expression_at(keywords::precedence("neg") + 1)?;
                Ok(Node::unary("neg", operand))
            }
            Token::Plus => self.parse_prefix(),
            Token::Tilde => {
                let operand = self.parse_expression_at(keywords::precedence("binary_not") + 1)?;
                Ok(Node::unary("binary_not", operand))
            }
            Token::OpenParen => self.parse_parenthesized(),
            Token::OpenBracket if self.grammar().brackets == BracketMode::Array => {
                let mut items = Vec::new();
                if !self.next_is(Token::CloseBracket) {
                    items.push(self.parse_expression()?);
                    while self.next_is(Token::Comma) {
                        items.push(self.parse_expression()?);
                    }
                    self.expect(Token::CloseBracket)?;
                }
                Ok(Node::Call(Box::new(Call::new(
                    "create_array",
                    Args::Many(items),
                ))))
            }
            Token::Asterisk => self.parse_all_columns(None),
            Token::Ident(word) => self.parse_word_prefix(word),
            token => Err(Error::ParseError(format!(
                "expected expression, found {token}"
            ))),
        }
    }

    /// Parses what follows an opening parenthesis in expression position:
    /// a subquery, a single parenthesized expression, or a row value list.
    fn parse_parenthesized(&mut self) -> Result<Node> {
        if self.peek_query_start() {
            let query = self.parse_query()?;
            self.expect(Token::CloseParen)?;
            return Ok(query.into());
        }
        let mut items = vec![self.parse_expression()?];
        while self.next_is(Token::Comma) {
            items.push(self.parse_expression()?);
        }
        self.expect(Token::CloseParen)?;
        if items.len() == 1 {
            return Ok(items.remove(0));
        }
        Ok(Node::List(items))
    }

    /// Parses a prefix expression that starts with the given unquoted word.
    fn parse_word_prefix(&mut self, word: String) -> Result<Node> {
        match word.to_ascii_lowercase().as_str() {
            "true" => return Ok(Node::Boolean(true)),
            "false" => return Ok(Node::Boolean(false)),
            "null" => return Ok(Node::Null),
            "not" => {
                let operand = self.parse_expression_at(keywords::precedence("not") + 1)?;
                return Ok(Node::unary("not", operand));
            }
            "case" => return self.parse_case(),
            "exists" => {
                self.expect(Token::OpenParen)?;
                let query = self.parse_query()?;
                self.expect(Token::CloseParen)?;
                return Ok(Node::unary("exists", query.into()));
            }
            "interval" => return self.parse_interval(),
            "cast" | "try_cast" | "safe_cast" | "validate_conversion"
                if self.peek()? == Some(&Token::OpenParen) =>
            {
                return self.parse_cast(word.to_ascii_lowercase());
            }
            "extract" if self.peek()? == Some(&Token::OpenParen) => {
                self.next()?;
                let part = self.next_any_ident()?.to_ascii_lowercase();
                self.expect_word("FROM")?;
                let value = self.parse_expression()?;
                self.expect(Token::CloseParen)?;
                return Ok(Node::call("extract", [Node::name(part), value]));
            }
            "trim" if self.peek()? == Some(&Token::OpenParen) => return self.parse_trim(),
            "substring" | "substr" if self.peek()? == Some(&Token::OpenParen) => {
                return self.parse_substring();
            }
            "current_date" | "current_time" | "current_timestamp" => {
                if self.peek()? != Some(&Token::OpenParen) {
                    let call = Call::new(word.to_ascii_lowercase(), Args::None);
                    return Ok(call.into());
                }
            }
            _ => {}
        }

        if self.peek()? == Some(&Token::OpenParen) {
            return self.parse_call(word.to_ascii_lowercase());
        }
        if keywords::is_reserved(&word) {
            return Err(Error::ParseError(format!("unexpected keyword {word}")));
        }
        self.parse_name_tail(word)
    }

    /// Parses the remainder of a dotted name whose first segment has been
    /// consumed. `a.b.*` becomes an all-columns node qualified by `a.b`.
    fn parse_name_tail(&mut self, first: String) -> Result<Node> {
        let mut segments = vec![first];
        while self.next_is(Token::Period) {
            if self.next_is(Token::Asterisk) {
                return self.parse_all_columns(Some(Name(segments)));
            }
            segments.push(self.next_any_ident()?);
        }
        Ok(Node::Name(Name(segments)))
    }

    /// Parses `*` or `name.*`, with an optional BigQuery `EXCEPT (...)` list.
    /// In `all_columns` mode a bare `*` stays the legacy atom.
    fn parse_all_columns(&mut self, from: Option<Name>) -> Result<Node> {
        let mut except = Vec::new();
        if self.peek_word("EXCEPT") {
            // EXCEPT is only part of the star when a parenthesized column
            // list follows; otherwise it is a set operator.
            let mut lookahead = self.tokens().clone();
            lookahead.next();
            if let Some(Ok(Token::OpenParen)) = lookahead.next() {
                self.next()?;
                self.expect(Token::OpenParen)?;
                except.push(Node::Name(self.next_name()?));
                while self.next_is(Token::Comma) {
                    except.push(Node::Name(self.next_name()?));
                }
                self.expect(Token::CloseParen)?;
            }
        }
        if self.grammar().all_columns && from.is_none() && except.is_empty() {
            return Ok(Node::All);
        }
        Ok(Node::AllColumns { from, except })
    }

    /// Parses a CASE expression, either the simple or the searched form.
    fn parse_case(&mut self) -> Result<Node> {
        let operand = if self.peek_word("WHEN") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let mut when_clauses = Vec::new();
        while self.next_word("WHEN") {
            let condition = self.parse_expression()?;
            self.expect_word("THEN")?;
            let result = self.parse_expression()?;
            when_clauses.push((condition, result));
        }
        if when_clauses.is_empty() {
            return Err(Error::ParseError("CASE requires at least one WHEN".into()));
        }
        let else_clause = if self.next_word("ELSE") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_word("END")?;
        Ok(Node::Case(Box::new(Case {
            operand,
            when_clauses,
            else_clause,
        })))
    }

    /// Parses the CAST family: `CAST(expr AS type)`. The type is carried as
    /// a zero- or n-argument call named after the type.
    fn parse_cast(&mut self, name: String) -> Result<Node> {
        self.expect(Token::OpenParen)?;
        let value = self.parse_expression()?;
        self.expect_word("AS")?;
        let datatype = self.parse_datatype()?;
        self.expect(Token::CloseParen)?;
        Ok(Node::call(name, [value, datatype_node(datatype)]))
    }

    /// Parses `INTERVAL amount unit`.
    fn parse_interval(&mut self) -> Result<Node> {
        let amount = self.parse_expression_at(keywords::precedence("interval") + 1)?;
        let unit = self.next_any_ident()?.to_ascii_lowercase();
        Ok(Node::call("interval", [amount, Node::name(unit)]))
    }

    /// Parses the TRIM forms. Direction folds into the operator name
    /// (LEADING is ltrim, TRAILING is rtrim); trim characters become a
    /// `characters` keyword argument.
    fn parse_trim(&mut self) -> Result<Node> {
        self.expect(Token::OpenParen)?;
        let name = if self.next_word("LEADING") {
            "ltrim"
        } else if self.next_word("TRAILING") {
            "rtrim"
        } else {
            self.next_word("BOTH");
            "trim"
        };
        let mut characters = None;
        let value = if self.next_word("FROM") {
            self.parse_expression()?
        } else {
            let first = self.parse_expression()?;
            if self.next_word("FROM") {
                characters = Some(first);
                self.parse_expression()?
            } else {
                first
            }
        };
        self.expect(Token::CloseParen)?;
        let mut call = Call::new(name, Args::One(value));
        if let Some(characters) = characters {
            call.kwargs.push(("characters".into(), characters));
        }
        Ok(call.into())
    }

    /// Parses SUBSTRING, either the comma form or `FROM ... FOR ...`.
    fn parse_substring(&mut self) -> Result<Node> {
        self.expect(Token::OpenParen)?;
        let value = self.parse_expression()?;
        if self.next_is(Token::Comma) {
            let mut args = vec![value, self.parse_expression()?];
            if self.next_is(Token::Comma) {
                args.push(self.parse_expression()?);
            }
            self.expect(Token::CloseParen)?;
            return Ok(Node::call("substring", args));
        }
        let mut call = Call::new("substring", Args::One(value));
        if self.next_word("FROM") {
            call.kwargs.push(("from".into(), self.parse_expression()?));
        }
        if self.next_word("FOR") {
            call.kwargs.push(("for".into(), self.parse_expression()?));
        }
        self.expect(Token::CloseParen)?;
        Ok(call.into())
    }

    /// Parses a function call whose name has been consumed, the opening
    /// parenthesis being next. DISTINCT and in-parenthesis ORDER BY / LIMIT /
    /// SEPARATOR turn the call into an aggregate node. Window suffixes
    /// (FILTER / OVER / WITHIN GROUP) wrap whatever was parsed.
    fn parse_call(&mut self, name: String) -> Result<Node> {
        self.expect(Token::OpenParen)?;
        if self.next_is(Token::CloseParen) {
            return self.parse_window_suffix(Call::new(name, Args::None).into());
        }
        let distinct = self.next_word("DISTINCT");
        if !distinct {
            self.next_word("ALL");
        }

        let mut items = vec![self.parse_call_arg()?];
        while self.next_is(Token::Comma) {
            items.push(self.parse_call_arg()?);
        }

        let mut order_by = Vec::new();
        if self.next_word("ORDER") {
            self.expect_word("BY")?;
            order_by = self.parse_order_items()?;
        }
        let mut nulls = None;
        if self.next_word("NULLS") {
            nulls = Some(if self.next_word("FIRST") {
                NullsOrder::First
            } else {
                self.expect_word("LAST")?;
                NullsOrder::Last
            });
        }
        let limit = if self.next_word("LIMIT") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let separator = if self.next_word("SEPARATOR") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(Token::CloseParen)?;

        let node = if distinct
            || !order_by.is_empty()
            || nulls.is_some()
            || limit.is_some()
            || separator.is_some()
        {
            Node::Aggregate(Box::new(Aggregate {
                name,
                args: Args::Many(items),
                distinct,
                order_by,
                limit,
                nulls,
                separator,
            }))
        } else {
            Call::new(name, Args::Many(items)).into()
        };
        self.parse_window_suffix(node)
    }

    /// Parses one call argument: `*` is allowed here (`COUNT(*)`).
    fn parse_call_arg(&mut self) -> Result<Node> {
        if self.next_is(Token::Asterisk) {
            return Ok(Node::All);
        }
        self.parse_expression()
    }

    /// Parses optional window-function suffixes after a call.
    fn parse_window_suffix(&mut self, value: Node) -> Result<Node> {
        let filter = if self.next_word("FILTER") {
            self.expect(Token::OpenParen)?;
            self.expect_word("WHERE")?;
            let condition = self.parse_expression()?;
            self.expect(Token::CloseParen)?;
            Some(condition)
        } else {
            None
        };
        let mut within = Vec::new();
        if self.next_word("WITHIN") {
            self.expect_word("GROUP")?;
            self.expect(Token::OpenParen)?;
            self.expect_word("ORDER")?;
            self.expect_word("BY")?;
            within = self.parse_order_items()?;
            self.expect(Token::CloseParen)?;
        }
        let over = if self.next_word("OVER") {
            Some(self.parse_window()?)
        } else {
            None
        };
        if filter.is_none() && within.is_empty() && over.is_none() {
            return Ok(value);
        }
        Ok(Node::Windowed(Box::new(Windowed {
            value,
            filter,
            over,
            within,
        })))
    }

    /// Parses an `OVER (...)` window specification.
    fn parse_window(&mut self) -> Result<Window> {
        self.expect(Token::OpenParen)?;
        let mut partition_by = Vec::new();
        if self.next_word("PARTITION") {
            self.expect_word("BY")?;
            partition_by.push(self.parse_expression()?);
            while self.next_is(Token::Comma) {
                partition_by.push(self.parse_expression()?);
            }
        }
        let mut order_by = Vec::new();
        if self.next_word("ORDER") {
            self.expect_word("BY")?;
            order_by = self.parse_order_items()?;
        }
        let frame = if self.next_word("ROWS") || self.next_word("RANGE") {
            Some(self.parse_frame()?)
        } else {
            None
        };
        self.expect(Token::CloseParen)?;
        Ok(Window {
            partition_by,
            order_by,
            frame,
        })
    }

    /// Parses a window frame into signed row offsets: negative is preceding,
    /// positive is following, zero is the current row, absent is unbounded.
    /// A single bound pairs with the current row.
    fn parse_frame(&mut self) -> Result<Frame> {
        if self.next_word("BETWEEN") {
            let min = self.parse_frame_bound()?;
            self.expect_word("AND")?;
            let max = self.parse_frame_bound()?;
            return Ok(Frame { min, max });
        }
        let bound = self.parse_frame_bound()?;
        match bound {
            Some(offset) if offset > 0 => Ok(Frame {
                min: Some(0),
                max: Some(offset),
            }),
            _ => Ok(Frame {
                min: bound,
                max: Some(0),
            }),
        }
    }

    fn parse_frame_bound(&mut self) -> Result<Option<i64>> {
        if self.next_word("UNBOUNDED") {
            if !self.next_word("PRECEDING") {
                self.expect_word("FOLLOWING")?;
            }
            return Ok(None);
        }
        if self.next_word("CURRENT") {
            self.expect_word("ROW")?;
            return Ok(Some(0));
        }
        let offset = match self.next()? {
            Token::Number(text) => text
                .parse::<i64>()
                .map_err(|_| Error::ParseError(format!("invalid frame offset {text}")))?,
            token => {
                return Err(Error::ParseError(format!(
                    "expected frame bound, found {token}"
                )));
            }
        };
        if self.next_word("PRECEDING") {
            return Ok(Some(-offset));
        }
        self.expect_word("FOLLOWING")?;
        Ok(Some(offset))
    }
}

/// Combines a binary operation, flattening chains of associative operators.
fn combine(op: &str, lhs: Node, rhs: Node) -> Node {
    if ASSOCIATIVE.contains(&op) {
        if let Node::Call(call) = &lhs {
            if call.name == op && call.kwargs.is_empty() {
                if let Args::Many(items) = &call.args {
                    let mut items = items.clone();
                    items.push(rhs);
                    return Call::new(op, Args::Many(items)).into();
                }
            }
        }
    }
    Node::binary(op, lhs, rhs)
}

/// Decodes a numeric literal: i64 when it looks integral, exact decimal
/// otherwise.
fn number_node(text: &str) -> Result<Node> {
    if !text.contains(['.', 'e', 'E']) {
        if let Ok(integer) = text.parse::<i64>() {
            return Ok(Node::Integer(integer));
        }
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map(Node::Number)
        .map_err(|_| Error::ParseError(format!("invalid number {text}")))
}

/// Carries a parsed data type as a call node named after the type.
pub fn datatype_node(datatype: DataType) -> Node {
    let args = if datatype.args.is_empty() {
        Args::None
    } else {
        Args::Many(datatype.args)
    };
    Call::new(datatype.name, args).into()
}
