//! Query parsing: SELECT and its clauses, FROM sources and joins, set
//! operations, WITH, and the ordered trailing clauses.

use super::token_helper::TokenHelper;
use crate::error::{Error, Result};
use crate::parsing::ast::{
    Cte, Direction, DistinctClause, Join, JoinKind, Name, Node, NullsOrder, OrderItem, Query,
    QueryBody, Select, SelectItem, SetOp, TableAlias, TableRef, TableSample,
};
use crate::parsing::lexer::Token;

/// Parser trait for queries.
pub trait QueryParser<'a>: TokenHelper<'a> {
    /// Parses an expression; provided by the expression parser.
    fn parse_expression(&mut self) -> Result<Node>;

    /// Parses a full query: WITH, a body possibly chained with set
    /// operators, then ORDER BY / LIMIT / OFFSET / FETCH. Consecutive
    /// identical set operators flatten into one n-ary node; a change of
    /// operator nests the chain so far as the left part.
    fn parse_query(&mut self) -> Result<Query> {
        let with = self.parse_with_clause()?;
        let mut query = self.parse_query_part()?;
        while let Some(op) = self.parse_set_op() {
            let part = self.parse_query_part()?;
            let bare = query.with.is_empty()
                && query.order_by.is_empty()
                && query.limit.is_none()
                && query.offset.is_none()
                && query.fetch.is_none();
            query = match query {
                Query {
                    body: QueryBody::SetOp { op: prev, mut parts },
                    ..
                } if bare && prev == op => {
                    parts.push(part);
                    Query::from_body(QueryBody::SetOp { op, parts })
                }
                other => Query::from_body(QueryBody::SetOp {
                    op,
                    parts: vec![other, part],
                }),
            };
        }
        query.with = with;
        self.parse_ordered_clauses(&mut query)?;
        Ok(query)
    }

    /// Parses one part of a set-operator chain: a SELECT, a VALUES table,
    /// or a parenthesized query.
    fn parse_query_part(&mut self) -> Result<Query> {
        if self.next_is(Token::OpenParen) {
            let query = self.parse_query()?;
            self.expect(Token::CloseParen)?;
            return Ok(query);
        }
        if self.peek_word("SELECT") {
            return Ok(Query::from_select(self.parse_select()?));
        }
        if self.next_word("VALUES") {
            let rows = self.parse_values_rows()?;
            return Ok(Query::from_body(QueryBody::Values(
                rows.into_iter().map(Node::List).collect(),
            )));
        }
        match self.peek()? {
            Some(token) => Err(Error::ParseError(format!("expected query, found {token}"))),
            None => Err(Error::ParseError("expected query".into())),
        }
    }

    /// Consumes a set operator if one is next.
    fn parse_set_op(&mut self) -> Option<SetOp> {
        if self.next_word("UNION") {
            if self.next_word("ALL") {
                return Some(SetOp::UnionAll);
            }
            self.next_word("DISTINCT");
            return Some(SetOp::Union);
        }
        if self.next_word("INTERSECT") {
            return Some(SetOp::Intersect);
        }
        if self.next_word("EXCEPT") {
            return Some(SetOp::Except);
        }
        if self.next_word("MINUS") {
            return Some(SetOp::Minus);
        }
        None
    }

    /// Parses an optional WITH clause.
    fn parse_with_clause(&mut self) -> Result<Vec<Cte>> {
        let mut ctes = Vec::new();
        if !self.next_word("WITH") {
            return Ok(ctes);
        }
        loop {
            let name = self.next_ident()?;
            let columns = self.parse_column_list()?;
            self.expect_word("AS")?;
            self.expect(Token::OpenParen)?;
            let query = self.parse_query()?;
            self.expect(Token::CloseParen)?;
            ctes.push(Cte {
                name,
                columns,
                query,
            });
            if !self.next_is(Token::Comma) {
                return Ok(ctes);
            }
        }
    }

    /// Parses an optional parenthesized list of column names.
    fn parse_column_list(&mut self) -> Result<Vec<String>> {
        let mut columns = Vec::new();
        if self.next_is(Token::OpenParen) {
            columns.push(self.next_any_ident()?);
            while self.next_is(Token::Comma) {
                columns.push(self.next_any_ident()?);
            }
            self.expect(Token::CloseParen)?;
        }
        Ok(columns)
    }

    /// Parses a SELECT statement body (no trailing ordered clauses).
    fn parse_select(&mut self) -> Result<Select> {
        self.expect_word("SELECT")?;
        let mut select = Select::new();

        if self.next_word("DISTINCT") {
            select.distinct = if self.next_word("ON") {
                self.expect(Token::OpenParen)?;
                let mut on = vec![self.parse_expression()?];
                while self.next_is(Token::Comma) {
                    on.push(self.parse_expression()?);
                }
                self.expect(Token::CloseParen)?;
                DistinctClause::On(on)
            } else {
                DistinctClause::All
            };
        } else {
            self.next_word("ALL");
        }

        if self.next_word("TOP") {
            select.top = Some(self.parse_top_count()?);
        }

        select.items.push(self.parse_select_item()?);
        while self.next_is(Token::Comma) {
            select.items.push(self.parse_select_item()?);
        }

        if self.next_word("FROM") {
            select.from = self.parse_from_clause()?;
        }
        if self.next_word("WHERE") {
            select.r#where = Some(self.parse_expression()?);
        }
        if self.next_word("GROUP") {
            self.expect_word("BY")?;
            select.group_by.push(self.parse_expression()?);
            while self.next_is(Token::Comma) {
                select.group_by.push(self.parse_expression()?);
            }
        }
        if self.next_word("HAVING") {
            select.having = Some(self.parse_expression()?);
        }
        Ok(select)
    }

    /// Parses the TOP row count: a parenthesized expression or a bare
    /// number. A bare expression would swallow the following `*` as
    /// multiplication, so only literals are allowed unparenthesized.
    fn parse_top_count(&mut self) -> Result<Node> {
        if self.next_is(Token::OpenParen) {
            let count = self.parse_expression()?;
            self.expect(Token::CloseParen)?;
            return Ok(count);
        }
        match self.next()? {
            Token::Number(text) => text
                .parse::<i64>()
                .map(Node::Integer)
                .map_err(|_| Error::ParseError(format!("invalid TOP count {text}"))),
            token => Err(Error::ParseError(format!(
                "expected TOP count, found {token}"
            ))),
        }
    }

    fn parse_select_item(&mut self) -> Result<SelectItem> {
        let value = self.parse_expression()?;
        let alias = if self.next_word("AS") {
            Some(self.next_any_ident()?)
        } else {
            self.next_ident_if_any()
        };
        Ok(SelectItem { value, alias })
    }

    /// Parses the FROM clause: a comma-separated list of sources, each
    /// optionally followed by join clauses. Joins stay flat, each as its own
    /// item referring back to the preceding source.
    fn parse_from_clause(&mut self) -> Result<Vec<TableRef>> {
        let mut from = vec![self.parse_table_ref()?];
        loop {
            if self.next_is(Token::Comma) {
                from.push(self.parse_table_ref()?);
                continue;
            }
            let Some(kind) = self.parse_join_kind()? else {
                return Ok(from);
            };
            let table = Box::new(self.parse_table_ref()?);
            let mut on = None;
            let mut using = Vec::new();
            if self.next_word("ON") {
                on = Some(self.parse_expression()?);
            } else if self.next_word("USING") {
                self.expect(Token::OpenParen)?;
                using.push(Name::single(self.next_any_ident()?));
                while self.next_is(Token::Comma) {
                    using.push(Name::single(self.next_any_ident()?));
                }
                self.expect(Token::CloseParen)?;
            }
            from.push(TableRef::Join(Join {
                kind,
                table,
                on,
                using,
            }));
        }
    }

    /// Consumes a join keyword phrase if one is next.
    fn parse_join_kind(&mut self) -> Result<Option<JoinKind>> {
        let kind = if self.next_word("JOIN") {
            JoinKind::Plain
        } else if self.next_word("INNER") {
            self.expect_word("JOIN")?;
            JoinKind::Inner
        } else if self.next_word("CROSS") {
            self.expect_word("JOIN")?;
            JoinKind::Cross
        } else if self.next_word("LEFT") {
            let outer = self.next_word("OUTER");
            self.expect_word("JOIN")?;
            if outer { JoinKind::LeftOuter } else { JoinKind::Left }
        } else if self.next_word("RIGHT") {
            let outer = self.next_word("OUTER");
            self.expect_word("JOIN")?;
            if outer { JoinKind::RightOuter } else { JoinKind::Right }
        } else if self.next_word("FULL") {
            let outer = self.next_word("OUTER");
            self.expect_word("JOIN")?;
            if outer { JoinKind::FullOuter } else { JoinKind::Full }
        } else if self.next_word("NATURAL") {
            self.expect_word("JOIN")?;
            JoinKind::Natural
        } else if self.next_word("STRAIGHT_JOIN") {
            JoinKind::Straight
        } else {
            return Ok(None);
        };
        Ok(Some(kind))
    }

    /// Parses one FROM source: a table, a (possibly LATERAL) subquery, or a
    /// VALUES table, each with an optional alias.
    fn parse_table_ref(&mut self) -> Result<TableRef> {
        if self.next_word("LATERAL") {
            self.expect(Token::OpenParen)?;
            let query = Box::new(self.parse_query()?);
            self.expect(Token::CloseParen)?;
            let alias = self.parse_table_alias()?;
            return Ok(TableRef::Subquery {
                query,
                alias,
                lateral: true,
            });
        }
        if self.next_is(Token::OpenParen) {
            let query = Box::new(self.parse_query()?);
            self.expect(Token::CloseParen)?;
            let alias = self.parse_table_alias()?;
            return Ok(TableRef::Subquery {
                query,
                alias,
                lateral: false,
            });
        }
        if self.next_word("VALUES") {
            let rows = self.parse_values_rows()?;
            let alias = self.parse_table_alias()?;
            return Ok(TableRef::Values {
                rows: rows.into_iter().map(Node::List).collect(),
                alias,
            });
        }
        let name = self.next_name()?;
        let alias = self.parse_table_alias()?;
        let sample = if self.next_word("TABLESAMPLE") {
            Some(self.parse_tablesample()?)
        } else {
            None
        };
        Ok(TableRef::Table {
            name,
            alias,
            sample,
        })
    }

    /// Parses VALUES rows: `(a, b), (c, d)`.
    fn parse_values_rows(&mut self) -> Result<Vec<Vec<Node>>> {
        let mut rows = Vec::new();
        loop {
            self.expect(Token::OpenParen)?;
            let mut row = vec![self.parse_expression()?];
            while self.next_is(Token::Comma) {
                row.push(self.parse_expression()?);
            }
            self.expect(Token::CloseParen)?;
            rows.push(row);
            if !self.next_is(Token::Comma) {
                return Ok(rows);
            }
        }
    }

    /// Parses an optional table alias, with optional column renames.
    fn parse_table_alias(&mut self) -> Result<Option<TableAlias>> {
        let name = if self.next_word("AS") {
            self.next_any_ident()?
        } else {
            match self.next_ident_if_any() {
                Some(name) => name,
                None => return Ok(None),
            }
        };
        let columns = self.parse_column_list()?;
        Ok(Some(TableAlias { name, columns }))
    }

    /// Parses a TABLESAMPLE clause (keyword already consumed).
    fn parse_tablesample(&mut self) -> Result<TableSample> {
        let method = self.next_ident_if_any();
        self.expect(Token::OpenParen)?;
        let amount = self.parse_expression()?;
        let sample = if self.next_word("ROWS") {
            TableSample {
                method,
                rows: Some(amount),
                percent: None,
            }
        } else {
            self.next_word("PERCENT");
            TableSample {
                method,
                rows: None,
                percent: Some(amount),
            }
        };
        self.expect(Token::CloseParen)?;
        Ok(sample)
    }

    /// Parses ORDER BY items, the leading keywords already consumed.
    fn parse_order_items(&mut self) -> Result<Vec<OrderItem>> {
        let mut items = vec![self.parse_order_item()?];
        while self.next_is(Token::Comma) {
            items.push(self.parse_order_item()?);
        }
        Ok(items)
    }

    fn parse_order_item(&mut self) -> Result<OrderItem> {
        let value = self.parse_expression()?;
        let direction = if self.next_word("ASC") {
            Some(Direction::Asc)
        } else if self.next_word("DESC") {
            Some(Direction::Desc)
        } else {
            None
        };
        let nulls = if self.next_word("NULLS") {
            if self.next_word("FIRST") {
                Some(NullsOrder::First)
            } else {
                self.expect_word("LAST")?;
                Some(NullsOrder::Last)
            }
        } else {
            None
        };
        Ok(OrderItem {
            value,
            direction,
            nulls,
        })
    }

    /// Parses the ordered trailing clauses into the query. `LIMIT a, b` is
    /// the MySQL offset-first form.
    fn parse_ordered_clauses(&mut self, query: &mut Query) -> Result<()> {
        if self.next_word("ORDER") {
            self.expect_word("BY")?;
            query.order_by = self.parse_order_items()?;
        }
        if self.next_word("LIMIT") {
            let first = self.parse_expression()?;
            if self.next_is(Token::Comma) {
                query.offset = Some(first);
                query.limit = Some(self.parse_expression()?);
            } else {
                query.limit = Some(first);
            }
        }
        if self.next_word("OFFSET") {
            query.offset = Some(self.parse_expression()?);
            let _ = self.next_word("ROWS") || self.next_word("ROW");
        }
        if self.next_word("FETCH") {
            if !self.next_word("FIRST") {
                self.expect_word("NEXT")?;
            }
            let count = if self.peek_word("ROW") || self.peek_word("ROWS") {
                Node::Integer(1)
            } else {
                self.parse_expression()?
            };
            let _ = self.next_word("ROWS") || self.next_word("ROW");
            self.next_word("ONLY");
            query.fetch = Some(count);
        }
        Ok(())
    }
}
