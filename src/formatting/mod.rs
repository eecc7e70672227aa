//! Serialization of canonical trees back to SQL text.
//!
//! Parenthesization is decided in one place: [`Formatter::node`] compares
//! the child's operator precedence against the context passed down by its
//! parent. Contexts are scaled so that a left operand admits its own
//! precedence bare (left-associative chains stay flat) while a right
//! operand of the same precedence is parenthesized, preserving evaluation
//! order without blanket parentheses.

pub mod ops;

use crate::error::{Error, Result};
use crate::keywords::{self, Precedence, QUERY_PRECEDENCE, SET_OP_PRECEDENCE};
use crate::parsing::ast::{
    Aggregate, Args, ColumnDef, Cte, DataType, DistinctClause, Frame, InsertSource, MergeClause,
    Name, Node, NullsOrder, OrderItem, Query, QueryBody, Routine, Select, Statement,
    TableConstraint, TableRef, Window, Windowed,
};
use regex::Regex;
use std::sync::OnceLock;

/// Decides whether an identifier segment must be quoted.
pub type ShouldQuote = fn(&str) -> bool;

/// Formatting configuration.
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    /// Quote identifiers with ANSI double quotes; false uses backquotes.
    pub ansi_quotes: bool,
    /// Custom quoting predicate; defaults to quoting reserved words and
    /// anything that is not a plain word.
    pub should_quote: Option<ShouldQuote>,
}

impl Default for FormatOptions {
    fn default() -> FormatOptions {
        FormatOptions {
            ansi_quotes: true,
            should_quote: None,
        }
    }
}

/// The default quoting predicate. `*` is never quoted.
pub fn default_should_quote(identifier: &str) -> bool {
    static VALID: OnceLock<Regex> = OnceLock::new();
    let valid = VALID.get_or_init(|| Regex::new(r"^[a-zA-Z_]\w*$").expect("static regex"));
    identifier != "*" && (!valid.is_match(identifier) || keywords::is_reserved(identifier))
}

/// Scaled precedence context. Twice the child precedence must exceed the
/// context for the child to render bare.
pub(crate) type Ctx = u16;

/// Top-level context: everything renders bare.
pub(crate) const TOP: Ctx = 0;

/// Context for a left operand of an operator with the given precedence.
pub(crate) fn left_ctx(precedence: Precedence) -> Ctx {
    2 * precedence as Ctx - 1
}

/// Context for a right operand (or any position that must reparse inside
/// the operator, such as BETWEEN bounds).
pub(crate) fn right_ctx(precedence: Precedence) -> Ctx {
    2 * precedence as Ctx
}

pub struct Formatter {
    quote_char: char,
    should_quote: ShouldQuote,
}

impl Formatter {
    pub fn new(options: &FormatOptions) -> Formatter {
        Formatter {
            quote_char: if options.ansi_quotes { '"' } else { '`' },
            should_quote: options.should_quote.unwrap_or(default_should_quote),
        }
    }

    /// Serializes a whole statement.
    pub fn format_statement(&self, statement: &Statement) -> Result<String> {
        match statement {
            Statement::Query(query) => self.query(query),
            Statement::Insert(insert) => self.insert(insert),
            Statement::Update(update) => {
                let mut sql = format!(
                    "UPDATE {} SET {}",
                    self.name(&update.table)?,
                    self.assignments(&update.set)?
                );
                if let Some(condition) = &update.r#where {
                    sql.push_str(" WHERE ");
                    sql.push_str(&self.node(condition, TOP)?);
                }
                Ok(sql)
            }
            Statement::Delete(delete) => {
                let mut sql = format!("DELETE FROM {}", self.name(&delete.table)?);
                if let Some(condition) = &delete.r#where {
                    sql.push_str(" WHERE ");
                    sql.push_str(&self.node(condition, TOP)?);
                }
                Ok(sql)
            }
            Statement::Merge(merge) => {
                let mut parts = vec![
                    format!("MERGE INTO {}", self.table_ref(&merge.into)?),
                    format!("USING {}", self.table_ref(&merge.using)?),
                    format!("ON {}", self.node(&merge.on, TOP)?),
                ];
                for clause in &merge.clauses {
                    parts.push(self.merge_clause(clause)?);
                }
                Ok(parts.join(" "))
            }
            Statement::CreateTable(create) => self.create_table(create),
            Statement::CreateView(view) => {
                let or_replace = if view.or_replace { "OR REPLACE " } else { "" };
                Ok(format!(
                    "CREATE {}VIEW {} AS {}",
                    or_replace,
                    self.name(&view.name)?,
                    self.query(&view.query)?
                ))
            }
            Statement::CreateSchema {
                name,
                if_not_exists,
            } => {
                let guard = if *if_not_exists { "IF NOT EXISTS " } else { "" };
                Ok(format!("CREATE SCHEMA {}{}", guard, self.name(name)?))
            }
            Statement::Drop {
                kind,
                names,
                if_exists,
            } => {
                let guard = if *if_exists { "IF EXISTS " } else { "" };
                let names = names
                    .iter()
                    .map(|name| self.name(name))
                    .collect::<Result<Vec<_>>>()?
                    .join(", ");
                Ok(format!("DROP {} {}{}", kind.as_sql(), guard, names))
            }
            Statement::CreateProcedure(routine) => self.routine("PROCEDURE", routine),
            Statement::CreateFunction(routine) => self.routine("FUNCTION", routine),
            Statement::Block(block) => {
                let mut sql = String::new();
                if let Some(label) = &block.label {
                    sql.push_str(&format!("{}: ", self.ident(label)));
                }
                sql.push_str("BEGIN ");
                sql.push_str(&self.statement_list(&block.body)?);
                sql.push_str(" END");
                if let Some(label) = &block.label {
                    sql.push(' ');
                    sql.push_str(&self.ident(label));
                }
                Ok(sql)
            }
            Statement::Declare(declare) => {
                let mut sql = format!(
                    "DECLARE {} {}",
                    declare
                        .names
                        .iter()
                        .map(|name| self.ident(name))
                        .collect::<Vec<_>>()
                        .join(", "),
                    self.datatype(&declare.datatype)?
                );
                if let Some(default) = &declare.default {
                    sql.push_str(" DEFAULT ");
                    sql.push_str(&self.node(default, TOP)?);
                }
                Ok(sql)
            }
            Statement::DeclareHandler(handler) => {
                let action = match handler.action {
                    crate::parsing::ast::HandlerAction::Continue => "CONTINUE",
                    crate::parsing::ast::HandlerAction::Exit => "EXIT",
                };
                Ok(format!(
                    "DECLARE {action} HANDLER FOR {} {}",
                    handler.condition,
                    self.format_statement(&handler.body)?
                ))
            }
            Statement::If(if_statement) => {
                let mut parts = Vec::new();
                for (index, (condition, body)) in if_statement.branches.iter().enumerate() {
                    let keyword = if index == 0 { "IF" } else { "ELSEIF" };
                    parts.push(format!(
                        "{keyword} {} THEN {}",
                        self.node(condition, TOP)?,
                        self.statement_list(body)?
                    ));
                }
                if let Some(body) = &if_statement.else_branch {
                    parts.push(format!("ELSE {}", self.statement_list(body)?));
                }
                parts.push("END IF".into());
                Ok(parts.join(" "))
            }
            Statement::Leave(label) => Ok(format!("LEAVE {}", self.ident(label))),
            Statement::Return(value) => match value {
                Some(value) => Ok(format!("RETURN {}", self.node(value, TOP)?)),
                None => Ok("RETURN".into()),
            },
            Statement::Set(assignments) => Ok(format!("SET {}", self.assignments(assignments)?)),
            Statement::StartTransaction => Ok("START TRANSACTION".into()),
            Statement::Commit => Ok("COMMIT".into()),
            Statement::Rollback => Ok("ROLLBACK".into()),
            Statement::Explain(inner) => {
                Ok(format!("EXPLAIN {}", self.format_statement(inner)?))
            }
            Statement::Describe(name) => Ok(format!("DESCRIBE {}", self.name(name)?)),
        }
    }

    /// Serializes a single expression.
    pub fn format_node(&self, node: &Node) -> Result<String> {
        self.node(node, TOP)
    }

    /// Renders a node, parenthesizing it when its precedence does not
    /// survive the context.
    pub(crate) fn node(&self, node: &Node, ctx: Ctx) -> Result<String> {
        // A query in expression position is a scalar subquery and always
        // carries its own parentheses; set-operation operands and table
        // sources go through the query renderers instead.
        if let Node::Query(query) = node {
            return Ok(format!("({})", self.query(query)?));
        }
        let sql = self.node_bare(node)?;
        if 2 * node_precedence(node) as Ctx > ctx {
            Ok(sql)
        } else {
            Ok(format!("({sql})"))
        }
    }

    fn node_bare(&self, node: &Node) -> Result<String> {
        match node {
            Node::Null => Ok("NULL".into()),
            Node::Boolean(true) => Ok("TRUE".into()),
            Node::Boolean(false) => Ok("FALSE".into()),
            Node::Integer(value) => Ok(value.to_string()),
            Node::Number(value) => Ok(value.to_string()),
            Node::Literal(literal) => {
                let encoding = literal
                    .encoding
                    .as_deref()
                    .map(str::to_uppercase)
                    .unwrap_or_default();
                Ok(format!("{encoding}'{}'", literal.value.replace('\'', "''")))
            }
            Node::Name(name) => self.name(name),
            Node::All => Ok("*".into()),
            Node::AllColumns { from, except } => {
                let mut sql = match from {
                    Some(name) => format!("{}.*", self.name(name)?),
                    None => "*".into(),
                };
                if !except.is_empty() {
                    sql.push_str(&format!(" EXCEPT ({})", self.node_list(except)?));
                }
                Ok(sql)
            }
            Node::List(items) => Ok(format!("({})", self.node_list(items)?)),
            Node::Call(call) => ops::format_call(self, call),
            Node::Windowed(windowed) => self.windowed(windowed),
            Node::Case(case) => {
                let mut parts = vec!["CASE".to_string()];
                if let Some(operand) = &case.operand {
                    parts.push(self.node(operand, TOP)?);
                }
                for (when, then) in &case.when_clauses {
                    parts.push(format!(
                        "WHEN {} THEN {}",
                        self.node(when, TOP)?,
                        self.node(then, TOP)?
                    ));
                }
                if let Some(else_clause) = &case.else_clause {
                    parts.push(format!("ELSE {}", self.node(else_clause, TOP)?));
                }
                parts.push("END".into());
                Ok(parts.join(" "))
            }
            Node::Query(query) => self.query(query),
            Node::Aggregate(aggregate) => self.aggregate(aggregate),
        }
    }

    /// Renders a comma-separated list of expressions, each bare.
    pub(crate) fn node_list(&self, items: &[Node]) -> Result<String> {
        Ok(items
            .iter()
            .map(|item| self.node(item, TOP))
            .collect::<Result<Vec<_>>>()?
            .join(", "))
    }

    /// Escapes a dotted identifier path. An empty path is a malformed tree.
    pub(crate) fn name(&self, name: &Name) -> Result<String> {
        if name.0.is_empty() {
            return Err(Error::ShapeError("empty identifier path".into()));
        }
        Ok(name
            .0
            .iter()
            .map(|segment| self.ident(segment))
            .collect::<Vec<_>>()
            .join("."))
    }

    /// Escapes one identifier segment, doubling embedded quote characters.
    pub(crate) fn ident(&self, segment: &str) -> String {
        if !(self.should_quote)(segment) {
            return segment.to_string();
        }
        let quote = self.quote_char;
        let doubled = segment.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{doubled}{quote}")
    }

    /// Renders a data type: uppercase name, optional parameter list.
    pub(crate) fn datatype(&self, datatype: &DataType) -> Result<String> {
        let name = datatype.name.to_uppercase().replace('_', " ");
        if datatype.args.is_empty() {
            return Ok(name);
        }
        Ok(format!("{name}({})", self.node_list(&datatype.args)?))
    }

    fn windowed(&self, windowed: &Windowed) -> Result<String> {
        let mut parts = vec![self.node(&windowed.value, TOP)?];
        if let Some(filter) = &windowed.filter {
            parts.push(format!("FILTER (WHERE {})", self.node(filter, TOP)?));
        }
        if !windowed.within.is_empty() {
            parts.push(format!(
                "WITHIN GROUP (ORDER BY {})",
                self.order_items(&windowed.within)?
            ));
        }
        if let Some(over) = &windowed.over {
            parts.push(format!("OVER ({})", self.window(over)?));
        }
        Ok(parts.join(" "))
    }

    fn window(&self, window: &Window) -> Result<String> {
        let mut parts = Vec::new();
        if !window.partition_by.is_empty() {
            parts.push(format!(
                "PARTITION BY {}",
                self.node_list(&window.partition_by)?
            ));
        }
        if !window.order_by.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_items(&window.order_by)?));
        }
        if let Some(frame) = &window.frame {
            if let Some(frame) = frame_sql(frame) {
                parts.push(frame);
            }
        }
        Ok(parts.join(" "))
    }

    fn aggregate(&self, aggregate: &Aggregate) -> Result<String> {
        let mut inner = Vec::new();
        if aggregate.distinct {
            inner.push("DISTINCT".to_string());
        }
        inner.push(self.args_sql(&aggregate.args)?);
        if !aggregate.order_by.is_empty() {
            inner.push(format!("ORDER BY {}", self.order_items(&aggregate.order_by)?));
        }
        if let Some(nulls) = aggregate.nulls {
            inner.push(nulls_sql(nulls).into());
        }
        if let Some(limit) = &aggregate.limit {
            inner.push(format!("LIMIT {}", self.node(limit, TOP)?));
        }
        if let Some(separator) = &aggregate.separator {
            inner.push(format!("SEPARATOR {}", self.node(separator, TOP)?));
        }
        Ok(format!(
            "{}({})",
            aggregate.name.to_uppercase(),
            inner.join(" ")
        ))
    }

    /// Renders call arguments as a comma-separated list.
    pub(crate) fn args_sql(&self, args: &Args) -> Result<String> {
        match args {
            Args::None => Ok(String::new()),
            Args::One(node) => self.node(node, TOP),
            Args::Many(items) => self.node_list(items),
            Args::Named(pairs) => Ok(pairs
                .iter()
                .map(|(key, value)| Ok(format!("{key} = {}", self.node(value, TOP)?)))
                .collect::<Result<Vec<_>>>()?
                .join(", ")),
        }
    }

    /// Renders a query with its clauses in canonical order.
    pub(crate) fn query(&self, query: &Query) -> Result<String> {
        let mut parts = Vec::new();
        if !query.with.is_empty() {
            parts.push(self.with_clause(&query.with)?);
        }
        parts.push(self.query_body(&query.body)?);
        if !query.order_by.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_items(&query.order_by)?));
        }
        if let Some(limit) = &query.limit {
            parts.push(format!("LIMIT {}", self.node(limit, TOP)?));
        }
        if let Some(offset) = &query.offset {
            parts.push(format!("OFFSET {}", self.node(offset, TOP)?));
        }
        if let Some(fetch) = &query.fetch {
            parts.push(format!("FETCH {} ROWS ONLY", self.node(fetch, TOP)?));
        }
        Ok(parts.join(" "))
    }

    fn with_clause(&self, ctes: &[Cte]) -> Result<String> {
        let parts = ctes
            .iter()
            .map(|cte| {
                let mut sql = self.ident(&cte.name);
                if !cte.columns.is_empty() {
                    sql.push_str(&format!(" ({})", self.ident_list(&cte.columns)));
                }
                Ok(format!("{sql} AS ({})", self.query(&cte.query)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("WITH {}", parts.join(", ")))
    }

    fn query_body(&self, body: &QueryBody) -> Result<String> {
        match body {
            QueryBody::Select(select) => self.select(select),
            QueryBody::Values(rows) => Ok(format!("VALUES {}", self.values_rows(rows)?)),
            QueryBody::SetOp { op, parts } => {
                if parts.len() < 2 {
                    return Err(Error::ShapeError(
                        "set operation requires at least two parts".into(),
                    ));
                }
                let sql = parts
                    .iter()
                    .enumerate()
                    .map(|(index, part)| {
                        let ctx = if index == 0 {
                            left_ctx(SET_OP_PRECEDENCE)
                        } else {
                            right_ctx(SET_OP_PRECEDENCE)
                        };
                        self.query_part(part, ctx)
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(sql.join(&format!(" {} ", op.as_sql())))
            }
        }
    }

    /// Renders one part of a set-operator chain, parenthesized when its own
    /// structure would not survive reparsing in that position.
    fn query_part(&self, part: &Query, ctx: Ctx) -> Result<String> {
        let sql = self.query(part)?;
        if 2 * query_precedence(part) as Ctx > ctx {
            Ok(sql)
        } else {
            Ok(format!("({sql})"))
        }
    }

    fn select(&self, select: &Select) -> Result<String> {
        let mut parts = Vec::new();
        let items = select
            .items
            .iter()
            .map(|item| {
                let mut sql = self.node(&item.value, TOP)?;
                if let Some(alias) = &item.alias {
                    sql.push_str(" AS ");
                    sql.push_str(&self.ident(alias));
                }
                Ok(sql)
            })
            .collect::<Result<Vec<_>>>()?
            .join(", ");

        let mut head = match &select.distinct {
            DistinctClause::None => "SELECT".to_string(),
            DistinctClause::All => "SELECT DISTINCT".to_string(),
            DistinctClause::On(exprs) => {
                format!("SELECT DISTINCT ON ({})", self.node_list(exprs)?)
            }
        };
        if let Some(top) = &select.top {
            head.push_str(&format!(" TOP ({})", self.node(top, TOP)?));
        }
        parts.push(format!("{head} {items}"));

        if !select.from.is_empty() {
            parts.push(self.from_clause(&select.from)?);
        }
        if let Some(condition) = &select.r#where {
            parts.push(format!("WHERE {}", self.node(condition, TOP)?));
        }
        if !select.group_by.is_empty() {
            parts.push(format!("GROUP BY {}", self.node_list(&select.group_by)?));
        }
        if let Some(having) = &select.having {
            parts.push(format!("HAVING {}", self.node(having, TOP)?));
        }
        Ok(parts.join(" "))
    }

    fn from_clause(&self, from: &[TableRef]) -> Result<String> {
        let mut sql = String::from("FROM ");
        for (index, table) in from.iter().enumerate() {
            if index > 0 {
                match table {
                    TableRef::Join(_) => sql.push(' '),
                    _ => sql.push_str(", "),
                }
            }
            sql.push_str(&self.table_ref(table)?);
        }
        Ok(sql)
    }

    pub(crate) fn table_ref(&self, table: &TableRef) -> Result<String> {
        match table {
            TableRef::Table {
                name,
                alias,
                sample,
            } => {
                let mut sql = self.name(name)?;
                if let Some(alias) = alias {
                    sql.push_str(&self.alias_sql(alias));
                }
                if let Some(sample) = sample {
                    sql.push_str(" TABLESAMPLE");
                    if let Some(method) = &sample.method {
                        sql.push(' ');
                        sql.push_str(method);
                    }
                    if let Some(rows) = &sample.rows {
                        sql.push_str(&format!(" ({} ROWS)", self.node(rows, TOP)?));
                    }
                    if let Some(percent) = &sample.percent {
                        sql.push_str(&format!(" ({} PERCENT)", self.node(percent, TOP)?));
                    }
                }
                Ok(sql)
            }
            TableRef::Subquery {
                query,
                alias,
                lateral,
            } => {
                let lateral = if *lateral { "LATERAL " } else { "" };
                let mut sql = format!("{lateral}({})", self.query(query)?);
                if let Some(alias) = alias {
                    sql.push_str(&self.alias_sql(alias));
                }
                Ok(sql)
            }
            TableRef::Values { rows, alias } => {
                let values = format!("VALUES {}", self.values_rows(rows)?);
                match alias {
                    Some(alias) => Ok(format!("({values}){}", self.alias_sql(alias))),
                    None => Ok(values),
                }
            }
            TableRef::Join(join) => {
                let mut sql = format!("{} {}", join.kind.as_sql(), self.table_ref(&join.table)?);
                if let Some(on) = &join.on {
                    sql.push_str(&format!(" ON {}", self.node(on, TOP)?));
                }
                if !join.using.is_empty() {
                    let using = join
                        .using
                        .iter()
                        .map(|name| self.name(name))
                        .collect::<Result<Vec<_>>>()?
                        .join(", ");
                    sql.push_str(&format!(" USING ({using})"));
                }
                Ok(sql)
            }
        }
    }

    fn alias_sql(&self, alias: &crate::parsing::ast::TableAlias) -> String {
        let mut sql = format!(" AS {}", self.ident(&alias.name));
        if !alias.columns.is_empty() {
            sql.push_str(&format!(" ({})", self.ident_list(&alias.columns)));
        }
        sql
    }

    fn values_rows(&self, rows: &[Node]) -> Result<String> {
        Ok(rows
            .iter()
            .map(|row| match row {
                Node::List(_) => self.node(row, TOP),
                row => Ok(format!("({})", self.node(row, TOP)?)),
            })
            .collect::<Result<Vec<_>>>()?
            .join(", "))
    }

    pub(crate) fn order_items(&self, items: &[OrderItem]) -> Result<String> {
        Ok(items
            .iter()
            .map(|item| {
                let mut sql = self.node(&item.value, TOP)?;
                match item.direction {
                    Some(crate::parsing::ast::Direction::Asc) => sql.push_str(" ASC"),
                    Some(crate::parsing::ast::Direction::Desc) => sql.push_str(" DESC"),
                    None => {}
                }
                if let Some(nulls) = item.nulls {
                    sql.push(' ');
                    sql.push_str(nulls_sql(nulls));
                }
                Ok(sql)
            })
            .collect::<Result<Vec<_>>>()?
            .join(", "))
    }

    fn ident_list(&self, names: &[String]) -> String {
        names
            .iter()
            .map(|name| self.ident(name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn assignments(&self, assignments: &[crate::parsing::ast::Assignment]) -> Result<String> {
        Ok(assignments
            .iter()
            .map(|assignment| {
                Ok(format!(
                    "{} = {}",
                    self.name(&assignment.target)?,
                    self.node(&assignment.value, TOP)?
                ))
            })
            .collect::<Result<Vec<_>>>()?
            .join(", "))
    }

    fn insert(&self, insert: &crate::parsing::ast::Insert) -> Result<String> {
        let keyword = if insert.overwrite {
            "INSERT OVERWRITE"
        } else {
            "INSERT INTO"
        };
        let mut parts = vec![format!("{keyword} {}", self.name(&insert.table)?)];
        if !insert.columns.is_empty() {
            parts.push(format!("({})", self.ident_list(&insert.columns)));
        }
        match &insert.source {
            InsertSource::Values(rows) => {
                parts.push("VALUES".into());
                parts.push(
                    rows.iter()
                        .map(|row| Ok(format!("({})", self.node_list(row)?)))
                        .collect::<Result<Vec<_>>>()?
                        .join(", "),
                );
            }
            InsertSource::Keyed(rows) => {
                // Hand-built keyed rows render against the lexically sorted
                // union of all keys; missing cells are NULL.
                let mut columns: Vec<&str> = rows
                    .iter()
                    .flat_map(|row| row.iter().map(|(key, _)| key.as_str()))
                    .collect();
                columns.sort_unstable();
                columns.dedup();
                parts.push(format!(
                    "({})",
                    columns
                        .iter()
                        .map(|column| self.ident(column))
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
                parts.push("VALUES".into());
                parts.push(
                    rows.iter()
                        .map(|row| {
                            let cells = columns
                                .iter()
                                .map(|column| {
                                    match row.iter().find(|(key, _)| key == column) {
                                        Some((_, value)) => self.node(value, TOP),
                                        None => Ok("NULL".into()),
                                    }
                                })
                                .collect::<Result<Vec<_>>>()?;
                            Ok(format!("({})", cells.join(", ")))
                        })
                        .collect::<Result<Vec<_>>>()?
                        .join(", "),
                );
            }
            InsertSource::Query(query) => parts.push(self.query(query)?),
            InsertSource::Default => parts.push("DEFAULT VALUES".into()),
        }
        Ok(parts.join(" "))
    }

    fn create_table(&self, create: &crate::parsing::ast::CreateTable) -> Result<String> {
        let guard = if create.if_not_exists {
            "IF NOT EXISTS "
        } else {
            ""
        };
        let mut sql = format!("CREATE TABLE {}{}", guard, self.name(&create.name)?);
        if !create.columns.is_empty() || !create.constraints.is_empty() {
            let mut elements = create
                .columns
                .iter()
                .map(|column| self.column_def(column))
                .collect::<Result<Vec<_>>>()?;
            for constraint in &create.constraints {
                elements.push(self.constraint(constraint)?);
            }
            sql.push_str(&format!(" ({})", elements.join(", ")));
        }
        for option in &create.options {
            let name = match option.name.strip_prefix("default_") {
                Some(rest) => format!("DEFAULT {}", rest.to_uppercase()),
                None => option.name.to_uppercase(),
            };
            sql.push_str(&format!(" {name}={}", self.node(&option.value, TOP)?));
        }
        if let Some(query) = &create.query {
            sql.push_str(&format!(" AS {}", self.query(query)?));
        }
        Ok(sql)
    }

    fn column_def(&self, column: &ColumnDef) -> Result<String> {
        let mut sql = format!(
            "{} {}",
            self.ident(&column.name),
            self.datatype(&column.datatype)?
        );
        if column.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        match column.nullable {
            Some(false) => sql.push_str(" NOT NULL"),
            Some(true) => sql.push_str(" NULL"),
            None => {}
        }
        if column.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(default) = &column.default {
            sql.push_str(&format!(" DEFAULT {}", self.node(default, TOP)?));
        }
        if column.autoincrement {
            sql.push_str(" AUTO_INCREMENT");
        }
        Ok(sql)
    }

    fn constraint(&self, constraint: &TableConstraint) -> Result<String> {
        match constraint {
            TableConstraint::PrimaryKey(columns) => {
                Ok(format!("PRIMARY KEY ({})", self.ident_list(columns)))
            }
            TableConstraint::Unique(columns) => {
                Ok(format!("UNIQUE ({})", self.ident_list(columns)))
            }
            TableConstraint::ForeignKey {
                columns,
                table,
                ref_columns,
            } => {
                let mut sql = format!(
                    "FOREIGN KEY ({}) REFERENCES {}",
                    self.ident_list(columns),
                    self.name(table)?
                );
                if !ref_columns.is_empty() {
                    sql.push_str(&format!(" ({})", self.ident_list(ref_columns)));
                }
                Ok(sql)
            }
            TableConstraint::Check(condition) => {
                Ok(format!("CHECK ({})", self.node(condition, TOP)?))
            }
        }
    }

    fn routine(&self, keyword: &str, routine: &Routine) -> Result<String> {
        let params = routine
            .params
            .iter()
            .map(|param| {
                let mode = match param.mode {
                    Some(crate::parsing::ast::ParamMode::In) => "IN ",
                    Some(crate::parsing::ast::ParamMode::Out) => "OUT ",
                    Some(crate::parsing::ast::ParamMode::InOut) => "INOUT ",
                    None => "",
                };
                Ok(format!(
                    "{mode}{} {}",
                    self.ident(&param.name),
                    self.datatype(&param.datatype)?
                ))
            })
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let mut sql = format!(
            "CREATE {keyword} {} ({params})",
            self.name(&routine.name)?
        );
        if let Some(returns) = &routine.returns {
            sql.push_str(&format!(" RETURNS {}", self.datatype(returns)?));
        }
        sql.push(' ');
        sql.push_str(&self.format_statement(&routine.body)?);
        Ok(sql)
    }

    fn merge_clause(&self, clause: &MergeClause) -> Result<String> {
        match clause {
            MergeClause::MatchedUpdate { predicate, set } => {
                let mut sql = String::from("WHEN MATCHED");
                if let Some(predicate) = predicate {
                    sql.push_str(&format!(" AND {}", self.node(predicate, TOP)?));
                }
                sql.push_str(&format!(" THEN UPDATE SET {}", self.assignments(set)?));
                Ok(sql)
            }
            MergeClause::MatchedDelete { predicate } => {
                let mut sql = String::from("WHEN MATCHED");
                if let Some(predicate) = predicate {
                    sql.push_str(&format!(" AND {}", self.node(predicate, TOP)?));
                }
                sql.push_str(" THEN DELETE");
                Ok(sql)
            }
            MergeClause::NotMatchedInsert {
                predicate,
                columns,
                values,
            } => {
                let mut sql = String::from("WHEN NOT MATCHED");
                if let Some(predicate) = predicate {
                    sql.push_str(&format!(" AND {}", self.node(predicate, TOP)?));
                }
                sql.push_str(" THEN INSERT");
                if !columns.is_empty() {
                    sql.push_str(&format!(" ({})", self.ident_list(columns)));
                }
                sql.push_str(&format!(" VALUES ({})", self.node_list(values)?));
                Ok(sql)
            }
        }
    }

    fn statement_list(&self, statements: &[Statement]) -> Result<String> {
        Ok(statements
            .iter()
            .map(|statement| Ok(format!("{};", self.format_statement(statement)?)))
            .collect::<Result<Vec<_>>>()?
            .join(" "))
    }
}

/// The precedence of a node, for the parenthesization guard. Atoms and
/// function-shaped constructs never need parentheses; queries never reach
/// here because expression position always parenthesizes them.
pub(crate) fn node_precedence(node: &Node) -> Precedence {
    match node {
        Node::Call(call) => keywords::precedence(&call.name),
        Node::Case(_) => keywords::precedence("case"),
        _ => keywords::MAX_PRECEDENCE,
    }
}

/// The precedence of a query in set-operand position.
fn query_precedence(query: &Query) -> Precedence {
    if !query.order_by.is_empty()
        || query.limit.is_some()
        || query.offset.is_some()
        || query.fetch.is_some()
    {
        return keywords::ORDER_PRECEDENCE;
    }
    match query.body {
        QueryBody::SetOp { .. } => SET_OP_PRECEDENCE,
        _ => QUERY_PRECEDENCE,
    }
}

fn nulls_sql(nulls: NullsOrder) -> &'static str {
    match nulls {
        NullsOrder::First => "NULLS FIRST",
        NullsOrder::Last => "NULLS LAST",
    }
}

/// Renders a window frame from its signed offsets. Mirrors the parse-side
/// encoding: negative is preceding, positive is following, zero the current
/// row, absent unbounded. Both absent drops the clause entirely.
fn frame_sql(frame: &Frame) -> Option<String> {
    fn wordy(offset: i64) -> String {
        if offset < 0 {
            format!("{} PRECEDING", -offset)
        } else {
            format!("{offset} FOLLOWING")
        }
    }
    let body = match (frame.min, frame.max) {
        (None, None) => return None,
        (None, Some(0)) => "UNBOUNDED PRECEDING".to_string(),
        (None, Some(max)) => format!("BETWEEN UNBOUNDED PRECEDING AND {}", wordy(max)),
        (Some(0), None) => "UNBOUNDED FOLLOWING".to_string(),
        (Some(0), Some(0)) => "CURRENT ROW".to_string(),
        (Some(0), Some(max)) => wordy(max),
        (Some(min), None) => format!("BETWEEN {} AND UNBOUNDED FOLLOWING", wordy(min)),
        (Some(min), Some(0)) => wordy(min),
        (Some(min), Some(max)) => format!("BETWEEN {} AND {}", wordy(min), wordy(max)),
    };
    Some(format!("ROWS {body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Dialect, Grammar};
    use crate::parsing::ast::{Insert, InsertSource};
    use crate::parsing::Parser;

    fn roundtrip(sql: &str) -> String {
        let grammar = Grammar::get(Dialect::Generic, false).unwrap();
        let statement = Parser::parse(sql, &grammar).unwrap();
        Formatter::new(&FormatOptions::default())
            .format_statement(&statement)
            .unwrap()
    }

    #[test]
    fn precedence_needs_no_parentheses() {
        assert_eq!(roundtrip("SELECT a + b * c FROM t"), "SELECT a + b * c FROM t");
    }

    #[test]
    fn grouping_against_precedence_keeps_parentheses() {
        assert_eq!(
            roundtrip("SELECT (a + b) * c FROM t"),
            "SELECT (a + b) * c FROM t"
        );
    }

    #[test]
    fn left_associative_chain_stays_bare() {
        assert_eq!(roundtrip("SELECT a - b - c FROM t"), "SELECT a - b - c FROM t");
    }

    #[test]
    fn right_nested_subtraction_keeps_parentheses() {
        assert_eq!(
            roundtrip("SELECT a - (b - c) FROM t"),
            "SELECT a - (b - c) FROM t"
        );
    }

    #[test]
    fn string_quotes_are_doubled() {
        assert_eq!(roundtrip("SELECT 'it''s'"), "SELECT 'it''s'");
    }

    #[test]
    fn reserved_identifiers_are_quoted() {
        assert_eq!(
            roundtrip("SELECT \"select\" FROM t"),
            "SELECT \"select\" FROM t"
        );
    }

    #[test]
    fn window_frames_roundtrip() {
        assert_eq!(
            roundtrip("SELECT SUM(x) OVER (ROWS 3 PRECEDING) FROM t"),
            "SELECT SUM(x) OVER (ROWS 3 PRECEDING) FROM t"
        );
        assert_eq!(
            roundtrip("SELECT SUM(x) OVER (ROWS UNBOUNDED PRECEDING) FROM t"),
            "SELECT SUM(x) OVER (ROWS UNBOUNDED PRECEDING) FROM t"
        );
        assert_eq!(
            roundtrip("SELECT SUM(x) OVER (ROWS BETWEEN 2 PRECEDING AND 4 FOLLOWING) FROM t"),
            "SELECT SUM(x) OVER (ROWS BETWEEN 2 PRECEDING AND 4 FOLLOWING) FROM t"
        );
    }

    #[test]
    fn null_predicates() {
        assert_eq!(
            roundtrip("SELECT x FROM t WHERE y IS NOT NULL"),
            "SELECT x FROM t WHERE y IS NOT NULL"
        );
        assert_eq!(
            roundtrip("SELECT x FROM t WHERE EXISTS (SELECT 1 FROM u)"),
            "SELECT x FROM t WHERE EXISTS (SELECT 1 FROM u)"
        );
    }

    #[test]
    fn keyed_rows_render_sorted_column_matrix() {
        let insert = Insert {
            table: Name(vec!["t".into()]),
            columns: Vec::new(),
            overwrite: false,
            source: InsertSource::Keyed(vec![
                vec![("b".into(), Node::Integer(1))],
                vec![("a".into(), Node::Integer(2)), ("b".into(), Node::Integer(3))],
            ]),
        };
        let sql = Formatter::new(&FormatOptions::default())
            .format_statement(&Statement::Insert(Box::new(insert)))
            .unwrap();
        assert_eq!(sql, "INSERT INTO t (a, b) VALUES (NULL, 1), (2, 3)");
    }
}
