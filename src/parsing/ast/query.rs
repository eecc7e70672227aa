//! Query structure: clauses, sources, joins, and window specifications.

use super::expressions::Node;
use serde::{Deserialize, Serialize};

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Asc,
    Desc,
}

/// NULLS FIRST / NULLS LAST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullsOrder {
    First,
    Last,
}

/// One ORDER BY / PARTITION BY element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub value: Node,
    pub direction: Option<Direction>,
    pub nulls: Option<NullsOrder>,
}

impl OrderItem {
    pub fn plain(value: Node) -> OrderItem {
        OrderItem {
            value,
            direction: None,
            nulls: None,
        }
    }
}

/// DISTINCT clause variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistinctClause {
    None,
    /// SELECT DISTINCT
    All,
    /// SELECT DISTINCT ON (expr, ...)
    On(Vec<Node>),
}

/// One selected expression with an optional alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectItem {
    pub value: Node,
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn plain(value: Node) -> SelectItem {
        SelectItem { value, alias: None }
    }
}

/// An alias with optional column renames: `AS t (a, b)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableAlias {
    pub name: String,
    pub columns: Vec<String>,
}

impl TableAlias {
    pub fn named(name: impl Into<String>) -> TableAlias {
        TableAlias {
            name: name.into(),
            columns: Vec::new(),
        }
    }
}

/// TABLESAMPLE metadata on a table reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSample {
    pub method: Option<String>,
    pub rows: Option<Node>,
    pub percent: Option<Node>,
}

/// Join types, a closed enum over the join-keyword set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Plain,
    Cross,
    Left,
    LeftOuter,
    Right,
    RightOuter,
    Full,
    FullOuter,
    Natural,
    Straight,
}

impl JoinKind {
    /// The SQL text of the join keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Plain => "JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Cross => "CROSS JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::RightOuter => "RIGHT OUTER JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::FullOuter => "FULL OUTER JOIN",
            JoinKind::Natural => "NATURAL JOIN",
            JoinKind::Straight => "STRAIGHT_JOIN",
        }
    }
}

/// A FROM item. Joins are flat: each joined table appears as its own item
/// following the table it joins onto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableRef {
    Table {
        name: super::Name,
        alias: Option<TableAlias>,
        sample: Option<TableSample>,
    },
    Subquery {
        query: Box<Query>,
        alias: Option<TableAlias>,
        lateral: bool,
    },
    /// A VALUES literal table. Each row is a `Node::List`.
    Values {
        rows: Vec<Node>,
        alias: Option<TableAlias>,
    },
    Join(Join),
}

/// A join onto the preceding FROM item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub table: Box<TableRef>,
    pub on: Option<Node>,
    pub using: Vec<super::Name>,
}

/// OVER (...) window specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub partition_by: Vec<Node>,
    pub order_by: Vec<OrderItem>,
    pub frame: Option<Frame>,
}

/// A window frame as a pair of offsets relative to the current row:
/// negative = preceding, positive = following, 0 = current row, `None` =
/// unbounded on that side (both `None` means no frame clause at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// Set operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetOp {
    Union,
    UnionAll,
    Intersect,
    Except,
    Minus,
}

impl SetOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SetOp::Union => "UNION",
            SetOp::UnionAll => "UNION ALL",
            SetOp::Intersect => "INTERSECT",
            SetOp::Except => "EXCEPT",
            SetOp::Minus => "MINUS",
        }
    }

    /// The canonical operator name, for the shared precedence table.
    pub fn canonical(&self) -> &'static str {
        match self {
            SetOp::Union => "union",
            SetOp::UnionAll => "union_all",
            SetOp::Intersect => "intersect",
            SetOp::Except => "except",
            SetOp::Minus => "minus",
        }
    }
}

/// A common table expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cte {
    pub name: String,
    pub columns: Vec<String>,
    pub query: Query,
}

/// The body of a query: a SELECT, a VALUES table, or a set operation over
/// sub-queries (n-ary, left-to-right).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryBody {
    Select(Select),
    /// Each row is a `Node::List`.
    Values(Vec<Node>),
    SetOp { op: SetOp, parts: Vec<Query> },
}

/// SELECT and its unordered clauses, emitted in this fixed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Select {
    pub distinct: DistinctClause,
    /// SQL-Server style SELECT TOP (n).
    pub top: Option<Node>,
    pub items: Vec<SelectItem>,
    pub from: Vec<TableRef>,
    pub r#where: Option<Node>,
    pub group_by: Vec<Node>,
    pub having: Option<Node>,
}

impl Select {
    pub fn new() -> Select {
        Select {
            distinct: DistinctClause::None,
            top: None,
            items: Vec::new(),
            from: Vec::new(),
            r#where: None,
            group_by: Vec::new(),
            having: None,
        }
    }
}

impl Default for Select {
    fn default() -> Select {
        Select::new()
    }
}

/// A full query: WITH, a body, then the ordered clauses in fixed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub with: Vec<Cte>,
    pub body: QueryBody,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<Node>,
    pub offset: Option<Node>,
    pub fetch: Option<Node>,
}

impl Query {
    pub fn from_body(body: QueryBody) -> Query {
        Query {
            with: Vec::new(),
            body,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            fetch: None,
        }
    }

    pub fn from_select(select: Select) -> Query {
        Query::from_body(QueryBody::Select(select))
    }
}
