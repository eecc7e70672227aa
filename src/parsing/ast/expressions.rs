//! Expression nodes of the canonical tree.

use super::query::{NullsOrder, OrderItem, Query, Window};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A canonical expression, e.g. `a + 7 > b`. Can be nested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// The null marker: a dedicated zero-argument node meaning "no value".
    /// What parsed NULLs scrub into is a per-call option; this is the default.
    Null,
    Boolean(bool),
    Integer(i64),
    /// Non-integer numeric literal, kept exact so formatting round-trips.
    Number(Decimal),
    /// A string literal, optionally tagged with a character-encoding prefix.
    Literal(StringLiteral),
    /// A dotted identifier path (order-significant, non-empty).
    Name(Name),
    /// Bare `*` (legacy `all_columns` representation).
    All,
    /// `*` or `tbl.*`, optionally with an `EXCEPT (...)` list.
    AllColumns {
        from: Option<Name>,
        except: Vec<Node>,
    },
    /// A raw sequence of expressions. Single-element sequences collapse to
    /// the element during scrubbing.
    List(Vec<Node>),
    /// An operator or function call.
    Call(Box<Call>),
    /// A call decorated with window metadata (FILTER / OVER / WITHIN GROUP).
    Windowed(Box<Windowed>),
    /// CASE [operand] WHEN .. THEN .. [ELSE ..] END
    Case(Box<Case>),
    /// A subquery.
    Query(Box<Query>),
    /// An aggregate call wrapped with ordering metadata, e.g.
    /// `COUNT(DISTINCT x)` or `GROUP_CONCAT(a ORDER BY b SEPARATOR ', ')`.
    /// Distinguished from a full query at parse time.
    Aggregate(Box<Aggregate>),
}

/// A string literal with an optional encoding tag (`N'..'`, `X'..'`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringLiteral {
    pub value: String,
    pub encoding: Option<String>,
}

/// A dotted identifier path. Must be non-empty; formatting an empty path is
/// a shape error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name(pub Vec<String>);

impl Name {
    pub fn single(segment: impl Into<String>) -> Name {
        Name(vec![segment.into()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

/// Arguments of an operator node: a single child, an ordered list, or named
/// arguments. `None` is the explicit zero-argument marker (`NOW()`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Args {
    None,
    One(Node),
    Many(Vec<Node>),
    Named(Vec<(String, Node)>),
}

impl Args {
    pub fn is_empty(&self) -> bool {
        match self {
            Args::None => true,
            Args::One(_) => false,
            Args::Many(items) => items.is_empty(),
            Args::Named(pairs) => pairs.is_empty(),
        }
    }

    /// Positional arguments as a slice-like vec, for handlers that expect
    /// `[lhs, rhs]` and similar fixed shapes.
    pub fn positional(&self) -> Vec<&Node> {
        match self {
            Args::None | Args::Named(_) => Vec::new(),
            Args::One(node) => vec![node],
            Args::Many(items) => items.iter().collect(),
        }
    }
}

/// An operator/function node: the canonical name plus its arguments. Named
/// arguments beyond the positional ones live in `kwargs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub name: String,
    pub args: Args,
    pub kwargs: Vec<(String, Node)>,
}

impl Call {
    pub fn new(name: impl Into<String>, args: Args) -> Call {
        Call {
            name: name.into(),
            args,
            kwargs: Vec::new(),
        }
    }

    pub fn kwarg(&self, key: &str) -> Option<&Node> {
        self.kwargs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

/// A call with window-function metadata attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Windowed {
    pub value: Node,
    /// FILTER (WHERE ...)
    pub filter: Option<Node>,
    /// OVER (...)
    pub over: Option<Window>,
    /// WITHIN GROUP (ORDER BY ...)
    pub within: Vec<OrderItem>,
}

/// CASE expression. `operand` is present for the simple form
/// (`CASE x WHEN ...`), absent for the searched form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub operand: Option<Node>,
    pub when_clauses: Vec<(Node, Node)>,
    pub else_clause: Option<Node>,
}

/// An aggregate-style call with ordering metadata that is not a full query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub name: String,
    pub args: Args,
    pub distinct: bool,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<Node>,
    pub nulls: Option<NullsOrder>,
    /// GROUP_CONCAT(... SEPARATOR ...)
    pub separator: Option<Node>,
}

impl Node {
    /// A single-segment identifier reference.
    pub fn name(segment: impl Into<String>) -> Node {
        Node::Name(Name::single(segment))
    }

    /// A dotted identifier reference.
    pub fn path<I, S>(segments: I) -> Node
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Node::Name(Name(segments.into_iter().map(Into::into).collect()))
    }

    /// An untagged string literal.
    pub fn literal(value: impl Into<String>) -> Node {
        Node::Literal(StringLiteral {
            value: value.into(),
            encoding: None,
        })
    }

    /// An operator node with positional arguments.
    pub fn call<I>(name: impl Into<String>, args: I) -> Node
    where
        I: IntoIterator<Item = Node>,
    {
        Node::Call(Box::new(Call::new(name, Args::Many(args.into_iter().collect()))))
    }

    /// A binary operator node.
    pub fn binary(op: impl Into<String>, lhs: Node, rhs: Node) -> Node {
        Node::call(op, [lhs, rhs])
    }

    /// A unary operator node.
    pub fn unary(op: impl Into<String>, operand: Node) -> Node {
        Node::Call(Box::new(Call::new(op, Args::One(operand))))
    }

    /// Returns true for nodes the precedence model treats as atomic.
    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            Node::Null
                | Node::Boolean(_)
                | Node::Integer(_)
                | Node::Number(_)
                | Node::Literal(_)
                | Node::Name(_)
                | Node::All
                | Node::AllColumns { .. }
        )
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Node {
        Node::Integer(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Node {
        Node::Boolean(value)
    }
}

impl From<Call> for Node {
    fn from(call: Call) -> Node {
        Node::Call(Box::new(call))
    }
}

impl From<Query> for Node {
    fn from(query: Query) -> Node {
        Node::Query(Box::new(query))
    }
}
