//! The canonical, dialect-neutral syntax tree.
//!
//! A statement is the root of the tree; expressions nest arbitrarily below
//! it. Trees are immutable value data: the scrubber builds them fresh per
//! statement and the formatter consumes them without mutation.

pub mod expressions;
pub mod query;
pub mod statements;

pub use expressions::{Aggregate, Args, Call, Case, Name, Node, StringLiteral, Windowed};
pub use query::{
    Cte, Direction, DistinctClause, Frame, Join, JoinKind, NullsOrder, OrderItem, Query,
    QueryBody, Select, SelectItem, SetOp, TableAlias, TableRef, TableSample, Window,
};
pub use statements::{
    Assignment, Block, ColumnDef, CreateTable, CreateView, DataType, Declare, DeclareHandler,
    Delete, HandlerAction, IfStatement, Insert, InsertSource, Merge, MergeClause, ObjectKind,
    Param, ParamMode, Routine, Statement, TableConstraint, TableOption, Update,
};
