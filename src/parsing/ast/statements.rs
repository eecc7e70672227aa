//! Statement nodes: DML, DDL, session control, and procedural constructs.

use super::expressions::{Name, Node};
use super::query::{Query, TableRef};
use serde::{Deserialize, Serialize};

/// The root of one canonical tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    Query(Box<Query>),
    Insert(Box<Insert>),
    Update(Box<Update>),
    Delete(Box<Delete>),
    Merge(Box<Merge>),

    CreateTable(Box<CreateTable>),
    CreateView(Box<CreateView>),
    CreateSchema {
        name: Name,
        if_not_exists: bool,
    },
    Drop {
        kind: ObjectKind,
        names: Vec<Name>,
        if_exists: bool,
    },

    CreateProcedure(Box<Routine>),
    CreateFunction(Box<Routine>),
    Block(Block),
    Declare(Declare),
    DeclareHandler(Box<DeclareHandler>),
    If(Box<IfStatement>),
    Leave(String),
    Return(Option<Node>),

    Set(Vec<Assignment>),
    StartTransaction,
    Commit,
    Rollback,
    Explain(Box<Statement>),
    Describe(Name),
}

/// `target = value` in SET and UPDATE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub target: Name,
    pub value: Node,
}

/// Source of rows for INSERT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertSource {
    /// VALUES (..), (..): each row an ordered list of expressions.
    Values(Vec<Vec<Node>>),
    /// Rows keyed by column name (hand-built trees); the formatter emits a
    /// lexically sorted column list and one literal row per entry.
    Keyed(Vec<Vec<(String, Node)>>),
    /// INSERT ... SELECT
    Query(Box<Query>),
    /// DEFAULT VALUES
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insert {
    pub table: Name,
    pub columns: Vec<String>,
    /// INSERT OVERWRITE instead of INSERT INTO.
    pub overwrite: bool,
    pub source: InsertSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub table: Name,
    pub set: Vec<Assignment>,
    pub r#where: Option<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delete {
    pub table: Name,
    pub r#where: Option<Node>,
}

/// MERGE INTO target USING source ON condition WHEN ... clauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merge {
    pub into: TableRef,
    pub using: TableRef,
    pub on: Node,
    pub clauses: Vec<MergeClause>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeClause {
    MatchedUpdate {
        predicate: Option<Node>,
        set: Vec<Assignment>,
    },
    MatchedDelete {
        predicate: Option<Node>,
    },
    NotMatchedInsert {
        predicate: Option<Node>,
        columns: Vec<String>,
        values: Vec<Node>,
    },
}

/// Object kinds for DROP and DESCRIBE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Table,
    View,
    Schema,
    Index,
}

impl ObjectKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ObjectKind::Table => "TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::Schema => "SCHEMA",
            ObjectKind::Index => "INDEX",
        }
    }
}

/// A SQL data type with optional parameters, e.g. `DECIMAL(10, 2)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataType {
    pub name: String,
    pub args: Vec<Node>,
}

impl DataType {
    pub fn plain(name: impl Into<String>) -> DataType {
        DataType {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

/// A column definition in CREATE TABLE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub datatype: DataType,
    pub primary_key: bool,
    /// None = unspecified, Some(false) = NOT NULL, Some(true) = NULL.
    pub nullable: Option<bool>,
    pub default: Option<Node>,
    pub unique: bool,
    pub autoincrement: bool,
}

/// A table-level constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableConstraint {
    PrimaryKey(Vec<String>),
    Unique(Vec<String>),
    ForeignKey {
        columns: Vec<String>,
        table: Name,
        ref_columns: Vec<String>,
    },
    Check(Node),
}

/// A trailing table option, e.g. `ENGINE=InnoDB` or `DEFAULT CHARSET=utf8`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOption {
    pub name: String,
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTable {
    pub name: Name,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
    pub options: Vec<TableOption>,
    /// CREATE TABLE ... AS SELECT
    pub query: Option<Box<Query>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateView {
    pub name: Name,
    pub or_replace: bool,
    pub query: Box<Query>,
}

/// Parameter mode for stored routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamMode {
    In,
    Out,
    InOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub mode: Option<ParamMode>,
    pub name: String,
    pub datatype: DataType,
}

/// A stored procedure or function definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    pub name: Name,
    pub params: Vec<Param>,
    /// RETURNS type; functions only.
    pub returns: Option<DataType>,
    pub body: Statement,
}

/// A (possibly labeled) BEGIN ... END block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub label: Option<String>,
    pub body: Vec<Statement>,
}

/// DECLARE name, ... type [DEFAULT expr]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declare {
    pub names: Vec<String>,
    pub datatype: DataType,
    pub default: Option<Node>,
}

/// CONTINUE / EXIT for DECLARE ... HANDLER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandlerAction {
    Continue,
    Exit,
}

/// DECLARE action HANDLER FOR condition body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclareHandler {
    pub action: HandlerAction,
    /// The condition text, e.g. `NOT FOUND` or `SQLEXCEPTION`.
    pub condition: String,
    pub body: Statement,
}

/// IF ... THEN ... [ELSEIF ... THEN ...] [ELSE ...] END IF
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfStatement {
    pub branches: Vec<(Node, Vec<Statement>)>,
    pub else_branch: Option<Vec<Statement>>,
}
