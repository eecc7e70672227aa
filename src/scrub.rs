//! Post-parse normalization of the canonical tree.
//!
//! Scrubbing happens once per parsed statement, driven entirely by
//! per-call [`ScrubOptions`] so concurrent callers with different settings
//! never observe each other. It collapses single-element lists, shapes call
//! arguments to the requested style, substitutes the caller's null
//! representation, and applies function-name renames.

use crate::parsing::ast::{
    Aggregate, Args, Call, Case, Cte, InsertSource, Join, MergeClause, Node, OrderItem, Query,
    QueryBody, SelectItem, Statement, TableRef, Window, Windowed,
};
use std::collections::HashMap;

/// How operator arguments are shaped in the output tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallStyle {
    /// One argument stays a single node; the zero-argument marker stays.
    #[default]
    Simple,
    /// Arguments are always an explicit list.
    Normal,
}

/// Per-call scrubbing configuration.
#[derive(Debug, Clone, Default)]
pub struct ScrubOptions {
    /// What a parsed SQL NULL becomes. Defaults to the null marker itself.
    pub null: Option<Node>,
    /// Argument shaping style.
    pub calls: CallStyle,
    /// Renames applied to canonical call names (keys lowercase).
    pub fmap: HashMap<String, String>,
}

/// Applies the scrub pass to a whole statement.
pub fn scrub_statement(statement: Statement, options: &ScrubOptions) -> Statement {
    Scrubber { options }.statement(statement)
}

/// Applies the scrub pass to a single expression.
pub fn scrub_node(node: Node, options: &ScrubOptions) -> Node {
    Scrubber { options }.node(node)
}

struct Scrubber<'a> {
    options: &'a ScrubOptions,
}

impl Scrubber<'_> {
    fn statement(&self, statement: Statement) -> Statement {
        match statement {
            Statement::Query(query) => Statement::Query(Box::new(self.query(*query))),
            Statement::Insert(mut insert) => {
                insert.source = match insert.source {
                    InsertSource::Values(rows) => InsertSource::Values(
                        rows.into_iter()
                            .map(|row| row.into_iter().map(|v| self.node(v)).collect())
                            .collect(),
                    ),
                    InsertSource::Keyed(rows) => InsertSource::Keyed(
                        rows.into_iter()
                            .map(|row| row.into_iter().map(|(k, v)| (k, self.node(v))).collect())
                            .collect(),
                    ),
                    InsertSource::Query(query) => {
                        InsertSource::Query(Box::new(self.query(*query)))
                    }
                    source => source,
                };
                Statement::Insert(insert)
            }
            Statement::Update(mut update) => {
                update.set = std::mem::take(&mut update.set)
                    .into_iter()
                    .map(|mut assignment| {
                        assignment.value = self.node(assignment.value);
                        assignment
                    })
                    .collect();
                update.r#where = update.r#where.take().map(|w| self.node(w));
                Statement::Update(update)
            }
            Statement::Delete(mut delete) => {
                delete.r#where = delete.r#where.map(|w| self.node(w));
                Statement::Delete(delete)
            }
            Statement::Merge(mut merge) => {
                merge.into = self.table_ref(merge.into);
                merge.using = self.table_ref(merge.using);
                merge.on = self.node(merge.on);
                merge.clauses = merge
                    .clauses
                    .into_iter()
                    .map(|clause| self.merge_clause(clause))
                    .collect();
                Statement::Merge(merge)
            }
            Statement::CreateTable(mut create) => {
                for column in &mut create.columns {
                    column.default = column.default.take().map(|d| self.node(d));
                }
                create.query = create.query.map(|q| Box::new(self.query(*q)));
                Statement::CreateTable(create)
            }
            Statement::CreateView(mut view) => {
                view.query = Box::new(self.query(*view.query));
                Statement::CreateView(view)
            }
            Statement::CreateProcedure(mut routine) => {
                routine.body = self.statement(routine.body);
                Statement::CreateProcedure(routine)
            }
            Statement::CreateFunction(mut routine) => {
                routine.body = self.statement(routine.body);
                Statement::CreateFunction(routine)
            }
            Statement::Block(mut block) => {
                block.body = block
                    .body
                    .into_iter()
                    .map(|s| self.statement(s))
                    .collect();
                Statement::Block(block)
            }
            Statement::Declare(mut declare) => {
                declare.default = declare.default.map(|d| self.node(d));
                Statement::Declare(declare)
            }
            Statement::DeclareHandler(mut handler) => {
                handler.body = self.statement(handler.body);
                Statement::DeclareHandler(handler)
            }
            Statement::If(mut if_statement) => {
                if_statement.branches = if_statement
                    .branches
                    .into_iter()
                    .map(|(condition, body)| {
                        (
                            self.node(condition),
                            body.into_iter().map(|s| self.statement(s)).collect(),
                        )
                    })
                    .collect();
                if_statement.else_branch = if_statement
                    .else_branch
                    .map(|body| body.into_iter().map(|s| self.statement(s)).collect());
                Statement::If(if_statement)
            }
            Statement::Return(value) => Statement::Return(value.map(|v| self.node(v))),
            Statement::Set(assignments) => Statement::Set(
                assignments
                    .into_iter()
                    .map(|mut assignment| {
                        assignment.value = self.node(assignment.value);
                        assignment
                    })
                    .collect(),
            ),
            Statement::Explain(inner) => Statement::Explain(Box::new(self.statement(*inner))),
            statement => statement,
        }
    }

    fn node(&self, node: Node) -> Node {
        match node {
            Node::Null => self.options.null.clone().unwrap_or(Node::Null),
            Node::List(items) => {
                let mut items: Vec<Node> = items.into_iter().map(|n| self.node(n)).collect();
                if items.len() == 1 {
                    return items.remove(0);
                }
                Node::List(items)
            }
            Node::Call(call) => self.call(*call),
            Node::Windowed(windowed) => {
                let Windowed {
                    value,
                    filter,
                    over,
                    within,
                } = *windowed;
                Node::Windowed(Box::new(Windowed {
                    value: self.node(value),
                    filter: filter.map(|f| self.node(f)),
                    over: over.map(|w| self.window(w)),
                    within: within.into_iter().map(|i| self.order_item(i)).collect(),
                }))
            }
            Node::Case(case) => {
                let Case {
                    operand,
                    when_clauses,
                    else_clause,
                } = *case;
                Node::Case(Box::new(Case {
                    operand: operand.map(|o| self.node(o)),
                    when_clauses: when_clauses
                        .into_iter()
                        .map(|(when, then)| (self.node(when), self.node(then)))
                        .collect(),
                    else_clause: else_clause.map(|e| self.node(e)),
                }))
            }
            Node::Query(query) => Node::Query(Box::new(self.query(*query))),
            Node::Aggregate(aggregate) => {
                let Aggregate {
                    name,
                    args,
                    distinct,
                    order_by,
                    limit,
                    nulls,
                    separator,
                } = *aggregate;
                Node::Aggregate(Box::new(Aggregate {
                    name: self.rename(name),
                    args: self.args(args),
                    distinct,
                    order_by: order_by.into_iter().map(|i| self.order_item(i)).collect(),
                    limit: limit.map(|l| self.node(l)),
                    nulls,
                    separator: separator.map(|s| self.node(s)),
                }))
            }
            Node::AllColumns { from, except } => Node::AllColumns {
                from,
                except: except.into_iter().map(|n| self.node(n)).collect(),
            },
            node => node,
        }
    }

    fn call(&self, call: Call) -> Node {
        let Call { name, args, kwargs } = call;
        Node::Call(Box::new(Call {
            name: self.rename(name),
            args: self.args(args),
            kwargs: kwargs
                .into_iter()
                .map(|(key, value)| (key, self.node(value)))
                .collect(),
        }))
    }

    /// Shapes call arguments to the configured style after scrubbing each.
    fn args(&self, args: Args) -> Args {
        let args = match args {
            Args::None => Args::None,
            Args::One(node) => Args::One(self.node(node)),
            Args::Many(items) => Args::Many(items.into_iter().map(|n| self.node(n)).collect()),
            Args::Named(pairs) => Args::Named(
                pairs
                    .into_iter()
                    .map(|(key, value)| (key, self.node(value)))
                    .collect(),
            ),
        };
        match (self.options.calls, args) {
            (CallStyle::Simple, Args::Many(mut items)) if items.len() == 1 => {
                Args::One(items.remove(0))
            }
            (CallStyle::Normal, Args::One(node)) => Args::Many(vec![node]),
            (_, args) => args,
        }
    }

    fn rename(&self, name: String) -> String {
        match self.options.fmap.get(&name) {
            Some(renamed) => renamed.clone(),
            None => name,
        }
    }

    fn query(&self, query: Query) -> Query {
        let Query {
            with,
            body,
            order_by,
            limit,
            offset,
            fetch,
        } = query;
        Query {
            with: with
                .into_iter()
                .map(|cte| Cte {
                    name: cte.name,
                    columns: cte.columns,
                    query: self.query(cte.query),
                })
                .collect(),
            body: self.query_body(body),
            order_by: order_by.into_iter().map(|i| self.order_item(i)).collect(),
            limit: limit.map(|l| self.node(l)),
            offset: offset.map(|o| self.node(o)),
            fetch: fetch.map(|f| self.node(f)),
        }
    }

    fn query_body(&self, body: QueryBody) -> QueryBody {
        match body {
            QueryBody::Select(mut select) => {
                select.top = select.top.map(|t| self.node(t));
                select.items = select
                    .items
                    .into_iter()
                    .map(|item| SelectItem {
                        value: self.node(item.value),
                        alias: item.alias,
                    })
                    .collect();
                select.from = select
                    .from
                    .into_iter()
                    .map(|table| self.table_ref(table))
                    .collect();
                select.r#where = select.r#where.map(|w| self.node(w));
                select.group_by = select.group_by.into_iter().map(|g| self.node(g)).collect();
                select.having = select.having.map(|h| self.node(h));
                QueryBody::Select(select)
            }
            QueryBody::Values(rows) => {
                // Rows keep their list shape even when single-column.
                QueryBody::Values(
                    rows.into_iter()
                        .map(|row| match row {
                            Node::List(items) => {
                                Node::List(items.into_iter().map(|n| self.node(n)).collect())
                            }
                            row => self.node(row),
                        })
                        .collect(),
                )
            }
            QueryBody::SetOp { op, parts } => QueryBody::SetOp {
                op,
                parts: parts.into_iter().map(|part| self.query(part)).collect(),
            },
        }
    }

    fn table_ref(&self, table: TableRef) -> TableRef {
        match table {
            TableRef::Table {
                name,
                alias,
                sample,
            } => TableRef::Table {
                name,
                alias,
                sample,
            },
            TableRef::Subquery {
                query,
                alias,
                lateral,
            } => TableRef::Subquery {
                query: Box::new(self.query(*query)),
                alias,
                lateral,
            },
            TableRef::Values { rows, alias } => TableRef::Values {
                rows: rows
                    .into_iter()
                    .map(|row| match row {
                        Node::List(items) => {
                            Node::List(items.into_iter().map(|n| self.node(n)).collect())
                        }
                        row => self.node(row),
                    })
                    .collect(),
                alias,
            },
            TableRef::Join(join) => {
                let Join {
                    kind,
                    table,
                    on,
                    using,
                } = join;
                TableRef::Join(Join {
                    kind,
                    table: Box::new(self.table_ref(*table)),
                    on: on.map(|o| self.node(o)),
                    using,
                })
            }
        }
    }

    fn merge_clause(&self, clause: MergeClause) -> MergeClause {
        match clause {
            MergeClause::MatchedUpdate { predicate, set } => MergeClause::MatchedUpdate {
                predicate: predicate.map(|p| self.node(p)),
                set: set
                    .into_iter()
                    .map(|mut assignment| {
                        assignment.value = self.node(assignment.value);
                        assignment
                    })
                    .collect(),
            },
            MergeClause::MatchedDelete { predicate } => MergeClause::MatchedDelete {
                predicate: predicate.map(|p| self.node(p)),
            },
            MergeClause::NotMatchedInsert {
                predicate,
                columns,
                values,
            } => MergeClause::NotMatchedInsert {
                predicate: predicate.map(|p| self.node(p)),
                columns,
                values: values.into_iter().map(|v| self.node(v)).collect(),
            },
        }
    }

    fn window(&self, window: Window) -> Window {
        Window {
            partition_by: window
                .partition_by
                .into_iter()
                .map(|p| self.node(p))
                .collect(),
            order_by: window
                .order_by
                .into_iter()
                .map(|i| self.order_item(i))
                .collect(),
            frame: window.frame,
        }
    }

    fn order_item(&self, item: OrderItem) -> OrderItem {
        OrderItem {
            value: self.node(item.value),
            direction: item.direction,
            nulls: item.nulls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_element_list_collapses() {
        let options = ScrubOptions::default();
        let node = Node::List(vec![Node::Integer(7)]);
        assert_eq!(scrub_node(node, &options), Node::Integer(7));
    }

    #[test]
    fn null_substitution() {
        let options = ScrubOptions {
            null: Some(Node::literal("<null>")),
            ..Default::default()
        };
        let node = Node::binary("eq", Node::name("a"), Node::Null);
        assert_eq!(
            scrub_node(node, &options),
            Node::call("eq", [Node::name("a"), Node::literal("<null>")]),
        );
    }

    #[test]
    fn simple_style_collapses_single_argument() {
        let options = ScrubOptions::default();
        let node = Node::call("abs", [Node::Integer(-3)]);
        let Node::Call(call) = scrub_node(node, &options) else {
            panic!("expected call");
        };
        assert_eq!(call.args, Args::One(Node::Integer(-3)));
    }

    #[test]
    fn normal_style_keeps_lists() {
        let options = ScrubOptions {
            calls: CallStyle::Normal,
            ..Default::default()
        };
        let node = Node::call("abs", [Node::Integer(-3)]);
        let Node::Call(call) = scrub_node(node, &options) else {
            panic!("expected call");
        };
        assert_eq!(call.args, Args::Many(vec![Node::Integer(-3)]));
    }

    #[test]
    fn fmap_renames_calls() {
        let options = ScrubOptions {
            fmap: HashMap::from([("nvl".to_string(), "coalesce".to_string())]),
            ..Default::default()
        };
        let node = Node::call("nvl", [Node::name("a"), Node::Integer(0)]);
        let Node::Call(call) = scrub_node(node, &options) else {
            panic!("expected call");
        };
        assert_eq!(call.name, "coalesce");
    }
}
