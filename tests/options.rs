//! Per-call parse options: null substitution, call shaping, renames, and
//! the legacy star atom.

use sqltree::parsing::ast::{Args, Node, QueryBody, Statement};
use sqltree::{format, parse_with, CallStyle, Dialect, ParseOptions, Parsed};

fn parse_one(sql: &str, options: &ParseOptions) -> Statement {
    parse_with(sql, Dialect::Generic, options)
        .unwrap()
        .one()
        .unwrap()
}

fn first_item(statement: &Statement) -> &Node {
    let Statement::Query(query) = statement else {
        panic!("expected query");
    };
    let QueryBody::Select(select) = &query.body else {
        panic!("expected select");
    };
    &select.items[0].value
}

#[test]
fn null_substitution() {
    let options = ParseOptions {
        null: Some(Node::Integer(0)),
        ..ParseOptions::default()
    };
    let statement = parse_one("SELECT NULL", &options);
    assert_eq!(first_item(&statement), &Node::Integer(0));
}

#[test]
fn simple_call_style_unwraps_single_arguments() {
    let statement = parse_one("SELECT ABS(x) FROM t", &ParseOptions::default());
    let Node::Call(call) = first_item(&statement) else {
        panic!("expected call");
    };
    assert!(matches!(call.args, Args::One(_)));
}

#[test]
fn normal_call_style_keeps_argument_lists() {
    let options = ParseOptions {
        calls: CallStyle::Normal,
        ..ParseOptions::default()
    };
    let statement = parse_one("SELECT ABS(x) FROM t", &options);
    let Node::Call(call) = first_item(&statement) else {
        panic!("expected call");
    };
    let Args::Many(items) = &call.args else {
        panic!("expected argument list");
    };
    assert_eq!(items.len(), 1);
}

#[test]
fn fmap_renames_operators() {
    let options = ParseOptions {
        fmap: [("add".to_string(), "plus".to_string())].into(),
        ..ParseOptions::default()
    };
    let statement = parse_one("SELECT a + b FROM t", &options);
    assert_eq!(format(&statement).unwrap(), "SELECT PLUS(a, b) FROM t");
}

#[test]
fn legacy_star_atom() {
    let options = ParseOptions {
        all_columns: true,
        ..ParseOptions::default()
    };
    let statement = parse_one("SELECT * FROM t", &options);
    assert_eq!(first_item(&statement), &Node::All);

    let statement = parse_one("SELECT * FROM t", &ParseOptions::default());
    assert!(matches!(
        first_item(&statement),
        Node::AllColumns { from: None, .. }
    ));
}

#[test]
fn single_element_lists_collapse() {
    // `WHERE a IN (5)` carries a one-element list that scrubbing collapses.
    let statement = parse_one("SELECT x FROM t WHERE a IN (5)", &ParseOptions::default());
    let Statement::Query(query) = &statement else {
        panic!("expected query");
    };
    let QueryBody::Select(select) = &query.body else {
        panic!("expected select");
    };
    let Some(Node::Call(call)) = &select.r#where else {
        panic!("expected call");
    };
    assert_eq!(call.name, "in");
    let Args::Many(operands) = &call.args else {
        panic!("expected operands");
    };
    assert_eq!(operands[1], Node::Integer(5));
}
