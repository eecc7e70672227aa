//! Dialect lexical differences: quoting, brackets, star expansion.

use sqltree::parsing::ast::{Node, QueryBody, Statement};
use sqltree::{
    format, format_with, parse, parse_bigquery, parse_mysql, parse_sqlserver, FormatOptions,
    Parsed,
};

fn one(parsed: sqltree::Result<Parsed>) -> Statement {
    parsed.unwrap().one().unwrap()
}

/// The first select item of a query statement.
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
fn generic_double_quotes_are_identifiers() {
    let statement = one(parse("SELECT \"from\" FROM t"));
    assert!(matches!(first_item(&statement), Node::Name(_)));
    assert_eq!(format(&statement).unwrap(), "SELECT \"from\" FROM t");
}

#[test]
fn mysql_double_quotes_are_strings() {
    let statement = one(parse_mysql("SELECT \"hi\""));
    assert!(matches!(first_item(&statement), Node::Literal(_)));
    assert_eq!(format(&statement).unwrap(), "SELECT 'hi'");
}

#[test]
fn backquoted_identifiers() {
    let statement = one(parse("SELECT `my col` FROM t"));
    assert_eq!(format(&statement).unwrap(), "SELECT \"my col\" FROM t");
}

#[test]
fn sqlserver_brackets_are_identifiers() {
    let statement = one(parse_sqlserver("SELECT [col name] FROM [my table]"));
    assert_eq!(
        format(&statement).unwrap(),
        "SELECT \"col name\" FROM \"my table\""
    );
}

#[test]
fn sqlserver_top() {
    let statement = one(parse_sqlserver("SELECT TOP 5 a FROM t"));
    assert_eq!(format(&statement).unwrap(), "SELECT TOP (5) a FROM t");
}

#[test]
fn bigquery_brackets_are_arrays() {
    let statement = one(parse_bigquery("SELECT [1, 2, 3]"));
    assert_eq!(format(&statement).unwrap(), "SELECT [1, 2, 3]");
}

#[test]
fn subscripts() {
    let statement = one(parse("SELECT a[1] FROM t"));
    assert_eq!(format(&statement).unwrap(), "SELECT a[1] FROM t");
}

#[test]
fn star_except() {
    let statement = one(parse_bigquery("SELECT * EXCEPT (a, b) FROM t"));
    assert_eq!(
        format(&statement).unwrap(),
        "SELECT * EXCEPT (a, b) FROM t"
    );
}

#[test]
fn qualified_star() {
    let statement = one(parse("SELECT t.* FROM t"));
    assert_eq!(format(&statement).unwrap(), "SELECT t.* FROM t");
}

#[test]
fn backquote_output() {
    let statement = one(parse("SELECT \"my col\" FROM t"));
    let options = FormatOptions {
        ansi_quotes: false,
        ..FormatOptions::default()
    };
    assert_eq!(
        format_with(&statement, &options).unwrap(),
        "SELECT `my col` FROM t"
    );
}

#[test]
fn custom_quoting_predicate() {
    fn never(_: &str) -> bool {
        false
    }
    let statement = one(parse("SELECT \"select\" FROM t"));
    let options = FormatOptions {
        should_quote: Some(never),
        ..FormatOptions::default()
    };
    assert_eq!(
        format_with(&statement, &options).unwrap(),
        "SELECT select FROM t"
    );
}
