//! Scripts: statement splitting, DELIMITER directives, and procedural
//! statements.

use sqltree::parsing::ast::Statement;
use sqltree::{format, parse, parse_mysql, Dialect, Grammar, Parsed, Parser};

#[test]
fn semicolons_split_statements() {
    let Parsed::Many(statements) = parse("SELECT 1; SELECT 2; SELECT 3").unwrap() else {
        panic!("expected many");
    };
    assert_eq!(statements.len(), 3);
}

#[test]
fn semicolons_in_strings_and_comments_do_not_split() {
    let Parsed::Many(statements) =
        parse("SELECT 'a;b'; -- trailing; note\nSELECT 2").unwrap()
    else {
        panic!("expected many");
    };
    assert_eq!(statements.len(), 2);
}

#[test]
fn delimiter_script_with_procedure() {
    let sql = "\
DELIMITER ;;
CREATE PROCEDURE p (IN x INT)
BEGIN
  DECLARE y INT DEFAULT 0;
  SET y = x + 1;
  SELECT y;
END;;
DELIMITER ;
";
    let statement = parse_mysql(sql).unwrap().one().unwrap();
    let Statement::CreateProcedure(routine) = &statement else {
        panic!("expected procedure");
    };
    assert_eq!(routine.params.len(), 1);
    let Statement::Block(block) = &routine.body else {
        panic!("expected block body");
    };
    assert_eq!(block.body.len(), 3);

    assert_eq!(
        format(&statement).unwrap(),
        "CREATE PROCEDURE p (IN x INT) BEGIN DECLARE y INT DEFAULT 0; \
         SET y = x + 1; SELECT y; END"
    );
}

#[test]
fn function_with_return() {
    let grammar = Grammar::get(Dialect::Generic, false).unwrap();
    let statement = Parser::parse(
        "CREATE FUNCTION f (x INT) RETURNS INT RETURN x * 2",
        &grammar,
    )
    .unwrap();
    assert_eq!(
        format(&statement).unwrap(),
        "CREATE FUNCTION f (x INT) RETURNS INT RETURN x * 2"
    );
}

#[test]
fn if_statement() {
    let grammar = Grammar::get(Dialect::Generic, false).unwrap();
    let statement = Parser::parse(
        "IF a = 1 THEN SELECT 1; ELSEIF a = 2 THEN SELECT 2; ELSE SELECT 3; END IF",
        &grammar,
    )
    .unwrap();
    assert_eq!(
        format(&statement).unwrap(),
        "IF a = 1 THEN SELECT 1; ELSEIF a = 2 THEN SELECT 2; ELSE SELECT 3; END IF"
    );
}

#[test]
fn merge_statement() {
    let sql = "MERGE INTO t USING u ON t.id = u.id \
               WHEN MATCHED THEN UPDATE SET a = 1 \
               WHEN NOT MATCHED THEN INSERT (a) VALUES (1)";
    let statement = parse(sql).unwrap().one().unwrap();
    assert_eq!(format(&statement).unwrap(), sql);
}

#[test]
fn labeled_loop_block() {
    let grammar = Grammar::get(Dialect::MySql, false).unwrap();
    let statement =
        Parser::parse("outer1: BEGIN SELECT 1; LEAVE outer1; END outer1", &grammar).unwrap();
    assert_eq!(
        format(&statement).unwrap(),
        "outer1: BEGIN SELECT 1; LEAVE outer1; END outer1"
    );
}
