//! End-to-end parse/format roundtrips through the public API.

use sqltree::{format, parse, Parsed};

/// Parses one statement and formats it back.
fn roundtrip(sql: &str) -> String {
    let Parsed::One(statement) = parse(sql).expect(sql) else {
        panic!("expected one statement for {sql}");
    };
    format(&statement).expect(sql)
}

#[test]
fn selects_roundtrip() {
    for sql in [
        "SELECT DISTINCT a, b FROM t",
        "SELECT DISTINCT ON (a) a, b FROM t",
        "SELECT a AS x FROM t",
        "SELECT * FROM a LEFT JOIN b ON a.id = b.id",
        "SELECT * FROM a INNER JOIN b USING (id)",
        "SELECT * FROM a, b WHERE a.id = b.id",
        "SELECT a FROM t GROUP BY a HAVING COUNT(*) > 1",
        "SELECT a FROM t ORDER BY a DESC NULLS LAST LIMIT 10 OFFSET 5",
        "WITH x AS (SELECT 1) SELECT * FROM x",
        "SELECT a FROM (SELECT a FROM t) AS s",
        "VALUES (1, 2), (3, 4)",
    ] {
        assert_eq!(roundtrip(sql), sql);
    }
}

#[test]
fn set_operations_roundtrip() {
    for sql in [
        "SELECT a FROM t UNION SELECT b FROM u",
        "SELECT a FROM t UNION ALL SELECT b FROM u UNION ALL SELECT c FROM v",
        "SELECT a FROM t INTERSECT SELECT b FROM u",
        "SELECT a FROM t UNION SELECT b FROM u ORDER BY a",
        "(SELECT a FROM t ORDER BY a) UNION ALL SELECT b FROM u",
    ] {
        assert_eq!(roundtrip(sql), sql);
    }
}

#[test]
fn expressions_roundtrip() {
    for sql in [
        "SELECT CASE WHEN a = 1 THEN 'one' ELSE 'other' END FROM t",
        "SELECT CASE a WHEN 1 THEN 'one' END FROM t",
        "SELECT CAST(a AS DECIMAL(10, 2)) FROM t",
        "SELECT x FROM t WHERE a BETWEEN 1 AND 10",
        "SELECT x FROM t WHERE a NOT BETWEEN 1 AND 10",
        "SELECT x FROM t WHERE a LIKE '%x' ESCAPE '!'",
        "SELECT x FROM t WHERE a NOT LIKE '%x'",
        "SELECT a FROM t WHERE b IN (1, 2, 3)",
        "SELECT a FROM t WHERE b NOT IN (SELECT c FROM u)",
        "SELECT EXTRACT(YEAR FROM d) FROM t",
        "SELECT TRIM(LEADING 'x' FROM y) FROM t",
        "SELECT SUBSTRING(a FROM 2 FOR 3) FROM t",
        "SELECT NOT a AND b FROM t",
        "SELECT a || b || c FROM t",
        "SELECT x COLLATE nocase FROM t",
        "SELECT CURRENT_TIMESTAMP",
    ] {
        assert_eq!(roundtrip(sql), sql);
    }
}

#[test]
fn window_functions_roundtrip() {
    for sql in [
        "SELECT ROW_NUMBER() OVER (PARTITION BY a ORDER BY b) FROM t",
        "SELECT SUM(x) OVER (ORDER BY a ROWS 2 PRECEDING) FROM t",
        "SELECT COUNT(*) FILTER (WHERE a > 0) FROM t",
        "SELECT COUNT(DISTINCT x) FROM t",
        "SELECT GROUP_CONCAT(x ORDER BY y SEPARATOR ', ') FROM t",
    ] {
        assert_eq!(roundtrip(sql), sql);
    }
}

#[test]
fn statements_roundtrip() {
    for sql in [
        "INSERT INTO t (a, b) VALUES (1, 'x'), (2, 'y')",
        "INSERT INTO t SELECT a FROM u",
        "INSERT OVERWRITE t VALUES (1)",
        "UPDATE t SET a = 1, b = 'x' WHERE id = 3",
        "DELETE FROM t WHERE id = 3",
        "CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR(20) NOT NULL)",
        "CREATE TABLE IF NOT EXISTS t (id INT, PRIMARY KEY (id))",
        "CREATE TABLE t (a INT, FOREIGN KEY (a) REFERENCES u (id))",
        "CREATE VIEW v AS SELECT a FROM t",
        "CREATE SCHEMA IF NOT EXISTS s",
        "DROP TABLE IF EXISTS t, u",
        "DROP VIEW v",
        "EXPLAIN SELECT 1",
        "DESCRIBE t",
        "START TRANSACTION",
        "COMMIT",
        "ROLLBACK",
        "SET x = 1",
    ] {
        assert_eq!(roundtrip(sql), sql);
    }
}

#[test]
fn canonicalizing_rewrites() {
    // These do not roundtrip verbatim: the output is the canonical spelling.
    for (sql, expected) in [
        ("select a from t", "SELECT a FROM t"),
        ("SELECT a<>b FROM t", "SELECT a <> b FROM t"),
        ("SELECT a != b FROM t", "SELECT a <> b FROM t"),
        ("SELECT INTERVAL 3 DAY", "SELECT INTERVAL '3' DAY"),
        ("SELECT SUBSTR(a, 2) FROM t", "SELECT SUBSTRING(a, 2) FROM t"),
        ("SELECT a FROM t FETCH FIRST 3 ROWS ONLY", "SELECT a FROM t FETCH 3 ROWS ONLY"),
        ("SELECT a -- comment\nFROM t", "SELECT a FROM t"),
        ("SELECT /* block */ a FROM t", "SELECT a FROM t"),
        ("SELECT a FROM t WHERE b = +1", "SELECT a FROM t WHERE b = 1"),
    ] {
        assert_eq!(roundtrip(sql), expected, "for input {sql}");
    }
}

#[test]
fn trees_serialize_to_json_and_back() {
    let Parsed::One(statement) = parse("SELECT a + 1 FROM t WHERE b IS NULL").unwrap() else {
        panic!("expected one statement");
    };
    let json = serde_json::to_string(&statement).unwrap();
    let back: sqltree::Statement = serde_json::from_str(&json).unwrap();
    assert_eq!(statement, back);
}

#[test]
fn scalar_subqueries_keep_their_parentheses() {
    for sql in [
        "SELECT (SELECT 1 FROM u) FROM t",
        "SELECT COALESCE((SELECT a FROM u), 0) FROM t",
        "SELECT a FROM t WHERE b = (SELECT MAX(c) FROM u)",
        "SELECT a FROM t ORDER BY (SELECT b FROM u)",
        "SELECT a FROM t WHERE b IN (SELECT c FROM u)",
    ] {
        assert_eq!(roundtrip(sql), sql);
    }
}

#[test]
fn parentheses_survive_only_where_needed() {
    for (sql, expected) in [
        ("SELECT (a) FROM t", "SELECT a FROM t"),
        ("SELECT (a + b) FROM t", "SELECT a + b FROM t"),
        ("SELECT (a + b) * c FROM t", "SELECT (a + b) * c FROM t"),
        ("SELECT a AND (b OR c) FROM t", "SELECT a AND (b OR c) FROM t"),
        ("SELECT (a AND b) OR c FROM t", "SELECT a AND b OR c FROM t"),
        ("SELECT a / (b / c) FROM t", "SELECT a / (b / c) FROM t"),
    ] {
        assert_eq!(roundtrip(sql), expected, "for input {sql}");
    }
}
