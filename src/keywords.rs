//! Shared precedence and keyword model.
//!
//! One table drives both directions: the parser uses it to resolve operator
//! binding, the formatter uses it to decide where parentheses are required.
//! Higher precedence binds tighter; [`MAX_PRECEDENCE`] is the sentinel for
//! atomic constructs (literals, names, lists) that never need parentheses.

/// Operator precedence.
pub type Precedence = u8;

/// Sentinel precedence for atomic constructs.
pub const MAX_PRECEDENCE: Precedence = 100;

/// Precedence of a full query (SELECT ... FROM ...).
pub const QUERY_PRECEDENCE: Precedence = 8;

/// Precedence of set operators (UNION, INTERSECT, EXCEPT, MINUS).
pub const SET_OP_PRECEDENCE: Precedence = 7;

/// Precedence of ORDER BY / LIMIT / OFFSET / FETCH around a query body.
pub const ORDER_PRECEDENCE: Precedence = 6;

/// Returns the precedence of a canonical operator name. Unknown names are
/// plain function calls and bind atomically.
pub fn precedence(op: &str) -> Precedence {
    match op {
        "get" => 40,
        "collate" => 39,
        "cast" | "try_cast" | "safe_cast" | "validate_conversion" | "interval" => 38,
        "neg" | "binary_not" => 36,
        "mul" | "div" | "mod" => 34,
        "add" | "sub" => 33,
        "concat" => 32,
        "binary_and" => 31,
        "binary_or" => 30,
        "like" | "not_like" | "ilike" | "not_ilike" | "rlike" | "not_rlike" | "regexp"
        | "not_regexp" => 26,
        "gt" | "gte" | "lt" | "lte" => 24,
        "eq" | "neq" => 23,
        "between" | "not_between" => 21,
        "in" | "nin" => 20,
        "missing" | "exists" => 19,
        "not" => 18,
        "and" => 17,
        "or" => 16,
        "case" => 15,
        "select" | "from" | "where" | "groupby" | "having" | "with" => QUERY_PRECEDENCE,
        "union" | "union_all" | "intersect" | "except" | "minus" => SET_OP_PRECEDENCE,
        "orderby" | "limit" | "offset" | "fetch" => ORDER_PRECEDENCE,
        _ => MAX_PRECEDENCE,
    }
}

/// Maps an operator symbol to its canonical operator name.
pub fn symbol_op(symbol: &str) -> Option<&'static str> {
    Some(match symbol {
        "=" | "==" => "eq",
        "!=" | "<>" => "neq",
        ">" => "gt",
        ">=" => "gte",
        "<" => "lt",
        "<=" => "lte",
        "+" => "add",
        "-" => "sub",
        "*" => "mul",
        "/" => "div",
        "%" => "mod",
        "||" => "concat",
        "&" => "binary_and",
        "|" => "binary_or",
        "~" => "binary_not",
        _ => return None,
    })
}

/// The SQL text for an infix canonical operator, if it renders as one.
pub fn infix_symbol(op: &str) -> Option<&'static str> {
    Some(match op {
        "eq" => "=",
        "neq" => "<>",
        "gt" => ">",
        "gte" => ">=",
        "lt" => "<",
        "lte" => "<=",
        "add" => "+",
        "sub" => "-",
        "mul" => "*",
        "div" => "/",
        "mod" => "%",
        "concat" => "||",
        "binary_and" => "&",
        "binary_or" => "|",
        "and" => "AND",
        "or" => "OR",
        "like" => "LIKE",
        "not_like" => "NOT LIKE",
        "ilike" => "ILIKE",
        "not_ilike" => "NOT ILIKE",
        "rlike" => "RLIKE",
        "not_rlike" => "NOT RLIKE",
        "regexp" => "REGEXP",
        "not_regexp" => "NOT REGEXP",
        _ => return None,
    })
}

/// Reserved words that cannot appear unquoted as identifiers.
static RESERVED: &[&str] = &[
    "all", "and", "any", "as", "asc", "begin", "between", "by", "case", "cast", "collate",
    "column", "commit", "create", "cross", "current_date", "current_time", "current_timestamp",
    "declare", "default", "delete", "desc", "describe", "distinct", "drop", "else", "end",
    "except", "exists", "explain", "false", "fetch", "filter", "first", "following", "for",
    "foreign", "from", "full", "function", "group", "having", "if", "ilike", "in", "index",
    "inner", "insert", "intersect", "interval", "into", "is", "join", "key", "last", "lateral",
    "leave", "left", "like", "limit", "merge", "minus", "natural", "next", "not", "null",
    "nulls", "offset", "on", "only", "or", "order", "outer", "over", "partition", "preceding",
    "primary", "procedure", "range", "references", "regexp", "return", "right", "rlike",
    "rollback", "row", "rows", "schema", "select", "set", "straight_join", "substring", "table",
    "tablesample", "then", "top", "transaction", "trim", "true", "unbounded", "union", "unique", "update",
    "using", "values", "view", "when", "where", "window", "with", "within",
];

/// Returns true if the word is reserved (case-insensitive) and must be quoted
/// when used as an identifier.
pub fn is_reserved(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    RESERVED.binary_search(&lower.as_str()).is_ok()
}

/// Join-type keywords, as they appear in SQL text.
static JOIN_KEYWORDS: &[&str] = &[
    "cross join",
    "full join",
    "full outer join",
    "inner join",
    "join",
    "left join",
    "left outer join",
    "natural join",
    "right join",
    "right outer join",
    "straight_join",
];

/// Returns true if the phrase is a join-type keyword.
pub fn is_join_keyword(phrase: &str) -> bool {
    let lower = phrase.to_ascii_lowercase();
    JOIN_KEYWORDS.binary_search(&lower.as_str()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_list_is_sorted() {
        let mut sorted = RESERVED.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, RESERVED);
    }

    #[test]
    fn join_keywords_are_sorted() {
        let mut sorted = JOIN_KEYWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, JOIN_KEYWORDS);
    }

    #[test]
    fn join_kinds_render_members_of_the_keyword_set() {
        use crate::parsing::ast::JoinKind;
        for kind in [
            JoinKind::Plain,
            JoinKind::Inner,
            JoinKind::Cross,
            JoinKind::Left,
            JoinKind::LeftOuter,
            JoinKind::Right,
            JoinKind::RightOuter,
            JoinKind::Full,
            JoinKind::FullOuter,
            JoinKind::Natural,
            JoinKind::Straight,
        ] {
            assert!(is_join_keyword(kind.as_sql()), "{}", kind.as_sql());
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert!(precedence("mul") > precedence("add"));
        assert!(precedence("add") > precedence("eq"));
        assert!(precedence("eq") > precedence("and"));
        assert!(precedence("and") > precedence("or"));
    }

    #[test]
    fn symbols_resolve_to_canonical_names() {
        assert_eq!(symbol_op("<>"), Some("neq"));
        assert_eq!(symbol_op(">="), Some("gte"));
        assert_eq!(symbol_op("||"), Some("concat"));
        assert_eq!(symbol_op("??"), None);
    }

    #[test]
    fn reserved_membership() {
        assert!(is_reserved("SELECT"));
        assert!(is_reserved("from"));
        assert!(!is_reserved("users"));
    }

    #[test]
    fn join_membership() {
        assert!(is_join_keyword("LEFT JOIN"));
        assert!(is_join_keyword("straight_join"));
        assert!(!is_join_keyword("left"));
    }
}
