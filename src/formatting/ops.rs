//! Per-operator SQL renderers.
//!
//! Every canonical operator with special surface syntax has an entry in the
//! handler registry; infix operators share one generic handler driven by the
//! symbol table in [`crate::keywords`]. Anything else renders as a plain
//! `NAME(args)` function call.

use super::{left_ctx, right_ctx, Formatter, TOP};
use crate::error::{Error, Result};
use crate::keywords;
use crate::parsing::ast::{Args, Call, Node};
use std::collections::HashMap;
use std::sync::OnceLock;

type Handler = fn(&Formatter, &Call) -> Result<String>;

/// Operators that render through the generic infix handler.
const INFIX_OPS: &[&str] = &[
    "add",
    "and",
    "binary_and",
    "binary_or",
    "concat",
    "div",
    "eq",
    "gt",
    "gte",
    "ilike",
    "like",
    "lt",
    "lte",
    "mod",
    "mul",
    "neq",
    "not_ilike",
    "not_like",
    "not_regexp",
    "not_rlike",
    "or",
    "regexp",
    "rlike",
    "sub",
];

fn registry() -> &'static HashMap<&'static str, Handler> {
    static REGISTRY: OnceLock<HashMap<&'static str, Handler>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map: HashMap<&'static str, Handler> = HashMap::new();
        for op in INFIX_OPS {
            map.insert(op, infix);
        }
        map.insert("not", prefix);
        map.insert("neg", prefix);
        map.insert("binary_not", prefix);
        map.insert("missing", missing);
        map.insert("exists", exists);
        map.insert("in", in_op);
        map.insert("nin", in_op);
        map.insert("between", between);
        map.insert("not_between", between);
        map.insert("collate", collate);
        map.insert("get", get);
        map.insert("cast", cast);
        map.insert("try_cast", cast);
        map.insert("safe_cast", cast);
        map.insert("validate_conversion", cast);
        map.insert("extract", extract);
        map.insert("interval", interval);
        map.insert("trim", trim);
        map.insert("ltrim", trim);
        map.insert("rtrim", trim);
        map.insert("substring", substring);
        map.insert("create_array", create_array);
        map.insert("current_date", nullary_keyword);
        map.insert("current_time", nullary_keyword);
        map.insert("current_timestamp", nullary_keyword);
        map
    })
}

/// Renders a call node, dispatching to the operator's handler when it has
/// one.
pub(crate) fn format_call(fmt: &Formatter, call: &Call) -> Result<String> {
    match registry().get(call.name.as_str()) {
        Some(handler) => handler(fmt, call),
        None => generic(fmt, call),
    }
}

/// The fallback: `NAME(args)` with the name uppercased.
fn generic(fmt: &Formatter, call: &Call) -> Result<String> {
    Ok(format!(
        "{}({})",
        call.name.to_uppercase(),
        fmt.args_sql(&call.args)?
    ))
}

fn shape(call: &Call, expected: &str) -> Error {
    Error::ShapeError(format!("{} expects {expected}", call.name))
}

/// The positional operands of an operator call, requiring at least `min`.
fn operands<'b>(call: &'b Call, min: usize, what: &str) -> Result<Vec<&'b Node>> {
    let operands = call.args.positional();
    if operands.len() < min {
        return Err(shape(call, what));
    }
    Ok(operands)
}

/// Generic n-ary infix operator. Chained operands reuse the right-hand
/// context, keeping flattened associative chains bare.
fn infix(fmt: &Formatter, call: &Call) -> Result<String> {
    let symbol = keywords::infix_symbol(&call.name)
        .ok_or_else(|| Error::Internal(format!("no infix symbol for {}", call.name)))?;
    let precedence = keywords::precedence(&call.name);
    let operands = operands(call, 2, "at least two operands")?;
    let mut sql = fmt.node(operands[0], left_ctx(precedence))?;
    for operand in &operands[1..] {
        sql.push_str(&format!(" {symbol} "));
        sql.push_str(&fmt.node(operand, right_ctx(precedence))?);
    }
    if let Some(escape) = call.kwarg("escape") {
        sql.push_str(&format!(" ESCAPE {}", fmt.node(escape, right_ctx(precedence))?));
    }
    Ok(sql)
}

/// Prefix unary operators: NOT, unary minus, bitwise not.
fn prefix(fmt: &Formatter, call: &Call) -> Result<String> {
    let operands = operands(call, 1, "one operand")?;
    let precedence = keywords::precedence(&call.name);
    let operand = fmt.node(operands[0], right_ctx(precedence))?;
    match call.name.as_str() {
        "not" => Ok(format!("NOT {operand}")),
        "neg" => Ok(format!("-{operand}")),
        _ => Ok(format!("~{operand}")),
    }
}

fn missing(fmt: &Formatter, call: &Call) -> Result<String> {
    let operands = operands(call, 1, "one operand")?;
    let precedence = keywords::precedence("missing");
    Ok(format!(
        "{} IS NULL",
        fmt.node(operands[0], left_ctx(precedence))?
    ))
}

/// `exists` is dual-purpose: over a query it is the EXISTS predicate, over
/// anything else it is IS NOT NULL.
fn exists(fmt: &Formatter, call: &Call) -> Result<String> {
    let operands = operands(call, 1, "one operand")?;
    match operands[0] {
        Node::Query(query) => Ok(format!("EXISTS ({})", fmt.query(query)?)),
        operand => {
            let precedence = keywords::precedence("exists");
            Ok(format!(
                "{} IS NOT NULL",
                fmt.node(operand, left_ctx(precedence))?
            ))
        }
    }
}

/// IN and NOT IN. The right-hand side always gets parentheses, whether it is
/// a value list, a subquery, or a single value.
fn in_op(fmt: &Formatter, call: &Call) -> Result<String> {
    let operands = operands(call, 2, "two operands")?;
    let precedence = keywords::precedence(&call.name);
    let keyword = if call.name == "nin" { "NOT IN" } else { "IN" };
    let lhs = fmt.node(operands[0], left_ctx(precedence))?;
    let rhs = match operands[1] {
        list @ Node::List(_) => fmt.node(list, TOP)?,
        Node::Query(query) => format!("({})", fmt.query(query)?),
        other => format!("({})", fmt.node(other, TOP)?),
    };
    Ok(format!("{lhs} {keyword} {rhs}"))
}

fn between(fmt: &Formatter, call: &Call) -> Result<String> {
    let operands = operands(call, 3, "three operands")?;
    let precedence = keywords::precedence(&call.name);
    let keyword = if call.name == "not_between" {
        "NOT BETWEEN"
    } else {
        "BETWEEN"
    };
    Ok(format!(
        "{} {keyword} {} AND {}",
        fmt.node(operands[0], left_ctx(precedence))?,
        fmt.node(operands[1], right_ctx(precedence))?,
        fmt.node(operands[2], right_ctx(precedence))?
    ))
}

fn collate(fmt: &Formatter, call: &Call) -> Result<String> {
    let operands = operands(call, 2, "two operands")?;
    let precedence = keywords::precedence("collate");
    let collation = match operands[1] {
        Node::Name(name) => fmt.name(name)?,
        other => fmt.node(other, right_ctx(precedence))?,
    };
    Ok(format!(
        "{} COLLATE {collation}",
        fmt.node(operands[0], left_ctx(precedence))?
    ))
}

fn get(fmt: &Formatter, call: &Call) -> Result<String> {
    let operands = operands(call, 2, "two operands")?;
    let precedence = keywords::precedence("get");
    Ok(format!(
        "{}[{}]",
        fmt.node(operands[0], right_ctx(precedence))?,
        fmt.node(operands[1], TOP)?
    ))
}

/// CAST and its dialect variants. The second operand carries the type as a
/// call node named after the type.
fn cast(fmt: &Formatter, call: &Call) -> Result<String> {
    let operands = operands(call, 2, "a value and a type")?;
    let Node::Call(datatype) = operands[1] else {
        return Err(shape(call, "a type as its second operand"));
    };
    let mut type_sql = datatype.name.to_uppercase().replace('_', " ");
    if !datatype.args.is_empty() {
        type_sql.push_str(&format!("({})", fmt.args_sql(&datatype.args)?));
    }
    Ok(format!(
        "{}({} AS {type_sql})",
        call.name.to_uppercase(),
        fmt.node(operands[0], TOP)?
    ))
}

fn extract(fmt: &Formatter, call: &Call) -> Result<String> {
    let operands = operands(call, 2, "a part and a value")?;
    let Node::Name(part) = operands[0] else {
        return Err(shape(call, "a date part as its first operand"));
    };
    let part = part
        .0
        .first()
        .ok_or_else(|| shape(call, "a date part as its first operand"))?;
    Ok(format!(
        "EXTRACT({} FROM {})",
        part.to_uppercase(),
        fmt.node(operands[1], TOP)?
    ))
}

/// `INTERVAL amount UNIT`; bare numeric amounts are rendered quoted.
fn interval(fmt: &Formatter, call: &Call) -> Result<String> {
    let operands = operands(call, 2, "an amount and a unit")?;
    let precedence = keywords::precedence("interval");
    let amount = match operands[0] {
        Node::Integer(value) => format!("'{value}'"),
        Node::Number(value) => format!("'{value}'"),
        other => fmt.node(other, right_ctx(precedence))?,
    };
    let unit = match operands[1] {
        Node::Name(name) => name.0.join(".").to_uppercase(),
        other => fmt.node(other, TOP)?,
    };
    Ok(format!("INTERVAL {amount} {unit}"))
}

/// The TRIM family. A `characters` keyword argument forces the FROM form;
/// directional trims without one fall back to the LTRIM/RTRIM functions.
fn trim(fmt: &Formatter, call: &Call) -> Result<String> {
    let operands = operands(call, 1, "one operand")?;
    let value = fmt.node(operands[0], TOP)?;
    let Some(characters) = call.kwarg("characters") else {
        return Ok(format!("{}({value})", call.name.to_uppercase()));
    };
    let direction = match call.name.as_str() {
        "ltrim" => "LEADING ",
        "rtrim" => "TRAILING ",
        _ => "",
    };
    Ok(format!(
        "TRIM({direction}{} FROM {value})",
        fmt.node(characters, TOP)?
    ))
}

/// SUBSTRING: the FROM/FOR form when keyword arguments are present, the
/// comma form otherwise.
fn substring(fmt: &Formatter, call: &Call) -> Result<String> {
    let operands = operands(call, 1, "one operand")?;
    let from = call.kwarg("from");
    let length = call.kwarg("for");
    if from.is_none() && length.is_none() {
        return generic(fmt, call);
    }
    let mut sql = format!("SUBSTRING({}", fmt.node(operands[0], TOP)?);
    if let Some(from) = from {
        sql.push_str(&format!(" FROM {}", fmt.node(from, TOP)?));
    }
    if let Some(length) = length {
        sql.push_str(&format!(" FOR {}", fmt.node(length, TOP)?));
    }
    sql.push(')');
    Ok(sql)
}

fn create_array(fmt: &Formatter, call: &Call) -> Result<String> {
    Ok(format!("[{}]", fmt.args_sql(&call.args)?))
}

/// CURRENT_DATE and friends render without parentheses when called with no
/// arguments.
fn nullary_keyword(fmt: &Formatter, call: &Call) -> Result<String> {
    if matches!(call.args, Args::None) {
        return Ok(call.name.to_uppercase());
    }
    generic(fmt, call)
}
