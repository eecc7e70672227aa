//! Splits a raw SQL script into individual statements.
//!
//! Scripts may contain `DELIMITER xx` directive lines (MySQL client syntax)
//! that change the statement separator for the remainder of the script. The
//! splitter recognizes directives on their own lines, splits the text between
//! them on the active delimiter, and yields a marker for every directive so
//! the caller knows one was consumed. Splitting is quote- and comment-aware:
//! a delimiter inside a string literal, quoted identifier, or comment does
//! not end a statement.

use regex::Regex;
use std::sync::OnceLock;

/// One piece of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A single statement's text, trimmed, without its delimiter.
    Statement(String),
    /// A `DELIMITER xx` directive. Produces no tree; the new separator
    /// applies to all following text.
    Directive { delimiter: String },
}

fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^[ \t]*delimiter[ \t]+(\S+)[^\n]*").expect("static regex"))
}

/// Splits a script into statements and directive markers.
pub fn split(sql: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut delimiter = ";".to_string();
    let mut rest = sql;
    loop {
        match directive_regex().find(rest) {
            Some(found) => {
                split_region(&rest[..found.start()], &delimiter, &mut segments);
                let captures = directive_regex()
                    .captures(&rest[found.start()..found.end()])
                    .expect("find matched");
                delimiter = captures[1].to_string();
                segments.push(Segment::Directive {
                    delimiter: delimiter.clone(),
                });
                rest = &rest[found.end()..];
            }
            None => {
                split_region(rest, &delimiter, &mut segments);
                return segments;
            }
        }
    }
}

/// Splits one directive-free region on the active delimiter, skipping
/// delimiters inside quotes and comments. Empty pieces are dropped.
fn split_region(region: &str, delimiter: &str, segments: &mut Vec<Segment>) {
    let bytes = region.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if region[i..].starts_with(delimiter) {
            push_statement(&region[start..i], segments);
            i += delimiter.len();
            start = i;
            continue;
        }
        match bytes[i] {
            b'\'' | b'"' | b'`' => i = skip_quoted(bytes, i),
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
            }
            _ => i += 1,
        }
    }
    push_statement(&region[start..], segments);
}

/// Advances past a quoted region starting at `i`, honoring doubled quotes.
/// An unterminated quote runs to the end; the parser reports it.
fn skip_quoted(bytes: &[u8], i: usize) -> usize {
    let quote = bytes[i];
    let mut i = i + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    i
}

fn push_statement(text: &str, segments: &mut Vec<Segment>) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        segments.push(Segment::Statement(trimmed.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_semicolons() {
        assert_eq!(
            split("SET a = 1; SET b = 2"),
            vec![
                Segment::Statement("SET a = 1".into()),
                Segment::Statement("SET b = 2".into()),
            ]
        );
    }

    #[test]
    fn single_statement_without_delimiter() {
        assert_eq!(
            split("SELECT 1"),
            vec![Segment::Statement("SELECT 1".into())]
        );
    }

    #[test]
    fn directive_changes_delimiter() {
        let segments = split("DELIMITER ;;\nSELECT 1; SELECT 2;;\nSELECT 3");
        assert_eq!(
            segments,
            vec![
                Segment::Directive {
                    delimiter: ";;".into()
                },
                Segment::Statement("SELECT 1; SELECT 2".into()),
                Segment::Statement("SELECT 3".into()),
            ]
        );
    }

    #[test]
    fn delimiter_inside_string_is_ignored() {
        assert_eq!(
            split("SELECT 'a;b'; SELECT 2"),
            vec![
                Segment::Statement("SELECT 'a;b'".into()),
                Segment::Statement("SELECT 2".into()),
            ]
        );
    }

    #[test]
    fn delimiter_inside_comment_is_ignored() {
        assert_eq!(
            split("SELECT 1 -- trailing; note\n; SELECT 2"),
            vec![
                Segment::Statement("SELECT 1 -- trailing; note".into()),
                Segment::Statement("SELECT 2".into()),
            ]
        );
    }

    #[test]
    fn directive_is_case_insensitive() {
        let segments = split("delimiter //\nSELECT 1//");
        assert_eq!(
            segments,
            vec![
                Segment::Directive {
                    delimiter: "//".into()
                },
                Segment::Statement("SELECT 1".into()),
            ]
        );
    }

    #[test]
    fn empty_pieces_are_dropped() {
        assert_eq!(
            split(";;  ;\nSELECT 1;"),
            vec![Segment::Statement("SELECT 1".into())]
        );
    }
}
