//! The lexer, which takes raw SQL text and emits a token stream.
//!
//! Tokenization is dialect-aware: the [`Grammar`] decides whether double
//! quotes delimit string literals or identifiers, whether backquotes are
//! legal, and what square brackets mean. Keywords are not distinguished from
//! identifiers here; the parser matches words case-insensitively, since the
//! set of word operators is open-ended (any word can be a function name).

use crate::dialect::{BracketMode, Grammar};
use crate::error::{Error, Result};
use std::fmt::Display;
use std::iter::Peekable;
use std::str::Chars;

/// A lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A numeric literal, kept as source text for exact decoding.
    Number(String),
    /// A string literal, with any character-set prefix (`N'..'`, `X'..'`).
    String {
        value: String,
        encoding: Option<String>,
    },
    /// An unquoted word: keyword, function name, or identifier.
    Ident(String),
    /// A quoted identifier, quotes stripped and doubles resolved.
    QuotedIdent(String),
    Period,
    Comma,
    Semicolon,
    Colon,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Asterisk,
    Plus,
    Minus,
    Slash,
    Percent,
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    Concat,
    Ampersand,
    Pipe,
    Tilde,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Token::Number(n) => n,
            Token::String { value, .. } => return write!(f, "'{value}'"),
            Token::Ident(word) => word,
            Token::QuotedIdent(name) => return write!(f, "\"{name}\""),
            Token::Period => ".",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::OpenBracket => "[",
            Token::CloseBracket => "]",
            Token::Asterisk => "*",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Equal => "=",
            Token::NotEqual => "<>",
            Token::LessThan => "<",
            Token::LessOrEqual => "<=",
            Token::GreaterThan => ">",
            Token::GreaterOrEqual => ">=",
            Token::Concat => "||",
            Token::Ampersand => "&",
            Token::Pipe => "|",
            Token::Tilde => "~",
        })
    }
}

impl Token {
    /// The word of an `Ident` token, if this is one.
    pub fn word(&self) -> Option<&str> {
        match self {
            Token::Ident(word) => Some(word),
            _ => None,
        }
    }

    /// True if this token is the given word, case-insensitively.
    pub fn is_word(&self, word: &str) -> bool {
        match self {
            Token::Ident(w) => w.eq_ignore_ascii_case(word),
            _ => false,
        }
    }
}

/// The lexer itself. Iterates over the tokens of the raw source string.
/// Cloning is cheap and gives the parser bounded lookahead.
#[derive(Clone)]
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    grammar: &'a Grammar,
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Result<Token>> {
        match self.scan() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => self
                .chars
                .peek()
                .map(|c| Err(Error::ParseError(format!("unexpected character {c:?}")))),
            Err(err) => Some(Err(err)),
        }
    }
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, grammar: &'a Grammar) -> Lexer<'a> {
        Lexer {
            chars: input.chars().peekable(),
            grammar,
        }
    }

    /// Returns the next character if it satisfies the predicate.
    fn next_if(&mut self, predicate: impl Fn(char) -> bool) -> Option<char> {
        self.chars.next_if(|&c| predicate(c))
    }

    /// Returns the next character if it is the given one.
    fn next_is(&mut self, c: char) -> bool {
        self.next_if(|n| n == c).is_some()
    }

    /// Scans the input for the next token, ignoring leading whitespace and
    /// comments. Returns None at end of input or on an unlexable character.
    fn scan(&mut self) -> Result<Option<Token>> {
        self.skip_trivia();
        match self.chars.peek() {
            Some('\'') => self.scan_string(None).map(Some),
            Some('"') if self.grammar.double_quoted_strings => {
                self.scan_quoted('"').map(|value| {
                    Some(Token::String {
                        value,
                        encoding: None,
                    })
                })
            }
            Some('"') => self.scan_quoted('"').map(|n| Some(Token::QuotedIdent(n))),
            Some('`') if self.grammar.backquote_identifiers => {
                self.scan_quoted('`').map(|n| Some(Token::QuotedIdent(n)))
            }
            Some('[') if self.grammar.brackets == BracketMode::Identifier => {
                self.scan_bracket_ident().map(Some)
            }
            Some(c) if c.is_ascii_digit() => Ok(self.scan_number()),
            Some(c) if c.is_alphabetic() || *c == '_' => self.scan_word(),
            Some(_) => Ok(self.scan_symbol()),
            None => Ok(None),
        }
    }

    /// Skips whitespace, `--` line comments, and `/* */` block comments.
    fn skip_trivia(&mut self) {
        loop {
            while self.next_if(|c| c.is_whitespace()).is_some() {}
            let mut lookahead = self.chars.clone();
            match (lookahead.next(), lookahead.next()) {
                (Some('-'), Some('-')) => {
                    while self.next_if(|c| c != '\n').is_some() {}
                }
                (Some('/'), Some('*')) => {
                    self.chars.next();
                    self.chars.next();
                    loop {
                        match self.chars.next() {
                            Some('*') if self.next_is('/') => break,
                            Some(_) => continue,
                            None => break,
                        }
                    }
                }
                _ => return,
            }
        }
    }

    /// Scans a quoted region delimited by `quote`, resolving doubled quotes.
    fn scan_quoted(&mut self, quote: char) -> Result<String> {
        if !self.next_is(quote) {
            return Err(Error::ParseError(format!("expected {quote}")));
        }
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some(c) if c == quote && self.next_is(quote) => value.push(quote),
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
                None => return Err(Error::ParseError("unterminated quote".into())),
            }
        }
        Ok(value)
    }

    /// Scans a single-quoted string literal, with an optional encoding prefix
    /// already consumed by the caller.
    fn scan_string(&mut self, encoding: Option<String>) -> Result<Token> {
        let value = self.scan_quoted('\'')?;
        Ok(Token::String { value, encoding })
    }

    /// Scans a `[bracketed]` identifier (SQL-Server mode). Doubled closing
    /// brackets escape a literal bracket.
    fn scan_bracket_ident(&mut self) -> Result<Token> {
        self.chars.next();
        let mut name = String::new();
        loop {
            match self.chars.next() {
                Some(']') if self.next_is(']') => name.push(']'),
                Some(']') => break,
                Some(c) => name.push(c),
                None => return Err(Error::ParseError("unterminated [ identifier".into())),
            }
        }
        Ok(Token::QuotedIdent(name))
    }

    /// Scans a numeric literal. The text is kept verbatim; the parser decides
    /// between integer and decimal forms.
    fn scan_number(&mut self) -> Option<Token> {
        let mut number = String::new();
        while let Some(c) = self.next_if(|c| c.is_ascii_digit()) {
            number.push(c);
        }
        if let Some(sep) = self.next_if(|c| c == '.') {
            number.push(sep);
            while let Some(dec) = self.next_if(|c| c.is_ascii_digit()) {
                number.push(dec);
            }
        }
        if let Some(exp) = self.next_if(|c| c == 'e' || c == 'E') {
            number.push(exp);
            if let Some(sign) = self.next_if(|c| c == '+' || c == '-') {
                number.push(sign);
            }
            while let Some(dig) = self.next_if(|c| c.is_ascii_digit()) {
                number.push(dig);
            }
        }
        Some(Token::Number(number))
    }

    /// Scans an unquoted word. A short all-letter word directly followed by a
    /// single quote is a string encoding prefix (`N'x'`, `X'1f'`).
    fn scan_word(&mut self) -> Result<Option<Token>> {
        let mut word = String::new();
        while let Some(c) = self.next_if(|c| c.is_alphanumeric() || c == '_' || c == '$') {
            word.push(c);
        }
        if word.len() <= 2
            && word.chars().all(|c| c.is_ascii_alphabetic())
            && self.chars.peek() == Some(&'\'')
        {
            return self.scan_string(Some(word.to_ascii_lowercase())).map(Some);
        }
        Ok(Some(Token::Ident(word)))
    }

    /// Scans an operator or punctuation symbol, longest match first.
    fn scan_symbol(&mut self) -> Option<Token> {
        let token = match self.chars.peek()? {
            '.' => Token::Period,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            ':' => Token::Colon,
            '(' => Token::OpenParen,
            ')' => Token::CloseParen,
            '[' => Token::OpenBracket,
            ']' => Token::CloseBracket,
            '*' => Token::Asterisk,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '=' => Token::Equal,
            '&' => Token::Ampersand,
            '~' => Token::Tilde,
            '<' => Token::LessThan,
            '>' => Token::GreaterThan,
            '|' => Token::Pipe,
            '!' => {
                // Only valid as `!=`; left unconsumed otherwise so the
                // iterator reports it as an unexpected character.
                let mut lookahead = self.chars.clone();
                lookahead.next();
                if lookahead.next() != Some('=') {
                    return None;
                }
                self.chars.next();
                self.chars.next();
                return Some(Token::NotEqual);
            }
            _ => return None,
        };
        self.chars.next();
        Some(match token {
            Token::Equal if self.next_is('=') => Token::Equal,
            Token::LessThan if self.next_is('>') => Token::NotEqual,
            Token::LessThan if self.next_is('=') => Token::LessOrEqual,
            Token::GreaterThan if self.next_is('=') => Token::GreaterOrEqual,
            Token::Pipe if self.next_is('|') => Token::Concat,
            token => token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Dialect, Grammar};

    fn lex(input: &str, dialect: Dialect) -> Vec<Token> {
        let grammar = Grammar::get(dialect, false).unwrap();
        Lexer::new(input, &grammar)
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn words_and_symbols() {
        assert_eq!(
            lex("SELECT a + 1 <> b", Dialect::Generic),
            vec![
                Token::Ident("SELECT".into()),
                Token::Ident("a".into()),
                Token::Plus,
                Token::Number("1".into()),
                Token::NotEqual,
                Token::Ident("b".into()),
            ]
        );
    }

    #[test]
    fn quote_doubling() {
        assert_eq!(
            lex("'it''s'", Dialect::Generic),
            vec![Token::String {
                value: "it's".into(),
                encoding: None
            }]
        );
    }

    #[test]
    fn double_quotes_follow_dialect() {
        assert_eq!(
            lex(r#""name""#, Dialect::Generic),
            vec![Token::QuotedIdent("name".into())]
        );
        assert_eq!(
            lex(r#""text""#, Dialect::MySql),
            vec![Token::String {
                value: "text".into(),
                encoding: None
            }]
        );
    }

    #[test]
    fn bracket_identifiers() {
        assert_eq!(
            lex("[odd name]", Dialect::SqlServer),
            vec![Token::QuotedIdent("odd name".into())]
        );
        assert_eq!(
            lex("[1]", Dialect::BigQuery),
            vec![
                Token::OpenBracket,
                Token::Number("1".into()),
                Token::CloseBracket
            ]
        );
    }

    #[test]
    fn encoding_prefix() {
        assert_eq!(
            lex("N'abc'", Dialect::Generic),
            vec![Token::String {
                value: "abc".into(),
                encoding: Some("n".into())
            }]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            lex("a -- trailing\n/* block */ b", Dialect::Generic),
            vec![Token::Ident("a".into()), Token::Ident("b".into())]
        );
    }

    #[test]
    fn unlexable_character() {
        let grammar = Grammar::get(Dialect::Generic, false).unwrap();
        let result: Result<Vec<_>> = Lexer::new("a ? b", &grammar).collect();
        assert!(matches!(result, Err(Error::ParseError(_))));
    }

    #[test]
    fn bang_requires_equals() {
        assert_eq!(
            lex("a != b", Dialect::Generic),
            vec![
                Token::Ident("a".into()),
                Token::NotEqual,
                Token::Ident("b".into()),
            ]
        );
        let grammar = Grammar::get(Dialect::Generic, false).unwrap();
        let result: Result<Vec<_>> = Lexer::new("SELECT 1 !", &grammar).collect();
        assert!(matches!(result, Err(Error::ParseError(_))));
    }
}
