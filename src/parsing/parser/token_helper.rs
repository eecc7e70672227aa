//! Token-stream helpers shared by the parser traits.

use crate::dialect::Grammar;
use crate::error::{Error, Result};
use crate::parsing::ast::Name;
use crate::parsing::lexer::{Lexer, Token};
use std::iter::Peekable;

/// Low-level access to the token stream. Word matching is case-insensitive;
/// keywords are ordinary words here, so a phrase like `GROUP BY` is consumed
/// one word at a time with `expect_word` closing the phrase.
pub trait TokenHelper<'a> {
    fn tokens(&mut self) -> &mut Peekable<Lexer<'a>>;

    /// The dialect configuration in effect.
    fn grammar(&self) -> &Grammar;

    /// Consumes and returns the next token, failing at end of input.
    fn next(&mut self) -> Result<Token> {
        self.tokens()
            .next()
            .transpose()?
            .ok_or_else(|| Error::ParseError("unexpected end of input".into()))
    }

    /// Peeks the next token without consuming it.
    fn peek<'s>(&'s mut self) -> Result<Option<&'s Token>>
    where
        'a: 's,
    {
        // Can't return a reference into the error case, so surface it by
        // value and leave the Ok tokens peekable.
        match self.tokens().peek() {
            Some(Ok(token)) => Ok(Some(token)),
            Some(Err(err)) => Err(err.clone()),
            None => Ok(None),
        }
    }

    /// Consumes the next token if it equals the given one.
    fn next_is(&mut self, token: Token) -> bool {
        matches!(self.tokens().peek(), Some(Ok(t)) if *t == token)
            && self.tokens().next().is_some()
    }

    /// Consumes the next token, failing unless it equals the given one.
    fn expect(&mut self, token: Token) -> Result<()> {
        let next = self.next()?;
        if next != token {
            return Err(Error::ParseError(format!("expected {token}, found {next}")));
        }
        Ok(())
    }

    /// Consumes the next token if it is the given word (case-insensitive).
    fn next_word(&mut self, word: &str) -> bool {
        matches!(self.tokens().peek(), Some(Ok(t)) if t.is_word(word))
            && self.tokens().next().is_some()
    }

    /// Consumes a sequence of words if the stream starts with all of them.
    /// The words must be unambiguous at the first one; only a single token
    /// of lookahead is used before committing.
    fn next_words(&mut self, words: &[&str]) -> Result<bool> {
        let (first, rest) = words.split_first().expect("phrase is non-empty");
        if !self.next_word(first) {
            return Ok(false);
        }
        for word in rest {
            self.expect_word(word)?;
        }
        Ok(true)
    }

    /// True if the next token is the given word, without consuming it.
    fn peek_word(&mut self, word: &str) -> bool {
        matches!(self.tokens().peek(), Some(Ok(t)) if t.is_word(word))
    }

    /// Consumes the next token, failing unless it is the given word.
    fn expect_word(&mut self, word: &str) -> Result<()> {
        let next = self.next()?;
        if !next.is_word(word) {
            return Err(Error::ParseError(format!("expected {word}, found {next}")));
        }
        Ok(())
    }

    /// Consumes an identifier: a quoted identifier, or any unquoted word.
    /// Context decides whether reserved words are acceptable; callers that
    /// must not swallow keywords use [`TokenHelper::next_ident`].
    fn next_any_ident(&mut self) -> Result<String> {
        match self.next()? {
            Token::Ident(word) => Ok(word),
            Token::QuotedIdent(name) => Ok(name),
            token => Err(Error::ParseError(format!(
                "expected identifier, found {token}"
            ))),
        }
    }

    /// Consumes an identifier, rejecting reserved words unless quoted.
    fn next_ident(&mut self) -> Result<String> {
        match self.peek()? {
            Some(Token::Ident(word)) if crate::keywords::is_reserved(word) => Err(
                Error::ParseError(format!("unexpected keyword {word}")),
            ),
            _ => self.next_any_ident(),
        }
    }

    /// Consumes a dotted identifier path. The first segment must not be an
    /// unquoted reserved word; later segments may be anything.
    fn next_name(&mut self) -> Result<Name> {
        let mut segments = vec![self.next_ident()?];
        while self.next_is(Token::Period) {
            segments.push(self.next_any_ident()?);
        }
        Ok(Name(segments))
    }

    /// Consumes an identifier if one is next and it is not reserved.
    fn next_ident_if_any(&mut self) -> Option<String> {
        match self.tokens().peek() {
            Some(Ok(Token::Ident(word))) if !crate::keywords::is_reserved(word) => {
                let word = word.clone();
                self.tokens().next();
                Some(word)
            }
            Some(Ok(Token::QuotedIdent(name))) => {
                let name = name.clone();
                self.tokens().next();
                Some(name)
            }
            _ => None,
        }
    }
}
