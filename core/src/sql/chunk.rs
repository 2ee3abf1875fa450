use super::Token;
use crate::{Ident, Value};
use std::borrow::Cow;

/// A SQL chunk represents a part of an SQL statement.
///
/// - `Token` - SQL keywords and operators (SELECT, FROM, =, etc.)
/// - `Ident` - a validated table or column name, written unquoted
/// - `Raw` - fixed SQL text (function openers, literals)
/// - `Param` - a value bound through a dialect marker
#[derive(Debug, Clone, PartialEq)]
pub enum SQLChunk {
    Token(Token),
    Ident(Ident),
    Raw(Cow<'static, str>),
    Param(Value),
}

impl SQLChunk {
    pub(crate) fn is_word_like(&self) -> bool {
        match self {
            SQLChunk::Token(t) => t.is_word_like(),
            SQLChunk::Ident(_) | SQLChunk::Raw(_) | SQLChunk::Param(_) => true,
        }
    }

    /// Writes everything except parameters, which need a dialect.
    pub(crate) fn write_text(&self, buf: &mut String) {
        match self {
            SQLChunk::Token(t) => buf.push_str(t.as_str()),
            SQLChunk::Ident(ident) => buf.push_str(ident.as_str()),
            SQLChunk::Raw(text) => buf.push_str(text),
            SQLChunk::Param(_) => {}
        }
    }
}

impl From<Token> for SQLChunk {
    fn from(value: Token) -> Self {
        SQLChunk::Token(value)
    }
}

impl From<Ident> for SQLChunk {
    fn from(value: Ident) -> Self {
        SQLChunk::Ident(value)
    }
}

impl From<&Ident> for SQLChunk {
    fn from(value: &Ident) -> Self {
        SQLChunk::Ident(value.clone())
    }
}

impl From<Value> for SQLChunk {
    fn from(value: Value) -> Self {
        SQLChunk::Param(value)
    }
}

/// Spacing rule between two adjacent chunks.
pub(crate) fn chunk_needs_space(current: &SQLChunk, next: &SQLChunk) -> bool {
    // Function openers like `UPPER(` hug their argument
    if let SQLChunk::Raw(text) = current
        && text.ends_with('(')
    {
        return false;
    }

    match (current, next) {
        // No space before closing/separator punctuation
        (_, SQLChunk::Token(Token::RPAREN | Token::COMMA)) => false,
        // No space after opening punctuation
        (SQLChunk::Token(Token::LPAREN), _) => false,
        // Space after comma
        (SQLChunk::Token(Token::COMMA), _) => true,
        // Space after closing paren if next is word-like (e.g., ") VALUES")
        (SQLChunk::Token(Token::RPAREN), next) => next.is_word_like(),
        // Space before opening paren if preceded by word-like (e.g., "IN (")
        (current, SQLChunk::Token(Token::LPAREN)) => current.is_word_like(),
        // Space around comparison operators
        (SQLChunk::Token(t), _) if t.is_operator() => true,
        (_, SQLChunk::Token(t)) if t.is_operator() => true,
        // Space between all word-like chunks
        _ => current.is_word_like() && next.is_word_like(),
    }
}
