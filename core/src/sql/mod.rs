mod chunk;
mod tokens;

use crate::{Ident, Value, dialect::Dialect};
pub use chunk::SQLChunk;
use chunk::chunk_needs_space;
use core::fmt;
use smallvec::SmallVec;
use std::borrow::Cow;
pub use tokens::Token;

/// SQL fragment builder with flat chunk storage.
///
/// Fragments carry their bound values inline, so a fragment is
/// dialect-neutral until [`SQL::render`] turns it into a [`Statement`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SQL {
    pub chunks: SmallVec<[SQLChunk; 16]>,
}

impl SQL {
    /// Creates an empty SQL fragment
    #[inline]
    pub const fn empty() -> Self {
        Self {
            chunks: SmallVec::new_const(),
        }
    }

    /// Creates SQL with a single token
    #[inline]
    pub fn token(t: Token) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Token(t)],
        }
    }

    /// Creates SQL naming a validated identifier
    #[inline]
    pub fn ident(name: &Ident) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Ident(name.clone())],
        }
    }

    /// Creates SQL with fixed text
    #[inline]
    pub fn raw(text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Raw(text.into())],
        }
    }

    /// Creates SQL with a single bound value
    #[inline]
    pub fn param(value: impl Into<Value>) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Param(value.into())],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    // ==================== builder methods ====================

    /// Append another SQL fragment (flat extend)
    #[inline]
    pub fn append(mut self, other: SQL) -> Self {
        self.append_mut(other);
        self
    }

    #[inline]
    pub fn append_mut(&mut self, other: SQL) {
        if self.chunks.is_empty() {
            self.chunks = other.chunks;
        } else {
            self.chunks.extend(other.chunks);
        }
    }

    /// Push a single chunk
    #[inline]
    pub fn push(mut self, chunk: impl Into<SQLChunk>) -> Self {
        self.chunks.push(chunk.into());
        self
    }

    #[inline]
    pub fn push_mut(&mut self, chunk: impl Into<SQLChunk>) {
        self.chunks.push(chunk.into());
    }

    // ==================== combinators ====================

    /// Joins multiple SQL fragments with a separator
    pub fn join<I>(sqls: I, separator: Token) -> SQL
    where
        I: IntoIterator<Item = SQL>,
    {
        let mut iter = sqls.into_iter();
        let Some(mut result) = iter.next() else {
            return SQL::empty();
        };
        for other in iter {
            result.chunks.push(SQLChunk::Token(separator));
            result.chunks.extend(other.chunks);
        }
        result
    }

    /// Comma-separated identifiers: `a, b, c`
    pub fn ident_list<'i>(idents: impl IntoIterator<Item = &'i Ident>) -> SQL {
        SQL::join(idents.into_iter().map(SQL::ident), Token::COMMA)
    }

    /// Comma-separated bound values: `?, ?, ?`
    pub fn param_list(values: impl IntoIterator<Item = Value>) -> SQL {
        SQL::join(values.into_iter().map(SQL::param), Token::COMMA)
    }

    /// Wrap in parentheses: (self)
    #[inline]
    pub fn parens(self) -> Self {
        SQL::token(Token::LPAREN).append(self).push(Token::RPAREN)
    }

    // ==================== output methods ====================

    /// Returns an iterator over the bound values in marker order
    pub fn params(&self) -> impl Iterator<Item = &Value> {
        self.chunks.iter().filter_map(|chunk| match chunk {
            SQLChunk::Param(value) => Some(value),
            _ => None,
        })
    }

    /// Renders the fragment for a dialect, numbering markers from 1.
    pub fn render(&self, dialect: &dyn Dialect) -> Statement {
        let mut sql = String::with_capacity(self.chunks.len().saturating_mul(8).max(64));
        let mut params = Vec::new();

        for (i, chunk) in self.chunks.iter().enumerate() {
            match chunk {
                SQLChunk::Param(value) => {
                    params.push(value.clone());
                    sql.push_str(&dialect.bind_marker(params.len()));
                }
                other => other.write_text(&mut sql),
            }
            if let Some(next) = self.chunks.get(i + 1)
                && chunk_needs_space(chunk, next)
            {
                sql.push(' ');
            }
        }

        Statement { sql, params }
    }

    /// Renders with dialect-neutral `?` markers.
    pub fn sql(&self) -> String {
        self.render(&crate::dialect::Neutral).sql
    }
}

impl From<Token> for SQL {
    fn from(value: Token) -> Self {
        SQL::token(value)
    }
}

impl fmt::Display for SQL {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql())
    }
}

/// A rendered statement: SQL text in a concrete dialect plus its positional
/// arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, r#"sql: "{}", params: {:?}"#, self.sql, self.params)
    }
}
