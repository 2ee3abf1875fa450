//! Dialect strategy for rendering bind markers and dialect-specific operators.
//!
//! SQL is built once in a dialect-neutral form; a [`Dialect`] is picked once
//! per backend and decides how each parameter marker is spelled. Supporting a
//! new backend means adding one impl here.

use crate::{SQL, Value};
use std::borrow::Cow;

pub trait Dialect: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Renders the bind marker for the parameter at the given 1-based index.
    ///
    /// Returns `Cow::Borrowed("?")` for positional dialects (zero allocation)
    /// and `Cow::Owned` for numbered ones.
    ///
    /// # Examples
    /// - PostgreSQL: `$1`, `$2`, `$3`
    /// - SQLite: `?`
    fn bind_marker(&self, index: usize) -> Cow<'static, str>;

    /// Whether the dialect has a native case-insensitive `ILIKE`.
    fn native_ilike(&self) -> bool {
        false
    }

    /// Whether `OFFSET` needs a preceding `LIMIT` clause.
    fn offset_requires_limit(&self) -> bool {
        false
    }

    /// A one-row, one-column count of base tables named `table`.
    fn table_exists_query(&self, table: &str) -> SQL {
        SQL::raw("SELECT COUNT(*) FROM information_schema.tables WHERE table_name =")
            .push(Value::from(table))
    }
}

/// SQLite: positional `?` markers, no `ILIKE`, `OFFSET` only after `LIMIT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    #[inline]
    fn bind_marker(&self, _index: usize) -> Cow<'static, str> {
        Cow::Borrowed("?")
    }

    fn offset_requires_limit(&self) -> bool {
        true
    }

    fn table_exists_query(&self, table: &str) -> SQL {
        SQL::raw("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name =")
            .push(Value::from(table))
    }
}

/// PostgreSQL: numbered `$n` markers and native `ILIKE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    #[inline]
    fn bind_marker(&self, index: usize) -> Cow<'static, str> {
        Cow::Owned(format!("${index}"))
    }

    fn native_ilike(&self) -> bool {
        true
    }
}

/// Dialect-neutral rendering: every marker is `?`. Used for logging and for
/// asserting on statement shape independent of a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Neutral;

impl Dialect for Neutral {
    fn name(&self) -> &'static str {
        "neutral"
    }

    #[inline]
    fn bind_marker(&self, _index: usize) -> Cow<'static, str> {
        Cow::Borrowed("?")
    }
}
