//! quire CLI - run REST requests against a local SQLite database
//!
//! ```text
//! quire init
//! quire post books --body '{"title": "Dune"}'
//! quire get books --query 'select=title&order=created_at.desc&limit=2'
//! quire patch books --query 'title=Dune' --body '{"author": "Herbert"}'
//! quire delete books --query 'id=eq.42'
//! quire check-table books
//! ```
//!
//! Configuration comes from `quire.toml` (or `--config`); `--db` and
//! `QUIRE_DB_PATH` override the database path.

pub mod error;
pub mod output;

pub use error::CliError;
