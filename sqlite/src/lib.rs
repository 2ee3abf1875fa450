//! SQLite store for quire
//!
//! A bounded [`SqlitePool`] of rusqlite connections that implements
//! [`quire_core::Executor`]. Connections are configured with the PRAGMAs in
//! [`pragma::ConnectionPragmas`], rows are decoded from statement column
//! metadata, and a [`quire_core::CancelToken`] interrupts running statements.
//!
//! ```
//! use quire_core::{CancelToken, Executor};
//! use quire_sqlite::SqlitePool;
//!
//! let pool = SqlitePool::in_memory().unwrap();
//! pool.apply_schema().unwrap();
//!
//! let stmt = pool.dialect().table_exists_query("books").render(pool.dialect());
//! let rows = pool.query(&stmt, &CancelToken::new()).unwrap();
//! assert_eq!(rows[0].iter().next().unwrap().1.as_i64(), Some(1));
//! ```

pub mod error;
mod executor;
pub mod pool;
pub mod pragma;
pub mod schema;

pub use error::SqliteError;
pub use pool::{PoolConfig, PoolStats, PooledConnection, SqlitePool};
pub use schema::{BOOK_COMPANION, apply_schema, table_exists};
