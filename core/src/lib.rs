//! # quire-core
//!
//! The query half of quire: a URL query grammar is parsed into a
//! [`QueryPlan`](plan::QueryPlan), compiled by the [`builder`] into
//! dialect-neutral [`SQL`](sql::SQL), and rendered for a concrete backend
//! through a [`Dialect`](dialect::Dialect).
//!
//! ```
//! use quire_core::{Ident, ParseOptions, QueryBuilder, QueryParams, parse_query};
//! use quire_core::dialect::SqliteDialect;
//!
//! let params = QueryParams::from_query_string("age.gte=18&order=name.desc&limit=10");
//! let plan = parse_query(&params, &ParseOptions::default()).unwrap();
//! let table = Ident::new("users").unwrap();
//! let stmt = QueryBuilder::new(&SqliteDialect)
//!     .select(&table, &plan)
//!     .render(&SqliteDialect);
//!
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT * FROM users WHERE age >= ? ORDER BY name DESC LIMIT ?"
//! );
//! ```

pub mod builder;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod ident;
pub mod params;
pub mod parser;
pub mod plan;
pub mod policy;
pub mod row;
pub mod sql;
mod tracing;
pub mod value;

pub use builder::QueryBuilder;
pub use dialect::Dialect;
pub use error::{QueryError, Result};
pub use executor::{CancelToken, Executor, Interrupt, InterruptGuard};
pub use ident::Ident;
pub use params::QueryParams;
pub use parser::{ParseOptions, UnknownOperatorPolicy, parse_query};
pub use plan::{Filter, Operand, Operator, OrderSpec, QueryPlan, RelationSpec, Selection};
pub use policy::{Policies, TablePolicy};
pub use row::{Record, Row};
pub use sql::{SQL, SQLChunk, Statement, Token};
pub use value::Value;

#[cfg(feature = "tracing")]
#[doc(hidden)]
pub use ::tracing as __tracing;
