//! # quire
//!
//! A generic REST-over-SQL gateway. One handler serves every table: the URL
//! query string becomes a filtered, ordered, paged and relation-embedding
//! `SELECT`, and JSON bodies become `INSERT`/`UPDATE`/`DELETE` statements.
//!
//! ## Quick Start
//!
//! ```rust
//! use quire::{CancelToken, Method, Rest, RestRequest, TableService};
//! use quire::sqlite::SqlitePool;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let pool = Arc::new(SqlitePool::in_memory().unwrap());
//! pool.apply_schema().unwrap();
//! let rest = Rest::new(TableService::new(pool));
//! let cancel = CancelToken::new();
//!
//! let created = rest.handle(
//!     RestRequest::new(Method::Post, "books").with_body(json!({"title": "Dune"})),
//!     &cancel,
//! );
//! assert_eq!(created.status, 201);
//!
//! let found = rest.handle(
//!     RestRequest::new(Method::Get, "books").with_query("select=title&title=Dune"),
//!     &cancel,
//! );
//! assert_eq!(found.body, json!([{"title": "Dune"}]));
//! ```
//!
//! ## Query grammar
//!
//! | Parameter            | Meaning                                          |
//! |----------------------|--------------------------------------------------|
//! | `select=a,b,t:fk(c)` | columns, plus `t` embedded by `t.id = row.fk`    |
//! | `col.op=value`       | filter; `op` is eq, neq, gt, gte, lt, lte, like, ilike, is, in |
//! | `col=op.value`       | the same filter, operator on the value side      |
//! | `order=a.desc,b`     | sort                                             |
//! | `limit=n&offset=m`   | paging                                           |

pub mod config;
pub mod events;
mod relations;
pub mod rest;
pub mod rpc;
pub mod service;

// =============================================================================
// Root-level exports
// =============================================================================

pub use config::{ConfigError, QuireConfig};
pub use events::{BroadcastSink, EventSink, NoopSink, TableEvent};
pub use relations::BATCH_SIZE;
pub use rest::{Method, Rest, RestRequest, RestResponse};
pub use rpc::RpcRegistry;
pub use service::{Created, JsonObject, RelationStrategy, ServiceOptions, TableService, WriteSummary};

/// Query engine types shared with every store
pub use quire_core::{
    CancelToken, Executor, Ident, Policies, QueryError, QueryParams, Result, TablePolicy,
    UnknownOperatorPolicy, Value,
};

/// The query engine: parser, plan, builder, dialects.
pub use quire_core as core;

// =============================================================================
// SQLite store
// =============================================================================

/// Pooled rusqlite store and the bundled schema.
#[cfg(feature = "sqlite")]
pub use quire_sqlite as sqlite;

#[cfg(feature = "sqlite")]
impl TableService {
    /// Builds a service from a loaded config, opening the configured pool.
    pub fn from_config(
        config: &QuireConfig,
    ) -> std::result::Result<(Self, std::sync::Arc<quire_sqlite::SqlitePool>), quire_sqlite::SqliteError> {
        let pool = std::sync::Arc::new(quire_sqlite::SqlitePool::open(config.database.clone())?);
        let service = TableService::new(pool.clone())
            .with_policies(config.policies())
            .with_options(config.service_options());
        Ok((service, pool))
    }
}
