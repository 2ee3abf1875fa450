//! Named remote procedures (`POST /rpc/{name}` in the host).

use hashbrown::HashMap;
use quire_core::{CancelToken, Executor, Ident, QueryError, Result};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub type RpcHandler =
    dyn Fn(&dyn Executor, serde_json::Value, &CancelToken) -> Result<serde_json::Value> + Send + Sync;

/// Name → handler.
#[derive(Clone)]
pub struct RpcRegistry {
    handlers: HashMap<String, Arc<RpcHandler>>,
}

impl RpcRegistry {
    /// A registry with no procedures.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry with the built-in procedures.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("check_table_exists", check_table_exists);
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&dyn Executor, serde_json::Value, &CancelToken) -> Result<serde_json::Value>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn call(
        &self,
        name: &str,
        executor: &dyn Executor,
        params: serde_json::Value,
        cancel: &CancelToken,
    ) -> Result<serde_json::Value> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| QueryError::UnknownRpc(name.to_string()))?;
        tracing::info!(rpc = name, "calling");
        handler(executor, params, cancel)
    }
}

impl Default for RpcRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for RpcRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

#[derive(Deserialize)]
struct TableName {
    table_name: String,
}

/// `{"table_name": "books"}` → `{"exists": true}`
pub fn check_table_exists(
    executor: &dyn Executor,
    params: serde_json::Value,
    cancel: &CancelToken,
) -> Result<serde_json::Value> {
    let TableName { table_name } = serde_json::from_value(params)
        .map_err(|err| QueryError::InvalidBody(err.to_string()))?;
    let table = Ident::new(&table_name)?;

    let dialect = executor.dialect();
    let stmt = dialect.table_exists_query(table.as_str()).render(dialect);
    let rows = executor.query(&stmt, cancel)?;
    let count = rows
        .first()
        .and_then(|row| row.iter().next())
        .and_then(|(_, v)| v.as_i64())
        .unwrap_or(0);
    Ok(json!({ "exists": count > 0 }))
}
