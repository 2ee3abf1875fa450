//! Tracing utilities for query observability.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! Without it the macros compile to nothing, so call sites need no `#[cfg]`.

/// Emit a debug-level tracing event with the SQL text and parameter count.
///
/// ```ignore
/// quire_trace_query!(&stmt.sql, stmt.params.len());
/// ```
#[cfg(feature = "tracing")]
#[macro_export]
macro_rules! quire_trace_query {
    ($sql:expr, $param_count:expr) => {
        $crate::__tracing::debug!(sql = %$sql, params = $param_count, "quire.query")
    };
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! quire_trace_query {
    ($sql:expr, $param_count:expr) => {{
        let _ = (&$sql, &$param_count);
    }};
}

/// Emit a debug-level tracing event for a connection pool lifecycle step
/// (`open`, `checkout`, `release`, `close`).
///
/// ```ignore
/// quire_trace_pool!("checkout", idle.len());
/// ```
#[cfg(feature = "tracing")]
#[macro_export]
macro_rules! quire_trace_pool {
    ($event:literal, $idle:expr) => {
        $crate::__tracing::debug!(event = $event, idle = $idle, "quire.pool")
    };
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! quire_trace_pool {
    ($event:literal, $idle:expr) => {{
        let _ = &$idle;
    }};
}
