//! Bounded rusqlite connection pool.
//!
//! The pool is an explicit object: open it once at startup, share it behind an
//! `Arc`, and [`close`](SqlitePool::close) it on shutdown. Checkouts block
//! while `max_open` connections are in use and give up after
//! `acquire_timeout`.

use crate::{error::SqliteError, pragma::ConnectionPragmas};
use parking_lot::{Condvar, Mutex};
use quire_core::{QueryError, quire_trace_pool};
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::{
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

pub const MEMORY: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Database file, or `:memory:`
    pub path: PathBuf,
    pub max_open: usize,
    pub max_idle: usize,
    #[serde(rename = "acquire_timeout_ms", with = "millis")]
    pub acquire_timeout: Duration,
    /// Per-statement budget; zero disables it.
    #[serde(rename = "statement_timeout_ms", with = "millis")]
    pub statement_timeout: Duration,
    #[serde(flatten)]
    pub pragmas: ConnectionPragmas,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(MEMORY),
            max_open: 25,
            max_idle: 5,
            acquire_timeout: Duration::from_secs(30),
            statement_timeout: Duration::ZERO,
            pragmas: ConnectionPragmas::default(),
        }
    }
}

impl PoolConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn is_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY
    }

    pub fn statement_timeout(&self) -> Option<Duration> {
        (!self.statement_timeout.is_zero()).then_some(self.statement_timeout)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub open: usize,
    pub idle: usize,
}

struct State {
    idle: Vec<Connection>,
    open: usize,
    closed: bool,
}

pub struct SqlitePool {
    config: PoolConfig,
    state: Mutex<State>,
    available: Condvar,
}

impl SqlitePool {
    /// Opens the pool and one connection to validate the path and PRAGMAs.
    ///
    /// An in-memory database is private to its connection, so the pool is
    /// clamped to a single connection that is never dropped.
    pub fn open(mut config: PoolConfig) -> Result<Self, SqliteError> {
        if config.is_memory() {
            config.max_open = 1;
            config.max_idle = 1;
        }
        config.max_open = config.max_open.max(1);
        config.max_idle = config.max_idle.min(config.max_open);

        let first = open_connection(&config)?;
        quire_trace_pool!("open", 1usize);

        Ok(Self {
            config,
            state: Mutex::new(State {
                idle: vec![first],
                open: 1,
                closed: false,
            }),
            available: Condvar::new(),
        })
    }

    pub fn in_memory() -> Result<Self, SqliteError> {
        Self::open(PoolConfig::in_memory())
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Checks out a connection, waiting up to the acquire timeout.
    pub fn get(&self) -> Result<PooledConnection<'_>, QueryError> {
        let deadline = Instant::now() + self.config.acquire_timeout;
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(QueryError::PoolClosed);
            }
            if let Some(conn) = state.idle.pop() {
                quire_trace_pool!("checkout", state.idle.len());
                return Ok(PooledConnection {
                    pool: self,
                    conn: Some(conn),
                });
            }
            if state.open < self.config.max_open {
                state.open += 1;
                drop(state);
                return match open_connection(&self.config) {
                    Ok(conn) => {
                        quire_trace_pool!("connect", 0usize);
                        Ok(PooledConnection {
                            pool: self,
                            conn: Some(conn),
                        })
                    }
                    Err(err) => {
                        self.state.lock().open -= 1;
                        self.available.notify_one();
                        Err(err.into())
                    }
                };
            }
            if self
                .available
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return Err(QueryError::PoolTimeout);
            }
        }
    }

    fn release(&self, conn: Connection) {
        let mut state = self.state.lock();
        if state.closed || state.idle.len() >= self.config.max_idle {
            state.open -= 1;
            drop(state);
            drop(conn);
        } else {
            state.idle.push(conn);
            quire_trace_pool!("release", state.idle.len());
            drop(state);
        }
        self.available.notify_one();
    }

    /// Drops idle connections and fails every later checkout. Connections
    /// still checked out are closed when returned.
    pub fn close(&self) {
        let idle = {
            let mut state = self.state.lock();
            state.closed = true;
            let idle = std::mem::take(&mut state.idle);
            state.open -= idle.len();
            idle
        };
        drop(idle);
        quire_trace_pool!("close", 0usize);
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            open: state.open,
            idle: state.idle.len(),
        }
    }
}

impl core::fmt::Debug for SqlitePool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SqlitePool")
            .field("path", &self.config.path)
            .field("stats", &self.stats())
            .finish()
    }
}

fn open_connection(config: &PoolConfig) -> Result<Connection, SqliteError> {
    let conn = if config.is_memory() {
        Connection::open_in_memory()
    } else {
        Connection::open_with_flags(
            &config.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
                | OpenFlags::SQLITE_OPEN_URI,
        )
    }
    .map_err(|source| SqliteError::Open {
        path: config.path.clone(),
        source,
    })?;

    for pragma in config.pragmas.statements() {
        let sql = pragma.to_sql().sql();
        // journal_mode answers with a row, so it cannot go through `execute`.
        conn.execute_batch(&sql)
            .map_err(|source| SqliteError::Pragma { pragma: sql, source })?;
    }
    Ok(conn)
}

/// A checked-out connection, returned to the pool on drop.
pub struct PooledConnection<'p> {
    pool: &'p SqlitePool,
    conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only taken in Drop.
        self.conn.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
