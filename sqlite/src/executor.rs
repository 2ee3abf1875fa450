//! [`Executor`] over the pool.

use crate::{error::SqliteError, pool::SqlitePool};
use parking_lot::{Condvar, Mutex};
use quire_core::{
    CancelToken, Executor, Interrupt, QueryError, Result, Row, Statement, Value,
    dialect::{Dialect, SqliteDialect},
    quire_trace_query,
};
use rusqlite::{Connection, InterruptHandle, params_from_iter};
use std::{sync::Arc, thread::JoinHandle, time::Instant};

struct SqliteInterrupt(InterruptHandle);

impl Interrupt for SqliteInterrupt {
    fn interrupt(&self) {
        self.0.interrupt();
    }
}

/// Interrupts the connection once `deadline` passes, unless dropped first.
struct Watchdog {
    done: Arc<(Mutex<bool>, Condvar)>,
    thread: Option<JoinHandle<()>>,
}

impl Watchdog {
    fn arm(deadline: Instant, handle: InterruptHandle) -> Self {
        let done = Arc::new((Mutex::new(false), Condvar::new()));
        let thread = {
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                let (lock, finished) = &*done;
                let mut stopped = lock.lock();
                while !*stopped {
                    if finished.wait_until(&mut stopped, deadline).timed_out() {
                        if !*stopped {
                            handle.interrupt();
                        }
                        break;
                    }
                }
            })
        };
        Self {
            done,
            thread: Some(thread),
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        let (lock, finished) = &*self.done;
        *lock.lock() = true;
        finished.notify_all();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl SqlitePool {
    /// Runs `f` on a pooled connection with the token wired to SQLite's
    /// interrupt handle for the duration of the call. The token deadline and
    /// the pool's `statement_timeout`, whichever comes first, interrupt the
    /// statement when they pass.
    fn with_connection<T>(
        &self,
        cancel: &CancelToken,
        f: impl FnOnce(&Connection, Option<Instant>) -> std::result::Result<T, SqliteError>,
    ) -> Result<T> {
        cancel.check()?;
        let conn = self.get()?;
        let _guard = cancel.register(Arc::new(SqliteInterrupt(conn.get_interrupt_handle())));

        let deadline = match (cancel.deadline(), self.config().statement_timeout()) {
            (Some(d), Some(t)) => Some(d.min(Instant::now() + t)),
            (d, t) => d.or_else(|| t.map(|t| Instant::now() + t)),
        };
        let watchdog = deadline.map(|d| Watchdog::arm(d, conn.get_interrupt_handle()));

        let result = f(&conn, deadline);
        drop(watchdog);
        match result {
            Ok(value) => Ok(value),
            Err(_) if cancel.is_cancelled() || past(deadline) => Err(QueryError::Cancelled),
            Err(err) => Err(err.into()),
        }
    }
}

fn past(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

impl Executor for SqlitePool {
    fn dialect(&self) -> &dyn Dialect {
        &SqliteDialect
    }

    fn query(&self, stmt: &Statement, cancel: &CancelToken) -> Result<Vec<Row>> {
        quire_trace_query!(stmt.sql, stmt.params.len());
        let mut timed_out = false;
        let rows = self.with_connection(cancel, |conn, deadline| {
            let mut prepared = conn.prepare_cached(&stmt.sql)?;
            let columns: Vec<String> = prepared
                .column_names()
                .into_iter()
                .map(str::to_owned)
                .collect();

            let mut rows = prepared.query(params_from_iter(stmt.params.iter()))?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                if past(deadline) {
                    timed_out = true;
                    break;
                }
                let mut decoded = Row::with_capacity(columns.len());
                for (i, name) in columns.iter().enumerate() {
                    decoded.push(name.clone(), Value::from(row.get_ref(i)?));
                }
                out.push(decoded);
            }
            Ok(out)
        })?;
        if timed_out {
            return Err(QueryError::Cancelled);
        }
        Ok(rows)
    }

    fn execute(&self, stmt: &Statement, cancel: &CancelToken) -> Result<usize> {
        quire_trace_query!(stmt.sql, stmt.params.len());
        self.with_connection(cancel, |conn, _| {
            let mut prepared = conn.prepare_cached(&stmt.sql)?;
            Ok(prepared.execute(params_from_iter(stmt.params.iter()))?)
        })
    }
}
