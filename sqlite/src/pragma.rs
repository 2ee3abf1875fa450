//! SQLite PRAGMA statements used to configure pooled connections
//!
//! PRAGMA statements are SQL extensions specific to SQLite that modify the
//! operation of the library or query it for internal data.
//!
//! [SQLite PRAGMA Documentation](https://sqlite.org/pragma.html)
//!
//! ## Examples
//!
//! ```
//! use quire_sqlite::pragma::{JournalMode, Pragma};
//!
//! let pragma = Pragma::ForeignKeys(true);
//! assert_eq!(pragma.to_sql().sql(), "PRAGMA foreign_keys = ON");
//!
//! let pragma = Pragma::JournalMode(JournalMode::Wal);
//! assert_eq!(pragma.to_sql().sql(), "PRAGMA journal_mode = WAL");
//! ```

use quire_core::{SQL, SQLChunk, Token};
use serde::{Deserialize, Serialize};

/// Journal modes for SQLite databases
///
/// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_journal_mode)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    /// Delete journal file after each transaction
    Delete,
    /// Truncate journal file after each transaction
    Truncate,
    /// Keep journal file persistent
    Persist,
    /// Store journal in memory
    Memory,
    /// Write-Ahead Logging mode
    #[default]
    Wal,
    /// Disable journaling
    Off,
}

impl JournalMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

/// Synchronous modes for SQLite databases
///
/// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_synchronous)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Synchronous {
    /// No syncing - fastest but least safe
    Off,
    /// Sync at critical moments - good balance with WAL
    #[default]
    Normal,
    /// Sync frequently - safest but slower
    Full,
    /// Like FULL with additional syncing
    Extra,
}

impl Synchronous {
    pub const fn as_str(self) -> &'static str {
        match self {
            Synchronous::Off => "OFF",
            Synchronous::Normal => "NORMAL",
            Synchronous::Full => "FULL",
            Synchronous::Extra => "EXTRA",
        }
    }
}

/// Storage modes for temporary tables and indices
///
/// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_temp_store)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempStore {
    Default,
    File,
    #[default]
    Memory,
}

impl TempStore {
    pub const fn as_str(self) -> &'static str {
        match self {
            TempStore::Default => "DEFAULT",
            TempStore::File => "FILE",
            TempStore::Memory => "MEMORY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pragma {
    /// Suggest maximum number of database disk pages in memory. Negative
    /// values are a size in KiB.
    ///
    /// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_cache_size)
    ///
    /// # Example
    /// ```
    /// # use quire_sqlite::pragma::Pragma;
    /// let pragma = Pragma::CacheSize(-20000);
    /// assert_eq!(pragma.to_sql().sql(), "PRAGMA cache_size = -20000");
    /// ```
    CacheSize(i32),

    /// Enforcement of foreign key constraints
    ///
    /// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_foreign_keys)
    ForeignKeys(bool),

    /// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_journal_mode)
    JournalMode(JournalMode),

    /// WAL auto-checkpoint threshold (pages)
    ///
    /// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_wal_autocheckpoint)
    WalAutocheckpoint(i32),

    /// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_synchronous)
    Synchronous(Synchronous),

    /// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_temp_store)
    TempStore(TempStore),

    /// Milliseconds to wait on a locked database
    ///
    /// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_busy_timeout)
    BusyTimeout(u32),
}

fn assign(name: &'static str, value: impl Into<std::borrow::Cow<'static, str>>) -> SQL {
    SQL::raw(name)
        .push(Token::EQ)
        .push(SQLChunk::Raw(value.into()))
}

const fn on_off(enabled: bool) -> &'static str {
    if enabled { "ON" } else { "OFF" }
}

impl Pragma {
    pub fn to_sql(&self) -> SQL {
        match self {
            Pragma::CacheSize(size) => assign("PRAGMA cache_size", size.to_string()),
            Pragma::ForeignKeys(enabled) => assign("PRAGMA foreign_keys", on_off(*enabled)),
            Pragma::JournalMode(mode) => assign("PRAGMA journal_mode", mode.as_str()),
            Pragma::WalAutocheckpoint(pages) => {
                assign("PRAGMA wal_autocheckpoint", pages.to_string())
            }
            Pragma::Synchronous(mode) => assign("PRAGMA synchronous", mode.as_str()),
            Pragma::TempStore(store) => assign("PRAGMA temp_store", store.as_str()),
            Pragma::BusyTimeout(ms) => assign("PRAGMA busy_timeout", ms.to_string()),
        }
    }
}

/// The PRAGMAs every pooled connection runs after opening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionPragmas {
    pub journal_mode: JournalMode,
    pub synchronous: Synchronous,
    pub foreign_keys: bool,
    pub busy_timeout_ms: u32,
    pub wal_autocheckpoint: i32,
    pub cache_size_kib: u32,
    pub temp_store: TempStore,
}

impl Default for ConnectionPragmas {
    fn default() -> Self {
        Self {
            journal_mode: JournalMode::Wal,
            synchronous: Synchronous::Normal,
            foreign_keys: true,
            busy_timeout_ms: 5000,
            wal_autocheckpoint: 1000,
            cache_size_kib: 20000,
            temp_store: TempStore::Memory,
        }
    }
}

impl ConnectionPragmas {
    /// Statements in the order they are applied.
    pub fn statements(&self) -> Vec<Pragma> {
        let cache_size = i32::try_from(self.cache_size_kib).unwrap_or(i32::MAX);
        vec![
            Pragma::JournalMode(self.journal_mode),
            Pragma::Synchronous(self.synchronous),
            Pragma::ForeignKeys(self.foreign_keys),
            Pragma::BusyTimeout(self.busy_timeout_ms),
            Pragma::WalAutocheckpoint(self.wal_autocheckpoint),
            Pragma::CacheSize(-cache_size),
            Pragma::TempStore(self.temp_store),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_connection_setup() {
        let sql: Vec<String> = ConnectionPragmas::default()
            .statements()
            .iter()
            .map(|p| p.to_sql().sql())
            .collect();
        assert_eq!(
            sql,
            [
                "PRAGMA journal_mode = WAL",
                "PRAGMA synchronous = NORMAL",
                "PRAGMA foreign_keys = ON",
                "PRAGMA busy_timeout = 5000",
                "PRAGMA wal_autocheckpoint = 1000",
                "PRAGMA cache_size = -20000",
                "PRAGMA temp_store = MEMORY",
            ]
        );
    }

    #[test]
    fn modes_deserialize_lowercase() {
        let pragmas: ConnectionPragmas =
            toml::from_str("journal_mode = \"delete\"\nsynchronous = \"full\"").unwrap();
        assert_eq!(pragmas.journal_mode, JournalMode::Delete);
        assert_eq!(pragmas.synchronous, Synchronous::Full);
        assert!(pragmas.foreign_keys);
    }
}
