//! `quire.toml` loading.
//!
//! ```toml
//! rest_root = "/rest/v1/"
//!
//! [database]
//! path = "data/quire.db"
//! max_open = 25
//!
//! [query]
//! unknown_operator = "reject"
//!
//! [tables.help_requests]
//! foreign_keys = { user_id = "users", book_id = "books" }
//! event = "help_request"
//! ```

use crate::service::ServiceOptions;
use quire_core::{Ident, Policies, TablePolicy};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "quire.toml";
pub const DB_PATH_ENV: &str = "QUIRE_DB_PATH";
pub const DEFAULT_REST_ROOT: &str = "/rest/v1/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuireConfig {
    /// URL prefix in front of the table name
    pub rest_root: String,
    #[cfg(feature = "sqlite")]
    pub database: quire_sqlite::PoolConfig,
    pub query: ServiceOptions,
    /// Per-table policies. Absent means the book-companion preset; present
    /// (even empty) replaces it.
    pub tables: Option<BTreeMap<Ident, TablePolicy>>,
}

impl Default for QuireConfig {
    fn default() -> Self {
        Self {
            rest_root: DEFAULT_REST_ROOT.to_string(),
            #[cfg(feature = "sqlite")]
            database: quire_sqlite::PoolConfig::default(),
            query: ServiceOptions::default(),
            tables: None,
        }
    }
}

impl QuireConfig {
    /// Loads `quire.toml` from the working directory, or defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        let config = if path.exists() {
            Self::read(path)?
        } else {
            Self::default()
        };
        Ok(config.with_env())
    }

    /// Loads a specific file; it must exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::read(path.as_ref())?.with_env())
    }

    pub fn from_toml_str(raw: &str, path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.into(),
            source: Box::new(source),
        })
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw, path)
    }

    fn with_env(self) -> Self {
        self.with_db_override(std::env::var_os(DB_PATH_ENV).map(PathBuf::from))
    }

    /// Applies a database path override, as `QUIRE_DB_PATH` does.
    pub fn with_db_override(mut self, path: Option<PathBuf>) -> Self {
        #[cfg(feature = "sqlite")]
        if let Some(path) = path {
            tracing::debug!(path = %path.display(), "database path overridden");
            self.database.path = path;
        }
        #[cfg(not(feature = "sqlite"))]
        let _ = path;
        self
    }

    pub fn policies(&self) -> Policies {
        match &self.tables {
            Some(tables) => tables
                .iter()
                .map(|(table, policy)| (table.clone(), policy.clone()))
                .collect(),
            None => Policies::book_companion(),
        }
    }

    pub fn service_options(&self) -> ServiceOptions {
        self.query
    }
}
