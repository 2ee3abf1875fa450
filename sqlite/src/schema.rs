//! Bundled DDL for the reading-companion backend.
//!
//! Every table has a text `id` primary key plus `created_at`/`updated_at`
//! columns, which the generic handler fills in on insert.

use crate::{error::SqliteError, pool::SqlitePool};
use rusqlite::{Connection, OptionalExtension};

pub const BOOK_COMPANION: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT,
    first_name TEXT,
    last_name TEXT,
    role TEXT NOT NULL DEFAULT 'reader',
    is_verified INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    author TEXT,
    description TEXT,
    category_id TEXT REFERENCES categories(id),
    total_pages INTEGER,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS chapters (
    id TEXT PRIMARY KEY,
    book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    title TEXT,
    number INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS sections (
    id TEXT PRIMARY KEY,
    chapter_id TEXT REFERENCES chapters(id) ON DELETE CASCADE,
    book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    page_number INTEGER,
    section_number INTEGER,
    content TEXT,
    word_count INTEGER,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS help_requests (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    book_id TEXT NOT NULL REFERENCES books(id),
    section_id TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    content TEXT NOT NULL,
    context TEXT,
    assigned_to TEXT,
    response TEXT,
    is_public INTEGER NOT NULL DEFAULT 0,
    resolved_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS interactions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    book_id TEXT NOT NULL REFERENCES books(id),
    section_id TEXT,
    interaction_type TEXT,
    question TEXT,
    response TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS reading_progress (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    book_id TEXT NOT NULL REFERENCES books(id),
    chapter_id TEXT,
    section_id TEXT,
    last_page INTEGER,
    last_read_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS verification_codes (
    id TEXT PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    book_id TEXT REFERENCES books(id),
    is_used INTEGER NOT NULL DEFAULT 0,
    used_by TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_help_requests_user ON help_requests(user_id);
CREATE INDEX IF NOT EXISTS idx_interactions_user_book ON interactions(user_id, book_id);
CREATE INDEX IF NOT EXISTS idx_reading_progress_user_book ON reading_progress(user_id, book_id);
CREATE INDEX IF NOT EXISTS idx_sections_book ON sections(book_id, page_number);
"#;

/// Applies `ddl` in one batch. The bundled DDL is idempotent.
pub fn apply_schema(conn: &Connection, ddl: &str) -> Result<(), SqliteError> {
    conn.execute_batch(ddl)?;
    Ok(())
}

pub fn table_exists(conn: &Connection, name: &str) -> Result<bool, SqliteError> {
    let found = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

impl SqlitePool {
    /// Applies the bundled schema on a pooled connection.
    pub fn apply_schema(&self) -> quire_core::Result<()> {
        let conn = self.get()?;
        apply_schema(&conn, BOOK_COMPANION)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_schema_applies_twice() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn, BOOK_COMPANION).unwrap();
        apply_schema(&conn, BOOK_COMPANION).unwrap();
        for table in [
            "users",
            "books",
            "categories",
            "chapters",
            "sections",
            "help_requests",
            "interactions",
            "reading_progress",
            "verification_codes",
        ] {
            assert!(table_exists(&conn, table).unwrap(), "{table}");
        }
        assert!(!table_exists(&conn, "nope").unwrap());
    }
}
