//! Per-table rules the generic handler applies around reads and writes.

use crate::{
    CancelToken, Executor, Ident, Record, Row, Value,
    builder::QueryBuilder,
    error::{QueryError, Result},
};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablePolicy {
    /// Column → referenced table. Checked in column order before inserts.
    pub foreign_keys: BTreeMap<Ident, Ident>,
    /// Columns stored as 0/1 that read back as JSON booleans.
    pub boolean_columns: Vec<Ident>,
    /// Event kind published after a successful insert.
    pub event: Option<String>,
}

impl TablePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn foreign_key(mut self, column: Ident, referenced: Ident) -> Self {
        self.foreign_keys.insert(column, referenced);
        self
    }

    pub fn boolean(mut self, column: Ident) -> Self {
        if !self.boolean_columns.contains(&column) {
            self.boolean_columns.push(column);
        }
        self
    }

    pub fn event(mut self, kind: impl Into<String>) -> Self {
        self.event = Some(kind.into());
        self
    }

    pub fn is_boolean(&self, column: &str) -> bool {
        self.boolean_columns.iter().any(|c| c == column)
    }

    /// Rewrites allow-listed columns of `row` as booleans.
    pub fn coerce_booleans(&self, row: &mut Row) {
        if self.boolean_columns.is_empty() {
            return;
        }
        for (column, value) in row.iter_mut() {
            if self.is_boolean(column) {
                coerce_bool(value);
            }
        }
    }

    /// Verifies every configured reference present in `record` exists.
    ///
    /// Runs `SELECT COUNT(*) FROM referenced WHERE id = ?` per non-null
    /// foreign-key column and fails on the first missing row.
    pub fn check_foreign_keys(
        &self,
        table: &Ident,
        record: &Record,
        executor: &dyn Executor,
        cancel: &CancelToken,
    ) -> Result<()> {
        let builder = QueryBuilder::new(executor.dialect());
        for (column, referenced) in &self.foreign_keys {
            let Some(value) = record.get(column.as_str()) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let stmt = builder
                .count_by_id(referenced, value.clone())
                .render(executor.dialect());
            let rows = executor.query(&stmt, cancel)?;
            let count = rows
                .first()
                .and_then(|row| row.iter().next())
                .and_then(|(_, v)| v.as_i64())
                .unwrap_or(0);
            if count == 0 {
                return Err(QueryError::ForeignKeyViolation {
                    table: table.to_string(),
                    column: column.to_string(),
                    referenced: referenced.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn coerce_bool(value: &mut Value) {
    let coerced = match value {
        Value::Integer(i) => *i == 1,
        Value::Real(r) => *r == 1.0,
        Value::Text(s) => s == "1" || s == "true",
        Value::Null | Value::Bool(_) => return,
    };
    *value = Value::Bool(coerced);
}

/// Table name → [`TablePolicy`].
///
/// Tables without an entry get no foreign-key checks, no boolean coercion
/// and no events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policies {
    tables: HashMap<Ident, TablePolicy>,
}

impl Policies {
    /// A registry with no policies at all.
    pub fn empty() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// The reading-companion schema: help requests, interactions and reading
    /// progress reference users and books; three flag columns read back as
    /// booleans; new help requests are broadcast.
    pub fn book_companion() -> Self {
        let user_and_book = || {
            TablePolicy::new()
                .foreign_key(Ident::from_static("user_id"), Ident::from_static("users"))
                .foreign_key(Ident::from_static("book_id"), Ident::from_static("books"))
        };

        let mut policies = Self::empty();
        policies.insert(
            Ident::from_static("help_requests"),
            user_and_book()
                .boolean(Ident::from_static("is_public"))
                .event("help_request"),
        );
        policies.insert(Ident::from_static("interactions"), user_and_book());
        policies.insert(Ident::from_static("reading_progress"), user_and_book());
        policies.insert(
            Ident::from_static("users"),
            TablePolicy::new().boolean(Ident::from_static("is_verified")),
        );
        policies.insert(
            Ident::from_static("verification_codes"),
            TablePolicy::new().boolean(Ident::from_static("is_used")),
        );
        policies
    }

    pub fn insert(&mut self, table: Ident, policy: TablePolicy) -> Option<TablePolicy> {
        self.tables.insert(table, policy)
    }

    pub fn get(&self, table: &str) -> Option<&TablePolicy> {
        self.tables.get(table)
    }

    pub fn coerce_booleans(&self, table: &str, row: &mut Row) {
        if let Some(policy) = self.get(table) {
            policy.coerce_booleans(row);
        }
    }

    pub fn check_foreign_keys(
        &self,
        table: &Ident,
        record: &Record,
        executor: &dyn Executor,
        cancel: &CancelToken,
    ) -> Result<()> {
        match self.get(table.as_str()) {
            Some(policy) => policy.check_foreign_keys(table, record, executor, cancel),
            None => Ok(()),
        }
    }

    pub fn event_kind(&self, table: &str) -> Option<&str> {
        self.get(table)?.event.as_deref()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Default for Policies {
    fn default() -> Self {
        Self::book_companion()
    }
}

impl FromIterator<(Ident, TablePolicy)> for Policies {
    fn from_iter<I: IntoIterator<Item = (Ident, TablePolicy)>>(iter: I) -> Self {
        Self {
            tables: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Statement, dialect::SqliteDialect};
    use parking_lot::Mutex;
    use serde_json::json;

    /// Answers every COUNT with a fixed set of known ids.
    struct KnownIds {
        ids: Vec<Value>,
        seen: Mutex<Vec<String>>,
    }

    impl Executor for KnownIds {
        fn dialect(&self) -> &dyn crate::Dialect {
            &SqliteDialect
        }

        fn query(&self, stmt: &Statement, cancel: &CancelToken) -> Result<Vec<Row>> {
            cancel.check()?;
            self.seen.lock().push(stmt.sql.clone());
            let hit = self.ids.contains(&stmt.params[0]);
            let mut row = Row::new();
            row.push("COUNT(*)", Value::Integer(i64::from(hit)));
            Ok(vec![row])
        }

        fn execute(&self, _stmt: &Statement, _cancel: &CancelToken) -> Result<usize> {
            Ok(0)
        }
    }

    fn record(body: serde_json::Value) -> Record {
        Record::from_json(body).unwrap()
    }

    #[test]
    fn boolean_coercion() {
        let policy = TablePolicy::new().boolean(Ident::from_static("is_public"));
        let mut row = Row::new();
        row.push("is_public", Value::Integer(1));
        row.push("count", Value::Integer(1));
        policy.coerce_booleans(&mut row);
        assert_eq!(row.get("is_public"), Some(&Value::Bool(true)));
        assert_eq!(row.get("count"), Some(&Value::Integer(1)));

        for (stored, expected) in [
            (Value::Integer(0), Value::Bool(false)),
            (Value::Integer(2), Value::Bool(false)),
            (Value::Text("true".into()), Value::Bool(true)),
            (Value::Text("1".into()), Value::Bool(true)),
            (Value::Text("yes".into()), Value::Bool(false)),
            (Value::Null, Value::Null),
        ] {
            let mut row = Row::new();
            row.push("is_public", stored);
            policy.coerce_booleans(&mut row);
            assert_eq!(row.get("is_public"), Some(&expected));
        }
    }

    #[test]
    fn book_companion_preset() {
        let policies = Policies::default();
        let help = policies.get("help_requests").unwrap();
        assert_eq!(help.foreign_keys.len(), 2);
        assert_eq!(policies.event_kind("help_requests"), Some("help_request"));
        assert!(policies.get("users").unwrap().is_boolean("is_verified"));
        assert!(policies.get("verification_codes").unwrap().is_boolean("is_used"));
        assert!(policies.get("books").is_none());
        assert_eq!(policies.event_kind("books"), None);
    }

    #[test]
    fn foreign_key_check_names_first_missing_column() {
        let exec = KnownIds {
            ids: vec![Value::Text("b1".into())],
            seen: Mutex::new(Vec::new()),
        };
        let policies = Policies::book_companion();
        let table = Ident::from_static("help_requests");
        let cancel = CancelToken::new();

        let err = policies
            .check_foreign_keys(
                &table,
                &record(json!({"user_id": "u1", "book_id": "b1"})),
                &exec,
                &cancel,
            )
            .unwrap_err();
        // book_id sorts first and passes; user_id fails.
        assert!(matches!(
            err,
            QueryError::ForeignKeyViolation { ref column, ref referenced, .. }
                if column == "user_id" && referenced == "users"
        ));
        assert_eq!(
            exec.seen.lock().as_slice(),
            [
                "SELECT COUNT(*) FROM books WHERE id = ?",
                "SELECT COUNT(*) FROM users WHERE id = ?"
            ]
        );
    }

    #[test]
    fn null_and_absent_references_are_skipped() {
        let exec = KnownIds {
            ids: vec![],
            seen: Mutex::new(Vec::new()),
        };
        let policies = Policies::book_companion();
        policies
            .check_foreign_keys(
                &Ident::from_static("interactions"),
                &record(json!({"user_id": null, "kind": "like"})),
                &exec,
                &CancelToken::new(),
            )
            .unwrap();
        assert!(exec.seen.lock().is_empty());
    }

    #[test]
    fn policy_from_toml_shape() {
        let policy: TablePolicy = serde_json::from_value(json!({
            "foreign_keys": {"user_id": "users"},
            "boolean_columns": ["is_public"],
        }))
        .unwrap();
        assert_eq!(policy.foreign_keys.len(), 1);
        assert!(policy.event.is_none());
        assert!(serde_json::from_value::<TablePolicy>(json!({"foreign_keys": {"bad col": "users"}})).is_err());
    }
}
