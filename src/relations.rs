//! Embedded relation resolution for `select=table:fk(cols)`.

use crate::service::RelationStrategy;
use hashbrown::{HashMap, HashSet};
use quire_core::{
    CancelToken, Executor, Ident, Policies, QueryBuilder, RelationSpec, Result, Row, Selection,
    Value,
};

/// Upper bound on ids bound into one `IN (...)` list.
pub const BATCH_SIZE: usize = 500;

/// Adds `required` columns missing from a column list.
///
/// Returns the widened selection and the columns that were added, which the
/// caller strips before answering.
pub(crate) fn widen<'a>(
    selection: &Selection,
    required: impl IntoIterator<Item = &'a Ident>,
) -> (Selection, Vec<Ident>) {
    let Selection::Columns(columns) = selection else {
        return (Selection::All, Vec::new());
    };
    let mut columns = columns.clone();
    let mut added = Vec::new();
    for column in required {
        if !columns.contains(column) {
            columns.push(column.clone());
            added.push(column.clone());
        }
    }
    (Selection::Columns(columns), added)
}

pub(crate) struct Resolver<'a> {
    pub executor: &'a dyn Executor,
    pub policies: &'a Policies,
    pub strategy: RelationStrategy,
    pub cancel: &'a CancelToken,
}

impl Resolver<'_> {
    /// Looks up `relation` for every row, returning one JSON value per row
    /// in row order: the related object, or `null` when the foreign key is
    /// null or matches nothing.
    pub fn resolve(&self, rows: &[Row], relation: &RelationSpec) -> Result<Vec<serde_json::Value>> {
        let keys: Vec<Option<&Value>> = rows
            .iter()
            .map(|row| {
                row.get(relation.foreign_key.as_str())
                    .filter(|v| !v.is_null())
            })
            .collect();

        let id = Ident::id();
        let (found, hidden) = match self.strategy {
            RelationStrategy::Batched => {
                // Matching needs the id even when the caller did not ask for it.
                let (selection, hidden) = widen(&relation.columns, [&id]);
                (self.batched(relation, &selection, &keys)?, hidden)
            }
            RelationStrategy::PointLookup => {
                (self.point(relation, &relation.columns, &keys)?, Vec::new())
            }
        };

        Ok(found
            .into_iter()
            .map(|related| match related {
                Some(mut row) => {
                    self.policies
                        .coerce_booleans(relation.table.as_str(), &mut row);
                    for column in &hidden {
                        row.remove(column.as_str());
                    }
                    serde_json::Value::Object(row.into_json())
                }
                None => serde_json::Value::Null,
            })
            .collect())
    }

    /// One `WHERE id = ?` query per row.
    fn point(
        &self,
        relation: &RelationSpec,
        selection: &Selection,
        keys: &[Option<&Value>],
    ) -> Result<Vec<Option<Row>>> {
        let dialect = self.executor.dialect();
        let builder = QueryBuilder::new(dialect);
        keys.iter()
            .map(|key| {
                let Some(id) = key else {
                    return Ok(None);
                };
                let stmt = builder
                    .select_by_id(&relation.table, selection, (*id).clone())
                    .render(dialect);
                Ok(self.executor.query(&stmt, self.cancel)?.into_iter().next())
            })
            .collect()
    }

    /// One `WHERE id IN (...)` query per [`BATCH_SIZE`] distinct keys.
    fn batched(
        &self,
        relation: &RelationSpec,
        selection: &Selection,
        keys: &[Option<&Value>],
    ) -> Result<Vec<Option<Row>>> {
        let mut seen = HashSet::new();
        let distinct: Vec<Value> = keys
            .iter()
            .flatten()
            .filter(|v| v.lookup_key().is_some_and(|k| seen.insert(k)))
            .map(|v| (*v).clone())
            .collect();

        let dialect = self.executor.dialect();
        let builder = QueryBuilder::new(dialect);
        let mut by_id: HashMap<String, Row> = HashMap::with_capacity(distinct.len());
        for chunk in distinct.chunks(BATCH_SIZE) {
            let stmt = builder
                .select_by_ids(&relation.table, selection, chunk)
                .render(dialect);
            for row in self.executor.query(&stmt, self.cancel)? {
                if let Some(key) = row.get("id").and_then(Value::lookup_key) {
                    by_id.entry(key).or_insert(row);
                }
            }
        }

        Ok(keys
            .iter()
            .map(|key| {
                key.and_then(Value::lookup_key)
                    .and_then(|k| by_id.get(&k).cloned())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use quire_core::{Statement, dialect::SqliteDialect};
    use serde_json::json;

    /// Serves `categories` rows `c0..c{n}` and records every statement.
    struct Categories {
        count: usize,
        seen: Mutex<Vec<Statement>>,
    }

    impl Categories {
        fn new(count: usize) -> Self {
            Self {
                count,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn category(&self, id: &Value) -> Option<Row> {
            let id = id.as_str()?;
            let n: usize = id.strip_prefix('c')?.parse().ok()?;
            (n < self.count).then(|| {
                let mut row = Row::new();
                row.push("id", Value::Text(id.to_string()));
                row.push("name", Value::Text(format!("Category {n}")));
                row.push("featured", Value::Integer(i64::from(n == 0)));
                row
            })
        }
    }

    impl Executor for Categories {
        fn dialect(&self) -> &dyn quire_core::Dialect {
            &SqliteDialect
        }

        fn query(&self, stmt: &Statement, _cancel: &CancelToken) -> Result<Vec<Row>> {
            self.seen.lock().push(stmt.clone());
            let projection = stmt
                .sql
                .strip_prefix("SELECT ")
                .and_then(|rest| rest.split_once(" FROM"))
                .map_or("*", |(cols, _)| cols);
            Ok(stmt
                .params
                .iter()
                .filter_map(|id| self.category(id))
                .map(|row| {
                    if projection == "*" {
                        return row;
                    }
                    projection
                        .split(", ")
                        .filter_map(|c| row.get(c).map(|v| (c.to_string(), v.clone())))
                        .collect()
                })
                .collect())
        }

        fn execute(&self, _stmt: &Statement, _cancel: &CancelToken) -> Result<usize> {
            Ok(0)
        }
    }

    fn books(fks: &[Option<&str>]) -> Vec<Row> {
        fks.iter()
            .enumerate()
            .map(|(i, fk)| {
                let mut row = Row::new();
                row.push("id", Value::Text(format!("b{i}")));
                row.push(
                    "category_id",
                    fk.map_or(Value::Null, |s| Value::Text(s.to_string())),
                );
                row
            })
            .collect()
    }

    fn relation(columns: Selection) -> RelationSpec {
        RelationSpec {
            table: Ident::from_static("categories"),
            foreign_key: Ident::from_static("category_id"),
            columns,
        }
    }

    fn policies() -> Policies {
        Policies::from_iter([(
            Ident::from_static("categories"),
            quire_core::TablePolicy::new().boolean(Ident::from_static("featured")),
        )])
    }

    #[test]
    fn widen_reports_added_columns() {
        let id = Ident::id();
        let name = Ident::from_static("name");
        let (sel, added) = widen(&Selection::Columns(vec![name.clone()]), [&id]);
        assert_eq!(sel, Selection::Columns(vec![name.clone(), id.clone()]));
        assert_eq!(added, vec![id.clone()]);

        let (sel, added) = widen(&Selection::Columns(vec![id.clone()]), [&id]);
        assert_eq!(sel, Selection::Columns(vec![id.clone()]));
        assert!(added.is_empty());

        let (sel, added) = widen(&Selection::All, [&id]);
        assert!(sel.is_all() && added.is_empty());
    }

    #[test]
    fn batched_and_point_agree() {
        let rows = books(&[Some("c1"), None, Some("c0"), Some("c9"), Some("c1")]);
        let rel = relation(Selection::Columns(vec![Ident::from_static("name")]));
        let policies = policies();
        let cancel = CancelToken::new();

        let results: Vec<_> = [RelationStrategy::Batched, RelationStrategy::PointLookup]
            .into_iter()
            .map(|strategy| {
                let exec = Categories::new(3);
                let resolver = Resolver {
                    executor: &exec,
                    policies: &policies,
                    strategy,
                    cancel: &cancel,
                };
                let out = resolver.resolve(&rows, &rel).unwrap();
                (out, exec.seen.lock().len())
            })
            .collect();

        let expected = vec![
            json!({"name": "Category 1"}),
            json!(null),
            json!({"name": "Category 0"}),
            json!(null),
            json!({"name": "Category 1"}),
        ];
        assert_eq!(results[0].0, expected);
        assert_eq!(results[1].0, expected);
        // One IN query against four point lookups for the non-null keys.
        assert_eq!(results[0].1, 1);
        assert_eq!(results[1].1, 4);
    }

    #[test]
    fn batched_query_binds_distinct_ids() {
        let rows = books(&[Some("c1"), Some("c1"), Some("c2")]);
        let exec = Categories::new(3);
        let policies = Policies::empty();
        let cancel = CancelToken::new();
        Resolver {
            executor: &exec,
            policies: &policies,
            strategy: RelationStrategy::Batched,
            cancel: &cancel,
        }
        .resolve(&rows, &relation(Selection::All))
        .unwrap();

        let seen = exec.seen.lock();
        assert_eq!(seen[0].sql, "SELECT * FROM categories WHERE id IN (?, ?)");
        assert_eq!(
            seen[0].params,
            vec![Value::Text("c1".into()), Value::Text("c2".into())]
        );
    }

    #[test]
    fn batches_are_chunked() {
        let ids: Vec<String> = (0..BATCH_SIZE + 3).map(|n| format!("c{n}")).collect();
        let fks: Vec<Option<&str>> = ids.iter().map(|s| Some(s.as_str())).collect();
        let rows = books(&fks);
        let exec = Categories::new(ids.len());
        let policies = Policies::empty();
        let cancel = CancelToken::new();
        let out = Resolver {
            executor: &exec,
            policies: &policies,
            strategy: RelationStrategy::Batched,
            cancel: &cancel,
        }
        .resolve(&rows, &relation(Selection::All))
        .unwrap();

        let seen = exec.seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].params.len(), BATCH_SIZE);
        assert_eq!(seen[1].params.len(), 3);
        assert!(out.iter().all(|v| v.is_object()));
    }

    #[test]
    fn related_rows_get_their_table_booleans() {
        let rows = books(&[Some("c0")]);
        let exec = Categories::new(1);
        let policies = policies();
        let cancel = CancelToken::new();
        let out = Resolver {
            executor: &exec,
            policies: &policies,
            strategy: RelationStrategy::Batched,
            cancel: &cancel,
        }
        .resolve(&rows, &relation(Selection::All))
        .unwrap();
        assert_eq!(
            out[0],
            json!({"id": "c0", "name": "Category 0", "featured": true})
        );
    }
}
