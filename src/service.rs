//! Generic CRUD over any table.
//!
//! [`TableService`] turns a table name, request parameters and an optional
//! JSON body into one statement (plus relation lookups and foreign-key
//! checks) against an injected [`Executor`]. It keeps no per-request state
//! and is shared across requests behind an `Arc`.

use crate::{
    events::{EventSink, NoopSink, TableEvent},
    relations::{Resolver, widen},
};
use quire_core::{
    CancelToken, Executor, Filter, Ident, ParseOptions, Policies, QueryBuilder, QueryError,
    QueryParams, QueryPlan, Record, Result, UnknownOperatorPolicy, Value,
    parser::{self, SELECT},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A JSON object, columns in select order.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

const CREATED_AT: Ident = Ident::from_static("created_at");
const UPDATED_AT: Ident = Ident::from_static("updated_at");

/// How embedded relations are fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationStrategy {
    /// One `id IN (...)` query per relation, chunked.
    #[default]
    Batched,
    /// One `id = ?` query per row and relation.
    #[serde(rename = "point")]
    PointLookup,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceOptions {
    pub unknown_operator: UnknownOperatorPolicy,
    pub relation_strategy: RelationStrategy,
    /// Refuse PATCH/DELETE without filters unless the request passes
    /// `confirmFullTableMutation=true`.
    pub guard_full_table_mutation: bool,
}

impl ServiceOptions {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            unknown_operator: self.unknown_operator,
        }
    }
}

/// Body of a write that did not ask for the row back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    pub success: bool,
    pub rows: usize,
}

impl WriteSummary {
    fn rows(rows: usize) -> Self {
        Self {
            id: None,
            success: true,
            rows,
        }
    }

    pub fn into_json(self) -> serde_json::Value {
        let mut body = JsonObject::new();
        if let Some(id) = self.id {
            body.insert("id".to_string(), id);
        }
        body.insert("success".to_string(), self.success.into());
        body.insert("rows".to_string(), self.rows.into());
        serde_json::Value::Object(body)
    }
}

/// Outcome of an insert.
#[derive(Debug, Clone, PartialEq)]
pub enum Created {
    /// The request had `select`; the re-fetched row(s).
    Rows(Vec<JsonObject>),
    Summary(WriteSummary),
}

impl Created {
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Created::Rows(rows) => {
                serde_json::Value::Array(rows.into_iter().map(serde_json::Value::Object).collect())
            }
            Created::Summary(summary) => summary.into_json(),
        }
    }
}

pub struct TableService {
    executor: Arc<dyn Executor>,
    policies: Policies,
    options: ServiceOptions,
    events: Arc<dyn EventSink>,
}

impl TableService {
    /// A service with the book-companion policies, default options and no
    /// event delivery.
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            policies: Policies::default(),
            options: ServiceOptions::default(),
            events: Arc::new(NoopSink),
        }
    }

    pub fn with_policies(mut self, policies: Policies) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_options(mut self, options: ServiceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    pub fn policies(&self) -> &Policies {
        &self.policies
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    /// Reads rows matching the query with embedded relations attached.
    pub fn get(
        &self,
        table: &str,
        params: &QueryParams,
        cancel: &CancelToken,
    ) -> Result<Vec<JsonObject>> {
        let _span = tracing::info_span!("quire.get", table).entered();
        let table = Ident::new(table)?;
        let plan = parser::parse_query(params, &self.options.parse_options())?;
        let rows = self.read(&table, &plan, cancel)?;
        tracing::info!(rows = rows.len(), "read");
        Ok(rows)
    }

    /// Inserts the body as one row.
    ///
    /// `id` defaults to a fresh UUIDv4 and both timestamps to now. With a
    /// `select` parameter the stored row is read back; a failed read-back
    /// falls back to the summary since the insert already happened.
    pub fn post(
        &self,
        table: &str,
        params: &QueryParams,
        body: serde_json::Value,
        cancel: &CancelToken,
    ) -> Result<Created> {
        let _span = tracing::info_span!("quire.post", table).entered();
        let table = Ident::new(table)?;
        let select = params
            .get(SELECT)
            .filter(|s| !s.trim().is_empty())
            .map(parser::parse_select)
            .transpose()?;

        let mut record = Record::from_json(body)?;
        record.set_default(Ident::id(), || {
            Value::Text(uuid::Uuid::new_v4().to_string())
        });
        let now = timestamp();
        record.set_default(CREATED_AT, || Value::Text(now.clone()));
        record.set_default(UPDATED_AT, || Value::Text(now));

        self.policies
            .check_foreign_keys(&table, &record, self.executor.as_ref(), cancel)?;

        let dialect = self.executor.dialect();
        let stmt = QueryBuilder::new(dialect)
            .insert(&table, &record)
            .render(dialect);
        let inserted = self.executor.execute(&stmt, cancel)?;
        let id = record.get("id").cloned().unwrap_or_default();
        tracing::info!(id = %id, rows = inserted, "inserted");

        let fetched = select.and_then(|(selection, relations)| {
            let plan = QueryPlan {
                select: selection,
                relations,
                filters: vec![Filter::eq(Ident::id(), id.clone())],
                ..QueryPlan::default()
            };
            match self.read(&table, &plan, cancel) {
                Ok(rows) if !rows.is_empty() => Some(rows),
                Ok(_) => {
                    tracing::warn!(id = %id, "inserted row not found on read-back");
                    None
                }
                Err(err) => {
                    tracing::warn!(id = %id, error = %err, "read-back after insert failed");
                    None
                }
            }
        });

        if let Some(kind) = self.policies.event_kind(table.as_str()) {
            let data = match fetched.as_ref().and_then(|rows| rows.first()) {
                Some(row) => serde_json::Value::Object(row.clone()),
                None => record_json(&record),
            };
            self.events.publish(TableEvent {
                kind: kind.to_string(),
                table: table.to_string(),
                data,
            });
        }

        Ok(match fetched {
            Some(rows) => Created::Rows(rows),
            None => Created::Summary(WriteSummary {
                id: Some(id.to_json()),
                success: true,
                rows: inserted,
            }),
        })
    }

    /// Updates every row matching the filters; `updated_at` is always set.
    pub fn patch(
        &self,
        table: &str,
        params: &QueryParams,
        body: serde_json::Value,
        cancel: &CancelToken,
    ) -> Result<WriteSummary> {
        let _span = tracing::info_span!("quire.patch", table).entered();
        let table = Ident::new(table)?;
        let plan = parser::parse_query(params, &self.options.parse_options())?;
        let mut record = Record::from_json(body)?;
        record.set(UPDATED_AT, timestamp());
        self.guard(&table, &plan)?;

        let dialect = self.executor.dialect();
        let stmt = QueryBuilder::new(dialect)
            .update(&table, &record, &plan.filters)?
            .render(dialect);
        let rows = self.executor.execute(&stmt, cancel)?;
        tracing::info!(rows, filtered = plan.has_filters(), "updated");
        Ok(WriteSummary::rows(rows))
    }

    /// Deletes every row matching the filters.
    pub fn delete(
        &self,
        table: &str,
        params: &QueryParams,
        cancel: &CancelToken,
    ) -> Result<WriteSummary> {
        let _span = tracing::info_span!("quire.delete", table).entered();
        let table = Ident::new(table)?;
        let plan = parser::parse_query(params, &self.options.parse_options())?;
        self.guard(&table, &plan)?;

        let dialect = self.executor.dialect();
        let stmt = QueryBuilder::new(dialect)
            .delete(&table, &plan.filters)
            .render(dialect);
        let rows = self.executor.execute(&stmt, cancel)?;
        tracing::info!(rows, filtered = plan.has_filters(), "deleted");
        Ok(WriteSummary::rows(rows))
    }

    fn guard(&self, table: &Ident, plan: &QueryPlan) -> Result<()> {
        if self.options.guard_full_table_mutation && !plan.has_filters() && !plan.confirm_full_table
        {
            return Err(QueryError::FullTableMutation {
                table: table.to_string(),
            });
        }
        if !plan.has_filters() {
            tracing::warn!("statement applies to every row");
        }
        Ok(())
    }

    fn read(&self, table: &Ident, plan: &QueryPlan, cancel: &CancelToken) -> Result<Vec<JsonObject>> {
        // Foreign keys the select list omits are fetched for the lookups
        // and stripped again.
        let (select, hidden) = widen(&plan.select, plan.relations.iter().map(|r| &r.foreign_key));
        let dialect = self.executor.dialect();
        let stmt = if hidden.is_empty() {
            QueryBuilder::new(dialect).select(table, plan)
        } else {
            let widened = QueryPlan {
                select,
                ..plan.clone()
            };
            QueryBuilder::new(dialect).select(table, &widened)
        }
        .render(dialect);

        let mut rows = self.executor.query(&stmt, cancel)?;
        for row in &mut rows {
            self.policies.coerce_booleans(table.as_str(), row);
        }

        let resolver = Resolver {
            executor: self.executor.as_ref(),
            policies: &self.policies,
            strategy: self.options.relation_strategy,
            cancel,
        };
        let mut embedded = plan
            .relations
            .iter()
            .map(|relation| Ok(resolver.resolve(&rows, relation)?.into_iter()))
            .collect::<Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .map(|mut row| {
                for column in &hidden {
                    row.remove(column.as_str());
                }
                let mut object = row.into_json();
                for (relation, values) in plan.relations.iter().zip(embedded.iter_mut()) {
                    let value = values.next().unwrap_or(serde_json::Value::Null);
                    object.insert(relation.table.to_string(), value);
                }
                object
            })
            .collect())
    }
}

impl core::fmt::Debug for TableService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TableService")
            .field("dialect", &self.executor.dialect().name())
            .field("policies", &self.policies.len())
            .field("options", &self.options)
            .finish()
    }
}

/// Current UTC time as `YYYY-MM-DD HH:MM:SS`, the format SQLite's
/// `datetime('now')` produces.
pub fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn record_json(record: &Record) -> serde_json::Value {
    serde_json::Value::Object(
        record
            .iter()
            .map(|(column, value)| (column.to_string(), value.to_json()))
            .collect(),
    )
}
