#![allow(dead_code)]

use quire::{
    CancelToken, EventSink, Method, Policies, Rest, RestRequest, RestResponse, ServiceOptions,
    TableService,
    sqlite::{BOOK_COMPANION, SqlitePool, apply_schema},
};
use serde_json::{Value, json};
use std::sync::Arc;

pub struct Fixture {
    pub pool: Arc<SqlitePool>,
    pub rest: Rest,
    pub cancel: CancelToken,
}

/// The bundled schema behind the default service.
pub fn fixture() -> Fixture {
    Builder::default().build()
}

#[derive(Default)]
pub struct Builder {
    ddl: Option<&'static str>,
    policies: Option<Policies>,
    options: ServiceOptions,
    events: Option<Arc<dyn EventSink>>,
}

impl Builder {
    pub fn ddl(mut self, ddl: &'static str) -> Self {
        self.ddl = Some(ddl);
        self
    }

    pub fn policies(mut self, policies: Policies) -> Self {
        self.policies = Some(policies);
        self
    }

    pub fn options(mut self, options: ServiceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Fixture {
        let pool = Arc::new(SqlitePool::in_memory().unwrap());
        apply_schema(&pool.get().unwrap(), self.ddl.unwrap_or(BOOK_COMPANION)).unwrap();

        let mut service = TableService::new(pool.clone())
            .with_policies(self.policies.unwrap_or_default())
            .with_options(self.options);
        if let Some(events) = self.events {
            service = service.with_events(events);
        }
        Fixture {
            pool,
            rest: Rest::new(service),
            cancel: CancelToken::new(),
        }
    }
}

impl Fixture {
    pub fn get(&self, table: &str, query: &str) -> RestResponse {
        self.send(RestRequest::new(Method::Get, table).with_query(query))
    }

    pub fn post(&self, table: &str, query: &str, body: Value) -> RestResponse {
        self.send(
            RestRequest::new(Method::Post, table)
                .with_query(query)
                .with_body(body),
        )
    }

    pub fn patch(&self, table: &str, query: &str, body: Value) -> RestResponse {
        self.send(
            RestRequest::new(Method::Patch, table)
                .with_query(query)
                .with_body(body),
        )
    }

    pub fn delete(&self, table: &str, query: &str) -> RestResponse {
        self.send(RestRequest::new(Method::Delete, table).with_query(query))
    }

    pub fn send(&self, request: RestRequest) -> RestResponse {
        self.rest.handle(request, &self.cancel)
    }

    /// GET that must succeed; the rows.
    pub fn rows(&self, table: &str, query: &str) -> Vec<Value> {
        let resp = self.get(table, query);
        assert_eq!(resp.status, 200, "{}", resp.body);
        match resp.body {
            Value::Array(rows) => rows,
            other => panic!("expected an array, got {other}"),
        }
    }

    /// POST that must succeed.
    pub fn insert(&self, table: &str, body: Value) -> Value {
        let resp = self.post(table, "", body);
        assert_eq!(resp.status, 201, "{}", resp.body);
        resp.body
    }

    pub fn seed_reader(&self) {
        self.insert("users", json!({"id": "u1", "email": "u1@example.com"}));
        self.insert("categories", json!({"id": "c1", "name": "Fiction"}));
        self.insert(
            "books",
            json!({"id": "b1", "title": "Dune", "category_id": "c1"}),
        );
    }
}
