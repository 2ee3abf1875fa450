//! Transport-neutral REST surface.
//!
//! A host HTTP server turns each request into a [`RestRequest`], hands it to
//! [`Rest::handle`] with a [`CancelToken`] tied to the client connection, and
//! writes back the [`RestResponse`].

use crate::{rpc::RpcRegistry, service::TableService};
use quire_core::{CancelToken, QueryError, QueryParams};
use serde_json::json;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The method name that did not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedMethod(pub String);

impl FromStr for Method {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            _ => Err(UnsupportedMethod(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub method: Method,
    pub table: String,
    pub query: QueryParams,
    pub body: Option<serde_json::Value>,
    /// Authenticated identity supplied by the host; logged only.
    pub caller: Option<String>,
}

impl RestRequest {
    pub fn new(method: Method, table: impl Into<String>) -> Self {
        Self {
            method,
            table: table.into(),
            query: QueryParams::new(),
            body: None,
            caller: None,
        }
    }

    pub fn with_query(mut self, raw: &str) -> Self {
        self.query = QueryParams::from_query_string(raw);
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    /// Builds a request from raw HTTP parts.
    ///
    /// The table is whatever follows `root` in `path`, minus a trailing
    /// slash. Fails with the response to send when the method is not
    /// supported (405) or no table is named (400).
    pub fn from_parts(
        root: &str,
        method: &str,
        path: &str,
        raw_query: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Self, RestResponse> {
        let method = method.parse::<Method>().map_err(|UnsupportedMethod(m)| {
            RestResponse::error(405, "method_not_allowed", format!("method {m} not allowed"))
        })?;
        let table = path
            .strip_prefix(root)
            .or_else(|| path.strip_prefix(root.trim_end_matches('/')))
            .unwrap_or(path)
            .trim_matches('/');
        if table.is_empty() {
            return Err(RestResponse::error(
                400,
                "missing_table",
                "Table name required",
            ));
        }
        Ok(Self {
            method,
            table: table.to_string(),
            query: QueryParams::from_query_string(raw_query),
            body,
            caller: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl RestResponse {
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    pub fn error(status: u16, code: &str, message: impl Into<String>) -> Self {
        Self::new(
            status,
            json!({ "error": code, "message": message.into() }),
        )
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<QueryError> for RestResponse {
    fn from(err: QueryError) -> Self {
        Self::error(err.status(), err.code(), err.public_message())
    }
}

/// Table and RPC dispatch.
#[derive(Debug)]
pub struct Rest {
    service: TableService,
    rpc: RpcRegistry,
}

impl Rest {
    pub fn new(service: TableService) -> Self {
        Self {
            service,
            rpc: RpcRegistry::new(),
        }
    }

    pub fn with_rpc(mut self, rpc: RpcRegistry) -> Self {
        self.rpc = rpc;
        self
    }

    pub fn service(&self) -> &TableService {
        &self.service
    }

    pub fn rpc(&self) -> &RpcRegistry {
        &self.rpc
    }

    pub fn handle(&self, request: RestRequest, cancel: &CancelToken) -> RestResponse {
        let RestRequest {
            method,
            table,
            query,
            body,
            caller,
        } = request;
        let _span = tracing::info_span!(
            "quire.rest",
            %method,
            table = %table,
            caller = caller.as_deref().unwrap_or("-")
        )
        .entered();

        let result = match method {
            Method::Get => self.service.get(&table, &query, cancel).map(|rows| {
                (
                    200,
                    serde_json::Value::Array(rows.into_iter().map(serde_json::Value::Object).collect()),
                )
            }),
            Method::Post => self
                .service
                .post(&table, &query, body.unwrap_or(serde_json::Value::Null), cancel)
                .map(|created| (201, created.into_json())),
            Method::Patch => self
                .service
                .patch(&table, &query, body.unwrap_or(serde_json::Value::Null), cancel)
                .map(|summary| (200, summary.into_json())),
            Method::Delete => self
                .service
                .delete(&table, &query, cancel)
                .map(|summary| (200, summary.into_json())),
        };

        match result {
            Ok((status, body)) => RestResponse::new(status, body),
            Err(err) => failure(err),
        }
    }

    /// `POST /rpc/{name}`
    pub fn call_rpc(
        &self,
        name: &str,
        params: serde_json::Value,
        cancel: &CancelToken,
    ) -> RestResponse {
        let _span = tracing::info_span!("quire.rpc", name).entered();
        match self
            .rpc
            .call(name, self.service.executor().as_ref(), params, cancel)
        {
            Ok(body) => RestResponse::new(200, body),
            Err(err) => failure(err),
        }
    }
}

fn failure(err: QueryError) -> RestResponse {
    if err.is_internal() {
        tracing::error!(error = %err, "request failed");
    } else {
        tracing::info!(error = %err, status = err.status(), "request rejected");
    }
    err.into()
}
