mod common;

use common::Builder;
use quire::{BroadcastSink, TableEvent};
use serde_json::json;
use std::sync::Arc;

fn with_sink() -> (common::Fixture, Arc<BroadcastSink>) {
    let sink = Arc::new(BroadcastSink::new(16));
    let fx = Builder::default().events(sink.clone()).build();
    fx.seed_reader();
    (fx, sink)
}

#[tokio::test]
async fn help_request_insert_is_broadcast() {
    let (fx, sink) = with_sink();
    let mut rx = sink.subscribe();

    let body = fx.insert(
        "help_requests",
        json!({"user_id": "u1", "book_id": "b1", "content": "need help"}),
    );

    let TableEvent { kind, table, data } = rx.recv().await.unwrap();
    assert_eq!(kind, "help_request");
    assert_eq!(table, "help_requests");
    assert_eq!(data["id"], body["id"]);
    assert_eq!(data["content"], "need help");
}

#[tokio::test]
async fn read_back_row_is_the_payload() {
    let (fx, sink) = with_sink();
    let mut rx = sink.subscribe();

    let resp = fx.post(
        "help_requests",
        "select=id,is_public",
        json!({"user_id": "u1", "book_id": "b1", "content": "?", "is_public": 1}),
    );
    assert_eq!(resp.status, 201);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.data, resp.body[0]);
    assert_eq!(event.data["is_public"], true);
}

#[test]
fn failures_and_other_tables_are_silent() {
    let (fx, sink) = with_sink();
    let mut rx = sink.subscribe();

    fx.insert("books", json!({"title": "Emma"}));
    let resp = fx.post(
        "help_requests",
        "",
        json!({"user_id": "nobody", "book_id": "b1", "content": "?"}),
    );
    assert_eq!(resp.status, 400);
    assert!(rx.try_recv().is_err());
}
