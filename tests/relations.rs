mod common;

use common::Builder;
use quire::{
    BATCH_SIZE, Ident, Policies, RelationStrategy, ServiceOptions, TablePolicy,
};
use serde_json::{Value, json};

const SHOP: &str = r#"
CREATE TABLE cat (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    visible INTEGER NOT NULL DEFAULT 1,
    created_at TEXT,
    updated_at TEXT
);
CREATE TABLE maker (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TEXT,
    updated_at TEXT
);
CREATE TABLE items (
    id TEXT PRIMARY KEY,
    items TEXT NOT NULL,
    category_id INTEGER,
    maker_id TEXT,
    created_at TEXT,
    updated_at TEXT
);
"#;

fn shop(strategy: RelationStrategy) -> common::Fixture {
    let policies = Policies::from_iter([(
        Ident::new("cat").unwrap(),
        TablePolicy::new().boolean(Ident::new("visible").unwrap()),
    )]);
    let fx = Builder::default()
        .ddl(SHOP)
        .policies(policies)
        .options(ServiceOptions {
            relation_strategy: strategy,
            ..ServiceOptions::default()
        })
        .build();

    fx.insert("cat", json!({"id": 1, "name": "Tools", "visible": 1}));
    fx.insert("cat", json!({"id": 2, "name": "Toys", "visible": 0}));
    fx.insert("maker", json!({"id": "m1", "name": "Acme"}));
    for (id, name, cat, maker) in [
        ("i1", "hammer", json!(1), json!("m1")),
        ("i2", "kite", json!(2), Value::Null),
        ("i3", "ghost", json!(99), json!("m404")),
        ("i4", "loose", Value::Null, json!("m1")),
    ] {
        fx.insert(
            "items",
            json!({"id": id, "items": name, "category_id": cat, "maker_id": maker}),
        );
    }
    fx
}

const STRATEGIES: [RelationStrategy; 2] = [RelationStrategy::Batched, RelationStrategy::PointLookup];

#[test]
fn embedded_row_matches_independent_fetch() {
    for strategy in STRATEGIES {
        let fx = shop(strategy);
        let rows = fx.rows("items", "select=items,cat:category_id(name)&order=id");
        assert_eq!(rows.len(), 4);
        for row in &rows {
            let keys: Vec<&String> = row.as_object().unwrap().keys().collect();
            // The foreign key was fetched for the lookup and stripped again.
            assert_eq!(keys, ["items", "cat"], "{strategy:?}");
        }

        let all = fx.rows("items", "order=id");
        for (row, full) in rows.iter().zip(&all) {
            let expected = match &full["category_id"] {
                Value::Null => Value::Null,
                id => fx
                    .rows("cat", &format!("select=name&id={id}"))
                    .into_iter()
                    .next()
                    .unwrap_or(Value::Null),
            };
            assert_eq!(row["cat"], expected, "{strategy:?} {row}");
        }
    }
}

#[test]
fn null_and_dangling_keys_attach_null() {
    for strategy in STRATEGIES {
        let fx = shop(strategy);
        let rows = fx.rows("items", "select=id,cat:category_id(name)&order=id");
        assert_eq!(
            rows,
            vec![
                json!({"id": "i1", "cat": {"name": "Tools"}}),
                json!({"id": "i2", "cat": {"name": "Toys"}}),
                json!({"id": "i3", "cat": null}),
                json!({"id": "i4", "cat": null}),
            ],
            "{strategy:?}"
        );
    }
}

#[test]
fn selected_foreign_key_is_kept() {
    let fx = shop(RelationStrategy::Batched);
    let rows = fx.rows("items", "select=category_id,cat:category_id(id)&id=i1");
    assert_eq!(rows, vec![json!({"category_id": 1, "cat": {"id": 1}})]);
}

#[test]
fn star_selection_and_all_related_columns() {
    let fx = shop(RelationStrategy::Batched);
    let rows = fx.rows("items", "select=*,cat:category_id()&id=i2");
    let row = rows[0].as_object().unwrap();
    assert_eq!(row["items"], "kite");
    assert_eq!(row["category_id"], 2);
    assert_eq!(row["cat"]["name"], "Toys");
    assert_eq!(row["cat"]["id"], 2);
}

#[test]
fn related_rows_are_coerced_with_their_own_policy() {
    for strategy in STRATEGIES {
        let fx = shop(strategy);
        let rows = fx.rows("items", "select=id,cat:category_id(visible)&order=id&limit=2");
        assert_eq!(rows[0]["cat"], json!({"visible": true}));
        assert_eq!(rows[1]["cat"], json!({"visible": false}));
    }
}

#[test]
fn several_relations() {
    let fx = shop(RelationStrategy::Batched);
    let rows = fx.rows(
        "items",
        "select=items,cat:category_id(name),maker:maker_id(name)&order=id",
    );
    assert_eq!(
        rows,
        vec![
            json!({"items": "hammer", "cat": {"name": "Tools"}, "maker": {"name": "Acme"}}),
            json!({"items": "kite", "cat": {"name": "Toys"}, "maker": null}),
            json!({"items": "ghost", "cat": null, "maker": null}),
            json!({"items": "loose", "cat": null, "maker": {"name": "Acme"}}),
        ]
    );
}

#[test]
fn many_rows_span_several_batches() {
    let fx = shop(RelationStrategy::Batched);
    let total = BATCH_SIZE + 20;
    for n in 0..total {
        fx.insert("cat", json!({"id": 100 + n, "name": format!("c{n}")}));
        fx.insert(
            "items",
            json!({"id": format!("x{n:04}"), "items": "bulk", "category_id": 100 + n}),
        );
    }
    let rows = fx.rows("items", "items=bulk&select=id,cat:category_id(name)&order=id");
    assert_eq!(rows.len(), total);
    for (n, row) in rows.iter().enumerate() {
        assert_eq!(row["cat"]["name"], format!("c{n}"));
    }
}

#[test]
fn malformed_relation_is_rejected() {
    let fx = shop(RelationStrategy::Batched);
    for query in ["select=cat(name)", "select=cat:category_id(name", "select=cat:(name)"] {
        let resp = fx.get("items", query);
        assert_eq!(resp.status, 400, "{query}");
    }
}
