//! End-to-end tests for the quire CLI

use assert_cmd::cargo;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

fn quire(temp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("quire"));
    cmd.current_dir(temp.path())
        .env_remove("QUIRE_DB_PATH")
        .env("RUST_LOG", "warn")
        .arg("--db")
        .arg(temp.path().join("quire.db"));
    cmd
}

fn initialized() -> TempDir {
    let temp = TempDir::new().unwrap();
    quire(&temp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied schema"));
    temp
}

#[test]
fn post_then_get() {
    let temp = initialized();

    quire(&temp)
        .args(["post", "books", "--body", r#"{"id": "b1", "title": "Dune"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("201"))
        .stdout(predicate::str::contains(r#""id": "b1""#));

    quire(&temp)
        .args(["get", "books", "--query", "select=id,title"])
        .assert()
        .success()
        .stdout(predicate::str::contains("200"))
        .stdout(predicate::str::contains(r#""title": "Dune""#));
}

#[test]
fn patch_and_delete_report_rows() {
    let temp = initialized();
    for title in ["A", "B"] {
        quire(&temp)
            .args(["post", "books", "--body", &format!(r#"{{"title": "{title}"}}"#)])
            .assert()
            .success();
    }

    quire(&temp)
        .args(["patch", "books", "--query", "title=A", "--body", r#"{"author": "X"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""rows": 1"#));

    quire(&temp)
        .args(["delete", "books"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""rows": 2"#));
}

#[test]
fn rejected_requests_fail_with_the_error_body() {
    let temp = initialized();
    quire(&temp)
        .args(["post", "help_requests", "--body", r#"{"user_id": "ghost", "book_id": "nope", "content": "?"}"#])
        .assert()
        .failure()
        .stdout(predicate::str::contains("400"))
        .stdout(predicate::str::contains("foreign_key_violation"));

    quire(&temp)
        .args(["get", "books", "--query", "title;drop=1"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid_identifier"));
}

#[test]
fn check_table() {
    let temp = initialized();
    quire(&temp)
        .args(["check-table", "books"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""exists": true"#));
    quire(&temp)
        .args(["check-table", "shelves"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""exists": false"#));
}

#[test]
fn invalid_body_json() {
    let temp = initialized();
    quire(&temp)
        .args(["post", "books", "--body", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}

#[test]
fn config_file_is_read() {
    let temp = initialized();
    std::fs::write(
        temp.path().join("quire.toml"),
        "[query]\nguard_full_table_mutation = true\n",
    )
    .unwrap();
    quire(&temp)
        .args(["delete", "books"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("full_table_mutation"));
    quire(&temp)
        .args(["delete", "books", "--query", "confirmFullTableMutation=true"])
        .assert()
        .success();
}

#[test]
fn unopenable_database_names_the_path() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("no-such-dir").join("quire.db");
    Command::new(cargo::cargo_bin!("quire"))
        .current_dir(temp.path())
        .env_remove("QUIRE_DB_PATH")
        .arg("--db")
        .arg(&missing)
        .args(["get", "books"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Database error at"))
        .stderr(predicate::str::contains("no-such-dir"));
}
