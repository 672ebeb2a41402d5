//! Integration tests for the `tally` CLI binary.
//!
//! Config directories point at a throwaway temp dir and every `TALLY_*`
//! variable is cleared, so tests never touch the user's configuration.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

fn tally_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("tally");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("TALLY_PROFILE")
        .env_remove("TALLY_BASE_URL")
        .env_remove("TALLY_OUTPUT")
        .env_remove("TALLY_INSECURE")
        .env_remove("TALLY_TIMEOUT")
        .env_remove("RUST_LOG")
        // Keep failure paths fast.
        .env("TALLY_DEFAULTS__RETRIES", "0")
        .env("TALLY_DEFAULTS__DEBOUNCE_MS", "10");
    cmd
}

/// Run a prepared command off the async runtime that hosts the mock server.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn page(content: &Value, total: u64) -> Value {
    json!({
        "content": content,
        "page": { "totalElements": total, "totalPages": total.div_ceil(25), "number": 0, "size": 25 }
    })
}

fn paged(content: &Value, total: u64, number: usize, size: u64) -> Value {
    json!({
        "content": content,
        "page": { "totalElements": total, "totalPages": total.div_ceil(size), "number": number, "size": size }
    })
}

async fn backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/activities/aggregate"))
        .and(query_param("groupBy", "project"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            &json!([{ "project": "Apollo", "hours": 42.5 }, { "project": "Gemini", "hours": 7 }]),
            2,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/activities/aggregate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            &json!([{ "project": "Apollo", "employee": "Alice", "date": "2024-01-01", "hours": 8 }]),
            1,
        )))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = tally_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    tally_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("show").and(predicate::str::contains("config")));
}

#[test]
fn test_invalid_group_field_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    tally_cmd(home.path())
        .args(["show", "--group-by", "hours", "-u", "http://localhost:1/api"])
        .assert()
        .code(2);
}

#[test]
fn test_zero_page_size_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    tally_cmd(home.path())
        .args(["show", "--size", "0", "-u", "http://localhost:1/api"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--size"));
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_path_under_config_home() {
    let home = tempfile::tempdir().unwrap();
    tally_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_path_respects_quiet() {
    let home = tempfile::tempdir().unwrap();
    tally_cmd(home.path())
        .args(["-q", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_config_init_then_refuses_overwrite() {
    let home = tempfile::tempdir().unwrap();
    tally_cmd(home.path())
        .args(["config", "init"])
        .assert()
        .success();
    tally_cmd(home.path())
        .args(["config", "init"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--force"));
    tally_cmd(home.path())
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:8080/api"));
}

#[test]
fn test_show_without_backend_suggests_init() {
    let home = tempfile::tempdir().unwrap();
    tally_cmd(home.path())
        .arg("show")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("tally config init"));
}

#[test]
fn test_unknown_profile_is_reported() {
    let home = tempfile::tempdir().unwrap();
    tally_cmd(home.path())
        .args(["-p", "prod", "show"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("prod"));
}

// ── Show against a mock backend ─────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_show_renders_default_columns() {
    let server = backend().await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = tally_cmd(home.path());
    cmd.args(["show", "-u", &format!("{}/api", server.uri())]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    for header in ["Project", "Employee", "Date", "Hours", "Alice"] {
        assert!(stdout.contains(header), "missing {header}:\n{stdout}");
    }
    assert!(stdout.contains("Page 1 of 1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_show_grouped_by_project() {
    let server = backend().await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = tally_cmd(home.path());
    cmd.args(["show", "-g", "project", "-u", &format!("{}/api", server.uri())]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Gemini"));
    assert!(stdout.contains("42.5"));
    assert!(!stdout.contains("Employee"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_show_json_uses_profile_from_config_file() {
    let server = backend().await;
    let home = tempfile::tempdir().unwrap();
    let config_dir = home.path().join(".config").join("tally");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        format!(
            "default_profile = \"local\"\n\n[profiles.local]\nbase_url = \"{}/api\"\n",
            server.uri()
        ),
    )
    .unwrap();

    let mut cmd = tally_cmd(home.path());
    cmd.args(["-o", "json", "show", "--group-by", "project"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{output:?}");
    let state: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(state["selectedFields"], json!(["project"]));
    assert_eq!(state["data"][0]["project"], "Apollo");
    assert_eq!(state["loading"], false);
    assert_eq!(state["cacheKey"], "project_page_0_size_25");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_show_error_prints_only_the_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/activities/aggregate"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": { "message": "Server error" } })),
        )
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = tally_cmd(home.path());
    cmd.args(["show", "-u", &format!("{}/api", server.uri())]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(7));
    assert!(output.stdout.is_empty());
    assert_eq!(
        String::from_utf8_lossy(&output.stderr).trim(),
        "Failed to load data: Server error"
    );
}

// ── Paging and sorting against a mock backend ───────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_show_size_then_page_uses_totals_at_new_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/activities/aggregate"))
        .and(query_param("page", "7"))
        .and(query_param("size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paged(
            &json!([{ "project": "Eighth", "hours": 3 }]),
            100,
            7,
            10,
        )))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/activities/aggregate"))
        .and(query_param("size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paged(
            &json!([{ "project": "First", "hours": 1 }]),
            100,
            0,
            10,
        )))
        .with_priority(2)
        .mount(&server)
        .await;
    // At the default size of 25 the backend reports a single page.
    Mock::given(method("GET"))
        .and(path("/api/activities/aggregate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            &json!([{ "project": "Only", "hours": 1 }]),
            1,
        )))
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = tally_cmd(home.path());
    cmd.args([
        "-o",
        "json",
        "show",
        "--size",
        "10",
        "--page",
        "7",
        "-u",
        &format!("{}/api", server.uri()),
    ]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{output:?}");
    let state: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(state["pagination"]["index"], 7);
    assert_eq!(state["pagination"]["size"], 10);
    assert_eq!(state["pagination"]["totalPages"], 10);
    assert_eq!(state["data"][0]["project"], "Eighth");
    assert_eq!(state["cacheKey"], "__all___page_7_size_10");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_show_page_renders_footer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/activities/aggregate"))
        .and(query_param("page", "2"))
        .and(query_param("size", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paged(
            &json!([{ "project": "Third", "hours": 5 }]),
            100,
            2,
            25,
        )))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/activities/aggregate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paged(
            &json!([{ "project": "First", "hours": 1 }]),
            100,
            0,
            25,
        )))
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = tally_cmd(home.path());
    cmd.args(["show", "--page", "2", "-u", &format!("{}/api", server.uri())]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Third"), "{stdout}");
    assert!(stdout.contains("Page 3 of 4 (100 records, 25 per page)"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_show_sort_is_sent_to_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/activities/aggregate"))
        .and(query_param("sort", "hours,desc"))
        .and(query_param("groupBy", "employee"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            &json!([{ "employee": "Busiest", "hours": 99 }]),
            1,
        )))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/activities/aggregate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            &json!([{ "employee": "Unsorted", "hours": 1 }]),
            1,
        )))
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = tally_cmd(home.path());
    cmd.args([
        "show",
        "-g",
        "employee",
        "--sort",
        "hours,desc",
        "-u",
        &format!("{}/api", server.uri()),
    ]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Busiest"), "{stdout}");
    assert!(!stdout.contains("Unsorted"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_show_page_past_last_is_a_usage_error() {
    let server = backend().await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = tally_cmd(home.path());
    cmd.args(["show", "--page", "3", "-u", &format!("{}/api", server.uri())]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid value for page"), "{stderr}");
}
