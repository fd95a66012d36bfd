//! End-to-end tests for the `labelhub` binary
//!
//! Each test points the binary at a mock server and isolates it from any
//! config file or token store on the machine running the tests.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Command with config and token store pointed into an empty temp dir
fn labelhub(home: &TempDir, server: &MockServer) -> Command {
    let mut cmd = Command::cargo_bin("labelhub").unwrap();
    cmd.env("LABELHUB_CONFIG", home.path().join("config.toml"))
        .env("LABELHUB_TOKEN_STORE", home.path().join("storage.json"))
        .env_remove("LABELHUB_TOKEN")
        .env_remove("LABELHUB_STALE_TIME_SECS")
        .env_remove("LABELHUB_REQUEST_TIMEOUT_SECS")
        .arg("--api-url")
        .arg(server.uri());
    cmd
}

#[tokio::test]
async fn test_models_get_not_found() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/models/42"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "not found" })))
        .expect(1)
        .mount(&server)
        .await;

    labelhub(&home, &server)
        .args(["models", "get", "42"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: not found"));
}

#[tokio::test]
async fn test_projects_list_table() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "proj-1",
            "name": "Street Scenes",
            "job_count": 4,
            "created_at": "2026-02-01T09:30:00Z"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    labelhub(&home, &server)
        .args(["projects", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("proj-1"))
        .stdout(predicate::str::contains("Street Scenes"));
}

#[tokio::test]
async fn test_token_store_is_used() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("storage.json"), r#"{"access_token":"from-store"}"#).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/api-keys"))
        .and(header("authorization", "Bearer from-store"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    labelhub(&home, &server)
        .args(["--json", "keys", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[tokio::test]
async fn test_delete_job() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("DELETE"))
        .and(path("/api/v1/jobs/job-9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    labelhub(&home, &server)
        .args(["jobs", "delete", "proj-1", "job-9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted job job-9"));
}

#[tokio::test]
async fn test_blank_id_is_rejected_without_request() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    labelhub(&home, &server)
        .args(["models", "get", " "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing identifier"));
}

#[tokio::test]
async fn test_config_show_reports_api_url() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    labelhub(&home, &server)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains(server.uri()));
}
