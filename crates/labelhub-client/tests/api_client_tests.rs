//! Fetch function tests against a mock server
//!
//! Covers URL shapes, error message extraction, bearer authentication and
//! body decoding.

use chrono::NaiveDate;
use labelhub_client::api::client::fallback;
use labelhub_client::api::types::{BillingReportFilter, JobStatus, JobUpdate, PageRequest};
use labelhub_client::auth::{LocalStorage, NoToken, StaticToken, StoredToken, ACCESS_TOKEN_KEY};
use labelhub_client::{ApiClient, ApiError};
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    matchers::{body_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn model_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": "yolo-detector",
        "project_id": "proj-1",
        "task_type": "detection",
        "latest_version": 3,
        "created_at": "2026-02-01T09:30:00Z"
    })
}

fn job_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "project_id": "proj-1",
        "name": "street scenes",
        "status": status,
        "image_count": 120,
        "created_at": "2026-02-01T09:30:00Z"
    })
}

fn anonymous(server: &MockServer) -> ApiClient {
    ApiClient::new(server.uri(), Arc::new(NoToken)).unwrap()
}

// ============================================================================
// Error messages
// ============================================================================

#[tokio::test]
async fn test_error_detail_becomes_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/models/42"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "not found" })))
        .expect(1)
        .mount(&server)
        .await;

    let err = anonymous(&server).get_model("42").await.unwrap_err();

    assert_eq!(err.to_string(), "not found");
    assert_eq!(err.status(), Some(404));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_missing_detail_uses_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/projects/proj-1/jobs"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = anonymous(&server).list_project_jobs("proj-1").await.unwrap_err();

    assert_eq!(
        err,
        ApiError::RequestFailed {
            status: 500,
            message: fallback::LIST_JOBS.to_string(),
        }
    );
}

#[tokio::test]
async fn test_validation_detail_list_is_joined() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/jobs/job-9"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [
                { "loc": ["body", "status"], "msg": "invalid status" },
                { "loc": ["body", "name"], "msg": "name too long" }
            ]
        })))
        .mount(&server)
        .await;

    let update = JobUpdate {
        name: Some("x".repeat(300)),
        ..JobUpdate::default()
    };
    let err = anonymous(&server).update_job("job-9", &update).await.unwrap_err();

    assert_eq!(err.to_string(), "invalid status; name too long");
    assert_eq!(err.status(), Some(422));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/models/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = anonymous(&server).get_model("42").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let client = ApiClient::new("http://127.0.0.1:9", Arc::new(NoToken)).unwrap();
    let err = client.list_projects().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_bearer_header_sent_when_token_present() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/models/42"))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_json("42")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri(), Arc::new(StaticToken::new("t0ken"))).unwrap();
    let model = client.get_model("42").await.unwrap();

    assert_eq!(model.id, "42");
    assert_eq!(model.latest_version, Some(3));
}

#[tokio::test]
async fn test_no_header_without_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let projects = anonymous(&server).list_projects().await.unwrap();
    assert!(projects.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_stored_token_is_read_per_request() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("storage.json");

    Mock::given(method("GET"))
        .and(path("/api/v1/api-keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let tokens = StoredToken::new(LocalStorage::new(&store), ACCESS_TOKEN_KEY);
    let client = ApiClient::new(server.uri(), Arc::new(tokens)).unwrap();

    client.list_api_keys().await.unwrap();
    std::fs::write(&store, r#"{"access_token":"signed-in"}"#).unwrap();
    client.list_api_keys().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].headers.get("authorization").is_none());
    assert_eq!(
        requests[1]
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok()),
        Some("Bearer signed-in")
    );
}

#[tokio::test]
async fn test_unauthorized_surfaces_as_request_failed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/api-keys"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Not authenticated" })))
        .expect(1)
        .mount(&server)
        .await;

    let err = anonymous(&server).list_api_keys().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Not authenticated");
}

// ============================================================================
// Request shapes
// ============================================================================

#[tokio::test]
async fn test_update_job_sends_only_set_fields() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/jobs/job-9"))
        .and(body_json(json!({ "status": "review" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("job-9", "review")))
        .expect(1)
        .mount(&server)
        .await;

    let update = JobUpdate {
        status: Some(JobStatus::Review),
        ..JobUpdate::default()
    };
    let job = anonymous(&server).update_job("job-9", &update).await.unwrap();
    assert_eq!(job.status, JobStatus::Review);
}

#[tokio::test]
async fn test_delete_with_no_content() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/jobs/job-9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    anonymous(&server).delete_job("job-9").await.unwrap();
}

#[tokio::test]
async fn test_query_parameters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/models"))
        .and(query_param("project_id", "proj-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([model_json("42")])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/model-versions/v-1/validation-images"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [],
            "total": 12,
            "page": 2,
            "page_size": 10
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/billing/reports"))
        .and(query_param("from", "2026-03-01"))
        .and(query_param("to", "2026-03-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "from": "2026-03-01",
            "to": "2026-03-31",
            "currency": "USD",
            "total": 41.5,
            "rows": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = anonymous(&server);

    let models = client.list_models(Some("proj-1")).await.unwrap();
    assert_eq!(models.len(), 1);

    let page = client
        .list_validation_images("v-1", PageRequest { page: 2, page_size: 10 })
        .await
        .unwrap();
    assert_eq!(page.total, 12);

    let filter = BillingReportFilter {
        from: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        to: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        project_id: None,
    };
    let report = client.get_billing_report(&filter).await.unwrap();
    assert_eq!(report.total, 41.5);
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(anonymous(&server).health_check().await);
}
