//! HTTP API client for the LabelHub server
//!
//! One method per resource operation. Each performs exactly one HTTP call:
//! no retries, and no timeout unless the caller configured one.

use crate::api::error::ApiError;
use crate::api::{endpoints, types::*};
use crate::auth::TokenSource;
use crate::config::Config;
use crate::error::Result;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Messages used when an error response carries no `detail`
pub mod fallback {
    pub const LIST_PROJECTS: &str = "Failed to fetch projects";
    pub const FETCH_PROJECT: &str = "Failed to fetch project";
    pub const LIST_JOBS: &str = "Failed to fetch jobs";
    pub const FETCH_JOB: &str = "Failed to fetch job";
    pub const UPDATE_JOB: &str = "Failed to update job";
    pub const DELETE_JOB: &str = "Failed to delete job";
    pub const LIST_MODELS: &str = "Failed to fetch models";
    pub const FETCH_MODEL: &str = "Failed to fetch model";
    pub const LIST_MODEL_VERSIONS: &str = "Failed to fetch model versions";
    pub const LIST_VALIDATION_IMAGES: &str = "Failed to fetch validation images";
    pub const FETCH_VALIDATION_METRICS: &str = "Failed to fetch validation metrics";
    pub const LIST_ANNOTATIONS: &str = "Failed to fetch annotations";
    pub const CREATE_ANNOTATION: &str = "Failed to create annotation";
    pub const UPDATE_ANNOTATION: &str = "Failed to update annotation";
    pub const DELETE_ANNOTATION: &str = "Failed to delete annotation";
    pub const LIST_TRAINING_SESSIONS: &str = "Failed to fetch training sessions";
    pub const FETCH_TRAINING_SESSION: &str = "Failed to fetch training session";
    pub const START_TRAINING: &str = "Failed to start training session";
    pub const LIST_COMPUTE_PROFILES: &str = "Failed to fetch compute profiles";
    pub const LIST_RATE_CARDS: &str = "Failed to fetch billing rate cards";
    pub const FETCH_BILLING_REPORT: &str = "Failed to fetch billing report";
    pub const LIST_API_KEYS: &str = "Failed to fetch API keys";
    pub const CREATE_API_KEY: &str = "Failed to create API key";
    pub const REVOKE_API_KEY: &str = "Failed to revoke API key";
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// API client for the LabelHub server
///
/// Cheap to clone; clones share the connection pool and token source.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    /// Create a client without a request timeout
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        Self::build(base_url.into(), tokens, None)
    }

    /// Create a client from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(
            config.base_url().to_string(),
            config.token_source(),
            config.request_timeout(),
        )
    }

    fn build(base_url: String, tokens: Arc<dyn TokenSource>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check server health; any failure counts as unhealthy
    pub async fn health_check(&self) -> bool {
        let url = endpoints::health_url(&self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    // ========================================================================
    // Projects & Jobs
    // ========================================================================

    pub async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        self.get(endpoints::projects_url(&self.base_url), fallback::LIST_PROJECTS)
            .await
    }

    pub async fn get_project(&self, project_id: &str) -> ApiResult<Project> {
        self.get(endpoints::project_url(&self.base_url, project_id), fallback::FETCH_PROJECT)
            .await
    }

    pub async fn list_project_jobs(&self, project_id: &str) -> ApiResult<Vec<Job>> {
        self.get(endpoints::project_jobs_url(&self.base_url, project_id), fallback::LIST_JOBS)
            .await
    }

    pub async fn get_job(&self, job_id: &str) -> ApiResult<Job> {
        self.get(endpoints::job_url(&self.base_url, job_id), fallback::FETCH_JOB)
            .await
    }

    pub async fn update_job(&self, job_id: &str, update: &JobUpdate) -> ApiResult<Job> {
        self.send_json(
            Method::PATCH,
            endpoints::job_url(&self.base_url, job_id),
            update,
            fallback::UPDATE_JOB,
        )
        .await
    }

    pub async fn delete_job(&self, job_id: &str) -> ApiResult<()> {
        self.delete(endpoints::job_url(&self.base_url, job_id), fallback::DELETE_JOB)
            .await
    }

    // ========================================================================
    // Models & Validation
    // ========================================================================

    pub async fn list_models(&self, project_id: Option<&str>) -> ApiResult<Vec<Model>> {
        self.get(endpoints::models_url(&self.base_url, project_id), fallback::LIST_MODELS)
            .await
    }

    pub async fn get_model(&self, model_id: &str) -> ApiResult<Model> {
        self.get(endpoints::model_url(&self.base_url, model_id), fallback::FETCH_MODEL)
            .await
    }

    pub async fn list_model_versions(&self, model_id: &str) -> ApiResult<Vec<ModelVersion>> {
        self.get(
            endpoints::model_versions_url(&self.base_url, model_id),
            fallback::LIST_MODEL_VERSIONS,
        )
        .await
    }

    pub async fn list_validation_images(
        &self,
        version_id: &str,
        page: PageRequest,
    ) -> ApiResult<Page<ValidationImage>> {
        self.get(
            endpoints::validation_images_url(&self.base_url, version_id, page),
            fallback::LIST_VALIDATION_IMAGES,
        )
        .await
    }

    pub async fn get_validation_metrics(&self, version_id: &str) -> ApiResult<ValidationMetrics> {
        self.get(
            endpoints::validation_metrics_url(&self.base_url, version_id),
            fallback::FETCH_VALIDATION_METRICS,
        )
        .await
    }

    // ========================================================================
    // Annotations
    // ========================================================================

    pub async fn list_annotations(&self, job_id: &str, image_id: &str) -> ApiResult<Vec<Annotation>> {
        self.get(
            endpoints::image_annotations_url(&self.base_url, job_id, image_id),
            fallback::LIST_ANNOTATIONS,
        )
        .await
    }

    pub async fn create_annotation(
        &self,
        job_id: &str,
        image_id: &str,
        annotation: &NewAnnotation,
    ) -> ApiResult<Annotation> {
        self.send_json(
            Method::POST,
            endpoints::image_annotations_url(&self.base_url, job_id, image_id),
            annotation,
            fallback::CREATE_ANNOTATION,
        )
        .await
    }

    pub async fn update_annotation(
        &self,
        annotation_id: &str,
        update: &AnnotationUpdate,
    ) -> ApiResult<Annotation> {
        self.send_json(
            Method::PATCH,
            endpoints::annotation_url(&self.base_url, annotation_id),
            update,
            fallback::UPDATE_ANNOTATION,
        )
        .await
    }

    pub async fn delete_annotation(&self, annotation_id: &str) -> ApiResult<()> {
        self.delete(
            endpoints::annotation_url(&self.base_url, annotation_id),
            fallback::DELETE_ANNOTATION,
        )
        .await
    }

    // ========================================================================
    // Training
    // ========================================================================

    pub async fn list_training_sessions(&self, project_id: &str) -> ApiResult<Vec<TrainingSession>> {
        self.get(
            endpoints::project_training_sessions_url(&self.base_url, project_id),
            fallback::LIST_TRAINING_SESSIONS,
        )
        .await
    }

    pub async fn get_training_session(&self, session_id: &str) -> ApiResult<TrainingSession> {
        self.get(
            endpoints::training_session_url(&self.base_url, session_id),
            fallback::FETCH_TRAINING_SESSION,
        )
        .await
    }

    pub async fn start_training_session(
        &self,
        project_id: &str,
        request: &StartTrainingRequest,
    ) -> ApiResult<TrainingSession> {
        self.send_json(
            Method::POST,
            endpoints::project_training_sessions_url(&self.base_url, project_id),
            request,
            fallback::START_TRAINING,
        )
        .await
    }

    // ========================================================================
    // Compute & Billing
    // ========================================================================

    pub async fn list_compute_profiles(&self) -> ApiResult<Vec<ComputeProfile>> {
        self.get(
            endpoints::compute_profiles_url(&self.base_url),
            fallback::LIST_COMPUTE_PROFILES,
        )
        .await
    }

    pub async fn list_billing_rate_cards(&self) -> ApiResult<Vec<BillingRateCard>> {
        self.get(
            endpoints::billing_rate_cards_url(&self.base_url),
            fallback::LIST_RATE_CARDS,
        )
        .await
    }

    pub async fn get_billing_report(&self, filter: &BillingReportFilter) -> ApiResult<BillingReport> {
        self.get(
            endpoints::billing_report_url(&self.base_url, filter),
            fallback::FETCH_BILLING_REPORT,
        )
        .await
    }

    // ========================================================================
    // API keys
    // ========================================================================

    pub async fn list_api_keys(&self) -> ApiResult<Vec<ApiKey>> {
        self.get(endpoints::api_keys_url(&self.base_url), fallback::LIST_API_KEYS)
            .await
    }

    pub async fn create_api_key(&self, request: &CreateApiKeyRequest) -> ApiResult<CreatedApiKey> {
        self.send_json(
            Method::POST,
            endpoints::api_keys_url(&self.base_url),
            request,
            fallback::CREATE_API_KEY,
        )
        .await
    }

    /// Revoke a key; revocation cannot be undone
    pub async fn revoke_api_key(&self, key_id: &str) -> ApiResult<()> {
        self.delete(endpoints::api_key_url(&self.base_url, key_id), fallback::REVOKE_API_KEY)
            .await
    }

    // ========================================================================
    // Request composition
    // ========================================================================

    async fn get<T: DeserializeOwned>(&self, url: String, fallback: &str) -> ApiResult<T> {
        let body = self.execute(Method::GET, &url, None, fallback).await?;
        decode(&body)
    }

    async fn send_json<B, T>(&self, method: Method, url: String, body: &B, fallback: &str) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        let body = self.execute(method, &url, Some(payload), fallback).await?;
        decode(&body)
    }

    async fn delete(&self, url: String, fallback: &str) -> ApiResult<()> {
        self.execute(Method::DELETE, &url, None, fallback).await?;
        Ok(())
    }

    /// Send one request and return the success body
    ///
    /// The token is read from the token source here, immediately before sending.
    async fn execute(
        &self,
        method: Method,
        url: &str,
        payload: Option<serde_json::Value>,
        fallback: &str,
    ) -> ApiResult<String> {
        let mut request = self.client.request(method.clone(), url);
        if let Some(token) = self.tokens.token() {
            request = request.bearer_auth(token);
        }
        if let Some(payload) = payload {
            request = request.json(&payload);
        }

        debug!(%method, %url, "Sending API request");

        let response = request.send().await.map_err(|e| {
            warn!(%method, %url, error = %e, "API request could not be sent");
            ApiError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let err = failure(status, response.text().await, fallback);
            warn!(%method, %url, status = status.as_u16(), error = %err, "API request failed");
            return Err(err);
        }

        let body = response.text().await?;
        debug!(%method, %url, status = status.as_u16(), bytes = body.len(), "API request succeeded");
        Ok(body)
    }
}

/// Error for a non-success status; an unreadable body falls back like an empty one
fn failure<E: std::fmt::Display>(status: StatusCode, body: std::result::Result<String, E>, fallback: &str) -> ApiError {
    let body = body.unwrap_or_else(|e| {
        debug!(status = status.as_u16(), error = %e, "Error response body unreadable");
        String::new()
    });
    ApiError::from_response(status, &body, fallback)
}

/// Decode a success body; an empty body decodes as JSON `null` so `()` works
fn decode<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(ApiError::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::NoToken;

    #[test]
    fn test_api_client_creation_trims_base_url() {
        let client = ApiClient::new("http://localhost:8000/", Arc::new(NoToken)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_api_client_from_config() {
        let config = Config {
            api_url: "http://test.example.com".to_string(),
            request_timeout_secs: Some(5),
            ..Config::default()
        };
        let client = ApiClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://test.example.com");
    }

    #[test]
    fn test_decode_empty_body_as_unit() {
        let unit: ApiResult<()> = decode("");
        assert!(unit.is_ok());

        let err = decode::<Model>("{not json").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_unreadable_error_body_uses_fallback() {
        let err = failure(StatusCode::BAD_GATEWAY, Err::<String, _>("connection reset"), "Failed to fetch model");
        assert_eq!(
            err,
            ApiError::RequestFailed {
                status: 502,
                message: "Failed to fetch model".to_string()
            }
        );

        let err = failure(StatusCode::NOT_FOUND, Ok::<_, String>(r#"{"detail":"not found"}"#.to_string()), "x");
        assert_eq!(err.to_string(), "not found");
    }

    #[tokio::test]
    async fn test_unserializable_body_is_an_encode_error() {
        let client = ApiClient::new("http://127.0.0.1:9", Arc::new(NoToken)).unwrap();
        let body = std::collections::HashMap::from([((1u32, 2u32), "tuple keys are not JSON")]);

        let err = client
            .send_json::<_, ()>(Method::POST, "http://127.0.0.1:9/x".to_string(), &body, "fallback")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Encode(_)));
        assert!(err.to_string().starts_with("Failed to encode request body"));
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let client = ApiClient::new("http://127.0.0.1:9", Arc::new(NoToken)).unwrap();
        assert!(!client.health_check().await);
    }
}
