//! API request and response types
//!
//! Snapshots of server state at fetch time. The server is the trust boundary,
//! so nothing here is validated beyond what serde needs to decode.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Projects & Jobs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub job_count: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Annotation job lifecycle as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Review,
    Completed,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Review => "review",
            JobStatus::Completed => "completed",
            JobStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// An annotation job; belongs to exactly one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub status: JobStatus,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub image_count: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// PATCH body for a job; unset fields are left untouched server-side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

// ============================================================================
// Models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub latest_version: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// A trained version of a model; `version` increases monotonically per model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub id: String,
    pub model_id: String,
    pub version: u32,
    #[serde(default)]
    pub training_session_id: Option<String>,
    #[serde(default)]
    pub metrics: HashMap<String, f64>,
    pub created_at: DateTime<Utc>,
}

impl ModelVersion {
    /// Highest version in a list, whatever order the server returned
    pub fn latest(versions: &[ModelVersion]) -> Option<&ModelVersion> {
        versions.iter().max_by_key(|v| v.version)
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Axis-aligned box in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub class_name: String,
    pub confidence: f64,
    #[serde(flatten)]
    pub bbox: BoundingBox,
}

/// One validation sample for a model version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationImage {
    pub id: String,
    pub model_version_id: String,
    pub image_url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    #[serde(default)]
    pub ground_truth: Vec<Prediction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class_name: String,
    pub precision: f64,
    pub recall: f64,
    #[serde(default)]
    pub average_precision: Option<f64>,
}

/// Aggregate validation metrics for a model version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub model_version_id: String,
    #[serde(default)]
    pub precision: Option<f64>,
    #[serde(default)]
    pub recall: Option<f64>,
    #[serde(default)]
    pub map50: Option<f64>,
    #[serde(default)]
    pub map50_95: Option<f64>,
    #[serde(default)]
    pub per_class: Vec<ClassMetrics>,
}

/// Paging parameters for list endpoints that page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

// ============================================================================
// Annotations
// ============================================================================

/// A bounding-box annotation on one image of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub annotation_uid: String,
    pub class_id: String,
    pub class_name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub reviewed: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnnotation {
    pub annotation_uid: String,
    pub class_id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// PATCH body for an annotation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// ============================================================================
// Training
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TrainingStatus {
    /// No further server-driven transitions are expected
    pub fn is_terminal(self) -> bool {
        matches!(self, TrainingStatus::Completed | TrainingStatus::Failed)
    }
}

impl std::fmt::Display for TrainingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TrainingStatus::Pending => "pending",
            TrainingStatus::Running => "running",
            TrainingStatus::Completed => "completed",
            TrainingStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Hyper-parameters a session was started with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub base_model: String,
    pub epochs: u32,
    #[serde(default)]
    pub batch_size: Option<u32>,
    #[serde(default)]
    pub learning_rate: Option<f64>,
    #[serde(default)]
    pub image_size: Option<u32>,
    #[serde(default)]
    pub compute_profile_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSession {
    pub id: String,
    pub project_id: String,
    pub status: TrainingStatus,
    /// 0–100 as reported; see [`TrainingSession::progress_percent`]
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub metrics: HashMap<String, f64>,
    #[serde(default)]
    pub configuration: Option<TrainingConfig>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub model_version_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl TrainingSession {
    pub fn progress_percent(&self) -> f64 {
        self.progress.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartTrainingRequest {
    pub name: String,
    pub configuration: TrainingConfig,
}

// ============================================================================
// Compute & Billing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeProfile {
    pub id: String,
    pub name: String,
    pub gpu_type: Option<String>,
    #[serde(default)]
    pub gpu_count: u32,
    pub vcpus: u32,
    pub memory_gb: u32,
    pub hourly_rate: f64,
    #[serde(default = "default_true")]
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingRateCard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub compute_profile_id: Option<String>,
    /// Billing unit, e.g. "gpu_hour"
    pub unit: String,
    pub rate: f64,
    pub currency: String,
    pub effective_from: NaiveDate,
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
}

/// Time-bounded filter for a billing report
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingReportFilter {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingReportRow {
    pub date: NaiveDate,
    #[serde(default)]
    pub project_id: Option<String>,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub currency: String,
    pub total: f64,
    #[serde(default)]
    pub rows: Vec<BillingReportRow>,
}

// ============================================================================
// API keys
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyStatus {
    Active,
    Revoked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: String,
    pub name: String,
    /// First characters of the secret, for display
    pub prefix: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub status: ApiKeyStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    pub fn is_revoked(&self) -> bool {
        self.status == ApiKeyStatus::Revoked
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
    pub scopes: Vec<String>,
}

/// Creation response; `secret` is only ever returned once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedApiKey {
    pub api_key: ApiKey,
    pub secret: String,
}
