//! Cache key scheme
//!
//! Every query and mutation effect builds its keys here so reads and
//! invalidations always agree.

use crate::api::types::{BillingReportFilter, PageRequest};
use crate::cache::QueryKey;

pub fn projects() -> QueryKey {
    QueryKey::new("projects")
}

pub fn project(project_id: &str) -> QueryKey {
    QueryKey::new("project").with(project_id)
}

pub fn project_jobs(project_id: &str) -> QueryKey {
    QueryKey::new("project-jobs").with(project_id)
}

pub fn job(job_id: &str) -> QueryKey {
    QueryKey::new("job").with(job_id)
}

/// All models, or one project's models
pub fn models(project_id: Option<&str>) -> QueryKey {
    let key = QueryKey::new("models");
    match project_id {
        Some(project_id) => key.with(project_id),
        None => key,
    }
}

pub fn model(model_id: &str) -> QueryKey {
    QueryKey::new("model").with(model_id)
}

pub fn model_versions(model_id: &str) -> QueryKey {
    QueryKey::new("model-versions").with(model_id)
}

pub fn validation_images(version_id: &str, page: &PageRequest) -> QueryKey {
    QueryKey::new("validation-images")
        .with(version_id)
        .with_params(page)
}

pub fn validation_metrics(version_id: &str) -> QueryKey {
    QueryKey::new("validation-metrics").with(version_id)
}

pub fn annotations(job_id: &str, image_id: &str) -> QueryKey {
    QueryKey::new("annotations").with(job_id).with(image_id)
}

pub fn training_sessions(project_id: &str) -> QueryKey {
    QueryKey::new("training-sessions").with(project_id)
}

pub fn training_session(session_id: &str) -> QueryKey {
    QueryKey::new("training-session").with(session_id)
}

pub fn compute_profiles() -> QueryKey {
    QueryKey::new("compute-profiles")
}

pub fn billing_rate_cards() -> QueryKey {
    QueryKey::new("billing-rate-cards")
}

pub fn billing_report(filter: &BillingReportFilter) -> QueryKey {
    QueryKey::new("billing-report").with_params(filter)
}

pub fn api_keys() -> QueryKey {
    QueryKey::new("api-keys")
}
