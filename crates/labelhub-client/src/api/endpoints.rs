//! API endpoint URL builders
//!
//! Every resource lives under `<base>/api/v1/<resource>[/<id>][/<subresource>]`.
//! Path segments are percent-encoded so ids can never change the path shape.

use crate::api::types::{BillingReportFilter, PageRequest};
use urlencoding::encode;

const API_PREFIX: &str = "/api/v1";

fn api(base_url: &str, path: &str) -> String {
    format!("{}{}{}", base_url, API_PREFIX, path)
}

/// Build health check URL
pub fn health_url(base_url: &str) -> String {
    format!("{}/health", base_url)
}

pub fn projects_url(base_url: &str) -> String {
    api(base_url, "/projects")
}

pub fn project_url(base_url: &str, project_id: &str) -> String {
    api(base_url, &format!("/projects/{}", encode(project_id)))
}

pub fn project_jobs_url(base_url: &str, project_id: &str) -> String {
    api(base_url, &format!("/projects/{}/jobs", encode(project_id)))
}

pub fn job_url(base_url: &str, job_id: &str) -> String {
    api(base_url, &format!("/jobs/{}", encode(job_id)))
}

/// Build model list URL, optionally scoped to a project
pub fn models_url(base_url: &str, project_id: Option<&str>) -> String {
    let mut url = api(base_url, "/models");
    if let Some(project_id) = project_id {
        url.push_str(&format!("?project_id={}", encode(project_id)));
    }
    url
}

pub fn model_url(base_url: &str, model_id: &str) -> String {
    api(base_url, &format!("/models/{}", encode(model_id)))
}

pub fn model_versions_url(base_url: &str, model_id: &str) -> String {
    api(base_url, &format!("/models/{}/versions", encode(model_id)))
}

pub fn validation_images_url(base_url: &str, version_id: &str, page: PageRequest) -> String {
    api(
        base_url,
        &format!(
            "/model-versions/{}/validation-images?page={}&page_size={}",
            encode(version_id),
            page.page,
            page.page_size
        ),
    )
}

pub fn validation_metrics_url(base_url: &str, version_id: &str) -> String {
    api(base_url, &format!("/model-versions/{}/metrics", encode(version_id)))
}

/// Annotations of one image within a job (list and create)
pub fn image_annotations_url(base_url: &str, job_id: &str, image_id: &str) -> String {
    api(
        base_url,
        &format!("/jobs/{}/images/{}/annotations", encode(job_id), encode(image_id)),
    )
}

pub fn annotation_url(base_url: &str, annotation_id: &str) -> String {
    api(base_url, &format!("/annotations/{}", encode(annotation_id)))
}

/// Training sessions of a project (list and start)
pub fn project_training_sessions_url(base_url: &str, project_id: &str) -> String {
    api(base_url, &format!("/projects/{}/training-sessions", encode(project_id)))
}

pub fn training_session_url(base_url: &str, session_id: &str) -> String {
    api(base_url, &format!("/training-sessions/{}", encode(session_id)))
}

pub fn compute_profiles_url(base_url: &str) -> String {
    api(base_url, "/compute-profiles")
}

pub fn billing_rate_cards_url(base_url: &str) -> String {
    api(base_url, "/billing/rate-cards")
}

pub fn billing_report_url(base_url: &str, filter: &BillingReportFilter) -> String {
    let mut url = api(
        base_url,
        &format!("/billing/reports?from={}&to={}", filter.from, filter.to),
    );

    if let Some(ref project_id) = filter.project_id {
        url.push_str(&format!("&project_id={}", encode(project_id)));
    }

    url
}

pub fn api_keys_url(base_url: &str) -> String {
    api(base_url, "/api-keys")
}

pub fn api_key_url(base_url: &str, key_id: &str) -> String {
    api(base_url, &format!("/api-keys/{}", encode(key_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const BASE: &str = "http://localhost:8000";

    #[test]
    fn test_model_url() {
        assert_eq!(model_url(BASE, "42"), "http://localhost:8000/api/v1/models/42");
    }

    #[test]
    fn test_models_url_with_project_filter() {
        assert_eq!(models_url(BASE, None), "http://localhost:8000/api/v1/models");
        assert_eq!(
            models_url(BASE, Some("proj 1")),
            "http://localhost:8000/api/v1/models?project_id=proj%201"
        );
    }

    #[test]
    fn test_path_segments_are_encoded() {
        assert_eq!(job_url(BASE, "a/b"), "http://localhost:8000/api/v1/jobs/a%2Fb");
    }

    #[test]
    fn test_image_annotations_url() {
        assert_eq!(
            image_annotations_url(BASE, "job-9", "img-3"),
            "http://localhost:8000/api/v1/jobs/job-9/images/img-3/annotations"
        );
    }

    #[test]
    fn test_validation_images_url() {
        let url = validation_images_url(BASE, "v7", PageRequest { page: 2, page_size: 25 });
        assert_eq!(
            url,
            "http://localhost:8000/api/v1/model-versions/v7/validation-images?page=2&page_size=25"
        );
    }

    #[test]
    fn test_billing_report_url() {
        let filter = BillingReportFilter {
            from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default(),
            to: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap_or_default(),
            project_id: Some("proj-1".to_string()),
        };
        assert_eq!(
            billing_report_url(BASE, &filter),
            "http://localhost:8000/api/v1/billing/reports?from=2026-01-01&to=2026-01-31&project_id=proj-1"
        );
    }

    #[test]
    fn test_health_url() {
        assert_eq!(health_url(BASE), "http://localhost:8000/health");
    }
}
