use super::{keys, Hooks};
use crate::api::types::{Page, PageRequest, ValidationImage, ValidationMetrics};
use crate::cache::Query;

impl Hooks {
    /// One page of a model version's validation images; each page is cached separately
    pub fn validation_images(&self, version_id: &str, page: PageRequest) -> Query<Page<ValidationImage>> {
        let id = version_id.to_string();
        self.query_with(keys::validation_images(version_id, &page), &[version_id], move |client| {
            let id = id.clone();
            async move { client.list_validation_images(&id, page).await }
        })
    }

    pub fn validation_metrics(&self, version_id: &str) -> Query<ValidationMetrics> {
        let id = version_id.to_string();
        self.query_with(keys::validation_metrics(version_id), &[version_id], move |client| {
            let id = id.clone();
            async move { client.get_validation_metrics(&id).await }
        })
    }
}
