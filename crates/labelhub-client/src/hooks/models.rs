use super::{keys, Hooks};
use crate::api::types::{Model, ModelVersion};
use crate::cache::Query;

impl Hooks {
    /// All models, or only those of `project_id`
    pub fn models(&self, project_id: Option<&str>) -> Query<Vec<Model>> {
        let project = project_id.map(str::to_string);
        self.query(keys::models(project_id), move |client| {
            let project = project.clone();
            async move { client.list_models(project.as_deref()).await }
        })
    }

    pub fn model_by_id(&self, model_id: &str) -> Query<Model> {
        let id = model_id.to_string();
        self.query_with(keys::model(model_id), &[model_id], move |client| {
            let id = id.clone();
            async move { client.get_model(&id).await }
        })
    }

    pub fn model_versions(&self, model_id: &str) -> Query<Vec<ModelVersion>> {
        let id = model_id.to_string();
        self.query_with(keys::model_versions(model_id), &[model_id], move |client| {
            let id = id.clone();
            async move { client.list_model_versions(&id).await }
        })
    }
}
