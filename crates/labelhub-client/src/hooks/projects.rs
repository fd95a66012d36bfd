use super::{keys, Hooks};
use crate::api::types::{Job, Project};
use crate::cache::Query;

impl Hooks {
    pub fn projects(&self) -> Query<Vec<Project>> {
        self.query(keys::projects(), |client| async move { client.list_projects().await })
    }

    pub fn project(&self, project_id: &str) -> Query<Project> {
        let id = project_id.to_string();
        self.query_with(keys::project(project_id), &[project_id], move |client| {
            let id = id.clone();
            async move { client.get_project(&id).await }
        })
    }

    /// Jobs of one project; invalidated by job updates and deletions
    pub fn project_jobs(&self, project_id: &str) -> Query<Vec<Job>> {
        let id = project_id.to_string();
        self.query_with(keys::project_jobs(project_id), &[project_id], move |client| {
            let id = id.clone();
            async move { client.list_project_jobs(&id).await }
        })
    }
}
