use super::{keys, Hooks};
use crate::api::types::{StartTrainingRequest, TrainingSession};
use crate::cache::{CacheEffects, Mutation, Query};

impl Hooks {
    pub fn training_sessions(&self, project_id: &str) -> Query<Vec<TrainingSession>> {
        let id = project_id.to_string();
        self.query_with(keys::training_sessions(project_id), &[project_id], move |client| {
            let id = id.clone();
            async move { client.list_training_sessions(&id).await }
        })
    }

    /// One session; observers poll it every training poll interval
    pub fn training_session_detail(&self, session_id: &str) -> Query<TrainingSession> {
        let id = session_id.to_string();
        self.query_with(keys::training_session(session_id), &[session_id], move |client| {
            let id = id.clone();
            async move { client.get_training_session(&id).await }
        })
        .refetch_interval(self.training_poll_interval)
    }

    pub fn start_training(&self, project_id: &str) -> Mutation<StartTrainingRequest, TrainingSession> {
        let project = project_id.to_string();
        let key = keys::training_sessions(project_id);
        self.mutation(
            "start_training",
            move |client, request: StartTrainingRequest| {
                let project = project.clone();
                async move { client.start_training_session(&project, &request).await }
            },
            move |_, _| CacheEffects::new().invalidate(key.clone()),
        )
    }
}
