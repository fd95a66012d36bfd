use super::{keys, Hooks};
use crate::api::types::{Job, JobUpdate};
use crate::cache::{CacheEffects, Mutation, Query};

/// Payload for [`Hooks::update_job`]
#[derive(Debug, Clone, PartialEq)]
pub struct JobChange {
    pub job_id: String,
    pub update: JobUpdate,
}

impl Hooks {
    pub fn job(&self, job_id: &str) -> Query<Job> {
        let id = job_id.to_string();
        self.query_with(keys::job(job_id), &[job_id], move |client| {
            let id = id.clone();
            async move { client.get_job(&id).await }
        })
    }

    /// PATCH a job of `project_id`; refreshes the job and its project's list
    pub fn update_job(&self, project_id: &str) -> Mutation<JobChange, Job> {
        let project = project_id.to_string();
        self.mutation(
            "update_job",
            |client, change: JobChange| async move { client.update_job(&change.job_id, &change.update).await },
            move |change, _| {
                CacheEffects::new()
                    .invalidate(keys::job(&change.job_id))
                    .invalidate(keys::project_jobs(&project))
            },
        )
    }

    /// Delete a job of `project_id`; payload is the job id
    ///
    /// The job's own entry is evicted rather than invalidated, so nothing
    /// refetches a resource that no longer exists.
    pub fn delete_job(&self, project_id: &str) -> Mutation<String, ()> {
        let project = project_id.to_string();
        self.mutation(
            "delete_job",
            |client, job_id: String| async move { client.delete_job(&job_id).await },
            move |job_id, _| {
                CacheEffects::new()
                    .invalidate(keys::project_jobs(&project))
                    .remove(keys::job(job_id))
            },
        )
    }
}
