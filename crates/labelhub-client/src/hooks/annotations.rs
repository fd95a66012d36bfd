use super::{keys, Hooks};
use crate::api::types::{Annotation, AnnotationUpdate, NewAnnotation};
use crate::cache::{CacheEffects, Mutation, Query};

/// Payload for [`Hooks::update_annotation`]
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationChange {
    pub annotation_id: String,
    pub update: AnnotationUpdate,
}

impl Hooks {
    /// Annotations of one image within a job; needs both ids
    pub fn annotations(&self, job_id: &str, image_id: &str) -> Query<Vec<Annotation>> {
        let (job, image) = (job_id.to_string(), image_id.to_string());
        self.query_with(keys::annotations(job_id, image_id), &[job_id, image_id], move |client| {
            let (job, image) = (job.clone(), image.clone());
            async move { client.list_annotations(&job, &image).await }
        })
    }

    pub fn create_annotation(&self, job_id: &str, image_id: &str) -> Mutation<NewAnnotation, Annotation> {
        let (job, image) = (job_id.to_string(), image_id.to_string());
        let key = keys::annotations(job_id, image_id);
        self.mutation(
            "create_annotation",
            move |client, annotation: NewAnnotation| {
                let (job, image) = (job.clone(), image.clone());
                async move { client.create_annotation(&job, &image, &annotation).await }
            },
            move |_, _| CacheEffects::new().invalidate(key.clone()),
        )
    }

    pub fn update_annotation(&self, job_id: &str, image_id: &str) -> Mutation<AnnotationChange, Annotation> {
        let key = keys::annotations(job_id, image_id);
        self.mutation(
            "update_annotation",
            |client, change: AnnotationChange| async move {
                client
                    .update_annotation(&change.annotation_id, &change.update)
                    .await
            },
            move |_, _| CacheEffects::new().invalidate(key.clone()),
        )
    }

    /// Payload is the annotation id
    pub fn delete_annotation(&self, job_id: &str, image_id: &str) -> Mutation<String, ()> {
        let key = keys::annotations(job_id, image_id);
        self.mutation(
            "delete_annotation",
            |client, annotation_id: String| async move { client.delete_annotation(&annotation_id).await },
            move |_, _| CacheEffects::new().invalidate(key.clone()),
        )
    }
}
