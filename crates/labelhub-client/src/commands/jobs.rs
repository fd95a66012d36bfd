//! `labelhub jobs` commands

use super::{load, or_dash, success, Context};
use crate::api::types::{JobStatus, JobUpdate};
use crate::error::{ClientError, Result};
use crate::hooks::JobChange;
use crate::JobCommand;
use colored::Colorize;

pub async fn run(ctx: &Context, command: &JobCommand) -> Result<()> {
    match command {
        JobCommand::Get { job_id } => get(ctx, job_id).await,
        JobCommand::Update {
            project_id,
            job_id,
            name,
            status,
            assignee,
        } => {
            let update = JobUpdate {
                name: name.clone(),
                status: status.as_deref().map(parse_status).transpose()?,
                assignee: assignee.clone(),
            };
            apply_update(ctx, project_id, job_id, update).await
        },
        JobCommand::Delete { project_id, job_id } => delete(ctx, project_id, job_id).await,
    }
}

async fn get(ctx: &Context, job_id: &str) -> Result<()> {
    let job = load(ctx.hooks.job(job_id)).await?;
    if ctx.emit_json(&*job)? {
        return Ok(());
    }

    println!("{}", job.name.bold());
    println!("  ID:       {}", job.id);
    println!("  Project:  {}", job.project_id);
    println!("  Status:   {}", job.status);
    println!("  Assignee: {}", or_dash(job.assignee.as_deref()));
    println!("  Images:   {}", job.image_count);
    Ok(())
}

async fn apply_update(ctx: &Context, project_id: &str, job_id: &str, update: JobUpdate) -> Result<()> {
    if update == JobUpdate::default() {
        return Err(ClientError::invalid_argument(
            "nothing to update; pass --name, --status or --assignee",
        ));
    }

    let change = JobChange {
        job_id: job_id.to_string(),
        update,
    };
    let job = ctx.hooks.update_job(project_id).mutate(change).await?;
    if !ctx.emit_json(&job)? {
        success(format!("Updated job {} ({})", job.id, job.status));
    }
    Ok(())
}

async fn delete(ctx: &Context, project_id: &str, job_id: &str) -> Result<()> {
    ctx.hooks
        .delete_job(project_id)
        .mutate(job_id.to_string())
        .await?;
    success(format!("Deleted job {}", job_id));
    Ok(())
}

fn parse_status(raw: &str) -> Result<JobStatus> {
    match serde_json::from_value(serde_json::Value::String(raw.to_string())) {
        Ok(JobStatus::Unknown) | Err(_) => Err(ClientError::invalid_argument(format!(
            "unknown job status '{}'; expected pending, in_progress, review or completed",
            raw
        ))),
        Ok(status) => Ok(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("in_progress").ok(), Some(JobStatus::InProgress));
        assert!(parse_status("unknown").is_err());
        assert!(parse_status("finished").is_err());
    }
}
