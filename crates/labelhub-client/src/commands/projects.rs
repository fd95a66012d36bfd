//! `labelhub projects` commands

use super::{load, or_dash, table, Context};
use crate::error::Result;
use crate::ProjectCommand;
use colored::Colorize;

pub async fn run(ctx: &Context, command: &ProjectCommand) -> Result<()> {
    match command {
        ProjectCommand::List => list(ctx).await,
        ProjectCommand::Get { project_id } => get(ctx, project_id).await,
        ProjectCommand::Jobs { project_id } => jobs(ctx, project_id).await,
    }
}

async fn list(ctx: &Context) -> Result<()> {
    let projects = load(ctx.hooks.projects()).await?;
    if ctx.emit_json(&*projects)? {
        return Ok(());
    }

    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }

    let mut table = table(vec!["ID", "Name", "Jobs", "Created"]);
    for project in projects.iter() {
        table.add_row(vec![
            project.id.clone(),
            project.name.clone(),
            or_dash(project.job_count),
            project.created_at.format("%Y-%m-%d").to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

async fn get(ctx: &Context, project_id: &str) -> Result<()> {
    let project = load(ctx.hooks.project(project_id)).await?;
    if ctx.emit_json(&*project)? {
        return Ok(());
    }

    println!("{}", project.name.bold());
    println!("  ID:          {}", project.id);
    println!("  Description: {}", or_dash(project.description.as_deref()));
    println!("  Jobs:        {}", or_dash(project.job_count));
    println!("  Created:     {}", project.created_at);
    Ok(())
}

async fn jobs(ctx: &Context, project_id: &str) -> Result<()> {
    let jobs = load(ctx.hooks.project_jobs(project_id)).await?;
    if ctx.emit_json(&*jobs)? {
        return Ok(());
    }

    if jobs.is_empty() {
        println!("No jobs in project {}.", project_id);
        return Ok(());
    }

    let mut table = table(vec!["ID", "Name", "Status", "Assignee", "Images"]);
    for job in jobs.iter() {
        table.add_row(vec![
            job.id.clone(),
            job.name.clone(),
            job.status.to_string(),
            or_dash(job.assignee.as_deref()),
            job.image_count.to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}
