//! `labelhub sessions` commands
//!
//! `watch` holds a polling observer on the session and redraws on every
//! published state until the session reaches a terminal status.

use super::{load, or_dash, success, table, Context};
use crate::api::types::{StartTrainingRequest, TrainingConfig, TrainingSession, TrainingStatus};
use crate::error::{ClientError, Result};
use crate::SessionCommand;
use colored::Colorize;
use tracing::debug;

pub async fn run(ctx: &Context, command: &SessionCommand) -> Result<()> {
    match command {
        SessionCommand::List { project_id } => list(ctx, project_id).await,
        SessionCommand::Get { session_id } => get(ctx, session_id).await,
        SessionCommand::Watch { session_id } => watch(ctx, session_id).await,
        SessionCommand::Start {
            project_id,
            name,
            base_model,
            epochs,
            batch_size,
            learning_rate,
            image_size,
            compute_profile,
        } => {
            let request = StartTrainingRequest {
                name: name.clone(),
                configuration: TrainingConfig {
                    base_model: base_model.clone(),
                    epochs: *epochs,
                    batch_size: *batch_size,
                    learning_rate: *learning_rate,
                    image_size: *image_size,
                    compute_profile_id: compute_profile.clone(),
                },
            };
            start(ctx, project_id, request).await
        },
    }
}

async fn list(ctx: &Context, project_id: &str) -> Result<()> {
    let sessions = load(ctx.hooks.training_sessions(project_id)).await?;
    if ctx.emit_json(&*sessions)? {
        return Ok(());
    }

    let mut table = table(vec!["ID", "Status", "Progress", "Model version", "Created"]);
    for session in sessions.iter() {
        table.add_row(vec![
            session.id.clone(),
            session.status.to_string(),
            format!("{:.0}%", session.progress_percent()),
            or_dash(session.model_version_id.as_deref()),
            session.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

async fn get(ctx: &Context, session_id: &str) -> Result<()> {
    let session = load(ctx.hooks.training_session_detail(session_id)).await?;
    if !ctx.emit_json(&*session)? {
        print_session(&session);
    }
    Ok(())
}

async fn watch(ctx: &Context, session_id: &str) -> Result<()> {
    let query = ctx.hooks.training_session_detail(session_id);
    if !query.is_enabled() {
        return Err(ClientError::invalid_argument("session id must not be empty"));
    }

    let mut observer = query.observe();
    let mut last_progress = None;

    while observer.changed().await {
        let state = observer.state();
        if let Some(ref err) = state.error {
            return Err(err.clone().into());
        }
        let Some(session) = state.data else {
            continue;
        };

        let progress = (session.status, session.progress_percent().round() as u32);
        if last_progress != Some(progress) {
            debug!(session = %session.id, status = %session.status, progress = progress.1, "Session update");
            println!("{} {:>3}%  {}", status_label(session.status), progress.1, or_dash(session.logs.last()));
            last_progress = Some(progress);
        }

        if session.status.is_terminal() {
            print_session(&session);
            return Ok(());
        }
    }

    Ok(())
}

async fn start(ctx: &Context, project_id: &str, request: StartTrainingRequest) -> Result<()> {
    let session = ctx.hooks.start_training(project_id).mutate(request).await?;
    if !ctx.emit_json(&session)? {
        success(format!("Started training session {}", session.id));
        println!("  Follow it with: labelhub sessions watch {}", session.id);
    }
    Ok(())
}

fn status_label(status: TrainingStatus) -> String {
    let label = format!("{:<9}", status.to_string());
    match status {
        TrainingStatus::Pending => label.yellow().to_string(),
        TrainingStatus::Running => label.cyan().to_string(),
        TrainingStatus::Completed => label.green().to_string(),
        TrainingStatus::Failed => label.red().to_string(),
    }
}

fn print_session(session: &TrainingSession) {
    println!();
    println!("{}", format!("Training session {}", session.id).bold());
    println!("  Status:        {}", status_label(session.status));
    println!("  Progress:      {:.0}%", session.progress_percent());
    println!("  Model version: {}", or_dash(session.model_version_id.as_deref()));
    if let Some(ref config) = session.configuration {
        println!("  Base model:    {} ({} epochs)", config.base_model, config.epochs);
    }

    let mut metrics: Vec<_> = session.metrics.iter().collect();
    metrics.sort_by(|a, b| a.0.cmp(b.0));
    for (name, value) in metrics {
        println!("  {:<14} {:.4}", format!("{}:", name), value);
    }
}
