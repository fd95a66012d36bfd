//! `labelhub models` commands

use super::{load, or_dash, table, Context};
use crate::api::types::{ModelVersion, PageRequest};
use crate::error::{ClientError, Result};
use crate::ModelCommand;
use colored::Colorize;

pub async fn run(ctx: &Context, command: &ModelCommand) -> Result<()> {
    match command {
        ModelCommand::List { project } => list(ctx, project.as_deref()).await,
        ModelCommand::Get { model_id } => get(ctx, model_id).await,
        ModelCommand::Versions { model_id } => versions(ctx, model_id).await,
        ModelCommand::Metrics { version_id } => metrics(ctx, version_id).await,
        ModelCommand::Images {
            version_id,
            page,
            page_size,
        } => {
            if *page == 0 || *page_size == 0 {
                return Err(ClientError::invalid_argument("--page and --page-size start at 1"));
            }
            let request = PageRequest {
                page: *page,
                page_size: *page_size,
            };
            images(ctx, version_id, request).await
        },
    }
}

async fn list(ctx: &Context, project: Option<&str>) -> Result<()> {
    let models = load(ctx.hooks.models(project)).await?;
    if ctx.emit_json(&*models)? {
        return Ok(());
    }

    let mut table = table(vec!["ID", "Name", "Task", "Latest version"]);
    for model in models.iter() {
        table.add_row(vec![
            model.id.clone(),
            model.name.clone(),
            or_dash(model.task_type.as_deref()),
            or_dash(model.latest_version),
        ]);
    }
    println!("{}", table);
    Ok(())
}

async fn get(ctx: &Context, model_id: &str) -> Result<()> {
    let model = load(ctx.hooks.model_by_id(model_id)).await?;
    if ctx.emit_json(&*model)? {
        return Ok(());
    }

    println!("{}", model.name.bold());
    println!("  ID:             {}", model.id);
    println!("  Project:        {}", or_dash(model.project_id.as_deref()));
    println!("  Task:           {}", or_dash(model.task_type.as_deref()));
    println!("  Latest version: {}", or_dash(model.latest_version));
    Ok(())
}

async fn versions(ctx: &Context, model_id: &str) -> Result<()> {
    let versions = load(ctx.hooks.model_versions(model_id)).await?;
    if ctx.emit_json(&*versions)? {
        return Ok(());
    }

    let latest = ModelVersion::latest(&versions).map(|v| v.id.clone());
    let mut table = table(vec!["Version", "ID", "Session", "Created"]);
    for version in versions.iter() {
        let label = if Some(&version.id) == latest.as_ref() {
            format!("v{} (latest)", version.version)
        } else {
            format!("v{}", version.version)
        };
        table.add_row(vec![
            label,
            version.id.clone(),
            or_dash(version.training_session_id.as_deref()),
            version.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

async fn metrics(ctx: &Context, version_id: &str) -> Result<()> {
    let metrics = load(ctx.hooks.validation_metrics(version_id)).await?;
    if ctx.emit_json(&*metrics)? {
        return Ok(());
    }

    let fmt = |value: Option<f64>| or_dash(value.map(|v| format!("{:.3}", v)));
    println!("{}", format!("Validation metrics for {}", metrics.model_version_id).bold());
    println!("  Precision: {}", fmt(metrics.precision));
    println!("  Recall:    {}", fmt(metrics.recall));
    println!("  mAP@50:    {}", fmt(metrics.map50));
    println!("  mAP@50-95: {}", fmt(metrics.map50_95));

    if !metrics.per_class.is_empty() {
        let mut table = table(vec!["Class", "Precision", "Recall", "AP"]);
        for class in &metrics.per_class {
            table.add_row(vec![
                class.class_name.clone(),
                format!("{:.3}", class.precision),
                format!("{:.3}", class.recall),
                fmt(class.average_precision),
            ]);
        }
        println!("{}", table);
    }
    Ok(())
}

async fn images(ctx: &Context, version_id: &str, request: PageRequest) -> Result<()> {
    let page = load(ctx.hooks.validation_images(version_id, request)).await?;
    if ctx.emit_json(&*page)? {
        return Ok(());
    }

    let mut table = table(vec!["ID", "Image", "Predictions", "Ground truth"]);
    for image in &page.items {
        table.add_row(vec![
            image.id.clone(),
            image.image_url.clone(),
            image.predictions.len().to_string(),
            image.ground_truth.len().to_string(),
        ]);
    }
    println!("{}", table);

    let pages = page.total.div_ceil(u64::from(page.page_size.max(1)));
    println!("Showing {} of {} images (page {}/{})", page.items.len(), page.total, page.page, pages);
    Ok(())
}
