//! `labelhub annotations` commands

use super::{load, or_dash, success, table, Context};
use crate::error::Result;
use crate::AnnotationCommand;

pub async fn run(ctx: &Context, command: &AnnotationCommand) -> Result<()> {
    match command {
        AnnotationCommand::List { job_id, image_id } => list(ctx, job_id, image_id).await,
        AnnotationCommand::Delete {
            job_id,
            image_id,
            annotation_id,
        } => {
            ctx.hooks
                .delete_annotation(job_id, image_id)
                .mutate(annotation_id.clone())
                .await?;
            success(format!("Deleted annotation {}", annotation_id));
            Ok(())
        },
    }
}

async fn list(ctx: &Context, job_id: &str, image_id: &str) -> Result<()> {
    let annotations = load(ctx.hooks.annotations(job_id, image_id)).await?;
    if ctx.emit_json(&*annotations)? {
        return Ok(());
    }

    let mut table = table(vec!["ID", "Class", "Box (x, y, w, h)", "Confidence", "Reviewed"]);
    for annotation in annotations.iter().filter(|a| a.is_active) {
        table.add_row(vec![
            annotation.id.clone(),
            annotation.class_name.clone(),
            format!(
                "{:.0}, {:.0}, {:.0}, {:.0}",
                annotation.x, annotation.y, annotation.width, annotation.height
            ),
            or_dash(annotation.confidence.map(|c| format!("{:.2}", c))),
            if annotation.reviewed { "yes" } else { "no" }.to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}
