//! `labelhub keys` commands

use super::{load, or_dash, success, table, Context};
use crate::api::types::CreateApiKeyRequest;
use crate::error::{ClientError, Result};
use crate::KeyCommand;
use colored::Colorize;

pub async fn run(ctx: &Context, command: &KeyCommand) -> Result<()> {
    match command {
        KeyCommand::List => list(ctx).await,
        KeyCommand::Create { name, scopes } => create(ctx, name, scopes).await,
        KeyCommand::Revoke { key_id } => {
            ctx.hooks.revoke_api_key().mutate(key_id.clone()).await?;
            success(format!("Revoked API key {}", key_id));
            Ok(())
        },
    }
}

async fn list(ctx: &Context) -> Result<()> {
    let keys = load(ctx.hooks.api_keys()).await?;
    if ctx.emit_json(&*keys)? {
        return Ok(());
    }

    let mut table = table(vec!["ID", "Name", "Prefix", "Scopes", "Status", "Last used"]);
    for key in keys.iter() {
        let status = if key.is_revoked() {
            "revoked".red().to_string()
        } else {
            "active".green().to_string()
        };
        table.add_row(vec![
            key.id.clone(),
            key.name.clone(),
            format!("{}…", key.prefix),
            key.scopes.join(", "),
            status,
            or_dash(key.last_used_at.map(|t| t.format("%Y-%m-%d").to_string())),
        ]);
    }
    println!("{}", table);
    Ok(())
}

async fn create(ctx: &Context, name: &str, scopes: &[String]) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ClientError::invalid_argument("--name must not be empty"));
    }

    let request = CreateApiKeyRequest {
        name: name.to_string(),
        scopes: scopes.to_vec(),
    };
    let created = ctx.hooks.create_api_key().mutate(request).await?;
    if ctx.emit_json(&created)? {
        return Ok(());
    }

    success(format!("Created API key {} ({})", created.api_key.name, created.api_key.id));
    println!();
    println!("  {}", created.secret.bold());
    println!();
    println!("{}", "This secret is shown only once. Store it now.".yellow());
    Ok(())
}
