//! CLI command implementations
//!
//! One module per resource family. Every command reads through [`Hooks`], so
//! the binary exercises the same cached queries and mutations as library
//! consumers.

pub mod annotations;
pub mod billing;
pub mod config;
pub mod jobs;
pub mod keys;
pub mod models;
pub mod projects;
pub mod sessions;

use crate::api::ApiError;
use crate::cache::Query;
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::hooks::Hooks;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use serde::Serialize;
use std::sync::Arc;

/// Shared state for one CLI invocation
pub struct Context {
    pub hooks: Hooks,
    /// Print JSON instead of tables
    pub json: bool,
}

impl Context {
    pub fn new(config: &Config, json: bool) -> Result<Self> {
        Ok(Self {
            hooks: Hooks::from_config(config)?,
            json,
        })
    }

    /// Print `value` as pretty JSON when `--json` was given; returns whether it did
    pub(crate) fn emit_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<bool> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(self.json)
    }
}

/// Fetch a query's data, turning a disabled query into an argument error
pub(crate) async fn load<T: Send + Sync + 'static>(query: Query<T>) -> Result<Arc<T>> {
    if !query.is_enabled() {
        return Err(ClientError::invalid_argument(format!(
            "missing identifier for {}",
            query.key().resource()
        )));
    }

    query
        .fetch()
        .await
        .into_result()?
        .ok_or_else(|| ClientError::invalid_argument(format!("no data for {}", query.key())))
}

pub(crate) fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);
    table
}

pub(crate) fn success(message: impl std::fmt::Display) {
    println!("{} {}", "✓".green().bold(), message);
}

pub(crate) fn or_dash(value: Option<impl ToString>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Check server health
pub async fn health(ctx: &Context) -> Result<()> {
    let client = ctx.hooks.client();
    if client.health_check().await {
        success(format!("{} is healthy", client.base_url()));
        Ok(())
    } else {
        Err(ApiError::Network(format!("server at {} is not reachable", client.base_url())).into())
    }
}
