//! `labelhub config` commands

use crate::config::Config;
use crate::error::Result;
use colored::Colorize;

/// Show the effective configuration, token redacted
pub fn show(config: &Config) -> Result<()> {
    println!("{}", "LabelHub Configuration:".cyan().bold());
    println!();
    println!("{:<28} {}", "api_url:", config.base_url());
    println!(
        "{:<28} {}",
        "token_store:",
        config
            .token_store_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("{:<28} {}", "token_key:", config.token_key);
    println!("{:<28} {}", "token (LABELHUB_TOKEN):", if config.token.is_some() { "set" } else { "unset" });
    println!("{:<28} {}s", "stale_time_secs:", config.stale_time_secs);
    println!("{:<28} {}s", "gc_time_secs:", config.gc_time_secs);
    println!("{:<28} {}ms", "training_poll_interval_ms:", config.training_poll_interval_ms);
    println!(
        "{:<28} {}",
        "request_timeout_secs:",
        config
            .request_timeout_secs
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "none".to_string())
    );
    println!();
    println!("{}", "Environment Variables:".cyan());
    println!("  LABELHUB_API_URL               - API origin");
    println!("  LABELHUB_TOKEN                 - Bearer token, overrides the token store");
    println!("  LABELHUB_TOKEN_STORE           - Token store file");
    println!("  LABELHUB_STALE_TIME_SECS       - Staleness window");
    println!("  LABELHUB_REQUEST_TIMEOUT_SECS  - Per-request timeout");
    println!("  LABELHUB_CONFIG                - Config file location");

    Ok(())
}

/// Print where the config file is read from
pub fn path() -> Result<()> {
    match Config::default_path() {
        Some(path) => {
            let note = if path.exists() { "" } else { " (not created)" };
            println!("{}{}", path.display(), note);
        },
        None => println!("No config directory on this platform"),
    }
    Ok(())
}
