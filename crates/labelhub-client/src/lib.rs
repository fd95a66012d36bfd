//! LabelHub client library
//!
//! Client-side data layer for the LabelHub annotation and training platform.
//!
//! # Overview
//!
//! - **API client** ([`api`]): one fetch function per server operation, with
//!   bearer authentication and server error messages surfaced verbatim
//! - **Query cache** ([`cache`]): keyed, de-duplicated reads with a staleness
//!   window, invalidation, polling observers and mutations with cache effects
//! - **Hooks** ([`hooks`]): the cached query or mutation for each resource
//! - **CLI** ([`commands`]): the `labelhub` binary built on the hooks
//!
//! ```no_run
//! use labelhub_client::{Config, Hooks};
//!
//! # async fn demo() -> labelhub_client::Result<()> {
//! let hooks = Hooks::from_config(&Config::load()?)?;
//! let jobs = hooks.project_jobs("proj-1").fetch().await.into_result()?;
//!
//! hooks.delete_job("proj-1").mutate("job-9".to_string()).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod hooks;

pub use api::{ApiClient, ApiError};
pub use cache::{CacheEffects, Mutation, Query, QueryCache, QueryKey, QueryObserver, QueryState};
pub use config::Config;
pub use error::{ClientError, Result};
pub use hooks::Hooks;

use clap::{Parser, Subcommand};

/// LabelHub - annotation and training platform client
#[derive(Parser, Debug)]
#[command(name = "labelhub")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// API origin; overrides the config file
    #[arg(long, env = "LABELHUB_API_URL", global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Projects and their jobs
    Projects {
        #[command(subcommand)]
        command: ProjectCommand,
    },

    /// Annotation jobs
    Jobs {
        #[command(subcommand)]
        command: JobCommand,
    },

    /// Image annotations within a job
    Annotations {
        #[command(subcommand)]
        command: AnnotationCommand,
    },

    /// Models, versions and validation results
    Models {
        #[command(subcommand)]
        command: ModelCommand,
    },

    /// Training sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// API keys
    Keys {
        #[command(subcommand)]
        command: KeyCommand,
    },

    /// Compute profiles, rate cards and usage reports
    Billing {
        #[command(subcommand)]
        command: BillingCommand,
    },

    /// Check that the server is reachable
    Health,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// List projects
    List,

    /// Show one project
    Get { project_id: String },

    /// List a project's jobs
    Jobs { project_id: String },
}

#[derive(Subcommand, Debug)]
pub enum JobCommand {
    /// Show one job
    Get { job_id: String },

    /// Change a job's name, status or assignee
    Update {
        project_id: String,
        job_id: String,

        #[arg(long)]
        name: Option<String>,

        /// pending, in_progress, review or completed
        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        assignee: Option<String>,
    },

    /// Delete a job
    Delete { project_id: String, job_id: String },
}

#[derive(Subcommand, Debug)]
pub enum AnnotationCommand {
    /// List annotations on one image
    List { job_id: String, image_id: String },

    /// Delete an annotation
    Delete {
        job_id: String,
        image_id: String,
        annotation_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ModelCommand {
    /// List models
    List {
        /// Only models of this project
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Show one model
    Get { model_id: String },

    /// List a model's versions
    Versions { model_id: String },

    /// Validation metrics of a model version
    Metrics { version_id: String },

    /// Validation images of a model version
    Images {
        version_id: String,

        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "50")]
        page_size: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// List a project's training sessions
    List { project_id: String },

    /// Show one session
    Get { session_id: String },

    /// Follow a session until it completes or fails
    Watch { session_id: String },

    /// Start a training session
    Start {
        project_id: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        base_model: String,

        #[arg(long, default_value = "50")]
        epochs: u32,

        #[arg(long)]
        batch_size: Option<u32>,

        #[arg(long)]
        learning_rate: Option<f64>,

        #[arg(long)]
        image_size: Option<u32>,

        #[arg(long)]
        compute_profile: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyCommand {
    /// List API keys
    List,

    /// Create a key; the secret is printed once
    Create {
        #[arg(long)]
        name: String,

        /// Repeat for several scopes
        #[arg(long = "scope")]
        scopes: Vec<String>,
    },

    /// Revoke a key
    Revoke { key_id: String },
}

#[derive(Subcommand, Debug)]
pub enum BillingCommand {
    /// List compute profiles
    Profiles,

    /// List billing rate cards
    RateCards,

    /// Usage report for a date range
    Report {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: String,

        /// Last day, YYYY-MM-DD
        #[arg(long)]
        to: String,

        #[arg(short, long)]
        project: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Print the config file location
    Path,
}
