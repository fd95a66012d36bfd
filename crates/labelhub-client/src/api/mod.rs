//! API client module
//!
//! Fetch functions, URL builders and DTOs for the LabelHub server.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::*;
