//! Cache keys
//!
//! A key is the resource name followed by its parameters, e.g.
//! `["project-jobs","proj-1"]`. Structured parameters are serialized to JSON so
//! equal parameter sets always produce equal keys.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(resource: impl Into<String>) -> Self {
        Self(vec![resource.into()])
    }

    /// Append a plain parameter
    pub fn with(mut self, part: impl Into<String>) -> Self {
        self.0.push(part.into());
        self
    }

    /// Append a structured parameter as its JSON serialization
    pub fn with_params<P: Serialize + ?Sized>(mut self, params: &P) -> Self {
        self.0.push(serde_json::to_string(params).unwrap_or_default());
        self
    }

    /// Resource name, the first part
    pub fn resource(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{:?}", part)?;
        }
        f.write_str("]")
    }
}

impl<const N: usize> From<[&str; N]> for QueryKey {
    fn from(parts: [&str; N]) -> Self {
        Self(parts.iter().map(|p| p.to_string()).collect())
    }
}
