//! Deployed resource names for the operator CLI.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_RESOURCES_FILE: &str = "textractor-config.json";

/// Resource names written by the deployment. Unknown fields are ignored so
/// a full infrastructure output file can be used as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default)]
    pub document_bucket: String,
    #[serde(default)]
    pub output_bucket: String,
    #[serde(default, rename = "jobs_table_name")]
    pub jobs_table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

pub fn load_resources<P: AsRef<Path>>(path: P) -> Result<Resources, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_resources_from_str(&content)
}

pub fn load_resources_from_str(content: &str) -> Result<Resources, ConfigError> {
    let resources: Resources = serde_json::from_str(content)?;
    validate_resources(&resources)?;
    Ok(resources)
}

fn validate_resources(resources: &Resources) -> Result<(), ConfigError> {
    let missing: Vec<&str> = [
        ("document_bucket", &resources.document_bucket),
        ("output_bucket", &resources.output_bucket),
        ("jobs_table_name", &resources.jobs_table),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation {
            message: format!("missing required fields: {}", missing.join(", ")),
        })
    }
}
