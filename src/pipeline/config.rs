//! YAML pipeline descriptions

use super::error::{PipelineError, PipelineResult};
use crate::materialise::MaterialiserConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Which adapter turns input payloads into graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AdapterConfig {
    Json {
        #[serde(default)]
        core_context: String,
        #[serde(default)]
        local_context: Option<String>,
    },
    NgsiV2 {
        #[serde(default)]
        data_identifier: String,
        #[serde(default)]
        core_context: String,
        #[serde(default)]
        local_context: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestStateConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,
    pub version_of_path: String,
    pub timestamp_path: String,
}

fn enabled() -> bool {
    true
}

/// Decorators are applied innermost first: exactly-once, latest-state, throttle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DecoratorsConfig {
    #[serde(default)]
    pub exactly_once: bool,
    #[serde(default)]
    pub latest_state: Option<LatestStateConfig>,
    #[serde(default)]
    pub members_per_second: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub adapter: AdapterConfig,
    /// MIME type assumed for inputs that do not declare one.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Context documents served without touching the filesystem, keyed by
    /// the reference used to declare them.
    #[serde(default)]
    pub contexts: BTreeMap<String, Value>,
    #[serde(default)]
    pub decorators: DecoratorsConfig,
    pub materialiser: MaterialiserConfig,
}

impl PipelineConfig {
    pub fn from_yaml(text: &str) -> PipelineResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }
}
