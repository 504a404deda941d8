//! Materialiser configuration

use crate::error::ConfigError;
use crate::graph::NamedNode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which graphs the delete phase of an update touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletionScope {
    /// Remove the entity's closure wherever it is stored.
    #[default]
    AllGraphs,
    /// Remove only from the graph the update is written to.
    TargetGraph,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialiserConfig {
    /// Directory holding the repositories; `None` keeps them in memory.
    #[serde(default)]
    pub endpoint: Option<PathBuf>,
    pub repository_id: String,
    /// Target graph; absent or empty means the default graph.
    #[serde(default)]
    pub named_graph: Option<String>,
    #[serde(default)]
    pub deletion_scope: DeletionScope,
}

impl MaterialiserConfig {
    pub fn new(repository_id: impl Into<String>) -> Self {
        Self {
            endpoint: None,
            repository_id: repository_id.into(),
            named_graph: None,
            deletion_scope: DeletionScope::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<PathBuf>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_named_graph(mut self, named_graph: impl Into<String>) -> Self {
        self.named_graph = Some(named_graph.into());
        self
    }

    pub fn with_deletion_scope(mut self, deletion_scope: DeletionScope) -> Self {
        self.deletion_scope = deletion_scope;
        self
    }

    /// Check required fields and resolve the target graph.
    pub fn target_graph(&self) -> Result<Option<NamedNode>, ConfigError> {
        if self.repository_id.trim().is_empty() {
            return Err(ConfigError::MissingRepositoryId);
        }
        match self.named_graph.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(iri) => NamedNode::new(iri)
                .map(Some)
                .map_err(|_| ConfigError::InvalidIri(iri.to_string())),
        }
    }
}
