//! Linked-data documents and the context declarations injected into them

use crate::error::ConfigError;
use crate::graph::Graph;
use crate::jsonld::{to_rdf, ContextLoader, JsonLdResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A decoded JSON record plus the ordered context declarations used to
/// interpret it.
///
/// Declarations are appended in the order they are added and never
/// deduplicated or reordered: later declarations win on term conflicts.
/// An `@context` already present in the record is kept and precedes the
/// appended declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedDataDocument {
    #[serde(flatten)]
    fields: Map<String, Value>,
    #[serde(skip)]
    contexts: Vec<String>,
}

impl LinkedDataDocument {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            contexts: Vec::new(),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn context_declarations(&self) -> &[String] {
        &self.contexts
    }

    pub fn add_context_declaration(&mut self, reference: impl Into<String>) {
        self.contexts.push(reference.into());
    }

    /// The record as a JSON-LD document with all declarations under `@context`.
    pub fn to_json(&self) -> Value {
        let mut fields = self.fields.clone();
        let mut declarations = match fields.remove("@context") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
        };
        declarations.extend(self.contexts.iter().cloned().map(Value::String));
        if !declarations.is_empty() {
            fields.insert("@context".to_string(), Value::Array(declarations));
        }
        Value::Object(fields)
    }

    pub fn to_graph(&self, loader: &dyn ContextLoader) -> JsonLdResult<Graph> {
        to_rdf(&self.to_json(), loader)
    }
}

/// The core context every document receives, optionally followed by a
/// local context layered on top of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextDeclarations {
    core: String,
    local: Option<String>,
}

impl ContextDeclarations {
    pub fn new(core: impl Into<String>) -> Result<Self, ConfigError> {
        let core = core.into();
        if core.trim().is_empty() {
            return Err(ConfigError::MissingCoreContext);
        }
        Ok(Self { core, local: None })
    }

    /// Blank references leave the local context unset.
    pub fn with_local(mut self, local: impl Into<String>) -> Self {
        let local = local.into();
        self.local = (!local.trim().is_empty()).then_some(local);
        self
    }

    pub fn core(&self) -> &str {
        &self.core
    }

    pub fn local(&self) -> Option<&str> {
        self.local.as_deref()
    }

    pub fn inject(&self, document: &mut LinkedDataDocument) {
        document.add_context_declaration(self.core.as_str());
        if let Some(local) = &self.local {
            document.add_context_declaration(local.as_str());
        }
    }
}
