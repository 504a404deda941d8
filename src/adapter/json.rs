//! Plain JSON objects to RDF

use super::content::Content;
use super::document::{ContextDeclarations, LinkedDataDocument};
use super::error::{json_kind, AdapterError, AdapterResult};
use super::traits::{check_mime_type, Adapter, Graphs};
use crate::error::ConfigError;
use crate::jsonld::ContextLoader;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub const JSON_MIME_TYPE: &str = "application/json";

/// Treats the payload as a single JSON object, injects the configured
/// contexts and converts it with JSON-LD semantics.
pub struct JsonToLdAdapter {
    declarations: ContextDeclarations,
    loader: Arc<dyn ContextLoader>,
}

impl JsonToLdAdapter {
    pub fn new(
        core_context: impl Into<String>,
        loader: Arc<dyn ContextLoader>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            declarations: ContextDeclarations::new(core_context)?,
            loader,
        })
    }

    pub fn with_local_context(mut self, local_context: impl Into<String>) -> Self {
        self.declarations = self.declarations.with_local(local_context);
        self
    }

    pub fn declarations(&self) -> &ContextDeclarations {
        &self.declarations
    }

    fn parse(&self, payload: &str) -> AdapterResult<LinkedDataDocument> {
        let parse_error = |cause: String| AdapterError::ParseToJson {
            content: payload.to_string(),
            cause,
        };
        let value: Value = serde_json::from_str(payload).map_err(|e| parse_error(e.to_string()))?;
        match value {
            Value::Object(fields) => Ok(LinkedDataDocument::new(fields)),
            other => Err(parse_error(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

impl Adapter for JsonToLdAdapter {
    fn supported_mime_type(&self) -> &str {
        JSON_MIME_TYPE
    }

    fn apply(&self, content: &Content) -> AdapterResult<Graphs> {
        check_mime_type(self, content)?;
        let mut document = self.parse(content.payload())?;
        self.declarations.inject(&mut document);
        debug!(
            contexts = document.context_declarations().len(),
            "adapting JSON document"
        );

        let loader = Arc::clone(&self.loader);
        Ok(Box::new(std::iter::once_with(move || {
            document.to_graph(loader.as_ref()).map_err(AdapterError::from)
        })))
    }
}
