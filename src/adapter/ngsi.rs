//! NGSI-v2 entity batches to RDF
//!
//! NGSI-v2 notifications nest their entities under a configurable key
//! (usually `data`). The nested value is either one entity or an array of
//! them; every entity becomes its own graph.

use super::content::Content;
use super::document::{ContextDeclarations, LinkedDataDocument};
use super::error::{json_kind, AdapterError, AdapterResult};
use super::json::JSON_MIME_TYPE;
use super::traits::{check_mime_type, Adapter, Graphs};
use crate::error::ConfigError;
use crate::jsonld::ContextLoader;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub struct NgsiV2ToLdAdapter {
    data_identifier: String,
    declarations: ContextDeclarations,
    loader: Arc<dyn ContextLoader>,
}

impl NgsiV2ToLdAdapter {
    pub fn new(
        data_identifier: impl Into<String>,
        core_context: impl Into<String>,
        loader: Arc<dyn ContextLoader>,
    ) -> Result<Self, ConfigError> {
        let data_identifier = data_identifier.into();
        if data_identifier.is_empty() {
            return Err(ConfigError::MissingDataIdentifier);
        }
        Ok(Self {
            data_identifier,
            declarations: ContextDeclarations::new(core_context)?,
            loader,
        })
    }

    pub fn with_local_context(mut self, local_context: impl Into<String>) -> Self {
        self.declarations = self.declarations.with_local(local_context);
        self
    }

    pub fn data_identifier(&self) -> &str {
        &self.data_identifier
    }

    /// Pull the entity value out of the notification, serialised back to text.
    fn extract(&self, payload: &str) -> AdapterResult<String> {
        let parse_error = |cause: String| AdapterError::ParseToJson {
            content: payload.to_string(),
            cause,
        };
        let outer: Value = serde_json::from_str(payload).map_err(|e| parse_error(e.to_string()))?;
        let mut fields = match outer {
            Value::Object(fields) => fields,
            other => {
                return Err(parse_error(format!(
                    "expected a JSON object, found {}",
                    json_kind(&other)
                )))
            }
        };
        let data = fields.remove(&self.data_identifier).unwrap_or(Value::Null);
        Ok(data.to_string())
    }

    /// A single document first; failing that, an array of documents.
    fn decode(data: &str) -> AdapterResult<Vec<LinkedDataDocument>> {
        if let Ok(document) = serde_json::from_str::<LinkedDataDocument>(data) {
            return Ok(vec![document]);
        }
        serde_json::from_str::<Vec<LinkedDataDocument>>(data).map_err(|e| {
            AdapterError::DeserializationFromJson {
                content: data.to_string(),
                cause: e.to_string(),
            }
        })
    }
}

impl Adapter for NgsiV2ToLdAdapter {
    fn supported_mime_type(&self) -> &str {
        JSON_MIME_TYPE
    }

    fn apply(&self, content: &Content) -> AdapterResult<Graphs> {
        check_mime_type(self, content)?;
        let data = self.extract(content.payload())?;
        let mut documents = Self::decode(&data)?;
        for document in &mut documents {
            self.declarations.inject(document);
        }
        debug!(
            data_identifier = %self.data_identifier,
            documents = documents.len(),
            "adapting NGSI-v2 entities"
        );

        let loader = Arc::clone(&self.loader);
        Ok(Box::new(documents.into_iter().map(move |document| {
            document.to_graph(loader.as_ref()).map_err(AdapterError::from)
        })))
    }
}
