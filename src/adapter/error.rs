use crate::jsonld::JsonLdError;
use thiserror::Error;

/// Errors raised while adapting content into graphs.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Unsupported MIME type was provided: {provided}. Supported MIME type is: {supported}")]
    UnsupportedMimeType { provided: String, supported: String },

    #[error("Could not parse string to JSON. String with value:\n{content}\nCause: {cause}")]
    ParseToJson { content: String, cause: String },

    #[error("Could not deserialize string to JSON. String with value:\n{content}\nCause: {cause}")]
    DeserializationFromJson { content: String, cause: String },

    #[error("Could not convert document to RDF: {0}")]
    JsonLd(#[from] JsonLdError),
}

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Short description of a JSON value's kind, for error causes.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
