use thiserror::Error;

/// Failures while resolving contexts or expanding a document to RDF.
#[derive(Error, Debug)]
pub enum JsonLdError {
    #[error("Could not load context '{reference}': {message}")]
    LoadingContextFailed { reference: String, message: String },

    #[error("Invalid context: {message}")]
    InvalidContext { message: String },

    #[error("Invalid IRI mapping for term '{term}'")]
    InvalidIriMapping { term: String },

    #[error("Cyclic IRI mapping for term '{term}'")]
    CyclicIriMapping { term: String },

    #[error("Context inclusion exceeded depth {0}")]
    ContextOverflow(usize),

    #[error("Invalid value object: {0}")]
    InvalidValueObject(String),

    #[error("Document must be a JSON object")]
    NotAnObject,
}

pub type JsonLdResult<T> = std::result::Result<T, JsonLdError>;
