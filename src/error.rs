//! Construction-time configuration errors shared by all components

use thiserror::Error;

/// A component was constructed with missing or invalid configuration.
///
/// These are raised before any processing begins and indicate a
/// programming or deployment mistake rather than bad input data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Core context can't be null")]
    MissingCoreContext,

    #[error("Can't identify data with the data array key")]
    MissingDataIdentifier,

    #[error("Repository identifier can't be empty")]
    MissingRepositoryId,

    #[error("Not an absolute IRI: {0}")]
    InvalidIri(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
