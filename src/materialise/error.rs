use crate::error::ConfigError;
use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaterialisationError {
    /// The upsert did not commit; nothing it wrote is visible.
    #[error("Failed to materialise: {0}")]
    Failed(#[source] RepositoryError),

    #[error("Could not open repository endpoint: {0}")]
    Open(#[source] RepositoryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
