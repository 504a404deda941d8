use crate::adapter::AdapterError;
use crate::error::ConfigError;
use crate::materialise::MaterialisationError;
use crate::supplier::SupplierError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pipeline configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Supplier(#[from] SupplierError),

    #[error(transparent)]
    Materialisation(#[from] MaterialisationError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
