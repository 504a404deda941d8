use crate::adapter::AdapterError;
use thiserror::Error;

/// Errors raised while pulling members from a supplier.
#[derive(Debug, Error)]
pub enum SupplierError {
    #[error("adapter failed: {0}")]
    Adapter(#[from] AdapterError),
}

pub type SupplierResult<T> = Result<T, SupplierError>;
