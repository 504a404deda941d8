//! Pipeline wiring and configuration
//!
//! Contents flow through an adapter, a decorated member supplier and the
//! materialiser, in that order.

mod config;
mod error;
mod runner;

pub use config::{AdapterConfig, DecoratorsConfig, LatestStateConfig, PipelineConfig};
pub use error::{PipelineError, PipelineResult};
pub use runner::{Pipeline, PipelineReport};
