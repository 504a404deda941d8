//! ldi: linked-data ingestion core
//!
//! Mirrors a Linked Data Event Stream into a transactional quad store.
//!
//! # Core Concepts
//!
//! - **Adapters** turn a payload plus its MIME type into RDF graphs, injecting
//!   the configured JSON-LD contexts
//! - **Suppliers** hand out members one at a time; **decorators** wrap them
//!   with deduplication, version filtering and rate control
//! - **Materialisation** replaces each entity's stored version, including the
//!   blank nodes it owns, in a single transaction
//!
//! # Example
//!
//! ```
//! use ldi::{Graph, Materialiser, MaterialiserConfig};
//!
//! let materialiser = Materialiser::open(&MaterialiserConfig::new("events")).unwrap();
//! materialiser.process(&Graph::new()).unwrap();
//! ```

pub mod adapter;
mod error;
pub mod graph;
pub mod jsonld;
pub mod materialise;
pub mod pipeline;
pub mod repository;
pub mod supplier;

pub use adapter::{
    Adapter, AdapterError, AdapterResult, Content, JsonToLdAdapter, LinkedDataDocument,
    NgsiV2ToLdAdapter,
};
pub use error::ConfigError;
pub use graph::{
    BlankNode, Graph, GraphExt, GraphName, Literal, NamedNode, Quad, Subject, Term, Triple,
};
pub use materialise::{DeletionScope, MaterialisationError, Materialiser, MaterialiserConfig};
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, PipelineReport};
pub use repository::{
    GraphScope, IsolationLevel, Repository, RepositoryConnection, RepositoryError,
    RepositoryManager, SqliteRepositoryManager,
};
pub use supplier::{Member, MemberSupplier, SupplierChain, SupplierDecorator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
