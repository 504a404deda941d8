//! Minimal JSON-LD processing: context resolution and conversion to RDF
//!
//! Supports the subset of JSON-LD 1.1 that upstream linked-data payloads
//! rely on: remote and inline contexts, term definitions with type
//! coercion, `@vocab`/`@base`/`@language`, keyword aliases, nested node
//! objects, value objects, lists and top-level `@graph`.

mod context;
mod error;
mod loader;
mod to_rdf;

pub use context::{ActiveContext, ContainerMapping, TermDefinition, TypeMapping, MAX_CONTEXT_DEPTH};
pub use error::{JsonLdError, JsonLdResult};
pub use loader::{
    ChainContextLoader, ContextLoader, FileContextLoader, HttpContextLoader, StaticContextLoader,
};
pub use to_rdf::to_rdf;
