//! Adapter layer
//!
//! Adapters turn a raw payload plus its declared MIME type into zero or
//! more RDF graphs, injecting the configured JSON-LD contexts on the way.

mod content;
mod document;
mod error;
mod json;
mod ngsi;
mod traits;

pub use content::{mime_matches, Content};
pub use document::{ContextDeclarations, LinkedDataDocument};
pub use error::{AdapterError, AdapterResult};
pub use json::{JsonToLdAdapter, JSON_MIME_TYPE};
pub use ngsi::NgsiV2ToLdAdapter;
pub use traits::{Adapter, Graphs};
