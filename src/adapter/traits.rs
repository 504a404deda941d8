//! Adapter trait: the contract adapters implement
//!
//! An adapter converts one piece of raw content into a stream of RDF graphs.

use super::content::{mime_matches, Content};
use super::error::{AdapterError, AdapterResult};
use crate::graph::Graph;

/// Lazily produced graphs. Each element is one JSON-LD document's RDF.
///
/// Errors that can only be detected while converting a particular
/// document surface on that element; everything else fails `apply` itself.
pub type Graphs = Box<dyn Iterator<Item = AdapterResult<Graph>> + Send>;

/// The contract adapters implement.
pub trait Adapter: Send + Sync {
    /// The single MIME type this adapter accepts (parameters ignored).
    fn supported_mime_type(&self) -> &str;

    /// Convert content into graphs.
    ///
    /// Fails with `UnsupportedMimeType` before reading the payload when the
    /// declared type does not match.
    fn apply(&self, content: &Content) -> AdapterResult<Graphs>;
}

/// Reject content whose MIME type the adapter does not accept.
pub(crate) fn check_mime_type(adapter: &dyn Adapter, content: &Content) -> AdapterResult<()> {
    let supported = adapter.supported_mime_type();
    if mime_matches(content.mime_type(), supported) {
        Ok(())
    } else {
        Err(AdapterError::UnsupportedMimeType {
            provided: content.mime_type().to_string(),
            supported: supported.to_string(),
        })
    }
}
