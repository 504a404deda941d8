//! RDF data model: the `oxrdf` terms, triples and graphs plus the helpers
//! expansion and materialisation need on top of them

mod iri;
mod model;
pub mod vocab;

pub use iri::{is_absolute_iri, resolve_iri};
pub use model::{is_named, GraphExt};
pub use oxiri::IriParseError;
pub use oxrdf::dataset::CanonicalizationAlgorithm;
pub use oxrdf::{
    BlankNode, BlankNodeRef, Graph, GraphName, Literal, LiteralRef, NamedNode, NamedNodeRef,
    Quad, Subject, SubjectRef, Term, TermRef, Triple, TripleRef,
};
