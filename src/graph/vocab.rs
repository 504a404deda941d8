//! Vocabulary IRIs used by the expansion and materialisation code

pub mod rdf {
    pub use oxrdf::vocab::rdf::*;
    use oxrdf::NamedNodeRef;

    /// Datatype of JSON literals.
    pub const JSON: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON");
}

pub use oxrdf::vocab::xsd;
