//! IRI validation and reference resolution

use oxiri::{Iri, IriParseError};

/// True for a syntactically valid absolute IRI. Blank node labels (`_:x`)
/// and relative references are not.
pub fn is_absolute_iri(candidate: &str) -> bool {
    Iri::parse(candidate).is_ok()
}

/// Resolve `reference` against `base` following RFC 3986 section 5.2,
/// dot-segment removal included.
pub fn resolve_iri(base: &str, reference: &str) -> Result<String, IriParseError> {
    Ok(Iri::parse(base)?.resolve(reference)?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_iri_detection() {
        assert!(is_absolute_iri("http://example.org/a"));
        assert!(is_absolute_iri("urn:x:1"));
        assert!(!is_absolute_iri("_:b0"));
        assert!(!is_absolute_iri("name"));
        assert!(!is_absolute_iri("1abc:def"));
        assert!(!is_absolute_iri("http://example.org/a b"));
        assert!(!is_absolute_iri("http://ex.org/a{b|c}"));
    }

    #[test]
    fn dot_segments_are_removed() {
        let base = "http://example.org/a/b/";
        assert_eq!(resolve_iri(base, "../c").unwrap(), "http://example.org/a/c");
        assert_eq!(resolve_iri(base, "./d/../e").unwrap(), "http://example.org/a/b/e");
        assert_eq!(resolve_iri(base, "../../../f").unwrap(), "http://example.org/f");
    }

    #[test]
    fn invalid_base_is_an_error() {
        assert!(resolve_iri("not a base", "x").is_err());
    }
}
