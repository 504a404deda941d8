//! Graph helpers on top of [`oxrdf::Graph`]

use oxrdf::dataset::CanonicalizationAlgorithm;
use oxrdf::{Graph, NamedNode, Subject, SubjectRef};
use std::collections::HashSet;

/// Queries on a graph that `oxrdf` does not provide directly.
pub trait GraphExt {
    /// Distinct subjects, named and blank, in iteration order.
    fn subjects(&self) -> Vec<Subject>;

    /// Distinct named-node subjects, sorted by IRI: the entities of this graph.
    fn named_subjects(&self) -> Vec<NamedNode>;

    /// True if a bijection between blank nodes maps this graph onto `other`.
    ///
    /// Blank node labels are only meaningful inside one graph, so compare
    /// with this rather than `==` when blank nodes are involved.
    fn is_isomorphic(&self, other: &Graph) -> bool;
}

impl GraphExt for Graph {
    fn subjects(&self) -> Vec<Subject> {
        let mut seen = HashSet::new();
        self.iter()
            .filter(|t| seen.insert(t.subject))
            .map(|t| t.subject.into_owned())
            .collect()
    }

    fn named_subjects(&self) -> Vec<NamedNode> {
        let mut named: Vec<NamedNode> = self
            .iter()
            .filter_map(|t| match t.subject {
                SubjectRef::NamedNode(node) => Some(node.into_owned()),
                SubjectRef::BlankNode(_) => None,
            })
            .collect();
        named.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        named.dedup();
        named
    }

    fn is_isomorphic(&self, other: &Graph) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut left = self.clone();
        let mut right = other.clone();
        left.canonicalize(CanonicalizationAlgorithm::Unstable);
        right.canonicalize(CanonicalizationAlgorithm::Unstable);
        left == right
    }
}

pub fn is_named(subject: &Subject) -> bool {
    matches!(subject, Subject::NamedNode(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{BlankNode, Literal, Triple};

    fn iri(s: &str) -> NamedNode {
        NamedNode::new_unchecked(s)
    }

    fn blank(s: &str) -> BlankNode {
        BlankNode::new_unchecked(s)
    }

    fn graph_of(triples: Vec<Triple>) -> Graph {
        let mut graph = Graph::new();
        for triple in &triples {
            graph.insert(triple);
        }
        graph
    }

    #[test]
    fn duplicates_collapse() {
        let mut graph = Graph::new();
        let t = Triple::new(iri("urn:a"), iri("urn:p"), Literal::new_simple_literal("x"));
        assert!(graph.insert(&t));
        assert!(!graph.insert(&t));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn named_subjects_exclude_blank_nodes() {
        let graph = graph_of(vec![
            Triple::new(iri("urn:b"), iri("urn:p"), blank("b1")),
            Triple::new(iri("urn:a"), iri("urn:p"), blank("b1")),
            Triple::new(iri("urn:a"), iri("urn:q"), Literal::new_simple_literal("y")),
            Triple::new(blank("b1"), iri("urn:q"), Literal::new_simple_literal("x")),
        ]);
        let entities: Vec<String> = graph
            .named_subjects()
            .into_iter()
            .map(NamedNode::into_string)
            .collect();
        assert_eq!(entities, ["urn:a", "urn:b"]);
        assert_eq!(graph.subjects().len(), 3);
        assert_eq!(graph.subjects().iter().filter(|s| is_named(s)).count(), 2);
    }

    #[test]
    fn isomorphic_ignores_blank_labels() {
        let a = graph_of(vec![
            Triple::new(iri("urn:a"), iri("urn:p"), blank("x")),
            Triple::new(blank("x"), iri("urn:q"), blank("y")),
            Triple::new(blank("y"), iri("urn:r"), Literal::new_simple_literal("deep")),
        ]);
        let b = graph_of(vec![
            Triple::new(iri("urn:a"), iri("urn:p"), blank("n1")),
            Triple::new(blank("n1"), iri("urn:q"), blank("n2")),
            Triple::new(blank("n2"), iri("urn:r"), Literal::new_simple_literal("deep")),
        ]);
        assert!(a.is_isomorphic(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn isomorphism_detects_structural_difference() {
        let a = graph_of(vec![
            Triple::new(blank("x"), iri("urn:p"), Literal::new_simple_literal("1")),
            Triple::new(blank("y"), iri("urn:p"), Literal::new_simple_literal("2")),
        ]);
        let b = graph_of(vec![
            Triple::new(blank("x"), iri("urn:p"), Literal::new_simple_literal("1")),
            Triple::new(blank("x"), iri("urn:p"), Literal::new_simple_literal("2")),
        ]);
        assert!(!a.is_isomorphic(&b));
    }

    #[test]
    fn isomorphism_handles_blank_cycles() {
        let a = graph_of(vec![
            Triple::new(blank("x"), iri("urn:next"), blank("y")),
            Triple::new(blank("y"), iri("urn:next"), blank("x")),
        ]);
        let b = graph_of(vec![
            Triple::new(blank("m"), iri("urn:next"), blank("n")),
            Triple::new(blank("n"), iri("urn:next"), blank("m")),
        ]);
        assert!(a.is_isomorphic(&b));
    }

    #[test]
    fn iris_are_validated() {
        assert!(NamedNode::new("http://ex.org/a{b|c}").is_err());
        assert!(NamedNode::new("http://ex.org/a").is_ok());
    }

    #[test]
    fn display_is_ntriples() {
        let graph = graph_of(vec![Triple::new(
            iri("urn:a"),
            iri("urn:p"),
            Literal::new_simple_literal("a\"b"),
        )]);
        assert_eq!(graph.to_string(), "<urn:a> <urn:p> \"a\\\"b\" .\n");
    }
}
