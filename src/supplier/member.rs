//! Members: the unit a supplier hands out

use crate::graph::{Graph, GraphExt, NamedNode};
use uuid::Uuid;

/// One record of the event stream: an identifier and its RDF graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    id: String,
    graph: Graph,
}

impl Member {
    pub fn new(id: impl Into<String>, graph: Graph) -> Self {
        Self {
            id: id.into(),
            graph,
        }
    }

    /// Identify a graph by its lexicographically smallest named subject.
    ///
    /// Graphs without named subjects get a random `urn:uuid:` identifier.
    pub fn from_graph(graph: Graph) -> Self {
        let id = graph
            .named_subjects()
            .into_iter()
            .next()
            .map(NamedNode::into_string)
            .unwrap_or_else(|| Uuid::new_v4().urn().to_string());
        Self { id, graph }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }
}
