//! Replace-upsert of member graphs into a repository

use super::config::{DeletionScope, MaterialiserConfig};
use super::error::MaterialisationError;
use crate::error::ConfigError;
use crate::graph::{
    BlankNode, BlankNodeRef, Graph, GraphExt, NamedNode, Subject, SubjectRef, Term, TermRef, Triple,
};
use crate::repository::{
    GraphScope, IsolationLevel, RepositoryConnection, RepositoryManager, RepositoryResult,
    SqliteRepositoryManager,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Writes graphs into a repository, replacing the previous version of every
/// entity they describe.
///
/// An entity is a named subject of the incoming graph. Its previous version
/// is its stored statements plus, transitively, the statements of every blank
/// node they point to. Deletion and insertion happen in one transaction.
pub struct Materialiser {
    manager: Arc<dyn RepositoryManager>,
    repository_id: String,
    named_graph: Option<NamedNode>,
    deletion_scope: DeletionScope,
}

impl Materialiser {
    pub fn new(
        manager: Arc<dyn RepositoryManager>,
        config: &MaterialiserConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            named_graph: config.target_graph()?,
            manager,
            repository_id: config.repository_id.clone(),
            deletion_scope: config.deletion_scope,
        })
    }

    /// Open the SQLite endpoint named by the config, or a private in-memory
    /// store when it names none.
    pub fn open(config: &MaterialiserConfig) -> Result<Self, MaterialisationError> {
        let manager = match &config.endpoint {
            Some(endpoint) => {
                SqliteRepositoryManager::open(endpoint).map_err(MaterialisationError::Open)?
            }
            None => SqliteRepositoryManager::in_memory(),
        };
        Ok(Self::new(Arc::new(manager), config)?)
    }

    pub fn repository_id(&self) -> &str {
        &self.repository_id
    }

    pub fn named_graph(&self) -> Option<&NamedNode> {
        self.named_graph.as_ref()
    }

    pub fn process(&self, graph: &Graph) -> Result<(), MaterialisationError> {
        self.upsert(graph).map_err(|e| {
            error!(repository = %self.repository_id, error = %e, "Failed to materialise");
            MaterialisationError::Failed(e)
        })
    }

    fn upsert(&self, graph: &Graph) -> RepositoryResult<()> {
        let repository = self.manager.repository(&self.repository_id)?;
        let mut connection = repository.connection()?;
        connection.set_isolation_level(IsolationLevel::None)?;
        connection.begin()?;

        let update = relabel_blank_nodes(graph);
        let entities: Vec<Subject> = update
            .named_subjects()
            .into_iter()
            .map(Subject::from)
            .collect();
        let entity_count = entities.len();
        let removed = self.delete_entities(connection.as_mut(), entities)?;

        connection.add(&update, self.named_graph.as_ref())?;
        connection.commit()?;
        debug!(
            repository = %self.repository_id,
            entities = entity_count,
            removed,
            added = update.len(),
            "materialised graph"
        );

        if let Err(e) = connection.close() {
            warn!(error = %e, "closing repository connection failed");
        }
        Ok(())
    }

    fn deletion_graphs(&self) -> GraphScope {
        match (self.deletion_scope, &self.named_graph) {
            (DeletionScope::AllGraphs, _) => GraphScope::All,
            (DeletionScope::TargetGraph, Some(graph)) => GraphScope::Named(graph.clone()),
            (DeletionScope::TargetGraph, None) => GraphScope::Default,
        }
    }

    /// Remove each entity and every blank node reachable from it.
    fn delete_entities(
        &self,
        connection: &mut dyn RepositoryConnection,
        entities: Vec<Subject>,
    ) -> RepositoryResult<usize> {
        let scope = self.deletion_graphs();
        let mut stack = entities;
        let mut visited = HashSet::new();
        let mut removed = 0;

        while let Some(subject) = stack.pop() {
            if !visited.insert(subject.clone()) {
                continue;
            }
            for quad in connection.get_statements(Some(&subject), None, None, &scope)? {
                if let Term::BlankNode(node) = quad.object {
                    stack.push(Subject::BlankNode(node));
                }
            }
            removed += connection.remove_statements(Some(&subject), None, None, &scope)?;
        }
        Ok(removed)
    }
}

/// Give every blank node a store-unique label.
fn relabel_blank_nodes(graph: &Graph) -> Graph {
    let mut labels: HashMap<BlankNodeRef<'_>, BlankNode> = HashMap::new();
    let mut relabelled = Graph::new();
    for triple in graph {
        let subject = match triple.subject {
            SubjectRef::BlankNode(node) => Subject::BlankNode(labels.entry(node).or_default().clone()),
            named => named.into_owned(),
        };
        let object = match triple.object {
            TermRef::BlankNode(node) => Term::BlankNode(labels.entry(node).or_default().clone()),
            other => other.into_owned(),
        };
        relabelled.insert(&Triple::new(subject, triple.predicate, object));
    }
    relabelled
}
