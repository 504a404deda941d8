//! Repository trait definitions

use crate::graph::{Graph, NamedNode, Quad, Subject, Term};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during repository operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid repository identifier: {0:?}")]
    InvalidRepositoryId(String),

    #[error("A transaction is already active")]
    TransactionActive,

    #[error("No active transaction")]
    NoActiveTransaction,

    #[error("Connection is closed")]
    Closed,

    #[error("Corrupt statement row: {0}")]
    CorruptRow(String),
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Transaction isolation, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum IsolationLevel {
    /// Reads may observe other transactions' uncommitted writes.
    None,
    #[default]
    ReadCommitted,
    Serializable,
}

/// Which graphs a statement pattern matches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GraphScope {
    #[default]
    All,
    Default,
    Named(NamedNode),
}

/// A session against one repository.
///
/// Connections are not shared: each caller obtains its own from
/// [`Repository::connection`]. Dropping a connection with an open
/// transaction rolls the transaction back.
pub trait RepositoryConnection: Send {
    /// Only allowed while no transaction is active.
    fn set_isolation_level(&mut self, level: IsolationLevel) -> RepositoryResult<()>;

    fn isolation_level(&self) -> IsolationLevel;

    fn begin(&mut self) -> RepositoryResult<()>;

    fn is_active(&self) -> bool;

    /// Add every triple to `context`, or to the default graph when `None`.
    fn add(&mut self, graph: &Graph, context: Option<&NamedNode>) -> RepositoryResult<()>;

    /// Statements matching the pattern; `None` positions are wildcards.
    fn get_statements(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
        scope: &GraphScope,
    ) -> RepositoryResult<Vec<Quad>>;

    /// Remove matching statements and return how many were removed.
    fn remove_statements(
        &mut self,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
        scope: &GraphScope,
    ) -> RepositoryResult<usize>;

    fn commit(&mut self) -> RepositoryResult<()>;

    fn rollback(&mut self) -> RepositoryResult<()>;

    /// Release the connection, rolling back any open transaction.
    fn close(self: Box<Self>) -> RepositoryResult<()>;
}

/// A named triple store.
pub trait Repository: Send + Sync {
    fn id(&self) -> &str;

    /// A fresh connection; never one handed out before.
    fn connection(&self) -> RepositoryResult<Box<dyn RepositoryConnection>>;
}

/// Resolves repository identifiers at one endpoint.
pub trait RepositoryManager: Send + Sync {
    fn repository(&self, id: &str) -> RepositoryResult<Arc<dyn Repository>>;
}
