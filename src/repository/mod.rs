//! Transactional quad store abstraction and its SQLite implementation

mod sqlite;
mod traits;

pub use sqlite::{SqliteConnection, SqliteRepository, SqliteRepositoryManager};
pub use traits::{
    GraphScope, IsolationLevel, Repository, RepositoryConnection, RepositoryError,
    RepositoryManager, RepositoryResult,
};
