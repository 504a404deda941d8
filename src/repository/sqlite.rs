//! SQLite-backed quad store
//!
//! One database per repository. File repositories live at
//! `<endpoint>/<id>.db` in WAL mode; in-memory repositories live in the
//! `memdb` VFS, kept alive by a keeper connection owned by the repository.
//! Both honour the busy timeout, so concurrent writers queue instead of
//! failing.

use super::traits::{
    GraphScope, IsolationLevel, Repository, RepositoryConnection, RepositoryError,
    RepositoryManager, RepositoryResult,
};
use crate::graph::{
    BlankNode, Graph, GraphName, Literal, NamedNode, Quad, Subject, SubjectRef, Term, TermRef,
};
use rusqlite::{params, params_from_iter, Connection, OpenFlags};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const IRI: &str = "iri";
const BLANK: &str = "bnode";
const LITERAL: &str = "literal";

fn init_schema(conn: &Connection) -> RepositoryResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS statements (
            subject_kind TEXT NOT NULL,
            subject TEXT NOT NULL,
            predicate TEXT NOT NULL,
            object_kind TEXT NOT NULL,
            object TEXT NOT NULL,
            datatype TEXT NOT NULL DEFAULT '',
            language TEXT NOT NULL DEFAULT '',
            graph TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (graph, subject_kind, subject, predicate, object_kind, object, datatype, language)
        );

        CREATE INDEX IF NOT EXISTS idx_statements_subject
            ON statements(subject_kind, subject);
        CREATE INDEX IF NOT EXISTS idx_statements_predicate
            ON statements(predicate);
        CREATE INDEX IF NOT EXISTS idx_statements_object
            ON statements(object_kind, object);
        "#,
    )?;
    Ok(())
}

/// Where a repository's database lives.
#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory(String),
}

impl Location {
    fn connect(&self) -> RepositoryResult<Connection> {
        let conn = match self {
            Self::File(path) => Connection::open(path)?,
            Self::Memory(uri) => Connection::open_with_flags(
                uri,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?,
        };
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }
}

/// A repository backed by one SQLite database.
pub struct SqliteRepository {
    id: String,
    location: Location,
    /// Holds memory databases open between connections.
    _keeper: Option<Mutex<Connection>>,
}

impl SqliteRepository {
    fn create(id: &str, location: Location) -> RepositoryResult<Self> {
        let conn = location.connect()?;
        init_schema(&conn)?;
        let keeper = match location {
            Location::File(_) => {
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
                None
            }
            Location::Memory(_) => Some(Mutex::new(conn)),
        };
        Ok(Self {
            id: id.to_string(),
            location,
            _keeper: keeper,
        })
    }
}

impl Repository for SqliteRepository {
    fn id(&self) -> &str {
        &self.id
    }

    fn connection(&self) -> RepositoryResult<Box<dyn RepositoryConnection>> {
        Ok(Box::new(SqliteConnection {
            conn: Some(self.location.connect()?),
            isolation: IsolationLevel::default(),
            active: false,
        }))
    }
}

#[derive(Debug, Clone)]
enum Root {
    Directory(PathBuf),
    Memory(String),
}

/// Hands out SQLite repositories under one endpoint.
///
/// Repositories are created on first use and cached for the manager's
/// lifetime.
pub struct SqliteRepositoryManager {
    root: Root,
    repositories: Mutex<HashMap<String, Arc<SqliteRepository>>>,
}

impl SqliteRepositoryManager {
    /// Use `endpoint` as a directory of `<id>.db` files, creating it if needed.
    pub fn open(endpoint: impl AsRef<Path>) -> RepositoryResult<Self> {
        let endpoint = endpoint.as_ref();
        std::fs::create_dir_all(endpoint)?;
        Ok(Self {
            root: Root::Directory(endpoint.to_path_buf()),
            repositories: Mutex::new(HashMap::new()),
        })
    }

    /// Memory-only repositories, private to this manager.
    pub fn in_memory() -> Self {
        Self {
            root: Root::Memory(Uuid::new_v4().simple().to_string()),
            repositories: Mutex::new(HashMap::new()),
        }
    }

    pub fn endpoint(&self) -> Option<&Path> {
        match &self.root {
            Root::Directory(dir) => Some(dir),
            Root::Memory(_) => None,
        }
    }

    fn location(&self, id: &str) -> Location {
        match &self.root {
            Root::Directory(dir) => Location::File(dir.join(format!("{}.db", id))),
            Root::Memory(namespace) => {
                Location::Memory(format!("file:/ldi-{}-{}?vfs=memdb", namespace, id))
            }
        }
    }
}

fn validate_id(id: &str) -> RepositoryResult<()> {
    let valid = !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(RepositoryError::InvalidRepositoryId(id.to_string()))
    }
}

impl RepositoryManager for SqliteRepositoryManager {
    fn repository(&self, id: &str) -> RepositoryResult<Arc<dyn Repository>> {
        validate_id(id)?;
        let mut repositories = self.repositories.lock().unwrap();
        if let Some(existing) = repositories.get(id) {
            return Ok(Arc::clone(existing) as Arc<dyn Repository>);
        }
        debug!(repository = id, "creating repository");
        let repository = Arc::new(SqliteRepository::create(id, self.location(id))?);
        repositories.insert(id.to_string(), Arc::clone(&repository));
        Ok(repository)
    }
}

/// A single SQLite connection with explicit transaction state.
pub struct SqliteConnection {
    conn: Option<Connection>,
    isolation: IsolationLevel,
    active: bool,
}

impl SqliteConnection {
    fn conn(&self) -> RepositoryResult<&Connection> {
        self.conn.as_ref().ok_or(RepositoryError::Closed)
    }

    fn apply_isolation(&self) -> RepositoryResult<()> {
        let read_uncommitted = i32::from(self.isolation == IsolationLevel::None);
        self.conn()?
            .execute_batch(&format!("PRAGMA read_uncommitted = {};", read_uncommitted))?;
        Ok(())
    }
}

impl RepositoryConnection for SqliteConnection {
    fn set_isolation_level(&mut self, level: IsolationLevel) -> RepositoryResult<()> {
        if self.active {
            return Err(RepositoryError::TransactionActive);
        }
        self.isolation = level;
        self.apply_isolation()
    }

    fn isolation_level(&self) -> IsolationLevel {
        self.isolation
    }

    fn begin(&mut self) -> RepositoryResult<()> {
        if self.active {
            return Err(RepositoryError::TransactionActive);
        }
        self.apply_isolation()?;
        let statement = match self.isolation {
            IsolationLevel::Serializable => "BEGIN EXCLUSIVE",
            IsolationLevel::None | IsolationLevel::ReadCommitted => "BEGIN IMMEDIATE",
        };
        self.conn()?.execute_batch(statement)?;
        self.active = true;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn add(&mut self, graph: &Graph, context: Option<&NamedNode>) -> RepositoryResult<()> {
        let conn = self.conn()?;
        let graph_name = context.map(NamedNode::as_str).unwrap_or("");
        let mut stmt = conn.prepare_cached(
            r#"
            INSERT OR IGNORE INTO statements
                (subject_kind, subject, predicate, object_kind, object, datatype, language, graph)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )?;
        for triple in graph {
            let (subject_kind, subject) = subject_columns(triple.subject);
            let object = object_columns(triple.object);
            stmt.execute(params![
                subject_kind,
                subject,
                triple.predicate.as_str(),
                object.kind,
                object.value,
                object.datatype,
                object.language,
                graph_name,
            ])?;
        }
        Ok(())
    }

    fn get_statements(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
        scope: &GraphScope,
    ) -> RepositoryResult<Vec<Quad>> {
        let pattern = Pattern::new(subject, predicate, object, scope);
        let sql = format!(
            "SELECT subject_kind, subject, predicate, object_kind, object, datatype, language, graph \
             FROM statements{} ORDER BY rowid",
            pattern.where_clause()
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(pattern.values.iter()), |row| {
                Ok(StatementRow {
                    subject_kind: row.get(0)?,
                    subject: row.get(1)?,
                    predicate: row.get(2)?,
                    object_kind: row.get(3)?,
                    object: row.get(4)?,
                    datatype: row.get(5)?,
                    language: row.get(6)?,
                    graph: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(StatementRow::into_quad).collect()
    }

    fn remove_statements(
        &mut self,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
        scope: &GraphScope,
    ) -> RepositoryResult<usize> {
        let pattern = Pattern::new(subject, predicate, object, scope);
        let sql = format!("DELETE FROM statements{}", pattern.where_clause());
        let removed = self
            .conn()?
            .execute(&sql, params_from_iter(pattern.values.iter()))?;
        Ok(removed)
    }

    fn commit(&mut self) -> RepositoryResult<()> {
        if !self.active {
            return Err(RepositoryError::NoActiveTransaction);
        }
        let conn = self.conn()?;
        let result = conn.execute_batch("COMMIT");
        self.active = !conn.is_autocommit();
        result?;
        Ok(())
    }

    fn rollback(&mut self) -> RepositoryResult<()> {
        if !self.active {
            return Ok(());
        }
        let conn = self.conn()?;
        let result = conn.execute_batch("ROLLBACK");
        self.active = !conn.is_autocommit();
        result?;
        Ok(())
    }

    fn close(mut self: Box<Self>) -> RepositoryResult<()> {
        self.rollback()?;
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| e)?;
        }
        Ok(())
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Some(conn) = &self.conn {
            debug!("rolling back uncommitted transaction");
            if let Err(e) = conn.execute_batch("ROLLBACK") {
                warn!(error = %e, "rollback on drop failed");
            }
        }
    }
}

fn subject_columns(subject: SubjectRef<'_>) -> (&'static str, &str) {
    match subject {
        SubjectRef::NamedNode(n) => (IRI, n.as_str()),
        SubjectRef::BlankNode(b) => (BLANK, b.as_str()),
    }
}

struct ObjectColumns<'a> {
    kind: &'static str,
    value: &'a str,
    datatype: &'a str,
    language: &'a str,
}

fn object_columns(object: TermRef<'_>) -> ObjectColumns<'_> {
    match object {
        TermRef::NamedNode(n) => ObjectColumns {
            kind: IRI,
            value: n.as_str(),
            datatype: "",
            language: "",
        },
        TermRef::BlankNode(b) => ObjectColumns {
            kind: BLANK,
            value: b.as_str(),
            datatype: "",
            language: "",
        },
        TermRef::Literal(l) => ObjectColumns {
            kind: LITERAL,
            value: l.value(),
            datatype: l.datatype().as_str(),
            language: l.language().unwrap_or(""),
        },
    }
}

/// A statement pattern compiled to a WHERE clause and its parameters.
struct Pattern<'a> {
    clauses: Vec<&'static str>,
    values: Vec<&'a str>,
}

impl<'a> Pattern<'a> {
    fn new(
        subject: Option<&'a Subject>,
        predicate: Option<&'a NamedNode>,
        object: Option<&'a Term>,
        scope: &'a GraphScope,
    ) -> Self {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        if let Some(subject) = subject {
            let (kind, value) = subject_columns(subject.as_ref());
            clauses.push("subject_kind = ? AND subject = ?");
            values.extend([kind, value]);
        }
        if let Some(predicate) = predicate {
            clauses.push("predicate = ?");
            values.push(predicate.as_str());
        }
        if let Some(object) = object {
            let columns = object_columns(object.as_ref());
            clauses.push("object_kind = ? AND object = ? AND datatype = ? AND language = ?");
            values.extend([columns.kind, columns.value, columns.datatype, columns.language]);
        }
        match scope {
            GraphScope::All => {}
            GraphScope::Default => clauses.push("graph = ''"),
            GraphScope::Named(name) => {
                clauses.push("graph = ?");
                values.push(name.as_str());
            }
        }
        Self { clauses, values }
    }

    fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

struct StatementRow {
    subject_kind: String,
    subject: String,
    predicate: String,
    object_kind: String,
    object: String,
    datatype: String,
    language: String,
    graph: String,
}

impl StatementRow {
    fn into_quad(self) -> RepositoryResult<Quad> {
        let subject: Subject = match self.subject_kind.as_str() {
            IRI => NamedNode::new_unchecked(self.subject).into(),
            BLANK => BlankNode::new_unchecked(self.subject).into(),
            other => return Err(RepositoryError::CorruptRow(format!("subject kind {}", other))),
        };
        let object: Term = match self.object_kind.as_str() {
            IRI => NamedNode::new_unchecked(self.object).into(),
            BLANK => BlankNode::new_unchecked(self.object).into(),
            LITERAL if !self.language.is_empty() => {
                Literal::new_language_tagged_literal_unchecked(self.object, self.language).into()
            }
            LITERAL => {
                Literal::new_typed_literal(self.object, NamedNode::new_unchecked(self.datatype))
                    .into()
            }
            other => return Err(RepositoryError::CorruptRow(format!("object kind {}", other))),
        };
        let graph_name = if self.graph.is_empty() {
            GraphName::DefaultGraph
        } else {
            NamedNode::new_unchecked(self.graph).into()
        };
        Ok(Quad::new(
            subject,
            NamedNode::new_unchecked(self.predicate),
            object,
            graph_name,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{vocab, Triple};

    fn iri(value: &str) -> NamedNode {
        NamedNode::new_unchecked(value)
    }

    fn child() -> BlankNode {
        BlankNode::new_unchecked("c1")
    }

    fn sample() -> Graph {
        [
            Triple::new(iri("urn:x:1"), iri("urn:p:name"), Literal::new_simple_literal("Alice")),
            Triple::new(iri("urn:x:1"), iri("urn:p:child"), child()),
            Triple::new(
                child(),
                iri("urn:p:label"),
                Literal::new_language_tagged_literal_unchecked("kind", "en"),
            ),
            Triple::new(
                child(),
                iri("urn:p:count"),
                Literal::new_typed_literal("3", vocab::xsd::INTEGER),
            ),
        ]
        .into_iter()
        .collect()
    }

    fn connection(manager: &SqliteRepositoryManager) -> Box<dyn RepositoryConnection> {
        manager.repository("test").unwrap().connection().unwrap()
    }

    fn count(conn: &dyn RepositoryConnection, scope: &GraphScope) -> usize {
        conn.get_statements(None, None, None, scope).unwrap().len()
    }

    #[test]
    fn statements_round_trip_every_term_kind() {
        let manager = SqliteRepositoryManager::in_memory();
        let mut conn = connection(&manager);
        conn.add(&sample(), None).unwrap();

        let stored: Graph = conn
            .get_statements(None, None, None, &GraphScope::All)
            .unwrap()
            .into_iter()
            .map(|q| Triple::new(q.subject, q.predicate, q.object))
            .collect();
        assert_eq!(stored, sample());
    }

    #[test]
    fn adding_twice_keeps_set_semantics() {
        let manager = SqliteRepositoryManager::in_memory();
        let mut conn = connection(&manager);
        conn.add(&sample(), None).unwrap();
        conn.add(&sample(), None).unwrap();
        assert_eq!(count(conn.as_ref(), &GraphScope::All), 4);
    }

    #[test]
    fn patterns_match_positions_and_graphs() {
        let manager = SqliteRepositoryManager::in_memory();
        let mut conn = connection(&manager);
        let named = iri("urn:graph:a");
        conn.add(&sample(), None).unwrap();
        conn.add(&sample(), Some(&named)).unwrap();

        assert_eq!(count(conn.as_ref(), &GraphScope::All), 8);
        assert_eq!(count(conn.as_ref(), &GraphScope::Default), 4);
        assert_eq!(count(conn.as_ref(), &GraphScope::Named(named.clone())), 4);

        let child: Subject = child().into();
        let by_subject = conn
            .get_statements(Some(&child), None, None, &GraphScope::Named(named.clone()))
            .unwrap();
        assert_eq!(by_subject.len(), 2);
        let in_named = GraphName::NamedNode(named.clone());
        assert!(by_subject.iter().all(|q| q.graph_name == in_named));

        let object: Term = Literal::new_language_tagged_literal_unchecked("kind", "en").into();
        let by_object = conn
            .get_statements(None, None, Some(&object), &GraphScope::All)
            .unwrap();
        assert_eq!(by_object.len(), 2);

        let untagged: Term = Literal::new_simple_literal("kind").into();
        assert!(conn
            .get_statements(None, None, Some(&untagged), &GraphScope::All)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn remove_respects_scope_and_reports_count() {
        let manager = SqliteRepositoryManager::in_memory();
        let mut conn = connection(&manager);
        let named = iri("urn:graph:a");
        conn.add(&sample(), None).unwrap();
        conn.add(&sample(), Some(&named)).unwrap();

        let subject: Subject = iri("urn:x:1").into();
        let removed = conn
            .remove_statements(Some(&subject), None, None, &GraphScope::Default)
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(count(conn.as_ref(), &GraphScope::Named(named)), 4);

        let removed = conn
            .remove_statements(Some(&subject), None, None, &GraphScope::All)
            .unwrap();
        assert_eq!(removed, 2);
    }

    #[test]
    fn commit_is_visible_to_later_connections() {
        let manager = SqliteRepositoryManager::in_memory();
        let mut writer = connection(&manager);
        writer.begin().unwrap();
        writer.add(&sample(), None).unwrap();
        writer.commit().unwrap();
        writer.close().unwrap();

        let reader = connection(&manager);
        assert_eq!(count(reader.as_ref(), &GraphScope::All), 4);
    }

    #[test]
    fn rollback_and_drop_discard_uncommitted_work() {
        let manager = SqliteRepositoryManager::in_memory();

        let mut conn = connection(&manager);
        conn.begin().unwrap();
        conn.add(&sample(), None).unwrap();
        conn.rollback().unwrap();
        assert!(!conn.is_active());
        assert_eq!(count(conn.as_ref(), &GraphScope::All), 0);
        drop(conn);

        let mut conn = connection(&manager);
        conn.begin().unwrap();
        conn.add(&sample(), None).unwrap();
        drop(conn);

        assert_eq!(count(connection(&manager).as_ref(), &GraphScope::All), 0);
    }

    #[test]
    fn transaction_state_is_enforced() {
        let manager = SqliteRepositoryManager::in_memory();
        let mut conn = connection(&manager);
        assert!(matches!(conn.commit(), Err(RepositoryError::NoActiveTransaction)));

        conn.set_isolation_level(IsolationLevel::None).unwrap();
        assert_eq!(conn.isolation_level(), IsolationLevel::None);
        conn.begin().unwrap();
        assert!(matches!(conn.begin(), Err(RepositoryError::TransactionActive)));
        assert!(matches!(
            conn.set_isolation_level(IsolationLevel::Serializable),
            Err(RepositoryError::TransactionActive)
        ));
        conn.commit().unwrap();
    }

    #[test]
    fn memory_managers_do_not_share_repositories() {
        let first = SqliteRepositoryManager::in_memory();
        let second = SqliteRepositoryManager::in_memory();
        connection(&first).add(&sample(), None).unwrap();
        assert_eq!(count(connection(&second).as_ref(), &GraphScope::All), 0);
        assert_eq!(count(connection(&first).as_ref(), &GraphScope::All), 4);
    }

    #[test]
    fn repository_ids_are_validated() {
        let manager = SqliteRepositoryManager::in_memory();
        for id in ["", "../escape", ".hidden", "a/b", "with space"] {
            assert!(
                matches!(
                    manager.repository(id),
                    Err(RepositoryError::InvalidRepositoryId(_))
                ),
                "{id}"
            );
        }
        assert_eq!(manager.repository("my-repo_1").unwrap().id(), "my-repo_1");
    }

    #[test]
    fn file_repositories_persist_in_wal_mode() {
        let dir = tempfile::tempdir().unwrap();
        {
            let manager = SqliteRepositoryManager::open(dir.path()).unwrap();
            let mut conn = connection(&manager);
            conn.begin().unwrap();
            conn.add(&sample(), None).unwrap();
            conn.commit().unwrap();
        }
        assert!(dir.path().join("test.db").exists());

        let manager = SqliteRepositoryManager::open(dir.path()).unwrap();
        assert_eq!(manager.endpoint(), Some(dir.path()));
        assert_eq!(count(connection(&manager).as_ref(), &GraphScope::All), 4);

        let raw = Connection::open(dir.path().join("test.db")).unwrap();
        let journal_mode: String = raw
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode, "wal");
    }

    #[test]
    fn readers_do_not_block_on_an_open_write() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SqliteRepositoryManager::open(dir.path()).unwrap();
        let mut writer = connection(&manager);
        let reader = connection(&manager);

        writer.begin().unwrap();
        writer.add(&sample(), None).unwrap();
        assert_eq!(count(reader.as_ref(), &GraphScope::All), 0);
        writer.commit().unwrap();
        assert_eq!(count(reader.as_ref(), &GraphScope::All), 4);
    }

    #[test]
    fn memory_writers_wait_for_each_other() {
        let manager = Arc::new(SqliteRepositoryManager::in_memory());
        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || {
                    for round in 0..25 {
                        let mut conn = connection(&manager);
                        conn.begin().unwrap();
                        let subject = iri(&format!("urn:w:{}:{}", worker, round));
                        let graph: Graph = [Triple::new(
                            subject,
                            iri("urn:p:name"),
                            Literal::new_simple_literal("x"),
                        )]
                        .into_iter()
                        .collect();
                        conn.add(&graph, None).unwrap();
                        conn.commit().unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(count(connection(&manager).as_ref(), &GraphScope::All), 100);
    }
}
