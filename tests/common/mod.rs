//! Common test utilities for ingestion tests
//!
//! Context documents, pipeline descriptions and store readback shared by
//! the integration tests.

#![allow(dead_code)]

use ldi::graph::is_named;
use ldi::{
    Graph, GraphExt, GraphScope, Repository, RepositoryConnection, RepositoryManager,
    SqliteRepositoryManager, Triple,
};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::thread;

pub const CORE_CONTEXT: &str = "https://example.org/contexts/core.jsonld";
pub const LOCAL_CONTEXT: &str = "https://example.org/contexts/local.jsonld";

pub const SCHEMA: &str = "http://schema.org/";

/// `contexts:` block registering the core and local contexts inline.
pub fn inline_contexts() -> String {
    format!(
        r#"contexts:
  {core}:
    "@context":
      "@vocab": {schema}
      id: "@id"
      type: "@type"
  {local}:
    "@context":
      nickname: https://example.org/vocab#nickname
"#,
        core = CORE_CONTEXT,
        local = LOCAL_CONTEXT,
        schema = SCHEMA,
    )
}

/// Pipeline description for the generic JSON adapter.
pub fn json_pipeline(endpoint: &Path, extra: &str) -> String {
    format!(
        r#"adapter:
  kind: json
  core_context: {core}
{contexts}materialiser:
  endpoint: {endpoint}
  repository_id: events
{extra}"#,
        core = CORE_CONTEXT,
        contexts = inline_contexts(),
        endpoint = endpoint.display(),
        extra = extra,
    )
}

/// Pipeline description for the NGSI-v2 adapter nesting entities under `data`.
pub fn ngsi_pipeline(endpoint: &Path, extra: &str) -> String {
    format!(
        r#"adapter:
  kind: ngsi-v2
  data_identifier: data
  core_context: {core}
{contexts}materialiser:
  endpoint: {endpoint}
  repository_id: events
{extra}"#,
        core = CORE_CONTEXT,
        contexts = inline_contexts(),
        endpoint = endpoint.display(),
        extra = extra,
    )
}

/// Everything stored in `repository_id` under `endpoint`, as triples.
pub fn stored(endpoint: &Path, repository_id: &str, scope: &GraphScope) -> Graph {
    let manager = SqliteRepositoryManager::open(endpoint).expect("open endpoint");
    let repository = manager.repository(repository_id).expect("open repository");
    let connection = repository.connection().expect("connect");
    connection
        .get_statements(None, None, None, scope)
        .expect("read statements")
        .into_iter()
        .map(|quad| Triple::new(quad.subject, quad.predicate, quad.object))
        .collect()
}

/// Named subjects of a graph, as strings.
pub fn entities(graph: &Graph) -> Vec<String> {
    graph
        .named_subjects()
        .into_iter()
        .map(|node| node.into_string())
        .collect()
}

pub fn blank_subject_count(graph: &Graph) -> usize {
    graph.subjects().iter().filter(|s| !is_named(s)).count()
}

/// Serve `body` as JSON-LD to the first `requests` connections on a local
/// port. Returns the server's base URL.
pub fn serve_json_ld(body: String, requests: usize) -> (String, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
    let address = listener.local_addr().expect("local address");
    let handle = thread::spawn(move || {
        for stream in listener.incoming().take(requests) {
            let mut stream = stream.expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).expect("read request") == 0 || line == "\r\n" {
                    break;
                }
            }
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/ld+json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
            .expect("write response");
        }
    });
    (format!("http://{}", address), handle)
}
