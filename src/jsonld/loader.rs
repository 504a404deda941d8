//! Context document loaders
//!
//! A context reference is resolved to its JSON document through a
//! `ContextLoader`: registered documents, files, or `http(s)` IRIs.

use super::error::{JsonLdError, JsonLdResult};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const JSON_LD_ACCEPT: &str = "application/ld+json, application/json;q=0.9";

/// Resolves a context reference (IRI or path) to the JSON document it names.
pub trait ContextLoader: Send + Sync {
    fn load(&self, reference: &str) -> JsonLdResult<Value>;
}

/// Context documents registered up front, keyed by reference.
#[derive(Debug, Clone, Default)]
pub struct StaticContextLoader {
    documents: HashMap<String, Value>,
}

impl StaticContextLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document and return the loader (builder style).
    pub fn with(mut self, reference: impl Into<String>, document: Value) -> Self {
        self.insert(reference, document);
        self
    }

    pub fn insert(&mut self, reference: impl Into<String>, document: Value) {
        self.documents.insert(reference.into(), document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl ContextLoader for StaticContextLoader {
    fn load(&self, reference: &str) -> JsonLdResult<Value> {
        self.documents
            .get(reference)
            .cloned()
            .ok_or_else(|| JsonLdError::LoadingContextFailed {
                reference: reference.to_string(),
                message: "no such context registered".to_string(),
            })
    }
}

/// Reads context documents from disk.
///
/// Accepts `file://` IRIs and plain paths; relative paths resolve against
/// the loader's base directory.
#[derive(Debug, Clone)]
pub struct FileContextLoader {
    base_dir: PathBuf,
}

impl FileContextLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let path = match reference.strip_prefix("file://") {
            Some(rest) => Path::new(rest).to_path_buf(),
            None if reference.contains("://") => return None,
            None => Path::new(reference).to_path_buf(),
        };
        if path.is_absolute() {
            Some(path)
        } else {
            Some(self.base_dir.join(path))
        }
    }
}

impl ContextLoader for FileContextLoader {
    fn load(&self, reference: &str) -> JsonLdResult<Value> {
        let failed = |message: String| JsonLdError::LoadingContextFailed {
            reference: reference.to_string(),
            message,
        };
        let path = self
            .resolve(reference)
            .ok_or_else(|| failed("not a file reference".to_string()))?;
        let text = std::fs::read_to_string(&path).map_err(|e| failed(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| failed(e.to_string()))
    }
}

/// Fetches `http` and `https` context documents.
///
/// Each document is fetched once and cached for the loader's lifetime;
/// failures are not cached.
pub struct HttpContextLoader {
    client: Client,
    cache: Mutex<HashMap<String, Value>>,
}

impl HttpContextLoader {
    pub fn new() -> reqwest::Result<Self> {
        Self::with_timeout(HTTP_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self::from_client(Client::builder().timeout(timeout).build()?))
    }

    /// Use a preconfigured client (proxies, TLS roots, timeouts).
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn fetch(&self, reference: &str) -> reqwest::Result<String> {
        self.client
            .get(reference)
            .header(ACCEPT, JSON_LD_ACCEPT)
            .send()?
            .error_for_status()?
            .text()
    }
}

impl ContextLoader for HttpContextLoader {
    fn load(&self, reference: &str) -> JsonLdResult<Value> {
        let failed = |message: String| JsonLdError::LoadingContextFailed {
            reference: reference.to_string(),
            message,
        };
        if !(reference.starts_with("http://") || reference.starts_with("https://")) {
            return Err(failed("not an http(s) reference".to_string()));
        }
        if let Some(document) = self.cache.lock().unwrap().get(reference) {
            return Ok(document.clone());
        }

        debug!(reference, "fetching remote context");
        let text = self.fetch(reference).map_err(|e| failed(e.to_string()))?;
        let document: Value = serde_json::from_str(&text).map_err(|e| failed(e.to_string()))?;
        self.cache
            .lock()
            .unwrap()
            .insert(reference.to_string(), document.clone());
        Ok(document)
    }
}

/// Tries each loader in order and returns the first document found.
#[derive(Clone, Default)]
pub struct ChainContextLoader {
    loaders: Vec<Arc<dyn ContextLoader>>,
}

impl ChainContextLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, loader: Arc<dyn ContextLoader>) -> Self {
        self.loaders.push(loader);
        self
    }
}

impl ContextLoader for ChainContextLoader {
    fn load(&self, reference: &str) -> JsonLdResult<Value> {
        let mut last_error = None;
        for loader in &self.loaders {
            match loader.load(reference) {
                Ok(document) => return Ok(document),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| JsonLdError::LoadingContextFailed {
            reference: reference.to_string(),
            message: "no context loaders configured".to_string(),
        }))
    }
}
