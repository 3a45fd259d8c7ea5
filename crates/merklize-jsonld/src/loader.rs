//! # Document Loaders — Remote `@context` Resolution
//!
//! JSON-LD contexts are frequently referenced by URL. Every fetch goes
//! through a [`DocumentLoader`], which the caller chooses explicitly:
//!
//! - [`StaticLoader`] serves preloaded documents (tests, pinned contexts).
//! - [`HttpLoader`] fetches `http(s)://` URLs with a blocking client and
//!   routes `ipfs://` URLs through a configured gateway.
//! - [`CachingLoader`] wraps any loader with a TTL cache.
//! - [`NoLoader`] refuses every request, for fully offline processing.
//!
//! `HttpLoader` uses `reqwest`'s blocking client; calling it from inside an
//! async runtime's worker thread panics, so async callers should merklize on
//! a blocking task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use url::Url;

use crate::error::LoaderError;

/// Fetched document with the URL it was served from.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub document_url: String,
    pub document: serde_json::Value,
}

/// Source of remote JSON-LD documents.
pub trait DocumentLoader: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`LoaderError`] when the URL cannot be fetched or the body
    /// is not JSON.
    fn load_document(&self, url: &str) -> Result<RemoteDocument, LoaderError>;
}

impl<T: DocumentLoader + ?Sized> DocumentLoader for Arc<T> {
    fn load_document(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        (**self).load_document(url)
    }
}

impl<T: DocumentLoader + ?Sized> DocumentLoader for &T {
    fn load_document(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        (**self).load_document(url)
    }
}

// ---------------------------------------------------------------------------
// Offline loaders
// ---------------------------------------------------------------------------

/// Loader that never fetches anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLoader;

impl DocumentLoader for NoLoader {
    fn load_document(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        Err(LoaderError::NotFound(url.to_owned()))
    }
}

/// Loader over an in-memory URL → document map.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    documents: HashMap<String, serde_json::Value>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: impl Into<String>, document: serde_json::Value) -> Self {
        self.insert(url, document);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, document: serde_json::Value) {
        self.documents.insert(url.into(), document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentLoader for StaticLoader {
    fn load_document(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        self.documents
            .get(url)
            .map(|document| RemoteDocument {
                document_url: url.to_owned(),
                document: document.clone(),
            })
            .ok_or_else(|| LoaderError::NotFound(url.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// HTTP / IPFS
// ---------------------------------------------------------------------------

/// Settings of the network loader.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Gateway serving `ipfs://` content as `{gateway}/ipfs/{cid}`.
    pub ipfs_gateway: Option<Url>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            ipfs_gateway: None,
            timeout_secs: 30,
        }
    }
}

/// Blocking HTTP loader with optional IPFS gateway.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: reqwest::blocking::Client,
    ipfs_gateway: Option<Url>,
}

impl HttpLoader {
    /// # Errors
    ///
    /// [`LoaderError::Http`] when the HTTP client cannot be built.
    pub fn new(config: &LoaderConfig) -> Result<Self, LoaderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LoaderError::Http {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            ipfs_gateway: config.ipfs_gateway.clone(),
        })
    }

    /// HTTP URL that serves `url`.
    pub fn resolve_url(&self, url: &str) -> Result<String, LoaderError> {
        let parsed = Url::parse(url).map_err(|e| LoaderError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(url.to_owned()),
            "ipfs" => {
                let gateway = self
                    .ipfs_gateway
                    .as_ref()
                    .ok_or_else(|| LoaderError::NoIpfsGateway(url.to_owned()))?;
                let content = url.trim_start_matches("ipfs://");
                Ok(format!(
                    "{}/ipfs/{}",
                    gateway.as_str().trim_end_matches('/'),
                    content
                ))
            }
            _ => Err(LoaderError::UnsupportedScheme(url.to_owned())),
        }
    }
}

impl DocumentLoader for HttpLoader {
    fn load_document(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        let target = self.resolve_url(url)?;
        tracing::debug!(url = %url, target = %target, "loading JSON-LD document");
        let http_err = |e: reqwest::Error| LoaderError::Http {
            url: url.to_owned(),
            reason: e.to_string(),
        };
        let body = self
            .client
            .get(&target)
            .header(
                reqwest::header::ACCEPT,
                "application/ld+json, application/json;q=0.9",
            )
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(http_err)?;
        let document = serde_json::from_str(&body).map_err(|e| LoaderError::InvalidJson {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(RemoteDocument {
            document_url: url.to_owned(),
            document,
        })
    }
}

// ---------------------------------------------------------------------------
// Caching
// ---------------------------------------------------------------------------

/// Loader decorator caching successful loads.
pub struct CachingLoader<L> {
    inner: L,
    ttl: Option<Duration>,
    cache: RwLock<HashMap<String, (Instant, RemoteDocument)>>,
}

impl<L: DocumentLoader> CachingLoader<L> {
    /// Cache entries never expire.
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            ttl: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_ttl(inner: L, ttl: Duration) -> Self {
        Self {
            inner,
            ttl: Some(ttl),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }
}

impl<L: DocumentLoader> DocumentLoader for CachingLoader<L> {
    fn load_document(&self, url: &str) -> Result<RemoteDocument, LoaderError> {
        if let Some((stored_at, doc)) = self.cache.read().get(url) {
            let fresh = self.ttl.map_or(true, |ttl| stored_at.elapsed() < ttl);
            if fresh {
                tracing::trace!(url = %url, "document cache hit");
                return Ok(doc.clone());
            }
        }
        let doc = self.inner.load_document(url)?;
        self.cache
            .write()
            .insert(url.to_owned(), (Instant::now(), doc.clone()));
        Ok(doc)
    }
}
