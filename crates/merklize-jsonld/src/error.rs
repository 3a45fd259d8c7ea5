//! JSON-LD processing and document loading errors.

use merklize_core::error::{MerklizeError, PathError};
use thiserror::Error;

/// Failure while fetching a remote document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoaderError {
    /// The URL is not known to an offline loader.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The URL scheme cannot be fetched by this loader.
    #[error("unsupported URL scheme for {0}")]
    UnsupportedScheme(String),

    /// An `ipfs://` URL was requested without a configured gateway.
    #[error("IPFS gateway is not configured, cannot load {0}")]
    NoIpfsGateway(String),

    /// The URL could not be parsed.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Transport or HTTP status failure.
    #[error("failed to fetch {url}: {reason}")]
    Http { url: String, reason: String },

    /// The response body is not JSON.
    #[error("document at {url} is not valid JSON: {reason}")]
    InvalidJson { url: String, reason: String },
}

/// Failure in JSON-LD context processing, compaction or RDF conversion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JsonLdError {
    #[error("loading document failed: {0}")]
    Loader(#[from] LoaderError),

    /// A local or remote context is malformed.
    #[error("invalid context: {0}")]
    InvalidContext(String),

    /// The document is not a JSON-LD object or array.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// A property does not expand to an absolute IRI in safe mode.
    #[error("invalid property: {0}")]
    InvalidProperty(String),

    /// A term has no IRI mapping.
    #[error("no @id attribute for term: {0}")]
    UnknownTerm(String),

    /// A dotted document path does not match the document.
    #[error("{0}")]
    NotFound(String),

    /// The document shape differs from what the dotted path expects.
    #[error("{0}")]
    Shape(String),

    /// JSON-LD to RDF conversion failed.
    #[error("JSON-LD to RDF conversion failed: {0}")]
    ToRdf(String),

    /// RDF dataset canonicalization failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    /// Canonical N-Quads could not be parsed.
    #[error("invalid N-Quads: {0}")]
    NQuads(String),

    /// A dotted path was empty.
    #[error("path is empty")]
    EmptyPath,
}

impl From<JsonLdError> for MerklizeError {
    fn from(e: JsonLdError) -> Self {
        match e {
            JsonLdError::InvalidProperty(p) => MerklizeError::InvalidProperty(p),
            JsonLdError::UnknownTerm(t) => MerklizeError::Path(PathError::UnknownTerm(t)),
            JsonLdError::NotFound(m) => MerklizeError::NotFound(m),
            JsonLdError::Shape(m) => MerklizeError::Shape(m),
            JsonLdError::InvalidDocument(m) => MerklizeError::InvalidDocument(m),
            JsonLdError::EmptyPath => MerklizeError::Path(PathError::Empty),
            other => MerklizeError::JsonLd(other.to_string()),
        }
    }
}
