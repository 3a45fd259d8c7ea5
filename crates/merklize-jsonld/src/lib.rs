//! # merklize-jsonld — JSON-LD Plumbing
//!
//! Everything between raw JSON-LD and the canonical quads the merklizer
//! consumes:
//!
//! - **Loaders** ([`loader`]): explicit remote document resolution, with
//!   static, HTTP/IPFS and caching implementations.
//! - **Contexts** ([`context`]): an immutable active context with term
//!   definitions, scoped contexts and IRI expansion.
//! - **Compacted view** ([`compact`]): the IRI-keyed document used for raw
//!   value lookups; enforces safe mode.
//! - **Dotted paths** ([`docpath`]): shortcut resolution against documents
//!   and context documents.
//! - **RDF** ([`rdf`], [`processor`]): JSON-LD to canonical (RDFC-1.0)
//!   datasets grouped by graph.
//!
//! ## Crate Policy
//!
//! - No network access except through a [`DocumentLoader`] the caller
//!   supplies.
//! - No global state; contexts are values.

pub mod compact;
pub mod context;
pub mod docpath;
pub mod error;
pub mod loader;
pub mod processor;
pub mod rdf;

pub use compact::compact_document;
pub use context::{is_keyword, Context, TermDefinition};
pub use docpath::{
    field_path_from_context, path_from_context, path_from_document, type_from_context,
    type_id_from_context,
};
pub use error::{JsonLdError, LoaderError};
pub use loader::{
    CachingLoader, DocumentLoader, HttpLoader, LoaderConfig, NoLoader, RemoteDocument,
    StaticLoader,
};
pub use processor::{inline_contexts, JsonLdProcessor, SophiaProcessor};
pub use rdf::{Dataset, Literal, Node, Quad, DEFAULT_GRAPH};
