//! # merklize — JSON-LD Documents as Sparse Merkle Trees
//!
//! Commits every field of a JSON-LD document into a sparse Merkle tree so
//! single fields can later be proven present (or absent) and bound to a
//! value without revealing the rest of the document.
//!
//! ```text
//! JSON-LD ─▶ canonical RDF ─▶ relationship graph ─▶ entries ─▶ tree
//!                                (paths)            (path, value, datatype)
//! ```
//!
//! - [`relationship`]: parent links and array positions between quads.
//! - [`extract`]: dataset validation and entry emission.
//! - [`Merklizer`]: the immutable committed snapshot and its queries.
//! - [`MerklizeOptions`] / [`MerklizeConfig`]: explicit configuration.
//!
//! ## Crate Policy
//!
//! - No global hasher, loader or processor: everything arrives through
//!   [`MerklizeOptions`].
//! - Paths are independent of key order and array order in the source
//!   document, because they are derived from the canonical dataset.

pub mod config;
pub mod extract;
pub mod merklizer;
pub mod options;
pub mod relationship;

pub use config::{ConfigError, MerklizeConfig};
pub use extract::{extract_entries, validate_dataset};
pub use merklizer::Merklizer;
pub use options::MerklizeOptions;
pub use relationship::{ArrayKey, NodeRef, QuadId, RelationshipGraph};

pub use merklize_core::{
    Entry, Hasher, MerkleTree, MerklizeError, Path, PathSegment, Proof, SharedHasher, Value,
};
pub use merklize_crypto::{verify_proof, PoseidonHasher, Sha256Hasher, SparseMerkleTree};
pub use merklize_jsonld::{DocumentLoader, NoLoader, StaticLoader};
