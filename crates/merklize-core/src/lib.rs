//! # merklize-core — Values, Paths and Contracts
//!
//! Foundational types for committing JSON-LD documents into a sparse
//! Merkle tree:
//!
//! - **Field window** and the [`Hasher`] contract every hash backend
//!   implements.
//! - **Value codec**: the five leaf kinds of [`Value`] and their mapping
//!   into the prime field; XSD lexical decoding in [`datatype`].
//! - **Paths**: [`Path`] addressing of leaves and its hash.
//! - **Entries**: [`Entry`] triples of path, value and datatype.
//! - **Tree contract**: [`MerkleTree`] and [`Proof`].
//!
//! ## Crate Policy
//!
//! - No I/O and no global state: hashers and trees are always passed in.
//! - Numeric conversions never lose precision silently.

pub mod datatype;
pub mod entry;
pub mod error;
pub mod field;
pub mod path;
pub mod tree;
pub mod value;

pub use datatype::{decode, hash_value, NativeValue};
pub use entry::Entry;
pub use error::{HashError, MerklizeError, PathError, TreeError, ValueError};
pub use field::{bn254_scalar_prime, decode_field_element, FieldWindow, Hasher, SharedHasher};
pub use path::{Path, PathSegment};
pub use tree::{MerkleTree, NodeAux, Proof};
pub use value::Value;
