//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout the merklization pipeline. All
//! errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Range and type failures of the value codec are [`ValueError`].
//! - Hash backend failures (inputs outside the field, arity) are
//!   [`HashError`].
//! - Lookup failures are distinguishable through
//!   [`MerklizeError::is_not_found`] so callers can treat a missing field
//!   differently from a malformed document.

use num_bigint::{BigInt, BigUint};
use thiserror::Error;

/// Top-level error type for merklization.
#[derive(Error, Debug)]
pub enum MerklizeError {
    /// Value encoding or decoding failed.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The hash function rejected its inputs.
    #[error("hash error: {0}")]
    Hash(#[from] HashError),

    /// A path could not be built or resolved.
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// The authenticated tree rejected an operation.
    #[error("merkle tree error: {0}")]
    Tree(#[from] TreeError),

    /// The input bytes are not a usable JSON-LD document.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// JSON-LD processing (context resolution, expansion, RDF conversion)
    /// failed.
    #[error("JSON-LD processing failed: {0}")]
    JsonLd(String),

    /// A document property does not expand to an absolute IRI while safe
    /// mode is enabled.
    #[error("invalid property: {0}")]
    InvalidProperty(String),

    /// The RDF dataset violates a structural precondition.
    #[error("inconsistent dataset: {0}")]
    Dataset(String),

    /// The RDF dataset has a shape merklization does not support.
    #[error("unsupported RDF shape: {0}")]
    UnsupportedRdf(String),

    /// A quad has more than one candidate parent.
    #[error("multiple parents found: {0}")]
    MultipleParents(String),

    /// No entry is stored under the requested path.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// A field is missing from the document.
    #[error("{0}")]
    NotFound(String),

    /// The compacted document has a different shape than the path expects.
    #[error("{0}")]
    Shape(String),

    /// An internal invariant was violated.
    #[error("[assertion] {0}")]
    Assertion(String),
}

impl MerklizeError {
    /// True for lookup failures (missing entries or fields).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MerklizeError::EntryNotFound(_) | MerklizeError::NotFound(_)
        )
    }

    /// True when an internal invariant was violated.
    pub fn is_assertion(&self) -> bool {
        matches!(self, MerklizeError::Assertion(_))
    }
}

/// Range or type failure while encoding or decoding a value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// Integer above the upper bound of its XSD datatype.
    #[error("integer exceeds maximum value: {0}")]
    AboveMaximum(BigInt),

    /// Integer below the lower bound of its XSD datatype.
    #[error("integer is below minimum value: {0}")]
    BelowMinimum(BigInt),

    /// Integer at or above the field prime.
    #[error("value is too big: {0}")]
    TooBig(BigInt),

    /// Negative integer below the balanced field window.
    #[error("value is too small: {0}")]
    TooSmall(BigInt),

    /// Boolean lexical form not recognized.
    #[error("incorrect boolean value: {0:?}")]
    InvalidBoolean(String),

    /// Integer lexical form not recognized or not integral.
    #[error("invalid integer value: {0:?}")]
    InvalidInteger(String),

    /// Timestamp lexical form not recognized.
    #[error("invalid dateTime value {value:?}: {reason}")]
    InvalidDateTime {
        /// Offending text.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// Double lexical form not recognized.
    #[error("invalid double value: {0:?}")]
    InvalidDouble(String),

    /// A number cannot be converted without losing precision.
    #[error("{value} is not exactly representable as {target}")]
    NotRepresentable {
        /// Offending number, as text.
        value: String,
        /// Requested representation.
        target: &'static str,
    },

    /// A dynamic value has an unsupported kind.
    #[error("unsupported value type: {0}")]
    UnsupportedType(String),
}

/// Failure reported by a [`crate::Hasher`] implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HashError {
    /// Input is not a canonical field element.
    #[error("hash input is outside the finite field: {0}")]
    NotInField(BigUint),

    /// Wrong number of inputs for the hash parameters.
    #[error("hash accepts between 1 and {max} inputs, got {got}")]
    InputCount {
        /// Number of inputs supplied.
        got: usize,
        /// Largest supported arity.
        max: usize,
    },

    /// Backend-specific failure.
    #[error("hash backend failure: {0}")]
    Backend(String),
}

/// Path construction or resolution failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    /// A path with no segments cannot address an entry.
    #[error("path is empty")]
    Empty,

    /// A dynamic segment is neither a string nor a non-negative integer.
    #[error("invalid path segment: {0}")]
    InvalidSegment(String),

    /// A shortcut term has no IRI mapping in the active context.
    #[error("no @id attribute for term: {0}")]
    UnknownTerm(String),
}

/// Authenticated tree failure.
#[derive(Error, Debug)]
pub enum TreeError {
    /// The key is already present.
    #[error("the entry index already exists in the tree")]
    EntryIndexAlreadyExists,

    /// Two keys share a prefix longer than the tree depth.
    #[error("reached maximum level of the merkle tree: {0}")]
    ReachedMaxLevel(usize),

    /// Node referenced by hash is missing from storage.
    #[error("node not found in tree storage: {0}")]
    NodeNotFound(BigUint),

    /// Key or value hashing failed.
    #[error(transparent)]
    Hash(#[from] HashError),
}
