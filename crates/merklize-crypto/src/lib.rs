//! # merklize-crypto — Hash Backends and Sparse Merkle Tree
//!
//! Provides the cryptographic building blocks behind the merklizer:
//!
//! - **Poseidon** over the BN254 scalar field with circom parameters, the
//!   default [`Hasher`](merklize_core::Hasher).
//! - **SHA-256** reduced into the same field, for off-circuit use.
//! - **Sparse Merkle tree** with membership and non-membership proofs and
//!   a standalone verifier.
//!
//! ## Crate Policy
//!
//! - Depends only on `merklize-core` internally.
//! - No mocking of cryptographic operations in tests: all tests use the
//!   real Poseidon and SHA-256 backends.

pub mod poseidon;
pub mod sha256;
pub mod smt;

pub use poseidon::PoseidonHasher;
pub use sha256::Sha256Hasher;
pub use smt::{verify_proof, SparseMerkleTree, DEFAULT_MT_LEVELS};
