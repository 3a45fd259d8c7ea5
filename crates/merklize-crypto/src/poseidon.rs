//! # Poseidon — ZK-Friendly Field Hasher (BN254, circom parameters)
//!
//! Default [`Hasher`] of the merklizer. Field-element hashing delegates to
//! `poseidon-rs`, the iden3 port carrying the circomlib constants for 1 to
//! 16 inputs, so a leaf committed here can be recomputed inside a circom
//! circuit and matches go-iden3-crypto digests.
//!
//! ## Byte hashing
//!
//! Byte strings are absorbed by a sponge over 31-byte chunks (the largest
//! chunk that always fits below the BN254 modulus):
//!
//! 1. Each chunk is read as a big-endian integer; the final chunk is padded
//!    with zero bytes on the right to 31 bytes.
//! 2. Chunks fill a frame of [`SPONGE_FRAME_WIDTH`] inputs. A full frame is
//!    hashed; its digest becomes input 0 of the next frame.
//! 3. A partially filled final frame is hashed with zeros in the unused
//!    slots. An empty message hashes the all-zero frame.
//!
//! ## Security Invariant
//!
//! Inputs `>= p` are rejected before reaching the permutation; the backend
//! would otherwise reduce them silently and two distinct inputs would share
//! a digest.

use std::sync::OnceLock;

use ff_ce::{PrimeField, PrimeFieldRepr};
use num_bigint::BigUint;
use poseidon_rs::{Fr, Poseidon};

use merklize_core::error::HashError;
use merklize_core::field::{bn254_scalar_prime, check_in_field, Hasher};

/// Largest arity of the circom parameter sets shipped with the backend.
pub const MAX_INPUTS: usize = 16;

/// Bytes absorbed per field element.
pub const SPONGE_CHUNK_SIZE: usize = 31;

/// Inputs per sponge frame.
pub const SPONGE_FRAME_WIDTH: usize = 16;

/// Round constants and MDS matrices, parsed once per process.
fn backend() -> &'static Poseidon {
    static BACKEND: OnceLock<Poseidon> = OnceLock::new();
    BACKEND.get_or_init(Poseidon::new)
}

fn to_fr(x: &BigUint) -> Result<Fr, HashError> {
    <Fr as PrimeField>::from_str(&x.to_str_radix(10))
        .ok_or_else(|| HashError::Backend(format!("cannot represent {x} in Fr")))
}

fn from_fr(x: &Fr) -> Result<BigUint, HashError> {
    let mut bytes = Vec::with_capacity(32);
    x.into_repr()
        .write_be(&mut bytes)
        .map_err(|e| HashError::Backend(e.to_string()))?;
    Ok(BigUint::from_bytes_be(&bytes))
}

/// Poseidon over the BN254 scalar field.
#[derive(Debug, Clone)]
pub struct PoseidonHasher {
    prime: BigUint,
}

impl PoseidonHasher {
    pub fn new() -> Self {
        Self {
            prime: bn254_scalar_prime(),
        }
    }
}

impl Default for PoseidonHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for PoseidonHasher {
    fn hash(&self, inputs: &[BigUint]) -> Result<BigUint, HashError> {
        if inputs.is_empty() || inputs.len() > MAX_INPUTS {
            return Err(HashError::InputCount {
                got: inputs.len(),
                max: MAX_INPUTS,
            });
        }
        let mut elements = Vec::with_capacity(inputs.len());
        for x in inputs {
            check_in_field(x, &self.prime)?;
            elements.push(to_fr(x)?);
        }
        let digest = backend().hash(elements).map_err(HashError::Backend)?;
        from_fr(&digest)
    }

    fn hash_bytes(&self, bytes: &[u8]) -> Result<BigUint, HashError> {
        sponge_hash_bytes(self, bytes, SPONGE_FRAME_WIDTH)
    }

    fn prime(&self) -> &BigUint {
        &self.prime
    }
}

/// Sponge construction over `hasher` with the given frame width.
///
/// # Errors
///
/// Propagates hasher failures. `frame_width` must lie in
/// `2..=MAX_INPUTS`.
pub fn sponge_hash_bytes(
    hasher: &dyn Hasher,
    msg: &[u8],
    frame_width: usize,
) -> Result<BigUint, HashError> {
    if !(2..=MAX_INPUTS).contains(&frame_width) {
        return Err(HashError::InputCount {
            got: frame_width,
            max: MAX_INPUTS,
        });
    }
    let zero = BigUint::from(0u8);
    let mut frame = vec![zero.clone(); frame_width];
    let mut k = 0usize;
    let mut dirty = false;
    let mut digest: Option<BigUint> = None;

    for chunk in msg.chunks(SPONGE_CHUNK_SIZE) {
        dirty = true;
        let mut padded = [0u8; SPONGE_CHUNK_SIZE];
        padded[..chunk.len()].copy_from_slice(chunk);
        frame[k] = BigUint::from_bytes_be(&padded);
        if k == frame_width - 1 {
            let h = hasher.hash(&frame)?;
            dirty = false;
            frame.iter_mut().for_each(|slot| *slot = zero.clone());
            frame[0] = h.clone();
            digest = Some(h);
            k = 1;
        } else {
            k += 1;
        }
    }

    match digest {
        Some(h) if !dirty => Ok(h),
        _ => hasher.hash(&frame),
    }
}
