//! # SHA-256 Field Hasher
//!
//! Off-circuit alternative to Poseidon. Field elements are serialized as
//! 32-byte big-endian words, concatenated and digested; byte strings are
//! digested directly. The 256-bit digest is reduced modulo the field prime.
//!
//! Leaves produced with this hasher are not verifiable inside a circuit;
//! it exists for deployments that only verify proofs natively.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use merklize_core::error::HashError;
use merklize_core::field::{bn254_scalar_prime, check_in_field, Hasher};

/// Largest accepted arity, matching the Poseidon backend.
pub const MAX_INPUTS: usize = crate::poseidon::MAX_INPUTS;

/// SHA-256 reduced into a prime field (BN254 scalar field by default).
#[derive(Debug, Clone)]
pub struct Sha256Hasher {
    prime: BigUint,
}

impl Sha256Hasher {
    pub fn new() -> Self {
        Self::with_prime(bn254_scalar_prime())
    }

    /// Hasher over a custom prime. Primes wider than 256 bits are accepted
    /// but digests never exceed `2^256 - 1`.
    pub fn with_prime(prime: BigUint) -> Self {
        Self { prime }
    }

    fn reduce(&self, digest: &[u8]) -> BigUint {
        BigUint::from_bytes_be(digest) % &self.prime
    }
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-width big-endian encoding of a field element.
fn to_word(x: &BigUint) -> [u8; 32] {
    let bytes = x.to_bytes_be();
    let mut word = [0u8; 32];
    let start = 32usize.saturating_sub(bytes.len());
    let take = bytes.len().min(32);
    word[start..].copy_from_slice(&bytes[bytes.len() - take..]);
    word
}

impl Hasher for Sha256Hasher {
    fn hash(&self, inputs: &[BigUint]) -> Result<BigUint, HashError> {
        if inputs.is_empty() || inputs.len() > MAX_INPUTS {
            return Err(HashError::InputCount {
                got: inputs.len(),
                max: MAX_INPUTS,
            });
        }
        let mut hasher = Sha256::new();
        for x in inputs {
            check_in_field(x, &self.prime)?;
            hasher.update(to_word(x));
        }
        Ok(self.reduce(&hasher.finalize()))
    }

    fn hash_bytes(&self, bytes: &[u8]) -> Result<BigUint, HashError> {
        Ok(self.reduce(&Sha256::digest(bytes)))
    }

    fn prime(&self) -> &BigUint {
        &self.prime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_bytes_known_vector() {
        // SHA-256("abc") = ba7816bf...15ad, reduced mod the BN254 prime.
        let h = Sha256Hasher::new();
        let digest = BigUint::parse_bytes(
            b"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
            16,
        )
        .unwrap();
        assert_eq!(h.hash_bytes(b"abc").unwrap(), digest % bn254_scalar_prime());
    }

    #[test]
    fn word_encoding_is_left_padded() {
        let w = to_word(&BigUint::from(0x0102u32));
        assert_eq!(w[30], 0x01);
        assert_eq!(w[31], 0x02);
        assert!(w[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn order_matters() {
        let h = Sha256Hasher::new();
        let a = h.hash(&[BigUint::from(1u8), BigUint::from(2u8)]).unwrap();
        let b = h.hash(&[BigUint::from(2u8), BigUint::from(1u8)]).unwrap();
        assert_ne!(a, b);
        assert!(&a < h.prime());
    }

    #[test]
    fn custom_prime_bounds_inputs() {
        let h = Sha256Hasher::with_prime(BigUint::from(101u32));
        assert!(h.hash(&[BigUint::from(100u32)]).is_ok());
        assert!(matches!(
            h.hash(&[BigUint::from(101u32)]),
            Err(HashError::NotInField(_))
        ));
        assert!(h.hash_bytes(b"anything").unwrap() < BigUint::from(101u32));
    }
}
