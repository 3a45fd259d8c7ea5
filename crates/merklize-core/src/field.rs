//! # Field Arithmetic — Hasher Contract and Balanced Window
//!
//! Every value committed to the tree is a canonical element of a prime
//! field `[0, p)`. Signed integers are mapped into that range through a
//! balanced window centered on zero:
//!
//! - `max_int = floor(p / 2)`
//! - `min_int = max_int - p + 1`
//!
//! so that `v >= 0` maps to `v` and `v < 0` maps to `p + v`. The same
//! window bounds `xsd:integer` during decoding, which keeps encoding and
//! decoding mutually consistent.
//!
//! ## Hasher contract
//!
//! [`Hasher`] is the only hashing seam. Implementations must reject inputs
//! outside `[0, p)` and must be deterministic. No global hasher exists; the
//! active one is passed explicitly through every call.

use std::fmt;
use std::sync::Arc;

use num_bigint::{BigInt, BigUint, Sign};

use crate::error::HashError;

/// Big-endian bytes of the BN254 scalar field modulus
/// `21888242871839275222246405745257275088548364400416034343698204186575808495617`.
const BN254_SCALAR_MODULUS_BE: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91, 0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00, 0x00, 0x01,
];

/// The BN254 scalar field prime used by the default hashers.
pub fn bn254_scalar_prime() -> BigUint {
    BigUint::from_bytes_be(&BN254_SCALAR_MODULUS_BE)
}

/// Field-element hash function.
pub trait Hasher: Send + Sync + fmt::Debug {
    /// Hash a sequence of field elements into one field element.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::NotInField`] when an input is `>= prime()` and
    /// [`HashError::InputCount`] when the arity is unsupported.
    fn hash(&self, inputs: &[BigUint]) -> Result<BigUint, HashError>;

    /// Hash an arbitrary byte string into one field element.
    fn hash_bytes(&self, bytes: &[u8]) -> Result<BigUint, HashError>;

    /// Modulus of the field the hasher operates in.
    fn prime(&self) -> &BigUint;
}

/// Shared handle to a hasher.
pub type SharedHasher = Arc<dyn Hasher>;

/// Balanced residue window of a prime field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldWindow {
    prime: BigInt,
    max_int: BigInt,
    min_int: BigInt,
}

impl FieldWindow {
    pub fn new(prime: &BigUint) -> Self {
        let prime = BigInt::from_biguint(Sign::Plus, prime.clone());
        let max_int: BigInt = &prime >> 1usize;
        let min_int = &max_int - &prime + 1;
        Self {
            prime,
            max_int,
            min_int,
        }
    }

    pub fn prime(&self) -> &BigInt {
        &self.prime
    }

    /// Largest signed integer representable in the window.
    pub fn max_int(&self) -> &BigInt {
        &self.max_int
    }

    /// Smallest signed integer representable in the window.
    pub fn min_int(&self) -> &BigInt {
        &self.min_int
    }

    /// `p - 1`, the largest canonical field element.
    pub fn max_element(&self) -> BigInt {
        &self.prime - 1
    }

    pub fn contains(&self, v: &BigInt) -> bool {
        v >= &self.min_int && v <= &self.max_int
    }
}

/// Inverse of signed-integer encoding: elements above `max_int` are read
/// back as `fe - p`.
pub fn decode_field_element(fe: &BigUint, prime: &BigUint) -> BigInt {
    let window = FieldWindow::new(prime);
    let v = BigInt::from_biguint(Sign::Plus, fe.clone());
    if &v > window.max_int() {
        v - window.prime()
    } else {
        v
    }
}

/// Reject an input that is not a canonical field element.
pub fn check_in_field(x: &BigUint, prime: &BigUint) -> Result<(), HashError> {
    if x >= prime {
        return Err(HashError::NotInField(x.clone()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Deterministic non-cryptographic hasher for exercising the codec
    //! without pulling in a real hash backend.

    use super::*;

    #[derive(Debug, Clone)]
    pub struct FoldHasher {
        prime: BigUint,
    }

    impl FoldHasher {
        pub fn new() -> Self {
            Self {
                prime: bn254_scalar_prime(),
            }
        }
    }

    impl Hasher for FoldHasher {
        fn hash(&self, inputs: &[BigUint]) -> Result<BigUint, HashError> {
            if inputs.is_empty() || inputs.len() > 16 {
                return Err(HashError::InputCount {
                    got: inputs.len(),
                    max: 16,
                });
            }
            let mut acc = BigUint::from(inputs.len());
            for (i, x) in inputs.iter().enumerate() {
                check_in_field(x, &self.prime)?;
                acc = (acc * 1_000_003u32 + x + i + 7u32) % &self.prime;
            }
            Ok(acc)
        }

        fn hash_bytes(&self, bytes: &[u8]) -> Result<BigUint, HashError> {
            let folded = bytes
                .iter()
                .fold(BigUint::from(17u32), |acc, b| (acc * 257u32 + *b) % &self.prime);
            self.hash(&[folded])
        }

        fn prime(&self) -> &BigUint {
            &self.prime
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bn254_prime_matches_decimal() {
        let expected = BigUint::parse_bytes(
            b"21888242871839275222246405745257275088548364400416034343698204186575808495617",
            10,
        )
        .unwrap();
        assert_eq!(bn254_scalar_prime(), expected);
    }

    #[test]
    fn window_is_balanced() {
        let w = FieldWindow::new(&BigUint::from(11u32));
        assert_eq!(w.max_int(), &BigInt::from(5));
        assert_eq!(w.min_int(), &BigInt::from(-5));
        assert!(w.contains(&BigInt::from(-5)));
        assert!(!w.contains(&BigInt::from(6)));
    }

    #[test]
    fn decode_negative_element() {
        let p = bn254_scalar_prime();
        let fe = &p - 1u32;
        assert_eq!(decode_field_element(&fe, &p), BigInt::from(-1));
        assert_eq!(
            decode_field_element(&BigUint::from(42u32), &p),
            BigInt::from(42)
        );
    }

    #[test]
    fn check_in_field_rejects_prime() {
        let p = bn254_scalar_prime();
        assert!(check_in_field(&p, &p).is_err());
        assert!(check_in_field(&(&p - 1u32), &p).is_ok());
    }
}
