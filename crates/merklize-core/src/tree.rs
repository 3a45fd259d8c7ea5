//! # Authenticated Tree Contract
//!
//! The merklizer commits entries into any [`MerkleTree`]: a key/value map
//! over field elements with a single root and membership or
//! non-membership proofs. The bundled implementation lives in
//! `merklize-crypto`; callers may supply their own.

use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::value::bigint_decimal;

/// Leaf found at the end of a non-membership path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAux {
    #[serde(with = "biguint_decimal")]
    pub key: BigUint,
    #[serde(with = "biguint_decimal")]
    pub value: BigUint,
}

/// Membership or non-membership proof for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// True when the key is present.
    pub existence: bool,
    /// Sibling hashes from the root downwards.
    #[serde(with = "biguint_decimal_vec")]
    pub siblings: Vec<BigUint>,
    /// For non-membership proofs ending in a different leaf.
    pub node_aux: Option<NodeAux>,
}

impl Proof {
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }
}

/// Key/value store over field elements with a cryptographic root.
pub trait MerkleTree: Send + Sync + fmt::Debug {
    /// Insert a new leaf.
    ///
    /// # Errors
    ///
    /// [`TreeError::EntryIndexAlreadyExists`] for a duplicate key.
    fn insert(&mut self, key: &BigUint, value: &BigUint) -> Result<(), TreeError>;

    /// Proof for `key`, with the stored value when it exists.
    fn generate_proof(&self, key: &BigUint) -> Result<(Proof, Option<BigUint>), TreeError>;

    fn root(&self) -> BigUint;
}

mod biguint_decimal {
    use num_bigint::{BigInt, BigUint};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &BigUint, s: S) -> Result<S::Ok, S::Error> {
        super::bigint_decimal::serialize(&BigInt::from(v.clone()), s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigUint, D::Error> {
        super::bigint_decimal::deserialize(d)?
            .to_biguint()
            .ok_or_else(|| serde::de::Error::custom("negative field element"))
    }
}

mod biguint_decimal_vec {
    use std::str::FromStr;

    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &[BigUint], s: S) -> Result<S::Ok, S::Error> {
        v.iter()
            .map(|x| x.to_str_radix(10))
            .collect::<Vec<_>>()
            .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<BigUint>, D::Error> {
        Vec::<String>::deserialize(d)?
            .iter()
            .map(|raw| BigUint::from_str(raw).map_err(serde::de::Error::custom))
            .collect()
    }
}
