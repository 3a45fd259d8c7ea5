//! # Sparse Merkle Tree
//!
//! Binary tree keyed by field elements, with compact leaves: a leaf sits at
//! the shallowest level where its key prefix is unique, and empty subtrees
//! hash to zero.
//!
//! ## Algorithm
//!
//! - Leaf: `H(key, value, 1)`.
//! - Middle: `H(left, right)`.
//! - Empty: `0`.
//! - The path of a key is its bits, least-significant first; bit `i`
//!   selects the right child at level `i`.
//!
//! Inserting a key whose path collides with an existing leaf pushes both
//! leaves down until their paths diverge. Two keys sharing more than
//! `max_levels - 1` low bits cannot both be stored.
//!
//! ## Proofs
//!
//! [`Proof::siblings`] lists the sibling hash at every level from the root
//! to the terminal node. A non-membership proof ends either in an empty
//! slot or in a different leaf, reported as `node_aux`. [`verify_proof`]
//! recomputes the root from either form.
//!
//! The root does not depend on insertion order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::Zero;

use merklize_core::error::{HashError, TreeError};
use merklize_core::field::{check_in_field, Hasher};
use merklize_core::tree::{MerkleTree, NodeAux, Proof};

/// Default depth of merklization trees.
pub const DEFAULT_MT_LEVELS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Leaf { key: BigUint, value: BigUint },
    Middle { left: BigUint, right: BigUint },
}

// ---------------------------------------------------------------------------
// Node hashing
// ---------------------------------------------------------------------------

fn leaf_hash(hasher: &dyn Hasher, key: &BigUint, value: &BigUint) -> Result<BigUint, HashError> {
    hasher.hash(&[key.clone(), value.clone(), BigUint::from(1u8)])
}

fn middle_hash(
    hasher: &dyn Hasher,
    left: &BigUint,
    right: &BigUint,
) -> Result<BigUint, HashError> {
    hasher.hash(&[left.clone(), right.clone()])
}

fn path_bit(key: &BigUint, level: usize) -> bool {
    key.bit(level as u64)
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// In-memory sparse Merkle tree.
pub struct SparseMerkleTree {
    hasher: Arc<dyn Hasher>,
    max_levels: usize,
    root: BigUint,
    nodes: HashMap<BigUint, Node>,
    leaves: usize,
}

impl fmt::Debug for SparseMerkleTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseMerkleTree")
            .field("max_levels", &self.max_levels)
            .field("root", &self.root)
            .field("leaves", &self.leaves)
            .finish()
    }
}

impl SparseMerkleTree {
    pub fn new(hasher: Arc<dyn Hasher>, max_levels: usize) -> Self {
        Self {
            hasher,
            max_levels,
            root: BigUint::zero(),
            nodes: HashMap::new(),
            leaves: 0,
        }
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    /// Number of stored leaves.
    pub fn len(&self) -> usize {
        self.leaves
    }

    pub fn is_empty(&self) -> bool {
        self.leaves == 0
    }

    fn node(&self, hash: &BigUint) -> Result<Option<&Node>, TreeError> {
        if hash.is_zero() {
            return Ok(None);
        }
        self.nodes
            .get(hash)
            .map(Some)
            .ok_or_else(|| TreeError::NodeNotFound(hash.clone()))
    }

    fn store(&mut self, node: Node) -> Result<BigUint, TreeError> {
        let hash = match &node {
            Node::Leaf { key, value } => leaf_hash(self.hasher.as_ref(), key, value)?,
            Node::Middle { left, right } => middle_hash(self.hasher.as_ref(), left, right)?,
        };
        self.nodes.insert(hash.clone(), node);
        Ok(hash)
    }

    fn add_leaf(
        &mut self,
        key: &BigUint,
        value: &BigUint,
        current: &BigUint,
        level: usize,
    ) -> Result<BigUint, TreeError> {
        if level >= self.max_levels {
            return Err(TreeError::ReachedMaxLevel(self.max_levels));
        }
        match self.node(current)?.cloned() {
            None => self.store(Node::Leaf {
                key: key.clone(),
                value: value.clone(),
            }),
            Some(Node::Leaf {
                key: old_key,
                value: old_value,
            }) => {
                if &old_key == key {
                    return Err(TreeError::EntryIndexAlreadyExists);
                }
                self.push_leaf(key, value, &old_key, &old_value, level)
            }
            Some(Node::Middle { left, right }) => {
                let node = if path_bit(key, level) {
                    let right = self.add_leaf(key, value, &right, level + 1)?;
                    Node::Middle { left, right }
                } else {
                    let left = self.add_leaf(key, value, &left, level + 1)?;
                    Node::Middle { left, right }
                };
                self.store(node)
            }
        }
    }

    /// Push a new leaf and an existing leaf down until their paths diverge.
    fn push_leaf(
        &mut self,
        key: &BigUint,
        value: &BigUint,
        old_key: &BigUint,
        old_value: &BigUint,
        level: usize,
    ) -> Result<BigUint, TreeError> {
        if level + 1 >= self.max_levels {
            return Err(TreeError::ReachedMaxLevel(self.max_levels));
        }
        let new_bit = path_bit(key, level);
        if new_bit == path_bit(old_key, level) {
            let next = self.push_leaf(key, value, old_key, old_value, level + 1)?;
            let node = if new_bit {
                Node::Middle {
                    left: BigUint::zero(),
                    right: next,
                }
            } else {
                Node::Middle {
                    left: next,
                    right: BigUint::zero(),
                }
            };
            return self.store(node);
        }
        let new_leaf = self.store(Node::Leaf {
            key: key.clone(),
            value: value.clone(),
        })?;
        let old_leaf = leaf_hash(self.hasher.as_ref(), old_key, old_value)?;
        let node = if new_bit {
            Node::Middle {
                left: old_leaf,
                right: new_leaf,
            }
        } else {
            Node::Middle {
                left: new_leaf,
                right: old_leaf,
            }
        };
        self.store(node)
    }

    /// Stored value for `key`, if any.
    pub fn get(&self, key: &BigUint) -> Result<Option<BigUint>, TreeError> {
        self.generate_proof(key).map(|(_, v)| v)
    }
}

impl MerkleTree for SparseMerkleTree {
    fn insert(&mut self, key: &BigUint, value: &BigUint) -> Result<(), TreeError> {
        check_in_field(key, self.hasher.prime())?;
        check_in_field(value, self.hasher.prime())?;
        let root = self.root.clone();
        self.root = self.add_leaf(key, value, &root, 0)?;
        self.leaves += 1;
        Ok(())
    }

    fn generate_proof(&self, key: &BigUint) -> Result<(Proof, Option<BigUint>), TreeError> {
        let mut siblings = Vec::new();
        let mut next = self.root.clone();
        for level in 0..self.max_levels {
            match self.node(&next)? {
                None => {
                    let proof = Proof {
                        existence: false,
                        siblings,
                        node_aux: None,
                    };
                    return Ok((proof, None));
                }
                Some(Node::Leaf {
                    key: leaf_key,
                    value,
                }) => {
                    if leaf_key == key {
                        let proof = Proof {
                            existence: true,
                            siblings,
                            node_aux: None,
                        };
                        return Ok((proof, Some(value.clone())));
                    }
                    let proof = Proof {
                        existence: false,
                        siblings,
                        node_aux: Some(NodeAux {
                            key: leaf_key.clone(),
                            value: value.clone(),
                        }),
                    };
                    return Ok((proof, None));
                }
                Some(Node::Middle { left, right }) => {
                    if path_bit(key, level) {
                        siblings.push(left.clone());
                        next = right.clone();
                    } else {
                        siblings.push(right.clone());
                        next = left.clone();
                    }
                }
            }
        }
        Err(TreeError::ReachedMaxLevel(self.max_levels))
    }

    fn root(&self) -> BigUint {
        self.root.clone()
    }
}

/// Root implied by `proof` for `(key, value)`.
///
/// For non-membership proofs `value` is ignored.
pub fn root_from_proof(
    hasher: &dyn Hasher,
    proof: &Proof,
    key: &BigUint,
    value: &BigUint,
) -> Result<BigUint, TreeError> {
    let mut current = if proof.existence {
        leaf_hash(hasher, key, value)?
    } else if let Some(aux) = &proof.node_aux {
        leaf_hash(hasher, &aux.key, &aux.value)?
    } else {
        BigUint::zero()
    };
    for (level, sibling) in proof.siblings.iter().enumerate().rev() {
        current = if path_bit(key, level) {
            middle_hash(hasher, sibling, &current)?
        } else {
            middle_hash(hasher, &current, sibling)?
        };
    }
    Ok(current)
}

/// Check `proof` against `root`.
///
/// A non-membership proof whose auxiliary leaf carries `key` itself is
/// rejected, as is an auxiliary leaf whose path does not match the proof
/// position.
pub fn verify_proof(
    hasher: &dyn Hasher,
    root: &BigUint,
    proof: &Proof,
    key: &BigUint,
    value: &BigUint,
) -> Result<bool, TreeError> {
    if let Some(aux) = &proof.node_aux {
        if proof.existence || &aux.key == key {
            return Ok(false);
        }
        let depth = proof.siblings.len();
        if (0..depth).any(|level| path_bit(&aux.key, level) != path_bit(key, level)) {
            return Ok(false);
        }
    }
    Ok(&root_from_proof(hasher, proof, key, value)? == root)
}
