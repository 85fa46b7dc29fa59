//! A depth-indexed, incrementally-extendable binary Merkle tree plus branch verification, used
//! to check the deposit contract's Merkle proof against `eth1_data.deposit_root` (§4.D).
//!
//! Zero-value subtrees at every depth are memoized once in [`ZERO_HASHES`] rather than recomputed
//! per proof: the deposit tree is mostly empty padding out to `DEPOSIT_CONTRACT_TREE_DEPTH`.

use eth2_hashing::hash32_concat;
use ethereum_types::H256;
use lazy_static::lazy_static;
use safe_arith::{ArithError, SafeArith};

const MAX_TREE_DEPTH: usize = 32;

lazy_static! {
    static ref ZERO_HASHES: Vec<H256> = {
        let mut hashes = vec![H256::zero(); MAX_TREE_DEPTH + 1];
        for i in 0..MAX_TREE_DEPTH {
            hashes[i + 1] = H256::from_slice(&hash32_concat(hashes[i].as_bytes(), hashes[i].as_bytes()));
        }
        hashes
    };
}

#[derive(Debug, PartialEq, Clone)]
pub enum MerkleTreeError {
    // Tree is too deep to insert a leaf at the given index.
    DepthTooSmall,
    // The tree is full: no more leaves can be added at this depth.
    MerkleTreeFull,
    Arith(ArithError),
}

impl From<ArithError> for MerkleTreeError {
    fn from(e: ArithError) -> Self {
        MerkleTreeError::Arith(e)
    }
}

/// A binary Merkle tree that can be built leaf-by-leaf (as deposits arrive) and queried for
/// inclusion proofs at any depth.
#[derive(Debug, PartialEq, Clone)]
pub enum MerkleTree {
    Leaf(H256),
    Node(H256, Box<MerkleTree>, Box<MerkleTree>),
    /// A zero subtree of the given depth, never populated.
    Zero(usize),
}

impl MerkleTree {
    pub fn create(leaves: &[H256], depth: usize) -> Self {
        if leaves.is_empty() {
            return MerkleTree::Zero(depth);
        }

        match depth {
            0 => {
                debug_assert_eq!(leaves.len(), 1);
                MerkleTree::Leaf(leaves[0])
            }
            _ => {
                let subtree_capacity = 1 << (depth - 1);
                let (left_leaves, right_leaves) = if leaves.len() <= subtree_capacity {
                    (leaves, &[][..])
                } else {
                    leaves.split_at(subtree_capacity)
                };
                let left = MerkleTree::create(left_leaves, depth - 1);
                let right = MerkleTree::create(right_leaves, depth - 1);
                let hash = hash32_concat(left.hash().as_bytes(), right.hash().as_bytes());
                MerkleTree::Node(H256::from_slice(&hash), Box::new(left), Box::new(right))
            }
        }
    }

    pub fn hash(&self) -> H256 {
        match *self {
            MerkleTree::Leaf(h) => h,
            MerkleTree::Node(h, _, _) => h,
            MerkleTree::Zero(depth) => ZERO_HASHES[depth],
        }
    }

    /// Push a new leaf, extending the tree to the right. Mirrors the deposit contract's
    /// incremental Merkle tree update.
    pub fn push_leaf(&mut self, leaf: H256, depth: usize) -> Result<(), MerkleTreeError> {
        if depth == 0 {
            return Err(MerkleTreeError::DepthTooSmall);
        }

        match self {
            MerkleTree::Leaf(_) => return Err(MerkleTreeError::MerkleTreeFull),
            MerkleTree::Zero(_) => {
                *self = MerkleTree::create(&[leaf], depth);
            }
            MerkleTree::Node(_, left, right) => {
                let left_subtree_capacity = 1usize.safe_shl((depth - 1) as u32)?;
                let left_is_full = matches!(**left, MerkleTree::Leaf(_))
                    || count_populated(left) >= left_subtree_capacity;

                if !left_is_full {
                    left.push_leaf(leaf, depth - 1)?;
                } else if count_populated(right) < left_subtree_capacity {
                    right.push_leaf(leaf, depth - 1)?;
                } else {
                    return Err(MerkleTreeError::MerkleTreeFull);
                }

                let hash = hash32_concat(left.hash().as_bytes(), right.hash().as_bytes());
                *self = MerkleTree::Node(H256::from_slice(&hash), left.clone(), right.clone());
            }
        }
        Ok(())
    }

    /// Returns `(leaf, branch)` for the `index`-th leaf, usable with [`verify_merkle_proof`].
    pub fn generate_proof(&self, index: usize, depth: usize) -> (H256, Vec<H256>) {
        let mut branch = vec![];
        let mut node = self;
        let mut remaining_depth = depth;
        while remaining_depth > 0 {
            let ith_bit = (index >> (remaining_depth - 1)) & 0x01;
            match node {
                MerkleTree::Node(_, left, right) => {
                    if ith_bit == 1 {
                        branch.push(left.hash());
                        node = right;
                    } else {
                        branch.push(right.hash());
                        node = left;
                    }
                    remaining_depth -= 1;
                }
                MerkleTree::Leaf(_) => unreachable!("leaf reached before requested depth"),
                MerkleTree::Zero(_) => {
                    // The remainder of the path lies inside an unpopulated subtree: every
                    // sibling from here down is a zero-hash of the matching depth.
                    for d in (0..remaining_depth).rev() {
                        branch.push(ZERO_HASHES[d]);
                    }
                    remaining_depth = 0;
                }
            }
        }
        branch.reverse();
        let leaf = if let MerkleTree::Zero(_) = node {
            ZERO_HASHES[0]
        } else {
            node.hash()
        };
        (leaf, branch)
    }
}

fn count_populated(tree: &MerkleTree) -> usize {
    match tree {
        MerkleTree::Leaf(_) => 1,
        MerkleTree::Zero(_) => 0,
        MerkleTree::Node(_, left, right) => count_populated(left) + count_populated(right),
    }
}

/// Verifies a Merkle `branch` against `root`, where `leaf` is claimed to be the `index`-th leaf
/// of a depth-`depth` tree. Used for `DEPOSIT_CONTRACT_TREE_DEPTH + 1` deposit proofs, where the
/// extra level mixes in the deposit count per the SSZ list convention.
pub fn verify_merkle_proof(
    leaf: H256,
    branch: &[H256],
    depth: usize,
    index: usize,
    root: H256,
) -> bool {
    if branch.len() != depth {
        return false;
    }
    merkle_root_from_branch(leaf, branch, depth, index) == root
}

fn merkle_root_from_branch(leaf: H256, branch: &[H256], depth: usize, index: usize) -> H256 {
    let mut merkle_root = leaf.as_bytes().to_vec();

    for (i, leaf) in branch.iter().enumerate().take(depth) {
        let ith_bit = (index >> i) & 0x01;
        if ith_bit == 1 {
            merkle_root = hash32_concat(leaf.as_bytes(), &merkle_root);
        } else {
            let mut input = merkle_root;
            input.extend_from_slice(leaf.as_bytes());
            merkle_root = eth2_hashing::hash(&input);
        }
    }

    H256::from_slice(&merkle_root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_zero_tree_hash_matches_zero_hashes_table() {
        let tree = MerkleTree::create(&[], 5);
        assert_eq!(tree.hash(), ZERO_HASHES[5]);
    }

    #[test]
    fn round_trip_proof_verifies() {
        let depth = 4;
        let leaves: Vec<H256> = (0..8u8).map(|i| H256::repeat_byte(i)).collect();
        let tree = MerkleTree::create(&leaves, depth);

        for (i, leaf) in leaves.iter().enumerate() {
            let (proof_leaf, branch) = tree.generate_proof(i, depth);
            assert_eq!(proof_leaf, *leaf);
            assert!(verify_merkle_proof(*leaf, &branch, depth, i, tree.hash()));
        }
    }

    #[test]
    fn tampered_leaf_fails_verification() {
        let depth = 3;
        let leaves: Vec<H256> = (0..4u8).map(|i| H256::repeat_byte(i)).collect();
        let tree = MerkleTree::create(&leaves, depth);
        let (_, branch) = tree.generate_proof(1, depth);

        assert!(!verify_merkle_proof(
            H256::repeat_byte(0xff),
            &branch,
            depth,
            1,
            tree.hash()
        ));
    }

    #[test]
    fn incremental_push_matches_bulk_create() {
        let depth = 5;
        let leaves: Vec<H256> = (0..5u8).map(|i| H256::repeat_byte(i)).collect();

        let mut incremental = MerkleTree::create(&[], depth);
        for leaf in &leaves {
            incremental.push_leaf(*leaf, depth).unwrap();
        }

        let bulk = MerkleTree::create(&leaves, depth);
        assert_eq!(incremental.hash(), bulk.hash());
    }
}
