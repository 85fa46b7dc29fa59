//! Incremental Merkleization of a single `BeaconState` field (§4.A).
//!
//! A [`FieldTrie`] owns a binary Merkle tree over a field's leaf roots. Two things make it
//! different from calling `tree_hash::TreeHash::tree_hash_root()` fresh every time:
//!
//! - [`FieldTrie::recompute`] only re-hashes the ancestors of the leaves that actually changed,
//!   rather than walking the whole tree;
//! - [`FieldTrie::root`] accounts for the field's declared SSZ capacity (`N` in `List[T, N]`)
//!   without ever materializing a tree that wide: the populated region is hashed densely, and the
//!   remaining levels up to `capacity`'s depth are folded in using precomputed zero-subtree
//!   hashes, exactly as `merkle_proof::MerkleTree` does for the deposit tree.
//!
//! `FieldTrie` only ever sees raw 32-byte leaf roots: the conversion from a validator, an
//! `Eth1Data`, or a vote vector into a leaf root is the caller's job (the "field converter" of
//! §4.A). This keeps the tree generic and makes the question "does this element type have a
//! hasher" a compile-time property of the caller rather than a runtime tag match.

use eth2_hashing::hash32_concat;

pub const MAX_DEPTH: usize = 64;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Error {
    /// `changed_indices` referenced a leaf beyond the current length.
    IndexOutOfBounds { index: usize, length: usize },
    /// `elements.len()` exceeded the field's declared SSZ capacity.
    CapacityExceeded { length: usize, capacity: usize },
}

/// Whether the field is a fixed-size SSZ vector (no length mix-in) or a variable-length SSZ list
/// (length is hashed into the root, per the SSZ Merkleization rules).
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum FieldKind {
    FixedVector,
    VariableList,
}

#[derive(Debug, Clone)]
pub struct FieldTrie {
    kind: FieldKind,
    /// log2(capacity), rounded up: the depth a full tree of this field would have.
    capacity_depth: usize,
    capacity: usize,
    /// Zero-subtree roots: `zero_hashes[d]` is the root of an empty subtree of depth `d`.
    zero_hashes: Vec<[u8; 32]>,
    /// Dense layers over the populated prefix of the field, `layers[0]` = leaves.
    layers: Vec<Vec<[u8; 32]>>,
    length: usize,
}

fn depth_of(width: usize) -> usize {
    width.max(1).next_power_of_two().trailing_zeros() as usize
}

fn build_zero_hashes(depth: usize) -> Vec<[u8; 32]> {
    let mut zero_hashes = vec![[0u8; 32]; depth + 1];
    for d in 0..depth {
        zero_hashes[d + 1] = hash32_concat(&zero_hashes[d], &zero_hashes[d]);
    }
    zero_hashes
}

fn build_layers(leaves: &[[u8; 32]], populated_depth: usize, zero: &[[u8; 32]]) -> Vec<Vec<[u8; 32]>> {
    let width = 1usize << populated_depth;
    let mut layer0 = leaves.to_vec();
    layer0.resize(width, zero[0]);

    let mut layers = vec![layer0];
    for d in 0..populated_depth {
        let prev = &layers[d];
        let next = prev
            .chunks(2)
            .map(|pair| hash32_concat(&pair[0], &pair[1]))
            .collect();
        layers.push(next);
    }
    layers
}

fn mix_in_length(root: [u8; 32], length: usize) -> [u8; 32] {
    let mut length_bytes = [0u8; 32];
    length_bytes[0..8].copy_from_slice(&(length as u64).to_le_bytes());
    hash32_concat(&root, &length_bytes)
}

impl FieldTrie {
    /// Builds a trie over `elements` (already converted to 32-byte leaf roots), given the
    /// field's declared SSZ `capacity`.
    pub fn new(kind: FieldKind, elements: &[[u8; 32]], capacity: usize) -> Result<Self, Error> {
        if elements.len() > capacity {
            return Err(Error::CapacityExceeded {
                length: elements.len(),
                capacity,
            });
        }

        let capacity_depth = depth_of(capacity.max(1));
        let zero_hashes = build_zero_hashes(capacity_depth.max(1));
        let populated_depth = depth_of(elements.len().max(1)).min(capacity_depth);
        let layers = build_layers(elements, populated_depth, &zero_hashes);

        Ok(Self {
            kind,
            capacity_depth,
            capacity,
            zero_hashes,
            layers,
            length: elements.len(),
        })
    }

    /// Re-hashes only the ancestors of `changed_indices`. `all_elements` must be the field's
    /// complete, current leaf-root slice: it is consulted for leaves whose index falls outside
    /// the cached populated width only when the tree must grow.
    pub fn recompute(
        &mut self,
        changed_indices: &[usize],
        all_elements: &[[u8; 32]],
    ) -> Result<[u8; 32], Error> {
        if all_elements.len() > self.capacity {
            return Err(Error::CapacityExceeded {
                length: all_elements.len(),
                capacity: self.capacity,
            });
        }
        for &index in changed_indices {
            if index >= all_elements.len() {
                return Err(Error::IndexOutOfBounds {
                    index,
                    length: all_elements.len(),
                });
            }
        }

        let new_populated_depth = depth_of(all_elements.len().max(1)).min(self.capacity_depth);
        let old_populated_depth = self.layers.len().saturating_sub(1);

        if new_populated_depth != old_populated_depth || all_elements.len() < self.length {
            // The populated region grew or shrank past a power-of-two boundary: a full rebuild
            // is cheaper and simpler than patching a resized pyramid.
            self.layers = build_layers(all_elements, new_populated_depth, &self.zero_hashes);
            self.length = all_elements.len();
            return Ok(self.root());
        }

        self.length = all_elements.len();

        let mut dirty: Vec<usize> = changed_indices.to_vec();
        for &index in changed_indices {
            self.layers[0][index] = all_elements[index];
        }
        dirty.sort_unstable();
        dirty.dedup();

        for depth in 0..new_populated_depth {
            let parents: Vec<usize> = dirty.iter().map(|i| i / 2).collect();
            for &parent in &parents {
                let left = &self.layers[depth][2 * parent];
                let right = &self.layers[depth][2 * parent + 1];
                self.layers[depth + 1][parent] = hash32_concat(left, right);
            }
            dirty = parents;
            dirty.sort_unstable();
            dirty.dedup();
        }

        Ok(self.root())
    }

    /// Shallow copy with a fresh value — the caller is expected to hold `FieldTrie` behind an
    /// `Arc` and rely on `Arc::make_mut` for the copy-on-write semantics described in §4.A/§4.B;
    /// this method exists for callers that need an owned snapshot without going through `Arc`.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn root(&self) -> [u8; 32] {
        let populated_depth = self.layers.len() - 1;
        let mut root = self.layers[populated_depth][0];
        for d in populated_depth..self.capacity_depth {
            root = hash32_concat(&root, &self.zero_hashes[d]);
        }

        match self.kind {
            FieldKind::FixedVector => root,
            FieldKind::VariableList => mix_in_length(root, self.length),
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(b: u8) -> [u8; 32] {
        [b; 32]
    }

    #[test]
    fn full_rebuild_matches_incremental_recompute() {
        let elements: Vec<[u8; 32]> = (0..5u8).map(leaf).collect();
        let mut trie = FieldTrie::new(FieldKind::VariableList, &elements, 16).unwrap();
        let baseline_root = trie.root();

        let rebuilt = FieldTrie::new(FieldKind::VariableList, &elements, 16).unwrap();
        assert_eq!(baseline_root, rebuilt.root());

        let mut mutated = elements.clone();
        mutated[2] = leaf(0xff);
        let incremental_root = trie.recompute(&[2], &mutated).unwrap();

        let full_rebuild = FieldTrie::new(FieldKind::VariableList, &mutated, 16).unwrap();
        assert_eq!(incremental_root, full_rebuild.root());
    }

    #[test]
    fn fixed_vector_has_no_length_mix_in() {
        let elements: Vec<[u8; 32]> = (0..8u8).map(leaf).collect();
        let a = FieldTrie::new(FieldKind::FixedVector, &elements, 8).unwrap();
        let b = FieldTrie::new(FieldKind::VariableList, &elements, 8).unwrap();
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn growth_across_a_power_of_two_boundary_is_handled() {
        let elements: Vec<[u8; 32]> = (0..3u8).map(leaf).collect();
        let mut trie = FieldTrie::new(FieldKind::VariableList, &elements, 32).unwrap();

        let mut grown = elements.clone();
        grown.push(leaf(9));
        let root = trie.recompute(&[3], &grown).unwrap();

        let rebuilt = FieldTrie::new(FieldKind::VariableList, &grown, 32).unwrap();
        assert_eq!(root, rebuilt.root());
    }

    #[test]
    fn capacity_exceeded_is_rejected() {
        let elements: Vec<[u8; 32]> = (0..3u8).map(leaf).collect();
        assert_eq!(
            FieldTrie::new(FieldKind::VariableList, &elements, 2),
            Err(Error::CapacityExceeded {
                length: 3,
                capacity: 2
            })
        );
    }

    #[test]
    fn out_of_bounds_index_is_rejected() {
        let elements: Vec<[u8; 32]> = (0..3u8).map(leaf).collect();
        let mut trie = FieldTrie::new(FieldKind::VariableList, &elements, 8).unwrap();
        assert_eq!(
            trie.recompute(&[5], &elements),
            Err(Error::IndexOutOfBounds {
                index: 5,
                length: 3
            })
        );
    }

    #[test]
    fn single_element_tree_has_zero_depth() {
        let elements = vec![leaf(1)];
        let trie = FieldTrie::new(FieldKind::FixedVector, &elements, 1).unwrap();
        assert_eq!(trie.root(), leaf(1));
    }
}
