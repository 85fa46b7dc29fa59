//! The field converter of §4.A: `field_trie::FieldTrie` only ever stores raw 32-byte leaf roots,
//! so every element type that can live inside a `BeaconState` list/vector implements
//! [`LeafRoot`] to say how it becomes one. For composite types this is just their SSZ
//! hash-tree-root; for `Hash256` it's the value itself.

use crate::{Epoch, Hash256, Slot};
use ssz_types::BitVector;
use tree_hash::TreeHash;
use typenum::Unsigned;

pub trait LeafRoot {
    fn leaf_root(&self) -> [u8; 32];
}

impl LeafRoot for Hash256 {
    fn leaf_root(&self) -> [u8; 32] {
        self.to_fixed_bytes()
    }
}

impl LeafRoot for u64 {
    fn leaf_root(&self) -> [u8; 32] {
        self.tree_hash_root()
            .as_slice()
            .try_into()
            .expect("u64 tree_hash_root is 32 bytes")
    }
}

impl LeafRoot for Slot {
    fn leaf_root(&self) -> [u8; 32] {
        self.as_u64().leaf_root()
    }
}

impl LeafRoot for Epoch {
    fn leaf_root(&self) -> [u8; 32] {
        self.as_u64().leaf_root()
    }
}

impl<N: Unsigned> LeafRoot for BitVector<N> {
    fn leaf_root(&self) -> [u8; 32] {
        self.tree_hash_root()
            .as_slice()
            .try_into()
            .expect("32 bytes")
    }
}

/// Converts a slice of leaf-convertible elements into the raw roots `FieldTrie` consumes.
pub fn leaf_roots<T: LeafRoot>(elements: &[T]) -> Vec<[u8; 32]> {
    elements.iter().map(LeafRoot::leaf_root).collect()
}
