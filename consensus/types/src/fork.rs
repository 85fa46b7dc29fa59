use crate::field_converter::LeafRoot;
use crate::Epoch;
use serde_derive::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

#[derive(
    Debug, PartialEq, Clone, Default, Serialize, Deserialize, Encode, Decode, TreeHash,
)]
pub struct Fork {
    pub previous_version: [u8; 4],
    pub current_version: [u8; 4],
    pub epoch: Epoch,
}

impl LeafRoot for Fork {
    fn leaf_root(&self) -> [u8; 32] {
        self.tree_hash_root().as_slice().try_into().expect("32 bytes")
    }
}
