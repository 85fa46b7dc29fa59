use crate::field_converter::LeafRoot;
use crate::Hash256;
use serde_derive::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

#[derive(
    Debug, PartialEq, Clone, Default, Serialize, Deserialize, Encode, Decode, TreeHash,
)]
pub struct Eth1Data {
    pub deposit_root: Hash256,
    pub deposit_count: u64,
    pub block_hash: Hash256,
}

impl LeafRoot for Eth1Data {
    fn leaf_root(&self) -> [u8; 32] {
        self.tree_hash_root().as_slice().try_into().expect("32 bytes")
    }
}
