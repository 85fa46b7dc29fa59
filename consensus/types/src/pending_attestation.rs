use crate::field_converter::LeafRoot;
use crate::{AttestationData, EthSpec, Slot};
use serde_derive::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::BitList;
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
#[serde(bound = "T: EthSpec")]
pub struct PendingAttestation<T: EthSpec> {
    pub aggregation_bits: BitList<T::MaxValidatorsPerCommittee>,
    pub data: AttestationData,
    pub inclusion_delay: Slot,
    pub proposer_index: u64,
}

impl<T: EthSpec> LeafRoot for PendingAttestation<T> {
    fn leaf_root(&self) -> [u8; 32] {
        self.tree_hash_root().as_slice().try_into().expect("32 bytes")
    }
}
