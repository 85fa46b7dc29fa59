use crate::DepositData;
use crate::Hash256;
use serde_derive::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::FixedVector;
use tree_hash_derive::TreeHash;
use typenum::U33;

/// `DEPOSIT_CONTRACT_TREE_DEPTH + 1` (§4.D: "the +1 is the list-length mix-in").
pub const DEPOSIT_TREE_DEPTH_WITH_LENGTH_MIXIN: usize = 33;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Deposit {
    pub proof: FixedVector<Hash256, U33>,
    pub data: DepositData,
}
