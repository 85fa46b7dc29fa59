use crate::{AttestationData, EthSpec};
use bls::SignatureBytes;
use serde_derive::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::VariableList;
use tree_hash_derive::TreeHash;

/// The real container bounds `attesting_indices` by `MAX_VALIDATORS_PER_COMMITTEE *
/// SLOTS_PER_EPOCH`; this crate only ever builds one from an already-verified `Attestation`'s
/// single committee, so the per-committee bound is sufficient here.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
#[serde(bound = "T: EthSpec")]
pub struct IndexedAttestation<T: EthSpec> {
    pub attesting_indices: VariableList<u64, T::MaxValidatorsPerCommittee>,
    pub data: AttestationData,
    pub signature: SignatureBytes,
}
