//! Core SSZ containers and the `BeaconState` type for the phase-0 beacon chain
//! state-transition function. Everything here is pure data plus the incremental Merkleization
//! machinery described alongside `BeaconState` (§3/§4.A/§4.B) — no networking, no storage, no
//! chain-selection logic; those live in `state_processing` and `beacon_chain`.

mod attestation;
mod attestation_data;
mod attester_slashing;
mod beacon_block;
mod beacon_block_body;
mod beacon_block_header;
mod beacon_state;
mod checkpoint;
mod chain_spec;
mod deposit;
mod deposit_data;
mod eth1_data;
mod eth_spec;
mod field_converter;
mod fork;
mod indexed_attestation;
mod pending_attestation;
mod proposer_slashing;
mod slot_epoch;
mod validator;
mod voluntary_exit;

pub mod test_utils;

pub use attestation::Attestation;
pub use attestation_data::AttestationData;
pub use attester_slashing::AttesterSlashing;
pub use beacon_block::{BeaconBlock, SignedBeaconBlock};
pub use beacon_block_body::BeaconBlockBody;
pub use beacon_block_header::{BeaconBlockHeader, SignedBeaconBlockHeader};
pub use beacon_state::{BeaconState, FieldIndex, JUSTIFICATION_BITS_LENGTH};
pub use checkpoint::Checkpoint;
pub use chain_spec::{ChainSpec, Domain};
pub use deposit::{Deposit, DEPOSIT_TREE_DEPTH_WITH_LENGTH_MIXIN};
pub use deposit_data::DepositData;
pub use eth1_data::Eth1Data;
pub use eth_spec::{EthSpec, MainnetEthSpec, MinimalEthSpec};
pub use field_converter::LeafRoot;
pub use fork::Fork;
pub use indexed_attestation::IndexedAttestation;
pub use pending_attestation::PendingAttestation;
pub use proposer_slashing::ProposerSlashing;
pub use slot_epoch::{Epoch, Slot};
pub use validator::Validator;
pub use voluntary_exit::{SignedVoluntaryExit, VoluntaryExit};

pub use bls::{PublicKeyBytes, SignatureBytes};
pub use beacon_state::Error as BeaconStateError;

pub type Hash256 = ethereum_types::H256;
