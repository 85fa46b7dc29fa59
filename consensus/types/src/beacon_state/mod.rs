//! The beacon chain's state container (§3 DATA MODEL, §4.B). `BeaconState` owns its 21 fields in
//! the fixed order the SSZ container defines them, a dirty-field set, a per-field incremental
//! Merkle trie for every list/vector field, and a validator pubkey → index map — all the pieces
//! §3's "Lifecycle"/"Ownership" paragraphs describe.

mod pubkey_cache;
mod tree_hash_cache;

pub use pubkey_cache::PubkeyCache;
pub use tree_hash_cache::FieldIndex;
use tree_hash_cache::{BeaconTreeHashCache, Dirty};

use crate::{
    BeaconBlockHeader, Checkpoint, Epoch, Eth1Data, EthSpec, Fork, Hash256, PendingAttestation,
    Slot, Validator,
};
use serde_derive::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{BitVector, FixedVector, VariableList};
use typenum::{Unsigned, U4};

pub const JUSTIFICATION_BITS_LENGTH: usize = 4;

#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    ValidatorsAndBalancesLengthMismatch { validators: usize, balances: usize },
    UnknownValidator(usize),
    FieldTrie(field_trie::Error),
    EpochOutOfBounds,
    InsufficientValidators,
}

impl From<field_trie::Error> for Error {
    fn from(e: field_trie::Error) -> Self {
        Error::FieldTrie(e)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
#[serde(bound = "T: EthSpec")]
pub struct BeaconState<T: EthSpec> {
    // --- field index 0..=20, order load-bearing: it is the SSZ container's field order and the
    // order `canonical_root` folds field roots into the top-level hash. ---
    pub genesis_time: u64,
    pub genesis_validators_root: Hash256,
    pub slot: Slot,
    pub fork: Fork,
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: FixedVector<Hash256, T::SlotsPerHistoricalRoot>,
    pub state_roots: FixedVector<Hash256, T::SlotsPerHistoricalRoot>,
    pub historical_roots: VariableList<Hash256, T::HistoricalRootsLimit>,
    pub eth1_data: Eth1Data,
    pub eth1_data_votes: VariableList<Eth1Data, T::Eth1DataVotesLength>,
    pub eth1_deposit_index: u64,
    pub validators: VariableList<Validator, T::ValidatorRegistryLimit>,
    pub balances: VariableList<u64, T::ValidatorRegistryLimit>,
    pub randao_mixes: FixedVector<Hash256, T::EpochsPerHistoricalVector>,
    pub slashings: FixedVector<u64, T::SlashingsVectorLength>,
    pub previous_epoch_attestations:
        VariableList<PendingAttestation<T>, T::PreviousEpochAttestationsLimit>,
    pub current_epoch_attestations:
        VariableList<PendingAttestation<T>, T::CurrentEpochAttestationsLimit>,
    pub justification_bits: BitVector<U4>,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,

    // --- everything below is cache: never serialized, always reconstructible from the fields
    // above, and exactly the state §3 says the container carries alongside its data. ---
    #[ssz(skip_serializing, skip_deserializing)]
    #[serde(skip)]
    tree_hash_cache: BeaconTreeHashCache,
    #[ssz(skip_serializing, skip_deserializing)]
    #[serde(skip)]
    pubkey_cache: PubkeyCache,
}

/// Two states are equal if their data fields agree; cache state (dirty sets, trie layers,
/// pubkey index) is derivable from the data and never affects logical equality.
impl<T: EthSpec> PartialEq for BeaconState<T> {
    fn eq(&self, other: &Self) -> bool {
        self.genesis_time == other.genesis_time
            && self.genesis_validators_root == other.genesis_validators_root
            && self.slot == other.slot
            && self.fork == other.fork
            && self.latest_block_header == other.latest_block_header
            && self.block_roots == other.block_roots
            && self.state_roots == other.state_roots
            && self.historical_roots == other.historical_roots
            && self.eth1_data == other.eth1_data
            && self.eth1_data_votes == other.eth1_data_votes
            && self.eth1_deposit_index == other.eth1_deposit_index
            && self.validators == other.validators
            && self.balances == other.balances
            && self.randao_mixes == other.randao_mixes
            && self.slashings == other.slashings
            && self.previous_epoch_attestations == other.previous_epoch_attestations
            && self.current_epoch_attestations == other.current_epoch_attestations
            && self.justification_bits == other.justification_bits
            && self.previous_justified_checkpoint == other.previous_justified_checkpoint
            && self.current_justified_checkpoint == other.current_justified_checkpoint
            && self.finalized_checkpoint == other.finalized_checkpoint
    }
}

impl<T: EthSpec> BeaconState<T> {
    /// A state with every field at its zero value. Callers build genesis states by constructing
    /// one of these and then writing real values in, which is why every field is `pub`.
    pub fn empty(genesis_time: u64, eth1_data: Eth1Data, spec: &crate::ChainSpec) -> Self {
        let validators = VariableList::from(Vec::new());
        let balances = VariableList::from(Vec::new());
        Self {
            genesis_time,
            genesis_validators_root: Hash256::zero(),
            slot: Slot::new(0),
            fork: Fork {
                previous_version: spec.genesis_fork_version,
                current_version: spec.genesis_fork_version,
                epoch: Epoch::new(0),
            },
            latest_block_header: BeaconBlockHeader::default(),
            block_roots: FixedVector::from(vec![Hash256::zero(); T::SlotsPerHistoricalRoot::to_usize()]),
            state_roots: FixedVector::from(vec![Hash256::zero(); T::SlotsPerHistoricalRoot::to_usize()]),
            historical_roots: VariableList::from(Vec::new()),
            eth1_data,
            eth1_data_votes: VariableList::from(Vec::new()),
            eth1_deposit_index: 0,
            validators,
            balances,
            randao_mixes: FixedVector::from(vec![
                Hash256::zero();
                T::EpochsPerHistoricalVector::to_usize()
            ]),
            slashings: FixedVector::from(vec![0; T::SlashingsVectorLength::to_usize()]),
            previous_epoch_attestations: VariableList::from(Vec::new()),
            current_epoch_attestations: VariableList::from(Vec::new()),
            justification_bits: BitVector::new(),
            previous_justified_checkpoint: Checkpoint::default(),
            current_justified_checkpoint: Checkpoint::default(),
            finalized_checkpoint: Checkpoint::default(),
            tree_hash_cache: BeaconTreeHashCache::default(),
            pubkey_cache: PubkeyCache::default(),
        }
    }

    pub fn current_epoch(&self) -> Epoch {
        self.slot.epoch::<T>()
    }

    pub fn previous_epoch(&self) -> Epoch {
        let current = self.current_epoch();
        if current.as_u64() == 0 {
            current
        } else {
            Epoch::new(current.as_u64() - 1)
        }
    }

    /// Cheap clone: `Arc`-backed field tries are reference-counted, so cloning a state only bumps
    /// refcounts rather than re-hashing anything (§3 "Lifecycle": "cloned... share trie layers
    /// with refcount bump"). `#[derive(Clone)]` already gives us this once the cache fields hold
    /// `Arc`s internally (see [`tree_hash_cache`]); this method exists purely for call-site
    /// clarity at clone points that matter (pre-mutation snapshots, skip-slot cache inserts).
    pub fn clone_with_shared_caches(&self) -> Self {
        self.clone()
    }

    // ---- dirty tracking -------------------------------------------------------------------

    pub fn mark_field_dirty(&mut self, field: FieldIndex) {
        self.tree_hash_cache.mark_dirty(field);
    }

    fn mark_index_dirty(&mut self, field: FieldIndex, index: usize) {
        self.tree_hash_cache.mark_index_dirty(field, index);
    }

    // ---- field mutators (route through dirty tracking, §4.B point 2) ----------------------

    pub fn set_slot(&mut self, slot: Slot) {
        self.slot = slot;
        self.mark_field_dirty(FieldIndex::Slot);
    }

    pub fn set_fork(&mut self, fork: Fork) {
        self.fork = fork;
        self.mark_field_dirty(FieldIndex::Fork);
    }

    pub fn set_latest_block_header(&mut self, header: BeaconBlockHeader) {
        self.latest_block_header = header;
        self.mark_field_dirty(FieldIndex::LatestBlockHeader);
    }

    pub fn set_eth1_data(&mut self, eth1_data: Eth1Data) {
        self.eth1_data = eth1_data;
        self.mark_field_dirty(FieldIndex::Eth1Data);
    }

    pub fn set_eth1_deposit_index(&mut self, index: u64) {
        self.eth1_deposit_index = index;
        self.mark_field_dirty(FieldIndex::Eth1DepositIndex);
    }

    pub fn set_justification_bits(&mut self, bits: BitVector<U4>) {
        self.justification_bits = bits;
        self.mark_field_dirty(FieldIndex::JustificationBits);
    }

    pub fn set_previous_justified_checkpoint(&mut self, checkpoint: Checkpoint) {
        self.previous_justified_checkpoint = checkpoint;
        self.mark_field_dirty(FieldIndex::PreviousJustifiedCheckpoint);
    }

    pub fn set_current_justified_checkpoint(&mut self, checkpoint: Checkpoint) {
        self.current_justified_checkpoint = checkpoint;
        self.mark_field_dirty(FieldIndex::CurrentJustifiedCheckpoint);
    }

    pub fn set_finalized_checkpoint(&mut self, checkpoint: Checkpoint) {
        self.finalized_checkpoint = checkpoint;
        self.mark_field_dirty(FieldIndex::FinalizedCheckpoint);
    }

    pub fn set_block_root(&mut self, slot: Slot, root: Hash256) -> Result<(), Error> {
        let index = slot.as_usize() % T::slots_per_historical_root();
        self.block_roots[index] = root;
        self.mark_index_dirty(FieldIndex::BlockRoots, index);
        Ok(())
    }

    pub fn set_state_root(&mut self, slot: Slot, root: Hash256) -> Result<(), Error> {
        let index = slot.as_usize() % T::slots_per_historical_root();
        self.state_roots[index] = root;
        self.mark_index_dirty(FieldIndex::StateRoots, index);
        Ok(())
    }

    pub fn set_randao_mix(&mut self, epoch: Epoch, mix: Hash256) {
        let index = epoch.as_usize() % T::epochs_per_historical_vector();
        self.randao_mixes[index] = mix;
        self.mark_index_dirty(FieldIndex::RandaoMixes, index);
    }

    pub fn get_randao_mix(&self, epoch: Epoch) -> Hash256 {
        let index = epoch.as_usize() % T::epochs_per_historical_vector();
        self.randao_mixes[index]
    }

    pub fn set_slashings(&mut self, epoch: Epoch, value: u64) {
        let index = epoch.as_usize() % self.slashings.len();
        self.slashings[index] = value;
        self.mark_index_dirty(FieldIndex::Slashings, index);
    }

    pub fn push_historical_root(&mut self, root: Hash256) -> Result<(), Error> {
        let index = self.historical_roots.len();
        self.historical_roots
            .push(root)
            .map_err(|_| Error::FieldTrie(field_trie::Error::CapacityExceeded {
                length: index + 1,
                capacity: T::HistoricalRootsLimit::to_usize(),
            }))?;
        self.mark_index_dirty(FieldIndex::HistoricalRoots, index);
        Ok(())
    }

    pub fn push_eth1_data_vote(&mut self, vote: Eth1Data) -> Result<(), Error> {
        let index = self.eth1_data_votes.len();
        self.eth1_data_votes
            .push(vote)
            .map_err(|_| Error::FieldTrie(field_trie::Error::CapacityExceeded {
                length: index + 1,
                capacity: T::Eth1DataVotesLength::to_usize(),
            }))?;
        self.mark_index_dirty(FieldIndex::Eth1DataVotes, index);
        Ok(())
    }

    pub fn clear_eth1_data_votes(&mut self) {
        self.eth1_data_votes = VariableList::from(Vec::new());
        self.mark_field_dirty(FieldIndex::Eth1DataVotes);
    }

    pub fn push_previous_epoch_attestation(
        &mut self,
        attestation: PendingAttestation<T>,
    ) -> Result<(), Error> {
        let index = self.previous_epoch_attestations.len();
        self.previous_epoch_attestations
            .push(attestation)
            .map_err(|_| {
                Error::FieldTrie(field_trie::Error::CapacityExceeded {
                    length: index + 1,
                    capacity: T::PreviousEpochAttestationsLimit::to_usize(),
                })
            })?;
        self.mark_index_dirty(FieldIndex::PreviousEpochAttestations, index);
        Ok(())
    }

    pub fn push_current_epoch_attestation(
        &mut self,
        attestation: PendingAttestation<T>,
    ) -> Result<(), Error> {
        let index = self.current_epoch_attestations.len();
        self.current_epoch_attestations
            .push(attestation)
            .map_err(|_| {
                Error::FieldTrie(field_trie::Error::CapacityExceeded {
                    length: index + 1,
                    capacity: T::CurrentEpochAttestationsLimit::to_usize(),
                })
            })?;
        self.mark_index_dirty(FieldIndex::CurrentEpochAttestations, index);
        Ok(())
    }

    /// Rotates `current_epoch_attestations` into `previous_epoch_attestations` and empties the
    /// current list, the per-epoch housekeeping `process_epoch` performs (§4.F).
    pub fn rotate_epoch_attestations(&mut self) {
        self.previous_epoch_attestations = std::mem::replace(
            &mut self.current_epoch_attestations,
            VariableList::from(Vec::new()),
        )
        .into();
        self.mark_field_dirty(FieldIndex::PreviousEpochAttestations);
        self.mark_field_dirty(FieldIndex::CurrentEpochAttestations);
    }

    /// Per-validator mutation: §4.B "records the index into a per-field dirty index set."
    pub fn update_validator_at_index(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut Validator),
    ) -> Result<(), Error> {
        let validator = self
            .validators
            .get_mut(index)
            .ok_or(Error::UnknownValidator(index))?;
        f(validator);
        self.mark_index_dirty(FieldIndex::Validators, index);
        Ok(())
    }

    pub fn set_balance(&mut self, index: usize, balance: u64) -> Result<(), Error> {
        let slot = self
            .balances
            .get_mut(index)
            .ok_or(Error::UnknownValidator(index))?;
        *slot = balance;
        self.mark_index_dirty(FieldIndex::Balances, index);
        Ok(())
    }

    pub fn get_balance(&self, index: usize) -> Option<u64> {
        self.balances.get(index).copied()
    }

    /// Appends a new validator and its balance (the deposit effect, §4.D), keeping the
    /// `len(validators) == len(balances)` invariant (§3) and the pubkey index in sync.
    pub fn push_validator(&mut self, validator: Validator, balance: u64) -> Result<usize, Error> {
        let index = self.validators.len();
        self.pubkey_cache.insert(validator.pubkey.clone(), index);
        self.validators
            .push(validator)
            .map_err(|_| Error::FieldTrie(field_trie::Error::CapacityExceeded {
                length: index + 1,
                capacity: T::ValidatorRegistryLimit::to_usize(),
            }))?;
        self.balances
            .push(balance)
            .map_err(|_| Error::FieldTrie(field_trie::Error::CapacityExceeded {
                length: index + 1,
                capacity: T::ValidatorRegistryLimit::to_usize(),
            }))?;
        self.mark_index_dirty(FieldIndex::Validators, index);
        self.mark_index_dirty(FieldIndex::Balances, index);
        Ok(index)
    }

    /// Rebuilds the pubkey → index map from `validators` from scratch. Needed after decoding a
    /// state from storage, since the map itself is never serialized (§3: it "shares its lifetime"
    /// with `validators`, but not its wire representation).
    pub fn rebuild_pubkey_cache(&mut self) {
        self.pubkey_cache.rebuild(self.validators.iter());
    }

    pub fn get_validator_index(&self, pubkey: &bls::PublicKeyBytes) -> Option<usize> {
        self.pubkey_cache.get(pubkey)
    }

    pub fn active_validator_indices(&self, epoch: Epoch) -> Vec<usize> {
        self.validators
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_active_at(epoch))
            .map(|(i, _)| i)
            .collect()
    }

    // ---- Merkleization (§4.A/§4.B) ---------------------------------------------------------

    /// Folds the 21 field roots into the container root, recomputing only the fields (and, for
    /// list/vector fields, only the leaf indices) marked dirty since the last call.
    pub fn canonical_root(&mut self) -> Result<Hash256, Error> {
        let Self {
            tree_hash_cache,
            genesis_time,
            genesis_validators_root,
            slot,
            fork,
            latest_block_header,
            block_roots,
            state_roots,
            historical_roots,
            eth1_data,
            eth1_data_votes,
            eth1_deposit_index,
            validators,
            balances,
            randao_mixes,
            slashings,
            previous_epoch_attestations,
            current_epoch_attestations,
            justification_bits,
            previous_justified_checkpoint,
            current_justified_checkpoint,
            finalized_checkpoint,
            ..
        } = self;

        let refs = tree_hash_cache::FieldRefs {
            genesis_time,
            genesis_validators_root,
            slot,
            fork,
            latest_block_header,
            block_roots,
            state_roots,
            historical_roots,
            eth1_data,
            eth1_data_votes,
            eth1_deposit_index,
            validators,
            balances,
            randao_mixes,
            slashings,
            previous_epoch_attestations,
            current_epoch_attestations,
            justification_bits,
            previous_justified_checkpoint,
            current_justified_checkpoint,
            finalized_checkpoint,
        };

        let root = tree_hash_cache.compute_root(refs)?;
        Ok(Hash256::from(root))
    }

    pub(crate) fn dirty_snapshot(&self, field: FieldIndex) -> Dirty {
        self.tree_hash_cache.dirty_state(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MainnetEthSpec;

    fn spec() -> crate::ChainSpec {
        crate::ChainSpec::mainnet()
    }

    #[test]
    fn empty_state_computes_a_root() {
        let mut state: BeaconState<MainnetEthSpec> =
            BeaconState::empty(0, Eth1Data::default(), &spec());
        let root_a = state.canonical_root().unwrap();
        let root_b = state.canonical_root().unwrap();
        assert_eq!(root_a, root_b, "repeated root computation is idempotent");
    }

    #[test]
    fn mutating_a_field_changes_the_root() {
        let mut state: BeaconState<MainnetEthSpec> =
            BeaconState::empty(0, Eth1Data::default(), &spec());
        let before = state.canonical_root().unwrap();
        state.set_slot(Slot::new(7));
        let after = state.canonical_root().unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn cloned_state_shares_cache_and_agrees_on_root() {
        let mut state: BeaconState<MainnetEthSpec> =
            BeaconState::empty(0, Eth1Data::default(), &spec());
        state.set_slot(Slot::new(3));
        let root = state.canonical_root().unwrap();

        let mut clone = state.clone_with_shared_caches();
        assert_eq!(clone.canonical_root().unwrap(), root);
    }

    #[test]
    fn push_validator_keeps_validators_and_balances_in_lockstep() {
        let mut state: BeaconState<MainnetEthSpec> =
            BeaconState::empty(0, Eth1Data::default(), &spec());
        let validator = Validator::new_for_deposit(
            bls::PublicKeyBytes::from_bytes(&[0u8; 48]).unwrap(),
            Hash256::zero(),
            32_000_000_000,
            &spec(),
        );
        state.push_validator(validator, 32_000_000_000).unwrap();
        assert_eq!(state.validators.len(), state.balances.len());
        state.canonical_root().unwrap();
    }
}
