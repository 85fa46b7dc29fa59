//! The incremental Merkleization machinery backing [`super::BeaconState::canonical_root`]
//! (§4.A/§4.B): one [`field_trie::FieldTrie`] per list/vector field, a single cached root per
//! scalar/composite field, and a dirty-field set recording which of the two needs recomputing.

use crate::field_converter::LeafRoot;
use crate::EthSpec;
use field_trie::{FieldKind, FieldTrie};
use std::sync::Arc;
use typenum::Unsigned;

/// Mirrors §3's fixed field-index list, in SSZ container order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum FieldIndex {
    GenesisTime = 0,
    GenesisValidatorsRoot = 1,
    Slot = 2,
    Fork = 3,
    LatestBlockHeader = 4,
    BlockRoots = 5,
    StateRoots = 6,
    HistoricalRoots = 7,
    Eth1Data = 8,
    Eth1DataVotes = 9,
    Eth1DepositIndex = 10,
    Validators = 11,
    Balances = 12,
    RandaoMixes = 13,
    Slashings = 14,
    PreviousEpochAttestations = 15,
    CurrentEpochAttestations = 16,
    JustificationBits = 17,
    PreviousJustifiedCheckpoint = 18,
    CurrentJustifiedCheckpoint = 19,
    FinalizedCheckpoint = 20,
}

pub const NUM_FIELDS: usize = 21;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Dirty {
    Clean,
    Full,
    Indices(Vec<usize>),
}

#[derive(Debug, Clone)]
enum CacheSlot {
    Scalar(Option<[u8; 32]>),
    Trie(Option<Arc<FieldTrie>>),
}

#[derive(Debug, Clone)]
pub struct BeaconTreeHashCache {
    dirty: Vec<Dirty>,
    slots: Vec<CacheSlot>,
}

impl Default for BeaconTreeHashCache {
    fn default() -> Self {
        use FieldIndex::*;
        let trie_fields = [
            BlockRoots,
            StateRoots,
            HistoricalRoots,
            Eth1DataVotes,
            Validators,
            Balances,
            RandaoMixes,
            Slashings,
            PreviousEpochAttestations,
            CurrentEpochAttestations,
        ];
        let slots = (0..NUM_FIELDS)
            .map(|i| {
                if trie_fields.iter().any(|f| *f as usize == i) {
                    CacheSlot::Trie(None)
                } else {
                    CacheSlot::Scalar(None)
                }
            })
            .collect();
        Self {
            dirty: vec![Dirty::Full; NUM_FIELDS],
            slots,
        }
    }
}

impl BeaconTreeHashCache {
    pub(super) fn mark_dirty(&mut self, field: FieldIndex) {
        self.dirty[field as usize] = Dirty::Full;
    }

    pub(super) fn mark_index_dirty(&mut self, field: FieldIndex, index: usize) {
        match &mut self.dirty[field as usize] {
            Dirty::Full => {}
            slot @ Dirty::Clean => *slot = Dirty::Indices(vec![index]),
            Dirty::Indices(indices) => indices.push(index),
        }
    }

    pub(super) fn dirty_state(&self, field: FieldIndex) -> Dirty {
        self.dirty[field as usize].clone()
    }

    fn scalar_root(&mut self, field: FieldIndex, compute: impl FnOnce() -> [u8; 32]) -> [u8; 32] {
        let idx = field as usize;
        if let Dirty::Clean = self.dirty[idx] {
            if let CacheSlot::Scalar(Some(root)) = self.slots[idx] {
                return root;
            }
        }
        let root = compute();
        self.slots[idx] = CacheSlot::Scalar(Some(root));
        self.dirty[idx] = Dirty::Clean;
        root
    }

    fn trie_root(
        &mut self,
        field: FieldIndex,
        kind: FieldKind,
        capacity: usize,
        leaf_roots: &[[u8; 32]],
    ) -> Result<[u8; 32], field_trie::Error> {
        let idx = field as usize;
        let dirty = std::mem::replace(&mut self.dirty[idx], Dirty::Clean);

        let needs_full_rebuild = match &dirty {
            Dirty::Full => true,
            Dirty::Clean | Dirty::Indices(_) => !matches!(self.slots[idx], CacheSlot::Trie(Some(_))),
        };

        if needs_full_rebuild {
            let trie = FieldTrie::new(kind, leaf_roots, capacity)?;
            let root = trie.root();
            self.slots[idx] = CacheSlot::Trie(Some(Arc::new(trie)));
            return Ok(root);
        }

        match dirty {
            Dirty::Clean => {
                if let CacheSlot::Trie(Some(trie)) = &self.slots[idx] {
                    Ok(trie.root())
                } else {
                    unreachable!("needs_full_rebuild is false only when a trie is already cached")
                }
            }
            Dirty::Indices(indices) => {
                if let CacheSlot::Trie(Some(trie)) = &mut self.slots[idx] {
                    let mutable = Arc::make_mut(trie);
                    mutable.recompute(&indices, leaf_roots)
                } else {
                    unreachable!("needs_full_rebuild is false only when a trie is already cached")
                }
            }
            Dirty::Full => unreachable!("handled by needs_full_rebuild"),
        }
    }

    /// Folds all 21 field roots, recomputing only what `dirty` marks, into the container root.
    pub(super) fn compute_root<T: EthSpec>(
        &mut self,
        f: FieldRefs<T>,
    ) -> Result<[u8; 32], field_trie::Error> {
        use FieldIndex::*;

        let mut roots = [[0u8; 32]; NUM_FIELDS];

        roots[GenesisTime as usize] = self.scalar_root(GenesisTime, || f.genesis_time.leaf_root());
        roots[GenesisValidatorsRoot as usize] =
            self.scalar_root(GenesisValidatorsRoot, || f.genesis_validators_root.leaf_root());
        roots[Slot as usize] = self.scalar_root(Slot, || f.slot.leaf_root());
        roots[Fork as usize] = self.scalar_root(Fork, || f.fork.leaf_root());
        roots[LatestBlockHeader as usize] =
            self.scalar_root(LatestBlockHeader, || f.latest_block_header.leaf_root());

        roots[BlockRoots as usize] = self.trie_root(
            BlockRoots,
            FieldKind::FixedVector,
            T::SlotsPerHistoricalRoot::to_usize(),
            &leaves(f.block_roots.iter()),
        )?;
        roots[StateRoots as usize] = self.trie_root(
            StateRoots,
            FieldKind::FixedVector,
            T::SlotsPerHistoricalRoot::to_usize(),
            &leaves(f.state_roots.iter()),
        )?;
        roots[HistoricalRoots as usize] = self.trie_root(
            HistoricalRoots,
            FieldKind::VariableList,
            T::HistoricalRootsLimit::to_usize(),
            &leaves(f.historical_roots.iter()),
        )?;

        roots[Eth1Data as usize] = self.scalar_root(Eth1Data, || f.eth1_data.leaf_root());
        roots[Eth1DataVotes as usize] = self.trie_root(
            Eth1DataVotes,
            FieldKind::VariableList,
            T::Eth1DataVotesLength::to_usize(),
            &leaves(f.eth1_data_votes.iter()),
        )?;
        roots[Eth1DepositIndex as usize] =
            self.scalar_root(Eth1DepositIndex, || f.eth1_deposit_index.leaf_root());

        roots[Validators as usize] = self.trie_root(
            Validators,
            FieldKind::VariableList,
            T::ValidatorRegistryLimit::to_usize(),
            &leaves(f.validators.iter()),
        )?;
        roots[Balances as usize] = self.trie_root(
            Balances,
            FieldKind::VariableList,
            T::ValidatorRegistryLimit::to_usize(),
            &leaves(f.balances.iter()),
        )?;
        roots[RandaoMixes as usize] = self.trie_root(
            RandaoMixes,
            FieldKind::FixedVector,
            T::EpochsPerHistoricalVector::to_usize(),
            &leaves(f.randao_mixes.iter()),
        )?;
        roots[Slashings as usize] = self.trie_root(
            Slashings,
            FieldKind::FixedVector,
            T::SlashingsVectorLength::to_usize(),
            &leaves(f.slashings.iter()),
        )?;
        roots[PreviousEpochAttestations as usize] = self.trie_root(
            PreviousEpochAttestations,
            FieldKind::VariableList,
            T::PreviousEpochAttestationsLimit::to_usize(),
            &leaves(f.previous_epoch_attestations.iter()),
        )?;
        roots[CurrentEpochAttestations as usize] = self.trie_root(
            CurrentEpochAttestations,
            FieldKind::VariableList,
            T::CurrentEpochAttestationsLimit::to_usize(),
            &leaves(f.current_epoch_attestations.iter()),
        )?;

        roots[JustificationBits as usize] =
            self.scalar_root(JustificationBits, || f.justification_bits.leaf_root());
        roots[PreviousJustifiedCheckpoint as usize] = self.scalar_root(PreviousJustifiedCheckpoint, || {
            f.previous_justified_checkpoint.leaf_root()
        });
        roots[CurrentJustifiedCheckpoint as usize] = self.scalar_root(CurrentJustifiedCheckpoint, || {
            f.current_justified_checkpoint.leaf_root()
        });
        roots[FinalizedCheckpoint as usize] =
            self.scalar_root(FinalizedCheckpoint, || f.finalized_checkpoint.leaf_root());

        // The container itself is just one more trie: capacity 32 is the next power of two at or
        // above the 21 fields, so this reuses `FieldTrie` rather than hand-rolling a second
        // Merkleization routine for exactly one caller.
        let container = FieldTrie::new(FieldKind::FixedVector, &roots, 32)?;
        Ok(container.root())
    }
}

fn leaves<'a, I: LeafRoot + 'a>(it: impl Iterator<Item = &'a I>) -> Vec<[u8; 32]> {
    it.map(LeafRoot::leaf_root).collect()
}

/// Borrowed view of every `BeaconState` field, built via partial destructuring at the call site
/// so borrowing the cache mutably doesn't conflict with borrowing the data fields immutably.
pub(super) struct FieldRefs<'a, T: EthSpec> {
    pub genesis_time: &'a u64,
    pub genesis_validators_root: &'a crate::Hash256,
    pub slot: &'a crate::Slot,
    pub fork: &'a crate::Fork,
    pub latest_block_header: &'a crate::BeaconBlockHeader,
    pub block_roots: &'a ssz_types::FixedVector<crate::Hash256, T::SlotsPerHistoricalRoot>,
    pub state_roots: &'a ssz_types::FixedVector<crate::Hash256, T::SlotsPerHistoricalRoot>,
    pub historical_roots: &'a ssz_types::VariableList<crate::Hash256, T::HistoricalRootsLimit>,
    pub eth1_data: &'a crate::Eth1Data,
    pub eth1_data_votes: &'a ssz_types::VariableList<crate::Eth1Data, T::Eth1DataVotesLength>,
    pub eth1_deposit_index: &'a u64,
    pub validators: &'a ssz_types::VariableList<crate::Validator, T::ValidatorRegistryLimit>,
    pub balances: &'a ssz_types::VariableList<u64, T::ValidatorRegistryLimit>,
    pub randao_mixes: &'a ssz_types::FixedVector<crate::Hash256, T::EpochsPerHistoricalVector>,
    pub slashings: &'a ssz_types::FixedVector<u64, T::SlashingsVectorLength>,
    pub previous_epoch_attestations:
        &'a ssz_types::VariableList<crate::PendingAttestation<T>, T::PreviousEpochAttestationsLimit>,
    pub current_epoch_attestations:
        &'a ssz_types::VariableList<crate::PendingAttestation<T>, T::CurrentEpochAttestationsLimit>,
    pub justification_bits: &'a ssz_types::BitVector<typenum::U4>,
    pub previous_justified_checkpoint: &'a crate::Checkpoint,
    pub current_justified_checkpoint: &'a crate::Checkpoint,
    pub finalized_checkpoint: &'a crate::Checkpoint,
}
