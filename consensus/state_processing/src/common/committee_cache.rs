//! `committeeCache` (§4.C): one of these per seed (epoch × `RelativeEpoch`), holding the epoch's
//! shuffled active-index list so every `(slot, committee_index)` lookup within the epoch is an
//! O(1) slice rather than a fresh shuffle.

use crate::errors::Error;
use lru::LruCache;
use types::{BeaconState, ChainSpec, Domain, Epoch, EthSpec};

/// Default capacity: previous + current + next epoch, doubled for margin across concurrent
/// state forks (§5 "Caches... are process-wide; their individual entries are immutable once
/// inserted. Cache eviction is LRU with a configured capacity").
const DEFAULT_CAPACITY: usize = 8;

#[derive(Debug, Clone)]
pub struct CommitteeCache {
    active_indices: Vec<usize>,
    /// `shuffled_indices[i]` is the position in `active_indices` that lands at shuffled slot `i`.
    shuffled_indices: Vec<usize>,
    pub(crate) committees_per_slot: u64,
}

impl CommitteeCache {
    /// Builds a cache for `epoch` from `state`, per §4.C: active indices, one whole-list
    /// unshuffle, and the derived committee count.
    pub fn build<T: EthSpec>(
        state: &BeaconState<T>,
        epoch: Epoch,
        spec: &ChainSpec,
    ) -> Result<Self, Error> {
        let active_indices = state.active_validator_indices(epoch);
        if active_indices.is_empty() {
            return Err(Error::StateInvariantViolation(
                "cannot build a committee cache with zero active validators".into(),
            ));
        }

        let committees_per_slot = super::committees_per_slot::<T>(active_indices.len(), spec);
        let seed = super::get_seed(state, epoch, Domain::BeaconAttester, spec);

        let shuffled_indices = swap_or_not_shuffle::shuffle_list(
            active_indices.len(),
            &seed,
            spec.shuffle_round_count,
            false,
        )
        .ok_or_else(|| Error::Internal("shuffle_list returned None for a non-empty list".into()))?;

        Ok(Self {
            active_indices,
            shuffled_indices,
            committees_per_slot,
        })
    }

    /// Slices the shuffled list at the `(index_in_epoch, total_committees)` boundary the caller
    /// has already computed from `(slot, committee_index)`, and maps back to validator indices.
    pub fn committee_slice(&self, index_in_epoch: u64, total_committees: u64) -> Vec<usize> {
        let n = self.active_indices.len() as u64;
        let start = (n * index_in_epoch) / total_committees;
        let end = (n * (index_in_epoch + 1)) / total_committees;
        self.shuffled_indices[start as usize..end as usize]
            .iter()
            .map(|&i| self.active_indices[i])
            .collect()
    }

    pub fn active_validator_count(&self) -> usize {
        self.active_indices.len()
    }
}

/// Keyed by seed (§4.C: "keyed by `seed`"). Populated at epoch boundary for the current and next
/// epoch by `UpdateCommitteeCache`; membership is checked before insertion so a cache miss costs
/// one rebuild, never a duplicate entry.
pub struct CommitteeCacheStore {
    entries: LruCache<[u8; 32], CommitteeCache>,
}

impl CommitteeCacheStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn get(&mut self, seed: &[u8; 32]) -> Option<&CommitteeCache> {
        self.entries.get(seed)
    }

    pub fn insert(&mut self, seed: [u8; 32], cache: CommitteeCache) {
        self.entries.put(seed, cache);
    }

    pub fn contains(&self, seed: &[u8; 32]) -> bool {
        self.entries.contains(seed)
    }

    /// `UpdateCommitteeCache`: ensures the cache holds an entry for `epoch`'s seed, building one
    /// if absent, and returns it. Cache build failures are the caller's problem to log and
    /// propagate — unlike a cache *write* failure, a missing committee cache is fatal to block
    /// processing.
    pub fn get_or_build<T: EthSpec>(
        &mut self,
        state: &BeaconState<T>,
        epoch: Epoch,
        spec: &ChainSpec,
    ) -> Result<&CommitteeCache, Error> {
        let seed = super::get_seed(state, epoch, Domain::BeaconAttester, spec);
        if !self.contains(&seed) {
            let cache = CommitteeCache::build(state, epoch, spec)?;
            self.insert(seed, cache);
        }
        Ok(self.get(&seed).expect("just inserted"))
    }
}

impl Default for CommitteeCacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
