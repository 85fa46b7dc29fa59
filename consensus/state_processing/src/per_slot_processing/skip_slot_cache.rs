//! §4.G: a process-wide memoization table for "advance this state to this slot", with an
//! in-progress set + condvar so concurrent callers asking for the same advancement don't
//! duplicate the work (the thundering-herd case described in §4.G's protocol paragraph).

use lru::LruCache;
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use types::{BeaconState, EthSpec, Hash256, Slot};

const DEFAULT_CAPACITY: usize = 4;

/// Returned by `mark_in_progress` when another caller already owns this key's computation.
#[derive(Debug)]
pub struct AlreadyInProgress;

pub struct SkipSlotCache<T: EthSpec> {
    results: Mutex<LruCache<Hash256, BeaconState<T>>>,
    in_progress: Mutex<HashSet<Hash256>>,
    completed: Condvar,
}

impl<T: EthSpec> SkipSlotCache<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            results: Mutex::new(LruCache::new(capacity)),
            in_progress: Mutex::new(HashSet::new()),
            completed: Condvar::new(),
        }
    }

    /// A digest of `(state_root, target_slot)`, the cache key §4.G specifies.
    pub fn compute_key(state_root: Hash256, target_slot: Slot) -> Hash256 {
        let mut input = Vec::with_capacity(32 + 8);
        input.extend_from_slice(state_root.as_bytes());
        input.extend_from_slice(&int_to_bytes::int_to_bytes8(target_slot.as_u64()));
        Hash256::from_slice(&eth2_hashing::hash(&input))
    }

    pub fn get(&self, key: &Hash256) -> Option<BeaconState<T>> {
        self.results.lock().get(key).cloned()
    }

    pub fn mark_in_progress(&self, key: Hash256) -> Result<(), AlreadyInProgress> {
        let mut in_progress = self.in_progress.lock();
        if in_progress.contains(&key) {
            return Err(AlreadyInProgress);
        }
        in_progress.insert(key);
        Ok(())
    }

    /// Blocks the calling thread until the owner of `key`'s computation calls
    /// `mark_not_in_progress`. Callers re-check `get` afterwards since the result may or may not
    /// have reached the target slot (the owner may have been cancelled partway).
    pub fn wait_for_completion(&self, key: &Hash256) {
        let mut in_progress = self.in_progress.lock();
        while in_progress.contains(key) {
            self.completed.wait(&mut in_progress);
        }
    }

    pub fn put(&self, key: Hash256, state: BeaconState<T>) {
        self.results.lock().put(key, state);
    }

    pub fn mark_not_in_progress(&self, key: &Hash256) {
        self.in_progress.lock().remove(key);
        self.completed.notify_all();
    }
}

impl<T: EthSpec> Default for SkipSlotCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
