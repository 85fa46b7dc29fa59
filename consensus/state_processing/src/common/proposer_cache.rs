//! `proposerIndicesCache` (§4.C): keyed by the block root at the end-slot of
//! `current_epoch - 1 - MIN_SEED_LOOKAHEAD`, holding one proposer index per slot of the epoch
//! that key identifies. Computing all `SLOTS_PER_EPOCH` proposers up front amortizes the
//! shuffle-and-accept loop across a whole epoch of block production/verification.

use lru::LruCache;
use types::Hash256;

const DEFAULT_CAPACITY: usize = 4;

pub struct ProposerIndicesCache {
    entries: LruCache<Hash256, Vec<usize>>,
}

impl ProposerIndicesCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn get(&mut self, key: &Hash256) -> Option<&[usize]> {
        self.entries.get(key).map(|v| v.as_slice())
    }

    /// Silent (non-error) on a zero-valued key (§9 Open Question 3): a zero state-root lookup
    /// means the epoch boundary hasn't been decided yet, which is routine early in a chain's
    /// life and not worth failing the caller over. Logged at `debug` rather than dropped
    /// outright, since a missed insert degrades proposer-lookup performance for that epoch.
    pub fn insert(&mut self, key: Hash256, proposers: Vec<usize>) {
        if key.is_zero() {
            log::debug!("skipping proposer-indices cache insert for a zero-valued key");
            return;
        }
        self.entries.put(key, proposers);
    }
}

impl Default for ProposerIndicesCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
