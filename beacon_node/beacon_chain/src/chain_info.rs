//! The chain-info façade (§4.H): read-side accessors over the in-memory head, guarded by one
//! RW lock over exactly these fields: `head`, the three checkpoints, `genesis_time`.
//! Every accessor deep-copies its result before returning — cheap here since `Checkpoint`, `Fork`
//! and `Hash256` are all `Copy`/small, but the discipline matters more than the cost: callers must
//! never be able to observe a mutation racing a read.

use std::sync::Arc;

use parking_lot::RwLock;
use state_processing::get_seed;
use types::{ChainSpec, Checkpoint, Domain, Epoch, Eth1Data, EthSpec, Fork, Hash256, SignedBeaconBlock, Slot};

use crate::collaborators::{BeaconDB, ForkChoiceStore, StateGen};

struct Head<T: EthSpec> {
    root: Hash256,
    block: Arc<SignedBeaconBlock<T>>,
    state: types::BeaconState<T>,
}

struct Inner<T: EthSpec> {
    head: Option<Head<T>>,
    finalized_checkpoint: Checkpoint,
    current_justified_checkpoint: Checkpoint,
    previous_justified_checkpoint: Checkpoint,
    genesis_time: u64,
}

/// Read-side façade over `{head, finalized_checkpt, justified_checkpt, prev_justified_checkpt,
/// genesis_time}` (§4.H). The STF itself never touches this type; it is set by the fork-choice
/// driver after a block is accepted, via [`ChainInfo::set_head`]/[`ChainInfo::set_checkpoints`].
pub struct ChainInfo<T, D, S, F>
where
    T: EthSpec,
    D: BeaconDB<T>,
    S: StateGen<T>,
    F: ForkChoiceStore,
{
    inner: RwLock<Inner<T>>,
    db: D,
    state_gen: S,
    fork_choice: F,
}

impl<T, D, S, F> ChainInfo<T, D, S, F>
where
    T: EthSpec,
    D: BeaconDB<T>,
    S: StateGen<T>,
    F: ForkChoiceStore,
{
    pub fn new(db: D, state_gen: S, fork_choice: F, genesis_time: u64) -> Self {
        Self {
            inner: RwLock::new(Inner {
                head: None,
                finalized_checkpoint: Checkpoint::default(),
                current_justified_checkpoint: Checkpoint::default(),
                previous_justified_checkpoint: Checkpoint::default(),
                genesis_time,
            }),
            db,
            state_gen,
            fork_choice,
        }
    }

    /// Installs a new head, called by the fork-choice driver once it has accepted a block —
    /// never by the STF itself (§4.H: "set by the fork-choice driver, not by the STF").
    pub fn set_head(&self, root: Hash256, block: SignedBeaconBlock<T>, state: types::BeaconState<T>) {
        let mut inner = self.inner.write();
        inner.head = Some(Head {
            root,
            block: Arc::new(block),
            state,
        });
    }

    pub fn set_checkpoints(
        &self,
        finalized: Checkpoint,
        current_justified: Checkpoint,
        previous_justified: Checkpoint,
    ) {
        let mut inner = self.inner.write();
        inner.finalized_checkpoint = finalized;
        inner.current_justified_checkpoint = current_justified;
        inner.previous_justified_checkpoint = previous_justified;
    }

    pub fn genesis_time(&self) -> u64 {
        self.inner.read().genesis_time
    }

    pub fn head_slot(&self) -> Option<Slot> {
        self.inner.read().head.as_ref().map(|h| h.state.slot)
    }

    pub fn head_root(&self) -> Option<Hash256> {
        self.inner.read().head.as_ref().map(|h| h.root)
    }

    pub fn head_block(&self) -> Option<Arc<SignedBeaconBlock<T>>> {
        let inner = self.inner.read();
        match &inner.head {
            Some(h) => Some(h.block.clone()),
            None => self.db.head_block().map(Arc::new),
        }
    }

    /// Falls through to `StateGen`/`BeaconDB` when there is no in-memory head (§4.H), e.g. right
    /// after process startup before the first block has been imported.
    pub fn head_state(&self) -> Result<Option<types::BeaconState<T>>, S::Error> {
        let inner = self.inner.read();
        if let Some(h) = &inner.head {
            return Ok(Some(h.state.clone_with_shared_caches()));
        }
        drop(inner);
        match self.db.head_block() {
            Some(block) => self.state_gen.state_by_root(block.message.state_root).map(Some),
            None => Ok(None),
        }
    }

    /// Zero-root checkpoint when nil (§4.H), never an `Option` the caller has to unwrap.
    pub fn finalized_checkpoint(&self) -> Checkpoint {
        self.inner.read().finalized_checkpoint
    }

    pub fn current_justified_checkpoint(&self) -> Checkpoint {
        self.inner.read().current_justified_checkpoint
    }

    pub fn previous_justified_checkpoint(&self) -> Checkpoint {
        self.inner.read().previous_justified_checkpoint
    }

    /// True if `root` is finalized, or the fork-choice store reports it canonical.
    pub fn is_canonical(&self, root: Hash256) -> bool {
        self.db.is_finalized_block(root) || self.fork_choice.is_canonical(root)
    }

    pub fn head_validator_indices(&self, epoch: Epoch) -> Vec<usize> {
        self.inner
            .read()
            .head
            .as_ref()
            .map(|h| h.state.active_validator_indices(epoch))
            .unwrap_or_default()
    }

    pub fn head_seed(&self, epoch: Epoch, domain: Domain, spec: &ChainSpec) -> Option<[u8; 32]> {
        self.inner
            .read()
            .head
            .as_ref()
            .map(|h| get_seed(&h.state, epoch, domain, spec))
    }

    pub fn head_eth1_data(&self) -> Option<Eth1Data> {
        self.inner.read().head.as_ref().map(|h| h.state.eth1_data.clone())
    }

    pub fn current_fork(&self) -> Option<Fork> {
        self.inner.read().head.as_ref().map(|h| h.state.fork.clone())
    }

    pub fn proto_array_store(&self) -> F::Snapshot {
        self.fork_choice.store()
    }
}
