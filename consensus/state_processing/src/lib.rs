//! The deterministic state-transition function (§2, §4): given a pre-state and a block (or a
//! bare target slot), computes the unique post-state that block/slot implies. Every public entry
//! point here is a pure function of its inputs plus a [`types::ChainSpec`] — no I/O, no global
//! mutable state beyond the process-wide LRU caches callers may optionally supply.

mod common;
pub mod context;
pub mod errors;
mod per_block_processing;
mod per_epoch_processing;
mod per_slot_processing;

pub use common::{
    committee_assignments, get_seed, CommitteeAssignment, CommitteeCache, CommitteeCacheStore,
    ProposerIndicesCache,
};
pub use context::{CancelCause, CancellationContext, NullCancellation};
pub use errors::Error;
pub use per_block_processing::{
    process_block, process_block_for_state_root, process_block_header, process_block_no_verify_any_sig,
    process_eth1_data, process_randao, BlockSignatureStrategy,
};
pub use per_epoch_processing::{process_epoch, BalanceSummary, ValidatorStatus};
pub use per_slot_processing::{
    process_slot, process_slots, process_slots_using_next_slot_cache, AlreadyInProgress, SkipSlotCache,
};
