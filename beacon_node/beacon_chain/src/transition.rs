//! The library surface §6 names: five entry points over [`state_processing`], each threading a
//! [`CancellationContext`] and, for full verification, asserting the post-state root
//! against the block's own declared root rather than trusting the caller.

use bls::SignatureSet;
use state_processing::context::CancellationContext;
use state_processing::{self, Error};
use types::{BeaconBlock, BeaconState, ChainSpec, EthSpec, Hash256, Slot, SignedBeaconBlock};

/// `ExecuteStateTransition` (§6): full verification, `ProcessSlots` to the block's slot followed
/// by `ProcessBlock`, asserting `hash_tree_root(post_state) == signed_block.state_root`
/// (§8 property 2 "Root agreement").
pub fn execute_state_transition<T: EthSpec>(
    cancel: &impl CancellationContext,
    state: &mut BeaconState<T>,
    signed_block: &SignedBeaconBlock<T>,
    spec: &ChainSpec,
) -> Result<(), Error> {
    let pre_slot = state.slot;
    process_slots(cancel, state, signed_block.message.slot, spec)?;
    process_block(cancel, state, signed_block, spec)?;

    let computed = state.canonical_root()?;
    if computed != signed_block.message.state_root {
        return Err(Error::StateRootMismatch {
            expected: signed_block.message.state_root,
            computed,
        });
    }

    debug_assert!(state.slot.as_u64() > pre_slot.as_u64(), "slot monotonicity");
    Ok(())
}

/// `ExecuteStateTransitionNoVerifyAnySig` (§6, §4.D mode 2): same slot/block application, but
/// signatures are only collected, not verified — the caller batch-verifies the returned set.
pub fn execute_state_transition_no_verify_any_sig<T: EthSpec>(
    cancel: &impl CancellationContext,
    state: &mut BeaconState<T>,
    signed_block: &SignedBeaconBlock<T>,
    spec: &ChainSpec,
) -> Result<SignatureSet, Error> {
    process_slots(cancel, state, signed_block.message.slot, spec)?;
    state_processing::process_block_no_verify_any_sig(state, signed_block, spec)
}

/// `CalculateStateRoot` (§6): non-mutating from the caller's point of view — operates on a clone,
/// skips signature verification (the proposer computing its own expected state root has not
/// signed the block yet), and returns only the resulting root.
pub fn calculate_state_root<T: EthSpec>(
    cancel: &impl CancellationContext,
    state: &BeaconState<T>,
    block: &BeaconBlock<T>,
    spec: &ChainSpec,
) -> Result<Hash256, Error> {
    let mut working = state.clone_with_shared_caches();
    process_slots(cancel, &mut working, block.slot, spec)?;
    state_processing::process_block_for_state_root(&mut working, block, spec)
}

/// `ProcessSlots` (§6): advances `state` to `target_slot`, running the epoch processor at every
/// boundary crossed. A no-op when `state.slot == target_slot`, matching callers that pass a
/// block's own slot for a state already caught up to it.
pub fn process_slots<T: EthSpec>(
    cancel: &impl CancellationContext,
    state: &mut BeaconState<T>,
    target_slot: Slot,
    spec: &ChainSpec,
) -> Result<(), Error> {
    if state.slot >= target_slot {
        return Ok(());
    }
    state_processing::process_slots(state, target_slot, None, cancel, spec)
}

/// `ProcessBlock` (§6): applies one block's operations to a state already advanced to its slot.
pub fn process_block<T: EthSpec>(
    _cancel: &impl CancellationContext,
    state: &mut BeaconState<T>,
    signed_block: &SignedBeaconBlock<T>,
    spec: &ChainSpec,
) -> Result<(), Error> {
    state_processing::process_block(state, signed_block, spec)
}
