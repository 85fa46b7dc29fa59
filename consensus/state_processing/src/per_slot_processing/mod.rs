//! The slot pipeline (§4.E): advances a state slot-by-slot, running the epoch processor at every
//! epoch boundary crossed, with an optional skip-slot cache (§4.G) short-circuiting the common
//! case of "advance straight to a target slot with no intervening fork".

mod skip_slot_cache;

pub use skip_slot_cache::{AlreadyInProgress, SkipSlotCache};

use crate::context::CancellationContext;
use crate::errors::Error;
use crate::per_epoch_processing::process_epoch;
use types::{BeaconState, ChainSpec, EthSpec, Hash256, Slot};

/// `process_slot` (§4.E): caches the pre-state's root into `state_roots`, backfills
/// `latest_block_header.state_root` the first time it's asked for (a block header is created
/// with a zeroed state root since the root isn't known until this point), then caches the
/// (now-complete) header's root into `block_roots`.
pub fn process_slot<T: EthSpec>(state: &mut BeaconState<T>) -> Result<(), Error> {
    let previous_state_root = state.canonical_root()?;
    state.set_state_root(state.slot, previous_state_root)?;

    if state.latest_block_header.state_root == Hash256::zero() {
        let mut header = state.latest_block_header.clone();
        header.state_root = previous_state_root;
        state.set_latest_block_header(header);
    }

    let header_root = state.latest_block_header.canonical_root();
    state.set_block_root(state.slot, header_root)?;

    Ok(())
}

/// `process_slots` (§4.E). `skip_slot_cache` is optional: callers that don't care about
/// cross-task de-duplication (most tests) can pass `None`.
pub fn process_slots<T: EthSpec>(
    state: &mut BeaconState<T>,
    target_slot: Slot,
    skip_slot_cache: Option<&SkipSlotCache<T>>,
    cancel: &impl CancellationContext,
    spec: &ChainSpec,
) -> Result<(), Error> {
    if state.slot >= target_slot {
        return Err(Error::StateInvariantViolation(format!(
            "state.slot ({}) >= target_slot ({})",
            state.slot, target_slot
        )));
    }

    let starting_slot = state.slot;
    let cache_key = match skip_slot_cache {
        Some(_) => Some(SkipSlotCache::<T>::compute_key(
            state.canonical_root()?,
            target_slot,
        )),
        None => None,
    };

    if let (Some(cache), Some(key)) = (skip_slot_cache, cache_key) {
        match cache.mark_in_progress(key) {
            Err(AlreadyInProgress) => {
                cache.wait_for_completion(&key);
            }
            Ok(()) => {}
        }

        if let Some(cached) = cache.get(&key) {
            if cached.slot.as_u64() >= target_slot.as_u64() {
                *state = cached;
                cache.mark_not_in_progress(&key);
                return Ok(());
            }
        }

        let result = advance(state, target_slot, cancel, spec);

        if state.slot.as_u64() > starting_slot.as_u64() {
            cache.put(key, state.clone_with_shared_caches());
        }
        cache.mark_not_in_progress(&key);

        result
    } else {
        advance(state, target_slot, cancel, spec)
    }
}

/// The slot-by-slot loop itself, shared between the cached and uncached call paths.
fn advance<T: EthSpec>(
    state: &mut BeaconState<T>,
    target_slot: Slot,
    cancel: &impl CancellationContext,
    spec: &ChainSpec,
) -> Result<(), Error> {
    while state.slot.as_u64() < target_slot.as_u64() {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        process_slot(state)?;

        if (state.slot.as_u64() + 1) % T::slots_per_epoch() == 0 {
            process_epoch(state, spec)?;
        }

        state.set_slot(Slot::new(state.slot.as_u64() + 1));
    }

    Ok(())
}

/// `ProcessSlotsUsingNextSlotCache` (§4.E): a specialization for the common "child block building
/// on a parent whose next-slot state we already advanced" path. `next_slot_state`, if given, must
/// already be `parent_state` advanced exactly one slot past `parent_root`'s block; when present
/// it lets the caller skip `process_slot`'s first iteration (the state-root-caching step for
/// `parent_root` itself, already done when `next_slot_state` was produced).
pub fn process_slots_using_next_slot_cache<T: EthSpec>(
    parent_state: &BeaconState<T>,
    next_slot_state: Option<BeaconState<T>>,
    target_slot: Slot,
    cancel: &impl CancellationContext,
    spec: &ChainSpec,
) -> Result<BeaconState<T>, Error> {
    let mut state = match next_slot_state {
        Some(advanced) if advanced.slot.as_u64() == parent_state.slot.as_u64() + 1 => advanced,
        _ => parent_state.clone_with_shared_caches(),
    };

    if state.slot.as_u64() < target_slot.as_u64() {
        process_slots(&mut state, target_slot, None, cancel, spec)?;
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NullCancellation;
    use types::{Eth1Data, MainnetEthSpec};

    fn spec() -> ChainSpec {
        ChainSpec::mainnet()
    }

    #[test]
    fn process_slots_matches_one_at_a_time_application() {
        let mut batched: BeaconState<MainnetEthSpec> =
            BeaconState::empty(0, Eth1Data::default(), &spec());
        let mut stepped = batched.clone_with_shared_caches();

        process_slots(&mut batched, Slot::new(5), None, &NullCancellation, &spec()).unwrap();

        for _ in 0..5 {
            let target = Slot::new(stepped.slot.as_u64() + 1);
            process_slots(&mut stepped, target, None, &NullCancellation, &spec()).unwrap();
        }

        assert_eq!(batched.canonical_root().unwrap(), stepped.canonical_root().unwrap());
    }

    #[test]
    fn rejects_non_advancing_target() {
        let mut state: BeaconState<MainnetEthSpec> =
            BeaconState::empty(0, Eth1Data::default(), &spec());
        state.set_slot(Slot::new(3));
        let err = process_slots(&mut state, Slot::new(3), None, &NullCancellation, &spec());
        assert!(matches!(err, Err(Error::StateInvariantViolation(_))));
    }
}
