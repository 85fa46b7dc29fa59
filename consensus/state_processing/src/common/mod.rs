//! Committee/proposer selection helpers and their caches (§4.C). These are the building blocks
//! both `per_slot_processing` (proposer index for `latest_block_header`) and
//! `per_block_processing` (committee membership checks, proposer-slashing/attestation
//! validation) sit on top of.

mod committee_assignment;
mod committee_cache;
mod proposer_cache;
mod signing_root;

pub use committee_assignment::{committee_assignments, CommitteeAssignment};
pub use committee_cache::{CommitteeCache, CommitteeCacheStore};
pub use proposer_cache::ProposerIndicesCache;
pub use signing_root::{compute_domain, compute_signing_root, get_domain};

use crate::errors::Error;
use safe_arith::SafeArith;
use std::cmp::{max, min};
use typenum::Unsigned;
use types::{BeaconState, ChainSpec, Domain, Epoch, EthSpec, Slot};

/// `SlotCommitteeCount` (§4.C): how many committees sit on a single slot, given the number of
/// validators active in the committee's epoch.
pub fn committees_per_slot<T: EthSpec>(active_validator_count: usize, spec: &ChainSpec) -> u64 {
    max(
        1,
        min(
            spec.max_committees_per_slot,
            active_validator_count as u64 / T::slots_per_epoch() / spec.target_committee_size,
        ),
    )
}

/// `get_seed` per the phase-0 spec: hash of `domain_type || epoch || randao_mix` where the mix
/// is drawn from `MIN_SEED_LOOKAHEAD` epochs before the start of `EPOCHS_PER_HISTORICAL_VECTOR`'s
/// trailing window — i.e. old enough that it was unknown to the validators being shuffled.
pub fn get_seed<T: EthSpec>(
    state: &BeaconState<T>,
    epoch: Epoch,
    domain: Domain,
    spec: &ChainSpec,
) -> [u8; 32] {
    let mix_epoch = Epoch::new(
        epoch
            .as_u64()
            .wrapping_add(T::EpochsPerHistoricalVector::to_u64())
            .wrapping_sub(spec.min_seed_lookahead.as_u64())
            .wrapping_sub(1),
    );
    let mix = state.get_randao_mix(mix_epoch);

    let mut input = Vec::with_capacity(4 + 8 + 32);
    input.extend_from_slice(&spec.get_domain_constant(domain).to_be_bytes());
    input.extend_from_slice(&int_to_bytes::int_to_bytes8(epoch.as_u64()));
    input.extend_from_slice(mix.as_bytes());

    let digest = eth2_hashing::hash(&input);
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    seed
}

/// `BeaconCommittee(slot, committee_index)` (§4.C): slices the epoch's shuffled active-index list
/// at the boundaries a `(slot, committee_index)` pair maps to.
pub fn get_beacon_committee<T: EthSpec>(
    cache: &CommitteeCache,
    slot: Slot,
    committee_index: u64,
) -> Result<Vec<usize>, Error> {
    let committees_per_slot = cache.committees_per_slot;
    if committee_index >= committees_per_slot {
        return Err(Error::ShapeViolation(format!(
            "committee index {} >= committee count {}",
            committee_index, committees_per_slot
        )));
    }

    let slot_offset = slot.as_u64() % T::slots_per_epoch();
    let index_in_epoch = slot_offset * committees_per_slot + committee_index;
    let total_committees = committees_per_slot * T::slots_per_epoch();

    Ok(cache.committee_slice(index_in_epoch, total_committees))
}

/// Proposer index at slot `s` (§4.C): repeatedly draws a candidate from the shuffled active set
/// and accepts it with probability proportional to its effective balance, per the phase-0
/// `compute_proposer_index` algorithm.
pub fn get_beacon_proposer_index<T: EthSpec>(
    state: &BeaconState<T>,
    slot: Slot,
    spec: &ChainSpec,
) -> Result<usize, Error> {
    const MAX_RANDOM_BYTE: u64 = 255;
    const MAX_ROUNDS: u64 = 1 << 16;

    let epoch = slot.epoch::<T>();
    let seed_base = get_seed(state, epoch, Domain::BeaconProposer, spec);
    // Mixed with the slot so every slot in the epoch gets an independent proposer, matching the
    // real spec's `seed + uint_to_bytes(slot)` input to `get_beacon_proposer_index`.
    let mut seed_input = seed_base.to_vec();
    seed_input.extend_from_slice(&int_to_bytes::int_to_bytes8(slot.as_u64()));
    let seed_digest = eth2_hashing::hash(&seed_input);
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&seed_digest);

    let indices = state.active_validator_indices(epoch);
    if indices.is_empty() {
        return Err(Error::StateInvariantViolation(
            "no active validators to select a proposer from".into(),
        ));
    }
    let total = indices.len();

    for i in 0..MAX_ROUNDS {
        let shuffled_position = swap_or_not_shuffle::compute_shuffled_index(
            (i % total as u64) as usize,
            total,
            &seed,
            spec.shuffle_round_count,
            true,
        )
        .ok_or_else(|| Error::Internal("shuffled index out of range".into()))?;
        let candidate_index = indices[shuffled_position];

        let mut random_byte_input = seed.to_vec();
        random_byte_input.extend_from_slice(&int_to_bytes::int_to_bytes8(i / 32));
        let random_bytes = eth2_hashing::hash(&random_byte_input);
        let random_byte = random_bytes[(i % 32) as usize] as u64;

        let effective_balance = state
            .validators
            .get(candidate_index)
            .map(|v| v.effective_balance)
            .ok_or(Error::Internal("candidate index out of bounds".into()))?;

        if effective_balance * MAX_RANDOM_BYTE >= spec.max_effective_balance * random_byte {
            return Ok(candidate_index);
        }
    }

    Err(Error::Internal(
        "exhausted proposer-selection rounds without an accepted candidate".into(),
    ))
}

pub fn increase_balance<T: EthSpec>(
    state: &mut BeaconState<T>,
    index: usize,
    delta: u64,
) -> Result<(), Error> {
    let balance = state
        .get_balance(index)
        .ok_or(Error::Internal(format!("unknown validator {}", index)))?;
    state.set_balance(index, balance.safe_add(delta)?)?;
    Ok(())
}

pub fn decrease_balance<T: EthSpec>(
    state: &mut BeaconState<T>,
    index: usize,
    delta: u64,
) -> Result<(), Error> {
    let balance = state
        .get_balance(index)
        .ok_or(Error::Internal(format!("unknown validator {}", index)))?;
    state.set_balance(index, balance.saturating_sub(delta))?;
    Ok(())
}

/// Queues `index` for exit, honoring the per-epoch churn limit: if the target exit epoch already
/// has `churn_limit` validators queued, push the exit out by one more epoch.
pub fn initiate_validator_exit<T: EthSpec>(
    state: &mut BeaconState<T>,
    index: usize,
    spec: &ChainSpec,
) -> Result<(), Error> {
    if state
        .validators
        .get(index)
        .ok_or(Error::Internal(format!("unknown validator {}", index)))?
        .exit_epoch
        != spec.far_future_epoch
    {
        return Ok(());
    }

    let current_epoch = state.current_epoch();
    let delayed_epoch = compute_activation_exit_epoch::<T>(current_epoch, spec);

    let mut exit_queue_epoch = delayed_epoch;
    let mut exit_queue_churn = 0u64;
    for validator in state.validators.iter() {
        if validator.exit_epoch != spec.far_future_epoch && validator.exit_epoch >= delayed_epoch {
            if validator.exit_epoch.as_u64() > exit_queue_epoch.as_u64() {
                exit_queue_epoch = validator.exit_epoch;
                exit_queue_churn = 1;
            } else if validator.exit_epoch == exit_queue_epoch {
                exit_queue_churn += 1;
            }
        }
    }

    let churn_limit = get_validator_churn_limit::<T>(state, spec);
    if exit_queue_churn >= churn_limit {
        exit_queue_epoch = Epoch::new(exit_queue_epoch.as_u64() + 1);
    }

    let withdrawable_epoch =
        Epoch::new(exit_queue_epoch.as_u64() + spec.min_validator_withdrawability_delay);
    state.update_validator_at_index(index, |v| {
        v.exit_epoch = exit_queue_epoch;
        v.withdrawable_epoch = withdrawable_epoch;
    })?;
    Ok(())
}

/// `slash_validator` (§4.D "proposer slashing"/"attester slashing" effects): ejects the
/// validator, applies the immediate minimum slashing penalty, and rewards the whistleblower
/// (the block proposer, absent an explicit report) and proposer out of the slashed balance.
pub fn slash_validator<T: EthSpec>(
    state: &mut BeaconState<T>,
    slashed_index: usize,
    whistleblower_index: Option<usize>,
    spec: &ChainSpec,
) -> Result<(), Error> {
    let epoch = state.current_epoch();
    initiate_validator_exit(state, slashed_index, spec)?;

    let effective_balance = state
        .validators
        .get(slashed_index)
        .ok_or(Error::Internal(format!("unknown validator {}", slashed_index)))?
        .effective_balance;

    let withdrawable_epoch = Epoch::new(epoch.as_u64() + T::SlashingsVectorLength::to_u64());
    state.update_validator_at_index(slashed_index, |v| {
        v.slashed = true;
        v.withdrawable_epoch = std::cmp::max(v.withdrawable_epoch, withdrawable_epoch);
    })?;

    let slashings_index = epoch.as_usize() % T::SlashingsVectorLength::to_usize();
    let existing = state.slashings[slashings_index];
    state.set_slashings(epoch, existing.safe_add(effective_balance)?);

    decrease_balance(
        state,
        slashed_index,
        effective_balance / spec.min_slashing_penalty_quotient,
    )?;

    let proposer_index =
        get_beacon_proposer_index(state, state.slot, spec)? as usize;
    let whistleblower_index = whistleblower_index.unwrap_or(proposer_index);
    let whistleblower_reward = effective_balance / spec.whistleblower_reward_quotient;
    let proposer_reward = whistleblower_reward / spec.proposer_reward_quotient;

    increase_balance(state, proposer_index, proposer_reward)?;
    increase_balance(
        state,
        whistleblower_index,
        whistleblower_reward.saturating_sub(proposer_reward),
    )?;

    Ok(())
}

/// `compute_activation_exit_epoch`: the epoch activations/exits requested in `epoch` take
/// effect, `MAX_SEED_LOOKAHEAD` epochs out.
pub fn compute_activation_exit_epoch<T: EthSpec>(epoch: Epoch, spec: &ChainSpec) -> Epoch {
    Epoch::new(epoch.as_u64() + 1 + spec.max_seed_lookahead.as_u64())
}

/// `get_validator_churn_limit`: how many validators may enter/exit the registry in one epoch,
/// scaled by the active validator count.
pub fn get_validator_churn_limit<T: EthSpec>(state: &BeaconState<T>, spec: &ChainSpec) -> u64 {
    let active_count = state.active_validator_indices(state.current_epoch()).len() as u64;
    max(
        spec.min_per_epoch_churn_limit,
        active_count / spec.churn_limit_quotient,
    )
}
