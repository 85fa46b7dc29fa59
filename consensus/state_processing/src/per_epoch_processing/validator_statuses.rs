//! The `vp`/`bp` precompute (§4.F point 1): one linear scan over both epochs' pending
//! attestations builds a per-validator attestation record and an aggregate balance summary,
//! which every later pass (justification, rewards, slashings) reads instead of re-scanning the
//! attestation lists itself.

use crate::common::CommitteeCache;
use crate::errors::Error;
use types::{BeaconState, ChainSpec, EthSpec, PendingAttestation};

#[derive(Debug, Clone, Default)]
pub struct ValidatorStatus {
    pub is_active_previous_epoch: bool,
    pub is_active_current_epoch: bool,
    pub is_slashed: bool,
    pub effective_balance: u64,
    pub is_previous_epoch_attester: bool,
    pub is_previous_epoch_target_attester: bool,
    pub is_previous_epoch_head_attester: bool,
    pub is_current_epoch_attester: bool,
    pub is_current_epoch_target_attester: bool,
    /// `(inclusion_delay, proposer_index)` of the earliest previous-epoch attestation this
    /// validator appears in, used by the inclusion-delay reward.
    pub inclusion_info: Option<(u64, usize)>,
}

#[derive(Debug, Clone, Default)]
pub struct BalanceSummary {
    pub total_active: u64,
    pub previous_epoch_attesters: u64,
    pub previous_epoch_target_attesters: u64,
    pub previous_epoch_head_attesters: u64,
    pub current_epoch_attesters: u64,
    pub current_epoch_target_attesters: u64,
}

pub struct EpochPrecompute {
    pub statuses: Vec<ValidatorStatus>,
    pub balances: BalanceSummary,
}

/// Resolves `aggregation_bits` against the committee `(data.slot, data.index)` selects, per
/// attestation, into the absolute validator indices that actually attested.
fn attesting_indices<T: EthSpec>(
    cache: &CommitteeCache,
    attestation: &PendingAttestation<T>,
) -> Result<Vec<usize>, Error> {
    let committees_per_slot = cache.committees_per_slot;
    if attestation.data.index >= committees_per_slot {
        return Err(Error::ShapeViolation(format!(
            "committee index {} >= committee count {}",
            attestation.data.index, committees_per_slot
        )));
    }
    let slot_offset = attestation.data.slot.as_u64() % T::slots_per_epoch();
    let index_in_epoch = slot_offset * committees_per_slot + attestation.data.index;
    let total_committees = committees_per_slot * T::slots_per_epoch();
    let committee = cache.committee_slice(index_in_epoch, total_committees);

    if attestation.aggregation_bits.len() != committee.len() {
        return Err(Error::ShapeViolation(format!(
            "aggregation bitfield length {} != committee length {}",
            attestation.aggregation_bits.len(),
            committee.len()
        )));
    }

    Ok(committee
        .into_iter()
        .enumerate()
        .filter(|(i, _)| attestation.aggregation_bits.get(*i).unwrap_or(false))
        .map(|(_, validator_index)| validator_index)
        .collect::<Vec<_>>())
}

pub fn process<T: EthSpec>(
    state: &BeaconState<T>,
    spec: &ChainSpec,
) -> Result<EpochPrecompute, Error> {
    let previous_epoch = state.previous_epoch();
    let current_epoch = state.current_epoch();

    let previous_cache = CommitteeCache::build(state, previous_epoch, spec)?;
    let current_cache = CommitteeCache::build(state, current_epoch, spec)?;

    let mut statuses: Vec<ValidatorStatus> = state
        .validators
        .iter()
        .map(|v| ValidatorStatus {
            is_active_previous_epoch: v.is_active_at(previous_epoch),
            is_active_current_epoch: v.is_active_at(current_epoch),
            is_slashed: v.slashed,
            effective_balance: v.effective_balance,
            ..Default::default()
        })
        .collect();

    for attestation in state.previous_epoch_attestations.iter() {
        let indices = attesting_indices(&previous_cache, attestation)?;
        let is_matching_target = attestation.data.target.epoch == previous_epoch;
        let block_root_at_slot = state.block_roots
            [attestation.data.slot.as_usize() % T::slots_per_historical_root()];
        let is_matching_head =
            is_matching_target && attestation.data.beacon_block_root == block_root_at_slot;

        for index in indices {
            let status = &mut statuses[index];
            status.is_previous_epoch_attester = true;
            if is_matching_target {
                status.is_previous_epoch_target_attester = true;
            }
            if is_matching_head {
                status.is_previous_epoch_head_attester = true;
            }
            let candidate = (attestation.inclusion_delay.as_u64(), attestation.proposer_index as usize);
            status.inclusion_info = Some(match status.inclusion_info {
                Some(existing) if existing.0 <= candidate.0 => existing,
                _ => candidate,
            });
        }
    }

    for attestation in state.current_epoch_attestations.iter() {
        let indices = attesting_indices(&current_cache, attestation)?;
        let is_matching_target = attestation.data.target.epoch == current_epoch;

        for index in indices {
            let status = &mut statuses[index];
            status.is_current_epoch_attester = true;
            if is_matching_target {
                status.is_current_epoch_target_attester = true;
            }
        }
    }

    let mut balances = BalanceSummary::default();
    for status in &statuses {
        if status.is_active_current_epoch {
            balances.total_active = balances.total_active.saturating_add(status.effective_balance);
        }
        if status.is_active_previous_epoch && status.is_previous_epoch_attester {
            balances.previous_epoch_attesters =
                balances.previous_epoch_attesters.saturating_add(status.effective_balance);
        }
        if status.is_previous_epoch_target_attester {
            balances.previous_epoch_target_attesters = balances
                .previous_epoch_target_attesters
                .saturating_add(status.effective_balance);
        }
        if status.is_previous_epoch_head_attester {
            balances.previous_epoch_head_attesters = balances
                .previous_epoch_head_attesters
                .saturating_add(status.effective_balance);
        }
        if status.is_current_epoch_attester {
            balances.current_epoch_attesters =
                balances.current_epoch_attesters.saturating_add(status.effective_balance);
        }
        if status.is_current_epoch_target_attester {
            balances.current_epoch_target_attesters = balances
                .current_epoch_target_attesters
                .saturating_add(status.effective_balance);
        }
    }
    // EFFECTIVE_BALANCE_INCREMENT floor, matching `get_total_balance`: never below one
    // increment, so reward computations never divide by zero on an empty/near-empty registry.
    balances.total_active = balances.total_active.max(spec.effective_balance_increment);

    Ok(EpochPrecompute { statuses, balances })
}
