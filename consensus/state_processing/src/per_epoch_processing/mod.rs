//! The epoch boundary transition (§4.F), run by [`crate::per_slot_processing::process_slot`]
//! every time `(slot + 1) % SLOTS_PER_EPOCH == 0`. Six passes, each reading (and sometimes
//! extending) the output of the last: a precompute over both epochs' attestations, justification
//! and finalization, rewards and penalties, registry updates, slashings, and the housekeeping
//! that rolls the state over into the next epoch.

mod final_updates;
mod rewards;
mod validator_statuses;

use crate::common::{compute_activation_exit_epoch, get_validator_churn_limit, initiate_validator_exit};
use crate::errors::Error;
use ssz_types::BitVector;
use typenum::{Unsigned, U4};
use types::{BeaconState, ChainSpec, Checkpoint, Epoch, EthSpec};
use validator_statuses::EpochPrecompute;

pub use validator_statuses::{BalanceSummary, ValidatorStatus};

pub fn process_epoch<T: EthSpec>(state: &mut BeaconState<T>, spec: &ChainSpec) -> Result<(), Error> {
    let precompute = validator_statuses::process(state, spec)?;

    process_justification_and_finalization(state, &precompute)?;
    rewards::process_rewards_and_penalties(state, &precompute, spec)?;
    process_registry_updates(state, spec)?;
    process_slashings(state, &precompute, spec)?;
    final_updates::process_final_updates(state, spec)?;

    Ok(())
}

/// The four-bit "supermajority link" ledger (§4.F point 2): `justification_bits[0]` is whether
/// the current epoch just became justified, `[1]` the previous epoch, `[2]`/`[3]` the two before
/// that. Every epoch shifts the window forward by one and checks the three- and two-link
/// finalization rules against the shifted bits.
fn process_justification_and_finalization<T: EthSpec>(
    state: &mut BeaconState<T>,
    precompute: &EpochPrecompute,
) -> Result<(), Error> {
    let current_epoch = state.current_epoch();
    if current_epoch.as_u64() <= 1 {
        return Ok(());
    }
    let previous_epoch = state.previous_epoch();

    let old_previous_justified = state.previous_justified_checkpoint;
    let old_current_justified = state.current_justified_checkpoint;

    state.set_previous_justified_checkpoint(state.current_justified_checkpoint);

    let mut bits = [false; 4];
    for i in 0..3 {
        bits[i + 1] = state
            .justification_bits
            .get(i)
            .map_err(|e| Error::Internal(format!("{:?}", e)))?;
    }

    let total_active = precompute.balances.total_active;
    let two_thirds = |balance: u64| balance.saturating_mul(3) >= total_active.saturating_mul(2);

    if two_thirds(precompute.balances.previous_epoch_target_attesters) {
        state.set_current_justified_checkpoint(Checkpoint {
            epoch: previous_epoch,
            root: checkpoint_block_root(state, previous_epoch)?,
        });
        bits[1] = true;
    }
    if two_thirds(precompute.balances.current_epoch_target_attesters) {
        state.set_current_justified_checkpoint(Checkpoint {
            epoch: current_epoch,
            root: checkpoint_block_root(state, current_epoch)?,
        });
        bits[0] = true;
    }

    let mut packed = BitVector::<U4>::new();
    for (i, bit) in bits.iter().enumerate() {
        packed
            .set(i, *bit)
            .map_err(|e| Error::Internal(format!("{:?}", e)))?;
    }
    state.set_justification_bits(packed);

    // Three-epoch-old previous-justified link: bits 1..4 (the three epochs ending at the one
    // just processed) all set.
    if bits[1] && bits[2] && bits[3] && old_previous_justified.epoch.as_u64() + 3 == current_epoch.as_u64() {
        state.set_finalized_checkpoint(old_previous_justified);
    }
    // Two-epoch-old previous-justified link.
    if bits[1] && bits[2] && old_previous_justified.epoch.as_u64() + 2 == current_epoch.as_u64() {
        state.set_finalized_checkpoint(old_previous_justified);
    }
    // Two-epoch-old current-justified link.
    if bits[0] && bits[1] && old_current_justified.epoch.as_u64() + 2 == current_epoch.as_u64() {
        state.set_finalized_checkpoint(old_current_justified);
    }
    // One-epoch-old current-justified link.
    if bits[0] && old_current_justified.epoch.as_u64() + 1 == current_epoch.as_u64() {
        state.set_finalized_checkpoint(old_current_justified);
    }

    Ok(())
}

fn checkpoint_block_root<T: EthSpec>(
    state: &BeaconState<T>,
    epoch: Epoch,
) -> Result<types::Hash256, Error> {
    let slot = epoch.start_slot::<T>();
    let index = slot.as_usize() % T::slots_per_historical_root();
    Ok(state.block_roots[index])
}

/// Activation-eligibility marking, ejections, and the churn-limited activation queue (§4.F
/// point 4).
fn process_registry_updates<T: EthSpec>(state: &mut BeaconState<T>, spec: &ChainSpec) -> Result<(), Error> {
    let current_epoch = state.current_epoch();
    let activation_exit_epoch = compute_activation_exit_epoch::<T>(current_epoch, spec);

    let mut eligible = Vec::new();
    let mut to_eject = Vec::new();
    for (index, validator) in state.validators.iter().enumerate() {
        if validator.is_eligible_for_activation_queue(spec) {
            eligible.push(index);
        }
        if validator.is_active_at(current_epoch)
            && validator.effective_balance <= spec.ejection_balance
            && validator.exit_epoch == spec.far_future_epoch
        {
            to_eject.push(index);
        }
    }

    for index in eligible {
        state.update_validator_at_index(index, |v| {
            v.activation_eligibility_epoch = current_epoch;
        })?;
    }

    for index in to_eject {
        initiate_validator_exit(state, index, spec)?;
    }

    let churn_limit = get_validator_churn_limit::<T>(state, spec);
    let mut activation_queue: Vec<usize> = state
        .validators
        .iter()
        .enumerate()
        .filter(|(_, v)| {
            v.activation_eligibility_epoch != spec.far_future_epoch
                && v.activation_epoch == spec.far_future_epoch
        })
        .map(|(index, _)| index)
        .collect();
    activation_queue.sort_by_key(|&index| {
        (
            state.validators[index].activation_eligibility_epoch.as_u64(),
            index as u64,
        )
    });

    for index in activation_queue.into_iter().take(churn_limit as usize) {
        state.update_validator_at_index(index, |v| {
            v.activation_epoch = activation_exit_epoch;
        })?;
    }

    Ok(())
}

/// Distributes the total slashed balance of the current `EPOCHS_PER_SLASHINGS_VECTOR` window
/// proportionally across every still-slashed, still-not-withdrawable validator (§4.F point 5).
fn process_slashings<T: EthSpec>(
    state: &mut BeaconState<T>,
    precompute: &EpochPrecompute,
    spec: &ChainSpec,
) -> Result<(), Error> {
    let current_epoch = state.current_epoch();
    let total_slashed: u64 = state
        .slashings
        .iter()
        .fold(0u64, |acc, &v| acc.saturating_add(v));
    let adjusted_total_slashing_balance = total_slashed
        .saturating_mul(spec.proportional_slashing_multiplier)
        .min(precompute.balances.total_active);

    for (index, status) in precompute.statuses.iter().enumerate() {
        let validator = &state.validators[index];
        let withdrawable_matches = validator.withdrawable_epoch.as_u64()
            == current_epoch.as_u64() + T::SlashingsVectorLength::to_u64() / 2;
        if status.is_slashed && withdrawable_matches {
            let increment = spec.effective_balance_increment;
            let penalty_numerator = (status.effective_balance / increment)
                .saturating_mul(adjusted_total_slashing_balance);
            let penalty = (penalty_numerator / precompute.balances.total_active) * increment;
            crate::common::decrease_balance(state, index, penalty)?;
        }
    }

    Ok(())
}
