//! The per-epoch housekeeping (§4.F point 6) that rolls the state over for the next epoch: eth1
//! voting period reset, effective-balance hysteresis, the randao mix and slashings vector
//! carry-forward, the historical-roots checkpoint, and rotating this epoch's attestations into
//! `previous_epoch_attestations`.

use crate::errors::Error;
use tree_hash::TreeHash;
use types::{BeaconState, ChainSpec, Epoch, EthSpec, Hash256};

pub fn process_final_updates<T: EthSpec>(state: &mut BeaconState<T>, spec: &ChainSpec) -> Result<(), Error> {
    let current_epoch = state.current_epoch();
    let next_epoch = Epoch::new(current_epoch.as_u64() + 1);

    if next_epoch.as_u64() % spec.epochs_per_eth1_voting_period == 0 {
        state.clear_eth1_data_votes();
    }

    update_effective_balances(state, spec)?;

    state.set_randao_mix(next_epoch, state.get_randao_mix(current_epoch));

    state.set_slashings(next_epoch, 0);

    // A simplified stand-in for the real `HistoricalBatch` SSZ container: the real spec commits
    // a full container of both root vectors every period, but since those vectors are already
    // individually Merkleized fields of this state, folding their two roots together here
    // captures the same "periodic commitment" property without a second parallel container type.
    let period = T::slots_per_historical_root() as u64 / T::slots_per_epoch();
    if period > 0 && next_epoch.as_u64() % period == 0 {
        let block_roots_root = state.block_roots.tree_hash_root();
        let state_roots_root = state.state_roots.tree_hash_root();
        let mut input = Vec::with_capacity(64);
        input.extend_from_slice(block_roots_root.as_slice());
        input.extend_from_slice(state_roots_root.as_slice());
        state.push_historical_root(Hash256::from_slice(&eth2_hashing::hash(&input)))?;
    }

    state.rotate_epoch_attestations();

    Ok(())
}

/// Effective-balance hysteresis (§4.F point 6): only moves a validator's effective balance when
/// its actual balance has drifted far enough from it, so a balance oscillating near a threshold
/// doesn't dirty `validators` (and its Merkle proof) every single epoch.
fn update_effective_balances<T: EthSpec>(state: &mut BeaconState<T>, spec: &ChainSpec) -> Result<(), Error> {
    let increment = spec.effective_balance_increment;
    let downward_threshold = increment * spec.hysteresis_downward_multiplier / spec.hysteresis_quotient;
    let upward_threshold = increment * spec.hysteresis_upward_multiplier / spec.hysteresis_quotient;

    let updates: Vec<(usize, u64)> = state
        .validators
        .iter()
        .enumerate()
        .filter_map(|(index, validator)| {
            let balance = state.balances.get(index).copied().unwrap_or(0);
            if balance + downward_threshold < validator.effective_balance
                || validator.effective_balance + upward_threshold < balance
            {
                let new_effective = (balance - balance % increment).min(spec.max_effective_balance);
                if new_effective != validator.effective_balance {
                    return Some((index, new_effective));
                }
            }
            None
        })
        .collect();

    for (index, new_effective) in updates {
        state.update_validator_at_index(index, |v| {
            v.effective_balance = new_effective;
        })?;
    }

    Ok(())
}
