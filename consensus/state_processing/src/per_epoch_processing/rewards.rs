//! Base rewards, source/target/head attestation rewards, the inclusion-delay proposer split,
//! and inactivity penalties (§4.F point 3). Every term here is scaled off one quantity, the base
//! reward, which the real phase-0 spec derives from the integer square root of the total active
//! balance so a chain's total issuance grows roughly with `sqrt(total_stake)`.

use super::validator_statuses::EpochPrecompute;
use crate::common::{decrease_balance, increase_balance};
use crate::errors::Error;
use integer_sqrt::IntegerSquareRoot;
use types::{BeaconState, ChainSpec, EthSpec};

fn base_reward(effective_balance: u64, total_active_balance: u64, spec: &ChainSpec) -> u64 {
    let balance_sqrt = total_active_balance.integer_sqrt();
    if balance_sqrt == 0 {
        return 0;
    }
    effective_balance
        .saturating_mul(spec.base_reward_factor)
        / balance_sqrt
        / spec.base_rewards_per_epoch
}

pub fn process_rewards_and_penalties<T: EthSpec>(
    state: &mut BeaconState<T>,
    precompute: &EpochPrecompute,
    spec: &ChainSpec,
) -> Result<(), Error> {
    if state.current_epoch().as_u64() == 0 {
        // No previous epoch to have attested in yet; genesis epoch earns/loses nothing.
        return Ok(());
    }

    let total_active = precompute.balances.total_active;
    let finality_delay = state
        .previous_epoch()
        .as_u64()
        .saturating_sub(state.finalized_checkpoint.epoch.as_u64());
    let in_inactivity_leak = finality_delay > spec.min_epochs_to_inactivity_penalty;

    for (index, status) in precompute.statuses.iter().enumerate() {
        if !status.is_active_previous_epoch {
            continue;
        }

        let reward = base_reward(status.effective_balance, total_active, spec);
        let mut rewards_total = 0u64;
        let mut penalties_total = 0u64;

        if status.is_previous_epoch_attester {
            if in_inactivity_leak {
                rewards_total = rewards_total.saturating_add(reward);
            } else {
                let scaled = reward.saturating_mul(precompute.balances.previous_epoch_attesters)
                    / total_active;
                rewards_total = rewards_total.saturating_add(scaled);
            }
        } else {
            penalties_total = penalties_total.saturating_add(reward);
        }

        if status.is_previous_epoch_target_attester {
            if in_inactivity_leak {
                rewards_total = rewards_total.saturating_add(reward);
            } else {
                let scaled = reward
                    .saturating_mul(precompute.balances.previous_epoch_target_attesters)
                    / total_active;
                rewards_total = rewards_total.saturating_add(scaled);
            }
        } else {
            penalties_total = penalties_total.saturating_add(reward);
        }

        if status.is_previous_epoch_head_attester {
            if in_inactivity_leak {
                rewards_total = rewards_total.saturating_add(reward);
            } else {
                let scaled = reward.saturating_mul(precompute.balances.previous_epoch_head_attesters)
                    / total_active;
                rewards_total = rewards_total.saturating_add(scaled);
            }
        } else {
            penalties_total = penalties_total.saturating_add(reward);
        }

        if let Some((inclusion_delay, proposer_index)) = status.inclusion_info {
            if status.is_previous_epoch_attester {
                let proposer_reward = reward / spec.proposer_reward_quotient;
                increase_balance(state, proposer_index, proposer_reward)?;
                let max_attester_reward = reward.saturating_sub(proposer_reward);
                rewards_total = rewards_total
                    .saturating_add(max_attester_reward / inclusion_delay.max(1));
            }
        }

        if in_inactivity_leak && !status.is_previous_epoch_target_attester {
            // The inactivity penalty (§4.F point 3 "inactivity leak"): validators that failed to
            // attest to the correct target lose balance proportional to how long finality has
            // stalled, so an offline minority can't indefinitely block the chain from finalizing.
            penalties_total = penalties_total.saturating_add(
                status.effective_balance.saturating_mul(finality_delay) / spec.inactivity_penalty_quotient,
            );
        }

        increase_balance(state, index, rewards_total)?;
        decrease_balance(state, index, penalties_total)?;
    }

    Ok(())
}
