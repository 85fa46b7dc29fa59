//! `CommitteeAssignments` (§4.C, §9 Open Question #2): the per-epoch map from validator index to
//! the single committee it sits on. Unlike [`super::get_beacon_committee`], which answers "who is
//! on this committee", this answers the dual query a validator client would ask of duties —
//! listed here because the selection logic itself belongs next to its sibling helpers, not
//! because validator duties are otherwise in scope.

use super::{get_beacon_committee, CommitteeCacheStore};
use crate::errors::Error;
use std::collections::HashMap;
use types::{BeaconState, ChainSpec, Epoch, EthSpec, Slot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitteeAssignment {
    pub committee: Vec<usize>,
    pub committee_index: u64,
    pub slot: Slot,
}

/// Builds the assignment map for every slot in `epoch`. Per Open Question #2, `state` is cloned
/// with shared caches before any per-slot work runs, so the original behavior of leaving the
/// caller's slot advanced is never observable here.
pub fn committee_assignments<T: EthSpec>(
    state: &BeaconState<T>,
    epoch: Epoch,
    spec: &ChainSpec,
) -> Result<HashMap<usize, CommitteeAssignment>, Error> {
    let state = state.clone_with_shared_caches();
    let mut cache_store = CommitteeCacheStore::default();
    let cache = cache_store.get_or_build(&state, epoch, spec)?;

    let mut assignments = HashMap::new();
    let start_slot = epoch.start_slot::<T>().as_u64();
    for slot_offset in 0..T::slots_per_epoch() {
        let slot = Slot::new(start_slot + slot_offset);
        for committee_index in 0..cache.committees_per_slot {
            let committee = get_beacon_committee::<T>(cache, slot, committee_index)?;
            for &validator_index in &committee {
                assignments.insert(
                    validator_index,
                    CommitteeAssignment {
                        committee: committee.clone(),
                        committee_index,
                        slot,
                    },
                );
            }
        }
    }

    Ok(assignments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Eth1Data, MinimalEthSpec, Validator};

    fn genesis_state_with_active_validators(count: usize, spec: &ChainSpec) -> BeaconState<MinimalEthSpec> {
        let mut state: BeaconState<MinimalEthSpec> = BeaconState::empty(0, Eth1Data::default(), spec);
        for i in 0..count {
            let mut pubkey_bytes = [0u8; 48];
            pubkey_bytes[0..8].copy_from_slice(&(i as u64).to_le_bytes());
            let validator = Validator::new_for_deposit(
                bls::PublicKeyBytes::from_bytes(&pubkey_bytes).unwrap(),
                types::Hash256::zero(),
                32_000_000_000,
                spec,
            );
            let index = state.push_validator(validator, 32_000_000_000).unwrap();
            state
                .update_validator_at_index(index, |v| {
                    v.activation_eligibility_epoch = Epoch::new(0);
                    v.activation_epoch = Epoch::new(0);
                })
                .unwrap();
        }
        state
    }

    #[test]
    fn every_active_validator_gets_exactly_one_assignment() {
        let spec = ChainSpec::minimal();
        let state = genesis_state_with_active_validators(64, &spec);
        let epoch = state.current_epoch();

        let assignments = committee_assignments(&state, epoch, &spec).unwrap();
        let active = state.active_validator_indices(epoch);
        assert_eq!(assignments.len(), active.len());
        for index in active {
            assert!(assignments.contains_key(&index));
        }
    }

    #[test]
    fn does_not_mutate_caller_state() {
        let spec = ChainSpec::minimal();
        let state = genesis_state_with_active_validators(64, &spec);
        let pre_slot = state.slot;
        let epoch = state.current_epoch();

        committee_assignments(&state, epoch, &spec).unwrap();
        assert_eq!(state.slot, pre_slot);
    }
}
