//! Two attestations whose data is mutually slashable (double-vote or surround-vote, §4.D
//! "attester slashing"): every validator index present in both attestations' attesting sets and
//! still slashable gets `slash_validator`'d.

use crate::common::{get_domain, slash_validator};
use crate::errors::{verify, Error};
use bls::{SignatureSet, SignedMessage};
use std::collections::BTreeSet;
use types::{AttesterSlashing, BeaconState, ChainSpec, Domain, EthSpec, IndexedAttestation};

/// `is_slashable_attestation_data`: a double vote (same target epoch, different data) or a
/// surround vote (one attestation's source/target interval strictly contains the other's).
fn is_slashable_attestation_data(a: &types::AttestationData, b: &types::AttestationData) -> bool {
    let double_vote = a != b && a.target.epoch == b.target.epoch;
    let surround_vote =
        a.source.epoch < b.source.epoch && b.target.epoch < a.target.epoch;
    double_vote || surround_vote
}

pub fn is_valid_indexed_attestation<T: EthSpec>(
    indexed: &IndexedAttestation<T>,
    state: &BeaconState<T>,
    spec: &ChainSpec,
) -> Result<(), Error> {
    verify!(
        !indexed.attesting_indices.is_empty(),
        Error::ShapeViolation("indexed attestation has no attesting indices".into())
    );

    let sorted = indexed
        .attesting_indices
        .windows(2)
        .all(|pair| pair[0] < pair[1]);
    verify!(
        sorted,
        Error::ShapeViolation("indexed attestation indices not sorted/unique".into())
    );

    verify!(
        signature_set(indexed, state, spec)?.verify(),
        Error::SignatureFailure("indexed attestation aggregate signature")
    );

    Ok(())
}

pub fn signature_set<T: EthSpec>(
    indexed: &IndexedAttestation<T>,
    state: &BeaconState<T>,
    spec: &ChainSpec,
) -> Result<SignatureSet, Error> {
    let pubkeys = indexed
        .attesting_indices
        .iter()
        .map(|&index| {
            state
                .validators
                .get(index as usize)
                .map(|v| &v.pubkey)
                .ok_or(Error::Internal(format!("unknown attester index {}", index)))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let domain = get_domain(state, Domain::BeaconAttester, indexed.data.target.epoch, spec);
    let signing_root = crate::common::compute_signing_root(indexed.data.canonical_root(), domain);

    let mut set = SignatureSet::new();
    set.push(SignedMessage::new(
        &pubkeys,
        signing_root.as_bytes().to_vec(),
        indexed.signature.clone(),
    )?);
    Ok(set)
}

pub fn verify_attester_slashing<T: EthSpec>(
    slashing: &AttesterSlashing<T>,
    state: &BeaconState<T>,
    spec: &ChainSpec,
) -> Result<(), Error> {
    verify!(
        is_slashable_attestation_data(&slashing.attestation_1.data, &slashing.attestation_2.data),
        Error::StateInvariantViolation("attestations are not mutually slashable".into())
    );
    is_valid_indexed_attestation(&slashing.attestation_1, state, spec)?;
    is_valid_indexed_attestation(&slashing.attestation_2, state, spec)?;
    Ok(())
}

/// The indices present in both attestations' attesting sets that are still slashable
/// (not already slashed, and active-or-pending as of the current epoch).
pub fn slashable_indices<T: EthSpec>(
    slashing: &AttesterSlashing<T>,
    state: &BeaconState<T>,
) -> Vec<usize> {
    let set_1: BTreeSet<u64> = slashing.attestation_1.attesting_indices.iter().copied().collect();
    let set_2: BTreeSet<u64> = slashing.attestation_2.attesting_indices.iter().copied().collect();

    let current_epoch = state.current_epoch();
    set_1
        .intersection(&set_2)
        .filter_map(|&index| {
            let validator = state.validators.get(index as usize)?;
            if !validator.slashed
                && validator.activation_epoch <= current_epoch
                && current_epoch < validator.withdrawable_epoch
            {
                Some(index as usize)
            } else {
                None
            }
        })
        .collect()
}

pub fn process_attester_slashing<T: EthSpec>(
    state: &mut BeaconState<T>,
    slashing: &AttesterSlashing<T>,
    spec: &ChainSpec,
) -> Result<(), Error> {
    let mut indices = slashable_indices(slashing, state);
    indices.sort_unstable();
    for index in indices {
        slash_validator(state, index, None, spec)?;
    }
    Ok(())
}
