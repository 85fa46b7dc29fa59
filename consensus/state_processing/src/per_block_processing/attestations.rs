//! `process_attestation` (§4.D "attestation"): validates an attestation against the committee it
//! claims to come from and the justified checkpoint it claims to extend, then files it as a
//! `PendingAttestation` for the epoch processor to resolve into rewards later.

use crate::common::{get_beacon_committee, get_domain, CommitteeCacheStore};
use crate::errors::{verify, Error};
use bls::{SignatureSet, SignedMessage};
use types::{Attestation, BeaconState, ChainSpec, Domain, EthSpec, PendingAttestation};

/// `VerifyAttestationNoVerifySignature` (§4.D): every shape/state check except the signature
/// itself, so the batch-verify and per-attestation-verify call paths share one implementation.
pub fn validate_attestation<T: EthSpec>(
    attestation: &Attestation<T>,
    state: &BeaconState<T>,
    committee_cache: &mut CommitteeCacheStore,
    spec: &ChainSpec,
) -> Result<(), Error> {
    let data = &attestation.data;

    verify!(
        data.slot.as_u64() + spec.min_attestation_inclusion_delay <= state.slot.as_u64(),
        Error::StateInvariantViolation("attestation included before its inclusion delay".into())
    );
    verify!(
        state.slot.as_u64() <= data.slot.as_u64() + T::slots_per_epoch(),
        Error::StateInvariantViolation("attestation too old".into())
    );

    let target_epoch = data.target.epoch;
    verify!(
        target_epoch == data.slot.epoch::<T>(),
        Error::StateInvariantViolation("attestation target epoch does not match slot".into())
    );

    let current_epoch = state.current_epoch();
    let previous_epoch = state.previous_epoch();
    verify!(
        target_epoch == current_epoch || target_epoch == previous_epoch,
        Error::StateInvariantViolation("attestation targets neither current nor previous epoch".into())
    );

    let expected_source = if target_epoch == current_epoch {
        state.current_justified_checkpoint
    } else {
        state.previous_justified_checkpoint
    };
    verify!(
        data.source == expected_source,
        Error::StateInvariantViolation("attestation source checkpoint mismatch".into())
    );

    let committee_epoch = data.slot.epoch::<T>();
    let cache = committee_cache.get_or_build(state, committee_epoch, spec)?;
    verify!(
        data.index < cache.committees_per_slot,
        Error::ShapeViolation(format!(
            "committee index {} >= committee count {}",
            data.index, cache.committees_per_slot
        ))
    );

    let committee = get_beacon_committee::<T>(cache, data.slot, data.index)?;
    verify!(
        attestation.aggregation_bits.len() == committee.len(),
        Error::ShapeViolation(format!(
            "aggregation bitfield length {} != committee length {}",
            attestation.aggregation_bits.len(),
            committee.len()
        ))
    );

    Ok(())
}

fn attesting_pubkeys<'a, T: EthSpec>(
    attestation: &Attestation<T>,
    committee: &[usize],
    state: &'a BeaconState<T>,
) -> Result<Vec<&'a bls::PublicKeyBytes>, Error> {
    committee
        .iter()
        .enumerate()
        .filter(|(i, _)| attestation.aggregation_bits.get(*i).unwrap_or(false))
        .map(|(_, &index)| {
            state
                .validators
                .get(index)
                .map(|v| &v.pubkey)
                .ok_or(Error::Internal(format!("unknown attester index {}", index)))
        })
        .collect()
}

pub fn signature_set<T: EthSpec>(
    attestation: &Attestation<T>,
    state: &BeaconState<T>,
    committee_cache: &mut CommitteeCacheStore,
    spec: &ChainSpec,
) -> Result<SignatureSet, Error> {
    let committee_epoch = attestation.data.slot.epoch::<T>();
    let cache = committee_cache.get_or_build(state, committee_epoch, spec)?;
    let committee = get_beacon_committee::<T>(cache, attestation.data.slot, attestation.data.index)?;
    let pubkeys = attesting_pubkeys(attestation, &committee, state)?;

    let domain = get_domain(state, Domain::BeaconAttester, attestation.data.target.epoch, spec);
    let signing_root = crate::common::compute_signing_root(attestation.data.canonical_root(), domain);

    let mut set = SignatureSet::new();
    set.push(SignedMessage::new(
        &pubkeys,
        signing_root.as_bytes().to_vec(),
        attestation.signature.clone(),
    )?);
    Ok(set)
}

pub fn verify_attestation<T: EthSpec>(
    attestation: &Attestation<T>,
    state: &BeaconState<T>,
    committee_cache: &mut CommitteeCacheStore,
    spec: &ChainSpec,
) -> Result<(), Error> {
    validate_attestation(attestation, state, committee_cache, spec)?;
    verify!(
        signature_set(attestation, state, committee_cache, spec)?.verify(),
        Error::SignatureFailure("attestation aggregate signature")
    );
    Ok(())
}

pub fn process_attestation<T: EthSpec>(
    state: &mut BeaconState<T>,
    attestation: &Attestation<T>,
    spec: &ChainSpec,
) -> Result<(), Error> {
    let proposer_index = crate::common::get_beacon_proposer_index(state, state.slot, spec)?;
    let inclusion_delay = types::Slot::new(state.slot.as_u64() - attestation.data.slot.as_u64());

    let pending = PendingAttestation {
        aggregation_bits: attestation.aggregation_bits.clone(),
        data: attestation.data.clone(),
        inclusion_delay,
        proposer_index: proposer_index as u64,
    };

    if attestation.data.target.epoch == state.current_epoch() {
        state.push_current_epoch_attestation(pending)?;
    } else {
        state.push_previous_epoch_attestation(pending)?;
    }

    Ok(())
}
