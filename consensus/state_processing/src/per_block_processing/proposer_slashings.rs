//! Two conflicting signed headers from the same proposer at the same slot (§4.D "proposer
//! slashing"): if both signatures check out, the proposer is equivocating and gets slashed.

use crate::common::{get_domain, slash_validator};
use crate::errors::{verify, Error};
use bls::{SignatureSet, SignedMessage};
use types::{BeaconState, ChainSpec, Domain, EthSpec, ProposerSlashing};

pub fn verify_proposer_slashing<T: EthSpec>(
    slashing: &ProposerSlashing,
    state: &BeaconState<T>,
    spec: &ChainSpec,
) -> Result<(), Error> {
    let header_1 = &slashing.signed_header_1.message;
    let header_2 = &slashing.signed_header_2.message;

    verify!(
        header_1.slot == header_2.slot,
        Error::ShapeViolation("proposer slashing headers at different slots".into())
    );
    verify!(
        header_1.proposer_index == header_2.proposer_index,
        Error::ShapeViolation("proposer slashing headers from different proposers".into())
    );
    verify!(
        header_1 != header_2,
        Error::ShapeViolation("proposer slashing headers are identical".into())
    );

    let proposer = state
        .validators
        .get(header_1.proposer_index as usize)
        .ok_or(Error::Internal(format!(
            "unknown proposer index {}",
            header_1.proposer_index
        )))?;
    verify!(
        !proposer.slashed,
        Error::StateInvariantViolation("proposer already slashed".into())
    );
    verify!(
        proposer.is_active_at(header_1.slot.epoch::<T>()),
        Error::StateInvariantViolation("proposer not active at slashing slot".into())
    );

    let domain = get_domain(state, Domain::BeaconProposer, header_1.slot.epoch::<T>(), spec);
    for (header, signature) in [
        (header_1, &slashing.signed_header_1.signature),
        (header_2, &slashing.signed_header_2.signature),
    ] {
        let signing_root = crate::common::compute_signing_root(header.canonical_root(), domain);
        verify!(
            bls::verify(&proposer.pubkey, signing_root.as_bytes(), signature),
            Error::SignatureFailure("proposer slashing header signature")
        );
    }

    Ok(())
}

pub fn signature_set<T: EthSpec>(
    slashing: &ProposerSlashing,
    state: &BeaconState<T>,
    spec: &ChainSpec,
) -> Result<SignatureSet, Error> {
    let mut set = SignatureSet::new();
    let header_1 = &slashing.signed_header_1.message;
    let proposer = state
        .validators
        .get(header_1.proposer_index as usize)
        .ok_or(Error::Internal(format!(
            "unknown proposer index {}",
            header_1.proposer_index
        )))?;
    let domain = get_domain(state, Domain::BeaconProposer, header_1.slot.epoch::<T>(), spec);

    let root_1 = crate::common::compute_signing_root(header_1.canonical_root(), domain);
    set.push(SignedMessage::new(
        &[&proposer.pubkey],
        root_1.as_bytes().to_vec(),
        slashing.signed_header_1.signature.clone(),
    )?);

    let header_2 = &slashing.signed_header_2.message;
    let root_2 = crate::common::compute_signing_root(header_2.canonical_root(), domain);
    set.push(SignedMessage::new(
        &[&proposer.pubkey],
        root_2.as_bytes().to_vec(),
        slashing.signed_header_2.signature.clone(),
    )?);

    Ok(set)
}

pub fn process_proposer_slashing<T: EthSpec>(
    state: &mut BeaconState<T>,
    slashing: &ProposerSlashing,
    spec: &ChainSpec,
) -> Result<(), Error> {
    slash_validator(
        state,
        slashing.signed_header_1.message.proposer_index as usize,
        None,
        spec,
    )
}
