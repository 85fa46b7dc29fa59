//! `process_voluntary_exit` (§4.D "voluntary exit"): a validator opting out of the active set
//! once its minimum bonded period has elapsed.

use crate::common::{compute_signing_root, get_domain, initiate_validator_exit};
use crate::errors::{verify, Error};
use bls::{SignatureSet, SignedMessage};
use tree_hash::TreeHash;
use types::{BeaconState, ChainSpec, Domain, EthSpec, Hash256, SignedVoluntaryExit};

pub fn verify_voluntary_exit<T: EthSpec>(
    exit: &SignedVoluntaryExit,
    state: &BeaconState<T>,
    spec: &ChainSpec,
) -> Result<(), Error> {
    let validator = state
        .validators
        .get(exit.message.validator_index as usize)
        .ok_or(Error::Internal(format!(
            "unknown validator index {}",
            exit.message.validator_index
        )))?;

    let current_epoch = state.current_epoch();
    verify!(
        validator.is_active_at(current_epoch),
        Error::StateInvariantViolation("exiting validator is not active".into())
    );
    verify!(
        validator.exit_epoch == spec.far_future_epoch,
        Error::StateInvariantViolation("validator has already initiated exit".into())
    );
    verify!(
        current_epoch >= exit.message.epoch,
        Error::StateInvariantViolation("voluntary exit not yet valid".into())
    );
    verify!(
        current_epoch.as_u64() >= validator.activation_epoch.as_u64() + spec.shard_committee_period,
        Error::StateInvariantViolation(
            "validator has not been active long enough to exit".into()
        )
    );

    verify!(
        signature_set(exit, state, spec)?.verify(),
        Error::SignatureFailure("voluntary exit signature")
    );

    Ok(())
}

pub fn signature_set<T: EthSpec>(
    exit: &SignedVoluntaryExit,
    state: &BeaconState<T>,
    spec: &ChainSpec,
) -> Result<SignatureSet, Error> {
    let validator = state
        .validators
        .get(exit.message.validator_index as usize)
        .ok_or(Error::Internal(format!(
            "unknown validator index {}",
            exit.message.validator_index
        )))?;

    let domain = get_domain(state, Domain::VoluntaryExit, exit.message.epoch, spec);
    let object_root = Hash256::from_slice(&exit.message.tree_hash_root());
    let signing_root = compute_signing_root(object_root, domain);

    let mut set = SignatureSet::new();
    set.push(SignedMessage::new(
        &[&validator.pubkey],
        signing_root.as_bytes().to_vec(),
        exit.signature.clone(),
    )?);
    Ok(set)
}

pub fn process_voluntary_exit<T: EthSpec>(
    state: &mut BeaconState<T>,
    exit: &SignedVoluntaryExit,
    spec: &ChainSpec,
) -> Result<(), Error> {
    initiate_validator_exit(state, exit.message.validator_index as usize, spec)
}
