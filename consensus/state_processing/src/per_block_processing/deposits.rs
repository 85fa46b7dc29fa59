//! `process_deposit` (§4.D "deposit"): verifies inclusion in the deposit contract's Merkle tree,
//! then either tops up an existing validator's balance or enrolls a new one. A bad deposit
//! signature on a *new* pubkey is swallowed per the operation's stated semantics: the deposit is
//! skipped, not the whole block.

use crate::common::{compute_domain, compute_signing_root, increase_balance};
use crate::errors::{verify, Error};
use bls::{SignatureSet, SignedMessage};
use tree_hash::TreeHash;
use types::{BeaconState, ChainSpec, Deposit, Domain, EthSpec, Hash256, Validator};

fn verify_deposit_merkle_proof<T: EthSpec>(
    state: &BeaconState<T>,
    deposit: &Deposit,
    index: u64,
) -> Result<(), Error> {
    let leaf = Hash256::from_slice(&deposit.data.tree_hash_root());
    let branch: Vec<Hash256> = deposit.proof.iter().copied().collect();
    let valid = merkle_proof::verify_merkle_proof(
        leaf,
        &branch,
        types::DEPOSIT_TREE_DEPTH_WITH_LENGTH_MIXIN,
        index as usize,
        state.eth1_data.deposit_root,
    );
    verify!(valid, Error::MerkleProofFailure);
    Ok(())
}

/// Verifies the depositor's signature over the deposit message. Deposits use a fixed domain
/// (genesis fork version, zero genesis-validators-root) since they're signed before the chain
/// — and before the signer's own fork — exists.
fn verify_deposit_signature(deposit: &Deposit, spec: &ChainSpec) -> bool {
    let domain = compute_domain(
        spec.get_domain_constant(Domain::Deposit),
        spec.genesis_fork_version,
        Hash256::zero(),
    );
    let object_root = Hash256::from_slice(&deposit.data.as_deposit_message_bytes());
    let signing_root = compute_signing_root(object_root, domain);
    bls::verify(
        &deposit.data.pubkey,
        signing_root.as_bytes(),
        &deposit.data.signature,
    )
}

/// A batched check over every new-validator deposit's signature (§4.D "batch optimization"):
/// one `SignedMessage` per deposit, verified together as a single pairing check. When it fails,
/// the caller falls back to `verify_deposit_signature` per deposit to find the bad one(s) —
/// deposits never abort the block on a bad signature, so the fallback only decides who gets
/// skipped, not whether the block is rejected.
pub fn verify_deposit_signatures_aggregate(deposits: &[&Deposit], spec: &ChainSpec) -> Result<bool, Error> {
    if deposits.is_empty() {
        return Ok(true);
    }
    let domain = compute_domain(
        spec.get_domain_constant(Domain::Deposit),
        spec.genesis_fork_version,
        Hash256::zero(),
    );

    let mut set = SignatureSet::new();
    for deposit in deposits {
        let object_root = Hash256::from_slice(&deposit.data.as_deposit_message_bytes());
        let signing_root = compute_signing_root(object_root, domain);
        set.push(SignedMessage::new(
            &[&deposit.data.pubkey],
            signing_root.as_bytes().to_vec(),
            deposit.data.signature.clone(),
        )?);
    }
    Ok(set.verify())
}

pub fn process_deposit<T: EthSpec>(
    state: &mut BeaconState<T>,
    deposit: &Deposit,
    spec: &ChainSpec,
    skip_signature_check: bool,
) -> Result<(), Error> {
    let index = state.eth1_deposit_index;
    verify_deposit_merkle_proof(state, deposit, index)?;
    state.set_eth1_deposit_index(index + 1);

    match state.get_validator_index(&deposit.data.pubkey) {
        Some(validator_index) => {
            increase_balance(state, validator_index, deposit.data.amount)?;
        }
        None => {
            if !skip_signature_check && !verify_deposit_signature(deposit, spec) {
                // Per §4.D: a bad signature on a brand-new pubkey is silently skipped, not an
                // error — the deposit index has already advanced above, matching the real chain's
                // behavior of consuming the deposit-contract slot regardless.
                return Ok(());
            }
            let validator = Validator::new_for_deposit(
                deposit.data.pubkey.clone(),
                deposit.data.withdrawal_credentials,
                deposit.data.amount,
                spec,
            );
            state.push_validator(validator, deposit.data.amount)?;
        }
    }

    Ok(())
}

/// The pre-genesis special case (§4.D): deposits that reach max effective balance before
/// genesis activate immediately rather than waiting for the normal activation queue.
pub fn activate_genesis_deposits<T: EthSpec>(state: &mut BeaconState<T>, spec: &ChainSpec) -> Result<(), Error> {
    let indices: Vec<usize> = state
        .validators
        .iter()
        .enumerate()
        .filter(|(_, v)| v.effective_balance == spec.max_effective_balance)
        .map(|(i, _)| i)
        .collect();
    for index in indices {
        state.update_validator_at_index(index, |v| {
            v.activation_eligibility_epoch = types::Epoch::new(0);
            v.activation_epoch = types::Epoch::new(0);
        })?;
    }
    Ok(())
}
