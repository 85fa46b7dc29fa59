//! Per-block processing (§4.D): a fixed pipeline of header / randao / eth1-data bookkeeping
//! followed by the five operation lists, each applied in order with every item's effects visible
//! to the items after it.

mod attestations;
mod attester_slashings;
mod deposits;
mod proposer_slashings;
mod voluntary_exits;

pub use attestations::{process_attestation, signature_set as attestation_signature_set, verify_attestation};
pub use attester_slashings::{
    process_attester_slashing, signature_set as attester_slashing_signature_set, verify_attester_slashing,
};
pub use deposits::{activate_genesis_deposits, process_deposit, verify_deposit_signatures_aggregate};
pub use proposer_slashings::{
    process_proposer_slashing, signature_set as proposer_slashing_signature_set, verify_proposer_slashing,
};
pub use voluntary_exits::{process_voluntary_exit, signature_set as voluntary_exit_signature_set, verify_voluntary_exit};

use crate::common::{compute_domain, compute_signing_root, get_domain, CommitteeCacheStore};
use crate::errors::{verify, Error};
use bls::SignatureSet;
use rayon::prelude::*;
use tree_hash::TreeHash;
use types::{BeaconBlock, BeaconBlockHeader, ChainSpec, Domain, EthSpec, Hash256, SignedBeaconBlock};

/// How much signature verification `process_block` should do. Block application itself never
/// changes; only what it asserts about signatures does (§5 "the STF's three public faces share
/// one block-application core").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSignatureStrategy {
    /// Verify every signature individually, inline, as each operation is processed.
    VerifyIndividual,
    /// Skip all signature verification (the caller has already verified them, or is recomputing
    /// a state root from an already-accepted block).
    NoVerification,
}

/// `process_block_header` (§4.D "block header"): checks the incoming block against
/// `state.latest_block_header`/`state.slot`/the expected proposer, then seeds the next header.
pub fn process_block_header<T: EthSpec>(
    state: &mut types::BeaconState<T>,
    block: &BeaconBlock<T>,
    spec: &ChainSpec,
) -> Result<(), Error> {
    verify!(
        block.slot == state.slot,
        Error::StateInvariantViolation("block slot does not match state slot".into())
    );
    verify!(
        block.slot.as_u64() > state.latest_block_header.slot.as_u64(),
        Error::StateInvariantViolation("block slot is not newer than the latest block header".into())
    );

    let expected_proposer = crate::common::get_beacon_proposer_index(state, state.slot, spec)?;
    verify!(
        block.proposer_index as usize == expected_proposer,
        Error::StateInvariantViolation("block proposer index does not match the expected proposer".into())
    );

    verify!(
        block.parent_root == state.latest_block_header.canonical_root(),
        Error::StateInvariantViolation("block parent root does not match the latest block header".into())
    );

    let proposer = state
        .validators
        .get(block.proposer_index as usize)
        .ok_or(Error::Internal(format!(
            "unknown proposer index {}",
            block.proposer_index
        )))?;
    verify!(
        !proposer.slashed,
        Error::StateInvariantViolation("block proposer has been slashed".into())
    );

    state.set_latest_block_header(BeaconBlockHeader {
        slot: block.slot,
        proposer_index: block.proposer_index,
        parent_root: block.parent_root,
        state_root: Hash256::zero(),
        body_root: Hash256::from_slice(&block.body.tree_hash_root()),
    });

    Ok(())
}

/// `process_randao` (§4.D "randao"): mixes the proposer's reveal into the epoch's randao mix.
pub fn process_randao<T: EthSpec>(
    state: &mut types::BeaconState<T>,
    block: &BeaconBlock<T>,
    spec: &ChainSpec,
) -> Result<(), Error> {
    let epoch = state.current_epoch();
    let proposer = state
        .validators
        .get(block.proposer_index as usize)
        .ok_or(Error::Internal(format!(
            "unknown proposer index {}",
            block.proposer_index
        )))?;

    let domain = get_domain(state, Domain::Randao, epoch, spec);
    let signing_root = compute_signing_root(Hash256::from_slice(&epoch.tree_hash_root()), domain);
    verify!(
        bls::verify(&proposer.pubkey, signing_root.as_bytes(), &block.body.randao_reveal),
        Error::SignatureFailure("randao reveal")
    );

    let mix = state.get_randao_mix(epoch);
    let mut input = mix.as_bytes().to_vec();
    input.extend_from_slice(&eth2_hashing::hash(block.body.randao_reveal.as_bytes()));
    state.set_randao_mix(epoch, Hash256::from_slice(&eth2_hashing::hash(&input)));

    Ok(())
}

/// `process_eth1_data` (§4.D "eth1 data"): records the block's vote, adopting it as
/// `state.eth1_data` once it clears a simple-majority threshold over the voting period.
pub fn process_eth1_data<T: EthSpec>(
    state: &mut types::BeaconState<T>,
    block: &BeaconBlock<T>,
    spec: &ChainSpec,
) -> Result<(), Error> {
    state.push_eth1_data_vote(block.body.eth1_data.clone())?;

    let votes_for_candidate = state
        .eth1_data_votes
        .iter()
        .filter(|v| **v == block.body.eth1_data)
        .count();
    let voting_period_slots = spec.epochs_per_eth1_voting_period * T::slots_per_epoch();

    if (votes_for_candidate as u64) * 2 > voting_period_slots {
        state.set_eth1_data(block.body.eth1_data.clone());
    }

    Ok(())
}

/// `VerifyBlockOperationLengths` (§4.D "preconditions"): every operation list's bound, checked
/// before any individual operation is processed so a too-long list fails fast and uniformly.
/// Deposits are the one list checked for exact equality rather than an upper bound: a block that
/// has pending deposits available but omits them must be rejected, not silently accepted.
fn verify_op_lengths<T: EthSpec>(
    state: &types::BeaconState<T>,
    block: &BeaconBlock<T>,
    spec: &ChainSpec,
) -> Result<(), Error> {
    let body = &block.body;
    verify!(
        body.proposer_slashings.len() as u32 <= spec.max_proposer_slashings,
        Error::ShapeViolation("too many proposer slashings".into())
    );
    verify!(
        body.attester_slashings.len() as u32 <= spec.max_attester_slashings,
        Error::ShapeViolation("too many attester slashings".into())
    );
    verify!(
        body.attestations.len() as u32 <= spec.max_attestations,
        Error::ShapeViolation("too many attestations".into())
    );
    let expected_deposits = std::cmp::min(
        spec.max_deposits as u64,
        state
            .eth1_data
            .deposit_count
            .saturating_sub(state.eth1_deposit_index),
    );
    verify!(
        body.deposits.len() as u64 == expected_deposits,
        Error::ShapeViolation(format!(
            "deposit count {} != expected {}",
            body.deposits.len(),
            expected_deposits
        ))
    );
    verify!(
        body.voluntary_exits.len() as u32 <= spec.max_voluntary_exits,
        Error::ShapeViolation("too many voluntary exits".into())
    );
    Ok(())
}

fn process_operations<T: EthSpec>(
    state: &mut types::BeaconState<T>,
    block: &BeaconBlock<T>,
    signature_strategy: BlockSignatureStrategy,
    committee_cache: &mut CommitteeCacheStore,
    spec: &ChainSpec,
) -> Result<(), Error> {
    let body = &block.body;
    let verify_signatures = signature_strategy == BlockSignatureStrategy::VerifyIndividual;

    for slashing in body.proposer_slashings.iter() {
        if verify_signatures {
            verify_proposer_slashing(slashing, state, spec)?;
        }
        process_proposer_slashing(state, slashing, spec)?;
    }

    for slashing in body.attester_slashings.iter() {
        if verify_signatures {
            verify_attester_slashing(slashing, state, spec)?;
        }
        process_attester_slashing(state, slashing, spec)?;
    }

    for attestation in body.attestations.iter() {
        if verify_signatures {
            verify_attestation(attestation, state, committee_cache, spec)?;
        } else {
            attestations::validate_attestation(attestation, state, committee_cache, spec)?;
        }
        process_attestation(state, attestation, spec)?;
    }

    // A bad signature never rejects a deposit, so the batch check only decides whether the
    // per-deposit fallback runs (§8 "Batch-signature fallback").
    let skip_deposit_signature_check = if verify_signatures {
        let refs: Vec<&types::Deposit> = body.deposits.iter().collect();
        verify_deposit_signatures_aggregate(&refs, spec)?
    } else {
        true
    };
    for deposit in body.deposits.iter() {
        process_deposit(state, deposit, spec, skip_deposit_signature_check)?;
    }

    for exit in body.voluntary_exits.iter() {
        if verify_signatures {
            verify_voluntary_exit(exit, state, spec)?;
        }
        process_voluntary_exit(state, exit, spec)?;
    }

    Ok(())
}

fn process_block_inner<T: EthSpec>(
    state: &mut types::BeaconState<T>,
    block: &BeaconBlock<T>,
    signature_strategy: BlockSignatureStrategy,
    spec: &ChainSpec,
) -> Result<(), Error> {
    verify_op_lengths(state, block, spec)?;
    process_block_header(state, block, spec)?;
    process_randao(state, block, spec)?;
    process_eth1_data(state, block, spec)?;

    let mut committee_cache = CommitteeCacheStore::default();
    process_operations(state, block, signature_strategy, &mut committee_cache, spec)
}

/// `ExecuteStateTransition::ProcessBlock` (§6), full signature verification.
pub fn process_block<T: EthSpec>(
    state: &mut types::BeaconState<T>,
    signed_block: &SignedBeaconBlock<T>,
    spec: &ChainSpec,
) -> Result<(), Error> {
    let proposer = state
        .validators
        .get(signed_block.message.proposer_index as usize)
        .ok_or(Error::Internal(format!(
            "unknown proposer index {}",
            signed_block.message.proposer_index
        )))?;
    let domain = get_domain(state, Domain::BeaconProposer, state.current_epoch(), spec);
    let signing_root = compute_signing_root(signed_block.message.canonical_root(), domain);
    verify!(
        bls::verify(&proposer.pubkey, signing_root.as_bytes(), &signed_block.signature),
        Error::SignatureFailure("block proposer signature")
    );

    process_block_inner(state, &signed_block.message, BlockSignatureStrategy::VerifyIndividual, spec)
}

/// `ExecuteStateTransitionNoVerifyAnySig` (§6): applies the block without verifying any
/// signature, instead collecting every signature this block would have needed into one
/// aggregated set the caller can batch-verify separately (typically in parallel, via rayon,
/// across many blocks at once).
pub fn process_block_no_verify_any_sig<T: EthSpec>(
    state: &mut types::BeaconState<T>,
    signed_block: &SignedBeaconBlock<T>,
    spec: &ChainSpec,
) -> Result<SignatureSet, Error> {
    let block = &signed_block.message;
    let mut committee_cache = CommitteeCacheStore::default();

    let proposer_set = {
        let proposer = state
            .validators
            .get(block.proposer_index as usize)
            .ok_or(Error::Internal(format!(
                "unknown proposer index {}",
                block.proposer_index
            )))?;
        let domain = get_domain(state, Domain::BeaconProposer, state.current_epoch(), spec);
        let signing_root = compute_signing_root(block.canonical_root(), domain);
        bls::SignedMessage::new(
            &[&proposer.pubkey],
            signing_root.as_bytes().to_vec(),
            signed_block.signature.clone(),
        )?
    };

    verify_op_lengths(state, block, spec)?;
    process_block_header(state, block, spec)?;

    let randao_set = {
        let epoch = state.current_epoch();
        let proposer = state
            .validators
            .get(block.proposer_index as usize)
            .ok_or(Error::Internal(format!(
                "unknown proposer index {}",
                block.proposer_index
            )))?;
        let domain = get_domain(state, Domain::Randao, epoch, spec);
        let signing_root = compute_signing_root(Hash256::from_slice(&epoch.tree_hash_root()), domain);
        let set = bls::SignedMessage::new(
            &[&proposer.pubkey],
            signing_root.as_bytes().to_vec(),
            block.body.randao_reveal.clone(),
        )?;
        let mix = state.get_randao_mix(epoch);
        let mut input = mix.as_bytes().to_vec();
        input.extend_from_slice(&eth2_hashing::hash(block.body.randao_reveal.as_bytes()));
        state.set_randao_mix(epoch, Hash256::from_slice(&eth2_hashing::hash(&input)));
        set
    };

    process_eth1_data(state, block, spec)?;

    let operation_sets: Vec<SignatureSet> = {
        let (proposer_slashing_sets, attester_slashing_sets, attestation_sets, exit_sets): (
            Vec<Result<SignatureSet, Error>>,
            Vec<Result<SignatureSet, Error>>,
            Vec<Result<SignatureSet, Error>>,
            Vec<Result<SignatureSet, Error>>,
        ) = (
            block
                .body
                .proposer_slashings
                .par_iter()
                .map(|s| proposer_slashing_signature_set(s, state, spec))
                .collect(),
            block
                .body
                .attester_slashings
                .par_iter()
                .map(|s| attester_slashing_signature_set(s, state, spec))
                .collect(),
            block
                .body
                .attestations
                .par_iter()
                .map(|a| attestation_signature_set(a, state, &mut CommitteeCacheStore::default(), spec))
                .collect(),
            block
                .body
                .voluntary_exits
                .par_iter()
                .map(|e| voluntary_exit_signature_set(e, state, spec))
                .collect(),
        );

        let mut sets = Vec::new();
        for s in proposer_slashing_sets {
            sets.push(s?);
        }
        for s in attester_slashing_sets {
            sets.push(s?);
        }
        for s in attestation_sets {
            sets.push(s?);
        }
        for s in exit_sets {
            sets.push(s?);
        }
        sets
    };

    process_operations(state, block, BlockSignatureStrategy::NoVerification, &mut committee_cache, spec)?;

    let mut combined = SignatureSet::new();
    combined.push(proposer_set);
    combined.push(randao_set);
    for set in operation_sets {
        combined.join(set);
    }
    Ok(combined)
}

/// `CalculateStateRoot` (§6): applies the block's effects to compute the resulting state root
/// without re-verifying signatures the caller has already accepted.
pub fn process_block_for_state_root<T: EthSpec>(
    state: &mut types::BeaconState<T>,
    block: &BeaconBlock<T>,
    spec: &ChainSpec,
) -> Result<Hash256, Error> {
    process_block_inner(state, block, BlockSignatureStrategy::NoVerification, spec)?;
    state.canonical_root().map_err(Error::from)
}
