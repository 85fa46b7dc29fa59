//! Deterministic fixture generation for tests: every type that can appear inside a
//! `BeaconState` or block implements [`TestRandom`] so test authors can build fixtures from a
//! single seeded RNG rather than hand-writing every field, and two runs of the same test always
//! produce byte-identical fixtures.

use crate::*;
use bls::{PublicKeyBytes, SecretKey, SignatureBytes};
use rand::{RngCore, SeedableRng};
use rand_xorshift::XorShiftRng;

pub fn test_random_rng(seed: u64) -> XorShiftRng {
    let mut bytes = [0u8; 16];
    bytes[0..8].copy_from_slice(&seed.to_le_bytes());
    XorShiftRng::from_seed(bytes)
}

pub trait TestRandom {
    fn random_for_test(rng: &mut impl RngCore) -> Self;
}

impl TestRandom for u64 {
    fn random_for_test(rng: &mut impl RngCore) -> Self {
        rng.next_u64()
    }
}

impl TestRandom for bool {
    fn random_for_test(rng: &mut impl RngCore) -> Self {
        rng.next_u32() % 2 == 0
    }
}

impl TestRandom for Hash256 {
    fn random_for_test(rng: &mut impl RngCore) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Hash256::from(bytes)
    }
}

impl TestRandom for Slot {
    fn random_for_test(rng: &mut impl RngCore) -> Self {
        Slot::new(rng.next_u64() % 1_000_000)
    }
}

impl TestRandom for Epoch {
    fn random_for_test(rng: &mut impl RngCore) -> Self {
        Epoch::new(rng.next_u64() % 100_000)
    }
}

impl TestRandom for SignatureBytes {
    fn random_for_test(_rng: &mut impl RngCore) -> Self {
        // A random byte string is never a valid compressed curve point; fixtures that need a
        // signature that verifies are built from a real `SecretKey::sign` instead (see
        // `generate_deterministic_keypairs`).
        SignatureBytes::empty()
    }
}

impl TestRandom for Checkpoint {
    fn random_for_test(rng: &mut impl RngCore) -> Self {
        Checkpoint {
            epoch: Epoch::random_for_test(rng),
            root: Hash256::random_for_test(rng),
        }
    }
}

impl TestRandom for Eth1Data {
    fn random_for_test(rng: &mut impl RngCore) -> Self {
        Eth1Data {
            deposit_root: Hash256::random_for_test(rng),
            deposit_count: u64::random_for_test(rng),
            block_hash: Hash256::random_for_test(rng),
        }
    }
}

impl TestRandom for Fork {
    fn random_for_test(rng: &mut impl RngCore) -> Self {
        let mut previous_version = [0u8; 4];
        let mut current_version = [0u8; 4];
        rng.fill_bytes(&mut previous_version);
        rng.fill_bytes(&mut current_version);
        Fork {
            previous_version,
            current_version,
            epoch: Epoch::random_for_test(rng),
        }
    }
}

impl TestRandom for BeaconBlockHeader {
    fn random_for_test(rng: &mut impl RngCore) -> Self {
        BeaconBlockHeader {
            slot: Slot::random_for_test(rng),
            proposer_index: u64::random_for_test(rng),
            parent_root: Hash256::random_for_test(rng),
            state_root: Hash256::random_for_test(rng),
            body_root: Hash256::random_for_test(rng),
        }
    }
}

impl TestRandom for AttestationData {
    fn random_for_test(rng: &mut impl RngCore) -> Self {
        AttestationData {
            slot: Slot::random_for_test(rng),
            index: u64::random_for_test(rng) % 64,
            beacon_block_root: Hash256::random_for_test(rng),
            source: Checkpoint::random_for_test(rng),
            target: Checkpoint::random_for_test(rng),
        }
    }
}

/// A deterministic `(SecretKey, PublicKeyBytes)` set, indexed the same way across test runs
/// (index `i` always yields the same keypair) — the fixture equivalent of real Lighthouse's
/// `generate_deterministic_keypairs`. Real BLS keygen is used (not `TestRandom`) because deposit
/// and exit fixtures need signatures that actually verify under `fake_crypto`-disabled builds.
pub fn generate_deterministic_keypairs(count: usize) -> Vec<(SecretKey, PublicKeyBytes)> {
    (0..count)
        .map(|i| {
            let mut ikm = [0u8; 32];
            ikm[0..8].copy_from_slice(&(i as u64).to_le_bytes());
            let sk = SecretKey::from_ikm_for_test(&ikm);
            let pk = sk.public_key();
            (sk, pk)
        })
        .collect()
}

pub fn generate_deterministic_validator(pubkey: PublicKeyBytes, spec: &ChainSpec) -> Validator {
    Validator::new_for_deposit(pubkey, Hash256::zero(), spec.max_effective_balance, spec)
}

/// Builds a minimal genesis-like state with `validator_count` active validators, all activated
/// at epoch 0 — the common starting point for state-processing unit tests.
pub fn genesis_state_with_validators<T: EthSpec>(
    validator_count: usize,
    spec: &ChainSpec,
) -> BeaconState<T> {
    let mut state = BeaconState::empty(spec.min_genesis_time, Eth1Data::default(), spec);
    for (_, pubkey) in generate_deterministic_keypairs(validator_count) {
        let mut validator = generate_deterministic_validator(pubkey, spec);
        validator.activation_eligibility_epoch = Epoch::new(0);
        validator.activation_epoch = Epoch::new(0);
        state
            .push_validator(validator, spec.max_effective_balance)
            .expect("validator_count within registry limit");
    }
    state.rebuild_pubkey_cache();
    state
}
