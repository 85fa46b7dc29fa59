//! Domain derivation and signing roots. Every signature the operation processors verify (block
//! header, randao, voluntary exit, slashing headers, attestations) is over a `SigningData`
//! wrapper of `(object_root, domain)` rather than the raw object root, so a signature minted for
//! one fork or purpose can never be replayed as another.

use types::{BeaconState, ChainSpec, Domain, Epoch, EthSpec, Hash256};

/// `compute_fork_data_root`: the root of `ForkData(current_version, genesis_validators_root)`.
/// Both fields are 32-byte leaves, so the container root is just their pairwise hash.
fn compute_fork_data_root(version: [u8; 4], genesis_validators_root: Hash256) -> Hash256 {
    let mut version_leaf = [0u8; 32];
    version_leaf[..4].copy_from_slice(&version);

    let mut input = Vec::with_capacity(64);
    input.extend_from_slice(&version_leaf);
    input.extend_from_slice(genesis_validators_root.as_bytes());
    Hash256::from_slice(&eth2_hashing::hash(&input))
}

/// `compute_domain`: `domain_type || fork_data_root[:28]`.
pub fn compute_domain(domain_type: u32, fork_version: [u8; 4], genesis_validators_root: Hash256) -> [u8; 32] {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_validators_root);
    let mut domain = [0u8; 32];
    domain[..4].copy_from_slice(&domain_type.to_be_bytes());
    domain[4..].copy_from_slice(&fork_data_root.as_bytes()[..28]);
    domain
}

/// `get_domain`: picks `fork.previous_version` for an epoch before the fork activated,
/// `fork.current_version` otherwise.
pub fn get_domain<T: EthSpec>(
    state: &BeaconState<T>,
    domain_type: Domain,
    epoch: Epoch,
    spec: &ChainSpec,
) -> [u8; 32] {
    let fork_version = if epoch.as_u64() < state.fork.epoch.as_u64() {
        state.fork.previous_version
    } else {
        state.fork.current_version
    };
    compute_domain(spec.get_domain_constant(domain_type), fork_version, state.genesis_validators_root)
}

/// `compute_signing_root`: `hash_tree_root(SigningData(object_root, domain))`, again just the
/// pairwise hash of two 32-byte leaves.
pub fn compute_signing_root(object_root: Hash256, domain: [u8; 32]) -> Hash256 {
    let mut input = Vec::with_capacity(64);
    input.extend_from_slice(object_root.as_bytes());
    input.extend_from_slice(&domain);
    Hash256::from_slice(&eth2_hashing::hash(&input))
}
