//! Runtime chain configuration (§6 "Constants (mainnet preset)"). Values that are genuinely
//! list-capacity bounds live as `typenum` associated constants on [`crate::EthSpec`]; everything
//! else that tunes *behaviour* rather than *shape* lives here so it can be loaded from YAML the
//! way real network configs are, without recompiling.

use crate::Epoch;
use serde_derive::{Deserialize, Serialize};

#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum Domain {
    BeaconProposer,
    BeaconAttester,
    Randao,
    Deposit,
    VoluntaryExit,
}

#[derive(PartialEq, Clone, Debug, Serialize, Deserialize)]
pub struct ChainSpec {
    pub target_committee_size: u64,
    pub max_committees_per_slot: u64,
    pub min_attestation_inclusion_delay: u64,
    pub max_effective_balance: u64,
    pub effective_balance_increment: u64,
    pub min_deposit_amount: u64,
    pub ejection_balance: u64,
    pub far_future_epoch: Epoch,
    pub shard_committee_period: u64,
    pub deposit_contract_tree_depth: u64,
    pub min_seed_lookahead: Epoch,
    pub max_seed_lookahead: Epoch,
    pub shuffle_round_count: u8,
    pub min_genesis_active_validator_count: u64,
    pub min_genesis_time: u64,
    pub genesis_delay: u64,

    pub max_proposer_slashings: u32,
    pub max_attester_slashings: u32,
    pub max_attestations: u32,
    pub max_deposits: u32,
    pub max_voluntary_exits: u32,

    pub domain_beacon_proposer: u32,
    pub domain_beacon_attester: u32,
    pub domain_randao: u32,
    pub domain_deposit: u32,
    pub domain_voluntary_exit: u32,

    pub genesis_fork_version: [u8; 4],

    // --- rewards/penalties and registry-churn constants (§4.F), not named in §6's constant
    // list but required to implement the epoch processor it describes. ---
    pub base_reward_factor: u64,
    pub base_rewards_per_epoch: u64,
    pub proposer_reward_quotient: u64,
    pub whistleblower_reward_quotient: u64,
    pub inactivity_penalty_quotient: u64,
    pub min_slashing_penalty_quotient: u64,
    pub proportional_slashing_multiplier: u64,
    pub churn_limit_quotient: u64,
    pub min_per_epoch_churn_limit: u64,
    pub hysteresis_quotient: u64,
    pub hysteresis_downward_multiplier: u64,
    pub hysteresis_upward_multiplier: u64,
    pub min_epochs_to_inactivity_penalty: u64,
    pub min_validator_withdrawability_delay: u64,
    pub epochs_per_eth1_voting_period: u64,
}

impl ChainSpec {
    pub fn get_domain_constant(&self, domain: Domain) -> u32 {
        match domain {
            Domain::BeaconProposer => self.domain_beacon_proposer,
            Domain::BeaconAttester => self.domain_beacon_attester,
            Domain::Randao => self.domain_randao,
            Domain::Deposit => self.domain_deposit,
            Domain::VoluntaryExit => self.domain_voluntary_exit,
        }
    }

    /// Mainnet preset (§6): `SLOTS_PER_EPOCH=32` companion constants, matched 1:1 against the
    /// spec's "Constants (mainnet preset)" list.
    pub fn mainnet() -> Self {
        Self {
            target_committee_size: 128,
            max_committees_per_slot: 64,
            min_attestation_inclusion_delay: 1,
            max_effective_balance: 32_000_000_000,
            effective_balance_increment: 1_000_000_000,
            min_deposit_amount: 1_000_000_000,
            ejection_balance: 16_000_000_000,
            far_future_epoch: Epoch::new(u64::MAX),
            shard_committee_period: 256,
            deposit_contract_tree_depth: 32,
            min_seed_lookahead: Epoch::new(1),
            max_seed_lookahead: Epoch::new(4),
            shuffle_round_count: 90,
            min_genesis_active_validator_count: 16_384,
            min_genesis_time: 1_606_824_000,
            genesis_delay: 604_800,

            max_proposer_slashings: 16,
            max_attester_slashings: 2,
            max_attestations: 128,
            max_deposits: 16,
            max_voluntary_exits: 16,

            domain_beacon_proposer: 0x0000_0000,
            domain_beacon_attester: 0x0100_0000,
            domain_randao: 0x0200_0000,
            domain_deposit: 0x0300_0000,
            domain_voluntary_exit: 0x0400_0000,

            genesis_fork_version: [0; 4],

            base_reward_factor: 64,
            base_rewards_per_epoch: 4,
            proposer_reward_quotient: 8,
            whistleblower_reward_quotient: 512,
            inactivity_penalty_quotient: 1 << 26,
            min_slashing_penalty_quotient: 128,
            proportional_slashing_multiplier: 1,
            churn_limit_quotient: 65_536,
            min_per_epoch_churn_limit: 4,
            hysteresis_quotient: 4,
            hysteresis_downward_multiplier: 1,
            hysteresis_upward_multiplier: 5,
            min_epochs_to_inactivity_penalty: 4,
            min_validator_withdrawability_delay: 256,
            epochs_per_eth1_voting_period: 64,
        }
    }

    /// Minimal preset: same behavioural constants, smaller `SLOTS_PER_EPOCH` (via
    /// [`crate::MinimalEthSpec`]) and a much smaller genesis validator count so devnets and
    /// spec-test vectors converge in seconds rather than hours.
    pub fn minimal() -> Self {
        Self {
            max_seed_lookahead: Epoch::new(4),
            min_genesis_active_validator_count: 64,
            shard_committee_period: 64,
            genesis_fork_version: [0, 0, 0, 1],
            ..Self::mainnet()
        }
    }
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self::mainnet()
    }
}
