//! The mainnet/minimal preset switch (§6): every SSZ list bound and vector length in
//! `BeaconState` is a `typenum` associated constant rather than a runtime field, so the two
//! presets are genuinely distinct monomorphizations of `BeaconState<T>` and friends, and a
//! mainnet state can never be accidentally fed through minimal-preset logic.

use serde_derive::{Deserialize, Serialize};
use std::fmt::Debug;
use typenum::{Unsigned, U1024, U128, U16, U16777216, U2, U2048, U32, U4096, U64, U65536, U8, U8192};

pub trait EthSpec: 'static + Default + Sync + Send + Clone + Debug + PartialEq + Eq {
    type SlotsPerHistoricalRoot: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    type EpochsPerHistoricalVector: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    type SlotsPerEpoch: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    type SlashingsVectorLength: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    type ValidatorRegistryLimit: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    type MaxValidatorsPerCommittee: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    type HistoricalRootsLimit: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    type Eth1DataVotesLength: Unsigned + Clone + Sync + Send + Debug + PartialEq;

    /// Operation-list bounds (§6 "Constants (mainnet preset)"): fixed across presets in phase 0,
    /// but still typenum constants so every block-body list is a compile-time-bounded SSZ
    /// container rather than an unbounded `Vec`.
    type MaxProposerSlashings: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    type MaxAttesterSlashings: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    type MaxAttestations: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    type MaxDeposits: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    type MaxVoluntaryExits: Unsigned + Clone + Sync + Send + Debug + PartialEq;

    /// `MAX_ATTESTATIONS * SLOTS_PER_EPOCH`, the bound on `{previous,current}_epoch_attestations`.
    type PreviousEpochAttestationsLimit: Unsigned + Clone + Sync + Send + Debug + PartialEq;
    type CurrentEpochAttestationsLimit: Unsigned + Clone + Sync + Send + Debug + PartialEq;

    fn slots_per_epoch() -> u64 {
        Self::SlotsPerEpoch::to_u64()
    }

    fn slots_per_historical_root() -> usize {
        Self::SlotsPerHistoricalRoot::to_usize()
    }

    fn epochs_per_historical_vector() -> usize {
        Self::EpochsPerHistoricalVector::to_usize()
    }

    fn preset_name() -> &'static str;
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct MainnetEthSpec;

impl EthSpec for MainnetEthSpec {
    type SlotsPerHistoricalRoot = U8192;
    type EpochsPerHistoricalVector = U65536;
    type SlotsPerEpoch = U32;
    type SlashingsVectorLength = U8192;
    type ValidatorRegistryLimit = U16777216;
    type MaxValidatorsPerCommittee = U1024;
    type HistoricalRootsLimit = U16777216;
    type Eth1DataVotesLength = U1024;

    type MaxProposerSlashings = U16;
    type MaxAttesterSlashings = U2;
    type MaxAttestations = U128;
    type MaxDeposits = U16;
    type MaxVoluntaryExits = U16;

    type PreviousEpochAttestationsLimit = U4096;
    type CurrentEpochAttestationsLimit = U4096;

    fn preset_name() -> &'static str {
        "mainnet"
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct MinimalEthSpec;

impl EthSpec for MinimalEthSpec {
    type SlotsPerHistoricalRoot = U64;
    type EpochsPerHistoricalVector = U2048;
    type SlotsPerEpoch = U8;
    type SlashingsVectorLength = U64;
    type ValidatorRegistryLimit = U16777216;
    type MaxValidatorsPerCommittee = U1024;
    type HistoricalRootsLimit = U16777216;
    type Eth1DataVotesLength = U16;

    type MaxProposerSlashings = U16;
    type MaxAttesterSlashings = U2;
    type MaxAttestations = U128;
    type MaxDeposits = U16;
    type MaxVoluntaryExits = U16;

    type PreviousEpochAttestationsLimit = U1024;
    type CurrentEpochAttestationsLimit = U1024;

    fn preset_name() -> &'static str {
        "minimal"
    }
}
