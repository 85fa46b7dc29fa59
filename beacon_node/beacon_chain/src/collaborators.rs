//! Contracts for the collaborators §1 explicitly treats as out of scope: a block database, a
//! state-by-root resolver, and the fork-choice store. This crate only ever calls through these
//! traits — it never assumes a storage engine, a proto-array implementation, or a network stack.

use types::{BeaconState, EthSpec, Hash256, SignedBeaconBlock};

/// `BeaconDB` (§6): a content-addressed store of accepted blocks.
pub trait BeaconDB<T: EthSpec> {
    fn head_block(&self) -> Option<SignedBeaconBlock<T>>;
    fn is_finalized_block(&self, root: Hash256) -> bool;
}

/// `StateGen` (§6): regenerates a state at an arbitrary historical root, for callers whose
/// requested state isn't the in-memory head.
pub trait StateGen<T: EthSpec> {
    type Error;
    fn state_by_root(&self, root: Hash256) -> Result<BeaconState<T>, Self::Error>;
}

/// `ForkChoiceStore` (§6): the proto-array-equivalent canonical-chain oracle.
pub trait ForkChoiceStore {
    type Snapshot;
    fn is_canonical(&self, root: Hash256) -> bool;
    fn store(&self) -> Self::Snapshot;
}
