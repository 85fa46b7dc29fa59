//! The chain-info façade and STF library surface (§4.H, §6) built on top of [`state_processing`].
//! Everything this crate needs from storage, state regeneration, and fork choice is expressed as
//! a trait in [`collaborators`] — no concrete implementation of any of them lives here.

mod chain_info;
mod collaborators;
mod transition;

pub use chain_info::ChainInfo;
pub use collaborators::{BeaconDB, ForkChoiceStore, StateGen};
pub use transition::{
    calculate_state_root, execute_state_transition, execute_state_transition_no_verify_any_sig,
    process_block, process_slots,
};
