//! The error taxonomy every entry point in this crate returns. Kinds are structural rather than
//! strings so callers can match on them instead of parsing messages. Preconditions fail by
//! returning one of these, not by logging — a rejected block or operation is the caller's
//! problem to report; only cache-layer degradations (§7 "logged and non-fatal") call `log`
//! directly, since those don't reject anything and would otherwise be invisible.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    NilInput(&'static str),
    ShapeViolation(String),
    StateInvariantViolation(String),
    MerkleProofFailure,
    SignatureFailure(&'static str),
    StateRootMismatch { expected: types::Hash256, computed: types::Hash256 },
    Cancelled,
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NilInput(what) => write!(f, "nil input: {}", what),
            Error::ShapeViolation(msg) => write!(f, "shape violation: {}", msg),
            Error::StateInvariantViolation(msg) => write!(f, "state invariant violation: {}", msg),
            Error::MerkleProofFailure => write!(f, "deposit merkle proof failed to verify"),
            Error::SignatureFailure(what) => write!(f, "signature failure: {}", what),
            Error::StateRootMismatch { expected, computed } => write!(
                f,
                "state root mismatch: expected {:?}, computed {:?}",
                expected, computed
            ),
            Error::Cancelled => write!(f, "cancelled"),
            Error::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<types::BeaconStateError> for Error {
    fn from(e: types::BeaconStateError) -> Self {
        Error::Internal(format!("{:?}", e))
    }
}

impl From<field_trie::Error> for Error {
    fn from(e: field_trie::Error) -> Self {
        Error::Internal(format!("{:?}", e))
    }
}

impl From<merkle_proof::MerkleTreeError> for Error {
    fn from(e: merkle_proof::MerkleTreeError) -> Self {
        Error::Internal(format!("{:?}", e))
    }
}

impl From<safe_arith::ArithError> for Error {
    fn from(e: safe_arith::ArithError) -> Self {
        Error::Internal(format!("{:?}", e))
    }
}

impl From<bls::Error> for Error {
    fn from(e: bls::Error) -> Self {
        Error::Internal(format!("{:?}", e))
    }
}

/// `verify!(condition, error)` — the condition/error-variant pairing the per-block and per-epoch
/// processors use at every precondition check (§4.D "preconditions"). Kept as a macro rather than
/// a helper function so the failing condition shows up at the call site's line, and so non-`Copy`
/// error constructors (`Error::ShapeViolation(format!(...))`) aren't built unless needed.
macro_rules! verify {
    ($condition:expr, $error:expr) => {
        if !$condition {
            return Err($error);
        }
    };
}

pub(crate) use verify;
