//! `Slot` and `Epoch` newtypes over `u64`. Kept as distinct types (rather than raw `u64`) so the
//! compiler rejects code that mixes the two units; every arithmetic operation goes through
//! `safe_arith` rather than the `+`/`-` operators so a relative-epoch computation near
//! `FAR_FUTURE_EPOCH` overflows into an `Err` instead of wrapping.

use crate::EthSpec;
use safe_arith::{ArithError, SafeArith};
use serde_derive::{Deserialize, Serialize};
use ssz::{Decode, DecodeError, Encode};
use std::fmt;
use std::hash::Hash;
use tree_hash::TreeHash;

macro_rules! new_type_field {
    ($name:ident) => {
        #[derive(
            Default, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(n: u64) -> Self {
                Self(n)
            }

            pub const fn as_u64(&self) -> u64 {
                self.0
            }

            pub fn as_usize(&self) -> usize {
                self.0 as usize
            }

            pub fn safe_add(&self, other: Self) -> Result<Self, ArithError> {
                Ok(Self(self.0.safe_add(other.0)?))
            }

            pub fn safe_sub(&self, other: Self) -> Result<Self, ArithError> {
                Ok(Self(self.0.safe_sub(other.0)?))
            }

            pub fn safe_add_assign(&mut self, other: Self) -> Result<(), ArithError> {
                self.0.safe_add_assign(other.0)
            }
        }

        impl From<u64> for $name {
            fn from(n: u64) -> Self {
                Self(n)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Encode for $name {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                8
            }

            fn ssz_append(&self, buf: &mut Vec<u8>) {
                self.0.ssz_append(buf)
            }

            fn ssz_bytes_len(&self) -> usize {
                8
            }
        }

        impl Decode for $name {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                8
            }

            fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
                Ok(Self(u64::from_ssz_bytes(bytes)?))
            }
        }

        impl TreeHash for $name {
            fn tree_hash_type() -> tree_hash::TreeHashType {
                tree_hash::TreeHashType::Basic
            }

            fn tree_hash_packed_encoding(&self) -> Vec<u8> {
                self.0.tree_hash_packed_encoding()
            }

            fn tree_hash_packing_factor() -> usize {
                u64::tree_hash_packing_factor()
            }

            fn tree_hash_root(&self) -> Vec<u8> {
                self.0.tree_hash_root()
            }
        }
    };
}

new_type_field!(Slot);
new_type_field!(Epoch);

impl Slot {
    /// The epoch containing this slot, per §2: `epoch(slot) = slot / SLOTS_PER_EPOCH`.
    pub fn epoch<T: EthSpec>(&self) -> Epoch {
        Epoch::new(self.0 / T::slots_per_epoch())
    }
}

impl Epoch {
    pub fn start_slot<T: EthSpec>(&self) -> Slot {
        Slot::new(self.0.saturating_mul(T::slots_per_epoch()))
    }

    pub fn end_slot<T: EthSpec>(&self) -> Slot {
        Slot::new(
            self.0
                .saturating_mul(T::slots_per_epoch())
                .saturating_add(T::slots_per_epoch())
                .saturating_sub(1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MainnetEthSpec;

    #[test]
    fn epoch_of_slot() {
        assert_eq!(Slot::new(0).epoch::<MainnetEthSpec>(), Epoch::new(0));
        assert_eq!(Slot::new(31).epoch::<MainnetEthSpec>(), Epoch::new(0));
        assert_eq!(Slot::new(32).epoch::<MainnetEthSpec>(), Epoch::new(1));
    }

    #[test]
    fn epoch_start_and_end_slot() {
        let epoch = Epoch::new(3);
        assert_eq!(epoch.start_slot::<MainnetEthSpec>(), Slot::new(96));
        assert_eq!(epoch.end_slot::<MainnetEthSpec>(), Slot::new(127));
    }

    #[test]
    fn safe_add_detects_overflow() {
        let max = Slot::new(u64::MAX);
        assert!(max.safe_add(Slot::new(1)).is_err());
    }
}
