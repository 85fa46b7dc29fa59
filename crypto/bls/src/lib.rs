//! Minimal BLS12-381 surface consumed by the state-transition function: single-signature verify,
//! aggregate verify, and a deferred [`SignatureSet`] that batches many checks into one pairing.
//!
//! The curve arithmetic itself is `blst`'s problem; this crate only adapts it to the shapes the
//! consensus layer passes around (fixed-size SSZ byte wrappers, a `Result`-free boolean verify).
//! Everything here is assumed correct and audited upstream — the state-transition function never
//! second-guesses what `verify` returns.

mod secret_key;
mod signature_set;

pub use secret_key::SecretKey;
pub use signature_set::{SignatureSet, SignedMessage};

use serde_derive::{Deserialize, Serialize};
use ssz::{Decode, DecodeError, Encode};
use std::fmt;
use tree_hash::{TreeHash, TreeHashType};

pub const PUBLIC_KEY_BYTES_LEN: usize = 48;
pub const SIGNATURE_BYTES_LEN: usize = 96;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Error {
    InvalidByteLength { got: usize, expected: usize },
    InvalidCurvePoint,
}

/// A compressed public key, kept in its serialized form until the moment it's used: most public
/// keys that pass through the state transition (e.g. every validator in the registry) are never
/// actually verified against, so deserializing eagerly would waste cycles on every clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKeyBytes(#[serde(with = "serde_bytes_fixed")] [u8; PUBLIC_KEY_BYTES_LEN]);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBytes(#[serde(with = "serde_bytes_fixed_sig")] [u8; SIGNATURE_BYTES_LEN]);

impl PublicKeyBytes {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != PUBLIC_KEY_BYTES_LEN {
            return Err(Error::InvalidByteLength {
                got: bytes.len(),
                expected: PUBLIC_KEY_BYTES_LEN,
            });
        }
        let mut arr = [0u8; PUBLIC_KEY_BYTES_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[cfg(not(feature = "fake_crypto"))]
    fn decompress(&self) -> Result<blst::min_pk::PublicKey, Error> {
        blst::min_pk::PublicKey::from_bytes(&self.0).map_err(|_| Error::InvalidCurvePoint)
    }
}

impl SignatureBytes {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != SIGNATURE_BYTES_LEN {
            return Err(Error::InvalidByteLength {
                got: bytes.len(),
                expected: SIGNATURE_BYTES_LEN,
            });
        }
        let mut arr = [0u8; SIGNATURE_BYTES_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    pub fn empty() -> Self {
        Self([0u8; SIGNATURE_BYTES_LEN])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[cfg(not(feature = "fake_crypto"))]
    fn decompress(&self) -> Result<blst::min_pk::Signature, Error> {
        blst::min_pk::Signature::from_bytes(&self.0).map_err(|_| Error::InvalidCurvePoint)
    }
}

impl Default for SignatureBytes {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for PublicKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

macro_rules! impl_ssz_and_tree_hash {
    ($name:ident, $len:expr) => {
        impl Encode for $name {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                $len
            }

            fn ssz_append(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.0)
            }

            fn ssz_bytes_len(&self) -> usize {
                $len
            }
        }

        impl Decode for $name {
            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                $len
            }

            fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
                Self::from_bytes(bytes).map_err(|_| DecodeError::BytesInvalid(format!("invalid {} bytes", stringify!($name))))
            }
        }

        impl TreeHash for $name {
            fn tree_hash_type() -> TreeHashType {
                TreeHashType::Vector
            }

            fn tree_hash_packed_encoding(&self) -> Vec<u8> {
                unreachable!("{} is not a basic type and cannot be packed", stringify!($name))
            }

            fn tree_hash_packing_factor() -> usize {
                unreachable!("{} is not a basic type and cannot be packed", stringify!($name))
            }

            fn tree_hash_root(&self) -> Vec<u8> {
                tree_hash::merkle_root(&self.0, 0)
            }
        }
    };
}

impl_ssz_and_tree_hash!(PublicKeyBytes, PUBLIC_KEY_BYTES_LEN);
impl_ssz_and_tree_hash!(SignatureBytes, SIGNATURE_BYTES_LEN);

const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Verifies a single `(pubkey, message, signature)` triple.
///
/// In `fake_crypto` builds (used by the test harness to generate fixtures cheaply) this always
/// returns `true`; every other signature-checking function in this crate delegates to it so there
/// is exactly one place that decides whether verification is real.
pub fn verify(pubkey: &PublicKeyBytes, msg: &[u8], sig: &SignatureBytes) -> bool {
    #[cfg(feature = "fake_crypto")]
    {
        let _ = (pubkey, msg, sig);
        true
    }

    #[cfg(not(feature = "fake_crypto"))]
    {
        let (pk, signature) = match (pubkey.decompress(), sig.decompress()) {
            (Ok(pk), Ok(sig)) => (pk, sig),
            _ => return false,
        };
        signature.verify(true, msg, DST, &[], &pk, true) == blst::BLST_ERROR::BLST_SUCCESS
    }
}

/// Verifies an aggregate signature over distinct `(pubkey, message)` pairs in one pairing check.
pub fn verify_aggregate(sig: &SignatureBytes, msgs: &[&[u8]], pubkeys: &[&PublicKeyBytes]) -> bool {
    #[cfg(feature = "fake_crypto")]
    {
        let _ = (sig, msgs, pubkeys);
        true
    }

    #[cfg(not(feature = "fake_crypto"))]
    {
        if msgs.len() != pubkeys.len() || msgs.is_empty() {
            return false;
        }
        let signature = match sig.decompress() {
            Ok(s) => s,
            Err(_) => return false,
        };
        let pks: Vec<blst::min_pk::PublicKey> = match pubkeys.iter().map(|pk| pk.decompress()).collect() {
            Ok(pks) => pks,
            Err(_) => return false,
        };
        let pk_refs: Vec<&blst::min_pk::PublicKey> = pks.iter().collect();
        signature.aggregate_verify(true, msgs, DST, &pk_refs, true) == blst::BLST_ERROR::BLST_SUCCESS
    }
}

mod serde_bytes_fixed {
    use super::PUBLIC_KEY_BYTES_LEN;
    use serde::{de, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; PUBLIC_KEY_BYTES_LEN], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<[u8; PUBLIC_KEY_BYTES_LEN], D::Error> {
        let s = String::deserialize(d)?;
        let stripped = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(stripped).map_err(de::Error::custom)?;
        if bytes.len() != PUBLIC_KEY_BYTES_LEN {
            return Err(de::Error::custom("invalid public key length"));
        }
        let mut arr = [0u8; PUBLIC_KEY_BYTES_LEN];
        arr.copy_from_slice(&bytes);
        Ok(arr)
    }
}

mod serde_bytes_fixed_sig {
    use super::SIGNATURE_BYTES_LEN;
    use serde::{de, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; SIGNATURE_BYTES_LEN], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<[u8; SIGNATURE_BYTES_LEN], D::Error> {
        let s = String::deserialize(d)?;
        let stripped = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(stripped).map_err(de::Error::custom)?;
        if bytes.len() != SIGNATURE_BYTES_LEN {
            return Err(de::Error::custom("invalid signature length"));
        }
        let mut arr = [0u8; SIGNATURE_BYTES_LEN];
        arr.copy_from_slice(&bytes);
        Ok(arr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            PublicKeyBytes::from_bytes(&[0u8; 10]),
            Err(Error::InvalidByteLength {
                got: 10,
                expected: PUBLIC_KEY_BYTES_LEN
            })
        );
    }

    #[test]
    fn empty_signature_round_trips() {
        let sig = SignatureBytes::empty();
        assert_eq!(sig.as_bytes().len(), SIGNATURE_BYTES_LEN);
    }
}
