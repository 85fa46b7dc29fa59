use crate::{PublicKeyBytes, SignatureBytes, DST};
use rand::RngCore;

/// A validator's private signing key. Only used by test fixtures and the (out-of-scope)
/// validator client; the state-transition function never holds one.
pub struct SecretKey(
    #[cfg(not(feature = "fake_crypto"))] blst::min_pk::SecretKey,
    #[cfg(feature = "fake_crypto")] [u8; 32],
);

impl SecretKey {
    pub fn random() -> Self {
        let mut ikm = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut ikm);
        Self::from_ikm(&ikm)
    }

    /// Deterministic key material for fixtures — test harnesses need the same index to always
    /// yield the same keypair across runs, which `random()` can't give them.
    pub fn from_ikm_for_test(ikm: &[u8; 32]) -> Self {
        Self::from_ikm(ikm)
    }

    #[cfg(not(feature = "fake_crypto"))]
    fn from_ikm(ikm: &[u8; 32]) -> Self {
        Self(blst::min_pk::SecretKey::key_gen(ikm, &[]).expect("32-byte ikm is always valid"))
    }

    #[cfg(feature = "fake_crypto")]
    fn from_ikm(ikm: &[u8; 32]) -> Self {
        Self(*ikm)
    }

    #[cfg(not(feature = "fake_crypto"))]
    pub fn public_key(&self) -> PublicKeyBytes {
        PublicKeyBytes::from_bytes(&self.0.sk_to_pk().compress()).expect("valid length")
    }

    #[cfg(feature = "fake_crypto")]
    pub fn public_key(&self) -> PublicKeyBytes {
        let mut bytes = [0u8; crate::PUBLIC_KEY_BYTES_LEN];
        bytes[0..32].copy_from_slice(&self.0);
        PublicKeyBytes::from_bytes(&bytes).expect("valid length")
    }

    #[cfg(not(feature = "fake_crypto"))]
    pub fn sign(&self, msg: &[u8]) -> SignatureBytes {
        SignatureBytes::from_bytes(&self.0.sign(msg, DST, &[]).compress()).expect("valid length")
    }

    #[cfg(feature = "fake_crypto")]
    pub fn sign(&self, _msg: &[u8]) -> SignatureBytes {
        SignatureBytes::empty()
    }
}
