use crate::{verify_aggregate, Error, PublicKeyBytes, SignatureBytes, DST};

/// One entry of a [`SignatureSet`]: a message and the public key(s) that are claimed to have
/// signed it (more than one key for an attestation, whose signature is already an aggregate over
/// its committee).
pub struct SignedMessage {
    pubkey: PublicKeyBytes,
    message: Vec<u8>,
    signature: SignatureBytes,
}

impl SignedMessage {
    pub fn new(pubkeys: &[&PublicKeyBytes], message: Vec<u8>, signature: SignatureBytes) -> Result<Self, Error> {
        let pubkey = aggregate_pubkeys(pubkeys)?;
        Ok(Self {
            pubkey,
            message,
            signature,
        })
    }
}

/// An ordered collection of `(pubkey, message, signature)` triples gathered while processing a
/// block with signature verification deferred (`process_block_no_verify_any_sig`, §4.D mode 2).
/// [`SignatureSet::verify`] checks every entry with a single aggregate pairing rather than one
/// pairing per entry.
#[derive(Default)]
pub struct SignatureSet {
    entries: Vec<SignedMessage>,
}

impl SignatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: SignedMessage) {
        self.entries.push(entry);
    }

    /// Merges another set's entries into this one, e.g. combining per-operation-kind sets
    /// collected by independent `par_iter` passes into one set for the block.
    pub fn join(&mut self, mut other: SignatureSet) {
        self.entries.append(&mut other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Verifies every entry in one aggregate pairing check. Requires all entries to have
    /// distinct messages, which holds for block-level signature sets (block/randao/each
    /// attestation's `AttestationData` digest) but is not re-derived here — the caller assembles
    /// the set honestly.
    pub fn verify(&self) -> bool {
        if self.entries.is_empty() {
            return true;
        }

        let aggregate_signature = match aggregate_signatures(self.entries.iter().map(|e| &e.signature)) {
            Ok(sig) => sig,
            Err(_) => return false,
        };

        let messages: Vec<&[u8]> = self.entries.iter().map(|e| e.message.as_slice()).collect();
        let pubkeys: Vec<&PublicKeyBytes> = self.entries.iter().map(|e| &e.pubkey).collect();

        verify_aggregate(&aggregate_signature, &messages, &pubkeys)
    }
}

#[cfg(not(feature = "fake_crypto"))]
fn aggregate_pubkeys(pubkeys: &[&PublicKeyBytes]) -> Result<PublicKeyBytes, Error> {
    let decompressed: Vec<blst::min_pk::PublicKey> = pubkeys
        .iter()
        .map(|pk| pk.decompress())
        .collect::<Result<_, _>>()?;
    let refs: Vec<&blst::min_pk::PublicKey> = decompressed.iter().collect();
    let agg = blst::min_pk::AggregatePublicKey::aggregate(&refs, true)
        .map_err(|_| Error::InvalidCurvePoint)?;
    PublicKeyBytes::from_bytes(&agg.to_public_key().compress())
}

#[cfg(feature = "fake_crypto")]
fn aggregate_pubkeys(pubkeys: &[&PublicKeyBytes]) -> Result<PublicKeyBytes, Error> {
    pubkeys
        .first()
        .map(|pk| (*pk).clone())
        .ok_or(Error::InvalidCurvePoint)
}

#[cfg(not(feature = "fake_crypto"))]
fn aggregate_signatures<'a>(
    sigs: impl Iterator<Item = &'a SignatureBytes>,
) -> Result<SignatureBytes, Error> {
    let decompressed: Vec<blst::min_pk::Signature> =
        sigs.map(|s| s.decompress()).collect::<Result<_, _>>()?;
    let refs: Vec<&blst::min_pk::Signature> = decompressed.iter().collect();
    let agg = blst::min_pk::AggregateSignature::aggregate(&refs, true)
        .map_err(|_| Error::InvalidCurvePoint)?;
    SignatureBytes::from_bytes(&agg.to_signature().compress())
}

#[cfg(feature = "fake_crypto")]
fn aggregate_signatures<'a>(
    mut sigs: impl Iterator<Item = &'a SignatureBytes>,
) -> Result<SignatureBytes, Error> {
    let _ = DST;
    sigs.next().cloned().ok_or(Error::InvalidCurvePoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_verifies_trivially() {
        assert!(SignatureSet::new().verify());
    }
}
