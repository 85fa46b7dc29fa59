//! The validator pubkey → index map §3 says the state carries alongside its field list. Never
//! serialized: rebuilt from `validators` on decode via [`PubkeyCache::rebuild`].

use crate::Validator;
use bls::PublicKeyBytes;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PubkeyCache {
    index: HashMap<PublicKeyBytes, usize>,
}

impl PubkeyCache {
    pub fn get(&self, pubkey: &PublicKeyBytes) -> Option<usize> {
        self.index.get(pubkey).copied()
    }

    pub fn insert(&mut self, pubkey: PublicKeyBytes, index: usize) {
        self.index.insert(pubkey, index);
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn rebuild<'a>(&mut self, validators: impl Iterator<Item = &'a Validator>) {
        self.index.clear();
        for (i, validator) in validators.enumerate() {
            self.index.insert(validator.pubkey.clone(), i);
        }
    }
}
