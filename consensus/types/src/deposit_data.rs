use crate::Hash256;
use bls::{PublicKeyBytes, SignatureBytes};
use serde_derive::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct DepositData {
    pub pubkey: PublicKeyBytes,
    pub withdrawal_credentials: Hash256,
    pub amount: u64,
    pub signature: SignatureBytes,
}

impl DepositData {
    /// The message signed by a depositor: the container with `signature` zeroed out, per the
    /// deposit-message signing domain (§4.D "deposit" effects).
    pub fn as_deposit_message_bytes(&self) -> Vec<u8> {
        use tree_hash::TreeHash;

        #[derive(TreeHash)]
        struct DepositMessage<'a> {
            pubkey: &'a PublicKeyBytes,
            withdrawal_credentials: &'a Hash256,
            amount: u64,
        }

        DepositMessage {
            pubkey: &self.pubkey,
            withdrawal_credentials: &self.withdrawal_credentials,
            amount: self.amount,
        }
        .tree_hash_root()
    }
}
