//! Legacy send block.

use chrysos_crypto::{blake2b_256_multi, sign_message};
use chrysos_types::{Account, Amount, BlockHash, RawKey, Signature};

use crate::wire::{self, WireReader};
use crate::BlockError;

/// Hashed fields of a legacy send, in wire order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendHashables {
    pub previous: BlockHash,
    pub destination: Account,
    /// The sender's balance *after* the send; the amount is derived from the
    /// predecessor's balance.
    pub balance: Amount,
    pub dividend: BlockHash,
}

impl SendHashables {
    fn digest(&self) -> [u8; 32] {
        blake2b_256_multi(&[
            self.previous.as_bytes(),
            self.destination.as_bytes(),
            &self.balance.to_be_bytes(),
            self.dividend.as_bytes(),
        ])
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendBlock {
    pub hashables: SendHashables,
    pub signature: Signature,
    pub work: u64,
}

impl SendBlock {
    pub const SIZE: usize = 32 + 32 + 16 + 32 + 64 + 8;

    pub fn new(
        previous: BlockHash,
        destination: Account,
        balance: Amount,
        dividend: BlockHash,
        raw_key: &RawKey,
        work: u64,
    ) -> Self {
        let hashables = SendHashables {
            previous,
            destination,
            balance,
            dividend,
        };
        let signature = sign_message(raw_key, &BlockHash::new(hashables.digest()));
        Self {
            hashables,
            signature,
            work,
        }
    }

    pub fn hash(&self) -> BlockHash {
        BlockHash::new(self.hashables.digest())
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::SIZE);
        bytes.extend_from_slice(self.hashables.previous.as_bytes());
        bytes.extend_from_slice(self.hashables.destination.as_bytes());
        bytes.extend_from_slice(&self.hashables.balance.to_be_bytes());
        bytes.extend_from_slice(self.hashables.dividend.as_bytes());
        bytes.extend_from_slice(self.signature.as_bytes());
        bytes.extend_from_slice(&self.work.to_le_bytes());
        bytes
    }

    pub fn deserialize(payload: &[u8]) -> Result<Self, BlockError> {
        let mut reader = WireReader::new(payload);
        let previous = reader.hash()?;
        let destination = reader.account()?;
        let balance = reader.amount()?;
        let dividend = reader.hash()?;
        let signature = reader.signature()?;
        let work = reader.work_le()?;
        reader.finish()?;
        Ok(Self {
            hashables: SendHashables {
                previous,
                destination,
                balance,
                dividend,
            },
            signature,
            work,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "send",
            "previous": self.hashables.previous.to_string(),
            "destination": self.hashables.destination.encode(),
            "balance": hex::encode_upper(self.hashables.balance.to_be_bytes()),
            "dividend": self.hashables.dividend.to_string(),
            "work": format!("{:016x}", self.work),
            "signature": self.signature.to_string(),
        })
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, BlockError> {
        Ok(Self {
            hashables: SendHashables {
                previous: wire::json_hash(value, "previous")?,
                destination: wire::json_account(value, "destination")?,
                balance: wire::json_amount_hex(value, "balance")?,
                dividend: wire::json_hash(value, "dividend")?,
            },
            signature: wire::json_signature(value, "signature")?,
            work: wire::json_work(value, "work")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrysos_crypto::{validate_message, KeyPair};

    fn block() -> (KeyPair, SendBlock) {
        let keys = KeyPair::from_raw_key(RawKey::new([0x21; 32]));
        let block = SendBlock::new(
            BlockHash::new([1; 32]),
            Account::new([2; 32]),
            Amount::raw(1000),
            BlockHash::ZERO,
            &keys.raw_key,
            99,
        );
        (keys, block)
    }

    #[test]
    fn signature_covers_hash() {
        let (keys, block) = block();
        assert!(validate_message(&keys.account, &block.hash(), &block.signature));
    }

    #[test]
    fn hash_changes_with_destination() {
        let (_, block) = block();
        let mut other = block.clone();
        other.hashables.destination = Account::new([9; 32]);
        assert_ne!(block.hash(), other.hash());
    }

    #[test]
    fn wire_round_trip() {
        let (_, block) = block();
        let bytes = block.serialize();
        assert_eq!(bytes.len(), SendBlock::SIZE);
        assert_eq!(SendBlock::deserialize(&bytes).unwrap(), block);
    }

    #[test]
    fn json_round_trip() {
        let (_, block) = block();
        assert_eq!(SendBlock::from_json(&block.to_json()).unwrap(), block);
    }
}
