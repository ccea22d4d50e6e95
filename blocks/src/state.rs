//! State block, the universal block variant.
//!
//! A state block restates the account's entire head state: balance,
//! representative, and the observed dividend-chain head. Whether it is a
//! send, a receive, or a pure representative change is derived from the
//! balance delta and the link field, not from the type tag.

use chrysos_crypto::{blake2b_256_multi, sign_message};
use chrysos_types::{Account, Amount, BlockHash, RawKey, Signature};

use crate::wire::{self, WireReader};
use crate::{BlockError, BlockType};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateHashables {
    pub account: Account,
    pub previous: BlockHash,
    pub representative: Account,
    pub balance: Amount,
    /// Destination account if the balance dropped, source block hash if it
    /// rose, zero for a representative change.
    pub link: BlockHash,
    pub dividend: BlockHash,
}

impl StateHashables {
    fn digest(&self) -> [u8; 32] {
        // The preamble is the type tag zero-extended to 32 bytes, which
        // keeps state digests disjoint from legacy digests over the same
        // field bytes.
        let mut preamble = [0u8; 32];
        preamble[31] = BlockType::State.as_u8();
        blake2b_256_multi(&[
            &preamble,
            self.account.as_bytes(),
            self.previous.as_bytes(),
            self.representative.as_bytes(),
            &self.balance.to_be_bytes(),
            self.link.as_bytes(),
            self.dividend.as_bytes(),
        ])
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateBlock {
    pub hashables: StateHashables,
    pub signature: Signature,
    pub work: u64,
}

impl StateBlock {
    pub const SIZE: usize = 32 + 32 + 32 + 16 + 32 + 32 + 64 + 8;

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account: Account,
        previous: BlockHash,
        representative: Account,
        balance: Amount,
        link: BlockHash,
        dividend: BlockHash,
        raw_key: &RawKey,
        work: u64,
    ) -> Self {
        let hashables = StateHashables {
            account,
            previous,
            representative,
            balance,
            link,
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
        bytes.extend_from_slice(self.hashables.account.as_bytes());
        bytes.extend_from_slice(self.hashables.previous.as_bytes());
        bytes.extend_from_slice(self.hashables.representative.as_bytes());
        bytes.extend_from_slice(&self.hashables.balance.to_be_bytes());
        bytes.extend_from_slice(self.hashables.link.as_bytes());
        bytes.extend_from_slice(self.hashables.dividend.as_bytes());
        bytes.extend_from_slice(self.signature.as_bytes());
        // State blocks are the one variant whose work travels big-endian.
        bytes.extend_from_slice(&self.work.to_be_bytes());
        bytes
    }

    pub fn deserialize(payload: &[u8]) -> Result<Self, BlockError> {
        let mut reader = WireReader::new(payload);
        let account = reader.account()?;
        let previous = reader.hash()?;
        let representative = reader.account()?;
        let balance = reader.amount()?;
        let link = reader.hash()?;
        let dividend = reader.hash()?;
        let signature = reader.signature()?;
        let work = reader.work_be()?;
        reader.finish()?;
        Ok(Self {
            hashables: StateHashables {
                account,
                previous,
                representative,
                balance,
                link,
                dividend,
            },
            signature,
            work,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "state",
            "account": self.hashables.account.encode(),
            "previous": self.hashables.previous.to_string(),
            "representative": self.hashables.representative.encode(),
            "balance": self.hashables.balance.to_string(),
            "link": self.hashables.link.to_string(),
            "dividend": self.hashables.dividend.to_string(),
            "work": format!("{:016x}", self.work),
            "signature": self.signature.to_string(),
        })
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, BlockError> {
        Ok(Self {
            hashables: StateHashables {
                account: wire::json_account(value, "account")?,
                previous: wire::json_hash(value, "previous")?,
                representative: wire::json_account(value, "representative")?,
                balance: wire::json_amount_dec(value, "balance")?,
                link: wire::json_hash(value, "link")?,
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

    fn block() -> (KeyPair, StateBlock) {
        let keys = KeyPair::from_raw_key(RawKey::new([0x41; 32]));
        let block = StateBlock::new(
            keys.account,
            BlockHash::new([1; 32]),
            keys.account,
            Amount::raw(12345),
            BlockHash::new([2; 32]),
            BlockHash::new([3; 32]),
            &keys.raw_key,
            0xDEAD_BEEF_0000_0001,
        );
        (keys, block)
    }

    #[test]
    fn signature_covers_hash() {
        let (keys, block) = block();
        assert!(validate_message(&keys.account, &block.hash(), &block.signature));
    }

    #[test]
    fn preamble_distinguishes_state_hashes() {
        // A state block and a hand-fed legacy digest over the same bytes must
        // not collide; the preamble guarantees it.
        let (_, block) = block();
        let no_preamble = blake2b_256_multi(&[
            block.hashables.account.as_bytes(),
            block.hashables.previous.as_bytes(),
            block.hashables.representative.as_bytes(),
            &block.hashables.balance.to_be_bytes(),
            block.hashables.link.as_bytes(),
            block.hashables.dividend.as_bytes(),
        ]);
        assert_ne!(block.hash(), BlockHash::new(no_preamble));
    }

    #[test]
    fn work_serializes_big_endian() {
        let (_, block) = block();
        let bytes = block.serialize();
        let tail = &bytes[StateBlock::SIZE - 8..];
        assert_eq!(tail, &block.work.to_be_bytes());
    }

    #[test]
    fn wire_round_trip() {
        let (_, block) = block();
        let bytes = block.serialize();
        assert_eq!(bytes.len(), StateBlock::SIZE);
        assert_eq!(StateBlock::deserialize(&bytes).unwrap(), block);
    }

    #[test]
    fn json_round_trip() {
        let (_, block) = block();
        assert_eq!(StateBlock::from_json(&block.to_json()).unwrap(), block);
    }

    #[test]
    fn json_balance_is_decimal() {
        let (_, block) = block();
        assert_eq!(block.to_json()["balance"], "12345");
    }
}
