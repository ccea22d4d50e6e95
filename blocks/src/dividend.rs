//! Dividend block: a supply-inflation event on the dividend account chain.
//!
//! Only the distinguished dividend account may issue these. The balance drop
//! against the predecessor is the pool distributed across all holders; the
//! `dividend` field links to the previous dividend, forming the chain every
//! claim walks.

use chrysos_crypto::{blake2b_256_multi, sign_message};
use chrysos_types::{Account, Amount, BlockHash, RawKey, Signature};

use crate::wire::{self, WireReader};
use crate::BlockError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DividendHashables {
    pub account: Account,
    pub previous: BlockHash,
    pub representative: Account,
    pub balance: Amount,
    /// The previous dividend block, `DIVIDEND_BASE` for the first.
    pub dividend: BlockHash,
}

impl DividendHashables {
    fn digest(&self) -> [u8; 32] {
        blake2b_256_multi(&[
            self.account.as_bytes(),
            self.previous.as_bytes(),
            self.representative.as_bytes(),
            &self.balance.to_be_bytes(),
            self.dividend.as_bytes(),
        ])
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DividendBlock {
    pub hashables: DividendHashables,
    pub signature: Signature,
    pub work: u64,
}

impl DividendBlock {
    pub const SIZE: usize = 32 + 32 + 32 + 16 + 32 + 64 + 8;

    pub fn new(
        account: Account,
        previous: BlockHash,
        representative: Account,
        balance: Amount,
        dividend: BlockHash,
        raw_key: &RawKey,
        work: u64,
    ) -> Self {
        let hashables = DividendHashables {
            account,
            previous,
            representative,
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
        bytes.extend_from_slice(self.hashables.account.as_bytes());
        bytes.extend_from_slice(self.hashables.previous.as_bytes());
        bytes.extend_from_slice(self.hashables.representative.as_bytes());
        bytes.extend_from_slice(&self.hashables.balance.to_be_bytes());
        bytes.extend_from_slice(self.hashables.dividend.as_bytes());
        bytes.extend_from_slice(self.signature.as_bytes());
        bytes.extend_from_slice(&self.work.to_le_bytes());
        bytes
    }

    pub fn deserialize(payload: &[u8]) -> Result<Self, BlockError> {
        let mut reader = WireReader::new(payload);
        let account = reader.account()?;
        let previous = reader.hash()?;
        let representative = reader.account()?;
        let balance = reader.amount()?;
        let dividend = reader.hash()?;
        let signature = reader.signature()?;
        let work = reader.work_le()?;
        reader.finish()?;
        Ok(Self {
            hashables: DividendHashables {
                account,
                previous,
                representative,
                balance,
                dividend,
            },
            signature,
            work,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "dividend",
            "account": self.hashables.account.encode(),
            "previous": self.hashables.previous.to_string(),
            "representative": self.hashables.representative.encode(),
            "balance": hex::encode_upper(self.hashables.balance.to_be_bytes()),
            "dividend": self.hashables.dividend.to_string(),
            "work": format!("{:016x}", self.work),
            "signature": self.signature.to_string(),
        })
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, BlockError> {
        Ok(Self {
            hashables: DividendHashables {
                account: wire::json_account(value, "account")?,
                previous: wire::json_hash(value, "previous")?,
                representative: wire::json_account(value, "representative")?,
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
    use chrysos_crypto::KeyPair;

    #[test]
    fn wire_round_trip() {
        let keys = KeyPair::from_raw_key(RawKey::new([0x51; 32]));
        let block = DividendBlock::new(
            keys.account,
            BlockHash::new([1; 32]),
            keys.account,
            Amount::raw(999),
            BlockHash::ZERO,
            &keys.raw_key,
            21,
        );
        let bytes = block.serialize();
        assert_eq!(bytes.len(), DividendBlock::SIZE);
        assert_eq!(DividendBlock::deserialize(&bytes).unwrap(), block);
        assert_eq!(DividendBlock::from_json(&block.to_json()).unwrap(), block);
    }

    #[test]
    fn hash_depends_on_chain_link() {
        let keys = KeyPair::from_raw_key(RawKey::new([0x52; 32]));
        let a = DividendBlock::new(
            keys.account,
            BlockHash::new([1; 32]),
            keys.account,
            Amount::raw(999),
            BlockHash::ZERO,
            &keys.raw_key,
            0,
        );
        let b = DividendBlock::new(
            keys.account,
            BlockHash::new([1; 32]),
            keys.account,
            Amount::raw(999),
            BlockHash::new([2; 32]),
            &keys.raw_key,
            0,
        );
        assert_ne!(a.hash(), b.hash());
    }
}
