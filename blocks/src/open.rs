//! Legacy open block, the first block of a pre-upgrade account chain.

use chrysos_crypto::{blake2b_256_multi, sign_message};
use chrysos_types::{Account, BlockHash, RawKey, Signature};

use crate::wire::{self, WireReader};
use crate::BlockError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenHashables {
    /// Hash of the send being pocketed; the genesis open references a
    /// sentinel instead.
    pub source: BlockHash,
    pub representative: Account,
    pub account: Account,
    pub dividend: BlockHash,
}

impl OpenHashables {
    fn digest(&self) -> [u8; 32] {
        blake2b_256_multi(&[
            self.source.as_bytes(),
            self.representative.as_bytes(),
            self.account.as_bytes(),
            self.dividend.as_bytes(),
        ])
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenBlock {
    pub hashables: OpenHashables,
    pub signature: Signature,
    pub work: u64,
}

impl OpenBlock {
    pub const SIZE: usize = 32 + 32 + 32 + 32 + 64 + 8;

    pub fn new(
        source: BlockHash,
        representative: Account,
        account: Account,
        dividend: BlockHash,
        raw_key: &RawKey,
        work: u64,
    ) -> Self {
        let hashables = OpenHashables {
            source,
            representative,
            account,
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
        bytes.extend_from_slice(self.hashables.source.as_bytes());
        bytes.extend_from_slice(self.hashables.representative.as_bytes());
        bytes.extend_from_slice(self.hashables.account.as_bytes());
        bytes.extend_from_slice(self.hashables.dividend.as_bytes());
        bytes.extend_from_slice(self.signature.as_bytes());
        bytes.extend_from_slice(&self.work.to_le_bytes());
        bytes
    }

    pub fn deserialize(payload: &[u8]) -> Result<Self, BlockError> {
        let mut reader = WireReader::new(payload);
        let source = reader.hash()?;
        let representative = reader.account()?;
        let account = reader.account()?;
        let dividend = reader.hash()?;
        let signature = reader.signature()?;
        let work = reader.work_le()?;
        reader.finish()?;
        Ok(Self {
            hashables: OpenHashables {
                source,
                representative,
                account,
                dividend,
            },
            signature,
            work,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "open",
            "source": self.hashables.source.to_string(),
            "representative": self.hashables.representative.encode(),
            "account": self.hashables.account.encode(),
            "dividend": self.hashables.dividend.to_string(),
            "work": format!("{:016x}", self.work),
            "signature": self.signature.to_string(),
        })
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, BlockError> {
        Ok(Self {
            hashables: OpenHashables {
                source: wire::json_hash(value, "source")?,
                representative: wire::json_account(value, "representative")?,
                account: wire::json_account(value, "account")?,
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

    #[test]
    fn signature_verifies_under_account_key() {
        let keys = KeyPair::from_raw_key(RawKey::new([0x31; 32]));
        let block = OpenBlock::new(
            BlockHash::new([1; 32]),
            keys.account,
            keys.account,
            BlockHash::ZERO,
            &keys.raw_key,
            0,
        );
        assert!(validate_message(&keys.account, &block.hash(), &block.signature));
    }

    #[test]
    fn wire_round_trip() {
        let keys = KeyPair::from_raw_key(RawKey::new([0x32; 32]));
        let block = OpenBlock::new(
            BlockHash::new([4; 32]),
            keys.account,
            keys.account,
            BlockHash::new([5; 32]),
            &keys.raw_key,
            11,
        );
        let bytes = block.serialize();
        assert_eq!(bytes.len(), OpenBlock::SIZE);
        assert_eq!(OpenBlock::deserialize(&bytes).unwrap(), block);
        assert_eq!(OpenBlock::from_json(&block.to_json()).unwrap(), block);
    }
}
