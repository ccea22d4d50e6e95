//! Legacy receive block.

use chrysos_crypto::{blake2b_256_multi, sign_message};
use chrysos_types::{BlockHash, RawKey, Signature};

use crate::wire::{self, WireReader};
use crate::BlockError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiveHashables {
    pub previous: BlockHash,
    /// Hash of the send being pocketed.
    pub source: BlockHash,
    pub dividend: BlockHash,
}

impl ReceiveHashables {
    fn digest(&self) -> [u8; 32] {
        blake2b_256_multi(&[
            self.previous.as_bytes(),
            self.source.as_bytes(),
            self.dividend.as_bytes(),
        ])
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiveBlock {
    pub hashables: ReceiveHashables,
    pub signature: Signature,
    pub work: u64,
}

impl ReceiveBlock {
    pub const SIZE: usize = 32 + 32 + 32 + 64 + 8;

    pub fn new(
        previous: BlockHash,
        source: BlockHash,
        dividend: BlockHash,
        raw_key: &RawKey,
        work: u64,
    ) -> Self {
        let hashables = ReceiveHashables {
            previous,
            source,
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
        bytes.extend_from_slice(self.hashables.source.as_bytes());
        bytes.extend_from_slice(self.hashables.dividend.as_bytes());
        bytes.extend_from_slice(self.signature.as_bytes());
        bytes.extend_from_slice(&self.work.to_le_bytes());
        bytes
    }

    pub fn deserialize(payload: &[u8]) -> Result<Self, BlockError> {
        let mut reader = WireReader::new(payload);
        let previous = reader.hash()?;
        let source = reader.hash()?;
        let dividend = reader.hash()?;
        let signature = reader.signature()?;
        let work = reader.work_le()?;
        reader.finish()?;
        Ok(Self {
            hashables: ReceiveHashables {
                previous,
                source,
                dividend,
            },
            signature,
            work,
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "receive",
            "previous": self.hashables.previous.to_string(),
            "source": self.hashables.source.to_string(),
            "dividend": self.hashables.dividend.to_string(),
            "work": format!("{:016x}", self.work),
            "signature": self.signature.to_string(),
        })
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, BlockError> {
        Ok(Self {
            hashables: ReceiveHashables {
                previous: wire::json_hash(value, "previous")?,
                source: wire::json_hash(value, "source")?,
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

    #[test]
    fn wire_round_trip() {
        let block = ReceiveBlock::new(
            BlockHash::new([1; 32]),
            BlockHash::new([2; 32]),
            BlockHash::ZERO,
            &RawKey::new([3; 32]),
            7,
        );
        let bytes = block.serialize();
        assert_eq!(bytes.len(), ReceiveBlock::SIZE);
        assert_eq!(ReceiveBlock::deserialize(&bytes).unwrap(), block);
        assert_eq!(ReceiveBlock::from_json(&block.to_json()).unwrap(), block);
    }
}
