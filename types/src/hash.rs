//! 256-bit block hashes and the ledger checksum accumulator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 32-byte BLAKE2b block digest, identifying a block in an account's chain.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockHash(pub [u8; 32]);

impl BlockHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({}…)", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl FromStr for BlockHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// Running XOR of committed head hashes, persisted in the `checksum` table.
///
/// Cheap ledger fingerprint: two stores that processed the same blocks end up
/// with the same checksum regardless of order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Checksum(pub [u8; 32]);

impl Checksum {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// XOR a block hash in; toggling twice restores the previous value.
    pub fn toggle(&mut self, hash: &BlockHash) {
        for (c, h) in self.0.iter_mut().zip(hash.0.iter()) {
            *c ^= h;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_hex_round_trip() {
        let hash = BlockHash::new([0xAB; 32]);
        let text = hash.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(text.parse::<BlockHash>().unwrap(), hash);
    }

    #[test]
    fn hash_rejects_short_hex() {
        assert!("ABCD".parse::<BlockHash>().is_err());
    }

    #[test]
    fn zero_is_zero() {
        assert!(BlockHash::ZERO.is_zero());
        assert!(!BlockHash::new([1; 32]).is_zero());
    }

    #[test]
    fn checksum_toggle_is_involutive() {
        let mut checksum = Checksum::ZERO;
        let hash = BlockHash::new([0x5A; 32]);
        checksum.toggle(&hash);
        assert_ne!(checksum, Checksum::ZERO);
        checksum.toggle(&hash);
        assert_eq!(checksum, Checksum::ZERO);
    }
}
