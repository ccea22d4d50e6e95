//! Signed vote records persisted in the `vote` table.
//!
//! A vote binds a monotonically increasing per-account sequence number to a
//! set of block hashes. The store keeps only the highest-sequence vote per
//! account; replays with lower sequences are rejected by comparison, not
//! signature checks.

use chrysos_crypto::{blake2b_256_multi, sign_message, validate_message};
use chrysos_types::{Account, BlockHash, RawKey, Signature};
use serde::{Deserialize, Serialize};

const HASH_PREFIX: &[u8] = b"vote ";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Account that is voting.
    pub account: Account,
    /// Vote round sequence number.
    pub sequence: u64,
    /// The block hashes this vote is for.
    pub hashes: Vec<BlockHash>,
    /// Signature of the prefix, hashes, and sequence.
    pub signature: Signature,
}

impl Vote {
    pub fn new(account: Account, raw_key: &RawKey, sequence: u64, hashes: Vec<BlockHash>) -> Self {
        let mut vote = Self {
            account,
            sequence,
            hashes,
            signature: Signature::ZERO,
        };
        vote.signature = sign_message(raw_key, &vote.digest());
        vote
    }

    pub fn digest(&self) -> BlockHash {
        let mut parts: Vec<&[u8]> = Vec::with_capacity(self.hashes.len() + 2);
        parts.push(HASH_PREFIX);
        for hash in &self.hashes {
            parts.push(hash.as_bytes());
        }
        let sequence = self.sequence.to_le_bytes();
        parts.push(&sequence);
        BlockHash::new(blake2b_256_multi(&parts))
    }

    pub fn validate(&self) -> bool {
        validate_message(&self.account, &self.digest(), &self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrysos_crypto::KeyPair;

    #[test]
    fn fresh_vote_validates() {
        let keys = KeyPair::from_raw_key(RawKey::new([0x71; 32]));
        let vote = Vote::new(
            keys.account,
            &keys.raw_key,
            3,
            vec![BlockHash::new([1; 32]), BlockHash::new([2; 32])],
        );
        assert!(vote.validate());
    }

    #[test]
    fn tampered_sequence_fails() {
        let keys = KeyPair::from_raw_key(RawKey::new([0x72; 32]));
        let mut vote = Vote::new(keys.account, &keys.raw_key, 3, vec![BlockHash::new([1; 32])]);
        vote.sequence = 4;
        assert!(!vote.validate());
    }

    #[test]
    fn digest_depends_on_hashes() {
        let keys = KeyPair::from_raw_key(RawKey::new([0x73; 32]));
        let a = Vote::new(keys.account, &keys.raw_key, 1, vec![BlockHash::new([1; 32])]);
        let b = Vote::new(keys.account, &keys.raw_key, 1, vec![BlockHash::new([2; 32])]);
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn bincode_round_trip() {
        let keys = KeyPair::from_raw_key(RawKey::new([0x74; 32]));
        let vote = Vote::new(keys.account, &keys.raw_key, 9, vec![BlockHash::new([5; 32])]);
        let bytes = bincode::serialize(&vote).unwrap();
        let back: Vote = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, vote);
        assert!(back.validate());
    }
}
