//! Nonce validation against a block root.

use chrysos_crypto::blake2b_256;
use chrysos_types::BlockHash;

/// Minimum difficulty a work value must reach to be accepted.
pub const WORK_THRESHOLD: u64 = 0xffff_ffc0_0000_0000;

/// The difficulty value of a nonce for a given root: the first eight bytes of
/// `BLAKE2b(nonce LE || root)`, interpreted little-endian.
pub fn work_value(root: &BlockHash, nonce: u64) -> u64 {
    let mut input = [0u8; 40];
    input[..8].copy_from_slice(&nonce.to_le_bytes());
    input[8..].copy_from_slice(root.as_bytes());
    let digest = blake2b_256(&input);
    u64::from_le_bytes(digest[..8].try_into().expect("digest is 32 bytes"))
}

/// Whether a nonce meets the network difficulty for a root.
pub fn validate_work(root: &BlockHash, nonce: u64) -> bool {
    work_value(root, nonce) >= WORK_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Brute-force a valid nonce; only viable in tests because the threshold
    /// check here is done against the real network difficulty.
    fn solve(root: &BlockHash) -> u64 {
        (0u64..).find(|nonce| validate_work(root, *nonce)).unwrap()
    }

    #[test]
    fn work_value_is_deterministic() {
        let root = BlockHash::new([9; 32]);
        assert_eq!(work_value(&root, 42), work_value(&root, 42));
    }

    #[test]
    fn work_value_depends_on_root_and_nonce() {
        let a = BlockHash::new([1; 32]);
        let b = BlockHash::new([2; 32]);
        assert_ne!(work_value(&a, 42), work_value(&b, 42));
        assert_ne!(work_value(&a, 42), work_value(&a, 43));
    }

    #[test]
    #[ignore = "brute-forces the live threshold; run explicitly"]
    fn solved_nonce_validates() {
        let root = BlockHash::new([7; 32]);
        let nonce = solve(&root);
        assert!(validate_work(&root, nonce));
        assert!(!validate_work(&BlockHash::new([8; 32]), nonce) || nonce == 0);
    }
}
