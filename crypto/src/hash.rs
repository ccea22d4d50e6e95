//! BLAKE2b hashing for block digests.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

/// Incremental 256-bit BLAKE2b state, used for multi-field block hashing.
pub type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit BLAKE2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b_deterministic() {
        assert_eq!(blake2b_256(b"chrysos"), blake2b_256(b"chrysos"));
    }

    #[test]
    fn blake2b_different_inputs() {
        assert_ne!(blake2b_256(b"hello"), blake2b_256(b"world"));
    }

    #[test]
    fn blake2b_multi_equivalent() {
        assert_eq!(
            blake2b_256(b"helloworld"),
            blake2b_256_multi(&[b"hello", b"world"])
        );
    }
}
