//! Ed25519 key generation and account derivation.

use chrysos_types::{Account, RawKey};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::blake2b_256_multi;

/// An Ed25519 key pair: the account (public key) and its secret.
pub struct KeyPair {
    pub account: Account,
    pub raw_key: RawKey,
}

impl KeyPair {
    /// Generate a new key pair from the system random source.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self::from_raw_key(RawKey::new(seed))
    }

    /// Reconstruct a key pair from a secret key.
    pub fn from_raw_key(raw_key: RawKey) -> Self {
        let account = derive_account(&raw_key);
        Self { account, raw_key }
    }
}

/// Derive the account (public key) from a secret key.
pub fn derive_account(raw_key: &RawKey) -> Account {
    let signing = SigningKey::from_bytes(raw_key.as_bytes());
    Account::new(signing.verifying_key().to_bytes())
}

/// Derive the `index`-th key from a 32-byte seed (wallet-style derivation).
pub fn deterministic_key(seed: &RawKey, index: u32) -> RawKey {
    let digest = blake2b_256_multi(&[seed.as_bytes(), &index.to_be_bytes()]);
    RawKey::new(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_accounts_differ() {
        assert_ne!(KeyPair::generate().account, KeyPair::generate().account);
    }

    #[test]
    fn derivation_is_deterministic() {
        let raw = RawKey::new([3; 32]);
        assert_eq!(derive_account(&raw), derive_account(&raw));
    }

    #[test]
    fn deterministic_keys_differ_by_index() {
        let seed = RawKey::new([5; 32]);
        let first = deterministic_key(&seed, 0);
        let second = deterministic_key(&seed, 1);
        assert_ne!(first.as_bytes(), second.as_bytes());
        assert_eq!(
            deterministic_key(&seed, 0).as_bytes(),
            first.as_bytes()
        );
    }
}
