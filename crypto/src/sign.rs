//! Ed25519 signing and verification over block digests.

use chrysos_types::{Account, BlockHash, RawKey, Signature};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};

/// Sign a block digest with a secret key.
pub fn sign_message(raw_key: &RawKey, digest: &BlockHash) -> Signature {
    let signing = SigningKey::from_bytes(raw_key.as_bytes());
    Signature::new(signing.sign(digest.as_bytes()).to_bytes())
}

/// Verify a signature over a block digest under an account key.
///
/// A malformed public key or signature simply fails verification.
pub fn validate_message(account: &Account, digest: &BlockHash, signature: &Signature) -> bool {
    let Ok(verifying) = VerifyingKey::from_bytes(account.as_bytes()) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
    verifying.verify(digest.as_bytes(), &sig).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn sign_and_verify() {
        let keys = KeyPair::generate();
        let digest = BlockHash::new([0xAB; 32]);
        let sig = sign_message(&keys.raw_key, &digest);
        assert!(validate_message(&keys.account, &digest, &sig));
    }

    #[test]
    fn wrong_account_fails() {
        let keys = KeyPair::generate();
        let other = KeyPair::generate();
        let digest = BlockHash::new([0xAB; 32]);
        let sig = sign_message(&keys.raw_key, &digest);
        assert!(!validate_message(&other.account, &digest, &sig));
    }

    #[test]
    fn tampered_digest_fails() {
        let keys = KeyPair::generate();
        let sig = sign_message(&keys.raw_key, &BlockHash::new([1; 32]));
        assert!(!validate_message(&keys.account, &BlockHash::new([2; 32]), &sig));
    }

    #[test]
    fn garbage_public_key_is_invalid_not_panic() {
        // Not every 32-byte string is a curve point.
        let bogus = Account::new([0xFF; 32]);
        let sig = Signature::new([0u8; 64]);
        assert!(!validate_message(&bogus, &BlockHash::ZERO, &sig));
    }
}
