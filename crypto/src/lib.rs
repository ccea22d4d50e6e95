//! Cryptographic primitives for the chrysos ledger.

pub mod hash;
pub mod keys;
pub mod sign;

pub use hash::{blake2b_256, blake2b_256_multi, Blake2b256};
pub use keys::{derive_account, deterministic_key, KeyPair};
pub use sign::{sign_message, validate_message};
