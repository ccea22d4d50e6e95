//! Proof-of-work validation.
//!
//! Every block carries an 8-byte nonce computed over its root (the previous
//! block hash, or the account key for opening blocks). Nonce generation
//! happens on the client; the ledger only validates.

pub mod validator;

pub use validator::{validate_work, work_value, WORK_THRESHOLD};
