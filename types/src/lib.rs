//! Fundamental types for the chrysos ledger.
//!
//! This crate defines the fixed-width value types shared across the rest of
//! the workspace: 256-bit hashes and account keys, 128-bit balances, 512-bit
//! signatures, epoch tags, and the ledger-wide constants.

pub mod account;
pub mod amount;
pub mod epoch;
pub mod hash;
pub mod keys;
pub mod time;

pub use account::{Account, AccountDecodeError};
pub use amount::{
    Amount, CHR_RATIO, GCHR_RATIO, KCHR_RATIO, MCHR_RATIO, MILLICHR_RATIO,
    MINIMUM_DIVIDEND_AMOUNT, UCHR_RATIO,
};
pub use epoch::Epoch;
pub use hash::{BlockHash, Checksum};
pub use keys::{RawKey, Signature};
pub use time::seconds_since_epoch;

/// Total supply created in the genesis block.
pub const GENESIS_AMOUNT: u128 = u128::MAX;

/// The account no one controls; sends here permanently remove supply.
pub const BURN_ACCOUNT: Account = Account::ZERO;

/// Sentinel root of the dividend chain.
pub const DIVIDEND_BASE: BlockHash = BlockHash::ZERO;
