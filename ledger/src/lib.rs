//! The chrysos ledger core.
//!
//! `Ledger` wraps the block store with the validation state machine: every
//! candidate block enters through [`Ledger::process`], which validates it
//! against the stored graph and, on success, commits all of its effects in
//! the caller's write transaction. [`Ledger::rollback`] inverts commits,
//! cascading through dependent accounts. The dividend engine orders
//! supply-inflation events into a chain and computes each account's
//! entitlement.

pub mod dividend;
pub mod error;
pub mod genesis;
pub mod ledger;
mod processor;
pub mod result;
mod rollback;

pub use error::LedgerError;
pub use genesis::{Genesis, NetworkId};
pub use ledger::Ledger;
pub use result::{ProcessResult, ProcessReturn};
