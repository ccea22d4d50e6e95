use thiserror::Error;

use chrysos_types::BlockHash;

/// Storage-level failures surfaced by the ledger. Validation outcomes are
/// not errors; they are [`crate::ProcessResult`] codes.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("storage error: {0}")]
    Store(#[from] chrysos_store::StoreError),

    #[error("block {0} not found")]
    BlockNotFound(BlockHash),

    #[error("account record missing for a committed chain")]
    MissingAccount,
}
