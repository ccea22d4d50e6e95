//! Outcome of processing one block.

use chrysos_types::{Account, Amount};
use std::fmt;

/// Validation verdict for a candidate block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Hasn't been seen before, signed correctly.
    Progress,
    /// Already seen and was valid.
    Old,
    /// Signature was bad, forged or transmission error.
    BadSignature,
    /// Malicious attempt to spend a negative amount.
    NegativeSpend,
    /// Malicious fork based on previous.
    Fork,
    /// Source doesn't exist, has already been received, or an out-of-order
    /// dividend claim.
    Unreceivable,
    /// Block marked as previous is unknown.
    GapPrevious,
    /// Block marked as source is unknown.
    GapSource,
    /// The impossible happened: someone found the private key of the public
    /// key '0'.
    OpenedBurnAccount,
    /// Balance and amount delta don't match.
    BalanceMismatch,
    /// Representative changed when it is not allowed.
    RepresentativeMismatch,
    /// This block cannot follow the previous block.
    BlockPosition,
    /// A dividend block signed by anyone but the dividend account.
    InvalidDividendAccount,
    /// Dividend pool is below the distribution floor or would drain the
    /// remaining supply.
    DividendTooSmall,
    /// A claim while sends stamped with the claimed dividend are still
    /// pending.
    OutstandingPendings,
    /// A send that moves the account's dividend pointer, or a claim naming
    /// a non-dividend block.
    IncorrectDividend,
    /// A dividend that does not extend the current chain head.
    DividendFork,
}

impl ProcessResult {
    /// The caller may buffer the block and retry once the missing
    /// dependency arrives.
    pub fn is_retryable(self) -> bool {
        matches!(self, ProcessResult::GapPrevious | ProcessResult::GapSource)
    }

    /// Idempotent non-error outcomes.
    pub fn is_benign(self) -> bool {
        matches!(self, ProcessResult::Progress | ProcessResult::Old)
    }

    /// The block is invalid and must not be retried.
    pub fn is_terminal(self) -> bool {
        !self.is_retryable() && !self.is_benign()
    }
}

impl fmt::Display for ProcessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ProcessResult::Progress => "progress",
            ProcessResult::Old => "old",
            ProcessResult::BadSignature => "bad signature",
            ProcessResult::NegativeSpend => "negative spend",
            ProcessResult::Fork => "fork",
            ProcessResult::Unreceivable => "unreceivable",
            ProcessResult::GapPrevious => "gap previous",
            ProcessResult::GapSource => "gap source",
            ProcessResult::OpenedBurnAccount => "opened burn account",
            ProcessResult::BalanceMismatch => "balance mismatch",
            ProcessResult::RepresentativeMismatch => "representative mismatch",
            ProcessResult::BlockPosition => "block position",
            ProcessResult::InvalidDividendAccount => "invalid dividend account",
            ProcessResult::DividendTooSmall => "dividend too small",
            ProcessResult::OutstandingPendings => "outstanding pendings",
            ProcessResult::IncorrectDividend => "incorrect dividend",
            ProcessResult::DividendFork => "dividend fork",
        };
        f.write_str(text)
    }
}

/// What `process` reports back to the caller.
#[derive(Clone, Debug)]
pub struct ProcessReturn {
    pub code: ProcessResult,
    /// Account the block affected, zero when validation failed early.
    pub account: Account,
    /// Balance delta the block caused.
    pub amount: Amount,
    /// Destination credited by a send, zero otherwise.
    pub pending_account: Account,
    /// For state blocks, whether the balance delta classified as a send.
    pub state_is_send: Option<bool>,
}

impl ProcessReturn {
    pub(crate) fn reject(code: ProcessResult) -> Self {
        Self {
            code,
            account: Account::ZERO,
            amount: Amount::ZERO,
            pending_account: Account::ZERO,
            state_is_send: None,
        }
    }
}
