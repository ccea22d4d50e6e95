//! The block-processing state machine.
//!
//! One handler per variant, each a cascade of checks that ends in either a
//! rejection code or the full set of commit effects applied through the
//! caller's write transaction. The check order matters: cheaper and
//! unambiguous checks run first, and fork detection happens only after the
//! signature proves the block belongs to whoever signed it.

use heed::RwTxn;

use chrysos_blocks::{
    Block, ChangeBlock, ClaimBlock, DividendBlock, OpenBlock, ReceiveBlock, SendBlock, StateBlock,
};
use chrysos_crypto::validate_message;
use chrysos_store::{DividendInfo, PendingInfo, PendingKey};
use chrysos_types::{
    seconds_since_epoch, Account, Amount, BlockHash, Epoch, DIVIDEND_BASE,
    MINIMUM_DIVIDEND_AMOUNT,
};

use crate::{Ledger, LedgerError, ProcessResult, ProcessReturn};

pub(crate) struct LedgerProcessor<'a, 'env> {
    ledger: &'a Ledger,
    txn: &'a mut RwTxn<'env>,
}

impl<'a, 'env> LedgerProcessor<'a, 'env> {
    pub(crate) fn new(ledger: &'a Ledger, txn: &'a mut RwTxn<'env>) -> Self {
        Self { ledger, txn }
    }

    pub(crate) fn process(&mut self, block: &Block) -> Result<ProcessReturn, LedgerError> {
        let result = match block {
            Block::Send(b) => self.send_block(b),
            Block::Receive(b) => self.receive_block(b),
            Block::Open(b) => self.open_block(b),
            Block::Change(b) => self.change_block(b),
            Block::State(b) => self.state_block(b),
            Block::Dividend(b) => self.dividend_block(b),
            Block::Claim(b) => self.claim_block(b),
        }?;
        if result.code.is_terminal() {
            tracing::debug!(hash = %block.hash(), code = %result.code, "rejected block");
        }
        Ok(result)
    }

    // ── State family ────────────────────────────────────────────────────

    fn state_block(&mut self, block: &StateBlock) -> Result<ProcessReturn, LedgerError> {
        let previous = block.hashables.previous;
        let mut prev_balance = Amount::ZERO;
        if !previous.is_zero() {
            if !self.ledger.store.block_exists(self.txn, &previous)? {
                return Ok(ProcessReturn::reject(ProcessResult::GapPrevious));
            }
            prev_balance = self.ledger.balance(self.txn, &previous)?;
        }
        let is_epoch = block.hashables.balance == prev_balance
            && !self.ledger.epoch_link.is_zero()
            && block.hashables.link == self.ledger.epoch_link;
        if is_epoch {
            self.epoch_block(block)
        } else {
            self.state_block_impl(block)
        }
    }

    fn state_block_impl(&mut self, block: &StateBlock) -> Result<ProcessReturn, LedgerError> {
        let hash = block.hash();
        if self.ledger.store.block_exists(self.txn, &hash)? {
            return Ok(ProcessReturn::reject(ProcessResult::Old));
        }
        let account = block.hashables.account;
        if !validate_message(&account, &hash, &block.signature) {
            return Ok(ProcessReturn::reject(ProcessResult::BadSignature));
        }
        if account.is_zero() {
            return Ok(ProcessReturn::reject(ProcessResult::OpenedBurnAccount));
        }

        let (exists, info) = self.ledger.account_info_or_default(self.txn, &account)?;
        let mut epoch = info.epoch;
        let mut is_send = false;
        let mut amount = block.hashables.balance;
        if exists {
            if block.hashables.previous.is_zero() {
                return Ok(ProcessReturn::reject(ProcessResult::Fork));
            }
            if !self
                .ledger
                .store
                .block_exists(self.txn, &block.hashables.previous)?
            {
                return Ok(ProcessReturn::reject(ProcessResult::GapPrevious));
            }
            is_send = block.hashables.balance < info.balance;
            amount = block.hashables.balance.abs_diff(info.balance);
            if block.hashables.previous != info.head {
                return Ok(ProcessReturn::reject(ProcessResult::Fork));
            }
        } else {
            if !block.hashables.previous.is_zero() {
                return Ok(ProcessReturn::reject(ProcessResult::GapPrevious));
            }
            // The first block of an account has to pocket something.
            if block.hashables.link.is_zero() {
                return Ok(ProcessReturn::reject(ProcessResult::GapSource));
            }
        }

        if is_send {
            // A send cannot move the account's dividend pointer.
            if info.dividend_block != block.hashables.dividend {
                return Ok(ProcessReturn::reject(ProcessResult::IncorrectDividend));
            }
        } else if !block.hashables.link.is_zero() {
            if !self
                .ledger
                .store
                .block_exists(self.txn, &block.hashables.link)?
            {
                return Ok(ProcessReturn::reject(ProcessResult::GapSource));
            }
            if exists
                && !self.ledger.dividends_are_ordered(
                    self.txn,
                    &block.hashables.dividend,
                    &info.dividend_block,
                )?
            {
                return Ok(ProcessReturn::reject(ProcessResult::Unreceivable));
            }
            let key = PendingKey::new(account, block.hashables.link);
            let Some(pending) = self.ledger.store.pending_get(self.txn, &key)? else {
                return Ok(ProcessReturn::reject(ProcessResult::Unreceivable));
            };
            if amount != pending.amount {
                return Ok(ProcessReturn::reject(ProcessResult::BalanceMismatch));
            }
            epoch = epoch.max(pending.epoch);
        } else if !amount.is_zero() {
            // No link: only the representative may change.
            return Ok(ProcessReturn::reject(ProcessResult::BalanceMismatch));
        }

        self.ledger
            .store
            .block_put(self.txn, &hash, &Block::State(block.clone()), &BlockHash::ZERO, epoch)?;
        if !info.rep_block.is_zero() {
            // Move existing representation off the previous rep block.
            self.ledger.store.representation_add(
                self.txn,
                &info.rep_block,
                Amount::ZERO.wrapping_sub(info.balance),
            )?;
        }
        self.ledger
            .store
            .representation_add(self.txn, &hash, block.hashables.balance)?;

        if is_send {
            let key = PendingKey::new(Account::new(*block.hashables.link.as_bytes()), hash);
            let pending =
                PendingInfo::new(account, amount, block.hashables.dividend, epoch);
            self.ledger.store.pending_put(self.txn, &key, &pending)?;
        } else if !block.hashables.link.is_zero() {
            self.ledger
                .store
                .pending_del(self.txn, &PendingKey::new(account, block.hashables.link))?;
        }

        self.ledger.change_latest(
            self.txn,
            &account,
            &hash,
            &hash,
            &block.hashables.dividend,
            block.hashables.balance,
            info.block_count + 1,
            true,
            epoch,
        )?;
        self.clear_frontier_of(&info.head)?;

        Ok(ProcessReturn {
            code: ProcessResult::Progress,
            account,
            amount,
            pending_account: if is_send {
                Account::new(*block.hashables.link.as_bytes())
            } else {
                Account::ZERO
            },
            state_is_send: Some(is_send),
        })
    }

    /// A state block whose link is the epoch sentinel: upgrades the account
    /// to epoch 1 without touching balance, representative, or the dividend
    /// pointer.
    fn epoch_block(&mut self, block: &StateBlock) -> Result<ProcessReturn, LedgerError> {
        let hash = block.hash();
        if self.ledger.store.block_exists(self.txn, &hash)? {
            return Ok(ProcessReturn::reject(ProcessResult::Old));
        }
        if !validate_message(&self.ledger.epoch_signer, &hash, &block.signature) {
            return Ok(ProcessReturn::reject(ProcessResult::BadSignature));
        }
        let account = block.hashables.account;
        if account.is_zero() {
            return Ok(ProcessReturn::reject(ProcessResult::OpenedBurnAccount));
        }
        let (exists, info) = self.ledger.account_info_or_default(self.txn, &account)?;
        if exists {
            if block.hashables.previous.is_zero() {
                return Ok(ProcessReturn::reject(ProcessResult::Fork));
            }
            if !self
                .ledger
                .store
                .block_exists(self.txn, &block.hashables.previous)?
            {
                return Ok(ProcessReturn::reject(ProcessResult::GapPrevious));
            }
            if block.hashables.previous != info.head {
                return Ok(ProcessReturn::reject(ProcessResult::Fork));
            }
            let rep_block = self
                .ledger
                .store
                .block_get(self.txn, &info.rep_block)?
                .ok_or(LedgerError::BlockNotFound(info.rep_block))?;
            if block.hashables.representative != rep_block.representative() {
                return Ok(ProcessReturn::reject(ProcessResult::RepresentativeMismatch));
            }
        } else if !block.hashables.representative.is_zero() {
            return Ok(ProcessReturn::reject(ProcessResult::RepresentativeMismatch));
        }
        if info.epoch != Epoch::Epoch0 {
            return Ok(ProcessReturn::reject(ProcessResult::BlockPosition));
        }
        if block.hashables.balance != info.balance {
            return Ok(ProcessReturn::reject(ProcessResult::BalanceMismatch));
        }

        self.ledger.store.block_put(
            self.txn,
            &hash,
            &Block::State(block.clone()),
            &BlockHash::ZERO,
            Epoch::Epoch1,
        )?;
        // Keep the representation total consistent with the new rep block.
        if !info.rep_block.is_zero() {
            self.ledger.store.representation_add(
                self.txn,
                &info.rep_block,
                Amount::ZERO.wrapping_sub(info.balance),
            )?;
        }
        self.ledger
            .store
            .representation_add(self.txn, &hash, info.balance)?;
        self.ledger.change_latest(
            self.txn,
            &account,
            &hash,
            &hash,
            &info.dividend_block,
            info.balance,
            info.block_count + 1,
            true,
            Epoch::Epoch1,
        )?;
        self.clear_frontier_of(&info.head)?;

        Ok(ProcessReturn {
            code: ProcessResult::Progress,
            account,
            amount: Amount::ZERO,
            pending_account: Account::ZERO,
            state_is_send: None,
        })
    }

    // ── Dividend chain ──────────────────────────────────────────────────

    fn dividend_block(&mut self, block: &DividendBlock) -> Result<ProcessReturn, LedgerError> {
        let hash = block.hash();
        if self.ledger.store.block_exists(self.txn, &hash)? {
            return Ok(ProcessReturn::reject(ProcessResult::Old));
        }
        if !self
            .ledger
            .store
            .block_exists(self.txn, &block.hashables.previous)?
        {
            return Ok(ProcessReturn::reject(ProcessResult::GapPrevious));
        }
        let account = block.hashables.account;
        if account.is_zero() {
            return Ok(ProcessReturn::reject(ProcessResult::Fork));
        }
        if account != self.ledger.dividend_account {
            return Ok(ProcessReturn::reject(ProcessResult::InvalidDividendAccount));
        }
        if !validate_message(&account, &hash, &block.signature) {
            return Ok(ProcessReturn::reject(ProcessResult::BadSignature));
        }
        let Some(info) = self.ledger.store.account_get(self.txn, &account)? else {
            return Ok(ProcessReturn::reject(ProcessResult::GapPrevious));
        };
        if info.head != block.hashables.previous {
            return Ok(ProcessReturn::reject(ProcessResult::Fork));
        }
        if info.balance < block.hashables.balance {
            return Ok(ProcessReturn::reject(ProcessResult::NegativeSpend));
        }
        let amount = info.balance - block.hashables.balance;
        if amount.number() < MINIMUM_DIVIDEND_AMOUNT {
            return Ok(ProcessReturn::reject(ProcessResult::DividendTooSmall));
        }
        // A pool that swallows the whole circulating supply would leave the
        // per-account share with a zero denominator.
        if amount >= self.ledger.total_supply(self.txn)? {
            return Ok(ProcessReturn::reject(ProcessResult::DividendTooSmall));
        }
        if block.hashables.dividend != DIVIDEND_BASE
            && !self
                .ledger
                .store
                .block_exists(self.txn, &block.hashables.dividend)?
        {
            return Ok(ProcessReturn::reject(ProcessResult::GapSource));
        }
        let dividend_info = self.ledger.store.dividend_get(self.txn)?;
        if block.hashables.dividend != dividend_info.head {
            return Ok(ProcessReturn::reject(ProcessResult::DividendFork));
        }

        self.ledger.store.block_put(
            self.txn,
            &hash,
            &Block::Dividend(block.clone()),
            &BlockHash::ZERO,
            Epoch::Epoch0,
        )?;
        if !info.rep_block.is_zero() {
            self.ledger.store.representation_add(
                self.txn,
                &info.rep_block,
                Amount::ZERO.wrapping_sub(info.balance),
            )?;
        }
        self.ledger
            .store
            .representation_add(self.txn, &hash, block.hashables.balance)?;
        self.ledger.change_latest(
            self.txn,
            &account,
            &hash,
            &hash,
            &block.hashables.dividend,
            block.hashables.balance,
            info.block_count + 1,
            true,
            info.epoch,
        )?;
        self.clear_frontier_of(&info.head)?;
        self.ledger.store.dividend_put(
            self.txn,
            &DividendInfo {
                head: hash,
                balance: dividend_info.balance.wrapping_add(amount),
                modified: seconds_since_epoch(),
                block_count: dividend_info.block_count + 1,
                epoch: Epoch::Epoch0,
            },
        )?;
        tracing::info!(dividend = %hash, pool = %amount, "dividend chain advanced");

        Ok(ProcessReturn {
            code: ProcessResult::Progress,
            account,
            amount,
            pending_account: Account::ZERO,
            state_is_send: None,
        })
    }

    fn claim_block(&mut self, block: &ClaimBlock) -> Result<ProcessReturn, LedgerError> {
        let hash = block.hash();
        if self.ledger.store.block_exists(self.txn, &hash)? {
            return Ok(ProcessReturn::reject(ProcessResult::Old));
        }
        if !self
            .ledger
            .store
            .block_exists(self.txn, &block.hashables.previous)?
        {
            return Ok(ProcessReturn::reject(ProcessResult::GapPrevious));
        }
        let Some(dividend) = self
            .ledger
            .store
            .block_get(self.txn, &block.hashables.dividend)?
        else {
            return Ok(ProcessReturn::reject(ProcessResult::GapSource));
        };
        let Block::Dividend(dividend) = dividend else {
            return Ok(ProcessReturn::reject(ProcessResult::IncorrectDividend));
        };
        let account = block.hashables.account;
        if account.is_zero() {
            return Ok(ProcessReturn::reject(ProcessResult::GapPrevious));
        }
        if !validate_message(&account, &hash, &block.signature) {
            return Ok(ProcessReturn::reject(ProcessResult::BadSignature));
        }
        let Some(mut info) = self.ledger.store.account_get(self.txn, &account)? else {
            return Ok(ProcessReturn::reject(ProcessResult::GapPrevious));
        };
        if info.head != block.hashables.previous {
            return Ok(ProcessReturn::reject(ProcessResult::GapPrevious));
        }
        if self.ledger.has_outstanding_pendings_for_dividend(
            self.txn,
            &block.hashables.dividend,
            &account,
        )? {
            return Ok(ProcessReturn::reject(ProcessResult::OutstandingPendings));
        }
        // Claims advance one dividend at a time: the account's pointer must
        // be exactly the claimed dividend's predecessor.
        if info.dividend_block == block.hashables.dividend
            || dividend.hashables.dividend != info.dividend_block
        {
            return Ok(ProcessReturn::reject(ProcessResult::Unreceivable));
        }
        let Some(amount) = block.hashables.balance.checked_sub(info.balance) else {
            return Ok(ProcessReturn::reject(ProcessResult::BalanceMismatch));
        };
        let expected =
            self.ledger
                .amount_for_dividend(self.txn, &block.hashables.dividend, &account)?;
        if amount != expected {
            return Ok(ProcessReturn::reject(ProcessResult::BalanceMismatch));
        }

        self.ledger.store.block_put(
            self.txn,
            &hash,
            &Block::Claim(block.clone()),
            &BlockHash::ZERO,
            Epoch::Epoch0,
        )?;
        if !info.rep_block.is_zero() {
            self.ledger.store.representation_add(
                self.txn,
                &info.rep_block,
                Amount::ZERO.wrapping_sub(info.balance),
            )?;
        }
        self.ledger
            .store
            .representation_add(self.txn, &hash, block.hashables.balance)?;
        info.dividend_block = block.hashables.dividend;
        self.ledger.store.account_put(self.txn, &account, &info)?;
        self.ledger.change_latest(
            self.txn,
            &account,
            &hash,
            &hash,
            &block.hashables.dividend,
            block.hashables.balance,
            info.block_count + 1,
            true,
            info.epoch,
        )?;
        self.clear_frontier_of(&info.head)?;

        Ok(ProcessReturn {
            code: ProcessResult::Progress,
            account,
            amount,
            pending_account: Account::ZERO,
            state_is_send: None,
        })
    }

    // ── Legacy variants ─────────────────────────────────────────────────

    fn send_block(&mut self, block: &SendBlock) -> Result<ProcessReturn, LedgerError> {
        let hash = block.hash();
        if self.ledger.store.block_exists(self.txn, &hash)? {
            return Ok(ProcessReturn::reject(ProcessResult::Old));
        }
        let Some(previous) = self
            .ledger
            .store
            .block_get(self.txn, &block.hashables.previous)?
        else {
            return Ok(ProcessReturn::reject(ProcessResult::GapPrevious));
        };
        if !Block::Send(block.clone()).valid_predecessor(&previous) {
            return Ok(ProcessReturn::reject(ProcessResult::BlockPosition));
        }
        let account = self
            .ledger
            .store
            .frontier_get(self.txn, &block.hashables.previous)?;
        if account.is_zero() {
            return Ok(ProcessReturn::reject(ProcessResult::Fork));
        }
        if !validate_message(&account, &hash, &block.signature) {
            return Ok(ProcessReturn::reject(ProcessResult::BadSignature));
        }
        let info = self
            .ledger
            .store
            .account_get(self.txn, &account)?
            .ok_or(LedgerError::MissingAccount)?;
        if info.balance < block.hashables.balance {
            return Ok(ProcessReturn::reject(ProcessResult::NegativeSpend));
        }
        let amount = info.balance - block.hashables.balance;

        self.ledger.store.representation_add(
            self.txn,
            &info.rep_block,
            Amount::ZERO.wrapping_sub(amount),
        )?;
        self.ledger.store.block_put(
            self.txn,
            &hash,
            &Block::Send(block.clone()),
            &BlockHash::ZERO,
            Epoch::Epoch0,
        )?;
        self.ledger.change_latest(
            self.txn,
            &account,
            &hash,
            &info.rep_block,
            &block.hashables.dividend,
            block.hashables.balance,
            info.block_count + 1,
            false,
            Epoch::Epoch0,
        )?;
        self.ledger.store.pending_put(
            self.txn,
            &PendingKey::new(block.hashables.destination, hash),
            &PendingInfo::new(account, amount, block.hashables.dividend, Epoch::Epoch0),
        )?;
        self.ledger
            .store
            .frontier_del(self.txn, &block.hashables.previous)?;
        self.ledger.store.frontier_put(self.txn, &hash, &account)?;

        Ok(ProcessReturn {
            code: ProcessResult::Progress,
            account,
            amount,
            pending_account: block.hashables.destination,
            state_is_send: None,
        })
    }

    fn receive_block(&mut self, block: &ReceiveBlock) -> Result<ProcessReturn, LedgerError> {
        let hash = block.hash();
        if self.ledger.store.block_exists(self.txn, &hash)? {
            return Ok(ProcessReturn::reject(ProcessResult::Old));
        }
        let Some(previous) = self
            .ledger
            .store
            .block_get(self.txn, &block.hashables.previous)?
        else {
            return Ok(ProcessReturn::reject(ProcessResult::GapPrevious));
        };
        if !Block::Receive(block.clone()).valid_predecessor(&previous) {
            return Ok(ProcessReturn::reject(ProcessResult::BlockPosition));
        }
        if !self
            .ledger
            .store
            .block_exists(self.txn, &block.hashables.source)?
        {
            return Ok(ProcessReturn::reject(ProcessResult::GapSource));
        }
        let account = self
            .ledger
            .store
            .frontier_get(self.txn, &block.hashables.previous)?;
        if account.is_zero() {
            // The previous block is stored but is no legacy head: signed fork.
            return Ok(ProcessReturn::reject(ProcessResult::Fork));
        }
        if !validate_message(&account, &hash, &block.signature) {
            return Ok(ProcessReturn::reject(ProcessResult::BadSignature));
        }
        let info = self
            .ledger
            .store
            .account_get(self.txn, &account)?
            .ok_or(LedgerError::MissingAccount)?;
        if info.head != block.hashables.previous {
            return Ok(ProcessReturn::reject(ProcessResult::GapPrevious));
        }
        let key = PendingKey::new(account, block.hashables.source);
        let Some(pending) = self.ledger.store.pending_get(self.txn, &key)? else {
            return Ok(ProcessReturn::reject(ProcessResult::Unreceivable));
        };
        // Sends from upgraded accounts need a state receive.
        if pending.epoch != Epoch::Epoch0 {
            return Ok(ProcessReturn::reject(ProcessResult::Unreceivable));
        }
        let new_balance = info.balance.wrapping_add(pending.amount);

        self.ledger.store.pending_del(self.txn, &key)?;
        self.ledger.store.block_put(
            self.txn,
            &hash,
            &Block::Receive(block.clone()),
            &BlockHash::ZERO,
            Epoch::Epoch0,
        )?;
        self.ledger.change_latest(
            self.txn,
            &account,
            &hash,
            &info.rep_block,
            &block.hashables.dividend,
            new_balance,
            info.block_count + 1,
            false,
            Epoch::Epoch0,
        )?;
        self.ledger
            .store
            .representation_add(self.txn, &info.rep_block, pending.amount)?;
        self.ledger
            .store
            .frontier_del(self.txn, &block.hashables.previous)?;
        self.ledger.store.frontier_put(self.txn, &hash, &account)?;

        Ok(ProcessReturn {
            code: ProcessResult::Progress,
            account,
            amount: pending.amount,
            pending_account: Account::ZERO,
            state_is_send: None,
        })
    }

    fn open_block(&mut self, block: &OpenBlock) -> Result<ProcessReturn, LedgerError> {
        let hash = block.hash();
        if self.ledger.store.block_exists(self.txn, &hash)? {
            return Ok(ProcessReturn::reject(ProcessResult::Old));
        }
        if !self
            .ledger
            .store
            .block_exists(self.txn, &block.hashables.source)?
        {
            return Ok(ProcessReturn::reject(ProcessResult::GapSource));
        }
        let account = block.hashables.account;
        if !validate_message(&account, &hash, &block.signature) {
            return Ok(ProcessReturn::reject(ProcessResult::BadSignature));
        }
        if self.ledger.store.account_exists(self.txn, &account)? {
            return Ok(ProcessReturn::reject(ProcessResult::Fork));
        }
        let key = PendingKey::new(account, block.hashables.source);
        let Some(pending) = self.ledger.store.pending_get(self.txn, &key)? else {
            return Ok(ProcessReturn::reject(ProcessResult::Unreceivable));
        };
        if account.is_zero() {
            return Ok(ProcessReturn::reject(ProcessResult::OpenedBurnAccount));
        }
        if pending.epoch != Epoch::Epoch0 {
            return Ok(ProcessReturn::reject(ProcessResult::Unreceivable));
        }

        self.ledger.store.pending_del(self.txn, &key)?;
        self.ledger.store.block_put(
            self.txn,
            &hash,
            &Block::Open(block.clone()),
            &BlockHash::ZERO,
            Epoch::Epoch0,
        )?;
        self.ledger.change_latest(
            self.txn,
            &account,
            &hash,
            &hash,
            &block.hashables.dividend,
            pending.amount,
            1,
            false,
            Epoch::Epoch0,
        )?;
        self.ledger
            .store
            .representation_add(self.txn, &hash, pending.amount)?;
        self.ledger.store.frontier_put(self.txn, &hash, &account)?;

        Ok(ProcessReturn {
            code: ProcessResult::Progress,
            account,
            amount: pending.amount,
            pending_account: Account::ZERO,
            state_is_send: None,
        })
    }

    fn change_block(&mut self, block: &ChangeBlock) -> Result<ProcessReturn, LedgerError> {
        let hash = block.hash();
        if self.ledger.store.block_exists(self.txn, &hash)? {
            return Ok(ProcessReturn::reject(ProcessResult::Old));
        }
        let Some(previous) = self
            .ledger
            .store
            .block_get(self.txn, &block.hashables.previous)?
        else {
            return Ok(ProcessReturn::reject(ProcessResult::GapPrevious));
        };
        if !Block::Change(block.clone()).valid_predecessor(&previous) {
            return Ok(ProcessReturn::reject(ProcessResult::BlockPosition));
        }
        let account = self
            .ledger
            .store
            .frontier_get(self.txn, &block.hashables.previous)?;
        if account.is_zero() {
            return Ok(ProcessReturn::reject(ProcessResult::Fork));
        }
        if !validate_message(&account, &hash, &block.signature) {
            return Ok(ProcessReturn::reject(ProcessResult::BadSignature));
        }
        let info = self
            .ledger
            .store
            .account_get(self.txn, &account)?
            .ok_or(LedgerError::MissingAccount)?;

        self.ledger.store.block_put(
            self.txn,
            &hash,
            &Block::Change(block.clone()),
            &BlockHash::ZERO,
            Epoch::Epoch0,
        )?;
        let balance = self.ledger.balance(self.txn, &block.hashables.previous)?;
        self.ledger
            .store
            .representation_add(self.txn, &hash, balance)?;
        self.ledger.store.representation_add(
            self.txn,
            &info.rep_block,
            Amount::ZERO.wrapping_sub(balance),
        )?;
        self.ledger.change_latest(
            self.txn,
            &account,
            &hash,
            &hash,
            &block.hashables.dividend,
            info.balance,
            info.block_count + 1,
            false,
            Epoch::Epoch0,
        )?;
        self.ledger
            .store
            .frontier_del(self.txn, &block.hashables.previous)?;
        self.ledger.store.frontier_put(self.txn, &hash, &account)?;

        Ok(ProcessReturn {
            code: ProcessResult::Progress,
            account,
            amount: Amount::ZERO,
            pending_account: Account::ZERO,
            state_is_send: None,
        })
    }

    /// State-family blocks do not populate the frontier; drop the legacy
    /// entry their predecessor may have left behind.
    fn clear_frontier_of(&mut self, head: &BlockHash) -> Result<(), LedgerError> {
        if head.is_zero() {
            return Ok(());
        }
        let frontier = self.ledger.store.frontier_get(self.txn, head)?;
        if !frontier.is_zero() {
            self.ledger.store.frontier_del(self.txn, head)?;
        }
        Ok(())
    }
}
