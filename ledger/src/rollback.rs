//! Rollback: invert the commit effects of an account's most recent block.
//!
//! Rolling back a send whose receive is already committed first rolls back
//! the receiver's chain until the pending record reappears, all inside the
//! same write transaction.

use heed::RwTxn;

use chrysos_blocks::{
    Block, ChangeBlock, ClaimBlock, DividendBlock, OpenBlock, ReceiveBlock, SendBlock, StateBlock,
};
use chrysos_store::{DividendInfo, PendingInfo, PendingKey, BLOCK_INFO_MAX};
use chrysos_types::{seconds_since_epoch, Account, Amount, BlockHash, Epoch};

use crate::{Ledger, LedgerError};

pub(crate) struct RollbackPerformer<'a, 'env> {
    ledger: &'a Ledger,
    txn: &'a mut RwTxn<'env>,
}

impl<'a, 'env> RollbackPerformer<'a, 'env> {
    pub(crate) fn new(ledger: &'a Ledger, txn: &'a mut RwTxn<'env>) -> Self {
        Self { ledger, txn }
    }

    pub(crate) fn roll_back(&mut self, block: &Block) -> Result<(), LedgerError> {
        tracing::debug!(hash = %block.hash(), kind = block.block_type().name(), "rolling back");
        match block {
            Block::Send(b) => self.roll_back_send(b),
            Block::Receive(b) => self.roll_back_receive(b),
            Block::Open(b) => self.roll_back_open(b),
            Block::Change(b) => self.roll_back_change(b),
            Block::State(b) => self.roll_back_state(b),
            Block::Dividend(b) => self.roll_back_dividend(b),
            Block::Claim(b) => self.roll_back_claim(b),
        }
    }

    fn roll_back_send(&mut self, block: &SendBlock) -> Result<(), LedgerError> {
        let hash = block.hash();
        let key = PendingKey::new(block.hashables.destination, hash);
        // If the destination already pocketed this send, unwind its chain
        // until the pending record reappears.
        let pending = loop {
            if let Some(pending) = self.ledger.store.pending_get(self.txn, &key)? {
                break pending;
            }
            let latest = self
                .ledger
                .latest(self.txn, &block.hashables.destination)?;
            if latest.is_zero() {
                return Err(LedgerError::MissingAccount);
            }
            self.ledger.rollback(self.txn, &latest)?;
        };
        let account = pending.source;
        let info = self
            .ledger
            .store
            .account_get(self.txn, &account)?
            .ok_or(LedgerError::MissingAccount)?;

        self.ledger.store.pending_del(self.txn, &key)?;
        let rep_block = self.ledger.representative(self.txn, &hash)?;
        self.ledger
            .store
            .representation_add(self.txn, &rep_block, pending.amount)?;
        let previous_balance = self.ledger.balance(self.txn, &block.hashables.previous)?;
        self.ledger.change_latest(
            self.txn,
            &account,
            &block.hashables.previous,
            &info.rep_block,
            &block.hashables.dividend,
            previous_balance,
            info.block_count - 1,
            false,
            Epoch::Epoch0,
        )?;
        self.ledger.store.block_del(self.txn, &hash)?;
        self.ledger.store.frontier_del(self.txn, &hash)?;
        self.ledger
            .store
            .frontier_put(self.txn, &block.hashables.previous, &account)?;
        self.ledger
            .store
            .block_successor_clear(self.txn, &block.hashables.previous)?;
        if info.block_count % BLOCK_INFO_MAX == 0 {
            self.ledger.store.block_info_del(self.txn, &hash)?;
        }
        Ok(())
    }

    fn roll_back_receive(&mut self, block: &ReceiveBlock) -> Result<(), LedgerError> {
        let hash = block.hash();
        let rep_block = self.ledger.representative(self.txn, &block.hashables.previous)?;
        let amount = self.ledger.amount(self.txn, &block.hashables.source)?;
        let account = self
            .ledger
            .account(self.txn, &hash)?
            .ok_or(LedgerError::MissingAccount)?;
        let source_account = self
            .ledger
            .account(self.txn, &block.hashables.source)?
            .unwrap_or(Account::ZERO);
        let info = self
            .ledger
            .store
            .account_get(self.txn, &account)?
            .ok_or(LedgerError::MissingAccount)?;

        self.ledger.store.representation_add(
            self.txn,
            &rep_block,
            Amount::ZERO.wrapping_sub(amount),
        )?;
        let previous_balance = self.ledger.balance(self.txn, &block.hashables.previous)?;
        self.ledger.change_latest(
            self.txn,
            &account,
            &block.hashables.previous,
            &rep_block,
            &block.hashables.dividend,
            previous_balance,
            info.block_count - 1,
            false,
            Epoch::Epoch0,
        )?;
        self.ledger.store.block_del(self.txn, &hash)?;
        self.ledger.store.pending_put(
            self.txn,
            &PendingKey::new(account, block.hashables.source),
            &PendingInfo::new(source_account, amount, block.hashables.dividend, Epoch::Epoch0),
        )?;
        self.ledger.store.frontier_del(self.txn, &hash)?;
        self.ledger
            .store
            .frontier_put(self.txn, &block.hashables.previous, &account)?;
        self.ledger
            .store
            .block_successor_clear(self.txn, &block.hashables.previous)?;
        if info.block_count % BLOCK_INFO_MAX == 0 {
            self.ledger.store.block_info_del(self.txn, &hash)?;
        }
        Ok(())
    }

    fn roll_back_open(&mut self, block: &OpenBlock) -> Result<(), LedgerError> {
        let hash = block.hash();
        let amount = self.ledger.amount(self.txn, &hash)?;
        let account = block.hashables.account;
        let source_account = self
            .ledger
            .account(self.txn, &block.hashables.source)?
            .unwrap_or(Account::ZERO);

        let own_rep = self.ledger.representative(self.txn, &hash)?;
        self.ledger.store.representation_add(
            self.txn,
            &own_rep,
            Amount::ZERO.wrapping_sub(amount),
        )?;
        self.ledger.change_latest(
            self.txn,
            &account,
            &BlockHash::ZERO,
            &BlockHash::ZERO,
            &block.hashables.dividend,
            Amount::ZERO,
            0,
            false,
            Epoch::Epoch0,
        )?;
        self.ledger.store.block_del(self.txn, &hash)?;
        self.ledger.store.pending_put(
            self.txn,
            &PendingKey::new(account, block.hashables.source),
            &PendingInfo::new(source_account, amount, block.hashables.dividend, Epoch::Epoch0),
        )?;
        self.ledger.store.frontier_del(self.txn, &hash)?;
        Ok(())
    }

    fn roll_back_change(&mut self, block: &ChangeBlock) -> Result<(), LedgerError> {
        let hash = block.hash();
        let rep_block = self.ledger.representative(self.txn, &block.hashables.previous)?;
        let account = self
            .ledger
            .account(self.txn, &hash)?
            .ok_or(LedgerError::MissingAccount)?;
        let info = self
            .ledger
            .store
            .account_get(self.txn, &account)?
            .ok_or(LedgerError::MissingAccount)?;
        let balance = self.ledger.balance(self.txn, &block.hashables.previous)?;

        self.ledger
            .store
            .representation_add(self.txn, &rep_block, balance)?;
        self.ledger
            .store
            .representation_add(self.txn, &hash, Amount::ZERO.wrapping_sub(balance))?;
        self.ledger.store.block_del(self.txn, &hash)?;
        self.ledger.change_latest(
            self.txn,
            &account,
            &block.hashables.previous,
            &rep_block,
            &block.hashables.dividend,
            info.balance,
            info.block_count - 1,
            false,
            Epoch::Epoch0,
        )?;
        self.ledger.store.frontier_del(self.txn, &hash)?;
        self.ledger
            .store
            .frontier_put(self.txn, &block.hashables.previous, &account)?;
        self.ledger
            .store
            .block_successor_clear(self.txn, &block.hashables.previous)?;
        if info.block_count % BLOCK_INFO_MAX == 0 {
            self.ledger.store.block_info_del(self.txn, &hash)?;
        }
        Ok(())
    }

    fn roll_back_state(&mut self, block: &StateBlock) -> Result<(), LedgerError> {
        let hash = block.hash();
        let account = block.hashables.account;
        let previous = block.hashables.previous;
        let rep_block = if previous.is_zero() {
            BlockHash::ZERO
        } else {
            self.ledger.representative(self.txn, &previous)?
        };
        let previous_balance = if previous.is_zero() {
            Amount::ZERO
        } else {
            self.ledger.balance(self.txn, &previous)?
        };
        let is_send = block.hashables.balance < previous_balance;

        self.ledger.store.representation_add(
            self.txn,
            &hash,
            Amount::ZERO.wrapping_sub(block.hashables.balance),
        )?;
        if !rep_block.is_zero() {
            self.ledger
                .store
                .representation_add(self.txn, &rep_block, previous_balance)?;
        }

        let info = self
            .ledger
            .store
            .account_get(self.txn, &account)?
            .ok_or(LedgerError::MissingAccount)?;

        if is_send {
            let destination = Account::new(*block.hashables.link.as_bytes());
            let key = PendingKey::new(destination, hash);
            while !self.ledger.store.pending_exists(self.txn, &key)? {
                let latest = self.ledger.latest(self.txn, &destination)?;
                if latest.is_zero() {
                    return Err(LedgerError::MissingAccount);
                }
                self.ledger.rollback(self.txn, &latest)?;
            }
            self.ledger.store.pending_del(self.txn, &key)?;
        } else if !block.hashables.link.is_zero()
            && block.hashables.link != self.ledger.epoch_link
        {
            let source_account = self
                .ledger
                .account(self.txn, &block.hashables.link)?
                .unwrap_or(Account::ZERO);
            let source_epoch = self
                .ledger
                .store
                .block_version(self.txn, &block.hashables.link)?;
            let pending = PendingInfo::new(
                source_account,
                block.hashables.balance - previous_balance,
                block.hashables.dividend,
                source_epoch,
            );
            self.ledger.store.pending_put(
                self.txn,
                &PendingKey::new(account, block.hashables.link),
                &pending,
            )?;
        }

        let previous_version = self.ledger.store.block_version(self.txn, &previous)?;
        self.ledger.change_latest(
            self.txn,
            &account,
            &previous,
            &rep_block,
            &block.hashables.dividend,
            previous_balance,
            info.block_count - 1,
            true,
            previous_version,
        )?;

        if let Some(previous_block) = self.ledger.store.block_get(self.txn, &previous)? {
            self.ledger.store.block_successor_clear(self.txn, &previous)?;
            if previous_block.block_type().is_legacy() {
                self.ledger.store.frontier_put(self.txn, &previous, &account)?;
            }
        }
        self.ledger.store.block_del(self.txn, &hash)?;
        Ok(())
    }

    fn roll_back_dividend(&mut self, block: &DividendBlock) -> Result<(), LedgerError> {
        let hash = block.hash();
        let account = block.hashables.account;
        let previous = block.hashables.previous;
        let previous_balance = self.ledger.balance(self.txn, &previous)?;
        let pool = previous_balance - block.hashables.balance;
        let rep_block = self.ledger.representative(self.txn, &previous)?;
        let info = self
            .ledger
            .store
            .account_get(self.txn, &account)?
            .ok_or(LedgerError::MissingAccount)?;

        self.ledger.store.representation_add(
            self.txn,
            &hash,
            Amount::ZERO.wrapping_sub(block.hashables.balance),
        )?;
        if !rep_block.is_zero() {
            self.ledger
                .store
                .representation_add(self.txn, &rep_block, previous_balance)?;
        }
        self.ledger.change_latest(
            self.txn,
            &account,
            &previous,
            &rep_block,
            &block.hashables.dividend,
            previous_balance,
            info.block_count - 1,
            true,
            info.epoch,
        )?;

        // Rewind the chain singleton to this dividend's predecessor.
        let dividend_info = self.ledger.store.dividend_get(self.txn)?;
        self.ledger.store.dividend_put(
            self.txn,
            &DividendInfo {
                head: block.hashables.dividend,
                balance: dividend_info.balance.saturating_sub(pool),
                modified: seconds_since_epoch(),
                block_count: dividend_info.block_count.saturating_sub(1),
                epoch: dividend_info.epoch,
            },
        )?;

        self.ledger.store.block_successor_clear(self.txn, &previous)?;
        self.ledger.store.block_del(self.txn, &hash)?;
        Ok(())
    }

    fn roll_back_claim(&mut self, block: &ClaimBlock) -> Result<(), LedgerError> {
        let hash = block.hash();
        let account = block.hashables.account;
        let previous = block.hashables.previous;
        let previous_balance = self.ledger.balance(self.txn, &previous)?;
        let rep_block = self.ledger.representative(self.txn, &previous)?;
        let info = self
            .ledger
            .store
            .account_get(self.txn, &account)?
            .ok_or(LedgerError::MissingAccount)?;

        self.ledger.store.representation_add(
            self.txn,
            &hash,
            Amount::ZERO.wrapping_sub(block.hashables.balance),
        )?;
        if !rep_block.is_zero() {
            self.ledger
                .store
                .representation_add(self.txn, &rep_block, previous_balance)?;
        }

        // The claim advanced the dividend pointer by exactly one link;
        // restore it to the claimed dividend's predecessor.
        let claimed = self
            .ledger
            .store
            .block_get(self.txn, &block.hashables.dividend)?
            .ok_or(LedgerError::BlockNotFound(block.hashables.dividend))?;
        let mut restored = info.clone();
        restored.dividend_block = claimed.dividend();
        self.ledger.store.account_put(self.txn, &account, &restored)?;

        self.ledger.change_latest(
            self.txn,
            &account,
            &previous,
            &rep_block,
            &claimed.dividend(),
            previous_balance,
            info.block_count - 1,
            true,
            info.epoch,
        )?;
        self.ledger.store.block_successor_clear(self.txn, &previous)?;
        self.ledger.store.block_del(self.txn, &hash)?;
        Ok(())
    }
}
