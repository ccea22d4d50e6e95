//! The `Ledger` type: read accessors and the shared commit helpers used by
//! the processor and rollback.

use heed::{RoTxn, RwTxn};

use chrysos_blocks::{Block, StateBlock};
use chrysos_store::{visitors, AccountInfo, BlockInfo, Store, BLOCK_INFO_MAX};
use chrysos_types::{
    seconds_since_epoch, Account, Amount, BlockHash, Checksum, Epoch, BURN_ACCOUNT,
};

use crate::genesis::Genesis;
use crate::processor::LedgerProcessor;
use crate::rollback::RollbackPerformer;
use crate::{LedgerError, ProcessReturn};

pub struct Ledger {
    pub store: Store,
    pub genesis_account: Account,
    pub dividend_account: Account,
    pub epoch_link: BlockHash,
    pub epoch_signer: Account,
}

impl Ledger {
    pub fn new(store: Store, genesis: &Genesis) -> Self {
        Self {
            store,
            genesis_account: genesis.account,
            dividend_account: genesis.dividend_account,
            epoch_link: genesis.epoch_link,
            epoch_signer: genesis.epoch_signer,
        }
    }

    /// Validate one block and, on `Progress`, commit all of its effects into
    /// `txn`. Any other code leaves the store untouched.
    pub fn process(&self, txn: &mut RwTxn<'_>, block: &Block) -> Result<ProcessReturn, LedgerError> {
        LedgerProcessor::new(self, txn).process(block)
    }

    /// Undo blocks of the owning account until `hash` is no longer stored,
    /// cascading through accounts that depend on the removed blocks. Runs
    /// entirely inside `txn`.
    pub fn rollback(&self, txn: &mut RwTxn<'_>, hash: &BlockHash) -> Result<(), LedgerError> {
        if !self.store.block_exists(txn, hash)? {
            return Err(LedgerError::BlockNotFound(*hash));
        }
        let account = self
            .account(txn, hash)?
            .ok_or(LedgerError::MissingAccount)?;
        while self.store.block_exists(txn, hash)? {
            let info = self
                .store
                .account_get(txn, &account)?
                .ok_or(LedgerError::MissingAccount)?;
            let head = self
                .store
                .block_get(txn, &info.head)?
                .ok_or(LedgerError::BlockNotFound(info.head))?;
            RollbackPerformer::new(self, txn).roll_back(&head)?;
        }
        Ok(())
    }

    // ── Read accessors ──────────────────────────────────────────────────

    /// Latest block for an account, zero when the account has no blocks.
    pub fn latest(&self, txn: &RoTxn<'_>, account: &Account) -> Result<BlockHash, LedgerError> {
        Ok(self
            .store
            .account_get(txn, account)?
            .map(|info| info.head)
            .unwrap_or(BlockHash::ZERO))
    }

    /// Latest block for an account, or the account key itself when there are
    /// no blocks (the root its first block must use).
    pub fn latest_root(&self, txn: &RoTxn<'_>, account: &Account) -> Result<BlockHash, LedgerError> {
        Ok(self
            .store
            .account_get(txn, account)?
            .map(|info| info.head)
            .unwrap_or(account.into_hash()))
    }

    /// Balance as of the block `hash`.
    pub fn balance(&self, txn: &RoTxn<'_>, hash: &BlockHash) -> Result<Amount, LedgerError> {
        Ok(visitors::balance(&self.store, txn, hash)?)
    }

    /// Current balance of an account.
    pub fn account_balance(&self, txn: &RoTxn<'_>, account: &Account) -> Result<Amount, LedgerError> {
        Ok(self
            .store
            .account_get(txn, account)?
            .map(|info| info.balance)
            .unwrap_or(Amount::ZERO))
    }

    /// Sum of all pending receives destined to an account.
    pub fn account_pending(&self, txn: &RoTxn<'_>, account: &Account) -> Result<Amount, LedgerError> {
        let mut total = Amount::ZERO;
        for entry in self.store.pending_for_account(txn, *account)? {
            let (_, info) = entry?;
            total = total.wrapping_add(info.amount);
        }
        Ok(total)
    }

    /// Balance delta caused by the block `hash`.
    pub fn amount(&self, txn: &RoTxn<'_>, hash: &BlockHash) -> Result<Amount, LedgerError> {
        Ok(visitors::amount(&self.store, txn, hash)?)
    }

    /// Rep-block hash governing the block `hash`.
    pub fn representative(&self, txn: &RoTxn<'_>, hash: &BlockHash) -> Result<BlockHash, LedgerError> {
        Ok(visitors::representative(&self.store, txn, hash)?)
    }

    /// Voting weight delegated to an account: the sum of representation
    /// entries whose rep block names it.
    pub fn weight(&self, txn: &RoTxn<'_>, account: &Account) -> Result<Amount, LedgerError> {
        let mut total = Amount::ZERO;
        let entries: Vec<(BlockHash, Amount)> = self
            .store
            .representation_iter(txn)?
            .collect::<Result<_, _>>()?;
        for (rep_block, weight) in entries {
            let Some(block) = self.store.block_get(txn, &rep_block)? else {
                continue;
            };
            if block.representative() == *account {
                total = total.wrapping_add(weight);
            }
        }
        Ok(total)
    }

    /// The account owning the block `hash`, following successors until a
    /// block names it or the frontier is reached.
    pub fn account(&self, txn: &RoTxn<'_>, hash: &BlockHash) -> Result<Option<Account>, LedgerError> {
        let mut current = *hash;
        loop {
            if let Some(info) = self.store.block_info_get(txn, &current)? {
                return Ok(Some(info.account));
            }
            let Some(block) = self.store.block_get(txn, &current)? else {
                return Ok(None);
            };
            let named = block.account();
            if !named.is_zero() {
                return Ok(Some(named));
            }
            let successor = self.store.block_successor(txn, &current)?;
            if successor.is_zero() {
                let frontier = self.store.frontier_get(txn, &current)?;
                return Ok((!frontier.is_zero()).then_some(frontier));
            }
            current = successor;
        }
    }

    pub fn block_exists(&self, txn: &RoTxn<'_>, hash: &BlockHash) -> Result<bool, LedgerError> {
        Ok(self.store.block_exists(txn, hash)?)
    }

    /// Textual form of a stored block, empty when absent.
    pub fn block_text(&self, txn: &RoTxn<'_>, hash: &BlockHash) -> Result<String, LedgerError> {
        Ok(self
            .store
            .block_get(txn, hash)?
            .map(|block| block.to_json().to_string())
            .unwrap_or_default())
    }

    /// Whether a state block lowers its account's balance.
    pub fn is_send(&self, txn: &RoTxn<'_>, block: &StateBlock) -> Result<bool, LedgerError> {
        if block.hashables.previous.is_zero() {
            return Ok(false);
        }
        let previous = self.balance(txn, &block.hashables.previous)?;
        Ok(block.hashables.balance < previous)
    }

    /// Destination account drained by a send block, zero otherwise.
    pub fn block_destination(&self, txn: &RoTxn<'_>, block: &Block) -> Result<Account, LedgerError> {
        match block {
            Block::Send(send) => Ok(send.hashables.destination),
            Block::State(state) if self.is_send(txn, state)? => {
                Ok(Account::new(*state.hashables.link.as_bytes()))
            }
            _ => Ok(Account::ZERO),
        }
    }

    /// Source block pocketed by a receive, zero otherwise.
    pub fn block_source(&self, txn: &RoTxn<'_>, block: &Block) -> Result<BlockHash, LedgerError> {
        match block {
            Block::State(state) if !self.is_send(txn, state)? => Ok(state.hashables.link),
            other => Ok(other.source()),
        }
    }

    /// Whether every dependency of `block` is already stored.
    pub fn could_fit(&self, txn: &RoTxn<'_>, block: &Block) -> Result<bool, LedgerError> {
        match block {
            Block::Send(_) | Block::Change(_) => {
                self.block_exists(txn, &block.previous())
            }
            Block::Receive(receive) => Ok(self
                .block_exists(txn, &receive.hashables.previous)?
                && self.block_exists(txn, &receive.hashables.source)?),
            Block::Open(open) => self.block_exists(txn, &open.hashables.source),
            Block::State(state) => {
                let previous_fits = state.hashables.previous.is_zero()
                    || self.block_exists(txn, &state.hashables.previous)?;
                if !previous_fits {
                    return Ok(false);
                }
                if !self.is_send(txn, state)? && !state.hashables.link.is_zero() {
                    self.block_exists(txn, &state.hashables.link)
                } else {
                    Ok(true)
                }
            }
            Block::Dividend(_) => self.block_exists(txn, &block.previous()),
            Block::Claim(claim) => Ok(self.block_exists(txn, &claim.hashables.previous)?
                && self.block_exists(txn, &claim.hashables.dividend)?),
        }
    }

    /// The block following `root`, where `root` is a block hash or an
    /// account key (whose successor is the open block).
    pub fn successor(&self, txn: &RoTxn<'_>, root: &BlockHash) -> Result<Option<Block>, LedgerError> {
        let account = Account::new(*root.as_bytes());
        let successor = if let Some(info) = self.store.account_get(txn, &account)? {
            info.open_block
        } else {
            self.store.block_successor(txn, root)?
        };
        if successor.is_zero() {
            return Ok(None);
        }
        Ok(self.store.block_get(txn, &successor)?)
    }

    /// The committed block a fork candidate is contending with.
    pub fn forked_block(&self, txn: &RoTxn<'_>, block: &Block) -> Result<Option<Block>, LedgerError> {
        self.successor(txn, &block.root())
    }

    pub fn checksum(&self, txn: &RoTxn<'_>) -> Result<Checksum, LedgerError> {
        Ok(self.store.checksum_get(txn, 0, 0)?)
    }

    /// Balance of the burn account plus everything pending to it; this much
    /// supply is permanently out of circulation.
    pub fn burn_account_balance(&self, txn: &RoTxn<'_>) -> Result<Amount, LedgerError> {
        let mut total = self.account_balance(txn, &BURN_ACCOUNT)?;
        total = total.wrapping_add(self.account_pending(txn, &BURN_ACCOUNT)?);
        Ok(total)
    }

    // ── Commit helpers ──────────────────────────────────────────────────

    pub(crate) fn checksum_update(
        &self,
        txn: &mut RwTxn<'_>,
        hash: &BlockHash,
    ) -> Result<(), LedgerError> {
        let mut value = self.store.checksum_get(txn, 0, 0)?;
        value.toggle(hash);
        self.store.checksum_put(txn, 0, 0, &value)?;
        Ok(())
    }

    /// Advance (or, during rollback, rewind) an account record. A zero
    /// `hash` deletes the record. The dividend pointer is written only when
    /// the account record is first created; claims move it explicitly.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn change_latest(
        &self,
        txn: &mut RwTxn<'_>,
        account: &Account,
        hash: &BlockHash,
        rep_block: &BlockHash,
        dividend: &BlockHash,
        balance: Amount,
        block_count: u64,
        is_state: bool,
        epoch: Epoch,
    ) -> Result<(), LedgerError> {
        let existing = self.store.account_get(txn, account)?;
        let mut info = existing.clone().unwrap_or_default();
        if let Some(ref old) = existing {
            self.checksum_update(txn, &old.head)?;
        } else {
            info.open_block = *hash;
            info.dividend_block = *dividend;
        }
        if hash.is_zero() {
            self.store.account_del(txn, account)?;
            return Ok(());
        }
        info.head = *hash;
        info.rep_block = *rep_block;
        info.balance = balance;
        info.modified = seconds_since_epoch();
        info.block_count = block_count;
        info.epoch = epoch;
        self.store.account_put(txn, account, &info)?;
        if block_count % BLOCK_INFO_MAX == 0 && !is_state {
            self.store.block_info_put(
                txn,
                hash,
                &BlockInfo {
                    account: *account,
                    balance,
                },
            )?;
        }
        self.checksum_update(txn, hash)?;
        Ok(())
    }

    pub(crate) fn account_info_or_default(
        &self,
        txn: &RoTxn<'_>,
        account: &Account,
    ) -> Result<(bool, AccountInfo), LedgerError> {
        match self.store.account_get(txn, account)? {
            Some(info) => Ok((true, info)),
            None => Ok((false, AccountInfo::default())),
        }
    }
}
