//! Account records, split across `accounts_v0` and `accounts_v1` by epoch.

use heed::{RoTxn, RwTxn};
use serde::{Deserialize, Serialize};

use chrysos_types::{Account, Amount, BlockHash, Epoch};

use crate::iterator::MergedIter;
use crate::{Store, StoreError};

/// Latest information about an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Head block of the account's chain.
    pub head: BlockHash,
    /// The block from which the current representative is read.
    pub rep_block: BlockHash,
    /// First block of the chain.
    pub open_block: BlockHash,
    /// Last dividend this account has claimed through.
    pub dividend_block: BlockHash,
    pub balance: Amount,
    /// Seconds since the Unix epoch.
    pub modified: u64,
    pub block_count: u64,
    pub epoch: Epoch,
}

impl Default for AccountInfo {
    fn default() -> Self {
        Self {
            head: BlockHash::ZERO,
            rep_block: BlockHash::ZERO,
            open_block: BlockHash::ZERO,
            dividend_block: BlockHash::ZERO,
            balance: Amount::ZERO,
            modified: 0,
            block_count: 0,
            epoch: Epoch::Epoch0,
        }
    }
}

impl Store {
    /// Write an account record into the table matching its epoch, clearing
    /// any stale record in the sibling table.
    pub fn account_put(
        &self,
        txn: &mut RwTxn<'_>,
        account: &Account,
        info: &AccountInfo,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serialize(info)?;
        if info.epoch >= Epoch::Epoch1 {
            self.accounts_v0.delete(txn, account.as_bytes())?;
            self.accounts_v1.put(txn, account.as_bytes(), &bytes)?;
        } else {
            self.accounts_v1.delete(txn, account.as_bytes())?;
            self.accounts_v0.put(txn, account.as_bytes(), &bytes)?;
        }
        Ok(())
    }

    pub fn account_get(
        &self,
        txn: &RoTxn<'_>,
        account: &Account,
    ) -> Result<Option<AccountInfo>, StoreError> {
        // Prefer the newer epoch on a (transient) double hit.
        if let Some(value) = self.accounts_v1.get(txn, account.as_bytes())? {
            return Ok(Some(bincode::deserialize(value)?));
        }
        if let Some(value) = self.accounts_v0.get(txn, account.as_bytes())? {
            return Ok(Some(bincode::deserialize(value)?));
        }
        Ok(None)
    }

    pub fn account_exists(&self, txn: &RoTxn<'_>, account: &Account) -> Result<bool, StoreError> {
        Ok(self.account_get(txn, account)?.is_some())
    }

    pub fn account_del(&self, txn: &mut RwTxn<'_>, account: &Account) -> Result<(), StoreError> {
        self.accounts_v0.delete(txn, account.as_bytes())?;
        self.accounts_v1.delete(txn, account.as_bytes())?;
        Ok(())
    }

    pub fn account_count(&self, txn: &RoTxn<'_>) -> Result<u64, StoreError> {
        Ok(self.accounts_v0.len(txn)? + self.accounts_v1.len(txn)?)
    }

    /// Iterate every account in key order across both epoch tables.
    pub fn account_iter<'txn>(
        &self,
        txn: &'txn RoTxn<'_>,
    ) -> Result<impl Iterator<Item = Result<(Account, AccountInfo), StoreError>> + 'txn, StoreError>
    {
        let merged = MergedIter::new(
            self.accounts_v0.iter(txn)?,
            self.accounts_v1.iter(txn)?,
        );
        Ok(merged.map(|item| {
            let (key, value) = item?;
            let account =
                Account::from_slice(&key).ok_or(StoreError::Corruption("account key".into()))?;
            let info: AccountInfo = bincode::deserialize(&value)?;
            Ok((account, info))
        }))
    }
}
