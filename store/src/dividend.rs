//! The dividend-ledger singleton.

use heed::{RoTxn, RwTxn};
use serde::{Deserialize, Serialize};

use chrysos_types::{Amount, BlockHash, Epoch, DIVIDEND_BASE};

use crate::{Store, StoreError};

const DIVIDEND_KEY: &[u8] = &[0u8];

/// Aggregate state of the dividend chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendInfo {
    /// Current head of the chain, `DIVIDEND_BASE` when no dividend has been
    /// issued yet.
    pub head: BlockHash,
    /// Cumulative balance paid out across all dividends.
    pub balance: Amount,
    /// Seconds since the Unix epoch.
    pub modified: u64,
    pub block_count: u64,
    pub epoch: Epoch,
}

impl Default for DividendInfo {
    fn default() -> Self {
        Self {
            head: DIVIDEND_BASE,
            balance: Amount::ZERO,
            modified: 0,
            block_count: 0,
            epoch: Epoch::Epoch0,
        }
    }
}

impl Store {
    pub fn dividend_put(&self, txn: &mut RwTxn<'_>, info: &DividendInfo) -> Result<(), StoreError> {
        let bytes = bincode::serialize(info)?;
        self.dividends_ledger.put(txn, DIVIDEND_KEY, &bytes)?;
        Ok(())
    }

    /// Read the singleton; a store that has never issued a dividend reads as
    /// the default record rooted at `DIVIDEND_BASE`.
    pub fn dividend_get(&self, txn: &RoTxn<'_>) -> Result<DividendInfo, StoreError> {
        match self.dividends_ledger.get(txn, DIVIDEND_KEY)? {
            Some(value) => Ok(bincode::deserialize(value)?),
            None => Ok(DividendInfo::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_store;

    #[test]
    fn default_is_base() {
        let (_dir, store) = temp_store();
        let txn = store.begin_read().unwrap();
        let info = store.dividend_get(&txn).unwrap();
        assert_eq!(info.head, DIVIDEND_BASE);
        assert_eq!(info.block_count, 0);
    }

    #[test]
    fn put_replaces_singleton() {
        let (_dir, store) = temp_store();
        let mut txn = store.begin_write().unwrap();
        let info = DividendInfo {
            head: BlockHash::new([7; 32]),
            balance: Amount::raw(1000),
            modified: 9,
            block_count: 1,
            epoch: Epoch::Epoch0,
        };
        store.dividend_put(&mut txn, &info).unwrap();
        assert_eq!(store.dividend_get(&txn).unwrap(), info);
        txn.commit().unwrap();
    }
}
