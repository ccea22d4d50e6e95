//! Cached (account, balance) snapshots for legacy chains.
//!
//! Recorded every `BLOCK_INFO_MAX` blocks so the balance and account walkers
//! can short-circuit instead of traversing to the open block.

use heed::{RoTxn, RwTxn};
use serde::{Deserialize, Serialize};

use chrysos_types::{Account, Amount, BlockHash};

use crate::{Store, StoreError};

/// Snapshot interval, in blocks.
pub const BLOCK_INFO_MAX: u64 = 32;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub account: Account,
    pub balance: Amount,
}

impl Store {
    pub fn block_info_put(
        &self,
        txn: &mut RwTxn<'_>,
        hash: &BlockHash,
        info: &BlockInfo,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serialize(info)?;
        self.blocks_info.put(txn, hash.as_bytes(), &bytes)?;
        Ok(())
    }

    pub fn block_info_get(
        &self,
        txn: &RoTxn<'_>,
        hash: &BlockHash,
    ) -> Result<Option<BlockInfo>, StoreError> {
        match self.blocks_info.get(txn, hash.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(value)?)),
            None => Ok(None),
        }
    }

    pub fn block_info_del(&self, txn: &mut RwTxn<'_>, hash: &BlockHash) -> Result<(), StoreError> {
        self.blocks_info.delete(txn, hash.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_store;

    #[test]
    fn round_trip() {
        let (_dir, store) = temp_store();
        let hash = BlockHash::new([1; 32]);
        let info = BlockInfo {
            account: Account::new([2; 32]),
            balance: Amount::raw(77),
        };

        let mut txn = store.begin_write().unwrap();
        store.block_info_put(&mut txn, &hash, &info).unwrap();
        assert_eq!(store.block_info_get(&txn, &hash).unwrap(), Some(info));
        store.block_info_del(&mut txn, &hash).unwrap();
        assert_eq!(store.block_info_get(&txn, &hash).unwrap(), None);
        txn.commit().unwrap();
    }
}
