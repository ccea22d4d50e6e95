//! Frontier index: head block hash → owning account, legacy variants only.

use heed::{RoTxn, RwTxn};

use chrysos_types::{Account, BlockHash};

use crate::{Store, StoreError};

impl Store {
    pub fn frontier_put(
        &self,
        txn: &mut RwTxn<'_>,
        hash: &BlockHash,
        account: &Account,
    ) -> Result<(), StoreError> {
        self.frontiers.put(txn, hash.as_bytes(), account.as_bytes())?;
        Ok(())
    }

    /// The account owning this frontier, zero when the hash is not a legacy
    /// head.
    pub fn frontier_get(&self, txn: &RoTxn<'_>, hash: &BlockHash) -> Result<Account, StoreError> {
        match self.frontiers.get(txn, hash.as_bytes())? {
            Some(value) => {
                Account::from_slice(value).ok_or(StoreError::Corruption("frontier value".into()))
            }
            None => Ok(Account::ZERO),
        }
    }

    pub fn frontier_del(&self, txn: &mut RwTxn<'_>, hash: &BlockHash) -> Result<(), StoreError> {
        self.frontiers.delete(txn, hash.as_bytes())?;
        Ok(())
    }

    pub fn frontier_count(&self, txn: &RoTxn<'_>) -> Result<u64, StoreError> {
        Ok(self.frontiers.len(txn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_store;

    #[test]
    fn put_get_del() {
        let (_dir, store) = temp_store();
        let hash = BlockHash::new([1; 32]);
        let account = Account::new([2; 32]);

        let mut txn = store.begin_write().unwrap();
        store.frontier_put(&mut txn, &hash, &account).unwrap();
        assert_eq!(store.frontier_get(&txn, &hash).unwrap(), account);
        store.frontier_del(&mut txn, &hash).unwrap();
        assert!(store.frontier_get(&txn, &hash).unwrap().is_zero());
        txn.commit().unwrap();
    }
}
