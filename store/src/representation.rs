//! Representation weights, keyed by rep-block hash.
//!
//! Each account's current rep-block accumulates that account's balance; a
//! representative's total weight is the sum over all rep-blocks naming it.

use heed::{RoTxn, RwTxn};

use chrysos_types::{Amount, BlockHash};

use crate::{Store, StoreError};

impl Store {
    pub fn representation_get(
        &self,
        txn: &RoTxn<'_>,
        rep_block: &BlockHash,
    ) -> Result<Amount, StoreError> {
        match self.representation.get(txn, rep_block.as_bytes())? {
            Some(value) => {
                let bytes: [u8; 16] = value
                    .try_into()
                    .map_err(|_| StoreError::Corruption("representation value".into()))?;
                Ok(Amount::from_be_bytes(bytes))
            }
            None => Ok(Amount::ZERO),
        }
    }

    pub fn representation_put(
        &self,
        txn: &mut RwTxn<'_>,
        rep_block: &BlockHash,
        weight: Amount,
    ) -> Result<(), StoreError> {
        if weight.is_zero() {
            self.representation.delete(txn, rep_block.as_bytes())?;
        } else {
            self.representation
                .put(txn, rep_block.as_bytes(), &weight.to_be_bytes())?;
        }
        Ok(())
    }

    /// Add a (possibly wrapping-negative) delta to a rep-block's weight.
    /// Subtraction is expressed as `Amount::ZERO.wrapping_sub(x)`.
    pub fn representation_add(
        &self,
        txn: &mut RwTxn<'_>,
        rep_block: &BlockHash,
        delta: Amount,
    ) -> Result<(), StoreError> {
        let current = self.representation_get(txn, rep_block)?;
        self.representation_put(txn, rep_block, current.wrapping_add(delta))
    }

    pub fn representation_iter<'txn>(
        &self,
        txn: &'txn RoTxn<'_>,
    ) -> Result<impl Iterator<Item = Result<(BlockHash, Amount), StoreError>> + 'txn, StoreError>
    {
        let iter = self.representation.iter(txn)?;
        Ok(iter.map(|item| {
            let (key, value) = item?;
            let hash = BlockHash::from_slice(key)
                .ok_or(StoreError::Corruption("representation key".into()))?;
            let bytes: [u8; 16] = value
                .try_into()
                .map_err(|_| StoreError::Corruption("representation value".into()))?;
            Ok((hash, Amount::from_be_bytes(bytes)))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_store;

    #[test]
    fn add_and_subtract() {
        let (_dir, store) = temp_store();
        let rep_block = BlockHash::new([1; 32]);

        let mut txn = store.begin_write().unwrap();
        store
            .representation_add(&mut txn, &rep_block, Amount::raw(100))
            .unwrap();
        assert_eq!(
            store.representation_get(&txn, &rep_block).unwrap(),
            Amount::raw(100)
        );

        store
            .representation_add(&mut txn, &rep_block, Amount::ZERO.wrapping_sub(Amount::raw(40)))
            .unwrap();
        assert_eq!(
            store.representation_get(&txn, &rep_block).unwrap(),
            Amount::raw(60)
        );
        txn.commit().unwrap();
    }

    #[test]
    fn zero_weight_drops_entry() {
        let (_dir, store) = temp_store();
        let rep_block = BlockHash::new([2; 32]);

        let mut txn = store.begin_write().unwrap();
        store
            .representation_add(&mut txn, &rep_block, Amount::raw(5))
            .unwrap();
        store
            .representation_add(&mut txn, &rep_block, Amount::ZERO.wrapping_sub(Amount::raw(5)))
            .unwrap();

        let entries: Vec<_> = store
            .representation_iter(&txn)
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert!(entries.is_empty());
        txn.commit().unwrap();
    }
}
