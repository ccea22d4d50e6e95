//! Ledger checksum table, keyed by (prefix, mask).

use heed::{RoTxn, RwTxn};

use chrysos_types::Checksum;

use crate::{Store, StoreError};

fn checksum_key(prefix: u64, mask: u8) -> [u8; 9] {
    let mut key = [0u8; 9];
    key[..8].copy_from_slice(&prefix.to_be_bytes());
    key[8] = mask;
    key
}

impl Store {
    pub fn checksum_put(
        &self,
        txn: &mut RwTxn<'_>,
        prefix: u64,
        mask: u8,
        value: &Checksum,
    ) -> Result<(), StoreError> {
        self.checksum
            .put(txn, &checksum_key(prefix, mask), value.as_bytes())?;
        Ok(())
    }

    pub fn checksum_get(
        &self,
        txn: &RoTxn<'_>,
        prefix: u64,
        mask: u8,
    ) -> Result<Checksum, StoreError> {
        match self.checksum.get(txn, &checksum_key(prefix, mask))? {
            Some(value) => {
                let bytes: [u8; 32] = value
                    .try_into()
                    .map_err(|_| StoreError::Corruption("checksum value".into()))?;
                Ok(Checksum(bytes))
            }
            None => Ok(Checksum::ZERO),
        }
    }

    pub fn checksum_del(&self, txn: &mut RwTxn<'_>, prefix: u64, mask: u8) -> Result<(), StoreError> {
        self.checksum.delete(txn, &checksum_key(prefix, mask))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_store;
    use chrysos_types::BlockHash;

    #[test]
    fn toggle_and_store() {
        let (_dir, store) = temp_store();
        let mut txn = store.begin_write().unwrap();

        let mut value = store.checksum_get(&txn, 0, 0).unwrap();
        assert_eq!(value, Checksum::ZERO);
        value.toggle(&BlockHash::new([3; 32]));
        store.checksum_put(&mut txn, 0, 0, &value).unwrap();
        assert_eq!(store.checksum_get(&txn, 0, 0).unwrap(), value);
        txn.commit().unwrap();
    }
}
