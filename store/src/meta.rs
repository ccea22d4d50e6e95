//! The `meta` table: schema version (key 1) and node identity secret (key 3).

use heed::{RoTxn, RwTxn};

use chrysos_crypto::KeyPair;
use chrysos_types::RawKey;

use crate::{Store, StoreError};

fn meta_key(id: u8) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[31] = id;
    key
}

const VERSION_KEY: u8 = 1;
const NODE_ID_KEY: u8 = 3;

impl Store {
    /// Stored schema version; a fresh database reads as version 1.
    pub fn version_get(&self, txn: &RoTxn<'_>) -> Result<u32, StoreError> {
        match self.meta.get(txn, &meta_key(VERSION_KEY))? {
            Some(value) => {
                let bytes: [u8; 32] = value
                    .try_into()
                    .map_err(|_| StoreError::Corruption("version value".into()))?;
                Ok(u32::from_be_bytes(
                    bytes[28..].try_into().expect("length checked"),
                ))
            }
            None => Ok(1),
        }
    }

    pub fn version_put(&self, txn: &mut RwTxn<'_>, version: u32) -> Result<(), StoreError> {
        let mut value = [0u8; 32];
        value[28..].copy_from_slice(&version.to_be_bytes());
        self.meta.put(txn, &meta_key(VERSION_KEY), &value)?;
        Ok(())
    }

    /// The node identity secret, generated and persisted on first access.
    pub fn node_id(&self, txn: &mut RwTxn<'_>) -> Result<RawKey, StoreError> {
        if let Some(value) = self.meta.get(txn, &meta_key(NODE_ID_KEY))? {
            let bytes: [u8; 32] = value
                .try_into()
                .map_err(|_| StoreError::Corruption("node id value".into()))?;
            return Ok(RawKey::new(bytes));
        }
        let raw_key = KeyPair::generate().raw_key;
        self.meta
            .put(txn, &meta_key(NODE_ID_KEY), raw_key.as_bytes())?;
        tracing::info!("generated node identity secret");
        Ok(raw_key)
    }

    pub fn delete_node_id(&self, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        self.meta.delete(txn, &meta_key(NODE_ID_KEY))?;
        Ok(())
    }

    pub(crate) fn init_node_id(&self, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        self.node_id(txn).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_store;
    use crate::CURRENT_SCHEMA_VERSION;

    #[test]
    fn fresh_store_is_current_version() {
        let (_dir, store) = temp_store();
        let txn = store.begin_read().unwrap();
        assert_eq!(store.version_get(&txn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn node_id_is_stable() {
        let (_dir, store) = temp_store();
        let mut txn = store.begin_write().unwrap();
        let first = store.node_id(&mut txn).unwrap();
        let second = store.node_id(&mut txn).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());

        store.delete_node_id(&mut txn).unwrap();
        let third = store.node_id(&mut txn).unwrap();
        assert_ne!(first.as_bytes(), third.as_bytes());
        txn.commit().unwrap();
    }
}
