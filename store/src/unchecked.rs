//! Blocks buffered while their dependencies are missing.
//!
//! Writes land in a bounded in-memory cache first and reach the duplicate-key
//! `unchecked` table on `flush`. When the cache is full the oldest entries
//! are dropped; the peer that sent them will rebroadcast.

use std::collections::VecDeque;

use heed::{RoTxn, RwTxn};

use chrysos_blocks::{deserialize_block, serialize_block, Block};
use chrysos_types::BlockHash;

use crate::{Store, StoreError};

pub(crate) struct UncheckedCache {
    entries: VecDeque<(BlockHash, Block)>,
    max: usize,
}

impl UncheckedCache {
    pub fn new(max: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max,
        }
    }

    fn put(&mut self, dependency: BlockHash, block: Block) {
        if self.entries.len() >= self.max {
            if let Some((dropped, _)) = self.entries.pop_front() {
                tracing::debug!(dependency = %dropped, "unchecked cache full, dropping oldest");
            }
        }
        self.entries.push_back((dependency, block));
    }

    fn remove(&mut self, dependency: &BlockHash, hash: &BlockHash) {
        self.entries
            .retain(|(dep, block)| !(dep == dependency && block.hash() == *hash));
    }

    fn matching(&self, dependency: &BlockHash) -> Vec<Block> {
        self.entries
            .iter()
            .filter(|(dep, _)| dep == dependency)
            .map(|(_, block)| block.clone())
            .collect()
    }

    pub fn drain(&mut self) -> Vec<(BlockHash, Block)> {
        self.entries.drain(..).collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Store {
    /// Buffer a block that depends on the unseen block `dependency`.
    pub fn unchecked_put(&self, dependency: &BlockHash, block: &Block) {
        let mut cache = self
            .unchecked_cache
            .lock()
            .expect("unchecked cache poisoned");
        cache.put(*dependency, block.clone());
    }

    /// All buffered blocks waiting on `dependency`, from the table and the
    /// cache.
    pub fn unchecked_get(
        &self,
        txn: &RoTxn<'_>,
        dependency: &BlockHash,
    ) -> Result<Vec<Block>, StoreError> {
        let mut result = Vec::new();
        if let Some(duplicates) = self.unchecked.get_duplicates(txn, dependency.as_bytes())? {
            for item in duplicates {
                let (_, value) = item?;
                result.push(deserialize_block(value)?);
            }
        }
        let cache = self
            .unchecked_cache
            .lock()
            .expect("unchecked cache poisoned");
        result.extend(cache.matching(dependency));
        Ok(result)
    }

    /// Remove one buffered block from the cache and the table.
    pub fn unchecked_del(
        &self,
        txn: &mut RwTxn<'_>,
        dependency: &BlockHash,
        block: &Block,
    ) -> Result<(), StoreError> {
        {
            let mut cache = self
                .unchecked_cache
                .lock()
                .expect("unchecked cache poisoned");
            cache.remove(dependency, &block.hash());
        }
        let bytes = serialize_block(block);
        self.unchecked
            .delete_one_duplicate(txn, dependency.as_bytes(), &bytes)?;
        Ok(())
    }

    pub fn unchecked_clear(&self, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        self.unchecked.clear(txn)?;
        self.unchecked_cache
            .lock()
            .expect("unchecked cache poisoned")
            .clear();
        Ok(())
    }

    pub fn unchecked_count(&self, txn: &RoTxn<'_>) -> Result<u64, StoreError> {
        let cached = self
            .unchecked_cache
            .lock()
            .expect("unchecked cache poisoned")
            .len() as u64;
        Ok(self.unchecked.len(txn)? + cached)
    }

    pub(crate) fn unchecked_table_put(
        &self,
        txn: &mut RwTxn<'_>,
        dependency: &BlockHash,
        block: &Block,
    ) -> Result<(), StoreError> {
        let bytes = serialize_block(block);
        self.unchecked.put(txn, dependency.as_bytes(), &bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_store;
    use chrysos_blocks::StateBlock;
    use chrysos_crypto::KeyPair;
    use chrysos_types::{Amount, RawKey};

    fn block(nonce: u8) -> Block {
        let keys = KeyPair::from_raw_key(RawKey::new([0x91; 32]));
        Block::State(StateBlock::new(
            keys.account,
            BlockHash::new([nonce; 32]),
            keys.account,
            Amount::raw(nonce as u128),
            BlockHash::ZERO,
            BlockHash::ZERO,
            &keys.raw_key,
            0,
        ))
    }

    #[test]
    fn cached_blocks_visible_before_flush() {
        let (_dir, store) = temp_store();
        let dependency = BlockHash::new([0xAA; 32]);
        let buffered = block(1);
        store.unchecked_put(&dependency, &buffered);

        let txn = store.begin_read().unwrap();
        let found = store.unchecked_get(&txn, &dependency).unwrap();
        assert_eq!(found, vec![buffered]);
        assert_eq!(store.unchecked_count(&txn).unwrap(), 1);
    }

    #[test]
    fn flush_moves_cache_to_table() {
        let (_dir, store) = temp_store();
        let dependency = BlockHash::new([0xBB; 32]);
        store.unchecked_put(&dependency, &block(2));

        let mut txn = store.begin_write().unwrap();
        store.flush(&mut txn).unwrap();
        txn.commit().unwrap();

        let txn = store.begin_read().unwrap();
        assert_eq!(store.unchecked.len(&txn).unwrap(), 1);
        assert_eq!(store.unchecked_get(&txn, &dependency).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_keys_keep_both_blocks() {
        let (_dir, store) = temp_store();
        let dependency = BlockHash::new([0xCC; 32]);
        store.unchecked_put(&dependency, &block(3));
        store.unchecked_put(&dependency, &block(4));

        let mut txn = store.begin_write().unwrap();
        store.flush(&mut txn).unwrap();
        assert_eq!(store.unchecked_get(&txn, &dependency).unwrap().len(), 2);

        store.unchecked_del(&mut txn, &dependency, &block(3)).unwrap();
        assert_eq!(store.unchecked_get(&txn, &dependency).unwrap().len(), 1);
        txn.commit().unwrap();
    }

    #[test]
    fn cache_bound_drops_oldest() {
        let mut cache = UncheckedCache::new(2);
        cache.put(BlockHash::new([1; 32]), block(1));
        cache.put(BlockHash::new([2; 32]), block(2));
        cache.put(BlockHash::new([3; 32]), block(3));
        assert_eq!(cache.len(), 2);
        assert!(cache.matching(&BlockHash::new([1; 32])).is_empty());
        assert_eq!(cache.matching(&BlockHash::new([3; 32])).len(), 1);
    }

    #[test]
    fn clear_empties_everything() {
        let (_dir, store) = temp_store();
        let dependency = BlockHash::new([0xDD; 32]);
        store.unchecked_put(&dependency, &block(5));

        let mut txn = store.begin_write().unwrap();
        store.flush(&mut txn).unwrap();
        store.unchecked_put(&dependency, &block(6));
        store.unchecked_clear(&mut txn).unwrap();
        assert_eq!(store.unchecked_count(&txn).unwrap(), 0);
        txn.commit().unwrap();
    }
}
