//! Signed vote records and the in-memory vote cache.
//!
//! The cache absorbs the write traffic of vote generation; `flush` persists
//! the highest-sequence vote per account into the `vote` table.

use heed::{RoTxn, RwTxn};

use chrysos_blocks::Vote;
use chrysos_types::{Account, BlockHash, RawKey};

use crate::{Store, StoreError};

impl Store {
    /// The persisted vote for an account, ignoring the cache.
    pub fn vote_get(&self, txn: &RoTxn<'_>, account: &Account) -> Result<Option<Vote>, StoreError> {
        match self.vote.get(txn, account.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(value)?)),
            None => Ok(None),
        }
    }

    /// The latest vote for an account, preferring the cache over the table.
    pub fn vote_current(
        &self,
        txn: &RoTxn<'_>,
        account: &Account,
    ) -> Result<Option<Vote>, StoreError> {
        {
            let cache = self.vote_cache.lock().expect("vote cache poisoned");
            if let Some(vote) = cache.get(account) {
                return Ok(Some(vote.clone()));
            }
        }
        self.vote_get(txn, account)
    }

    /// Produce the next vote for an account: one past the highest sequence
    /// seen so far, signed with `raw_key`.
    pub fn vote_generate(
        &self,
        txn: &RoTxn<'_>,
        account: &Account,
        raw_key: &RawKey,
        hashes: Vec<BlockHash>,
    ) -> Result<Vote, StoreError> {
        let sequence = self
            .vote_current(txn, account)?
            .map(|v| v.sequence + 1)
            .unwrap_or(1);
        let vote = Vote::new(*account, raw_key, sequence, hashes);
        let mut cache = self.vote_cache.lock().expect("vote cache poisoned");
        cache.insert(*account, vote.clone());
        Ok(vote)
    }

    /// Keep whichever of the supplied and stored votes has the higher
    /// sequence; returns the winner.
    pub fn vote_max(&self, txn: &RoTxn<'_>, vote: Vote) -> Result<Vote, StoreError> {
        let current = self.vote_current(txn, &vote.account)?;
        let winner = match current {
            Some(existing) if existing.sequence >= vote.sequence => existing,
            _ => vote,
        };
        let mut cache = self.vote_cache.lock().expect("vote cache poisoned");
        cache.insert(winner.account, winner.clone());
        Ok(winner)
    }

    pub(crate) fn vote_put(&self, txn: &mut RwTxn<'_>, vote: &Vote) -> Result<(), StoreError> {
        let bytes = bincode::serialize(vote)?;
        self.vote.put(txn, vote.account.as_bytes(), &bytes)?;
        Ok(())
    }

    pub fn vote_iter<'txn>(
        &self,
        txn: &'txn RoTxn<'_>,
    ) -> Result<impl Iterator<Item = Result<(Account, Vote), StoreError>> + 'txn, StoreError> {
        let iter = self.vote.iter(txn)?;
        Ok(iter.map(|item| {
            let (key, value) = item?;
            let account =
                Account::from_slice(key).ok_or(StoreError::Corruption("vote key".into()))?;
            let vote: Vote = bincode::deserialize(value)?;
            Ok((account, vote))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_store;
    use chrysos_crypto::KeyPair;

    #[test]
    fn generate_bumps_sequence() {
        let (_dir, store) = temp_store();
        let keys = KeyPair::from_raw_key(RawKey::new([0xA1; 32]));

        let txn = store.begin_read().unwrap();
        let first = store
            .vote_generate(&txn, &keys.account, &keys.raw_key, vec![BlockHash::new([1; 32])])
            .unwrap();
        let second = store
            .vote_generate(&txn, &keys.account, &keys.raw_key, vec![BlockHash::new([2; 32])])
            .unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert!(second.validate());
    }

    #[test]
    fn flush_persists_latest_vote() {
        let (_dir, store) = temp_store();
        let keys = KeyPair::from_raw_key(RawKey::new([0xA2; 32]));

        {
            let txn = store.begin_read().unwrap();
            store
                .vote_generate(&txn, &keys.account, &keys.raw_key, vec![BlockHash::new([1; 32])])
                .unwrap();
        }
        let mut txn = store.begin_write().unwrap();
        store.flush(&mut txn).unwrap();
        txn.commit().unwrap();

        let txn = store.begin_read().unwrap();
        let stored = store.vote_get(&txn, &keys.account).unwrap().unwrap();
        assert_eq!(stored.sequence, 1);
        // Cache drained; current falls back to the table.
        assert_eq!(
            store.vote_current(&txn, &keys.account).unwrap().unwrap(),
            stored
        );
    }

    #[test]
    fn vote_max_keeps_higher_sequence() {
        let (_dir, store) = temp_store();
        let keys = KeyPair::from_raw_key(RawKey::new([0xA3; 32]));

        let newer = Vote::new(keys.account, &keys.raw_key, 5, vec![]);
        let older = Vote::new(keys.account, &keys.raw_key, 3, vec![]);

        let txn = store.begin_read().unwrap();
        let winner = store.vote_max(&txn, newer.clone()).unwrap();
        assert_eq!(winner.sequence, 5);
        let winner = store.vote_max(&txn, older).unwrap();
        assert_eq!(winner, newer);
    }
}
