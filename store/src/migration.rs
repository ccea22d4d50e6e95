//! Forward schema migrations.
//!
//! The schema version lives in the `meta` table (key 1). On open, every
//! pending step runs in order inside the single open-time write transaction,
//! so a crash mid-upgrade leaves the store at its previous version.

use heed::types::Bytes;
use heed::RwTxn;
use serde::{Deserialize, Serialize};

use chrysos_blocks::Vote;
use chrysos_types::{Account, Amount, BlockHash, Epoch, Signature};

use crate::pending::{PendingInfo, PendingKey};
use crate::{BlockInfo, Store, StoreError, BLOCK_INFO_MAX};

pub const CURRENT_SCHEMA_VERSION: u32 = 11;

/// Pending record layout before v4 rekeyed the table: the destination lived
/// in the value and the key was the bare send hash.
#[derive(Deserialize, Serialize)]
struct PendingInfoV3 {
    source: Account,
    amount: Amount,
    destination: Account,
}

impl Store {
    pub(crate) fn do_upgrades(&self, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        let version = self.version_get(txn)?;
        if version > CURRENT_SCHEMA_VERSION {
            return Err(StoreError::Corruption(format!(
                "schema version {version} is newer than supported {CURRENT_SCHEMA_VERSION}"
            )));
        }
        for from in version..CURRENT_SCHEMA_VERSION {
            tracing::info!(from, to = from + 1, "running schema migration");
            match from {
                1 => self.upgrade_v1_to_v2(txn)?,
                2 => self.upgrade_v2_to_v3(txn)?,
                3 => self.upgrade_v3_to_v4(txn)?,
                4 => self.upgrade_v4_to_v5(txn)?,
                5 => self.upgrade_v5_to_v6(txn)?,
                6 => self.upgrade_v6_to_v7(txn)?,
                7 => self.upgrade_v7_to_v8(txn)?,
                8 => self.upgrade_v8_to_v9(txn)?,
                9 => self.upgrade_v9_to_v10(txn)?,
                10 => self.upgrade_v10_to_v11(txn)?,
                _ => unreachable!("version bounds checked above"),
            }
        }
        Ok(())
    }

    /// Backfill `open_block` by walking each chain to its first block.
    fn upgrade_v1_to_v2(&self, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        self.version_put(txn, 2)?;
        let accounts: Vec<(Account, crate::AccountInfo)> =
            self.account_iter(txn)?.collect::<Result<_, _>>()?;
        for (account, mut info) in accounts {
            let mut hash = info.head;
            loop {
                let block = self
                    .block_get(txn, &hash)?
                    .ok_or(StoreError::NotFound("chain block during v2 upgrade"))?;
                let previous = block.previous();
                if previous.is_zero() {
                    break;
                }
                hash = previous;
            }
            info.open_block = hash;
            self.account_put(txn, &account, &info)?;
        }
        Ok(())
    }

    /// Rebuild representation totals from each account's rep block.
    fn upgrade_v2_to_v3(&self, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        self.version_put(txn, 3)?;
        self.representation.clear(txn)?;
        let accounts: Vec<(Account, crate::AccountInfo)> =
            self.account_iter(txn)?.collect::<Result<_, _>>()?;
        for (account, mut info) in accounts {
            let rep_block = crate::visitors::representative(self, txn, &info.head)?;
            info.rep_block = rep_block;
            self.account_put(txn, &account, &info)?;
            self.representation_add(txn, &rep_block, info.balance)?;
        }
        Ok(())
    }

    /// Rekey pending from (hash → info-with-destination) to
    /// ((receiver, hash) → info).
    fn upgrade_v3_to_v4(&self, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        self.version_put(txn, 4)?;
        let mut items = Vec::new();
        for entry in self.pending_v0.iter(txn)? {
            let (key, value) = entry?;
            if key.len() != 32 {
                continue;
            }
            let hash = BlockHash::from_slice(key).expect("length checked");
            let old: PendingInfoV3 = bincode::deserialize(value)?;
            items.push((
                PendingKey::new(old.destination, hash),
                PendingInfo::new(old.source, old.amount, BlockHash::ZERO, Epoch::Epoch0),
            ));
        }
        if items.is_empty() {
            return Ok(());
        }
        self.pending_v0.clear(txn)?;
        for (key, info) in items {
            self.pending_put(txn, &key, &info)?;
        }
        Ok(())
    }

    /// Populate block successor pointers by walking each chain backwards.
    fn upgrade_v4_to_v5(&self, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        self.version_put(txn, 5)?;
        let accounts: Vec<(Account, crate::AccountInfo)> =
            self.account_iter(txn)?.collect::<Result<_, _>>()?;
        for (_, info) in accounts {
            let mut successor = BlockHash::ZERO;
            let mut hash = info.head;
            while let Some(block) = self.block_get(txn, &hash)? {
                if !successor.is_zero() && self.block_successor(txn, &hash)?.is_zero() {
                    self.block_successor_set(txn, &hash, &successor)?;
                }
                successor = hash;
                let previous = block.previous();
                if previous.is_zero() {
                    break;
                }
                hash = previous;
            }
        }
        Ok(())
    }

    /// Record per-account block counts.
    fn upgrade_v5_to_v6(&self, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        self.version_put(txn, 6)?;
        let accounts: Vec<(Account, crate::AccountInfo)> =
            self.account_iter(txn)?.collect::<Result<_, _>>()?;
        for (account, mut info) in accounts {
            let mut count = 0u64;
            let mut hash = info.head;
            while !hash.is_zero() {
                count += 1;
                let block = self
                    .block_get(txn, &hash)?
                    .ok_or(StoreError::NotFound("chain block during v6 upgrade"))?;
                hash = block.previous();
            }
            info.block_count = count;
            self.account_put(txn, &account, &info)?;
        }
        Ok(())
    }

    /// Discard buffered unchecked blocks; their serialized format changed.
    fn upgrade_v6_to_v7(&self, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        self.version_put(txn, 7)?;
        self.unchecked_clear(txn)
    }

    /// The unchecked table became duplicate-sorted; start it empty again.
    fn upgrade_v7_to_v8(&self, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        self.version_put(txn, 8)?;
        self.unchecked_clear(txn)
    }

    /// Convert the per-account sequence counters into vote records. The
    /// carried votes have no valid signature; the first real vote from each
    /// account replaces them.
    fn upgrade_v8_to_v9(&self, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        self.version_put(txn, 9)?;
        let Some(sequence_db) = self.legacy_db(txn, "sequence")? else {
            return Ok(());
        };
        let mut carried = Vec::new();
        for entry in sequence_db.iter(txn)? {
            let (key, value) = entry?;
            let Some(account) = Account::from_slice(key) else {
                continue;
            };
            let Ok(bytes) = <[u8; 8]>::try_from(value) else {
                continue;
            };
            carried.push((account, u64::from_le_bytes(bytes)));
        }
        for (account, sequence) in carried {
            let vote = Vote {
                account,
                sequence,
                hashes: Vec::new(),
                signature: Signature::ZERO,
            };
            self.vote_put(txn, &vote)?;
        }
        sequence_db.clear(txn)?;
        Ok(())
    }

    /// Seed `blocks_info` snapshots every `BLOCK_INFO_MAX` blocks for long
    /// pre-upgrade chains.
    fn upgrade_v9_to_v10(&self, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        self.version_put(txn, 10)?;
        let accounts: Vec<(Account, crate::AccountInfo)> =
            self.account_iter(txn)?.collect::<Result<_, _>>()?;
        for (account, info) in accounts {
            if info.block_count < BLOCK_INFO_MAX {
                continue;
            }
            let mut block_count = 1u64;
            let mut hash = info.open_block;
            while !hash.is_zero() {
                if block_count % BLOCK_INFO_MAX == 0 {
                    let balance = self.block_balance(txn, &hash)?;
                    self.block_info_put(txn, &hash, &BlockInfo { account, balance })?;
                }
                hash = self.block_successor(txn, &hash)?;
                block_count += 1;
            }
        }
        Ok(())
    }

    /// Drop the deprecated `unsynced` table.
    fn upgrade_v10_to_v11(&self, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        self.version_put(txn, 11)?;
        if let Some(unsynced) = self.legacy_db(txn, "unsynced")? {
            unsynced.clear(txn)?;
        }
        Ok(())
    }

    fn legacy_db(
        &self,
        txn: &RwTxn<'_>,
        name: &str,
    ) -> Result<Option<heed::Database<Bytes, Bytes>>, StoreError> {
        Ok(self.env().open_database::<Bytes, Bytes>(txn, Some(name))?)
    }

    fn env(&self) -> &heed::Env {
        &self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_store;

    #[test]
    fn fresh_store_lands_on_current_version() {
        let (_dir, store) = temp_store();
        let txn = store.begin_read().unwrap();
        assert_eq!(store.version_get(&txn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn newer_version_refuses_to_open() {
        let (_dir, store) = temp_store();
        let mut txn = store.begin_write().unwrap();
        store.version_put(&mut txn, CURRENT_SCHEMA_VERSION + 1).unwrap();
        assert!(store.do_upgrades(&mut txn).is_err());
        txn.commit().unwrap();
    }

    #[test]
    fn reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        {
            let _store = Store::open_with_map_size(dir.path(), 64 * 1024 * 1024).unwrap();
        }
        let store = Store::open_with_map_size(dir.path(), 64 * 1024 * 1024).unwrap();
        let txn = store.begin_read().unwrap();
        assert_eq!(store.version_get(&txn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn pending_rekey_migrates_old_records() {
        let (_dir, store) = temp_store();
        let destination = Account::new([7; 32]);
        let source = Account::new([8; 32]);
        let hash = BlockHash::new([9; 32]);

        let mut txn = store.begin_write().unwrap();
        let old = PendingInfoV3 {
            source,
            amount: Amount::raw(55),
            destination,
        };
        store
            .pending_v0
            .put(&mut txn, hash.as_bytes(), &bincode::serialize(&old).unwrap())
            .unwrap();
        store.upgrade_v3_to_v4(&mut txn).unwrap();

        let key = PendingKey::new(destination, hash);
        let migrated = store.pending_get(&txn, &key).unwrap().unwrap();
        assert_eq!(migrated.source, source);
        assert_eq!(migrated.amount, Amount::raw(55));
        assert_eq!(migrated.dividend, BlockHash::ZERO);
        txn.commit().unwrap();
    }
}
