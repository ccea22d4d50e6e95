//! Pending receive records, split across `pending_v0` and `pending_v1`.
//!
//! Keyed by `(receiver, send hash)` so a receiver's outstanding sends form a
//! contiguous key range.

use heed::{RoTxn, RwTxn};
use serde::{Deserialize, Serialize};

use chrysos_types::{Account, Amount, BlockHash, Epoch};

use crate::iterator::MergedIter;
use crate::{Store, StoreError};

/// Composite key of a pending receive: receiver account then send hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PendingKey {
    pub account: Account,
    pub hash: BlockHash,
}

impl PendingKey {
    pub fn new(account: Account, hash: BlockHash) -> Self {
        Self { account, hash }
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(self.account.as_bytes());
        bytes[32..].copy_from_slice(self.hash.as_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 64 {
            return None;
        }
        Some(Self {
            account: Account::from_slice(&bytes[..32])?,
            hash: BlockHash::from_slice(&bytes[32..])?,
        })
    }
}

/// Information on an uncollected send.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInfo {
    pub source: Account,
    pub amount: Amount,
    /// Dividend-chain head the sender had observed; gates claims on the
    /// receiver side.
    pub dividend: BlockHash,
    pub epoch: Epoch,
}

impl PendingInfo {
    pub fn new(source: Account, amount: Amount, dividend: BlockHash, epoch: Epoch) -> Self {
        Self {
            source,
            amount,
            dividend,
            epoch,
        }
    }
}

impl Store {
    pub fn pending_put(
        &self,
        txn: &mut RwTxn<'_>,
        key: &PendingKey,
        info: &PendingInfo,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serialize(info)?;
        let key_bytes = key.to_bytes();
        if info.epoch >= Epoch::Epoch1 {
            self.pending_v0.delete(txn, &key_bytes)?;
            self.pending_v1.put(txn, &key_bytes, &bytes)?;
        } else {
            self.pending_v1.delete(txn, &key_bytes)?;
            self.pending_v0.put(txn, &key_bytes, &bytes)?;
        }
        Ok(())
    }

    pub fn pending_get(
        &self,
        txn: &RoTxn<'_>,
        key: &PendingKey,
    ) -> Result<Option<PendingInfo>, StoreError> {
        let key_bytes = key.to_bytes();
        if let Some(value) = self.pending_v1.get(txn, &key_bytes)? {
            return Ok(Some(bincode::deserialize(value)?));
        }
        if let Some(value) = self.pending_v0.get(txn, &key_bytes)? {
            return Ok(Some(bincode::deserialize(value)?));
        }
        Ok(None)
    }

    pub fn pending_exists(&self, txn: &RoTxn<'_>, key: &PendingKey) -> Result<bool, StoreError> {
        Ok(self.pending_get(txn, key)?.is_some())
    }

    pub fn pending_del(&self, txn: &mut RwTxn<'_>, key: &PendingKey) -> Result<(), StoreError> {
        let key_bytes = key.to_bytes();
        self.pending_v0.delete(txn, &key_bytes)?;
        self.pending_v1.delete(txn, &key_bytes)?;
        Ok(())
    }

    pub fn pending_count(&self, txn: &RoTxn<'_>) -> Result<u64, StoreError> {
        Ok(self.pending_v0.len(txn)? + self.pending_v1.len(txn)?)
    }

    /// All pending receives destined to `account`, merged across epochs in
    /// send-hash order.
    pub fn pending_for_account<'txn>(
        &self,
        txn: &'txn RoTxn<'_>,
        account: Account,
    ) -> Result<
        impl Iterator<Item = Result<(PendingKey, PendingInfo), StoreError>> + 'txn,
        StoreError,
    > {
        let start = PendingKey::new(account, BlockHash::ZERO).to_bytes();
        let mut end = start;
        end[..32].copy_from_slice(&increment(account.as_bytes()));
        let bounds = (
            std::ops::Bound::Included(&start[..]),
            std::ops::Bound::Excluded(&end[..]),
        );
        let merged = MergedIter::new(
            self.pending_v0.range(txn, &bounds)?,
            self.pending_v1.range(txn, &bounds)?,
        );
        Ok(merged.map(decode_pending))
    }

    /// Every pending record in combined key order.
    pub fn pending_iter<'txn>(
        &self,
        txn: &'txn RoTxn<'_>,
    ) -> Result<
        impl Iterator<Item = Result<(PendingKey, PendingInfo), StoreError>> + 'txn,
        StoreError,
    > {
        let merged = MergedIter::new(self.pending_v0.iter(txn)?, self.pending_v1.iter(txn)?);
        Ok(merged.map(decode_pending))
    }
}

fn decode_pending(
    item: Result<(Vec<u8>, Vec<u8>), StoreError>,
) -> Result<(PendingKey, PendingInfo), StoreError> {
    let (key, value) = item?;
    let key = PendingKey::from_bytes(&key).ok_or(StoreError::Corruption("pending key".into()))?;
    let info: PendingInfo = bincode::deserialize(&value)?;
    Ok((key, info))
}

/// Smallest key strictly greater than every key with this 32-byte prefix.
fn increment(prefix: &[u8; 32]) -> [u8; 32] {
    let mut bytes = *prefix;
    for byte in bytes.iter_mut().rev() {
        let (next, overflow) = byte.overflowing_add(1);
        *byte = next;
        if !overflow {
            break;
        }
    }
    bytes
}
