//! Block tables.
//!
//! Each variant has its own table (state split v0/v1 by epoch); a stored
//! value is the block's wire payload followed by a 32-byte successor hash,
//! zero until the next block in the chain is committed. Writing a block with
//! a non-zero `previous` patches the predecessor's successor field in place,
//! which is what lets chains be walked forward.

use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};

use chrysos_blocks::{deserialize_block_of_type, Block, BlockType};
use chrysos_types::{Amount, BlockHash, Epoch};

use crate::{Store, StoreError};

/// Per-variant block tallies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockCounts {
    pub send: u64,
    pub receive: u64,
    pub open: u64,
    pub change: u64,
    pub state_v0: u64,
    pub state_v1: u64,
    pub dividend: u64,
    pub claim: u64,
}

impl BlockCounts {
    pub fn sum(&self) -> u64 {
        self.send
            + self.receive
            + self.open
            + self.change
            + self.state_v0
            + self.state_v1
            + self.dividend
            + self.claim
    }
}

impl Store {
    /// Fixed probe order for hash lookups across the variant tables.
    fn block_tables(&self) -> [(Database<Bytes, Bytes>, BlockType); 8] {
        [
            (self.send_blocks, BlockType::Send),
            (self.receive_blocks, BlockType::Receive),
            (self.open_blocks, BlockType::Open),
            (self.change_blocks, BlockType::Change),
            (self.state_blocks_v0, BlockType::State),
            (self.state_blocks_v1, BlockType::State),
            (self.dividend_blocks, BlockType::Dividend),
            (self.claim_blocks, BlockType::Claim),
        ]
    }

    fn table_for(&self, block_type: BlockType, epoch: Epoch) -> Database<Bytes, Bytes> {
        match block_type {
            BlockType::Send => self.send_blocks,
            BlockType::Receive => self.receive_blocks,
            BlockType::Open => self.open_blocks,
            BlockType::Change => self.change_blocks,
            BlockType::State => {
                if epoch >= Epoch::Epoch1 {
                    self.state_blocks_v1
                } else {
                    self.state_blocks_v0
                }
            }
            BlockType::Dividend => self.dividend_blocks,
            BlockType::Claim => self.claim_blocks,
            BlockType::Invalid | BlockType::NotABlock => {
                unreachable!("no table for sentinel block types")
            }
        }
    }

    /// Store a block with an explicit successor and patch the predecessor's
    /// successor pointer.
    pub fn block_put(
        &self,
        txn: &mut RwTxn<'_>,
        hash: &BlockHash,
        block: &Block,
        successor: &BlockHash,
        epoch: Epoch,
    ) -> Result<(), StoreError> {
        let table = self.table_for(block.block_type(), epoch);
        let mut value = block.serialize();
        value.extend_from_slice(successor.as_bytes());
        table.put(txn, hash.as_bytes(), &value)?;
        let previous = block.previous();
        if !previous.is_zero() && self.block_exists(txn, &previous)? {
            self.block_predecessor_set(txn, &previous, hash)?;
        }
        Ok(())
    }

    /// Look a block up by hash, probing each variant table in fixed order.
    pub fn block_get(&self, txn: &RoTxn<'_>, hash: &BlockHash) -> Result<Option<Block>, StoreError> {
        match self.block_raw_get(txn, hash)? {
            Some((_, block_type, value)) => {
                let payload_len = value.len().saturating_sub(32);
                let block = deserialize_block_of_type(block_type, &value[..payload_len])?;
                Ok(Some(block))
            }
            None => Ok(None),
        }
    }

    pub fn block_exists(&self, txn: &RoTxn<'_>, hash: &BlockHash) -> Result<bool, StoreError> {
        Ok(self.block_raw_get(txn, hash)?.is_some())
    }

    /// The hash of the block following `hash` in its chain, zero if none.
    pub fn block_successor(&self, txn: &RoTxn<'_>, hash: &BlockHash) -> Result<BlockHash, StoreError> {
        match self.block_raw_get(txn, hash)? {
            Some((_, _, value)) => Ok(successor_of(&value)),
            None => Ok(BlockHash::ZERO),
        }
    }

    /// Zero the successor field of `hash` (used by rollback).
    pub fn block_successor_clear(
        &self,
        txn: &mut RwTxn<'_>,
        hash: &BlockHash,
    ) -> Result<(), StoreError> {
        self.block_successor_set(txn, hash, &BlockHash::ZERO)
    }

    pub fn block_del(&self, txn: &mut RwTxn<'_>, hash: &BlockHash) -> Result<(), StoreError> {
        for (table, _) in self.block_tables() {
            if table.delete(txn, hash.as_bytes())? {
                return Ok(());
            }
        }
        Ok(())
    }

    pub fn block_count(&self, txn: &RoTxn<'_>) -> Result<BlockCounts, StoreError> {
        Ok(BlockCounts {
            send: self.send_blocks.len(txn)?,
            receive: self.receive_blocks.len(txn)?,
            open: self.open_blocks.len(txn)?,
            change: self.change_blocks.len(txn)?,
            state_v0: self.state_blocks_v0.len(txn)?,
            state_v1: self.state_blocks_v1.len(txn)?,
            dividend: self.dividend_blocks.len(txn)?,
            claim: self.claim_blocks.len(txn)?,
        })
    }

    /// Epoch of a stored state block; everything else reads as epoch 0.
    pub fn block_version(&self, txn: &RoTxn<'_>, hash: &BlockHash) -> Result<Epoch, StoreError> {
        if self.state_blocks_v1.get(txn, hash.as_bytes())?.is_some() {
            Ok(Epoch::Epoch1)
        } else {
            Ok(Epoch::Epoch0)
        }
    }

    /// Balance as of a stored block, walking the chain where the variant does
    /// not carry one.
    pub fn block_balance(&self, txn: &RoTxn<'_>, hash: &BlockHash) -> Result<Amount, StoreError> {
        crate::visitors::balance(self, txn, hash)
    }

    pub(crate) fn block_raw_get(
        &self,
        txn: &RoTxn<'_>,
        hash: &BlockHash,
    ) -> Result<Option<(Database<Bytes, Bytes>, BlockType, Vec<u8>)>, StoreError> {
        for (table, block_type) in self.block_tables() {
            if let Some(value) = table.get(txn, hash.as_bytes())? {
                return Ok(Some((table, block_type, value.to_vec())));
            }
        }
        Ok(None)
    }

    fn block_predecessor_set(
        &self,
        txn: &mut RwTxn<'_>,
        predecessor: &BlockHash,
        successor: &BlockHash,
    ) -> Result<(), StoreError> {
        self.block_successor_set(txn, predecessor, successor)
    }

    pub(crate) fn block_successor_set(
        &self,
        txn: &mut RwTxn<'_>,
        hash: &BlockHash,
        successor: &BlockHash,
    ) -> Result<(), StoreError> {
        let Some((table, _, mut value)) = self.block_raw_get(txn, hash)? else {
            return Err(StoreError::NotFound("predecessor block"));
        };
        let offset = value.len() - 32;
        value[offset..].copy_from_slice(successor.as_bytes());
        table.put(txn, hash.as_bytes(), &value)?;
        Ok(())
    }
}

fn successor_of(value: &[u8]) -> BlockHash {
    BlockHash::from_slice(&value[value.len() - 32..]).expect("value carries a 32-byte successor")
}
