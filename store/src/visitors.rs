//! Balance, amount, and representative walkers over the stored block graph.
//!
//! State, dividend, and claim blocks carry their balance, so those resolve in
//! one lookup. Legacy blocks are walked along `previous` until a
//! balance-carrying block or a `blocks_info` snapshot ends the traversal.

use heed::RoTxn;

use chrysos_blocks::Block;
use chrysos_types::{Amount, BlockHash, GENESIS_AMOUNT};

use crate::{Store, StoreError};

/// Balance as of the block `hash`.
pub fn balance(store: &Store, txn: &RoTxn<'_>, hash: &BlockHash) -> Result<Amount, StoreError> {
    let mut total = Amount::ZERO;
    let mut current = *hash;
    while !current.is_zero() {
        if let Some(info) = store.block_info_get(txn, &current)? {
            total = total.wrapping_add(info.balance);
            break;
        }
        let block = store
            .block_get(txn, &current)?
            .ok_or(StoreError::NotFound("block for balance walk"))?;
        match &block {
            Block::Send(b) => {
                total = total.wrapping_add(b.hashables.balance);
                break;
            }
            Block::State(b) => {
                total = total.wrapping_add(b.hashables.balance);
                break;
            }
            Block::Dividend(b) => {
                total = total.wrapping_add(b.hashables.balance);
                break;
            }
            Block::Claim(b) => {
                total = total.wrapping_add(b.hashables.balance);
                break;
            }
            Block::Receive(b) => {
                total = total.wrapping_add(amount(store, txn, &b.hashables.source)?);
                current = b.hashables.previous;
            }
            Block::Open(b) => {
                total = total.wrapping_add(open_amount(store, txn, b)?);
                break;
            }
            Block::Change(b) => {
                current = b.hashables.previous;
            }
        }
    }
    Ok(total)
}

/// Amount delta caused by the block `hash`: the balance moved by a send,
/// receive, dividend, or claim; zero for a representative change.
pub fn amount(store: &Store, txn: &RoTxn<'_>, hash: &BlockHash) -> Result<Amount, StoreError> {
    let mut current = *hash;
    loop {
        let block = store
            .block_get(txn, &current)?
            .ok_or(StoreError::NotFound("block for amount walk"))?;
        return match &block {
            Block::Send(b) => {
                let previous = balance(store, txn, &b.hashables.previous)?;
                Ok(previous.abs_diff(b.hashables.balance))
            }
            Block::State(b) => {
                let previous = previous_balance(store, txn, &b.hashables.previous)?;
                Ok(previous.abs_diff(b.hashables.balance))
            }
            Block::Dividend(b) => {
                let previous = previous_balance(store, txn, &b.hashables.previous)?;
                Ok(previous.abs_diff(b.hashables.balance))
            }
            Block::Claim(b) => {
                let previous = previous_balance(store, txn, &b.hashables.previous)?;
                Ok(b.hashables.balance.abs_diff(previous))
            }
            Block::Receive(b) => {
                // A receive moves exactly what its source moved.
                current = b.hashables.source;
                continue;
            }
            Block::Open(b) => open_amount(store, txn, b),
            Block::Change(_) => Ok(Amount::ZERO),
        };
    }
}

/// Rep-block hash governing the block `hash`: the nearest block at or before
/// it that names a representative.
pub fn representative(
    store: &Store,
    txn: &RoTxn<'_>,
    hash: &BlockHash,
) -> Result<BlockHash, StoreError> {
    let mut current = *hash;
    loop {
        let block = store
            .block_get(txn, &current)?
            .ok_or(StoreError::NotFound("block for representative walk"))?;
        match &block {
            Block::Send(b) => current = b.hashables.previous,
            Block::Receive(b) => current = b.hashables.previous,
            Block::Open(_)
            | Block::Change(_)
            | Block::State(_)
            | Block::Dividend(_)
            | Block::Claim(_) => return Ok(current),
        }
    }
}

fn previous_balance(
    store: &Store,
    txn: &RoTxn<'_>,
    previous: &BlockHash,
) -> Result<Amount, StoreError> {
    if previous.is_zero() {
        Ok(Amount::ZERO)
    } else {
        balance(store, txn, previous)
    }
}

/// Amount pocketed by a legacy open. The genesis open references its own
/// account as the source sentinel and yields the full initial supply.
fn open_amount(
    store: &Store,
    txn: &RoTxn<'_>,
    block: &chrysos_blocks::OpenBlock,
) -> Result<Amount, StoreError> {
    if block.hashables.source == block.hashables.account.into_hash() {
        Ok(Amount::raw(GENESIS_AMOUNT))
    } else {
        amount(store, txn, &block.hashables.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_store;
    use chrysos_blocks::{OpenBlock, ReceiveBlock, SendBlock, StateBlock};
    use chrysos_crypto::KeyPair;
    use chrysos_types::{Epoch, RawKey};
    use heed::RwTxn;

    fn put(store: &Store, txn: &mut RwTxn<'_>, block: &Block) {
        store
            .block_put(txn, &block.hash(), block, &BlockHash::ZERO, Epoch::Epoch0)
            .unwrap();
    }

    #[test]
    fn state_balance_is_direct() {
        let (_dir, store) = temp_store();
        let keys = KeyPair::from_raw_key(RawKey::new([0xB1; 32]));
        let block = Block::State(StateBlock::new(
            keys.account,
            BlockHash::ZERO,
            keys.account,
            Amount::raw(500),
            BlockHash::new([1; 32]),
            BlockHash::ZERO,
            &keys.raw_key,
            0,
        ));

        let mut txn = store.begin_write().unwrap();
        put(&store, &mut txn, &block);
        assert_eq!(balance(&store, &txn, &block.hash()).unwrap(), Amount::raw(500));
        txn.commit().unwrap();
    }

    #[test]
    fn genesis_open_yields_full_supply() {
        let (_dir, store) = temp_store();
        let keys = KeyPair::from_raw_key(RawKey::new([0xB2; 32]));
        let open = Block::Open(OpenBlock::new(
            keys.account.into_hash(),
            keys.account,
            keys.account,
            BlockHash::ZERO,
            &keys.raw_key,
            0,
        ));

        let mut txn = store.begin_write().unwrap();
        put(&store, &mut txn, &open);
        assert_eq!(
            balance(&store, &txn, &open.hash()).unwrap(),
            Amount::raw(GENESIS_AMOUNT)
        );
        assert_eq!(
            amount(&store, &txn, &open.hash()).unwrap(),
            Amount::raw(GENESIS_AMOUNT)
        );
        txn.commit().unwrap();
    }

    #[test]
    fn legacy_send_and_receive_amounts() {
        let (_dir, store) = temp_store();
        let genesis = KeyPair::from_raw_key(RawKey::new([0xB3; 32]));
        let receiver = KeyPair::from_raw_key(RawKey::new([0xB4; 32]));

        let open = Block::Open(OpenBlock::new(
            genesis.account.into_hash(),
            genesis.account,
            genesis.account,
            BlockHash::ZERO,
            &genesis.raw_key,
            0,
        ));
        let send = Block::Send(SendBlock::new(
            open.hash(),
            receiver.account,
            Amount::raw(GENESIS_AMOUNT - 100),
            BlockHash::ZERO,
            &genesis.raw_key,
            0,
        ));
        let recv_open = Block::Open(OpenBlock::new(
            send.hash(),
            receiver.account,
            receiver.account,
            BlockHash::ZERO,
            &receiver.raw_key,
            0,
        ));
        let recv_send = Block::Send(SendBlock::new(
            recv_open.hash(),
            genesis.account,
            Amount::raw(60),
            BlockHash::ZERO,
            &receiver.raw_key,
            0,
        ));
        let back = Block::Receive(ReceiveBlock::new(
            send.hash(),
            recv_send.hash(),
            BlockHash::ZERO,
            &genesis.raw_key,
            0,
        ));

        let mut txn = store.begin_write().unwrap();
        for block in [&open, &send, &recv_open, &recv_send, &back] {
            put(&store, &mut txn, block);
        }

        assert_eq!(amount(&store, &txn, &send.hash()).unwrap(), Amount::raw(100));
        assert_eq!(
            balance(&store, &txn, &recv_open.hash()).unwrap(),
            Amount::raw(100)
        );
        assert_eq!(amount(&store, &txn, &recv_send.hash()).unwrap(), Amount::raw(40));
        // The receive walks to its source's amount and adds the previous
        // balance of the sender chain.
        assert_eq!(amount(&store, &txn, &back.hash()).unwrap(), Amount::raw(40));
        assert_eq!(
            balance(&store, &txn, &back.hash()).unwrap(),
            Amount::raw(GENESIS_AMOUNT - 60)
        );
        txn.commit().unwrap();
    }

    #[test]
    fn representative_walks_to_naming_block() {
        let (_dir, store) = temp_store();
        let keys = KeyPair::from_raw_key(RawKey::new([0xB5; 32]));
        let open = Block::Open(OpenBlock::new(
            keys.account.into_hash(),
            keys.account,
            keys.account,
            BlockHash::ZERO,
            &keys.raw_key,
            0,
        ));
        let send = Block::Send(SendBlock::new(
            open.hash(),
            keys.account,
            Amount::raw(1),
            BlockHash::ZERO,
            &keys.raw_key,
            0,
        ));

        let mut txn = store.begin_write().unwrap();
        put(&store, &mut txn, &open);
        put(&store, &mut txn, &send);
        assert_eq!(
            representative(&store, &txn, &send.hash()).unwrap(),
            open.hash()
        );
        txn.commit().unwrap();
    }
}
