//! The dividend engine: chain ordering, per-account shares, claim gating.
//!
//! Dividends form a singly linked list rooted at the zero sentinel; each
//! dividend block's `dividend` field names its predecessor. An account's
//! share of one dividend is proportional to its balance against the supply
//! circulating outside the pool.

use std::collections::HashMap;

use heed::RoTxn;
use primitive_types::U256;

use chrysos_blocks::Block;
use chrysos_types::{Account, Amount, BlockHash, GENESIS_AMOUNT};

use crate::{Ledger, LedgerError};

impl Ledger {
    /// Head of the dividend chain, the zero sentinel before any issuance.
    pub fn latest_dividend(&self, txn: &RoTxn<'_>) -> Result<BlockHash, LedgerError> {
        Ok(self.store.dividend_get(txn)?.head)
    }

    /// Whether `first` precedes (or equals) `last` on the dividend chain.
    pub fn dividends_are_ordered(
        &self,
        txn: &RoTxn<'_>,
        first: &BlockHash,
        last: &BlockHash,
    ) -> Result<bool, LedgerError> {
        if first == last {
            return Ok(true);
        }
        let mut current = *last;
        while let Some(block) = self.store.block_get(txn, &current)? {
            let previous = block.dividend();
            if previous == *first {
                return Ok(true);
            }
            if previous.is_zero() {
                return Ok(false);
            }
            current = previous;
        }
        Ok(false)
    }

    /// Whether any pending receive for `account` is stamped with `dividend`.
    /// Such sends must be pocketed before the dividend can be claimed, or
    /// the claimant would count the amount twice.
    pub fn has_outstanding_pendings_for_dividend(
        &self,
        txn: &RoTxn<'_>,
        dividend: &BlockHash,
        account: &Account,
    ) -> Result<bool, LedgerError> {
        for entry in self.store.pending_for_account(txn, *account)? {
            let (_, info) = entry?;
            if info.dividend == *dividend {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Supply in circulation: everything ever issued minus the burn
    /// account's holdings.
    pub fn total_supply(&self, txn: &RoTxn<'_>) -> Result<Amount, LedgerError> {
        let burned = self.burn_account_balance(txn)?;
        Ok(Amount::raw(GENESIS_AMOUNT).saturating_sub(burned))
    }

    /// The exact amount `account` is entitled to from the dividend `hash`:
    /// `floor(balance × pool / (total_supply − pool))`, computed through a
    /// 256-bit intermediate so the multiply cannot overflow.
    pub fn amount_for_dividend(
        &self,
        txn: &RoTxn<'_>,
        hash: &BlockHash,
        account: &Account,
    ) -> Result<Amount, LedgerError> {
        let Some(Block::Dividend(_)) = self.store.block_get(txn, hash)? else {
            return Ok(Amount::ZERO);
        };
        let Some(info) = self.store.account_get(txn, account)? else {
            return Ok(Amount::ZERO);
        };
        let pool = self.amount(txn, hash)?;
        let total_supply = self.total_supply(txn)?;
        Ok(dividend_share(info.balance, pool, total_supply))
    }

    /// Position of each dividend on the chain, counted from the oldest.
    pub fn dividend_indexes(
        &self,
        txn: &RoTxn<'_>,
    ) -> Result<HashMap<BlockHash, u64>, LedgerError> {
        let mut from_head = Vec::new();
        let mut current = self.latest_dividend(txn)?;
        while !current.is_zero() {
            from_head.push(current);
            let block = self
                .store
                .block_get(txn, &current)?
                .ok_or(LedgerError::BlockNotFound(current))?;
            current = block.dividend();
        }
        Ok(from_head
            .iter()
            .rev()
            .enumerate()
            .map(|(index, hash)| (*hash, index as u64))
            .collect())
    }

    /// Every claim block in an account's chain, newest first.
    pub fn dividend_claim_blocks(
        &self,
        txn: &RoTxn<'_>,
        account: &Account,
    ) -> Result<Vec<Block>, LedgerError> {
        let mut result = Vec::new();
        let Some(info) = self.store.account_get(txn, account)? else {
            return Ok(result);
        };
        let mut current = info.head;
        while !current.is_zero() {
            let Some(block) = self.store.block_get(txn, &current)? else {
                break;
            };
            let previous = block.previous();
            if matches!(block, Block::Claim(_)) {
                result.push(block);
            }
            current = previous;
        }
        Ok(result)
    }
}

/// `floor(balance × pool / (total_supply − pool))`, truncated toward zero.
/// A pool that equals or exceeds the circulating supply has no one left to
/// pay; the share degenerates to zero.
pub fn dividend_share(balance: Amount, pool: Amount, total_supply: Amount) -> Amount {
    let denominator = U256::from(total_supply.number()).saturating_sub(U256::from(pool.number()));
    if denominator.is_zero() {
        return Amount::ZERO;
    }
    let share = U256::from(balance.number()) * U256::from(pool.number()) / denominator;
    // balance ≤ total_supply − pool, so the quotient fits in 128 bits.
    Amount::raw(share.low_u128())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_is_proportional() {
        // 10% holder of the post-pool supply receives 10% of the pool.
        let total = Amount::raw(1_100);
        let pool = Amount::raw(100);
        let balance = Amount::raw(100);
        assert_eq!(dividend_share(balance, pool, total), Amount::raw(10));
    }

    #[test]
    fn share_truncates_toward_zero() {
        let total = Amount::raw(1_001);
        let pool = Amount::raw(3);
        let balance = Amount::raw(499);
        // 499 * 3 / 998 = 1.5 → 1
        assert_eq!(dividend_share(balance, pool, total), Amount::raw(1));
    }

    #[test]
    fn share_survives_full_range_balances() {
        let total = Amount::raw(u128::MAX);
        let pool = Amount::raw(u128::MAX / 2);
        let balance = Amount::raw(u128::MAX / 2);
        // The 128×128 multiply overflows u128 but not the 256-bit
        // intermediate.
        let share = dividend_share(balance, pool, total);
        assert!(share.number() <= u128::MAX / 2 + 1);
        assert!(!share.is_zero());
    }

    #[test]
    fn degenerate_pool_pays_nothing() {
        let total = Amount::raw(100);
        let pool = Amount::raw(100);
        assert_eq!(dividend_share(Amount::raw(50), pool, total), Amount::ZERO);
    }

    #[test]
    fn whole_supply_claims_whole_pool() {
        // A single holder owning everything outside the pool takes it all.
        let total = Amount::raw(1_000);
        let pool = Amount::raw(400);
        let balance = Amount::raw(600);
        assert_eq!(dividend_share(balance, pool, total), Amount::raw(400));
    }
}
