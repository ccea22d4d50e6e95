//! Property checks for the dividend share rule across the full balance
//! range.
//!
//! Inputs model a consistent supply: the claimant's balance is part of the
//! circulating supply outside the pool, so `total = balance + slack + pool`.

use chrysos_ledger::dividend::dividend_share;
use chrysos_types::Amount;
use primitive_types::U256;
use proptest::prelude::*;

const QUARTER: u128 = u128::MAX / 4;

proptest! {
    /// The share never exceeds the pool.
    #[test]
    fn share_is_bounded_by_pool(
        balance in 0u128..QUARTER,
        pool in 1u128..QUARTER,
        slack in 0u128..QUARTER,
    ) {
        let total = balance + pool + slack;
        let share = dividend_share(Amount::raw(balance), Amount::raw(pool), Amount::raw(total));
        prop_assert!(share.number() <= pool);
    }

    /// Truncation matches the 256-bit integer quotient exactly.
    #[test]
    fn share_matches_wide_integer_division(
        balance in 0u128..QUARTER,
        pool in 1u128..QUARTER,
        slack in 1u128..QUARTER,
    ) {
        let total = balance + pool + slack;
        let expected = U256::from(balance) * U256::from(pool)
            / (U256::from(total) - U256::from(pool));
        let share = dividend_share(Amount::raw(balance), Amount::raw(pool), Amount::raw(total));
        prop_assert_eq!(U256::from(share.number()), expected);
    }

    /// Shares are monotone in the claimant's balance.
    #[test]
    fn share_is_monotone_in_balance(
        balance in 0u128..QUARTER / 2,
        extra in 0u128..QUARTER / 2,
        pool in 1u128..QUARTER,
        slack in 0u128..QUARTER,
    ) {
        let total = balance + extra + pool + slack;
        let small = dividend_share(Amount::raw(balance), Amount::raw(pool), Amount::raw(total));
        let large = dividend_share(
            Amount::raw(balance + extra),
            Amount::raw(pool),
            Amount::raw(total),
        );
        prop_assert!(large >= small);
    }
}
