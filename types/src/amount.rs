//! 128-bit balance amounts.
//!
//! Amounts are raw integer units; the SI ratios below define the human-facing
//! denominations. All wire and database encodings are big-endian.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// SI dividers.
pub const GCHR_RATIO: u128 = 10_000_000_000_000_000_000_000_000_000_000_000; // 10^34
pub const MCHR_RATIO: u128 = 10_000_000_000_000_000_000_000_000_000_000; // 10^31
pub const KCHR_RATIO: u128 = 10_000_000_000_000_000_000_000_000_000; // 10^28
pub const CHR_RATIO: u128 = 10_000_000_000_000_000_000_000_000; // 10^25
pub const MILLICHR_RATIO: u128 = 10_000_000_000_000_000_000_000; // 10^22
pub const UCHR_RATIO: u128 = 10_000_000_000_000_000_000; // 10^19

/// Smallest pool a dividend block may distribute.
pub const MINIMUM_DIVIDEND_AMOUNT: u128 = MCHR_RATIO;

/// A 128-bit balance or balance delta, in raw units.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u128::MAX);

    pub fn raw(value: u128) -> Self {
        Self(value)
    }

    pub fn number(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn to_be_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 16]) -> Self {
        Self(u128::from_be_bytes(bytes))
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn wrapping_add(self, other: Self) -> Self {
        Self(self.0.wrapping_add(other.0))
    }

    pub fn wrapping_sub(self, other: Self) -> Self {
        Self(self.0.wrapping_sub(other.0))
    }

    /// Absolute difference, used to classify state blocks by balance delta.
    pub fn abs_diff(self, other: Self) -> Self {
        Self(self.0.abs_diff(other.0))
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn be_bytes_round_trip() {
        let amount = Amount::raw(0x0102_0304_0506_0708_090A_0B0C_0D0E_0F10);
        assert_eq!(Amount::from_be_bytes(amount.to_be_bytes()), amount);
        assert_eq!(amount.to_be_bytes()[0], 0x01);
    }

    #[test]
    fn checked_sub_underflow() {
        assert!(Amount::raw(1).checked_sub(Amount::raw(2)).is_none());
        assert_eq!(
            Amount::raw(2).checked_sub(Amount::raw(1)),
            Some(Amount::raw(1))
        );
    }

    #[test]
    fn abs_diff_symmetric() {
        let a = Amount::raw(100);
        let b = Amount::raw(30);
        assert_eq!(a.abs_diff(b), Amount::raw(70));
        assert_eq!(b.abs_diff(a), Amount::raw(70));
    }

    #[test]
    fn ratios_are_ordered() {
        assert!(GCHR_RATIO > MCHR_RATIO);
        assert!(MCHR_RATIO > KCHR_RATIO);
        assert!(KCHR_RATIO > CHR_RATIO);
        assert_eq!(MINIMUM_DIVIDEND_AMOUNT, MCHR_RATIO);
    }
}
