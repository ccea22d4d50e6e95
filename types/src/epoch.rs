//! Epoch tags on accounts, pendings, and state blocks.

use serde::{Deserialize, Serialize};

/// Which schema epoch an entry belongs to.
///
/// Epoch upgrades migrate entries in place without rewriting the whole store;
/// `max` of the account's and the pending's epoch wins on receive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Epoch {
    Invalid = 0,
    Unspecified = 1,
    Epoch0 = 2,
    Epoch1 = 3,
}

impl Epoch {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Epoch::Invalid),
            1 => Some(Epoch::Unspecified),
            2 => Some(Epoch::Epoch0),
            3 => Some(Epoch::Epoch1),
            _ => None,
        }
    }
}

impl Default for Epoch {
    fn default() -> Self {
        Epoch::Epoch0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_round_trip() {
        for epoch in [Epoch::Invalid, Epoch::Unspecified, Epoch::Epoch0, Epoch::Epoch1] {
            assert_eq!(Epoch::from_u8(epoch.as_u8()), Some(epoch));
        }
        assert_eq!(Epoch::from_u8(9), None);
    }

    #[test]
    fn upgrade_ordering() {
        assert!(Epoch::Epoch1 > Epoch::Epoch0);
        assert_eq!(Epoch::Epoch0.max(Epoch::Epoch1), Epoch::Epoch1);
    }
}
