//! Account keys and their `chr_` textual encoding.
//!
//! An account is a 256-bit Ed25519 public key. The textual form is
//! `chr_` followed by 60 base-32 characters: 52 encoding the key (with four
//! leading pad bits) and 8 encoding a 5-byte BLAKE2b checksum of the key.
//! The alphabet omits visually ambiguous characters.

use blake2::digest::{Update, VariableOutput};
use blake2::Blake2bVar;
use primitive_types::U512;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::BlockHash;

const PREFIX: &str = "chr_";
const ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";
const ENCODED_LEN: usize = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountDecodeError {
    #[error("account must start with {PREFIX}")]
    BadPrefix,
    #[error("account body must be {ENCODED_LEN} characters, got {0}")]
    BadLength(usize),
    #[error("invalid base-32 character {0:?}")]
    BadCharacter(char),
    #[error("checksum mismatch")]
    BadChecksum,
}

/// A 256-bit public key identifying an account chain.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Account(pub [u8; 32]);

impl Account {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The account key reinterpreted as a hash, for root and link comparisons.
    pub fn into_hash(self) -> BlockHash {
        BlockHash::new(self.0)
    }

    /// Encode to the `chr_` textual form.
    pub fn encode(&self) -> String {
        let check = account_checksum(&self.0);
        // 296 bits total: key (256) above the 40-bit checksum.
        let mut number = U512::from_big_endian(&self.0) << 40usize;
        number = number | U512::from(u64::from_le_bytes(padded(&check)));
        let mut chars = [0u8; ENCODED_LEN];
        for slot in chars.iter_mut().rev() {
            *slot = ALPHABET[(number.low_u64() & 0x1f) as usize];
            number = number >> 5usize;
        }
        let mut result = String::with_capacity(PREFIX.len() + ENCODED_LEN);
        result.push_str(PREFIX);
        result.push_str(std::str::from_utf8(&chars).expect("alphabet is ascii"));
        result
    }

    /// Decode the `chr_` textual form, rejecting checksum mismatches.
    pub fn decode(text: &str) -> Result<Self, AccountDecodeError> {
        let body = text
            .strip_prefix(PREFIX)
            .ok_or(AccountDecodeError::BadPrefix)?;
        if body.len() != ENCODED_LEN {
            return Err(AccountDecodeError::BadLength(body.len()));
        }
        let mut number = U512::zero();
        for ch in body.chars() {
            let value = decode_char(ch).ok_or(AccountDecodeError::BadCharacter(ch))?;
            number = (number << 5usize) | U512::from(value);
        }
        // 60 characters carry 300 bits; the top four must be padding.
        if !(number >> 296usize).is_zero() {
            return Err(AccountDecodeError::BadChecksum);
        }
        let check = (number.low_u64() & 0xff_ffff_ffff).to_le_bytes();
        let key_bits = number >> 40usize;
        let mut wide = [0u8; 64];
        key_bits.to_big_endian(&mut wide);
        let mut key = [0u8; 32];
        key.copy_from_slice(&wide[32..]);
        if account_checksum(&key) != check[..5] {
            return Err(AccountDecodeError::BadChecksum);
        }
        Ok(Self(key))
    }
}

/// 5-byte BLAKE2b of the key.
fn account_checksum(key: &[u8; 32]) -> [u8; 5] {
    let mut hasher = Blake2bVar::new(5).expect("5 is a valid blake2b length");
    hasher.update(key);
    let mut digest = [0u8; 5];
    hasher
        .finalize_variable(&mut digest)
        .expect("output length matches");
    digest
}

fn padded(check: &[u8; 5]) -> [u8; 8] {
    let mut bytes = [0u8; 8];
    bytes[..5].copy_from_slice(check);
    bytes
}

fn decode_char(ch: char) -> Option<u64> {
    ALPHABET.iter().position(|&a| a == ch as u8).map(|p| p as u64)
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account({}…)", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Account {
    type Err = AccountDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let account = Account::new([0x42; 32]);
        let text = account.encode();
        assert!(text.starts_with("chr_"));
        assert_eq!(text.len(), 4 + 60);
        assert_eq!(Account::decode(&text).unwrap(), account);
    }

    #[test]
    fn zero_account_round_trip() {
        let text = Account::ZERO.encode();
        assert_eq!(Account::decode(&text).unwrap(), Account::ZERO);
    }

    #[test]
    fn decode_rejects_bad_prefix() {
        let text = Account::new([1; 32]).encode().replace("chr_", "xrb_");
        assert_eq!(Account::decode(&text), Err(AccountDecodeError::BadPrefix));
    }

    #[test]
    fn decode_rejects_flipped_checksum() {
        let mut text = Account::new([7; 32]).encode();
        // Flip the final checksum character to a different alphabet member.
        let last = text.pop().unwrap();
        text.push(if last == '1' { '3' } else { '1' });
        assert_eq!(Account::decode(&text), Err(AccountDecodeError::BadChecksum));
    }

    #[test]
    fn decode_rejects_bad_length() {
        assert!(matches!(
            Account::decode("chr_12345"),
            Err(AccountDecodeError::BadLength(5))
        ));
    }

    #[test]
    fn decode_rejects_invalid_character() {
        let mut text = Account::new([9; 32]).encode();
        text.pop();
        text.push('0'); // '0' is not in the alphabet
        assert_eq!(
            Account::decode(&text),
            Err(AccountDecodeError::BadCharacter('0'))
        );
    }

    #[test]
    fn distinct_keys_encode_distinct() {
        assert_ne!(Account::new([1; 32]).encode(), Account::new([2; 32]).encode());
    }
}
