//! Cursor over a fixed-width big-endian block payload.

use chrysos_types::{Account, Amount, BlockHash, Signature};

use crate::BlockError;

pub(crate) struct WireReader<'a> {
    bytes: &'a [u8],
}

impl<'a> WireReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], BlockError> {
        if self.bytes.len() < len {
            return Err(BlockError::Truncated);
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    pub fn hash(&mut self) -> Result<BlockHash, BlockError> {
        Ok(BlockHash::from_slice(self.take(32)?).expect("length checked"))
    }

    pub fn account(&mut self) -> Result<Account, BlockError> {
        Ok(Account::from_slice(self.take(32)?).expect("length checked"))
    }

    pub fn amount(&mut self) -> Result<Amount, BlockError> {
        let bytes: [u8; 16] = self.take(16)?.try_into().expect("length checked");
        Ok(Amount::from_be_bytes(bytes))
    }

    pub fn signature(&mut self) -> Result<Signature, BlockError> {
        Ok(Signature::from_slice(self.take(64)?).expect("length checked"))
    }

    pub fn work_le(&mut self) -> Result<u64, BlockError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().expect("length checked");
        Ok(u64::from_le_bytes(bytes))
    }

    pub fn work_be(&mut self) -> Result<u64, BlockError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().expect("length checked");
        Ok(u64::from_be_bytes(bytes))
    }

    pub fn finish(self) -> Result<(), BlockError> {
        if self.bytes.is_empty() {
            Ok(())
        } else {
            Err(BlockError::TrailingBytes)
        }
    }
}

/// Pull a string field out of a JSON block representation.
pub(crate) fn json_str<'a>(
    value: &'a serde_json::Value,
    field: &'static str,
) -> Result<&'a str, BlockError> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or(BlockError::MalformedField {
            field,
            reason: "missing or not a string".to_string(),
        })
}

pub(crate) fn json_hash(
    value: &serde_json::Value,
    field: &'static str,
) -> Result<BlockHash, BlockError> {
    json_str(value, field)?
        .parse()
        .map_err(|e: hex::FromHexError| BlockError::MalformedField {
            field,
            reason: e.to_string(),
        })
}

pub(crate) fn json_account(
    value: &serde_json::Value,
    field: &'static str,
) -> Result<Account, BlockError> {
    Account::decode(json_str(value, field)?).map_err(|e| BlockError::MalformedField {
        field,
        reason: e.to_string(),
    })
}

/// Balances appear as 32-digit hex in the legacy and dividend forms.
pub(crate) fn json_amount_hex(
    value: &serde_json::Value,
    field: &'static str,
) -> Result<Amount, BlockError> {
    let text = json_str(value, field)?;
    let mut bytes = [0u8; 16];
    hex::decode_to_slice(text, &mut bytes).map_err(|e| BlockError::MalformedField {
        field,
        reason: e.to_string(),
    })?;
    Ok(Amount::from_be_bytes(bytes))
}

/// State blocks carry their balance in decimal.
pub(crate) fn json_amount_dec(
    value: &serde_json::Value,
    field: &'static str,
) -> Result<Amount, BlockError> {
    json_str(value, field)?
        .parse::<u128>()
        .map(Amount::raw)
        .map_err(|e| BlockError::MalformedField {
            field,
            reason: e.to_string(),
        })
}

pub(crate) fn json_signature(
    value: &serde_json::Value,
    field: &'static str,
) -> Result<Signature, BlockError> {
    let text = json_str(value, field)?;
    let mut bytes = [0u8; 64];
    hex::decode_to_slice(text, &mut bytes).map_err(|e| BlockError::MalformedField {
        field,
        reason: e.to_string(),
    })?;
    Ok(Signature::new(bytes))
}

pub(crate) fn json_work(
    value: &serde_json::Value,
    field: &'static str,
) -> Result<u64, BlockError> {
    u64::from_str_radix(json_str(value, field)?, 16).map_err(|e| BlockError::MalformedField {
        field,
        reason: e.to_string(),
    })
}
