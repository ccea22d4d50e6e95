use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error("unknown block type tag {0}")]
    UnknownType(u8),

    #[error("serialized block is truncated")]
    Truncated,

    #[error("trailing bytes after block payload")]
    TrailingBytes,

    #[error("malformed field {field}: {reason}")]
    MalformedField {
        field: &'static str,
        reason: String,
    },
}
