//! Block variants for the chrysos block-lattice.
//!
//! Seven concrete block types share a common shape: an ordered set of hashed
//! fields, a 64-byte signature over the BLAKE2b digest of those fields, and an
//! 8-byte proof-of-work nonce computed over the block's root. The legacy
//! variants (send, receive, open, change) survive only to validate
//! pre-upgrade chains; new blocks are state, dividend, or claim.

pub mod change;
pub mod claim;
pub mod dividend;
pub mod error;
pub mod open;
pub mod receive;
pub mod send;
pub mod state;
pub mod vote;
mod wire;

pub use change::{ChangeBlock, ChangeHashables};
pub use claim::{ClaimBlock, ClaimHashables};
pub use dividend::{DividendBlock, DividendHashables};
pub use error::BlockError;
pub use open::{OpenBlock, OpenHashables};
pub use receive::{ReceiveBlock, ReceiveHashables};
pub use send::{SendBlock, SendHashables};
pub use state::{StateBlock, StateHashables};
pub use vote::Vote;

use chrysos_types::{Account, Amount, BlockHash, Signature};

/// One-byte wire tag identifying a block variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum BlockType {
    Invalid = 0,
    NotABlock = 1,
    State = 2,
    Dividend = 3,
    Claim = 4,
    Send = 5,
    Receive = 6,
    Open = 7,
    Change = 8,
}

impl BlockType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(BlockType::Invalid),
            1 => Some(BlockType::NotABlock),
            2 => Some(BlockType::State),
            3 => Some(BlockType::Dividend),
            4 => Some(BlockType::Claim),
            5 => Some(BlockType::Send),
            6 => Some(BlockType::Receive),
            7 => Some(BlockType::Open),
            8 => Some(BlockType::Change),
            _ => None,
        }
    }

    /// Whether this is one of the pre-upgrade variants that populate the
    /// frontier index.
    pub fn is_legacy(self) -> bool {
        matches!(
            self,
            BlockType::Send | BlockType::Receive | BlockType::Open | BlockType::Change
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockType::Invalid => "invalid",
            BlockType::NotABlock => "not_a_block",
            BlockType::State => "state",
            BlockType::Dividend => "dividend",
            BlockType::Claim => "claim",
            BlockType::Send => "send",
            BlockType::Receive => "receive",
            BlockType::Open => "open",
            BlockType::Change => "change",
        }
    }

    /// Serialized payload size (hashables + signature + work), excluding the
    /// wire type tag.
    pub fn serialized_size(self) -> Option<usize> {
        match self {
            BlockType::Send => Some(SendBlock::SIZE),
            BlockType::Receive => Some(ReceiveBlock::SIZE),
            BlockType::Open => Some(OpenBlock::SIZE),
            BlockType::Change => Some(ChangeBlock::SIZE),
            BlockType::State => Some(StateBlock::SIZE),
            BlockType::Dividend => Some(DividendBlock::SIZE),
            BlockType::Claim => Some(ClaimBlock::SIZE),
            BlockType::Invalid | BlockType::NotABlock => None,
        }
    }
}

/// A block of any variant.
///
/// Dispatch is by exhaustive match; the accessors below follow the zero
/// convention of the wire format: a field a variant does not carry reads as
/// zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Send(SendBlock),
    Receive(ReceiveBlock),
    Open(OpenBlock),
    Change(ChangeBlock),
    State(StateBlock),
    Dividend(DividendBlock),
    Claim(ClaimBlock),
}

impl Block {
    pub fn block_type(&self) -> BlockType {
        match self {
            Block::Send(_) => BlockType::Send,
            Block::Receive(_) => BlockType::Receive,
            Block::Open(_) => BlockType::Open,
            Block::Change(_) => BlockType::Change,
            Block::State(_) => BlockType::State,
            Block::Dividend(_) => BlockType::Dividend,
            Block::Claim(_) => BlockType::Claim,
        }
    }

    /// Content digest of the hashed fields.
    pub fn hash(&self) -> BlockHash {
        match self {
            Block::Send(b) => b.hash(),
            Block::Receive(b) => b.hash(),
            Block::Open(b) => b.hash(),
            Block::Change(b) => b.hash(),
            Block::State(b) => b.hash(),
            Block::Dividend(b) => b.hash(),
            Block::Claim(b) => b.hash(),
        }
    }

    /// Previous block in the account's chain, zero for opening blocks.
    pub fn previous(&self) -> BlockHash {
        match self {
            Block::Send(b) => b.hashables.previous,
            Block::Receive(b) => b.hashables.previous,
            Block::Open(_) => BlockHash::ZERO,
            Block::Change(b) => b.hashables.previous,
            Block::State(b) => b.hashables.previous,
            Block::Dividend(b) => b.hashables.previous,
            Block::Claim(b) => b.hashables.previous,
        }
    }

    /// Source send hash for legacy receive/open blocks, zero otherwise.
    pub fn source(&self) -> BlockHash {
        match self {
            Block::Receive(b) => b.hashables.source,
            Block::Open(b) => b.hashables.source,
            _ => BlockHash::ZERO,
        }
    }

    /// The key proof-of-work is computed over and forks are detected against:
    /// previous for non-opening blocks, the account key for opening blocks.
    pub fn root(&self) -> BlockHash {
        match self {
            Block::Open(b) => b.hashables.account.into_hash(),
            Block::State(b) if b.hashables.previous.is_zero() => {
                b.hashables.account.into_hash()
            }
            other => other.previous(),
        }
    }

    /// Link field for state blocks, zero otherwise.
    pub fn link(&self) -> BlockHash {
        match self {
            Block::State(b) => b.hashables.link,
            _ => BlockHash::ZERO,
        }
    }

    /// The dividend-chain head observed when the block was signed.
    pub fn dividend(&self) -> BlockHash {
        match self {
            Block::Send(b) => b.hashables.dividend,
            Block::Receive(b) => b.hashables.dividend,
            Block::Open(b) => b.hashables.dividend,
            Block::Change(b) => b.hashables.dividend,
            Block::State(b) => b.hashables.dividend,
            Block::Dividend(b) => b.hashables.dividend,
            Block::Claim(b) => b.hashables.dividend,
        }
    }

    /// Representative named by this block; zero for variants that only carry
    /// their predecessor's delegation forward.
    pub fn representative(&self) -> Account {
        match self {
            Block::Send(_) | Block::Receive(_) => Account::ZERO,
            Block::Open(b) => b.hashables.representative,
            Block::Change(b) => b.hashables.representative,
            Block::State(b) => b.hashables.representative,
            Block::Dividend(b) => b.hashables.representative,
            Block::Claim(b) => b.hashables.representative,
        }
    }

    /// Owning account when the block names it; zero for legacy send, receive
    /// and change blocks, which are attributed through the frontier index.
    pub fn account(&self) -> Account {
        match self {
            Block::Send(_) | Block::Receive(_) | Block::Change(_) => Account::ZERO,
            Block::Open(b) => b.hashables.account,
            Block::State(b) => b.hashables.account,
            Block::Dividend(b) => b.hashables.account,
            Block::Claim(b) => b.hashables.account,
        }
    }

    /// Balance named by this block, if the variant carries one.
    pub fn balance(&self) -> Option<Amount> {
        match self {
            Block::Send(b) => Some(b.hashables.balance),
            Block::State(b) => Some(b.hashables.balance),
            Block::Dividend(b) => Some(b.hashables.balance),
            Block::Claim(b) => Some(b.hashables.balance),
            Block::Receive(_) | Block::Open(_) | Block::Change(_) => None,
        }
    }

    pub fn signature(&self) -> Signature {
        match self {
            Block::Send(b) => b.signature,
            Block::Receive(b) => b.signature,
            Block::Open(b) => b.signature,
            Block::Change(b) => b.signature,
            Block::State(b) => b.signature,
            Block::Dividend(b) => b.signature,
            Block::Claim(b) => b.signature,
        }
    }

    pub fn work(&self) -> u64 {
        match self {
            Block::Send(b) => b.work,
            Block::Receive(b) => b.work,
            Block::Open(b) => b.work,
            Block::Change(b) => b.work,
            Block::State(b) => b.work,
            Block::Dividend(b) => b.work,
            Block::Claim(b) => b.work,
        }
    }

    /// Whether this block's proof-of-work meets the network threshold.
    pub fn verify_work(&self) -> bool {
        chrysos_work::validate_work(&self.root(), self.work())
    }

    /// Whether this block may follow `previous` in a chain. Legacy variants
    /// refuse to sit on top of state-family blocks; the state family accepts
    /// any predecessor.
    pub fn valid_predecessor(&self, previous: &Block) -> bool {
        match self {
            Block::Send(_) | Block::Receive(_) | Block::Change(_) => {
                previous.block_type().is_legacy()
            }
            Block::Open(_) => false,
            Block::State(_) | Block::Dividend(_) | Block::Claim(_) => true,
        }
    }

    /// Serialize the payload without the wire type tag.
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Block::Send(b) => b.serialize(),
            Block::Receive(b) => b.serialize(),
            Block::Open(b) => b.serialize(),
            Block::Change(b) => b.serialize(),
            Block::State(b) => b.serialize(),
            Block::Dividend(b) => b.serialize(),
            Block::Claim(b) => b.serialize(),
        }
    }

    /// Textual (JSON) form mirroring the wire fields.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Block::Send(b) => b.to_json(),
            Block::Receive(b) => b.to_json(),
            Block::Open(b) => b.to_json(),
            Block::Change(b) => b.to_json(),
            Block::State(b) => b.to_json(),
            Block::Dividend(b) => b.to_json(),
            Block::Claim(b) => b.to_json(),
        }
    }
}

/// Serialize a block with its one-byte wire tag prefix.
pub fn serialize_block(block: &Block) -> Vec<u8> {
    let payload = block.serialize();
    let mut bytes = Vec::with_capacity(1 + payload.len());
    bytes.push(block.block_type().as_u8());
    bytes.extend_from_slice(&payload);
    bytes
}

/// Deserialize a tagged block.
pub fn deserialize_block(bytes: &[u8]) -> Result<Block, BlockError> {
    let (&tag, payload) = bytes.split_first().ok_or(BlockError::Truncated)?;
    let block_type = BlockType::from_u8(tag).ok_or(BlockError::UnknownType(tag))?;
    deserialize_block_of_type(block_type, payload)
}

/// Deserialize an untagged payload of a known variant.
pub fn deserialize_block_of_type(
    block_type: BlockType,
    payload: &[u8],
) -> Result<Block, BlockError> {
    match block_type {
        BlockType::Send => SendBlock::deserialize(payload).map(Block::Send),
        BlockType::Receive => ReceiveBlock::deserialize(payload).map(Block::Receive),
        BlockType::Open => OpenBlock::deserialize(payload).map(Block::Open),
        BlockType::Change => ChangeBlock::deserialize(payload).map(Block::Change),
        BlockType::State => StateBlock::deserialize(payload).map(Block::State),
        BlockType::Dividend => DividendBlock::deserialize(payload).map(Block::Dividend),
        BlockType::Claim => ClaimBlock::deserialize(payload).map(Block::Claim),
        BlockType::Invalid | BlockType::NotABlock => {
            Err(BlockError::UnknownType(block_type.as_u8()))
        }
    }
}
