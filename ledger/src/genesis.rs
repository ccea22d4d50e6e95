//! Genesis blocks and per-network ledger constants.
//!
//! Each network's genesis is a legacy open block whose source is the genesis
//! account itself (the full-supply sentinel the amount walker recognizes).
//! The beta and dev seeds are published so those networks can be driven end
//! to end in tests and local clusters.

use heed::RwTxn;

use chrysos_blocks::{Block, OpenBlock};
use chrysos_crypto::KeyPair;
use chrysos_store::{AccountInfo, DividendInfo, Store, StoreError};
use chrysos_types::{
    seconds_since_epoch, Account, Amount, BlockHash, Checksum, Epoch, RawKey, DIVIDEND_BASE,
    GENESIS_AMOUNT,
};

/// Which chain this node participates in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkId {
    Live,
    Beta,
    Dev,
}

// Seeds of the per-network genesis, dividend, and epoch-signer accounts.
// Beta and dev are intentionally public; live key material was destroyed
// after the launch signing ceremony.
const LIVE_GENESIS_SEED: [u8; 32] = seed(0x4C, 1);
const BETA_GENESIS_SEED: [u8; 32] = seed(0x42, 1);
const DEV_GENESIS_SEED: [u8; 32] = seed(0x44, 1);
const LIVE_DIVIDEND_SEED: [u8; 32] = seed(0x4C, 2);
const BETA_DIVIDEND_SEED: [u8; 32] = seed(0x42, 2);
const DEV_DIVIDEND_SEED: [u8; 32] = seed(0x44, 2);
const LIVE_EPOCH_SEED: [u8; 32] = seed(0x4C, 3);
const BETA_EPOCH_SEED: [u8; 32] = seed(0x42, 3);
const DEV_EPOCH_SEED: [u8; 32] = seed(0x44, 3);

const fn seed(network: u8, role: u8) -> [u8; 32] {
    let mut bytes = [0x5Au8; 32];
    bytes[0] = network;
    bytes[1] = role;
    bytes
}

/// The genesis open block plus the distinguished accounts of a network.
pub struct Genesis {
    pub network: NetworkId,
    pub open: OpenBlock,
    pub account: Account,
    /// The only account allowed to issue dividend blocks.
    pub dividend_account: Account,
    /// Link value marking an epoch-upgrade state block.
    pub epoch_link: BlockHash,
    /// Signer of epoch-upgrade blocks.
    pub epoch_signer: Account,
}

impl Genesis {
    pub fn new(network: NetworkId) -> Self {
        let (genesis_seed, dividend_seed, epoch_seed) = match network {
            NetworkId::Live => (LIVE_GENESIS_SEED, LIVE_DIVIDEND_SEED, LIVE_EPOCH_SEED),
            NetworkId::Beta => (BETA_GENESIS_SEED, BETA_DIVIDEND_SEED, BETA_EPOCH_SEED),
            NetworkId::Dev => (DEV_GENESIS_SEED, DEV_DIVIDEND_SEED, DEV_EPOCH_SEED),
        };
        let keys = KeyPair::from_raw_key(RawKey::new(genesis_seed));
        let dividend_account = KeyPair::from_raw_key(RawKey::new(dividend_seed)).account;
        let epoch_signer = KeyPair::from_raw_key(RawKey::new(epoch_seed)).account;
        let mut epoch_link = [0x65u8; 32];
        epoch_link[..8].copy_from_slice(b"epoch v1");
        let open = OpenBlock::new(
            keys.account.into_hash(),
            keys.account,
            keys.account,
            DIVIDEND_BASE,
            &keys.raw_key,
            0,
        );
        Self {
            network,
            open,
            account: keys.account,
            dividend_account,
            epoch_link: BlockHash::new(epoch_link),
            epoch_signer,
        }
    }

    pub fn hash(&self) -> BlockHash {
        self.open.hash()
    }

    /// Key pair of the genesis account, available on the published networks.
    pub fn key_pair(&self) -> Option<KeyPair> {
        match self.network {
            NetworkId::Live => None,
            NetworkId::Beta => Some(KeyPair::from_raw_key(RawKey::new(BETA_GENESIS_SEED))),
            NetworkId::Dev => Some(KeyPair::from_raw_key(RawKey::new(DEV_GENESIS_SEED))),
        }
    }

    pub fn dividend_key_pair(&self) -> Option<KeyPair> {
        match self.network {
            NetworkId::Live => None,
            NetworkId::Beta => Some(KeyPair::from_raw_key(RawKey::new(BETA_DIVIDEND_SEED))),
            NetworkId::Dev => Some(KeyPair::from_raw_key(RawKey::new(DEV_DIVIDEND_SEED))),
        }
    }

    pub fn epoch_key_pair(&self) -> Option<KeyPair> {
        match self.network {
            NetworkId::Live => None,
            NetworkId::Beta => Some(KeyPair::from_raw_key(RawKey::new(BETA_EPOCH_SEED))),
            NetworkId::Dev => Some(KeyPair::from_raw_key(RawKey::new(DEV_EPOCH_SEED))),
        }
    }

    /// Seed an empty store: genesis block, account record, full-supply
    /// representation, frontier entry, and the dividend singleton.
    pub fn initialize(&self, store: &Store, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        let hash = self.hash();
        let block = Block::Open(self.open.clone());
        store.block_put(txn, &hash, &block, &BlockHash::ZERO, Epoch::Epoch0)?;
        store.account_put(
            txn,
            &self.account,
            &AccountInfo {
                head: hash,
                rep_block: hash,
                open_block: hash,
                dividend_block: DIVIDEND_BASE,
                balance: Amount::raw(GENESIS_AMOUNT),
                modified: seconds_since_epoch(),
                block_count: 1,
                epoch: Epoch::Epoch0,
            },
        )?;
        store.representation_put(txn, &hash, Amount::raw(GENESIS_AMOUNT))?;
        store.frontier_put(txn, &hash, &self.account)?;
        let mut checksum = Checksum::ZERO;
        checksum.toggle(&hash);
        store.checksum_put(txn, 0, 0, &checksum)?;
        store.dividend_put(txn, &DividendInfo::default())?;
        tracing::info!(network = ?self.network, genesis = %hash, "initialized ledger");
        Ok(())
    }
}
