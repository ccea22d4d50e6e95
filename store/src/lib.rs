//! LMDB block store for the chrysos ledger.
//!
//! One environment holds every table. Readers run against consistent
//! snapshots; a single writer at a time performs each commit atomically.
//! All APIs are transaction-scoped: read methods take `&RoTxn`, write methods
//! `&mut RwTxn`, and the ledger wraps each `process`/`rollback` in one write
//! transaction so a failure never leaves partial state behind.

pub mod account;
pub mod block;
pub mod block_info;
pub mod checksum;
pub mod dividend;
pub mod error;
pub mod frontier;
pub mod iterator;
pub mod meta;
pub mod migration;
pub mod pending;
pub mod representation;
pub mod unchecked;
pub mod visitors;
pub mod vote;

pub use account::AccountInfo;
pub use block_info::{BlockInfo, BLOCK_INFO_MAX};
pub use dividend::DividendInfo;
pub use error::StoreError;
pub use migration::CURRENT_SCHEMA_VERSION;
pub use pending::{PendingInfo, PendingKey};

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use heed::types::Bytes;
use heed::{Database, DatabaseFlags, Env, EnvOpenOptions, RoTxn, RwTxn};

use chrysos_blocks::{Block, Vote};
use chrysos_types::{Account, BlockHash};

use unchecked::UncheckedCache;

const MAX_DBS: u32 = 24;
const DEFAULT_MAP_SIZE: usize = 128 * 1024 * 1024 * 1024;

/// How many blocks the in-memory unchecked cache holds before the oldest
/// entries are dropped.
const UNCHECKED_CACHE_MAX: usize = 16 * 1024;

/// The LMDB environment and every table handle.
pub struct Store {
    env: Env,
    pub(crate) frontiers: Database<Bytes, Bytes>,
    pub(crate) accounts_v0: Database<Bytes, Bytes>,
    pub(crate) accounts_v1: Database<Bytes, Bytes>,
    pub(crate) dividends_ledger: Database<Bytes, Bytes>,
    pub(crate) send_blocks: Database<Bytes, Bytes>,
    pub(crate) receive_blocks: Database<Bytes, Bytes>,
    pub(crate) open_blocks: Database<Bytes, Bytes>,
    pub(crate) change_blocks: Database<Bytes, Bytes>,
    pub(crate) state_blocks_v0: Database<Bytes, Bytes>,
    pub(crate) state_blocks_v1: Database<Bytes, Bytes>,
    pub(crate) dividend_blocks: Database<Bytes, Bytes>,
    pub(crate) claim_blocks: Database<Bytes, Bytes>,
    pub(crate) pending_v0: Database<Bytes, Bytes>,
    pub(crate) pending_v1: Database<Bytes, Bytes>,
    pub(crate) blocks_info: Database<Bytes, Bytes>,
    pub(crate) representation: Database<Bytes, Bytes>,
    pub(crate) unchecked: Database<Bytes, Bytes>,
    pub(crate) checksum: Database<Bytes, Bytes>,
    pub(crate) vote: Database<Bytes, Bytes>,
    pub(crate) meta: Database<Bytes, Bytes>,
    pub(crate) vote_cache: Mutex<HashMap<Account, Vote>>,
    pub(crate) unchecked_cache: Mutex<UncheckedCache>,
}

impl Store {
    /// Open or create the environment at `path`, running any pending schema
    /// migrations and initializing the node identity secret.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::open_with_map_size(path, DEFAULT_MAP_SIZE)
    }

    pub fn open_with_map_size(path: &Path, map_size: usize) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment directory is not opened twice within this
        // process; Store owns the only handle.
        let env = unsafe {
            EnvOpenOptions::new()
                .max_dbs(MAX_DBS)
                .map_size(map_size)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let store = Self {
            frontiers: env.create_database(&mut wtxn, Some("frontiers"))?,
            accounts_v0: env.create_database(&mut wtxn, Some("accounts_v0"))?,
            accounts_v1: env.create_database(&mut wtxn, Some("accounts_v1"))?,
            dividends_ledger: env.create_database(&mut wtxn, Some("dividends_ledger"))?,
            send_blocks: env.create_database(&mut wtxn, Some("send_blocks"))?,
            receive_blocks: env.create_database(&mut wtxn, Some("receive_blocks"))?,
            open_blocks: env.create_database(&mut wtxn, Some("open_blocks"))?,
            change_blocks: env.create_database(&mut wtxn, Some("change_blocks"))?,
            state_blocks_v0: env.create_database(&mut wtxn, Some("state_blocks_v0"))?,
            state_blocks_v1: env.create_database(&mut wtxn, Some("state_blocks_v1"))?,
            dividend_blocks: env.create_database(&mut wtxn, Some("dividend_blocks"))?,
            claim_blocks: env.create_database(&mut wtxn, Some("claim_blocks"))?,
            pending_v0: env.create_database(&mut wtxn, Some("pending_v0"))?,
            pending_v1: env.create_database(&mut wtxn, Some("pending_v1"))?,
            blocks_info: env.create_database(&mut wtxn, Some("blocks_info"))?,
            representation: env.create_database(&mut wtxn, Some("representation"))?,
            unchecked: env
                .database_options()
                .types::<Bytes, Bytes>()
                .name("unchecked")
                .flags(DatabaseFlags::DUP_SORT)
                .create(&mut wtxn)?,
            checksum: env.create_database(&mut wtxn, Some("checksum"))?,
            vote: env.create_database(&mut wtxn, Some("vote"))?,
            meta: env.create_database(&mut wtxn, Some("meta"))?,
            env: env.clone(),
            vote_cache: Mutex::new(HashMap::new()),
            unchecked_cache: Mutex::new(UncheckedCache::new(UNCHECKED_CACHE_MAX)),
        };

        store.do_upgrades(&mut wtxn)?;
        store.init_node_id(&mut wtxn)?;
        wtxn.commit()?;
        Ok(store)
    }

    pub fn begin_read(&self) -> Result<RoTxn<'_>, StoreError> {
        Ok(self.env.read_txn()?)
    }

    pub fn begin_write(&self) -> Result<RwTxn<'_>, StoreError> {
        Ok(self.env.write_txn()?)
    }

    /// Write both in-memory caches through to their tables.
    ///
    /// Invoked at commit points so cached votes and buffered blocks survive a
    /// restart.
    pub fn flush(&self, txn: &mut RwTxn<'_>) -> Result<(), StoreError> {
        let votes: Vec<Vote> = {
            let mut cache = self.vote_cache.lock().expect("vote cache poisoned");
            cache.drain().map(|(_, vote)| vote).collect()
        };
        for vote in votes {
            self.vote_put(txn, &vote)?;
        }

        let buffered: Vec<(BlockHash, Block)> = {
            let mut cache = self
                .unchecked_cache
                .lock()
                .expect("unchecked cache poisoned");
            cache.drain()
        };
        for (dependency, block) in buffered {
            self.unchecked_table_put(txn, &dependency, &block)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Store;

    /// A store in a scratch directory, small enough for unit tests.
    pub fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store =
            Store::open_with_map_size(dir.path(), 64 * 1024 * 1024).expect("failed to open store");
        (dir, store)
    }
}
