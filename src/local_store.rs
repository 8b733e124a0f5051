//! LMDB-backed key-value store.
//!
//! One environment per app instance, created as a `<name>.lmdb`
//! directory, holding the handful of string keys the core persists:
//! device identifier, score, history list and the cached fallback
//! leaderboard. Values are UTF-8 strings (JSON for the list-shaped
//! ones).

use std::fs;
use std::path::Path;

use lmdb::{Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{info, warn};

use crate::app_response::AppResponse;

/// Upper bound for the memory map. History stores thumbnail URIs, not
/// image data, so this is generous.
const MAP_SIZE: usize = 64 * 1024 * 1024;

pub struct LocalStore {
    env: Environment,
    db: Database,
    dir: String,
}

impl LocalStore {
    /// Opens (creating if needed) the store directory `<name>.lmdb`.
    pub fn init(name: &str) -> Result<Self, AppResponse> {
        let dir = format!("{name}.lmdb");

        fs::create_dir_all(&dir).map_err(|e| {
            AppResponse::DatabaseError(format!("Cannot create store directory {dir}: {e}"))
        })?;

        let env = Environment::new()
            .set_map_size(MAP_SIZE)
            .open(Path::new(&dir))?;
        let db = env.create_db(None, DatabaseFlags::empty())?;

        info!("Store opened at {dir}");
        Ok(Self { env, db, dir })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, AppResponse> {
        let txn = self.env.begin_ro_txn()?;
        let value = match txn.get(self.db, &key) {
            Ok(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        Ok(value)
    }

    pub fn put(&self, key: &str, value: &str) -> Result<(), AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.db, &key, &value, WriteFlags::empty())?;
        txn.commit()?;
        Ok(())
    }

    /// Removes a key. Returns `false` (not an error) when the key was
    /// absent.
    pub fn remove(&self, key: &str) -> Result<bool, AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        match txn.del(self.db, &key, None) {
            Ok(()) => {
                txn.commit()?;
                Ok(true)
            }
            Err(lmdb::Error::NotFound) => {
                txn.abort();
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read-modify-write of one key inside a single write transaction.
    ///
    /// LMDB allows one writer at a time, so overlapping `update` calls
    /// on the same key serialize instead of clobbering each other. The
    /// closure receives the current value and returns the new one;
    /// `None` deletes the key. Returns the value that was written.
    pub fn update<F>(&self, key: &str, f: F) -> Result<Option<String>, AppResponse>
    where
        F: FnOnce(Option<&str>) -> Option<String>,
    {
        let mut txn = self.env.begin_rw_txn()?;

        let current = match txn.get(self.db, &key) {
            Ok(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let next = f(current.as_deref());
        match &next {
            Some(value) => txn.put(self.db, &key, value, WriteFlags::empty())?,
            None => {
                if current.is_some() {
                    txn.del(self.db, &key, None)?;
                }
            }
        }
        txn.commit()?;
        Ok(next)
    }

    /// Drops every key while keeping the environment usable.
    pub fn clear_all(&self) -> Result<(), AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.clear_db(self.db)?;
        txn.commit()?;
        Ok(())
    }

    /// Forces outstanding pages to disk. The environment itself closes
    /// when the store is dropped; this is the explicit flush used by
    /// `close_app` so the shell can tear down at a known-durable point.
    pub fn close(&self) -> Result<(), AppResponse> {
        if let Err(e) = self.env.sync(true) {
            warn!("Sync on close failed for {}: {:?}", self.dir, e);
            return Err(e.into());
        }
        info!("Store at {} synced and ready to close", self.dir);
        Ok(())
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }
}
