//! Relational handle for one named easyenv store.
//!
//! # Responsibility
//! - Own the primary SQLite connection of a store.
//! - Open additional worker connections against the same file.
//!
//! # Invariants
//! - Every connection handed out has migrations applied.
//! - `StoreOpener` carries no connection state and is safe to share across
//!   threads.

use super::{open_db_with_timeout, DbError, DbResult};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Opened store: file location plus its primary connection.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    busy_timeout: Duration,
    conn: Connection,
}

/// Thread-safe recipe for opening worker connections to a store.
#[derive(Debug, Clone)]
pub struct StoreOpener {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Store {
    /// Opens (or creates) the store file and applies pending migrations.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = open_db_with_timeout(&path, busy_timeout)?;
        Ok(Self {
            path,
            busy_timeout,
            conn,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Returns an opener for worker connections to this store.
    pub fn opener(&self) -> StoreOpener {
        StoreOpener {
            path: self.path.clone(),
            busy_timeout: self.busy_timeout,
        }
    }

    /// Closes the primary connection and surfaces any close failure.
    pub fn close(self) -> DbResult<()> {
        self.conn.close().map_err(|(_, err)| DbError::Sqlite(err))
    }
}

impl StoreOpener {
    /// Opens a fresh connection to the store file.
    pub fn open(&self) -> DbResult<Connection> {
        open_db_with_timeout(&self.path, self.busy_timeout)
    }
}
