//! Explicitly owned, lazily opened connection.
//!
//! # Responsibility
//! - Open the configured database on first use and reuse it afterwards.
//! - Close it on `release()`; the next use reopens it.
//!
//! # Invariants
//! - At most one connection is open per handle.
//! - Access is serialized by an internal mutex; callers never hold the
//!   connection across calls.
//! - Releasing an in-memory handle discards its data.

use super::{open_db, open_db_in_memory, DbError};
use log::info;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Where the handle opens its connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    File(PathBuf),
    Memory,
}

impl DbTarget {
    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

#[derive(Debug)]
pub struct ConnectionHandle {
    target: DbTarget,
    conn: Mutex<Option<Connection>>,
}

impl ConnectionHandle {
    /// Creates a closed handle; nothing is opened until first use.
    pub fn new(target: DbTarget) -> Self {
        Self {
            target,
            conn: Mutex::new(None),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(DbTarget::File(path.into()))
    }

    pub fn in_memory() -> Self {
        Self::new(DbTarget::Memory)
    }

    pub fn target(&self) -> &DbTarget {
        &self.target
    }

    pub fn is_open(&self) -> bool {
        self.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    /// Runs `f` with the connection, opening and migrating it on first use.
    ///
    /// # Errors
    /// - Open/migration failures and a poisoned handle surface as `DbError`.
    pub fn with_connection<T, E>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let mut guard = self.lock()?;
        if guard.is_none() {
            let conn = match &self.target {
                DbTarget::File(path) => open_db(path)?,
                DbTarget::Memory => open_db_in_memory()?,
            };
            info!(
                "event=db_handle_acquire module=db status=ok mode={}",
                self.target.mode()
            );
            *guard = Some(conn);
        }

        match guard.as_mut() {
            Some(conn) => f(conn),
            None => Err(DbError::HandlePoisoned.into()),
        }
    }

    /// Closes the connection if open; returns whether one was closed.
    pub fn release(&self) -> Result<bool, DbError> {
        let mut guard = self.lock()?;
        let released = guard.take().is_some();
        if released {
            info!(
                "event=db_handle_release module=db status=ok mode={}",
                self.target.mode()
            );
        }
        Ok(released)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>, DbError> {
        self.conn.lock().map_err(|_| DbError::HandlePoisoned)
    }
}
