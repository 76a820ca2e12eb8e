//! Connection provisioning for repository operations.
//!
//! # Responsibility
//! - Define the "acquire a usable connection" contract consumed by repositories.
//! - Provide file-backed and shared single-connection implementations.
//!
//! # Invariants
//! - A `ConnectionHandle` is released when dropped, on success and on error paths.
//! - Every handed-out connection has `foreign_keys=ON` and a migrated schema.
//! - Providers never retry; acquisition failures surface as `DbError`.

use super::open::{configure_connection, open_db, open_db_in_memory};
use super::DbResult;
use log::debug;
use rusqlite::{Connection, OpenFlags};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Source of connections for repository operations.
///
/// Implementations decide how connections are created or shared. Callers hold
/// the returned handle only for the duration of one operation.
pub trait ConnectionProvider {
    fn acquire(&self) -> DbResult<ConnectionHandle<'_>>;
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for &P {
    fn acquire(&self) -> DbResult<ConnectionHandle<'_>> {
        (**self).acquire()
    }
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for Arc<P> {
    fn acquire(&self) -> DbResult<ConnectionHandle<'_>> {
        (**self).acquire()
    }
}

/// Scoped connection guard returned by [`ConnectionProvider::acquire`].
///
/// Owned connections are closed on drop; shared connections are unlocked.
pub enum ConnectionHandle<'a> {
    Owned(Connection),
    Shared(MutexGuard<'a, Connection>),
}

impl Deref for ConnectionHandle<'_> {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Owned(conn) => conn,
            Self::Shared(guard) => &**guard,
        }
    }
}

/// Opens a fresh connection to one database file per acquisition.
///
/// Migrations run once in [`FileConnectionProvider::open`], which also creates
/// the file. Later acquisitions only apply connection pragmas and fail with
/// `SQLITE_CANTOPEN` when the file has been removed.
#[derive(Debug, Clone)]
pub struct FileConnectionProvider {
    path: PathBuf,
}

impl FileConnectionProvider {
    /// Bootstraps the database at `path` and returns a provider for it.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        drop(open_db(&path)?);
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConnectionProvider for FileConnectionProvider {
    fn acquire(&self) -> DbResult<ConnectionHandle<'_>> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        configure_connection(&conn)?;
        debug!("event=db_acquire module=db status=ok mode=file");
        Ok(ConnectionHandle::Owned(conn))
    }
}

/// Serializes access to one long-lived connection.
///
/// Required for in-memory databases, where every new connection would see an
/// empty database.
#[derive(Debug)]
pub struct SharedConnectionProvider {
    conn: Mutex<Connection>,
}

impl SharedConnectionProvider {
    /// Wraps an already bootstrapped connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens and migrates a private in-memory database.
    pub fn in_memory() -> DbResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }
}

impl ConnectionProvider for SharedConnectionProvider {
    fn acquire(&self) -> DbResult<ConnectionHandle<'_>> {
        // Statements are atomic, so a poisoned lock still guards a usable connection.
        let guard = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(ConnectionHandle::Shared(guard))
    }
}
