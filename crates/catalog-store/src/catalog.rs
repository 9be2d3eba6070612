//! Shared catalog service.

use std::fs;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::STORE_TARGET;
use crate::errors::StoreError;
use crate::schema;
use crate::store::ItemStore;

/// Tuning applied to every connection opened by a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogOptions {
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
struct CatalogInner {
    path: Utf8PathBuf,
    options: CatalogOptions,
    write_gate: Mutex<()>,
}

/// Handle to one catalog database, cheap to clone and share across threads.
///
/// Every [`ItemStore`] opened through the same `Catalog` (or any clone of it)
/// takes the same write gate, so in-process writers never contend on SQLite
/// locks. Writers in other processes are held off by SQLite itself, bounded by
/// the busy timeout.
#[derive(Debug, Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

impl Catalog {
    /// Opens the catalog at `path`, creating the file, its parent directory
    /// and the schema when missing, and switching the database to WAL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CreateDirectory`] when the parent directory
    /// cannot be created and [`StoreError::Open`] when SQLite cannot open or
    /// initialise the file.
    pub fn open(path: impl AsRef<Utf8Path>, options: CatalogOptions) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        ensure_parent(&path)?;

        let conn = connect(&path, options)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .and_then(|()| schema::create(&conn))
            .map_err(|source| StoreError::open(path.clone(), source))?;
        if let Err((_, source)) = conn.close() {
            return Err(StoreError::Close(source));
        }

        info!(target: STORE_TARGET, path = %path, "catalog opened");
        Ok(Self {
            inner: Arc::new(CatalogInner {
                path,
                options,
                write_gate: Mutex::new(()),
            }),
        })
    }

    /// Opens a new store handle with its own connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] when the connection cannot be opened or
    /// configured.
    pub fn store(&self) -> Result<ItemStore, StoreError> {
        let conn = connect(&self.inner.path, self.inner.options)?;
        debug!(target: STORE_TARGET, path = %self.inner.path, "store handle opened");
        Ok(ItemStore::new(conn, self.clone()))
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.inner.path
    }

    pub(crate) fn write_gate(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.inner
            .write_gate
            .lock()
            .map_err(|_| StoreError::WriteGatePoisoned)
    }
}

fn ensure_parent(path: &Utf8Path) -> Result<(), StoreError> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) else {
        return Ok(());
    };
    fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirectory {
        path: parent.to_path_buf(),
        source,
    })
}

fn connect(path: &Utf8Path, options: CatalogOptions) -> Result<Connection, StoreError> {
    let conn = Connection::open(path).map_err(|source| StoreError::open(path, source))?;
    conn.busy_timeout(options.busy_timeout)
        .and_then(|()| conn.pragma_update(None, "synchronous", "NORMAL"))
        .map_err(|source| StoreError::open(path, source))?;
    Ok(conn)
}
