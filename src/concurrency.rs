//! Concurrency shell: one mutex per open database guards every public
//! operation, serializing concurrent callers end to end. There is no
//! internal parallelism and no page-level latching — a redesign could use
//! reader/writer or per-page locks for scalability, but that is explicitly
//! out of scope here (see `DESIGN.md`).

use std::path::Path;
use std::sync::Mutex;

use crate::btree;
use crate::error::{Error, Result};
use crate::manager::DatabaseConfig;
use crate::page::{validate_key, validate_value};
use crate::pager::Table;

/// A single open database. Every `set`/`get`/`test_print` call locks the
/// whole tree for its duration, so two concurrent `set`s always serialize.
pub struct Database {
    table: Mutex<Table>,
}

impl Database {
    /// Opens (or creates) a database per `config`.
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        if !config.create_if_missing && !config.path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("database file not found: {}", config.path.display()),
            )));
        }
        log::debug!("database: opening {}", config.path.display());
        let table = Table::open(&config.path)?;
        Ok(Database {
            table: Mutex::new(table),
        })
    }

    /// Opens (creating if necessary) the database file at `path`.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(DatabaseConfig::new(path.as_ref()))
    }

    /// Inserts or overwrites `key`. Validates argument lengths before
    /// taking the lock.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        validate_value(value)?;
        let mut table = self.table.lock().unwrap();
        btree::set(&mut table, key, value)
    }

    /// Looks up `key`, returning an owned copy of its value.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let mut table = self.table.lock().unwrap();
        btree::get(&mut table, key)
    }

    /// Recursively prints the tree structure. Test/diagnostic use only.
    pub fn test_print(&self) -> Result<String> {
        let mut table = self.table.lock().unwrap();
        btree::dump(&mut table)
    }

    /// Flushes every resident page and closes the file. No further
    /// operation is legal against this handle afterward — enforced by
    /// `close` taking `self` by value.
    pub fn close(self) -> Result<()> {
        let table = self.table.into_inner().unwrap();
        table.close()
    }
}
