//! Typed error taxonomy for the B+-tree store.
//!
//! Every fallible operation in this crate returns `Result<T, Error>` instead
//! of terminating the process, even where the on-disk format this crate
//! implements was originally specified as "fatal" on these conditions. Only
//! the demo REPL binary (`src/bin/btreedb_repl.rs`) converts an `Err` into a
//! process exit.

use thiserror::Error;

use crate::page::{KEY_LEN, VALUE_LEN};

/// Errors produced by database operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Key exceeds the fixed-size key slot (`KEY_LEN` bytes).
    #[error("key is too long: {len} bytes (max {max})", max = KEY_LEN)]
    KeyTooLong { len: usize },

    /// Value exceeds the fixed-size value slot (`VALUE_LEN` bytes).
    #[error("value is too long: {len} bytes (max {max})", max = VALUE_LEN)]
    ValueTooLong { len: usize },

    /// The page slot table (`MAX_PAGES` entries) has no room for another page.
    #[error("page index {index} exceeds the {max}-page limit for one database")]
    TooManyPages { index: u32, max: u32 },

    /// The backing file is structurally invalid.
    #[error("database file is corrupt: {0}")]
    Corrupt(String),

    /// Underlying I/O failure (open, seek, read, write, close).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
