//! Embedded, single-file key-value store backed by a disk-resident
//! B+-tree. A process opens a database by path, performs point lookups and
//! upserts of short string keys and values, and closes it to flush state
//! durably. This crate is a library; deletion, range scans, and
//! crash-consistent journaling are explicit non-goals (see `DESIGN.md`).

pub mod btree;
pub mod concurrency;
pub mod cursor;
pub mod error;
pub mod manager;
pub mod page;
pub mod pager;

pub use concurrency::Database;
pub use error::{Error, Result};
pub use manager::DatabaseConfig;
