//! Configuration for opening a database.
//!
//! Collapsed from this lineage's multi-database registry pattern down to
//! the single handle this store actually needs: a path, and whether to
//! create the file if it does not exist yet. See `DESIGN.md` for why the
//! rest of that registry (named handles, read-only mode, per-database
//! dirty tracking) was not carried forward.

use std::path::PathBuf;

/// Options for [`crate::Database::open`].
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the database file.
    pub path: PathBuf,
    /// Whether to create the database file if it doesn't exist.
    pub create_if_missing: bool,
}

impl DatabaseConfig {
    /// Creates a configuration for `path` with `create_if_missing` on.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DatabaseConfig {
            path: path.into(),
            create_if_missing: true,
        }
    }

    /// Sets whether to create the database file if it doesn't exist.
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_create_if_missing() {
        let config = DatabaseConfig::new("/tmp/example.db").create_if_missing(false);
        assert_eq!(config.path, PathBuf::from("/tmp/example.db"));
        assert!(!config.create_if_missing);
    }

    #[test]
    fn defaults_to_create_if_missing() {
        let config = DatabaseConfig::new("/tmp/example.db");
        assert!(config.create_if_missing);
    }
}
