//! Pager and page cache.
//!
//! `Table` owns the backing file, the allocated-page count `size` (the
//! distilled design's `N`), and a fixed-size slot table of resident pages.
//! It is a write-back cache with no eviction: a page, once materialized,
//! keeps a stable heap address for the lifetime of the `Table` (boxed so a
//! `&mut Page` handed out by `get` survives further `get` calls on other
//! indices), and is only written back on `flush`/`close`.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::page::{Page, MAX_PAGES, PAGE_SIZE};

/// The open database's pager state: file handle, allocated page count, and
/// the resident-page slot table. Concurrency is layered on top by
/// `Database`, which wraps a `Table` in a single mutex.
pub struct Table {
    file: File,
    /// Number of allocated pages — one past the highest page index ever
    /// materialized. Pages are append-only; this never shrinks.
    size: u32,
    pages: Box<[Option<Box<Page>>; MAX_PAGES as usize]>,
}

impl Table {
    /// Opens (creating if necessary) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        let len = file.seek(SeekFrom::End(0))?;
        if len % PAGE_SIZE as u64 != 0 {
            return Err(Error::Corrupt(format!(
                "file length {len} is not a whole number of {PAGE_SIZE}-byte pages"
            )));
        }
        let size = (len / PAGE_SIZE as u64) as u32;

        let mut table = Table {
            file,
            size,
            pages: Box::new(std::array::from_fn(|_| None)),
        };

        if table.size == 0 {
            log::debug!("pager: empty file, initializing page 0 as an empty leaf root");
            let root = table.get(0)?;
            root.is_root = true;
        }

        Ok(table)
    }

    /// Number of allocated pages (`N`).
    pub fn page_count(&self) -> u32 {
        self.size
    }

    /// Materializes page `idx`, reading it from disk on first access or
    /// leaving it as a fresh empty leaf if `idx` has never been allocated.
    /// Every subsequent call for the same `idx` returns the same buffer.
    pub fn get(&mut self, idx: u32) -> Result<&mut Page> {
        if idx >= MAX_PAGES {
            return Err(Error::TooManyPages {
                index: idx,
                max: MAX_PAGES,
            });
        }

        if self.pages[idx as usize].is_none() {
            let page = if idx < self.size {
                log::trace!("pager: loading page {idx} from disk");
                let mut buf = [0u8; PAGE_SIZE];
                self.file.seek(SeekFrom::Start(idx as u64 * PAGE_SIZE as u64))?;
                self.file.read_exact(&mut buf)?;
                Page::deserialize(&buf)?
            } else {
                log::trace!("pager: allocating fresh page {idx}");
                Page::new_leaf()
            };

            self.pages[idx as usize] = Some(Box::new(page));
            if idx >= self.size {
                self.size = idx + 1;
            }
        }

        Ok(self.pages[idx as usize].as_mut().unwrap())
    }

    /// Writes page `idx` back to its slot in the file, if resident.
    pub fn flush(&mut self, idx: u32) -> Result<()> {
        if let Some(page) = &self.pages[idx as usize] {
            log::debug!("pager: flushing page {idx}");
            let bytes = page.serialize()?;
            self.file.seek(SeekFrom::Start(idx as u64 * PAGE_SIZE as u64))?;
            self.file.write_all(&bytes)?;
        }
        Ok(())
    }

    /// Flushes every resident page, in index order, and consumes the
    /// `Table` (closing the file on drop). No further operation is legal
    /// against this database handle after this returns.
    pub fn close(mut self) -> Result<()> {
        for idx in 0..self.size {
            self.flush(idx)?;
        }
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn open_initializes_empty_leaf_root() {
        let temp = NamedTempFile::new().unwrap();
        let mut table = Table::open(temp.path()).unwrap();
        assert_eq!(table.page_count(), 1);
        let root = table.get(0).unwrap();
        assert!(root.is_root);
        assert!(root.is_leaf());
    }

    #[test]
    fn rejects_truncated_file() {
        let temp = NamedTempFile::new().unwrap();
        {
            let mut f = temp.reopen().unwrap();
            f.write_all(&[0u8; 10]).unwrap();
        }
        assert!(Table::open(temp.path()).is_err());
    }

    #[test]
    fn get_beyond_max_pages_is_fatal() {
        let temp = NamedTempFile::new().unwrap();
        let mut table = Table::open(temp.path()).unwrap();
        assert!(table.get(MAX_PAGES).is_err());
    }

    #[test]
    fn flush_then_reopen_preserves_page() {
        let temp = NamedTempFile::new().unwrap();
        let path = temp.path().to_path_buf();
        {
            let mut table = Table::open(&path).unwrap();
            let root = table.get(0).unwrap();
            root.records_mut().push(crate::page::Record {
                key: "k".into(),
                value: "v".into(),
            });
            table.close().unwrap();
        }
        let mut table = Table::open(&path).unwrap();
        let root = table.get(0).unwrap();
        assert_eq!(root.records().len(), 1);
    }
}
