//! Cursor and search.
//!
//! A cursor names a leaf position: `(page_idx, cell_idx, found)`. `find`
//! descends from the root, binary-searching each node along the way.
//! There is no `next`/`prev`/range-scan support here — iteration and range
//! queries are not part of this store (§1 non-goals); the cursor exists
//! solely to locate the leaf position `get` and `set` act on.

use std::cmp::Ordering;

use crate::error::Result;
use crate::page::{NodeKind, Page};
use crate::pager::Table;

/// A located leaf position.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub page_idx: u32,
    /// Index into the leaf's record array. May equal the leaf's size,
    /// meaning "insert past the last record".
    pub cell_idx: usize,
    pub found: bool,
}

/// Descends from the root to locate `key`, materializing pages as needed.
pub fn find(table: &mut Table, key: &str) -> Result<Cursor> {
    find_from(table, 0, key)
}

fn find_from(table: &mut Table, page_idx: u32, key: &str) -> Result<Cursor> {
    let page = table.get(page_idx)?;
    if page.is_leaf() {
        return Ok(leaf_find(page, page_idx, key));
    }
    let child_slot = internal_find_child(page, key);
    let child_idx = page.child_at(child_slot);
    find_from(table, child_idx, key)
}

fn leaf_find(page: &Page, page_idx: u32, key: &str) -> Cursor {
    let records = page.records();
    let mut lower = 0usize;
    let mut upper = records.len();
    while lower != upper {
        let mid = (lower + upper) / 2;
        match key.cmp(records[mid].key.as_str()) {
            Ordering::Equal => {
                return Cursor {
                    page_idx,
                    cell_idx: mid,
                    found: true,
                }
            }
            Ordering::Less => upper = mid,
            Ordering::Greater => lower = mid + 1,
        }
    }
    Cursor {
        page_idx,
        cell_idx: lower,
        found: false,
    }
}

/// Binary-searches an internal page's separators for the smallest index
/// `i` with `key <= separator[i]`, or `size` (the rightmost child) if
/// none. A separator equal to `key` routes left, matching the upper-bound
/// separator convention used by every branch maintenance routine.
pub fn internal_find_child(page: &Page, key: &str) -> usize {
    debug_assert_eq!(page.kind(), NodeKind::Internal);
    let branches = page.branches();
    let mut lower = 0usize;
    let mut upper = branches.len();
    while lower != upper {
        let mid = (lower + upper) / 2;
        if key <= branches[mid].key.as_str() {
            upper = mid;
        } else {
            lower = mid + 1;
        }
    }
    lower
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Record;
    use tempfile::NamedTempFile;

    #[test]
    fn finds_exact_and_lower_bound_positions() {
        let temp = NamedTempFile::new().unwrap();
        let mut table = Table::open(temp.path()).unwrap();
        {
            let root = table.get(0).unwrap();
            root.records_mut().push(Record {
                key: "b".into(),
                value: "2".into(),
            });
            root.records_mut().push(Record {
                key: "d".into(),
                value: "4".into(),
            });
        }

        let hit = find(&mut table, "b").unwrap();
        assert!(hit.found);
        assert_eq!(hit.cell_idx, 0);

        let miss_before = find(&mut table, "a").unwrap();
        assert!(!miss_before.found);
        assert_eq!(miss_before.cell_idx, 0);

        let miss_between = find(&mut table, "c").unwrap();
        assert!(!miss_between.found);
        assert_eq!(miss_between.cell_idx, 1);

        let miss_after = find(&mut table, "e").unwrap();
        assert!(!miss_after.found);
        assert_eq!(miss_after.cell_idx, 2);
    }
}
