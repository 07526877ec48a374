//! Leaf and internal node operations, split propagation, and root creation.
//!
//! This is the recursive structural-mutation core: `set` and `get` descend
//! via [`crate::cursor::find`], and every insert that overflows a node's
//! capacity splits it and propagates a separator (and possibly a new root)
//! upward. Root creation keeps page 0 as the root by relocating the old
//! root's bytes to a freshly allocated page — see [`create_root`].

use crate::cursor::{self, Cursor};
use crate::error::Result;
use crate::page::{
    Body, Branch, Page, Record, INTERNAL_CAPACITY, INTERNAL_LEFT_SPLIT, LEAF_CAPACITY,
    LEAF_LEFT_SPLIT,
};
use crate::pager::Table;

/// Looks up `key`, returning an owned copy of its value if present.
pub fn get(table: &mut Table, key: &str) -> Result<Option<String>> {
    let cursor = cursor::find(table, key)?;
    if !cursor.found {
        return Ok(None);
    }
    let page = table.get(cursor.page_idx)?;
    Ok(Some(page.records()[cursor.cell_idx].value.clone()))
}

/// Inserts or overwrites `key`.
pub fn set(table: &mut Table, key: &str, value: &str) -> Result<()> {
    let cursor = cursor::find(table, key)?;
    if cursor.found {
        let page = table.get(cursor.page_idx)?;
        page.records_mut()[cursor.cell_idx].value = value.to_string();
        return Ok(());
    }
    leaf_insert(table, cursor, key.to_string(), value.to_string())
}

/// Recursively pretty-prints the tree starting at the root, for tests and
/// the demo REPL's `.dump` command.
pub fn dump(table: &mut Table) -> Result<String> {
    let mut out = String::new();
    dump_page(table, 0, 0, &mut out)?;
    Ok(out)
}

fn dump_page(table: &mut Table, page_idx: u32, depth: usize, out: &mut String) -> Result<()> {
    let indent = "  ".repeat(depth);
    let page = table.get(page_idx)?.clone();
    match &page.body {
        Body::Leaf(records) => {
            out.push_str(&format!(
                "{indent}leaf#{page_idx} (root={} parent={})",
                page.is_root, page.parent
            ));
            for record in records {
                out.push_str(&format!(" {}={}", record.key, record.value));
            }
            out.push('\n');
        }
        Body::Internal { branches, rightmost } => {
            out.push_str(&format!(
                "{indent}internal#{page_idx} (root={} parent={})\n",
                page.is_root, page.parent
            ));
            for branch in branches {
                out.push_str(&format!("{indent}  <= {}\n", branch.key));
                dump_page(table, branch.child, depth + 2, out)?;
            }
            out.push_str(&format!("{indent}  rightmost\n"));
            dump_page(table, *rightmost, depth + 2, out)?;
        }
    }
    Ok(())
}

/// Walks the rightmost chain from `page_idx` down to a leaf and returns
/// that leaf's maximum key. O(tree height); called repeatedly during
/// internal inserts and splits rather than cached on each node.
fn max_key(table: &mut Table, mut page_idx: u32) -> Result<String> {
    loop {
        let page = table.get(page_idx)?;
        match &page.body {
            Body::Leaf(records) => {
                return Ok(records
                    .last()
                    .expect("max_key reached an empty leaf")
                    .key
                    .clone())
            }
            Body::Internal { rightmost, .. } => page_idx = *rightmost,
        }
    }
}

/// Allocates a fresh internal page at the table's next free index.
fn alloc_internal(table: &mut Table) -> Result<u32> {
    let idx = table.page_count();
    let page = table.get(idx)?;
    *page = Page::new_internal();
    Ok(idx)
}

/// If `parent` holds a branch separator equal to `old_key`, rewrites it to
/// `new_key`. A no-op when the changed child was `parent`'s rightmost,
/// since the rightmost child has no separator entry to update.
fn update_separator(table: &mut Table, parent: u32, old_key: &str, new_key: &str) -> Result<()> {
    let page = table.get(parent)?;
    for branch in page.branches_mut() {
        if branch.key == old_key {
            branch.key = new_key.to_string();
            break;
        }
    }
    Ok(())
}

fn leaf_insert(table: &mut Table, cursor: Cursor, key: String, value: String) -> Result<()> {
    let size = table.get(cursor.page_idx)?.size();
    if size < LEAF_CAPACITY {
        leaf_insert_raw(table, cursor.page_idx, cursor.cell_idx, key, value)
    } else {
        leaf_split_insert(table, cursor.page_idx, cursor.cell_idx, key, value)
    }
}

fn leaf_insert_raw(
    table: &mut Table,
    leaf_idx: u32,
    cell_idx: usize,
    key: String,
    value: String,
) -> Result<()> {
    let page = table.get(leaf_idx)?;
    debug_assert!(page.size() < LEAF_CAPACITY);
    page.records_mut().insert(cell_idx, Record { key, value });
    Ok(())
}

/// Splits a full leaf and inserts `(key, value)` into whichever half the
/// boundary-adjusted cursor now names. Note the strict `>` below: an
/// insertion at exactly `cell_idx == LEAF_LEFT_SPLIT` lands in the left
/// page, not the new right one. This asymmetry is inherited from the
/// source design and preserved to keep split-boundary behavior
/// reproducible.
fn leaf_split_insert(
    table: &mut Table,
    leaf_idx: u32,
    cell_idx: usize,
    key: String,
    value: String,
) -> Result<()> {
    log::debug!("btree: splitting full leaf {leaf_idx}");
    let was_root = table.get(leaf_idx)?.is_root;
    let parent = table.get(leaf_idx)?.parent;
    let old_max = table
        .get(leaf_idx)?
        .records()
        .last()
        .expect("a full leaf has at least one record")
        .key
        .clone();

    let tail = table.get(leaf_idx)?.records_mut().split_off(LEAF_LEFT_SPLIT);

    let new_idx = table.page_count();
    let new_leaf = table.get(new_idx)?;
    *new_leaf.records_mut() = tail;
    new_leaf.parent = parent;

    if cell_idx > LEAF_LEFT_SPLIT {
        let target = cell_idx - LEAF_LEFT_SPLIT;
        table.get(new_idx)?.records_mut().insert(target, Record { key, value });
    } else {
        table.get(leaf_idx)?.records_mut().insert(cell_idx, Record { key, value });
    }

    if was_root {
        create_root(table, new_idx)
    } else {
        let new_left_max = table
            .get(leaf_idx)?
            .records()
            .last()
            .expect("the left half of a leaf split keeps at least one record")
            .key
            .clone();
        update_separator(table, parent, &old_max, &new_left_max)?;
        internal_insert(table, parent, new_idx)
    }
}

/// Inserts `child` as a branch of `parent`, splitting `parent` first if it
/// is already at capacity.
fn internal_insert(table: &mut Table, parent: u32, child: u32) -> Result<()> {
    let size = table.get(parent)?.size();
    if size < INTERNAL_CAPACITY {
        internal_insert_raw(table, parent, child)
    } else {
        internal_split_insert(table, parent, child)
    }
}

/// Inserts `child` into `parent`, which must have room. Appends beyond the
/// current maximum become the new rightmost child; everything else is
/// located via `internal_find_child` and shifted into place.
fn internal_insert_raw(table: &mut Table, parent: u32, child: u32) -> Result<()> {
    let child_max = max_key(table, child)?;
    let right_idx = table.get(parent)?.rightmost();
    let right_max = max_key(table, right_idx)?;

    if child_max > right_max {
        let page = table.get(parent)?;
        debug_assert!(page.size() < INTERNAL_CAPACITY);
        let size = page.size();
        page.branches_mut().insert(
            size,
            Branch {
                child: right_idx,
                key: right_max,
            },
        );
        page.set_rightmost(child);
    } else {
        let i = {
            let page = table.get(parent)?;
            cursor::internal_find_child(page, &child_max)
        };
        let page = table.get(parent)?;
        debug_assert!(page.size() < INTERNAL_CAPACITY);
        page.branches_mut().insert(i, Branch { child, key: child_max });
    }

    table.get(child)?.parent = parent;
    Ok(())
}

/// Splits a full internal node and inserts `child` into whichever half its
/// maximum key belongs in.
fn internal_split_insert(table: &mut Table, old_idx: u32, child: u32) -> Result<()> {
    log::debug!("btree: splitting full internal node {old_idx}");
    let was_root = table.get(old_idx)?.is_root;
    let grandparent = table.get(old_idx)?.parent;
    let old_max = max_key(table, old_idx)?;

    let new_idx = alloc_internal(table)?;

    let tail = table.get(old_idx)?.branches_mut().split_off(INTERNAL_LEFT_SPLIT);
    let old_rightmost = table.get(old_idx)?.rightmost();
    let new_page = table.get(new_idx)?;
    *new_page.branches_mut() = tail;
    new_page.set_rightmost(old_rightmost);

    let promoted = table
        .get(old_idx)?
        .branches_mut()
        .pop()
        .expect("a full internal node has a branch to promote after the split");
    let mid_key = promoted.key;
    table.get(old_idx)?.set_rightmost(promoted.child);

    let new_children: Vec<u32> = {
        let new_page = table.get(new_idx)?;
        new_page
            .branches()
            .iter()
            .map(|b| b.child)
            .chain(std::iter::once(new_page.rightmost()))
            .collect()
    };
    for idx in new_children {
        table.get(idx)?.parent = new_idx;
    }

    let child_max = max_key(table, child)?;
    if child_max <= mid_key {
        internal_insert_raw(table, old_idx, child)?;
    } else {
        internal_insert_raw(table, new_idx, child)?;
    }

    if was_root {
        create_root(table, new_idx)
    } else {
        let new_old_max = max_key(table, old_idx)?;
        update_separator(table, grandparent, &old_max, &new_old_max)?;
        internal_insert(table, grandparent, new_idx)
    }
}

/// Creates a new root when a split propagates all the way up. Page 0 stays
/// the root: its current contents are copied byte-for-byte to a freshly
/// allocated page (`left`), page 0 is reinitialized as a two-child internal
/// node, and `right_idx` (the page whose split triggered this) becomes the
/// new root's rightmost child. If `left` is itself internal, its children
/// still carry `parent == 0` from the copy and must be re-pointed at
/// `left`'s new index.
fn create_root(table: &mut Table, right_idx: u32) -> Result<()> {
    log::debug!("btree: promoting a new root, old root relocated, new rightmost is {right_idx}");
    let left_idx = table.page_count();
    let root_copy = table.get(0)?.clone();
    let left_page = table.get(left_idx)?;
    *left_page = root_copy;
    left_page.is_root = false;

    if !table.get(left_idx)?.is_leaf() {
        let children: Vec<u32> = {
            let left_page = table.get(left_idx)?;
            left_page
                .branches()
                .iter()
                .map(|b| b.child)
                .chain(std::iter::once(left_page.rightmost()))
                .collect()
        };
        for idx in children {
            table.get(idx)?.parent = left_idx;
        }
    }

    let left_max = max_key(table, left_idx)?;

    let root = table.get(0)?;
    *root = Page::new_internal();
    root.is_root = true;
    root.branches_mut().push(Branch {
        child: left_idx,
        key: left_max,
    });
    root.set_rightmost(right_idx);

    table.get(left_idx)?.parent = 0;
    table.get(right_idx)?.parent = 0;

    Ok(())
}
