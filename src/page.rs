//! Page layout and record types.
//!
//! A page is a fixed 4096-byte on-disk unit holding exactly one tree node:
//! either a leaf (sorted records) or an internal node (sorted branches plus
//! a distinguished rightmost child). The in-memory `Page` mirrors the
//! on-disk layout byte-for-byte via `serialize`/`deserialize`; everything
//! above the pager manipulates `Page` values directly.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor as IoCursor, Read, Write};

use crate::error::{Error, Result};

/// Page size in bytes, matching the production on-disk format.
pub const PAGE_SIZE: usize = 4096;

/// Maximum key length, excluding the NUL terminator.
pub const KEY_LEN: usize = 31;
/// Maximum value length, excluding the NUL terminator.
pub const VALUE_LEN: usize = 255;

const KEY_SLOT: usize = KEY_LEN + 1;
const VALUE_SLOT: usize = VALUE_LEN + 1;

const HEADER_SIZE: usize = 8;

/// Hard cap on the number of pages one open database may allocate.
pub const MAX_PAGES: u32 = 100;

#[cfg(not(feature = "small-pages"))]
pub const LEAF_CAPACITY: usize = 14;
#[cfg(not(feature = "small-pages"))]
pub const INTERNAL_CAPACITY: usize = 113;

// `LEAF_CAPACITY = floor((PAGE_SIZE - HEADER_SIZE) / (KEY_SLOT + VALUE_SLOT))`
// and `INTERNAL_CAPACITY = floor((PAGE_SIZE - HEADER_SIZE - 4) / (4 + KEY_SLOT))`
// are exactly the production figures above; the `small-pages` feature
// overrides both to 4 so splits are reachable with a handful of keys.
#[cfg(feature = "small-pages")]
pub const LEAF_CAPACITY: usize = 4;
#[cfg(feature = "small-pages")]
pub const INTERNAL_CAPACITY: usize = 4;

pub const LEAF_LEFT_SPLIT: usize = LEAF_CAPACITY / 2;
pub const LEAF_RIGHT_SPLIT: usize = LEAF_CAPACITY - LEAF_LEFT_SPLIT;
pub const INTERNAL_LEFT_SPLIT: usize = INTERNAL_CAPACITY / 2;
pub const INTERNAL_RIGHT_SPLIT: usize = INTERNAL_CAPACITY - INTERNAL_LEFT_SPLIT;

/// Rejects keys longer than `KEY_LEN` bytes.
pub fn validate_key(key: &str) -> Result<()> {
    if key.len() > KEY_LEN {
        return Err(Error::KeyTooLong { len: key.len() });
    }
    Ok(())
}

/// Rejects values longer than `VALUE_LEN` bytes.
pub fn validate_value(value: &str) -> Result<()> {
    if value.len() > VALUE_LEN {
        return Err(Error::ValueTooLong { len: value.len() });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Internal = 0,
    Leaf = 1,
}

/// A (key, value) pair stored in a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub value: String,
}

/// A (child, separator) pair stored in an internal node. The separator is
/// an inclusive upper bound on every key reachable through `child`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub child: u32,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Leaf(Vec<Record>),
    Internal {
        branches: Vec<Branch>,
        rightmost: u32,
    },
}

/// An in-memory page: header fields plus a leaf or internal body.
///
/// `size` is not tracked as a separate field — it is always
/// `records.len()` or `branches.len()`, so there is exactly one source of
/// truth for it (the on-disk header field is derived at serialize time).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub is_root: bool,
    pub parent: u32,
    pub body: Body,
}

impl Page {
    pub fn new_leaf() -> Self {
        Page {
            is_root: false,
            parent: 0,
            body: Body::Leaf(Vec::new()),
        }
    }

    pub fn new_internal() -> Self {
        Page {
            is_root: false,
            parent: 0,
            body: Body::Internal {
                branches: Vec::new(),
                rightmost: 0,
            },
        }
    }

    pub fn kind(&self) -> NodeKind {
        match &self.body {
            Body::Leaf(_) => NodeKind::Leaf,
            Body::Internal { .. } => NodeKind::Internal,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.body, Body::Leaf(_))
    }

    /// Number of occupied slots: records for a leaf, branches (excluding
    /// `rightmost`) for an internal node.
    pub fn size(&self) -> usize {
        match &self.body {
            Body::Leaf(records) => records.len(),
            Body::Internal { branches, .. } => branches.len(),
        }
    }

    pub fn records(&self) -> &[Record] {
        match &self.body {
            Body::Leaf(records) => records,
            Body::Internal { .. } => panic!("records() called on an internal page"),
        }
    }

    pub fn records_mut(&mut self) -> &mut Vec<Record> {
        match &mut self.body {
            Body::Leaf(records) => records,
            Body::Internal { .. } => panic!("records_mut() called on an internal page"),
        }
    }

    pub fn branches(&self) -> &[Branch] {
        match &self.body {
            Body::Internal { branches, .. } => branches,
            Body::Leaf(_) => panic!("branches() called on a leaf page"),
        }
    }

    pub fn branches_mut(&mut self) -> &mut Vec<Branch> {
        match &mut self.body {
            Body::Internal { branches, .. } => branches,
            Body::Leaf(_) => panic!("branches_mut() called on a leaf page"),
        }
    }

    pub fn rightmost(&self) -> u32 {
        match &self.body {
            Body::Internal { rightmost, .. } => *rightmost,
            Body::Leaf(_) => panic!("rightmost() called on a leaf page"),
        }
    }

    pub fn set_rightmost(&mut self, child: u32) {
        match &mut self.body {
            Body::Internal { rightmost, .. } => *rightmost = child,
            Body::Leaf(_) => panic!("set_rightmost() called on a leaf page"),
        }
    }

    /// The index of the child at slot `index` (`index == size()` is the
    /// rightmost child) — the same convention `internal_child_of` uses in
    /// the original design.
    pub fn child_at(&self, index: usize) -> u32 {
        match &self.body {
            Body::Internal { branches, rightmost } => {
                if index >= branches.len() {
                    *rightmost
                } else {
                    branches[index].child
                }
            }
            Body::Leaf(_) => panic!("child_at() called on a leaf page"),
        }
    }

    pub fn serialize(&self) -> Result<[u8; PAGE_SIZE]> {
        let mut buffer = [0u8; PAGE_SIZE];
        let mut cursor = IoCursor::new(&mut buffer[..]);

        cursor.write_u8(self.kind() as u8)?;
        cursor.write_u8(self.is_root as u8)?;
        cursor.write_u16::<LittleEndian>(self.size() as u16)?;
        cursor.write_u32::<LittleEndian>(self.parent)?;
        debug_assert_eq!(cursor.position() as usize, HEADER_SIZE);

        match &self.body {
            Body::Leaf(records) => {
                debug_assert!(records.len() <= LEAF_CAPACITY);
                for record in records {
                    write_fixed(&mut cursor, &record.key, KEY_SLOT)?;
                    write_fixed(&mut cursor, &record.value, VALUE_SLOT)?;
                }
            }
            Body::Internal { branches, rightmost } => {
                debug_assert!(branches.len() <= INTERNAL_CAPACITY);
                for branch in branches {
                    cursor.write_u32::<LittleEndian>(branch.child)?;
                    write_fixed(&mut cursor, &branch.key, KEY_SLOT)?;
                }
                // Skip to the fixed rightmost-child offset so unused branch
                // slots stay zeroed, matching the union layout on disk.
                let rightmost_offset = HEADER_SIZE + INTERNAL_CAPACITY * (4 + KEY_SLOT);
                cursor.set_position(rightmost_offset as u64);
                cursor.write_u32::<LittleEndian>(*rightmost)?;
            }
        }

        Ok(buffer)
    }

    pub fn deserialize(buffer: &[u8; PAGE_SIZE]) -> Result<Self> {
        let mut cursor = IoCursor::new(&buffer[..]);

        let kind_byte = cursor.read_u8()?;
        let kind = match kind_byte {
            0 => NodeKind::Internal,
            1 => NodeKind::Leaf,
            other => return Err(Error::Corrupt(format!("invalid node kind byte {other}"))),
        };
        let is_root = cursor.read_u8()? != 0;
        let size = cursor.read_u16::<LittleEndian>()? as usize;
        let parent = cursor.read_u32::<LittleEndian>()?;
        debug_assert_eq!(cursor.position() as usize, HEADER_SIZE);

        let body = match kind {
            NodeKind::Leaf => {
                if size > LEAF_CAPACITY {
                    return Err(Error::Corrupt(format!(
                        "leaf size {size} exceeds capacity {LEAF_CAPACITY}"
                    )));
                }
                let mut records = Vec::with_capacity(size);
                for _ in 0..size {
                    let key = read_fixed(&mut cursor, KEY_SLOT)?;
                    let value = read_fixed(&mut cursor, VALUE_SLOT)?;
                    records.push(Record { key, value });
                }
                Body::Leaf(records)
            }
            NodeKind::Internal => {
                if size > INTERNAL_CAPACITY {
                    return Err(Error::Corrupt(format!(
                        "internal size {size} exceeds capacity {INTERNAL_CAPACITY}"
                    )));
                }
                let mut branches = Vec::with_capacity(size);
                for _ in 0..size {
                    let child = cursor.read_u32::<LittleEndian>()?;
                    let key = read_fixed(&mut cursor, KEY_SLOT)?;
                    branches.push(Branch { child, key });
                }
                let rightmost_offset = HEADER_SIZE + INTERNAL_CAPACITY * (4 + KEY_SLOT);
                cursor.set_position(rightmost_offset as u64);
                let rightmost = cursor.read_u32::<LittleEndian>()?;
                Body::Internal { branches, rightmost }
            }
        };

        Ok(Page { is_root, parent, body })
    }
}

fn write_fixed<W: Write>(writer: &mut W, s: &str, slot_len: usize) -> Result<()> {
    let bytes = s.as_bytes();
    debug_assert!(bytes.len() < slot_len, "string does not fit its fixed slot");
    writer.write_all(bytes)?;
    // NUL terminator plus zero padding for the rest of the slot.
    let pad = slot_len - bytes.len();
    writer.write_all(&vec![0u8; pad])?;
    Ok(())
}

fn read_fixed<R: Read>(reader: &mut R, slot_len: usize) -> Result<String> {
    let mut buf = vec![0u8; slot_len];
    reader.read_exact(&mut buf)?;
    let end = buf.iter().position(|&b| b == 0).unwrap_or(slot_len);
    String::from_utf8(buf[..end].to_vec())
        .map_err(|e| Error::Corrupt(format!("invalid UTF-8 in fixed-size slot: {e}")))
}
