//! Structural variants
//!
//! A [`Cog`] describes how one range of records is currently organized.
//! Cogs are immutable snapshots: rewrites build a new Cog and install it in
//! a [`CogHandle`], they never edit one in place. Composite variants hold
//! child handles rather than child Cogs so a descendant can be replaced
//! without rebuilding any ancestor.

use crate::error::CogError;
use crate::handle::CogHandle;
use crate::record::{Key, Record, RecordStore, StoreView};
use std::fmt::{self, Write};

/// Structural node
#[derive(Debug, Clone)]
pub enum Cog {
    /// Records in arbitrary order
    Array(StoreView),

    /// Records with non-decreasing keys
    ///
    /// The label is not checked on construction; whoever builds it must
    /// have sorted the view.
    SortedArray(StoreView),

    /// Logical sequence `left ++ right`, no ordering between the two
    Concat {
        /// Front half
        left: CogHandle,
        /// Back half
        right: CogHandle,
    },

    /// Binary split: `left` keys `< sep`, `right` keys `>= sep`
    ///
    /// The membership constraint may be temporarily broken by rewrites that
    /// introduce unsorted arrays; `pushdown_array` restores it.
    BTree {
        /// Keys below the separator
        left: CogHandle,
        /// Separator key
        sep: Key,
        /// Keys at or above the separator
        right: CogHandle,
    },
}

/// Variant tag, for logging and dumps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CogKind {
    /// [`Cog::Array`]
    Array,
    /// [`Cog::SortedArray`]
    SortedArray,
    /// [`Cog::Concat`]
    Concat,
    /// [`Cog::BTree`]
    BTree,
}

impl CogKind {
    /// Display name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Array => "Array",
            Self::SortedArray => "SortedArray",
            Self::Concat => "Concat",
            Self::BTree => "BTree",
        }
    }
}

impl fmt::Display for CogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Cog {
    /// Unordered array over `begin..end` of `store`
    ///
    /// # Errors
    /// Returns [`CogError::InvalidRange`] if the range does not fit the store.
    pub fn array(store: &RecordStore, begin: usize, end: usize) -> Result<Self, CogError> {
        Ok(Self::Array(store.slice(begin, end)?))
    }

    /// Sorted array over `begin..end` of `store`
    ///
    /// The caller must have sorted that range by key.
    ///
    /// # Errors
    /// Returns [`CogError::InvalidRange`] if the range does not fit the store.
    pub fn sorted_array(store: &RecordStore, begin: usize, end: usize) -> Result<Self, CogError> {
        Ok(Self::SortedArray(store.slice(begin, end)?))
    }

    /// Unordered array owning a fresh store of `records`
    #[must_use]
    pub fn array_of(records: Vec<Record>) -> Self {
        Self::Array(RecordStore::new(records).view())
    }

    /// Concatenation of two handles. O(1), nothing copied.
    #[must_use]
    pub fn concat(left: CogHandle, right: CogHandle) -> Self {
        Self::Concat { left, right }
    }

    /// Binary split of two handles around `sep`. O(1), not verified.
    #[must_use]
    pub fn btree(left: CogHandle, sep: Key, right: CogHandle) -> Self {
        Self::BTree { left, sep, right }
    }

    /// Variant tag
    #[must_use]
    pub fn kind(&self) -> CogKind {
        match self {
            Self::Array(_) => CogKind::Array,
            Self::SortedArray(_) => CogKind::SortedArray,
            Self::Concat { .. } => CogKind::Concat,
            Self::BTree { .. } => CogKind::BTree,
        }
    }

    /// Total number of records
    ///
    /// O(1) for leaves, recursive for composites.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Array(view) | Self::SortedArray(view) => view.len(),
            Self::Concat { left, right } | Self::BTree { left, right, .. } => {
                left.size() + right.size()
            }
        }
    }

    /// Smallest and largest key below this node, `None` when empty
    ///
    /// Walks nodes only: sorted leaves answer from their ends and unsorted
    /// leaves from their cached view bounds.
    #[must_use]
    pub fn key_bounds(&self) -> Option<(Key, Key)> {
        match self {
            Self::SortedArray(view) => {
                let records = view.records();
                Some((records.first()?.key, records.last()?.key))
            }
            Self::Array(view) => view.key_bounds(),
            Self::Concat { left, right } | Self::BTree { left, right, .. } => {
                match (left.key_bounds(), right.key_bounds()) {
                    (Some((lo, hi)), Some((lo2, hi2))) => Some((lo.min(lo2), hi.max(hi2))),
                    (bounds, None) | (None, bounds) => bounds,
                }
            }
        }
    }

    /// Leaf view, if this is an array variant
    #[must_use]
    pub fn leaf_view(&self) -> Option<&StoreView> {
        match self {
            Self::Array(view) | Self::SortedArray(view) => Some(view),
            Self::Concat { .. } | Self::BTree { .. } => None,
        }
    }

    /// Child handles in structural order, if composite
    #[must_use]
    pub fn children(&self) -> Option<(&CogHandle, &CogHandle)> {
        match self {
            Self::Array(_) | Self::SortedArray(_) => None,
            Self::Concat { left, right } | Self::BTree { left, right, .. } => Some((left, right)),
        }
    }

    /// True for the array variants
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.leaf_view().is_some()
    }

    /// Diagnostic dump at `depth`, one line per node
    #[must_use]
    pub fn print_debug(&self, depth: usize) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_debug(&mut out, depth);
        out
    }

    /// Write the diagnostic dump into `out`
    ///
    /// # Errors
    /// Propagates errors from the writer.
    pub fn write_debug<W: Write>(&self, out: &mut W, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self {
            Self::Array(_) | Self::SortedArray(_) => {
                writeln!(out, "{indent}{}: {} records", self.kind(), self.size())
            }
            Self::Concat { left, right } => {
                writeln!(out, "{indent}{}: {} records", self.kind(), self.size())?;
                left.write_debug(out, depth + 1)?;
                right.write_debug(out, depth + 1)
            }
            Self::BTree { left, sep, right } => {
                writeln!(out, "{indent}{}[{sep}]: {} records", self.kind(), self.size())?;
                left.write_debug(out, depth + 1)?;
                right.write_debug(out, depth + 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(keys: &[Key]) -> CogHandle {
        CogHandle::new(Cog::Array(RecordStore::from_keys(keys.iter().copied()).view()))
    }

    #[test]
    fn size_sums_children() {
        let tree = Cog::btree(leaf(&[1, 2]), 3, Cog::concat(leaf(&[3]), leaf(&[4, 5, 6])).into());
        assert_eq!(tree.size(), 6);
        assert_eq!(tree.kind(), CogKind::BTree);
        assert!(!tree.is_leaf());
    }

    #[test]
    fn array_range_constructors() {
        let store = RecordStore::from_keys([9, 8, 7, 6]);
        let cog = Cog::array(&store, 1, 3).unwrap();
        assert_eq!(cog.size(), 2);
        assert_eq!(cog.kind(), CogKind::Array);
        assert!(Cog::sorted_array(&store, 3, 5).is_err());
    }

    #[test]
    fn debug_dump_indents_children() {
        let tree = Cog::btree(leaf(&[1]), 5, leaf(&[7, 8]));
        let dump = tree.print_debug(1);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines, vec!["  BTree[5]: 3 records", "    Array: 1 records", "    Array: 2 records"]);
    }

    #[test]
    fn children_in_structural_order() {
        let a = leaf(&[1]);
        let b = leaf(&[2]);
        let cog = Cog::concat(a.clone(), b.clone());
        let (l, r) = cog.children().unwrap();
        assert!(l.ptr_eq(&a));
        assert!(r.ptr_eq(&b));
        assert!(Cog::array_of(vec![]).children().is_none());
    }
}
