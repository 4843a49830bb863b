//! Rewrite operations and the drivers that apply them across a tree
//!
//! # Operations
//!
//! Each operation takes a handle, inspects its current snapshot and either
//! leaves it alone or installs a logically equivalent replacement via
//! [`CogHandle::put`]. They never fail: input they do not target is a no-op.
//!
//! - [`sort_array`]: Array → SortedArray
//! - [`split_array`]: Array → BTree of two Arrays (one cracking step)
//! - [`pushdown_array`]: repair straddling BTree children, or push an array
//!   below a BTree that sits next to it in a Concat
//!
//! # Drivers
//!
//! - [`recur_top_down`]: pre-order over every node
//! - [`recur_to_target`]: only the node reached by descending toward a key
//! - [`recur_to_target_top_down`]: every node on that path
//!
//! Every rewrite preserves size and the multiset of records.

mod pushdown;
mod recur;
mod sort;
mod split;

pub use pushdown::pushdown_array;
pub use recur::{recur_to_target, recur_to_target_top_down, recur_top_down};
pub use sort::sort_array;
pub use split::{make_split_array, split_array};

use crate::handle::CogHandle;
use crate::record::{Key, Record};
use std::fmt;

/// Reorder `records` so every key `< sep` precedes every key `>= sep`
///
/// Single pass, not stable. Returns the number of records below `sep`.
pub(crate) fn partition_by_key(records: &mut [Record], sep: Key) -> usize {
    let mut below = 0;
    for i in 0..records.len() {
        if records[i].key < sep {
            records.swap(below, i);
            below += 1;
        }
    }
    below
}

/// Where a driver applies an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reach {
    /// The handle only
    Node,
    /// Every node, pre-order
    Tree,
    /// The terminal node on the path toward a key
    Target(Key),
    /// Every node on the path toward a key
    PathTo(Key),
}

/// A single-node rewrite, as a value
///
/// Used by front ends that pick operations at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOp {
    /// [`sort_array`]
    Sort,
    /// [`split_array`] around the key
    Split(Key),
    /// [`pushdown_array`]
    Pushdown,
}

impl RewriteOp {
    /// Apply to one handle
    pub fn apply(self, handle: &CogHandle) {
        match self {
            Self::Sort => sort_array(handle),
            Self::Split(target) => split_array(target, handle),
            Self::Pushdown => pushdown_array(handle),
        }
    }

    /// Apply through the driver selected by `reach`
    pub fn apply_with(self, reach: Reach, handle: &CogHandle) {
        let op = |h: &CogHandle| self.apply(h);
        match reach {
            Reach::Node => op(handle),
            Reach::Tree => recur_top_down(&op, handle),
            Reach::Target(target) => recur_to_target(&op, target, handle),
            Reach::PathTo(target) => recur_to_target_top_down(&op, target, handle),
        }
    }
}

impl fmt::Display for RewriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sort => f.write_str("sort_array"),
            Self::Split(target) => write!(f, "split_array({target})"),
            Self::Pushdown => f.write_str("pushdown_array"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_splits_around_separator() {
        let mut records: Vec<Record> = [5, 3, 8, 1, 9, 2].into_iter().map(Record::with_sentinel).collect();
        let below = partition_by_key(&mut records, 5);
        assert_eq!(below, 3);
        assert!(records[..below].iter().all(|r| r.key < 5));
        assert!(records[below..].iter().all(|r| r.key >= 5));
    }

    #[test]
    fn partition_degenerate_cases() {
        let mut empty: Vec<Record> = Vec::new();
        assert_eq!(partition_by_key(&mut empty, 0), 0);

        let mut all_high: Vec<Record> = [4, 5].into_iter().map(Record::with_sentinel).collect();
        assert_eq!(partition_by_key(&mut all_high, 4), 0);
        assert_eq!(partition_by_key(&mut all_high, 6), 2);
    }

    #[test]
    fn op_display() {
        assert_eq!(RewriteOp::Split(7).to_string(), "split_array(7)");
        assert_eq!(RewriteOp::Pushdown.to_string(), "pushdown_array");
    }
}
