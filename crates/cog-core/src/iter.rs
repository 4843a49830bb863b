//! Lazy traversal of a Cog's logical record sequence
//!
//! Iteration follows structural order: leaves in stored order, composites
//! left child then right child. That equals key order only when every leaf
//! is sorted and every BTree invariant holds.
//!
//! State is one cursor per level on the current path. The right child of a
//! composite is not opened until the left one is exhausted, at which point
//! the composite's cursor is replaced by the right child's, so a long chain
//! of right children never stacks up.
//!
//! Children are resolved when first reached, not when the iterator is
//! created. A rewrite installed mid-scan on a subtree the scan has not yet
//! entered is therefore seen in its new shape: each record is still
//! produced exactly once, but in the rewritten structural order. Subtrees
//! already entered keep the snapshot they were opened with.

use crate::cog::Cog;
use crate::handle::CogHandle;
use crate::record::{Key, Record, StoreView};

/// Pull-based iterator over a Cog snapshot
///
/// Finite and not restartable. Unvisited children are read from their
/// handles when reached (see the module docs). Besides the cursor-style
/// [`at_end`](Self::at_end)/[`key`](Self::key)/[`advance`](Self::advance)
/// protocol it implements [`Iterator`], yielding records by value.
#[derive(Debug)]
pub struct CogIter {
    cursor: Cursor,
}

#[derive(Debug)]
enum Cursor {
    Leaf {
        view: StoreView,
        pos: usize,
    },
    Pair {
        front: Box<CogIter>,
        back: Option<CogHandle>,
    },
}

impl Cursor {
    fn open(cog: &Cog) -> Self {
        match cog {
            Cog::Array(view) | Cog::SortedArray(view) => Cursor::Leaf {
                view: view.clone(),
                pos: 0,
            },
            Cog::Concat { left, right } | Cog::BTree { left, right, .. } => Cursor::Pair {
                front: Box::new(CogIter::new(&left.get())),
                back: Some(right.clone()),
            },
        }
    }
}

impl CogIter {
    /// Iterator positioned on the first record of `cog`
    #[must_use]
    pub fn new(cog: &Cog) -> Self {
        let mut iter = Self {
            cursor: Cursor::open(cog),
        };
        iter.settle();
        iter
    }

    /// True once every record has been produced
    #[must_use]
    pub fn at_end(&self) -> bool {
        match &self.cursor {
            Cursor::Leaf { view, pos } => *pos >= view.len(),
            Cursor::Pair { front, .. } => front.at_end(),
        }
    }

    /// Current record, `None` at end
    #[must_use]
    pub fn record(&self) -> Option<&Record> {
        match &self.cursor {
            Cursor::Leaf { view, pos } => view.get(*pos),
            Cursor::Pair { front, .. } => front.record(),
        }
    }

    /// Current key, `None` at end
    #[must_use]
    pub fn key(&self) -> Option<Key> {
        self.record().map(|r| r.key)
    }

    /// Step to the next record
    ///
    /// Advancing an exhausted iterator is a caller bug; it is caught in
    /// debug builds and ignored otherwise.
    pub fn advance(&mut self) {
        debug_assert!(!self.at_end(), "advance past end of CogIter");
        match &mut self.cursor {
            Cursor::Leaf { view, pos } => {
                if *pos < view.len() {
                    *pos += 1;
                }
            }
            Cursor::Pair { front, .. } => {
                if !front.at_end() {
                    front.advance();
                }
            }
        }
        self.settle();
    }

    // Once the front of a pair runs dry, switch to the back child. Empty
    // children are skipped so `at_end` only holds when everything is spent.
    fn settle(&mut self) {
        while let Cursor::Pair { front, back } = &mut self.cursor {
            if !front.at_end() {
                break;
            }
            let Some(next) = back.take() else {
                break;
            };
            self.cursor = Cursor::open(&next.get());
        }
    }
}

impl Iterator for CogIter {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let record = *self.record()?;
        self.advance();
        Some(record)
    }
}
