//! Shared replaceable cells holding Cog snapshots

use crate::cog::Cog;
use crate::iter::CogIter;
use crate::record::Key;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Replaceable indirection cell holding the current [`Cog`] snapshot
///
/// Cloning a handle clones the *cell*, not the content: both clones see
/// every later [`put`](Self::put). Composite Cogs store handles, so a
/// rewrite that puts into a child is visible through every ancestor without
/// any ancestor being rebuilt.
///
/// Snapshots are `Arc<Cog>`. A reader that already took one keeps reading
/// it after a `put`; nobody ever sees a half-built node.
#[derive(Clone)]
pub struct CogHandle {
    cell: Arc<RwLock<Arc<Cog>>>,
}

impl CogHandle {
    /// Create a handle holding `cog`
    pub fn new(cog: Cog) -> Self {
        Self {
            cell: Arc::new(RwLock::new(Arc::new(cog))),
        }
    }

    /// Current snapshot
    pub fn get(&self) -> Arc<Cog> {
        Arc::clone(&self.cell.read())
    }

    /// Replace the snapshot wholesale
    pub fn put(&self, cog: Cog) {
        *self.cell.write() = Arc::new(cog);
    }

    /// Total records reachable from this handle
    pub fn size(&self) -> usize {
        self.get().size()
    }

    /// Iterator over the current snapshot
    pub fn iter(&self) -> CogIter {
        CogIter::new(&self.get())
    }

    /// True if both handles are the same cell
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// Smallest and largest key in the current snapshot
    #[must_use]
    pub fn key_bounds(&self) -> Option<(Key, Key)> {
        self.get().key_bounds()
    }

    /// Height of the subtree; a leaf has depth 1
    pub fn depth(&self) -> usize {
        match self.get().children() {
            Some((left, right)) => 1 + left.depth().max(right.depth()),
            None => 1,
        }
    }

    /// Number of array leaves in the subtree
    pub fn leaf_count(&self) -> usize {
        match self.get().children() {
            Some((left, right)) => left.leaf_count() + right.leaf_count(),
            None => 1,
        }
    }

    /// Diagnostic dump of the current snapshot
    pub fn print_debug(&self, depth: usize) -> String {
        self.get().print_debug(depth)
    }

    pub(crate) fn write_debug<W: fmt::Write>(&self, out: &mut W, depth: usize) -> fmt::Result {
        self.get().write_debug(out, depth)
    }
}

impl From<Cog> for CogHandle {
    fn from(cog: Cog) -> Self {
        Self::new(cog)
    }
}

impl fmt::Debug for CogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CogHandle").field(&*self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordStore;

    fn array(keys: &[i64]) -> Cog {
        Cog::Array(RecordStore::from_keys(keys.iter().copied()).view())
    }

    #[test]
    fn put_replaces_content_for_every_clone() {
        let h = CogHandle::new(array(&[1, 2, 3]));
        let alias = h.clone();
        h.put(array(&[4]));
        assert_eq!(alias.size(), 1);
        assert!(alias.ptr_eq(&h));
    }

    #[test]
    fn old_snapshot_survives_put() {
        let h = CogHandle::new(array(&[1, 2, 3]));
        let before = h.get();
        h.put(array(&[]));
        assert_eq!(before.size(), 3);
        assert_eq!(h.size(), 0);
    }

    #[test]
    fn child_rewrite_visible_through_parent() {
        let child = CogHandle::new(array(&[3, 1]));
        let parent = CogHandle::new(Cog::concat(child.clone(), CogHandle::new(array(&[2]))));
        let parent_snapshot = parent.get();

        child.put(array(&[1, 3, 5]));

        assert!(Arc::ptr_eq(&parent_snapshot, &parent.get()));
        assert_eq!(parent.size(), 4);
    }

    #[test]
    fn depth_and_leaves() {
        let h = CogHandle::new(array(&[1]));
        assert_eq!(h.depth(), 1);
        assert_eq!(h.leaf_count(), 1);

        let tree = CogHandle::new(Cog::btree(
            h.clone(),
            2,
            CogHandle::new(Cog::concat(h.clone(), h)),
        ));
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaf_count(), 3);
    }
}
