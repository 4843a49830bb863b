use super::RewritePolicy;
use crate::cog::Cog;
use crate::handle::CogHandle;
use crate::rewrite::{pushdown_array, sort_array, split_array};
use std::sync::Arc;

/// Cracks every subtree larger than a threshold before a scan
///
/// Walking down from the scanned handle:
/// - subtrees of at most `min_size` records are left as they are;
/// - an Array is split around the key of its middle record (or one past
///   it, when that key is the minimum) and the halves are cracked in turn;
///   an Array whose keys are all equal is sorted instead;
/// - a Concat or BTree first gets [`pushdown_array`], then its children are
///   cracked;
/// - a SortedArray is already as organized as it gets.
///
/// Every array left behind therefore holds at most `min_size` records or is
/// sorted. Key bounds of the subtrees left alone are cached on the way, so a
/// repeated scan installs nothing and reads no records: it only walks node
/// bounds to confirm that every separator still holds.
#[derive(Debug, Clone, Copy)]
pub struct CrackerPolicy {
    min_size: usize,
}

impl CrackerPolicy {
    /// Create policy with threshold
    #[must_use]
    pub fn new(min_size: usize) -> Self {
        Self { min_size }
    }

    /// Threshold below which subtrees are not reorganized
    #[must_use]
    pub fn min_size(&self) -> usize {
        self.min_size
    }

    fn crack(&self, handle: &CogHandle) {
        let size = handle.size();
        if size <= self.min_size {
            // primes the leaf bounds later repairs above this subtree consult
            let _ = handle.key_bounds();
            return;
        }

        let cog = handle.get();
        match &*cog {
            Cog::SortedArray(_) => return,
            Cog::Array(view) => {
                let Some(pivot) = view.get(view.len() / 2).map(|r| r.key) else {
                    return;
                };
                split_array(pivot, handle);
                if unchanged(&cog, handle) {
                    split_array(pivot.saturating_add(1), handle);
                }
                if unchanged(&cog, handle) {
                    tracing::trace!(size, "cracker: uniform keys, sorting");
                    sort_array(handle);
                    return;
                }
            }
            Cog::Concat { .. } | Cog::BTree { .. } => pushdown_array(handle),
        }

        let cog = handle.get();
        if let Some((left, right)) = cog.children() {
            self.crack(left);
            self.crack(right);
        }
    }
}

fn unchanged(before: &Arc<Cog>, handle: &CogHandle) -> bool {
    Arc::ptr_eq(before, &handle.get())
}

impl RewritePolicy for CrackerPolicy {
    fn before_iterator(&self, handle: &CogHandle) {
        tracing::debug!(min_size = self.min_size, size = handle.size(), "cracker: preparing scan");
        self.crack(handle);
    }

    fn name(&self) -> &'static str {
        "Cracker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::check;
    use crate::cog::CogKind;
    use crate::record::{Key, RecordStore};

    fn array(keys: &[Key]) -> CogHandle {
        CogHandle::new(Cog::Array(RecordStore::from_keys(keys.iter().copied()).view()))
    }

    fn max_unsorted_leaf(h: &CogHandle) -> usize {
        let cog = h.get();
        match &*cog {
            Cog::Array(view) => view.len(),
            Cog::SortedArray(_) => 0,
            Cog::Concat { left, right } | Cog::BTree { left, right, .. } => {
                max_unsorted_leaf(left).max(max_unsorted_leaf(right))
            }
        }
    }

    #[test]
    fn small_subtrees_are_left_alone() {
        let h = array(&[3, 1, 2]);
        let before = h.get();
        CrackerPolicy::new(3).before_iterator(&h);
        assert!(Arc::ptr_eq(&before, &h.get()));
    }

    #[test]
    fn cracks_down_to_threshold() {
        let keys: Vec<Key> = (0..100).map(|i| (i * 37) % 100).collect();
        let h = array(&keys);
        CrackerPolicy::new(8).before_iterator(&h);

        assert!(max_unsorted_leaf(&h) <= 8);
        assert!(check(&h).is_ok());
        assert_eq!(h.size(), 100);
    }

    #[test]
    fn uniform_keys_get_sorted() {
        let h = array(&[4; 10]);
        CrackerPolicy::new(2).before_iterator(&h);
        assert_eq!(h.get().kind(), CogKind::SortedArray);
    }

    #[test]
    fn second_scan_is_stable() {
        let h = array(&[9, 3, 7, 1, 5, 8, 2, 6, 4, 0]);
        let policy = CrackerPolicy::new(2);
        policy.before_iterator(&h);
        let dump = h.print_debug(0);
        policy.before_iterator(&h);
        assert_eq!(dump, h.print_debug(0));
    }

    fn snapshots(h: &CogHandle, out: &mut Vec<Arc<Cog>>) {
        let cog = h.get();
        if let Some((left, right)) = cog.children() {
            snapshots(left, out);
            snapshots(right, out);
        }
        out.push(cog);
    }

    #[test]
    fn warm_scan_installs_nothing_and_reads_only_cached_bounds() {
        let keys: Vec<Key> = (0..200).map(|i| (i * 73) % 200).collect();
        let h = CogHandle::new(Cog::btree(array(&keys[..120]), 90, array(&keys[120..])));
        let policy = CrackerPolicy::new(8);
        policy.before_iterator(&h);

        let mut before = Vec::new();
        snapshots(&h, &mut before);
        for cog in &before {
            if let Cog::Array(view) = &**cog {
                assert!(view.bounds_cached());
            }
        }

        policy.before_iterator(&h);

        let mut after = Vec::new();
        snapshots(&h, &mut after);
        assert_eq!(before.len(), after.len());
        assert!(before.iter().zip(&after).all(|(a, b)| Arc::ptr_eq(a, b)));
        assert!(check(&h).is_ok());
    }

    #[test]
    fn repairs_straddling_btree_before_descending() {
        let h = CogHandle::new(Cog::btree(array(&[1, 8, 2, 3]), 5, array(&[6, 0, 7, 9])));
        CrackerPolicy::new(1).before_iterator(&h);
        assert!(check(&h).is_ok());
        let mut keys: Vec<Key> = h.iter().map(|r| r.key).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![0, 1, 2, 3, 6, 7, 8, 9]);
    }
}
