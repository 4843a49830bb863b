//! Moving records one level down to restore separator membership

use super::partition_by_key;
use crate::cog::Cog;
use crate::handle::CogHandle;
use crate::record::{Key, Record, RecordStore};

/// Push array records one level down, restoring separator membership
///
/// - `BTree(A, sep, B)`: records of A at or above `sep` and records of B
///   below it are moved across. Strays are found from key bounds, so only
///   the leaves that hold them are rewritten: the rest of each child,
///   including nested splits and sorted leaves, is kept as it was. A sorted
///   leaf gives up its strays by view. Received records are merged into the
///   child when it is an unsorted Array and appended as a trailing Array
///   otherwise. Afterwards both children satisfy the separator; a BTree
///   whose children already do is left alone after a walk over node bounds
///   that reads no records.
/// - `Concat(BTree(A, sep, B), C)` with C a leaf (either order): C is
///   partitioned around `sep` and becomes
///   `BTree(Concat(A, C<sep), sep, Concat(B, C>=sep))`, keeping the
///   structural order of the Concat. A sorted C is split by view without
///   copying.
///
/// Anything else is a no-op. No record is created, dropped or altered.
pub fn pushdown_array(handle: &CogHandle) {
    let cog = handle.get();
    match &*cog {
        Cog::BTree { left, sep, right } => repair_separator(handle, left, *sep, right),
        Cog::Concat { left, right } => push_below_btree(handle, left, right),
        Cog::Array(_) | Cog::SortedArray(_) => {}
    }
}

fn repair_separator(handle: &CogHandle, left: &CogHandle, sep: Key, right: &CogHandle) {
    let (new_left, up) = extract(left, sep, Side::Below);
    let (new_right, down) = extract(right, sep, Side::AtOrAbove);
    if up.is_empty() && down.is_empty() {
        return;
    }
    tracing::debug!(
        sep,
        moved_right = up.len(),
        moved_left = down.len(),
        "pushdown_array: repairing separator"
    );

    handle.put(Cog::btree(receive(new_left, down), sep, receive(new_right, up)));
}

/// Which side of a separator a subtree belongs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Below,
    AtOrAbove,
}

impl Side {
    fn keeps(self, key: Key, sep: Key) -> bool {
        match self {
            Self::Below => key < sep,
            Self::AtOrAbove => key >= sep,
        }
    }

    fn has_strays(self, bounds: Option<(Key, Key)>, sep: Key) -> bool {
        bounds.is_some_and(|(lo, hi)| match self {
            Self::Below => hi >= sep,
            Self::AtOrAbove => lo < sep,
        })
    }
}

// Remove the records of `subtree` that do not belong on `side`, keeping its
// shape. Subtrees whose key bounds are already on the right side are reused
// untouched, so only the leaves holding strays are copied. Composites that
// end up with an empty child collapse into the other one.
fn extract(subtree: &CogHandle, sep: Key, side: Side) -> (CogHandle, Vec<Record>) {
    let cog = subtree.get();
    if !side.has_strays(cog.key_bounds(), sep) {
        return (subtree.clone(), Vec::new());
    }

    match &*cog {
        Cog::Array(view) => {
            let (kept, moved): (Vec<Record>, Vec<Record>) =
                view.records().iter().copied().partition(|r| side.keeps(r.key, sep));
            (CogHandle::new(Cog::array_of(kept)), moved)
        }
        Cog::SortedArray(view) => {
            let mid = view.records().partition_point(|r| r.key < sep);
            let (below, above) = view.split_at(mid);
            let (kept, moved) = match side {
                Side::Below => (below, above),
                Side::AtOrAbove => (above, below),
            };
            (CogHandle::new(Cog::SortedArray(kept)), moved.records().to_vec())
        }
        Cog::Concat { left, right } => {
            let (l, mut moved) = extract(left, sep, side);
            let (r, more) = extract(right, sep, side);
            moved.extend(more);
            (join(l, r, Cog::concat), moved)
        }
        Cog::BTree { left, sep: inner, right } => {
            let (l, mut moved) = extract(left, sep, side);
            let (r, more) = extract(right, sep, side);
            moved.extend(more);
            let inner = *inner;
            (join(l, r, |l, r| Cog::btree(l, inner, r)), moved)
        }
    }
}

fn join(
    left: CogHandle,
    right: CogHandle,
    make: impl FnOnce(CogHandle, CogHandle) -> Cog,
) -> CogHandle {
    if left.size() == 0 {
        right
    } else if right.size() == 0 {
        left
    } else {
        CogHandle::new(make(left, right))
    }
}

// Append records that crossed the separator. An unsorted Array absorbs them;
// anything else keeps its structure and gets them as a trailing Array.
fn receive(side: CogHandle, incoming: Vec<Record>) -> CogHandle {
    if incoming.is_empty() {
        return side;
    }
    let cog = side.get();
    match &*cog {
        Cog::Array(view) => {
            let mut records = view.records().to_vec();
            records.extend(incoming);
            CogHandle::new(Cog::array_of(records))
        }
        _ if cog.size() == 0 => CogHandle::new(Cog::array_of(incoming)),
        Cog::SortedArray(_) | Cog::Concat { .. } | Cog::BTree { .. } => {
            CogHandle::new(Cog::concat(side, CogHandle::new(Cog::array_of(incoming))))
        }
    }
}

fn push_below_btree(handle: &CogHandle, left: &CogHandle, right: &CogHandle) {
    let (front, back) = (left.get(), right.get());
    match (&*front, &*back) {
        (Cog::BTree { left: low, sep, right: high }, leaf) if leaf.is_leaf() => {
            let (below, above) = split_leaf(leaf, *sep);
            tracing::debug!(sep, records = leaf.size(), "pushdown_array: array below btree");
            handle.put(Cog::btree(
                attach(low, below, false),
                *sep,
                attach(high, above, false),
            ));
        }
        (leaf, Cog::BTree { left: low, sep, right: high }) if leaf.is_leaf() => {
            let (below, above) = split_leaf(leaf, *sep);
            tracing::debug!(sep, records = leaf.size(), "pushdown_array: array below btree");
            handle.put(Cog::btree(
                attach(low, below, true),
                *sep,
                attach(high, above, true),
            ));
        }
        _ => {}
    }
}

// Split a leaf around `sep`. Empty halves come back as `None`.
fn split_leaf(leaf: &Cog, sep: Key) -> (Option<Cog>, Option<Cog>) {
    let (below, above) = match leaf {
        Cog::SortedArray(view) => {
            let mid = view.records().partition_point(|r| r.key < sep);
            let (below, above) = view.split_at(mid);
            (Cog::SortedArray(below), Cog::SortedArray(above))
        }
        Cog::Array(view) => {
            let mut records = view.records().to_vec();
            let mid = partition_by_key(&mut records, sep);
            let (below, above) = RecordStore::new(records).view().split_at(mid);
            (Cog::Array(below), Cog::Array(above))
        }
        Cog::Concat { .. } | Cog::BTree { .. } => return (None, None),
    };
    let keep = |cog: Cog| (cog.size() > 0).then_some(cog);
    (keep(below), keep(above))
}

fn attach(subtree: &CogHandle, part: Option<Cog>, part_first: bool) -> CogHandle {
    let Some(part) = part else {
        return subtree.clone();
    };
    let part = CogHandle::new(part);
    if part_first {
        CogHandle::new(Cog::concat(part, subtree.clone()))
    } else {
        CogHandle::new(Cog::concat(subtree.clone(), part))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::check;
    use crate::cog::CogKind;
    use std::sync::Arc;

    fn array(keys: &[Key]) -> CogHandle {
        CogHandle::new(Cog::Array(RecordStore::from_keys(keys.iter().copied()).view()))
    }

    fn sorted(keys: &[Key]) -> CogHandle {
        CogHandle::new(Cog::SortedArray(RecordStore::from_keys(keys.iter().copied()).view()))
    }

    fn multiset(h: &CogHandle) -> Vec<Key> {
        let mut keys: Vec<Key> = h.iter().map(|r| r.key).collect();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn repairs_straddling_arrays() {
        let h = CogHandle::new(Cog::btree(array(&[1, 7, 3]), 5, array(&[6, 2, 9])));
        assert!(check(&h).is_err());
        let before = multiset(&h);

        pushdown_array(&h);

        assert!(check(&h).is_ok());
        assert_eq!(multiset(&h), before);
        let cog = h.get();
        let (left, right) = cog.children().unwrap();
        assert_eq!(multiset(left), vec![1, 2, 3]);
        assert_eq!(multiset(right), vec![6, 7, 9]);
    }

    #[test]
    fn clean_btree_is_untouched() {
        let h = CogHandle::new(Cog::btree(array(&[1, 2]), 5, array(&[5, 8])));
        let before = h.get();
        pushdown_array(&h);
        assert!(Arc::ptr_eq(&before, &h.get()));
    }

    #[test]
    fn clean_composite_child_keeps_structure() {
        let inner = CogHandle::new(Cog::btree(sorted(&[1]), 2, sorted(&[3])));
        let h = CogHandle::new(Cog::btree(inner.clone(), 5, array(&[4, 6])));

        pushdown_array(&h);

        assert!(check(&h).is_ok());
        let cog = h.get();
        let (left, _) = cog.children().unwrap();
        let left = left.get();
        let Cog::Concat { left: kept, .. } = &*left else {
            panic!("expected Concat, got {}", left.kind());
        };
        assert!(kept.ptr_eq(&inner));
    }

    #[test]
    fn nested_btree_keeps_shape_when_one_record_leaves() {
        let low = sorted(&[1, 2, 3, 4]);
        let inner = CogHandle::new(Cog::btree(low.clone(), 5, sorted(&[5, 6, 7, 8, 99])));
        let h = CogHandle::new(Cog::btree(inner, 50, array(&[60, 70])));
        let before = multiset(&h);

        pushdown_array(&h);

        assert!(check(&h).is_ok());
        assert_eq!(multiset(&h), before);
        let cog = h.get();
        let (left, right) = cog.children().unwrap();
        let left = left.get();
        let Cog::BTree { left: a, sep, right: b } = &*left else {
            panic!("expected BTree, got {}", left.kind());
        };
        assert_eq!(*sep, 5);
        assert!(a.ptr_eq(&low));
        assert_eq!(b.get().kind(), CogKind::SortedArray);
        assert_eq!(b.size(), 4);
        assert_eq!(right.get().kind(), CogKind::Array);
        assert_eq!(multiset(right), vec![60, 70, 99]);
    }

    #[test]
    fn stray_side_that_empties_collapses() {
        let inner = CogHandle::new(Cog::concat(sorted(&[1, 2]), array(&[8, 9])));
        let h = CogHandle::new(Cog::btree(inner, 5, sorted(&[6])));

        pushdown_array(&h);

        assert!(check(&h).is_ok());
        let cog = h.get();
        let (left, right) = cog.children().unwrap();
        assert_eq!(left.get().kind(), CogKind::SortedArray);
        assert_eq!(multiset(left), vec![1, 2]);
        assert_eq!(right.get().kind(), CogKind::Concat);
        assert_eq!(multiset(right), vec![6, 8, 9]);
    }

    #[test]
    fn clean_repair_reads_only_cached_bounds() {
        let a = array(&[3, 1, 2]);
        let b = array(&[9, 5, 7]);
        let h = CogHandle::new(Cog::btree(a.clone(), 5, b.clone()));

        pushdown_array(&h);
        for leaf in [&a, &b] {
            assert!(leaf.get().leaf_view().unwrap().bounds_cached());
        }

        let before = h.get();
        pushdown_array(&h);
        assert!(Arc::ptr_eq(&before, &h.get()));
    }

    #[test]
    fn pushes_array_below_btree() {
        let tree = CogHandle::new(Cog::btree(array(&[1, 2]), 5, array(&[6])));
        let h = CogHandle::new(Cog::concat(tree, array(&[9, 0, 5])));
        let before = multiset(&h);

        pushdown_array(&h);

        let cog = h.get();
        assert_eq!(cog.kind(), CogKind::BTree);
        assert!(check(&h).is_ok());
        assert_eq!(multiset(&h), before);
        let keys: Vec<Key> = h.iter().map(|r| r.key).collect();
        assert_eq!(keys.len(), 6);
        assert_eq!(&keys[..2], &[1, 2]);
    }

    #[test]
    fn sorted_array_in_front_splits_by_view() {
        let tree = CogHandle::new(Cog::btree(array(&[3]), 4, array(&[4])));
        let front = sorted(&[1, 2, 5, 6]);
        let h = CogHandle::new(Cog::concat(front, tree));

        pushdown_array(&h);

        let keys: Vec<Key> = h.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![1, 2, 3, 5, 6, 4]);
        assert!(check(&h).is_ok());
    }

    #[test]
    fn concat_of_leaves_is_a_noop() {
        let h = CogHandle::new(Cog::concat(array(&[1]), array(&[2])));
        let before = h.get();
        pushdown_array(&h);
        assert!(Arc::ptr_eq(&before, &h.get()));
    }
}
