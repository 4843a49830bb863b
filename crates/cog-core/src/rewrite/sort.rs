//! Full sort of an unsorted leaf

use crate::cog::Cog;
use crate::handle::CogHandle;
use crate::record::RecordStore;

/// Replace an Array with a SortedArray over a key-sorted copy
///
/// No-op for every other variant and for empty arrays. O(n log n); equal
/// keys may be reordered.
pub fn sort_array(handle: &CogHandle) {
    let cog = handle.get();
    let Cog::Array(view) = &*cog else {
        return;
    };
    if view.is_empty() {
        return;
    }

    let mut records = view.records().to_vec();
    records.sort_unstable_by_key(|r| r.key);
    tracing::debug!(records = records.len(), "sort_array");

    handle.put(Cog::SortedArray(RecordStore::new(records).view()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cog::CogKind;
    use crate::record::Key;
    use std::sync::Arc;

    fn keys(h: &CogHandle) -> Vec<Key> {
        h.iter().map(|r| r.key).collect()
    }

    #[test]
    fn sorts_array() {
        let h = CogHandle::new(Cog::Array(RecordStore::from_keys([3, 1, 2, 1]).view()));
        sort_array(&h);
        assert_eq!(h.get().kind(), CogKind::SortedArray);
        assert_eq!(keys(&h), vec![1, 1, 2, 3]);
    }

    #[test]
    fn leaves_source_store_untouched() {
        let store = RecordStore::from_keys([2, 1]);
        let h = CogHandle::new(Cog::Array(store.view()));
        sort_array(&h);
        assert_eq!(store.as_slice()[0].key, 2);
    }

    #[test]
    fn sorted_array_is_left_alone() {
        let h = CogHandle::new(Cog::SortedArray(RecordStore::from_keys([1, 2]).view()));
        let before = h.get();
        sort_array(&h);
        assert!(Arc::ptr_eq(&before, &h.get()));
    }

    #[test]
    fn empty_array_is_left_alone() {
        let h = CogHandle::new(Cog::array_of(Vec::new()));
        let before = h.get();
        sort_array(&h);
        assert!(Arc::ptr_eq(&before, &h.get()));
    }
}
