//! Records and the shared, read-only buffers they live in
//!
//! A [`RecordStore`] is created once and never mutated. Structural nodes
//! address it through [`StoreView`]s, which are `(store, begin, end)`
//! triples: cloning a view or slicing it never copies records.

use crate::error::CogError;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Record key. Totally ordered.
pub type Key = i64;

/// Opaque record payload, carried verbatim through every rewrite.
pub type Value = u64;

/// Value paired with keys that are loaded from text or generated.
pub const SENTINEL_VALUE: Value = 0xDEAD_BEEF;

/// A single key/value record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Record {
    /// Ordering key
    pub key: Key,
    /// Payload (never inspected)
    pub value: Value,
}

impl Record {
    /// Create record
    #[inline]
    #[must_use]
    pub const fn new(key: Key, value: Value) -> Self {
        Self { key, value }
    }

    /// Create record carrying [`SENTINEL_VALUE`]
    #[inline]
    #[must_use]
    pub const fn with_sentinel(key: Key) -> Self {
        Self::new(key, SENTINEL_VALUE)
    }
}

/// Immutable, reference-counted record buffer
///
/// # Invariants
/// - Contents never change after construction
/// - Released once the last view into it is dropped
#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Arc<[Record]>,
}

impl RecordStore {
    /// Take ownership of a record buffer
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Build a store of sentinel-valued records from keys
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = Key>,
    {
        Self::new(keys.into_iter().map(Record::with_sentinel).collect())
    }

    /// Number of records in the store
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the store holds no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, in stored order
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    /// View over the whole store
    #[must_use]
    pub fn view(&self) -> StoreView {
        StoreView::new(self.clone(), 0, self.len())
    }

    /// View over `begin..end`
    ///
    /// # Errors
    /// Returns [`CogError::InvalidRange`] if the range is inverted or runs
    /// past the end of the store.
    pub fn slice(&self, begin: usize, end: usize) -> Result<StoreView, CogError> {
        if begin > end || end > self.len() {
            return Err(CogError::InvalidRange {
                begin,
                end,
                len: self.len(),
            });
        }
        Ok(StoreView::new(self.clone(), begin, end))
    }

    /// True if both handles refer to the same buffer
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }

    /// Number of live references to the buffer (store clones and views)
    #[inline]
    #[must_use]
    pub fn sharers(&self) -> usize {
        Arc::strong_count(&self.records)
    }
}

impl From<Vec<Record>> for RecordStore {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

/// Zero-copy window `begin..end` into a [`RecordStore`]
///
/// The smallest and largest key in view are computed on first request and
/// cached; clones made afterwards carry the cached value.
#[derive(Debug, Clone)]
pub struct StoreView {
    store: RecordStore,
    begin: usize,
    end: usize,
    bounds: OnceCell<Option<(Key, Key)>>,
}

impl StoreView {
    fn new(store: RecordStore, begin: usize, end: usize) -> Self {
        Self {
            store,
            begin,
            end,
            bounds: OnceCell::new(),
        }
    }

    /// Backing store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// First position (inclusive) in the backing store
    #[inline]
    #[must_use]
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// Last position (exclusive) in the backing store
    #[inline]
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of records in view
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    /// True if the view is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Records in view, in stored order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.store.as_slice()[self.begin..self.end]
    }

    /// Record at `offset` from the start of the view
    #[inline]
    #[must_use]
    pub fn get(&self, offset: usize) -> Option<&Record> {
        self.records().get(offset)
    }

    /// Split into `[0, mid)` and `[mid, len)` without copying
    ///
    /// `mid` is clamped to the view length.
    #[must_use]
    pub fn split_at(&self, mid: usize) -> (StoreView, StoreView) {
        let pivot = self.begin + mid.min(self.len());
        (
            StoreView::new(self.store.clone(), self.begin, pivot),
            StoreView::new(self.store.clone(), pivot, self.end),
        )
    }

    /// Smallest and largest key in view, `None` when empty
    ///
    /// One pass over the records the first time, O(1) afterwards.
    #[must_use]
    pub fn key_bounds(&self) -> Option<(Key, Key)> {
        *self.bounds.get_or_init(|| {
            self.records().iter().fold(None, |acc, r| match acc {
                None => Some((r.key, r.key)),
                Some((lo, hi)) => Some((lo.min(r.key), hi.max(r.key))),
            })
        })
    }

    #[cfg(test)]
    pub(crate) fn bounds_cached(&self) -> bool {
        self.bounds.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_rejects_bad_ranges() {
        let store = RecordStore::from_keys([1, 2, 3]);
        assert!(store.slice(0, 3).is_ok());
        assert!(store.slice(3, 3).is_ok());
        assert_eq!(
            store.slice(2, 1).unwrap_err(),
            CogError::InvalidRange {
                begin: 2,
                end: 1,
                len: 3
            }
        );
        assert!(store.slice(0, 4).is_err());
    }

    #[test]
    fn views_share_the_buffer() {
        let store = RecordStore::from_keys([4, 5, 6, 7]);
        let view = store.slice(1, 3).unwrap();
        assert!(view.store().ptr_eq(&store));
        assert_eq!(view.len(), 2);
        assert_eq!(view.records()[0].key, 5);
        assert_eq!(store.sharers(), 2);
        drop(view);
        assert_eq!(store.sharers(), 1);
    }

    #[test]
    fn split_at_clamps_and_keeps_order() {
        let view = RecordStore::from_keys([1, 2, 3, 4, 5]).slice(1, 4).unwrap();
        let (front, back) = view.split_at(1);
        assert_eq!(front.records().iter().map(|r| r.key).collect::<Vec<_>>(), vec![2]);
        assert_eq!(back.records().iter().map(|r| r.key).collect::<Vec<_>>(), vec![3, 4]);

        let (all, none) = view.split_at(99);
        assert_eq!(all.len(), 3);
        assert!(none.is_empty());
    }

    #[test]
    fn key_bounds_are_computed_once() {
        let view = RecordStore::from_keys([7, -3, 12, 0]).view();
        assert!(!view.bounds_cached());
        assert_eq!(view.key_bounds(), Some((-3, 12)));
        assert!(view.bounds_cached());
        assert!(view.clone().bounds_cached());

        let (front, back) = view.split_at(2);
        assert_eq!(front.key_bounds(), Some((-3, 7)));
        assert_eq!(back.key_bounds(), Some((0, 12)));
        assert_eq!(RecordStore::from_keys([]).view().key_bounds(), None);
    }

    #[test]
    fn sentinel_records() {
        let r = Record::with_sentinel(9);
        assert_eq!(r.key, 9);
        assert_eq!(r.value, SENTINEL_VALUE);
    }
}
