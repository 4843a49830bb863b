//! Testing utilities for the Cog workspace
//!
//! Shared fixtures and assertions.

#![allow(missing_docs)]

use cog_core::{Cog, CogHandle, Key, Record, RecordStore};

pub fn array_handle(keys: &[Key]) -> CogHandle {
    CogHandle::new(Cog::Array(RecordStore::from_keys(keys.iter().copied()).view()))
}

/// Sorts `keys` first, so the label is honest.
pub fn sorted_handle(keys: &[Key]) -> CogHandle {
    let mut keys = keys.to_vec();
    keys.sort_unstable();
    CogHandle::new(Cog::SortedArray(RecordStore::from_keys(keys).view()))
}

pub fn btree_handle(left: CogHandle, sep: Key, right: CogHandle) -> CogHandle {
    CogHandle::new(Cog::btree(left, sep, right))
}

pub fn concat_handle(left: CogHandle, right: CogHandle) -> CogHandle {
    CogHandle::new(Cog::concat(left, right))
}

/// Keys in iteration order
pub fn keys_of(handle: &CogHandle) -> Vec<Key> {
    handle.iter().map(|r| r.key).collect()
}

/// Keys in ascending order, duplicates kept
pub fn key_multiset(handle: &CogHandle) -> Vec<Key> {
    let mut keys = keys_of(handle);
    keys.sort_unstable();
    keys
}

/// Records in ascending order, duplicates kept
pub fn record_multiset(handle: &CogHandle) -> Vec<Record> {
    let mut records: Vec<Record> = handle.iter().collect();
    records.sort_unstable();
    records
}

pub fn is_non_decreasing(keys: &[Key]) -> bool {
    keys.windows(2).all(|pair| pair[0] <= pair[1])
}

/// Child handles of a composite, panicking on leaves
pub fn children_of(handle: &CogHandle) -> (CogHandle, CogHandle) {
    let cog = handle.get();
    let (left, right) = cog
        .children()
        .unwrap_or_else(|| panic!("expected composite, found {}", cog.kind()));
    (left.clone(), right.clone())
}
