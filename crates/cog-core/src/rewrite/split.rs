//! Cracking an unsorted leaf around one key

use super::partition_by_key;
use crate::cog::Cog;
use crate::handle::CogHandle;
use crate::record::{Key, RecordStore};

/// Crack an Array around `target`
///
/// One partition pass over a copy of the records; both halves become
/// Array views into the same new store and the handle becomes
/// `BTree(below, target, at_or_above)`.
///
/// No-op unless the handle holds an Array with records on both sides of
/// `target`: a split that separates nothing would only add an empty leaf,
/// and splitting the non-empty half again at the same key would never end.
pub fn split_array(target: Key, handle: &CogHandle) {
    let cog = handle.get();
    let Cog::Array(view) = &*cog else {
        return;
    };

    let mut records = view.records().to_vec();
    let below = partition_by_key(&mut records, target);
    if below == 0 || below == records.len() {
        tracing::trace!(target, records = records.len(), "split_array: nothing to separate");
        return;
    }
    tracing::debug!(target, below, above = records.len() - below, "split_array");

    let (left, right) = RecordStore::new(records).view().split_at(below);
    handle.put(Cog::btree(
        CogHandle::new(Cog::Array(left)),
        target,
        CogHandle::new(Cog::Array(right)),
    ));
}

/// [`split_array`] with the target bound, for the recursive drivers
pub fn make_split_array(target: Key) -> impl Fn(&CogHandle) {
    move |handle: &CogHandle| split_array(target, handle)
}
