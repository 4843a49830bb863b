//! Record buffers for the `array` command
//!
//! Every generated or parsed key is paired with the configured sentinel
//! value. A buffer is wrapped whole into a single leaf.

use crate::error::TesterError;
use cog_core::{Cog, CogHandle, Key, Record, RecordStore, Value};
use rand::Rng;

/// `len` keys drawn uniformly from `[0, max)`
///
/// # Errors
/// Returns [`TesterError::InvalidArgument`] when `max` is not positive and
/// `len` is non-zero.
pub fn build_buffer<R: Rng>(
    rng: &mut R,
    len: usize,
    max: Key,
    value: Value,
) -> Result<RecordStore, TesterError> {
    if len > 0 && max <= 0 {
        return Err(TesterError::InvalidArgument {
            op: "array",
            reason: format!("<max> must be positive, got {max}"),
        });
    }
    let records = (0..len)
        .map(|_| Record::new(rng.random_range(0..max), value))
        .collect();
    Ok(RecordStore::new(records))
}

/// Buffer holding `keys` in order
pub fn load_buffer<I>(keys: I, value: Value) -> RecordStore
where
    I: IntoIterator<Item = Key>,
{
    RecordStore::new(keys.into_iter().map(|key| Record::new(key, value)).collect())
}

/// Unsorted leaf spanning the whole buffer
#[must_use]
pub fn array_for_buffer(store: &RecordStore) -> CogHandle {
    CogHandle::new(Cog::Array(store.view()))
}

/// Random unsorted leaf
///
/// # Errors
/// As [`build_buffer`].
pub fn build_random_array<R: Rng>(
    rng: &mut R,
    len: usize,
    max: Key,
    value: Value,
) -> Result<CogHandle, TesterError> {
    build_buffer(rng, len, max, value).map(|store| array_for_buffer(&store))
}

/// Random leaf, sorted before wrapping
///
/// # Errors
/// As [`build_buffer`].
pub fn build_random_sorted_array<R: Rng>(
    rng: &mut R,
    len: usize,
    max: Key,
    value: Value,
) -> Result<CogHandle, TesterError> {
    let store = build_buffer(rng, len, max, value)?;
    let mut records = store.as_slice().to_vec();
    records.sort_by_key(|r| r.key);
    Ok(CogHandle::new(Cog::SortedArray(RecordStore::new(records).view())))
}
