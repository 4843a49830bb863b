//! Structural invariant checker
//!
//! Walks a tree carrying the key bounds implied by every enclosing BTree
//! separator and reports the first record outside them, or the first
//! SortedArray that is out of order. Iteration order equals key order
//! exactly when this check passes and every leaf is sorted.

use crate::cog::Cog;
use crate::error::InvariantViolation;
use crate::handle::CogHandle;
use crate::record::{Key, StoreView};

#[derive(Debug, Clone, Copy, Default)]
struct Bounds {
    lower: Option<Key>,
    upper: Option<Key>,
}

impl Bounds {
    fn admits(self, key: Key) -> bool {
        self.lower.map_or(true, |lo| key >= lo) && self.upper.map_or(true, |hi| key < hi)
    }

    fn below(self, sep: Key) -> Self {
        Self {
            lower: self.lower,
            upper: Some(self.upper.map_or(sep, |hi| hi.min(sep))),
        }
    }

    fn at_or_above(self, sep: Key) -> Self {
        Self {
            lower: Some(self.lower.map_or(sep, |lo| lo.max(sep))),
            upper: self.upper,
        }
    }
}

/// Verify SortedArray order and BTree separator membership
///
/// # Errors
/// Returns the first violation found, depth-first, left before right.
pub fn check(handle: &CogHandle) -> Result<(), InvariantViolation> {
    let mut path = String::from("root");
    check_node(handle, Bounds::default(), &mut path)
}

fn check_node(handle: &CogHandle, bounds: Bounds, path: &mut String) -> Result<(), InvariantViolation> {
    let cog = handle.get();
    match &*cog {
        Cog::Array(view) => check_bounds(view, bounds, path),
        Cog::SortedArray(view) => {
            check_sorted(view, path)?;
            check_bounds(view, bounds, path)
        }
        Cog::Concat { left, right } => {
            check_child(left, bounds, path, "L")?;
            check_child(right, bounds, path, "R")
        }
        Cog::BTree { left, sep, right } => {
            check_child(left, bounds.below(*sep), path, "L")?;
            check_child(right, bounds.at_or_above(*sep), path, "R")
        }
    }
}

fn check_child(
    child: &CogHandle,
    bounds: Bounds,
    path: &mut String,
    step: &str,
) -> Result<(), InvariantViolation> {
    let len = path.len();
    path.push('/');
    path.push_str(step);
    let result = check_node(child, bounds, path);
    path.truncate(len);
    result
}

fn check_sorted(view: &StoreView, path: &str) -> Result<(), InvariantViolation> {
    let records = view.records();
    match records.windows(2).position(|pair| pair[0].key > pair[1].key) {
        Some(i) => Err(InvariantViolation::Unsorted {
            path: path.to_string(),
            offset: i + 1,
            prev: records[i].key,
            key: records[i + 1].key,
        }),
        None => Ok(()),
    }
}

fn check_bounds(view: &StoreView, bounds: Bounds, path: &str) -> Result<(), InvariantViolation> {
    match view.records().iter().find(|r| !bounds.admits(r.key)) {
        Some(r) => Err(InvariantViolation::SeparatorViolated {
            path: path.to_string(),
            key: r.key,
            lower: bounds.lower,
            upper: bounds.upper,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordStore;

    fn array(keys: &[Key]) -> CogHandle {
        CogHandle::new(Cog::Array(RecordStore::from_keys(keys.iter().copied()).view()))
    }

    fn sorted(keys: &[Key]) -> CogHandle {
        CogHandle::new(Cog::SortedArray(RecordStore::from_keys(keys.iter().copied()).view()))
    }

    #[test]
    fn plain_structures_pass() {
        assert!(check(&array(&[3, 1, 2])).is_ok());
        assert!(check(&CogHandle::new(Cog::concat(array(&[9]), array(&[1])))).is_ok());
        assert!(check(&sorted(&[])).is_ok());
    }

    #[test]
    fn unsorted_label_is_reported() {
        let err = check(&sorted(&[1, 4, 2])).unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::Unsorted {
                path: "root".into(),
                offset: 2,
                prev: 4,
                key: 2
            }
        );
    }

    #[test]
    fn nested_bounds_are_enforced() {
        // 6 sits left of the outer separator 5 but right of the inner 3.
        let inner = CogHandle::new(Cog::btree(array(&[1]), 3, array(&[4, 6])));
        let root = CogHandle::new(Cog::btree(inner, 5, array(&[7])));
        let err = check(&root).unwrap_err();
        assert_eq!(err.path(), "root/L/R");
        assert!(matches!(
            err,
            InvariantViolation::SeparatorViolated {
                key: 6,
                lower: Some(3),
                upper: Some(5),
                ..
            }
        ));
    }

    #[test]
    fn separator_itself_belongs_right() {
        assert!(check(&CogHandle::new(Cog::btree(array(&[4]), 5, array(&[5])))).is_ok());
        assert!(check(&CogHandle::new(Cog::btree(array(&[5]), 5, array(&[6])))).is_err());
    }
}
