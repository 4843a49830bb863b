//! Cog rewrite engine
//!
//! Adaptive, lazily-reorganizing indexed sequences ("database cracking").
//! A logical sequence of key/value records is a tree of immutable structural
//! nodes. Scans can trigger small, local reorganizations of that tree so
//! later scans get cheaper, without ever sorting or rebuilding it up front.
//!
//! # Core Concepts
//!
//! - [`RecordStore`] / [`StoreView`]: shared read-only buffers and
//!   zero-copy windows into them
//! - [`Cog`]: Array, SortedArray, Concat or BTree
//! - [`CogHandle`]: replaceable cell holding the current Cog snapshot
//! - [`CogIter`]: lazy traversal in structural order
//! - [`rewrite`]: sort/split/pushdown plus tree-walking drivers
//! - [`RewritePolicy`]: pre-scan hook deciding what to rewrite
//!
//! # Example
//!
//! ```rust
//! use cog_core::{Cog, CogHandle, RecordStore, rewrite};
//!
//! let store = RecordStore::from_keys([5, 3, 8, 1, 9, 2]);
//! let root = CogHandle::new(Cog::Array(store.view()));
//!
//! rewrite::split_array(5, &root);
//! rewrite::recur_top_down(&rewrite::sort_array, &root);
//!
//! let keys: Vec<i64> = root.iter().map(|r| r.key).collect();
//! assert_eq!(keys, vec![1, 2, 3, 5, 8, 9]);
//! ```

#![warn(unreachable_pub)]

mod check;
mod cog;
mod error;
mod handle;
mod iter;
mod record;
mod scan;

pub mod policy;
pub mod rewrite;

pub use check::check;
pub use cog::{Cog, CogKind};
pub use error::{CogError, InvariantViolation};
pub use handle::CogHandle;
pub use iter::CogIter;
pub use policy::{CrackerPolicy, NaivePolicy, PolicyKind, RewritePolicy};
pub use record::{Key, Record, RecordStore, StoreView, Value, SENTINEL_VALUE};
pub use rewrite::{Reach, RewriteOp};
pub use scan::{prepare, scan, scan_with, ScanReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
