//! Error types for the Cog engine
//!
//! Rewrite operations never fail: an inapplicable rewrite is a no-op.
//! Errors only arise at the edges (view construction, policy selection)
//! and from the invariant checker.

use crate::record::Key;

/// Main error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CogError {
    /// Store range is inverted or out of bounds
    #[error("invalid store range {begin}..{end} for store of {len} records")]
    InvalidRange {
        /// Requested start
        begin: usize,
        /// Requested end
        end: usize,
        /// Store length
        len: usize,
    },

    /// No policy with this name
    #[error("unknown rewrite policy: {0}")]
    UnknownPolicy(String),

    /// Policy needs a parameter that was not given
    #[error("policy '{0}' requires a size threshold")]
    MissingPolicyArgument(String),

    /// Structural invariant violated
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Structural invariant violation found by [`crate::check`]
///
/// `path` locates the offending node from the root, e.g. `root/L/R`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// SortedArray whose keys decrease somewhere
    #[error("sorted array at {path} out of order at offset {offset}: {prev} > {key}")]
    Unsorted {
        /// Node location
        path: String,
        /// Offset of the first out-of-order record
        offset: usize,
        /// Key before it
        prev: Key,
        /// Offending key
        key: Key,
    },

    /// Key outside the range implied by the enclosing separators
    #[error("key {key} at {path} outside bounds [{lower:?}, {upper:?})")]
    SeparatorViolated {
        /// Node location
        path: String,
        /// Offending key
        key: Key,
        /// Inclusive lower bound, if any
        lower: Option<Key>,
        /// Exclusive upper bound, if any
        upper: Option<Key>,
    },
}

impl InvariantViolation {
    /// Location of the offending node
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Unsorted { path, .. } | Self::SeparatorViolated { path, .. } => path,
        }
    }
}
