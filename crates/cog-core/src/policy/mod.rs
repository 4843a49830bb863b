//! Rewrite policies
//!
//! A [`RewritePolicy`] runs once before a scan opens its iterator and may
//! rewrite the handle (and its descendants) to make this and later scans
//! cheaper. The set of policies is closed; [`PolicyKind`] names them and
//! builds them from a name plus optional threshold.

mod cracker;
mod naive;

pub use cracker::CrackerPolicy;
pub use naive::NaivePolicy;

use crate::error::CogError;
use crate::handle::CogHandle;
use std::fmt;

/// Pre-scan rewrite hook
///
/// Swapping policies between scans never undoes rewrites an earlier policy
/// already installed.
pub trait RewritePolicy: fmt::Debug {
    /// Called once before an iterator is built for `handle`
    fn before_iterator(&self, handle: &CogHandle);

    /// Policy name (for reporting)
    fn name(&self) -> &'static str;
}

/// Selectable policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    /// [`NaivePolicy`]
    #[default]
    Naive,
    /// [`CrackerPolicy`] with its minimum subtree size
    Cracker {
        /// Subtrees at or below this size are left alone
        min_size: usize,
    },
}

impl PolicyKind {
    /// Resolve a policy name and its optional threshold
    ///
    /// # Errors
    /// - [`CogError::UnknownPolicy`] for names other than `naive`/`cracker`
    /// - [`CogError::MissingPolicyArgument`] for `cracker` without a size
    pub fn parse(name: &str, min_size: Option<usize>) -> Result<Self, CogError> {
        match name {
            "naive" => Ok(Self::Naive),
            "cracker" => min_size
                .map(|min_size| Self::Cracker { min_size })
                .ok_or_else(|| CogError::MissingPolicyArgument(name.to_string())),
            other => Err(CogError::UnknownPolicy(other.to_string())),
        }
    }

    /// Instantiate
    #[must_use]
    pub fn build(self) -> Box<dyn RewritePolicy> {
        match self {
            Self::Naive => Box::new(NaivePolicy),
            Self::Cracker { min_size } => Box::new(CrackerPolicy::new(min_size)),
        }
    }
}
