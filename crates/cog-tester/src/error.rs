//! Error types for the tester
//!
//! Every malformed command is fatal to the script that contains it; the
//! interpreter stops and hands the error, tagged with its line, back to the
//! caller.

use cog_core::{CogError, InvariantViolation};

/// Main tester error type
#[derive(Debug, thiserror::Error)]
pub enum TesterError {
    /// Unrecognized command word
    #[error("invalid test operation: {0}")]
    UnknownOperation(String),

    /// `array` with a fill mode other than random/sorted/explicit
    #[error("invalid array fill mode: {0}")]
    InvalidFillMode(String),

    /// Required argument absent
    #[error("'{op}' is missing argument <{arg}>")]
    MissingArgument {
        /// Command
        op: &'static str,
        /// Argument name
        arg: &'static str,
    },

    /// Argument present but not a number
    #[error("'{op}': cannot parse '{value}' as <{arg}>")]
    InvalidNumber {
        /// Command
        op: &'static str,
        /// Argument name
        arg: &'static str,
        /// Offending token
        value: String,
    },

    /// Argument parsed but out of range
    #[error("'{op}': {reason}")]
    InvalidArgument {
        /// Command
        op: &'static str,
        /// What is wrong
        reason: String,
    },

    /// Not enough structures on the stack
    #[error("'{op}' needs {needed} structure(s) on the stack, found {found}")]
    EmptyStack {
        /// Command
        op: &'static str,
        /// Operands required
        needed: usize,
        /// Operands available
        found: usize,
    },

    /// Engine error (policy selection, ranges)
    #[error(transparent)]
    Cog(#[from] CogError),

    /// `check` found a broken invariant
    #[error("invariant check failed: {0}")]
    Check(#[from] InvariantViolation),

    /// Error raised by a script line
    #[error("line {line}: {source}")]
    AtLine {
        /// 1-based line number
        line: usize,
        /// Underlying error
        #[source]
        source: Box<TesterError>,
    },

    /// Reading input or writing output failed
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl TesterError {
    /// Attach a script line number
    #[must_use]
    pub fn at_line(self, line: usize) -> Self {
        Self::AtLine {
            line,
            source: Box::new(self),
        }
    }

    /// Error with any line tag removed
    #[must_use]
    pub fn root(&self) -> &TesterError {
        match self {
            Self::AtLine { source, .. } => source.root(),
            other => other,
        }
    }
}
