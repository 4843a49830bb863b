//! Tracing subscriber setup for the binary
//!
//! Filter precedence: explicit directive, then `RUST_LOG`, then `warn`.
//! Output goes to stderr so it never mixes with the command report.

use crate::error::TesterError;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// # Errors
/// Returns [`TesterError::Config`] for an unparsable filter or when a
/// subscriber is already installed.
pub fn init_logging(filter: Option<&str>, json: bool) -> Result<(), TesterError> {
    let filter = match filter {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|e| TesterError::Config(format!("invalid log filter '{directive}': {e}")))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| TesterError::Config(e.to_string()))
}
