//! Tester configuration
//!
//! Loaded from TOML; every field is optional.
//!
//! ```toml
//! seed = 7
//! default_policy = "cracker"
//! cracker_min_size = 128
//! echo_commands = true
//! log_filter = "cog_core=debug"
//! ```

use crate::error::TesterError;
use cog_core::{PolicyKind, Value, SENTINEL_VALUE};
use serde::Deserialize;
use std::path::Path;

/// Tester configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TesterConfig {
    /// Seed for random arrays and the simulator
    pub seed: u64,
    /// Value paired with every generated or loaded key
    pub sentinel_value: Value,
    /// Policy active when the interpreter starts
    pub default_policy: String,
    /// Threshold for `default_policy = "cracker"`
    pub cracker_min_size: usize,
    /// Echo each command before its output
    pub echo_commands: bool,
    /// Tracing filter directive
    pub log_filter: Option<String>,
}

impl TesterConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns [`TesterError::Config`] on malformed TOML or unknown fields.
    pub fn from_toml_str(text: &str) -> Result<Self, TesterError> {
        let config: Self = toml::from_str(text).map_err(|e| TesterError::Config(e.to_string()))?;
        config.initial_policy()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns [`TesterError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: &Path) -> Result<Self, TesterError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// With seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// With starting policy
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, name: &str, min_size: usize) -> Self {
        self.default_policy = name.to_string();
        self.cracker_min_size = min_size;
        self
    }

    /// With command echo
    #[inline]
    #[must_use]
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo_commands = echo;
        self
    }

    /// Resolve `default_policy`
    ///
    /// # Errors
    /// Returns [`TesterError::Config`] if the name is not a known policy.
    pub fn initial_policy(&self) -> Result<PolicyKind, TesterError> {
        PolicyKind::parse(&self.default_policy, Some(self.cracker_min_size))
            .map_err(|e| TesterError::Config(e.to_string()))
    }
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            sentinel_value: SENTINEL_VALUE,
            default_policy: "naive".to_string(),
            cracker_min_size: 64,
            echo_commands: false,
            log_filter: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        assert_eq!(TesterConfig::from_toml_str("").unwrap(), TesterConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = TesterConfig::from_toml_str(
            "seed = 7\ndefault_policy = \"cracker\"\ncracker_min_size = 16\n",
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.initial_policy().unwrap(), PolicyKind::Cracker { min_size: 16 });
        assert!(!config.echo_commands);
    }

    #[test]
    fn rejects_unknown_policy_and_fields() {
        assert!(matches!(
            TesterConfig::from_toml_str("default_policy = \"greedy\""),
            Err(TesterError::Config(_))
        ));
        assert!(matches!(
            TesterConfig::from_toml_str("colour = \"blue\""),
            Err(TesterError::Config(_))
        ));
    }

    #[test]
    fn builders() {
        let config = TesterConfig::new().with_seed(3).with_policy("cracker", 5).with_echo(true);
        assert_eq!(config.seed, 3);
        assert_eq!(config.initial_policy().unwrap(), PolicyKind::Cracker { min_size: 5 });
        assert!(config.echo_commands);
    }
}
