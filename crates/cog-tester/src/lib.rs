//! Cog tester
//!
//! Script interpreter and randomized simulator for exercising the Cog
//! rewrite engine from the command line.
//!
//! ```rust
//! use cog_tester::{CogTester, TesterConfig};
//!
//! let mut tester = CogTester::new(TesterConfig::default(), Vec::new()).unwrap();
//! tester.run("array explicit 3 1 2\nsize\n".as_bytes()).unwrap();
//! assert_eq!(tester.into_output(), b"Size: 3 records\n");
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod interpreter;
pub mod loader;
pub mod logging;
pub mod simulator;

pub use config::TesterConfig;
pub use error::TesterError;
pub use interpreter::{CogTester, Command, Fill};
pub use simulator::{run_simulator, SimulatorConfig, SimulatorReport, Violation};
