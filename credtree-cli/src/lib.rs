//! credtree command line tool
//!
//! Loads one or two credential exports, builds their Merkle trees and
//! renders roots, levels and flagged rows in the terminal.
//!
//! ## Module Structure
//!
//! - `cli` - Argument definitions and command dispatch
//! - `config` - Configuration file loading
//! - `error` - CLI error type and exit codes
//! - `logging` - tracing subscriber setup
//! - `render` - Text and JSON rendering of trees and comparisons

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod render;

pub use cli::{run, Cli, Command};
pub use config::Config;
pub use error::CliError;
