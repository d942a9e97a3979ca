//! Rule Track
//!
//! Sets the Track (logging) option of access rules through a firewall
//! management API: select rules, validate the setting on the first one, fan
//! it out, then publish or discard inside a single editing session.

pub mod cli;
pub mod config;
pub mod console;
pub mod domain;
pub mod error;
pub mod mgmt;
pub mod prompt;
pub mod service;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
