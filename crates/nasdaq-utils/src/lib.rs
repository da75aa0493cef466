//! Shared utilities for the NASDAQ stock agent
//!
//! Tracing initialisation for binaries and typed readers for environment
//! configuration.

pub mod config;
pub mod logging;

pub use config::{EnvError, env_or, env_parse, env_string};
pub use logging::{LogFormat, init_tracing};
