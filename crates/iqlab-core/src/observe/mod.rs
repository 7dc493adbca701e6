//! # Observability
//!
//! Structured logging for the synthesis engine and the tools built on it.
//! Diagnostics go through `tracing`; operator-facing notices are printed by
//! the command-line tools themselves.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
