//! Shared utilities for the Vouch review platform.

pub mod logging;

pub use logging::{init_tracing, LogFormat, LoggingError};
