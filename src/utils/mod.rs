//! Utility modules for common functionality
//!
//! Logging, progress reporting and write alignment helpers shared across the crate.

pub mod logger;
pub mod progress;
pub(crate) mod write_utils;
