//! Library configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, HSTS thresholds)
//! - The `InspectionConfig` type and logger option types

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{InspectionConfig, LogFormat, LogLevel};
