//! ffp-insight core module
//!
//! This module contains the pieces every other module builds on:
//! - Configuration loading and validation
//! - Error types and handling
//! - Core data types
//! - Request rate limiting for remote services

pub mod config;
pub mod error;
pub mod rate_limit;
pub mod types;

pub use config::{AppConfig, ConfigError, ConfigResult};
pub use error::{FfpError, Result, Retryable};
pub use rate_limit::{RateLimitExceeded, RateLimiter};
pub use types::{ClubRecord, Compliance, Snapshot};
