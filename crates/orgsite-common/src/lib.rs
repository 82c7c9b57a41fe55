//! Orgsite Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities and error handling for the orgsite workspace.
//!
//! # Overview
//!
//! - **Error Handling**: Common error type and result alias
//! - **Logging**: Centralized `tracing` subscriber setup
//! - **Datetime**: Canonical ISO-8601 serialization for persisted timestamps
//!
//! # Example
//!
//! ```no_run
//! use orgsite_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     Ok(())
//! }
//! ```

pub mod datetime;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{OrgsiteError, Result};
