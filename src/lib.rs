//! ERA5 Fetcher Library
//!
//! Submit, track and download ERA5 daily statistics jobs on the ECMWF Data
//! Stores, with a local per-status job database for interactive selection.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
