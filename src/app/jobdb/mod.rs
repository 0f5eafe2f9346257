//! Local job database
//!
//! A CSV-backed cache of remote job metadata, keyed by job status, so that
//! listings and interactive selection do not have to query the service.
//!
//! # Module Organization
//!
//! - [`config`] - Configuration types and defaults
//! - [`format`] - Delimited-text encoding of the per-status files
//! - [`store`] - The database directory, freshness gate and atomic replacement
//! - [`refresh`] - Full rebuild from a [`JobSource`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use era5_fetcher::app::jobdb::{JobDatabase, JobDbConfig};
//! use era5_fetcher::app::models::JobStatus;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = JobDatabase::open(JobDbConfig::default()).await?;
//!
//! // Fails with `Missing` or `Stale` until `build_db` has run recently
//! for record in db.load(JobStatus::Successful).await? {
//!     println!("{} {} {}", record.request_id, record.variable, record.year);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod format;
pub mod refresh;
pub mod store;

// Re-export main public API
pub use config::JobDbConfig;
pub use refresh::{refresh, JobSource, RefreshSummary};
pub use store::{JobDatabase, StatusFileInfo};
