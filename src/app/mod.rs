//! Core application logic for ERA5 Fetcher
//!
//! This module contains the API client, the data models, request building,
//! the local job database, interactive selection and action dispatch.
//!
//! # Examples
//!
//! ```rust,no_run
//! use era5_fetcher::app::{jobdb, ClientConfig, DataStoresClient, JobDatabase, JobDbConfig};
//! use era5_fetcher::auth::Credentials;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::load()?;
//! let client = DataStoresClient::new(&credentials, ClientConfig::default()).await?;
//!
//! // Rebuild the job database, then read the finished jobs back
//! let db = JobDatabase::open(JobDbConfig::default()).await?;
//! let summary = jobdb::refresh(&db, &client, 100).await?;
//! println!("{} jobs cached", summary.total_jobs());
//!
//! let rows = db.load(era5_fetcher::app::JobStatus::Successful).await?;
//! for row in rows {
//!     println!("{} {} {}", row.request_id, row.variable, row.year);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod dispatch;
pub mod jobdb;
pub mod models;
pub mod request;
pub mod selection;

// Re-export main public API
pub use client::{ClientConfig, DataStoresClient};
pub use dispatch::{execute, Action, JobActions, Outcome};
pub use jobdb::{JobDatabase, JobDbConfig, JobSource, RefreshSummary, StatusFileInfo};
pub use models::{JobRecord, JobStatus, RemoteJob};
pub use request::{DataRequest, DataType};
pub use selection::{parse_selection, prompt_selection};
