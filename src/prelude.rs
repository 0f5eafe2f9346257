//! Prelude module for ERA5 Fetcher Library
//!
//! This module re-exports the most commonly used items from the library,
//! so typical integrations need a single `use era5_fetcher::prelude::*;`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use era5_fetcher::prelude::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let credentials = Credentials::load()?;
//!     let client = DataStoresClient::new(&credentials, ClientConfig::default()).await?;
//!
//!     let request = DataRequest::build(DataType::SingleLevel, "2m_temperature", 1990, None)?;
//!     let bytes = client
//!         .retrieve(&request, Path::new("2m_temperature_1990.nc"), false)
//!         .await?;
//!     println!("{} bytes downloaded", bytes);
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Essential app components
pub use crate::app::{
    execute, prompt_selection, Action, ClientConfig, DataRequest, DataStoresClient, DataType,
    JobDatabase, JobDbConfig, JobRecord, JobStatus, Outcome, RemoteJob,
};

// Authentication
pub use crate::auth::{check_credentials, get_auth_status, AuthStatus, Credentials};

// Commonly used constants
pub use crate::constants::{DEFAULT_API_URL, DEFAULT_RATE_LIMIT_RPS, USER_AGENT};

pub use std::path::{Path, PathBuf};

pub use tokio;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        let _client_config = ClientConfig::default();
        let _db_config = JobDbConfig::default();
        let _status = get_auth_status();

        assert_eq!(DEFAULT_RATE_LIMIT_RPS, 5);
        assert!(USER_AGENT.contains("ERA5-Fetcher"));
    }

    #[tokio::test]
    async fn test_prelude_integration_pattern() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let db = JobDatabase::open(JobDbConfig::with_db_dir(temp_dir.path().to_path_buf()))
            .await
            .unwrap();

        let missing = db.load_unchecked(JobStatus::Running).await;
        assert!(missing.is_err());
        assert_eq!(db.db_dir(), temp_dir.path());
    }
}
