//! Application constants for ERA5 Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names for authentication
pub mod env {
    /// Environment variable name for the Data Stores API URL
    pub const URL: &str = "ECMWF_DATASTORES_URL";

    /// Environment variable name for the Data Stores personal access token
    pub const KEY: &str = "ECMWF_DATASTORES_KEY";
}

/// Authentication and credential-related constants
pub mod auth {
    /// Default Data Stores API base URL
    pub const DEFAULT_API_URL: &str = "https://cds.climate.copernicus.eu/api";

    /// Name of the per-user credentials file in the home directory
    pub const RC_FILE_NAME: &str = ".ecmwfdatastoresrc";

    /// Header carrying the personal access token
    pub const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

    /// Minimum plausible API key length
    pub const MIN_KEY_LENGTH: usize = 8;

    /// File permissions for .env file (Unix only) - owner read/write only
    #[cfg(unix)]
    pub const ENV_FILE_PERMISSIONS: u32 = 0o600;
}

/// Remote API paths, relative to the configured base URL
pub mod api {
    /// Personal access token verification endpoint
    pub const VERIFY_PATH: &str = "profiles/v1/account/verification/pat";

    /// Job collection endpoint
    pub const JOBS_PATH: &str = "retrieve/v1/jobs";

    /// Process collection endpoint (submission lives below it)
    pub const PROCESSES_PATH: &str = "retrieve/v1/processes";

    /// Default sort order when listing jobs (newest first)
    pub const SORT_NEWEST_FIRST: &str = "-created";

    /// Sort order used by `check` (oldest first)
    pub const SORT_OLDEST_FIRST: &str = "created";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "ERA5-Fetcher/0.1.0 (Climate Research Tool)";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
}

/// Rate limiting and retry configuration
pub mod limits {
    /// Default rate limit for API requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 5;

    /// Maximum retry attempts for failed requests
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;
}

/// Job polling while waiting for a submitted request
pub mod polling {
    use super::Duration;

    /// First sleep between status polls
    pub const INITIAL_INTERVAL: Duration = Duration::from_secs(1);

    /// Upper bound for the sleep between status polls
    pub const MAX_INTERVAL: Duration = Duration::from_secs(120);

    /// Growth factor applied to the sleep after every poll
    pub const BACKOFF_FACTOR: f64 = 1.5;
}

/// Job database constants
pub mod jobdb {
    use super::Duration;

    /// Column header shared by every job database file
    pub const HEADER: &str = "request_id,status,created,updated,year,variable";

    /// Number of columns in the header
    pub const COLUMN_COUNT: usize = 6;

    /// Prefix of every per-status file name
    pub const FILE_PREFIX: &str = "jobs_";

    /// Extension of every per-status file name
    pub const FILE_EXTENSION: &str = "csv";

    /// Marker touched at the end of every rebuild
    pub const REFRESH_MARKER: &str = ".last_refresh";

    /// Age after which a job database file is no longer trusted
    pub const MAX_AGE: Duration = Duration::from_secs(60 * 60);

    /// Default number of jobs requested per status
    pub const DEFAULT_JOB_LIMIT: usize = 100;
}

/// Data request defaults
pub mod request {
    /// Collection for single-level daily statistics
    pub const SINGLE_LEVEL_COLLECTION: &str = "derived-era5-single-levels-daily-statistics";

    /// Collection for pressure-level daily statistics
    pub const PRESSURE_LEVEL_COLLECTION: &str = "derived-era5-pressure-levels-daily-statistics";

    /// First year covered by ERA5
    pub const FIRST_YEAR: i32 = 1940;

    pub const PRODUCT_TYPE: &str = "reanalysis";
    pub const DAILY_STATISTIC: &str = "daily_mean";
    pub const TIME_ZONE: &str = "utc+00:00";
    pub const FREQUENCY: &str = "6_hourly";
    pub const DATA_FORMAT: &str = "netcdf";

    /// Extension of downloaded result files
    pub const RESULT_EXTENSION: &str = "nc";
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Application directory name below the user config directory
    pub const APP_DIR_NAME: &str = "era5-fetcher";

    /// Job database directory name below the application directory
    pub const JOBDB_DIR_NAME: &str = "jobdb";
}

// Re-export commonly used constants for convenience
pub use auth::DEFAULT_API_URL;
pub use env::{KEY as ENV_KEY, URL as ENV_URL};
pub use files::TEMP_FILE_SUFFIX;
pub use http::USER_AGENT;
pub use limits::{DEFAULT_RATE_LIMIT_RPS, MAX_RETRIES, RETRY_BASE_DELAY_MS};
