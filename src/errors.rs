//! Error types for ERA5 Fetcher
//!
//! This module defines error types for all components of the application.
//! Errors are designed to be actionable and provide clear context for debugging and
//! user feedback.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Authentication-related errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// No API key in the environment or credentials file
    #[error(
        "Missing Data Stores credentials. Set ECMWF_DATASTORES_KEY (and optionally ECMWF_DATASTORES_URL) or run 'era5_fetcher auth setup'"
    )]
    MissingCredentials,

    /// HTTP request failed during authentication
    #[error("HTTP request failed during authentication")]
    Http(#[from] reqwest::Error),

    /// The service rejected the API key
    #[error("Authentication rejected by {url} (HTTP {status}). Please check your API key")]
    Rejected { url: String, status: u16 },

    /// The configured API URL is not a valid URL
    #[error("Invalid API URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Invalid key format
    #[error("Invalid API key: {reason}")]
    InvalidKey { reason: String },

    /// Malformed credentials file
    #[error("Malformed credentials file {path}: {reason}")]
    MalformedCredentialsFile { path: PathBuf, reason: String },

    /// File I/O error during credential storage
    #[error("Failed to access credential storage")]
    CredentialStorage(#[from] std::io::Error),
}

/// Errors talking to the remote retrieval API
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP transport error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Unexpected status from the service
    #[error("Server returned HTTP {status} for {url}: {body}")]
    Status { url: String, status: u16, body: String },

    /// Job does not exist (deleted or expired)
    #[error("Job not found: {request_id}")]
    JobNotFound { request_id: String },

    /// Unparseable response body
    #[error("Unexpected response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Server responded with HTTP 429")]
    RateLimitExceeded,

    /// Server overloaded
    #[error("Server overloaded. Server responded with HTTP 503")]
    ServerOverloaded,

    /// Maximum retries exceeded
    #[error("Maximum retry attempts ({max_retries}) exceeded")]
    MaxRetriesExceeded { max_retries: u32 },

    /// Job finished in the failed state
    #[error("Job {request_id} failed: {reason}")]
    JobFailed { request_id: String, reason: String },

    /// Results requested for a job that is not finished
    #[error("Results for job {request_id} are not ready (status: {status})")]
    ResultsNotReady { request_id: String, status: String },

    /// URL could not be built
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },
}

/// Download and file transfer errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Remote API error while locating the result
    #[error(transparent)]
    Api(#[from] ApiError),

    /// File already exists and force flag not set
    #[error("File already exists: {path}. Use --force to overwrite")]
    FileExists { path: String },

    /// I/O error during file operations
    #[error("File I/O error")]
    Io(#[from] std::io::Error),

    /// Server returned error status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// File size mismatch
    #[error("File size mismatch. Expected: {expected} bytes, got: {actual} bytes")]
    SizeMismatch { expected: u64, actual: u64 },

    /// Variable or year cannot form a plain file name
    #[error("Cannot save result as '{variable}_{year}': {reason}")]
    InvalidFileName {
        variable: String,
        year: String,
        reason: String,
    },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },
}

/// Job database errors
#[derive(Error, Debug)]
pub enum JobDbError {
    /// No file for the requested status
    #[error("No job database file for '{status}' jobs at {path}. Run 'era5_fetcher build_db' first")]
    Missing { status: String, path: PathBuf },

    /// File exists but is older than the freshness threshold
    #[error(
        "Job database file for '{status}' jobs is stale ({age:?} old, limit {max_age:?}). Run 'era5_fetcher build_db' to refresh it"
    )]
    Stale {
        status: String,
        age: Duration,
        max_age: Duration,
    },

    /// File content does not match the expected format
    #[error("Job database file {path} is corrupt at line {line}: {reason}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Database directory could not be created or read
    #[error("Job database directory not accessible: {path}")]
    DirectoryNotAccessible { path: PathBuf },

    /// I/O error reading or writing a file
    #[error("Job database I/O error")]
    Io(#[from] std::io::Error),

    /// Remote enumeration failed during a refresh
    #[error("Failed to refresh job database")]
    Refresh(#[from] ApiError),
}

/// Interactive row selection errors
#[derive(Error, Debug)]
pub enum SelectionError {
    /// Nothing to choose from
    #[error("No jobs available to {task}")]
    NothingToSelect { task: String },

    /// User entered nothing
    #[error("No selection entered")]
    EmptyInput,

    /// Token is not an index, range or 'all'
    #[error("Invalid choice '{input}': expected job numbers, ranges like 1-3, or 'all'")]
    InvalidInput { input: String },

    /// Index outside the displayed rows
    #[error("Invalid choice! {index} is not between 0 and {max}")]
    OutOfRange { index: usize, max: usize },

    /// Reading from or writing to the terminal failed
    #[error("Terminal I/O error")]
    Io(#[from] std::io::Error),
}

/// Data request construction errors
#[derive(Error, Debug)]
pub enum RequestError {
    /// Required CLI value missing
    #[error("Missing required value: {field}")]
    MissingField { field: String },

    /// Year outside the ERA5 record
    #[error("Year {year} is outside the available range {first}-{last}")]
    YearOutOfRange { year: i32, first: i32, last: i32 },

    /// Pressure level given for single-level data, or missing for pressure-level data
    #[error("Invalid pressure level: {reason}")]
    PressureLevel { reason: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Reading the configuration file failed
    #[error("Failed to read configuration file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Authentication error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Remote API error
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Job database error
    #[error(transparent)]
    JobDb(#[from] JobDbError),

    /// Selection error
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Request construction error
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "authentication",
            AppError::Api(_) => "api",
            AppError::Download(_) => "download",
            AppError::JobDb(_) => "jobdb",
            AppError::Selection(_) => "selection",
            AppError::Request(_) => "request",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }

    /// Whether re-running `build_db` would fix the error
    pub fn needs_refresh(&self) -> bool {
        matches!(
            self,
            AppError::JobDb(JobDbError::Missing { .. }) | AppError::JobDb(JobDbError::Stale { .. })
        )
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Remote API result type alias
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Job database result type alias
pub type JobDbResult<T> = std::result::Result<T, JobDbError>;

/// Selection result type alias
pub type SelectionResult<T> = std::result::Result<T, SelectionError>;
