//! Configuration management for ERA5 Fetcher
//!
//! Settings come from built-in defaults, then an optional TOML file, then
//! command line flags. Durations are written in humantime form (`90s`, `1h`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{ClientConfig, JobDbConfig};
use crate::constants::{http, jobdb, limits, polling};
use crate::errors::{AppError, ConfigError, Result};

/// File name looked up in the working directory
const LOCAL_CONFIG_FILE: &str = "era5-fetcher.toml";

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Job database settings
    pub jobdb: JobDbConfigToml,
    /// Download settings
    pub download: DownloadConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Timeout for API calls (downloads are not limited)
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Connection pool idle timeout (None = no timeout)
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Option<Duration>,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
    /// First sleep between status polls
    #[serde(with = "humantime_serde")]
    pub poll_initial_interval: Duration,
    /// Longest sleep between status polls
    #[serde(with = "humantime_serde")]
    pub poll_max_interval: Duration,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
            poll_initial_interval: polling::INITIAL_INTERVAL,
            poll_max_interval: polling::MAX_INTERVAL,
        }
    }
}

/// TOML-friendly job database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobDbConfigToml {
    /// Database directory (None = system config directory)
    pub db_dir: Option<PathBuf>,
    /// Age at which a status file is considered stale
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
    /// Jobs fetched per status by a refresh
    pub job_limit: usize,
}

impl Default for JobDbConfigToml {
    fn default() -> Self {
        Self {
            db_dir: None,
            max_age: jobdb::MAX_AGE,
            job_limit: jobdb::DEFAULT_JOB_LIMIT,
        }
    }
}

/// TOML-friendly download configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloadConfigToml {
    /// Directory result files are saved to
    pub output_dir: PathBuf,
    /// Show a progress bar on terminals
    pub show_progress: bool,
}

impl Default for DownloadConfigToml {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            show_progress: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Settings after defaults, file and flags are combined
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub client: ClientConfig,
    pub jobdb: JobDbConfig,
    pub output_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration: defaults, then the first config file found.
    ///
    /// An explicitly given file must exist.
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path }.into());
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("era5-fetcher").join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;

        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::InvalidFormat)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Reject values the tool cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.client.rate_limit_rps == 0 {
            return Err(invalid("client.rate_limit_rps", "0", "must be at least 1"));
        }
        if self.jobdb.job_limit == 0 {
            return Err(invalid("jobdb.job_limit", "0", "must be at least 1"));
        }
        if self.client.poll_initial_interval.is_zero() {
            return Err(invalid(
                "client.poll_initial_interval",
                "0s",
                "must be positive",
            ));
        }
        if self.client.poll_initial_interval > self.client.poll_max_interval {
            return Err(invalid(
                "client.poll_max_interval",
                &format!("{:?}", self.client.poll_max_interval),
                "must not be shorter than poll_initial_interval",
            ));
        }
        Ok(())
    }

    /// Apply command line overrides
    pub fn with_db_dir(mut self, db_dir: Option<PathBuf>) -> Self {
        if db_dir.is_some() {
            self.jobdb.db_dir = db_dir;
        }
        self
    }

    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            client: ClientConfig {
                request_timeout: self.client.request_timeout,
                connect_timeout: self.client.connect_timeout,
                pool_idle_timeout: self.client.pool_idle_timeout,
                rate_limit_rps: self.client.rate_limit_rps,
                poll_initial_interval: self.client.poll_initial_interval,
                poll_max_interval: self.client.poll_max_interval,
                show_progress: self.download.show_progress,
            },
            jobdb: JobDbConfig {
                db_dir: self.jobdb.db_dir.clone(),
                max_age: self.jobdb.max_age,
                job_limit: self.jobdb.job_limit,
            },
            output_dir: self.download.output_dir.clone(),
        }
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AppError::generic(format!("Failed to render configuration: {}", e)))
    }

    /// Write the commented default configuration to `path`
    pub async fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(AppError::generic(format!(
                "Configuration file already exists: {} (use --force to overwrite)",
                path.display()
            )));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(path, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Wrote default configuration to {}", path.display());
        Ok(())
    }

    /// Default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# ERA5 Fetcher Configuration
# Durations accept humantime values such as "90s", "15m" or "1h".

[client]
request_timeout = "{}s"
connect_timeout = "{}s"
pool_idle_timeout = "{}s"
rate_limit_rps = {}
# Sleep between status polls while waiting for a job grows by half each
# round, from poll_initial_interval up to poll_max_interval
poll_initial_interval = "{}s"
poll_max_interval = "{}s"

[jobdb]
# Job database directory (leave unset to use the system default)
# db_dir = "/path/to/jobdb"

# Status files older than this must be rebuilt with build_db
max_age = "{}s"

# Jobs fetched per status by build_db
job_limit = {}

[download]
output_dir = "."
show_progress = true

[logging]
# Used when no -v/-q flag is given: error, warn, info, debug, trace
level = "warn"
"#,
            http::DEFAULT_TIMEOUT.as_secs(),
            http::CONNECT_TIMEOUT.as_secs(),
            http::POOL_IDLE_TIMEOUT.as_secs(),
            limits::DEFAULT_RATE_LIMIT_RPS,
            polling::INITIAL_INTERVAL.as_secs(),
            polling::MAX_INTERVAL.as_secs(),
            jobdb::MAX_AGE.as_secs(),
            jobdb::DEFAULT_JOB_LIMIT,
        )
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> AppError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
