//! Job database configuration types and defaults

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::jobdb;

/// Configuration for the local job database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDbConfig {
    /// Directory holding the per-status files (OS-specific if None)
    pub db_dir: Option<PathBuf>,
    /// Files older than this are rejected as stale
    pub max_age: Duration,
    /// Number of jobs requested per status during a refresh
    pub job_limit: usize,
}

impl Default for JobDbConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            max_age: jobdb::MAX_AGE,
            job_limit: jobdb::DEFAULT_JOB_LIMIT,
        }
    }
}

impl JobDbConfig {
    /// Create a configuration rooted at a custom directory
    pub fn with_db_dir(db_dir: PathBuf) -> Self {
        Self {
            db_dir: Some(db_dir),
            ..Default::default()
        }
    }

    /// Set the freshness threshold
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the per-status job limit
    pub fn with_job_limit(mut self, job_limit: usize) -> Self {
        self.job_limit = job_limit;
        self
    }
}
