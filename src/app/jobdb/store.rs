//! Per-status job database files with freshness gating
//!
//! The database is a directory holding one file per [`JobStatus`]. Files are
//! only ever replaced wholesale (temp file + rename) and a file older than the
//! configured threshold is refused for selection.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::fs;
use tracing::{debug, info};

use crate::app::models::{JobRecord, JobStatus};
use crate::constants::{files, jobdb};
use crate::errors::{JobDbError, JobDbResult};

use super::config::JobDbConfig;
use super::format;

/// Summary of one status file, for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFileInfo {
    pub status: JobStatus,
    pub path: PathBuf,
    /// None when the file does not exist
    pub age: Option<Duration>,
    pub rows: usize,
    pub fresh: bool,
}

/// Local job database
#[derive(Debug, Clone)]
pub struct JobDatabase {
    config: JobDbConfig,
    db_dir: PathBuf,
}

impl JobDatabase {
    /// Open the database, creating its directory if necessary
    pub async fn open(config: JobDbConfig) -> JobDbResult<Self> {
        let db_dir = match &config.db_dir {
            Some(path) => path.clone(),
            None => Self::default_db_dir()?,
        };

        fs::create_dir_all(&db_dir)
            .await
            .map_err(|_| JobDbError::DirectoryNotAccessible {
                path: db_dir.clone(),
            })?;

        debug!("Opened job database at {}", db_dir.display());
        Ok(Self { config, db_dir })
    }

    /// Default location:
    /// - macOS: ~/Library/Application Support/era5-fetcher/jobdb
    /// - Linux: ~/.config/era5-fetcher/jobdb
    /// - Windows: %APPDATA%/era5-fetcher/jobdb
    pub fn default_db_dir() -> JobDbResult<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| JobDbError::DirectoryNotAccessible {
                path: PathBuf::from("system config directory"),
            })?
            .join(files::APP_DIR_NAME)
            .join(files::JOBDB_DIR_NAME);
        Ok(dir)
    }

    pub fn db_dir(&self) -> &Path {
        &self.db_dir
    }

    pub fn config(&self) -> &JobDbConfig {
        &self.config
    }

    /// Path of the file for a status
    pub fn path_for(&self, status: JobStatus) -> PathBuf {
        self.db_dir.join(format!(
            "{}{}.{}",
            jobdb::FILE_PREFIX,
            status.as_str(),
            jobdb::FILE_EXTENSION
        ))
    }

    /// Age of a status file, or `Missing`
    pub async fn age(&self, status: JobStatus) -> JobDbResult<Duration> {
        let path = self.path_for(status);
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(JobDbError::Missing {
                    status: status.to_string(),
                    path,
                });
            }
            Err(e) => return Err(JobDbError::Io(e)),
        };
        let modified = metadata.modified()?;
        // A modification time in the future counts as brand new.
        Ok(SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default())
    }

    /// Staleness gate: the file must exist and be younger than `max_age`
    pub async fn check_fresh(&self, status: JobStatus) -> JobDbResult<Duration> {
        let age = self.age(status).await?;
        if age >= self.config.max_age {
            return Err(JobDbError::Stale {
                status: status.to_string(),
                age: Duration::from_secs(age.as_secs()),
                max_age: self.config.max_age,
            });
        }
        Ok(age)
    }

    /// Load the records of a status after passing the staleness gate
    pub async fn load(&self, status: JobStatus) -> JobDbResult<Vec<JobRecord>> {
        let age = self.check_fresh(status).await?;
        debug!(
            "Loading '{}' jobs from database ({}s old)",
            status,
            age.as_secs()
        );
        self.load_unchecked(status).await
    }

    /// Load the records of a status for listing or selection
    ///
    /// Unlike [`load`](Self::load), a missing file is zero rows when the last
    /// rebuild is recent enough, since a rebuild removes the file of every
    /// status without jobs. Without a rebuild on record the file is `Missing`.
    pub async fn load_listing(&self, status: JobStatus) -> JobDbResult<Vec<JobRecord>> {
        match self.load(status).await {
            Err(JobDbError::Missing { status: name, path }) => {
                match self.last_refresh_age().await? {
                    Some(age) if age < self.config.max_age => {
                        debug!("No '{}' jobs at the last rebuild", status);
                        Ok(Vec::new())
                    }
                    Some(age) => Err(JobDbError::Stale {
                        status: name,
                        age: Duration::from_secs(age.as_secs()),
                        max_age: self.config.max_age,
                    }),
                    None => Err(JobDbError::Missing { status: name, path }),
                }
            }
            other => other,
        }
    }

    /// Path of the marker written after every rebuild
    pub fn refresh_marker_path(&self) -> PathBuf {
        self.db_dir.join(jobdb::REFRESH_MARKER)
    }

    /// Record that a rebuild just finished
    pub async fn mark_refreshed(&self) -> JobDbResult<()> {
        let stamp = chrono::Utc::now().to_rfc3339();
        fs::write(self.refresh_marker_path(), format!("{}\n", stamp)).await?;
        Ok(())
    }

    /// Forget the last rebuild; called before a new one starts
    pub async fn clear_refreshed(&self) -> JobDbResult<()> {
        match fs::remove_file(self.refresh_marker_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(JobDbError::Io(e)),
        }
    }

    /// Time since the last rebuild, if one is on record
    pub async fn last_refresh_age(&self) -> JobDbResult<Option<Duration>> {
        match fs::metadata(self.refresh_marker_path()).await {
            Ok(metadata) => {
                let modified = metadata.modified()?;
                Ok(Some(
                    SystemTime::now()
                        .duration_since(modified)
                        .unwrap_or_default(),
                ))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(JobDbError::Io(e)),
        }
    }

    /// Load the records of a status regardless of age
    pub async fn load_unchecked(&self, status: JobStatus) -> JobDbResult<Vec<JobRecord>> {
        let path = self.path_for(status);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(JobDbError::Missing {
                    status: status.to_string(),
                    path,
                });
            }
            Err(e) => return Err(JobDbError::Io(e)),
        };
        format::parse(&path, &content)
    }

    /// Replace the file of a status with the given records
    pub async fn replace(&self, status: JobStatus, records: &[JobRecord]) -> JobDbResult<PathBuf> {
        let path = self.path_for(status);
        let temp_path = path.with_extension(format!(
            "{}{}",
            jobdb::FILE_EXTENSION,
            files::TEMP_FILE_SUFFIX
        ));

        fs::write(&temp_path, format::render(records)).await?;
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(JobDbError::Io(e));
        }

        info!(
            "Wrote {} '{}' jobs to {}",
            records.len(),
            status,
            path.display()
        );
        Ok(path)
    }

    /// Remove the file of a status; returns whether a file existed
    pub async fn remove(&self, status: JobStatus) -> JobDbResult<bool> {
        let path = self.path_for(status);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Removed {} (no '{}' jobs)", path.display(), status);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(JobDbError::Io(e)),
        }
    }

    /// Existence, age and size of every status file
    pub async fn file_info(&self) -> JobDbResult<Vec<StatusFileInfo>> {
        let mut infos = Vec::with_capacity(JobStatus::ALL.len());
        for status in JobStatus::ALL {
            let path = self.path_for(status);
            let info = match self.age(status).await {
                Ok(age) => StatusFileInfo {
                    status,
                    rows: self.load_unchecked(status).await?.len(),
                    fresh: age < self.config.max_age,
                    age: Some(age),
                    path,
                },
                Err(JobDbError::Missing { .. }) => StatusFileInfo {
                    status,
                    path,
                    age: None,
                    rows: 0,
                    fresh: false,
                },
                Err(e) => return Err(e),
            };
            infos.push(info);
        }
        Ok(infos)
    }
}
