//! Data models for ERA5 Fetcher
//!
//! This module defines the core data structures used throughout the application:
//! job statuses, the remote job view returned by the retrieve API, and the
//! flattened job record stored in the local job database.

use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::request;
use crate::errors::{DownloadError, DownloadResult};

/// Status category of a remote job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Queued by the service
    Accepted,
    /// Being processed
    Running,
    /// Finished with results available
    Successful,
    /// Finished without results
    Failed,
}

impl JobStatus {
    /// Every status, in the order used for refreshes and listings
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Accepted,
        JobStatus::Running,
        JobStatus::Successful,
        JobStatus::Failed,
    ];

    /// Wire and file name form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Running => "running",
            Self::Successful => "successful",
            Self::Failed => "failed",
        }
    }

    /// Map a status string reported by the service onto a cache category.
    ///
    /// Terminal statuses the cache does not track separately (`rejected`,
    /// `dismissed`, ...) are folded into `Failed`.
    pub fn from_remote(status: &str) -> Self {
        match status.parse() {
            Ok(status) => status,
            Err(_) => {
                tracing::debug!("Folding remote status '{}' into 'failed'", status);
                Self::Failed
            }
        }
    }

    /// Whether the job will not change status any more
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Successful | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(Self::Accepted),
            "running" => Ok(Self::Running),
            "successful" => Ok(Self::Successful),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown job status '{}'", other)),
        }
    }
}

/// Page of jobs returned by the job listing endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub jobs: Vec<JobSummary>,
}

impl JobList {
    /// Request ids in the order the service returned them
    pub fn request_ids(&self) -> Vec<String> {
        self.jobs.iter().map(|job| job.job_id.clone()).collect()
    }
}

/// Minimal job entry from a listing
#[derive(Debug, Clone, Deserialize)]
pub struct JobSummary {
    #[serde(rename = "jobID")]
    pub job_id: String,
}

/// Full view of a remote job
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteJob {
    #[serde(rename = "jobID")]
    pub job_id: String,
    pub status: String,
    #[serde(rename = "processID", default)]
    pub process_id: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub started: Option<String>,
    #[serde(default)]
    pub finished: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub metadata: JobMetadata,
}

/// Extra job information, present when requested
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobMetadata {
    #[serde(default)]
    pub request: Option<RequestMetadata>,
    #[serde(default)]
    pub results: Option<Value>,
}

/// Request parameters attached to a job
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestMetadata {
    #[serde(default)]
    pub ids: Map<String, Value>,
}

impl RemoteJob {
    /// Status mapped onto the cache categories
    pub fn job_status(&self) -> JobStatus {
        JobStatus::from_remote(&self.status)
    }

    /// Whether the results can be downloaded
    pub fn results_ready(&self) -> bool {
        self.status == JobStatus::Successful.as_str()
    }

    /// Request parameters, empty when the job was fetched without them
    pub fn request(&self) -> Option<&Map<String, Value>> {
        self.metadata.request.as_ref().map(|r| &r.ids)
    }

    /// First value of a request parameter, as text
    pub fn request_value(&self, key: &str) -> Option<String> {
        self.request().and_then(|ids| first_value(ids.get(key)?))
    }

    /// Human readable failure reason, if the service reported one
    pub fn failure_reason(&self) -> Option<String> {
        let results = self.metadata.results.as_ref()?;
        let title = results.get("title").and_then(Value::as_str);
        let detail = results.get("detail").and_then(Value::as_str);
        match (title, detail) {
            (Some(t), Some(d)) => Some(format!("{}: {}", t, d)),
            (Some(t), None) => Some(t.to_string()),
            (None, Some(d)) => Some(d.to_string()),
            (None, None) => None,
        }
    }
}

/// Extract the first scalar of a parameter that may be a list or a scalar
fn first_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.first().and_then(first_value),
        _ => None,
    }
}

/// Body of the job results endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct JobResults {
    pub asset: ResultAsset,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultAsset {
    pub value: AssetValue,
}

/// Downloadable result file
#[derive(Debug, Clone, Deserialize)]
pub struct AssetValue {
    pub href: String,
    #[serde(rename = "file:size", default)]
    pub size: Option<u64>,
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
}

/// One row of the job database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub request_id: String,
    pub status: JobStatus,
    pub created: String,
    pub updated: String,
    pub year: String,
    pub variable: String,
}

impl JobRecord {
    /// Flatten a remote job (fetched with its request parameters)
    pub fn from_remote(job: &RemoteJob) -> Self {
        Self {
            request_id: job.job_id.clone(),
            status: job.job_status(),
            created: job.created.clone().unwrap_or_default(),
            updated: job.updated.clone().unwrap_or_default(),
            year: job.request_value("year").unwrap_or_default(),
            variable: job.request_value("variable").unwrap_or_default(),
        }
    }

    /// File name a download of this job is saved under
    pub fn target_file_name(&self) -> DownloadResult<String> {
        result_file_name(&self.variable, &self.year)
    }
}

/// `<variable>_<year>.nc`
///
/// Both parts come from remote metadata or an editable file, so the name must
/// stay a single plain component below the output directory.
pub fn result_file_name(variable: &str, year: &str) -> DownloadResult<String> {
    let invalid = |reason: &str| DownloadError::InvalidFileName {
        variable: variable.to_string(),
        year: year.to_string(),
        reason: reason.to_string(),
    };

    for part in [variable, year] {
        if part.trim().is_empty() {
            return Err(invalid("variable and year must not be empty"));
        }
        if part.chars().any(|c| c == '/' || c == '\\' || c == '\0') {
            return Err(invalid("path separators are not allowed"));
        }
    }

    let name = format!("{}_{}.{}", variable, year, request::RESULT_EXTENSION);
    let mut components = Path::new(&name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(invalid("not a plain file name")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> RemoteJob {
        serde_json::from_value(serde_json::json!({
            "processID": "derived-era5-single-levels-daily-statistics",
            "type": "process",
            "jobID": "8a1f5c1e-1b7b-4b33-9d4f-2d1b36b0c001",
            "status": "successful",
            "created": "2026-01-10T09:15:02.123456",
            "started": "2026-01-10T09:16:00.000000",
            "finished": "2026-01-10T09:40:11.000000",
            "updated": "2026-01-10T09:40:11.000000",
            "metadata": {
                "request": {
                    "ids": {
                        "variable": ["2m_temperature"],
                        "year": "1987",
                        "month": ["1", "2"]
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_status_parsing() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("queued".parse::<JobStatus>().is_err());
        assert_eq!(JobStatus::from_remote("dismissed"), JobStatus::Failed);
        assert_eq!(JobStatus::from_remote("running"), JobStatus::Running);
        assert!(JobStatus::from_remote("dismissed").is_terminal());
        assert!(!JobStatus::Accepted.is_terminal());
    }

    #[test]
    fn test_remote_job_request_values() {
        let job = sample_job();
        assert!(job.results_ready());
        assert_eq!(job.request_value("variable").as_deref(), Some("2m_temperature"));
        assert_eq!(job.request_value("year").as_deref(), Some("1987"));
        assert_eq!(job.request_value("pressure_level"), None);
    }

    #[test]
    fn test_record_from_remote() {
        let record = JobRecord::from_remote(&sample_job());
        assert_eq!(record.request_id, "8a1f5c1e-1b7b-4b33-9d4f-2d1b36b0c001");
        assert_eq!(record.status, JobStatus::Successful);
        assert_eq!(record.created, "2026-01-10T09:15:02.123456");
        assert_eq!(record.target_file_name().unwrap(), "2m_temperature_1987.nc");
    }

    #[test]
    fn test_record_without_request_metadata() {
        let job: RemoteJob = serde_json::from_value(serde_json::json!({
            "jobID": "abc",
            "status": "accepted"
        }))
        .unwrap();
        let record = JobRecord::from_remote(&job);
        assert_eq!(record.status, JobStatus::Accepted);
        assert!(record.year.is_empty());
        assert!(record.variable.is_empty());
        assert!(!job.results_ready());
    }

    #[test]
    fn test_failure_reason() {
        let job: RemoteJob = serde_json::from_value(serde_json::json!({
            "jobID": "abc",
            "status": "failed",
            "metadata": {
                "results": {"title": "The job failed", "detail": "cost limits exceeded"}
            }
        }))
        .unwrap();
        assert_eq!(
            job.failure_reason().as_deref(),
            Some("The job failed: cost limits exceeded")
        );
    }

    #[test]
    fn test_results_asset() {
        let results: JobResults = serde_json::from_value(serde_json::json!({
            "asset": {
                "value": {
                    "type": "application/netcdf",
                    "href": "https://object-store.example/abc.nc",
                    "file:size": 1024
                }
            }
        }))
        .unwrap();
        assert_eq!(results.asset.value.size, Some(1024));
        assert!(results.asset.value.href.ends_with("abc.nc"));
        assert_eq!(
            results.asset.value.content_type.as_deref(),
            Some("application/netcdf")
        );
    }

    #[test]
    fn test_result_file_name_stays_in_output_dir() {
        assert_eq!(
            result_file_name("total_precipitation", "2003").unwrap(),
            "total_precipitation_2003.nc"
        );
        // Dots without separators still make a plain name
        assert_eq!(result_file_name("..", "2003").unwrap(), ".._2003.nc");

        for (variable, year) in [
            ("/etc/passwd", "2003"),
            ("../../outside", "2003"),
            ("t2m", "2003/.."),
            ("dir\\t2m", "2003"),
            ("", "2003"),
            ("t2m", ""),
            ("", ""),
        ] {
            let err = result_file_name(variable, year).unwrap_err();
            assert!(
                matches!(err, DownloadError::InvalidFileName { .. }),
                "{:?} / {:?} accepted",
                variable,
                year
            );
        }
    }

    #[test]
    fn test_record_without_metadata_has_no_target() {
        let mut record = JobRecord::from_remote(&sample_job());
        record.variable = String::new();
        assert!(record.target_file_name().is_err());
    }
}
