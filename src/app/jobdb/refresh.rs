//! Full rebuild of the job database from the remote service
//!
//! A refresh enumerates the jobs of every status, fetches the detail of each
//! job, writes a replacement file for every status that has jobs and removes
//! the file of every status that has none. There is no incremental merge.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::app::models::{JobRecord, JobStatus, RemoteJob};
use crate::errors::{ApiResult, JobDbResult};

use super::store::JobDatabase;

/// Anything able to enumerate remote jobs and describe one of them
#[async_trait]
pub trait JobSource {
    /// Request ids of jobs in `status`, newest first, at most `limit`
    async fn list_request_ids(&self, status: JobStatus, limit: usize) -> ApiResult<Vec<String>>;

    /// Detail of a single job, including its request parameters
    async fn job_detail(&self, request_id: &str) -> ApiResult<RemoteJob>;
}

/// Outcome of a refresh, per status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Statuses that were written, with their row count
    pub written: Vec<(JobStatus, usize)>,
    /// Statuses whose file was removed or absent because they had no jobs
    pub emptied: Vec<JobStatus>,
}

impl RefreshSummary {
    /// Total number of rows written
    pub fn total_jobs(&self) -> usize {
        self.written.iter().map(|(_, n)| n).sum()
    }

    /// Row count written for a status (0 when emptied)
    pub fn count(&self, status: JobStatus) -> usize {
        self.written
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Rebuild every status file from `source`
pub async fn refresh<S>(db: &JobDatabase, source: &S, limit: usize) -> JobDbResult<RefreshSummary>
where
    S: JobSource + Sync + ?Sized,
{
    let mut summary = RefreshSummary::default();
    db.clear_refreshed().await?;

    for status in JobStatus::ALL {
        let request_ids = source.list_request_ids(status, limit).await?;
        info!("Found {} '{}' jobs", request_ids.len(), status);

        if request_ids.is_empty() {
            db.remove(status).await?;
            summary.emptied.push(status);
            continue;
        }

        let mut records = Vec::with_capacity(request_ids.len());
        for request_id in &request_ids {
            let job = source.job_detail(request_id).await?;
            let mut record = JobRecord::from_remote(&job);
            if record.status != status {
                // The job moved on between listing and detail; keep it under
                // the category it was listed in so files stay homogeneous.
                debug!(
                    "Job {} listed as '{}' but now '{}'",
                    request_id, status, record.status
                );
                record.status = status;
            }
            records.push(record);
        }

        db.replace(status, &records).await?;
        summary.written.push((status, records.len()));
    }

    db.mark_refreshed().await?;
    Ok(summary)
}
