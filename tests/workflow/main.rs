//! Integration tests for the job database workflow
//!
//! A fake service stands in for the Data Stores API. These tests run the
//! same sequence the CLI does: rebuild the job database, load a status file
//! through the staleness gate, select rows and dispatch an action on them.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use era5_fetcher::app::jobdb::{self, JobSource};
use era5_fetcher::app::{
    execute, prompt_selection, Action, JobActions, JobDatabase, JobDbConfig, JobStatus, Outcome,
    RemoteJob,
};
use era5_fetcher::errors::{ApiError, ApiResult, AppError, DownloadResult, JobDbError};

/// In-memory stand-in for the remote service
#[derive(Default)]
struct FakeService {
    jobs: Mutex<HashMap<String, RemoteJob>>,
    order: Mutex<Vec<String>>,
    log: Mutex<Vec<String>>,
}

impl FakeService {
    fn add(&self, id: &str, status: &str, variable: &str, year: &str) {
        let job: RemoteJob = serde_json::from_value(serde_json::json!({
            "jobID": id,
            "status": status,
            "processID": "derived-era5-single-levels-daily-statistics",
            "created": "2026-05-11T09:00:00+00:00",
            "updated": "2026-05-11T09:30:00+00:00",
            "metadata": {"request": {"ids": {"variable": [variable], "year": [year]}}}
        }))
        .unwrap();
        self.jobs.lock().unwrap().insert(id.to_string(), job);
        self.order.lock().unwrap().push(id.to_string());
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobSource for FakeService {
    async fn list_request_ids(&self, status: JobStatus, limit: usize) -> ApiResult<Vec<String>> {
        let jobs = self.jobs.lock().unwrap();
        Ok(self
            .order
            .lock()
            .unwrap()
            .iter()
            .filter(|id| {
                jobs.get(*id)
                    .is_some_and(|job| JobStatus::from_remote(&job.status) == status)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn job_detail(&self, request_id: &str) -> ApiResult<RemoteJob> {
        self.jobs
            .lock()
            .unwrap()
            .get(request_id)
            .cloned()
            .ok_or_else(|| ApiError::JobNotFound {
                request_id: request_id.to_string(),
            })
    }
}

#[async_trait]
impl JobActions for FakeService {
    async fn delete_job(&self, request_id: &str) -> ApiResult<()> {
        let removed = self.jobs.lock().unwrap().remove(request_id);
        if removed.is_none() {
            return Err(ApiError::JobNotFound {
                request_id: request_id.to_string(),
            });
        }
        self.order.lock().unwrap().retain(|id| id != request_id);
        self.log.lock().unwrap().push(format!("delete {}", request_id));
        Ok(())
    }

    async fn download_result(
        &self,
        request_id: &str,
        target: &Path,
        _overwrite: bool,
    ) -> DownloadResult<u64> {
        let content = format!("netcdf payload for {}", request_id);
        tokio::fs::write(target, &content).await?;
        self.log.lock().unwrap().push(format!("download {}", request_id));
        Ok(content.len() as u64)
    }
}

fn service() -> FakeService {
    let service = FakeService::default();
    service.add("job-a", "successful", "2m_temperature", "1979");
    service.add("job-b", "running", "2m_temperature", "1980");
    service.add("job-c", "successful", "total_precipitation", "1981");
    service.add("job-d", "dismissed", "10m_u_component_of_wind", "1982");
    service.add("job-e", "successful", "2m_dewpoint_temperature", "1983");
    service
}

async fn open_db(dir: &TempDir, max_age: Duration) -> Result<JobDatabase> {
    let config = JobDbConfig::with_db_dir(dir.path().join("jobdb")).with_max_age(max_age);
    Ok(JobDatabase::open(config).await?)
}

#[tokio::test]
async fn test_refresh_select_and_download() -> Result<()> {
    let dir = TempDir::new()?;
    let output = dir.path().join("out");
    tokio::fs::create_dir_all(&output).await?;
    let db = open_db(&dir, Duration::from_secs(3600)).await?;
    let service = service();

    let summary = jobdb::refresh(&db, &service, 100).await?;
    assert_eq!(summary.count(JobStatus::Successful), 3);
    assert_eq!(summary.count(JobStatus::Running), 1);
    // Unknown terminal statuses are tracked as failed
    assert_eq!(summary.count(JobStatus::Failed), 1);
    assert_eq!(summary.emptied, vec![JobStatus::Accepted]);

    let rows = db.load(JobStatus::Successful).await?;
    let mut input = Cursor::new("2, 0\n");
    let mut shown = Vec::new();
    let selected = prompt_selection(&rows, "download", &mut input, &mut shown)?;
    assert_eq!(selected, vec![2, 0]);

    let prompt = String::from_utf8(shown)?;
    assert!(prompt.contains("[1] RID: job-c\tYEAR: 1981\tVAR: total_precipitation"));

    let action = Action::Download {
        output_dir: output.clone(),
        overwrite: false,
    };
    let outcomes = execute(&service, &rows, &selected, &action).await?;

    assert_eq!(service.log(), vec!["download job-e", "download job-a"]);
    assert_eq!(outcomes.len(), 2);
    match &outcomes[0] {
        Outcome::Downloaded { path, bytes, .. } => {
            assert_eq!(path, &output.join("2m_dewpoint_temperature_1983.nc"));
            assert_eq!(*bytes, tokio::fs::metadata(path).await?.len());
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(output.join("2m_temperature_1979.nc").exists());
    Ok(())
}

#[tokio::test]
async fn test_delete_then_refresh_drops_the_job() -> Result<()> {
    let dir = TempDir::new()?;
    let db = open_db(&dir, Duration::from_secs(3600)).await?;
    let service = service();
    jobdb::refresh(&db, &service, 100).await?;

    let rows = db.load(JobStatus::Running).await?;
    let selected = prompt_selection(&rows, "delete", &mut Cursor::new("all\n"), &mut Vec::new())?;
    execute(&service, &rows, &selected, &Action::Delete).await?;
    assert_eq!(service.log(), vec!["delete job-b"]);

    // The running file keeps its old rows until the next rebuild
    assert_eq!(db.load(JobStatus::Running).await?.len(), 1);

    let summary = jobdb::refresh(&db, &service, 100).await?;
    assert!(summary.emptied.contains(&JobStatus::Running));
    assert!(!db.path_for(JobStatus::Running).exists());
    Ok(())
}

#[tokio::test]
async fn test_stale_database_is_refused() -> Result<()> {
    let dir = TempDir::new()?;
    let db = open_db(&dir, Duration::ZERO).await?;
    jobdb::refresh(&db, &service(), 100).await?;

    let err = db.load(JobStatus::Successful).await.unwrap_err();
    assert!(matches!(err, JobDbError::Stale { .. }));

    let app_err = AppError::from(err);
    assert!(app_err.needs_refresh());

    // Statuses emptied by that rebuild are just as stale
    let err = db.load_listing(JobStatus::Accepted).await.unwrap_err();
    assert!(matches!(err, JobDbError::Stale { .. }));
    Ok(())
}

#[tokio::test]
async fn test_listing_every_status_after_partial_rebuild() -> Result<()> {
    let dir = TempDir::new()?;
    let db = open_db(&dir, Duration::from_secs(3600)).await?;
    let service = FakeService::default();
    service.add("job-s", "successful", "2m_temperature", "1990");

    let summary = jobdb::refresh(&db, &service, 100).await?;
    assert_eq!(summary.emptied.len(), 3);

    let mut counts = Vec::new();
    for status in JobStatus::ALL {
        counts.push((status, db.load_listing(status).await?.len()));
    }
    assert_eq!(
        counts,
        vec![
            (JobStatus::Accepted, 0),
            (JobStatus::Running, 0),
            (JobStatus::Successful, 1),
            (JobStatus::Failed, 0),
        ]
    );

    // Nothing to pick from is a selection error, not a rebuild hint
    let running = db.load_listing(JobStatus::Running).await?;
    let err = prompt_selection(&running, "delete", &mut Cursor::new("0\n"), &mut Vec::new())
        .unwrap_err();
    let app_err = AppError::from(err);
    assert!(!app_err.needs_refresh());
    assert_eq!(app_err.to_string(), "No jobs available to delete");
    Ok(())
}

#[tokio::test]
async fn test_invalid_choice_dispatches_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let db = open_db(&dir, Duration::from_secs(3600)).await?;
    let service = service();
    jobdb::refresh(&db, &service, 100).await?;

    let rows = db.load(JobStatus::Successful).await?;
    let err = prompt_selection(&rows, "delete", &mut Cursor::new("5\n"), &mut Vec::new())
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid choice! 5 is not between 0 and 2");
    assert!(service.log().is_empty());
    Ok(())
}

#[test]
fn test_job_limit_caps_each_status() {
    tokio_test::block_on(async {
        let dir = TempDir::new().unwrap();
        let db = open_db(&dir, Duration::from_secs(3600)).await.unwrap();

        let summary = jobdb::refresh(&db, &service(), 1).await.unwrap();
        assert_eq!(summary.count(JobStatus::Successful), 1);
        assert_eq!(summary.total_jobs(), 3);

        let rows = db.load(JobStatus::Successful).await.unwrap();
        assert_eq!(rows[0].request_id, "job-a");
    });
}
