//! HTTP client for the ECMWF Data Stores retrieve API
//!
//! This module provides the client used by every task: token verification,
//! job listing and inspection, submission, polling, result download and
//! deletion, with rate limiting and exponential backoff underneath.
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `auth`: access token verification
//! - `http`: Core HTTP operations with resilience patterns
//! - `download`: Result downloads with streaming and atomic writes

use std::path::Path;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use crate::app::dispatch::JobActions;
use crate::app::jobdb::JobSource;
use crate::app::models::{AssetValue, JobList, JobResults, JobStatus, RemoteJob};
use crate::app::request::DataRequest;
use crate::auth::Credentials;
use crate::constants::api;
use crate::errors::{ApiError, ApiResult, AuthResult, DownloadResult};

pub mod auth;
pub mod config;
pub mod download;
pub mod http;

pub use config::ClientConfig;

use auth::AuthHandler;
use download::DownloadHandler;
use http::HttpHandler;

/// Client for the Data Stores retrieve API
///
/// All calls are awaited one after another; the handler's rate limiter and
/// retry logic sit underneath every request.
#[derive(Debug)]
pub struct DataStoresClient {
    http_handler: HttpHandler,
    config: ClientConfig,
}

impl DataStoresClient {
    /// Creates a client and verifies the access token with the service
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the client cannot be built or the token is rejected
    pub async fn new(credentials: &Credentials, config: ClientConfig) -> AuthResult<Self> {
        let client = Self::new_unverified(credentials, config)?;
        client.check_authentication().await?;
        Ok(client)
    }

    /// Creates a client without contacting the service
    pub fn new_unverified(credentials: &Credentials, config: ClientConfig) -> AuthResult<Self> {
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(
            client,
            &credentials.url,
            credentials.key.clone(),
            config.rate_limit_rps,
            config.request_timeout,
        )?;

        tracing::debug!("Created Data Stores client for {}", http_handler.base_url());

        Ok(Self {
            http_handler,
            config,
        })
    }

    /// Verify the access token
    pub async fn check_authentication(&self) -> AuthResult<()> {
        AuthHandler::verify(&self.http_handler).await
    }

    /// Request ids of jobs in `status`, ordered by `sortby`
    pub async fn get_jobs(
        &self,
        status: JobStatus,
        limit: usize,
        sortby: &str,
    ) -> ApiResult<Vec<String>> {
        let mut url = self.http_handler.endpoint(api::JOBS_PATH)?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("sortby", sortby)
            .append_pair("status", status.as_str());

        let list: JobList = self.http_handler.get_json(&url).await?;
        tracing::debug!("{} '{}' jobs listed", list.jobs.len(), status);
        Ok(list.request_ids())
    }

    /// Job detail including its request parameters
    pub async fn get_remote(&self, request_id: &str) -> ApiResult<RemoteJob> {
        self.get_job(request_id, true).await
    }

    async fn get_job(&self, request_id: &str, with_request: bool) -> ApiResult<RemoteJob> {
        let mut url = self.job_url(request_id, "")?;
        if with_request {
            url.query_pairs_mut().append_pair("request", "true");
        }
        self.http_handler
            .get_json(&url)
            .await
            .map_err(|e| not_found_as_missing_job(e, request_id))
    }

    /// Submit a request and return the new job
    pub async fn submit(&self, request: &DataRequest) -> ApiResult<RemoteJob> {
        let path = format!(
            "{}/{}/execution",
            api::PROCESSES_PATH,
            request.collection_id
        );
        let url = self.http_handler.endpoint(&path)?;
        tracing::debug!("Submitting {}", describe_submission(request));
        let job: RemoteJob = self.http_handler.post_json(&url, &request.body()).await?;
        tracing::info!(
            "Submitted request {} to {} ({})",
            job.job_id,
            request.collection_id,
            job.status
        );
        Ok(job)
    }

    /// Result asset of a finished job
    pub async fn results(&self, request_id: &str) -> ApiResult<AssetValue> {
        let url = self.job_url(request_id, "/results")?;
        let results: JobResults = self
            .http_handler
            .get_json(&url)
            .await
            .map_err(|e| not_found_as_missing_job(e, request_id))?;
        Ok(results.asset.value)
    }

    /// Download the result of `request_id` to `target`
    pub async fn download(
        &self,
        request_id: &str,
        target: &Path,
        overwrite: bool,
    ) -> DownloadResult<u64> {
        let asset = self.results(request_id).await?;
        let url = self.http_handler.endpoint(&asset.href)?;
        tracing::info!(
            "Downloading result of {} ({}) from {}",
            request_id,
            asset.content_type.as_deref().unwrap_or("unknown type"),
            url
        );

        DownloadHandler::new(&self.http_handler, self.config.show_progress)
            .download_file(&url, target, asset.size, overwrite)
            .await
    }

    /// Delete a job on the service
    pub async fn delete(&self, request_id: &str) -> ApiResult<()> {
        let url = self.job_url(request_id, "")?;
        self.http_handler
            .call(Method::DELETE, &url, None)
            .await
            .map_err(|e| not_found_as_missing_job(e, request_id))?;
        tracing::info!("Deleted job {}", request_id);
        Ok(())
    }

    /// Poll a job until it finishes
    ///
    /// The sleep between polls starts at the configured initial interval and
    /// grows by half each round up to the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::JobFailed` when the job ends without results
    pub async fn wait_until_complete(&self, request_id: &str) -> ApiResult<RemoteJob> {
        let mut interval = self.config.poll_initial_interval;
        let mut last_status = String::new();

        loop {
            let job = self.get_job(request_id, false).await?;
            if job.status != last_status {
                tracing::info!("Job {} is {}", request_id, job.status);
                last_status = job.status.clone();
            }

            let status = job.job_status();
            if status.is_terminal() {
                if status == JobStatus::Successful {
                    return Ok(job);
                }
                let reason = self.failure_reason(&job).await;
                return Err(ApiError::JobFailed {
                    request_id: request_id.to_string(),
                    reason,
                });
            }

            tracing::debug!("Sleeping {:?} before polling {}", interval, request_id);
            tokio::time::sleep(interval).await;
            interval = self.config.next_poll_interval(interval);
        }
    }

    /// The service reports why a job failed through its results endpoint
    async fn failure_reason(&self, job: &RemoteJob) -> String {
        if let Some(reason) = job.failure_reason() {
            return reason;
        }
        match self.results(&job.job_id).await {
            Err(ApiError::Status { body, .. }) if !body.is_empty() => body,
            Err(e) => e.to_string(),
            Ok(_) => format!("job ended with status '{}'", job.status),
        }
    }

    /// Submit, wait for completion and download to `target`
    pub async fn retrieve(
        &self,
        request: &DataRequest,
        target: &Path,
        overwrite: bool,
    ) -> DownloadResult<u64> {
        let job = self.submit(request).await?;
        println!("Request submitted with ID {}", job.job_id);
        self.wait_until_complete(&job.job_id).await?;
        self.download(&job.job_id, target, overwrite).await
    }

    fn job_url(&self, request_id: &str, suffix: &str) -> ApiResult<url::Url> {
        self.http_handler
            .endpoint(&format!("{}/{}{}", api::JOBS_PATH, request_id, suffix))
    }

    /// Effective client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// API root this client talks to
    pub fn base_url(&self) -> &url::Url {
        self.http_handler.base_url()
    }
}

fn not_found_as_missing_job(error: ApiError, request_id: &str) -> ApiError {
    match error {
        ApiError::Status { status: 404, .. } => ApiError::JobNotFound {
            request_id: request_id.to_string(),
        },
        other => other,
    }
}

#[async_trait]
impl JobSource for DataStoresClient {
    async fn list_request_ids(&self, status: JobStatus, limit: usize) -> ApiResult<Vec<String>> {
        self.get_jobs(status, limit, api::SORT_NEWEST_FIRST).await
    }

    async fn job_detail(&self, request_id: &str) -> ApiResult<RemoteJob> {
        self.get_remote(request_id).await
    }
}

#[async_trait]
impl JobActions for DataStoresClient {
    async fn delete_job(&self, request_id: &str) -> ApiResult<()> {
        self.delete(request_id).await
    }

    async fn download_result(
        &self,
        request_id: &str,
        target: &Path,
        overwrite: bool,
    ) -> DownloadResult<u64> {
        self.download(request_id, target, overwrite).await
    }
}

/// Body shape posted for a submission, for logging at debug level
pub fn describe_submission(request: &DataRequest) -> String {
    json!({
        "collection": request.collection_id,
        "inputs": request.inputs,
    })
    .to_string()
}
