//! Result file download with atomic writes and streaming
//!
//! Result files are streamed chunk by chunk into a temporary file next to the
//! destination, checked against the advertised size and then renamed into
//! place, so an interrupted download never leaves a truncated `.nc` behind.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Method;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::app::client::http::HttpHandler;
use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult};

/// File download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
    show_progress: bool,
}

impl<'a> DownloadHandler<'a> {
    /// Creates a new DownloadHandler with the given HTTP handler
    pub fn new(http_handler: &'a HttpHandler, show_progress: bool) -> Self {
        Self {
            http_handler,
            show_progress,
        }
    }

    /// Downloads `url` to `destination` and returns the number of bytes written
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The file already exists and `overwrite` is false
    /// - The server answers with a non-success status
    /// - Fewer or more bytes arrive than `expected_size`
    /// - File I/O or the final rename fails
    pub async fn download_file(
        &self,
        url: &Url,
        destination: &Path,
        expected_size: Option<u64>,
        overwrite: bool,
    ) -> DownloadResult<u64> {
        if destination.exists() && !overwrite {
            return Err(DownloadError::FileExists {
                path: destination.display().to_string(),
            });
        }

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = temp_path_for(destination);
        let written = match self.stream_to(url, &temp_path, expected_size).await {
            Ok(written) => written,
            Err(e) => {
                if temp_path.exists() {
                    let _ = tokio::fs::remove_file(&temp_path).await;
                }
                return Err(e);
            }
        };

        tokio::fs::rename(&temp_path, destination)
            .await
            .map_err(|_e| DownloadError::AtomicOperationFailed {
                temp_path: temp_path.clone(),
                final_path: destination.to_path_buf(),
            })?;

        tracing::info!(
            "Downloaded {} bytes to {}",
            written,
            destination.display()
        );
        Ok(written)
    }

    async fn stream_to(
        &self,
        url: &Url,
        temp_path: &Path,
        expected_size: Option<u64>,
    ) -> DownloadResult<u64> {
        // Result downloads can be large, so no per-request timeout
        let response = self.http_handler.send(Method::GET, url, None, None).await?;

        if !response.status().is_success() {
            return Err(DownloadError::ServerError {
                status: response.status().as_u16(),
            });
        }

        let total = expected_size.or_else(|| response.content_length());
        let progress = self.progress_bar(total);

        let mut file = File::create(temp_path).await?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            if let Some(pb) = &progress {
                pb.set_position(written);
            }
        }
        file.flush().await?;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        check_size(expected_size, written)?;
        Ok(written)
    }

    fn progress_bar(&self, total: Option<u64>) -> Option<ProgressBar> {
        if !self.show_progress || !atty::is(atty::Stream::Stderr) {
            return None;
        }

        let pb = match total {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        Some(pb)
    }
}

/// Temporary file used while `destination` is being written
pub fn temp_path_for(destination: &Path) -> PathBuf {
    destination.with_extension(format!(
        "{}{}",
        destination
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or(""),
        files::TEMP_FILE_SUFFIX
    ))
}

fn check_size(expected: Option<u64>, actual: u64) -> DownloadResult<()> {
    match expected {
        Some(expected) if expected != actual => {
            Err(DownloadError::SizeMismatch { expected, actual })
        }
        _ => Ok(()),
    }
}
