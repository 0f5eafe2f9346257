//! Execution of an action on selected job rows
//!
//! Maps each selected [`JobRecord`] to a delete or a download, invoked one row
//! at a time in selection order. The first failure aborts the remaining rows.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::app::models::JobRecord;
use crate::errors::{ApiResult, DownloadResult, Result, SelectionError};

/// Remote operations the dispatcher needs
#[async_trait]
pub trait JobActions {
    /// Delete a job on the service
    async fn delete_job(&self, request_id: &str) -> ApiResult<()>;

    /// Download the result of a finished job to `target`
    async fn download_result(
        &self,
        request_id: &str,
        target: &Path,
        overwrite: bool,
    ) -> DownloadResult<u64>;
}

/// What to do with each selected row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Delete,
    Download { output_dir: PathBuf, overwrite: bool },
}

impl Action {
    /// Verb shown in the selection prompt
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Delete => "delete",
            Action::Download { .. } => "download",
        }
    }

    /// Label printed while the action runs
    pub fn progress_label(&self) -> &'static str {
        match self {
            Action::Delete => "Deleting",
            Action::Download { .. } => "Downloading",
        }
    }
}

/// Result of the action on one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deleted { request_id: String },
    Downloaded { request_id: String, path: PathBuf, bytes: u64 },
}

/// Run `action` for every row of `rows` listed in `selected`
///
/// Indices and download targets are resolved for the whole selection before
/// the first remote call.
pub async fn execute<A>(
    actions: &A,
    rows: &[JobRecord],
    selected: &[usize],
    action: &Action,
) -> Result<Vec<Outcome>>
where
    A: JobActions + Sync + ?Sized,
{
    let mut chosen = Vec::with_capacity(selected.len());
    for &index in selected {
        let row = rows.get(index).ok_or(SelectionError::OutOfRange {
            index,
            max: rows.len().saturating_sub(1),
        })?;
        if let Action::Download { .. } = action {
            row.target_file_name()?;
        }
        chosen.push(row);
    }

    let mut outcomes = Vec::with_capacity(chosen.len());
    for row in chosen {
        println!(
            "\t{} ...\n\tRID: {}\tYEAR: {}\tVAR: {}",
            action.progress_label(),
            row.request_id,
            row.year,
            row.variable
        );

        let outcome = match action {
            Action::Delete => {
                actions.delete_job(&row.request_id).await?;
                info!("Deleted job {}", row.request_id);
                Outcome::Deleted {
                    request_id: row.request_id.clone(),
                }
            }
            Action::Download {
                output_dir,
                overwrite,
            } => {
                let target = output_dir.join(row.target_file_name()?);
                let bytes = actions
                    .download_result(&row.request_id, &target, *overwrite)
                    .await?;
                println!("\tSaved to: {}", target.display());
                Outcome::Downloaded {
                    request_id: row.request_id.clone(),
                    path: target,
                    bytes,
                }
            }
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}
