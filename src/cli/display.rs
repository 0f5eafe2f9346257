//! Text rendering for command output
//!
//! Job detail blocks, job database summaries and small formatting helpers.
//! Everything here returns strings so handlers decide where output goes.

use std::fmt::Write;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::app::jobdb::{RefreshSummary, StatusFileInfo};
use crate::app::RemoteJob;

/// Detail block printed by `check` for one remote job
pub fn format_job_info(job: &RemoteJob) -> String {
    let readiness = if job.results_ready() { "READY" } else { "NOT READY" };
    let collection = job.process_id.as_deref().unwrap_or("unknown collection");
    let variable = job.request_value("variable").unwrap_or_else(|| "?".to_string());
    let year = job.request_value("year").unwrap_or_else(|| "?".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "\nGetting info for request with ID {}", job.job_id);
    let _ = writeln!(
        out,
        "Submitted at: {}",
        job.created.as_deref().map(format_timestamp).unwrap_or_default()
    );
    let _ = writeln!(out, "For data from : {}", collection);
    let _ = writeln!(out, "Particulars of the data requested");
    let _ = writeln!(out, "{}, {}, {}", variable, year, job.status);
    if let Some(reason) = job.failure_reason() {
        let _ = writeln!(out, "Failure reason: {}", reason);
    }
    let _ = write!(out, "Job with ID {} is {} for download", job.job_id, readiness);
    out
}

/// Render an API timestamp in UTC, or return it unchanged if unparsable
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Compact age such as `2h 05m` or `42s`
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    let (days, hours, minutes, seconds) = (
        secs / 86_400,
        (secs % 86_400) / 3600,
        (secs % 3600) / 60,
        secs % 60,
    );
    if days > 0 {
        format!("{}d {:02}h", days, hours)
    } else if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Table of the job database files
pub fn format_file_info(infos: &[StatusFileInfo], max_age: Duration) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:>6} {:>10}  {:<7} FILE",
        "STATUS", "JOBS", "AGE", "STATE"
    );
    for info in infos {
        let (age, state) = match info.age {
            Some(age) if info.fresh => (format_age(age), "fresh"),
            Some(age) => (format_age(age), "stale"),
            None => ("-".to_string(), "missing"),
        };
        let _ = writeln!(
            out,
            "{:<12} {:>6} {:>10}  {:<7} {}",
            info.status.as_str(),
            info.rows,
            age,
            state,
            info.path.display()
        );
    }
    let _ = write!(
        out,
        "Files older than {} must be rebuilt with build_db",
        format_age(max_age)
    );
    out
}

/// One line per status after a refresh
pub fn format_refresh_summary(summary: &RefreshSummary) -> String {
    let mut out = String::new();
    for (status, count) in &summary.written {
        let _ = writeln!(out, "\t{:<12} {} job(s)", status.as_str(), count);
    }
    for status in &summary.emptied {
        let _ = writeln!(out, "\t{:<12} none", status.as_str());
    }
    let _ = write!(out, "Job database rebuilt with {} job(s)", summary.total_jobs());
    out
}
