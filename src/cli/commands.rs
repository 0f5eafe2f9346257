//! Command handlers for ERA5 Fetcher CLI
//!
//! This module implements the handlers that connect CLI arguments to the
//! client, the job database, interactive selection and action dispatch.

use std::io;

use tracing::{debug, info};

use crate::app::models::result_file_name;
use crate::app::{
    execute, jobdb, prompt_selection, Action, DataStoresClient, JobDatabase, JobRecord, JobStatus,
    Outcome,
};
use crate::auth::{ensure_authenticated, setup_credentials, show_auth_status, verify_credentials};
use crate::cli::args::{
    AuthAction, AuthArgs, BuildDbArgs, CheckArgs, ConfigAction, ConfigArgs, DeleteArgs,
    DownloadArgs, RequestArgs, RetrieveArgs,
};
use crate::cli::display;
use crate::config::{AppConfig, RuntimeConfig};
use crate::constants::api;
use crate::errors::{AppError, Result, SelectionError};

/// Handle the submit command
pub async fn handle_submit(args: RequestArgs, config: &AppConfig) -> Result<()> {
    let request = args.to_request()?;
    let runtime = config.to_runtime_config();
    let client = connect(&runtime).await?;

    let job = client.submit(&request).await?;
    println!("Request submitted with ID {}", job.job_id);
    println!("Status: {}", job.status);
    Ok(())
}

/// Handle the check command
///
/// Queries the service by default; `--cached` reads the job database and is
/// subject to the same staleness gate as selection. The job limit applies to
/// both.
pub async fn handle_check(args: CheckArgs, config: &AppConfig) -> Result<()> {
    let runtime = config.to_runtime_config();
    let limit = job_limit(args.num_jobs, &runtime)?;

    if args.cached {
        let db = JobDatabase::open(runtime.jobdb.clone()).await?;
        for (status, rows, total) in cached_listing(&db, &args.status.statuses(), limit).await? {
            print_cached(status, &rows, total);
        }
        return Ok(());
    }

    let client = connect(&runtime).await?;
    for status in args.status.statuses() {
        let request_ids = client
            .get_jobs(status, limit, api::SORT_OLDEST_FIRST)
            .await?;
        println!("Fetching status of {} jobs ...", status);
        for request_id in request_ids {
            let job = client.get_remote(&request_id).await?;
            println!("{}", display::format_job_info(&job));
        }
    }
    Ok(())
}

/// Rows of each status from the job database, at most `limit` per status,
/// with the number of rows on file
async fn cached_listing(
    db: &JobDatabase,
    statuses: &[JobStatus],
    limit: usize,
) -> Result<Vec<(JobStatus, Vec<JobRecord>, usize)>> {
    let mut listing = Vec::with_capacity(statuses.len());
    for &status in statuses {
        let mut rows = db.load_listing(status).await?;
        let total = rows.len();
        rows.truncate(limit);
        listing.push((status, rows, total));
    }
    Ok(listing)
}

fn print_cached(status: JobStatus, rows: &[JobRecord], total: usize) {
    println!("\nJobs marked as {} ({}):", status, total);
    for (i, row) in rows.iter().enumerate() {
        println!("\t{}", crate::app::selection::format_row(i, row));
    }
    if total > rows.len() {
        println!("\t... {} more", total - rows.len());
    }
}

/// Handle the download command
pub async fn handle_download(args: DownloadArgs, config: &AppConfig) -> Result<()> {
    let runtime = config.to_runtime_config();
    let action = Action::Download {
        output_dir: args.output.unwrap_or_else(|| runtime.output_dir.clone()),
        overwrite: args.force,
    };
    select_and_execute(JobStatus::Successful, action, &runtime).await
}

/// Handle the delete command
pub async fn handle_delete(args: DeleteArgs, config: &AppConfig) -> Result<()> {
    let status = args.validate().map_err(AppError::generic)?;
    let runtime = config.to_runtime_config();
    select_and_execute(status, Action::Delete, &runtime).await
}

/// Load a status file, let the user pick rows and run `action` on each
async fn select_and_execute(
    status: JobStatus,
    action: Action,
    runtime: &RuntimeConfig,
) -> Result<()> {
    let db = JobDatabase::open(runtime.jobdb.clone()).await?;
    let rows = db.load_listing(status).await?;
    info!("Loaded {} '{}' jobs from the job database", rows.len(), status);
    if rows.is_empty() {
        return Err(SelectionError::NothingToSelect {
            task: action.verb().to_string(),
        }
        .into());
    }

    let client = connect(runtime).await?;

    let selected = {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        prompt_selection(&rows, action.verb(), &mut input, &mut output)?
    };
    debug!("Selected rows {:?}", selected);

    let outcomes = execute(&client, &rows, &selected, &action).await?;
    for outcome in &outcomes {
        if let Outcome::Downloaded { bytes, path, .. } = outcome {
            info!("{} bytes written to {}", bytes, path.display());
        }
    }
    println!("Done.");
    Ok(())
}

/// Handle the retrieve command
pub async fn handle_retrieve(args: RetrieveArgs, config: &AppConfig) -> Result<()> {
    let request = args.request.to_request()?;
    let runtime = config.to_runtime_config();
    let output_dir = args.output.unwrap_or_else(|| runtime.output_dir.clone());
    let target = output_dir.join(result_file_name(
        request.variable().unwrap_or_default(),
        request.year().unwrap_or_default(),
    )?);

    let client = connect(&runtime).await?;
    let bytes = client.retrieve(&request, &target, args.force).await?;
    info!("Retrieved {} bytes", bytes);
    println!("\tSaved to: {}", target.display());
    Ok(())
}

/// Handle the build_db command
pub async fn handle_build_db(args: BuildDbArgs, config: &AppConfig) -> Result<()> {
    let runtime = config.to_runtime_config();
    let db = JobDatabase::open(runtime.jobdb.clone()).await?;

    if args.info {
        println!("Job database: {}", db.db_dir().display());
        match db.last_refresh_age().await? {
            Some(age) => println!("Last rebuild: {} ago", display::format_age(age)),
            None => println!("Last rebuild: never"),
        }
        let infos = db.file_info().await?;
        println!("{}", display::format_file_info(&infos, runtime.jobdb.max_age));
        return Ok(());
    }

    let limit = job_limit(args.num_jobs, &runtime)?;
    let client = connect(&runtime).await?;

    println!("Rebuilding job database in {} ...", db.db_dir().display());
    let summary = jobdb::refresh(&db, &client, limit).await?;
    println!("{}", display::format_refresh_summary(&summary));
    Ok(())
}

/// Handle authentication management commands
pub async fn handle_auth(args: AuthArgs, config: &AppConfig) -> Result<()> {
    let client_config = config.to_runtime_config().client;
    match args.action {
        AuthAction::Setup { force } => {
            if force || !crate::auth::check_credentials() {
                setup_credentials(&client_config, force).await?;
            } else {
                println!("Credentials already configured. Use --force to update.");
            }
        }
        AuthAction::Verify => {
            if verify_credentials(&client_config).await? {
                println!("Credentials verified successfully");
            } else {
                return Err(AppError::generic("Credential verification failed"));
            }
        }
        AuthAction::Status => {
            show_auth_status(&client_config).await?;
        }
    }

    Ok(())
}

/// Handle configuration management commands
pub async fn handle_config(args: ConfigArgs, config: &AppConfig) -> Result<()> {
    match args.action {
        ConfigAction::Init { force } => {
            let path = AppConfig::default_config_path()
                .ok_or_else(|| AppError::generic("Could not determine user config directory"))?;
            AppConfig::write_default(&path, force).await?;
            println!("Created default configuration file:");
            println!("   {}", path.display());
        }
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

/// Resolve credentials and build a verified client
async fn connect(runtime: &RuntimeConfig) -> Result<DataStoresClient> {
    let credentials = ensure_authenticated(&runtime.client).await?;
    let client = DataStoresClient::new(&credentials, runtime.client.clone()).await?;
    Ok(client)
}

/// Per-status job limit from the flag or the configuration
fn job_limit(flag: Option<usize>, runtime: &RuntimeConfig) -> Result<usize> {
    match flag {
        Some(0) => Err(AppError::generic("Number of jobs must be greater than 0")),
        Some(n) => Ok(n),
        None => Ok(runtime.jobdb.job_limit),
    }
}
