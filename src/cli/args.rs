//! Command-line argument parsing for ERA5 Fetcher
//!
//! This module defines the CLI structure using clap derive macros: one
//! subcommand per task plus credential and configuration management.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::app::{DataRequest, DataType, JobStatus};
use crate::errors::RequestError;

/// ERA5 Fetcher - Submit, track and download ERA5 daily statistics
#[derive(Parser, Debug)]
#[command(
    name = "era5_fetcher",
    version,
    about = "Submit, track and download ERA5 daily statistics from the ECMWF Data Stores",
    long_about = "A command-line helper around the ECMWF Data Stores retrieve API.
Jobs are listed into a local per-status job database (build_db), from which
finished jobs can be picked interactively for download or deletion."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - only errors are logged
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Job database directory
    #[arg(long, global = true, value_name = "DIR")]
    pub db_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a request and print its request id
    Submit(RequestArgs),

    /// Show the status of remote jobs
    Check(CheckArgs),

    /// Pick finished jobs from the job database and download them
    Download(DownloadArgs),

    /// Submit a request, wait for it and download the result
    Retrieve(RetrieveArgs),

    /// Pick jobs from the job database and delete them
    Delete(DeleteArgs),

    /// Rebuild the job database from the service
    #[command(name = "build_db", alias = "build-db")]
    BuildDb(BuildDbArgs),

    /// Manage authentication credentials
    Auth(AuthArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Product selection on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataTypeArg {
    #[default]
    SingleLevel,
    PressureLevel,
}

impl From<DataTypeArg> for DataType {
    fn from(arg: DataTypeArg) -> Self {
        match arg {
            DataTypeArg::SingleLevel => DataType::SingleLevel,
            DataTypeArg::PressureLevel => DataType::PressureLevel,
        }
    }
}

/// Job status filter on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusArg {
    Accepted,
    Running,
    Successful,
    Failed,
    All,
}

impl StatusArg {
    /// Statuses covered by the filter, in listing order
    pub fn statuses(&self) -> Vec<JobStatus> {
        match self {
            StatusArg::Accepted => vec![JobStatus::Accepted],
            StatusArg::Running => vec![JobStatus::Running],
            StatusArg::Successful => vec![JobStatus::Successful],
            StatusArg::Failed => vec![JobStatus::Failed],
            StatusArg::All => JobStatus::ALL.to_vec(),
        }
    }
}

/// What to request: one variable for one year
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Variable name (e.g. 2m_temperature)
    #[arg(long = "var", value_name = "VAR")]
    pub variable: String,

    /// Year, from 1940 to the current year
    #[arg(short, long)]
    pub year: i32,

    /// Product type
    #[arg(long, value_enum, default_value_t = DataTypeArg::SingleLevel)]
    pub data_type: DataTypeArg,

    /// Pressure level in hPa (pressure-level data only)
    #[arg(short = 'l', long = "plevel", value_name = "HPA")]
    pub pressure_level: Option<u32>,
}

impl RequestArgs {
    /// Build the request these arguments describe
    pub fn to_request(&self) -> Result<DataRequest, RequestError> {
        DataRequest::build(
            self.data_type.into(),
            &self.variable,
            self.year,
            self.pressure_level,
        )
    }
}

/// Arguments for the check command
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Status of the jobs to show
    #[arg(short, long, value_enum)]
    pub status: StatusArg,

    /// Number of jobs to query per status
    #[arg(short, long)]
    pub num_jobs: Option<usize>,

    /// Read the job database instead of querying the service
    #[arg(long)]
    pub cached: bool,
}

/// Arguments for the download command
#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Output directory (defaults to the configured one)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Overwrite existing files
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the retrieve command
#[derive(Args, Debug, Clone)]
pub struct RetrieveArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Output directory (defaults to the configured one)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the delete command
#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Status file to pick jobs from
    #[arg(short, long, value_enum, default_value_t = StatusArg::Successful)]
    pub status: StatusArg,
}

impl DeleteArgs {
    /// Selection works on one status file at a time
    pub fn validate(&self) -> Result<JobStatus, String> {
        match self.status.statuses().as_slice() {
            [status] => Ok(*status),
            _ => Err("delete works on one status at a time; pick one with --status".to_string()),
        }
    }
}

/// Arguments for the build_db command
#[derive(Args, Debug, Clone)]
pub struct BuildDbArgs {
    /// Number of jobs to query per status
    #[arg(short, long)]
    pub num_jobs: Option<usize>,

    /// Show the state of the job database files instead of rebuilding
    #[arg(long)]
    pub info: bool,
}

/// Arguments for authentication management
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Authentication actions
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Set up Data Stores credentials
    Setup {
        /// Force setup even if credentials exist
        #[arg(short, long)]
        force: bool,
    },

    /// Verify current credentials
    Verify,

    /// Show authentication status
    Status,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_submit_arguments() {
        let cli = parse(&[
            "era5_fetcher",
            "submit",
            "--var",
            "2m_temperature",
            "-y",
            "1985",
        ]);
        match cli.command {
            Commands::Submit(args) => {
                assert_eq!(args.variable, "2m_temperature");
                assert_eq!(args.year, 1985);
                assert_eq!(args.data_type, DataTypeArg::SingleLevel);
                let request = args.to_request().unwrap();
                assert_eq!(request.year(), Some("1985"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_pressure_level_retrieve() {
        let cli = parse(&[
            "era5_fetcher",
            "retrieve",
            "--var",
            "temperature",
            "-y",
            "2001",
            "--data-type",
            "pressure-level",
            "-l",
            "850",
            "-o",
            "/data",
        ]);
        match cli.command {
            Commands::Retrieve(args) => {
                assert_eq!(args.request.pressure_level, Some(850));
                assert_eq!(args.output, Some(PathBuf::from("/data")));
                assert!(args.request.to_request().is_ok());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_build_db_names() {
        for name in ["build_db", "build-db"] {
            let cli = parse(&["era5_fetcher", name, "-n", "20"]);
            assert!(matches!(
                cli.command,
                Commands::BuildDb(BuildDbArgs {
                    num_jobs: Some(20),
                    info: false
                })
            ));
        }
    }

    #[test]
    fn test_check_requires_status() {
        assert!(Cli::try_parse_from(["era5_fetcher", "check"]).is_err());

        let cli = parse(&["era5_fetcher", "check", "-s", "all", "--cached"]);
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.status.statuses().len(), 4);
                assert!(args.cached);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_delete_status() {
        let cli = parse(&["era5_fetcher", "delete"]);
        match cli.command {
            Commands::Delete(args) => assert_eq!(args.validate(), Ok(JobStatus::Successful)),
            other => panic!("unexpected command {:?}", other),
        }

        let args = DeleteArgs {
            status: StatusArg::All,
        };
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let cli_quiet = parse(&["era5_fetcher", "-q", "auth", "status"]);
        let cli_verbose = parse(&["era5_fetcher", "build_db", "-v"]);
        let cli_debug = parse(&["era5_fetcher", "--very-verbose", "config", "show"]);
        let cli_default = parse(&["era5_fetcher", "download"]);

        assert_eq!(cli_quiet.log_level(), Some(tracing::Level::ERROR));
        assert_eq!(cli_verbose.log_level(), Some(tracing::Level::INFO));
        assert_eq!(cli_debug.log_level(), Some(tracing::Level::DEBUG));
        assert_eq!(cli_default.log_level(), None);
    }

    #[test]
    fn test_global_db_dir() {
        let cli = parse(&["era5_fetcher", "delete", "--db-dir", "/tmp/jobs"]);
        assert_eq!(cli.global.db_dir, Some(PathBuf::from("/tmp/jobs")));
    }
}
