//! ERA5 Fetcher CLI application
//!
//! Command-line interface for submitting, tracking and downloading ERA5 daily
//! statistics jobs on the ECMWF Data Stores.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use era5_fetcher::cli::{
    handle_auth, handle_build_db, handle_check, handle_config, handle_delete, handle_download,
    handle_retrieve, handle_submit, Cli, Commands,
};
use era5_fetcher::config::AppConfig;
use era5_fetcher::errors::Result;

// Every remote call is awaited in sequence, so one thread is enough
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if e.needs_refresh() {
            eprintln!("Run 'era5_fetcher build_db' to rebuild the job database.");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    let config = AppConfig::load(cli.global.config.clone())
        .await?
        .with_db_dir(cli.global.db_dir.clone());

    init_logging(&cli, &config);

    info!("ERA5 Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Submit(args) => {
            info!("Executing submit command");
            handle_submit(args, &config).await
        }
        Commands::Check(args) => {
            info!("Executing check command");
            handle_check(args, &config).await
        }
        Commands::Download(args) => {
            info!("Executing download command");
            handle_download(args, &config).await
        }
        Commands::Retrieve(args) => {
            info!("Executing retrieve command");
            handle_retrieve(args, &config).await
        }
        Commands::Delete(args) => {
            info!("Executing delete command");
            handle_delete(args, &config).await
        }
        Commands::BuildDb(args) => {
            info!("Executing build_db command");
            handle_build_db(args, &config).await
        }
        Commands::Auth(args) => {
            info!("Executing auth command");
            handle_auth(args, &config).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(args, &config).await
        }
    }
}

/// Initialize logging from the verbosity flags, falling back to the config file
fn init_logging(cli: &Cli, config: &AppConfig) {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| config.logging.level.clone());

    let mut filter = EnvFilter::from_default_env();
    match format!("era5_fetcher={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log level '{}': {}", level, e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
