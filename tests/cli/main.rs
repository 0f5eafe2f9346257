//! Integration tests for configuration loading and credential resolution
//!
//! These exercise the pieces main() wires together before any remote call:
//! config files on disk, command line overrides and the rc credentials file.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tempfile::TempDir;

use era5_fetcher::auth::Credentials;
use era5_fetcher::cli::{Cli, Commands};
use era5_fetcher::config::AppConfig;
use era5_fetcher::errors::{AppError, AuthError, ConfigError};

#[tokio::test]
async fn test_config_file_and_db_dir_override() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("era5-fetcher.toml");
    tokio::fs::write(
        &path,
        r#"
[jobdb]
max_age = "20m"
job_limit = 25

[download]
output_dir = "/data/era5"
"#,
    )
    .await?;

    let cli = Cli::try_parse_from([
        "era5_fetcher",
        "--config",
        path.to_str().unwrap(),
        "--db-dir",
        "/tmp/era5-jobs",
        "download",
    ])?;
    assert!(matches!(cli.command, Commands::Download(_)));

    let config = AppConfig::load(cli.global.config.clone())
        .await?
        .with_db_dir(cli.global.db_dir.clone());
    let runtime = config.to_runtime_config();

    assert_eq!(runtime.jobdb.max_age, Duration::from_secs(20 * 60));
    assert_eq!(runtime.jobdb.job_limit, 25);
    assert_eq!(
        runtime.jobdb.db_dir.as_deref(),
        Some(std::path::Path::new("/tmp/era5-jobs"))
    );
    assert_eq!(runtime.output_dir, std::path::PathBuf::from("/data/era5"));
    // Sections left out keep their defaults
    assert_eq!(config.client, AppConfig::default().client);
    Ok(())
}

#[tokio::test]
async fn test_explicit_missing_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = AppConfig::load(Some(dir.path().join("absent.toml")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Config(ConfigError::NotFound { .. })));
}

#[tokio::test]
async fn test_invalid_values_are_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("bad.toml");
    tokio::fs::write(&path, "[client]\nrate_limit_rps = 0\n").await?;

    let err = AppConfig::load(Some(path)).await.unwrap_err();
    assert!(err.to_string().contains("client.rate_limit_rps"));
    Ok(())
}

#[tokio::test]
async fn test_written_default_loads_back() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("nested").join("config.toml");

    AppConfig::write_default(&path, false).await?;
    assert!(AppConfig::write_default(&path, false).await.is_err());
    AppConfig::write_default(&path, true).await?;

    let loaded = AppConfig::load(Some(path)).await?;
    assert_eq!(loaded, AppConfig::default());
    Ok(())
}

#[test]
fn test_rc_file_credentials() -> Result<()> {
    let dir = TempDir::new()?;
    let rc = dir.path().join(".ecmwfdatastoresrc");
    std::fs::write(
        &rc,
        "# Data Stores access\nurl: https://cds.climate.copernicus.eu/api\nkey: 0f1e2d3c-4b5a-6978\n",
    )?;

    let from_file = Credentials::resolve(None, None, Some(&rc))?;
    assert_eq!(from_file.url, "https://cds.climate.copernicus.eu/api");
    assert_eq!(from_file.key, "0f1e2d3c-4b5a-6978");

    let overridden = Credentials::resolve(
        Some("https://ads.atmosphere.copernicus.eu/api".to_string()),
        None,
        Some(&rc),
    )?;
    assert_eq!(overridden.url, "https://ads.atmosphere.copernicus.eu/api");
    assert_eq!(overridden.key, from_file.key);

    let missing = Credentials::resolve(None, None, Some(&dir.path().join("none")));
    assert!(matches!(missing, Err(AuthError::MissingCredentials)));
    Ok(())
}
