//! Command-line interface components
//!
//! This module contains CLI-specific code for the ERA5 Fetcher application:
//! argument parsing, command handlers and output formatting.

pub mod args;
pub mod commands;
pub mod display;

pub use args::{
    AuthAction, AuthArgs, BuildDbArgs, CheckArgs, Cli, Commands, ConfigAction, ConfigArgs,
    DataTypeArg, DeleteArgs, DownloadArgs, GlobalArgs, RequestArgs, RetrieveArgs, StatusArg,
};
pub use commands::{
    handle_auth, handle_build_db, handle_check, handle_config, handle_delete, handle_download,
    handle_retrieve, handle_submit,
};
