//! Authentication management for Data Stores credentials
//!
//! This module resolves the API URL and access key, and provides the
//! interactive setup, verification and status display behind `auth`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use era5_fetcher::app::ClientConfig;
//! use era5_fetcher::auth::{check_credentials, setup_credentials};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! if !check_credentials() {
//!     println!("Setting up credentials...");
//!     setup_credentials(&ClientConfig::default(), false).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod credentials;

pub use credentials::{
    check_credentials, ensure_authenticated, get_auth_status, prompt_credentials,
    save_credentials, setup_credentials, show_auth_status, verify_credentials, AuthStatus,
    Credentials,
};
