//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the HTTP client
//! used against the Data Stores retrieve API.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::{http, limits, polling};
use crate::errors::{AuthError, AuthResult};

/// Configuration for the API client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Request timeout (not applied to result downloads)
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Connection pool idle timeout
    pub pool_idle_timeout: Option<Duration>,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
    /// First sleep between status polls while waiting for a job
    pub poll_initial_interval: Duration,
    /// Upper bound of the sleep between status polls
    pub poll_max_interval: Duration,
    /// Show a progress bar for downloads when attached to a terminal
    pub show_progress: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
            poll_initial_interval: polling::INITIAL_INTERVAL,
            poll_max_interval: polling::MAX_INTERVAL,
            show_progress: true,
        }
    }
}

impl ClientConfig {
    /// Builds the HTTP client with the specified configuration.
    ///
    /// No overall timeout is set on the client itself; API calls apply
    /// `request_timeout` per request so large result downloads are not cut off.
    pub fn build_http_client(&self) -> AuthResult<Client> {
        let mut client_builder = Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(http::USER_AGENT);

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        client_builder.build().map_err(AuthError::Http)
    }

    /// Next poll interval after `current`
    pub fn next_poll_interval(&self, current: Duration) -> Duration {
        current
            .mul_f64(polling::BACKOFF_FACTOR)
            .min(self.poll_max_interval)
    }
}
