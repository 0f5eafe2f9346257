//! Core HTTP operations with rate limiting and retry logic
//!
//! This module provides the fundamental request operations against the
//! retrieve API with rate limiting, token authentication and exponential
//! backoff on throttling, overload and transport errors.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::constants::{auth, limits};
use crate::errors::{ApiError, ApiResult, AuthError, AuthResult};

/// HTTP operations handler with resilience patterns
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
    base_url: Url,
    key: String,
    request_timeout: Duration,
}

impl HttpHandler {
    /// Creates a new HttpHandler for the API rooted at `base_url`
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the URL is invalid or the rate limit is zero
    pub fn new(
        client: Client,
        base_url: &str,
        key: String,
        rate_limit_rps: u32,
        request_timeout: Duration,
    ) -> AuthResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            client,
            rate_limiter,
            base_url,
            key,
            request_timeout,
        })
    }

    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> AuthResult<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>> {
        let rps = NonZeroU32::new(rate_limit_rps).ok_or_else(|| AuthError::InvalidUrl {
            url: "rate_limit_rps".to_string(),
            error: "rate limit must be non-zero".to_string(),
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    /// Parse the base URL, making sure relative joins stay below it
    fn normalize_base_url(base_url: &str) -> AuthResult<Url> {
        let with_slash = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        Url::parse(&with_slash).map_err(|e| AuthError::InvalidUrl {
            url: base_url.to_string(),
            error: e.to_string(),
        })
    }

    /// The API root, always ending with `/`
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Timeout applied to API calls
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Resolve an API path (or an absolute URL) against the base URL
    pub fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url.join(path).map_err(|e| ApiError::InvalidUrl {
            url: path.to_string(),
            error: e.to_string(),
        })
    }

    /// Sends a request with rate limiting and retry logic.
    ///
    /// The access token is only attached for URLs on the API host. `timeout`
    /// of `None` means no per-request timeout (used for result downloads).
    pub async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
        timeout: Option<Duration>,
    ) -> ApiResult<Response> {
        // Apply rate limiting with jitter
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;

        let mut retries = 0;
        loop {
            let mut request = self.client.request(method.clone(), url.clone());
            if url.host_str() == self.base_url.host_str() {
                request = request.header(auth::TOKEN_HEADER, &self.key);
            }
            if let Some(timeout) = timeout {
                request = request.timeout(timeout);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let throttled = status == StatusCode::TOO_MANY_REQUESTS;
                    let overloaded = status == StatusCode::SERVICE_UNAVAILABLE;

                    if throttled || overloaded {
                        if retries < limits::MAX_RETRIES {
                            retries += 1;
                            let delay = backoff_delay(retries);
                            tracing::warn!(
                                "Server responded {} for {}. Backing off for {}ms",
                                status,
                                url,
                                delay.as_millis()
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        return Err(if throttled {
                            ApiError::RateLimitExceeded
                        } else {
                            ApiError::ServerOverloaded
                        });
                    }

                    tracing::debug!("{} {} -> {}", method, url, status);
                    return Ok(response);
                }
                Err(e) if retries < limits::MAX_RETRIES => {
                    retries += 1;
                    let delay = backoff_delay(retries);
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {}ms",
                        retries,
                        limits::MAX_RETRIES,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        "Request failed after {} retries: {}",
                        limits::MAX_RETRIES,
                        e
                    );
                    return Err(ApiError::MaxRetriesExceeded {
                        max_retries: limits::MAX_RETRIES,
                    });
                }
            }
        }
    }

    /// Sends an API call and requires a success status
    pub async fn call(&self, method: Method, url: &Url, body: Option<&Value>) -> ApiResult<Response> {
        let response = self
            .send(method, url, body, Some(self.request_timeout))
            .await?;
        ensure_success(response).await
    }

    /// GET a JSON document
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> ApiResult<T> {
        let response = self.call(Method::GET, url, None).await?;
        parse_json(url, response).await
    }

    /// POST a JSON body and decode the JSON reply
    pub async fn post_json<T: DeserializeOwned>(&self, url: &Url, body: &Value) -> ApiResult<T> {
        let response = self.call(Method::POST, url, Some(body)).await?;
        parse_json(url, response).await
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Exponential backoff delay for the given retry attempt
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(limits::RETRY_BASE_DELAY_MS * 2_u64.pow(attempt))
}

/// Turn a non-success response into `ApiError::Status` carrying the body
pub async fn ensure_success(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        url,
        status: status.as_u16(),
        body: error_summary(&body),
    })
}

/// Short description of an API error body (`title: detail` when JSON)
pub fn error_summary(body: &str) -> String {
    let summary = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        let title = json.get("title").and_then(Value::as_str);
        let detail = json.get("detail").and_then(Value::as_str);
        match (title, detail) {
            (Some(t), Some(d)) => Some(format!("{}: {}", t, d)),
            (Some(t), None) => Some(t.to_string()),
            (None, Some(d)) => Some(d.to_string()),
            (None, None) => None,
        }
    });
    summary.unwrap_or_else(|| body.chars().take(200).collect())
}

async fn parse_json<T: DeserializeOwned>(url: &Url, response: Response) -> ApiResult<T> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ApiError::InvalidResponse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
