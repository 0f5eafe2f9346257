//! Access token verification
//!
//! The Data Stores API authenticates every request with a personal access
//! token. This module checks a token against the account verification
//! endpoint before any job operation is attempted.

use reqwest::{Method, StatusCode};

use crate::app::client::http::HttpHandler;
use crate::constants::api;
use crate::errors::{ApiError, AuthError, AuthResult};

/// Handles token verification
pub struct AuthHandler;

impl AuthHandler {
    /// Verify the handler's token with the service
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Rejected` when the service refuses the token, or
    /// `AuthError::Http` when the service cannot be reached.
    pub async fn verify(http: &HttpHandler) -> AuthResult<()> {
        let url = http
            .endpoint(api::VERIFY_PATH)
            .map_err(|e| AuthError::InvalidUrl {
                url: api::VERIFY_PATH.to_string(),
                error: e.to_string(),
            })?;

        tracing::info!("Verifying access token at {}", url);

        let response = http
            .send(Method::POST, &url, None, Some(http.request_timeout()))
            .await
            .map_err(|e| match e {
                ApiError::Http(err) => AuthError::Http(err),
                other => AuthError::Rejected {
                    url: url.to_string(),
                    status: status_of(&other),
                },
            })?;

        Self::check_verification_status(url.as_str(), response.status())
    }

    /// Map the verification response status onto the auth outcome
    fn check_verification_status(url: &str, status: StatusCode) -> AuthResult<()> {
        if status.is_success() {
            tracing::info!("Access token accepted");
            Ok(())
        } else {
            tracing::warn!("Access token rejected with status {}", status);
            Err(AuthError::Rejected {
                url: url.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

fn status_of(error: &ApiError) -> u16 {
    match error {
        ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS.as_u16(),
        ApiError::ServerOverloaded => StatusCode::SERVICE_UNAVAILABLE.as_u16(),
        ApiError::Status { status, .. } => *status,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_status_is_accepted() {
        assert!(AuthHandler::check_verification_status("https://x/api", StatusCode::OK).is_ok());
        assert!(
            AuthHandler::check_verification_status("https://x/api", StatusCode::NO_CONTENT).is_ok()
        );
    }

    #[test]
    fn test_unauthorized_is_rejected() {
        let err = AuthHandler::check_verification_status("https://x/api", StatusCode::UNAUTHORIZED)
            .unwrap_err();
        assert!(matches!(err, AuthError::Rejected { status: 401, .. }));
    }

    #[test]
    fn test_status_of_retry_errors() {
        assert_eq!(status_of(&ApiError::RateLimitExceeded), 429);
        assert_eq!(status_of(&ApiError::ServerOverloaded), 503);
        assert_eq!(status_of(&ApiError::MaxRetriesExceeded { max_retries: 3 }), 0);
    }
}
