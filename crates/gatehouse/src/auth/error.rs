// Error taxonomy for the auth flows
// Decision: Credential failures share one message - the API never reveals
// whether the email exists or the password was wrong
// Decision: Store failures collapse to a generic 500; detail goes to the log

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Errors surfaced by the auth flows.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Request failed field validation
    #[error("{0}")]
    ValidationFailed(String),

    /// An account with this email already exists
    #[error("Email already registered")]
    DuplicateEmail,

    /// Unknown email, OAuth-only account, or wrong password - indistinguishable
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The operation requires an authenticated session
    #[error("Authentication required")]
    Unauthenticated,

    /// The referenced resource does not exist (deliberately detail-free)
    #[error("Not found")]
    NotFound,

    /// The provider round-trip failed (denial, bad code, network error)
    #[error("OAuth authentication failed")]
    ProviderAuthFailed,

    /// Infrastructure failure (store connectivity etc.)
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::ValidationFailed(_) | AuthError::DuplicateEmail => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::Unauthenticated
            | AuthError::ProviderAuthFailed => StatusCode::UNAUTHORIZED,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(ref e) = self {
            tracing::error!("internal error: {e:#}");
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Standard error response for API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message describing what went wrong.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::DuplicateEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::ProviderAuthFailed.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_credential_error_is_uniform() {
        // the login path must produce the same message for every failure mode
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let err = AuthError::Internal(anyhow::anyhow!("connection refused to 10.0.0.3:5432"));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
