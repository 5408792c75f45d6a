//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cleanit_auth::AuthError;
use cleanit_database::DatabaseError;
use cleanit_operations::OperationError;
use cleanit_users::UserError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::AuthorizationFailed(_) => StatusCode::FORBIDDEN,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::InternalError(_) | GatewayError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: status.as_str().to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<DatabaseError> for GatewayError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound(what) => GatewayError::NotFound(what),
            DatabaseError::Duplicate(what) | DatabaseError::Conflict(what) => GatewayError::Conflict(what),
            other => GatewayError::DatabaseError(other.to_string()),
        }
    }
}

impl From<AuthError> for GatewayError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::LoginIdTaken => GatewayError::Conflict(error.to_string()),
            AuthError::InvalidCredentials
            | AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::InvalidSession => GatewayError::AuthenticationFailed(error.to_string()),
            AuthError::AccountInactive => GatewayError::AuthorizationFailed(error.to_string()),
            AuthError::PasswordHash(_) => GatewayError::InternalError(error.to_string()),
            AuthError::Database(error) => GatewayError::from(error),
        }
    }
}

impl From<UserError> for GatewayError {
    fn from(error: UserError) -> Self {
        match error {
            UserError::NotFound(what) => GatewayError::NotFound(format!("user {what}")),
            UserError::ValidationFailed(message) => GatewayError::InvalidRequest(message),
            UserError::PermissionDenied(reason) => GatewayError::AuthorizationFailed(reason),
            UserError::Auth(error) => GatewayError::from(error),
            UserError::Database(error) => GatewayError::from(error),
        }
    }
}

impl From<OperationError> for GatewayError {
    fn from(error: OperationError) -> Self {
        match error {
            OperationError::NotFound { .. } => GatewayError::NotFound(error.to_string()),
            OperationError::Validation { message } => GatewayError::InvalidRequest(message),
            OperationError::PermissionDenied { reason } => GatewayError::AuthorizationFailed(reason),
            OperationError::InvalidTransition(transition) => GatewayError::Conflict(transition.to_string()),
            OperationError::Conflict { message } => GatewayError::Conflict(message),
            OperationError::Database(error) => GatewayError::from(error),
        }
    }
}
