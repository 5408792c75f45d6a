//! Error types for cleaning operations.

use cleanit_auth::AuthError;
use cleanit_database::DatabaseError;
use cleanit_users::UserError;
use thiserror::Error;

use crate::lifecycle::TransitionError;

pub type OperationResult<T> = Result<T, OperationError>;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// The row changed between the read and the conditional write.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl OperationError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
        }
    }
}

impl From<DatabaseError> for OperationError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::Conflict(message) => OperationError::Conflict { message },
            DatabaseError::Duplicate(message) => OperationError::Conflict { message },
            DatabaseError::NotFound(id) => OperationError::NotFound { entity: "record", id },
            other => OperationError::Database(other),
        }
    }
}

impl From<UserError> for OperationError {
    fn from(error: UserError) -> Self {
        match error {
            UserError::PermissionDenied(reason) => OperationError::PermissionDenied { reason },
            UserError::ValidationFailed(message) => OperationError::Validation { message },
            UserError::NotFound(id) => OperationError::NotFound { entity: "user", id },
            UserError::Database(error) => OperationError::from(error),
            UserError::Auth(AuthError::LoginIdTaken) => OperationError::Conflict {
                message: AuthError::LoginIdTaken.to_string(),
            },
            UserError::Auth(AuthError::Database(error)) => OperationError::from(error),
            UserError::Auth(error) => OperationError::PermissionDenied {
                reason: error.to_string(),
            },
        }
    }
}
