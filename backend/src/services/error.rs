//! Service-layer error type shared by every manager.

use actix_web::http::StatusCode;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::db::DatabaseError;

/// Errors returned by CRM operations.
///
/// Each variant maps to a stable error code and HTTP status, see
/// [`CrmError::code`] and [`CrmError::status`].
#[derive(Debug, Error)]
pub enum CrmError {
    /// The addressed resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Input failed validation. All problems are reported together.
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),

    /// The request would duplicate a product name.
    #[error("{0}")]
    Conflict(String),

    /// The request breaks a lifecycle rule (e.g. deleting a client with opportunities).
    #[error("{0}")]
    BusinessRule(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CrmError {
    /// Shorthand for a single validation message.
    pub fn invalid(message: impl Into<String>) -> Self {
        CrmError::Validation(vec![message.into()])
    }

    pub fn code(&self) -> &'static str {
        match self {
            CrmError::NotFound(_) => "NOT_FOUND",
            CrmError::Validation(_) => "VALIDATION_ERROR",
            CrmError::Conflict(_) => "CONFLICT",
            CrmError::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            CrmError::Unauthorized(_) => "UNAUTHORIZED",
            CrmError::Forbidden(_) => "FORBIDDEN",
            CrmError::Database(_) | CrmError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CrmError::NotFound(_) => StatusCode::NOT_FOUND,
            CrmError::Validation(_) | CrmError::BusinessRule(_) => StatusCode::BAD_REQUEST,
            CrmError::Conflict(_) => StatusCode::CONFLICT,
            CrmError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CrmError::Forbidden(_) => StatusCode::FORBIDDEN,
            CrmError::Database(_) | CrmError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Server-side failures are logged in full and reported generically.
    pub fn public_message(&self) -> String {
        match self {
            CrmError::Database(e) => {
                error!("Database failure: {}", e);
                "an internal error occurred while accessing the database".to_string()
            }
            CrmError::Internal(e) => {
                error!("Internal failure: {}", e);
                "an internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<AuthError> for CrmError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::InvalidCredentials => {
                CrmError::Unauthorized(e.to_string())
            }
            AuthError::Forbidden(msg) => CrmError::Forbidden(msg),
            AuthError::Token(_) | AuthError::Hashing(_) => CrmError::Internal(e.to_string()),
        }
    }
}

/// Map a unique violation on write to a conflict, anything else to a database error.
pub fn conflict_on_unique(e: DatabaseError, message: &str) -> CrmError {
    if e.is_unique_violation() {
        CrmError::Conflict(message.to_string())
    } else {
        CrmError::Database(e)
    }
}

/// Map a unique violation on write to a business rule, anything else to a database error.
pub fn rejected_on_unique(e: DatabaseError, message: &str) -> CrmError {
    if e.is_unique_violation() {
        CrmError::BusinessRule(message.to_string())
    } else {
        CrmError::Database(e)
    }
}

/// Map a foreign-key violation on delete to a business rule, anything else to a database error.
pub fn blocked_on_reference(e: DatabaseError, message: &str) -> CrmError {
    if e.is_foreign_key_violation() {
        CrmError::BusinessRule(message.to_string())
    } else {
        CrmError::Database(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let cases = [
            (CrmError::NotFound("x".into()), "NOT_FOUND", 404),
            (CrmError::invalid("x"), "VALIDATION_ERROR", 400),
            (CrmError::BusinessRule("x".into()), "BUSINESS_RULE_VIOLATION", 400),
            (CrmError::Conflict("x".into()), "CONFLICT", 409),
            (CrmError::Unauthorized("x".into()), "UNAUTHORIZED", 401),
            (CrmError::Forbidden("x".into()), "FORBIDDEN", 403),
            (CrmError::Internal("x".into()), "INTERNAL_ERROR", 500),
        ];
        for (err, code, status) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.status().as_u16(), status);
        }
    }

    #[test]
    fn test_validation_joins_messages() {
        let err = CrmError::Validation(vec!["name is required".into(), "nit is required".into()]);
        assert_eq!(err.to_string(), "name is required; nit is required");
    }

    #[test]
    fn test_internal_details_are_not_public() {
        let err = CrmError::Internal("pool exhausted at 10.0.0.3".into());
        assert!(!err.public_message().contains("10.0.0.3"));
    }

    #[test]
    fn test_non_unique_errors_stay_internal() {
        let err = rejected_on_unique(DatabaseError::InvalidData("bad role".into()), "taken");
        assert_eq!(err.status().as_u16(), 500);
    }

    #[test]
    fn test_auth_errors_convert() {
        assert_eq!(CrmError::from(AuthError::InvalidCredentials).status().as_u16(), 401);
        assert_eq!(CrmError::from(AuthError::Forbidden("no".into())).status().as_u16(), 403);
        assert_eq!(CrmError::from(AuthError::Hashing("x".into())).status().as_u16(), 500);
    }
}
