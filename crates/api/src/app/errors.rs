//! Consistent JSON error responses.
//!
//! Every failure leaves the API as `{"error": code, "message": text}`, with a
//! `fields` map added for single-field validation errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use v4vision_auth::{AuthzError, PasswordError, ScopeError, TokenError};
use v4vision_core::DomainError;
use v4vision_infra::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub field: Option<String>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::validation(message)
        }
    }

    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_id", message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", "not found")
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "conflict", message)
    }

    pub fn invalid_token() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_token", "invalid token")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.field {
            Some(field) => json!({
                "error": self.code,
                "fields": { field: [self.message.clone()] },
                "message": self.message,
            }),
            None => json!({
                "error": self.code,
                "message": self.message,
            }),
        };
        (self.status, axum::Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Field { field, message } => ApiError::field(field, message),
            DomainError::Validation(msg) | DomainError::InvariantViolation(msg) => ApiError::validation(msg),
            DomainError::InvalidId(msg) => ApiError::invalid_id(msg),
            DomainError::NotFound => ApiError::not_found(),
            DomainError::Conflict(msg) => ApiError::conflict(msg),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        tracing::debug!(error = %err, "authorization denied");
        match err {
            AuthzError::Unauthenticated => ApiError::unauthenticated(err.to_string()),
            AuthzError::Forbidden(_) | AuthzError::TenantMismatch => ApiError::forbidden(err.to_string()),
        }
    }
}

impl From<ScopeError> for ApiError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::NoCompany => ApiError::field("company", err.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::conflict(msg),
            StoreError::NotFound => ApiError::not_found(),
            StoreError::Backend(msg) => {
                tracing::error!(error = %msg, "storage failure");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "storage failure")
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        tracing::error!(error = %err, "password hashing failed");
        ApiError::internal("password hashing failed")
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encode(msg) => {
                tracing::error!(error = %msg, "token encoding failed");
                ApiError::internal("token encoding failed")
            }
            TokenError::Invalid(_) | TokenError::Claims(_) => ApiError::unauthenticated(err.to_string()),
        }
    }
}
