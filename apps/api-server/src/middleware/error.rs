//! Error handling - RFC 7807 compliant responses.

use std::fmt;
use std::time::Duration;

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use quill_shared::ErrorResponse;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Conflict(String),
    Internal(String),
    Validation(Vec<String>),
    RateLimited { retry_after: Duration },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::Validation(errors) => write!(f, "Validation errors: {:?}", errors),
            AppError::RateLimited { retry_after } => {
                write!(f, "Rate limited; retry after {:?}", retry_after)
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail.clone()),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail.clone()),
            AppError::Unauthorized(detail) => ErrorResponse::unauthorized(detail.clone()),
            AppError::Conflict(detail) => {
                ErrorResponse::new(409, "Conflict").with_detail(detail.clone())
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
            AppError::Validation(errors) => ErrorResponse::unprocessable(errors.join(", ")),
            AppError::RateLimited { retry_after } => {
                let error =
                    ErrorResponse::too_many_requests("Too many submissions. Try again later.");
                return HttpResponse::TooManyRequests()
                    .insert_header((
                        header::RETRY_AFTER,
                        retry_after.as_secs().max(1).to_string(),
                    ))
                    .json(error);
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

// Conversion from domain errors
impl From<quill_core::error::DomainError> for AppError {
    fn from(err: quill_core::error::DomainError) -> Self {
        match err {
            quill_core::error::DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} with id {} not found", entity_type, id))
            }
            quill_core::error::DomainError::Validation(msg) => AppError::BadRequest(msg),
            quill_core::error::DomainError::Duplicate(msg) => AppError::Conflict(msg),
            quill_core::error::DomainError::LoginRequired => {
                AppError::Unauthorized("You need to login to read this post.".to_string())
            }
            quill_core::error::DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<quill_core::error::RepoError> for AppError {
    fn from(err: quill_core::error::RepoError) -> Self {
        match err {
            quill_core::error::RepoError::NotFound => {
                AppError::NotFound("Resource not found".to_string())
            }
            quill_core::error::RepoError::Constraint(msg) => AppError::Conflict(msg),
            quill_core::error::RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            quill_core::error::RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
