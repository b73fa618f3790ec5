//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a handler can produce is one of its variants, and `AppError`
//! implements `actix_web::error::ResponseError` so handlers can simply return
//! `Result<impl Responder, AppError>`.
//!
//! Client-facing bodies are deliberately generic for authentication, ownership
//! and server failures: the detail carried by those variants is only written to
//! the log, never to the response.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::store::StoreError;
use crate::validation::FieldErrors;

const UNAUTHORIZED_MESSAGE: &str = "you are not authorised to access this resource";
const FORBIDDEN_MESSAGE: &str = "you do not have permission to access this resource";
const NOT_FOUND_MESSAGE: &str = "the requested resource could not be found";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Missing, malformed, invalid or expired credential (HTTP 401).
    /// The message is internal context only.
    Unauthorized(String),
    /// Authenticated, but the resource belongs to someone else (HTTP 403).
    Forbidden(String),
    /// Malformed request that is not a field-level problem (HTTP 400).
    BadRequest(String),
    /// The resource genuinely does not exist (HTTP 404).
    NotFound(String),
    /// Uniqueness violation such as a duplicate email (HTTP 409).
    Conflict(String),
    /// Field-level validation failure (HTTP 422).
    ValidationError(FieldErrors),
    /// Rate limit exceeded (HTTP 429).
    TooManyRequests,
    /// Unexpected server-side failure (HTTP 500).
    InternalServerError(String),
    /// Storage failure (HTTP 500).
    DatabaseError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::ValidationError(fields) => write!(f, "Validation Error: {:?}", fields),
            AppError::TooManyRequests => write!(f, "Too Many Requests"),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            AppError::Unauthorized(msg) => {
                log::debug!("rejecting request as unauthorized: {}", msg);
                HttpResponse::build(status).json(json!({ "message": UNAUTHORIZED_MESSAGE }))
            }
            AppError::Forbidden(msg) => {
                log::debug!("rejecting request as forbidden: {}", msg);
                HttpResponse::build(status).json(json!({ "message": FORBIDDEN_MESSAGE }))
            }
            AppError::NotFound(msg) => {
                log::debug!("resource not found: {}", msg);
                HttpResponse::build(status).json(json!({ "message": NOT_FOUND_MESSAGE }))
            }
            AppError::BadRequest(msg) | AppError::Conflict(msg) => {
                HttpResponse::build(status).json(json!({ "message": msg }))
            }
            AppError::ValidationError(fields) => HttpResponse::build(status).json(json!({
                "message": "validation failed",
                "fields": fields
            })),
            AppError::TooManyRequests => {
                HttpResponse::build(status).json(json!({ "message": "Too Many Requests" }))
            }
            // Server-side detail goes to the log only.
            AppError::InternalServerError(msg) | AppError::DatabaseError(msg) => {
                log::error!("{}", msg);
                HttpResponse::build(status).json(json!({ "message": "Internal Server Error" }))
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::NotFound => AppError::NotFound("Record not found".into()),
            StoreError::DuplicateEmail => {
                AppError::Conflict("a user with this email address already exists".into())
            }
            other => AppError::DatabaseError(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        AppError::from(StoreError::from(error))
    }
}

impl From<FieldErrors> for AppError {
    fn from(fields: FieldErrors) -> AppError {
        AppError::ValidationError(fields)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.into())
    }
}

/// JWT processing failures are authentication failures.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(format!("Invalid token: {}", error))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
