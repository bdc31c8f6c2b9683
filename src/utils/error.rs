use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::config::Environment;
use crate::ledger::LedgerError;
use crate::services::{
    BookingError, BookingRejection, FieldError, LifecycleError, SettingsError,
};
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Validation error: {0}")]
    InvalidField(FieldError),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Capacity conflict: {0}")]
    CapacityConflict(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many attempts: {0}")]
    TooManyAttempts(String),

    #[error("Database error")]
    DatabaseError(#[from] LedgerError),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidField(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::CapacityConflict(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooManyAttempts(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::InvalidField(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::CapacityConflict(_) => "CAPACITY_CONFLICT",
            AppError::Conflict(_) => "CONFLICT",
            AppError::TooManyAttempts(_) => "TOO_MANY_ATTEMPTS",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
            AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            _ => {
                warn!(code = self.code(), message = %self, "Request rejected");
            }
        }
    }

    /// Message safe to show the caller.
    fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::NotFound(msg)
            | AppError::CapacityConflict(msg)
            | AppError::Conflict(msg)
            | AppError::TooManyAttempts(msg) => msg.clone(),
            AppError::InvalidField(field) => field.message.clone(),
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::InternalServerError(_) => "An internal server error occurred".to_string(),
        }
    }

    /// Internal cause of a server-side fault. Never shown outside development.
    fn cause(&self) -> Option<String> {
        match self {
            AppError::DatabaseError(e) => Some(e.to_string()),
            AppError::InternalServerError(msg) => Some(msg.clone()),
            _ => None,
        }
    }

    fn details(&self, environment: Environment) -> Option<serde_json::Value> {
        match self {
            AppError::InvalidField(field) => Some(json!({ "field": field.field })),
            _ if environment.is_development() => {
                self.cause().map(|cause| json!({ "cause": cause }))
            }
            _ => None,
        }
    }

    pub fn into_response_for(self, environment: Environment) -> Response {
        self.log();
        let mut response = error_response(
            self.code(),
            self.public_message(),
            self.details(environment),
            self.status_code(),
        );
        if let Some(cause) = self.cause() {
            response.extensions_mut().insert(ErrorCause {
                code: self.code(),
                message: self.public_message(),
                cause,
            });
        }
        response
    }
}

/// Rendered without detail; [`expose_error_causes`] re-renders it for a
/// development deployment.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_for(Environment::Unspecified)
    }
}

/// Attached to the response of a server-side fault so the cause can be
/// surfaced once the deployment posture is known.
#[derive(Debug, Clone)]
pub struct ErrorCause {
    code: &'static str,
    message: String,
    cause: String,
}

/// Middleware adding the fault cause to error bodies when the configured
/// environment is development.
pub async fn expose_error_causes(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !environment.is_development() {
        return response;
    }

    match response.extensions().get::<ErrorCause>() {
        Some(fault) => error_response(
            fault.code,
            fault.message.clone(),
            Some(json!({ "cause": fault.cause })),
            response.status(),
        ),
        None => response,
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "JSON body rejected");
        let message = match rejection {
            JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
            JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
            _ => "Request body has invalid fields",
        };
        AppError::ValidationError(message.to_string())
    }
}

impl From<FieldError> for AppError {
    fn from(err: FieldError) -> Self {
        AppError::InvalidField(err)
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Rejected(rejection) => match rejection {
                BookingRejection::EventNotFound => AppError::NotFound(rejection.to_string()),
                BookingRejection::InsufficientTickets { .. } => {
                    AppError::CapacityConflict(rejection.to_string())
                }
                BookingRejection::MissingAttendeeName
                | BookingRejection::NoTicketsSelected
                | BookingRejection::InvalidQuantity => {
                    AppError::ValidationError(rejection.to_string())
                }
            },
            BookingError::Store(e) => AppError::DatabaseError(e),
        }
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotFound => AppError::NotFound(err.to_string()),
            LifecycleError::Invalid(field) => AppError::InvalidField(field),
            LifecycleError::AlreadyPublished => AppError::Conflict(err.to_string()),
            LifecycleError::Store(e) => AppError::DatabaseError(e),
        }
    }
}

impl From<SettingsError> for AppError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Invalid(field) => AppError::InvalidField(field),
            SettingsError::Store(e) => AppError::DatabaseError(e),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::Unauthenticated => {
                AppError::AuthError(err.to_string())
            }
            AuthError::LockedOut { .. } => AppError::TooManyAttempts(err.to_string()),
            AuthError::Unavailable(msg) => AppError::InternalServerError(msg),
        }
    }
}
