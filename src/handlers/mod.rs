use axum::response::Response;
use serde::Serialize;
use uuid::Uuid;

use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod attendee;
pub mod auth;
pub mod organiser;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "boxoffice-api",
    };

    success(payload, "Health check successful")
}

/// Event ids arrive as raw path segments so a malformed one is reported as a
/// validation error rather than a routing failure.
pub(crate) fn parse_event_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::ValidationError("Invalid event ID".to_string()))
}
