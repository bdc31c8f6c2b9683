//! Attendee-facing endpoints. Only published events are visible here; a draft
//! id is indistinguishable from one that does not exist.

use axum::extract::{Path, State};
use axum::response::Response;
use serde::Serialize;

use super::parse_event_id;
use crate::models::{Event, SiteSettings};
use crate::services::BookingForm;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::json::JsonBody;
use crate::utils::response::{created, success};

#[derive(Serialize)]
struct AttendeeHome {
    settings: SiteSettings,
    events: Vec<Event>,
}

pub async fn home(State(state): State<AppState>) -> Result<Response, AppError> {
    let home = AttendeeHome {
        settings: state.settings.current().await?,
        events: state.lifecycle.list_published().await?,
    };

    Ok(success(home, "Published events"))
}

pub async fn event_detail(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let event_id = parse_event_id(&raw_id)?;
    let detail = state.bookings.availability(event_id).await?;

    Ok(success(detail, "Event details"))
}

pub async fn book(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    JsonBody(form): JsonBody<BookingForm>,
) -> Result<Response, AppError> {
    let event_id = parse_event_id(&raw_id)?;
    let confirmation = state.bookings.book(event_id, &form).await?;

    Ok(created(confirmation, "Booking confirmed"))
}
