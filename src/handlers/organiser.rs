//! Organiser endpoints. Every handler takes an [`Organiser`], so none of them
//! run without a live session.

use axum::extract::{Path, State};
use axum::response::Response;
use serde::Serialize;

use super::parse_event_id;
use crate::auth::Organiser;
use crate::models::{EventSales, SiteSettings};
use crate::services::{EventForm, SettingsForm};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::json::JsonBody;
use crate::utils::response::{created, empty_success, success};

#[derive(Serialize)]
struct Dashboard {
    settings: SiteSettings,
    published_events: Vec<EventSales>,
    draft_events: Vec<EventSales>,
}

pub async fn dashboard(
    _organiser: Organiser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let board = state.lifecycle.board().await?;
    let dashboard = Dashboard {
        settings: state.settings.current().await?,
        published_events: board.published_events,
        draft_events: board.draft_events,
    };

    Ok(success(dashboard, "Organiser dashboard"))
}

pub async fn get_settings(
    _organiser: Organiser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    Ok(success(state.settings.current().await?, "Site settings"))
}

pub async fn update_settings(
    _organiser: Organiser,
    State(state): State<AppState>,
    JsonBody(form): JsonBody<SettingsForm>,
) -> Result<Response, AppError> {
    let settings = state.settings.update(&form).await?;
    Ok(success(settings, "Site settings updated"))
}

pub async fn create_event(
    _organiser: Organiser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let event = state.lifecycle.create_draft().await?;
    Ok(created(event, "Draft event created"))
}

pub async fn get_event(
    _organiser: Organiser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let event = state.lifecycle.get(parse_event_id(&raw_id)?).await?;
    Ok(success(event, "Event details"))
}

pub async fn edit_event(
    _organiser: Organiser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    JsonBody(form): JsonBody<EventForm>,
) -> Result<Response, AppError> {
    let event = state.lifecycle.edit(parse_event_id(&raw_id)?, &form).await?;
    Ok(success(event, "Event updated"))
}

pub async fn publish_event(
    _organiser: Organiser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let event = state.lifecycle.publish(parse_event_id(&raw_id)?).await?;
    Ok(success(event, "Event published"))
}

pub async fn delete_event(
    _organiser: Organiser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    state.lifecycle.delete(parse_event_id(&raw_id)?).await?;
    Ok(empty_success("Event deleted"))
}

pub async fn event_bookings(
    _organiser: Organiser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let bookings = state
        .bookings
        .bookings_for_event(parse_event_id(&raw_id)?)
        .await?;
    Ok(success(bookings, "Event bookings"))
}

pub async fn bookings(
    _organiser: Organiser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    Ok(success(state.bookings.report().await?, "All bookings"))
}
