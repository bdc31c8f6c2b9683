use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{attendee, auth, health_check, organiser};
use crate::state::AppState;
use crate::utils::error::{expose_error_causes, AppError};

pub fn create_routes(state: AppState, cors_origins: &str) -> Router {
    let environment = state.environment;

    let attendee_routes = Router::new()
        .route("/", get(attendee::home))
        .route("/events/:id", get(attendee::event_detail))
        .route("/events/:id/bookings", post(attendee::book));

    let organiser_routes = Router::new()
        .route("/", get(organiser::dashboard))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route(
            "/settings",
            get(organiser::get_settings).put(organiser::update_settings),
        )
        .route("/events", post(organiser::create_event))
        .route(
            "/events/:id",
            get(organiser::get_event)
                .put(organiser::edit_event)
                .delete(organiser::delete_event),
        )
        .route("/events/:id/publish", post(organiser::publish_event))
        .route("/events/:id/bookings", get(organiser::event_bookings))
        .route("/bookings", get(organiser::bookings));

    Router::new()
        .route("/health", get(health_check))
        .nest("/attendee", attendee_routes)
        .nest("/organiser", organiser_routes)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            environment,
            expose_error_causes,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(environment))
        .layer(create_cors_layer(cors_origins))
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("The page you are looking for does not exist.".to_string())
}
