use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderValue};
use axum::response::Response;
use serde::Deserialize;

use crate::auth::session::{cleared_session_cookie, session_cookie};
use crate::auth::{client_key, Organiser};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::json::JsonBody;
use crate::utils::response::empty_success;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    JsonBody(form): JsonBody<LoginForm>,
) -> Result<Response, AppError> {
    let client = client_key(connect_info.as_ref());
    let token = state.gate.login(&client, &form.password).await?;

    let cookie = session_cookie(
        token,
        state.gate.sessions().ttl(),
        state.environment.is_production(),
    );
    with_cookie(empty_success("Logged in"), &cookie)
}

pub async fn logout(
    organiser: Organiser,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    state.gate.logout(organiser.session)?;
    with_cookie(empty_success("Logged out"), &cleared_session_cookie())
}

fn with_cookie(mut response: Response, cookie: &str) -> Result<Response, AppError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::InternalServerError(format!("invalid session cookie: {e}")))?;
    response.headers_mut().insert(header::SET_COOKIE, value);
    Ok(response)
}
