//! Organiser access gate.
//!
//! One shared password, checked in constant time, with failed attempts
//! throttled per client address. A successful login issues an opaque session
//! token carried in a cookie; the [`Organiser`] extractor requires one.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::error::AppError;

pub mod password;
pub mod session;
pub mod throttle;

pub use password::OrganiserCredential;
pub use session::{session_token, SessionStore};
pub use throttle::{
    AttemptOutcome, InMemoryLoginThrottle, LoginThrottle, ThrottleDecision, ThrottlePolicy,
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials. Please try again.")]
    InvalidCredentials,

    #[error("Too many failed attempts. Please try again in {minutes} minutes.")]
    LockedOut { minutes: u64 },

    #[error("Organiser login required")]
    Unauthenticated,

    #[error("Authentication backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Clone)]
pub struct AccessGate {
    credential: OrganiserCredential,
    throttle: Arc<dyn LoginThrottle>,
    sessions: Arc<SessionStore>,
}

impl AccessGate {
    pub fn new(
        credential: OrganiserCredential,
        throttle: Arc<dyn LoginThrottle>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            credential,
            throttle,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Checks the password for `client` and opens a session on success.
    pub async fn login(&self, client: &str, password: &str) -> Result<Uuid, AuthError> {
        if let ThrottleDecision::Locked { retry_after } = self.throttle.check(client).await? {
            let minutes = retry_after.as_secs().div_ceil(60).max(1);
            warn!(client = %client, minutes, "Login attempt while locked out");
            return Err(AuthError::LockedOut { minutes });
        }

        if !self.credential.verify(password) {
            self.throttle.record(client, AttemptOutcome::Failure).await?;
            warn!(client = %client, "Organiser login failed");
            return Err(AuthError::InvalidCredentials);
        }

        self.throttle.record(client, AttemptOutcome::Success).await?;
        let token = self.sessions.create()?;
        info!(client = %client, "Organiser logged in");
        Ok(token)
    }

    pub fn logout(&self, token: Uuid) -> Result<(), AuthError> {
        self.sessions.revoke(token)?;
        info!("Organiser logged out");
        Ok(())
    }

    pub fn is_authorized(&self, token: Uuid) -> Result<bool, AuthError> {
        self.sessions.is_active(token)
    }
}

/// Proof that the request carries a live organiser session.
#[derive(Debug, Clone, Copy)]
pub struct Organiser {
    pub session: Uuid,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Organiser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = session_token(&parts.headers).ok_or(AuthError::Unauthenticated)?;
        if !state.gate.is_authorized(session)? {
            return Err(AuthError::Unauthenticated.into());
        }
        Ok(Organiser { session })
    }
}

/// The throttle key for a request: the peer address when known.
pub fn client_key(connect_info: Option<&ConnectInfo<SocketAddr>>) -> String {
    connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
