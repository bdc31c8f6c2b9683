use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use uuid::Uuid;

use super::AuthError;

pub const SESSION_COOKIE: &str = "sessionId";
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Opaque organiser sessions held in process memory.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<Uuid, Instant>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn create(&self) -> Result<Uuid, AuthError> {
        let token = Uuid::new_v4();
        let now = Instant::now();
        let mut sessions = self.lock()?;
        sessions.retain(|_, expires_at| *expires_at > now);
        sessions.insert(token, now + self.ttl);
        Ok(token)
    }

    pub fn is_active(&self, token: Uuid) -> Result<bool, AuthError> {
        let mut sessions = self.lock()?;
        match sessions.get(&token) {
            Some(expires_at) if *expires_at > Instant::now() => Ok(true),
            Some(_) => {
                sessions.remove(&token);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    pub fn revoke(&self, token: Uuid) -> Result<(), AuthError> {
        self.lock()?.remove(&token);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Instant>>, AuthError> {
        self.sessions
            .lock()
            .map_err(|_| AuthError::Unavailable("session lock poisoned".into()))
    }
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: Uuid, ttl: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        ttl.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn cleared_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
}

/// Finds the session token among the request's cookies.
pub fn session_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}
