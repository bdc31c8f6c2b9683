use std::fmt;
use std::sync::Arc;

/// The single shared organiser password.
#[derive(Clone)]
pub struct OrganiserCredential {
    secret: Arc<str>,
}

impl OrganiserCredential {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Constant-time comparison; an empty candidate never matches.
    pub fn verify(&self, candidate: &str) -> bool {
        if candidate.is_empty() || self.secret.is_empty() {
            return false;
        }
        constant_time_eq::constant_time_eq(candidate.as_bytes(), self.secret.as_bytes())
    }
}

impl fmt::Debug for OrganiserCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrganiserCredential")
            .field("secret", &"<redacted>")
            .finish()
    }
}
