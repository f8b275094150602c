//! Caller verification ahead of any run.
//!
//! A single bearer token configured on the service; no token configured
//! means the gate admits everyone (local development).

use axum::http::HeaderMap;

#[derive(Debug, Clone)]
pub struct AuthGate {
    token: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("unauthorized: {0}")]
pub struct AuthError(pub &'static str);

impl AuthGate {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// Verify the caller's Authorization header against the configured token
    pub fn verify(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let Some(expected) = &self.token else {
            return Ok(());
        };

        let presented = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AuthError("missing bearer token"))?;

        if presented == expected {
            Ok(())
        } else {
            Err(AuthError("invalid token"))
        }
    }
}
