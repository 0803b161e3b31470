//! Authentication middleware.
//!
//! The producer pushing quotes presents `AUTH_SECRET` as a Bearer token.
//! With no secret configured the endpoint is open.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};

use crate::AppState;
use constant_time_eq::constant_time_eq;

/// Caller that passed the bearer check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Producer {
    /// No secret configured
    Anonymous,
    /// Presented the configured secret
    Authenticated,
}

impl FromRequestParts<AppState> for Producer {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(secret) = state.config.auth_secret.as_deref() else {
            return Ok(Producer::Anonymous);
        };

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        match auth_header.map(|header| header.strip_prefix("Bearer ")) {
            Some(Some(token)) => {
                if token.is_empty() {
                    return Err((StatusCode::UNAUTHORIZED, "Empty bearer token"));
                }
                if !constant_time_eq(token.as_bytes(), secret.as_bytes()) {
                    return Err((StatusCode::UNAUTHORIZED, "Invalid bearer token"));
                }

                Ok(Producer::Authenticated)
            }
            Some(None) => Err((
                StatusCode::UNAUTHORIZED,
                "Invalid authorization header format",
            )),
            None => Err((StatusCode::UNAUTHORIZED, "Missing authorization header")),
        }
    }
}
