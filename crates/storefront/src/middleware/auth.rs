//! Visitor identity extractors.
//!
//! The storefront does not authenticate visitors itself. An external
//! authentication service reports sign-in and sign-out through the session
//! hook routes, which record the visitor's [`ListOwner`] in the session.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use tower_sessions::Session;

use cartsync_core::ListOwner;

use crate::error::ApiError;
use crate::models::session_keys;
use crate::state::AppState;

/// Header carrying the authentication hook token.
pub const AUTH_HOOK_HEADER: &str = "x-auth-hook-token";

/// Extractor for the owner of the visitor's lists.
///
/// Visitors without a recorded owner are anonymous.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(SessionOwner(owner): SessionOwner) -> impl IntoResponse {
///     match owner {
///         ListOwner::Identified(id) => format!("Hello, {id}!"),
///         ListOwner::Anonymous => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct SessionOwner(pub ListOwner);

/// Rejection for the identity extractors.
pub enum AuthRejection {
    /// No session layer is installed.
    MissingSession,
    /// The hook token is missing or wrong.
    InvalidHookToken,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::MissingSession => (StatusCode::INTERNAL_SERVER_ERROR, "Session unavailable"),
            Self::InvalidHookToken => (StatusCode::UNAUTHORIZED, "Invalid auth hook token"),
        };
        (
            status,
            Json(ApiError {
                error: error.to_string(),
            }),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for SessionOwner
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::MissingSession)?;

        let owner = match session.get::<ListOwner>(session_keys::CURRENT_OWNER).await {
            Ok(owner) => owner.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable session owner, treating visitor as anonymous");
                ListOwner::Anonymous
            }
        };

        Ok(Self(owner))
    }
}

/// Extractor that admits only the authentication service.
///
/// The request must carry the configured `AUTH_HOOK_SECRET` in the
/// `x-auth-hook-token` header.
pub struct AuthHook;

impl FromRequestParts<AppState> for AuthHook {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(AUTH_HOOK_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthRejection::InvalidHookToken)?;

        if constant_time_compare(presented, state.config().auth_hook_secret.expose_secret()) {
            Ok(Self)
        } else {
            tracing::warn!("Rejected auth hook request with wrong token");
            Err(AuthRejection::InvalidHookToken)
        }
    }
}

/// Record the visitor's owner in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_owner(
    session: &Session,
    owner: ListOwner,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_OWNER, owner).await
}

/// Forget the visitor's owner (sign-out).
///
/// Only the owner is removed; the anonymous list snapshots stay in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_owner(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<ListOwner>(session_keys::CURRENT_OWNER)
        .await?;
    Ok(())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "helloo"));
    }
}
