use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::auth::jwt::JwtKeys;
use crate::auth::repo_types::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Name of the session cookie carrying the signed token.
pub const SESSION_COOKIE: &str = "token";

/// Build the Set-Cookie value for a freshly issued session token.
pub fn session_cookie(token: &str, max_age_secs: u64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    )
}

/// Expire the session cookie immediately (logout).
pub fn clear_session_cookie() -> String {
    format!(
        "{}=; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=0",
        SESSION_COOKIE
    )
}

/// Load the caller behind a verified token. A valid token for a vanished
/// user still reads as unauthenticated.
pub async fn load_current_user(state: &AppState, user_id: Uuid) -> Result<User, ApiError> {
    User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::unauthenticated("Unauthenticated, please login again"))
}

pub fn token_from_cookie_header(cookie_header: &str) -> Option<&str> {
    for cookie in cookie_header.split(';') {
        if let Some((name, value)) = cookie.trim().split_once('=') {
            if name.trim() == SESSION_COOKIE {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Extracts and verifies the session token, yielding the caller's user id.
/// The cookie is the primary transport; Authorization: Bearer is a fallback.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let from_cookie = parts
            .headers
            .get(header::COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(token_from_cookie_header);

        let from_bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")));

        let token = from_cookie.or(from_bearer).ok_or_else(|| {
            ApiError::unauthenticated("Unauthenticated, please login again")
        })?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token)?;
        Ok(AuthUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_has_required_attributes() {
        let cookie = session_cookie("abc.def.ghi", 7 * 24 * 60 * 60);
        assert!(cookie.starts_with("token=abc.def.ghi;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Max-Age=604800"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie();
        assert!(cookie.starts_with("token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn token_parsed_from_cookie_header() {
        assert_eq!(
            token_from_cookie_header("a=1; token=xyz; b=2"),
            Some("xyz")
        );
        assert_eq!(token_from_cookie_header("token=xyz"), Some("xyz"));
        assert_eq!(token_from_cookie_header("a=1; b=2"), None);
        assert_eq!(token_from_cookie_header(""), None);
    }
}
