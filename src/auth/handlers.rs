use axum::{
    extract::{FromRef, Path, State},
    http::{header::SET_COOKIE, HeaderName, StatusCode},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MessageResponse,
            PublicUser, RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
            UserResponse,
        },
        extractors::{clear_session_cookie, load_current_user, session_cookie, AuthUser},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::User,
        reset, services,
    },
    error::{is_unique_violation, ApiError},
    media::ext_from_mime,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/password/forgot", post(forgot_password))
        .route("/password/reset/:reset_token", post(reset_password))
        .route("/password/change", post(change_password))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

const MIN_PASSWORD_LEN: usize = 8;

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation("Password must be at least 8 characters"));
    }
    Ok(())
}

type SessionHeaders = [(HeaderName, String); 1];

fn issue_session(state: &AppState, user_id: uuid::Uuid) -> Result<SessionHeaders, ApiError> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(user_id).map_err(ApiError::Internal)?;
    Ok([(SET_COOKIE, session_cookie(&token, keys.ttl.as_secs()))])
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, SessionHeaders, Json<UserResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.full_name.trim().is_empty() {
        return Err(ApiError::validation("Full name is required"));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }
    validate_password(&payload.password)?;

    let hash = hash_password(&payload.password).map_err(ApiError::Internal)?;

    // The unique index is the source of truth for duplicates; an earlier
    // existence check would race.
    let mut user = User::create(&state.db, &payload.email, payload.full_name.trim(), &hash)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                warn!(email = %payload.email, "email already registered");
                ApiError::Conflict(format!("User with {} already exists", payload.email))
            } else {
                e.into()
            }
        })?;

    // Avatar upload is secondary: the account exists either way, and a failed
    // upload is reported so the client can retry via PUT /profile.
    let mut message = "User registered successfully".to_string();
    if let Some(avatar) = payload.avatar.take() {
        let ct = payload
            .avatar_content_type
            .as_deref()
            .unwrap_or("image/jpeg");
        match upload_avatar(&state, &user, Bytes::from(avatar.into_vec()), ct).await {
            Ok(updated) => user = updated,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "avatar upload failed after registration");
                message =
                    "User registered successfully, but the avatar upload failed; retry via profile update"
                        .to_string();
            }
        }
    }

    let headers = issue_session(&state, user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        headers,
        Json(UserResponse {
            success: true,
            message,
            user: PublicUser::from(user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(SessionHeaders, Json<UserResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) || payload.password.is_empty() {
        return Err(ApiError::validation("All fields are required"));
    }

    // Unknown email and wrong password are indistinguishable to the caller.
    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::unauthenticated("Email or password does not match")
        })?;

    let ok = verify_password(&payload.password, &user.password_hash).map_err(ApiError::Internal)?;
    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthenticated("Email or password does not match"));
    }

    let headers = issue_session(&state, user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        headers,
        Json(UserResponse {
            success: true,
            message: "Logged in successfully".into(),
            user: PublicUser::from(user),
        }),
    ))
}

#[instrument(skip_all)]
pub async fn logout(AuthUser(user_id): AuthUser) -> (SessionHeaders, Json<MessageResponse>) {
    info!(user_id = %user_id, "user logged out");
    (
        [(SET_COOKIE, clear_session_cookie())],
        Json(MessageResponse::ok("Logged out successfully")),
    )
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = load_current_user(&state, user_id).await?;
    Ok(Json(UserResponse {
        success: true,
        message: "User profile fetched successfully".into(),
        user: PublicUser::from(user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(mut payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut user = load_current_user(&state, user_id).await?;

    if let Some(name) = payload.full_name.as_deref() {
        if name.trim().is_empty() {
            return Err(ApiError::validation("Full name cannot be empty"));
        }
        user = User::update_profile(&state.db, user.id, Some(name.trim()), None, None).await?;
    }

    if let Some(avatar) = payload.avatar.take() {
        let ct = payload
            .avatar_content_type
            .as_deref()
            .unwrap_or("image/jpeg");
        user = upload_avatar(&state, &user, Bytes::from(avatar.into_vec()), ct)
            .await
            .map_err(ApiError::upstream)?;
    }

    info!(user_id = %user.id, "profile updated");
    Ok(Json(UserResponse {
        success: true,
        message: "Profile updated successfully".into(),
        user: PublicUser::from(user),
    }))
}

async fn upload_avatar(
    state: &AppState,
    user: &User,
    body: Bytes,
    content_type: &str,
) -> anyhow::Result<User> {
    let ext = ext_from_mime(content_type)
        .ok_or_else(|| anyhow::anyhow!("unsupported avatar content type {content_type}"))?;
    let key = format!("avatars/{}.{}", user.id, ext);
    let obj = state.media.upload(&key, body, content_type).await?;

    // The old object is only removed once the new one is in place; a failed
    // delete leaves an orphan, not a broken avatar.
    if let Some(old) = user.avatar_public_id.as_deref() {
        if old != obj.public_id {
            if let Err(e) = state.media.delete(old).await {
                warn!(user_id = %user.id, public_id = old, error = %e, "old avatar delete failed");
            }
        }
    }

    let updated = User::update_profile(
        &state.db,
        user.id,
        None,
        Some(&obj.public_id),
        Some(&obj.secure_url),
    )
    .await?;
    Ok(updated)
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    if !is_valid_email(&payload.email) {
        return Err(ApiError::validation("Invalid email"));
    }

    // The response is identical whether or not the account exists.
    let generic = MessageResponse::ok("If that email is registered, a reset link has been sent");

    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        info!(email = %payload.email, "password reset requested for unknown email");
        return Ok(Json(generic));
    };

    services::send_reset_email(
        &state.db,
        state.mailer.as_ref(),
        user.id,
        &user.email,
        &state.config.mail.frontend_url,
        state.config.reset_token_ttl_minutes,
    )
    .await?;

    Ok(Json(generic))
}

#[instrument(skip(state, payload, reset_token))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(reset_token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_password(&payload.password)?;

    let token_hash = reset::hash_token(&reset_token);
    let Some(user) = User::find_by_reset_hash(&state.db, &token_hash).await? else {
        warn!("reset attempted with unknown token");
        return Err(ApiError::validation("Reset token is invalid or has expired"));
    };

    let mut stored = reset::StoredReset {
        hash: user.reset_token_hash.clone(),
        expires_at: user.reset_token_expires_at,
    };
    let outcome = stored.redeem(&reset_token);

    // Single use: the token is burned on a hash match, even if the
    // redemption failed on expiry or the password update below fails.
    User::clear_reset_token(&state.db, user.id).await?;

    if outcome.is_err() {
        return Err(ApiError::validation("Reset token is invalid or has expired"));
    }

    let hash = hash_password(&payload.password).map_err(ApiError::Internal)?;
    User::update_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password reset completed");
    Ok(Json(MessageResponse::ok("Password reset successfully")))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.old_password.is_empty() {
        return Err(ApiError::validation("All fields are required"));
    }
    validate_password(&payload.new_password)?;

    let user = load_current_user(&state, user_id).await?;

    let ok =
        verify_password(&payload.old_password, &user.password_hash).map_err(ApiError::Internal)?;
    if !ok {
        return Err(ApiError::validation("Old password does not match"));
    }

    let hash = hash_password(&payload.new_password).map_err(ApiError::Internal)?;
    User::update_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password changed");
    Ok(Json(MessageResponse::ok("Password changed successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn password_length_gate() {
        assert!(validate_password("pw123456").is_ok());
        assert!(validate_password("short").is_err());
    }
}
