use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{Role, SubscriptionStatus, User};

/// Request body for user registration. Avatar bytes are optional; the upload
/// happens after the user row is persisted and can be retried separately.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub avatar: Option<serde_bytes::ByteBuf>,
    #[serde(default)]
    pub avatar_content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<serde_bytes::ByteBuf>,
    #[serde(default)]
    pub avatar_content_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInfo {
    pub id: Option<String>,
    pub status: SubscriptionStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarInfo {
    pub public_id: String,
    pub secure_url: String,
}

/// Public view of a user: secrets (password hash, reset-token fields) are
/// stripped unconditionally because they are simply not part of this type.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub subscription: SubscriptionInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<AvatarInfo>,
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        let avatar = match (user.avatar_public_id, user.avatar_url) {
            (Some(public_id), Some(secure_url)) => Some(AvatarInfo {
                public_id,
                secure_url,
            }),
            _ => None,
        };
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
            subscription: SubscriptionInfo {
                id: user.subscription_id,
                status: user.subscription_status,
            },
            avatar,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub message: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_never_contains_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            full_name: "Ada".into(),
            password_hash: "super-secret-hash".into(),
            role: Role::User,
            subscription_id: Some("sub_1".into()),
            subscription_status: SubscriptionStatus::Active,
            avatar_public_id: Some("avatars/a".into()),
            avatar_url: Some("https://cdn.local/avatars/a".into()),
            reset_token_hash: Some("reset-secret".into()),
            reset_token_expires_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(!json.contains("super-secret-hash"));
        assert!(!json.contains("reset-secret"));
        assert!(json.contains("\"fullName\":\"Ada\""));
        assert!(json.contains("\"status\":\"active\""));
        assert!(json.contains("\"role\":\"USER\""));
    }

    #[test]
    fn register_request_accepts_camel_case() {
        let body = r#"{"fullName":"Ada","email":"a@x.com","password":"pw123456"}"#;
        let req: RegisterRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.full_name, "Ada");
        assert!(req.avatar.is_none());
    }
}
