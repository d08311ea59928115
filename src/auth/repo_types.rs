use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Coarse authorization tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

/// Mirror of the billing gateway's subscription lifecycle.
/// none -> created -> active -> cancelled; cancelled is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    None,
    Created,
    Active,
    Cancelled,
}

impl SubscriptionStatus {
    /// Map a gateway status string onto the local lifecycle. Unknown gateway
    /// states return None so the caller can pick a fallback.
    pub fn from_gateway(status: &str) -> Option<Self> {
        match status {
            "created" | "authenticated" | "pending" => Some(Self::Created),
            "active" => Some(Self::Active),
            "cancelled" | "canceled" | "completed" | "expired" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// User record in the database. Secret-bearing columns are never serialized.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub subscription_id: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub avatar_public_id: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_status_mapping() {
        assert_eq!(
            SubscriptionStatus::from_gateway("created"),
            Some(SubscriptionStatus::Created)
        );
        assert_eq!(
            SubscriptionStatus::from_gateway("active"),
            Some(SubscriptionStatus::Active)
        );
        assert_eq!(
            SubscriptionStatus::from_gateway("cancelled"),
            Some(SubscriptionStatus::Cancelled)
        );
        assert_eq!(SubscriptionStatus::from_gateway("halted"), None);
    }

    #[test]
    fn user_serialization_strips_secrets() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            full_name: "A".into(),
            password_hash: "argon2-hash".into(),
            role: Role::User,
            subscription_id: None,
            subscription_status: SubscriptionStatus::None,
            avatar_public_id: None,
            avatar_url: None,
            reset_token_hash: Some("reset-hash".into()),
            reset_token_expires_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2-hash"));
        assert!(!json.contains("reset-hash"));
        assert!(json.contains("a@x.com"));
    }
}
