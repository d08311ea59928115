use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{repo_types::User, reset},
    error::ApiError,
    mailer::{reset_email_body, Mailer},
};

/// Persistence seam for the pending-reset fields on a user row.
#[async_trait]
pub trait ResetStore: Send + Sync {
    async fn store_reset(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), sqlx::Error>;

    async fn clear_reset(&self, user_id: Uuid) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl ResetStore for PgPool {
    async fn store_reset(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        User::set_reset_token(self, user_id, token_hash, expires_at).await
    }

    async fn clear_reset(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        User::clear_reset_token(self, user_id).await
    }
}

/// Issue a reset token, persist its hash, and email the raw value.
///
/// A send failure clears the stored fields again and surfaces as Upstream:
/// a token nobody received must not stay usable.
pub async fn send_reset_email(
    store: &dyn ResetStore,
    mailer: &dyn Mailer,
    user_id: Uuid,
    email: &str,
    frontend_url: &str,
    ttl_minutes: i64,
) -> Result<(), ApiError> {
    let issued = reset::issue(ttl_minutes);
    store
        .store_reset(user_id, &issued.hash, issued.expires_at)
        .await?;

    let body = reset_email_body(frontend_url, &issued.raw);
    if let Err(e) = mailer.send(email, "Reset your password", &body).await {
        store.clear_reset(user_id).await?;
        return Err(ApiError::upstream(e));
    }

    info!(user_id = %user_id, "password reset email sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory stand-in for the reset fields on a user row.
    #[derive(Default)]
    struct MemoryStore {
        fields: Mutex<Option<(String, OffsetDateTime)>>,
    }

    #[async_trait]
    impl ResetStore for MemoryStore {
        async fn store_reset(
            &self,
            _user_id: Uuid,
            token_hash: &str,
            expires_at: OffsetDateTime,
        ) -> Result<(), sqlx::Error> {
            *self.fields.lock().unwrap() = Some((token_hash.to_string(), expires_at));
            Ok(())
        }

        async fn clear_reset(&self, _user_id: Uuid) -> Result<(), sqlx::Error> {
            *self.fields.lock().unwrap() = None;
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _to: &str, _subject: &str, _html: &str) -> anyhow::Result<()> {
            anyhow::bail!("mail service unavailable")
        }
    }

    struct OkMailer;

    #[async_trait]
    impl Mailer for OkMailer {
        async fn send(&self, _to: &str, _subject: &str, _html: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn successful_send_leaves_token_stored() {
        let store = MemoryStore::default();
        send_reset_email(
            &store,
            &OkMailer,
            Uuid::new_v4(),
            "a@x.com",
            "https://app.test.local",
            15,
        )
        .await
        .unwrap();
        assert!(store.fields.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn mailer_failure_clears_stored_token_and_is_upstream() {
        let store = MemoryStore::default();
        let err = send_reset_email(
            &store,
            &FailingMailer,
            Uuid::new_v4(),
            "a@x.com",
            "https://app.test.local",
            15,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
        assert!(store.fields.lock().unwrap().is_none());
    }
}
