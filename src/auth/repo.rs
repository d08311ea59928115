use crate::auth::repo_types::{SubscriptionStatus, User};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, full_name, password_hash, role, subscription_id, \
     subscription_status, avatar_public_id, avatar_url, reset_token_hash, \
     reset_token_expires_at, created_at";

impl User {
    /// Exact, case-insensitive lookup by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Insert a new user. The unique index on lower(email) raises a conflict
    /// for duplicate registrations; callers translate that into 409.
    pub async fn create(
        db: &PgPool,
        email: &str,
        full_name: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, full_name, password_hash)
             VALUES ($1, $2, $3)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(full_name)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    pub async fn update_password(
        db: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        full_name: Option<&str>,
        avatar_public_id: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users
                SET full_name = COALESCE($2, full_name),
                    avatar_public_id = COALESCE($3, avatar_public_id),
                    avatar_url = COALESCE($4, avatar_url)
              WHERE id = $1
          RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(full_name)
        .bind(avatar_public_id)
        .bind(avatar_url)
        .fetch_one(db)
        .await
    }

    /// Store a reset-token hash and expiry, replacing any previous token.
    pub async fn set_reset_token(
        db: &PgPool,
        id: Uuid,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET reset_token_hash = $2, reset_token_expires_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn clear_reset_token(db: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET reset_token_hash = NULL, reset_token_expires_at = NULL WHERE id = $1",
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn find_by_reset_hash(
        db: &PgPool,
        token_hash: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE reset_token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(db)
        .await
    }

    pub async fn set_subscription(
        db: &PgPool,
        id: Uuid,
        subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET subscription_id = $2, subscription_status = $3 WHERE id = $1")
            .bind(id)
            .bind(subscription_id)
            .bind(status)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn set_subscription_status(
        db: &PgPool,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET subscription_status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(db)
            .await?;
        Ok(())
    }
}
