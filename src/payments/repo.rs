use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Record of a verified subscription payment.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_id: String,
    pub subscription_id: String,
    pub signature: String,
    pub created_at: OffsetDateTime,
}

impl Payment {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        payment_id: &str,
        subscription_id: &str,
        signature: &str,
    ) -> Result<Payment, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (user_id, payment_id, subscription_id, signature)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, payment_id, subscription_id, signature, created_at
            "#,
        )
        .bind(user_id)
        .bind(payment_id)
        .bind(subscription_id)
        .bind(signature)
        .fetch_one(db)
        .await
    }
}
