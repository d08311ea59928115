use crate::auth::repo_types::{Role, SubscriptionStatus, User};
use crate::billing::{BillingGateway, GatewaySubscription};
use crate::error::ApiError;
use tracing::warn;

/// Begin the billing lifecycle for a user: none -> created.
///
/// Admins are not billable and are rejected before any gateway traffic. A
/// gateway failure propagates as Upstream and the caller persists nothing,
/// so the user's subscription fields stay untouched.
pub async fn start_subscription(
    gateway: &dyn BillingGateway,
    user: &User,
    plan_id: &str,
) -> Result<GatewaySubscription, ApiError> {
    if user.role == Role::Admin {
        return Err(ApiError::forbidden(
            "Admin is not authorized to purchase a subscription",
        ));
    }
    match user.subscription_status {
        SubscriptionStatus::Created | SubscriptionStatus::Active => {
            return Err(ApiError::Conflict("You are already subscribed".into()));
        }
        SubscriptionStatus::Cancelled => {
            // Terminal state; reactivation is out of scope.
            return Err(ApiError::Conflict(
                "Your subscription was cancelled and cannot be restarted".into(),
            ));
        }
        SubscriptionStatus::None => {}
    }

    gateway
        .create_subscription(plan_id)
        .await
        .map_err(ApiError::upstream)
}

/// Cancel through the gateway; the gateway's reported status is the truth.
pub async fn cancel_subscription(
    gateway: &dyn BillingGateway,
    user: &User,
) -> Result<GatewaySubscription, ApiError> {
    if user.role == Role::Admin {
        return Err(ApiError::forbidden(
            "Admin cannot cancel a subscription on this platform",
        ));
    }
    let Some(subscription_id) = user.subscription_id.as_deref() else {
        return Err(ApiError::validation("No subscription on file"));
    };

    gateway
        .cancel_subscription(subscription_id)
        .await
        .map_err(ApiError::upstream)
}

/// The subscription id on file is authoritative; a payload naming a
/// different one (or none at all) is rejected before anything is persisted.
pub fn confirm_subscription_reference(stored: &str, claimed: &str) -> Result<(), ApiError> {
    if claimed != stored {
        return Err(ApiError::validation(
            "Subscription does not match the one on file",
        ));
    }
    Ok(())
}

/// Translate a gateway status string, falling back when the gateway reports
/// something the local lifecycle does not model.
pub fn reconcile_status(gateway_status: &str, fallback: SubscriptionStatus) -> SubscriptionStatus {
    SubscriptionStatus::from_gateway(gateway_status).unwrap_or_else(|| {
        warn!(status = gateway_status, "unrecognized gateway subscription status");
        fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::OffsetDateTime;
    use uuid::Uuid;

    /// Gateway double that counts calls and can be told to fail.
    struct CountingGateway {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingGateway {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BillingGateway for CountingGateway {
        async fn create_subscription(&self, _plan: &str) -> anyhow::Result<GatewaySubscription> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("gateway unavailable");
            }
            Ok(GatewaySubscription {
                id: "sub_new".into(),
                status: "created".into(),
            })
        }
        async fn cancel_subscription(&self, id: &str) -> anyhow::Result<GatewaySubscription> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("gateway unavailable");
            }
            Ok(GatewaySubscription {
                id: id.to_string(),
                status: "cancelled".into(),
            })
        }
        async fn list_subscriptions(&self, _count: u32) -> anyhow::Result<Vec<GatewaySubscription>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    fn user_with(role: Role, status: SubscriptionStatus, sub_id: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            full_name: "A".into(),
            password_hash: "h".into(),
            role,
            subscription_id: sub_id.map(str::to_string),
            subscription_status: status,
            avatar_public_id: None,
            avatar_url: None,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn admin_cannot_subscribe_and_gateway_is_not_called() {
        let gateway = CountingGateway::new(false);
        let admin = user_with(Role::Admin, SubscriptionStatus::None, None);
        let err = start_subscription(&gateway, &admin, "plan_1").await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn user_with_no_subscription_can_start() {
        let gateway = CountingGateway::new(false);
        let user = user_with(Role::User, SubscriptionStatus::None, None);
        let sub = start_subscription(&gateway, &user, "plan_1").await.unwrap();
        assert_eq!(sub.id, "sub_new");
        assert_eq!(sub.status, "created");
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn already_subscribed_is_a_conflict_without_gateway_call() {
        let gateway = CountingGateway::new(false);
        for status in [SubscriptionStatus::Created, SubscriptionStatus::Active] {
            let user = user_with(Role::User, status, Some("sub_1"));
            let err = start_subscription(&gateway, &user, "plan_1").await.unwrap_err();
            assert!(matches!(err, ApiError::Conflict(_)));
        }
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn cancelled_is_terminal() {
        let gateway = CountingGateway::new(false);
        let user = user_with(Role::User, SubscriptionStatus::Cancelled, Some("sub_1"));
        let err = start_subscription(&gateway, &user, "plan_1").await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn gateway_failure_surfaces_as_upstream() {
        let gateway = CountingGateway::new(true);
        let user = user_with(Role::User, SubscriptionStatus::None, None);
        let err = start_subscription(&gateway, &user, "plan_1").await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
    }

    #[tokio::test]
    async fn admin_cannot_cancel() {
        let gateway = CountingGateway::new(false);
        let admin = user_with(Role::Admin, SubscriptionStatus::Active, Some("sub_1"));
        let err = cancel_subscription(&gateway, &admin).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn cancel_without_subscription_is_rejected() {
        let gateway = CountingGateway::new(false);
        let user = user_with(Role::User, SubscriptionStatus::None, None);
        let err = cancel_subscription(&gateway, &user).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn cancel_reports_gateway_status() {
        let gateway = CountingGateway::new(false);
        let user = user_with(Role::User, SubscriptionStatus::Active, Some("sub_1"));
        let sub = cancel_subscription(&gateway, &user).await.unwrap();
        assert_eq!(sub.status, "cancelled");
        assert_eq!(
            reconcile_status(&sub.status, SubscriptionStatus::Cancelled),
            SubscriptionStatus::Cancelled
        );
    }

    #[test]
    fn claimed_subscription_must_match_stored() {
        assert!(confirm_subscription_reference("sub_1", "sub_1").is_ok());
        let err = confirm_subscription_reference("sub_1", "sub_2").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        let err = confirm_subscription_reference("sub_1", "").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn reconcile_falls_back_on_unknown_status() {
        assert_eq!(
            reconcile_status("halted", SubscriptionStatus::Created),
            SubscriptionStatus::Created
        );
        assert_eq!(
            reconcile_status("active", SubscriptionStatus::Created),
            SubscriptionStatus::Active
        );
    }
}
