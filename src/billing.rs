use anyhow::Context;
use axum::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// Subscription record as reported by the billing gateway. The gateway is
/// authoritative for `status`; the core only mirrors it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySubscription {
    pub id: String,
    pub status: String,
}

#[async_trait]
pub trait BillingGateway: Send + Sync {
    async fn create_subscription(&self, plan_id: &str) -> anyhow::Result<GatewaySubscription>;
    async fn cancel_subscription(&self, subscription_id: &str)
        -> anyhow::Result<GatewaySubscription>;
    async fn list_subscriptions(&self, count: u32) -> anyhow::Result<Vec<GatewaySubscription>>;
}

/// Razorpay-style REST client. Authenticates with basic auth (key id/secret).
#[derive(Clone)]
pub struct RazorpayClient {
    http: reqwest::Client,
    api_base: String,
    key_id: String,
    key_secret: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionList {
    items: Vec<GatewaySubscription>,
}

impl RazorpayClient {
    pub fn new(api_base: &str, key_id: &str, key_secret: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            key_id: key_id.to_string(),
            key_secret: key_secret.to_string(),
        }
    }
}

#[async_trait]
impl BillingGateway for RazorpayClient {
    async fn create_subscription(&self, plan_id: &str) -> anyhow::Result<GatewaySubscription> {
        let resp = self
            .http
            .post(format!("{}/subscriptions", self.api_base))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&json!({
                "plan_id": plan_id,
                "total_count": 12,
                "customer_notify": 1,
            }))
            .send()
            .await
            .context("gateway create_subscription request")?
            .error_for_status()
            .context("gateway create_subscription status")?;

        let sub: GatewaySubscription = resp
            .json()
            .await
            .context("gateway create_subscription body")?;
        debug!(subscription_id = %sub.id, status = %sub.status, "gateway subscription created");
        Ok(sub)
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> anyhow::Result<GatewaySubscription> {
        let resp = self
            .http
            .post(format!(
                "{}/subscriptions/{}/cancel",
                self.api_base, subscription_id
            ))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .context("gateway cancel_subscription request")?
            .error_for_status()
            .context("gateway cancel_subscription status")?;

        let sub: GatewaySubscription = resp
            .json()
            .await
            .context("gateway cancel_subscription body")?;
        debug!(subscription_id = %sub.id, status = %sub.status, "gateway subscription cancelled");
        Ok(sub)
    }

    async fn list_subscriptions(&self, count: u32) -> anyhow::Result<Vec<GatewaySubscription>> {
        let resp = self
            .http
            .get(format!("{}/subscriptions", self.api_base))
            .query(&[("count", count)])
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .context("gateway list_subscriptions request")?
            .error_for_status()
            .context("gateway list_subscriptions status")?;

        let list: SubscriptionList = resp
            .json()
            .await
            .context("gateway list_subscriptions body")?;
        Ok(list.items)
    }
}
