use serde::{Deserialize, Serialize};

use crate::billing::GatewaySubscription;

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub payment_id: String,
    pub subscription_id: String,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    10
}

#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub success: bool,
    pub message: String,
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: String,
    pub subscription_id: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionListResponse {
    pub success: bool,
    pub message: String,
    pub subscriptions: Vec<GatewaySubscription>,
}
