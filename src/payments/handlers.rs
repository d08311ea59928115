use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::MessageResponse,
        extractors::{load_current_user, AuthUser},
        guards::require_role,
        repo_types::{Role, SubscriptionStatus, User},
    },
    error::ApiError,
    payments::{
        dto::{ApiKeyResponse, ListQuery, SubscribeResponse, SubscriptionListResponse, VerifyPaymentRequest},
        repo::Payment,
        services, signature,
    },
    state::AppState,
};

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payment", get(all_subscriptions))
        .route("/payment/key", get(gateway_key))
        .route("/payment/subscribe", post(subscribe))
        .route("/payment/verify", post(verify_payment))
        .route("/payment/unsubscribe", post(unsubscribe))
}

/// Public key id the frontend needs to open the gateway checkout.
#[instrument(skip(state))]
pub async fn gateway_key(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Json<ApiKeyResponse> {
    Json(ApiKeyResponse {
        success: true,
        message: "Billing gateway API key".into(),
        key: state.config.billing.key_id.clone(),
    })
}

#[instrument(skip(state))]
pub async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SubscribeResponse>, ApiError> {
    let user = load_current_user(&state, user_id).await?;

    let sub =
        services::start_subscription(state.billing.as_ref(), &user, &state.config.billing.plan_id)
            .await?;

    let status = services::reconcile_status(&sub.status, SubscriptionStatus::Created);
    User::set_subscription(&state.db, user.id, &sub.id, status).await?;

    info!(user_id = %user.id, subscription_id = %sub.id, "subscription started");
    Ok(Json(SubscribeResponse {
        success: true,
        message: "Subscribed successfully".into(),
        subscription_id: sub.id,
    }))
}

#[instrument(skip(state, payload))]
pub async fn verify_payment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.payment_id.is_empty() || payload.signature.is_empty() {
        return Err(ApiError::validation("All fields are required"));
    }

    let user = load_current_user(&state, user_id).await?;

    // The signature covers the subscription id we have on file, not the one
    // the client claims; a mismatch there fails the same way as tampering.
    let Some(stored_subscription_id) = user.subscription_id.as_deref() else {
        return Err(ApiError::validation("No subscription on file"));
    };
    services::confirm_subscription_reference(stored_subscription_id, &payload.subscription_id)?;

    if let Err(e) = signature::verify_payment_signature(
        &state.config.billing.key_secret,
        &payload.payment_id,
        stored_subscription_id,
        &payload.signature,
    ) {
        warn!(user_id = %user.id, payment_id = %payload.payment_id, "payment signature mismatch");
        return Err(e);
    }

    // Persist the id the signature was checked against, not client input.
    Payment::create(
        &state.db,
        user.id,
        &payload.payment_id,
        stored_subscription_id,
        &payload.signature,
    )
    .await?;

    User::set_subscription_status(&state.db, user.id, SubscriptionStatus::Active).await?;

    info!(user_id = %user.id, payment_id = %payload.payment_id, "payment verified");
    Ok(Json(MessageResponse::ok("Payment verified successfully")))
}

#[instrument(skip(state))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = load_current_user(&state, user_id).await?;

    let sub = services::cancel_subscription(state.billing.as_ref(), &user).await?;

    let status = services::reconcile_status(&sub.status, SubscriptionStatus::Cancelled);
    User::set_subscription_status(&state.db, user.id, status).await?;

    info!(user_id = %user.id, subscription_id = %sub.id, "subscription cancelled");
    Ok(Json(MessageResponse::ok("Unsubscribed successfully")))
}

/// Admin view of every subscription known to the gateway.
#[instrument(skip(state))]
pub async fn all_subscriptions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<SubscriptionListResponse>, ApiError> {
    let user = load_current_user(&state, user_id).await?;
    require_role(&user, &[Role::Admin])?;

    let subscriptions = state
        .billing
        .list_subscriptions(query.count)
        .await
        .map_err(ApiError::upstream)?;

    Ok(Json(SubscriptionListResponse {
        success: true,
        message: "All subscriptions".into(),
        subscriptions,
    }))
}
