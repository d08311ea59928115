use crate::auth::repo_types::{Role, SubscriptionStatus, User};
use crate::error::ApiError;

/// Role gate: the caller's role must be in `allowed`.
pub fn require_role(user: &User, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "You do not have permission to perform this action",
        ))
    }
}

/// Subscription gate for paid content. Admins bypass the gate: they are not
/// billable (subscribe/unsubscribe reject them) but still see everything.
pub fn require_active_subscription(user: &User) -> Result<(), ApiError> {
    if user.role == Role::Admin || user.subscription_status == SubscriptionStatus::Active {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "An active subscription is required to access this content",
        ))
    }
}
