//! Loads the caller's [`EntitlementContext`] before a capability handler runs.

use super::user_id::UserId;
use crate::models::EntitlementContext;
use crate::services::IdentityError;
use crate::startup::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

#[async_trait]
impl FromRequestParts<AppState> for EntitlementContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let UserId(user_id) = UserId::from_request_parts(parts, state).await?;

        state
            .identity
            .fetch_entitlement(&user_id)
            .await
            .map_err(|e| match e {
                IdentityError::UserNotFound(_) => AppError::Unauthorized(anyhow::anyhow!(e)),
                other => {
                    tracing::error!(
                        user_id = %user_id,
                        error = %other,
                        "Entitlement lookup failed"
                    );
                    AppError::BadGateway(other.to_string())
                }
            })
    }
}
