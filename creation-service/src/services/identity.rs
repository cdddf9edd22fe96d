//! Identity store: plan and free-tier counter per user.
//!
//! The Clerk implementation keeps `plan` in a user's public metadata and
//! `free_usage` in private metadata. Clerk has no conditional increment,
//! so `record_usage` is a read-modify-write: two concurrent metered
//! requests near the limit can both pass the gate before either write
//! lands.

use crate::models::{EntitlementContext, Plan};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

pub const CLERK_API_BASE: &str = "https://api.clerk.com/v1";

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Identity service error: {0}")]
    Upstream(String),

    #[error("Identity service unreachable: {0}")]
    Network(String),
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Load the caller's plan and free-tier counter.
    async fn fetch_entitlement(&self, user_id: &str) -> Result<EntitlementContext, IdentityError>;

    /// Increment the caller's free-tier counter. Returns the new value.
    async fn record_usage(&self, ctx: &EntitlementContext) -> Result<u32, IdentityError>;
}

#[derive(Debug, Clone)]
pub struct ClerkConfig {
    pub secret_key: Secret<String>,
    pub base_url: String,
    pub timeout: Duration,
}

pub struct ClerkIdentityStore {
    config: ClerkConfig,
    client: Client,
}

impl ClerkIdentityStore {
    pub fn new(config: ClerkConfig) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn user_url(&self, user_id: &str) -> String {
        format!(
            "{}/users/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(user_id)
        )
    }

    async fn fetch_user(&self, user_id: &str) -> Result<ClerkUser, IdentityError> {
        let response = self
            .client
            .get(self.user_url(user_id))
            .bearer_auth(self.config.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        match response.status() {
            s if s.is_success() => response
                .json::<ClerkUser>()
                .await
                .map_err(|e| IdentityError::Upstream(format!("Invalid user payload: {}", e))),
            StatusCode::NOT_FOUND => Err(IdentityError::UserNotFound(user_id.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(IdentityError::Upstream(format!("{}: {}", status, body)))
            }
        }
    }
}

#[async_trait]
impl IdentityStore for ClerkIdentityStore {
    async fn fetch_entitlement(&self, user_id: &str) -> Result<EntitlementContext, IdentityError> {
        let user = self.fetch_user(user_id).await?;
        Ok(EntitlementContext::new(
            user_id,
            Plan::from_metadata(user.public_metadata.plan.as_deref()),
            user.private_metadata.free_usage.unwrap_or(0),
        ))
    }

    async fn record_usage(&self, ctx: &EntitlementContext) -> Result<u32, IdentityError> {
        let current = self
            .fetch_user(&ctx.user_id)
            .await?
            .private_metadata
            .free_usage
            .unwrap_or(0);
        let next = current.max(ctx.free_usage).saturating_add(1);

        let response = self
            .client
            .patch(format!("{}/metadata", self.user_url(&ctx.user_id)))
            .bearer_auth(self.config.secret_key.expose_secret())
            .json(&json!({ "private_metadata": { "free_usage": next } }))
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Upstream(format!("{}: {}", status, body)));
        }

        tracing::debug!(user_id = %ctx.user_id, free_usage = next, "Recorded free-tier usage");
        Ok(next)
    }
}

#[derive(Debug, Deserialize)]
struct ClerkUser {
    #[serde(default)]
    public_metadata: PublicMetadata,
    #[serde(default)]
    private_metadata: PrivateMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct PublicMetadata {
    #[serde(default)]
    plan: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PrivateMetadata {
    #[serde(default)]
    free_usage: Option<u32>,
}
