//! Per-request entitlement state.

use serde::{Deserialize, Serialize};

/// Subscription plan of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Premium,
}

impl Plan {
    pub fn is_premium(&self) -> bool {
        matches!(self, Plan::Premium)
    }

    /// Anything other than `"premium"` is treated as the free plan.
    pub fn from_metadata(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("premium") => Plan::Premium,
            _ => Plan::Free,
        }
    }
}

/// Identity, plan and free-tier counter of the caller, as read from the
/// identity store when the request arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementContext {
    pub user_id: String,
    pub plan: Plan,
    pub free_usage: u32,
}

impl EntitlementContext {
    pub fn new(user_id: impl Into<String>, plan: Plan, free_usage: u32) -> Self {
        Self {
            user_id: user_id.into(),
            plan,
            free_usage,
        }
    }
}
