//! In-memory ledger and identity store for testing.

use crate::models::{Creation, EntitlementContext, Plan};
use crate::services::identity::{IdentityError, IdentityStore};
use crate::services::ledger::CreationLedger;
use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Ledger kept in a vector. Can be switched into a failing mode.
#[derive(Default)]
pub struct MemoryLedger {
    creations: Mutex<Vec<Creation>>,
    fail_appends: AtomicBool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger whose every append fails.
    pub fn failing() -> Self {
        let ledger = Self::default();
        ledger.fail_appends.store(true, Ordering::SeqCst);
        ledger
    }

    pub fn entries(&self) -> Vec<Creation> {
        self.creations.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Creation>>, AppError> {
        self.creations
            .lock()
            .map_err(|_| AppError::DatabaseError(anyhow::anyhow!("ledger lock poisoned")))
    }
}

#[async_trait]
impl CreationLedger for MemoryLedger {
    async fn append(&self, creation: &Creation) -> Result<(), AppError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "connection reset by peer"
            )));
        }
        self.lock()?.push(creation.clone());
        Ok(())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Creation>, AppError> {
        let mut found: Vec<Creation> = self
            .lock()?
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn list_published(&self, limit: i64) -> Result<Vec<Creation>, AppError> {
        let mut found: Vec<Creation> = self
            .lock()?
            .iter()
            .rev()
            .filter(|c| c.publish)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(found)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Identity store kept in a map of `user_id -> (plan, free_usage)`.
#[derive(Default)]
pub struct MemoryIdentityStore {
    users: Mutex<HashMap<String, (Plan, u32)>>,
    fail_updates: AtomicBool,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user_id: &str, plan: Plan, free_usage: u32) -> Self {
        if let Ok(mut users) = self.users.lock() {
            users.insert(user_id.to_string(), (plan, free_usage));
        }
        self
    }

    /// Make every `record_usage` call fail.
    pub fn fail_updates(self) -> Self {
        self.fail_updates.store(true, Ordering::SeqCst);
        self
    }

    pub fn free_usage(&self, user_id: &str) -> Option<u32> {
        self.users
            .lock()
            .ok()
            .and_then(|users| users.get(user_id).map(|(_, usage)| *usage))
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn fetch_entitlement(&self, user_id: &str) -> Result<EntitlementContext, IdentityError> {
        let users = self
            .users
            .lock()
            .map_err(|_| IdentityError::Upstream("identity lock poisoned".to_string()))?;
        let (plan, free_usage) = users
            .get(user_id)
            .copied()
            .ok_or_else(|| IdentityError::UserNotFound(user_id.to_string()))?;
        Ok(EntitlementContext::new(user_id, plan, free_usage))
    }

    async fn record_usage(&self, ctx: &EntitlementContext) -> Result<u32, IdentityError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(IdentityError::Network("identity service timed out".to_string()));
        }
        let mut users = self
            .users
            .lock()
            .map_err(|_| IdentityError::Upstream("identity lock poisoned".to_string()))?;
        let entry = users
            .entry(ctx.user_id.clone())
            .or_insert((ctx.plan, ctx.free_usage));
        entry.1 = entry.1.max(ctx.free_usage) + 1;
        Ok(entry.1)
    }
}
