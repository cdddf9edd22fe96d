//! Capability table and the entitlement gate.
//!
//! Each capability is described by a static descriptor; the gate and the
//! pipeline only ever look at the descriptor, never at the capability name.

use crate::error::CreationError;
use crate::models::{CreationType, EntitlementContext, Plan};
use serde::Serialize;
use std::fmt;

/// Default number of free metered calls before a free-plan user is rejected.
pub const DEFAULT_FREE_USAGE_LIMIT: u32 = 10;

pub const LIMIT_REACHED_MESSAGE: &str = "Limit reached. Upgrade to continue.";
pub const PREMIUM_ONLY_MESSAGE: &str = "Premium feature only";
pub const PREMIUM_SUBSCRIPTION_MESSAGE: &str =
    "This feature is only available for premium subscriptions";

/// One distinct generation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Article,
    BlogTitle,
    ImageSynthesis,
    BackgroundRemoval,
    ObjectRemoval,
    ResumeReview,
}

/// Which provider adapter a capability drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    TextCompletion,
    ImageSynthesis,
    BackgroundRemoval,
    ObjectRemoval,
    DocumentReview,
}

#[derive(Debug)]
pub struct CapabilityDescriptor {
    pub name: &'static str,
    pub creation_type: CreationType,
    pub adapter: AdapterKind,
    /// Unavailable to non-premium users regardless of usage.
    pub premium_only: bool,
    /// Counted against the free-tier allowance of non-premium users.
    pub metered: bool,
    pub default_token_budget: Option<u32>,
    pub denial_message: &'static str,
}

static ARTICLE: CapabilityDescriptor = CapabilityDescriptor {
    name: "article",
    creation_type: CreationType::Article,
    adapter: AdapterKind::TextCompletion,
    premium_only: false,
    metered: true,
    default_token_budget: Some(800),
    denial_message: LIMIT_REACHED_MESSAGE,
};

static BLOG_TITLE: CapabilityDescriptor = CapabilityDescriptor {
    name: "blog-title",
    creation_type: CreationType::BlogTitle,
    adapter: AdapterKind::TextCompletion,
    premium_only: false,
    metered: true,
    default_token_budget: Some(100),
    denial_message: LIMIT_REACHED_MESSAGE,
};

static IMAGE_SYNTHESIS: CapabilityDescriptor = CapabilityDescriptor {
    name: "image-synthesis",
    creation_type: CreationType::Image,
    adapter: AdapterKind::ImageSynthesis,
    premium_only: true,
    metered: false,
    default_token_budget: None,
    denial_message: PREMIUM_SUBSCRIPTION_MESSAGE,
};

static BACKGROUND_REMOVAL: CapabilityDescriptor = CapabilityDescriptor {
    name: "background-removal",
    creation_type: CreationType::Image,
    adapter: AdapterKind::BackgroundRemoval,
    premium_only: true,
    metered: false,
    default_token_budget: None,
    denial_message: PREMIUM_ONLY_MESSAGE,
};

static OBJECT_REMOVAL: CapabilityDescriptor = CapabilityDescriptor {
    name: "object-removal",
    creation_type: CreationType::Image,
    adapter: AdapterKind::ObjectRemoval,
    premium_only: true,
    metered: false,
    default_token_budget: None,
    denial_message: PREMIUM_ONLY_MESSAGE,
};

static RESUME_REVIEW: CapabilityDescriptor = CapabilityDescriptor {
    name: "resume-review",
    creation_type: CreationType::ResumeReview,
    adapter: AdapterKind::DocumentReview,
    premium_only: true,
    metered: false,
    default_token_budget: Some(1000),
    denial_message: PREMIUM_ONLY_MESSAGE,
};

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::Article,
        Capability::BlogTitle,
        Capability::ImageSynthesis,
        Capability::BackgroundRemoval,
        Capability::ObjectRemoval,
        Capability::ResumeReview,
    ];

    pub fn descriptor(&self) -> &'static CapabilityDescriptor {
        match self {
            Capability::Article => &ARTICLE,
            Capability::BlogTitle => &BLOG_TITLE,
            Capability::ImageSynthesis => &IMAGE_SYNTHESIS,
            Capability::BackgroundRemoval => &BACKGROUND_REMOVAL,
            Capability::ObjectRemoval => &OBJECT_REMOVAL,
            Capability::ResumeReview => &RESUME_REVIEW,
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decides whether a plan/usage combination may invoke a capability.
#[derive(Debug, Clone, Copy)]
pub struct EntitlementGate {
    free_usage_limit: u32,
}

impl Default for EntitlementGate {
    fn default() -> Self {
        Self::new(DEFAULT_FREE_USAGE_LIMIT)
    }
}

impl EntitlementGate {
    pub fn new(free_usage_limit: u32) -> Self {
        Self { free_usage_limit }
    }

    pub fn allow(&self, plan: Plan, free_usage: u32, capability: Capability) -> bool {
        let descriptor = capability.descriptor();
        if plan.is_premium() {
            return true;
        }
        if descriptor.premium_only {
            return false;
        }
        !descriptor.metered || free_usage < self.free_usage_limit
    }

    /// Like [`allow`](Self::allow), but yields the user-facing denial.
    pub fn check(
        &self,
        ctx: &EntitlementContext,
        capability: Capability,
    ) -> Result<(), CreationError> {
        if self.allow(ctx.plan, ctx.free_usage, capability) {
            Ok(())
        } else {
            Err(CreationError::EntitlementDenied(
                capability.descriptor().denial_message.to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METERED: [Capability; 2] = [Capability::Article, Capability::BlogTitle];
    const PREMIUM_ONLY: [Capability; 4] = [
        Capability::ImageSynthesis,
        Capability::BackgroundRemoval,
        Capability::ObjectRemoval,
        Capability::ResumeReview,
    ];

    #[test]
    fn capabilities_are_partitioned() {
        for capability in Capability::ALL {
            let d = capability.descriptor();
            assert_ne!(d.metered, d.premium_only, "{} must be exactly one kind", d.name);
        }
    }

    #[test]
    fn free_user_metered_allowed_below_limit() {
        let gate = EntitlementGate::default();
        for capability in METERED {
            for usage in 0..10 {
                assert!(gate.allow(Plan::Free, usage, capability));
            }
            assert!(!gate.allow(Plan::Free, 10, capability));
            assert!(!gate.allow(Plan::Free, 11, capability));
        }
    }

    #[test]
    fn premium_user_always_allowed() {
        let gate = EntitlementGate::default();
        for capability in Capability::ALL {
            assert!(gate.allow(Plan::Premium, 0, capability));
            assert!(gate.allow(Plan::Premium, 500, capability));
        }
    }

    #[test]
    fn free_user_never_gets_premium_only() {
        let gate = EntitlementGate::default();
        for capability in PREMIUM_ONLY {
            assert!(!gate.allow(Plan::Free, 0, capability));
        }
    }

    #[test]
    fn custom_limit_moves_the_boundary() {
        let gate = EntitlementGate::new(3);
        assert!(gate.allow(Plan::Free, 2, Capability::Article));
        assert!(!gate.allow(Plan::Free, 3, Capability::Article));
    }

    #[test]
    fn check_returns_denial_messages() {
        let gate = EntitlementGate::default();
        let exhausted = EntitlementContext::new("user-1", Plan::Free, 10);
        let fresh = EntitlementContext::new("user-1", Plan::Free, 0);

        let err = gate.check(&exhausted, Capability::BlogTitle).unwrap_err();
        assert_eq!(err.to_string(), LIMIT_REACHED_MESSAGE);

        let err = gate.check(&fresh, Capability::BackgroundRemoval).unwrap_err();
        assert_eq!(err.to_string(), PREMIUM_ONLY_MESSAGE);

        let err = gate.check(&fresh, Capability::ImageSynthesis).unwrap_err();
        assert_eq!(err.to_string(), PREMIUM_SUBSCRIPTION_MESSAGE);

        assert!(gate.check(&fresh, Capability::Article).is_ok());
    }
}
