//! Failure taxonomy of a capability request.
//!
//! Every variant is converted into the `{success:false, message}` envelope
//! at the handler boundary.

use crate::services::identity::IdentityError;
use crate::services::providers::ProviderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CreationError {
    /// Plan or free-tier usage does not allow the capability.
    #[error("{0}")]
    EntitlementDenied(String),

    /// External provider call failed.
    #[error("{0}")]
    Provider(ProviderError),

    /// Ledger write failed.
    #[error("Failed to save creation: {0}")]
    Persistence(String),

    /// Missing or invalid upload, object description or document.
    #[error("{0}")]
    Input(String),

    /// Free-tier counter could not be updated.
    #[error("Failed to update usage: {0}")]
    Metering(String),
}

impl CreationError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CreationError::EntitlementDenied(_) => "entitlement_denied",
            CreationError::Provider(_) => "provider",
            CreationError::Persistence(_) => "persistence",
            CreationError::Input(_) => "input",
            CreationError::Metering(_) => "metering",
        }
    }

    /// Expected outcomes that are not logged as errors.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            CreationError::EntitlementDenied(_) | CreationError::Input(_)
        )
    }
}

impl From<ProviderError> for CreationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidInput(msg) => CreationError::Input(msg),
            other => CreationError::Provider(other),
        }
    }
}

impl From<validator::ValidationErrors> for CreationError {
    fn from(err: validator::ValidationErrors) -> Self {
        CreationError::Input(format!("Invalid request: {}", err))
    }
}

impl From<IdentityError> for CreationError {
    fn from(err: IdentityError) -> Self {
        CreationError::Metering(err.to_string())
    }
}
