//! Domain models for the creation service.

pub mod creation;
pub mod entitlement;

pub use creation::{Creation, CreationType};
pub use entitlement::{EntitlementContext, Plan};
