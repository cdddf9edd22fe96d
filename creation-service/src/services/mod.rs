pub mod database;
pub mod identity;
pub mod ledger;
pub mod metrics;
pub mod mock;
pub mod providers;

pub use database::CreationDb;
pub use identity::{ClerkIdentityStore, IdentityError, IdentityStore};
pub use ledger::CreationLedger;
