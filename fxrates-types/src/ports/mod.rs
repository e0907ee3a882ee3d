//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The workflow engine depends on these traits, not concrete implementations,
//! so every collaborator can be substituted with a fake in tests.

mod fetcher;
mod instances;
mod secrets;
mod store;

pub use fetcher::RateFetcher;
pub use instances::InstanceRepository;
pub use secrets::{SECRET_API_KEY, SECRET_DB_CONNECTION, SecretStore};
pub use store::{RateStore, RateStoreConnector};
