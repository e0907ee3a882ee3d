//! # FX Rates Provider
//!
//! Outbound adapters for the rate workflow service: the HTTP client
//! for the external exchange-rate provider and the environment-backed
//! secret store.

pub mod rates;
pub mod secrets;

pub use rates::{DEFAULT_PROVIDER_URL, HttpRateFetcher};
pub use secrets::EnvSecretStore;
