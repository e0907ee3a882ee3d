//! # FX Rates Engine
//!
//! Workflow engine, background runner, and HTTP adapter for the FX rates
//! service.
//!
//! ## Architecture
//!
//! - `engine` - Durable step-at-a-time workflow engine
//! - `runner` - Polling scheduler that drives active instances
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The engine is generic over the four capability ports defined in
//! `fxrates-types` (`RateFetcher`, `SecretStore`, `RateStoreConnector`,
//! `InstanceRepository`), allowing different adapters to be injected.

pub mod engine;
pub mod inbound;
pub mod openapi;
pub mod runner;


pub use engine::WorkflowEngine;
pub use runner::{RunnerConfig, WorkflowRunner};
