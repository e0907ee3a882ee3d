//! # FX Rates Types
//!
//! Domain types and port traits for the FX rates workflow service.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (CurrencyCode, FetchGroup, RateRecord, WorkflowInstance)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    CurrencyCode, FailureReason, FetchGroup, RateQuote, RateRecord, WorkflowId, WorkflowInstance,
    WorkflowStatus, normalize_codes, plan_fetch_groups,
};
pub use dto::*;
pub use error::{
    AppError, DomainError, FetchError, RepoError, SecretError, StoreError, WorkflowError,
};
pub use ports::{
    InstanceRepository, RateFetcher, RateStore, RateStoreConnector, SECRET_API_KEY,
    SECRET_DB_CONNECTION, SecretStore,
};
