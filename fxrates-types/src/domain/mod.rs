//! Domain models for the FX rates workflow service.

pub mod currency;
pub mod pairs;
pub mod rate;
pub mod workflow;

pub use currency::{CurrencyCode, normalize_codes};
pub use pairs::{FetchGroup, plan_fetch_groups};
pub use rate::{RateQuote, RateRecord};
pub use workflow::{FailureReason, WorkflowId, WorkflowInstance, WorkflowStatus};
