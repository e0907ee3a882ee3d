//! Rate-provider port.

use crate::domain::{FetchGroup, RateQuote};
use crate::error::FetchError;

/// Port trait for the external rate provider.
///
/// One call prices a whole fetch group: the base currency against every
/// target in the group. Implementations must be partial-failure tolerant:
/// an unreachable provider or a non-success response yields `Ok` with an
/// empty quote list (logged as a warning), and targets missing from a
/// success response are skipped without error. Only failures that must
/// abort the whole instance - credential resolution - surface as `Err`.
///
/// No retry happens at this level; retry policy belongs to the scheduler
/// driving the workflow engine.
#[async_trait::async_trait]
pub trait RateFetcher: Send + Sync + 'static {
    /// Fetches quotes for every target in the group that the provider knows.
    async fn fetch_rates(&self, group: &FetchGroup) -> Result<Vec<RateQuote>, FetchError>;
}
