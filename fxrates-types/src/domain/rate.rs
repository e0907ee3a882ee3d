//! Rate quotes and the normalized records the document store keeps.

use serde::{Deserialize, Serialize};

use super::currency::CurrencyCode;

/// One fetched rate: `base -> target` at `rate`. Transient fetch output,
/// never persisted directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub rate: f64,
}

/// The persisted currency-pair document, exactly as stored:
/// `{ id, from, to, rate, timestamp }`.
///
/// `from` and `to` are lexicographically ordered (`from < to`) regardless of
/// the originating quote's orientation, so `id = "<from>_<to>"` is canonical:
/// the same unordered pair always overwrites the same document. `timestamp`
/// is the owning instance's logical clock (milliseconds since epoch) as a
/// string, which keeps replayed persistence steps deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub id: String,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub rate: f64,
    pub timestamp: String,
}

impl RateRecord {
    /// Builds the normalized record for a quote. Reordering `from`/`to` does
    /// not touch the rate value; it is stored exactly as fetched.
    pub fn from_quote(quote: &RateQuote, timestamp_ms: i64) -> Self {
        let (from, to) = if quote.base <= quote.target {
            (quote.base, quote.target)
        } else {
            (quote.target, quote.base)
        };
        Self {
            id: Self::canonical_id(quote.base, quote.target),
            from,
            to,
            rate: quote.rate,
            timestamp: timestamp_ms.to_string(),
        }
    }

    /// The storage key for an unordered pair, independent of orientation.
    pub fn canonical_id(a: CurrencyCode, b: CurrencyCode) -> String {
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        format!("{}_{}", from, to)
    }

    /// True when the record satisfies the canonical-orientation invariant.
    /// The store rejects non-canonical records as malformed.
    pub fn is_canonical(&self) -> bool {
        self.from < self.to && self.id == format!("{}_{}", self.from, self.to)
    }
}
