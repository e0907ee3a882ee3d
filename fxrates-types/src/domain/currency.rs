//! Currency codes supported by the rate workflow.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use utoipa::ToSchema;

use crate::error::DomainError;

/// Currency codes the service will fetch and store rates for.
///
/// Requests carrying any code outside this allow-list are rejected before a
/// workflow instance is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    USD,
    EUR,
    CHF,
    GBP,
    JPY,
    CAD,
    AUD,
    CNY,
    SEK,
    NOK,
}

impl CurrencyCode {
    /// Every supported code, in no particular order.
    pub const ALL: [CurrencyCode; 10] = [
        CurrencyCode::USD,
        CurrencyCode::EUR,
        CurrencyCode::CHF,
        CurrencyCode::GBP,
        CurrencyCode::JPY,
        CurrencyCode::CAD,
        CurrencyCode::AUD,
        CurrencyCode::CNY,
        CurrencyCode::SEK,
        CurrencyCode::NOK,
    ];

    /// Returns the 3-letter ISO-style code.
    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyCode::USD => "USD",
            CurrencyCode::EUR => "EUR",
            CurrencyCode::CHF => "CHF",
            CurrencyCode::GBP => "GBP",
            CurrencyCode::JPY => "JPY",
            CurrencyCode::CAD => "CAD",
            CurrencyCode::AUD => "AUD",
            CurrencyCode::CNY => "CNY",
            CurrencyCode::SEK => "SEK",
            CurrencyCode::NOK => "NOK",
        }
    }
}

// Ordering is lexicographic over the code string; canonical pair orientation
// (`from < to` in stored records) depends on exactly this ordering.
impl Ord for CurrencyCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for CurrencyCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| DomainError::UnknownCurrency(s.to_string()))
    }
}

/// Normalizes a raw currency list into validated codes.
///
/// Uppercases, drops duplicates while preserving first appearance, and
/// rejects unknown codes and empty input. This is the whole precondition the
/// workflow trigger enforces; the engine receives only typed codes.
pub fn normalize_codes(raw: &[String]) -> Result<Vec<CurrencyCode>, DomainError> {
    let mut codes = Vec::with_capacity(raw.len());
    for value in raw {
        let code: CurrencyCode = value.trim().to_uppercase().parse()?;
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    if codes.is_empty() {
        return Err(DomainError::EmptyCurrencyList);
    }
    Ok(codes)
}
