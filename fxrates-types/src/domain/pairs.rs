//! Fetch-group planning: decomposing a currency list into provider calls.

use serde::{Deserialize, Serialize};

use super::currency::CurrencyCode;

/// One provider call: a base currency priced against a list of targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchGroup {
    pub base: CurrencyCode,
    /// Non-empty, in input order.
    pub targets: Vec<CurrencyCode>,
}

/// Plans the minimal set of fetch groups covering every unordered pair once.
///
/// For K distinct codes this yields K-1 groups: group `i` has base `codes[i]`
/// and targets `codes[i+1..]`, so each unordered pair {a, b} lands in exactly
/// one group with the earlier-indexed code as base. One provider call per base
/// prices all remaining currencies at once - O(K) calls for O(K²) pairs.
///
/// Pure and deterministic; an input of fewer than two codes yields no groups.
pub fn plan_fetch_groups(codes: &[CurrencyCode]) -> Vec<FetchGroup> {
    let mut groups = Vec::new();
    for (i, &base) in codes.iter().enumerate() {
        let targets = codes[i + 1..].to_vec();
        if !targets.is_empty() {
            groups.push(FetchGroup { base, targets });
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn codes(list: &[CurrencyCode]) -> Vec<CurrencyCode> {
        list.to_vec()
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        assert!(plan_fetch_groups(&[]).is_empty());
    }

    #[test]
    fn test_single_code_yields_no_groups() {
        assert!(plan_fetch_groups(&codes(&[CurrencyCode::USD])).is_empty());
    }

    #[test]
    fn test_two_codes_yield_one_group() {
        let groups = plan_fetch_groups(&codes(&[CurrencyCode::EUR, CurrencyCode::USD]));
        assert_eq!(
            groups,
            vec![FetchGroup {
                base: CurrencyCode::EUR,
                targets: vec![CurrencyCode::USD],
            }]
        );
    }

    #[test]
    fn test_three_codes_cover_each_pair_once() {
        let groups = plan_fetch_groups(&codes(&[
            CurrencyCode::USD,
            CurrencyCode::EUR,
            CurrencyCode::GBP,
        ]));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].base, CurrencyCode::USD);
        assert_eq!(groups[0].targets, vec![CurrencyCode::EUR, CurrencyCode::GBP]);
        assert_eq!(groups[1].base, CurrencyCode::EUR);
        assert_eq!(groups[1].targets, vec![CurrencyCode::GBP]);
    }

    #[test]
    fn test_pair_coverage_counts() {
        // K codes must produce exactly K*(K-1)/2 unordered pairs, each once.
        for k in 2..=CurrencyCode::ALL.len() {
            let input = CurrencyCode::ALL[..k].to_vec();
            let groups = plan_fetch_groups(&input);
            assert_eq!(groups.len(), k - 1);

            let mut pairs = BTreeSet::new();
            for group in &groups {
                for &target in &group.targets {
                    let mut pair = [group.base, target];
                    pair.sort();
                    assert!(pairs.insert(pair), "duplicate pair {:?}", pair);
                }
            }
            assert_eq!(pairs.len(), k * (k - 1) / 2);
        }
    }

    #[test]
    fn test_base_is_earlier_indexed_code() {
        let input = codes(&[CurrencyCode::SEK, CurrencyCode::AUD, CurrencyCode::EUR]);
        let groups = plan_fetch_groups(&input);
        // Input order, not lexicographic order, decides the base.
        assert_eq!(groups[0].base, CurrencyCode::SEK);
        assert_eq!(groups[1].base, CurrencyCode::AUD);
    }
}
