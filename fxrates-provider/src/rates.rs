//! HTTP adapter for the external exchange-rate provider.
//!
//! One GET per fetch group, authenticated with the provider API key
//! from the secret store. Provider trouble (unreachable host, error
//! status, undecodable body) is tolerated: the group comes back empty
//! and the workflow carries on with whatever other groups return. Only
//! a missing credential is fatal, because every subsequent call would
//! fail the same way.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use fxrates_types::{
    FetchError, FetchGroup, RateFetcher, RateQuote, SECRET_API_KEY, SecretStore,
};

/// Default upstream provider endpoint.
pub const DEFAULT_PROVIDER_URL: &str = "https://api.exchangerate-api.com";

/// Provider response for `GET /v4/latest/{base}`. Only the quote map
/// matters; everything else in the payload is ignored.
#[derive(Debug, Deserialize)]
struct LatestRates {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// Rate fetcher backed by the provider's HTTP API.
pub struct HttpRateFetcher<S: SecretStore> {
    http: reqwest::Client,
    base_url: String,
    secrets: Arc<S>,
}

impl<S: SecretStore> HttpRateFetcher<S> {
    pub fn new(base_url: impl Into<String>, secrets: Arc<S>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secrets,
        }
    }
}

#[async_trait]
impl<S: SecretStore> RateFetcher for HttpRateFetcher<S> {
    async fn fetch_rates(&self, group: &FetchGroup) -> Result<Vec<RateQuote>, FetchError> {
        let api_key = self.secrets.get_secret(SECRET_API_KEY).await?;

        let url = format!("{}/v4/latest/{}", self.base_url, group.base);
        let response = match self.http.get(&url).bearer_auth(&api_key).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(
                    "rate provider unreachable for {}: {} (treating group as empty)",
                    group.base, e
                );
                return Ok(Vec::new());
            }
        };

        if !response.status().is_success() {
            warn!(
                "rate provider returned {} for {} (treating group as empty)",
                response.status(),
                group.base
            );
            return Ok(Vec::new());
        }

        let latest: LatestRates = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    "undecodable rate payload for {}: {} (treating group as empty)",
                    group.base, e
                );
                return Ok(Vec::new());
            }
        };

        // Targets the provider does not quote are silently skipped.
        Ok(group
            .targets
            .iter()
            .filter_map(|target| {
                latest.rates.get(target.as_str()).map(|rate| RateQuote {
                    base: group.base,
                    target: *target,
                    rate: *rate,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router, extract::Path};

    use fxrates_types::{CurrencyCode, SecretError};

    struct FixedSecrets;

    #[async_trait]
    impl SecretStore for FixedSecrets {
        async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
            if name == SECRET_API_KEY {
                Ok("test-key".to_string())
            } else {
                Err(SecretError::NotFound(name.to_string()))
            }
        }
    }

    struct MissingSecrets;

    #[async_trait]
    impl SecretStore for MissingSecrets {
        async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
            Err(SecretError::NotFound(name.to_string()))
        }
    }

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn group(base: CurrencyCode, targets: Vec<CurrencyCode>) -> FetchGroup {
        FetchGroup { base, targets }
    }

    fn quote(base: CurrencyCode, target: CurrencyCode, rate: f64) -> RateQuote {
        RateQuote { base, target, rate }
    }

    #[tokio::test]
    async fn test_fetch_returns_quotes_for_requested_targets() {
        let router = Router::new().route(
            "/v4/latest/{base}",
            get(|Path(base): Path<String>| async move {
                assert_eq!(base, "USD");
                Json(serde_json::json!({
                    "base": "USD",
                    "rates": { "EUR": 0.92, "GBP": 0.78, "JPY": 147.1 }
                }))
            }),
        );
        let url = spawn_server(router).await;

        let fetcher = HttpRateFetcher::new(url, Arc::new(FixedSecrets));
        let quotes = fetcher
            .fetch_rates(&group(
                CurrencyCode::USD,
                vec![CurrencyCode::EUR, CurrencyCode::GBP],
            ))
            .await
            .unwrap();

        // JPY was quoted but not requested; it must not leak through.
        assert_eq!(
            quotes,
            vec![
                quote(CurrencyCode::USD, CurrencyCode::EUR, 0.92),
                quote(CurrencyCode::USD, CurrencyCode::GBP, 0.78),
            ]
        );
    }

    #[tokio::test]
    async fn test_targets_missing_from_payload_are_skipped() {
        let router = Router::new().route(
            "/v4/latest/{base}",
            get(|| async { Json(serde_json::json!({ "rates": { "EUR": 0.92 } })) }),
        );
        let url = spawn_server(router).await;

        let fetcher = HttpRateFetcher::new(url, Arc::new(FixedSecrets));
        let quotes = fetcher
            .fetch_rates(&group(
                CurrencyCode::USD,
                vec![CurrencyCode::EUR, CurrencyCode::GBP],
            ))
            .await
            .unwrap();

        assert_eq!(quotes, vec![quote(CurrencyCode::USD, CurrencyCode::EUR, 0.92)]);
    }

    #[tokio::test]
    async fn test_error_status_yields_empty_group() {
        let router = Router::new().route(
            "/v4/latest/{base}",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let url = spawn_server(router).await;

        let fetcher = HttpRateFetcher::new(url, Arc::new(FixedSecrets));
        let quotes = fetcher
            .fetch_rates(&group(CurrencyCode::USD, vec![CurrencyCode::EUR]))
            .await
            .unwrap();

        assert!(quotes.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_provider_yields_empty_group() {
        // Nothing listens on port 1.
        let fetcher = HttpRateFetcher::new("http://127.0.0.1:1", Arc::new(FixedSecrets));
        let quotes = fetcher
            .fetch_rates(&group(CurrencyCode::USD, vec![CurrencyCode::EUR]))
            .await
            .unwrap();

        assert!(quotes.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_body_yields_empty_group() {
        let router = Router::new().route("/v4/latest/{base}", get(|| async { "not json" }));
        let url = spawn_server(router).await;

        let fetcher = HttpRateFetcher::new(url, Arc::new(FixedSecrets));
        let quotes = fetcher
            .fetch_rates(&group(CurrencyCode::USD, vec![CurrencyCode::EUR]))
            .await
            .unwrap();

        assert!(quotes.is_empty());
    }

    #[tokio::test]
    async fn test_request_carries_bearer_token() {
        let router = Router::new().route(
            "/v4/latest/{base}",
            get(|headers: HeaderMap| async move {
                let authorized = headers
                    .get("authorization")
                    .map(|v| v == "Bearer test-key")
                    .unwrap_or(false);
                if authorized {
                    Json(serde_json::json!({ "rates": { "EUR": 0.92 } }))
                } else {
                    Json(serde_json::json!({ "rates": {} }))
                }
            }),
        );
        let url = spawn_server(router).await;

        let fetcher = HttpRateFetcher::new(url, Arc::new(FixedSecrets));
        let quotes = fetcher
            .fetch_rates(&group(CurrencyCode::USD, vec![CurrencyCode::EUR]))
            .await
            .unwrap();

        assert_eq!(quotes.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_fatal() {
        let fetcher = HttpRateFetcher::new("http://127.0.0.1:1", Arc::new(MissingSecrets));
        let result = fetcher
            .fetch_rates(&group(CurrencyCode::USD, vec![CurrencyCode::EUR]))
            .await;

        assert!(matches!(result, Err(FetchError::Credential(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let fetcher = HttpRateFetcher::new("http://localhost:9000/", Arc::new(FixedSecrets));
        assert_eq!(fetcher.base_url, "http://localhost:9000");
    }
}
