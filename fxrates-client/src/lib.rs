//! # FX Rates Client SDK
//!
//! A typed Rust client for the FX rates workflow API.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use fxrates_types::{
    StartWorkflowRequest, StartWorkflowResponse, WorkflowId, WorkflowStatusResponse,
};

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// FX rates workflow API client.
pub struct RatesClient {
    base_url: String,
    http: Client,
}

impl RatesClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Starts a rate workflow for the given currency codes.
    ///
    /// The server accepts the workflow and returns immediately; poll
    /// [`workflow_status`](RatesClient::workflow_status) (or use
    /// [`wait_until_terminal`](RatesClient::wait_until_terminal)) for the
    /// outcome.
    pub async fn start_workflow(
        &self,
        currencies: &[&str],
    ) -> Result<StartWorkflowResponse, ClientError> {
        let req = StartWorkflowRequest {
            currencies: currencies.iter().map(|c| c.to_string()).collect(),
        };
        self.post("/api/workflows", &req).await
    }

    /// Gets the current state of a workflow instance.
    pub async fn workflow_status(
        &self,
        id: WorkflowId,
    ) -> Result<WorkflowStatusResponse, ClientError> {
        self.get(&format!("/api/workflows/{}", id)).await
    }

    /// Polls the instance until it completes or fails.
    pub async fn wait_until_terminal(
        &self,
        id: WorkflowId,
        poll: Duration,
    ) -> Result<WorkflowStatusResponse, ClientError> {
        loop {
            let status = self.workflow_status(id).await?;
            if status.status.is_terminal() {
                return Ok(status);
            }
            tokio::time::sleep(poll).await;
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = RatesClient::new("http://localhost:3000");
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_client_with_trailing_slash() {
        let client = RatesClient::new("http://localhost:3000/");
        assert_eq!(client.base_url, "http://localhost:3000");
    }
}
