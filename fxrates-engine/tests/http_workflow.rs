//! Integration tests for the workflow HTTP API.
//!
//! These tests drive the Axum router end to end with in-memory adapters
//! behind the engine, verifying status codes, response shapes, and that a
//! driven workflow becomes observable through the status endpoint.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use fxrates_engine::{WorkflowEngine, inbound::HttpServer};
use fxrates_types::{
    CurrencyCode, FetchError, FetchGroup, InstanceRepository, RateFetcher, RateQuote, RateRecord,
    RateStore, RateStoreConnector, RepoError, SecretError, SecretStore, StoreError, WorkflowId,
    WorkflowInstance,
};

/// Scripted provider serving a fixed EUR -> USD quote.
struct ScriptedFetcher {
    quotes: HashMap<CurrencyCode, Vec<RateQuote>>,
}

impl ScriptedFetcher {
    fn eur_usd() -> Self {
        let mut quotes = HashMap::new();
        quotes.insert(
            CurrencyCode::EUR,
            vec![RateQuote {
                base: CurrencyCode::EUR,
                target: CurrencyCode::USD,
                rate: 1.10,
            }],
        );
        Self { quotes }
    }
}

#[async_trait]
impl RateFetcher for ScriptedFetcher {
    async fn fetch_rates(&self, group: &FetchGroup) -> Result<Vec<RateQuote>, FetchError> {
        Ok(self.quotes.get(&group.base).cloned().unwrap_or_default())
    }
}

/// Secret store resolving every name to a fixed value.
struct StaticSecrets;

#[async_trait]
impl SecretStore for StaticSecrets {
    async fn get_secret(&self, _name: &str) -> Result<String, SecretError> {
        Ok("memory://rates".to_string())
    }
}

struct MemStore {
    docs: Mutex<BTreeMap<String, RateRecord>>,
}

#[derive(Clone)]
struct MemHandle(Arc<MemStore>);

#[async_trait]
impl RateStore for MemHandle {
    async fn upsert_rate(&self, record: &RateRecord) -> Result<(), StoreError> {
        self.0
            .docs
            .lock()
            .unwrap()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }
}

struct MemConnector(Arc<MemStore>);

#[async_trait]
impl RateStoreConnector for MemConnector {
    type Store = MemHandle;

    async fn connect(&self, _connection_string: &str) -> Result<MemHandle, StoreError> {
        Ok(MemHandle(Arc::clone(&self.0)))
    }
}

struct MemInstances {
    map: Mutex<HashMap<WorkflowId, WorkflowInstance>>,
}

#[async_trait]
impl InstanceRepository for MemInstances {
    async fn create_instance(&self, instance: &WorkflowInstance) -> Result<(), RepoError> {
        let mut map = self.map.lock().unwrap();
        if map.contains_key(&instance.id) {
            return Err(RepoError::Conflict);
        }
        map.insert(instance.id, instance.clone());
        Ok(())
    }

    async fn get_instance(&self, id: WorkflowId) -> Result<Option<WorkflowInstance>, RepoError> {
        Ok(self.map.lock().unwrap().get(&id).cloned())
    }

    async fn update_instance(
        &self,
        instance: &WorkflowInstance,
        expected_version: i64,
    ) -> Result<(), RepoError> {
        let mut map = self.map.lock().unwrap();
        match map.get(&instance.id) {
            Some(stored) if stored.version == expected_version => {
                map.insert(instance.id, instance.clone());
                Ok(())
            }
            Some(_) => Err(RepoError::Conflict),
            None => Err(RepoError::Database("instance vanished".into())),
        }
    }

    async fn list_active_instances(&self, limit: i64) -> Result<Vec<WorkflowId>, RepoError> {
        let map = self.map.lock().unwrap();
        Ok(map
            .values()
            .filter(|i| !i.is_terminal())
            .take(limit as usize)
            .map(|i| i.id)
            .collect())
    }
}

type TestEngine = WorkflowEngine<ScriptedFetcher, StaticSecrets, MemConnector, MemInstances>;

/// Builds a router plus a handle to the engine behind it.
fn test_app() -> (Router, Arc<TestEngine>) {
    let store = Arc::new(MemStore {
        docs: Mutex::new(BTreeMap::new()),
    });
    let engine = Arc::new(WorkflowEngine::new(
        Arc::new(ScriptedFetcher::eur_usd()),
        Arc::new(StaticSecrets),
        Arc::new(MemConnector(store)),
        Arc::new(MemInstances {
            map: Mutex::new(HashMap::new()),
        }),
    ));
    let server = HttpServer::new(Arc::clone(&engine));
    (server.router(), engine)
}

fn start_request(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/workflows")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn status_request(id: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/api/workflows/{}", id))
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _engine) = test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_start_workflow_returns_accepted() {
    let (app, _engine) = test_app();

    let response = app
        .oneshot(start_request(r#"{"currencies": ["EUR", "USD"]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = json_body(response).await;
    assert_eq!(json["status"], "STARTED");

    let id = json["id"].as_str().unwrap();
    assert!(id.parse::<WorkflowId>().is_ok());
    assert_eq!(
        json["status_url"].as_str().unwrap(),
        format!("/api/workflows/{}", id)
    );
}

#[tokio::test]
async fn test_start_workflow_normalizes_case_and_duplicates() {
    let (app, engine) = test_app();

    let response = app
        .oneshot(start_request(r#"{"currencies": ["eur", "EUR", "usd"]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = json_body(response).await;
    let id: WorkflowId = json["id"].as_str().unwrap().parse().unwrap();

    let instance = engine.get_status(id).await.unwrap();
    assert_eq!(
        instance.currencies,
        vec![CurrencyCode::EUR, CurrencyCode::USD]
    );
}

#[tokio::test]
async fn test_start_workflow_rejects_unknown_currency() {
    let (app, _engine) = test_app();

    let response = app
        .oneshot(start_request(r#"{"currencies": ["EUR", "XXX"]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("XXX"));
    assert_eq!(json["code"], 400);
}

#[tokio::test]
async fn test_start_workflow_rejects_empty_list() {
    let (app, _engine) = test_app();

    let response = app
        .oneshot(start_request(r#"{"currencies": []}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_get_workflow_invalid_id_rejected() {
    let (app, _engine) = test_app();

    let response = app
        .oneshot(status_request("not-a-uuid"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Invalid workflow ID");
}

#[tokio::test]
async fn test_get_workflow_unknown_id_not_found() {
    let (app, _engine) = test_app();

    let response = app
        .oneshot(status_request(&WorkflowId::new().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["code"], 404);
}

#[tokio::test]
async fn test_driven_workflow_is_observable_through_status() {
    let (app, engine) = test_app();

    let response = app
        .clone()
        .oneshot(start_request(r#"{"currencies": ["EUR", "USD"]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let posted = json_body(response).await;
    let id: WorkflowId = posted["id"].as_str().unwrap().parse().unwrap();

    // Drive the instance the way the background runner would.
    engine.run(id).await.unwrap();

    let response = app
        .oneshot(status_request(&id.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "COMPLETED");
    assert_eq!(json["currencies"], serde_json::json!(["EUR", "USD"]));
    assert_eq!(json["rates_fetched"], 1);
    assert_eq!(json["rates_persisted"], 1);
    assert!(json.get("failure_reason").is_none());
    assert!(json["created_at"].as_str().is_some());
}
