//! Client example driving a complete rate workflow against a running server.
//!
//! A stub upstream provider serves fixed quotes so the example runs without
//! network access or real credentials.
//!
//! Run with: cargo run -p fxrates-app --example workflow_example --no-default-features --features sqlite

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::{Json, Router, extract::Path};
use tempfile::tempdir;
use tokio::net::TcpListener;

use fxrates_client::RatesClient;
use fxrates_engine::{WorkflowEngine, WorkflowRunner, inbound::HttpServer};
use fxrates_provider::{EnvSecretStore, HttpRateFetcher};
use fxrates_store::{StoreConnector, build_store};
use fxrates_types::WorkflowStatus;

/// Serves fixed quotes in the upstream provider's payload shape.
fn stub_provider() -> Router {
    Router::new().route(
        "/v4/latest/{base}",
        get(|Path(base): Path<String>| async move {
            let rates = match base.as_str() {
                "EUR" => serde_json::json!({ "USD": 1.0843, "GBP": 0.8561 }),
                "USD" => serde_json::json!({ "GBP": 0.7896 }),
                _ => serde_json::json!({}),
            };
            Json(serde_json::json!({ "base": base, "rates": rates }))
        }),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_env_filter("info").init();

    // Start the stub provider on an ephemeral port
    let provider_listener = TcpListener::bind("127.0.0.1:0").await?;
    let provider_url = format!("http://{}", provider_listener.local_addr()?);
    tokio::spawn(async move {
        axum::serve(provider_listener, stub_provider().into_make_service())
            .await
            .unwrap();
    });

    // Find an available port for the workflow service
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    let port = addr.port();
    drop(listener);

    // Two temp file-backed SQLite DBs: one for the engine's own instance
    // records, one standing in for the external rate document store.
    let tmp = tempdir()?;
    let instances_url = format!(
        "sqlite://{}?mode=rwc",
        tmp.path().join("instances.db").display()
    );
    let rates_url = format!("sqlite://{}?mode=rwc", tmp.path().join("rates.db").display());

    // The engine resolves both of these through the secret store at runtime.
    unsafe {
        std::env::set_var("EXCHANGE_RATE_API_KEY", "demo-key");
        std::env::set_var("COSMOS_DB_CONNECTION_STRING", &rates_url);
    }

    println!("🚀 Starting server on port {port}...");
    println!("   Provider stub: {provider_url}");
    println!("   Instance repository: {instances_url}");
    println!("   Rate store: {rates_url}");

    // Build the instance repository (handles connection and migration)
    let instances = Arc::new(build_store(&instances_url).await?);

    // Wire the engine and start the runner
    let secrets = Arc::new(EnvSecretStore::new());
    let fetcher = Arc::new(HttpRateFetcher::new(&provider_url, Arc::clone(&secrets)));
    let connector = Arc::new(StoreConnector::new());
    let engine = Arc::new(WorkflowEngine::new(fetcher, secrets, connector, instances));

    let runner = WorkflowRunner::new(Arc::clone(&engine));
    tokio::spawn(runner.run());

    // Start server in background
    let server = HttpServer::new(engine);
    let router = server.router();

    let server_addr = format!("127.0.0.1:{port}");
    tokio::spawn(async move {
        axum::serve(
            TcpListener::bind(&server_addr).await.unwrap(),
            router.into_make_service(),
        )
        .await
        .unwrap();
    });

    // Wait for server to start
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;

    // Create client
    let base_url = format!("http://127.0.0.1:{port}");
    let client = RatesClient::new(&base_url);

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: Full workflow flow
    // ─────────────────────────────────────────────────────────────────────────

    // Health check
    let healthy = client.health().await?;
    println!("✅ Server healthy: {healthy}");

    // Start a workflow for three currencies (three unique pairs)
    let started = client.start_workflow(&["EUR", "USD", "GBP"]).await?;
    println!("✅ Workflow accepted: {} ({})", started.id, started.status);
    println!("   Poll at: {}", started.status_url);

    // The background runner picks the instance up; wait for it to finish
    let finished = client
        .wait_until_terminal(started.id, Duration::from_millis(200))
        .await?;
    println!("✅ Workflow finished: {}", finished.status);
    println!(
        "   Quotes fetched: {}, records persisted: {}",
        finished.rates_fetched, finished.rates_persisted
    );

    anyhow::ensure!(
        finished.status == WorkflowStatus::Completed,
        "workflow failed: {:?}",
        finished.error
    );

    // Read the documents back from the rate store
    let rates = build_store(&rates_url).await?;
    println!("\n📋 Stored rate documents:");
    for id in ["EUR_GBP", "EUR_USD", "GBP_USD"] {
        if let Some(doc) = rates.get_rate(id).await? {
            println!(
                "   - {}: {} -> {} at {} (stamped {})",
                doc.id, doc.from, doc.to, doc.rate, doc.timestamp
            );
        }
    }
    println!("   Total documents: {}", rates.count_rates().await?);

    println!("\n🎉 Example completed successfully!");

    Ok(())
}
