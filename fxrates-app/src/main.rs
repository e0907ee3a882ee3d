//! # FX Rates Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the workflow instance repository
//! - Create the workflow engine with its injected capabilities
//! - Start the background runner and the HTTP server

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fxrates_engine::{WorkflowEngine, WorkflowRunner, inbound::HttpServer};
use fxrates_provider::{EnvSecretStore, HttpRateFetcher};
use fxrates_store::{StoreConnector, build_store};

fn init_tracer() -> (sdktrace::Tracer, sdktrace::SdkTracerProvider) {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .expect("failed to create OTLP span exporter");

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    (provider.tracer("fxrates-service"), provider)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize OpenTelemetry tracing
    let (otel_tracer, otel_provider) = init_tracer();
    let telemetry = tracing_opentelemetry::layer().with_tracer(otel_tracer);

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fxrates_app=debug,fxrates_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry)
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting fxrates server on port {}", config.port);
    tracing::info!("Using instance repository: {}", config.database_url);
    tracing::info!("Using rate provider: {}", config.provider_url);

    // Build the instance repository (handles connection and migration)
    let instances = Arc::new(build_store(&config.database_url).await?);

    // Capabilities handed to the engine. The rate store itself is absent
    // on purpose: its connection string lives in the secret store and is
    // resolved by each workflow instance.
    let secrets = Arc::new(EnvSecretStore::new());
    let fetcher = Arc::new(HttpRateFetcher::new(
        &config.provider_url,
        Arc::clone(&secrets),
    ));
    let connector = Arc::new(StoreConnector::new());

    // Create the workflow engine
    let engine = Arc::new(WorkflowEngine::new(fetcher, secrets, connector, instances));

    // Start the runner that polls for active instances and drives them
    let runner = WorkflowRunner::new(Arc::clone(&engine));
    let runner_handle = tokio::spawn(runner.run());

    // Create and run the HTTP server
    let server = HttpServer::new(engine);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    // Server is down; stop driving workflows
    runner_handle.abort();

    // Ensure traces are flushed before exit
    let _ = otel_provider.shutdown();
    Ok(())
}
