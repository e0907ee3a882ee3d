//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use fxrates_types::{InstanceRepository, RateFetcher, RateStoreConnector, SecretStore};

use super::handlers::{self, AppState};
use crate::engine::WorkflowEngine;
use crate::openapi::ApiDoc;

/// HTTP Server for the rate workflow API.
pub struct HttpServer<F, S, C, I>
where
    F: RateFetcher,
    S: SecretStore,
    C: RateStoreConnector,
    I: InstanceRepository,
{
    state: Arc<AppState<F, S, C, I>>,
}

impl<F, S, C, I> HttpServer<F, S, C, I>
where
    F: RateFetcher,
    S: SecretStore,
    C: RateStoreConnector,
    I: InstanceRepository,
{
    /// Creates a new HTTP server over the given engine.
    pub fn new(engine: Arc<WorkflowEngine<F, S, C, I>>) -> Self {
        Self {
            state: Arc::new(AppState { engine }),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        // Build HTTP metrics layer (uses globally set MeterProvider)
        let metrics = axum_otel_metrics::HttpMetricsLayerBuilder::new().build();

        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/workflows", post(handlers::start_workflow::<F, S, C, I>))
            .route(
                "/api/workflows/{id}",
                get(handlers::get_workflow::<F, S, C, I>),
            )
            .layer(metrics)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
            .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
