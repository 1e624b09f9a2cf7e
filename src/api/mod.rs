//! HTTP API server
//!
//! Hosts the VK callback endpoint and a liveness probe.

pub mod health;
pub mod webhook;

use std::sync::Arc;

use axum::Router;
use axum::routing::post;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::dispatch::WebhookDispatcher;

/// Shared server state
pub struct ApiState {
    /// Webhook dispatcher owning the bridge pipeline
    pub dispatcher: WebhookDispatcher,
}

/// Build the router with all routes
#[must_use]
pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/webhook",
            post(webhook::receive).get(webhook::receive_query),
        )
        .with_state(state)
        .merge(health::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a server over a dispatcher
    #[must_use]
    pub fn new(dispatcher: WebhookDispatcher, port: u16) -> Self {
        Self {
            state: Arc::new(ApiState { dispatcher }),
            port,
        }
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run.
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}
