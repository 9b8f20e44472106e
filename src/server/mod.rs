//! HTTP surface: the chat relay endpoint, the upstream pass-through and a
//! health probe.

pub mod chat;
pub mod error;
pub mod proxy;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{any, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::core::relay::MessageRelay;
use proxy::UpstreamProxy;

#[derive(Clone)]
pub struct AppState {
    pub relay: MessageRelay,
    /// Upper bound on one relayed run, headers and body together.
    pub max_duration: Duration,
    /// `None` leaves `/api/{*path}` unmounted.
    pub proxy: Option<Arc<UpstreamProxy>>,
}

impl AppState {
    pub fn new(relay: MessageRelay, max_duration: Duration) -> Self {
        Self {
            relay,
            max_duration,
            proxy: None,
        }
    }

    pub fn with_proxy(mut self, proxy: UpstreamProxy) -> Self {
        self.proxy = Some(Arc::new(proxy));
        self
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat::relay_chat));
    if state.proxy.is_some() {
        router = router.route("/api/{*path}", any(proxy::forward));
    }

    router
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve until Ctrl+C.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "graphchat relay listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}
