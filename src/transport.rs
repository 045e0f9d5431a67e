//! Transport adapters: stdio, local HTTP, and the edge HTTP deployment.

use std::{net::SocketAddr, sync::Arc};

use axum::{Json, Router, routing::get};
use rmcp::{
    ServiceExt,
    transport::streamable_http_server::{
        StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
    },
};
use tower_http::cors::CorsLayer;

use crate::{
    oauth::{self, OAuthState},
    server::GithubServer,
};

pub async fn serve_stdio(server: GithubServer) -> anyhow::Result<()> {
    tracing::info!("serving MCP over stdio");
    let service = server.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;
    Ok(())
}

/// `/mcp` plus `/health`. Stateless: every request gets its own server
/// instance and nothing survives between requests.
pub fn http_router(server: GithubServer) -> Router {
    mcp_routes(server).layer(CorsLayer::permissive())
}

/// The HTTP routes plus the pass-through OAuth endpoints.
pub fn edge_router(server: GithubServer, oauth: OAuthState) -> Router {
    mcp_routes(server)
        .merge(oauth::router(oauth))
        .layer(CorsLayer::permissive())
}

fn mcp_routes(server: GithubServer) -> Router {
    let mcp = StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            stateful_mode: false,
            ..Default::default()
        },
    );

    Router::new()
        .route("/health", get(health))
        .nest_service("/mcp", mcp)
}

pub async fn serve_http(router: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
