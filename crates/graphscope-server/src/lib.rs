//! GraphScope HTTP API
//!
//! Exposes the query façade over HTTP:
//!
//! | Route | Params | Body |
//! |---|---|---|
//! | `GET /api/init` | | `{nodeCount, linkCount}` |
//! | `GET /api/node_ids` | `term` | `["id", ...]` |
//! | `GET /api/subgraph` | `startNodeId`, `forwardDepth`, `backwardDepth`, `edgeLimit` | `{nodes, links}` |
//!
//! Failures are `{"error": "..."}` with 400 for invalid parameters, 503 when
//! the store is busy, 504 when an extraction runs past its deadline and 500
//! for anything else.

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{router, SharedService};

use anyhow::Context;

/// Bind `host:port` and serve until Ctrl-C
pub async fn serve(service: SharedService, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(%addr, store = service.store().name(), "GraphScope API listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("GraphScope API stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
