//! API routes

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use graphscope_core::{GraphStats, GraphStore, NodeId, Subgraph};
use graphscope_engine::{
    CancellationToken, QueryError, QueryService, SearchParams, SubgraphParams,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

/// Decoded query string in request order; the first occurrence of a key wins
type QueryPairs = Query<Vec<(String, String)>>;

/// Query service shared by all handlers
pub type SharedService = Arc<QueryService<dyn GraphStore>>;

/// Build the API router
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/api/init", get(init))
        .route("/api/node_ids", get(node_ids))
        .route("/api/subgraph", get(subgraph))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Node and link totals
async fn init(State(service): State<SharedService>) -> Result<Json<GraphStats>, ApiError> {
    let stats = run_blocking(service, |service| service.stats()).await?;
    Ok(Json(stats))
}

/// Node ids matching `term` (empty term matches everything)
async fn node_ids(
    State(service): State<SharedService>,
    Query(pairs): QueryPairs,
) -> Result<Json<Vec<NodeId>>, ApiError> {
    let term = SearchParams::from_pairs(pairs).term.unwrap_or_default();
    let ids = run_blocking(service, move |service| service.node_ids(&term)).await?;
    Ok(Json(ids))
}

/// Neighborhood of `startNodeId`
///
/// The extraction is cancelled if the client goes away before it finishes.
async fn subgraph(
    State(service): State<SharedService>,
    Query(pairs): QueryPairs,
) -> Result<Json<Subgraph>, ApiError> {
    let params = SubgraphParams::from_pairs(pairs);
    let token = CancellationToken::new();
    let _cancel_on_drop = token.clone().drop_guard();

    let subgraph = run_blocking(service, move |service| {
        service.subgraph_with_cancellation(&params, token)
    })
    .await?;

    Ok(Json(subgraph))
}

/// Run a store-bound call off the async runtime
async fn run_blocking<T, F>(service: SharedService, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&QueryService<dyn GraphStore>) -> Result<T, QueryError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || f(&service)).await?;
    Ok(result?)
}
