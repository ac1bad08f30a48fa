//! Query façade
//!
//! Turns raw, untyped request parameters into validated calls against the
//! engine and classifies every failure, so transports (HTTP, CLI) only decide
//! how to render an error, never what it means.
//!
//! Validation messages are part of the public API:
//!
//! | Condition | Message |
//! |---|---|
//! | depth or edge limit missing / not an integer | `Invalid parameter types` |
//! | start node missing or unknown | `Invalid start node ID` |
//! | either depth below zero | `Depth cannot be negative` |
//! | edge limit zero or below | `Edge limit must be positive` |
//!
//! Checks run in that order.

use graphscope_core::{
    Config, GraphStats, GraphStore, NodeId, StoreError, Subgraph, DEFAULT_SEARCH_LIMIT,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::extractor::{ExtractError, ExtractionLimits, SubgraphExtractor};
use crate::search::NodeSearch;

/// Raw `/api/subgraph` parameters, exactly as received
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphParams {
    pub start_node_id: Option<String>,
    pub forward_depth: Option<String>,
    pub backward_depth: Option<String>,
    pub edge_limit: Option<String>,
}

impl SubgraphParams {
    /// Build parameters from string values
    pub fn new(
        start_node_id: impl Into<String>,
        forward_depth: impl Into<String>,
        backward_depth: impl Into<String>,
        edge_limit: impl Into<String>,
    ) -> Self {
        Self {
            start_node_id: Some(start_node_id.into()),
            forward_depth: Some(forward_depth.into()),
            backward_depth: Some(backward_depth.into()),
            edge_limit: Some(edge_limit.into()),
        }
    }

    /// Collect parameters from decoded query pairs
    ///
    /// The first occurrence of a repeated key wins; unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();

        for (key, value) in pairs {
            let slot = match key.as_str() {
                "startNodeId" => &mut params.start_node_id,
                "forwardDepth" => &mut params.forward_depth,
                "backwardDepth" => &mut params.backward_depth,
                "edgeLimit" => &mut params.edge_limit,
                _ => continue,
            };

            if slot.is_none() {
                *slot = Some(value);
            }
        }

        params
    }

    /// Validate against `store`
    pub fn validate<S: GraphStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<SubgraphRequest, QueryError> {
        let forward_depth = parse_integer(self.forward_depth.as_deref())?;
        let backward_depth = parse_integer(self.backward_depth.as_deref())?;
        let edge_limit = parse_integer(self.edge_limit.as_deref())?;

        let start_node_id = match self.start_node_id.as_deref() {
            Some(id) if store.contains_node(id)? => id.to_string(),
            _ => return Err(QueryError::InvalidStartNode),
        };

        if forward_depth < 0 || backward_depth < 0 {
            return Err(QueryError::NegativeDepth);
        }

        if edge_limit <= 0 {
            return Err(QueryError::NonPositiveEdgeLimit);
        }

        Ok(SubgraphRequest {
            start_node_id,
            forward_depth: to_usize(forward_depth)?,
            backward_depth: to_usize(backward_depth)?,
            edge_limit: to_usize(edge_limit)?,
        })
    }
}

/// Raw `/api/node_ids` parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub term: Option<String>,
}

impl SearchParams {
    /// Collect parameters from decoded query pairs, first `term` wins
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let term = pairs
            .into_iter()
            .find(|(key, _)| key == "term")
            .map(|(_, value)| value);

        Self { term }
    }
}

/// A validated subgraph request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubgraphRequest {
    pub start_node_id: NodeId,
    pub forward_depth: usize,
    pub backward_depth: usize,
    pub edge_limit: usize,
}

/// How a transport should treat a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request parameters (HTTP 400)
    Validation,

    /// Backend busy or request cancelled; retrying may succeed (HTTP 503)
    Unavailable,

    /// Deadline exceeded (HTTP 504)
    Timeout,

    /// Backend fault (HTTP 500)
    Internal,
}

/// Errors returned by the query façade
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid start node ID")]
    InvalidStartNode,

    #[error("Depth cannot be negative")]
    NegativeDepth,

    #[error("Edge limit must be positive")]
    NonPositiveEdgeLimit,

    #[error("Invalid parameter types")]
    InvalidParameterTypes,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Extract(ExtractError),
}

impl From<ExtractError> for QueryError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Store(store) => QueryError::Store(store),
            other => QueryError::Extract(other),
        }
    }
}

impl QueryError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::InvalidStartNode
            | QueryError::NegativeDepth
            | QueryError::NonPositiveEdgeLimit
            | QueryError::InvalidParameterTypes => ErrorKind::Validation,
            QueryError::Store(err) | QueryError::Extract(ExtractError::Store(err)) => {
                if err.is_retryable() {
                    ErrorKind::Unavailable
                } else {
                    ErrorKind::Internal
                }
            }
            QueryError::Extract(ExtractError::Cancelled) => ErrorKind::Unavailable,
            QueryError::Extract(ExtractError::DeadlineExceeded { .. }) => ErrorKind::Timeout,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

fn parse_integer(value: Option<&str>) -> Result<i64, QueryError> {
    value
        .map(str::trim)
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or(QueryError::InvalidParameterTypes)
}

fn to_usize(value: i64) -> Result<usize, QueryError> {
    usize::try_from(value).map_err(|_| QueryError::InvalidParameterTypes)
}

/// Entry point shared by every transport
///
/// Holds the store together with the configured extraction limits and search
/// limit. Cheap to share behind an `Arc`.
pub struct QueryService<S: GraphStore + ?Sized> {
    store: Arc<S>,
    limits: ExtractionLimits,
    search_limit: usize,
}

impl<S: GraphStore + ?Sized> QueryService<S> {
    /// Create a service with default limits
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            limits: ExtractionLimits::default(),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Create a service using the `[limits]` and `[search]` config sections
    pub fn from_config(store: Arc<S>, config: &Config) -> Self {
        Self {
            store,
            limits: ExtractionLimits::from(&config.limits),
            search_limit: config.search.limit,
        }
    }

    pub fn with_limits(mut self, limits: ExtractionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn limits(&self) -> &ExtractionLimits {
        &self.limits
    }

    /// Node and link totals
    pub fn stats(&self) -> Result<GraphStats, QueryError> {
        Ok(self.store.stats()?)
    }

    /// Ids of nodes matching `term`
    pub fn node_ids(&self, term: &str) -> Result<Vec<NodeId>, QueryError> {
        let ids = NodeSearch::new(&*self.store)
            .with_limit(self.search_limit)
            .node_ids(term)?;

        tracing::debug!(term, matches = ids.len(), "node search");

        Ok(ids)
    }

    /// Validate `params` and extract the requested subgraph
    pub fn subgraph(&self, params: &SubgraphParams) -> Result<Subgraph, QueryError> {
        self.run(params, None)
    }

    /// Like [`subgraph`](Self::subgraph), aborting once `token` is cancelled
    pub fn subgraph_with_cancellation(
        &self,
        params: &SubgraphParams,
        token: CancellationToken,
    ) -> Result<Subgraph, QueryError> {
        self.run(params, Some(token))
    }

    fn run(
        &self,
        params: &SubgraphParams,
        token: Option<CancellationToken>,
    ) -> Result<Subgraph, QueryError> {
        let request = params.validate(&*self.store).map_err(|err| {
            if err.is_validation() {
                tracing::debug!(error = %err, ?params, "subgraph request rejected");
            }
            err
        })?;

        let mut extractor = SubgraphExtractor::new(&*self.store).with_limits(self.limits);
        if let Some(token) = token {
            extractor = extractor.with_cancellation(token);
        }

        let subgraph = extractor.extract(
            &request.start_node_id,
            request.forward_depth,
            request.backward_depth,
            request.edge_limit,
        )?;

        Ok(subgraph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphscope_core::{GraphData, Link, Node};
    use graphscope_store::InMemoryGraphStore;

    fn store() -> InMemoryGraphStore {
        InMemoryGraphStore::from_graph(GraphData::new(
            vec![Node::new("1", "rule", ""), Node::new("2", "data", "")],
            vec![Link::new("1", "2", "output")],
        ))
    }

    fn validate(params: SubgraphParams) -> Result<SubgraphRequest, QueryError> {
        params.validate(&store())
    }

    #[test]
    fn valid_request() {
        let request = validate(SubgraphParams::new("1", "2", " 0 ", "+4")).unwrap();
        assert_eq!(
            request,
            SubgraphRequest {
                start_node_id: "1".to_string(),
                forward_depth: 2,
                backward_depth: 0,
                edge_limit: 4,
            }
        );
    }

    #[test]
    fn unknown_start() {
        let err = validate(SubgraphParams::new("99", "1", "1", "1")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid start node ID");
    }

    #[test]
    fn missing_start() {
        let params = SubgraphParams {
            start_node_id: None,
            ..SubgraphParams::new("", "1", "1", "1")
        };
        assert!(matches!(validate(params), Err(QueryError::InvalidStartNode)));
    }

    #[test]
    fn negative_depth() {
        let err = validate(SubgraphParams::new("1", "1", "-1", "1")).unwrap_err();
        assert_eq!(err.to_string(), "Depth cannot be negative");
    }

    #[test]
    fn zero_edge_limit() {
        let err = validate(SubgraphParams::new("1", "1", "1", "0")).unwrap_err();
        assert_eq!(err.to_string(), "Edge limit must be positive");
    }

    #[test]
    fn non_integer_depth() {
        let err = validate(SubgraphParams::new("1", "two", "1", "1")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameter types");

        let err = validate(SubgraphParams::new("1", "1.5", "1", "1")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameter types");
    }

    #[test]
    fn missing_numeric_parameter() {
        let params = SubgraphParams {
            edge_limit: None,
            ..SubgraphParams::new("1", "1", "1", "1")
        };
        assert!(matches!(validate(params), Err(QueryError::InvalidParameterTypes)));
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn repeated_keys_keep_first_value() {
        let params = SubgraphParams::from_pairs(pairs(&[
            ("startNodeId", "1"),
            ("startNodeId", "2"),
            ("forwardDepth", "1"),
            ("backwardDepth", "0"),
            ("edgeLimit", "3"),
            ("edgeLimit", "x"),
            ("callback", "ignored"),
        ]));

        assert_eq!(params, SubgraphParams::new("1", "1", "0", "3"));
    }

    #[test]
    fn absent_keys_stay_missing() {
        let params = SubgraphParams::from_pairs(pairs(&[("startNodeId", "1")]));
        assert_eq!(params.forward_depth, None);
        assert!(matches!(validate(params), Err(QueryError::InvalidParameterTypes)));
    }

    #[test]
    fn search_term_keeps_first_value() {
        let params = SearchParams::from_pairs(pairs(&[("term", "a"), ("term", "b")]));
        assert_eq!(params.term.as_deref(), Some("a"));

        assert_eq!(SearchParams::from_pairs(Vec::new()).term, None);
    }

    #[test]
    fn type_check_runs_before_start_check() {
        let err = validate(SubgraphParams::new("99", "x", "1", "1")).unwrap_err();
        assert!(matches!(err, QueryError::InvalidParameterTypes));
    }

    #[test]
    fn start_check_runs_before_range_checks() {
        let err = validate(SubgraphParams::new("99", "-1", "1", "0")).unwrap_err();
        assert!(matches!(err, QueryError::InvalidStartNode));
    }

    #[test]
    fn error_kinds() {
        assert_eq!(QueryError::NegativeDepth.kind(), ErrorKind::Validation);
        assert_eq!(
            QueryError::Store(StoreError::Unavailable("locked".into())).kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            QueryError::Store(StoreError::Corrupt("bad".into())).kind(),
            ErrorKind::Internal
        );
        assert_eq!(QueryError::from(ExtractError::Cancelled).kind(), ErrorKind::Unavailable);
        assert_eq!(
            QueryError::from(ExtractError::DeadlineExceeded {
                elapsed: std::time::Duration::from_millis(10)
            })
            .kind(),
            ErrorKind::Timeout
        );
    }

    #[test]
    fn service_runs_subgraph_query() {
        let service = QueryService::new(Arc::new(store()));

        let subgraph = service.subgraph(&SubgraphParams::new("1", "2", "2", "4")).unwrap();
        assert_eq!(subgraph.node_ids(), vec!["1", "2"]);

        let stats = service.stats().unwrap();
        assert_eq!((stats.node_count, stats.link_count), (2, 1));
    }

    #[test]
    fn service_honours_search_limit() {
        let service = QueryService::new(Arc::new(store())).with_search_limit(1);
        assert_eq!(service.node_ids("").unwrap(), vec!["1"]);
    }

    #[test]
    fn service_over_trait_object() {
        let store: Arc<dyn GraphStore> = Arc::new(store());
        let service = QueryService::new(store);
        assert_eq!(service.node_ids("2").unwrap(), vec!["2"]);
    }

    #[test]
    fn service_cancellation() {
        let service = QueryService::new(Arc::new(store()));
        let token = CancellationToken::new();
        token.cancel();

        let err = service
            .subgraph_with_cancellation(&SubgraphParams::new("1", "1", "1", "4"), token)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }
}
