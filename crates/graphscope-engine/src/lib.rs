//! GraphScope engine - neighborhood queries over a graph store
//!
//! This crate implements the query logic that runs against any
//! [`GraphStore`](graphscope_core::GraphStore):
//! - Subgraph extraction (bounded bidirectional traversal)
//! - Node search for autocomplete
//! - Request validation and error classification for transports

pub mod extractor;
pub mod search;
pub mod query;

pub use extractor::{extract_subgraph, Direction, ExtractError, ExtractionLimits, SubgraphExtractor};
pub use search::NodeSearch;
pub use query::{ErrorKind, QueryError, QueryService, SearchParams, SubgraphParams, SubgraphRequest};
pub use tokio_util::sync::CancellationToken;
