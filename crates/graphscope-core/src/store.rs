//! Graph store contract
//!
//! Every backend (in-memory, SQLite) implements [`GraphStore`]. Absent data is
//! never an error: lookups return `None` or an empty `Vec`. `StoreError` is
//! reserved for backend I/O faults.

use crate::graph::{GraphStats, Link, Node};

/// Default number of matches returned by [`GraphStore::search_nodes`]
pub const DEFAULT_SEARCH_LIMIT: usize = 30;

/// Errors raised by a store backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend temporarily unreachable (busy, locked, cannot open)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Persisted data is damaged or not a graph store
    #[error("Store corrupt: {0}")]
    Corrupt(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Read contract consumed by subgraph extraction and node search
///
/// Ordering is part of the contract: node enumeration and search follow node
/// insertion order, adjacency queries follow link insertion order. Extraction
/// truncates adjacency lists to their first `edge_limit` entries, so backends
/// that agree on order produce identical subgraphs.
///
/// Implementations must be safe for concurrent readers.
pub trait GraphStore: Send + Sync {
    /// Backend name for logs (e.g. "memory", "sqlite")
    fn name(&self) -> &'static str;

    /// Look up a node by id
    fn get_node_by_id(&self, id: &str) -> Result<Option<Node>, StoreError>;

    /// Links whose `source` is `id`
    fn get_outgoing_links(&self, id: &str) -> Result<Vec<Link>, StoreError>;

    /// Links whose `target` is `id`
    fn get_incoming_links(&self, id: &str) -> Result<Vec<Link>, StoreError>;

    /// All node ids
    fn get_node_ids(&self) -> Result<Vec<String>, StoreError>;

    fn get_node_count(&self) -> Result<usize, StoreError>;

    fn get_link_count(&self) -> Result<usize, StoreError>;

    /// Case-insensitive (ASCII) substring match against node ids only
    ///
    /// Returns at most `limit` nodes, unranked. An empty `term` matches every
    /// node.
    fn search_nodes(&self, term: &str, limit: usize) -> Result<Vec<Node>, StoreError>;

    /// Whether a node with this id exists
    fn contains_node(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.get_node_by_id(id)?.is_some())
    }

    /// Node and link totals
    fn stats(&self) -> Result<GraphStats, StoreError> {
        Ok(GraphStats {
            node_count: self.get_node_count()?,
            link_count: self.get_link_count()?,
        })
    }
}

impl<S: GraphStore + ?Sized> GraphStore for std::sync::Arc<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn get_node_by_id(&self, id: &str) -> Result<Option<Node>, StoreError> {
        (**self).get_node_by_id(id)
    }

    fn get_outgoing_links(&self, id: &str) -> Result<Vec<Link>, StoreError> {
        (**self).get_outgoing_links(id)
    }

    fn get_incoming_links(&self, id: &str) -> Result<Vec<Link>, StoreError> {
        (**self).get_incoming_links(id)
    }

    fn get_node_ids(&self) -> Result<Vec<String>, StoreError> {
        (**self).get_node_ids()
    }

    fn get_node_count(&self) -> Result<usize, StoreError> {
        (**self).get_node_count()
    }

    fn get_link_count(&self) -> Result<usize, StoreError> {
        (**self).get_link_count()
    }

    fn search_nodes(&self, term: &str, limit: usize) -> Result<Vec<Node>, StoreError> {
        (**self).search_nodes(term, limit)
    }
}
