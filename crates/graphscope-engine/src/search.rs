//! Node search for autocomplete

use graphscope_core::{GraphStore, Node, NodeId, StoreError, DEFAULT_SEARCH_LIMIT};

/// Substring lookup over node ids
///
/// A pass-through to [`GraphStore::search_nodes`] with a fixed result limit.
pub struct NodeSearch<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    limit: usize,
}

impl<'a, S: GraphStore + ?Sized> NodeSearch<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Nodes whose id contains `term` (ASCII case-insensitive)
    ///
    /// An empty term matches every node, capped at the limit.
    pub fn search(&self, term: &str) -> Result<Vec<Node>, StoreError> {
        self.store.search_nodes(term, self.limit)
    }

    /// Ids of the nodes [`search`](Self::search) returns
    pub fn node_ids(&self, term: &str) -> Result<Vec<NodeId>, StoreError> {
        Ok(self.search(term)?.into_iter().map(|n| n.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphscope_store::SyntheticGraph;
    use graphscope_store::InMemoryGraphStore;

    fn store() -> InMemoryGraphStore {
        InMemoryGraphStore::from_graph(
            SyntheticGraph::new(120)
                .with_seed(3)
                .with_id_prefix("node_")
                .generate(),
        )
    }

    #[test]
    fn default_limit_is_thirty() {
        let store = store();
        assert_eq!(NodeSearch::new(&store).search("").unwrap().len(), 30);
    }

    #[test]
    fn custom_limit() {
        let store = store();
        let ids = NodeSearch::new(&store).with_limit(3).node_ids("node_1").unwrap();
        assert_eq!(ids, vec!["node_1", "node_10", "node_11"]);
    }

    #[test]
    fn no_match() {
        let store = store();
        assert!(NodeSearch::new(&store).node_ids("zzz").unwrap().is_empty());
    }
}
