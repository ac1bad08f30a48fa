//! In-memory graph store
//!
//! Nodes and links live in insertion-ordered vectors. Adjacency is indexed by
//! endpoint so lookups do not scan every link, but the order they return is
//! still link insertion order.
//!
//! The store is built with `&mut self` writers and then shared read-only
//! (typically behind an `Arc`), so reads need no locking.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use graphscope_store::InMemoryGraphStore;
//! use graphscope_core::{Link, Node};
//!
//! let mut store = InMemoryGraphStore::new();
//! store.add_node(Node::new("1", "rule", "first"));
//! store.add_node(Node::new("2", "data", "second"));
//! store.add_link(Link::new("1", "2", "output"));
//! ```

use graphscope_core::{GraphData, GraphStore, Link, Node, NodeId, StoreError};
use std::collections::HashMap;

/// Graph store held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphStore {
    /// Nodes in insertion order
    nodes: Vec<Node>,

    /// Node id -> position in `nodes`
    node_index: HashMap<NodeId, usize>,

    /// Links in insertion order
    links: Vec<Link>,

    /// Source id -> positions in `links`
    outgoing: HashMap<NodeId, Vec<usize>>,

    /// Target id -> positions in `links`
    incoming: HashMap<NodeId, Vec<usize>>,
}

impl InMemoryGraphStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a whole graph
    pub fn from_graph(graph: GraphData) -> Self {
        let mut store = Self::new();
        store.extend(graph);
        store
    }

    /// Add every node and link of a graph
    pub fn extend(&mut self, graph: GraphData) {
        for node in graph.nodes {
            self.add_node(node);
        }

        for link in graph.links {
            self.add_link(link);
        }

        tracing::debug!(
            nodes = self.nodes.len(),
            links = self.links.len(),
            "in-memory graph loaded"
        );
    }

    /// Insert a node, replacing an existing node with the same id in place
    pub fn add_node(&mut self, node: Node) {
        match self.node_index.get(&node.id) {
            Some(&position) => self.nodes[position] = node,
            None => {
                self.node_index.insert(node.id.clone(), self.nodes.len());
                self.nodes.push(node);
            }
        }
    }

    /// Append a link
    ///
    /// Endpoints are not checked against the node set; duplicates are kept.
    pub fn add_link(&mut self, link: Link) {
        let position = self.links.len();

        self.outgoing
            .entry(link.source.clone())
            .or_default()
            .push(position);
        self.incoming
            .entry(link.target.clone())
            .or_default()
            .push(position);

        self.links.push(link);
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All links in insertion order
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Copy the store's contents out as a graph
    pub fn to_graph(&self) -> GraphData {
        GraphData::new(self.nodes.clone(), self.links.clone())
    }

    fn links_at(&self, index: &HashMap<NodeId, Vec<usize>>, id: &str) -> Vec<Link> {
        index
            .get(id)
            .map(|positions| positions.iter().map(|&p| self.links[p].clone()).collect())
            .unwrap_or_default()
    }
}

impl From<GraphData> for InMemoryGraphStore {
    fn from(graph: GraphData) -> Self {
        Self::from_graph(graph)
    }
}

impl GraphStore for InMemoryGraphStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get_node_by_id(&self, id: &str) -> Result<Option<Node>, StoreError> {
        Ok(self.node_index.get(id).map(|&p| self.nodes[p].clone()))
    }

    fn get_outgoing_links(&self, id: &str) -> Result<Vec<Link>, StoreError> {
        Ok(self.links_at(&self.outgoing, id))
    }

    fn get_incoming_links(&self, id: &str) -> Result<Vec<Link>, StoreError> {
        Ok(self.links_at(&self.incoming, id))
    }

    fn get_node_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.nodes.iter().map(|n| n.id.clone()).collect())
    }

    fn get_node_count(&self) -> Result<usize, StoreError> {
        Ok(self.nodes.len())
    }

    fn get_link_count(&self) -> Result<usize, StoreError> {
        Ok(self.links.len())
    }

    fn search_nodes(&self, term: &str, limit: usize) -> Result<Vec<Node>, StoreError> {
        let needle = term.to_ascii_lowercase();

        Ok(self
            .nodes
            .iter()
            .filter(|n| n.id.to_ascii_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }

    fn contains_node(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.node_index.contains_key(id))
    }
}
