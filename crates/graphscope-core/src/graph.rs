//! Graph data model
//!
//! Wire format is stable: `Node` and `Link` serialize their tag as `type`,
//! and `GraphStats` uses the camelCase keys the HTTP API exposes.

use serde::{Deserialize, Serialize};

/// Node identifier
pub type NodeId = String;

/// A graph entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique key
    pub id: NodeId,

    /// Open-ended type tag (e.g. "rule", "data")
    #[serde(rename = "type")]
    pub node_type: String,

    /// Free-text description
    #[serde(default)]
    pub description: String,
}

impl Node {
    /// Create a new node
    pub fn new(
        id: impl Into<NodeId>,
        node_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            description: description.into(),
        }
    }
}

/// A directed, typed edge between two node ids
///
/// Links have no identity beyond the `(source, target, type)` triple, which is
/// what `Eq` and `Hash` compare. Endpoints may reference nodes that do not
/// exist in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,

    /// Edge label (e.g. "output", "input", "contains")
    #[serde(rename = "type")]
    pub link_type: String,
}

impl Link {
    /// Create a new link
    pub fn new(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        link_type: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            link_type: link_type.into(),
        }
    }
}

/// A whole graph, used to load and export stores
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<Node>,

    #[serde(default)]
    pub links: Vec<Link>,
}

impl GraphData {
    /// Create a graph from its parts
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self { nodes, links }
    }

    /// Load a graph from a JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::StoreError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| crate::StoreError::Io(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&contents)
    }

    /// Parse a graph from a JSON string
    pub fn from_json(json: &str) -> Result<Self, crate::StoreError> {
        serde_json::from_str(json).map_err(|e| crate::StoreError::Serialization(e.to_string()))
    }

    /// Save to a JSON file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), crate::StoreError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| crate::StoreError::Serialization(e.to_string()))?;

        std::fs::write(path, json)
            .map_err(|e| crate::StoreError::Io(format!("{}: {}", path.display(), e)))
    }
}

/// Node and link totals reported by `/api/init`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub link_count: usize,
}

/// Result of a neighborhood extraction
///
/// Nodes are unique by id and links unique by their triple, both in
/// first-discovery order. `truncated` is set when a result ceiling stopped the
/// traversal early and is omitted from JSON otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subgraph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub truncated: bool,
}

impl Subgraph {
    /// Check whether a node id is part of the result
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Node ids in result order
    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// Serialize to a pretty JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn node_serializes_type_field() {
        let node = Node::new("1", "rule", "first");
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"id": "1", "type": "rule", "description": "first"})
        );
    }

    #[test]
    fn link_identity_is_the_triple() {
        let a = Link::new("1", "2", "output");
        let b = Link::new("1", "2", "output");
        let c = Link::new("1", "2", "input");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn stats_use_camel_case() {
        let stats = GraphStats { node_count: 3, link_count: 5 };
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(json, r#"{"nodeCount":3,"linkCount":5}"#);
    }

    #[test]
    fn truncated_flag_only_when_set() {
        let mut subgraph = Subgraph::default();
        let json = serde_json::to_value(&subgraph).unwrap();
        assert_eq!(json, serde_json::json!({"nodes": [], "links": []}));

        subgraph.truncated = true;
        let json = serde_json::to_value(&subgraph).unwrap();
        assert_eq!(json["truncated"], serde_json::json!(true));
    }

    #[test]
    fn graph_data_from_json_defaults_description() {
        let graph = GraphData::from_json(
            r#"{
                "nodes": [{"id": "a", "type": "data"}],
                "links": [{"source": "a", "target": "b", "type": "output"}]
            }"#,
        )
        .unwrap();

        assert_eq!(graph.nodes, vec![Node::new("a", "data", "")]);
        assert_eq!(graph.links, vec![Link::new("a", "b", "output")]);
    }

    #[test]
    fn graph_data_rejects_malformed_json() {
        let err = GraphData::from_json("{not json").unwrap_err();
        assert!(matches!(err, crate::StoreError::Serialization(_)));
    }
}
