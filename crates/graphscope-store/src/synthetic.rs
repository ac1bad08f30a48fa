//! Synthetic graph generator
//!
//! Builds random demo graphs for seeding stores. Kept apart from the stores
//! themselves: it only produces a [`GraphData`], which either backend can load.

use graphscope_core::{GraphData, Link, Node, SeedConfig};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const NODE_TYPES: [&str; 2] = ["rule", "data"];
const LINK_TYPES: [&str; 3] = ["output", "input", "contains"];

/// Random graph recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticGraph {
    /// Number of nodes, numbered from 1
    pub node_count: usize,

    /// Each node draws `1..=max_links_per_node` candidate links
    pub max_links_per_node: usize,

    /// Fixed seed for reproducible output
    pub seed: Option<u64>,

    /// Prefix for node ids (`"node_"` gives `node_1`, `node_2`, ...)
    pub id_prefix: String,
}

impl SyntheticGraph {
    /// Create a recipe for `node_count` nodes with default settings
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            max_links_per_node: 10,
            seed: None,
            id_prefix: String::new(),
        }
    }

    /// Create a recipe from the `[seed]` config section
    pub fn from_config(config: &SeedConfig) -> Self {
        Self {
            node_count: config.nodes,
            max_links_per_node: config.max_links_per_node,
            seed: config.seed,
            id_prefix: config.id_prefix.clone(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_links_per_node(mut self, max_links: usize) -> Self {
        self.max_links_per_node = max_links;
        self
    }

    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    /// Generate the graph
    ///
    /// Self-loops are dropped, so a node may end up with fewer links than it
    /// drew. Parallel links between the same pair are possible.
    pub fn generate(&self) -> GraphData {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut nodes = Vec::with_capacity(self.node_count);
        for i in 1..=self.node_count {
            let node_type = if rng.gen_bool(0.5) { NODE_TYPES[0] } else { NODE_TYPES[1] };
            nodes.push(Node::new(
                self.node_id(i),
                node_type,
                format!(
                    "This is {} {}. It contains some sample information about the node.",
                    node_type, i
                ),
            ));
        }

        let mut links = Vec::new();
        if self.node_count > 0 && self.max_links_per_node > 0 {
            for i in 1..=self.node_count {
                let drawn = rng.gen_range(1..=self.max_links_per_node);
                for _ in 0..drawn {
                    let target = rng.gen_range(1..=self.node_count);
                    if target == i {
                        continue;
                    }

                    let link_type = LINK_TYPES.choose(&mut rng).copied().unwrap_or(LINK_TYPES[0]);
                    links.push(Link::new(self.node_id(i), self.node_id(target), link_type));
                }
            }
        }

        tracing::debug!(
            nodes = nodes.len(),
            links = links.len(),
            seed = ?self.seed,
            "synthetic graph generated"
        );

        GraphData::new(nodes, links)
    }

    fn node_id(&self, index: usize) -> String {
        format!("{}{}", self.id_prefix, index)
    }
}
