//! GraphScope Core
//!
//! Domain model shared by every GraphScope crate: nodes, links, extracted
//! subgraphs, the `GraphStore` contract that traversal runs against, and the
//! `graphscope.toml` configuration schema.

pub mod graph;
pub mod store;
pub mod config;

pub use graph::{GraphData, GraphStats, Link, Node, NodeId, Subgraph};
pub use store::{GraphStore, StoreError, DEFAULT_SEARCH_LIMIT};
pub use config::{
    BackendKind, Config, ConfigError, LimitsConfig, SearchConfig, SeedConfig, ServerConfig,
    StoreConfig,
};
