//! Graph store backends
//!
//! Two interchangeable implementations of [`GraphStore`]:
//!
//! - [`InMemoryGraphStore`] - adjacency-indexed vectors, for tests, demos and
//!   graphs loaded from JSON
//! - [`SqliteGraphStore`] - persistent store in a SQLite file with indexed
//!   `nodes` and `links` tables
//!
//! Both return nodes in insertion order and adjacency lists in link insertion
//! order, so a traversal over the same graph yields the same subgraph on
//! either backend.
//!
//! [`SyntheticGraph`] builds random demo graphs to seed either backend.
//!
//! ## Example
//!
//! ```rust,ignore
//! use graphscope_store::{InMemoryGraphStore, SyntheticGraph};
//!
//! let graph = SyntheticGraph::new(1000).with_seed(7).generate();
//! let store = InMemoryGraphStore::from_graph(graph);
//! ```

pub mod memory;
pub mod sqlite;
pub mod synthetic;

pub use graphscope_core::{GraphStore, StoreError};
pub use memory::InMemoryGraphStore;
pub use sqlite::SqliteGraphStore;
pub use synthetic::SyntheticGraph;
