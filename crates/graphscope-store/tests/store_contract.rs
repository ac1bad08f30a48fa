//! Contract tests run against both store backends
//!
//! Every assertion here must hold for the in-memory store and the SQLite
//! store alike, including ordering.

use graphscope_core::{GraphData, GraphStore, Link, Node};
use graphscope_store::{InMemoryGraphStore, SqliteGraphStore, SyntheticGraph};
use pretty_assertions::assert_eq;

// =============================================================================
// Helper Functions
// =============================================================================

fn sample_graph() -> GraphData {
    GraphData::new(
        vec![
            Node::new("rule_A", "rule", "first rule"),
            Node::new("data_b", "data", "some data"),
            Node::new("Rule_C", "rule", "contains data_b in description"),
        ],
        vec![
            Link::new("rule_A", "data_b", "output"),
            Link::new("data_b", "Rule_C", "input"),
            Link::new("rule_A", "Rule_C", "contains"),
            Link::new("Rule_C", "missing", "output"),
            Link::new("rule_A", "data_b", "output"),
        ],
    )
}

/// Run a check against both backends loaded with the same graph
fn for_each_backend(graph: GraphData, check: impl Fn(&dyn GraphStore)) {
    let memory = InMemoryGraphStore::from_graph(graph.clone());
    check(&memory);

    let dir = tempfile::tempdir().unwrap();
    let sqlite = SqliteGraphStore::open(dir.path().join("graph.db")).unwrap();
    sqlite.load(&graph).unwrap();
    check(&sqlite);
}

// =============================================================================
// Contract
// =============================================================================

#[test]
fn counts_include_dangling_and_duplicate_links() {
    for_each_backend(sample_graph(), |store| {
        assert_eq!(store.get_node_count().unwrap(), 3, "{}", store.name());
        assert_eq!(store.get_link_count().unwrap(), 5, "{}", store.name());
    });
}

#[test]
fn node_ids_in_insertion_order() {
    for_each_backend(sample_graph(), |store| {
        assert_eq!(
            store.get_node_ids().unwrap(),
            vec!["rule_A", "data_b", "Rule_C"],
            "{}",
            store.name()
        );
    });
}

#[test]
fn absent_node_is_none_not_error() {
    for_each_backend(sample_graph(), |store| {
        assert_eq!(store.get_node_by_id("missing").unwrap(), None);
        assert!(!store.contains_node("missing").unwrap());
        assert!(store.contains_node("rule_A").unwrap());
    });
}

#[test]
fn outgoing_links_in_insertion_order() {
    for_each_backend(sample_graph(), |store| {
        assert_eq!(
            store.get_outgoing_links("rule_A").unwrap(),
            vec![
                Link::new("rule_A", "data_b", "output"),
                Link::new("rule_A", "Rule_C", "contains"),
                Link::new("rule_A", "data_b", "output"),
            ],
            "{}",
            store.name()
        );
    });
}

#[test]
fn incoming_links_include_dangling_targets() {
    for_each_backend(sample_graph(), |store| {
        assert_eq!(
            store.get_incoming_links("missing").unwrap(),
            vec![Link::new("Rule_C", "missing", "output")]
        );
        assert!(store.get_incoming_links("rule_A").unwrap().is_empty());
        assert!(store.get_outgoing_links("nowhere").unwrap().is_empty());
    });
}

#[test]
fn search_matches_ids_case_insensitively() {
    for_each_backend(sample_graph(), |store| {
        let ids: Vec<String> = store
            .search_nodes("RULE", 30)
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["rule_A", "Rule_C"], "{}", store.name());
    });
}

#[test]
fn search_ignores_descriptions() {
    for_each_backend(sample_graph(), |store| {
        let ids: Vec<String> = store
            .search_nodes("data_b", 30)
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["data_b"], "{}", store.name());
    });
}

#[test]
fn empty_search_term_matches_all_nodes() {
    for_each_backend(sample_graph(), |store| {
        assert_eq!(store.search_nodes("", 30).unwrap().len(), 3);
        assert_eq!(store.search_nodes("", 1).unwrap().len(), 1);
    });
}

#[test]
fn search_limit_caps_large_graphs() {
    let graph = SyntheticGraph::new(100).with_seed(11).with_id_prefix("node_").generate();

    for_each_backend(graph, |store| {
        let hits = store.search_nodes("node_", 30).unwrap();
        assert_eq!(hits.len(), 30, "{}", store.name());
        assert_eq!(hits[0].id, "node_1");
    });
}

#[test]
fn sqlite_export_matches_loaded_graph() {
    let graph = SyntheticGraph::new(40).with_seed(5).generate();

    let dir = tempfile::tempdir().unwrap();
    let sqlite = SqliteGraphStore::open(dir.path().join("graph.db")).unwrap();
    sqlite.load(&graph).unwrap();

    assert_eq!(sqlite.export().unwrap(), graph);
}

#[test]
fn sqlite_load_replaces_previous_contents() {
    let dir = tempfile::tempdir().unwrap();
    let sqlite = SqliteGraphStore::open(dir.path().join("graph.db")).unwrap();

    sqlite.load(&sample_graph()).unwrap();
    sqlite
        .load(&GraphData::new(vec![Node::new("only", "data", "")], vec![]))
        .unwrap();

    assert_eq!(sqlite.get_node_ids().unwrap(), vec!["only"]);
    assert_eq!(sqlite.get_link_count().unwrap(), 0);
}

#[test]
fn sqlite_store_is_shareable_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    let sqlite = std::sync::Arc::new(SqliteGraphStore::open(dir.path().join("graph.db")).unwrap());
    sqlite.load(&sample_graph()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = std::sync::Arc::clone(&sqlite);
            std::thread::spawn(move || store.get_outgoing_links("rule_A").unwrap().len())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 3);
    }
}
