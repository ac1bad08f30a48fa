//! SQLite graph store
//!
//! Persists the graph in two relations:
//!
//! ```sql
//! nodes(id TEXT PRIMARY KEY, type TEXT, description TEXT)
//! links(id INTEGER PRIMARY KEY AUTOINCREMENT, source TEXT, target TEXT, type TEXT)
//! ```
//!
//! `links.source` / `links.target` declare foreign keys to `nodes`, but SQLite
//! does not enforce them unless `PRAGMA foreign_keys` is on, which this store
//! never does: dangling links are legal. Both link columns are indexed.
//!
//! Every call opens its own connection (read-only for queries), so one store
//! can be shared across threads without sharing a cursor. This requires a file
//! path; `:memory:` databases are not supported.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use graphscope_store::SqliteGraphStore;
//!
//! let store = SqliteGraphStore::open("graph.db")?;
//! store.load(&graph)?;
//! let node = store.get_node_by_id("node_1")?;
//! ```

use graphscope_core::{GraphData, GraphStore, Link, Node, StoreError};
use rusqlite::{params, Connection, ErrorCode, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS nodes (
    id TEXT PRIMARY KEY,
    type TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT,
    target TEXT,
    type TEXT,
    FOREIGN KEY (source) REFERENCES nodes (id),
    FOREIGN KEY (target) REFERENCES nodes (id)
);

CREATE INDEX IF NOT EXISTS idx_links_source ON links (source);
CREATE INDEX IF NOT EXISTS idx_links_target ON links (target);
";

const UPSERT_NODE_SQL: &str = "
INSERT INTO nodes (id, type, description) VALUES (?1, ?2, ?3)
ON CONFLICT (id) DO UPDATE SET type = excluded.type, description = excluded.description";

const INSERT_LINK_SQL: &str = "INSERT INTO links (source, target, type) VALUES (?1, ?2, ?3)";

const SELECT_NODE_SQL: &str = "SELECT id, type, description FROM nodes WHERE id = ?1";

const SELECT_NODES_SQL: &str = "SELECT id, type, description FROM nodes ORDER BY rowid";

const SELECT_NODE_IDS_SQL: &str = "SELECT id FROM nodes ORDER BY rowid";

const SELECT_OUTGOING_SQL: &str =
    "SELECT source, target, type FROM links WHERE source = ?1 ORDER BY id";

const SELECT_INCOMING_SQL: &str =
    "SELECT source, target, type FROM links WHERE target = ?1 ORDER BY id";

const SELECT_LINKS_SQL: &str = "SELECT source, target, type FROM links ORDER BY id";

// instr() keeps '%' and '_' in the term literal, unlike LIKE.
const SEARCH_NODES_SQL: &str = "
SELECT id, type, description FROM nodes
WHERE instr(LOWER(id), LOWER(?1)) > 0
ORDER BY rowid
LIMIT ?2";

/// Busy timeout applied to every connection
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Graph store backed by a SQLite file
#[derive(Debug, Clone)]
pub struct SqliteGraphStore {
    path: PathBuf,
}

impl SqliteGraphStore {
    /// Open (or create) a store at `path`, creating tables if absent
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };

        let conn = store.write_connection()?;
        conn.execute_batch(SCHEMA_SQL).map_err(store_error)?;

        tracing::debug!(path = %store.path.display(), "sqlite graph store opened");

        Ok(store)
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete every node and link
    pub fn truncate(&self) -> Result<(), StoreError> {
        let conn = self.write_connection()?;
        conn.execute_batch("DELETE FROM links; DELETE FROM nodes;")
            .map_err(store_error)
    }

    /// Insert a node, replacing the fields of an existing node with the same id
    pub fn add_node(&self, node: &Node) -> Result<(), StoreError> {
        let conn = self.write_connection()?;
        conn.execute(UPSERT_NODE_SQL, params![node.id, node.node_type, node.description])
            .map_err(store_error)?;
        Ok(())
    }

    /// Append a link
    pub fn add_link(&self, link: &Link) -> Result<(), StoreError> {
        let conn = self.write_connection()?;
        conn.execute(INSERT_LINK_SQL, params![link.source, link.target, link.link_type])
            .map_err(store_error)?;
        Ok(())
    }

    /// Replace the store's contents with `graph` in a single transaction
    pub fn load(&self, graph: &GraphData) -> Result<(), StoreError> {
        let mut conn = self.write_connection()?;
        let tx = conn.transaction().map_err(store_error)?;

        tx.execute_batch("DELETE FROM links; DELETE FROM nodes;")
            .map_err(store_error)?;

        {
            let mut insert_node = tx.prepare(UPSERT_NODE_SQL).map_err(store_error)?;
            for node in &graph.nodes {
                insert_node
                    .execute(params![node.id, node.node_type, node.description])
                    .map_err(store_error)?;
            }

            let mut insert_link = tx.prepare(INSERT_LINK_SQL).map_err(store_error)?;
            for link in &graph.links {
                insert_link
                    .execute(params![link.source, link.target, link.link_type])
                    .map_err(store_error)?;
            }
        }

        tx.commit().map_err(store_error)?;

        tracing::info!(
            path = %self.path.display(),
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            "sqlite graph store loaded"
        );

        Ok(())
    }

    /// Read the whole graph back out
    pub fn export(&self) -> Result<GraphData, StoreError> {
        let conn = self.read_connection()?;

        let nodes = query_all(&conn, SELECT_NODES_SQL, [], row_to_node)?;
        let links = query_all(&conn, SELECT_LINKS_SQL, [], row_to_link)?;

        Ok(GraphData::new(nodes, links))
    }

    fn write_connection(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path).map_err(store_error)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(store_error)?;
        Ok(conn)
    }

    fn read_connection(&self) -> Result<Connection, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.path, flags).map_err(store_error)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(store_error)?;
        Ok(conn)
    }

    fn count(&self, sql: &str) -> Result<usize, StoreError> {
        let conn = self.read_connection()?;
        let count: i64 = conn
            .query_row(sql, [], |row| row.get(0))
            .map_err(store_error)?;

        usize::try_from(count).map_err(|_| StoreError::Corrupt(format!("negative count {}", count)))
    }
}

impl GraphStore for SqliteGraphStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn get_node_by_id(&self, id: &str) -> Result<Option<Node>, StoreError> {
        let conn = self.read_connection()?;
        conn.query_row(SELECT_NODE_SQL, params![id], row_to_node)
            .optional()
            .map_err(store_error)
    }

    fn get_outgoing_links(&self, id: &str) -> Result<Vec<Link>, StoreError> {
        let conn = self.read_connection()?;
        query_all(&conn, SELECT_OUTGOING_SQL, params![id], row_to_link)
    }

    fn get_incoming_links(&self, id: &str) -> Result<Vec<Link>, StoreError> {
        let conn = self.read_connection()?;
        query_all(&conn, SELECT_INCOMING_SQL, params![id], row_to_link)
    }

    fn get_node_ids(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.read_connection()?;
        query_all(&conn, SELECT_NODE_IDS_SQL, [], |row| row.get(0))
    }

    fn get_node_count(&self) -> Result<usize, StoreError> {
        self.count("SELECT COUNT(*) FROM nodes")
    }

    fn get_link_count(&self) -> Result<usize, StoreError> {
        self.count("SELECT COUNT(*) FROM links")
    }

    fn search_nodes(&self, term: &str, limit: usize) -> Result<Vec<Node>, StoreError> {
        let conn = self.read_connection()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        query_all(&conn, SEARCH_NODES_SQL, params![term, limit], row_to_node)
    }
}

fn query_all<T, P, F>(conn: &Connection, sql: &str, params: P, map: F) -> Result<Vec<T>, StoreError>
where
    P: rusqlite::Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql).map_err(store_error)?;
    let rows = stmt.query_map(params, map).map_err(store_error)?;

    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(store_error)
}

fn row_to_node(row: &Row<'_>) -> rusqlite::Result<Node> {
    Ok(Node {
        id: row.get(0)?,
        node_type: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
    })
}

fn row_to_link(row: &Row<'_>) -> rusqlite::Result<Link> {
    Ok(Link {
        source: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
        target: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        link_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
    })
}

/// Classify a SQLite error as retryable or fatal
fn store_error(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen => {
                StoreError::Unavailable(err.to_string())
            }
            ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase => {
                StoreError::Corrupt(err.to_string())
            }
            ErrorCode::SystemIoFailure | ErrorCode::DiskFull => StoreError::Io(err.to_string()),
            _ => StoreError::Query(err.to_string()),
        },
        _ => StoreError::Query(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_store() -> (tempfile::TempDir, SqliteGraphStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteGraphStore::open(dir.path().join("graph.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn open_is_idempotent() {
        let (dir, store) = temp_store();
        store.add_node(&Node::new("a", "rule", "")).unwrap();

        let reopened = SqliteGraphStore::open(dir.path().join("graph.db")).unwrap();
        assert_eq!(reopened.get_node_count().unwrap(), 1);
    }

    #[test]
    fn upsert_keeps_position() {
        let (_dir, store) = temp_store();
        store.add_node(&Node::new("a", "rule", "first")).unwrap();
        store.add_node(&Node::new("b", "data", "")).unwrap();
        store.add_node(&Node::new("a", "data", "second")).unwrap();

        assert_eq!(store.get_node_ids().unwrap(), vec!["a", "b"]);
        assert_eq!(
            store.get_node_by_id("a").unwrap(),
            Some(Node::new("a", "data", "second"))
        );
    }

    #[test]
    fn truncate_clears_everything() {
        let (_dir, store) = temp_store();
        store.add_node(&Node::new("a", "rule", "")).unwrap();
        store.add_link(&Link::new("a", "b", "output")).unwrap();

        store.truncate().unwrap();

        assert_eq!(store.get_node_count().unwrap(), 0);
        assert_eq!(store.get_link_count().unwrap(), 0);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let (_dir, store) = temp_store();
        store.add_node(&Node::new("100%", "data", "")).unwrap();
        store.add_node(&Node::new("1000", "data", "")).unwrap();
        store.add_node(&Node::new("a_b", "data", "")).unwrap();
        store.add_node(&Node::new("axb", "data", "")).unwrap();

        let percent: Vec<String> = store
            .search_nodes("0%", 30)
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(percent, vec!["100%"]);

        let underscore: Vec<String> = store
            .search_nodes("_", 30)
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(underscore, vec!["a_b"]);
    }

    #[test]
    fn corrupt_file_is_classified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-db.db");
        std::fs::write(&path, vec![0x42u8; 4096]).unwrap();

        let err = SqliteGraphStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)), "got {:?}", err);
        assert!(!err.is_retryable());
    }

    #[test]
    fn missing_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/graph.db");

        let err = SqliteGraphStore::open(&path).unwrap_err();
        assert!(err.is_retryable(), "got {:?}", err);
    }
}
