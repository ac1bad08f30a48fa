//! Subgraph extraction
//!
//! Collects the neighborhood of a start node: everything reachable within
//! `forward_depth` hops along outgoing links and within `backward_depth` hops
//! along incoming links, considering at most `edge_limit` links per expanded
//! node.
//!
//! Each direction is a breadth-first walk over an explicit `(id, depth)` queue
//! with its own visited set, so a node is expanded at most once per direction
//! and the walk terminates on cyclic graphs. Both walks write into one
//! accumulator:
//!
//! - nodes are unique by id, in first-discovery order; ids the store cannot
//!   resolve (dangling link endpoints) are skipped
//! - links are unique by `(source, target, type)`, in first-discovery order
//!
//! A node reached again after it has been expanded is not re-expanded from the
//! new path, even if that path has more depth budget left. The FIFO queue
//! makes the first expansion the shallowest one within a direction.

use graphscope_core::{GraphStore, LimitsConfig, Link, Node, NodeId, StoreError, Subgraph};
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Traversal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow outgoing links towards their targets
    Forward,

    /// Follow incoming links back to their sources
    Backward,
}

impl Direction {
    /// Links leaving `id` in this direction, in store order
    pub fn links<S: GraphStore + ?Sized>(
        self,
        store: &S,
        id: &str,
    ) -> Result<Vec<Link>, StoreError> {
        match self {
            Direction::Forward => store.get_outgoing_links(id),
            Direction::Backward => store.get_incoming_links(id),
        }
    }

    /// The endpoint a link leads to in this direction
    pub fn next_hop(self, link: &Link) -> &str {
        match self {
            Direction::Forward => &link.target,
            Direction::Backward => &link.source,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// Errors that abort an extraction
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Extraction cancelled")]
    Cancelled,

    #[error("Extraction exceeded its deadline after {} ms", .elapsed.as_millis())]
    DeadlineExceeded { elapsed: Duration },
}

/// Bounds on the work a single extraction may do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionLimits {
    /// Stop once the result holds this many nodes
    pub max_nodes: usize,

    /// Stop once the result holds this many links
    pub max_links: usize,

    /// Fail with `DeadlineExceeded` once this much time has passed
    pub timeout: Option<Duration>,
}

impl ExtractionLimits {
    /// No ceilings and no deadline
    pub fn unbounded() -> Self {
        Self {
            max_nodes: usize::MAX,
            max_links: usize::MAX,
            timeout: None,
        }
    }
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self::from(&LimitsConfig::default())
    }
}

impl From<&LimitsConfig> for ExtractionLimits {
    fn from(config: &LimitsConfig) -> Self {
        Self {
            max_nodes: config.max_nodes,
            max_links: config.max_links,
            timeout: (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms)),
        }
    }
}

/// Bounded bidirectional traversal over a graph store
///
/// # Example
///
/// ```rust,ignore
/// let subgraph = SubgraphExtractor::new(&store)
///     .with_limits(ExtractionLimits::default())
///     .extract("node_1", 2, 1, 4)?;
/// ```
pub struct SubgraphExtractor<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    limits: ExtractionLimits,
    cancel: Option<CancellationToken>,
}

impl<'a, S: GraphStore + ?Sized> SubgraphExtractor<'a, S> {
    /// Create an extractor with no ceilings and no deadline
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            limits: ExtractionLimits::unbounded(),
            cancel: None,
        }
    }

    pub fn with_limits(mut self, limits: ExtractionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Abort with `ExtractError::Cancelled` once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Extract the neighborhood of `start_id`
    ///
    /// The start node is always resolved first, so it leads the node list when
    /// it exists, even with both depths at zero. An unknown `start_id` yields
    /// an empty result. An `edge_limit` of zero expands nothing.
    ///
    /// Cancellation and the deadline are checked before every node expansion.
    /// Hitting `max_nodes` or `max_links` stops both directions and returns
    /// what was collected so far with `truncated` set.
    pub fn extract(
        &self,
        start_id: &str,
        forward_depth: usize,
        backward_depth: usize,
        edge_limit: usize,
    ) -> Result<Subgraph, ExtractError> {
        let started = Instant::now();
        let mut acc = Accumulator::new(self.store);

        acc.add_node(start_id)?;

        let directions = [
            (Direction::Forward, forward_depth),
            (Direction::Backward, backward_depth),
        ];
        for (direction, max_depth) in directions {
            if acc.truncated {
                break;
            }
            self.traverse(&mut acc, start_id, direction, max_depth, edge_limit, started)?;
        }

        if acc.truncated {
            tracing::warn!(
                start = start_id,
                nodes = acc.nodes.len(),
                links = acc.links.len(),
                "extraction truncated at result ceiling"
            );
        }

        tracing::debug!(
            store = self.store.name(),
            start = start_id,
            forward_depth,
            backward_depth,
            edge_limit,
            nodes = acc.nodes.len(),
            links = acc.links.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "subgraph extracted"
        );

        Ok(acc.finish())
    }

    fn traverse(
        &self,
        acc: &mut Accumulator<'_, S>,
        start_id: &str,
        direction: Direction,
        max_depth: usize,
        edge_limit: usize,
        started: Instant,
    ) -> Result<(), ExtractError> {
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();
        queue.push_back((start_id.to_string(), 0));

        while let Some((id, depth)) = queue.pop_front() {
            if depth >= max_depth || visited.contains(&id) {
                continue;
            }

            self.checkpoint(started)?;

            if acc.at_capacity(&self.limits) {
                acc.truncated = true;
                return Ok(());
            }

            visited.insert(id.clone());
            acc.add_node(&id)?;

            let links = direction.links(self.store, &id)?;
            for link in links.into_iter().take(edge_limit) {
                if acc.at_capacity(&self.limits) {
                    acc.truncated = true;
                    return Ok(());
                }

                let next = direction.next_hop(&link).to_string();
                acc.add_node(&next)?;
                acc.add_link(link);

                if depth + 1 < max_depth && !visited.contains(&next) {
                    queue.push_back((next, depth + 1));
                }
            }
        }

        tracing::trace!(%direction, expanded = visited.len(), "direction complete");

        Ok(())
    }

    fn checkpoint(&self, started: Instant) -> Result<(), ExtractError> {
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                return Err(ExtractError::Cancelled);
            }
        }

        if let Some(timeout) = self.limits.timeout {
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(ExtractError::DeadlineExceeded { elapsed });
            }
        }

        Ok(())
    }
}

/// Extract with no ceilings, no deadline and no cancellation
pub fn extract_subgraph<S: GraphStore + ?Sized>(
    store: &S,
    start_id: &str,
    forward_depth: usize,
    backward_depth: usize,
    edge_limit: usize,
) -> Result<Subgraph, ExtractError> {
    SubgraphExtractor::new(store).extract(start_id, forward_depth, backward_depth, edge_limit)
}

/// Output shared by both traversal directions
struct Accumulator<'s, S: GraphStore + ?Sized> {
    store: &'s S,
    nodes: Vec<Node>,
    node_ids: HashSet<NodeId>,

    /// Ids the store could not resolve, so they are looked up once
    unresolved: HashSet<NodeId>,

    links: Vec<Link>,
    link_keys: HashSet<Link>,
    truncated: bool,
}

impl<'s, S: GraphStore + ?Sized> Accumulator<'s, S> {
    fn new(store: &'s S) -> Self {
        Self {
            store,
            nodes: Vec::new(),
            node_ids: HashSet::new(),
            unresolved: HashSet::new(),
            links: Vec::new(),
            link_keys: HashSet::new(),
            truncated: false,
        }
    }

    fn add_node(&mut self, id: &str) -> Result<(), StoreError> {
        if self.node_ids.contains(id) || self.unresolved.contains(id) {
            return Ok(());
        }

        match self.store.get_node_by_id(id)? {
            Some(node) => {
                self.node_ids.insert(node.id.clone());
                self.nodes.push(node);
            }
            None => {
                self.unresolved.insert(id.to_string());
            }
        }

        Ok(())
    }

    fn add_link(&mut self, link: Link) {
        if self.link_keys.insert(link.clone()) {
            self.links.push(link);
        }
    }

    fn at_capacity(&self, limits: &ExtractionLimits) -> bool {
        self.nodes.len() >= limits.max_nodes || self.links.len() >= limits.max_links
    }

    fn finish(self) -> Subgraph {
        Subgraph {
            nodes: self.nodes,
            links: self.links,
            truncated: self.truncated,
        }
    }
}
