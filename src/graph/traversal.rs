//! Graph traversal — bounded BFS/DFS, bidirectional shortest path, k-paths.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::{Direction, Edge, GraphError, GraphResult, Node};

use super::store::Neighbor;

/// The narrow read capability the traversal algorithms need. Implemented by
/// the in-memory store; a future persistent variant only has to provide
/// these four lookups.
pub trait GraphView {
    /// Look up a node by id.
    fn node(&self, id: &str) -> Option<Node>;
    /// Neighbor triples of a node, outgoing first, optionally filtered by
    /// relation type.
    fn neighbors(&self, id: &str, edge_types: Option<&[String]>) -> Vec<Neighbor>;
    /// Outgoing edges in insertion order.
    fn outgoing(&self, id: &str) -> Vec<Edge>;
    /// Incoming edges in insertion order.
    fn incoming(&self, id: &str) -> Vec<Edge>;
}

/// Predicate over nodes considered for admission.
pub type NodeFilter = Box<dyn Fn(&Node) -> bool>;
/// Predicate over edges considered for expansion.
pub type EdgeFilter = Box<dyn Fn(&Edge) -> bool>;

/// Bounds and filters for a traversal. The set of knobs is closed.
pub struct TraversalConfig {
    /// Maximum number of hops from the start node.
    pub max_depth: u32,
    /// Maximum number of admitted result nodes.
    pub max_nodes: usize,
    /// Relation-type whitelist. None = all types.
    pub edge_types: Option<Vec<String>>,
    /// Which adjacency to follow.
    pub direction: Direction,
    /// Whether the start node itself is admitted to results.
    pub include_start: bool,
    /// Node admission predicate, applied at dequeue. A rejected node is
    /// neither admitted nor expanded, but stays visited.
    pub node_filter: Option<NodeFilter>,
    /// Edge predicate, applied at expansion. A rejected edge is skipped,
    /// not blacklisted; the neighbor may still be reached another way.
    pub edge_filter: Option<EdgeFilter>,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_nodes: 100,
            edge_types: None,
            direction: Direction::Out,
            include_start: true,
            node_filter: None,
            edge_filter: None,
        }
    }
}

/// A node admitted by a traversal, with its discovery depth and the path
/// that reached it (start node included).
#[derive(Debug, Clone)]
pub struct VisitedNode {
    /// The admitted node.
    pub node: Node,
    /// Hops from the start node.
    pub depth: u32,
    /// Node ids from the start to this node, inclusive.
    pub path: Vec<String>,
}

/// Result of a shortest-path search.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSearchResult {
    /// Node ids from source to target inclusive; None when disconnected.
    pub path: Option<Vec<String>>,
    /// Path length in edges; -1 when disconnected.
    pub distance: i64,
}

/// Breadth-first traversal. Level order with a FIFO frontier; terminates
/// when results reach `max_nodes` or the frontier empties.
pub fn bfs(view: &dyn GraphView, start: &str, config: &TraversalConfig) -> GraphResult<Vec<VisitedNode>> {
    traverse(view, start, config, Frontier::Fifo)
}

/// Depth-first traversal. Same contract as [`bfs`] with a LIFO frontier;
/// neighbors are pushed in reverse so the first neighbor pops first,
/// matching a recursive left-to-right walk.
pub fn dfs(view: &dyn GraphView, start: &str, config: &TraversalConfig) -> GraphResult<Vec<VisitedNode>> {
    traverse(view, start, config, Frontier::Lifo)
}

enum Frontier {
    Fifo,
    Lifo,
}

struct PendingVisit {
    id: String,
    depth: u32,
    path: Vec<String>,
}

fn traverse(
    view: &dyn GraphView,
    start: &str,
    config: &TraversalConfig,
    frontier: Frontier,
) -> GraphResult<Vec<VisitedNode>> {
    if view.node(start).is_none() {
        return Err(GraphError::NodeNotFound(start.to_string()));
    }

    let mut visited: HashSet<String> = HashSet::new();
    let mut results: Vec<VisitedNode> = Vec::new();
    let mut queue: VecDeque<PendingVisit> = VecDeque::new();

    visited.insert(start.to_string());
    queue.push_back(PendingVisit {
        id: start.to_string(),
        depth: 0,
        path: vec![start.to_string()],
    });

    while let Some(pending) = match frontier {
        Frontier::Fifo => queue.pop_front(),
        Frontier::Lifo => queue.pop_back(),
    } {
        if results.len() >= config.max_nodes {
            break;
        }
        let Some(node) = view.node(&pending.id) else {
            continue;
        };
        if let Some(filter) = &config.node_filter {
            if !filter(&node) {
                continue;
            }
        }

        let is_start = pending.depth == 0;
        if !is_start || config.include_start {
            results.push(VisitedNode {
                node,
                depth: pending.depth,
                path: pending.path.clone(),
            });
        }

        if pending.depth >= config.max_depth {
            continue;
        }

        let mut neighbors = expand(view, &pending.id, config);
        if matches!(frontier, Frontier::Lifo) {
            neighbors.reverse();
        }
        for (neighbor_id, edge) in neighbors {
            if visited.contains(&neighbor_id) {
                continue;
            }
            if let Some(filter) = &config.edge_filter {
                if !filter(&edge) {
                    continue;
                }
            }
            visited.insert(neighbor_id.clone());
            let mut path = pending.path.clone();
            path.push(neighbor_id.clone());
            queue.push_back(PendingVisit {
                id: neighbor_id,
                depth: pending.depth + 1,
                path,
            });
        }
    }

    Ok(results)
}

fn expand(view: &dyn GraphView, id: &str, config: &TraversalConfig) -> Vec<(String, Edge)> {
    let types = config.edge_types.as_deref();
    let mut neighbors: Vec<(String, Edge)> = Vec::new();
    if config.direction == Direction::Out || config.direction == Direction::Both {
        for edge in filtered(view.outgoing(id), types) {
            neighbors.push((edge.target.clone(), edge));
        }
    }
    if config.direction == Direction::In || config.direction == Direction::Both {
        for edge in filtered(view.incoming(id), types) {
            neighbors.push((edge.source.clone(), edge));
        }
    }
    neighbors
}

fn filtered(edges: Vec<Edge>, types: Option<&[String]>) -> Vec<Edge> {
    match types {
        Some(types) => edges
            .into_iter()
            .filter(|e| types.iter().any(|t| *t == e.edge_type))
            .collect(),
        None => edges,
    }
}

/// Bidirectional shortest path: a forward frontier following outgoing
/// edges from `source` and a backward frontier following incoming edges
/// from `target`, expanding the smaller queue each step. Returns
/// `path=None, distance=-1` when the frontiers drain without meeting.
pub fn bidirectional_search(
    view: &dyn GraphView,
    source: &str,
    target: &str,
    max_depth: u32,
) -> GraphResult<PathSearchResult> {
    if view.node(source).is_none() {
        return Err(GraphError::NodeNotFound(source.to_string()));
    }
    if view.node(target).is_none() {
        return Err(GraphError::NodeNotFound(target.to_string()));
    }
    if source == target {
        return Ok(PathSearchResult {
            path: Some(vec![source.to_string()]),
            distance: 0,
        });
    }

    // parent maps double as visited sets; the start nodes have no parent.
    let mut fwd_parent: HashMap<String, Option<String>> = HashMap::new();
    let mut bwd_parent: HashMap<String, Option<String>> = HashMap::new();
    fwd_parent.insert(source.to_string(), None);
    bwd_parent.insert(target.to_string(), None);

    let mut fwd_queue: VecDeque<(String, u32)> = VecDeque::new();
    let mut bwd_queue: VecDeque<(String, u32)> = VecDeque::new();
    fwd_queue.push_back((source.to_string(), 0));
    bwd_queue.push_back((target.to_string(), 0));

    while !fwd_queue.is_empty() || !bwd_queue.is_empty() {
        let expand_forward = match (fwd_queue.is_empty(), bwd_queue.is_empty()) {
            (false, true) => true,
            (true, false) => false,
            _ => fwd_queue.len() <= bwd_queue.len(),
        };

        if expand_forward {
            let Some((current, depth)) = fwd_queue.pop_front() else {
                continue;
            };
            if depth >= max_depth {
                continue;
            }
            for edge in view.outgoing(&current) {
                let next = edge.target;
                if fwd_parent.contains_key(&next) {
                    continue;
                }
                fwd_parent.insert(next.clone(), Some(current.clone()));
                if bwd_parent.contains_key(&next) {
                    return Ok(reconstruct(&fwd_parent, &bwd_parent, &next));
                }
                fwd_queue.push_back((next, depth + 1));
            }
        } else {
            let Some((current, depth)) = bwd_queue.pop_front() else {
                continue;
            };
            if depth >= max_depth {
                continue;
            }
            for edge in view.incoming(&current) {
                let next = edge.source;
                if bwd_parent.contains_key(&next) {
                    continue;
                }
                bwd_parent.insert(next.clone(), Some(current.clone()));
                if fwd_parent.contains_key(&next) {
                    return Ok(reconstruct(&fwd_parent, &bwd_parent, &next));
                }
                bwd_queue.push_back((next, depth + 1));
            }
        }
    }

    Ok(PathSearchResult {
        path: None,
        distance: -1,
    })
}

fn reconstruct(
    fwd_parent: &HashMap<String, Option<String>>,
    bwd_parent: &HashMap<String, Option<String>>,
    meeting: &str,
) -> PathSearchResult {
    // Forward half: source ..= meeting.
    let mut front: Vec<String> = Vec::new();
    let mut cursor = Some(meeting.to_string());
    while let Some(id) = cursor {
        cursor = fwd_parent.get(&id).cloned().flatten();
        front.push(id);
    }
    front.reverse();

    // Backward half: the meeting node's backward parent chain leads to the
    // target; the meeting node itself is already in the forward half.
    let mut cursor = bwd_parent.get(meeting).cloned().flatten();
    while let Some(id) = cursor {
        cursor = bwd_parent.get(&id).cloned().flatten();
        front.push(id);
    }

    let distance = front.len() as i64 - 1;
    PathSearchResult {
        path: Some(front),
        distance,
    }
}

/// Enumerate up to `max_paths` simple paths from `source` to `target`
/// following outgoing edges, depth-limited. The visited set is path-local,
/// so a node may appear in many paths but never twice in one.
pub fn all_paths(
    view: &dyn GraphView,
    source: &str,
    target: &str,
    max_depth: u32,
    max_paths: usize,
) -> GraphResult<Vec<Vec<String>>> {
    if view.node(source).is_none() {
        return Err(GraphError::NodeNotFound(source.to_string()));
    }
    if view.node(target).is_none() {
        return Err(GraphError::NodeNotFound(target.to_string()));
    }

    let mut paths: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = vec![source.to_string()];
    let mut on_path: HashSet<String> = HashSet::new();
    on_path.insert(source.to_string());
    walk(
        view, source, target, max_depth, max_paths, &mut current, &mut on_path, &mut paths,
    );
    Ok(paths)
}

#[allow(clippy::too_many_arguments)]
fn walk(
    view: &dyn GraphView,
    current: &str,
    target: &str,
    depth_left: u32,
    max_paths: usize,
    path: &mut Vec<String>,
    on_path: &mut HashSet<String>,
    paths: &mut Vec<Vec<String>>,
) {
    if paths.len() >= max_paths {
        return;
    }
    if current == target {
        paths.push(path.clone());
        return;
    }
    if depth_left == 0 {
        return;
    }
    for edge in view.outgoing(current) {
        if on_path.contains(&edge.target) {
            continue;
        }
        path.push(edge.target.clone());
        on_path.insert(edge.target.clone());
        walk(
            view,
            &edge.target,
            target,
            depth_left - 1,
            max_paths,
            path,
            on_path,
            paths,
        );
        on_path.remove(&edge.target);
        path.pop();
        if paths.len() >= max_paths {
            return;
        }
    }
}
