// Breadth-first queries over the navigation graph.
//
// Levels are tens of nodes and every edge costs the same, so all queries
// are plain BFS, O(V + E), run synchronously to completion. Only active
// edges to live nodes are followed (`NavGraph::active_neighbors`); stale
// references left by destroyed nodes are skipped rather than failing.
//
// Three queries:
// - `find_path`: shortest path by edge count. Ties go to whichever
//   predecessor reached the node first in BFS order, i.e. neighbor storage
//   order.
// - `find_reachable_nodes`: flood fill. A blocked node is reported as
//   reachable (you can walk up to it) but not expanded through. The origin
//   is always expanded, even if the walker standing on it marks it blocked.
// - `find_longest_path`: path to the node the BFS frontier settles last,
//   the crow's "far corner". Blocked nodes are never entered.
//
// "Blocked" is a caller-supplied predicate; `occupied` and
// `nothing_blocked` are the stock ones.
//
// Parent and visited storage is a `Vec` indexed by `NavNodeId` (sized by
// `slot_count`, so destroyed ids still have a slot).
//
// See also: `nav.rs` for the graph, `walker.rs` which consumes paths.
//
// **Critical constraint: determinism.** BFS order depends only on stored
// neighbor order. No hashing, no randomness.

use crate::error::SearchError;
use crate::nav::NavGraph;
use crate::types::NavNodeId;
use std::collections::{BTreeSet, VecDeque};

/// An origin-to-destination node sequence, both ends inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavPath {
    pub nodes: Vec<NavNodeId>,
}

impl NavPath {
    pub fn origin(&self) -> Option<NavNodeId> {
        self.nodes.first().copied()
    }

    pub fn destination(&self) -> Option<NavNodeId> {
        self.nodes.last().copied()
    }

    /// Number of edges walked.
    pub fn edge_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}

/// Exclusion predicate: nodes with a walker on them.
pub fn occupied(graph: &NavGraph) -> impl Fn(NavNodeId) -> bool + '_ {
    move |id| graph.node(id).is_some_and(|n| n.is_occupied)
}

/// Exclusion predicate that excludes nothing.
pub fn nothing_blocked(_: NavNodeId) -> bool {
    false
}

fn require_live(graph: &NavGraph, id: NavNodeId) -> Result<(), SearchError> {
    if graph.contains(id) {
        Ok(())
    } else {
        Err(SearchError::UnknownNode(id))
    }
}

/// Walk parent pointers back from `target` to the root.
fn build_path(parents: &[Option<NavNodeId>], target: NavNodeId) -> NavPath {
    let mut nodes = vec![target];
    let mut current = target;
    while let Some(parent) = parents[current.index()] {
        nodes.push(parent);
        current = parent;
    }
    nodes.reverse();
    NavPath { nodes }
}

/// Shortest path from `origin` to `target` over active edges.
pub fn find_path(
    graph: &NavGraph,
    origin: NavNodeId,
    target: NavNodeId,
) -> Result<NavPath, SearchError> {
    require_live(graph, origin)?;
    require_live(graph, target)?;
    if origin == target {
        return Ok(NavPath {
            nodes: vec![origin],
        });
    }

    let n = graph.slot_count();
    let mut visited = vec![false; n];
    let mut parents: Vec<Option<NavNodeId>> = vec![None; n];
    let mut queue = VecDeque::new();
    visited[origin.index()] = true;
    queue.push_back(origin);

    while let Some(current) = queue.pop_front() {
        if current == target {
            return Ok(build_path(&parents, target));
        }
        for next in graph.active_neighbors(current) {
            if !visited[next.index()] {
                visited[next.index()] = true;
                parents[next.index()] = Some(current);
                queue.push_back(next);
            }
        }
    }

    Err(SearchError::Unreachable {
        from: origin,
        to: target,
    })
}

/// Every node reachable from `origin`, origin included.
pub fn find_reachable_nodes(
    graph: &NavGraph,
    origin: NavNodeId,
    is_blocked: impl Fn(NavNodeId) -> bool,
) -> Result<BTreeSet<NavNodeId>, SearchError> {
    require_live(graph, origin)?;

    let mut visited = vec![false; graph.slot_count()];
    let mut reachable = BTreeSet::new();
    let mut queue = VecDeque::new();
    visited[origin.index()] = true;
    queue.push_back(origin);

    while let Some(current) = queue.pop_front() {
        reachable.insert(current);
        if current != origin && is_blocked(current) {
            continue;
        }
        for next in graph.active_neighbors(current) {
            if !visited[next.index()] {
                visited[next.index()] = true;
                queue.push_back(next);
            }
        }
    }

    Ok(reachable)
}

/// Path to the last node the BFS frontier reaches. `Ok(None)` when nothing
/// besides the origin can be entered.
pub fn find_longest_path(
    graph: &NavGraph,
    origin: NavNodeId,
    is_blocked: impl Fn(NavNodeId) -> bool,
) -> Result<Option<NavPath>, SearchError> {
    require_live(graph, origin)?;

    let n = graph.slot_count();
    let mut visited = vec![false; n];
    let mut parents: Vec<Option<NavNodeId>> = vec![None; n];
    let mut queue = VecDeque::new();
    let mut last = None;
    visited[origin.index()] = true;
    queue.push_back(origin);

    while let Some(current) = queue.pop_front() {
        if current != origin {
            last = Some(current);
        }
        for next in graph.active_neighbors(current) {
            if !visited[next.index()] && !is_blocked(next) {
                visited[next.index()] = true;
                parents[next.index()] = Some(current);
                queue.push_back(next);
            }
        }
    }

    Ok(last.map(|target| build_path(&parents, target)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec3;

    fn line_graph(n: usize) -> (NavGraph, Vec<NavNodeId>) {
        let mut graph = NavGraph::new();
        let ids: Vec<_> = (0..n)
            .map(|i| graph.add_node(Vec3::new(i as f32, 0.0, 0.0)))
            .collect();
        for pair in ids.windows(2) {
            graph.add_neighbor(pair[0], pair[1]);
        }
        (graph, ids)
    }

    #[test]
    fn path_along_a_line() {
        let (graph, ids) = line_graph(3);
        let path = find_path(&graph, ids[0], ids[2]).unwrap();
        assert_eq!(path.nodes, vec![ids[0], ids[1], ids[2]]);
        assert_eq!(path.edge_count(), 2);
        assert_eq!(path.origin(), Some(ids[0]));
        assert_eq!(path.destination(), Some(ids[2]));
    }

    #[test]
    fn trivial_path_to_self() {
        let (graph, ids) = line_graph(1);
        let path = find_path(&graph, ids[0], ids[0]).unwrap();
        assert_eq!(path.nodes, vec![ids[0]]);
        assert_eq!(path.edge_count(), 0);
    }

    #[test]
    fn unreachable_is_distinct_from_trivial() {
        let mut graph = NavGraph::new();
        let a = graph.add_node(Vec3::ZERO);
        let b = graph.add_node(Vec3::RIGHT);
        assert_eq!(
            find_path(&graph, a, b),
            Err(SearchError::Unreachable { from: a, to: b })
        );
    }

    #[test]
    fn missing_nodes_are_rejected() {
        let (mut graph, ids) = line_graph(2);
        let ghost = NavNodeId(99);
        assert_eq!(
            find_path(&graph, ghost, ids[0]),
            Err(SearchError::UnknownNode(ghost))
        );
        assert_eq!(
            find_path(&graph, ids[0], ghost),
            Err(SearchError::UnknownNode(ghost))
        );
        graph.destroy_node(ids[1]);
        assert_eq!(
            find_reachable_nodes(&graph, ids[1], nothing_blocked),
            Err(SearchError::UnknownNode(ids[1]))
        );
        assert_eq!(
            find_longest_path(&graph, ghost, nothing_blocked),
            Err(SearchError::UnknownNode(ghost))
        );
    }

    #[test]
    fn inactive_edges_are_not_traversed() {
        let (mut graph, ids) = line_graph(3);
        graph.set_neighbor_active(ids[1], ids[2], false);
        assert!(find_path(&graph, ids[0], ids[2]).is_err());
        // Reverse direction is still active.
        assert!(find_path(&graph, ids[2], ids[0]).is_ok());
    }

    #[test]
    fn stale_neighbors_are_skipped() {
        let (mut graph, ids) = line_graph(3);
        graph.destroy_node(ids[1]);
        let reach = find_reachable_nodes(&graph, ids[0], nothing_blocked).unwrap();
        assert_eq!(reach, BTreeSet::from([ids[0]]));
    }

    #[test]
    fn shortest_path_prefers_fewer_edges() {
        // 0-1-2-3 plus a shortcut 0-3.
        let (mut graph, ids) = line_graph(4);
        graph.add_neighbor(ids[0], ids[3]);
        let path = find_path(&graph, ids[0], ids[3]).unwrap();
        assert_eq!(path.nodes, vec![ids[0], ids[3]]);
    }

    #[test]
    fn ties_follow_neighbor_order() {
        // Diamond 0 -> {1, 2} -> 3; 1 was linked first.
        let mut graph = NavGraph::new();
        let ids: Vec<_> = (0..4).map(|i| graph.add_node(Vec3::new(i as f32, 0.0, 0.0))).collect();
        graph.add_neighbor(ids[0], ids[1]);
        graph.add_neighbor(ids[0], ids[2]);
        graph.add_neighbor(ids[1], ids[3]);
        graph.add_neighbor(ids[2], ids[3]);
        let path = find_path(&graph, ids[0], ids[3]).unwrap();
        assert_eq!(path.nodes, vec![ids[0], ids[1], ids[3]]);
    }

    #[test]
    fn reachable_stops_at_occupied_nodes() {
        let (mut graph, ids) = line_graph(4);
        let all = find_reachable_nodes(&graph, ids[0], occupied(&graph)).unwrap();
        assert_eq!(all, ids.iter().copied().collect::<BTreeSet<_>>());

        graph.set_occupied(ids[1], true);
        let blocked = find_reachable_nodes(&graph, ids[0], occupied(&graph)).unwrap();
        assert_eq!(blocked, BTreeSet::from([ids[0], ids[1]]));
    }

    #[test]
    fn occupied_origin_still_expands() {
        let (mut graph, ids) = line_graph(3);
        graph.set_occupied(ids[0], true);
        let reach = find_reachable_nodes(&graph, ids[0], occupied(&graph)).unwrap();
        assert_eq!(reach.len(), 3);
    }

    #[test]
    fn longest_path_heads_for_last_frontier_node() {
        // 0-1-2-3 with a spur 1-4.
        let (mut graph, ids) = line_graph(4);
        let spur = graph.add_node(Vec3::new(1.0, 0.0, 1.0));
        graph.add_neighbor(ids[1], spur);
        let path = find_longest_path(&graph, ids[0], nothing_blocked)
            .unwrap()
            .unwrap();
        assert_eq!(path.nodes, vec![ids[0], ids[1], ids[2], ids[3]]);
    }

    #[test]
    fn longest_path_avoids_occupied_and_isolated() {
        let (mut graph, ids) = line_graph(3);
        graph.set_occupied(ids[1], true);
        assert_eq!(
            find_longest_path(&graph, ids[0], occupied(&graph)).unwrap(),
            None
        );
        graph.set_occupied(ids[1], false);
        graph.set_occupied(ids[2], true);
        let path = find_longest_path(&graph, ids[0], occupied(&graph))
            .unwrap()
            .unwrap();
        assert_eq!(path.nodes, vec![ids[0], ids[1]]);
    }
}
