// Adjacency discovery: infer graph edges from level geometry and camera.
//
// Two independent rules, unioned per node:
//
// 1. **Geometric adjacency** (`find_adjacent_neighbors`): cast rays from the
//    node's center along its four local cardinals (forward, back, left,
//    right); stairs instead cast along their two slope diagonals. A hit on
//    another node's collider within `adjacency_max_distance` (inclusive)
//    makes that node adjacent. Hit objects are resolved to nodes through
//    their ancestor chain, because stair meshes hang their collider under
//    the node's object.
//
// 2. **Perspective adjacency** (`find_perspective_nodes`): two nodes whose
//    projected joints coincide on screen are visually touching (see
//    `perspective.rs`). Stairs never take part in this rule, on either side.
//
// `set_up_neighbors_automatically` runs both over every node in ascending
// id order and commits the union through `NavGraph::add_neighbor`, which
// makes the whole pass idempotent: re-running on unchanged geometry adds
// nothing. The batch authoring operations (clear, prune, candidates) live
// here too so the CLI and any editor binding share one implementation.
//
// See also: `scene.rs` for the raycast boundary, `perspective.rs` for
// joints, `nav.rs` for the mutators this module calls.
//
// **Critical constraint: determinism.** Results are `BTreeSet`s and nodes
// are visited in id order, so edge insertion order (and therefore BFS
// tie-breaking downstream) is reproducible across runs.

use crate::config::NavConfig;
use crate::nav::NavGraph;
use crate::perspective::{JointCache, ScreenProjector};
use crate::scene::SceneQuery;
use crate::types::{NavNodeId, SceneObjectId};
use std::collections::BTreeSet;

/// Parent hops to follow when resolving a hit object. Guards against
/// malformed (cyclic) parent data.
const MAX_PARENT_DEPTH: usize = 16;

/// Outcome of a full discovery pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub nodes_examined: usize,
    /// Newly linked node pairs.
    pub edges_added: usize,
}

/// Resolve a scene object to the node that owns it, walking up parents.
pub fn resolve_node(
    graph: &NavGraph,
    scene: &impl SceneQuery,
    object: SceneObjectId,
) -> Option<NavNodeId> {
    let mut current = object;
    for _ in 0..=MAX_PARENT_DEPTH {
        if let Some(id) = graph.node_for_object(current) {
            return Some(id);
        }
        current = scene.parent_of(current)?;
    }
    None
}

/// Nodes geometrically adjacent to `node` by raycast.
pub fn find_adjacent_neighbors(
    graph: &NavGraph,
    scene: &impl SceneQuery,
    config: &NavConfig,
    node: NavNodeId,
) -> BTreeSet<NavNodeId> {
    let mut adjacent = BTreeSet::new();
    let Some(n) = graph.node(node) else {
        return adjacent;
    };
    let directions: Vec<_> = if n.is_stairs {
        n.basis.stair_diagonals().to_vec()
    } else {
        n.basis.cardinals().to_vec()
    };
    for dir in directions {
        let Some(hit) = scene.raycast(n.position, dir) else {
            continue;
        };
        if hit.distance > config.adjacency_max_distance {
            continue;
        }
        match resolve_node(graph, scene, hit.object) {
            Some(target) if target != node => {
                adjacent.insert(target);
            }
            _ => {}
        }
    }
    adjacent
}

/// Nodes whose joints coincide with `node`'s on screen. `candidates` of
/// `None` means every live node.
pub fn find_perspective_nodes(
    graph: &NavGraph,
    joints: &mut JointCache,
    projector: &impl ScreenProjector,
    node: NavNodeId,
    candidates: Option<&[NavNodeId]>,
) -> BTreeSet<NavNodeId> {
    let mut found = BTreeSet::new();
    match graph.node(node) {
        Some(n) if !n.is_stairs => {}
        _ => return found,
    }
    let all;
    let candidates = match candidates {
        Some(c) => c,
        None => {
            all = graph.node_ids();
            &all
        }
    };
    for &other in candidates {
        if other == node || graph.node(other).is_none_or(|o| o.is_stairs) {
            continue;
        }
        if joints.are_joints_connected(graph, projector, node, other) {
            found.insert(other);
        }
    }
    found
}

/// Union of both discovery rules for one node.
pub fn discover_neighbors(
    graph: &NavGraph,
    scene: &impl SceneQuery,
    joints: &mut JointCache,
    projector: &impl ScreenProjector,
    config: &NavConfig,
    node: NavNodeId,
) -> BTreeSet<NavNodeId> {
    let mut set = find_adjacent_neighbors(graph, scene, config, node);
    set.extend(find_perspective_nodes(graph, joints, projector, node, None));
    set
}

/// Rebuild the edge set from geometry and camera. Existing edges are kept;
/// only missing ones are added.
pub fn set_up_neighbors_automatically(
    graph: &mut NavGraph,
    scene: &impl SceneQuery,
    projector: &impl ScreenProjector,
    config: &NavConfig,
) -> DiscoveryReport {
    let mut joints = JointCache::new(config);
    let mut report = DiscoveryReport::default();
    for node in graph.node_ids() {
        let found = discover_neighbors(graph, scene, &mut joints, projector, config, node);
        log::debug!("{node}: discovered {} neighbor(s)", found.len());
        for other in found {
            if graph.add_neighbor(node, other) {
                report.edges_added += 1;
            }
        }
        report.nodes_examined += 1;
    }
    log::info!(
        "neighbor discovery examined {} node(s), linked {} new pair(s)",
        report.nodes_examined,
        report.edges_added
    );
    report
}

/// Discovered neighbors not yet committed to `node`'s edge list.
pub fn possible_neighbors(
    graph: &NavGraph,
    scene: &impl SceneQuery,
    projector: &impl ScreenProjector,
    config: &NavConfig,
    node: NavNodeId,
) -> BTreeSet<NavNodeId> {
    let Some(n) = graph.node(node) else {
        return BTreeSet::new();
    };
    let mut joints = JointCache::new(config);
    let mut found = discover_neighbors(graph, scene, &mut joints, projector, config, node);
    found.retain(|other| !n.has_neighbor(*other));
    found
}

/// Empty every node's edge list. Returns the number of directed edges
/// removed.
pub fn clear_neighbors_for_every_node(graph: &mut NavGraph) -> usize {
    let removed: usize = graph
        .node_ids()
        .into_iter()
        .map(|id| graph.clear_neighbors(id))
        .sum();
    if removed == 0 {
        log::info!("no neighbors to clear");
    } else {
        log::info!("cleared {removed} edge(s)");
    }
    removed
}

/// Prune stale references from every node. Returns the number removed.
pub fn clear_null_neighbors_for_every_node(graph: &mut NavGraph) -> usize {
    let removed: usize = graph
        .node_ids()
        .into_iter()
        .map(|id| graph.clear_null_neighbors(id))
        .sum();
    log::info!("removed {removed} stale neighbor reference(s)");
    removed
}
