// Navigation graph: nodes, flagged edges, and the mutation API.
//
// The graph is a set of `NavNode`s (walkable tiles) each carrying its own
// adjacency list of `NavEdge { to, active }`. An edge can exist but be
// switched off; rotating platforms flip that flag instead of adding and
// removing edges, so the edge *set* is fixed after authoring and only its
// activity changes at runtime.
//
// Storage is a `Vec<Option<NavNode>>` indexed by `NavNodeId`. Destroying a
// node empties its slot without touching anyone's neighbor list, which is
// how a stale reference arises; `clear_null_neighbors` is the repair, and
// every query skips stale targets until then. Ids are never reused.
//
// Mutation is defensive: self-loops, duplicates, missing nodes and absent
// edges are all silent no-ops that report `false`/`0`. Authoring tools call
// these speculatively and must not have to pre-validate.
//
// See also: `discovery.rs` which fills neighbor lists from geometry,
// `pathfinding.rs` for BFS over active edges, `platform.rs` which flips
// edge activity and node offset configurations.
//
// **Critical constraint: determinism.** Neighbor lists keep insertion
// order, and that order is the BFS tie-break. No `HashMap` iteration feeds
// any result; the object index below is lookup-only.

use crate::geometry::{Basis, Vec3};
use crate::types::{NavNodeId, PlatformId, SceneObjectId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Number of walk-point offset configurations per node (one per platform
/// rotation state).
pub const NODE_CONFIGURATIONS: usize = 4;

/// One walk-point offset variant, selected by the owning platform's
/// rotation state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeConfiguration {
    pub active: bool,
    /// Offset from the tile position, in the node's local frame.
    pub offset: Vec3,
}

impl NodeConfiguration {
    pub const INACTIVE: Self = Self {
        active: false,
        offset: Vec3::ZERO,
    };
}

/// A directed adjacency entry. Symmetry is maintained by the mutators, not
/// by the representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavEdge {
    pub to: NavNodeId,
    pub active: bool,
}

/// A vertex of the navigation graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavNode {
    pub id: NavNodeId,
    /// The scene object whose collider represents this tile.
    pub object: SceneObjectId,
    pub position: Vec3,
    #[serde(default)]
    pub basis: Basis,
    /// Offsets are applied in world axes instead of the node's local frame.
    #[serde(default)]
    pub global_walk_point: bool,
    /// Stairs use diagonal raycasts and never take part in perspective links.
    #[serde(default)]
    pub is_stairs: bool,
    pub configurations: [NodeConfiguration; NODE_CONFIGURATIONS],
    #[serde(default)]
    pub active_configuration: usize,
    /// The rotating platform this tile is attached to, if any.
    #[serde(default)]
    pub platform: Option<PlatformId>,
    #[serde(default)]
    pub neighbors: SmallVec<[NavEdge; 6]>,
    /// Set by the last reachability refresh, for feedback display.
    #[serde(skip)]
    pub is_reachable: bool,
    /// A walker is standing here.
    #[serde(skip)]
    pub is_occupied: bool,
}

impl NavNode {
    fn new(id: NavNodeId, object: SceneObjectId, position: Vec3, walk_height: f32) -> Self {
        let mut configurations = [NodeConfiguration::INACTIVE; NODE_CONFIGURATIONS];
        configurations[0] = NodeConfiguration {
            active: true,
            offset: Vec3::new(0.0, walk_height, 0.0),
        };
        Self {
            id,
            object,
            position,
            basis: Basis::IDENTITY,
            global_walk_point: false,
            is_stairs: false,
            configurations,
            active_configuration: 0,
            platform: None,
            neighbors: SmallVec::new(),
            is_reachable: false,
            is_occupied: false,
        }
    }

    /// The offset currently in effect. An inactive or out-of-range
    /// configuration falls back to configuration 0.
    pub fn current_offset(&self) -> Vec3 {
        match self.configurations.get(self.active_configuration) {
            Some(c) if c.active => c.offset,
            _ => self.configurations[0].offset,
        }
    }

    /// Where a walker standing on this node is drawn.
    pub fn walk_point(&self) -> Vec3 {
        let offset = self.current_offset();
        if self.global_walk_point {
            self.position + offset
        } else {
            self.position + self.basis.to_world(offset)
        }
    }

    /// Select the offset configuration for a platform rotation state.
    pub fn apply_configuration(&mut self, index: usize) {
        self.active_configuration = index % NODE_CONFIGURATIONS;
    }

    pub fn edge_to(&self, other: NavNodeId) -> Option<&NavEdge> {
        self.neighbors.iter().find(|e| e.to == other)
    }

    /// True if an edge to `other` exists, active or not.
    pub fn has_neighbor(&self, other: NavNodeId) -> bool {
        self.edge_to(other).is_some()
    }

    /// True if an active edge to `other` exists.
    pub fn has_active_neighbor(&self, other: NavNodeId) -> bool {
        self.edge_to(other).is_some_and(|e| e.active)
    }
}

/// The navigation graph container.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NavGraph {
    nodes: Vec<Option<NavNode>>,
    /// Scene object -> node lookup for raycast resolution. Rebuilt after load.
    #[serde(skip)]
    object_index: FxHashMap<SceneObjectId, NavNodeId>,
}

impl NavGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node whose collider object shares its number. Returns its id.
    pub fn add_node(&mut self, position: Vec3) -> NavNodeId {
        let object = SceneObjectId(self.nodes.len() as u32);
        self.add_node_for_object(object, position)
    }

    /// Add a node backed by an explicit scene object.
    pub fn add_node_for_object(&mut self, object: SceneObjectId, position: Vec3) -> NavNodeId {
        self.add_node_with_height(object, position, 0.5)
    }

    /// Add a node with a specific default walk-point height.
    pub fn add_node_with_height(
        &mut self,
        object: SceneObjectId,
        position: Vec3,
        walk_height: f32,
    ) -> NavNodeId {
        let id = NavNodeId(self.nodes.len() as u32);
        self.nodes
            .push(Some(NavNode::new(id, object, position, walk_height)));
        self.object_index.insert(object, id);
        id
    }

    /// Remove a node, leaving its slot empty. Edges pointing at it elsewhere
    /// stay behind as stale references. Returns `false` if already gone.
    pub fn destroy_node(&mut self, id: NavNodeId) -> bool {
        match self.nodes.get_mut(id.index()).and_then(Option::take) {
            Some(node) => {
                self.object_index.remove(&node.object);
                true
            }
            None => false,
        }
    }

    /// Rebuild transient lookup state after deserialization.
    pub fn rebuild_index(&mut self) {
        self.object_index = self
            .nodes
            .iter()
            .flatten()
            .map(|n| (n.object, n.id))
            .collect();
    }

    pub fn node(&self, id: NavNodeId) -> Option<&NavNode> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NavNodeId) -> Option<&mut NavNode> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// True if `id` names a live (not destroyed) node.
    pub fn contains(&self, id: NavNodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of id slots ever allocated, including destroyed ones. Search
    /// scratch buffers are sized by this.
    pub fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Live nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &NavNode> {
        self.nodes.iter().flatten()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut NavNode> {
        self.nodes.iter_mut().flatten()
    }

    /// Live node ids in ascending order.
    pub fn node_ids(&self) -> Vec<NavNodeId> {
        self.nodes().map(|n| n.id).collect()
    }

    /// The node whose collider belongs to `object`.
    pub fn node_for_object(&self, object: SceneObjectId) -> Option<NavNodeId> {
        self.object_index.get(&object).copied()
    }

    /// Total directed edge entries across all live nodes.
    pub fn edge_count(&self) -> usize {
        self.nodes().map(|n| n.neighbors.len()).sum()
    }

    /// Neighbors reachable right now: active edges to live nodes, in stored
    /// order.
    pub fn active_neighbors(&self, id: NavNodeId) -> impl Iterator<Item = NavNodeId> + '_ {
        self.node(id)
            .into_iter()
            .flat_map(|n| n.neighbors.iter())
            .filter(move |e| e.active && self.contains(e.to))
            .map(|e| e.to)
    }

    /// Link `a` and `b` in both directions with active edges.
    ///
    /// Both sides are checked before either is mutated; a side that already
    /// has the edge is left untouched (including its active flag). Returns
    /// `true` if anything was added.
    pub fn add_neighbor(&mut self, a: NavNodeId, b: NavNodeId) -> bool {
        if a == b {
            return false;
        }
        let (a_has, b_has) = match (self.node(a), self.node(b)) {
            (Some(na), Some(nb)) => (na.has_neighbor(b), nb.has_neighbor(a)),
            _ => return false,
        };
        if a_has && b_has {
            return false;
        }
        if !a_has {
            self.push_edge(a, b, true);
        }
        if !b_has {
            self.push_edge(b, a, true);
        }
        true
    }

    /// Make sure both directions of `a`-`b` exist; missing sides are added
    /// with the given active flag. Used when platforms claim their linkers.
    pub(crate) fn ensure_edge(&mut self, a: NavNodeId, b: NavNodeId, active: bool) -> bool {
        if a == b || !self.contains(a) || !self.contains(b) {
            return false;
        }
        let mut added = false;
        for (from, to) in [(a, b), (b, a)] {
            let has = self.node(from).is_some_and(|n| n.has_neighbor(to));
            if !has {
                self.push_edge(from, to, active);
                added = true;
            }
        }
        added
    }

    fn push_edge(&mut self, from: NavNodeId, to: NavNodeId, active: bool) {
        if let Some(node) = self.node_mut(from) {
            node.neighbors.push(NavEdge { to, active });
        }
    }

    /// Remove the `node -> other` entry only. The reverse entry, if any, is
    /// the caller's business.
    pub fn remove_neighbor(&mut self, node: NavNodeId, other: NavNodeId) -> bool {
        if node == other {
            return false;
        }
        let Some(n) = self.node_mut(node) else {
            return false;
        };
        match n.neighbors.iter().position(|e| e.to == other) {
            Some(i) => {
                n.neighbors.remove(i);
                true
            }
            None => false,
        }
    }

    /// Drop every edge of `node`. Returns how many were removed.
    pub fn clear_neighbors(&mut self, node: NavNodeId) -> usize {
        match self.node_mut(node) {
            Some(n) => {
                let count = n.neighbors.len();
                n.neighbors.clear();
                count
            }
            None => 0,
        }
    }

    /// Remove edges whose target was destroyed. Returns the count removed.
    pub fn clear_null_neighbors(&mut self, node: NavNodeId) -> usize {
        let stale: SmallVec<[NavNodeId; 6]> = match self.node(node) {
            Some(n) => n
                .neighbors
                .iter()
                .map(|e| e.to)
                .filter(|&to| !self.contains(to))
                .collect(),
            None => return 0,
        };
        if stale.is_empty() {
            return 0;
        }
        let Some(n) = self.node_mut(node) else {
            return 0;
        };
        let before = n.neighbors.len();
        n.neighbors.retain(|e| !stale.contains(&e.to));
        before - n.neighbors.len()
    }

    /// Set the active flag of the `node -> other` edge. No-op if absent.
    pub fn set_neighbor_active(&mut self, node: NavNodeId, other: NavNodeId, active: bool) -> bool {
        let Some(n) = self.node_mut(node) else {
            return false;
        };
        match n.neighbors.iter_mut().find(|e| e.to == other) {
            Some(edge) => {
                edge.active = active;
                true
            }
            None => false,
        }
    }

    /// Replace the reachable-feedback flags with exactly `reachable`.
    pub fn mark_reachable<I>(&mut self, reachable: I)
    where
        I: IntoIterator<Item = NavNodeId>,
    {
        for node in self.nodes_mut() {
            node.is_reachable = false;
        }
        for id in reachable {
            if let Some(node) = self.node_mut(id) {
                node.is_reachable = true;
            }
        }
    }

    pub fn set_occupied(&mut self, id: NavNodeId, occupied: bool) {
        if let Some(node) = self.node_mut(id) {
            node.is_occupied = occupied;
        }
    }
}
