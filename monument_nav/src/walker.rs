// Walkers: entities that move node to node along the graph.
//
// Every walker shares one movement driver (`Walker`): it stands on
// `current_node`, and while crossing an edge it carries an `EdgeMotion`
// interpolated over `time_to_arrive` seconds. Each tick the position is
// re-lerped between the two endpoints' *current* walk points, so a walker
// follows a platform that changes its node offsets mid-step.
//
// What a walker does next is decided by its `Steering` strategy, consulted
// whenever it is standing still (idle, or just arrived):
// - `PlayerSteering` follows an explicit route to a requested target.
//   Before every edge it re-checks that the edge is still active; a
//   platform that rotated under the route interrupts it.
// - `CrowSteering` roams: either a random active neighbor other than the
//   one it just came from (stairs only if it can climb them), or the path
//   to the farthest corner the BFS frontier reaches.
//
// `WalkerBrain` wraps the strategies in an enum so walkers stay plain
// serializable data. Steering returns a `Decision`; `level.rs` turns those
// into platform locks, occupancy flags and narrative events.
//
// Cancellation: `Walker::stop` freezes the walker where it is, snaps
// `current_node` to the nearer edge endpoint and never teleports.
//
// See also: `pathfinding.rs` for the searches steering uses, `level.rs` for
// the tick loop, `monument_prng` for the crow's RNG.
//
// **Critical constraint: determinism.** The crow's randomness comes only
// from its own seeded `WalkRng`, which is serialized with it.

use crate::geometry::Vec3;
use crate::nav::NavGraph;
use crate::pathfinding::{find_longest_path, find_path, occupied};
use crate::types::{NavNodeId, PlatformId, WalkerId};
use monument_prng::WalkRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What steering wants to do from the current node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Start crossing the edge to this node.
    Move(NavNodeId),
    /// Nothing to do.
    Idle,
    /// The route just ran out: the walker has reached its destination.
    Finished,
    /// A requested target cannot be reached from here.
    PathNotFound { target: NavNodeId },
    /// The next edge of the route is no longer active.
    Interrupted { next: NavNodeId },
}

/// Next-node selection strategy.
pub trait Steering {
    fn next_step(
        &mut self,
        graph: &NavGraph,
        here: NavNodeId,
        last_visited: Option<NavNodeId>,
    ) -> Decision;

    /// Drop any planned route.
    fn cancel(&mut self);
}

/// Click-to-move: walk a BFS route to an explicit target.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlayerSteering {
    /// Target requested but not yet planned. Planning happens at the next
    /// node the walker stands on.
    #[serde(default)]
    pending_target: Option<NavNodeId>,
    /// Remaining nodes to visit, excluding the one stood on.
    #[serde(default)]
    route: VecDeque<NavNodeId>,
    #[serde(default)]
    following: bool,
}

impl PlayerSteering {
    pub fn navigate_to(&mut self, target: NavNodeId) {
        self.pending_target = Some(target);
        self.route.clear();
    }

    pub fn route(&self) -> impl Iterator<Item = NavNodeId> + '_ {
        self.route.iter().copied()
    }
}

impl Steering for PlayerSteering {
    fn next_step(
        &mut self,
        graph: &NavGraph,
        here: NavNodeId,
        _last_visited: Option<NavNodeId>,
    ) -> Decision {
        if let Some(target) = self.pending_target.take() {
            if target == here {
                log::info!("target and origin are the same node ({here})");
                return Decision::Idle;
            }
            match find_path(graph, here, target) {
                Ok(path) => {
                    self.route = path.nodes.into_iter().skip(1).collect();
                    self.following = true;
                }
                Err(err) => {
                    log::warn!("path not found: {err}");
                    self.route.clear();
                    self.following = false;
                    return Decision::PathNotFound { target };
                }
            }
        }

        let Some(&next) = self.route.front() else {
            if self.following {
                self.following = false;
                return Decision::Finished;
            }
            return Decision::Idle;
        };
        let still_linked = graph
            .node(here)
            .is_some_and(|n| n.has_active_neighbor(next))
            && graph.contains(next);
        if !still_linked {
            log::debug!("route interrupted at {here}: {next} no longer reachable");
            self.cancel();
            return Decision::Interrupted { next };
        }
        self.route.pop_front();
        Decision::Move(next)
    }

    fn cancel(&mut self) {
        self.pending_target = None;
        self.route.clear();
        self.following = false;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoamStyle {
    /// Random active neighbor other than the one just left.
    #[default]
    RandomNeighbor,
    /// Head for the last node the BFS frontier reaches, then again from there.
    FarthestCorner,
}

/// Autonomous roaming for NPC crows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrowSteering {
    #[serde(default)]
    pub style: RoamStyle,
    #[serde(default)]
    pub can_walk_stairs: bool,
    rng: WalkRng,
    #[serde(default)]
    route: VecDeque<NavNodeId>,
}

impl CrowSteering {
    pub fn new(style: RoamStyle, can_walk_stairs: bool, seed: u64) -> Self {
        Self {
            style,
            can_walk_stairs,
            rng: WalkRng::new(seed),
            route: VecDeque::new(),
        }
    }

    fn random_neighbor(
        &mut self,
        graph: &NavGraph,
        here: NavNodeId,
        last_visited: Option<NavNodeId>,
    ) -> Decision {
        let candidates: Vec<NavNodeId> = graph
            .active_neighbors(here)
            .filter(|&n| Some(n) != last_visited)
            .filter(|&n| self.can_walk_stairs || graph.node(n).is_some_and(|node| !node.is_stairs))
            .collect();
        if let Some(&next) = self.rng.choose(&candidates) {
            return Decision::Move(next);
        }
        // Dead end: turn back the way we came, if that edge still exists.
        match last_visited {
            Some(back) if graph.active_neighbors(here).any(|n| n == back) => Decision::Move(back),
            _ => Decision::Idle,
        }
    }

    fn farthest_corner(&mut self, graph: &NavGraph, here: NavNodeId) -> Decision {
        if self.route.is_empty() {
            match find_longest_path(graph, here, occupied(graph)) {
                Ok(Some(path)) => self.route = path.nodes.into_iter().skip(1).collect(),
                _ => return Decision::Idle,
            }
        }
        let Some(next) = self.route.pop_front() else {
            return Decision::Idle;
        };
        if graph.active_neighbors(here).any(|n| n == next) {
            Decision::Move(next)
        } else {
            // The graph changed under the route; re-plan next time.
            self.route.clear();
            Decision::Idle
        }
    }
}

impl Steering for CrowSteering {
    fn next_step(
        &mut self,
        graph: &NavGraph,
        here: NavNodeId,
        last_visited: Option<NavNodeId>,
    ) -> Decision {
        match self.style {
            RoamStyle::RandomNeighbor => self.random_neighbor(graph, here, last_visited),
            RoamStyle::FarthestCorner => self.farthest_corner(graph, here),
        }
    }

    fn cancel(&mut self) {
        self.route.clear();
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum WalkerBrain {
    Player(PlayerSteering),
    Crow(CrowSteering),
}

impl WalkerBrain {
    pub fn player() -> Self {
        Self::Player(PlayerSteering::default())
    }

    pub fn crow(style: RoamStyle, can_walk_stairs: bool, seed: u64) -> Self {
        Self::Crow(CrowSteering::new(style, can_walk_stairs, seed))
    }

    pub fn is_player(&self) -> bool {
        matches!(self, Self::Player(_))
    }
}

impl Steering for WalkerBrain {
    fn next_step(
        &mut self,
        graph: &NavGraph,
        here: NavNodeId,
        last_visited: Option<NavNodeId>,
    ) -> Decision {
        match self {
            Self::Player(s) => s.next_step(graph, here, last_visited),
            Self::Crow(s) => s.next_step(graph, here, last_visited),
        }
    }

    fn cancel(&mut self) {
        match self {
            Self::Player(s) => s.cancel(),
            Self::Crow(s) => s.cancel(),
        }
    }
}

/// An edge being crossed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeMotion {
    pub from: NavNodeId,
    pub to: NavNodeId,
    pub elapsed: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Walker {
    pub id: WalkerId,
    /// The node stood on, or departed from while crossing an edge.
    pub current_node: NavNodeId,
    pub position: Vec3,
    pub time_to_arrive: f32,
    pub brain: WalkerBrain,
    #[serde(default)]
    pub last_visited: Option<NavNodeId>,
    #[serde(skip)]
    pub motion: Option<EdgeMotion>,
    /// Platform this walker is holding locked while it moves.
    #[serde(skip)]
    pub platform: Option<PlatformId>,
}

impl Walker {
    /// Place a walker on `node`'s walk point. `None` if the node is missing.
    pub fn spawn(
        id: WalkerId,
        graph: &NavGraph,
        node: NavNodeId,
        brain: WalkerBrain,
        time_to_arrive: f32,
    ) -> Option<Self> {
        let position = graph.node(node)?.walk_point();
        Some(Self {
            id,
            current_node: node,
            position,
            time_to_arrive,
            brain,
            last_visited: None,
            motion: None,
            platform: None,
        })
    }

    pub fn is_moving(&self) -> bool {
        self.motion.is_some()
    }

    /// Begin crossing to `to`.
    pub fn depart(&mut self, to: NavNodeId) {
        self.motion = Some(EdgeMotion {
            from: self.current_node,
            to,
            elapsed: 0.0,
        });
    }

    /// Progress along the current edge. Returns the node arrived at when the
    /// edge completes this tick.
    pub fn advance(&mut self, graph: &NavGraph, dt: f32) -> Option<NavNodeId> {
        let motion = self.motion.as_mut()?;
        motion.elapsed += dt;
        let t = if self.time_to_arrive <= 0.0 {
            1.0
        } else {
            (motion.elapsed / self.time_to_arrive).min(1.0)
        };
        let (from, to) = (motion.from, motion.to);
        let (Some(a), Some(b)) = (graph.node(from), graph.node(to)) else {
            // An endpoint vanished under us: stay where we are.
            self.motion = None;
            return None;
        };
        self.position = a.walk_point().lerp(b.walk_point(), t);
        if t < 1.0 {
            return None;
        }
        self.motion = None;
        self.last_visited = Some(from);
        self.current_node = to;
        Some(to)
    }

    /// Freeze in place. Mid-edge, `current_node` becomes whichever endpoint
    /// is nearer; the position is left untouched.
    pub fn stop(&mut self) -> NavNodeId {
        if let Some(motion) = self.motion.take() {
            let progress = if self.time_to_arrive <= 0.0 {
                1.0
            } else {
                motion.elapsed / self.time_to_arrive
            };
            if progress >= 0.5 {
                self.last_visited = Some(motion.from);
                self.current_node = motion.to;
            }
        }
        self.brain.cancel();
        self.current_node
    }

    /// Ask steering what to do from `current_node`.
    pub fn decide(&mut self, graph: &NavGraph) -> Decision {
        self.brain
            .next_step(graph, self.current_node, self.last_visited)
    }
}
