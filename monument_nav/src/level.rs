// Top-level level state and the cooperative tick loop.
//
// `LevelState` owns everything a running level needs: the navigation graph,
// the collider scene and camera discovery reads, rotating platforms,
// walkers and pressure plates, plus the `NavConfig` they are tuned by. The
// host drives it one frame at a time:
//
//   `step(commands, dt)`:
//     1. apply commands in order (navigation requests, drags, reactions),
//     2. advance every platform tween; a completed tween applies its
//        configuration before anything else looks at the graph,
//     3. advance every walker; arrivals press plates, then steering picks
//        the next edge.
//
// Everything long-running (rotations, edge crossings) is a tween advanced
// by `dt`, so a frame never blocks and a query never sees a half-applied
// configuration.
//
// Persistence follows the usual split: authored data (graph with its edge
// flags, colliders, camera, platforms, walkers, plates, config) is
// serialized; lookup indices, platform bookkeeping, locks and in-flight
// motion are transient and rebuilt by `rebuild_transient_state()`, which
// `from_json()` calls. Loading never re-runs discovery.
//
// See also: `command.rs` / `event.rs` for the step interface,
// `platform.rs`, `walker.rs`, `discovery.rs` for the subsystems driven
// here, and the `monument_level` binary for the authoring CLI.
//
// **Critical constraint: determinism.** Processing order is fixed
// (commands in order, platforms and walkers by id) and the only randomness
// is each crow's own seeded RNG.

use crate::command::LevelCommand;
use crate::config::NavConfig;
use crate::discovery::{self, DiscoveryReport};
use crate::error::LevelError;
use crate::event::{LevelEvent, LevelEventKind};
use crate::geometry::Vec3;
use crate::nav::NavGraph;
use crate::pathfinding::{find_reachable_nodes, occupied};
use crate::perspective::OrthographicCamera;
use crate::platform::{Reaction, RotatingPlatform};
use crate::scene::BoxScene;
use crate::types::{NavNodeId, PlateId, PlatformId, WalkerId};
use crate::walker::{Decision, Walker, WalkerBrain};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A trigger tile that pushes a platform when a walker arrives on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PressurePlate {
    pub id: PlateId,
    pub node: NavNodeId,
    pub platform: PlatformId,
    pub reaction: Reaction,
    #[serde(default)]
    pub repeatable: bool,
    /// A non-repeatable plate that already fired.
    #[serde(default)]
    pub spent: bool,
}

/// The tile that ends the level. Any walker arriving on it completes the
/// level; the trigger then stays fired.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoalTrigger {
    pub node: NavNodeId,
    #[serde(default)]
    pub fired: bool,
}

/// Output of one `step()`.
#[derive(Clone, Debug, Default)]
pub struct StepResult {
    pub events: Vec<LevelEvent>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LevelState {
    #[serde(default)]
    pub config: NavConfig,
    /// Frames stepped so far.
    #[serde(default)]
    pub frame: u64,
    #[serde(default)]
    pub graph: NavGraph,
    #[serde(default)]
    pub scene: BoxScene,
    #[serde(default)]
    pub camera: OrthographicCamera,
    #[serde(default)]
    pub platforms: Vec<RotatingPlatform>,
    #[serde(default)]
    pub walkers: Vec<Walker>,
    #[serde(default)]
    pub plates: Vec<PressurePlate>,
    #[serde(default)]
    pub goal: Option<GoalTrigger>,
}

impl LevelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a walkable tile: a node plus a unit-cube collider at `position`.
    pub fn add_tile(&mut self, position: Vec3) -> NavNodeId {
        let object = loop {
            let candidate = self.scene.allocate_object();
            if self.graph.node_for_object(candidate).is_none() {
                break candidate;
            }
        };
        let id = self.graph.add_node_with_height(
            object,
            position,
            self.config.default_walk_point_height,
        );
        self.scene.add_cube(object, position);
        id
    }

    /// Remove a tile and its collider. Neighbor lists keep stale references
    /// until `clear_null_neighbors` runs.
    pub fn destroy_tile(&mut self, id: NavNodeId) -> bool {
        let Some(object) = self.graph.node(id).map(|n| n.object) else {
            return false;
        };
        self.scene.remove_object(object);
        self.graph.destroy_node(id)
    }

    /// Run neighbor discovery over the whole level.
    pub fn discover(&mut self) -> DiscoveryReport {
        discovery::set_up_neighbors_automatically(
            &mut self.graph,
            &self.scene,
            &self.camera,
            &self.config,
        )
    }

    /// Install a platform, assigning its id and applying its configuration.
    pub fn add_platform(&mut self, mut platform: RotatingPlatform) -> PlatformId {
        let id = PlatformId(self.platforms.len() as u32);
        platform.id = id;
        platform.register(&mut self.graph, &self.config);
        self.platforms.push(platform);
        id
    }

    pub fn spawn_walker(
        &mut self,
        node: NavNodeId,
        brain: WalkerBrain,
    ) -> Result<WalkerId, LevelError> {
        let id = WalkerId(self.walkers.len() as u32);
        let walker = Walker::spawn(
            id,
            &self.graph,
            node,
            brain,
            self.config.walker_time_to_arrive,
        )
        .ok_or(LevelError::UnknownNode(node))?;
        self.walkers.push(walker);
        self.refresh_occupancy();
        Ok(id)
    }

    pub fn add_plate(
        &mut self,
        node: NavNodeId,
        platform: PlatformId,
        reaction: Reaction,
        repeatable: bool,
    ) -> Result<PlateId, LevelError> {
        if !self.graph.contains(node) {
            return Err(LevelError::UnknownNode(node));
        }
        if self.platforms.get(platform.index()).is_none() {
            return Err(LevelError::UnknownPlatform(platform));
        }
        let id = PlateId(self.plates.len() as u32);
        self.plates.push(PressurePlate {
            id,
            node,
            platform,
            reaction,
            repeatable,
            spent: false,
        });
        Ok(id)
    }

    /// Mark `node` as the goal, replacing (and re-arming) any previous one.
    pub fn set_goal(&mut self, node: NavNodeId) -> Result<(), LevelError> {
        if !self.graph.contains(node) {
            return Err(LevelError::UnknownNode(node));
        }
        self.goal = Some(GoalTrigger { node, fired: false });
        Ok(())
    }

    pub fn walker(&self, id: WalkerId) -> Option<&Walker> {
        self.walkers.get(id.index())
    }

    pub fn platform(&self, id: PlatformId) -> Option<&RotatingPlatform> {
        self.platforms.get(id.index())
    }

    /// Advance one frame.
    pub fn step(&mut self, commands: &[LevelCommand], dt: f32) -> StepResult {
        self.frame += 1;
        let mut kinds = Vec::new();

        for command in commands {
            self.apply_command(command, &mut kinds);
        }
        self.tick_platforms(dt, &mut kinds);
        self.tick_walkers(dt, &mut kinds);
        self.refresh_occupancy();

        let frame = self.frame;
        StepResult {
            events: kinds
                .into_iter()
                .map(|kind| LevelEvent { frame, kind })
                .collect(),
        }
    }

    fn reject(&self, err: LevelError, events: &mut Vec<LevelEventKind>) {
        log::warn!("command rejected: {err}");
        events.push(LevelEventKind::CommandRejected {
            reason: err.to_string(),
        });
    }

    fn apply_command(&mut self, command: &LevelCommand, events: &mut Vec<LevelEventKind>) {
        match *command {
            LevelCommand::NavigateTo { walker, target } => {
                if !self.graph.contains(target) {
                    return self.reject(LevelError::UnknownNode(target), events);
                }
                match self.walkers.get_mut(walker.index()) {
                    Some(Walker {
                        brain: WalkerBrain::Player(steering),
                        ..
                    }) => steering.navigate_to(target),
                    Some(_) => self.reject(LevelError::NotPlayer(walker), events),
                    None => self.reject(LevelError::UnknownWalker(walker), events),
                }
            }
            LevelCommand::StopWalker { walker } => {
                let Some(w) = self.walkers.get_mut(walker.index()) else {
                    return self.reject(LevelError::UnknownWalker(walker), events);
                };
                let node = w.stop();
                self.release_platform(walker.index());
                events.push(LevelEventKind::WalkerStopped { walker, node });
            }
            LevelCommand::React { platform, reaction } => {
                match self.platforms.get_mut(platform.index()) {
                    Some(p) => p.react(reaction),
                    None => self.reject(LevelError::UnknownPlatform(platform), events),
                }
            }
            LevelCommand::BeginDrag { platform, writer } => {
                let Some(p) = self.platforms.get_mut(platform.index()) else {
                    return self.reject(LevelError::UnknownPlatform(platform), events);
                };
                if !p.begin_drag(&mut self.graph, writer) {
                    let held = p.rotation();
                    log::warn!(
                        "{platform}: drag refused (locked: {}, writer: {:?}, reacting: {})",
                        p.is_locked(),
                        held.writer,
                        held.is_reacting()
                    );
                    events.push(LevelEventKind::DragRefused { platform });
                }
            }
            LevelCommand::DragTo {
                platform,
                writer,
                angle,
            } => {
                let Some(p) = self.platforms.get_mut(platform.index()) else {
                    return self.reject(LevelError::UnknownPlatform(platform), events);
                };
                if !p.drag_to(writer, angle) {
                    events.push(LevelEventKind::DragRefused { platform });
                }
            }
            LevelCommand::EndDrag { platform, writer } => {
                let Some(p) = self.platforms.get_mut(platform.index()) else {
                    return self.reject(LevelError::UnknownPlatform(platform), events);
                };
                if !p.end_drag(writer, &self.config) {
                    events.push(LevelEventKind::DragRefused { platform });
                }
            }
        }
    }

    fn tick_platforms(&mut self, dt: f32, events: &mut Vec<LevelEventKind>) {
        for platform in &mut self.platforms {
            if let Some(configuration) = platform.tick(&mut self.graph, &self.config, dt) {
                events.push(LevelEventKind::PlatformSettled {
                    platform: platform.id,
                    configuration,
                });
            }
        }
    }

    fn tick_walkers(&mut self, dt: f32, events: &mut Vec<LevelEventKind>) {
        for i in 0..self.walkers.len() {
            let walker = &mut self.walkers[i];
            if walker.is_moving() {
                let Some(node) = walker.advance(&self.graph, dt) else {
                    continue;
                };
                let id = walker.id;
                events.push(LevelEventKind::WalkerArrived { walker: id, node });
                self.refresh_occupancy();
                self.press_plates(id, node, events);
                self.check_goal(id, node, events);
            }
            self.decide(i, events);
        }
    }

    /// Consult steering for a standing walker and act on the decision.
    fn decide(&mut self, i: usize, events: &mut Vec<LevelEventKind>) {
        let walker = &mut self.walkers[i];
        let id = walker.id;
        let here = walker.current_node;
        match walker.decide(&self.graph) {
            Decision::Move(next) => {
                let is_player = walker.brain.is_player();
                walker.depart(next);
                let platform = self.graph.node(next).and_then(|n| n.platform);
                self.claim_platform(i, platform);
                events.push(LevelEventKind::WalkerDeparted {
                    walker: id,
                    from: here,
                    to: next,
                });
                if is_player {
                    self.refresh_reachable(next);
                }
            }
            Decision::Idle => self.release_platform(i),
            Decision::Finished => {
                self.release_platform(i);
                events.push(LevelEventKind::WalkerStopped {
                    walker: id,
                    node: here,
                });
            }
            Decision::PathNotFound { target } => {
                self.release_platform(i);
                events.push(LevelEventKind::PathNotFound {
                    walker: id,
                    from: here,
                    to: target,
                });
            }
            Decision::Interrupted { next } => {
                self.release_platform(i);
                events.push(LevelEventKind::PathInterrupted {
                    walker: id,
                    at: here,
                    next,
                });
            }
        }
    }

    /// Lock the platform under the walker's next node, releasing the one it
    /// is leaving.
    fn claim_platform(&mut self, i: usize, target: Option<PlatformId>) {
        let walker = &mut self.walkers[i];
        if walker.platform == target {
            return;
        }
        if let Some(p) = walker
            .platform
            .take()
            .and_then(|old| self.platforms.get_mut(old.index()))
        {
            p.unlock(walker.id);
        }
        if let Some(p) = target.and_then(|new| self.platforms.get_mut(new.index())) {
            p.lock(walker.id);
        }
        walker.platform = target;
    }

    fn release_platform(&mut self, i: usize) {
        self.claim_platform(i, None);
    }

    fn press_plates(&mut self, walker: WalkerId, node: NavNodeId, events: &mut Vec<LevelEventKind>) {
        for plate in &mut self.plates {
            if plate.node != node || plate.spent {
                continue;
            }
            let Some(platform) = self.platforms.get_mut(plate.platform.index()) else {
                log::warn!("{} targets missing {}", plate.id, plate.platform);
                continue;
            };
            platform.react(plate.reaction);
            if !plate.repeatable {
                plate.spent = true;
            }
            log::debug!("{} pressed by {walker}", plate.id);
            events.push(LevelEventKind::PlatePressed {
                plate: plate.id,
                walker,
                platform: plate.platform,
            });
        }
    }

    fn check_goal(&mut self, walker: WalkerId, node: NavNodeId, events: &mut Vec<LevelEventKind>) {
        match &mut self.goal {
            Some(goal) if goal.node == node && !goal.fired => {
                goal.fired = true;
                log::info!("level completed by {walker} at {node}");
                events.push(LevelEventKind::LevelCompleted { walker, node });
            }
            _ => {}
        }
    }

    /// Recompute the reachable-feedback flags from `origin`.
    fn refresh_reachable(&mut self, origin: NavNodeId) {
        let reachable = find_reachable_nodes(&self.graph, origin, occupied(&self.graph));
        if let Ok(reachable) = reachable {
            self.graph.mark_reachable(reachable);
        }
    }

    /// Flag exactly the nodes walkers stand on as occupied.
    fn refresh_occupancy(&mut self) {
        for node in self.graph.nodes_mut() {
            node.is_occupied = false;
        }
        for walker in &self.walkers {
            self.graph.set_occupied(walker.current_node, true);
        }
    }

    /// Rebuild lookup indices, platform bookkeeping and occupancy after
    /// deserialization.
    pub fn rebuild_transient_state(&mut self) {
        self.graph.rebuild_index();
        self.scene.rebuild_index();
        for platform in &mut self.platforms {
            platform.register(&mut self.graph, &self.config);
        }
        for walker in &mut self.walkers {
            walker.motion = None;
            walker.platform = None;
        }
        self.refresh_occupancy();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize and rebuild transient state. Edges come from the file;
    /// discovery is not re-run.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut state: LevelState = serde_json::from_str(json)?;
        state.rebuild_transient_state();
        Ok(state)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LevelError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Linker, PlatformConfiguration, RotationWriter};
    use crate::walker::RoamStyle;

    const DT: f32 = 0.05;

    /// Five tiles in a row along X, discovered.
    fn corridor() -> (LevelState, Vec<NavNodeId>) {
        let mut level = LevelState::new();
        let ids: Vec<_> = (0..5)
            .map(|i| level.add_tile(Vec3::new(i as f32, 0.0, 0.0)))
            .collect();
        level.discover();
        (level, ids)
    }

    fn run(level: &mut LevelState, frames: usize) -> Vec<LevelEventKind> {
        (0..frames)
            .flat_map(|_| level.step(&[], DT).events)
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn player_walks_to_target() {
        let (mut level, ids) = corridor();
        let player = level.spawn_walker(ids[0], WalkerBrain::player()).unwrap();
        let result = level.step(
            &[LevelCommand::NavigateTo {
                walker: player,
                target: ids[3],
            }],
            DT,
        );
        assert!(result.events.iter().any(|e| matches!(
            e.kind,
            LevelEventKind::WalkerDeparted { to, .. } if to == ids[1]
        )));

        let events = run(&mut level, 40);
        assert!(events.contains(&LevelEventKind::WalkerStopped {
            walker: player,
            node: ids[3],
        }));
        let w = level.walker(player).unwrap();
        assert_eq!(w.current_node, ids[3]);
        assert_eq!(w.position, level.graph.node(ids[3]).unwrap().walk_point());
        assert!(level.graph.node(ids[3]).unwrap().is_occupied);
        assert!(!level.graph.node(ids[0]).unwrap().is_occupied);
    }

    #[test]
    fn player_refreshes_reachable_flags() {
        let (mut level, ids) = corridor();
        let player = level.spawn_walker(ids[0], WalkerBrain::player()).unwrap();
        level.step(
            &[LevelCommand::NavigateTo {
                walker: player,
                target: ids[1],
            }],
            DT,
        );
        assert!(level.graph.nodes().all(|n| n.is_reachable));
    }

    #[test]
    fn unreachable_target_emits_path_not_found() {
        let (mut level, ids) = corridor();
        let island = level.add_tile(Vec3::new(10.0, 0.0, 0.0));
        let player = level.spawn_walker(ids[0], WalkerBrain::player()).unwrap();
        let events = level
            .step(
                &[LevelCommand::NavigateTo {
                    walker: player,
                    target: island,
                }],
                DT,
            )
            .events;
        assert_eq!(
            events[0].kind,
            LevelEventKind::PathNotFound {
                walker: player,
                from: ids[0],
                to: island,
            }
        );
    }

    #[test]
    fn bad_commands_are_rejected_not_fatal() {
        let (mut level, ids) = corridor();
        let crow = level
            .spawn_walker(ids[0], WalkerBrain::crow(RoamStyle::RandomNeighbor, false, 3))
            .unwrap();
        let events = level
            .step(
                &[
                    LevelCommand::NavigateTo {
                        walker: WalkerId(9),
                        target: ids[1],
                    },
                    LevelCommand::NavigateTo {
                        walker: crow,
                        target: ids[1],
                    },
                    LevelCommand::NavigateTo {
                        walker: crow,
                        target: NavNodeId(77),
                    },
                    LevelCommand::React {
                        platform: PlatformId(4),
                        reaction: Reaction::rotation(90.0),
                    },
                ],
                DT,
            )
            .events;
        let rejected = events
            .iter()
            .filter(|e| matches!(e.kind, LevelEventKind::CommandRejected { .. }))
            .count();
        assert_eq!(rejected, 4);
    }

    #[test]
    fn stop_freezes_mid_edge() {
        let (mut level, ids) = corridor();
        let player = level.spawn_walker(ids[0], WalkerBrain::player()).unwrap();
        level.step(
            &[LevelCommand::NavigateTo {
                walker: player,
                target: ids[4],
            }],
            DT,
        );
        level.step(&[], DT);
        let before = level.walker(player).unwrap().position;
        let events = level.step(&[LevelCommand::StopWalker { walker: player }], DT).events;
        assert!(events.iter().any(|e| e.kind
            == LevelEventKind::WalkerStopped {
                walker: player,
                node: ids[0],
            }));
        let w = level.walker(player).unwrap();
        assert!(!w.is_moving());
        assert_eq!(w.position, before);
        // And it stays put.
        run(&mut level, 10);
        assert_eq!(level.walker(player).unwrap().position, before);
    }

    #[test]
    fn walker_on_platform_locks_drags() {
        let (mut level, ids) = corridor();
        let platform = level.add_platform(RotatingPlatform::new(PlatformId(0), vec![ids[2]]));
        let player = level.spawn_walker(ids[0], WalkerBrain::player()).unwrap();
        level.step(
            &[LevelCommand::NavigateTo {
                walker: player,
                target: ids[3],
            }],
            DT,
        );
        // Walk until the player is heading onto the platform tile.
        for _ in 0..20 {
            level.step(&[], DT);
            if level.walker(player).unwrap().platform == Some(platform) {
                break;
            }
        }
        assert!(level.platform(platform).unwrap().is_locked());
        let events = level
            .step(
                &[LevelCommand::BeginDrag {
                    platform,
                    writer: RotationWriter::Platform,
                }],
                DT,
            )
            .events;
        assert!(events
            .iter()
            .any(|e| e.kind == LevelEventKind::DragRefused { platform }));

        run(&mut level, 40);
        assert!(!level.platform(platform).unwrap().is_locked());
    }

    #[test]
    fn plate_fires_once_unless_repeatable() {
        let (mut level, ids) = corridor();
        let platform = level.add_platform(RotatingPlatform::new(PlatformId(0), vec![ids[4]]));
        let plate = level
            .add_plate(ids[1], platform, Reaction::rotation(90.0), false)
            .unwrap();
        let player = level.spawn_walker(ids[0], WalkerBrain::player()).unwrap();
        level.step(
            &[LevelCommand::NavigateTo {
                walker: player,
                target: ids[2],
            }],
            DT,
        );
        let events = run(&mut level, 40);
        assert!(events.contains(&LevelEventKind::PlatePressed {
            plate,
            walker: player,
            platform,
        }));
        assert!(events.contains(&LevelEventKind::PlatformSettled {
            platform,
            configuration: 1,
        }));
        assert!(level.plates[0].spent);

        level.step(
            &[LevelCommand::NavigateTo {
                walker: player,
                target: ids[0],
            }],
            DT,
        );
        let events = run(&mut level, 40);
        assert!(!events
            .iter()
            .any(|e| matches!(e, LevelEventKind::PlatePressed { .. })));
    }

    #[test]
    fn add_plate_validates_references() {
        let (mut level, ids) = corridor();
        assert!(matches!(
            level.add_plate(ids[0], PlatformId(0), Reaction::rotation(90.0), true),
            Err(LevelError::UnknownPlatform(_))
        ));
        assert!(matches!(
            level.spawn_walker(NavNodeId(50), WalkerBrain::player()),
            Err(LevelError::UnknownNode(_))
        ));
    }

    #[test]
    fn tiles_never_reuse_hand_picked_object_ids() {
        use crate::pathfinding::find_path;
        use crate::scene::{BoxCollider, SceneQuery};
        use crate::types::SceneObjectId;

        let mut level = LevelState::new();
        let a = level.add_tile(Vec3::ZERO);
        let a_object = level.graph.node(a).unwrap().object;
        level.scene.add_child(
            BoxCollider::cube(SceneObjectId(1), Vec3::new(0.0, 3.0, 0.0), 1.0),
            a_object,
        );
        let b = level.add_tile(Vec3::new(1.0, 0.0, 0.0));
        let b_object = level.graph.node(b).unwrap().object;

        assert_ne!(b_object, SceneObjectId(1));
        assert_eq!(level.graph.node_for_object(b_object), Some(b));
        assert_eq!(level.scene.parent_of(SceneObjectId(1)), Some(a_object));
        assert_eq!(level.scene.parent_of(b_object), None);

        level.discover();
        assert_eq!(find_path(&level.graph, a, b).unwrap().nodes, vec![a, b]);
    }

    #[test]
    fn goal_completes_the_level_once() {
        let (mut level, ids) = corridor();
        level.set_goal(ids[2]).unwrap();
        assert!(matches!(
            level.set_goal(NavNodeId(40)),
            Err(LevelError::UnknownNode(_))
        ));
        let player = level.spawn_walker(ids[0], WalkerBrain::player()).unwrap();

        let go = |level: &mut LevelState, target: NavNodeId| {
            level.step(&[LevelCommand::NavigateTo { walker: player, target }], DT);
            run(level, 40)
        };
        let completed = |events: &[LevelEventKind]| {
            events
                .iter()
                .filter(|e| matches!(e, LevelEventKind::LevelCompleted { .. }))
                .count()
        };

        let events = go(&mut level, ids[4]);
        assert_eq!(completed(&events), 1);
        assert!(events.contains(&LevelEventKind::LevelCompleted {
            walker: player,
            node: ids[2],
        }));
        assert!(level.goal.as_ref().unwrap().fired);

        // Walking back across the goal does not complete the level again.
        let events = go(&mut level, ids[0]);
        assert_eq!(completed(&events), 0);

        let restored = LevelState::from_json(&level.to_json().unwrap()).unwrap();
        assert_eq!(restored.goal, level.goal);
    }

    #[test]
    fn json_roundtrip_preserves_edges_and_platforms() {
        let (mut level, ids) = corridor();
        let mut platform = RotatingPlatform::new(PlatformId(0), vec![ids[2]]);
        platform.set_configuration(
            1,
            PlatformConfiguration {
                linkers: vec![Linker::new(ids[1], ids[2], false)],
            },
        );
        let platform = level.add_platform(platform);
        level.step(
            &[LevelCommand::React {
                platform,
                reaction: Reaction::rotation(90.0),
            }],
            DT,
        );
        run(&mut level, 20);
        level
            .spawn_walker(ids[0], WalkerBrain::crow(RoamStyle::FarthestCorner, false, 5))
            .unwrap();

        let json = level.to_json().unwrap();
        let restored = LevelState::from_json(&json).unwrap();
        assert_eq!(restored.graph.edge_count(), level.graph.edge_count());
        assert!(!restored.graph.node(ids[1]).unwrap().has_active_neighbor(ids[2]));
        assert_eq!(restored.platforms[0].previous_configuration(), Some(1));
        assert!(restored.graph.node(ids[0]).unwrap().is_occupied);
        assert_eq!(
            restored.graph.node_for_object(restored.graph.node(ids[3]).unwrap().object),
            Some(ids[3])
        );
    }

    #[test]
    fn from_json_rejects_invalid_json() {
        assert!(LevelState::from_json("not valid json {{{").is_err());
        assert!(LevelState::from_json(r#"{"frame": "soon"}"#).is_err());
    }

    #[test]
    fn empty_object_loads_as_empty_level() {
        let level = LevelState::from_json("{}").unwrap();
        assert_eq!(level.graph.node_count(), 0);
        assert_eq!(level.config, NavConfig::default());
    }

    #[test]
    fn destroyed_tile_leaves_stale_refs_until_pruned() {
        let (mut level, ids) = corridor();
        assert!(level.destroy_tile(ids[2]));
        assert!(!level.destroy_tile(ids[2]));
        assert!(level.graph.node(ids[1]).unwrap().has_neighbor(ids[2]));
        assert_eq!(discovery::clear_null_neighbors_for_every_node(&mut level.graph), 2);
        // Rediscovery does not resurrect it.
        level.discover();
        assert!(!level.graph.node(ids[1]).unwrap().has_neighbor(ids[2]));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = LevelState::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, LevelError::Io(_)));
    }
}
