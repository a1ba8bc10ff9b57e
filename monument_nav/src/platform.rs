// Rotating platforms and the edge reconfiguration protocol.
//
// A rotating platform spins in quarter turns. Each rotation state (index
// `round(angle / 90) mod 4`) has a `PlatformConfiguration`: a list of
// `Linker`s, each naming one edge and whether it should be traversable in
// that state. When the platform settles, `apply_configuration` undoes the
// previous state's linkers (each edge set to the inverse of its
// `are_linked`), applies the new state's linkers, and switches every node
// attached to the platform to the matching walk-point offset
// configuration. Edges are only ever flipped, never added or removed, once
// the platform is registered.
//
// Angle changes come from three writers:
// - a **drag** by the input layer (`begin_drag` / `drag_to` / `end_drag`),
//   either on the platform itself or on a remote handle. The previous
//   linkers are suspended for the drag's whole duration so nobody walks
//   across a half-turned platform; releasing starts a snap tween to the
//   nearest quarter turn.
// - a **reaction** from a pressure plate, an angle tween of `units` degrees
//   over `time_to_complete` seconds. A new reaction replaces one in flight.
// - nothing else. `RotationState` records who holds the angle and which
//   tween is running; a second writer is refused, so drags and reactions
//   never interleave.
//
// Configuration is applied exactly once per settle, at the final angle,
// never per tick of a tween. Settling only reads the angle: a 45 degree push
// leaves the platform at 45 degrees (state 0, rounding half to even), and
// the next push continues from there. Only a drag snap lands on a quarter
// turn.
//
// See also: `nav.rs` for `set_neighbor_active` and node configurations,
// `level.rs` which ticks platforms and routes commands, `walker.rs` which
// locks platforms while walking on them.
//
// **Critical constraint: determinism.** Tweens advance by the caller's `dt`
// only; no wall clock is read here.

use crate::config::NavConfig;
use crate::nav::NavGraph;
use crate::types::{NavNodeId, PlatformId, WalkerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

fn default_true() -> bool {
    true
}

fn default_reaction_time() -> f32 {
    0.75
}

/// One edge whose activity a configuration controls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Linker {
    pub node_a: Option<NavNodeId>,
    pub node_b: Option<NavNodeId>,
    #[serde(default = "default_true")]
    pub are_linked: bool,
}

impl Linker {
    pub fn new(a: NavNodeId, b: NavNodeId, are_linked: bool) -> Self {
        Self {
            node_a: Some(a),
            node_b: Some(b),
            are_linked,
        }
    }

    fn endpoints(&self, graph: &NavGraph) -> Option<(NavNodeId, NavNodeId)> {
        match (self.node_a, self.node_b) {
            (Some(a), Some(b)) if graph.contains(a) && graph.contains(b) => Some((a, b)),
            _ => None,
        }
    }

    /// Set both directions of the edge to `linked`. No-op if an endpoint is
    /// unset or destroyed.
    pub fn set(&self, graph: &mut NavGraph, linked: bool) {
        if let Some((a, b)) = self.endpoints(graph) {
            graph.set_neighbor_active(a, b, linked);
            graph.set_neighbor_active(b, a, linked);
        }
    }

    pub fn apply(&self, graph: &mut NavGraph) {
        self.set(graph, self.are_linked);
    }

    pub fn undo(&self, graph: &mut NavGraph) {
        self.set(graph, !self.are_linked);
    }
}

/// Edge-activity pattern for one rotation state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfiguration {
    #[serde(default)]
    pub linkers: Vec<Linker>,
}

/// An external push on a platform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    /// Degrees to rotate by.
    pub units: f32,
    #[serde(default = "default_reaction_time")]
    pub time_to_complete: f32,
}

impl Reaction {
    pub fn rotation(units: f32) -> Self {
        Self {
            units,
            time_to_complete: default_reaction_time(),
        }
    }
}

/// Who is currently driving a platform's angle by hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationWriter {
    /// Dragging the platform itself.
    Platform,
    /// Dragging the platform's remote rotator handle.
    Handle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TweenKind {
    Reaction,
    Snap,
}

/// A linear angle interpolation advanced by frame time.
#[derive(Clone, Debug, PartialEq)]
pub struct AngleTween {
    pub kind: TweenKind,
    pub from: f32,
    pub to: f32,
    pub duration: f32,
    pub elapsed: f32,
}

impl AngleTween {
    fn new(kind: TweenKind, from: f32, to: f32, duration: f32) -> Self {
        Self {
            kind,
            from,
            to,
            duration,
            elapsed: 0.0,
        }
    }

    /// Advance by `dt`; returns the new angle and whether the tween is done.
    /// A finished tween lands exactly on `to`.
    fn advance(&mut self, dt: f32) -> (f32, bool) {
        self.elapsed += dt;
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            self.elapsed / self.duration
        };
        if t >= 1.0 {
            return (self.to, true);
        }
        (self.from + (self.to - self.from) * t, false)
    }
}

/// Who drives the angle right now: at most one drag writer, at most one
/// tween.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RotationState {
    pub writer: Option<RotationWriter>,
    pub tween: Option<AngleTween>,
}

impl RotationState {
    /// A reaction tween is running.
    pub fn is_reacting(&self) -> bool {
        self.tween
            .as_ref()
            .is_some_and(|t| t.kind == TweenKind::Reaction)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RotatingPlatform {
    pub id: PlatformId,
    /// Current angle, degrees.
    #[serde(default)]
    pub angle: f32,
    /// Indexed by rotation state. A missing index toggles nothing.
    #[serde(default)]
    pub configurations: Vec<PlatformConfiguration>,
    /// Nodes physically attached to the platform.
    #[serde(default)]
    pub nodes: Vec<NavNodeId>,
    /// Whether a remote handle can drive this platform.
    #[serde(default)]
    pub has_handle: bool,

    #[serde(skip)]
    rotation: RotationState,
    #[serde(skip)]
    previous_configuration: Option<usize>,
    /// Previous linkers are undone for a drag and not yet re-applied.
    #[serde(skip)]
    suspended: bool,
    /// Walkers currently moving on this platform's nodes.
    #[serde(skip)]
    locked_by: BTreeSet<WalkerId>,
}

impl RotatingPlatform {
    pub fn new(id: PlatformId, nodes: Vec<NavNodeId>) -> Self {
        Self {
            id,
            angle: 0.0,
            configurations: Vec::new(),
            nodes,
            has_handle: false,
            rotation: RotationState::default(),
            previous_configuration: None,
            suspended: false,
            locked_by: BTreeSet::new(),
        }
    }

    /// Set the linkers for one rotation state, growing the list as needed.
    pub fn set_configuration(&mut self, index: usize, configuration: PlatformConfiguration) {
        if self.configurations.len() <= index {
            self.configurations
                .resize_with(index + 1, PlatformConfiguration::default);
        }
        self.configurations[index] = configuration;
    }

    /// Rotation state for an angle. Halfway angles round to the even
    /// quarter turn.
    pub fn configuration_index(config: &NavConfig, angle: f32) -> usize {
        let count = config.configuration_count.max(1) as i64;
        ((angle / config.quarter_turn_degrees).round_ties_even() as i64).rem_euclid(count)
            as usize
    }

    pub fn previous_configuration(&self) -> Option<usize> {
        self.previous_configuration
    }

    pub fn rotation(&self) -> &RotationState {
        &self.rotation
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// No drag, no tween: the angle is at rest.
    pub fn is_settled(&self) -> bool {
        self.rotation.writer.is_none() && self.rotation.tween.is_none()
    }

    fn apply_linkers(&self, graph: &mut NavGraph, index: usize, undo: bool) {
        let Some(configuration) = self.configurations.get(index) else {
            return;
        };
        for linker in &configuration.linkers {
            if undo {
                linker.undo(graph);
            } else {
                linker.apply(graph);
            }
        }
    }

    /// Claim the attached nodes, materialize every linker edge (missing
    /// sides start inactive), and apply the configuration for the current
    /// angle. Safe to call again after loading a level.
    pub fn register(&mut self, graph: &mut NavGraph, config: &NavConfig) -> usize {
        for &id in &self.nodes {
            if let Some(node) = graph.node_mut(id) {
                node.platform = Some(self.id);
            }
        }
        for linker in self.configurations.iter().flat_map(|c| &c.linkers) {
            if let (Some(a), Some(b)) = (linker.node_a, linker.node_b) {
                graph.ensure_edge(a, b, false);
            }
        }
        self.previous_configuration = None;
        self.suspended = false;
        self.apply_configuration(graph, config, None)
    }

    /// Bring edges and node offsets in line with the rotation state of
    /// `forced_angle` (or the current angle). Returns the state index. The
    /// angle itself is left as is.
    pub fn apply_configuration(
        &mut self,
        graph: &mut NavGraph,
        config: &NavConfig,
        forced_angle: Option<f32>,
    ) -> usize {
        if let Some(angle) = forced_angle {
            self.angle = angle;
        }
        let index = Self::configuration_index(config, self.angle);

        match self.previous_configuration {
            Some(previous) if !self.suspended => self.apply_linkers(graph, previous, true),
            _ => {}
        }
        self.apply_linkers(graph, index, false);

        for &id in &self.nodes {
            if let Some(node) = graph.node_mut(id) {
                node.apply_configuration(index);
            }
        }

        log::debug!(
            "{} settled in configuration {index} (was {:?})",
            self.id,
            self.previous_configuration
        );
        self.previous_configuration = Some(index);
        self.suspended = false;
        index
    }

    /// Start a reaction rotation, replacing any tween in flight and taking
    /// the angle away from a drag in progress.
    pub fn react(&mut self, reaction: Reaction) {
        if self.rotation.writer.take().is_some() {
            log::debug!("{}: reaction overrides drag", self.id);
        }
        self.rotation.tween = Some(AngleTween::new(
            TweenKind::Reaction,
            self.angle,
            self.angle + reaction.units,
            reaction.time_to_complete,
        ));
    }

    /// Walkers moving on the platform lock it against drags.
    pub fn lock(&mut self, walker: WalkerId) {
        self.locked_by.insert(walker);
    }

    pub fn unlock(&mut self, walker: WalkerId) {
        self.locked_by.remove(&walker);
    }

    pub fn is_locked(&self) -> bool {
        !self.locked_by.is_empty()
    }

    /// Take hold of the angle. Refused while locked, while another writer
    /// holds it, or while a reaction is running. Cancels a pending snap.
    pub fn begin_drag(&mut self, graph: &mut NavGraph, writer: RotationWriter) -> bool {
        if self.is_locked() {
            return false;
        }
        if writer == RotationWriter::Handle && !self.has_handle {
            return false;
        }
        if self.rotation.writer.is_some_and(|w| w != writer) {
            return false;
        }
        if self.rotation.is_reacting() {
            return false;
        }
        self.rotation.tween = None;
        if !self.suspended {
            if let Some(previous) = self.previous_configuration {
                self.apply_linkers(graph, previous, true);
            }
            self.suspended = true;
        }
        self.rotation.writer = Some(writer);
        true
    }

    /// Move the angle during a drag. Ignored unless `writer` holds it.
    pub fn drag_to(&mut self, writer: RotationWriter, angle: f32) -> bool {
        if self.rotation.writer != Some(writer) {
            return false;
        }
        self.angle = angle;
        true
    }

    /// Release the drag and snap to the nearest quarter turn.
    pub fn end_drag(&mut self, writer: RotationWriter, config: &NavConfig) -> bool {
        if self.rotation.writer != Some(writer) {
            return false;
        }
        self.rotation.writer = None;
        let qt = config.quarter_turn_degrees;
        let target = (self.angle / qt).round_ties_even() * qt;
        self.rotation.tween = Some(AngleTween::new(
            TweenKind::Snap,
            self.angle,
            target,
            config.snap_duration,
        ));
        true
    }

    /// Advance any tween. When it completes the configuration is applied and
    /// its index returned.
    pub fn tick(&mut self, graph: &mut NavGraph, config: &NavConfig, dt: f32) -> Option<usize> {
        let tween = self.rotation.tween.as_mut()?;
        let (angle, done) = tween.advance(dt);
        self.angle = angle;
        if !done {
            return None;
        }
        self.rotation.tween = None;
        Some(self.apply_configuration(graph, config, None))
    }
}
