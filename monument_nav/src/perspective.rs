// Perspective joints: screen-space fingerprints of a node's footprint.
//
// The impossible-geometry trick connects tiles that only *look* adjacent
// from the fixed camera. Each node gets four joints: its walk point pushed
// half a tile along each local cardinal (forward, back, left, right), then
// projected to the screen. Two nodes whose joints coincide on screen are
// visually touching and get linked by discovery even if no ray connects
// them in 3D.
//
// The camera is fixed for a level, so joints are computed once per node and
// cached for one discovery pass. Each pass builds a fresh cache, which picks
// up walk points moved by platforms since the last one.
//
// See also: `discovery.rs` which compares joints, `geometry.rs` for
// `Basis::cardinals`, `level.rs` which owns the camera.

use crate::config::NavConfig;
use crate::geometry::{Vec2, Vec3};
use crate::nav::NavGraph;
use crate::types::NavNodeId;
use serde::{Deserialize, Serialize};

/// World-to-screen projection of the active camera.
pub trait ScreenProjector {
    fn world_to_screen(&self, point: Vec3) -> Vec2;
}

/// An orthographic camera described by its screen axes in world space.
///
/// Points that differ only along the view direction (the axis orthogonal to
/// both `right` and `up`) land on the same pixel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrthographicCamera {
    pub right: Vec3,
    pub up: Vec3,
    pub pixels_per_unit: f32,
    /// Screen position of the world origin.
    #[serde(default)]
    pub center: Vec2,
}

impl OrthographicCamera {
    /// The classic isometric view looking down the (1, 1, 1) diagonal.
    pub fn isometric(pixels_per_unit: f32) -> Self {
        let s2 = std::f32::consts::FRAC_1_SQRT_2;
        let s6 = 1.0 / 6.0f32.sqrt();
        Self {
            right: Vec3::new(s2, 0.0, -s2),
            up: Vec3::new(-s6, 2.0 * s6, -s6),
            pixels_per_unit,
            center: Vec2::default(),
        }
    }
}

impl Default for OrthographicCamera {
    fn default() -> Self {
        Self::isometric(100.0)
    }
}

impl ScreenProjector for OrthographicCamera {
    fn world_to_screen(&self, point: Vec3) -> Vec2 {
        Vec2::new(
            self.center.x + point.dot(self.right) * self.pixels_per_unit,
            self.center.y + point.dot(self.up) * self.pixels_per_unit,
        )
    }
}

/// Lazily computed joints per node, indexed by `NavNodeId`.
#[derive(Clone, Debug)]
pub struct JointCache {
    joints: Vec<Option<[Vec2; 4]>>,
    joint_offset: f32,
    tolerance: f32,
}

impl JointCache {
    pub fn new(config: &NavConfig) -> Self {
        Self {
            joints: Vec::new(),
            joint_offset: config.joint_offset,
            tolerance: config.joint_tolerance,
        }
    }

    /// Compute and cache the joints of `node` if not already cached.
    /// Returns `None` for a missing node.
    pub fn initialize(
        &mut self,
        graph: &NavGraph,
        projector: &impl ScreenProjector,
        node: NavNodeId,
    ) -> Option<[Vec2; 4]> {
        if let Some(Some(cached)) = self.joints.get(node.index()) {
            return Some(*cached);
        }
        let n = graph.node(node)?;
        let walk = n.walk_point();
        let joints = n
            .basis
            .cardinals()
            .map(|dir| projector.world_to_screen(walk + dir * self.joint_offset));
        if self.joints.len() <= node.index() {
            self.joints.resize(node.index() + 1, None);
        }
        self.joints[node.index()] = Some(joints);
        Some(joints)
    }

    pub fn joints(&self, node: NavNodeId) -> Option<&[Vec2; 4]> {
        self.joints.get(node.index()).and_then(Option::as_ref)
    }

    /// True if any joint of `a` lies within tolerance of any joint of `b`
    /// on screen. Initializes both nodes on demand; a missing node is never
    /// connected.
    pub fn are_joints_connected(
        &mut self,
        graph: &NavGraph,
        projector: &impl ScreenProjector,
        a: NavNodeId,
        b: NavNodeId,
    ) -> bool {
        let (Some(ja), Some(jb)) = (
            self.initialize(graph, projector, a),
            self.initialize(graph, projector, b),
        ) else {
            return false;
        };
        ja.iter()
            .any(|p| jb.iter().any(|q| p.distance(*q) <= self.tolerance))
    }
}
