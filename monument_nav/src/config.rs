// Data-driven navigation configuration.
//
// Every tunable constant of graph discovery, walker movement and platform
// rotation lives in `NavConfig`, which is embedded in the level file and
// loaded from JSON. Code never hard-codes the adjacency distance, the joint
// tolerance or the quarter-turn angle; it reads them from here. Every field
// has a serde default so older level files keep loading when a knob is
// added.
//
// See also: `discovery.rs` (adjacency distance, joint offset/tolerance),
// `platform.rs` (quarter turn, configuration count, snap duration),
// `walker.rs` (time to arrive), `level.rs` which owns the config.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Largest raycast hit distance (world units, inclusive) at which two
    /// nodes count as geometrically adjacent.
    pub adjacency_max_distance: f32,

    /// Distance from a node's walk point to each of its four perspective
    /// joints, along the node's local cardinals.
    pub joint_offset: f32,

    /// Two joints closer than this on screen (pixels, inclusive) are
    /// considered the same point.
    pub joint_tolerance: f32,

    /// Height above the tile of configuration 0's default walk-point offset.
    pub default_walk_point_height: f32,

    /// Seconds a walker spends crossing one edge.
    pub walker_time_to_arrive: f32,

    /// Seconds the snap-to-quarter-turn tween takes after a drag ends.
    pub snap_duration: f32,

    /// Degrees per rotation state.
    pub quarter_turn_degrees: f32,

    /// Number of rotation states (and linker configurations) per platform.
    pub configuration_count: usize,
}

impl NavConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            adjacency_max_distance: 1.0,
            joint_offset: 0.5,
            joint_tolerance: 0.1,
            default_walk_point_height: 0.5,
            walker_time_to_arrive: 0.25,
            snap_duration: 0.25,
            quarter_turn_degrees: 90.0,
            configuration_count: 4,
        }
    }
}
