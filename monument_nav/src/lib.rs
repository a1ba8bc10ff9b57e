// monument_nav: navigation for impossible-geometry puzzle levels.
//
// Walkable tiles form an undirected graph whose edges come from two
// sources: physical adjacency (short raycasts between neighboring tiles)
// and perspective adjacency (tiles whose edges line up on screen under an
// orthographic camera, even when they are far apart in 3D). Rotating
// platforms switch edges on and off as they turn, and walkers route over
// whatever edges are currently active. The crate has no engine dependency:
// the host supplies a scene to raycast against and a camera to project
// through, or uses the box-collider scene and isometric camera built in.
//
// Module overview:
// - `level.rs`:       LevelState, pressure plates, the per-frame tick loop, save/load.
// - `nav.rs`:         NavGraph / NavNode: arena-stored nodes with per-edge active flags.
// - `discovery.rs`:   Raycast and perspective neighbor discovery, batch edge maintenance.
// - `perspective.rs`: Camera projection and the per-node screen-space joint cache.
// - `scene.rs`:       SceneQuery seam plus an axis-aligned box collider scene.
// - `pathfinding.rs`: BFS shortest path, reachable set, farthest node.
// - `platform.rs`:    Rotating platforms, linkers, drag and reaction tweens.
// - `walker.rs`:      Walkers crossing edges, player and crow steering.
// - `command.rs`:     LevelCommand, all external input to a running level.
// - `event.rs`:       LevelEvent, what happened during a frame.
// - `config.rs`:      NavConfig: distances, tolerances, timings.
// - `geometry.rs`:    Vec3 / Vec2 / Basis math.
// - `error.rs`:       SearchError and LevelError.
// - `types.rs`:       Typed ids for nodes, platforms, walkers, plates, scene objects.
// - `prng`:           Re-exported from `monument_prng`, the seeded RNG for roaming walkers.
//
// **Critical constraint: determinism.** Given the same level and the same
// command stream, `step()` produces the same events. Iteration order is by
// id everywhere (Vec arenas, BTreeSet results), hash maps are used only
// for point lookups, and the only randomness comes from seeded RNGs stored
// in the level.

pub mod command;
pub mod config;
pub mod discovery;
pub mod error;
pub mod event;
pub mod geometry;
pub mod level;
pub mod nav;
pub mod pathfinding;
pub mod perspective;
pub mod platform;
pub use monument_prng as prng;
pub mod scene;
pub mod types;
pub mod walker;
