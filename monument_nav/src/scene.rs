// Scene geometry queries consumed by adjacency discovery.
//
// Discovery needs exactly two things from the host's physics layer: cast a
// ray and learn which object it hit first, and walk an object's parent
// chain (stair meshes parent their collider under the node's object). The
// `SceneQuery` trait is that boundary. A real engine binding implements it
// over its own physics; `BoxScene` is the stand-alone implementation used
// by the level file, the CLI and the tests: a flat list of axis-aligned box
// colliders.
//
// Raycasts ignore any collider that contains the ray origin, matching
// engine physics where a ray starting inside a collider does not report it.
// A node casting from its own center therefore never hits itself.
//
// See also: `discovery.rs` which drives raycasts, `nav.rs` for
// `NavGraph::node_for_object` which resolves hit objects to nodes.
//
// **Critical constraint: determinism.** Hits at equal distance are broken
// by collider insertion order. The parent map is lookup-only.

use crate::geometry::Vec3;
use crate::types::SceneObjectId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// First object struck by a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub object: SceneObjectId,
}

pub trait SceneQuery {
    /// Cast an unbounded ray. `direction` need not be normalized; the
    /// reported distance is in world units regardless.
    fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<RayHit>;

    /// The object `object` is parented under, if any.
    fn parent_of(&self, object: SceneObjectId) -> Option<SceneObjectId>;
}

/// An axis-aligned box collider owned by a scene object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxCollider {
    pub object: SceneObjectId,
    /// Set for child colliders (stair meshes) hanging under a node object.
    #[serde(default)]
    pub parent: Option<SceneObjectId>,
    pub min: Vec3,
    pub max: Vec3,
}

impl BoxCollider {
    /// A cube of edge `size` centered on `center`.
    pub fn cube(object: SceneObjectId, center: Vec3, size: f32) -> Self {
        let half = Vec3::new(size, size, size) * 0.5;
        Self {
            object,
            parent: None,
            min: center - half,
            max: center + half,
        }
    }

    fn contains(&self, p: Vec3) -> bool {
        (0..3).all(|a| p.axis(a) >= self.min.axis(a) && p.axis(a) <= self.max.axis(a))
    }

    /// Slab test. Returns the entry distance along a unit `dir`.
    fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let mut t_near = 0.0f32;
        let mut t_far = f32::INFINITY;
        for axis in 0..3 {
            let o = origin.axis(axis);
            let d = dir.axis(axis);
            let lo = self.min.axis(axis);
            let hi = self.max.axis(axis);
            if d.abs() < 1e-8 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (t0, t1) = {
                let a = (lo - o) * inv;
                let b = (hi - o) * inv;
                if a <= b { (a, b) } else { (b, a) }
            };
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }
        Some(t_near)
    }
}

/// A scene made of box colliders.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BoxScene {
    pub colliders: Vec<BoxCollider>,
    /// Lowest object id not yet used by any collider.
    #[serde(default)]
    next_object: u32,
    #[serde(skip)]
    parents: FxHashMap<SceneObjectId, SceneObjectId>,
}

impl BoxScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, collider: BoxCollider) {
        self.reserve(collider.object);
        if let Some(parent) = collider.parent {
            self.reserve(parent);
            self.parents.insert(collider.object, parent);
        }
        self.colliders.push(collider);
    }

    /// A fresh object id, never equal to one already in the scene,
    /// including ids chosen by hand for child colliders.
    pub fn allocate_object(&mut self) -> SceneObjectId {
        let id = SceneObjectId(self.next_object);
        self.reserve(id);
        id
    }

    fn reserve(&mut self, object: SceneObjectId) {
        self.next_object = self.next_object.max(object.0.saturating_add(1));
    }

    /// Add a unit cube for `object` centered on `center`.
    pub fn add_cube(&mut self, object: SceneObjectId, center: Vec3) {
        self.add(BoxCollider::cube(object, center, 1.0));
    }

    /// Add a collider owned by a child object parented under `parent`.
    pub fn add_child(&mut self, mut collider: BoxCollider, parent: SceneObjectId) {
        collider.parent = Some(parent);
        self.add(collider);
    }

    /// Drop every collider of `object`, e.g. when its node is destroyed.
    pub fn remove_object(&mut self, object: SceneObjectId) {
        self.colliders.retain(|c| c.object != object);
        self.parents.remove(&object);
    }

    pub fn rebuild_index(&mut self) {
        self.parents = self
            .colliders
            .iter()
            .filter_map(|c| c.parent.map(|p| (c.object, p)))
            .collect();
        let used: Vec<_> = self
            .colliders
            .iter()
            .flat_map(|c| std::iter::once(c.object).chain(c.parent))
            .collect();
        for object in used {
            self.reserve(object);
        }
    }
}

impl SceneQuery for BoxScene {
    fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        let dir = direction.normalized();
        if dir == Vec3::ZERO {
            return None;
        }
        let mut best: Option<RayHit> = None;
        for collider in &self.colliders {
            if collider.contains(origin) {
                continue;
            }
            let Some(distance) = collider.intersect(origin, dir) else {
                continue;
            };
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(RayHit {
                    distance,
                    object: collider.object,
                });
            }
        }
        best
    }

    fn parent_of(&self, object: SceneObjectId) -> Option<SceneObjectId> {
        self.parents.get(&object).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cubes(gap: f32) -> BoxScene {
        let mut scene = BoxScene::new();
        scene.add_cube(SceneObjectId(0), Vec3::ZERO);
        scene.add_cube(SceneObjectId(1), Vec3::new(1.0 + gap, 0.0, 0.0));
        scene
    }

    #[test]
    fn ray_skips_own_collider() {
        let scene = two_cubes(0.0);
        let hit = scene.raycast(Vec3::ZERO, Vec3::RIGHT).unwrap();
        assert_eq!(hit.object, SceneObjectId(1));
        assert!((hit.distance - 0.5).abs() < 1e-6);
    }

    #[test]
    fn ray_reports_nearest_hit() {
        let mut scene = two_cubes(0.0);
        scene.add_cube(SceneObjectId(2), Vec3::new(3.0, 0.0, 0.0));
        let hit = scene.raycast(Vec3::ZERO, Vec3::RIGHT).unwrap();
        assert_eq!(hit.object, SceneObjectId(1));
    }

    #[test]
    fn ray_misses_behind_and_beside() {
        let scene = two_cubes(0.0);
        assert!(scene.raycast(Vec3::ZERO, -Vec3::RIGHT).is_none());
        assert!(scene.raycast(Vec3::ZERO, Vec3::UP).is_none());
        assert!(scene.raycast(Vec3::ZERO, Vec3::ZERO).is_none());
    }

    #[test]
    fn unnormalized_direction_reports_world_distance() {
        let scene = two_cubes(1.0);
        let hit = scene
            .raycast(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0))
            .unwrap();
        assert!((hit.distance - 1.5).abs() < 1e-6);
    }

    #[test]
    fn child_colliders_know_their_parent() {
        let mut scene = BoxScene::new();
        scene.add_child(
            BoxCollider::cube(SceneObjectId(10), Vec3::ZERO, 1.0),
            SceneObjectId(3),
        );
        assert_eq!(scene.parent_of(SceneObjectId(10)), Some(SceneObjectId(3)));
        assert_eq!(scene.parent_of(SceneObjectId(3)), None);

        let json = serde_json::to_string(&scene).unwrap();
        let mut restored: BoxScene = serde_json::from_str(&json).unwrap();
        restored.rebuild_index();
        assert_eq!(restored.parent_of(SceneObjectId(10)), Some(SceneObjectId(3)));
    }

    #[test]
    fn allocated_objects_skip_hand_picked_ids() {
        let mut scene = BoxScene::new();
        assert_eq!(scene.allocate_object(), SceneObjectId(0));
        scene.add_child(
            BoxCollider::cube(SceneObjectId(4), Vec3::UP, 1.0),
            SceneObjectId(0),
        );
        assert_eq!(scene.allocate_object(), SceneObjectId(5));
        assert_eq!(scene.allocate_object(), SceneObjectId(6));
    }

    #[test]
    fn allocation_resumes_after_load() {
        let mut scene = two_cubes(0.0);
        // Files written before the counter existed carry no `next_object`.
        let json = r#"{"colliders": [
            {"object": 7, "min": {"x": 0, "y": 0, "z": 0}, "max": {"x": 1, "y": 1, "z": 1}}
        ]}"#;
        let mut restored: BoxScene = serde_json::from_str(json).unwrap();
        restored.rebuild_index();
        assert_eq!(restored.allocate_object(), SceneObjectId(8));
        assert_eq!(scene.allocate_object(), SceneObjectId(2));
    }

    #[test]
    fn removed_objects_stop_blocking_rays() {
        let mut scene = two_cubes(0.0);
        scene.remove_object(SceneObjectId(1));
        assert!(scene.raycast(Vec3::ZERO, Vec3::RIGHT).is_none());
    }
}
