// Identifier types shared across the navigation crate.
//
// Every entity in a level is addressed by a compact integer handle rather
// than a reference: nodes, platforms, walkers, pressure plates, and the
// scene objects that colliders belong to. Handles are assigned sequentially
// in authoring order and are never reused, so a handle that outlives its
// entity (a destroyed node still listed as someone's neighbor) is detectable
// by lookup instead of dangling.
//
// See also: `geometry.rs` for the spatial value types, `nav.rs` for the
// `NavGraph` that hands out `NavNodeId`s, `level.rs` for the owner of the
// other id spaces.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! handle_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Index into the owning `Vec`.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

handle_id!(
    /// A vertex of the navigation graph (one walkable tile).
    NavNodeId,
    "node"
);
handle_id!(
    /// A rotating platform that owns nodes and linker configurations.
    PlatformId,
    "platform"
);
handle_id!(
    /// A walker (player or crow) moving over the graph.
    WalkerId,
    "walker"
);
handle_id!(
    /// A pressure plate that fires a reaction when stepped on.
    PlateId,
    "plate"
);
handle_id!(
    /// A scene object that owns a collider. Node objects and the child
    /// colliders parented under them (stair meshes) share this space;
    /// `BoxScene::allocate_object` hands out fresh ones.
    SceneObjectId,
    "object"
);
