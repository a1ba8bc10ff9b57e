// Narrative events emitted by the level tick loop.
//
// `LevelState::step` returns these so the host (animation layer, UI, test
// harness) can react to what happened during a frame without polling the
// state: a walker arrived somewhere, a route was blocked by a platform, a
// platform finished turning, a plate was stepped on. Events carry ids only;
// look the entities up in the state for details.
//
// See also: `level.rs` which emits them, `command.rs` for the input side.
//
// **Critical constraint: determinism.** Events are emitted in processing
// order (commands, then platforms by id, then walkers by id), so the same
// inputs always yield the same event sequence.

use crate::types::{NavNodeId, PlateId, PlatformId, WalkerId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelEvent {
    /// Frame counter at emission.
    pub frame: u64,
    pub kind: LevelEventKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LevelEventKind {
    /// A walker started crossing an edge.
    WalkerDeparted {
        walker: WalkerId,
        from: NavNodeId,
        to: NavNodeId,
    },
    /// A walker finished crossing an edge.
    WalkerArrived { walker: WalkerId, node: NavNodeId },
    /// A walker came to rest (route completed or stop command).
    WalkerStopped { walker: WalkerId, node: NavNodeId },
    /// A navigation request had no route.
    PathNotFound {
        walker: WalkerId,
        from: NavNodeId,
        to: NavNodeId,
    },
    /// The next edge of a route was switched off before the walker took it.
    PathInterrupted {
        walker: WalkerId,
        at: NavNodeId,
        next: NavNodeId,
    },
    /// A platform finished rotating and applied a configuration.
    PlatformSettled {
        platform: PlatformId,
        configuration: usize,
    },
    /// A plate fired its reaction.
    PlatePressed {
        plate: PlateId,
        walker: WalkerId,
        platform: PlatformId,
    },
    /// A walker reached the goal tile. Emitted once per level.
    LevelCompleted { walker: WalkerId, node: NavNodeId },
    /// A drag was refused (platform locked or held by another writer).
    DragRefused { platform: PlatformId },
    /// A command named an entity that does not exist.
    CommandRejected { reason: String },
}
