// Commands: the only external input to a running level.
//
// The host's input layer translates clicks and drags into `LevelCommand`s
// and passes them to `LevelState::step`, which applies them in order at the
// start of the frame before any tween or walker advances. A command naming
// a missing entity is rejected with an event, never a panic.
//
// The full flow for a click on a tile:
//   host raycast -> `LevelCommand::NavigateTo` -> `LevelState::step` ->
//   player steering plans with `pathfinding::find_path`.
//
// See also: `level.rs` for `apply_command`, `event.rs` for the output side.

use crate::platform::{Reaction, RotationWriter};
use crate::types::{NavNodeId, PlatformId, WalkerId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LevelCommand {
    /// Send a player walker to `target`. Replaces any previous request; a
    /// walker mid-edge finishes the edge first, then re-plans.
    NavigateTo { walker: WalkerId, target: NavNodeId },
    /// Freeze a walker where it stands and drop its route.
    StopWalker { walker: WalkerId },
    /// Push a platform (the pressure-plate path, or scripted triggers).
    React {
        platform: PlatformId,
        reaction: Reaction,
    },
    /// Start dragging a platform, directly or by its handle.
    BeginDrag {
        platform: PlatformId,
        writer: RotationWriter,
    },
    /// Move a dragged platform to `angle` degrees.
    DragTo {
        platform: PlatformId,
        writer: RotationWriter,
        angle: f32,
    },
    /// Release a drag; the platform snaps to the nearest quarter turn.
    EndDrag {
        platform: PlatformId,
        writer: RotationWriter,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_serialization_roundtrip() {
        let commands = vec![
            LevelCommand::NavigateTo {
                walker: WalkerId(0),
                target: NavNodeId(4),
            },
            LevelCommand::React {
                platform: PlatformId(1),
                reaction: Reaction::rotation(-90.0),
            },
            LevelCommand::DragTo {
                platform: PlatformId(1),
                writer: RotationWriter::Handle,
                angle: 37.5,
            },
        ];
        let json = serde_json::to_string(&commands).unwrap();
        let restored: Vec<LevelCommand> = serde_json::from_str(&json).unwrap();
        assert_eq!(commands, restored);
    }

    #[test]
    fn reaction_time_defaults_when_omitted() {
        let json = r#"{"React":{"platform":0,"reaction":{"units":90.0}}}"#;
        let cmd: LevelCommand = serde_json::from_str(json).unwrap();
        match cmd {
            LevelCommand::React { reaction, .. } => {
                assert_eq!(reaction.time_to_complete, 0.75);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
