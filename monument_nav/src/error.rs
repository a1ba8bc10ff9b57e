// Error types for graph queries and level loading.
//
// Graph *mutation* never errors: bad input is a silent no-op reported
// through `bool`/`usize` returns (see `nav.rs`). Errors exist only where a
// caller must tell "no answer" apart from a valid answer: a search whose
// target is unreachable, or a level file that cannot be read.
//
// See also: `pathfinding.rs` (SearchError), `level.rs` (LevelError).

use crate::types::{NavNodeId, PlatformId, WalkerId};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The origin or target is not a live node of the graph.
    #[error("{0} is not a live node")]
    UnknownNode(NavNodeId),
    /// The search exhausted the active graph without reaching the target.
    #[error("no path from {from} to {to}")]
    Unreachable { from: NavNodeId, to: NavNodeId },
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed level JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown node {0}")]
    UnknownNode(NavNodeId),
    #[error("unknown platform {0}")]
    UnknownPlatform(PlatformId),
    #[error("unknown walker {0}")]
    UnknownWalker(WalkerId),
    /// Only player walkers take navigation requests.
    #[error("{0} roams on its own and ignores navigation requests")]
    NotPlayer(WalkerId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_ids() {
        let err = SearchError::Unreachable {
            from: NavNodeId(0),
            to: NavNodeId(4),
        };
        assert_eq!(err.to_string(), "no path from node#0 to node#4");
        assert_eq!(
            LevelError::UnknownPlatform(PlatformId(2)).to_string(),
            "unknown platform platform#2"
        );
    }

    #[test]
    fn json_errors_convert() {
        let parse: Result<u32, _> = serde_json::from_str("nope");
        let err: LevelError = parse.unwrap_err().into();
        assert!(matches!(err, LevelError::Json(_)));
    }
}
