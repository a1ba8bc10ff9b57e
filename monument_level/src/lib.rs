// monument_level: command-line authoring tool for level files.
//
// Level designers build geometry elsewhere, save it as a `LevelState`
// JSON file, and use this tool to (re)compute neighbors, prune stale edges
// after deleting tiles, and sanity-check routes without launching the game.
// Commands that edit the graph write the file back unless `--dry-run` is
// given; query commands never write.
//
// The library half holds argument parsing and command execution so both can
// be tested without spawning the binary. `main.rs` only wires them to the
// process (logging, exit codes, stdout).
//
// Dependencies: `monument_nav` for everything level-related. No dependency
// on a game engine.

use std::path::PathBuf;

use monument_nav::discovery;
use monument_nav::error::{LevelError, SearchError};
use monument_nav::level::LevelState;
use monument_nav::pathfinding::{self, NavPath};
use monument_nav::types::NavNodeId;
use thiserror::Error;

/// One tool command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Discover,
    Clear,
    ClearNull,
    Possible(NavNodeId),
    Path(NavNodeId, NavNodeId),
    Reachable(NavNodeId),
    Longest(NavNodeId),
}

impl Action {
    /// Whether the command changes the level.
    pub fn edits(self) -> bool {
        matches!(self, Self::Discover | Self::Clear | Self::ClearNull)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub action: Action,
    pub level: PathBuf,
    pub dry_run: bool,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Result of running an action against a loaded level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Human-readable lines for stdout.
    pub report: Vec<String>,
    pub modified: bool,
}

fn parse_node(arg: Option<&String>, what: &str) -> Result<NavNodeId, String> {
    arg.and_then(|s| s.parse().ok())
        .map(NavNodeId)
        .ok_or_else(|| format!("{what} requires a node index"))
}

/// Parse `<command> [args] <level.json> [--dry-run]` (program name already
/// stripped).
pub fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut dry_run = false;
    let mut positional = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            flag if flag.starts_with("--") => return Err(format!("Unknown argument: {flag}")),
            _ => positional.push(arg.clone()),
        }
    }

    let Some((command, rest)) = positional.split_first() else {
        return Err("missing command".into());
    };
    let (action, consumed) = match command.as_str() {
        "discover" => (Action::Discover, 0),
        "clear" => (Action::Clear, 0),
        "clear-null" => (Action::ClearNull, 0),
        "possible" => (Action::Possible(parse_node(rest.first(), "possible")?), 1),
        "path" => {
            let from = parse_node(rest.first(), "path")?;
            let to = parse_node(rest.get(1), "path")?;
            (Action::Path(from, to), 2)
        }
        "reachable" => (Action::Reachable(parse_node(rest.first(), "reachable")?), 1),
        "longest" => (Action::Longest(parse_node(rest.first(), "longest")?), 1),
        other => return Err(format!("Unknown command: {other}")),
    };

    match &rest[consumed..] {
        [level] => Ok(Invocation {
            action,
            level: PathBuf::from(level),
            dry_run,
        }),
        [] => Err(format!("{command} requires a level file")),
        [_, extra, ..] => Err(format!("Unexpected argument: {extra}")),
    }
}

fn format_path(path: &NavPath) -> String {
    path.nodes
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Run `action` against an in-memory level.
pub fn apply(action: Action, level: &mut LevelState) -> Result<Outcome, SearchError> {
    let (report, modified) = match action {
        Action::Discover => {
            let r = level.discover();
            (
                vec![format!(
                    "examined {} node(s), linked {} new pair(s)",
                    r.nodes_examined, r.edges_added
                )],
                r.edges_added > 0,
            )
        }
        Action::Clear => {
            let removed = discovery::clear_neighbors_for_every_node(&mut level.graph);
            (vec![format!("cleared {removed} edge(s)")], removed > 0)
        }
        Action::ClearNull => {
            let removed = discovery::clear_null_neighbors_for_every_node(&mut level.graph);
            (
                vec![format!("removed {removed} stale reference(s)")],
                removed > 0,
            )
        }
        Action::Possible(node) => {
            if !level.graph.contains(node) {
                return Err(SearchError::UnknownNode(node));
            }
            let found = discovery::possible_neighbors(
                &level.graph,
                &level.scene,
                &level.camera,
                &level.config,
                node,
            );
            let report = if found.is_empty() {
                vec![format!("{node} has no uncommitted neighbors")]
            } else {
                found.iter().map(|n| n.to_string()).collect()
            };
            (report, false)
        }
        Action::Path(from, to) => {
            let path = pathfinding::find_path(&level.graph, from, to)?;
            (vec![format_path(&path)], false)
        }
        Action::Reachable(from) => {
            let reachable = pathfinding::find_reachable_nodes(
                &level.graph,
                from,
                pathfinding::occupied(&level.graph),
            )?;
            (reachable.iter().map(|n| n.to_string()).collect(), false)
        }
        Action::Longest(from) => {
            let longest = pathfinding::find_longest_path(
                &level.graph,
                from,
                pathfinding::occupied(&level.graph),
            )?;
            let line = match longest {
                Some(path) => format_path(&path),
                None => format!("nothing reachable from {from}"),
            };
            (vec![line], false)
        }
    };
    Ok(Outcome { report, modified })
}

/// Load, apply, and write back when the action edited the level.
pub fn run(invocation: &Invocation) -> Result<Outcome, ToolError> {
    let mut level = LevelState::load(&invocation.level)?;
    let outcome = apply(invocation.action, &mut level)?;
    if invocation.action.edits() && outcome.modified {
        if invocation.dry_run {
            log::info!("dry run: not writing {}", invocation.level.display());
        } else {
            level.save(&invocation.level)?;
            log::info!("wrote {}", invocation.level.display());
        }
    }
    Ok(outcome)
}
