// CLI entry point for the level authoring tool.
//
// Loads a level JSON file, runs one command against it, prints the result,
// and writes the file back for editing commands. See `lib.rs` for parsing
// and execution. Set `RUST_LOG=debug` for per-node discovery output.
//
// Usage:
//   monument_level <COMMAND> <level.json> [--dry-run]
//     discover               Rebuild neighbors from geometry and camera
//     clear                  Remove every neighbor
//     clear-null             Prune references to deleted nodes
//     possible <NODE>        List discovered but uncommitted neighbors
//     path <FROM> <TO>       Print the shortest path
//     reachable <FROM>       Print every node reachable from FROM
//     longest <FROM>         Print the path to the farthest node

use monument_level::{parse_args, run};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        std::process::exit(0);
    }

    let invocation = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("{e}");
        print_usage();
        std::process::exit(1);
    });

    match run(&invocation) {
        Ok(outcome) => {
            for line in outcome.report {
                println!("{line}");
            }
        }
        Err(e) => {
            eprintln!("{}: {e}", invocation.level.display());
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Usage: monument_level <COMMAND> <level.json> [--dry-run]");
    println!();
    println!("Commands:");
    println!("  discover               Rebuild neighbors from geometry and camera");
    println!("  clear                  Remove every neighbor");
    println!("  clear-null             Prune references to deleted nodes");
    println!("  possible <NODE>        List discovered but uncommitted neighbors");
    println!("  path <FROM> <TO>       Print the shortest path");
    println!("  reachable <FROM>       Print every node reachable from FROM");
    println!("  longest <FROM>         Print the path to the farthest node");
    println!();
    println!("Options:");
    println!("  --dry-run              Do not write the level file back");
    println!("  --help, -h             Show this help");
}
