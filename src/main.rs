//! CLI entry point for the snapshot serializer.
//!
//! Reads a recorded node tree (fixture JSON) and prints its snapshot document.
//!
//! # Usage
//!
//! ```bash
//! # Snapshot a recorded tree with every capability enabled
//! tree-snapshot --input tree.json
//!
//! # Resolve capabilities for a specific platform version
//! tree-snapshot --input tree.json --platform-version 28
//!
//! # Take limits from a config file, print compact JSON
//! tree-snapshot --input tree.json --config snapshot.toml --compact
//! ```

use std::env;
use std::path::PathBuf;
use std::process;

use a11y_snapshot::fixture::{FixtureNode, FixtureSpec};
use a11y_snapshot::{SnapshotConfig, TreeSerializer};

/// CLI command to execute
#[derive(Debug, Clone, PartialEq)]
enum Command {
    /// Snapshot a fixture tree
    Snapshot(SnapshotArgs),
    /// Show help message
    Help,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct SnapshotArgs {
    input: PathBuf,
    platform_version: Option<u32>,
    config: Option<PathBuf>,
    compact: bool,
}

/// Parse command line arguments (without the program name)
fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Command, String> {
    let mut args = args.into_iter();
    let mut input = None;
    let mut snapshot = SnapshotArgs::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--input" | "-i" => {
                let value = args
                    .next()
                    .ok_or("--input requires a file argument (e.g., --input tree.json)")?;
                input = Some(PathBuf::from(value));
            }
            "--platform-version" | "-p" => {
                let value = args
                    .next()
                    .ok_or("--platform-version requires a number (e.g., --platform-version 34)")?;
                let version = value
                    .parse()
                    .map_err(|_| format!("Invalid platform version: {}", value))?;
                snapshot.platform_version = Some(version);
            }
            "--config" | "-c" => {
                let value = args
                    .next()
                    .ok_or("--config requires a file argument (e.g., --config snapshot.toml)")?;
                snapshot.config = Some(PathBuf::from(value));
            }
            "--compact" => snapshot.compact = true,
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }

    match input {
        Some(input) => Ok(Command::Snapshot(SnapshotArgs { input, ..snapshot })),
        None => Ok(Command::Help),
    }
}

/// Print help message to stdout
fn print_help() {
    println!("tree-snapshot - Serialize a recorded accessibility tree into a JSON snapshot");
    println!();
    println!("USAGE:");
    println!("    tree-snapshot --input <FILE> [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -i, --input <FILE>             Fixture tree JSON to snapshot");
    println!("    -p, --platform-version <N>     Resolve capabilities for platform version N");
    println!("    -c, --config <FILE>            TOML config (platform_version, max_depth, max_children)");
    println!("        --compact                  Print compact instead of pretty JSON");
    println!("    -h, --help                     Print this help message");
    println!();
    println!("OUTPUT:");
    println!("    The snapshot document is written as JSON to stdout.");
    println!("    Errors are written to stderr.");
}

/// Handle the snapshot command
fn handle_snapshot(args: &SnapshotArgs) -> i32 {
    let mut config = match &args.config {
        Some(path) => match SnapshotConfig::from_path(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("[TREE-SNAPSHOT] ❌ Failed to read config {:?}: {}", path, e);
                return 1;
            }
        },
        None => SnapshotConfig::default(),
    };
    if let Some(version) = args.platform_version {
        config = config.with_platform_version(version);
    }

    let contents = match std::fs::read_to_string(&args.input) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("[TREE-SNAPSHOT] ❌ Failed to read {:?}: {}", args.input, e);
            return 1;
        }
    };
    let spec = match FixtureSpec::from_json(&contents) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("[TREE-SNAPSHOT] ❌ Invalid tree JSON in {:?}: {}", args.input, e);
            return 1;
        }
    };

    let root = FixtureNode::root(spec);
    let capabilities = config.capabilities();
    log::debug!(
        "Capabilities for version {:?}: {:?}",
        capabilities.platform_version(),
        capabilities.iter().collect::<Vec<_>>()
    );

    let document = match TreeSerializer::new(&capabilities, &config).capture(Some(&root)) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("[TREE-SNAPSHOT] ❌ Snapshot failed: {}", e);
            return 1;
        }
    };

    let ledger = root.ledger();
    if !ledger.is_balanced() {
        log::error!(
            "{} child handles acquired, {} released",
            ledger.acquired(),
            ledger.released()
        );
    }

    let output = if args.compact {
        serde_json::to_string(&document)
    } else {
        serde_json::to_string_pretty(&document)
    };

    match output {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("[TREE-SNAPSHOT] ❌ Error serializing output: {}", e);
            1
        }
    }
}

fn main() {
    env_logger::init();

    log::debug!("tree-snapshot starting");

    let command = match parse_args(env::args().skip(1)) {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information.");
            process::exit(1);
        }
    };

    log::debug!("Executing command: {:?}", command);

    let exit_code = match command {
        Command::Snapshot(args) => handle_snapshot(&args),
        Command::Help => {
            print_help();
            0
        }
    };

    log::debug!("Exiting with code: {}", exit_code);

    process::exit(exit_code);
}
