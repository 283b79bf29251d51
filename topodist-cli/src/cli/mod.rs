//! Command-line interface for inspecting distance-derived topology groups.
//!
//! The `show` command builds a synthetic topology, loads distance matrices
//! from the environment and the command line, then prints the enriched tree.

mod commands;

pub use commands::{
    Cli, CliError, Command, DistanceArg, DistanceArgError, ExecutionSummary, ShowCommand,
    render_summary, run_cli,
};
