//! Command implementations and argument parsing for the topodist CLI.

use std::{
    io::{self, Write},
    str::FromStr,
};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use topodist_core::{
    DistancesBuilder, DistancesConfig, LoadReport, NormalizedDistances, ObjType, Topology,
    TopologyError,
};
use tracing::{Span, field, info, instrument};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "topodist",
    about = "Attach distance matrices and locality groups to a hardware topology."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Build a synthetic topology, load distances and print the result.
    Show(ShowCommand),
}

/// Options accepted by the `show` command.
#[derive(Debug, Args, Clone)]
pub struct ShowCommand {
    /// Synthetic topology, e.g. `"numanode:4 core:2 pu:1"`.
    #[arg(long)]
    pub synthetic: String,

    /// Distance description for one object type, e.g.
    /// `numanode=0,1,2,3:2*2`. May be repeated.
    #[arg(long = "distances", value_name = "TYPE=DESCRIPTION")]
    pub distances: Vec<DistanceArg>,

    /// Ignore `TOPODIST_*_DISTANCES` and `TOPODIST_IGNORE_DISTANCES`.
    #[arg(long)]
    pub no_env: bool,

    /// Do not synthesize Group objects from distances.
    #[arg(long)]
    pub ignore_grouping: bool,
}

/// A `TYPE=DESCRIPTION` pair given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceArg {
    /// Object type the description applies to.
    pub obj_type: ObjType,
    /// Distance description in the environment grammar.
    pub description: String,
}

/// Errors raised while parsing a [`DistanceArg`].
#[derive(Debug, Error)]
pub enum DistanceArgError {
    /// The argument lacks the `=` separator.
    #[error("expected TYPE=DESCRIPTION, got `{0}`")]
    MissingSeparator(String),
    /// The type name is unknown.
    #[error(transparent)]
    Type(#[from] TopologyError),
}

impl FromStr for DistanceArg {
    type Err = DistanceArgError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (obj_type, description) = raw
            .split_once('=')
            .ok_or_else(|| DistanceArgError::MissingSeparator(raw.to_owned()))?;
        Ok(Self {
            obj_type: obj_type.parse()?,
            description: description.to_owned(),
        })
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The synthetic topology could not be built.
    #[error("invalid topology: {0}")]
    Topology(#[from] TopologyError),
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Topology enriched by the load pass.
    pub topology: Topology,
    /// What the load pass did.
    pub report: LoadReport,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when the topology cannot be built. Dropped distance
/// matrices are reported in the summary instead.
///
/// # Examples
/// ```
/// use topodist_cli::cli::{Cli, Command, ShowCommand, run_cli};
///
/// let cli = Cli {
///     command: Command::Show(ShowCommand {
///         synthetic: "numanode:4 core:2 pu:1".into(),
///         distances: vec!["numanode=0,1,2,3:2*2".parse()?],
///         no_env: true,
///         ignore_grouping: false,
///     }),
/// };
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.report.groups_created().count(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Show(show) => {
            Span::current().record("command", field::display("show"));
            run_show(show)
        }
    }
}

#[instrument(
    name = "cli.show",
    err,
    skip(command),
    fields(synthetic = %command.synthetic, overrides = command.distances.len(), env = !command.no_env),
)]
pub(super) fn run_show(command: ShowCommand) -> Result<ExecutionSummary, CliError> {
    let mut topology = Topology::synthetic(&command.synthetic)?;
    let mut distances = builder_for(&command).build();
    let report = distances.load(&mut topology);
    info!(
        objects = topology.len(),
        groups = report.groups_created().count(),
        dropped = report.diagnostics().len(),
        "command completed"
    );
    Ok(ExecutionSummary { topology, report })
}

pub(super) fn builder_for(command: &ShowCommand) -> DistancesBuilder {
    let base = if command.no_env {
        DistancesConfig::default()
    } else {
        DistancesConfig::from_env()
    };
    let builder = command.distances.iter().fold(
        DistancesBuilder::new().with_config(base),
        |builder, arg| builder.with_description(arg.obj_type, arg.description.clone()),
    );
    if command.ignore_grouping {
        builder.with_grouping(false)
    } else {
        builder
    }
}

/// Writes the enriched tree, its latency matrices and any dropped matrices.
///
/// # Errors
/// Propagates failures from `writer`.
///
/// # Examples
/// ```
/// use std::io::Cursor;
/// use topodist_cli::cli::{Cli, Command, ShowCommand, render_summary, run_cli};
///
/// let summary = run_cli(Cli {
///     command: Command::Show(ShowCommand {
///         synthetic: "numanode:2 pu:1".into(),
///         distances: Vec::new(),
///         no_env: true,
///         ignore_grouping: true,
///     }),
/// })?;
/// let mut buffer = Cursor::new(Vec::new());
/// render_summary(&summary, &mut buffer)?;
/// let text = String::from_utf8(buffer.into_inner())?;
/// assert!(text.starts_with("Machine L#0 P#0 cpuset=0-1\n"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    let topology = &summary.topology;
    for id in topology.dfs() {
        let object = topology.object(id);
        let indent = "  ".repeat(object.depth() as usize);
        write!(
            writer,
            "{indent}{} L#{}",
            object.obj_type(),
            object.logical_index()
        )?;
        if let Some(os_index) = object.os_index() {
            write!(writer, " P#{os_index}")?;
        }
        if let Some(level) = object.group_depth() {
            write!(writer, " group_depth={level}")?;
        }
        writeln!(writer, " cpuset={}", object.cpuset())?;
    }

    for id in topology.dfs() {
        let object = topology.object(id);
        for record in object.distances() {
            writeln!(
                writer,
                "latencies below {} L#{} (relative depth {}, base {}):",
                object.obj_type(),
                object.logical_index(),
                record.relative_depth(),
                record.latency_base()
            )?;
            write_latencies(&mut writer, record)?;
        }
    }

    for diagnostic in summary.report.diagnostics() {
        writeln!(writer, "{diagnostic}")?;
    }
    Ok(())
}

fn write_latencies(writer: &mut impl Write, record: &NormalizedDistances) -> io::Result<()> {
    for row in record.latencies().chunks(record.nbobjs()) {
        let cells: Vec<String> = row.iter().map(|value| format!("{value:>6.3}")).collect();
        writeln!(writer, "  {}", cells.join(" "))?;
    }
    Ok(())
}
