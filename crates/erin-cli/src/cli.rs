use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "erin", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Simulate every scenario in a TOML input file
    Run {
        /// Path to the input TOML file
        toml_file: PathBuf,
        /// Write per-snapshot events to this CSV
        #[arg(short = 'e', long = "events")]
        events: Option<PathBuf>,
        /// Write folded occurrence statistics to this CSV
        #[arg(short = 's', long = "stats")]
        stats: Option<PathBuf>,
        /// Reporting step, in hours (reserved for future resampling; snapshots are event-driven)
        #[arg(short = 't', long = "step-h")]
        step_h: Option<f64>,
        /// Increase verbosity (stacks; each occurrence drops the log level by one step)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
        /// Disable group aggregation: write one stats row per occurrence
        /// instead of one averaged row per scenario
        #[arg(short = 'n', long = "no-aggregate")]
        no_aggregate: bool,
        /// Also write each component's merged reliability schedule to
        /// `<stats or events path>.reliability.csv`
        #[arg(short = 'r', long = "reliability-curves")]
        reliability_curves: bool,
    },
    /// Render a scenario file's component topology as Graphviz DOT
    Graph {
        /// Path to the input TOML file
        toml_file: PathBuf,
        /// Write the DOT output to this file instead of stdout
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
        /// Print topology statistics (nodes, edges, islands) instead of DOT
        #[arg(short = 's', long = "stats")]
        stats: bool,
    },
    /// Parse and validate a scenario file without simulating it
    Check {
        /// Path to the input TOML file
        toml_file: PathBuf,
    },
    /// Rewrite a scenario file's `input_format_version` to the current version
    Update {
        /// Path to the input TOML file
        in_toml: PathBuf,
        /// Output path (defaults to overwriting `in_toml`)
        out_toml: Option<PathBuf>,
        /// Print a summary of what changed
        #[arg(short = 's', long = "summary")]
        summary: bool,
    },
    /// Export every schedule-bearing component's load as one wide CSV
    PackLoads {
        /// Path to the input TOML file
        toml_file: PathBuf,
        /// Output CSV path
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
    },
    /// Print version information
    Version,
    /// Print engine limits (max propagation rounds, etc.)
    Limits,
}
