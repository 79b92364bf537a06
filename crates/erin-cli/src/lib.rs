//! # erin-cli: Command-Line Interface
//!
//! The user-facing front end for ERIN, the energy-resilience simulation
//! engine. Loads a TOML scenario file through `erin-io`, drives
//! `erin-core`'s propagation kernel across every scenario occurrence, and
//! writes the resulting events/stats CSVs or DOT topology graphs.
//!
//! ## Command Structure
//!
//! ```text
//! erin
//! ├── run <toml_file>          # simulate every scenario, write CSVs
//! ├── graph <toml_file>        # render or summarize the component topology
//! ├── check <toml_file>        # parse and validate only
//! ├── update <in.toml>         # rewrite simulation_info.input_format_version
//! ├── pack-loads <toml_file>   # export schedule-bearing loads as one CSV
//! ├── version                  # print version information
//! └── limits                   # print engine limits
//! ```
//!
//! ## Error Handling
//!
//! - Exit code 0 on success
//! - Exit code 1 on any error (parse, validation, or runtime)
//! - Diagnostics are logged to stdout tagged `[ERROR]` / `[WARNING]` / `[INFO]`

pub mod cli;
pub mod commands;
pub mod common;

pub use cli::{Cli, Commands};
