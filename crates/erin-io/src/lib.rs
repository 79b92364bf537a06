//! TOML model loading and CSV/DOT/report writers for ERIN (§6, §9).
//!
//! This crate is the boundary between the simulation-only `erin-core`
//! engine and the outside world: it turns an input TOML file into an
//! `erin_core::Model` plus its scenarios, and turns simulation output
//! back into the CSV/DOT formats the `run`/`graph`/`pack-loads`
//! subcommands emit. It reuses `erin_core::diagnostics` so one
//! `Diagnostics` report can carry both parse-time and model-build-time
//! issues.

pub mod connref;
pub mod distributions;
pub mod error;
pub mod fragility;
pub mod load;
pub mod model_build;
pub mod report;
pub mod schema;
pub mod units_parse;
pub mod update;

pub use error::{IoError, IoResult};
pub use load::{load_scenario_file, parse_document, LoadedScenarioFile, SimulationInfo};
