//! # erin-core: Energy Resilience of Interacting Networks simulation engine
//!
//! Models a facility's energy network as a directed graph of typed
//! components (loads, sources, converters, movers, muxes, stores,
//! switches) connected by typed flows, and simulates how demand and
//! supply propagate through it under both normal operation and
//! component failure (§3, §4).
//!
//! ## Design philosophy
//!
//! Components and connections are stored as struct-of-arrays tables
//! ([`component::ComponentTable`], [`connection::ConnectionTable`])
//! addressed by newtype indices ([`ids`]), not as a `dyn Component`
//! trait object graph. This keeps the propagation kernel's hot loop
//! (`kernel::run_active_connections`) scanning flat arrays, and makes a
//! `ConnectionId` and a `ComponentId` distinct types even though both
//! are `usize` underneath.
//!
//! A [`model::Model`] is built once and treated as read-only for the
//! rest of a run; all per-occurrence mutation lives in
//! [`state::SimulationState`], which is cheap to reset between scenario
//! occurrences ([`scenario::run_occurrence`]).
//!
//! ## Quick start
//!
//! ```rust
//! use erin_core::component::{ConstantLoadRow, ConstantSourceRow};
//! use erin_core::connection::Connection;
//! use erin_core::ids::WILDCARD_FLOW_TYPE;
//! use erin_core::model::Model;
//!
//! let mut model = Model::new();
//! let source = model.components.add_constant_source(
//!     "utility",
//!     ConstantSourceRow { available_w: erin_core::units::Watts::new(5_000), outflow_conn: None },
//! );
//! let load = model.components.add_constant_load(
//!     "building",
//!     ConstantLoadRow { load_w: erin_core::units::Watts::new(1_200), inflow_conn: None },
//! );
//! model
//!     .connect(Connection { from_id: source, from_port: 0, to_id: load, to_port: 0, flow_type: WILDCARD_FLOW_TYPE })
//!     .unwrap();
//! model.validate().unwrap();
//! ```

pub mod calendar;
pub mod component;
pub mod connection;
pub mod diagnostics;
pub mod error;
pub mod flow;
pub mod ids;
pub mod kernel;
pub mod model;
pub mod reliability;
pub mod scenario;
pub mod state;
pub mod stats;
pub mod storage;
pub mod units;

pub use component::{Component, ComponentKind, ComponentTable};
pub use connection::{Connection, ConnectionTable};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{ErinError, ErinResult};
pub use flow::{Flow, FlowTable, FlowTypeInterner};
pub use ids::{ComponentId, ConnectionId, FlowTypeId};
pub use model::Model;
pub use reliability::{Distribution, FragilityCurve, ReliabilitySchedule};
pub use scenario::{FailureModeSpec, FragilityModeSpec, Occurrence, ReliabilityModeStats, ScenarioSpec};
pub use stats::{ScenarioOccurrenceStats, Snapshot};
pub use units::{Joules, Seconds, Watts};
