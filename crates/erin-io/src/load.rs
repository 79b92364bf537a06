//! Top-level TOML document loader: turns one input file into a
//! [`Model`], its [`ScenarioSpec`]s, and a [`SimulationInfo`] header,
//! collecting [`Diagnostics`] along the way rather than aborting on the
//! first bad table (§6/§7: "Parsing errors are collected, not thrown").
//!
//! Table layout (§6): `simulation_info`, `loads.<tag>`, `components.<tag>`,
//! `network.connections = [[from, to, flow], …]`, `dist.<tag>`,
//! `scenarios.<tag>`, `failure_mode.<tag>`, `fragility_mode.<tag>`,
//! `fragility_curve.<tag>`, `intensity.<tag>`.

use crate::connref::parse_port_ref;
use crate::distributions::parse_distribution;
use crate::error::{IoError, IoResult};
use crate::fragility::parse_fragility_curve;
use crate::model_build::{add_component, wire_connection};
use crate::units_parse::{numeric_field, time_field, time_rate_pairs};
use erin_core::component::SchedulePoint;
use erin_core::diagnostics::Diagnostics;
use erin_core::ids::ComponentId;
use erin_core::model::Model;
use erin_core::reliability::{Distribution, FragilityCurve};
use erin_core::scenario::{FailureModeSpec, FragilityModeSpec, ScenarioSpec};
use erin_core::units::{Seconds, TimeUnit};
use std::collections::HashMap;
use std::path::Path;

/// Header fields from `[simulation_info]` (§6; field names follow
/// `erin_next_simulation_info.h` in `original_source/`).
#[derive(Debug, Clone)]
pub struct SimulationInfo {
    pub input_format_version: String,
    pub time_unit: TimeUnit,
    pub max_time_s: Seconds,
    pub random_seed: Option<u64>,
}

impl Default for SimulationInfo {
    fn default() -> Self {
        Self {
            input_format_version: String::new(),
            time_unit: TimeUnit::Second,
            max_time_s: 0.0,
            random_seed: None,
        }
    }
}

/// Everything built from one input file.
pub struct LoadedScenarioFile {
    pub model: Model,
    pub scenarios: Vec<ScenarioSpec>,
    pub simulation_info: SimulationInfo,
    pub diagnostics: Diagnostics,
}

pub fn load_scenario_file(path: &Path) -> IoResult<LoadedScenarioFile> {
    let contents = std::fs::read_to_string(path).map_err(|source| IoError::Read { path: path.display().to_string(), source })?;
    let doc: toml::Table = toml::from_str(&contents).map_err(|source| IoError::Toml { path: path.display().to_string(), source })?;
    Ok(parse_document(&doc))
}

fn sub_table<'a>(doc: &'a toml::Table, name: &str) -> impl Iterator<Item = (&'a String, &'a toml::Table)> {
    doc.get(name)
        .and_then(toml::Value::as_table)
        .into_iter()
        .flat_map(|t| t.iter())
        .filter_map(|(tag, v)| v.as_table().map(|t| (tag, t)))
}

fn parse_simulation_info(doc: &toml::Table, diagnostics: &mut Diagnostics) -> SimulationInfo {
    let mut info = SimulationInfo::default();
    let Some(table) = doc.get("simulation_info").and_then(toml::Value::as_table) else {
        diagnostics.add_error_with_entity("parse", "missing required table 'simulation_info'", "simulation_info");
        return info;
    };
    info.input_format_version = table.get("input_format_version").and_then(|v| v.as_str()).unwrap_or("").to_string();
    match time_field(table, "max_time") {
        Some(v) => info.max_time_s = v,
        None => diagnostics.add_error_with_entity("parse", "missing or invalid 'max_time'", "simulation_info"),
    }
    info.random_seed = table.get("random_seed").and_then(toml::Value::as_integer).map(|i| i as u64);
    info
}

/// `loads.<tag>` holds a reusable `rate` time series, consumed by
/// `schedule_based_load`/`schedule_based_source` components via a
/// `loads = "<tag>"` reference (as an alternative to an inline
/// `schedule` array directly on the component).
fn parse_named_loads(doc: &toml::Table, diagnostics: &mut Diagnostics) -> HashMap<String, Vec<SchedulePoint>> {
    let mut loads = HashMap::new();
    for (tag, table) in sub_table(doc, "loads") {
        let entity = format!("loads.{tag}");
        match time_rate_pairs(table, "rate") {
            Some(pairs) => {
                let schedule = pairs.into_iter().map(|(time_s, amount_w)| SchedulePoint { time_s, amount_w }).collect();
                loads.insert(tag.clone(), schedule);
            }
            None => diagnostics.add_error_with_entity("parse", "missing or invalid 'rate'", &entity),
        }
    }
    loads
}

/// Resolves a `loads = "<tag>"` reference on a schedule-bearing component
/// table into an inline `schedule` array, so [`add_component`] only ever
/// has to deal with one representation.
fn resolve_load_reference(
    tag: &str,
    table: &toml::Table,
    named_loads: &HashMap<String, Vec<SchedulePoint>>,
    diagnostics: &mut Diagnostics,
) -> toml::Table {
    if table.contains_key("schedule") {
        return table.clone();
    }
    let Some(load_tag) = table.get("loads").and_then(|v| v.as_str()) else {
        return table.clone();
    };
    let Some(schedule) = named_loads.get(load_tag) else {
        diagnostics.add_error_with_entity("parse", &format!("unknown loads reference '{load_tag}'"), &format!("components.{tag}"));
        return table.clone();
    };
    let mut resolved = table.clone();
    let array: Vec<toml::Value> = schedule
        .iter()
        .map(|p| toml::Value::Array(vec![toml::Value::Float(p.time_s), toml::Value::Integer(p.amount_w as i64)]))
        .collect();
    resolved.insert("schedule".to_string(), toml::Value::Array(array));
    resolved
}

fn parse_distributions(doc: &toml::Table, diagnostics: &mut Diagnostics) -> HashMap<String, Distribution> {
    let mut out = HashMap::new();
    for (tag, table) in sub_table(doc, "dist") {
        if let Some(dist) = parse_distribution(tag, table, diagnostics) {
            out.insert(tag.clone(), dist);
        }
    }
    out
}

fn parse_fragility_curves(doc: &toml::Table, diagnostics: &mut Diagnostics) -> HashMap<String, FragilityCurve> {
    let mut out = HashMap::new();
    for (tag, table) in sub_table(doc, "fragility_curve") {
        if let Some(curve) = parse_fragility_curve(tag, table, diagnostics) {
            out.insert(tag.clone(), curve);
        }
    }
    out
}

fn parse_intensities(doc: &toml::Table, diagnostics: &mut Diagnostics) -> HashMap<String, f64> {
    let mut out = HashMap::new();
    for (tag, table) in sub_table(doc, "intensity") {
        match numeric_field(table, "value") {
            Some(v) => {
                out.insert(tag.clone(), v);
            }
            None => diagnostics.add_error_with_entity("parse", "missing or invalid 'value'", &format!("intensity.{tag}")),
        }
    }
    out
}

fn parse_components(
    doc: &toml::Table,
    named_loads: &HashMap<String, Vec<SchedulePoint>>,
    model: &mut Model,
    diagnostics: &mut Diagnostics,
) -> HashMap<String, ComponentId> {
    let mut tags = HashMap::new();
    for (tag, table) in sub_table(doc, "components") {
        let resolved = resolve_load_reference(tag, table, named_loads, diagnostics);
        if let Some(id) = add_component(model, tag, &resolved, diagnostics) {
            tags.insert(tag.clone(), id);
        }
    }
    tags
}

fn parse_connections(doc: &toml::Table, tags: &HashMap<String, ComponentId>, model: &mut Model, diagnostics: &mut Diagnostics) {
    let Some(network) = doc.get("network").and_then(toml::Value::as_table) else {
        return;
    };
    let Some(connections) = network.get("connections").and_then(toml::Value::as_array) else {
        return;
    };
    for (i, entry) in connections.iter().enumerate() {
        let entity = format!("network.connections[{i}]");
        let Some(triple) = entry.as_array() else {
            diagnostics.add_error_with_entity("parse", "connection entry must be an array", &entity);
            continue;
        };
        if triple.len() < 2 || triple.len() > 3 {
            diagnostics.add_error_with_entity("parse", "connection entry must have 2 or 3 elements", &entity);
            continue;
        }
        let (Some(from_raw), Some(to_raw)) = (triple[0].as_str(), triple[1].as_str()) else {
            diagnostics.add_error_with_entity("parse", "connection endpoints must be strings", &entity);
            continue;
        };
        let flow_tag = triple.get(2).and_then(|v| v.as_str()).unwrap_or("*");

        let (Some(from_ref), Some(to_ref)) = (parse_port_ref(from_raw), parse_port_ref(to_raw)) else {
            diagnostics.add_error_with_entity("parse", "malformed connection endpoint syntax", &entity);
            continue;
        };
        let (Some(&from_id), Some(&to_id)) = (tags.get(&from_ref.tag), tags.get(&to_ref.tag)) else {
            diagnostics.add_error_with_entity("parse", "connection references unknown component tag", &entity);
            continue;
        };
        let flow_type = model.flow_types.intern(flow_tag);
        let conn = erin_core::connection::Connection {
            from_id,
            from_port: from_ref.port,
            to_id,
            to_port: to_ref.port,
            flow_type,
        };
        match model.connect(conn) {
            Ok(conn_id) => {
                wire_connection(model, from_id, from_ref.direction, from_ref.port, conn_id);
                wire_connection(model, to_id, to_ref.direction, to_ref.port, conn_id);
            }
            Err(e) => diagnostics.add_error_with_entity("validation", &e.to_string(), &entity),
        }
    }
}

fn tag_list(table: &toml::Table, field: &str) -> Vec<String> {
    table
        .get(field)
        .and_then(toml::Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

fn parse_failure_modes(
    doc: &toml::Table,
    tags: &HashMap<String, ComponentId>,
    dists: &HashMap<String, Distribution>,
    diagnostics: &mut Diagnostics,
) -> HashMap<String, FailureModeSpec> {
    let mut out = HashMap::new();
    for (id, (tag, table)) in sub_table(doc, "failure_mode").enumerate() {
        let entity = format!("failure_mode.{tag}");
        let component_tag = table.get("component").and_then(|v| v.as_str());
        let break_tag = table.get("break_dist").and_then(|v| v.as_str());
        let repair_tag = table.get("repair_dist").and_then(|v| v.as_str());
        let (Some(component_tag), Some(break_tag), Some(repair_tag)) = (component_tag, break_tag, repair_tag) else {
            diagnostics.add_error_with_entity("parse", "missing 'component', 'break_dist', or 'repair_dist'", &entity);
            continue;
        };
        let (Some(&component), Some(break_dist), Some(repair_dist)) =
            (tags.get(component_tag), dists.get(break_tag), dists.get(repair_tag))
        else {
            diagnostics.add_error_with_entity("parse", "unknown component or distribution reference", &entity);
            continue;
        };
        out.insert(
            tag.clone(),
            FailureModeSpec { id, component, break_dist: break_dist.clone(), repair_dist: repair_dist.clone() },
        );
    }
    out
}

fn parse_fragility_modes(
    doc: &toml::Table,
    tags: &HashMap<String, ComponentId>,
    curves: &HashMap<String, FragilityCurve>,
    intensities: &HashMap<String, f64>,
    dists: &HashMap<String, Distribution>,
    diagnostics: &mut Diagnostics,
) -> HashMap<String, FragilityModeSpec> {
    let mut out = HashMap::new();
    for (id, (tag, table)) in sub_table(doc, "fragility_mode").enumerate() {
        let entity = format!("fragility_mode.{tag}");
        let component_tag = table.get("component").and_then(|v| v.as_str());
        let curve_tag = table.get("curve").and_then(|v| v.as_str());
        let intensity_tag = table.get("intensity").and_then(|v| v.as_str());
        let (Some(component_tag), Some(curve_tag), Some(intensity_tag)) = (component_tag, curve_tag, intensity_tag) else {
            diagnostics.add_error_with_entity("parse", "missing 'component', 'curve', or 'intensity'", &entity);
            continue;
        };
        let (Some(&component), Some(curve), Some(&intensity)) =
            (tags.get(component_tag), curves.get(curve_tag), intensities.get(intensity_tag))
        else {
            diagnostics.add_error_with_entity("parse", "unknown component, curve, or intensity reference", &entity);
            continue;
        };
        let repair_dist = table
            .get("repair_dist")
            .and_then(|v| v.as_str())
            .and_then(|repair_tag| dists.get(repair_tag))
            .cloned();
        out.insert(tag.clone(), FragilityModeSpec { id, component, curve: curve.clone(), intensity, repair_dist });
    }
    out
}

fn parse_scenarios(
    doc: &toml::Table,
    dists: &HashMap<String, Distribution>,
    failure_modes: &HashMap<String, FailureModeSpec>,
    fragility_modes: &HashMap<String, FragilityModeSpec>,
    diagnostics: &mut Diagnostics,
) -> Vec<ScenarioSpec> {
    let mut out = Vec::new();
    for (tag, table) in sub_table(doc, "scenarios") {
        let entity = format!("scenarios.{tag}");
        let occurrence_tag = table.get("occurrence_distribution").and_then(|v| v.as_str());
        let Some(occurrence_distribution) = occurrence_tag.and_then(|t| dists.get(t)).cloned() else {
            diagnostics.add_error_with_entity("parse", "missing or unknown 'occurrence_distribution'", &entity);
            continue;
        };
        let max_occurrences = numeric_field(table, "max_occurrences").unwrap_or(1.0) as usize;
        let Some(duration_s) = time_field(table, "duration") else {
            diagnostics.add_error_with_entity("parse", "missing or invalid 'duration'", &entity);
            continue;
        };
        let scenario_failure_modes = tag_list(table, "failure_modes")
            .into_iter()
            .filter_map(|fm_tag| {
                failure_modes.get(&fm_tag).cloned().or_else(|| {
                    diagnostics.add_error_with_entity("parse", &format!("unknown failure_mode reference '{fm_tag}'"), &entity);
                    None
                })
            })
            .collect();
        let scenario_fragility_modes = tag_list(table, "fragility_modes")
            .into_iter()
            .filter_map(|fm_tag| {
                fragility_modes.get(&fm_tag).cloned().or_else(|| {
                    diagnostics.add_error_with_entity("parse", &format!("unknown fragility_mode reference '{fm_tag}'"), &entity);
                    None
                })
            })
            .collect();
        out.push(ScenarioSpec {
            tag: tag.clone(),
            occurrence_distribution,
            max_occurrences,
            duration_s,
            failure_modes: scenario_failure_modes,
            fragility_modes: scenario_fragility_modes,
        });
    }
    out
}

/// Parses an already-loaded TOML document into a [`Model`] and its
/// scenarios, collecting diagnostics rather than aborting on the first
/// unresolved reference — callers decide whether `diagnostics.has_errors()`
/// should block a run.
pub fn parse_document(doc: &toml::Table) -> LoadedScenarioFile {
    let mut diagnostics = Diagnostics::new();
    let simulation_info = parse_simulation_info(doc, &mut diagnostics);
    let named_loads = parse_named_loads(doc, &mut diagnostics);

    let mut model = Model::new();
    let tags = parse_components(doc, &named_loads, &mut model, &mut diagnostics);
    parse_connections(doc, &tags, &mut model, &mut diagnostics);

    let dists = parse_distributions(doc, &mut diagnostics);
    let curves = parse_fragility_curves(doc, &mut diagnostics);
    let intensities = parse_intensities(doc, &mut diagnostics);
    let failure_modes = parse_failure_modes(doc, &tags, &dists, &mut diagnostics);
    let fragility_modes = parse_fragility_modes(doc, &tags, &curves, &intensities, &dists, &mut diagnostics);
    let scenarios = parse_scenarios(doc, &dists, &failure_modes, &fragility_modes, &mut diagnostics);

    if let Err(e) = model.validate() {
        diagnostics.add_error_with_entity("validation", &e.to_string(), "model");
    }

    LoadedScenarioFile { model, scenarios, simulation_info, diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [simulation_info]
        time_unit = "h"
        max_time = 10

        [components.src]
        type = "constant_source"
        available = 100

        [components.load]
        type = "constant_load"
        load = 10

        [network]
        connections = [["src:OUT(0)", "load:IN(0)"]]

        [dist.once]
        type = "fixed"
        value = 1000000

        [scenarios.base]
        occurrence_distribution = "once"
        max_occurrences = 1
        duration = 10
        duration_units = "h"
    "#;

    #[test]
    fn loads_minimal_scenario_without_errors() {
        let doc: toml::Table = toml::from_str(MINIMAL).unwrap();
        let loaded = parse_document(&doc);
        assert!(!loaded.diagnostics.has_errors(), "{:?}", loaded.diagnostics);
        assert_eq!(loaded.model.components.len(), 2);
        assert_eq!(loaded.model.connections.len(), 1);
        assert_eq!(loaded.scenarios.len(), 1);
        assert_eq!(loaded.scenarios[0].duration_s, 36_000.0);
    }

    #[test]
    fn wires_source_and_load_to_same_connection() {
        let doc: toml::Table = toml::from_str(MINIMAL).unwrap();
        let loaded = parse_document(&doc);
        let src = loaded.model.components.constant_sources[0].outflow_conn;
        let load = loaded.model.components.constant_loads[0].inflow_conn;
        assert!(src.is_some());
        assert_eq!(src, load);
    }

    #[test]
    fn flags_unknown_connection_tag() {
        let bad = MINIMAL.replace("load:IN(0)", "nope:IN(0)");
        let doc: toml::Table = toml::from_str(&bad).unwrap();
        let loaded = parse_document(&doc);
        assert!(loaded.diagnostics.has_errors());
    }
}
