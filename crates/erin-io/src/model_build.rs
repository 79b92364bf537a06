//! Builds an `erin_core::Model` from the parsed `[components.<tag>]` and
//! `[network.connections]` TOML tables (§3, §6).
//!
//! Two passes: [`add_component`] creates every component row (with all
//! connection slots `None`), then [`wire_connection`] fills in the slot
//! a given `(direction, port)` pair belongs to, following the per-kind
//! port layout named in spec.md §3/§4: inflow port 0 is always the
//! "main" inflow, outflow port 0 is always the "main" outflow, and ports
//! 1+ are the lossflow/wasteflow/environment legs in declaration order.

use crate::connref::Direction;
use crate::schema::{schema_for, validate_component_table};
use crate::units_parse::{numeric_field, power_field, time_rate_pairs};
use erin_core::component::{
    ComponentKind, ConstantEfficiencyConverterRow, ConstantLoadRow, ConstantSourceRow, CurvePoint,
    EnvironmentSourceRow, MoverRow, MuxRow, PassThroughRow, ScheduleBasedLoadRow,
    ScheduleBasedSourceRow, SchedulePoint, StoreRow, SwitchRow, VariableEfficiencyConverterRow,
    VariableEfficiencyMoverRow, WasteSinkRow,
};
use erin_core::diagnostics::Diagnostics;
use erin_core::ids::{ComponentId, ConnectionId};
use erin_core::model::Model;
use erin_core::units::Watts;

/// Parses a `[[outflow, factor], …]` piecewise-linear curve array.
fn parse_curve(table: &toml::Table, field: &str) -> Option<Vec<CurvePoint>> {
    let array = table.get(field)?.as_array()?;
    let mut points = Vec::with_capacity(array.len());
    for entry in array {
        let pair = entry.as_array()?;
        if pair.len() != 2 {
            return None;
        }
        let outflow_w = pair[0].as_integer().map(|i| i as u64).or_else(|| pair[0].as_float().map(|f| f as u64))?;
        let factor = pair[1].as_float().or_else(|| pair[1].as_integer().map(|i| i as f64))?;
        points.push(CurvePoint { outflow_w, factor });
    }
    Some(points)
}

fn parse_schedule(table: &toml::Table, field: &str) -> Option<Vec<SchedulePoint>> {
    let pairs = time_rate_pairs(table, field)?;
    Some(
        pairs
            .into_iter()
            .map(|(time_s, amount_w)| SchedulePoint { time_s, amount_w })
            .collect(),
    )
}

/// Adds one component of the TOML-declared `type` to `model`, returning
/// its id, or `None` if the type is unrecognized or a required field
/// failed to parse (diagnostics explain why either way).
pub fn add_component(model: &mut Model, tag: &str, table: &toml::Table, diagnostics: &mut Diagnostics) -> Option<ComponentId> {
    let type_name = table.get("type").and_then(|v| v.as_str()).unwrap_or_else(|| {
        diagnostics.add_error_with_entity("parse", "missing 'type' field", &format!("components.{tag}"));
        ""
    });
    let Some(schema) = schema_for(type_name) else {
        diagnostics.add_error_with_entity("parse", &format!("unknown component type '{type_name}'"), &format!("components.{tag}"));
        return None;
    };
    validate_component_table(schema, table, tag, diagnostics);

    let entity = format!("components.{tag}");
    let id = match type_name {
        "constant_load" => {
            let load_w = power_field(table, "load").unwrap_or(Watts::ZERO);
            model.components.add_constant_load(tag, ConstantLoadRow { load_w, inflow_conn: None })
        }
        "schedule_based_load" => {
            let schedule = parse_schedule(table, "schedule").unwrap_or_else(|| {
                diagnostics.add_error_with_entity("parse", "invalid or missing 'schedule'", &entity);
                Vec::new()
            });
            model
                .components
                .add_schedule_based_load(tag, ScheduleBasedLoadRow { schedule, inflow_conn: None })
        }
        "constant_source" => {
            let available_w = power_field(table, "available").unwrap_or(Watts::ZERO);
            model.components.add_constant_source(tag, ConstantSourceRow { available_w, outflow_conn: None })
        }
        "schedule_based_source" => {
            let schedule = parse_schedule(table, "schedule").unwrap_or_else(|| {
                diagnostics.add_error_with_entity("parse", "invalid or missing 'schedule'", &entity);
                Vec::new()
            });
            let max_outflow_w = power_field(table, "max_outflow").unwrap_or(Watts::UNLIMITED);
            model.components.add_schedule_based_source(
                tag,
                ScheduleBasedSourceRow { schedule, max_outflow_w, outflow_conn: None, wasteflow_conn: None },
            )
        }
        "converter" => {
            let efficiency = numeric_field(table, "efficiency").unwrap_or_else(|| {
                diagnostics.add_error_with_entity("parse", "invalid or missing 'efficiency'", &entity);
                1.0
            });
            let max_outflow_w = power_field(table, "max_outflow").unwrap_or(Watts::UNLIMITED);
            let max_lossflow_w = power_field(table, "max_lossflow").unwrap_or(Watts::ZERO);
            model.components.add_constant_efficiency_converter(
                tag,
                ConstantEfficiencyConverterRow {
                    efficiency,
                    max_outflow_w,
                    max_lossflow_w,
                    inflow_conn: None,
                    outflow_conn: None,
                    lossflow_conn: None,
                    wasteflow_conn: None,
                },
            )
        }
        "variable_efficiency_converter" => {
            let efficiency_curve = parse_curve(table, "efficiency_curve").unwrap_or_else(|| {
                diagnostics.add_error_with_entity("parse", "invalid or missing 'efficiency_curve'", &entity);
                Vec::new()
            });
            let max_outflow_w = power_field(table, "max_outflow").unwrap_or(Watts::UNLIMITED);
            let max_lossflow_w = power_field(table, "max_lossflow").unwrap_or(Watts::ZERO);
            model.components.add_variable_efficiency_converter(
                tag,
                VariableEfficiencyConverterRow {
                    efficiency_curve,
                    max_outflow_w,
                    max_lossflow_w,
                    inflow_conn: None,
                    outflow_conn: None,
                    lossflow_conn: None,
                    wasteflow_conn: None,
                },
            )
        }
        "mover" => {
            let cop = numeric_field(table, "cop").unwrap_or_else(|| {
                diagnostics.add_error_with_entity("parse", "invalid or missing 'cop'", &entity);
                1.0
            });
            let max_outflow_w = power_field(table, "max_outflow").unwrap_or(Watts::UNLIMITED);
            model.components.add_mover(
                tag,
                MoverRow { cop, max_outflow_w, inflow_conn: None, outflow_conn: None, in_from_env_conn: None, wasteflow_conn: None },
            )
        }
        "variable_efficiency_mover" => {
            let cop_curve = parse_curve(table, "cop_curve").unwrap_or_else(|| {
                diagnostics.add_error_with_entity("parse", "invalid or missing 'cop_curve'", &entity);
                Vec::new()
            });
            let max_outflow_w = power_field(table, "max_outflow").unwrap_or(Watts::UNLIMITED);
            model.components.add_variable_efficiency_mover(
                tag,
                VariableEfficiencyMoverRow {
                    cop_curve,
                    max_outflow_w,
                    inflow_conn: None,
                    outflow_conn: None,
                    in_from_env_conn: None,
                    wasteflow_conn: None,
                },
            )
        }
        "mux" => {
            let num_inflows = numeric_field(table, "num_inflows").unwrap_or(0.0) as usize;
            let num_outflows = numeric_field(table, "num_outflows").unwrap_or(0.0) as usize;
            let max_outflows_w = (0..num_outflows).map(|_| Watts::UNLIMITED).collect();
            model.components.add_mux(
                tag,
                MuxRow { inflow_conns: Vec::with_capacity(num_inflows), outflow_conns: Vec::with_capacity(num_outflows), max_outflows_w },
            )
        }
        "store" => {
            let capacity_j = crate::units_parse::energy_field(table, "capacity").unwrap_or_else(|| {
                diagnostics.add_error_with_entity("parse", "invalid or missing 'capacity'", &entity);
                0
            });
            let max_charge_rate_w = power_field(table, "max_charge_rate").unwrap_or(Watts::ZERO);
            let max_discharge_rate_w = power_field(table, "max_discharge_rate").unwrap_or(Watts::ZERO);
            let mut charge_threshold_j = crate::units_parse::energy_field(table, "charge_threshold").unwrap_or(0);
            if charge_threshold_j >= capacity_j && capacity_j > 0 {
                diagnostics.add_warning_with_entity(
                    "validation",
                    "charge_threshold >= capacity; clamped to capacity - 1 (see DESIGN.md open question)",
                    &entity,
                );
                charge_threshold_j = capacity_j - 1;
            }
            let initial_storage_j = crate::units_parse::energy_field(table, "initial_storage").unwrap_or(capacity_j);
            let roundtrip_efficiency = numeric_field(table, "roundtrip_efficiency").unwrap_or(1.0);
            let max_outflow_w = power_field(table, "max_outflow").unwrap_or(Watts::UNLIMITED);
            model.components.add_store(
                tag,
                StoreRow {
                    capacity_j,
                    max_charge_rate_w,
                    max_discharge_rate_w,
                    charge_threshold_j,
                    initial_storage_j,
                    roundtrip_efficiency,
                    max_outflow_w,
                    inflow_conn: None,
                    outflow_conn: None,
                    wasteflow_conn: None,
                },
            )
        }
        "pass_through" => {
            let max_outflow_w = power_field(table, "max_outflow").unwrap_or(Watts::UNLIMITED);
            model.components.add_pass_through(tag, PassThroughRow { max_outflow_w, inflow_conn: None, outflow_conn: None })
        }
        "switch" => {
            let max_outflow_w = power_field(table, "max_outflow").unwrap_or(Watts::UNLIMITED);
            model.components.add_switch(
                tag,
                SwitchRow {
                    primary_inflow_conn: None,
                    secondary_inflow_conn: None,
                    outflow_conn: None,
                    max_outflow_w,
                    on_secondary: false,
                },
            )
        }
        "waste_sink" => model.components.add_waste_sink(tag, WasteSinkRow { inflow_conn: None }),
        "environment_source" => model.components.add_environment_source(tag, EnvironmentSourceRow { outflow_conn: None }),
        _ => unreachable!("schema_for already rejected unknown types"),
    };
    Some(id)
}

/// Fills in the connection slot that `(direction, port)` belongs to for
/// `component`, per the per-kind layout documented above.
pub fn wire_connection(model: &mut Model, component: ComponentId, direction: Direction, port: usize, conn_id: ConnectionId) {
    let c = model.components.get(component);
    let idx = c.subtype_idx.index();
    match (c.kind, direction, port) {
        (ComponentKind::ConstantLoad, Direction::In, 0) => model.components.constant_loads[idx].inflow_conn = Some(conn_id),
        (ComponentKind::ScheduleBasedLoad, Direction::In, 0) => model.components.schedule_based_loads[idx].inflow_conn = Some(conn_id),
        (ComponentKind::ConstantSource, Direction::Out, 0) => model.components.constant_sources[idx].outflow_conn = Some(conn_id),
        (ComponentKind::ScheduleBasedSource, Direction::Out, 0) => model.components.schedule_based_sources[idx].outflow_conn = Some(conn_id),
        (ComponentKind::ScheduleBasedSource, Direction::Out, 1) => model.components.schedule_based_sources[idx].wasteflow_conn = Some(conn_id),
        (ComponentKind::ConstantEfficiencyConverter, Direction::In, 0) => model.components.constant_efficiency_converters[idx].inflow_conn = Some(conn_id),
        (ComponentKind::ConstantEfficiencyConverter, Direction::Out, 0) => model.components.constant_efficiency_converters[idx].outflow_conn = Some(conn_id),
        (ComponentKind::ConstantEfficiencyConverter, Direction::Out, 1) => model.components.constant_efficiency_converters[idx].lossflow_conn = Some(conn_id),
        (ComponentKind::ConstantEfficiencyConverter, Direction::Out, 2) => model.components.constant_efficiency_converters[idx].wasteflow_conn = Some(conn_id),
        (ComponentKind::VariableEfficiencyConverter, Direction::In, 0) => model.components.variable_efficiency_converters[idx].inflow_conn = Some(conn_id),
        (ComponentKind::VariableEfficiencyConverter, Direction::Out, 0) => model.components.variable_efficiency_converters[idx].outflow_conn = Some(conn_id),
        (ComponentKind::VariableEfficiencyConverter, Direction::Out, 1) => model.components.variable_efficiency_converters[idx].lossflow_conn = Some(conn_id),
        (ComponentKind::VariableEfficiencyConverter, Direction::Out, 2) => model.components.variable_efficiency_converters[idx].wasteflow_conn = Some(conn_id),
        (ComponentKind::Mover, Direction::In, 0) => model.components.movers[idx].inflow_conn = Some(conn_id),
        (ComponentKind::Mover, Direction::In, 1) => model.components.movers[idx].in_from_env_conn = Some(conn_id),
        (ComponentKind::Mover, Direction::Out, 0) => model.components.movers[idx].outflow_conn = Some(conn_id),
        (ComponentKind::Mover, Direction::Out, 1) => model.components.movers[idx].wasteflow_conn = Some(conn_id),
        (ComponentKind::VariableEfficiencyMover, Direction::In, 0) => model.components.variable_efficiency_movers[idx].inflow_conn = Some(conn_id),
        (ComponentKind::VariableEfficiencyMover, Direction::In, 1) => model.components.variable_efficiency_movers[idx].in_from_env_conn = Some(conn_id),
        (ComponentKind::VariableEfficiencyMover, Direction::Out, 0) => model.components.variable_efficiency_movers[idx].outflow_conn = Some(conn_id),
        (ComponentKind::VariableEfficiencyMover, Direction::Out, 1) => model.components.variable_efficiency_movers[idx].wasteflow_conn = Some(conn_id),
        (ComponentKind::Mux, Direction::In, p) => {
            let row = &mut model.components.muxes[idx];
            while row.inflow_conns.len() <= p {
                row.inflow_conns.push(conn_id);
            }
            row.inflow_conns[p] = conn_id;
        }
        (ComponentKind::Mux, Direction::Out, p) => {
            let row = &mut model.components.muxes[idx];
            while row.outflow_conns.len() <= p {
                row.outflow_conns.push(conn_id);
            }
            row.outflow_conns[p] = conn_id;
        }
        (ComponentKind::Store, Direction::In, 0) => model.components.stores[idx].inflow_conn = Some(conn_id),
        (ComponentKind::Store, Direction::Out, 0) => model.components.stores[idx].outflow_conn = Some(conn_id),
        (ComponentKind::Store, Direction::Out, 1) => model.components.stores[idx].wasteflow_conn = Some(conn_id),
        (ComponentKind::PassThrough, Direction::In, 0) => model.components.pass_throughs[idx].inflow_conn = Some(conn_id),
        (ComponentKind::PassThrough, Direction::Out, 0) => model.components.pass_throughs[idx].outflow_conn = Some(conn_id),
        (ComponentKind::Switch, Direction::In, 0) => model.components.switches[idx].primary_inflow_conn = Some(conn_id),
        (ComponentKind::Switch, Direction::In, 1) => model.components.switches[idx].secondary_inflow_conn = Some(conn_id),
        (ComponentKind::Switch, Direction::Out, 0) => model.components.switches[idx].outflow_conn = Some(conn_id),
        (ComponentKind::WasteSink, Direction::In, 0) => model.components.waste_sinks[idx].inflow_conn = Some(conn_id),
        (ComponentKind::EnvironmentSource, Direction::Out, 0) => model.components.environment_sources[idx].outflow_conn = Some(conn_id),
        _ => {
            // Port index outside the kind's declared layout; caught as a
            // diagnostic by the caller before wiring is attempted.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erin_core::ids::WILDCARD_FLOW_TYPE;

    #[test]
    fn builds_constant_load_from_table() {
        let mut model = Model::new();
        let table: toml::Table = toml::from_str("type = \"constant_load\"\nload = 10").unwrap();
        let mut diag = Diagnostics::new();
        let id = add_component(&mut model, "load1", &table, &mut diag).unwrap();
        assert_eq!(model.components.get(id).kind, ComponentKind::ConstantLoad);
        assert!(!diag.has_errors());
    }

    #[test]
    fn wires_converter_lossflow_port() {
        let mut model = Model::new();
        let table: toml::Table = toml::from_str("type = \"converter\"\nefficiency = 0.5").unwrap();
        let mut diag = Diagnostics::new();
        let conv = add_component(&mut model, "conv", &table, &mut diag).unwrap();
        let sink_table: toml::Table = toml::from_str("type = \"waste_sink\"").unwrap();
        let sink = add_component(&mut model, "sink", &sink_table, &mut diag).unwrap();
        let conn = model
            .connect(erin_core::connection::Connection {
                from_id: conv,
                from_port: 1,
                to_id: sink,
                to_port: 0,
                flow_type: WILDCARD_FLOW_TYPE,
            })
            .unwrap();
        wire_connection(&mut model, conv, Direction::Out, 1, conn);
        assert_eq!(model.components.constant_efficiency_converters[0].lossflow_conn, Some(conn));
    }
}
