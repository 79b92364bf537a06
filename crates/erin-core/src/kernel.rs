//! The two-sweep fixed-point flow propagation kernel (§4.1).
//!
//! Each connection id lives in at most one of two work sets at a time:
//! `active_back` (its requested value may need to change, driven by its
//! consumer) or `active_forward` (its available value may need to
//! change, driven by its producer). [`run_active_connections`] drains
//! both alternately until neither holds anything, then finalizes every
//! connection's `actual` and runs the mux/store reconciliation passes.
//!
//! Backward processing of a connection always recomputes the component
//! sitting at its `from_id` (the producer uses its own outflow requests
//! to derive what it, in turn, requests from its inflows). Forward
//! processing of a connection recomputes the component at its `to_id`
//! (the consumer uses its new inflow availability to derive what it, in
//! turn, can offer downstream).

use crate::component::{interpolate_curve, ComponentKind, ComponentTable};
use crate::connection::ConnectionTable;
use crate::error::{ErinError, ErinResult};
use crate::ids::{ComponentId, ConnectionId};
use crate::state::SimulationState;
use crate::units::Watts;

/// Safety bound on backward/forward alternation (§4.1, §5). Exceeding it
/// indicates a cyclic or otherwise non-convergent model, not bad input.
pub const MAX_PROPAGATION_ROUNDS: usize = 1000;

/// Runs backward and forward sweeps to a fixed point, then finalizes
/// every connection and reconciles stores and muxes.
pub fn run_active_connections(
    components: &ComponentTable,
    connections: &ConnectionTable,
    state: &mut SimulationState,
) -> ErinResult<()> {
    let mut rounds = 0usize;
    while !state.active_back.is_empty() || !state.active_forward.is_empty() {
        while let Some(&conn_id) = state.active_back.iter().next() {
            state.active_back.remove(&conn_id);
            run_connection_backward(components, connections, state, conn_id);
            rounds += 1;
            if rounds > MAX_PROPAGATION_ROUNDS {
                return Err(ErinError::Invariant(
                    "backward propagation failed to converge within the loop-iteration cap".into(),
                ));
            }
        }
        while let Some(&conn_id) = state.active_forward.iter().next() {
            state.active_forward.remove(&conn_id);
            run_connection_forward(components, connections, state, conn_id);
            rounds += 1;
            if rounds > MAX_PROPAGATION_ROUNDS {
                return Err(ErinError::Invariant(
                    "forward propagation failed to converge within the loop-iteration cap".into(),
                ));
            }
        }
    }

    for id in connections.iter_ids() {
        state.flows.get_mut(id).finalize();
    }

    Ok(())
}

fn set_requested(state: &mut SimulationState, conn: ConnectionId, value: Watts) {
    let flow = state.flows.get_mut(conn);
    if flow.requested != value {
        flow.requested = value;
        state.active_back.insert(conn);
    }
}

fn set_available(state: &mut SimulationState, conn: ConnectionId, value: Watts) {
    let flow = state.flows.get_mut(conn);
    if flow.available != value {
        flow.available = value;
        state.active_forward.insert(conn);
    }
}

/// If `component` is unavailable (§4.5), zero every flow touching it and
/// enqueue its neighbors so the zero propagates, instead of running the
/// component's normal rules. Returns `true` if it handled the component.
fn handle_unavailable(
    components: &ComponentTable,
    connections: &ConnectionTable,
    state: &mut SimulationState,
    component: ComponentId,
) -> bool {
    if !state.is_unavailable(component) {
        return false;
    }
    for conn in connections.outgoing_from(component) {
        set_requested(state, conn, Watts::ZERO);
        set_available(state, conn, Watts::ZERO);
    }
    for conn in connections.incoming_to(component) {
        set_requested(state, conn, Watts::ZERO);
        set_available(state, conn, Watts::ZERO);
    }
    let _ = components;
    true
}

fn run_connection_backward(
    components: &ComponentTable,
    connections: &ConnectionTable,
    state: &mut SimulationState,
    conn_id: ConnectionId,
) {
    let component = connections.get(conn_id).from_id;
    if handle_unavailable(components, connections, state, component) {
        return;
    }
    let c = components.get(component);
    match c.kind {
        ComponentKind::ConstantSource | ComponentKind::EnvironmentSource => {
            // Terminal producer: no inflow side to update.
        }
        ComponentKind::ScheduleBasedSource => {
            let row = &components.schedule_based_sources[c.subtype_idx.index()];
            if let (Some(outflow), Some(waste)) = (row.outflow_conn, row.wasteflow_conn) {
                let f = state.flows.get(outflow);
                let offered = f.available.saturating_sub(f.requested);
                set_available(state, waste, offered);
            }
        }
        ComponentKind::ConstantEfficiencyConverter => {
            let row = &components.constant_efficiency_converters[c.subtype_idx.index()];
            backward_converter(state, row.efficiency, row.max_outflow_w, row.max_lossflow_w, row.inflow_conn, row.outflow_conn, row.lossflow_conn, row.wasteflow_conn);
        }
        ComponentKind::VariableEfficiencyConverter => {
            let row = &components.variable_efficiency_converters[c.subtype_idx.index()];
            let outflow_req = row
                .outflow_conn
                .map(|oc| state.flows.get(oc).requested.min(row.max_outflow_w))
                .unwrap_or(Watts::ZERO);
            let efficiency = interpolate_curve(&row.efficiency_curve, outflow_req.value());
            backward_converter(state, efficiency, row.max_outflow_w, row.max_lossflow_w, row.inflow_conn, row.outflow_conn, row.lossflow_conn, row.wasteflow_conn);
        }
        ComponentKind::Mover => {
            let row = &components.movers[c.subtype_idx.index()];
            backward_mover(state, row.cop, row.max_outflow_w, row.inflow_conn, row.outflow_conn, row.in_from_env_conn, row.wasteflow_conn);
        }
        ComponentKind::VariableEfficiencyMover => {
            let row = &components.variable_efficiency_movers[c.subtype_idx.index()];
            let outflow_req = row
                .outflow_conn
                .map(|oc| state.flows.get(oc).requested.min(row.max_outflow_w))
                .unwrap_or(Watts::ZERO);
            let cop = interpolate_curve(&row.cop_curve, outflow_req.value());
            backward_mover(state, cop, row.max_outflow_w, row.inflow_conn, row.outflow_conn, row.in_from_env_conn, row.wasteflow_conn);
        }
        ComponentKind::Mux => {
            let row = &components.muxes[c.subtype_idx.index()];
            let total_request: u64 = row
                .outflow_conns
                .iter()
                .zip(row.max_outflows_w.iter())
                .map(|(conn, cap)| state.flows.get(*conn).requested.min(*cap).value())
                .sum();
            let mut remaining = total_request;
            for (i, inflow_conn) in row.inflow_conns.iter().enumerate() {
                let avail = state.flows.get(*inflow_conn).available.value();
                let give = remaining.min(avail);
                set_requested(state, *inflow_conn, Watts::new(give));
                remaining -= give;
                let _ = i;
            }
            if remaining > 0 {
                if let Some(first) = row.inflow_conns.first() {
                    let current = state.flows.get(*first).requested;
                    set_requested(state, *first, current + Watts::new(remaining));
                }
            }
            if row.num_outflows() > 1 {
                for conn in &row.outflow_conns {
                    state.active_forward.insert(*conn);
                }
            }
        }
        ComponentKind::Store => {
            let idx = c.subtype_idx.index();
            let row = &components.stores[idx];
            let outflow_req = row
                .outflow_conn
                .map(|oc| state.flows.get(oc).requested.min(row.max_outflow_w))
                .unwrap_or(Watts::ZERO);
            let soc = state.storage_amounts_j[idx];
            let charge_leg = if soc <= row.charge_threshold_j {
                row.max_charge_rate_w
            } else {
                Watts::ZERO
            };
            let inflow_req = outflow_req + charge_leg;
            if let Some(inflow) = row.inflow_conn {
                set_requested(state, inflow, inflow_req);
            }
        }
        ComponentKind::PassThrough => {
            let row = &components.pass_throughs[c.subtype_idx.index()];
            let outflow_req = row
                .outflow_conn
                .map(|oc| state.flows.get(oc).requested.min(row.max_outflow_w))
                .unwrap_or(Watts::ZERO);
            if let Some(inflow) = row.inflow_conn {
                set_requested(state, inflow, outflow_req);
            }
        }
        ComponentKind::Switch => {
            let row = &components.switches[c.subtype_idx.index()];
            let outflow_req = row
                .outflow_conn
                .map(|oc| state.flows.get(oc).requested.min(row.max_outflow_w))
                .unwrap_or(Watts::ZERO);
            let leg = if state.switch_states[c.subtype_idx.index()] {
                row.secondary_inflow_conn
            } else {
                row.primary_inflow_conn
            };
            if let Some(inflow) = leg {
                set_requested(state, inflow, outflow_req);
            }
        }
        ComponentKind::ConstantLoad | ComponentKind::ScheduleBasedLoad | ComponentKind::WasteSink => {
            // Terminal consumers: requests on their single inflow connection
            // are set once at seeding time (constant/scheduled demand, or
            // "accept everything" for waste sinks), not recomputed here.
        }
    }
}

fn backward_converter(
    state: &mut SimulationState,
    efficiency: f64,
    max_outflow: Watts,
    max_lossflow: Watts,
    inflow_conn: Option<ConnectionId>,
    outflow_conn: Option<ConnectionId>,
    lossflow_conn: Option<ConnectionId>,
    wasteflow_conn: Option<ConnectionId>,
) {
    let Some(outflow_conn) = outflow_conn else { return };
    let outflow_req_clamped = state.flows.get(outflow_conn).requested.min(max_outflow);
    let inflow_req = outflow_req_clamped.div_ceil_by(efficiency);
    if let Some(inflow_conn) = inflow_conn {
        set_requested(state, inflow_conn, inflow_req);
    }
    update_converter_loss_and_waste(state, max_outflow, max_lossflow, inflow_conn, outflow_conn, lossflow_conn, wasteflow_conn);
}

fn backward_mover(
    state: &mut SimulationState,
    cop: f64,
    max_outflow: Watts,
    inflow_conn: Option<ConnectionId>,
    outflow_conn: Option<ConnectionId>,
    in_from_env_conn: Option<ConnectionId>,
    wasteflow_conn: Option<ConnectionId>,
) {
    let Some(outflow_conn) = outflow_conn else { return };
    let outflow_req_clamped = state.flows.get(outflow_conn).requested.min(max_outflow);
    let inflow_req = outflow_req_clamped.div_ceil_by(cop);
    if let Some(inflow_conn) = inflow_conn {
        set_requested(state, inflow_conn, inflow_req);
    }
    update_mover_environment_and_waste(state, max_outflow, inflow_conn, outflow_conn, in_from_env_conn, wasteflow_conn);
}

/// Recomputes a mover's environment-draw/wasteflow legs from its
/// finalized inflow and outflow, called from both the backward and
/// forward mover rules so either side's change keeps these legs current
/// (mirrors the original engine's `UpdateEnvironmentFlowForMover`,
/// invoked from both its backward and forward mover rules).
///
/// cop > 1 => outflow exceeds inflow, the gap is drawn from the
/// environment; cop < 1 => inflow exceeds outflow, the surplus is
/// wasted. Exactly one leg is nonzero (§4.4).
fn update_mover_environment_and_waste(
    state: &mut SimulationState,
    max_outflow: Watts,
    inflow_conn: Option<ConnectionId>,
    outflow_conn: Option<ConnectionId>,
    in_from_env_conn: Option<ConnectionId>,
    wasteflow_conn: Option<ConnectionId>,
) {
    let inflow_req = inflow_conn.map(|c| state.flows.get(c).requested).unwrap_or(Watts::ZERO);
    let inflow_avail = inflow_conn.map(|c| state.flows.get(c).available).unwrap_or(Watts::ZERO);
    let outflow_req = outflow_conn.map(|c| state.flows.get(c).requested).unwrap_or(Watts::ZERO);
    let outflow_avail = outflow_conn.map(|c| state.flows.get(c).available.min(max_outflow)).unwrap_or(Watts::ZERO);

    let inflow = inflow_req.min(inflow_avail);
    let outflow = outflow_req.min(outflow_avail);

    if outflow.value() > inflow.value() {
        let env_draw = outflow.saturating_sub(inflow);
        if let Some(env_conn) = in_from_env_conn {
            set_requested(state, env_conn, env_draw);
            set_available(state, env_conn, env_draw);
        }
        if let Some(waste_conn) = wasteflow_conn {
            set_requested(state, waste_conn, Watts::ZERO);
            set_available(state, waste_conn, Watts::ZERO);
        }
    } else {
        let waste = inflow.saturating_sub(outflow);
        if let Some(waste_conn) = wasteflow_conn {
            set_requested(state, waste_conn, waste);
            set_available(state, waste_conn, waste);
        }
        if let Some(env_conn) = in_from_env_conn {
            set_requested(state, env_conn, Watts::ZERO);
            set_available(state, env_conn, Watts::ZERO);
        }
    }
}

/// Recomputes a converter's lossflow/wasteflow legs from its finalized
/// (request-clamped-to-available) inflow and outflow, called from both
/// the backward and forward converter rules so either side's change
/// keeps these legs current (mirrors the original engine's
/// `UpdateConstantEfficiencyLossflowAndWasteflow`, invoked from both its
/// backward and forward converter rules).
///
/// The non-outflow portion of the finalized inflow (`inflow - outflow`,
/// when positive) is offered to the lossflow leg up to `max_lossflow`;
/// whatever the lossflow leg doesn't request is routed to wasteflow,
/// whose requested and available are both pinned to that remainder so
/// waste is never itself limited by a downstream request.
fn update_converter_loss_and_waste(
    state: &mut SimulationState,
    max_outflow: Watts,
    max_lossflow: Watts,
    inflow_conn: Option<ConnectionId>,
    outflow_conn: Option<ConnectionId>,
    lossflow_conn: Option<ConnectionId>,
    wasteflow_conn: Option<ConnectionId>,
) {
    let inflow_req = inflow_conn.map(|c| state.flows.get(c).requested).unwrap_or(Watts::ZERO);
    let inflow_avail = inflow_conn.map(|c| state.flows.get(c).available).unwrap_or(Watts::ZERO);
    let outflow_req = outflow_conn.map(|c| state.flows.get(c).requested).unwrap_or(Watts::ZERO);
    let outflow_avail = outflow_conn.map(|c| state.flows.get(c).available.min(max_outflow)).unwrap_or(Watts::ZERO);

    let inflow = inflow_req.min(inflow_avail);
    let outflow = outflow_req.min(outflow_avail);
    let non_outflow_available = inflow.saturating_sub(outflow);

    if let Some(lossflow_conn) = lossflow_conn {
        let lossflow_request = state.flows.get(lossflow_conn).requested.min(max_lossflow);
        set_available(state, lossflow_conn, non_outflow_available.min(max_lossflow));
        let wasteflow = non_outflow_available.saturating_sub(lossflow_request);
        if let Some(wasteflow_conn) = wasteflow_conn {
            set_requested(state, wasteflow_conn, wasteflow);
            set_available(state, wasteflow_conn, wasteflow);
        }
    } else if let Some(wasteflow_conn) = wasteflow_conn {
        set_requested(state, wasteflow_conn, non_outflow_available);
        set_available(state, wasteflow_conn, non_outflow_available);
    }
}

fn run_connection_forward(
    components: &ComponentTable,
    connections: &ConnectionTable,
    state: &mut SimulationState,
    conn_id: ConnectionId,
) {
    let component = connections.get(conn_id).to_id;
    if handle_unavailable(components, connections, state, component) {
        return;
    }
    let c = components.get(component);
    match c.kind {
        ComponentKind::ConstantLoad | ComponentKind::ScheduleBasedLoad | ComponentKind::WasteSink | ComponentKind::EnvironmentSource => {
            // Terminal consumers/sources: nothing downstream to update.
        }
        ComponentKind::ConstantEfficiencyConverter => {
            let row = &components.constant_efficiency_converters[c.subtype_idx.index()];
            forward_converter(state, row.efficiency, row.max_outflow_w, row.max_lossflow_w, row.inflow_conn, row.outflow_conn, row.lossflow_conn, row.wasteflow_conn);
        }
        ComponentKind::VariableEfficiencyConverter => {
            let row = &components.variable_efficiency_converters[c.subtype_idx.index()];
            let outflow_req = row
                .outflow_conn
                .map(|oc| state.flows.get(oc).requested.min(row.max_outflow_w))
                .unwrap_or(Watts::ZERO);
            let efficiency = interpolate_curve(&row.efficiency_curve, outflow_req.value());
            forward_converter(state, efficiency, row.max_outflow_w, row.max_lossflow_w, row.inflow_conn, row.outflow_conn, row.lossflow_conn, row.wasteflow_conn);
        }
        ComponentKind::Mover => {
            let row = &components.movers[c.subtype_idx.index()];
            forward_mover(state, row.cop, row.max_outflow_w, row.inflow_conn, row.outflow_conn, row.in_from_env_conn, row.wasteflow_conn);
        }
        ComponentKind::VariableEfficiencyMover => {
            let row = &components.variable_efficiency_movers[c.subtype_idx.index()];
            let outflow_req = row
                .outflow_conn
                .map(|oc| state.flows.get(oc).requested.min(row.max_outflow_w))
                .unwrap_or(Watts::ZERO);
            let cop = interpolate_curve(&row.cop_curve, outflow_req.value());
            forward_mover(state, cop, row.max_outflow_w, row.inflow_conn, row.outflow_conn, row.in_from_env_conn, row.wasteflow_conn);
        }
        ComponentKind::Mux => {
            let row = &components.muxes[c.subtype_idx.index()];
            let total_avail: Watts = row
                .inflow_conns
                .iter()
                .map(|conn| state.flows.get(*conn).available)
                .fold(Watts::ZERO, |a, b| a + b);
            let mut remaining = total_avail;
            for (outflow_conn, cap) in row.outflow_conns.iter().zip(row.max_outflows_w.iter()) {
                let req_clamped = state.flows.get(*outflow_conn).requested.min(*cap);
                let give = req_clamped.min(remaining);
                set_available(state, *outflow_conn, give);
                remaining = remaining.saturating_sub(give);
            }
            if remaining.value() > 0 {
                for (outflow_conn, cap) in row.outflow_conns.iter().zip(row.max_outflows_w.iter()) {
                    if remaining.value() == 0 {
                        break;
                    }
                    let current = state.flows.get(*outflow_conn).available;
                    if current < *cap {
                        let room = cap.saturating_sub(current);
                        let extra = room.min(remaining);
                        set_available(state, *outflow_conn, current + extra);
                        remaining = remaining.saturating_sub(extra);
                    }
                }
            }
            if row.num_inflows() > 1 {
                for conn in &row.inflow_conns {
                    state.active_back.insert(*conn);
                }
            }
        }
        ComponentKind::Store => {
            let idx = c.subtype_idx.index();
            let row = &components.stores[idx];
            let inflow_avail = row
                .inflow_conn
                .map(|ic| state.flows.get(ic).available)
                .unwrap_or(Watts::ZERO);
            let soc = state.storage_amounts_j[idx];
            let discharge_leg = if soc > 0 { row.max_discharge_rate_w } else { Watts::ZERO };
            let avail = (inflow_avail + discharge_leg).min(row.max_outflow_w);
            if let Some(outflow) = row.outflow_conn {
                set_available(state, outflow, avail);
            }
        }
        ComponentKind::PassThrough => {
            let row = &components.pass_throughs[c.subtype_idx.index()];
            let inflow_avail = row
                .inflow_conn
                .map(|ic| state.flows.get(ic).available)
                .unwrap_or(Watts::ZERO);
            let avail = inflow_avail.min(row.max_outflow_w);
            if let Some(outflow) = row.outflow_conn {
                set_available(state, outflow, avail);
            }
        }
        ComponentKind::Switch => {
            let row = &components.switches[c.subtype_idx.index()];
            let primary_avail = row.primary_inflow_conn.map(|c| state.flows.get(c).available).unwrap_or(Watts::ZERO);
            let secondary_avail = row.secondary_inflow_conn.map(|c| state.flows.get(c).available).unwrap_or(Watts::ZERO);
            let (avail, on_secondary) = if primary_avail.value() > 0 {
                (primary_avail, false)
            } else {
                (secondary_avail, true)
            };
            state.switch_states[c.subtype_idx.index()] = on_secondary;
            let avail = avail.min(row.max_outflow_w);
            if let Some(outflow) = row.outflow_conn {
                set_available(state, outflow, avail);
            }
        }
        ComponentKind::ConstantSource | ComponentKind::ScheduleBasedSource => {
            unreachable!("sources are never the `to_id` end of a connection")
        }
    }
}

fn forward_converter(
    state: &mut SimulationState,
    efficiency: f64,
    max_outflow: Watts,
    max_lossflow: Watts,
    inflow_conn: Option<ConnectionId>,
    outflow_conn: Option<ConnectionId>,
    lossflow_conn: Option<ConnectionId>,
    wasteflow_conn: Option<ConnectionId>,
) {
    let Some(inflow_conn) = inflow_conn else { return };
    let inflow_avail = state.flows.get(inflow_conn).available;
    let outflow_avail = inflow_avail.mul_floor_by(efficiency).min(max_outflow);
    if let Some(outflow_conn) = outflow_conn {
        set_available(state, outflow_conn, outflow_avail);
    }
    update_converter_loss_and_waste(state, max_outflow, max_lossflow, Some(inflow_conn), outflow_conn, lossflow_conn, wasteflow_conn);
}

fn forward_mover(
    state: &mut SimulationState,
    cop: f64,
    max_outflow: Watts,
    inflow_conn: Option<ConnectionId>,
    outflow_conn: Option<ConnectionId>,
    in_from_env_conn: Option<ConnectionId>,
    wasteflow_conn: Option<ConnectionId>,
) {
    let Some(inflow_conn) = inflow_conn else { return };
    let inflow_avail = state.flows.get(inflow_conn).available;
    let outflow_avail = inflow_avail.mul_floor_by(cop).min(max_outflow);
    if let Some(outflow_conn) = outflow_conn {
        set_available(state, outflow_conn, outflow_avail);
    }
    update_mover_environment_and_waste(state, max_outflow, Some(inflow_conn), outflow_conn, in_from_env_conn, wasteflow_conn);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ConstantEfficiencyConverterRow, ConstantLoadRow, ConstantSourceRow};
    use crate::connection::{Connection, ConnectionTable};
    use crate::ids::WILDCARD_FLOW_TYPE;

    /// Source(100W) -> ConstantLoad(10W): single fixed point, actual = 10.
    #[test]
    fn source_to_load_reaches_expected_actual() {
        let mut components = ComponentTable::new();
        let source = components.add_constant_source(
            "src",
            ConstantSourceRow { available_w: Watts::new(100), outflow_conn: None },
        );
        let load = components.add_constant_load(
            "load",
            ConstantLoadRow { load_w: Watts::new(10), inflow_conn: None },
        );

        let mut connections = ConnectionTable::new();
        let conn = connections.add(Connection {
            from_id: source,
            from_port: 0,
            to_id: load,
            to_port: 0,
            flow_type: WILDCARD_FLOW_TYPE,
        });

        let mut state = SimulationState::new_for_occurrence(&components, connections.len());
        state.flows.get_mut(conn).requested = Watts::new(10);
        state.flows.get_mut(conn).available = Watts::new(100);

        run_active_connections(&components, &connections, &mut state).unwrap();

        let flow = state.flows.get(conn);
        assert_eq!(flow.requested.value(), 10);
        assert_eq!(flow.available.value(), 100);
        assert_eq!(flow.actual.value(), 10);
    }

    #[test]
    fn converter_backward_rounds_inflow_request_up() {
        let mut components = ComponentTable::new();
        let conv = components.add_constant_efficiency_converter(
            "conv",
            ConstantEfficiencyConverterRow {
                efficiency: 0.5,
                max_outflow_w: Watts::UNLIMITED,
                max_lossflow_w: Watts::ZERO,
                inflow_conn: None,
                outflow_conn: None,
                lossflow_conn: None,
                wasteflow_conn: None,
            },
        );
        let mut connections = ConnectionTable::new();
        let inflow = connections.add(Connection {
            from_id: ComponentId::new(99),
            from_port: 0,
            to_id: conv,
            to_port: 0,
            flow_type: WILDCARD_FLOW_TYPE,
        });
        let outflow = connections.add(Connection {
            from_id: conv,
            from_port: 0,
            to_id: ComponentId::new(100),
            to_port: 0,
            flow_type: WILDCARD_FLOW_TYPE,
        });
        components.constant_efficiency_converters[0].inflow_conn = Some(inflow);
        components.constant_efficiency_converters[0].outflow_conn = Some(outflow);

        let mut state = SimulationState::new_for_occurrence(&components, connections.len());
        state.flows.get_mut(outflow).requested = Watts::new(21);
        state.active_back.insert(outflow);

        run_connection_backward(&components, &connections, &mut state, outflow);

        assert_eq!(state.flows.get(inflow).requested.value(), 42);
    }
}
