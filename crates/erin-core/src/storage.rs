//! Post-sweep storage reconciliation (§4.3).
//!
//! Once a propagation round has finalized every connection's `actual`
//! flow, each store's net charge rate is fixed for the interval until
//! the next event. This module computes that net rate, the time of the
//! store's next own transition (full, drained, or back above the
//! recharge threshold), and advances state-of-charge between events.

use crate::component::ComponentTable;
use crate::state::SimulationState;
use crate::units::{Seconds, Watts};

/// Sets a store's wasteflow leg to a fixed rate, or to zero, for the
/// interval until the next event. Written directly rather than through
/// the kernel's `set_requested`/`set_available` (which also re-enqueue
/// propagation work): this runs after a round has already converged, and
/// the leg is terminal (it feeds a waste sink), so nothing downstream
/// needs to re-run.
fn set_store_wasteflow(state: &mut SimulationState, conn: crate::ids::ConnectionId, value: Watts) {
    let flow = state.flows.get_mut(conn);
    flow.requested = value;
    flow.available = value;
    flow.actual = value;
}

/// Recomputes `storage_next_event_times_s` for every store from the
/// flows finalized by the most recent propagation round, and refreshes
/// the wasteflow leg (if wired) to the charge-side efficiency loss.
pub fn update_store_transitions(components: &ComponentTable, state: &mut SimulationState) {
    for (component_id, row) in components.stores_iter() {
        let idx = components.get(component_id).subtype_idx.index();
        let inflow_actual = row
            .inflow_conn
            .map(|c| state.flows.get(c).actual.value())
            .unwrap_or(0);
        let outflow_actual = row
            .outflow_conn
            .map(|c| state.flows.get(c).actual.value())
            .unwrap_or(0);
        let net_charge = inflow_actual as i64 - outflow_actual as i64;
        let soc = state.storage_amounts_j[idx];

        state.storage_next_event_times_s[idx] = if net_charge > 0 {
            // Only split off a wasteflow leg when one is wired; a store
            // with no waste leg keeps storeflow == netCharge, matching
            // the original's next-event timing for that case.
            let storeflow = if row.wasteflow_conn.is_some() {
                (net_charge as f64) * row.roundtrip_efficiency
            } else {
                net_charge as f64
            };
            if let Some(waste_conn) = row.wasteflow_conn {
                let waste = ((net_charge as f64) - storeflow).max(0.0);
                set_store_wasteflow(state, waste_conn, Watts::new(waste.round() as u64));
            }
            if storeflow > 0.0 {
                let headroom = (row.capacity_j.saturating_sub(soc)) as f64;
                headroom / storeflow
            } else {
                f64::INFINITY
            }
        } else {
            if let Some(waste_conn) = row.wasteflow_conn {
                set_store_wasteflow(state, waste_conn, Watts::ZERO);
            }
            if net_charge < 0 {
                let magnitude = (-net_charge) as f64;
                if soc > row.charge_threshold_j {
                    ((soc - row.charge_threshold_j) as f64) / magnitude
                } else {
                    (soc as f64) / magnitude
                }
            } else {
                f64::INFINITY
            }
        };
    }
}

/// Advances every store's state-of-charge by `dt_s` at its current net
/// charge rate, clamping to `[0, capacity_j]` (a violation here is a
/// programming error, not user input — the event calendar is supposed to
/// stop exactly at the boundary).
pub fn advance_storage(components: &ComponentTable, state: &mut SimulationState, dt_s: Seconds) {
    for (component_id, row) in components.stores_iter() {
        let idx = components.get(component_id).subtype_idx.index();
        let inflow_actual = row
            .inflow_conn
            .map(|c| state.flows.get(c).actual.value())
            .unwrap_or(0);
        let outflow_actual = row
            .outflow_conn
            .map(|c| state.flows.get(c).actual.value())
            .unwrap_or(0);
        let wasteflow_actual = row
            .wasteflow_conn
            .map(|c| state.flows.get(c).actual.value())
            .unwrap_or(0);
        let net_charge = inflow_actual as i64 - outflow_actual as i64 - wasteflow_actual as i64;
        let delta = (net_charge as f64) * dt_s;
        let soc = state.storage_amounts_j[idx] as f64 + delta;
        state.storage_amounts_j[idx] = soc.round().clamp(0.0, row.capacity_j as f64) as u64;
    }
}
