//! The event calendar: a linear scan for the next simulated time at
//! which something can change (§4.6).
//!
//! The calendar is deliberately not a priority queue — with model sizes
//! in the thousands of components, an O(components) scan per iteration
//! is cheaper than maintaining a heap, and it keeps the next-event
//! computation a pure function of the current state rather than another
//! piece of mutable bookkeeping to keep in sync.

use crate::component::ComponentTable;
use crate::reliability::ReliabilitySchedule;
use crate::state::SimulationState;
use crate::units::Seconds;

/// Computes the next event time as the minimum over every scheduled
/// load/source transition, every store's next threshold time, every
/// component's next reliability transition, and the occurrence's end.
pub fn next_event_time(
    components: &ComponentTable,
    state: &SimulationState,
    reliability_schedules: &[ReliabilitySchedule],
    t_s: Seconds,
    occurrence_end_s: Seconds,
) -> Seconds {
    let mut next = occurrence_end_s;

    for (row, &cursor) in components
        .schedule_based_loads
        .iter()
        .zip(state.schedule_based_load_cursor.iter())
    {
        if let Some(point) = row.schedule.get(cursor + 1) {
            next = next.min(point.time_s);
        }
    }

    for (row, &cursor) in components
        .schedule_based_sources
        .iter()
        .zip(state.schedule_based_source_cursor.iter())
    {
        if let Some(point) = row.schedule.get(cursor + 1) {
            next = next.min(point.time_s);
        }
    }

    for &t in &state.storage_next_event_times_s {
        if t.is_finite() {
            next = next.min(t_s + t);
        }
    }

    for schedule in reliability_schedules {
        let transition = schedule.next_transition_after(t_s);
        if transition.is_finite() {
            next = next.min(transition);
        }
    }

    next.min(occurrence_end_s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentTable, SchedulePoint, ScheduleBasedLoadRow};

    #[test]
    fn picks_the_nearest_schedule_breakpoint() {
        let mut components = ComponentTable::new();
        components.add_schedule_based_load(
            "load",
            ScheduleBasedLoadRow {
                schedule: vec![
                    SchedulePoint { time_s: 0.0, amount_w: 10 },
                    SchedulePoint { time_s: 3600.0, amount_w: 200 },
                ],
                inflow_conn: None,
            },
        );
        let state = SimulationState::new_for_occurrence(&components, 1);
        let next = next_event_time(&components, &state, &[], 0.0, 7200.0);
        assert_eq!(next, 3600.0);
    }

    #[test]
    fn falls_back_to_occurrence_end_when_nothing_else_pending() {
        let components = ComponentTable::new();
        let state = SimulationState::new_for_occurrence(&components, 0);
        let next = next_event_time(&components, &state, &[], 0.0, 100.0);
        assert_eq!(next, 100.0);
    }
}
