//! Mutable simulation state, reset at the start of every scenario occurrence.
//!
//! [`SimulationState`] is the only mutable data the propagation kernel
//! touches at runtime; the [`crate::model::Model`] it runs against (components,
//! connections, reliability schedules once built) is treated as read-only
//! during a single occurrence (§5). Keeping the two separate is what lets
//! the scenario driver re-seed state cheaply between occurrences without
//! rebuilding the model.

use crate::component::ComponentTable;
use crate::flow::FlowTable;
use crate::ids::{ComponentId, ConnectionId};
use crate::units::Seconds;
use std::collections::BTreeSet;

/// All per-occurrence mutable state (§3: "SimulationState").
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub storage_amounts_j: Vec<u64>,
    pub storage_next_event_times_s: Vec<Seconds>,
    pub flows: FlowTable,
    pub schedule_based_load_cursor: Vec<usize>,
    pub schedule_based_source_cursor: Vec<usize>,
    pub switch_states: Vec<bool>,
    /// Connections pending a backward (request) re-propagation. A
    /// `BTreeSet` keeps iteration order deterministic, which §5 requires
    /// for reproducibility.
    pub active_back: BTreeSet<ConnectionId>,
    /// Connections pending a forward (availability) re-propagation.
    pub active_forward: BTreeSet<ConnectionId>,
    pub unavailable_components: BTreeSet<ComponentId>,
}

impl SimulationState {
    /// Builds a freshly-seeded state for one occurrence: storage at its
    /// configured initial level, schedule cursors at zero, no active
    /// work, nothing unavailable yet (reliability sampling populates
    /// `unavailable_components` separately, per §4.5).
    pub fn new_for_occurrence(components: &ComponentTable, connection_count: usize) -> Self {
        let storage_amounts_j = components.stores.iter().map(|s| s.initial_storage_j).collect();
        let storage_next_event_times_s = vec![f64::INFINITY; components.stores.len()];
        Self {
            storage_amounts_j,
            storage_next_event_times_s,
            flows: FlowTable::new(connection_count),
            schedule_based_load_cursor: vec![0; components.schedule_based_loads.len()],
            schedule_based_source_cursor: vec![0; components.schedule_based_sources.len()],
            switch_states: vec![false; components.switches.len()],
            active_back: BTreeSet::new(),
            active_forward: BTreeSet::new(),
            unavailable_components: BTreeSet::new(),
        }
    }

    pub fn enqueue_back(&mut self, id: ConnectionId) {
        self.active_back.insert(id);
    }

    pub fn enqueue_forward(&mut self, id: ConnectionId) {
        self.active_forward.insert(id);
    }

    pub fn is_unavailable(&self, id: ComponentId) -> bool {
        self.unavailable_components.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::StoreRow;

    #[test]
    fn seeds_storage_from_initial_storage_j() {
        let mut components = ComponentTable::new();
        components.add_store(
            "battery",
            StoreRow {
                initial_storage_j: 500,
                ..Default::default()
            },
        );
        let state = SimulationState::new_for_occurrence(&components, 2);
        assert_eq!(state.storage_amounts_j, vec![500]);
        assert_eq!(state.storage_next_event_times_s, vec![f64::INFINITY]);
        assert_eq!(state.flows.len(), 2);
    }

    #[test]
    fn active_sets_start_empty_and_enqueue_deterministically() {
        let components = ComponentTable::new();
        let mut state = SimulationState::new_for_occurrence(&components, 3);
        state.enqueue_back(ConnectionId::new(2));
        state.enqueue_back(ConnectionId::new(0));
        state.enqueue_back(ConnectionId::new(1));
        let ordered: Vec<_> = state.active_back.iter().map(|c| c.index()).collect();
        assert_eq!(ordered, vec![0, 1, 2]);
    }
}
