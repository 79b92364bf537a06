//! Scenario occurrences: the outer driver that seeds state, runs the
//! kernel to the occurrence's end, and collects snapshots (§4.7).

use crate::calendar::next_event_time;
use crate::component::{schedule_value_at, ComponentKind};
use crate::error::ErinResult;
use crate::ids::ComponentId;
use crate::kernel::run_active_connections;
use crate::model::Model;
use crate::reliability::{sample_fragility_failure, Distribution, FragilityCurve, ReliabilitySchedule, TimeState, UpDown};
use crate::stats::{check_energy_balance, Snapshot};
use crate::state::SimulationState;
use crate::storage::{advance_storage, update_store_transitions};
use crate::units::{Seconds, Watts};
use rand::Rng;
use std::collections::{BTreeSet, HashMap};

/// One failure mode attached to a component: alternating break/repair
/// distribution draws build its schedule (§4.5).
#[derive(Debug, Clone)]
pub struct FailureModeSpec {
    pub id: usize,
    pub component: ComponentId,
    pub break_dist: Distribution,
    pub repair_dist: Distribution,
}

/// One fragility mode attached to a component: a hazard curve sampled
/// once at occurrence start against the scenario's intensity (§4.5).
#[derive(Debug, Clone)]
pub struct FragilityModeSpec {
    pub id: usize,
    pub component: ComponentId,
    pub curve: FragilityCurve,
    pub intensity: f64,
    pub repair_dist: Option<Distribution>,
}

/// A scenario: an occurrence-timing distribution plus the reliability
/// and fragility modes and load/source overrides that apply during it.
#[derive(Debug, Clone)]
pub struct ScenarioSpec {
    pub tag: String,
    pub occurrence_distribution: Distribution,
    pub max_occurrences: usize,
    pub duration_s: Seconds,
    pub failure_modes: Vec<FailureModeSpec>,
    pub fragility_modes: Vec<FragilityModeSpec>,
}

/// One firing of a scenario at a specific time (§4.7, glossary:
/// "Occurrence").
#[derive(Debug, Clone, Copy)]
pub struct Occurrence {
    pub index: usize,
    pub start_time_s: Seconds,
}

/// Draws occurrence start times from the scenario's distribution,
/// truncated by `max_occurrences` and `horizon_s`.
pub fn compute_occurrence_times(scenario: &ScenarioSpec, horizon_s: Seconds, rng: &mut impl Rng) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();
    let mut t = 0.0;
    let mut index = 0;
    while index < scenario.max_occurrences && t < horizon_s {
        occurrences.push(Occurrence { index, start_time_s: t });
        index += 1;
        t += scenario.occurrence_distribution.sample(rng).max(0.0);
    }
    occurrences
}

/// Builds the merged, per-component reliability schedule for one
/// occurrence from the scenario's failure and fragility modes.
fn build_reliability_schedules(
    model: &Model,
    scenario: &ScenarioSpec,
    rng: &mut impl Rng,
) -> Vec<ReliabilitySchedule> {
    let mut schedules = vec![ReliabilitySchedule::always_up(); model.components.len()];

    for mode in &scenario.failure_modes {
        let initial_age = model.components.get(mode.component).initial_age_s;
        let schedule = ReliabilitySchedule::from_break_repair(
            &mode.break_dist,
            &mode.repair_dist,
            scenario.duration_s,
            initial_age,
            mode.id,
            rng,
        );
        let idx = mode.component.index();
        schedules[idx] = ReliabilitySchedule::merge(&schedules[idx], &schedule);
    }

    for mode in &scenario.fragility_modes {
        let failed = sample_fragility_failure(&mode.curve, mode.intensity, rng);
        if !failed {
            continue;
        }
        let repair_time = mode
            .repair_dist
            .as_ref()
            .map(|d| d.sample(rng).max(0.0))
            .unwrap_or(scenario.duration_s);
        let mut transitions = vec![TimeState {
            time_s: 0.0,
            state: UpDown::Down,
            failure_mode_causes: BTreeSet::new(),
            fragility_mode_causes: BTreeSet::from([mode.id]),
        }];
        if repair_time < scenario.duration_s {
            transitions.push(TimeState {
                time_s: repair_time,
                state: UpDown::Up,
                failure_mode_causes: BTreeSet::new(),
                fragility_mode_causes: BTreeSet::new(),
            });
        }
        let schedule = ReliabilitySchedule { transitions };
        let idx = mode.component.index();
        schedules[idx] = ReliabilitySchedule::merge(&schedules[idx], &schedule);
    }

    schedules
}

fn seed_initial_flows(model: &Model, state: &mut SimulationState) {
    for id in model.components.iter_ids() {
        let c = model.components.get(id);
        match c.kind {
            ComponentKind::ConstantLoad => {
                let row = &model.components.constant_loads[c.subtype_idx.index()];
                if let Some(conn) = row.inflow_conn {
                    state.flows.get_mut(conn).requested = row.load_w;
                    state.active_back.insert(conn);
                }
            }
            ComponentKind::ScheduleBasedLoad => {
                let row = &model.components.schedule_based_loads[c.subtype_idx.index()];
                let (amount, _) = schedule_value_at(&row.schedule, 0.0, 0);
                if let Some(conn) = row.inflow_conn {
                    state.flows.get_mut(conn).requested = Watts::new(amount);
                    state.active_back.insert(conn);
                }
            }
            ComponentKind::ConstantSource => {
                let row = &model.components.constant_sources[c.subtype_idx.index()];
                if let Some(conn) = row.outflow_conn {
                    state.flows.get_mut(conn).available = row.available_w;
                    state.active_forward.insert(conn);
                }
            }
            ComponentKind::ScheduleBasedSource => {
                let row = &model.components.schedule_based_sources[c.subtype_idx.index()];
                let (amount, _) = schedule_value_at(&row.schedule, 0.0, 0);
                if let Some(conn) = row.outflow_conn {
                    state.flows.get_mut(conn).available = Watts::new(amount).min(row.max_outflow_w);
                    state.active_forward.insert(conn);
                }
            }
            ComponentKind::EnvironmentSource => {
                let row = &model.components.environment_sources[c.subtype_idx.index()];
                if let Some(conn) = row.outflow_conn {
                    state.flows.get_mut(conn).available = Watts::UNLIMITED;
                    state.active_forward.insert(conn);
                }
            }
            ComponentKind::WasteSink => {
                let row = &model.components.waste_sinks[c.subtype_idx.index()];
                if let Some(conn) = row.inflow_conn {
                    state.flows.get_mut(conn).requested = Watts::UNLIMITED;
                    state.active_back.insert(conn);
                }
            }
            _ => {}
        }
    }
}

/// Recomputes which components are down at `t_s` and enqueues every
/// connection touching a component whose availability just changed, so a
/// reliability transition with no coincident schedule breakpoint still
/// triggers re-propagation (§4.5 combined with §4.1's work-set model).
fn refresh_unavailable(
    model: &Model,
    state: &mut SimulationState,
    schedules: &[ReliabilitySchedule],
    t_s: Seconds,
) {
    let previous = std::mem::take(&mut state.unavailable_components);
    for id in model.components.iter_ids() {
        if schedules[id.index()].state_at(t_s) == UpDown::Down {
            state.unavailable_components.insert(id);
        }
    }
    if previous == state.unavailable_components {
        return;
    }
    for id in previous.symmetric_difference(&state.unavailable_components) {
        for conn in model.connections.outgoing_from(*id) {
            state.active_back.insert(conn);
            state.active_forward.insert(conn);
        }
        for conn in model.connections.incoming_to(*id) {
            state.active_back.insert(conn);
            state.active_forward.insert(conn);
        }
    }
}

fn advance_schedule_cursors(model: &Model, state: &mut SimulationState, t_s: Seconds) {
    for (row, cursor) in model
        .components
        .schedule_based_loads
        .iter()
        .zip(state.schedule_based_load_cursor.iter_mut())
    {
        let (amount, new_cursor) = schedule_value_at(&row.schedule, t_s, *cursor);
        *cursor = new_cursor;
        if let Some(conn) = row.inflow_conn {
            let requested = Watts::new(amount);
            if state.flows.get(conn).requested != requested {
                state.flows.get_mut(conn).requested = requested;
                state.active_back.insert(conn);
            }
        }
    }
    for (row, cursor) in model
        .components
        .schedule_based_sources
        .iter()
        .zip(state.schedule_based_source_cursor.iter_mut())
    {
        let (amount, new_cursor) = schedule_value_at(&row.schedule, t_s, *cursor);
        *cursor = new_cursor;
        if let Some(conn) = row.outflow_conn {
            let available = Watts::new(amount).min(row.max_outflow_w);
            if state.flows.get(conn).available != available {
                state.flows.get_mut(conn).available = available;
                state.active_forward.insert(conn);
            }
        }
    }
}

/// Per-mode downtime totals and event counts folded out of the merged
/// reliability schedules, keyed by failure-mode/fragility-mode id (§4.8:
/// "failure event counts and downtime by failure-mode id and by
/// fragility-mode id"). A mode id already identifies a single component
/// (one [`FailureModeSpec`]/[`FragilityModeSpec`] names exactly one), so
/// the per-component breakdown the spec also asks for is recoverable by
/// joining these maps against the scenario's mode list.
#[derive(Debug, Clone, Default)]
pub struct ReliabilityModeStats {
    pub failure_downtime_s: HashMap<usize, Seconds>,
    pub failure_event_counts: HashMap<usize, usize>,
    pub fragility_downtime_s: HashMap<usize, Seconds>,
    pub fragility_event_counts: HashMap<usize, usize>,
}

/// Runs one scenario occurrence to completion, returning its snapshots,
/// the down-time intervals sampled for each component (for
/// `compute_occurrence_stats`'s availability figures), and per-mode
/// downtime/event-count statistics.
pub fn run_occurrence(
    model: &Model,
    scenario: &ScenarioSpec,
    rng: &mut impl Rng,
) -> ErinResult<(
    Vec<Snapshot>,
    HashMap<usize, Vec<(Seconds, Seconds)>>,
    ReliabilityModeStats,
    Vec<ReliabilitySchedule>,
)> {
    let schedules = build_reliability_schedules(model, scenario, rng);
    let mut state = SimulationState::new_for_occurrence(&model.components, model.connections.len());

    refresh_unavailable(model, &mut state, &schedules, 0.0);
    seed_initial_flows(model, &mut state);

    let mut snapshots = Vec::new();
    let mut t = 0.0;

    run_active_connections(&model.components, &model.connections, &mut state)?;
    update_store_transitions(&model.components, &mut state);
    let snapshot = take_snapshot(t, &state);
    check_energy_balance(model, &snapshot, &scenario.tag);
    snapshots.push(snapshot);

    while t < scenario.duration_s {
        let next = next_event_time(&model.components, &state, &schedules, t, scenario.duration_s);
        if !(next > t) {
            break;
        }
        let dt = next - t;
        advance_storage(&model.components, &mut state, dt);
        t = next;

        advance_schedule_cursors(model, &mut state, t);
        refresh_unavailable(model, &mut state, &schedules, t);

        run_active_connections(&model.components, &model.connections, &mut state)?;
        update_store_transitions(&model.components, &mut state);
        let snapshot = take_snapshot(t, &state);
        check_energy_balance(model, &snapshot, &scenario.tag);
        snapshots.push(snapshot);
    }

    let downtime_intervals = reconstruct_downtime_intervals(&schedules, scenario.duration_s);
    let mode_stats = reconstruct_mode_stats(&schedules, scenario.duration_s);
    Ok((snapshots, downtime_intervals, mode_stats, schedules))
}

fn take_snapshot(t_s: Seconds, state: &SimulationState) -> Snapshot {
    Snapshot {
        t_s,
        flows: state.flows.as_slice().to_vec(),
        storage_amounts_j: state.storage_amounts_j.clone(),
    }
}

fn reconstruct_downtime_intervals(
    schedules: &[ReliabilitySchedule],
    duration_s: Seconds,
) -> HashMap<usize, Vec<(Seconds, Seconds)>> {
    let mut result = HashMap::new();
    for (idx, schedule) in schedules.iter().enumerate() {
        let mut intervals = Vec::new();
        let mut down_start: Option<Seconds> = if schedule.state_at(0.0) == UpDown::Down {
            Some(0.0)
        } else {
            None
        };
        for ts in &schedule.transitions {
            match (ts.state, down_start) {
                (UpDown::Down, None) => down_start = Some(ts.time_s),
                (UpDown::Up, Some(start)) => {
                    intervals.push((start, ts.time_s));
                    down_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = down_start {
            intervals.push((start, duration_s));
        }
        if !intervals.is_empty() {
            result.insert(idx, intervals);
        }
    }
    result
}

/// Walks every component's merged schedule, attributing each down segment's
/// duration to every mode id in its cause set and counting one event per
/// contiguous run during which a given mode id stays part of the cause set.
fn reconstruct_mode_stats(schedules: &[ReliabilitySchedule], duration_s: Seconds) -> ReliabilityModeStats {
    let mut stats = ReliabilityModeStats::default();
    for schedule in schedules {
        let mut open_failure: std::collections::HashSet<usize> = std::collections::HashSet::new();
        let mut open_fragility: std::collections::HashSet<usize> = std::collections::HashSet::new();
        let boundary_causes: BTreeSet<usize> = BTreeSet::new();
        let segments = schedule.transitions.iter().map(|ts| (ts.time_s, ts.state, &ts.failure_mode_causes, &ts.fragility_mode_causes));
        let initial: (Seconds, UpDown, &BTreeSet<usize>, &BTreeSet<usize>) = (0.0, UpDown::Up, &boundary_causes, &boundary_causes);
        let mut prev = initial;
        for (time_s, state, failure_causes, fragility_causes) in segments.chain(std::iter::once((duration_s, UpDown::Up, &boundary_causes, &boundary_causes))) {
            let (seg_start, seg_state, seg_failure, seg_fragility) = prev;
            let seg_dt = time_s - seg_start;
            if seg_state == UpDown::Down && seg_dt > 0.0 {
                for &id in seg_failure {
                    *stats.failure_downtime_s.entry(id).or_insert(0.0) += seg_dt;
                    if open_failure.insert(id) {
                        *stats.failure_event_counts.entry(id).or_insert(0) += 1;
                    }
                }
                open_failure.retain(|id| seg_failure.contains(id));
                for &id in seg_fragility {
                    *stats.fragility_downtime_s.entry(id).or_insert(0.0) += seg_dt;
                    if open_fragility.insert(id) {
                        *stats.fragility_event_counts.entry(id).or_insert(0) += 1;
                    }
                }
                open_fragility.retain(|id| seg_fragility.contains(id));
            } else {
                open_failure.clear();
                open_fragility.clear();
            }
            prev = (time_s, state, failure_causes, fragility_causes);
        }
    }
    stats
}
