//! Component records and the per-kind struct-of-arrays tables (§3).
//!
//! Every component in a model gets one [`Component`] record in the flat
//! `components` list; its kind-specific fields live in a separate table
//! indexed by [`crate::ids::SubtypeIdx`], keyed off [`ComponentKind`].
//! This mirrors the source engine's layout: hot per-iteration fields
//! (capacities, connection ids) sit contiguously per kind rather than
//! behind a `dyn Component` vtable, so the propagation kernel (§4.1)
//! scans flat arrays instead of chasing pointers.

use crate::ids::{ComponentId, ConnectionId, FlowTypeId, SubtypeIdx};
use crate::units::{Seconds, Watts};
use serde::{Deserialize, Serialize};

/// Tagged variant selecting which per-kind table a component's data lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    ConstantLoad,
    ScheduleBasedLoad,
    ConstantSource,
    ScheduleBasedSource,
    ConstantEfficiencyConverter,
    VariableEfficiencyConverter,
    Mover,
    VariableEfficiencyMover,
    Mux,
    Store,
    PassThrough,
    Switch,
    WasteSink,
    EnvironmentSource,
}

/// One logical component: a handle into `components` plus a pointer into
/// its kind's own table.
#[derive(Debug, Clone)]
pub struct Component {
    pub kind: ComponentKind,
    pub subtype_idx: SubtypeIdx,
    pub tag: String,
    pub inflow_types: Vec<FlowTypeId>,
    pub outflow_types: Vec<FlowTypeId>,
    pub initial_age_s: Seconds,
    /// Whether this component's connections are written to the events CSV.
    pub report: bool,
}

impl Component {
    pub fn new(kind: ComponentKind, subtype_idx: SubtypeIdx, tag: impl Into<String>) -> Self {
        Self {
            kind,
            subtype_idx,
            tag: tag.into(),
            inflow_types: Vec::new(),
            outflow_types: Vec::new(),
            initial_age_s: 0.0,
            report: true,
        }
    }
}

/// A point on a piecewise-linear efficiency/COP curve: `(outflow_W,
/// factor)`, sorted ascending by `outflow_W`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub outflow_w: u64,
    pub factor: f64,
}

/// A scheduled (time, amount) breakpoint for loads/sources. Amounts hold
/// until the next breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulePoint {
    pub time_s: Seconds,
    pub amount_w: u64,
}

/// Linear interpolation over a sorted curve, clamped at the endpoints.
pub fn interpolate_curve(points: &[CurvePoint], x: u64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    if x <= points[0].outflow_w {
        return points[0].factor;
    }
    let last = points.len() - 1;
    if x >= points[last].outflow_w {
        return points[last].factor;
    }
    for w in points.windows(2) {
        let (lo, hi) = (w[0], w[1]);
        if x >= lo.outflow_w && x <= hi.outflow_w {
            let span = (hi.outflow_w - lo.outflow_w) as f64;
            if span == 0.0 {
                return lo.factor;
            }
            let t = (x - lo.outflow_w) as f64 / span;
            return lo.factor + t * (hi.factor - lo.factor);
        }
    }
    points[last].factor
}

/// Finds the schedule entry in effect at `t_s`, returning its amount and
/// the index of that entry. The index is handed back to the caller as a
/// cursor so repeated calls with increasing `t_s` are O(1) amortized.
pub fn schedule_value_at(schedule: &[SchedulePoint], t_s: Seconds, cursor: usize) -> (u64, usize) {
    if schedule.is_empty() {
        return (0, 0);
    }
    let mut idx = cursor.min(schedule.len() - 1);
    while idx + 1 < schedule.len() && schedule[idx + 1].time_s <= t_s {
        idx += 1;
    }
    (schedule[idx].amount_w, idx)
}

#[derive(Debug, Clone, Default)]
pub struct ConstantLoadRow {
    pub load_w: Watts,
    pub inflow_conn: Option<ConnectionId>,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleBasedLoadRow {
    pub schedule: Vec<SchedulePoint>,
    pub inflow_conn: Option<ConnectionId>,
}

#[derive(Debug, Clone, Default)]
pub struct ConstantSourceRow {
    pub available_w: Watts,
    pub outflow_conn: Option<ConnectionId>,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleBasedSourceRow {
    pub schedule: Vec<SchedulePoint>,
    pub max_outflow_w: Watts,
    pub outflow_conn: Option<ConnectionId>,
    pub wasteflow_conn: Option<ConnectionId>,
}

#[derive(Debug, Clone, Default)]
pub struct ConstantEfficiencyConverterRow {
    pub efficiency: f64,
    pub max_outflow_w: Watts,
    pub max_lossflow_w: Watts,
    pub inflow_conn: Option<ConnectionId>,
    pub outflow_conn: Option<ConnectionId>,
    pub lossflow_conn: Option<ConnectionId>,
    pub wasteflow_conn: Option<ConnectionId>,
}

#[derive(Debug, Clone, Default)]
pub struct VariableEfficiencyConverterRow {
    pub efficiency_curve: Vec<CurvePoint>,
    pub max_outflow_w: Watts,
    pub max_lossflow_w: Watts,
    pub inflow_conn: Option<ConnectionId>,
    pub outflow_conn: Option<ConnectionId>,
    pub lossflow_conn: Option<ConnectionId>,
    pub wasteflow_conn: Option<ConnectionId>,
}

#[derive(Debug, Clone, Default)]
pub struct MoverRow {
    pub cop: f64,
    pub max_outflow_w: Watts,
    pub inflow_conn: Option<ConnectionId>,
    pub outflow_conn: Option<ConnectionId>,
    pub in_from_env_conn: Option<ConnectionId>,
    pub wasteflow_conn: Option<ConnectionId>,
}

#[derive(Debug, Clone, Default)]
pub struct VariableEfficiencyMoverRow {
    pub cop_curve: Vec<CurvePoint>,
    pub max_outflow_w: Watts,
    pub inflow_conn: Option<ConnectionId>,
    pub outflow_conn: Option<ConnectionId>,
    pub in_from_env_conn: Option<ConnectionId>,
    pub wasteflow_conn: Option<ConnectionId>,
}

#[derive(Debug, Clone, Default)]
pub struct MuxRow {
    pub inflow_conns: Vec<ConnectionId>,
    pub outflow_conns: Vec<ConnectionId>,
    pub max_outflows_w: Vec<Watts>,
}

impl MuxRow {
    pub fn num_inflows(&self) -> usize {
        self.inflow_conns.len()
    }

    pub fn num_outflows(&self) -> usize {
        self.outflow_conns.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoreRow {
    pub capacity_j: u64,
    pub max_charge_rate_w: Watts,
    pub max_discharge_rate_w: Watts,
    pub charge_threshold_j: u64,
    pub initial_storage_j: u64,
    pub roundtrip_efficiency: f64,
    pub max_outflow_w: Watts,
    pub inflow_conn: Option<ConnectionId>,
    pub outflow_conn: Option<ConnectionId>,
    pub wasteflow_conn: Option<ConnectionId>,
}

#[derive(Debug, Clone, Default)]
pub struct PassThroughRow {
    pub max_outflow_w: Watts,
    pub inflow_conn: Option<ConnectionId>,
    pub outflow_conn: Option<ConnectionId>,
}

#[derive(Debug, Clone, Default)]
pub struct SwitchRow {
    pub primary_inflow_conn: Option<ConnectionId>,
    pub secondary_inflow_conn: Option<ConnectionId>,
    pub outflow_conn: Option<ConnectionId>,
    pub max_outflow_w: Watts,
    /// `true` when the switch is drawing from the secondary source.
    pub on_secondary: bool,
}

#[derive(Debug, Clone, Default)]
pub struct WasteSinkRow {
    pub inflow_conn: Option<ConnectionId>,
}

#[derive(Debug, Clone, Default)]
pub struct EnvironmentSourceRow {
    pub outflow_conn: Option<ConnectionId>,
}

/// Struct-of-arrays storage for every component kind's semantic fields,
/// addressed by [`ComponentKind`] + [`SubtypeIdx`].
#[derive(Debug, Clone, Default)]
pub struct ComponentTable {
    pub components: Vec<Component>,
    pub constant_loads: Vec<ConstantLoadRow>,
    pub schedule_based_loads: Vec<ScheduleBasedLoadRow>,
    pub constant_sources: Vec<ConstantSourceRow>,
    pub schedule_based_sources: Vec<ScheduleBasedSourceRow>,
    pub constant_efficiency_converters: Vec<ConstantEfficiencyConverterRow>,
    pub variable_efficiency_converters: Vec<VariableEfficiencyConverterRow>,
    pub movers: Vec<MoverRow>,
    pub variable_efficiency_movers: Vec<VariableEfficiencyMoverRow>,
    pub muxes: Vec<MuxRow>,
    pub stores: Vec<StoreRow>,
    pub pass_throughs: Vec<PassThroughRow>,
    pub switches: Vec<SwitchRow>,
    pub waste_sinks: Vec<WasteSinkRow>,
    pub environment_sources: Vec<EnvironmentSourceRow>,
}

macro_rules! add_component_kind {
    ($fn_name:ident, $variant:ident, $table:ident, $row:ty) => {
        pub fn $fn_name(&mut self, tag: impl Into<String>, row: $row) -> ComponentId {
            let subtype_idx = SubtypeIdx::new(self.$table.len());
            self.$table.push(row);
            let id = ComponentId::new(self.components.len());
            self.components
                .push(Component::new(ComponentKind::$variant, subtype_idx, tag));
            id
        }
    };
}

impl ComponentTable {
    pub fn new() -> Self {
        Self::default()
    }

    add_component_kind!(add_constant_load, ConstantLoad, constant_loads, ConstantLoadRow);
    add_component_kind!(
        add_schedule_based_load,
        ScheduleBasedLoad,
        schedule_based_loads,
        ScheduleBasedLoadRow
    );
    add_component_kind!(add_constant_source, ConstantSource, constant_sources, ConstantSourceRow);
    add_component_kind!(
        add_schedule_based_source,
        ScheduleBasedSource,
        schedule_based_sources,
        ScheduleBasedSourceRow
    );
    add_component_kind!(
        add_constant_efficiency_converter,
        ConstantEfficiencyConverter,
        constant_efficiency_converters,
        ConstantEfficiencyConverterRow
    );
    add_component_kind!(
        add_variable_efficiency_converter,
        VariableEfficiencyConverter,
        variable_efficiency_converters,
        VariableEfficiencyConverterRow
    );
    add_component_kind!(add_mover, Mover, movers, MoverRow);
    add_component_kind!(
        add_variable_efficiency_mover,
        VariableEfficiencyMover,
        variable_efficiency_movers,
        VariableEfficiencyMoverRow
    );
    add_component_kind!(add_mux, Mux, muxes, MuxRow);
    add_component_kind!(add_store, Store, stores, StoreRow);
    add_component_kind!(add_pass_through, PassThrough, pass_throughs, PassThroughRow);
    add_component_kind!(add_switch, Switch, switches, SwitchRow);
    add_component_kind!(add_waste_sink, WasteSink, waste_sinks, WasteSinkRow);
    add_component_kind!(
        add_environment_source,
        EnvironmentSource,
        environment_sources,
        EnvironmentSourceRow
    );

    pub fn get(&self, id: ComponentId) -> &Component {
        &self.components[id.index()]
    }

    pub fn get_mut(&mut self, id: ComponentId) -> &mut Component {
        &mut self.components[id.index()]
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter_ids(&self) -> impl Iterator<Item = ComponentId> {
        (0..self.components.len()).map(ComponentId::new)
    }

    pub fn stores_iter(&self) -> impl Iterator<Item = (ComponentId, &StoreRow)> {
        self.iter_ids().filter_map(move |id| {
            let c = self.get(id);
            match c.kind {
                ComponentKind::Store => Some((id, &self.stores[c.subtype_idx.index()])),
                _ => None,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_components_assigns_sequential_ids() {
        let mut table = ComponentTable::new();
        let a = table.add_constant_load("load1", ConstantLoadRow::default());
        let b = table.add_constant_source("src1", ConstantSourceRow::default());
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(table.get(a).kind, ComponentKind::ConstantLoad);
        assert_eq!(table.get(b).kind, ComponentKind::ConstantSource);
    }

    #[test]
    fn interpolate_curve_clamps_and_lerps() {
        let points = vec![
            CurvePoint { outflow_w: 0, factor: 0.4 },
            CurvePoint { outflow_w: 100, factor: 0.6 },
        ];
        assert_eq!(interpolate_curve(&points, 0), 0.4);
        assert_eq!(interpolate_curve(&points, 200), 0.6);
        assert!((interpolate_curve(&points, 50) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn schedule_value_at_advances_cursor() {
        let schedule = vec![
            SchedulePoint { time_s: 0.0, amount_w: 10 },
            SchedulePoint { time_s: 3600.0, amount_w: 200 },
        ];
        let (amount, cursor) = schedule_value_at(&schedule, 0.0, 0);
        assert_eq!(amount, 10);
        let (amount, cursor) = schedule_value_at(&schedule, 3600.0, cursor);
        assert_eq!(amount, 200);
        assert_eq!(cursor, 1);
    }
}
