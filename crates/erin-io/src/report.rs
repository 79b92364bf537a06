//! Output writers: events/stats CSV, Graphviz DOT, and the wide
//! pack-loads CSV (§6), in the teacher's `csv::Writer::from_path` +
//! `anyhow::Context` style (grounded in
//! `gat_algo::opf::export::OpfSolution::to_csv`).

use anyhow::{Context, Result};
use erin_core::component::{schedule_value_at, ComponentKind};
use erin_core::ids::ComponentId;
use erin_core::model::Model;
use erin_core::reliability::{ReliabilitySchedule, UpDown};
use erin_core::scenario::Occurrence;
use erin_core::stats::Snapshot;
use std::path::Path;

/// Writes one scenario occurrence's snapshots as a wide events CSV:
/// `time_s, time_hours, scenario_id, scenario_start_time, <conn
/// req/avail/actual>…, <store soc>…` (§6).
pub fn write_events_csv(path: &Path, model: &Model, scenario_tag: &str, occurrence: Occurrence, snapshots: &[Snapshot]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating events CSV at {}", path.display()))?;

    let mut header = vec!["time_s".to_string(), "time_hours".to_string(), "scenario_id".to_string(), "scenario_start_time".to_string()];
    for (id, conn) in model.connections.iter() {
        let _ = id;
        let from = model.component_tag(conn.from_id);
        let to = model.component_tag(conn.to_id);
        header.push(format!("{from}->{to}:requested_w"));
        header.push(format!("{from}->{to}:available_w"));
        header.push(format!("{from}->{to}:actual_w"));
    }
    for (id, row) in model.components.stores_iter() {
        let _ = row;
        header.push(format!("{}:soc_j", model.component_tag(id)));
    }
    wtr.write_record(&header).context("writing events CSV header")?;

    for snap in snapshots {
        let mut record = vec![snap.t_s.to_string(), (snap.t_s / 3600.0).to_string(), scenario_tag.to_string(), occurrence.start_time_s.to_string()];
        for flow in &snap.flows {
            record.push(flow.requested.value().to_string());
            record.push(flow.available.value().to_string());
            record.push(flow.actual.value().to_string());
        }
        for amount in &snap.storage_amounts_j {
            record.push(amount.to_string());
        }
        wtr.write_record(&record).context("writing events CSV row")?;
    }

    wtr.flush().context("flushing events CSV")?;
    Ok(())
}

/// One row of the stats CSV: a scenario occurrence's folded statistics
/// (§4.8), written with `scenario_id`/`occurrence_index` columns
/// prepended so multiple occurrences share one file. `occurrence_label`
/// and `occurrence_start_label` are pre-formatted by the caller so this
/// writer stays agnostic between per-occurrence rows (`run`'s `-n`,
/// disabling group aggregation) and one averaged row per scenario (the
/// default — see `erin_core::stats::aggregate_occurrence_stats`).
pub struct StatsRow<'a> {
    pub scenario_tag: &'a str,
    pub occurrence_label: String,
    pub occurrence_start_label: String,
    pub stats: &'a erin_core::stats::ScenarioOccurrenceStats,
}

pub fn write_stats_csv(path: &Path, rows: &[StatsRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating stats CSV at {}", path.display()))?;
    wtr.write_record([
        "scenario_id",
        "occurrence_index",
        "occurrence_start_time_s",
        "source_inflow_kj",
        "load_requested_kj",
        "load_achieved_kj",
        "load_not_served_kj",
        "wasteflow_kj",
        "storage_charge_kj",
        "storage_discharge_kj",
        "environment_inflow_kj",
        "uptime_s",
        "downtime_s",
        "max_single_event_downtime_s",
    ])
    .context("writing stats CSV header")?;

    for row in rows {
        let s = row.stats;
        wtr.write_record([
            row.scenario_tag.to_string(),
            row.occurrence_label.clone(),
            row.occurrence_start_label.clone(),
            s.source_inflow_kj.to_string(),
            s.load_requested_kj.to_string(),
            s.load_achieved_kj.to_string(),
            s.load_not_served_kj.to_string(),
            s.wasteflow_kj.to_string(),
            s.storage_charge_kj.to_string(),
            s.storage_discharge_kj.to_string(),
            s.environment_inflow_kj.to_string(),
            s.uptime_s.to_string(),
            s.downtime_s.to_string(),
            s.max_sedt_s.to_string(),
        ])
        .context("writing stats CSV row")?;
    }

    wtr.flush().context("flushing stats CSV")?;
    Ok(())
}

/// Renders the model's topology to a `.dot` file, delegating the actual
/// graph walk to `erin_core::connection::render_dot`.
pub fn write_dot(path: &Path, model: &Model) -> Result<()> {
    let labels: Vec<String> = model.components.iter_ids().map(|id| model.component_tag(id).to_string()).collect();
    let dot = erin_core::connection::render_dot(model.components.len(), &model.connections, &labels);
    std::fs::write(path, dot).with_context(|| format!("writing DOT file at {}", path.display()))
}

/// One scenario occurrence's merged per-component reliability schedules,
/// ready to write via [`write_reliability_csv`] (§6 `run`'s `-r` flag).
pub struct ReliabilityCurves<'a> {
    pub scenario_tag: &'a str,
    pub occurrence: Occurrence,
    pub schedules: &'a [ReliabilitySchedule],
}

/// Writes every transition of every component's merged reliability
/// schedule, across every scenario occurrence passed in, as one long CSV:
/// `scenario_id, occurrence_index, occurrence_start_time_s, component_tag,
/// time_s, state, failure_mode_causes, fragility_mode_causes` (§6).
pub fn write_reliability_csv(path: &Path, model: &Model, curves: &[ReliabilityCurves]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating reliability CSV at {}", path.display()))?;
    wtr.write_record([
        "scenario_id",
        "occurrence_index",
        "occurrence_start_time_s",
        "component_tag",
        "time_s",
        "state",
        "failure_mode_causes",
        "fragility_mode_causes",
    ])
    .context("writing reliability CSV header")?;

    for curve in curves {
        for (idx, schedule) in curve.schedules.iter().enumerate() {
            let component_tag = model.component_tag(ComponentId::new(idx));
            for ts in &schedule.transitions {
                let state = match ts.state {
                    UpDown::Up => "up",
                    UpDown::Down => "down",
                };
                let failure_causes = ts.failure_mode_causes.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(";");
                let fragility_causes = ts.fragility_mode_causes.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(";");
                wtr.write_record([
                    curve.scenario_tag.to_string(),
                    curve.occurrence.index.to_string(),
                    curve.occurrence.start_time_s.to_string(),
                    component_tag.to_string(),
                    ts.time_s.to_string(),
                    state.to_string(),
                    failure_causes,
                    fragility_causes,
                ])
                .context("writing reliability CSV row")?;
            }
        }
    }

    wtr.flush().context("flushing reliability CSV")?;
    Ok(())
}

/// Writes the wide pack-loads CSV: one column per schedule-bearing
/// component (`ScheduleBasedLoad`/`ScheduleBasedSource`), sampled at
/// every breakpoint time that appears in any of their schedules.
pub fn write_pack_loads_csv(path: &Path, model: &Model) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating pack-loads CSV at {}", path.display()))?;

    let mut columns: Vec<(String, &[erin_core::component::SchedulePoint])> = Vec::new();
    for id in model.components.iter_ids() {
        let c = model.components.get(id);
        match c.kind {
            ComponentKind::ScheduleBasedLoad => {
                columns.push((c.tag.clone(), &model.components.schedule_based_loads[c.subtype_idx.index()].schedule));
            }
            ComponentKind::ScheduleBasedSource => {
                columns.push((c.tag.clone(), &model.components.schedule_based_sources[c.subtype_idx.index()].schedule));
            }
            _ => {}
        }
    }

    let mut breakpoints: Vec<f64> = columns.iter().flat_map(|(_, s)| s.iter().map(|p| p.time_s)).collect();
    breakpoints.sort_by(|a, b| a.partial_cmp(b).unwrap());
    breakpoints.dedup();

    let mut header = vec!["time_s".to_string()];
    header.extend(columns.iter().map(|(tag, _)| format!("{tag}_w")));
    wtr.write_record(&header).context("writing pack-loads CSV header")?;

    let mut cursors = vec![0usize; columns.len()];
    for &t in &breakpoints {
        let mut record = vec![t.to_string()];
        for (i, (_, schedule)) in columns.iter().enumerate() {
            let (amount, cursor) = schedule_value_at(schedule, t, cursors[i]);
            cursors[i] = cursor;
            record.push(amount.to_string());
        }
        wtr.write_record(&record).context("writing pack-loads CSV row")?;
    }

    wtr.flush().context("flushing pack-loads CSV")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use erin_core::component::{ConstantLoadRow, ConstantSourceRow};
    use erin_core::connection::Connection;
    use erin_core::flow::Flow;
    use erin_core::ids::WILDCARD_FLOW_TYPE;
    use erin_core::units::Watts;
    use tempfile::TempDir;

    fn sample_model() -> Model {
        let mut model = Model::new();
        let src = model.components.add_constant_source("src", ConstantSourceRow { available_w: Watts::new(100), outflow_conn: None });
        let load = model.components.add_constant_load("load", ConstantLoadRow { load_w: Watts::new(10), inflow_conn: None });
        let conn = model.connect(Connection { from_id: src, from_port: 0, to_id: load, to_port: 0, flow_type: WILDCARD_FLOW_TYPE }).unwrap();
        model.components.constant_sources[0].outflow_conn = Some(conn);
        model.components.constant_loads[0].inflow_conn = Some(conn);
        model
    }

    #[test]
    fn events_csv_has_one_row_per_snapshot() {
        let model = sample_model();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.csv");
        let mut flow = Flow::ZERO;
        flow.requested = Watts::new(10);
        flow.available = Watts::new(100);
        flow.actual = Watts::new(10);
        let snapshots = vec![Snapshot { t_s: 0.0, flows: vec![flow], storage_amounts_j: vec![] }];
        let occurrence = Occurrence { index: 0, start_time_s: 0.0 };
        write_events_csv(&path, &model, "base", occurrence, &snapshots).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("src->load:actual_w"));
    }

    #[test]
    fn dot_file_contains_both_component_labels() {
        let model = sample_model();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.dot");
        write_dot(&path, &model).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("src"));
        assert!(content.contains("load"));
    }
}
