//! Subcommand implementations. Each function takes its parsed `clap` args
//! and returns `anyhow::Result<()>`, following the teacher's
//! closure-per-command + `anyhow::Context` style.

use crate::common::log_diagnostics;
use anyhow::{Context, Result};
use erin_core::connection::{find_islands, topology_stats};
use erin_core::scenario::{compute_occurrence_times, run_occurrence};
use erin_core::stats::{aggregate_occurrence_stats, compute_occurrence_stats};
use erin_io::report::{write_dot, write_events_csv, write_pack_loads_csv, write_reliability_csv, write_stats_csv, ReliabilityCurves, StatsRow};
use erin_io::update::update_file;
use erin_io::{load_scenario_file, LoadedScenarioFile};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

fn load_checked(toml_file: &Path) -> Result<LoadedScenarioFile> {
    let loaded = load_scenario_file(toml_file)
        .with_context(|| format!("loading scenario file {}", toml_file.display()))?;
    log_diagnostics(&loaded.diagnostics);
    if loaded.diagnostics.has_errors() {
        anyhow::bail!("{} has {} error(s); see log above", toml_file.display(), loaded.diagnostics.error_count());
    }
    Ok(loaded)
}

pub fn run(
    toml_file: &Path,
    events: Option<&Path>,
    stats: Option<&Path>,
    no_aggregate: bool,
    reliability_curves: bool,
) -> Result<()> {
    let loaded = load_checked(toml_file)?;

    let seed = loaded.simulation_info.random_seed.unwrap_or(0);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut stats_rows = Vec::new();
    let mut reliability_rows = Vec::new();
    for scenario in &loaded.scenarios {
        let occurrences = compute_occurrence_times(scenario, loaded.simulation_info.max_time_s, &mut rng);
        for occurrence in occurrences {
            let (snapshots, downtime, mode_stats, schedules) = run_occurrence(&loaded.model, scenario, &mut rng)
                .with_context(|| format!("running scenario '{}' occurrence {}", scenario.tag, occurrence.index))?;

            if let Some(events_path) = events {
                write_events_csv(events_path, &loaded.model, &scenario.tag, occurrence, &snapshots)
                    .context("writing events CSV")?;
            }

            let occurrence_stats = compute_occurrence_stats(&loaded.model, &snapshots, &downtime, &mode_stats);
            stats_rows.push((scenario.tag.clone(), occurrence, occurrence_stats));
            if reliability_curves {
                reliability_rows.push((scenario.tag.clone(), occurrence, schedules));
            }
        }
    }

    if let Some(stats_path) = stats {
        let rows: Vec<StatsRow> = if no_aggregate {
            stats_rows
                .iter()
                .map(|(tag, occurrence, s)| StatsRow {
                    scenario_tag: tag,
                    occurrence_label: occurrence.index.to_string(),
                    occurrence_start_label: occurrence.start_time_s.to_string(),
                    stats: s,
                })
                .collect()
        } else {
            aggregate_stats_rows(&stats_rows)
        };
        write_stats_csv(stats_path, &rows).context("writing stats CSV")?;
    }

    if reliability_curves {
        let out_path = reliability_curves_path(events, stats, toml_file);
        let curves: Vec<ReliabilityCurves> = reliability_rows
            .iter()
            .map(|(tag, occurrence, schedules)| ReliabilityCurves { scenario_tag: tag, occurrence: *occurrence, schedules })
            .collect();
        write_reliability_csv(&out_path, &loaded.model, &curves).context("writing reliability curves CSV")?;
        info!("wrote reliability curves to {}", out_path.display());
    }

    info!("ran {} scenario(s), {} occurrence(s) total", loaded.scenarios.len(), stats_rows.len());
    Ok(())
}

/// Groups per-occurrence stats by scenario tag and averages each group
/// into one row (the default "group aggregation" the `-n` flag disables).
fn aggregate_stats_rows(
    stats_rows: &[(String, erin_core::scenario::Occurrence, erin_core::stats::ScenarioOccurrenceStats)],
) -> Vec<StatsRow> {
    let mut by_tag: HashMap<&str, Vec<&erin_core::stats::ScenarioOccurrenceStats>> = HashMap::new();
    let mut order = Vec::new();
    for (tag, _, s) in stats_rows {
        let entry = by_tag.entry(tag.as_str());
        if let std::collections::hash_map::Entry::Vacant(_) = entry {
            order.push(tag.as_str());
        }
        entry.or_default().push(s);
    }
    let aggregated: Vec<erin_core::stats::ScenarioOccurrenceStats> =
        order.iter().map(|tag| aggregate_occurrence_stats(&by_tag[*tag])).collect();
    order
        .into_iter()
        .zip(aggregated.iter())
        .map(|(tag, s)| StatsRow {
            scenario_tag: tag,
            occurrence_label: "all".to_string(),
            occurrence_start_label: by_tag[tag].len().to_string(),
            stats: s,
        })
        .collect()
}

fn reliability_curves_path(events: Option<&Path>, stats: Option<&Path>, toml_file: &Path) -> PathBuf {
    let base = stats.or(events).unwrap_or(toml_file);
    let stem = base.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "scenario".to_string());
    base.with_file_name(format!("{stem}.reliability.csv"))
}

pub fn graph(toml_file: &Path, out: Option<&Path>, stats: bool) -> Result<()> {
    let loaded = load_checked(toml_file)?;
    if stats {
        let topo = topology_stats(loaded.model.components.len(), &loaded.model.connections);
        println!("Nodes     : {}", topo.node_count);
        println!("Edges     : {}", topo.edge_count);
        println!("Islands   : {}", topo.connected_components);
        let islands = find_islands(loaded.model.components.len(), &loaded.model.connections);
        for island in islands {
            println!("  island {}: {} component(s)", island.island_id, island.components.len());
        }
        return Ok(());
    }
    match out {
        Some(path) => {
            write_dot(path, &loaded.model).context("writing DOT file")?;
            info!("wrote topology to {}", path.display());
        }
        None => {
            let labels: Vec<String> = loaded.model.components.iter_ids().map(|id| loaded.model.component_tag(id).to_string()).collect();
            let dot = erin_core::connection::render_dot(loaded.model.components.len(), &loaded.model.connections, &labels);
            print!("{dot}");
        }
    }
    Ok(())
}

pub fn check(toml_file: &Path) -> Result<()> {
    let loaded = load_checked(toml_file)?;
    info!(
        "{} is valid: {} component(s), {} connection(s), {} scenario(s)",
        toml_file.display(),
        loaded.model.components.len(),
        loaded.model.connections.len(),
        loaded.scenarios.len()
    );
    Ok(())
}

pub fn update(in_toml: &Path, out_toml: Option<&Path>, summary: bool) -> Result<()> {
    let out_path: PathBuf = out_toml.map(Path::to_path_buf).unwrap_or_else(|| in_toml.to_path_buf());
    let changed = update_file(in_toml, &out_path).with_context(|| format!("updating {}", in_toml.display()))?;
    if summary {
        if changed {
            println!("{} rewritten to the current format version", out_path.display());
        } else {
            println!("{} already at the current format version", out_path.display());
        }
    }
    Ok(())
}

pub fn pack_loads(toml_file: &Path, out: Option<&Path>) -> Result<()> {
    let loaded = load_checked(toml_file)?;
    let default_path;
    let out_path = match out {
        Some(p) => p,
        None => {
            default_path = toml_file.with_extension("packed.csv");
            &default_path
        }
    };
    write_pack_loads_csv(out_path, &loaded.model).context("writing pack-loads CSV")?;
    info!("wrote packed loads to {}", out_path.display());
    Ok(())
}

pub fn version() {
    println!("erin {}", env!("CARGO_PKG_VERSION"));
}

pub fn limits() {
    println!("max_propagation_rounds: {}", erin_core::kernel::MAX_PROPAGATION_ROUNDS);
    println!("max_flow_w: {}", erin_core::units::MAX_FLOW);
}
