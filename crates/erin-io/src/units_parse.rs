//! Resolves a bare numeric TOML field plus an optional `<field>_units`
//! sibling key into the strongly-typed quantities `erin-core` works with
//! (§6: "Time units accepted... Power units... Energy units").
//!
//! Every magnitude in the input format is a plain number in a table; the
//! unit lives in a sibling key named `<field>_units` and defaults to the
//! base unit (seconds, Watts, Joules) when absent, so existing inputs
//! that already use base units need no extra keys.

use erin_core::units::{EnergyUnit, PowerUnit, TimeUnit, Watts};
use toml::Value;

pub fn numeric_field(table: &toml::Table, field: &str) -> Option<f64> {
    match table.get(field)? {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn units_field<'a>(table: &'a toml::Table, field: &str) -> Option<&'a str> {
    table.get(&format!("{field}_units")).and_then(Value::as_str)
}

/// Reads `<field>` as a power quantity, defaulting its unit to Watts.
pub fn power_field(table: &toml::Table, field: &str) -> Option<Watts> {
    let raw = numeric_field(table, field)?;
    let unit = units_field(table, field)
        .and_then(PowerUnit::from_tag)
        .unwrap_or(PowerUnit::Watt);
    Some(Watts::new(unit.to_watts(raw).max(0.0) as u64))
}

/// Reads `<field>` as an energy quantity, defaulting its unit to Joules.
pub fn energy_field(table: &toml::Table, field: &str) -> Option<u64> {
    let raw = numeric_field(table, field)?;
    let unit = units_field(table, field)
        .and_then(EnergyUnit::from_tag)
        .unwrap_or(EnergyUnit::Joule);
    Some(unit.to_joules(raw).max(0.0) as u64)
}

/// Reads `<field>` as a duration, defaulting its unit to seconds.
pub fn time_field(table: &toml::Table, field: &str) -> Option<f64> {
    let raw = numeric_field(table, field)?;
    let unit = units_field(table, field)
        .and_then(TimeUnit::from_tag)
        .unwrap_or(TimeUnit::Second);
    Some(unit.to_seconds(raw))
}

/// Parses a `[[time, amount], …]` schedule array, with the time column
/// interpreted via `<field>_units` (default seconds) and the amount
/// column via `<field>_rate_units` (default Watts).
pub fn time_rate_pairs(table: &toml::Table, field: &str) -> Option<Vec<(f64, u64)>> {
    let array = table.get(field)?.as_array()?;
    let time_unit = units_field(table, field)
        .and_then(TimeUnit::from_tag)
        .unwrap_or(TimeUnit::Second);
    let rate_unit = table
        .get(&format!("{field}_rate_units"))
        .and_then(Value::as_str)
        .and_then(PowerUnit::from_tag)
        .unwrap_or(PowerUnit::Watt);
    let mut pairs = Vec::with_capacity(array.len());
    for entry in array {
        let pair = entry.as_array()?;
        if pair.len() != 2 {
            return None;
        }
        let t = pair[0].as_integer().map(|i| i as f64).or_else(|| pair[0].as_float())?;
        let amount = pair[1].as_integer().map(|i| i as f64).or_else(|| pair[1].as_float())?;
        pairs.push((time_unit.to_seconds(t), rate_unit.to_watts(amount).max(0.0) as u64));
    }
    Some(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_field_defaults_to_watts() {
        let table: toml::Table = toml::from_str("max_outflow = 100").unwrap();
        assert_eq!(power_field(&table, "max_outflow").unwrap().value(), 100);
    }

    #[test]
    fn power_field_honors_sibling_units_key() {
        let table: toml::Table = toml::from_str("max_outflow = 5\nmax_outflow_units = \"kW\"").unwrap();
        assert_eq!(power_field(&table, "max_outflow").unwrap().value(), 5_000);
    }

    #[test]
    fn time_rate_pairs_converts_both_columns() {
        let table: toml::Table = toml::from_str(
            "schedule = [[0, 10], [1, 200]]\nschedule_units = \"h\"",
        )
        .unwrap();
        let pairs = time_rate_pairs(&table, "schedule").unwrap();
        assert_eq!(pairs[0], (0.0, 10));
        assert_eq!(pairs[1], (3600.0, 200));
    }
}
