//! Parses `dist.<tag>` tables into [`erin_core::reliability::Distribution`]
//! (§4.5 EXPANSION: distribution families are named after
//! `erin_next_distribution.h`'s `DistType` enum in `original_source/`).

use crate::units_parse::time_field;
use erin_core::diagnostics::Diagnostics;
use erin_core::reliability::Distribution;

pub fn parse_distribution(tag: &str, table: &toml::Table, diagnostics: &mut Diagnostics) -> Option<Distribution> {
    let entity = format!("dist.{tag}");
    let kind = table.get("type").and_then(|v| v.as_str());
    match kind {
        Some("fixed") => {
            let value = time_field(table, "value").unwrap_or_else(|| {
                diagnostics.add_error_with_entity("parse", "fixed distribution missing 'value'", &entity);
                0.0
            });
            Some(Distribution::Fixed(value))
        }
        Some("uniform") => {
            let low = time_field(table, "low")?;
            let high = time_field(table, "high")?;
            Some(Distribution::Uniform { low, high })
        }
        Some("normal") => {
            let mean = time_field(table, "mean")?;
            let std_dev = time_field(table, "std_dev")?;
            Some(Distribution::Normal { mean, std_dev })
        }
        Some("weibull") => {
            let shape = table.get("shape")?.as_float().or_else(|| table.get("shape")?.as_integer().map(|i| i as f64))?;
            let scale = time_field(table, "scale")?;
            Some(Distribution::Weibull { shape, scale })
        }
        Some("quantile_table") => {
            let array = table.get("points")?.as_array()?;
            let mut points = Vec::with_capacity(array.len());
            for entry in array {
                let pair = entry.as_array()?;
                if pair.len() != 2 {
                    diagnostics.add_error_with_entity("parse", "quantile_table point must have 2 entries", &entity);
                    return None;
                }
                let u = pair[0].as_float().or_else(|| pair[0].as_integer().map(|i| i as f64))?;
                let v = pair[1].as_float().or_else(|| pair[1].as_integer().map(|i| i as f64))?;
                points.push((u, v));
            }
            Some(Distribution::QuantileTable(points))
        }
        Some(other) => {
            diagnostics.add_error_with_entity("parse", &format!("unknown distribution type '{other}'"), &entity);
            None
        }
        None => {
            diagnostics.add_error_with_entity("parse", "distribution missing 'type' field", &entity);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fixed_distribution_with_units() {
        let table: toml::Table = toml::from_str("type = \"fixed\"\nvalue = 1\nvalue_units = \"h\"").unwrap();
        let mut diag = Diagnostics::new();
        let dist = parse_distribution("d1", &table, &mut diag).unwrap();
        match dist {
            Distribution::Fixed(v) => assert_eq!(v, 3600.0),
            _ => panic!("expected Fixed"),
        }
    }

    #[test]
    fn rejects_unknown_type() {
        let table: toml::Table = toml::from_str("type = \"bogus\"").unwrap();
        let mut diag = Diagnostics::new();
        assert!(parse_distribution("d1", &table, &mut diag).is_none());
        assert!(diag.has_errors());
    }
}
