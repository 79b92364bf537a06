//! Parses `fragility_curve.<tag>` tables into
//! [`erin_core::reliability::FragilityCurve`] (§3).

use erin_core::diagnostics::Diagnostics;
use erin_core::reliability::FragilityCurve;

pub fn parse_fragility_curve(tag: &str, table: &toml::Table, diagnostics: &mut Diagnostics) -> Option<FragilityCurve> {
    let entity = format!("fragility_curve.{tag}");
    match table.get("type").and_then(|v| v.as_str()) {
        Some("linear") => {
            let lower_bound = table.get("lower_bound")?.as_float().or_else(|| table.get("lower_bound")?.as_integer().map(|i| i as f64))?;
            let upper_bound = table.get("upper_bound")?.as_float().or_else(|| table.get("upper_bound")?.as_integer().map(|i| i as f64))?;
            Some(FragilityCurve::Linear { lower_bound, upper_bound })
        }
        Some("tabular") => {
            let array = table.get("points")?.as_array()?;
            let mut points = Vec::with_capacity(array.len());
            for entry in array {
                let pair = entry.as_array()?;
                if pair.len() != 2 {
                    diagnostics.add_error_with_entity("parse", "tabular fragility point must have 2 entries", &entity);
                    return None;
                }
                let intensity = pair[0].as_float().or_else(|| pair[0].as_integer().map(|i| i as f64))?;
                let fraction = pair[1].as_float().or_else(|| pair[1].as_integer().map(|i| i as f64))?;
                points.push((intensity, fraction));
            }
            Some(FragilityCurve::Tabular(points))
        }
        Some(other) => {
            diagnostics.add_error_with_entity("parse", &format!("unknown fragility curve type '{other}'"), &entity);
            None
        }
        None => {
            diagnostics.add_error_with_entity("parse", "fragility curve missing 'type' field", &entity);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_linear_curve() {
        let table: toml::Table = toml::from_str("type = \"linear\"\nlower_bound = 0\nupper_bound = 10").unwrap();
        let mut diag = Diagnostics::new();
        let curve = parse_fragility_curve("c1", &table, &mut diag).unwrap();
        assert!(matches!(curve, FragilityCurve::Linear { .. }));
    }

    #[test]
    fn parses_tabular_curve() {
        let table: toml::Table = toml::from_str("type = \"tabular\"\npoints = [[0, 0.0], [10, 1.0]]").unwrap();
        let mut diag = Diagnostics::new();
        let curve = parse_fragility_curve("c1", &table, &mut diag).unwrap();
        match curve {
            FragilityCurve::Tabular(points) => assert_eq!(points.len(), 2),
            _ => panic!("expected Tabular"),
        }
    }
}
