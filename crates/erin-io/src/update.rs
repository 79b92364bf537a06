//! `erin update`: rewrites an input file's `simulation_info.input_format_version`
//! to the current format version (§6, §9 Open Questions).
//!
//! No prior format version has required a structural migration yet (the
//! original C++ reader carries the field but ships no migration table
//! either — see `erin_next_simulation_info.h`), so this is currently a
//! version-stamp rewrite. [`apply_migrations`] is the seam a future
//! version bump hangs its rewrite rules on.

use crate::error::{IoError, IoResult};
use std::path::Path;

pub const CURRENT_FORMAT_VERSION: &str = "0.1";

/// Applies any migrations needed to bring `doc` up to
/// [`CURRENT_FORMAT_VERSION`], returning whether anything changed.
pub fn apply_migrations(doc: &mut toml::Table) -> bool {
    let current_version = doc
        .get("simulation_info")
        .and_then(toml::Value::as_table)
        .and_then(|t| t.get("input_format_version"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    if current_version == CURRENT_FORMAT_VERSION {
        return false;
    }

    let info = doc.entry("simulation_info").or_insert_with(|| toml::Value::Table(toml::Table::new()));
    if let toml::Value::Table(info) = info {
        info.insert("input_format_version".to_string(), toml::Value::String(CURRENT_FORMAT_VERSION.to_string()));
    }
    true
}

/// Reads `in_path`, migrates it in place, and writes the result to
/// `out_path` (which may equal `in_path`). Returns whether any rewrite
/// was needed.
pub fn update_file(in_path: &Path, out_path: &Path) -> IoResult<bool> {
    let contents = std::fs::read_to_string(in_path).map_err(|source| IoError::Read { path: in_path.display().to_string(), source })?;
    let mut doc: toml::Table = toml::from_str(&contents).map_err(|source| IoError::Toml { path: in_path.display().to_string(), source })?;
    let changed = apply_migrations(&mut doc);
    if changed {
        let rewritten = toml::to_string_pretty(&doc).expect("parsed TOML always re-serializes");
        std::fs::write(out_path, rewritten).map_err(|source| IoError::Write { path: out_path.display().to_string(), source })?;
    } else if in_path != out_path {
        std::fs::copy(in_path, out_path).map_err(|source| IoError::Write { path: out_path.display().to_string(), source })?;
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_missing_version() {
        let mut doc: toml::Table = toml::from_str("[simulation_info]\ntime_unit = \"h\"\nmax_time = 10").unwrap();
        assert!(apply_migrations(&mut doc));
        let version = doc["simulation_info"]["input_format_version"].as_str().unwrap();
        assert_eq!(version, CURRENT_FORMAT_VERSION);
    }

    #[test]
    fn leaves_current_version_untouched() {
        let mut doc: toml::Table =
            toml::from_str(&format!("[simulation_info]\ninput_format_version = \"{CURRENT_FORMAT_VERSION}\"")).unwrap();
        assert!(!apply_migrations(&mut doc));
    }
}
