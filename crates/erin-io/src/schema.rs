//! A constant, data-driven schema for each component kind's TOML fields,
//! consumed by one generic validator instead of a hard-coded parser
//! branch per kind (§9 REDESIGN FLAGS: "Express as a constant schema in
//! data... consumed by a generic validator; avoid singletons" — grounded
//! in `gat_io::validate::DatasetSpec`/`ColumnSpec`, generalized from
//! "one schema for a dataset" to "one schema per component `type`").

use erin_core::diagnostics::Diagnostics;

/// What kind of unit conversion a numeric field expects, purely
/// documentary here (the actual conversion happens in
/// [`crate::units_parse`]); used to keep the schema self-describing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Dimensionless,
    Power,
    Energy,
    Time,
    Curve,
    ConnectionRef,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub unit_kind: UnitKind,
}

const fn req(name: &'static str, unit_kind: UnitKind) -> FieldSpec {
    FieldSpec { name, required: true, unit_kind }
}

const fn opt(name: &'static str, unit_kind: UnitKind) -> FieldSpec {
    FieldSpec { name, required: false, unit_kind }
}

/// `type` field value plus its declared fields, one entry per
/// `ComponentKind` (§3).
pub struct ComponentSchema {
    pub type_name: &'static str,
    pub fields: &'static [FieldSpec],
}

pub const COMPONENT_SCHEMAS: &[ComponentSchema] = &[
    ComponentSchema {
        type_name: "constant_load",
        fields: &[req("load", UnitKind::Power)],
    },
    ComponentSchema {
        type_name: "schedule_based_load",
        fields: &[req("schedule", UnitKind::Curve)],
    },
    ComponentSchema {
        type_name: "constant_source",
        fields: &[req("available", UnitKind::Power)],
    },
    ComponentSchema {
        type_name: "schedule_based_source",
        fields: &[req("schedule", UnitKind::Curve), opt("max_outflow", UnitKind::Power)],
    },
    ComponentSchema {
        type_name: "converter",
        fields: &[
            req("efficiency", UnitKind::Dimensionless),
            opt("max_outflow", UnitKind::Power),
            opt("max_lossflow", UnitKind::Power),
        ],
    },
    ComponentSchema {
        type_name: "variable_efficiency_converter",
        fields: &[
            req("efficiency_curve", UnitKind::Curve),
            opt("max_outflow", UnitKind::Power),
            opt("max_lossflow", UnitKind::Power),
        ],
    },
    ComponentSchema {
        type_name: "mover",
        fields: &[req("cop", UnitKind::Dimensionless), opt("max_outflow", UnitKind::Power)],
    },
    ComponentSchema {
        type_name: "variable_efficiency_mover",
        fields: &[req("cop_curve", UnitKind::Curve), opt("max_outflow", UnitKind::Power)],
    },
    ComponentSchema {
        type_name: "mux",
        fields: &[req("num_inflows", UnitKind::Dimensionless), req("num_outflows", UnitKind::Dimensionless)],
    },
    ComponentSchema {
        type_name: "store",
        fields: &[
            req("capacity", UnitKind::Energy),
            req("max_charge_rate", UnitKind::Power),
            req("max_discharge_rate", UnitKind::Power),
            opt("charge_threshold", UnitKind::Energy),
            opt("initial_storage", UnitKind::Energy),
            opt("roundtrip_efficiency", UnitKind::Dimensionless),
            opt("max_outflow", UnitKind::Power),
        ],
    },
    ComponentSchema {
        type_name: "pass_through",
        fields: &[opt("max_outflow", UnitKind::Power)],
    },
    ComponentSchema {
        type_name: "switch",
        fields: &[opt("max_outflow", UnitKind::Power)],
    },
    ComponentSchema {
        type_name: "waste_sink",
        fields: &[],
    },
    ComponentSchema {
        type_name: "environment_source",
        fields: &[],
    },
];

pub fn schema_for(type_name: &str) -> Option<&'static ComponentSchema> {
    COMPONENT_SCHEMAS.iter().find(|s| s.type_name == type_name)
}

/// Checks `table` (everything but the `type` key) against `schema`,
/// reporting missing required fields and unrecognized keys. Unit
/// conversion itself is not re-validated here — `units_parse` already
/// defaults sensibly when a `_units`/`_rate_units` sibling is absent.
pub fn validate_component_table(
    schema: &ComponentSchema,
    table: &toml::Table,
    tag: &str,
    diagnostics: &mut Diagnostics,
) {
    let entity = format!("components.{tag}");
    for field in schema.fields {
        if field.required && !table.contains_key(field.name) {
            diagnostics.add_error_with_entity(
                "parse",
                &format!("missing required field '{}' for type '{}'", field.name, schema.type_name),
                &entity,
            );
        }
    }
    let known: Vec<&str> = schema
        .fields
        .iter()
        .map(|f| f.name)
        .chain(["type", "report"])
        .chain(schema.fields.iter().map(|f| f.name).filter(|_| false))
        .collect();
    for key in table.keys() {
        let base = key.strip_suffix("_units").or_else(|| key.strip_suffix("_rate_units")).unwrap_or(key);
        if !known.contains(&key.as_str()) && !known.contains(&base) {
            diagnostics.add_warning_with_entity(
                "parse",
                &format!("unrecognized key '{key}'"),
                &entity,
            );
        }
    }
}
