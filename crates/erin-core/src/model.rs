//! The top-level, read-only model: components, connections, and the
//! flow-type interner that names their ports.
//!
//! A [`Model`] is assembled once (by `erin-io`'s TOML loader, or by hand
//! in tests) and then treated as immutable for the lifetime of a
//! simulation run; all mutation during propagation lives in
//! [`crate::state::SimulationState`] instead.

use crate::component::ComponentTable;
use crate::connection::{Connection, ConnectionTable};
use crate::error::{ErinError, ErinResult};
use crate::flow::FlowTypeInterner;
use crate::ids::ComponentId;

/// A fully-assembled network: components, their connections, and the
/// interned flow-type names used to validate port compatibility.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub components: ComponentTable,
    pub connections: ConnectionTable,
    pub flow_types: FlowTypeInterner,
}

impl Model {
    pub fn new() -> Self {
        Self {
            components: ComponentTable::new(),
            connections: ConnectionTable::new(),
            flow_types: FlowTypeInterner::new(),
        }
    }

    /// Adds a connection after checking the invariants from §3: both
    /// endpoints exist, and the connection's flow type is compatible
    /// with each endpoint's declared port type.
    pub fn connect(&mut self, connection: Connection) -> ErinResult<crate::ids::ConnectionId> {
        if connection.from_id.index() >= self.components.len() {
            return Err(ErinError::ModelBuild(format!(
                "connection references unknown component id {}",
                connection.from_id.index()
            )));
        }
        if connection.to_id.index() >= self.components.len() {
            return Err(ErinError::ModelBuild(format!(
                "connection references unknown component id {}",
                connection.to_id.index()
            )));
        }
        let from = self.components.get(connection.from_id);
        let to = self.components.get(connection.to_id);
        if let Some(&declared) = from.outflow_types.get(connection.from_port) {
            if !self.flow_types.compatible(declared, connection.flow_type) {
                return Err(ErinError::ModelBuild(format!(
                    "connection flow type mismatch at outflow port {} of '{}'",
                    connection.from_port, from.tag
                )));
            }
        }
        if let Some(&declared) = to.inflow_types.get(connection.to_port) {
            if !self.flow_types.compatible(declared, connection.flow_type) {
                return Err(ErinError::ModelBuild(format!(
                    "connection flow type mismatch at inflow port {} of '{}'",
                    connection.to_port, to.tag
                )));
            }
        }
        Ok(self.connections.add(connection))
    }

    /// Final model-build validation: port uniqueness, plus that every
    /// mux's declared inflow type equals its declared outflow type
    /// (§4.2 additional invariant).
    pub fn validate(&self) -> ErinResult<()> {
        self.connections.validate_port_uniqueness()?;
        for id in self.components.iter_ids() {
            let c = self.components.get(id);
            if c.kind == crate::component::ComponentKind::Mux {
                let in_type = c.inflow_types.first();
                let out_type = c.outflow_types.first();
                if let (Some(&a), Some(&b)) = (in_type, out_type) {
                    if !self.flow_types.compatible(a, b) {
                        return Err(ErinError::ModelBuild(format!(
                            "mux '{}' inflow type does not match outflow type",
                            c.tag
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn component_tag(&self, id: ComponentId) -> &str {
        &self.components.get(id).tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ConstantLoadRow, ConstantSourceRow};
    use crate::connection::Connection;

    #[test]
    fn connect_rejects_unknown_component() {
        let mut model = Model::new();
        let load = model.components.add_constant_load("load", ConstantLoadRow::default());
        let result = model.connect(Connection {
            from_id: ComponentId::new(42),
            from_port: 0,
            to_id: load,
            to_port: 0,
            flow_type: crate::ids::WILDCARD_FLOW_TYPE,
        });
        assert!(result.is_err());
    }

    #[test]
    fn connect_accepts_wildcard_compatible_types() {
        let mut model = Model::new();
        let source = model.components.add_constant_source("src", ConstantSourceRow::default());
        let load = model.components.add_constant_load("load", ConstantLoadRow::default());
        let result = model.connect(Connection {
            from_id: source,
            from_port: 0,
            to_id: load,
            to_port: 0,
            flow_type: crate::ids::WILDCARD_FLOW_TYPE,
        });
        assert!(result.is_ok());
    }
}
