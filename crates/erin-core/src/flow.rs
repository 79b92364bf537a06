//! Flow records and the flow-type interner.
//!
//! A [`Flow`] holds the three Watt quantities tracked on every connection
//! (§3): `requested`, `available`, and `actual`. [`FlowTable`] is the
//! parallel array of flows indexed by [`ConnectionId`], mirroring how the
//! rest of the engine stores data in struct-of-arrays form rather than a
//! `Vec` of heavier structs.

use crate::ids::{ConnectionId, FlowTypeId, WILDCARD_FLOW_TYPE};
use crate::units::Watts;
use serde::{Deserialize, Serialize};

/// Per-connection requested/available/actual flow, in Watts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flow {
    pub requested: Watts,
    pub available: Watts,
    pub actual: Watts,
}

impl Flow {
    pub const ZERO: Flow = Flow {
        requested: Watts::ZERO,
        available: Watts::ZERO,
        actual: Watts::ZERO,
    };

    /// Clamp `actual` to `min(requested, available)` (§4.1 step 3).
    pub fn finalize(&mut self) {
        self.actual = self.requested.min(self.available);
    }

    /// Force all three quantities to zero, used when a component is in
    /// `unavailableComponents` (§4.1).
    pub fn zero_out(&mut self) {
        *self = Flow::ZERO;
    }
}

/// Interns flow-type tags (e.g. `"electricity"`) to small integer ids.
///
/// Index 0 is always the wildcard type, matching any other type at
/// port-compatibility checks (§3).
#[derive(Debug, Clone, Default)]
pub struct FlowTypeInterner {
    names: Vec<String>,
}

impl FlowTypeInterner {
    pub fn new() -> Self {
        Self {
            names: vec!["*".to_string()],
        }
    }

    /// Interns `name`, returning its id. Repeated interning of the same
    /// name returns the same id.
    pub fn intern(&mut self, name: &str) -> FlowTypeId {
        if name == "*" {
            return WILDCARD_FLOW_TYPE;
        }
        if let Some(pos) = self.names.iter().position(|n| n == name) {
            return FlowTypeId::new(pos);
        }
        self.names.push(name.to_string());
        FlowTypeId::new(self.names.len() - 1)
    }

    pub fn name(&self, id: FlowTypeId) -> &str {
        &self.names[id.index()]
    }

    /// True if `a` and `b` are compatible at a port: equal, or either is
    /// the wildcard type.
    pub fn compatible(&self, a: FlowTypeId, b: FlowTypeId) -> bool {
        a == WILDCARD_FLOW_TYPE || b == WILDCARD_FLOW_TYPE || a == b
    }
}

/// Parallel array of [`Flow`] records, one per connection.
#[derive(Debug, Clone, Default)]
pub struct FlowTable {
    flows: Vec<Flow>,
}

impl FlowTable {
    pub fn new(connection_count: usize) -> Self {
        Self {
            flows: vec![Flow::ZERO; connection_count],
        }
    }

    pub fn get(&self, id: ConnectionId) -> Flow {
        self.flows[id.index()]
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> &mut Flow {
        &mut self.flows[id.index()]
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flow> {
        self.flows.iter()
    }

    pub fn as_slice(&self) -> &[Flow] {
        &self.flows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_clamps_actual_to_minimum() {
        let mut f = Flow {
            requested: Watts::new(10),
            available: Watts::new(100),
            actual: Watts::ZERO,
        };
        f.finalize();
        assert_eq!(f.actual, Watts::new(10));
    }

    #[test]
    fn interner_reuses_ids_for_repeated_names() {
        let mut interner = FlowTypeInterner::new();
        let a = interner.intern("electricity");
        let b = interner.intern("electricity");
        let c = interner.intern("natural_gas");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.name(a), "electricity");
    }

    #[test]
    fn wildcard_is_compatible_with_anything() {
        let mut interner = FlowTypeInterner::new();
        let elec = interner.intern("electricity");
        assert!(interner.compatible(elec, WILDCARD_FLOW_TYPE));
        assert!(interner.compatible(WILDCARD_FLOW_TYPE, elec));
    }
}
