//! Newtype indices into the model's flat tables.
//!
//! Everything in this engine is addressed by a small integer: a
//! [`ComponentId`] indexes [`crate::component::ComponentTable`], a
//! [`ConnectionId`] indexes the connection list, and a [`FlowTypeId`]
//! indexes the flow-type interner. Wrapping each kind of index in its own
//! type means a `ConnectionId` can never be passed where a `ComponentId`
//! is expected, even though both are `usize` underneath.

use serde::{Deserialize, Serialize};

macro_rules! index_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            #[inline]
            pub const fn new(value: usize) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                Self(value)
            }
        }
    };
}

index_newtype!(ComponentId);
index_newtype!(ConnectionId);
index_newtype!(FlowTypeId);

/// The null/wildcard flow type (index 0): matches any other type at
/// port-compatibility checks (§3).
pub const WILDCARD_FLOW_TYPE: FlowTypeId = FlowTypeId(0);

/// Index into a component kind's own per-kind table (e.g. the Nth
/// `ConstantLoad` record). Distinct from [`ComponentId`], which indexes
/// the flat component list shared across all kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubtypeIdx(pub usize);

impl SubtypeIdx {
    #[inline]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_not_interchangeable_types() {
        let c = ComponentId::new(3);
        let conn = ConnectionId::new(3);
        assert_eq!(c.index(), conn.index());
    }

    #[test]
    fn wildcard_is_index_zero() {
        assert_eq!(WILDCARD_FLOW_TYPE.index(), 0);
    }
}
