//! Connections between components, and topology queries over them.
//!
//! A [`Connection`] is a directed edge carrying one flow type between a
//! `(component, port)` pair and another (§3). [`ConnectionTable`] is the
//! flat, insertion-ordered list of connections; [`build_topology_graph`]
//! projects it into a `petgraph` graph for the connectivity checks and
//! DOT export that sit at the CLI boundary (`check`/`graph` commands),
//! while the simulation hot path (propagation kernel) never touches
//! `petgraph` and instead walks `ConnectionId`s directly.

use crate::error::{ErinError, ErinResult};
use crate::ids::{ComponentId, ConnectionId, FlowTypeId};
use petgraph::algo::connected_components;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::Directed;
use std::collections::HashSet;

/// A directed edge carrying `flow_type` from `(from_id, from_port)` to
/// `(to_id, to_port)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub from_id: ComponentId,
    pub from_port: usize,
    pub to_id: ComponentId,
    pub to_port: usize,
    pub flow_type: FlowTypeId,
}

/// Flat, insertion-ordered list of connections, addressed by [`ConnectionId`].
#[derive(Debug, Clone, Default)]
pub struct ConnectionTable {
    connections: Vec<Connection>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, connection: Connection) -> ConnectionId {
        let id = ConnectionId::new(self.connections.len());
        self.connections.push(connection);
        id
    }

    pub fn get(&self, id: ConnectionId) -> Connection {
        self.connections[id.index()]
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn iter_ids(&self) -> impl Iterator<Item = ConnectionId> {
        (0..self.connections.len()).map(ConnectionId::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.connections.iter().enumerate().map(|(i, c)| (ConnectionId::new(i), c))
    }

    /// Connections with `from_id == component`, in declaration order —
    /// the user-visible priority order for mux allocation (§4.1).
    pub fn outgoing_from(&self, component: ComponentId) -> Vec<ConnectionId> {
        self.iter()
            .filter(|(_, c)| c.from_id == component)
            .map(|(id, _)| id)
            .collect()
    }

    /// Connections with `to_id == component`, in declaration order.
    pub fn incoming_to(&self, component: ComponentId) -> Vec<ConnectionId> {
        self.iter()
            .filter(|(_, c)| c.to_id == component)
            .map(|(id, _)| id)
            .collect()
    }

    /// Validates that every port index referenced is unique per
    /// direction within its owning component (§3 invariant: "ports are
    /// unique per direction").
    pub fn validate_port_uniqueness(&self) -> ErinResult<()> {
        let mut seen_out: HashSet<(usize, usize)> = HashSet::new();
        let mut seen_in: HashSet<(usize, usize)> = HashSet::new();
        for conn in &self.connections {
            if !seen_out.insert((conn.from_id.index(), conn.from_port)) {
                return Err(ErinError::ModelBuild(format!(
                    "component {} has duplicate outflow port {}",
                    conn.from_id.index(),
                    conn.from_port
                )));
            }
            if !seen_in.insert((conn.to_id.index(), conn.to_port)) {
                return Err(ErinError::ModelBuild(format!(
                    "component {} has duplicate inflow port {}",
                    conn.to_id.index(),
                    conn.to_port
                )));
            }
        }
        Ok(())
    }
}

/// Summary statistics for `graph stats`-style reporting.
#[derive(Debug)]
pub struct TopologyStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub connected_components: usize,
}

/// One weakly-connected island and the components that belong to it.
#[derive(Debug)]
pub struct Island {
    pub island_id: usize,
    pub components: Vec<ComponentId>,
}

/// Builds a `petgraph` directed graph mirroring the connection table, for
/// connectivity validation and DOT export. Node indices equal
/// `ComponentId::index()`.
pub fn build_topology_graph(
    component_count: usize,
    connections: &ConnectionTable,
) -> Graph<ComponentId, (), Directed> {
    let mut graph = Graph::with_capacity(component_count, connections.len());
    let nodes: Vec<NodeIndex> = (0..component_count)
        .map(|i| graph.add_node(ComponentId::new(i)))
        .collect();
    for (_, conn) in connections.iter() {
        graph.add_edge(nodes[conn.from_id.index()], nodes[conn.to_id.index()], ());
    }
    graph
}

pub fn topology_stats(component_count: usize, connections: &ConnectionTable) -> TopologyStats {
    let graph = build_topology_graph(component_count, connections);
    TopologyStats {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        connected_components: connected_components(&graph),
    }
}

/// Finds weakly-connected islands of components — components with no
/// path (in either direction) between islands are reported separately so
/// `check` can flag a network that is accidentally split in two.
pub fn find_islands(component_count: usize, connections: &ConnectionTable) -> Vec<Island> {
    let graph = build_topology_graph(component_count, connections);
    let mut visited = HashSet::new();
    let mut islands = Vec::new();
    let mut island_id = 0;
    for start in graph.node_indices() {
        if visited.contains(&start) {
            continue;
        }
        let mut stack = vec![start];
        let mut members = Vec::new();
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            members.push(graph[node]);
            for neighbor in graph.neighbors_undirected(node) {
                if !visited.contains(&neighbor) {
                    stack.push(neighbor);
                }
            }
        }
        members.sort_by_key(|c| c.index());
        islands.push(Island {
            island_id,
            components: members,
        });
        island_id += 1;
    }
    islands
}

/// Renders the topology as a Graphviz DOT string, labeling each node with
/// `labels[component_id]`.
pub fn render_dot(component_count: usize, connections: &ConnectionTable, labels: &[String]) -> String {
    let mut out = String::new();
    out.push_str("digraph erin_network {\n");
    for i in 0..component_count {
        let label = labels.get(i).map(String::as_str).unwrap_or("");
        out.push_str(&format!("  n{i} [label=\"{}\"];\n", label.replace('"', "\\\"")));
    }
    for (_, conn) in connections.iter() {
        out.push_str(&format!(
            "  n{} -> n{} [label=\"{}:{}\"];\n",
            conn.from_id.index(),
            conn.to_id.index(),
            conn.from_port,
            conn.to_port
        ));
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::WILDCARD_FLOW_TYPE;

    fn conn(from: usize, to: usize) -> Connection {
        Connection {
            from_id: ComponentId::new(from),
            from_port: 0,
            to_id: ComponentId::new(to),
            to_port: 0,
            flow_type: WILDCARD_FLOW_TYPE,
        }
    }

    #[test]
    fn outgoing_and_incoming_preserve_declaration_order() {
        let mut table = ConnectionTable::new();
        table.add(conn(0, 1));
        table.add(conn(0, 2));
        assert_eq!(table.outgoing_from(ComponentId::new(0)).len(), 2);
        assert_eq!(table.incoming_to(ComponentId::new(1)).len(), 1);
    }

    #[test]
    fn detects_duplicate_outflow_port() {
        let mut table = ConnectionTable::new();
        table.add(Connection { from_port: 0, ..conn(0, 1) });
        table.add(Connection { from_port: 0, ..conn(0, 2) });
        assert!(table.validate_port_uniqueness().is_err());
    }

    #[test]
    fn single_chain_is_one_island() {
        let mut table = ConnectionTable::new();
        table.add(conn(0, 1));
        table.add(conn(1, 2));
        let islands = find_islands(3, &table);
        assert_eq!(islands.len(), 1);
        assert_eq!(islands[0].components.len(), 3);
    }

    #[test]
    fn disconnected_components_are_separate_islands() {
        let mut table = ConnectionTable::new();
        table.add(conn(0, 1));
        let islands = find_islands(4, &table);
        assert_eq!(islands.len(), 3);
    }
}
