// SPDX-License-Identifier: MIT OR Apache-2.0
//! Copy, cut, paste and duplicate of node selections.
//!
//! Nodes are cloned through the [`NodeRegistry`]: a fresh node of the same
//! type is instantiated and position, width, name and input values are
//! copied over by index. Connections between the cloned nodes are rebuilt
//! on the clones; connections leaving the cloned set are not copied.

use crate::connection::Connection;
use crate::graph::Graph;
use crate::node::{Node, NodeId, NodeRegistry};
use crate::socket::{InputRef, OutputRef};
use std::collections::HashMap;

/// Holds copied nodes in a private graph
#[derive(Debug)]
pub struct Clipboard {
    graph: Graph,
    center: [f32; 2],
}

impl Clipboard {
    /// Create an empty clipboard
    pub fn new() -> Self {
        Self {
            graph: Graph::new("clipboard"),
            center: [0.0, 0.0],
        }
    }

    /// Graph holding the copied nodes
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Average position of the copied nodes
    pub fn center(&self) -> [f32; 2] {
        self.center
    }

    /// Check whether anything has been copied
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Clone nodes of `source` together with the connections among them.
    ///
    /// Nodes whose type is not registered are skipped.
    pub fn clone_nodes(
        source: &Graph,
        nodes: &[NodeId],
        registry: &NodeRegistry,
    ) -> (Vec<Node>, Vec<Connection>) {
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();
        let mut clones = Vec::new();

        for node_id in nodes {
            let Some(node) = source.node(*node_id) else {
                continue;
            };
            if mapping.contains_key(node_id) {
                continue;
            }
            let mut copy = match registry.create_node(&node.node_type) {
                Ok(copy) => copy,
                Err(err) => {
                    tracing::warn!("Cannot clone node '{}': {err}", node.name);
                    continue;
                }
            };
            copy.node_box.position = node.node_box.position;
            copy.node_box.width = node.node_box.width;
            copy.set_name(node.name.clone());
            for (index, input) in node.inputs().iter().enumerate() {
                if let Some(target) = copy.input_mut(index) {
                    target.set_value(input.value().clone());
                }
            }
            mapping.insert(*node_id, copy.id);
            clones.push(copy);
        }

        let connections = source
            .connections()
            .filter_map(|c| {
                let from = mapping.get(&c.output.node)?;
                let to = mapping.get(&c.input.node)?;
                Some(Connection::new(
                    OutputRef::new(*from, c.output.index),
                    InputRef::new(*to, c.input.index),
                ))
            })
            .collect();

        (clones, connections)
    }

    /// Replace the clipboard content with copies of `nodes`
    pub fn copy_nodes(&mut self, source: &Graph, nodes: &[NodeId], registry: &NodeRegistry) {
        self.graph.clear();
        let (clones, connections) = Self::clone_nodes(source, nodes, registry);
        self.center = average_position(&clones);
        for node in clones {
            self.graph.create_node(node);
        }
        for connection in connections {
            if let Err(err) = self.graph.create_connection(connection) {
                tracing::debug!("Skipping copied connection: {err}");
            }
        }
        tracing::info!("Copied {} node(s) to clipboard", self.graph.node_count());
    }

    /// Copy `nodes`, then delete them from `graph`
    pub fn cut_nodes(&mut self, graph: &mut Graph, nodes: &[NodeId], registry: &NodeRegistry) {
        self.copy_nodes(graph, nodes, registry);
        graph.delete_nodes(nodes);
    }

    /// Paste a fresh copy of the clipboard content into `graph`.
    ///
    /// With `at`, the pasted nodes are translated so that the clipboard
    /// center lands there. The pasted nodes become the selection; their IDs
    /// are returned in paste order.
    pub fn paste_nodes(
        &mut self,
        graph: &mut Graph,
        registry: &NodeRegistry,
        at: Option<[f32; 2]>,
    ) -> Vec<NodeId> {
        let copied: Vec<NodeId> = self.graph.node_ids().collect();
        let (clones, connections) = Self::clone_nodes(&self.graph, &copied, registry);
        let [dx, dy] = at.map_or([0.0, 0.0], |[x, y]| [x - self.center[0], y - self.center[1]]);

        graph.deactivate_node();
        graph.deselect_nodes();

        let mut pasted = Vec::with_capacity(clones.len());
        for mut node in clones {
            node.move_by(dx, dy);
            pasted.push(graph.create_node(node));
        }
        for connection in connections {
            if let Err(err) = graph.create_connection(connection) {
                tracing::debug!("Skipping pasted connection: {err}");
            }
        }
        graph.select_nodes(&pasted);

        tracing::info!("Pasted {} node(s) into '{}'", pasted.len(), graph.name);
        pasted
    }

    /// Copy `nodes` and paste them straight back into `graph`
    pub fn duplicate_nodes(
        &mut self,
        graph: &mut Graph,
        nodes: &[NodeId],
        registry: &NodeRegistry,
    ) -> Vec<NodeId> {
        self.copy_nodes(graph, nodes, registry);
        self.paste_nodes(graph, registry, None)
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

fn average_position(nodes: &[Node]) -> [f32; 2] {
    if nodes.is_empty() {
        return [0.0, 0.0];
    }
    let count = nodes.len() as f32;
    let [sx, sy] = nodes.iter().fold([0.0, 0.0], |[sx, sy], node| {
        let [x, y] = node.position();
        [sx + x, sy + y]
    });
    [sx / count, sy / count]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::library::math::create_math_registry;
    use crate::value::Value;

    fn wired_pair(graph: &mut Graph, registry: &NodeRegistry) -> (NodeId, NodeId) {
        let constant = registry.create_node("constant").unwrap().with_position(0.0, 0.0);
        let double = registry.create_node("double").unwrap().with_position(100.0, 50.0);
        let constant = graph.create_node(constant);
        let double = graph.create_node(double);
        graph.set_input_value(InputRef::new(constant, 0), 4.0);
        graph
            .create_connection(Connection::new(
                OutputRef::new(constant, 0),
                InputRef::new(double, 0),
            ))
            .unwrap();
        (constant, double)
    }

    #[test]
    fn test_clone_copies_values_positionally() {
        let registry = create_math_registry();
        let mut graph = Graph::new("source");
        let (constant, double) = wired_pair(&mut graph, &registry);
        graph.node_mut(constant).unwrap().set_name("Seed");

        let (clones, connections) = Clipboard::clone_nodes(&graph, &[constant, double], &registry);
        assert_eq!(clones.len(), 2);
        assert_eq!(connections.len(), 1);
        assert_eq!(clones[0].name, "Seed");
        assert_eq!(clones[0].input_values(), vec![Value::Float(4.0)]);
        assert_eq!(clones[1].position(), [100.0, 50.0]);
        assert_ne!(clones[0].id, constant);
        assert_eq!(connections[0].from_node(), clones[0].id);
        assert_eq!(connections[0].to_node(), clones[1].id);
    }

    #[test]
    fn test_clone_skips_connections_leaving_the_set() {
        let registry = create_math_registry();
        let mut graph = Graph::new("source");
        let (_, double) = wired_pair(&mut graph, &registry);
        let (clones, connections) = Clipboard::clone_nodes(&graph, &[double], &registry);
        assert_eq!(clones.len(), 1);
        assert!(connections.is_empty());
    }

    #[test]
    fn test_paste_preserves_wiring_and_leaves_source_alone() {
        let registry = create_math_registry();
        let mut source = Graph::new("source");
        let mut target = Graph::new("target");
        let (constant, double) = wired_pair(&mut source, &registry);

        let mut clipboard = Clipboard::new();
        clipboard.copy_nodes(&source, &[constant, double], &registry);
        assert_eq!(clipboard.center(), [50.0, 25.0]);

        let pasted = clipboard.paste_nodes(&mut target, &registry, Some([250.0, 25.0]));
        assert_eq!(pasted.len(), 2);
        assert_eq!(target.connection_count(), 1);
        assert_eq!(target.node(pasted[0]).unwrap().position(), [200.0, 0.0]);
        assert_eq!(target.selected_nodes().collect::<Vec<_>>(), pasted);

        let mut engine = Engine::new();
        assert_eq!(
            engine.calculate(&mut target, OutputRef::new(pasted[1], 0)),
            Some(Value::Float(8.0))
        );

        assert_eq!(source.node_count(), 2);
        assert_eq!(source.connection_count(), 1);
        assert!(source.nodes().all(|n| !pasted.contains(&n.id)));
    }

    #[test]
    fn test_cut_removes_nodes() {
        let registry = create_math_registry();
        let mut graph = Graph::new("source");
        let (constant, double) = wired_pair(&mut graph, &registry);

        let mut clipboard = Clipboard::new();
        clipboard.cut_nodes(&mut graph, &[constant, double], &registry);
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.connection_count(), 0);
        assert_eq!(clipboard.graph().node_count(), 2);
        assert_eq!(clipboard.graph().connection_count(), 1);
    }

    #[test]
    fn test_duplicate_selects_copies() {
        let registry = create_math_registry();
        let mut graph = Graph::new("source");
        let (constant, double) = wired_pair(&mut graph, &registry);
        graph.select_nodes(&[constant, double]);

        let mut clipboard = Clipboard::new();
        let copies = clipboard.duplicate_nodes(&mut graph, &[constant, double], &registry);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.connection_count(), 2);
        assert!(!graph.is_selected(constant));
        assert!(copies.iter().all(|id| graph.is_selected(*id)));
    }

    #[test]
    fn test_unknown_types_are_skipped() {
        let registry = NodeRegistry::new();
        let mut graph = Graph::new("source");
        let (constant, _) = wired_pair(&mut graph, &create_math_registry());
        let (clones, _) = Clipboard::clone_nodes(&graph, &[constant], &registry);
        assert!(clones.is_empty());
    }

    #[test]
    fn test_empty_copy_has_origin_center() {
        let registry = create_math_registry();
        let graph = Graph::new("source");
        let mut clipboard = Clipboard::new();
        clipboard.copy_nodes(&graph, &[], &registry);
        assert!(clipboard.is_empty());
        assert_eq!(clipboard.center(), [0.0, 0.0]);
    }
}
