// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.

use crate::config::EditorConfig;
use crate::connection::{Connection, ConnectionId};
use crate::socket::{Input, Output};
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Width given to nodes created without an editor configuration
pub const DEFAULT_NODE_WIDTH: f32 = 120.0;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Input nodes (constants, parameters)
    Input,
    /// Output nodes (result, preview)
    Output,
    /// Math operations
    Math,
    /// Logic/flow control
    Logic,
    /// Utility nodes
    Utility,
    /// Custom/user-defined
    Custom,
}

/// Node type definition.
///
/// Acts as the factory for its nodes: every instance starts with a copy of
/// the template sockets, in the same order.
#[derive(Debug, Clone)]
pub struct NodeType {
    /// Unique type identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Template input sockets
    pub inputs: Vec<Input>,
    /// Template output sockets
    pub outputs: Vec<Output>,
}

impl NodeType {
    /// Create an empty node type
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append an input socket
    pub fn with_input(mut self, input: Input) -> Self {
        self.inputs.push(input);
        self
    }

    /// Append an output socket
    pub fn with_output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }
}

/// Node geometry, owned by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeBox {
    /// Position in graph space
    pub position: [f32; 2],
    /// Width in graph units
    pub width: f32,
    /// Whether the node is collapsed in the UI
    pub collapsed: bool,
    /// Stacking order
    pub z_index: u32,
}

impl Default for NodeBox {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            width: DEFAULT_NODE_WIDTH,
            collapsed: false,
            z_index: 0,
        }
    }
}

/// A node instance
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node type ID
    pub node_type: String,
    /// Display name (can be customized)
    pub name: String,
    /// Geometry
    pub node_box: NodeBox,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    connections: Vec<Connection>,
}

impl Node {
    /// Create a new node from a type definition
    pub fn new(node_type: &NodeType) -> Self {
        Self {
            id: NodeId::new(),
            node_type: node_type.id.clone(),
            name: node_type.name.clone(),
            node_box: NodeBox::default(),
            inputs: node_type.inputs.clone(),
            outputs: node_type.outputs.clone(),
            connections: Vec::new(),
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.node_box.position = [x, y];
        self
    }

    /// Rename the node
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Current position
    pub fn position(&self) -> [f32; 2] {
        self.node_box.position
    }

    /// Translate the node
    pub fn move_by(&mut self, dx: f32, dy: f32) {
        let [x, y] = self.node_box.position;
        self.node_box.position = [x + dx, y + dy];
    }

    /// Set the width, clamped to the configured bounds.
    ///
    /// Returns the width actually applied.
    pub fn resize(&mut self, width: f32, config: &EditorConfig) -> f32 {
        self.node_box.width = width.max(config.min_node_width).min(config.max_node_width);
        self.node_box.width
    }

    /// Collapse or expand the node; `None` toggles.
    pub fn collapse(&mut self, collapse: Option<bool>) {
        self.node_box.collapsed = collapse.unwrap_or(!self.node_box.collapsed);
    }

    /// Get an input by index
    pub fn input(&self, index: usize) -> Option<&Input> {
        self.inputs.get(index)
    }

    /// Get a mutable input by index
    pub fn input_mut(&mut self, index: usize) -> Option<&mut Input> {
        self.inputs.get_mut(index)
    }

    pub(crate) fn inputs_mut(&mut self) -> &mut [Input] {
        &mut self.inputs
    }

    /// Get an output by index
    pub fn output(&self, index: usize) -> Option<&Output> {
        self.outputs.get(index)
    }

    pub(crate) fn output_mut(&mut self, index: usize) -> Option<&mut Output> {
        self.outputs.get_mut(index)
    }

    /// All inputs, in declaration order
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// All outputs, in declaration order
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Locally stored input values, in input order
    pub fn input_values(&self) -> Vec<Value> {
        self.inputs.iter().map(|input| input.value().clone()).collect()
    }

    /// Connections touching this node, in either direction
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Check whether a connection is registered on this node
    pub fn has_connection(&self, id: ConnectionId) -> bool {
        self.connections.iter().any(|c| c.id == id)
    }

    /// Register a connection on this node's local list.
    ///
    /// This only touches the node; the graph picks such connections up in
    /// [`Graph::create_node`](crate::graph::Graph::create_node) and
    /// [`Graph::recalculate`](crate::graph::Graph::recalculate).
    pub fn add_connection(&mut self, connection: Connection) {
        if !self.has_connection(connection.id) {
            self.connections.push(connection);
        }
    }

    /// Remove a connection from the local list
    pub fn remove_connection(&mut self, id: ConnectionId) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| c.id != id);
        self.connections.len() != before
    }
}

/// Error when instantiating a node type
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No type registered under this ID
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),
}

/// Registry of available node types
#[derive(Debug)]
pub struct NodeRegistry {
    /// Registered node types by ID
    types: IndexMap<String, NodeType>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Register a node type, replacing any type with the same ID
    pub fn register(&mut self, node_type: NodeType) {
        tracing::debug!("Registered node type {}", node_type.id);
        self.types.insert(node_type.id.clone(), node_type);
    }

    /// Merge all types of another registry into this one
    pub fn extend(&mut self, other: NodeRegistry) {
        for (_, node_type) in other.types {
            self.register(node_type);
        }
    }

    /// Get a node type by ID
    pub fn get(&self, id: &str) -> Option<&NodeType> {
        self.types.get(id)
    }

    /// Check whether a type is registered
    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeType> {
        self.types.values().filter(move |t| t.category == category)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Create a node from a type ID
    pub fn create_node(&self, type_id: &str) -> Result<Node, RegistryError> {
        self.get(type_id)
            .map(Node::new)
            .ok_or_else(|| RegistryError::UnknownNodeType(type_id.to_string()))
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::{InputRef, OutputRef};

    fn sum_type() -> NodeType {
        NodeType::new("sum", "Sum", NodeCategory::Math)
            .with_input(Input::new("a", 0))
            .with_input(Input::new("b", 0))
            .with_output(Output::new("out", |v| {
                Value::Float(v.iter().filter_map(Value::as_f64).sum())
            }))
    }

    #[test]
    fn test_node_copies_template_layout() {
        let node = Node::new(&sum_type());
        assert_eq!(node.node_type, "sum");
        assert_eq!(node.name, "Sum");
        assert_eq!(node.inputs().len(), 2);
        assert_eq!(node.outputs().len(), 1);
        assert_eq!(node.input(1).map(|i| i.name.as_str()), Some("b"));
        assert!(node.connections().is_empty());
    }

    #[test]
    fn test_instances_do_not_share_sockets() {
        let node_type = sum_type();
        let mut a = Node::new(&node_type);
        let b = Node::new(&node_type);
        assert_ne!(a.id, b.id);
        if let Some(input) = a.input_mut(0) {
            input.set_value(9);
        }
        assert_eq!(b.input(0).map(|i| i.value().clone()), Some(Value::Int(0)));
    }

    #[test]
    fn test_geometry() {
        let config = EditorConfig::default();
        let mut node = Node::new(&sum_type()).with_position(10.0, 20.0);
        node.move_by(5.0, -5.0);
        assert_eq!(node.position(), [15.0, 15.0]);
        assert_eq!(node.resize(1000.0, &config), config.max_node_width);
        assert_eq!(node.resize(1.0, &config), config.min_node_width);
        node.collapse(None);
        assert!(node.node_box.collapsed);
        node.collapse(Some(true));
        assert!(node.node_box.collapsed);
        node.collapse(None);
        assert!(!node.node_box.collapsed);
    }

    #[test]
    fn test_local_connection_list_has_no_duplicates() {
        let mut node = Node::new(&sum_type());
        let connection = Connection::new(OutputRef::new(NodeId::new(), 0), InputRef::new(node.id, 0));
        node.add_connection(connection);
        node.add_connection(connection);
        assert_eq!(node.connections().len(), 1);
        assert!(node.remove_connection(connection.id));
        assert!(!node.remove_connection(connection.id));
    }

    #[test]
    fn test_registry() {
        let mut registry = NodeRegistry::new();
        registry.register(sum_type());
        registry.register(NodeType::new("const", "Constant", NodeCategory::Input));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.types_in_category(NodeCategory::Math).count(), 1);
        assert!(registry.create_node("sum").is_ok());
        assert!(matches!(
            registry.create_node("missing"),
            Err(RegistryError::UnknownNodeType(id)) if id == "missing"
        ));
    }
}
