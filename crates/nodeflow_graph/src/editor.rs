// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor state: open graphs, node types, clipboard and evaluation.
//!
//! All commands act on the selected graph. Switching graphs clears the
//! activation and selection of the graph being left.

use crate::clipboard::Clipboard;
use crate::config::EditorConfig;
use crate::connection::{Connection, ConnectionId};
use crate::engine::Engine;
use crate::graph::{ConnectionError, Graph};
use crate::node::{NodeId, NodeRegistry, NodeType, RegistryError};
use crate::socket::{InputRef, OutputRef};
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an open graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub Uuid);

impl GraphId {
    /// Create a new random graph ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

/// Error from an editor command
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// The command needs a selected graph
    #[error("No graph selected")]
    NoGraphSelected,

    /// Node type could not be instantiated
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Connection was rejected
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// The node editor
#[derive(Debug)]
pub struct Editor {
    /// Editor settings
    pub config: EditorConfig,
    /// Evaluation engine shared by all graphs
    pub engine: Engine,
    /// Available node types
    pub registry: NodeRegistry,
    /// Copy buffer
    pub clipboard: Clipboard,
    graphs: IndexMap<GraphId, Graph>,
    selected_graph: Option<GraphId>,
    next_z_index: u32,
}

impl Editor {
    /// Create an editor with no node types registered
    pub fn new(config: EditorConfig) -> Self {
        Self::with_registry(config, NodeRegistry::new())
    }

    /// Create an editor with the given node types
    pub fn with_registry(config: EditorConfig, registry: NodeRegistry) -> Self {
        Self {
            config,
            engine: Engine::new(),
            registry,
            clipboard: Clipboard::new(),
            graphs: IndexMap::new(),
            selected_graph: None,
            next_z_index: 0,
        }
    }

    /// Register an additional node type
    pub fn register_node_type(&mut self, node_type: NodeType) {
        self.registry.register(node_type);
    }

    // ------------------------------------------------------------------------
    // Graphs
    // ------------------------------------------------------------------------

    /// Open a new empty graph and select it
    pub fn create_graph(&mut self, name: impl Into<String>) -> GraphId {
        let id = GraphId::new();
        let graph = Graph::new(name);
        tracing::info!("Created graph '{}'", graph.name);
        self.graphs.insert(id, graph);
        self.select_graph(id);
        id
    }

    /// Make a graph the target of editor commands
    pub fn select_graph(&mut self, id: GraphId) -> bool {
        if !self.graphs.contains_key(&id) {
            return false;
        }
        if let Some(previous) = self.selected_graph.filter(|p| *p != id) {
            if let Some(graph) = self.graphs.get_mut(&previous) {
                graph.deactivate_node();
                graph.deselect_nodes();
            }
        }
        self.selected_graph = Some(id);
        true
    }

    /// Close a graph; the selection moves to the last remaining graph
    pub fn delete_graph(&mut self, id: GraphId) -> Option<Graph> {
        let graph = self.graphs.shift_remove(&id)?;
        if self.selected_graph == Some(id) {
            self.selected_graph = self.graphs.keys().last().copied();
        }
        tracing::info!("Deleted graph '{}'", graph.name);
        Some(graph)
    }

    /// Get a graph by ID
    pub fn graph(&self, id: GraphId) -> Option<&Graph> {
        self.graphs.get(&id)
    }

    /// Get a mutable graph by ID
    pub fn graph_mut(&mut self, id: GraphId) -> Option<&mut Graph> {
        self.graphs.get_mut(&id)
    }

    /// All open graphs, in creation order
    pub fn graphs(&self) -> impl Iterator<Item = (GraphId, &Graph)> {
        self.graphs.iter().map(|(id, graph)| (*id, graph))
    }

    /// ID of the selected graph
    pub fn selected_graph_id(&self) -> Option<GraphId> {
        self.selected_graph
    }

    /// The selected graph
    pub fn selected_graph(&self) -> Option<&Graph> {
        self.selected_graph.and_then(|id| self.graphs.get(&id))
    }

    /// The selected graph, mutably
    pub fn selected_graph_mut(&mut self) -> Option<&mut Graph> {
        self.selected_graph.and_then(|id| self.graphs.get_mut(&id))
    }

    // ------------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------------

    /// Instantiate a registered node type in the selected graph
    pub fn spawn_node(&mut self, type_id: &str, position: [f32; 2]) -> Result<NodeId, EditorError> {
        let graph_id = self.selected_graph.ok_or(EditorError::NoGraphSelected)?;
        let mut node = self.registry.create_node(type_id)?;
        node.node_box.position = position;
        node.node_box.width = self.config.initial_node_width();
        node.node_box.z_index = self.next_z_index;

        let graph = self
            .graphs
            .get_mut(&graph_id)
            .ok_or(EditorError::NoGraphSelected)?;
        self.next_z_index += 1;
        Ok(graph.create_node(node))
    }

    /// Connect two sockets in the selected graph
    pub fn connect(&mut self, output: OutputRef, input: InputRef) -> Result<ConnectionId, EditorError> {
        let graph = self.selected_graph_mut().ok_or(EditorError::NoGraphSelected)?;
        Ok(graph.create_connection(Connection::new(output, input))?)
    }

    /// Set a local input value in the selected graph
    pub fn set_input_value(&mut self, input: InputRef, value: impl Into<Value>) -> bool {
        self.selected_graph_mut()
            .is_some_and(|graph| graph.set_input_value(input, value))
    }

    /// Select every node of the selected graph
    pub fn select_all_nodes(&mut self) {
        if let Some(graph) = self.selected_graph_mut() {
            graph.select_all_nodes();
        }
    }

    /// Delete the selected nodes of the selected graph
    pub fn delete_selected_nodes(&mut self) {
        if let Some(graph) = self.selected_graph_mut() {
            let selected: Vec<NodeId> = graph.selected_nodes().collect();
            graph.delete_nodes(&selected);
        }
    }

    /// Copy the selected nodes to the clipboard
    pub fn copy_selected_nodes(&mut self) {
        let Some(graph) = self.selected_graph.and_then(|id| self.graphs.get(&id)) else {
            return;
        };
        let selected: Vec<NodeId> = graph.selected_nodes().collect();
        self.clipboard.copy_nodes(graph, &selected, &self.registry);
    }

    /// Copy the selected nodes to the clipboard and delete them
    pub fn cut_selected_nodes(&mut self) {
        let Some(graph) = self.selected_graph.and_then(|id| self.graphs.get_mut(&id)) else {
            return;
        };
        let selected: Vec<NodeId> = graph.selected_nodes().collect();
        self.clipboard.cut_nodes(graph, &selected, &self.registry);
    }

    /// Paste the clipboard into the selected graph
    pub fn paste_nodes(&mut self, at: Option<[f32; 2]>) -> Vec<NodeId> {
        let Some(graph) = self.selected_graph.and_then(|id| self.graphs.get_mut(&id)) else {
            return Vec::new();
        };
        self.clipboard.paste_nodes(graph, &self.registry, at)
    }

    /// Duplicate the selected nodes in place
    pub fn duplicate_selected_nodes(&mut self) -> Vec<NodeId> {
        let Some(graph) = self.selected_graph.and_then(|id| self.graphs.get_mut(&id)) else {
            return Vec::new();
        };
        let selected: Vec<NodeId> = graph.selected_nodes().collect();
        self.clipboard.duplicate_nodes(graph, &selected, &self.registry)
    }

    // ------------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------------

    /// Evaluate one output of the selected graph
    pub fn calculate(&mut self, output: OutputRef) -> Option<Value> {
        let graph = self.selected_graph.and_then(|id| self.graphs.get_mut(&id))?;
        self.engine.calculate(graph, output)
    }

    /// Evaluate every output of a node in the selected graph
    pub fn calculate_node(&mut self, node: NodeId) -> Vec<Value> {
        match self.selected_graph.and_then(|id| self.graphs.get_mut(&id)) {
            Some(graph) => self.engine.calculate_node(graph, node),
            None => Vec::new(),
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::create_default_registry;
    use crate::observer::{EventRecorder, GraphEvent};

    fn editor() -> Editor {
        Editor::with_registry(EditorConfig::default(), create_default_registry())
    }

    #[test]
    fn test_create_graph_selects_it() {
        let mut editor = editor();
        let first = editor.create_graph("First");
        assert_eq!(editor.selected_graph_id(), Some(first));
        let second = editor.create_graph("Second");
        assert_eq!(editor.selected_graph_id(), Some(second));
        assert_eq!(editor.graphs().count(), 2);
        assert_eq!(editor.selected_graph().map(|g| g.name.as_str()), Some("Second"));
    }

    #[test]
    fn test_commands_without_graph() {
        let mut editor = editor();
        assert!(matches!(
            editor.spawn_node("add", [0.0, 0.0]),
            Err(EditorError::NoGraphSelected)
        ));
        assert!(editor.paste_nodes(None).is_empty());
        assert!(editor.calculate_node(NodeId::new()).is_empty());
    }

    #[test]
    fn test_spawn_uses_config_and_stacks() {
        let config = EditorConfig {
            default_node_width: 500.0,
            ..EditorConfig::default()
        };
        let mut editor = Editor::with_registry(config, create_default_registry());
        editor.create_graph("Main");
        let a = editor.spawn_node("add", [10.0, 20.0]).unwrap();
        let b = editor.spawn_node("add", [0.0, 0.0]).unwrap();

        let graph = editor.selected_graph().unwrap();
        let a = graph.node(a).unwrap();
        assert_eq!(a.position(), [10.0, 20.0]);
        assert_eq!(a.node_box.width, editor.config.max_node_width);
        assert!(graph.node(b).unwrap().node_box.z_index > a.node_box.z_index);

        assert!(matches!(
            editor.spawn_node("missing", [0.0, 0.0]),
            Err(EditorError::Registry(_))
        ));
    }

    #[test]
    fn test_wire_and_calculate() {
        let mut editor = editor();
        editor.create_graph("Main");
        let constant = editor.spawn_node("constant", [0.0, 0.0]).unwrap();
        let double = editor.spawn_node("double", [150.0, 0.0]).unwrap();
        editor.set_input_value(InputRef::new(constant, 0), 21.0);
        editor
            .connect(OutputRef::new(constant, 0), InputRef::new(double, 0))
            .unwrap();

        assert_eq!(editor.calculate(OutputRef::new(double, 0)), Some(Value::Float(42.0)));
        assert_eq!(editor.calculate_node(double), vec![Value::Float(42.0)]);
        assert_eq!(editor.engine.epoch(), 2);

        assert!(matches!(
            editor.connect(OutputRef::new(double, 0), InputRef::new(constant, 0)),
            Err(EditorError::Connection(ConnectionError::CycleDetected))
        ));
    }

    #[test]
    fn test_switching_graph_clears_selection() {
        let mut editor = editor();
        let first = editor.create_graph("First");
        let node = editor.spawn_node("add", [0.0, 0.0]).unwrap();
        let recorder = EventRecorder::new();
        if let Some(graph) = editor.graph_mut(first) {
            graph.add_observer(recorder.clone());
            graph.activate_node(node);
        }
        editor.select_all_nodes();
        recorder.take();

        editor.create_graph("Second");
        let graph = editor.graph(first).unwrap();
        assert_eq!(graph.active_node(), None);
        assert_eq!(graph.selected_nodes().count(), 0);
        assert_eq!(
            recorder.take(),
            vec![
                GraphEvent::ActiveNodeChanged(None),
                GraphEvent::SelectionChanged(Vec::new()),
            ]
        );
    }

    #[test]
    fn test_copy_paste_and_duplicate() {
        let mut editor = editor();
        editor.create_graph("Main");
        let a = editor.spawn_node("constant", [0.0, 0.0]).unwrap();
        let b = editor.spawn_node("double", [100.0, 0.0]).unwrap();
        editor.connect(OutputRef::new(a, 0), InputRef::new(b, 0)).unwrap();
        editor.select_all_nodes();

        let copies = editor.duplicate_selected_nodes();
        assert_eq!(copies.len(), 2);
        let graph = editor.selected_graph().unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.connection_count(), 2);

        let target = editor.create_graph("Target");
        let pasted = editor.paste_nodes(Some([0.0, 0.0]));
        assert_eq!(pasted.len(), 2);
        assert_eq!(editor.graph(target).unwrap().connection_count(), 1);
    }

    #[test]
    fn test_cut_and_delete_selected() {
        let mut editor = editor();
        editor.create_graph("Main");
        editor.spawn_node("add", [0.0, 0.0]).unwrap();
        editor.spawn_node("add", [0.0, 0.0]).unwrap();
        editor.select_all_nodes();
        editor.cut_selected_nodes();
        assert_eq!(editor.selected_graph().unwrap().node_count(), 0);
        assert_eq!(editor.clipboard.graph().node_count(), 2);

        editor.paste_nodes(None);
        editor.delete_selected_nodes();
        assert_eq!(editor.selected_graph().unwrap().node_count(), 0);
    }

    #[test]
    fn test_delete_graph_moves_selection() {
        let mut editor = editor();
        let first = editor.create_graph("First");
        let second = editor.create_graph("Second");
        assert!(editor.delete_graph(second).is_some());
        assert_eq!(editor.selected_graph_id(), Some(first));
        assert!(editor.delete_graph(second).is_none());
        assert!(!editor.select_graph(second));
    }
}
