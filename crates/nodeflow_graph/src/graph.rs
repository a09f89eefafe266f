// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and connections.
//!
//! Every structural change goes through the mutation protocol implemented
//! here, which keeps three views of the wiring in agreement: the graph's
//! connection set, each node's local connection list, and each input's
//! single connection slot.

use crate::connection::{Connection, ConnectionId};
use crate::engine::Engine;
use crate::node::{Node, NodeId};
use crate::observer::GraphObserver;
use crate::socket::{Input, InputRef, Output, OutputRef};
use crate::value::Value;
use indexmap::{IndexMap, IndexSet};
use std::fmt;

/// A node graph
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Committed connections between nodes
    connections: IndexMap<ConnectionId, Connection>,
    active_node: Option<NodeId>,
    selected_nodes: IndexSet<NodeId>,
    observers: Vec<Box<dyn GraphObserver>>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
            active_node: None,
            selected_nodes: IndexSet::new(),
            observers: Vec::new(),
        }
    }

    /// Attach an observer that is notified after every mutation
    pub fn add_observer(&mut self, observer: impl GraphObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    // ------------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------------

    /// Add a node to the graph.
    ///
    /// Connections the node already carries (for example when it was cloned
    /// together with its wiring) are registered through
    /// [`Graph::create_connection`]; the ones that cannot be committed are
    /// dropped from the node.
    pub fn create_node(&mut self, mut node: Node) -> NodeId {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            tracing::warn!("Node {:?} is already part of graph '{}'", id, self.name);
            return id;
        }

        let carried: Vec<Connection> = node.connections().to_vec();
        for input in node.inputs_mut() {
            if input
                .connection()
                .is_some_and(|slot| !carried.iter().any(|c| c.id == slot))
            {
                input.set_connection(None);
            }
        }
        self.nodes.insert(id, node);

        if let Some(node) = self.nodes.get(&id) {
            for observer in &mut self.observers {
                observer.on_node_created(node);
            }
        }

        for connection in carried {
            if let Err(err) = self.create_connection(connection) {
                tracing::debug!("Dropping carried connection {:?}: {err}", connection.id);
                self.forget(&connection);
            }
        }
        id
    }

    /// Remove a node, deleting every connection that touches it first
    pub fn delete_node(&mut self, node_id: NodeId) -> Option<Node> {
        let incident: Vec<ConnectionId> = self
            .nodes
            .get(&node_id)?
            .connections()
            .iter()
            .map(|c| c.id)
            .collect();
        for connection_id in incident {
            self.delete_connection(connection_id);
        }

        let node = self.nodes.shift_remove(&node_id)?;
        // uncommitted leftovers must not stay referenced from other nodes
        for connection in node.connections() {
            self.forget(connection);
        }

        if self.active_node == Some(node_id) {
            self.active_node = None;
            self.emit(|o| o.on_active_node_changed(None));
        }
        if self.selected_nodes.shift_remove(&node_id) {
            self.emit_selection();
        }
        self.emit(|o| o.on_node_deleted(&node));
        Some(node)
    }

    /// Remove several nodes
    pub fn delete_nodes(&mut self, node_ids: &[NodeId]) {
        for node_id in node_ids.to_vec() {
            self.delete_node(node_id);
        }
    }

    /// Remove every node and connection
    pub fn clear(&mut self) {
        let all: Vec<NodeId> = self.node_ids().collect();
        self.delete_nodes(&all);
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Check whether a node is a member of this graph
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Resolve an input socket
    pub fn input(&self, input: InputRef) -> Option<&Input> {
        self.nodes.get(&input.node)?.input(input.index)
    }

    /// Resolve an output socket
    pub fn output(&self, output: OutputRef) -> Option<&Output> {
        self.nodes.get(&output.node)?.output(output.index)
    }

    /// Assign the local value of an input.
    ///
    /// Returns `false` if the input does not exist or rejects the value.
    pub fn set_input_value(&mut self, input: InputRef, value: impl Into<Value>) -> bool {
        self.input_mut(input)
            .is_some_and(|socket| socket.set_value(value))
    }

    /// Restore the default value of an input
    pub fn reset_input(&mut self, input: InputRef) {
        if let Some(socket) = self.input_mut(input) {
            socket.reset();
        }
    }

    fn input_mut(&mut self, input: InputRef) -> Option<&mut Input> {
        self.nodes.get_mut(&input.node)?.input_mut(input.index)
    }

    // ------------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------------

    /// Commit a connection.
    ///
    /// Any connection already ending at the destination input is removed
    /// first. The new connection is then registered everywhere and checked
    /// for cycles; a cyclic connection is torn down again, the removed one
    /// is restored and [`ConnectionError::CycleDetected`] is returned.
    /// Rejected connections are never reported to observers.
    ///
    /// Unlike a plain delete-then-connect, the displaced connection is only
    /// deleted for good once the new one has passed the cycle check.
    pub fn create_connection(&mut self, connection: Connection) -> Result<ConnectionId, ConnectionError> {
        self.validate(&connection)?;
        let displaced = self
            .displaced_by(&connection)
            .and_then(|old| self.detach(old));

        let committed = self.connections.contains_key(&connection.id);
        if let Err(err) = self.link(connection) {
            if let Some(old) = displaced {
                self.attach(old);
            }
            return Err(err);
        }
        if let Some(old) = displaced {
            self.emit(|o| o.on_connection_deleted(&old));
        }
        if !committed {
            self.emit(|o| o.on_connection_created(&connection));
        }
        Ok(connection.id)
    }

    /// Remove a committed connection; unknown IDs are ignored
    pub fn delete_connection(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        let connection = self.detach(connection_id)?;
        self.emit(|o| o.on_connection_deleted(&connection));
        Some(connection)
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// Check whether a connection is committed
    pub fn contains_connection(&self, connection_id: ConnectionId) -> bool {
        self.connections.contains_key(&connection_id)
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get connections leaving a specific output
    pub fn connections_from(&self, output: OutputRef) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.output == output)
    }

    /// Get the connection ending at a specific input
    pub fn connection_to(&self, input: InputRef) -> Option<&Connection> {
        self.connections.values().find(|c| c.input == input)
    }

    /// Get connections involving a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Rebuild the connection set from the nodes' local connection lists.
    ///
    /// Repairs drift between node-local lists and the graph after structural
    /// edits made outside the protocol. Observers hear only about
    /// connections that were added or dropped by the rebuild.
    pub fn recalculate(&mut self) {
        let previous = std::mem::take(&mut self.connections);

        let mut candidates: IndexMap<ConnectionId, Connection> = IndexMap::new();
        for node in self.nodes.values() {
            for connection in node.connections() {
                candidates.entry(connection.id).or_insert(*connection);
            }
        }
        let invalid: Vec<Connection> = candidates
            .values()
            .filter(|c| self.validate(c).is_err())
            .copied()
            .collect();
        for connection in &invalid {
            candidates.shift_remove(&connection.id);
            self.forget(connection);
        }

        for node in self.nodes.values_mut() {
            for input in node.inputs_mut() {
                if input
                    .connection()
                    .is_some_and(|slot| !candidates.contains_key(&slot))
                {
                    input.set_connection(None);
                }
            }
        }

        for connection in candidates.into_values() {
            if let Some(old) = self.displaced_by(&connection) {
                self.detach(old);
            }
            if let Err(err) = self.link(connection) {
                tracing::debug!("Dropping connection {:?} during rebuild: {err}", connection.id);
            }
        }

        let dropped: Vec<Connection> = previous
            .values()
            .filter(|c| !self.connections.contains_key(&c.id))
            .copied()
            .collect();
        let added: Vec<Connection> = self
            .connections
            .values()
            .filter(|c| !previous.contains_key(&c.id))
            .copied()
            .collect();
        tracing::debug!(
            "Rebuilt connections of '{}': {} total, {} added, {} dropped",
            self.name,
            self.connections.len(),
            added.len(),
            dropped.len()
        );
        for connection in &dropped {
            self.emit(|o| o.on_connection_deleted(connection));
        }
        for connection in &added {
            self.emit(|o| o.on_connection_created(connection));
        }
    }

    fn validate(&self, connection: &Connection) -> Result<(), ConnectionError> {
        let source = self
            .nodes
            .get(&connection.output.node)
            .ok_or(ConnectionError::NodeNotFound(connection.output.node))?;
        let target = self
            .nodes
            .get(&connection.input.node)
            .ok_or(ConnectionError::NodeNotFound(connection.input.node))?;
        source
            .output(connection.output.index)
            .ok_or(ConnectionError::OutputNotFound(connection.output))?;
        target
            .input(connection.input.index)
            .ok_or(ConnectionError::InputNotFound(connection.input))?;
        Ok(())
    }

    /// Connection currently occupying the destination input, unless it is
    /// `connection` itself
    fn displaced_by(&self, connection: &Connection) -> Option<ConnectionId> {
        self.input(connection.input)?
            .connection()
            .filter(|&existing| existing != connection.id)
    }

    /// Register, then verify; on a cycle the registration is reversed.
    fn link(&mut self, connection: Connection) -> Result<(), ConnectionError> {
        self.attach(connection);
        if Engine::check_node(self, connection.from_node()) {
            self.detach(connection.id);
            tracing::debug!(
                "Rejected connection {:?}: {:?} would feed back into itself",
                connection.id,
                connection.from_node()
            );
            return Err(ConnectionError::CycleDetected);
        }
        Ok(())
    }

    fn attach(&mut self, connection: Connection) {
        if let Some(node) = self.nodes.get_mut(&connection.input.node) {
            node.add_connection(connection);
            if let Some(input) = node.input_mut(connection.input.index) {
                input.set_connection(Some(connection.id));
            }
        }
        if let Some(node) = self.nodes.get_mut(&connection.output.node) {
            node.add_connection(connection);
        }
        self.connections.entry(connection.id).or_insert(connection);
    }

    /// Reverse every registration of a committed connection
    fn detach(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.shift_remove(&connection_id)?;
        self.forget(&connection);
        Some(connection)
    }

    /// Remove a connection from its endpoint nodes and input slot
    fn forget(&mut self, connection: &Connection) {
        for node_id in [connection.input.node, connection.output.node] {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.remove_connection(connection.id);
            }
        }
        if let Some(input) = self.input_mut(connection.input) {
            if input.connection() == Some(connection.id) {
                input.set_connection(None);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Activation and selection
    // ------------------------------------------------------------------------

    /// Make a node the single active node
    pub fn activate_node(&mut self, node_id: NodeId) {
        if !self.nodes.contains_key(&node_id) || self.active_node == Some(node_id) {
            return;
        }
        self.active_node = Some(node_id);
        self.emit(|o| o.on_active_node_changed(Some(node_id)));
    }

    /// Clear the active node
    pub fn deactivate_node(&mut self) {
        if self.active_node.take().is_some() {
            self.emit(|o| o.on_active_node_changed(None));
        }
    }

    /// Currently active node
    pub fn active_node(&self) -> Option<NodeId> {
        self.active_node
    }

    /// Add a node to the selection
    pub fn select_node(&mut self, node_id: NodeId) {
        self.select_nodes(&[node_id]);
    }

    /// Add several nodes to the selection
    pub fn select_nodes(&mut self, node_ids: &[NodeId]) {
        let mut changed = false;
        for node_id in node_ids {
            if self.nodes.contains_key(node_id) {
                changed |= self.selected_nodes.insert(*node_id);
            }
        }
        if changed {
            self.emit_selection();
        }
    }

    /// Select every node in the graph
    pub fn select_all_nodes(&mut self) {
        let all: Vec<NodeId> = self.node_ids().collect();
        self.select_nodes(&all);
    }

    /// Clear the selection
    pub fn deselect_nodes(&mut self) {
        if !self.selected_nodes.is_empty() {
            self.selected_nodes.clear();
            self.emit_selection();
        }
    }

    /// Selected nodes, in selection order
    pub fn selected_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.selected_nodes.iter().copied()
    }

    /// Check whether a node is selected
    pub fn is_selected(&self, node_id: NodeId) -> bool {
        self.selected_nodes.contains(&node_id)
    }

    fn emit_selection(&mut self) {
        let selected: Vec<NodeId> = self.selected_nodes.iter().copied().collect();
        self.emit(|o| o.on_selection_changed(&selected));
    }

    fn emit(&mut self, mut notify: impl FnMut(&mut dyn GraphObserver)) {
        for observer in &mut self.observers {
            notify(observer.as_mut());
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .field("connections", &self.connections.len())
            .field("active_node", &self.active_node)
            .field("selected_nodes", &self.selected_nodes.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Error when creating a connection
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Output socket not found
    #[error("Output not found: {0:?}")]
    OutputNotFound(OutputRef),

    /// Input socket not found
    #[error("Input not found: {0:?}")]
    InputNotFound(InputRef),

    /// The connection would close a cycle
    #[error("Connection would create a cycle")]
    CycleDetected,
}
