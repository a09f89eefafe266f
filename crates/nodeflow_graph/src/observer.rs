// SPDX-License-Identifier: MIT OR Apache-2.0
//! Notifications sent from a graph to its presentation layer.

use crate::connection::{Connection, ConnectionId};
use crate::node::{Node, NodeId};
use parking_lot::Mutex;
use std::sync::Arc;

/// Receives notifications after each graph mutation.
///
/// All methods default to no-ops. Observers only see shared references and
/// must not try to mutate the graph from a callback.
pub trait GraphObserver: Send {
    /// A node became a member of the graph
    fn on_node_created(&mut self, _node: &Node) {}

    /// A node was removed from the graph
    fn on_node_deleted(&mut self, _node: &Node) {}

    /// A connection was committed
    fn on_connection_created(&mut self, _connection: &Connection) {}

    /// A committed connection was removed
    fn on_connection_deleted(&mut self, _connection: &Connection) {}

    /// The active node changed
    fn on_active_node_changed(&mut self, _node: Option<NodeId>) {}

    /// The selection changed
    fn on_selection_changed(&mut self, _nodes: &[NodeId]) {}
}

/// A recorded graph notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    /// See [`GraphObserver::on_node_created`]
    NodeCreated(NodeId),
    /// See [`GraphObserver::on_node_deleted`]
    NodeDeleted(NodeId),
    /// See [`GraphObserver::on_connection_created`]
    ConnectionCreated(ConnectionId),
    /// See [`GraphObserver::on_connection_deleted`]
    ConnectionDeleted(ConnectionId),
    /// See [`GraphObserver::on_active_node_changed`]
    ActiveNodeChanged(Option<NodeId>),
    /// See [`GraphObserver::on_selection_changed`]
    SelectionChanged(Vec<NodeId>),
}

/// Observer that appends every notification to a shared log
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<GraphEvent>>>,
}

impl EventRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<GraphEvent> {
        self.events.lock().clone()
    }

    /// Drain the recorded events
    pub fn take(&self) -> Vec<GraphEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    fn push(&self, event: GraphEvent) {
        self.events.lock().push(event);
    }
}

impl GraphObserver for EventRecorder {
    fn on_node_created(&mut self, node: &Node) {
        self.push(GraphEvent::NodeCreated(node.id));
    }

    fn on_node_deleted(&mut self, node: &Node) {
        self.push(GraphEvent::NodeDeleted(node.id));
    }

    fn on_connection_created(&mut self, connection: &Connection) {
        self.push(GraphEvent::ConnectionCreated(connection.id));
    }

    fn on_connection_deleted(&mut self, connection: &Connection) {
        self.push(GraphEvent::ConnectionDeleted(connection.id));
    }

    fn on_active_node_changed(&mut self, node: Option<NodeId>) {
        self.push(GraphEvent::ActiveNodeChanged(node));
    }

    fn on_selection_changed(&mut self, nodes: &[NodeId]) {
        self.push(GraphEvent::SelectionChanged(nodes.to_vec()));
    }
}

/// Observer that mirrors notifications into the `tracing` log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl GraphObserver for TracingObserver {
    fn on_node_created(&mut self, node: &Node) {
        tracing::debug!("Node created: {} ({:?})", node.name, node.id);
    }

    fn on_node_deleted(&mut self, node: &Node) {
        tracing::debug!("Node deleted: {} ({:?})", node.name, node.id);
    }

    fn on_connection_created(&mut self, connection: &Connection) {
        tracing::debug!(
            "Connection created: {:?}[{}] -> {:?}[{}]",
            connection.output.node,
            connection.output.index,
            connection.input.node,
            connection.input.index
        );
    }

    fn on_connection_deleted(&mut self, connection: &Connection) {
        tracing::debug!("Connection deleted: {:?}", connection.id);
    }

    fn on_active_node_changed(&mut self, node: Option<NodeId>) {
        tracing::debug!("Active node: {:?}", node);
    }

    fn on_selection_changed(&mut self, nodes: &[NodeId]) {
        tracing::debug!("Selection changed: {} node(s)", nodes.len());
    }
}
