// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::node::NodeId;
use crate::socket::{InputRef, OutputRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A directed edge from one output to one input.
///
/// Connections are plain values; a connection is committed exactly when it
/// is a member of its graph's connection set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Source output
    pub output: OutputRef,
    /// Destination input
    pub input: InputRef,
}

impl Connection {
    /// Create a new connection
    pub fn new(output: OutputRef, input: InputRef) -> Self {
        Self {
            id: ConnectionId::new(),
            output,
            input,
        }
    }

    /// Node owning the source output
    pub fn from_node(&self) -> NodeId {
        self.output.node
    }

    /// Node owning the destination input
    pub fn to_node(&self) -> NodeId {
        self.input.node
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from_node() == node_id || self.to_node() == node_id
    }
}
