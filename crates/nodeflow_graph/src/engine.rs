// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph evaluation and cycle detection.
//!
//! Evaluation is pull-based: asking for an output recursively pulls the
//! values of everything upstream of it. Each output memoizes its last value
//! together with the epoch it was computed in, and the engine bumps the epoch
//! once per top-level call. Within one call every output is therefore
//! computed at most once, however often it is reached through fan-out or
//! diamond-shaped dependencies; the next call recomputes everything it
//! touches. Memos also carry the engine's identifier, so engines sharing a
//! graph never reuse each other's results.

use crate::connection::Connection;
use crate::graph::Graph;
use crate::node::NodeId;
use crate::socket::{Memo, OutputRef};
use crate::value::Value;
use indexmap::IndexSet;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

/// Where an input gets its effective value from
enum Source {
    Local(Value),
    Upstream(OutputRef),
}

/// Evaluates outputs of a graph, memoizing per epoch
#[derive(Debug)]
pub struct Engine {
    id: u64,
    epoch: u64,
}

impl Engine {
    /// Create an engine at epoch zero
    pub fn new() -> Self {
        Self {
            id: NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed),
            epoch: 0,
        }
    }

    /// Process-unique engine identifier
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current epoch
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Compute a single output in a fresh epoch.
    ///
    /// Returns `None` if the output does not belong to a node of `graph`.
    pub fn calculate(&mut self, graph: &mut Graph, output: OutputRef) -> Option<Value> {
        self.epoch += 1;
        tracing::debug!(
            "Calculating output {:?}[{}] (epoch {})",
            output.node,
            output.index,
            self.epoch
        );
        self.calculate_output(graph, output)
    }

    /// Compute every output of a node in one shared epoch.
    ///
    /// Values are returned in output order, one per output; an unknown node
    /// yields nothing.
    pub fn calculate_node(&mut self, graph: &mut Graph, node: NodeId) -> Vec<Value> {
        self.epoch += 1;
        let count = graph.node(node).map_or(0, |n| n.outputs().len());
        tracing::debug!(
            "Calculating {} output(s) of {:?} (epoch {})",
            count,
            node,
            self.epoch
        );
        (0..count)
            .map(|index| {
                self.calculate_output(graph, OutputRef::new(node, index))
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Compute an output within the current epoch, reusing its memo if fresh.
    ///
    /// An input is driven by its upstream output when connected and by its
    /// local value otherwise; an upstream that no longer resolves counts as
    /// [`Value::Null`].
    pub fn calculate_output(&self, graph: &mut Graph, output: OutputRef) -> Option<Value> {
        let node = graph.node(output.node)?;
        let socket = node.output(output.index)?;
        if let Some(memo) = socket.memo() {
            if memo.engine == self.id && memo.epoch == self.epoch {
                return Some(memo.value.clone());
            }
        }

        let func = socket.func();
        let sources: Vec<Source> = node
            .inputs()
            .iter()
            .map(|input| match input.connection().and_then(|id| graph.connection(id)) {
                Some(connection) => Source::Upstream(connection.output),
                None => Source::Local(input.value().clone()),
            })
            .collect();

        let inputs: Vec<Value> = sources
            .into_iter()
            .map(|source| match source {
                Source::Local(value) => value,
                Source::Upstream(upstream) => self
                    .calculate_output(graph, upstream)
                    .unwrap_or_default(),
            })
            .collect();

        let value = func(&inputs);
        tracing::trace!(
            "Computed {:?}[{}] = {} (epoch {})",
            output.node,
            output.index,
            value,
            self.epoch
        );

        if let Some(socket) = graph
            .node_mut(output.node)
            .and_then(|n| n.output_mut(output.index))
        {
            socket.store(Memo {
                engine: self.id,
                epoch: self.epoch,
                value: value.clone(),
            });
        }
        Some(value)
    }

    /// Check whether `node` reaches itself through its inputs.
    ///
    /// Run right after wiring a connection out of `node`; `true` means the
    /// connection closed a cycle and must be removed again.
    pub fn check_node(graph: &Graph, node: NodeId) -> bool {
        let Some(target) = graph.node(node) else {
            return false;
        };
        target
            .inputs()
            .iter()
            .filter_map(|input| input.connection().and_then(|id| graph.connection(id)))
            .any(|connection| Self::check_output(graph, node, connection.output).contains(&node))
    }

    /// Collect the nodes upstream of `output`, including its own node.
    ///
    /// Inputs of `origin` are not followed, which stops the walk at the edge
    /// under test.
    pub fn check_output(graph: &Graph, origin: NodeId, output: OutputRef) -> Vec<NodeId> {
        let mut reached = IndexSet::new();
        collect_upstream(graph, Some(origin), output.node, &mut reached);
        reached.into_iter().collect()
    }

    /// Check, without touching the graph, whether committing `connection`
    /// would create a cycle.
    pub fn creates_cycle(graph: &Graph, connection: &Connection) -> bool {
        let mut reached = IndexSet::new();
        collect_upstream(graph, None, connection.from_node(), &mut reached);
        reached.contains(&connection.to_node())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_upstream(
    graph: &Graph,
    origin: Option<NodeId>,
    node_id: NodeId,
    reached: &mut IndexSet<NodeId>,
) {
    let Some(node) = graph.node(node_id) else {
        return;
    };
    if !reached.insert(node_id) || origin == Some(node_id) {
        return;
    }
    for input in node.inputs() {
        if let Some(connection) = input.connection().and_then(|id| graph.connection(id)) {
            collect_upstream(graph, origin, connection.from_node(), reached);
        }
    }
}
