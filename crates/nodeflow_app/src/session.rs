// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scripted editor session.
//!
//! Builds a small pricing graph from the built-in library, evaluates it,
//! edits an input, evaluates again and duplicates the whole graph through
//! the clipboard.

use nodeflow_graph::library::create_default_registry;
use nodeflow_graph::{
    ConfigError, Editor, EditorConfig, EditorError, InputRef, NodeId, OutputRef, TracingObserver, Value,
};
use serde::Serialize;

/// Error while running a session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// An editor command failed
    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    /// Report could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One evaluated output
#[derive(Debug, Serialize)]
pub struct Evaluation {
    /// Display name of the node
    pub node: String,
    /// Engine epoch of the evaluation
    pub epoch: u64,
    /// Computed value
    pub value: Value,
}

/// Summary printed at the end of a session
#[derive(Debug, Default, Serialize)]
pub struct SessionReport {
    /// Evaluations in the order they were run
    pub evaluations: Vec<Evaluation>,
    /// Node count after duplicating the graph
    pub nodes: usize,
    /// Connection count after duplicating the graph
    pub connections: usize,
    /// Whether the deliberate cycle was rejected
    pub cycle_rejected: bool,
}

struct Pricing {
    price: NodeId,
    quantity: NodeId,
    total: NodeId,
    discounted: NodeId,
    over_budget: NodeId,
}

/// Run the session with the given configuration
pub fn run(config: EditorConfig) -> Result<SessionReport, SessionError> {
    let mut editor = Editor::with_registry(config, create_default_registry());
    let graph_id = editor.create_graph("Pricing");
    if let Some(graph) = editor.graph_mut(graph_id) {
        graph.add_observer(TracingObserver);
    }

    let pricing = build_pricing(&mut editor)?;
    let mut report = SessionReport::default();

    evaluate(&mut editor, pricing.discounted, &mut report);
    evaluate(&mut editor, pricing.over_budget, &mut report);

    editor.set_input_value(InputRef::new(pricing.quantity, 0), 12.0);
    evaluate(&mut editor, pricing.discounted, &mut report);
    evaluate(&mut editor, pricing.over_budget, &mut report);

    report.cycle_rejected = editor
        .connect(OutputRef::new(pricing.total, 0), InputRef::new(pricing.price, 0))
        .is_err();

    editor.select_all_nodes();
    let copies = editor.duplicate_selected_nodes();
    tracing::info!("Duplicated {} node(s)", copies.len());

    if let Some(graph) = editor.selected_graph() {
        report.nodes = graph.node_count();
        report.connections = graph.connection_count();
    }
    Ok(report)
}

fn build_pricing(editor: &mut Editor) -> Result<Pricing, SessionError> {
    let price = editor.spawn_node("constant", [0.0, 0.0])?;
    let quantity = editor.spawn_node("constant", [0.0, 120.0])?;
    let total = editor.spawn_node("multiply", [200.0, 60.0])?;
    let rate = editor.spawn_node("constant", [200.0, 200.0])?;
    let discounted = editor.spawn_node("multiply", [400.0, 120.0])?;
    let budget = editor.spawn_node("constant", [400.0, 260.0])?;
    let over_budget = editor.spawn_node("compare", [600.0, 180.0])?;

    editor.set_input_value(InputRef::new(price, 0), 4.5);
    editor.set_input_value(InputRef::new(quantity, 0), 3.0);
    editor.set_input_value(InputRef::new(rate, 0), 0.9);
    editor.set_input_value(InputRef::new(budget, 0), 30.0);

    editor.connect(OutputRef::new(price, 0), InputRef::new(total, 0))?;
    editor.connect(OutputRef::new(quantity, 0), InputRef::new(total, 1))?;
    editor.connect(OutputRef::new(total, 0), InputRef::new(discounted, 0))?;
    editor.connect(OutputRef::new(rate, 0), InputRef::new(discounted, 1))?;
    editor.connect(OutputRef::new(discounted, 0), InputRef::new(over_budget, 0))?;
    editor.connect(OutputRef::new(budget, 0), InputRef::new(over_budget, 1))?;

    if let Some(graph) = editor.selected_graph_mut() {
        for (node, name) in [(discounted, "Discounted"), (over_budget, "Over Budget")] {
            if let Some(node) = graph.node_mut(node) {
                node.set_name(name);
            }
        }
    }

    Ok(Pricing {
        price,
        quantity,
        total,
        discounted,
        over_budget,
    })
}

fn evaluate(editor: &mut Editor, node: NodeId, report: &mut SessionReport) {
    let Some(value) = editor.calculate(OutputRef::new(node, 0)) else {
        tracing::warn!("Output of {:?} could not be evaluated", node);
        return;
    };
    let name = editor
        .selected_graph()
        .and_then(|graph| graph.node(node))
        .map_or_else(String::new, |n| n.name.clone());
    tracing::info!("{} = {}", name, value);
    report.evaluations.push(Evaluation {
        node: name,
        epoch: editor.engine.epoch(),
        value,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_report() {
        let report = run(EditorConfig::default()).unwrap();
        let values: Vec<Value> = report.evaluations.iter().map(|e| e.value.clone()).collect();
        assert_eq!(
            values,
            vec![
                Value::Float(12.15),
                Value::Bool(false),
                Value::Float(48.6),
                Value::Bool(true),
            ]
        );
        assert_eq!(report.evaluations[3].epoch, 4);
        assert!(report.cycle_rejected);
        assert_eq!(report.nodes, 14);
        assert_eq!(report.connections, 12);
    }

    #[test]
    fn test_report_serializes() {
        let report = run(EditorConfig::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["evaluations"][0]["node"], "Discounted");
        assert_eq!(json["cycle_rejected"], true);
    }
}
