// SPDX-License-Identifier: MIT OR Apache-2.0
//! Boolean node types.

use crate::node::{NodeCategory, NodeRegistry, NodeType};
use crate::socket::{Input, Output};
use crate::value::Value;

fn truthy(inputs: &[Value], index: usize) -> bool {
    inputs.get(index).and_then(Value::as_bool).unwrap_or(false)
}

/// Create the logic node registry
pub fn create_logic_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    registry.register(NodeType {
        id: "boolean".to_string(),
        name: "Boolean".to_string(),
        category: NodeCategory::Input,
        description: "A single editable flag".to_string(),
        inputs: vec![Input::boolean("Value", false)],
        outputs: vec![Output::new("Value", |inputs| Value::Bool(truthy(inputs, 0)))],
    });

    registry.register(NodeType {
        id: "and".to_string(),
        name: "And".to_string(),
        category: NodeCategory::Logic,
        description: "True when both inputs are true".to_string(),
        inputs: vec![Input::boolean("A", false), Input::boolean("B", false)],
        outputs: vec![Output::new("Result", |inputs| {
            Value::Bool(truthy(inputs, 0) && truthy(inputs, 1))
        })],
    });

    registry.register(NodeType {
        id: "or".to_string(),
        name: "Or".to_string(),
        category: NodeCategory::Logic,
        description: "True when either input is true".to_string(),
        inputs: vec![Input::boolean("A", false), Input::boolean("B", false)],
        outputs: vec![Output::new("Result", |inputs| {
            Value::Bool(truthy(inputs, 0) || truthy(inputs, 1))
        })],
    });

    registry.register(NodeType {
        id: "not".to_string(),
        name: "Not".to_string(),
        category: NodeCategory::Logic,
        description: "Invert the input".to_string(),
        inputs: vec![Input::boolean("In", false)],
        outputs: vec![Output::new("Result", |inputs| Value::Bool(!truthy(inputs, 0)))],
    });

    registry.register(NodeType {
        id: "compare".to_string(),
        name: "Compare".to_string(),
        category: NodeCategory::Logic,
        description: "True when A is greater than B".to_string(),
        inputs: vec![Input::new("A", 0.0), Input::new("B", 0.0)],
        outputs: vec![Output::new("A > B", |inputs| {
            let a = inputs.first().and_then(Value::as_f64);
            let b = inputs.get(1).and_then(Value::as_f64);
            Value::Bool(matches!((a, b), (Some(a), Some(b)) if a > b))
        })],
    });

    registry
}
