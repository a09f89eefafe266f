// SPDX-License-Identifier: MIT OR Apache-2.0
//! Numeric node types.
//!
//! Every input accepts any value; inputs that are not numeric count as zero.

use crate::node::{NodeCategory, NodeRegistry, NodeType};
use crate::socket::{Input, Output};
use crate::value::Value;

fn number(inputs: &[Value], index: usize) -> f64 {
    inputs.get(index).and_then(Value::as_f64).unwrap_or(0.0)
}

fn binary(name: &str, op: fn(f64, f64) -> f64) -> Output {
    Output::new(name, move |inputs| {
        Value::Float(op(number(inputs, 0), number(inputs, 1)))
    })
}

/// Create the math node registry
pub fn create_math_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    // ========================================================================
    // Constants
    // ========================================================================

    registry.register(NodeType {
        id: "constant".to_string(),
        name: "Constant".to_string(),
        category: NodeCategory::Input,
        description: "A single editable number".to_string(),
        inputs: vec![Input::float("Value", 0.0, -1.0e9, 1.0e9, 0.1)],
        outputs: vec![Output::new("Value", |inputs| {
            Value::Float(number(inputs, 0))
        })],
    });

    // ========================================================================
    // Arithmetic
    // ========================================================================

    registry.register(NodeType {
        id: "add".to_string(),
        name: "Add".to_string(),
        category: NodeCategory::Math,
        description: "A + B".to_string(),
        inputs: vec![Input::new("A", 0.0), Input::new("B", 0.0)],
        outputs: vec![binary("Result", |a, b| a + b)],
    });

    registry.register(NodeType {
        id: "subtract".to_string(),
        name: "Subtract".to_string(),
        category: NodeCategory::Math,
        description: "A - B".to_string(),
        inputs: vec![Input::new("A", 0.0), Input::new("B", 0.0)],
        outputs: vec![binary("Result", |a, b| a - b)],
    });

    registry.register(NodeType {
        id: "multiply".to_string(),
        name: "Multiply".to_string(),
        category: NodeCategory::Math,
        description: "A * B".to_string(),
        inputs: vec![Input::new("A", 1.0), Input::new("B", 1.0)],
        outputs: vec![binary("Result", |a, b| a * b)],
    });

    registry.register(NodeType {
        id: "divide".to_string(),
        name: "Divide".to_string(),
        category: NodeCategory::Math,
        description: "A / B, zero when B is zero".to_string(),
        inputs: vec![Input::new("A", 0.0), Input::new("B", 1.0)],
        outputs: vec![binary("Result", |a, b| if b == 0.0 { 0.0 } else { a / b })],
    });

    registry.register(NodeType {
        id: "double".to_string(),
        name: "Double".to_string(),
        category: NodeCategory::Math,
        description: "X * 2".to_string(),
        inputs: vec![Input::new("X", 0.0)],
        outputs: vec![Output::new("Result", |inputs| {
            Value::Float(number(inputs, 0) * 2.0)
        })],
    });

    // ========================================================================
    // Utility
    // ========================================================================

    registry.register(NodeType {
        id: "clamp".to_string(),
        name: "Clamp".to_string(),
        category: NodeCategory::Utility,
        description: "Clamp X between Min and Max".to_string(),
        inputs: vec![
            Input::new("X", 0.0),
            Input::new("Min", 0.0),
            Input::new("Max", 1.0),
        ],
        outputs: vec![Output::new("Result", |inputs| {
            let (x, min, max) = (number(inputs, 0), number(inputs, 1), number(inputs, 2));
            // inverted bounds resolve to min
            Value::Float(x.min(max).max(min))
        })],
    });

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::engine::Engine;
    use crate::graph::Graph;
    use crate::socket::{InputRef, OutputRef};

    fn eval(registry: &NodeRegistry, type_id: &str, inputs: &[Value]) -> Value {
        let mut graph = Graph::new("test");
        let node = graph.create_node(registry.create_node(type_id).unwrap());
        for (index, value) in inputs.iter().enumerate() {
            graph.set_input_value(InputRef::new(node, index), value.clone());
        }
        Engine::new()
            .calculate(&mut graph, OutputRef::new(node, 0))
            .unwrap()
    }

    #[test]
    fn test_arithmetic() {
        let registry = create_math_registry();
        let (a, b) = (Value::Float(6.0), Value::Int(3));
        assert_eq!(eval(&registry, "add", &[a.clone(), b.clone()]), Value::Float(9.0));
        assert_eq!(eval(&registry, "subtract", &[a.clone(), b.clone()]), Value::Float(3.0));
        assert_eq!(eval(&registry, "multiply", &[a.clone(), b.clone()]), Value::Float(18.0));
        assert_eq!(eval(&registry, "divide", &[a.clone(), b]), Value::Float(2.0));
        assert_eq!(eval(&registry, "double", &[a]), Value::Float(12.0));
    }

    #[test]
    fn test_divide_by_zero_is_zero() {
        let registry = create_math_registry();
        let result = eval(&registry, "divide", &[Value::Float(5.0), Value::Float(0.0)]);
        assert_eq!(result, Value::Float(0.0));
    }

    #[test]
    fn test_non_numeric_inputs_count_as_zero() {
        let registry = create_math_registry();
        let result = eval(&registry, "add", &[Value::from("x"), Value::Float(2.0)]);
        assert_eq!(result, Value::Float(2.0));
    }

    #[test]
    fn test_clamp() {
        let registry = create_math_registry();
        let clamp = |x: f64| eval(&registry, "clamp", &[Value::Float(x)]);
        assert_eq!(clamp(-1.0), Value::Float(0.0));
        assert_eq!(clamp(0.25), Value::Float(0.25));
        assert_eq!(clamp(4.0), Value::Float(1.0));
    }

    #[test]
    fn test_constant_feeds_chain() {
        let registry = create_math_registry();
        let mut graph = Graph::new("test");
        let constant = graph.create_node(registry.create_node("constant").unwrap());
        let add = graph.create_node(registry.create_node("add").unwrap());
        graph.set_input_value(InputRef::new(constant, 0), 2.5);
        graph.set_input_value(InputRef::new(add, 1), 1.5);
        graph
            .create_connection(Connection::new(
                OutputRef::new(constant, 0),
                InputRef::new(add, 0),
            ))
            .unwrap();

        let result = Engine::new().calculate(&mut graph, OutputRef::new(add, 0));
        assert_eq!(result, Some(Value::Float(4.0)));
    }
}
