// SPDX-License-Identifier: MIT OR Apache-2.0
//! Input and output sockets.
//!
//! Sockets live inside their [`Node`](crate::node::Node) and are addressed
//! positionally through [`InputRef`] and [`OutputRef`]. The position of a
//! socket inside a node type never changes, so refs stay valid for the
//! lifetime of the node and can be remapped by index when nodes are cloned.

use crate::connection::ConnectionId;
use crate::node::NodeId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Precision used when rounding float inputs
const FLOAT_PRECISION: f64 = 1_000_000.0;

/// Address of an input socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputRef {
    /// Owning node
    pub node: NodeId,
    /// Position in the node's input list
    pub index: usize,
}

impl InputRef {
    /// Create a new input ref
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

/// Address of an output socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    /// Owning node
    pub node: NodeId,
    /// Position in the node's output list
    pub index: usize,
}

impl OutputRef {
    /// Create a new output ref
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

/// How an input normalises values assigned to it
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum InputKind {
    /// Accepts any value unchanged
    #[default]
    Any,
    /// Integer clamped to `[min, max]`; inverted bounds resolve to `max`
    Number {
        /// Lower bound
        min: i64,
        /// Upper bound
        max: i64,
    },
    /// Float clamped to `[min, max]` and rounded to six decimals; inverted bounds resolve to `max`
    Float {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
        /// Increment used by [`Input::step_up`] and [`Input::step_down`]
        step: f64,
    },
    /// Boolean
    Boolean,
    /// String
    String,
}

impl InputKind {
    /// Coerce a value into this kind.
    ///
    /// Returns `None` when the value cannot be represented.
    pub fn normalize(&self, value: Value) -> Option<Value> {
        match *self {
            Self::Any => Some(value),
            Self::Number { min, max } => value.as_i64().map(|v| Value::Int(v.max(min).min(max))),
            Self::Float { min, max, .. } => value
                .as_f64()
                .map(|v| Value::Float(round_float(v.max(min).min(max)))),
            Self::Boolean => value.as_bool().map(Value::Bool),
            Self::String => match value {
                Value::String(s) => Some(Value::String(s)),
                Value::Null | Value::List(_) => None,
                other => Some(Value::String(other.to_string())),
            },
        }
    }
}

fn round_float(v: f64) -> f64 {
    (v * FLOAT_PRECISION).round() / FLOAT_PRECISION
}

/// An input socket on a node
#[derive(Debug, Clone)]
pub struct Input {
    /// Socket name
    pub name: String,
    /// Value normalisation rule
    pub kind: InputKind,
    value: Value,
    default_value: Value,
    connection: Option<ConnectionId>,
}

impl Input {
    /// Create an input accepting any value
    pub fn new(name: impl Into<String>, default_value: impl Into<Value>) -> Self {
        Self::with_kind(name, InputKind::Any, default_value.into())
    }

    /// Create an input with an explicit kind.
    ///
    /// The default is normalised through the kind; if it cannot be
    /// represented it is stored as given.
    pub fn with_kind(name: impl Into<String>, kind: InputKind, default_value: Value) -> Self {
        let default_value = kind.normalize(default_value.clone()).unwrap_or(default_value);
        Self {
            name: name.into(),
            kind,
            value: default_value.clone(),
            default_value,
            connection: None,
        }
    }

    /// Create an integer input clamped to `[min, max]`
    pub fn number(name: impl Into<String>, default_value: i64, min: i64, max: i64) -> Self {
        Self::with_kind(name, InputKind::Number { min, max }, Value::Int(default_value))
    }

    /// Create a float input clamped to `[min, max]`
    pub fn float(name: impl Into<String>, default_value: f64, min: f64, max: f64, step: f64) -> Self {
        Self::with_kind(
            name,
            InputKind::Float { min, max, step },
            Value::Float(default_value),
        )
    }

    /// Create a boolean input
    pub fn boolean(name: impl Into<String>, default_value: bool) -> Self {
        Self::with_kind(name, InputKind::Boolean, Value::Bool(default_value))
    }

    /// Create a string input
    pub fn string(name: impl Into<String>, default_value: impl Into<String>) -> Self {
        Self::with_kind(name, InputKind::String, Value::String(default_value.into()))
    }

    /// Locally stored value (ignored by the engine while connected)
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Value restored by [`Input::reset`]
    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    /// Incoming connection, if any
    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    /// Check whether a connection terminates here
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Assign a new local value, normalised through the input kind.
    ///
    /// Returns `false` and leaves the value untouched if it cannot be
    /// represented by the kind.
    pub fn set_value(&mut self, value: impl Into<Value>) -> bool {
        match self.kind.normalize(value.into()) {
            Some(value) => {
                self.value = value;
                true
            }
            None => false,
        }
    }

    /// Restore the default value
    pub fn reset(&mut self) {
        self.value = self.default_value.clone();
    }

    /// Increase a numeric input by one step
    pub fn step_up(&mut self) {
        self.nudge(1.0);
    }

    /// Decrease a numeric input by one step
    pub fn step_down(&mut self) {
        self.nudge(-1.0);
    }

    fn nudge(&mut self, direction: f64) {
        let next = match (self.kind, &self.value) {
            (InputKind::Number { .. }, Value::Int(v)) => Value::Int(v.saturating_add(direction as i64)),
            (InputKind::Float { step, .. }, Value::Float(v)) => Value::Float(v + step * direction),
            _ => return,
        };
        self.set_value(next);
    }

    pub(crate) fn set_connection(&mut self, connection: Option<ConnectionId>) {
        self.connection = connection;
    }
}

/// Function computing an output from the effective values of its node's inputs
pub type OutputFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Memoized output value, tagged with the engine and epoch it was computed in
#[derive(Debug, Clone, PartialEq)]
pub struct Memo {
    /// Identifier of the computing engine
    pub engine: u64,
    /// Engine epoch of the computation
    pub epoch: u64,
    /// Computed value
    pub value: Value,
}

/// An output socket on a node
#[derive(Clone)]
pub struct Output {
    /// Socket name
    pub name: String,
    func: OutputFn,
    memo: Option<Memo>,
}

impl Output {
    /// Create an output from a pure function of the node's input values
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
            memo: None,
        }
    }

    /// Create an output that forwards all input values as a list
    pub fn passthrough(name: impl Into<String>) -> Self {
        Self::new(name, |inputs| Value::List(inputs.to_vec()))
    }

    /// Last memoized value, valid only for the epoch it carries
    pub fn memo(&self) -> Option<&Memo> {
        self.memo.as_ref()
    }

    pub(crate) fn func(&self) -> OutputFn {
        Arc::clone(&self.func)
    }

    pub(crate) fn store(&mut self, memo: Memo) {
        self.memo = Some(memo);
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("name", &self.name)
            .field("memo", &self.memo)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_input_clamps() {
        let mut input = Input::number("count", 5, 0, 10);
        assert!(input.set_value(42));
        assert_eq!(input.value(), &Value::Int(10));
        assert!(input.set_value(3.7));
        assert_eq!(input.value(), &Value::Int(3));
        assert!(!input.set_value("nope"));
        assert_eq!(input.value(), &Value::Int(3));
    }

    #[test]
    fn test_float_input_steps_and_rounds() {
        let mut input = Input::float("amount", 0.2, 0.0, 1.0, 0.1);
        input.step_up();
        assert_eq!(input.value(), &Value::Float(0.3));
        for _ in 0..20 {
            input.step_up();
        }
        assert_eq!(input.value(), &Value::Float(1.0));
        input.step_down();
        assert_eq!(input.value(), &Value::Float(0.9));
    }

    #[test]
    fn test_number_steps_saturate_at_extremes() {
        let mut input = Input::number("n", i64::MAX, 0, i64::MAX);
        input.step_up();
        assert_eq!(input.value(), &Value::Int(i64::MAX));

        let mut input = Input::number("n", i64::MIN, i64::MIN, 0);
        input.step_down();
        assert_eq!(input.value(), &Value::Int(i64::MIN));
    }

    #[test]
    fn test_inverted_bounds_resolve_to_max() {
        let mut input = Input::number("n", 0, 10, 0);
        assert_eq!(input.value(), &Value::Int(0));
        assert!(input.set_value(5));
        assert_eq!(input.value(), &Value::Int(0));

        let mut input = Input::float("f", 0.5, 1.0, 0.0, 0.1);
        assert_eq!(input.value(), &Value::Float(0.0));
        input.step_up();
        assert_eq!(input.value(), &Value::Float(0.0));

        let mut input = Input::float("f", 0.5, f64::NAN, 1.0, 0.1);
        assert!(input.set_value(2.0));
        assert_eq!(input.value(), &Value::Float(1.0));
    }

    #[test]
    fn test_reset_restores_default() {
        let mut input = Input::boolean("enabled", true);
        input.set_value(false);
        assert_eq!(input.value(), &Value::Bool(false));
        input.reset();
        assert_eq!(input.value(), &Value::Bool(true));
    }

    #[test]
    fn test_string_input_stringifies_scalars() {
        let mut input = Input::string("label", "");
        assert!(input.set_value(12));
        assert_eq!(input.value(), &Value::from("12"));
        assert!(!input.set_value(Value::Null));
    }

    #[test]
    fn test_output_starts_without_memo() {
        let output = Output::new("out", |_| Value::Int(1));
        assert!(output.memo().is_none());
        assert_eq!((output.func())(&[]), Value::Int(1));
    }
}
