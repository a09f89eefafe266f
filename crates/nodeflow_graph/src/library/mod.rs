// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node type libraries.

pub mod math;
pub mod logic;

use crate::node::NodeRegistry;

/// Create a registry holding every built-in node type
pub fn create_default_registry() -> NodeRegistry {
    let mut registry = math::create_math_registry();
    registry.extend(logic::create_logic_registry());
    registry
}
