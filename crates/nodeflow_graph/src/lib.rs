// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph editor core for `Nodeflow`.
//!
//! This crate provides the headless model behind a node editor:
//! - Graphs of nodes with positional input and output sockets
//! - A mutation protocol that keeps connections consistent and rejects cycles
//! - Pull-based evaluation with per-epoch memoization
//! - Clipboard operations and multi-graph editor state
//!
//! ## Architecture
//!
//! A [`Graph`] owns its nodes and connections and notifies registered
//! [`GraphObserver`]s after each mutation. An [`Engine`] evaluates outputs on
//! demand. The [`Editor`] ties open graphs, the [`NodeRegistry`], the
//! [`Clipboard`] and an [`EditorConfig`] together.

pub mod value;
pub mod socket;
pub mod connection;
pub mod node;
pub mod observer;
pub mod engine;
pub mod graph;
pub mod clipboard;
pub mod config;
pub mod editor;
pub mod library;

pub use clipboard::Clipboard;
pub use config::{ConfigError, EditorConfig};
pub use connection::{Connection, ConnectionId};
pub use editor::{Editor, EditorError, GraphId};
pub use engine::Engine;
pub use graph::{ConnectionError, Graph};
pub use node::{Node, NodeCategory, NodeId, NodeRegistry, NodeType, RegistryError};
pub use observer::{EventRecorder, GraphEvent, GraphObserver, TracingObserver};
pub use socket::{Input, InputKind, InputRef, Output, OutputRef};
pub use value::Value;
