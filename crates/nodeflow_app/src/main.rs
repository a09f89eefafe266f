// SPDX-License-Identifier: MIT OR Apache-2.0
//! `Nodeflow` - headless node graph editor session.
//!
//! Loads an optional RON editor configuration given as the first argument,
//! runs a scripted editing session against the graph core and prints a JSON
//! report.
//!
//! Log output is controlled through `RUST_LOG`.

mod session;

use nodeflow_graph::EditorConfig;
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["nodeflow_app=info", "nodeflow_graph=info"] {
        match directive.parse() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(e) => eprintln!("Ignoring log directive {directive}: {e}"),
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Nodeflow v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run() {
        tracing::error!("Session failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), session::SessionError> {
    let config = match std::env::args().nth(1) {
        Some(path) => EditorConfig::load(Path::new(&path))?,
        None => EditorConfig::default(),
    };
    let report = session::run(config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
