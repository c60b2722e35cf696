// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree view navigation.
//!
//! Parses a small outline, then drives the controller with keys and clicks and prints the
//! events the view would apply.
//!
//! Run:
//! - `cargo run -p tessera_demos --example tree_view`

use tessera_tree::{ClickTarget, ItemGraph, TreeItemSpec, TreeKey, TreeKeyCode, TreeView};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let mut graph = ItemGraph::new();
    let src = graph.insert(TreeItemSpec::new("src").expanded(true));
    let _lib = graph.insert_child(src, TreeItemSpec::new("lib.rs"));
    let tests = graph.insert_child(src, TreeItemSpec::new("tests"));
    let _it = graph.insert_child(tests, TreeItemSpec::new("integration.rs"));
    let _locked = graph.insert_child(src, TreeItemSpec::new("generated").disabled(true));
    let readme = graph.insert(TreeItemSpec::new("README.md"));
    // An empty label is skipped, with a warning.
    let _blank = graph.insert_child(readme, TreeItemSpec::new(""));

    let mut view = TreeView::new(graph, vec![src, readme]).expect("outline has no cycles");
    let order: Vec<&str> = view.data().traversal_order().iter().map(TreeKey::as_str).collect();
    println!("traversal order: {order:?}");

    let steps = [
        ("1", TreeKeyCode::Down),
        ("1.1", TreeKeyCode::Down),
        ("1.2", TreeKeyCode::Right),
        ("1.2", TreeKeyCode::Down),
        ("1.2.1", TreeKeyCode::Left),
        ("1.2", TreeKeyCode::End),
        ("2", TreeKeyCode::Home),
    ];
    for (key, code) in steps {
        let events = view.handle_key(&TreeKey::new(key), code);
        println!("{key:>6} {code:?}: {events:?}");
    }

    for key in ["1.3", "2"] {
        let events = view.handle_click(&TreeKey::new(key), ClickTarget::Label);
        println!("click {key}: {events:?}");
    }
}
