// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree grid expand and collapse.
//!
//! Builds a tree grid over nested accounts, expands a row with the keyboard in row mode, then
//! expands and collapses everything.
//!
//! Run:
//! - `cargo run -p tessera_demos --example tree_grid`

use kurbo::Rect;
use serde_json::json;
use tessera_grid::{
    DatatableEvent, EventOutcome, GridHost, Key, PanelResult, ScrollMetrics, TreeGrid,
};
use tracing_subscriber::EnvFilter;

struct PrintHost;

impl GridHost for PrintHost {
    fn available_width(&self) -> u32 {
        800
    }
    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics::default()
    }
    fn viewable_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, 800.0, 600.0)
    }
    fn edit_panel(&self) -> PanelResult {
        PanelResult::default()
    }
    fn dispatch(&mut self, event: DatatableEvent) -> EventOutcome {
        if let DatatableEvent::Toggle { name, is_expanded, has_children_content, .. } = &event {
            println!("  toggle {name}: expanded={is_expanded} children={has_children_content}");
        } else {
            println!("  event: {}", event.name());
        }
        EventOutcome::Continue
    }
}

fn print_rows(grid: &TreeGrid<PrintHost>) {
    for row in &grid.datatable().state().rows {
        let tree = row.tree.unwrap_or_default();
        let marker = match tree.is_expanded {
            Some(true) => "v",
            Some(false) => ">",
            None => " ",
        };
        println!("  {}{marker} {}", "  ".repeat(tree.level.saturating_sub(1) as usize), row.key);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let mut grid = TreeGrid::new(PrintHost);
    grid.set_key_field(&json!("name")).expect("key field is a string");
    grid.set_columns(
        serde_json::from_value(json!([
            { "label": "Account", "fieldName": "name" },
            { "label": "Employees", "fieldName": "employees", "type": "number" }
        ]))
        .expect("demo columns are valid"),
    )
    .expect("columns apply");
    grid.set_data(&json!([
        { "name": "Acme", "employees": 120, "_children": [
            { "name": "Acme East", "employees": 70 },
            { "name": "Acme West", "employees": 50, "_children": [
                { "name": "West Depot", "employees": 8 }
            ] }
        ] },
        { "name": "Globex", "employees": 40, "_children": [] }
    ]))
    .expect("data applies");
    grid.after_render();
    println!("== Collapsed ==");
    print_rows(&grid);

    println!("== Right arrow on Acme ==");
    grid.handle_row_keydown("Acme", Key::ArrowRight).expect("toggle applies");
    print_rows(&grid);

    println!("== Expand all ==");
    grid.expand_all().expect("expand applies");
    print_rows(&grid);

    println!("== Collapse all ==");
    grid.collapse_all().expect("collapse applies");
    print_rows(&grid);
}
