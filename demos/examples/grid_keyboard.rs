// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyboard walk through a grid.
//!
//! Focuses the grid, walks the active cell with the arrow keys and Tab, then deletes the focused
//! row to show focus falling back to its neighbour. Every focus move is printed as the host
//! receives it after a render.
//!
//! Run:
//! - `cargo run -p tessera_demos --example grid_keyboard`
//! - `RUST_LOG=tessera_grid=debug cargo run -p tessera_demos --example grid_keyboard`

use kurbo::Rect;
use serde_json::json;
use tessera_grid::{
    Datatable, DatatableEvent, EventOutcome, GridHost, Key, Options, PanelResult, ScrollMetrics,
};
use tracing_subscriber::EnvFilter;

struct PrintHost;

impl GridHost for PrintHost {
    fn available_width(&self) -> u32 {
        720
    }
    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics::default()
    }
    fn viewable_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, 720.0, 480.0)
    }
    fn edit_panel(&self) -> PanelResult {
        PanelResult::default()
    }
    fn dispatch(&mut self, event: DatatableEvent) -> EventOutcome {
        println!("  event: {} {:?}", event.name(), event);
        EventOutcome::Continue
    }
}

fn render(grid: &mut Datatable<PrintHost>) {
    for effect in grid.after_render() {
        println!("  focus: {effect:?}");
    }
    if let Some(active) = &grid.state().keyboard.active_cell {
        println!("  active cell: {} / {}", active.row, active.col_key);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let options = Options::from_value(json!({
        "keyField": "id",
        "columns": [
            { "label": "Name", "fieldName": "name" },
            { "label": "City", "fieldName": "city" },
            { "label": "Revenue", "fieldName": "revenue", "type": "currency" }
        ],
        "data": [
            { "id": "acme", "name": "Acme", "city": "Lyon", "revenue": 1200 },
            { "id": "globex", "name": "Globex", "city": "Oslo", "revenue": 800 },
            { "id": "initech", "name": "Initech", "city": "Austin", "revenue": 450 }
        ]
    }))
    .expect("demo options are valid");

    let mut grid = Datatable::from_options(PrintHost, &options).expect("demo grid builds");
    println!("== First render ==");
    render(&mut grid);

    println!("== Focus in ==");
    grid.handle_focus_in();
    render(&mut grid);

    for key in [Key::ArrowDown, Key::ArrowRight, Key::ArrowDown, Key::Tab { shift: false }] {
        println!("== {key:?} ==");
        let consumed = grid.handle_table_keydown(key);
        println!("  consumed: {consumed}");
        render(&mut grid);
    }

    println!("== Delete the focused row ==");
    grid.set_data(&json!([
        { "id": "acme", "name": "Acme", "city": "Lyon", "revenue": 1200 },
        { "id": "globex", "name": "Globex", "city": "Oslo", "revenue": 800 }
    ]))
    .expect("demo data is valid");
    render(&mut grid);
}
