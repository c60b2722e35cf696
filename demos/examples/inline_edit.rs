// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inline edit round trip.
//!
//! Opens the edit panel on a cell, commits a value, shows the pending draft in the rebuilt rows,
//! then exercises save and a cancel the host refuses.
//!
//! Run:
//! - `cargo run -p tessera_demos --example inline_edit`

use kurbo::Rect;
use serde_json::{Value, json};
use tessera_grid::{
    Datatable, DatatableEvent, EventOutcome, FinishReason, GridHost, Options, PanelResult,
    ScrollMetrics,
};
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct EditHost {
    panel_value: Option<Value>,
    refuse_cancel: bool,
}

impl GridHost for EditHost {
    fn available_width(&self) -> u32 {
        640
    }
    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics::default()
    }
    fn viewable_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, 640.0, 400.0)
    }
    fn edit_panel(&self) -> PanelResult {
        PanelResult {
            value: self.panel_value.clone(),
            valid: true,
            mass_edit_checked: false,
        }
    }
    fn dispatch(&mut self, event: DatatableEvent) -> EventOutcome {
        println!("  event: {}", event.name());
        match event {
            DatatableEvent::CellChange { draft_values } | DatatableEvent::Save { draft_values } => {
                println!("    drafts: {}", Value::from(draft_values.into_iter().map(Value::Object).collect::<Vec<_>>()));
                EventOutcome::Continue
            }
            DatatableEvent::Cancel if self.refuse_cancel => EventOutcome::PreventDefault,
            _ => EventOutcome::Continue,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let options = Options::from_value(json!({
        "keyField": "sku",
        "columns": [
            { "label": "Product", "fieldName": "product", "editable": true },
            { "label": "Stock", "fieldName": "stock", "type": "number", "editable": true }
        ],
        "data": [
            { "sku": "p-1", "product": "Kettle", "stock": 12 },
            { "sku": "p-2", "product": "Toaster", "stock": 3 }
        ]
    }))
    .expect("demo options are valid");
    let mut grid = Datatable::from_options(EditHost::default(), &options).expect("demo grid builds");
    grid.after_render();

    println!("== Edit p-2 stock ==");
    grid.host_mut().panel_value = Some(json!(9));
    grid.edit_cell("p-2", "stock-number").expect("edit opens");
    grid.finish_inline_edit(FinishReason::SubmitAction).expect("edit commits");
    let cell = &grid.state().rows[1].cells[3];
    println!("  cell now shows {:?}, status bar: {}", cell.value, grid.show_status_bar());

    println!("== Save ==");
    grid.save().expect("save succeeds");

    println!("== Cancel, refused by the host ==");
    grid.host_mut().refuse_cancel = true;
    grid.cancel().expect("cancel runs");
    println!("  drafts kept: {}", grid.draft_values().len());

    println!("== Cancel ==");
    grid.host_mut().refuse_cancel = false;
    grid.cancel().expect("cancel runs");
    println!("  drafts kept: {}", grid.draft_values().len());
}
