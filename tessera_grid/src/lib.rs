// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tessera Grid: the view-state engine of a datatable.
//!
//! The crate turns column definitions and row data into a derived view model (columns with
//! widths and sort annotations, rows with cells and selection flags, a key-based cell index) and
//! keeps it consistent while properties change and the user clicks, types, resizes and edits.
//! Nothing here renders. A host draws [`GridState`], reports interactions and receives
//! [`DatatableEvent`]s.
//!
//! - Columns are normalized from [`ColumnDefinition`]s, with internal checkbox and row-number
//!   columns prepended as configured.
//! - Rows and cells are rebuilt in one pass, together with the `row key → cell` index.
//! - Selection honors a row cap, radio mode for a cap of one, and shift ranges.
//! - Keyboard focus is a state machine over an active cell, with navigation and action modes and
//!   a row mode for tree grids. Focus survives data changes that remove the focused row.
//! - Inline edits are kept as dirty values until the host saves or cancels them.
//!
//! ## Engine and orchestrator
//!
//! The engine modules ([`columns`], [`rows`], [`selector`], [`sort`], [`resizer`], [`keyboard`],
//! [`inline_edit`] and their satellites) are free functions over `&mut GridState`. Each documents
//! what it expects and what it leaves behind, but none of them calls into another module's
//! reconciliation. [`Datatable`] is the only place that sequences them, in a fixed order, for
//! every property change and every interaction.
//!
//! ## API overview
//!
//! - [`Datatable`]: the orchestrator, generic over a [`GridHost`].
//! - [`Options`]: declarative configuration, usually decoded from JSON.
//! - [`GridState`]: the view model a renderer reads.
//! - [`TreeGrid`]: nested rows with expand and collapse, on top of a [`Datatable`].
//! - [`FocusEffect`]: focus moves the host applies after rendering.
//! - [`overlay`]: pooled help bubbles placed inside the table's visible area.
//! - [`GridError`]: configuration the grid refuses.
//!
//! ### Minimal usage
//!
//! ```
//! use kurbo::Rect;
//! use serde_json::json;
//! use tessera_grid::{
//!     Datatable, DatatableEvent, EventOutcome, GridHost, Options, PanelResult, ScrollMetrics,
//! };
//!
//! #[derive(Default)]
//! struct Host {
//!     events: Vec<DatatableEvent>,
//! }
//!
//! impl GridHost for Host {
//!     fn available_width(&self) -> u32 {
//!         800
//!     }
//!     fn scroll_metrics(&self) -> ScrollMetrics {
//!         ScrollMetrics::default()
//!     }
//!     fn viewable_rect(&self) -> Rect {
//!         Rect::new(0.0, 0.0, 800.0, 400.0)
//!     }
//!     fn edit_panel(&self) -> PanelResult {
//!         PanelResult::default()
//!     }
//!     fn dispatch(&mut self, event: DatatableEvent) -> EventOutcome {
//!         self.events.push(event);
//!         EventOutcome::Continue
//!     }
//! }
//!
//! let options = Options::from_value(json!({
//!     "keyField": "id",
//!     "columns": [
//!         { "label": "Name", "fieldName": "name" },
//!         { "label": "Balance", "fieldName": "balance", "type": "currency" }
//!     ],
//!     "data": [
//!         { "id": "1", "name": "Ada", "balance": 120 },
//!         { "id": "2", "name": "Grace", "balance": 80 }
//!     ]
//! }))
//! .unwrap();
//!
//! let mut grid = Datatable::from_options(Host::default(), &options).unwrap();
//! // checkbox column + two customer columns
//! assert_eq!(grid.state().columns.len(), 3);
//! assert_eq!(grid.state().rows.len(), 2);
//!
//! grid.handle_select_row("2", false);
//! let selected = grid.selected_rows();
//! assert_eq!(selected[0]["name"], json!("Grace"));
//! assert_eq!(grid.host().events.last().map(DatatableEvent::name), Some("rowselection"));
//! ```
//!
//! ### Focus survives data changes
//!
//! ```
//! # use kurbo::Rect;
//! # use tessera_grid::{DatatableEvent, EventOutcome, GridHost, PanelResult, ScrollMetrics};
//! # struct Host;
//! # impl GridHost for Host {
//! #     fn available_width(&self) -> u32 { 600 }
//! #     fn scroll_metrics(&self) -> ScrollMetrics { ScrollMetrics::default() }
//! #     fn viewable_rect(&self) -> Rect { Rect::new(0.0, 0.0, 600.0, 400.0) }
//! #     fn edit_panel(&self) -> PanelResult { PanelResult::default() }
//! #     fn dispatch(&mut self, _: DatatableEvent) -> EventOutcome { EventOutcome::Continue }
//! # }
//! use serde_json::json;
//! use tessera_grid::{Datatable, FocusEffect, Key, RowId};
//!
//! let mut grid = Datatable::new(Host);
//! grid.set_key_field(&json!("id")).unwrap();
//! grid.set_columns(serde_json::from_value(json!([{ "fieldName": "name" }])).unwrap()).unwrap();
//! grid.set_data(&json!([{ "id": "a", "name": "A" }, { "id": "b", "name": "B" }])).unwrap();
//! grid.after_render();
//!
//! grid.handle_focus_in();
//! grid.handle_table_keydown(Key::ArrowDown);
//! grid.after_render();
//!
//! // The focused row goes away: focus falls back to the row that took its place.
//! grid.set_data(&json!([{ "id": "a", "name": "A" }])).unwrap();
//! let active = grid.state().keyboard.active_cell.clone().unwrap();
//! assert_eq!(active.row, RowId::row("a"));
//! assert!(grid.after_render().iter().any(|e| matches!(e, FocusEffect::FocusCell { .. })));
//! ```

pub mod columns;
pub mod datatable;
pub mod deferred;
mod error;
pub mod header_actions;
pub mod infinite_loading;
pub mod inline_edit;
pub mod keyboard;
pub mod keys;
mod options;
pub mod overlay;
pub mod registry;
pub mod resizer;
pub mod row_number;
pub mod rows;
pub mod selector;
pub mod sort;
mod state;
pub mod tree_grid;
pub mod utils;
pub mod validation;

#[cfg(test)]
mod testing;

pub use columns::{ColumnDefinition, InternalColumnIndex, UserColumnIndex};
pub use datatable::{Datatable, DatatableEvent, EventOutcome, GridHost};
pub use error::GridError;
pub use header_actions::{ActionType, HeaderAction};
pub use infinite_loading::ScrollMetrics;
pub use inline_edit::{FinishReason, PanelResult};
pub use keyboard::{FocusEffect, Key, KeyboardMode};
pub use keys::{RowData, RowId, RowPosition};
pub use options::Options;
pub use registry::TypeRegistry;
pub use rows::RowKeyPolicy;
pub use sort::SortDirection;
pub use state::{GridState, Labels};
pub use tree_grid::TreeGrid;
pub use validation::TableErrors;
