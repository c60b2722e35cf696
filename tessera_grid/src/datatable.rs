// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The grid orchestrator.
//!
//! [`Datatable`] owns a [`GridState`] and is the only place that sequences the engine functions.
//! Every property setter and every user interaction runs the reconciliation passes in a fixed
//! order, so rows, indexes, selection and focus never reference identities from before the last
//! rebuild.
//!
//! The embedding application implements [`GridHost`]: it measures the layout, supplies the edit
//! panel's contents and receives [`DatatableEvent`]s. Focus moves are not applied synchronously;
//! they are queued and handed back by [`Datatable::after_render`] once the host has rendered the
//! new state.

use std::time::Instant;

use kurbo::{Rect, Size};
use serde_json::Value;
use tracing::{debug, error};

use crate::GridError;
use crate::columns::{ColumnDefinition, InternalColumnIndex, has_tree_data_type, normalize_columns, user_column_definition};
use crate::deferred::{Debouncer, DeferredQueue};
use crate::header_actions::{ActionType, HeaderAction, handle_internal_action, update_header_actions};
use crate::infinite_loading::{
    ScrollMetrics, set_infinite_loading, set_load_more_offset, set_loading, should_load_more,
    should_prefetch,
};
use crate::inline_edit::{
    FinishReason, PanelResult, ScrollAxis, cancel_inline_edit, commit_inline_edit,
    conclude_inline_edit, dirty_values_for_customer, handle_mass_checkbox_change,
    open_inline_edit, panel_scrolled, set_dirty_values, show_status_bar,
};
use crate::keyboard::{
    FocusEffect, Key, KeyboardMode, handle_cell_click, handle_cell_focus_by_click,
    handle_datatable_focus_in, handle_datatable_focus_out, handle_false_cell_blur,
    handle_table_focus, react_to_keyboard, react_to_keyboard_in_nav_mode,
    react_to_keyboard_on_row, reset_cell_to_focus_from_prev, set_cell_to_focus_from_prev,
    set_focus_active_cell, sync_active_cell, update_cell_to_focus_from_prev,
    update_row_navigation_mode, update_tab_index_active_cell, update_tab_index_active_row,
};
use crate::keys::{RowData, RowId};
use crate::options::Options;
use crate::overlay::{HelpTooltip, OverlayHandle, OverlayService};
use crate::registry::TypeRegistry;
use crate::resizer::{
    adjust_columns_size, customer_column_widths, has_defined_column_widths,
    reset_column_widths, resize_column_with_delta, set_max_column_width, set_min_column_width,
    set_resize_column_disabled, set_resize_step, update_column_widths_metadata,
};
use crate::row_number::{adjust_row_number_column_width, set_row_number_offset, set_show_row_number_column};
use crate::rows::{has_valid_key_field, set_data_value, set_key_field, update_rows_and_cell_indexes, user_row_by_key};
use crate::selector::{
    current_selection_length, handle_deselect_row, handle_select_row, mark_all_rows_deselected,
    mark_all_rows_selected, set_max_row_selection, set_selected_rows_keys,
    sync_selected_rows_keys, update_selection_state,
};
use crate::sort::{
    SortDirection, set_default_sort_direction, set_sorted_by, set_sorted_direction, update_sorting,
};
use crate::state::GridState;
use crate::utils::normalize_boolean;
use crate::validation::{TableError, set_errors_value, table_error};

/// Notification for the embedding application.
#[derive(Clone, Debug, PartialEq)]
pub enum DatatableEvent {
    /// The selection changed.
    RowSelection {
        /// Data of every selected row, in data order.
        selected_rows: Vec<RowData>,
    },
    /// A sortable header asked for a new sort. The grid does not sort by itself.
    Sort {
        /// Field to sort by.
        field_name: String,
        /// Requested direction.
        sort_direction: SortDirection,
    },
    /// Column widths changed.
    Resize {
        /// Widths of the customer columns, in user order.
        column_widths: Vec<u32>,
    },
    /// More rows are wanted.
    LoadMore,
    /// An inline edit was committed.
    CellChange {
        /// The changed rows, keyed by field name.
        draft_values: Vec<RowData>,
    },
    /// The user saved the pending edits.
    Save {
        /// Every pending edit, keyed by field name.
        draft_values: Vec<RowData>,
    },
    /// The user cancelled the pending edits. Preventing it keeps them.
    Cancel,
    /// A customer header action was triggered.
    HeaderAction {
        /// The action.
        action: HeaderAction,
        /// Definition of the column, as the application supplied it.
        column_definition: ColumnDefinition,
    },
    /// A row action or a button cell was triggered.
    RowAction {
        /// Data of the row.
        row: RowData,
        /// The action, or the button column's type attributes.
        action: Value,
    },
    /// The keyboard asked to expand or collapse a tree row.
    ToggleCell {
        /// Key of the row.
        name: String,
        /// Requested expansion state.
        next_state: bool,
    },
    /// A tree row was expanded or collapsed.
    Toggle {
        /// Key of the row.
        name: String,
        /// New expansion state.
        is_expanded: bool,
        /// Whether the row has at least one child.
        has_children_content: bool,
        /// Data of the row.
        row: RowData,
    },
    /// Every tree row was expanded or collapsed.
    ToggleAll {
        /// New expansion state.
        is_expanded: bool,
    },
}

impl DatatableEvent {
    /// Event name as the application knows it.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RowSelection { .. } => "rowselection",
            Self::Sort { .. } => "sort",
            Self::Resize { .. } => "resize",
            Self::LoadMore => "loadmore",
            Self::CellChange { .. } => "cellchange",
            Self::Save { .. } => "save",
            Self::Cancel => "cancel",
            Self::HeaderAction { .. } => "headeraction",
            Self::RowAction { .. } => "rowaction",
            Self::ToggleCell { .. } => "togglecell",
            Self::Toggle { .. } => "toggle",
            Self::ToggleAll { .. } => "toggleall",
        }
    }
}

/// Answer of the host to a dispatched event.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum EventOutcome {
    /// Let the grid run its default behavior.
    #[default]
    Continue,
    /// Suppress the default behavior of a cancelable event.
    PreventDefault,
}

/// What the grid needs from the embedding application.
pub trait GridHost {
    /// Width the table may occupy.
    fn available_width(&self) -> u32;

    /// Current geometry of the vertical scroller.
    fn scroll_metrics(&self) -> ScrollMetrics;

    /// Visible part of the table, for placing floating surfaces.
    fn viewable_rect(&self) -> Rect;

    /// Contents of the inline edit panel at the moment an edit finishes.
    fn edit_panel(&self) -> PanelResult;

    /// Receives a notification.
    fn dispatch(&mut self, event: DatatableEvent) -> EventOutcome;
}

/// A grid instance.
#[derive(Debug)]
pub struct Datatable<H: GridHost> {
    state: GridState,
    registry: TypeRegistry,
    host: H,
    draft_values: Value,
    customer_selected_rows: Option<Value>,
    deferred: DeferredQueue<FocusEffect>,
    width_observer: Debouncer,
}

impl<H: GridHost> Datatable<H> {
    /// An empty grid with the standard types.
    pub fn new(host: H) -> Self {
        Self::with_registry(host, TypeRegistry::new())
    }

    /// An empty grid with custom types.
    pub fn with_registry(host: H, registry: TypeRegistry) -> Self {
        Self {
            state: GridState::default(),
            registry,
            host,
            draft_values: Value::Null,
            customer_selected_rows: None,
            deferred: DeferredQueue::new(),
            width_observer: Debouncer::default(),
        }
    }

    /// A grid configured from `options`.
    ///
    /// Properties are applied so that each one sees the ones it depends on: flags and bounds
    /// first, then columns, then data, then the selection.
    pub fn from_options(host: H, options: &Options) -> Result<Self, GridError> {
        let mut grid = Self::new(host);
        grid.apply_options(options)?;
        Ok(grid)
    }

    /// Applies every property set in `options`.
    pub fn apply_options(&mut self, options: &Options) -> Result<(), GridError> {
        if let Some(policy) = options.row_key_policy {
            self.state.row_key_policy = policy;
        }
        if let Some(key_field) = &options.key_field {
            set_key_field(&mut self.state, key_field)?;
        }
        if let Some(value) = &options.hide_checkbox_column {
            self.state.hide_checkbox_column = normalize_boolean(value);
        }
        if let Some(value) = &options.show_row_number_column {
            set_show_row_number_column(&mut self.state, value);
        }
        if let Some(value) = &options.row_number_offset {
            set_row_number_offset(&mut self.state, value);
        }
        if let Some(value) = &options.resize_column_disabled {
            set_resize_column_disabled(&mut self.state, value);
        }
        if let Some(value) = &options.min_column_width {
            set_min_column_width(&mut self.state, value);
        }
        if let Some(value) = &options.max_column_width {
            set_max_column_width(&mut self.state, value);
        }
        if let Some(value) = &options.resize_step {
            set_resize_step(&mut self.state, value);
        }
        if let Some(value) = &options.sorted_by {
            set_sorted_by(&mut self.state, Some(value.as_str()));
        }
        if let Some(value) = &options.sorted_direction {
            set_sorted_direction(&mut self.state, value)?;
        }
        if let Some(value) = &options.default_sort_direction {
            set_default_sort_direction(&mut self.state, value)?;
        }
        if let Some(value) = &options.enable_infinite_loading {
            set_infinite_loading(&mut self.state, value);
        }
        if let Some(value) = &options.load_more_offset {
            set_load_more_offset(&mut self.state, value);
        }
        if let Some(value) = &options.is_loading {
            set_loading(&mut self.state, value);
        }
        if let Some(value) = &options.max_row_selection {
            set_max_row_selection(&mut self.state, value);
        }
        if let Some(value) = &options.errors {
            set_errors_value(&mut self.state, value);
        }
        if let Some(value) = &options.draft_values {
            self.draft_values = value.clone();
        }
        if let Some(value) = &options.hide_table_header {
            self.state.hide_table_header = normalize_boolean(value);
        }
        if let Some(value) = &options.suppress_bottom_bar {
            self.state.suppress_bottom_bar = normalize_boolean(value);
        }
        if let Some(columns) = &options.columns {
            self.set_columns(columns.clone())?;
        }
        if let Some(data) = &options.data {
            self.set_data(data)?;
        }
        if let Some(selected) = &options.selected_rows {
            self.set_selected_rows(selected);
        }
        Ok(())
    }

    /// The grid state, for rendering.
    pub fn state(&self) -> &GridState {
        &self.state
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The type registry.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    // --- property surface ---------------------------------------------------------------------

    /// Replaces the column definitions.
    pub fn set_columns(&mut self, columns: Vec<ColumnDefinition>) -> Result<(), GridError> {
        self.state.user_columns = columns;
        self.update_columns()
    }

    /// Replaces the data. Anything but an array of objects yields no rows.
    pub fn set_data(&mut self, data: &Value) -> Result<(), GridError> {
        set_data_value(&mut self.state, data);
        if has_valid_key_field(&self.state) {
            self.update_rows_state()?;
        } else {
            error!("the keyField property is required");
        }
        if let Some(selected) = self.customer_selected_rows.clone() {
            self.apply_selected_rows(&selected);
        }
        Ok(())
    }

    /// Sets the field rows are keyed by.
    pub fn set_key_field(&mut self, value: &Value) -> Result<(), GridError> {
        set_key_field(&mut self.state, value)?;
        set_dirty_values(&mut self.state, &self.draft_values);
        self.update_rows_state()
    }

    /// Hides or shows the selection checkbox column.
    pub fn set_hide_checkbox_column(&mut self, value: &Value) -> Result<(), GridError> {
        self.state.hide_checkbox_column = normalize_boolean(value);
        self.update_columns()
    }

    /// Shows or hides the row-number column.
    pub fn set_show_row_number_column(&mut self, value: &Value) -> Result<(), GridError> {
        set_show_row_number_column(&mut self.state, value);
        self.update_columns()
    }

    /// Sets the number the first row counts from.
    pub fn set_row_number_offset(&mut self, value: &Value) {
        set_row_number_offset(&mut self.state, value);
        adjust_row_number_column_width(&mut self.state, self.host.available_width());
    }

    /// Enables or disables user resizing.
    pub fn set_resize_column_disabled(&mut self, value: &Value) {
        set_resize_column_disabled(&mut self.state, value);
    }

    /// Sets the global lower column width bound.
    pub fn set_min_column_width(&mut self, value: &Value) {
        set_min_column_width(&mut self.state, value);
    }

    /// Sets the global upper column width bound.
    pub fn set_max_column_width(&mut self, value: &Value) {
        set_max_column_width(&mut self.state, value);
    }

    /// Sets the keyboard resize step.
    pub fn set_resize_step(&mut self, value: &Value) {
        set_resize_step(&mut self.state, value);
    }

    /// Records the field the data is sorted by.
    pub fn set_sorted_by(&mut self, value: Option<&str>) {
        set_sorted_by(&mut self.state, value);
        update_sorting(&mut self.state);
    }

    /// Records the sorted direction.
    pub fn set_sorted_direction(&mut self, value: &str) -> Result<(), GridError> {
        set_sorted_direction(&mut self.state, value)?;
        update_sorting(&mut self.state);
        Ok(())
    }

    /// Records the direction offered on unsorted columns.
    pub fn set_default_sort_direction(&mut self, value: &str) -> Result<(), GridError> {
        set_default_sort_direction(&mut self.state, value)?;
        update_sorting(&mut self.state);
        Ok(())
    }

    /// Enables or disables infinite loading.
    pub fn set_enable_infinite_loading(&mut self, value: &Value) {
        set_infinite_loading(&mut self.state, value);
    }

    /// Sets the infinite loading trigger distance.
    pub fn set_load_more_offset(&mut self, value: &Value) {
        set_load_more_offset(&mut self.state, value);
    }

    /// Records whether the application is loading rows.
    pub fn set_is_loading(&mut self, value: &Value) {
        set_loading(&mut self.state, value);
    }

    /// Sets the selection cap. A non-empty selection is cleared and reported.
    pub fn set_max_row_selection(&mut self, value: &Value) {
        let previous = current_selection_length(&self.state);
        set_max_row_selection(&mut self.state, value);
        if previous > 0 {
            self.fire_selected_rows_change();
        }
    }

    /// Selects the rows with the given keys.
    ///
    /// The keys are kept until the next render, so data arriving in between is selected too.
    pub fn set_selected_rows(&mut self, value: &Value) {
        self.customer_selected_rows = Some(value.clone());
        self.apply_selected_rows(value);
    }

    /// Replaces the row and table errors.
    pub fn set_errors(&mut self, value: &Value) -> Result<(), GridError> {
        set_errors_value(&mut self.state, value);
        self.update_rows_state()
    }

    /// Replaces the pending edits with drafts keyed by field name.
    pub fn set_draft_values(&mut self, value: &Value) -> Result<(), GridError> {
        self.draft_values = value.clone();
        set_dirty_values(&mut self.state, value);
        if has_valid_key_field(&self.state) {
            update_rows_and_cell_indexes(&mut self.state, &self.registry)?;
        }
        Ok(())
    }

    /// Hides or shows the header row.
    pub fn set_hide_table_header(&mut self, value: &Value) {
        self.state.hide_table_header = normalize_boolean(value);
    }

    /// Suppresses the inline edit status bar.
    pub fn set_suppress_bottom_bar(&mut self, value: &Value) {
        self.state.suppress_bottom_bar = normalize_boolean(value);
    }

    /// Data of every selected row, in data order.
    pub fn selected_rows(&self) -> Vec<RowData> {
        self.state
            .rows
            .iter()
            .zip(&self.state.data)
            .filter(|(row, _)| row.is_selected)
            .map(|(_, data)| data.clone())
            .collect()
    }

    /// Every pending edit, keyed by field name.
    pub fn draft_values(&self) -> Vec<RowData> {
        dirty_values_for_customer(&self.state)
    }

    /// Whether the inline edit status bar shows.
    pub fn show_status_bar(&self) -> bool {
        show_status_bar(&self.state)
    }

    /// Table-level errors, for the status bar.
    pub fn table_error(&self) -> &TableError {
        table_error(&self.state)
    }

    // --- reconciliation -----------------------------------------------------------------------

    fn update_columns(&mut self) -> Result<(), GridError> {
        let had_tree_data_type = has_tree_data_type(&self.state);
        set_cell_to_focus_from_prev(&mut self.state);
        normalize_columns(&mut self.state, &self.registry);
        set_dirty_values(&mut self.state, &self.draft_values);
        update_row_navigation_mode(had_tree_data_type, &mut self.state);
        update_header_actions(&mut self.state);
        update_rows_and_cell_indexes(&mut self.state, &self.registry)?;
        update_selection_state(&mut self.state);
        let available_width = self.host.available_width();
        adjust_row_number_column_width(&mut self.state, available_width);
        update_column_widths_metadata(&mut self.state);
        update_cell_to_focus_from_prev(&mut self.state);

        if self.state.columns.len() != self.state.resizer.column_widths.len() {
            reset_column_widths(&mut self.state);
            if !self.state.data.is_empty() {
                sync_active_cell(&mut self.state);
            }
        } else if has_defined_column_widths(&self.state) {
            adjust_columns_size(&mut self.state, available_width);
        }
        self.refresh_focus();
        Ok(())
    }

    fn update_rows_state(&mut self) -> Result<(), GridError> {
        set_cell_to_focus_from_prev(&mut self.state);
        update_rows_and_cell_indexes(&mut self.state, &self.registry)?;
        adjust_row_number_column_width(&mut self.state, self.host.available_width());
        update_cell_to_focus_from_prev(&mut self.state);
        let selected_rows = self.selected_rows();
        if sync_selected_rows_keys(&mut self.state, &selected_rows) {
            self.fire(DatatableEvent::RowSelection { selected_rows });
        }
        sync_active_cell(&mut self.state);
        self.refresh_focus();
        Ok(())
    }

    /// Re-asserts tab indexes and focuses the fallback cell when the active one vanished.
    fn refresh_focus(&mut self) {
        if self.state.keyboard.mode == KeyboardMode::Navigation {
            update_tab_index_active_cell(&mut self.state, 0);
            update_tab_index_active_row(&mut self.state, 0);
        }
        if self.state.keyboard.cell_to_focus_next.is_some() {
            let mut effects = Vec::new();
            set_focus_active_cell(&mut self.state, None, None, &mut effects);
            self.schedule(effects);
        }
    }

    fn apply_selected_rows(&mut self, value: &Value) {
        set_selected_rows_keys(&mut self.state, value);
        update_selection_state(&mut self.state);
    }

    fn fire(&mut self, event: DatatableEvent) -> EventOutcome {
        debug!(event = event.name(), "dispatching");
        self.host.dispatch(event)
    }

    fn fire_selected_rows_change(&mut self) {
        update_selection_state(&mut self.state);
        let selected_rows = self.selected_rows();
        self.fire(DatatableEvent::RowSelection { selected_rows });
    }

    fn fire_on_resize(&mut self) {
        let column_widths = customer_column_widths(&self.state);
        self.fire(DatatableEvent::Resize { column_widths });
    }

    /// Row toggles go to the host right away; focus moves wait for the next render.
    fn schedule(&mut self, effects: Vec<FocusEffect>) {
        for effect in effects {
            if let FocusEffect::ToggleRow {
                row_key,
                next_expanded,
            } = effect
            {
                self.fire(DatatableEvent::ToggleCell {
                    name: row_key,
                    next_state: next_expanded,
                });
            } else {
                self.deferred.push(effect);
            }
        }
    }

    // --- lifecycle ----------------------------------------------------------------------------

    /// Runs the post-render work and returns the focus moves to apply, oldest first.
    ///
    /// The first render with columns lays them out and reports the widths. A grid whose content
    /// does not fill its scroller asks for more rows.
    pub fn after_render(&mut self) -> Vec<FocusEffect> {
        if !self.state.columns.is_empty() && !has_defined_column_widths(&self.state) {
            adjust_columns_size(&mut self.state, self.host.available_width());
            self.fire_on_resize();
        }
        if should_prefetch(&self.state, &self.host.scroll_metrics()) {
            self.fire(DatatableEvent::LoadMore);
        }
        self.customer_selected_rows = None;
        reset_cell_to_focus_from_prev(&mut self.state);
        self.deferred.drain()
    }

    /// Records that the table's box changed size.
    pub fn observe_resize(&mut self, now: Instant) {
        self.width_observer.signal(now);
    }

    /// Lays the columns out again once resize observations have been quiet long enough.
    ///
    /// Returns whether a layout pass ran.
    pub fn poll_resize(&mut self, now: Instant) -> bool {
        if !self.width_observer.poll(now) {
            return false;
        }
        adjust_columns_size(&mut self.state, self.host.available_width());
        true
    }

    /// The grid left the page: pending focus moves and layout passes are dropped.
    pub fn disconnect(&mut self) {
        self.deferred.detach();
        self.width_observer.detach();
    }

    /// The grid is back on the page.
    pub fn reconnect(&mut self) {
        self.deferred.attach();
        self.width_observer.attach();
    }

    /// Whether the grid is disconnected.
    pub fn is_disconnected(&self) -> bool {
        self.deferred.is_detached()
    }

    // --- interactions -------------------------------------------------------------------------

    /// A key was pressed inside the cell `row`/`col_key`. Returns whether it was consumed.
    pub fn handle_cell_keydown(&mut self, row: &RowId, col_key: &str, key: Key) -> bool {
        let reaction = react_to_keyboard(&mut self.state, row, col_key, key);
        self.schedule(reaction.effects);
        reaction.consumed
    }

    /// A key was pressed while a cell wrapper had focus. Returns whether it was consumed.
    pub fn handle_table_keydown(&mut self, key: Key) -> bool {
        let reaction = react_to_keyboard_in_nav_mode(&mut self.state, key);
        self.schedule(reaction.effects);
        reaction.consumed
    }

    /// A key was pressed while the row `row_key` had focus. Returns whether it was consumed.
    pub fn handle_row_keydown(&mut self, row_key: &str, key: Key) -> bool {
        let reaction = react_to_keyboard_on_row(&mut self.state, row_key, key);
        self.schedule(reaction.effects);
        reaction.consumed
    }

    /// The table element received focus.
    pub fn handle_table_focus(&mut self) {
        let effects = handle_table_focus(&mut self.state);
        self.schedule(effects);
    }

    /// A cell took focus through a click on its content.
    pub fn handle_cell_focus_by_click(&mut self, row: &RowId, col_key: &str) {
        let effects = handle_cell_focus_by_click(&mut self.state, row, col_key);
        self.schedule(effects);
    }

    /// A click landed on a cell's padding.
    pub fn handle_cell_click(&mut self, row: &RowId, col_key: &str) {
        let effects = handle_cell_click(&mut self.state, row, col_key);
        self.schedule(effects);
    }

    /// A cell reported a blur that did not move focus.
    pub fn handle_false_cell_blur(&mut self, row: &RowId, col_key: &str) {
        let effects = handle_false_cell_blur(&mut self.state, row, col_key);
        self.schedule(effects);
    }

    /// Focus entered the grid.
    pub fn handle_focus_in(&mut self) {
        let effects = handle_datatable_focus_in(&mut self.state);
        self.schedule(effects);
    }

    /// Focus left a grid element; `moved_inside` tells whether it went to another one.
    pub fn handle_focus_out(&mut self, moved_inside: bool) {
        let effects = handle_datatable_focus_out(&mut self.state, moved_inside);
        self.schedule(effects);
    }

    /// The select-all checkbox was checked.
    pub fn handle_select_all_rows(&mut self) {
        mark_all_rows_selected(&mut self.state);
        self.fire_selected_rows_change();
    }

    /// The select-all checkbox was cleared.
    pub fn handle_deselect_all_rows(&mut self) {
        mark_all_rows_deselected(&mut self.state);
        self.fire_selected_rows_change();
    }

    /// A row checkbox was checked; `is_multiple` extends from the last clicked row.
    pub fn handle_select_row(&mut self, row_key: &str, is_multiple: bool) {
        handle_select_row(&mut self.state, row_key, is_multiple);
        self.fire_selected_rows_change();
    }

    /// A row checkbox was cleared; `is_multiple` extends from the last clicked row.
    pub fn handle_deselect_row(&mut self, row_key: &str, is_multiple: bool) {
        handle_deselect_row(&mut self.state, row_key, is_multiple);
        self.fire_selected_rows_change();
    }

    /// A sortable header was activated.
    pub fn handle_update_column_sort(&mut self, field_name: &str, sort_direction: SortDirection) {
        self.fire(DatatableEvent::Sort {
            field_name: field_name.to_owned(),
            sort_direction,
        });
    }

    /// A column edge was dragged by `width_delta` pixels.
    pub fn handle_resize_column(&mut self, index: InternalColumnIndex, width_delta: i32) {
        if width_delta != 0 {
            resize_column_with_delta(&mut self.state, index, width_delta);
            self.fire_on_resize();
        }
    }

    /// A header menu entry was chosen.
    pub fn handle_header_action(&mut self, col_key: &str, action: HeaderAction, kind: ActionType) {
        match kind {
            ActionType::Internal => {
                handle_internal_action(&mut self.state, &action.name, col_key);
            }
            ActionType::Customer => {
                let Some(column_definition) = self
                    .state
                    .header_indexes
                    .internal_index(col_key)
                    .and_then(|index| user_column_definition(&self.state, index))
                    .cloned()
                else {
                    return;
                };
                self.fire(DatatableEvent::HeaderAction {
                    action,
                    column_definition,
                });
            }
        }
    }

    /// A row action menu entry was chosen in the cell `row_key`/`col_key`.
    pub fn handle_row_action(&mut self, row_key: &str, col_key: &str, action: Value) {
        let Some(row) = user_row_by_key(&self.state, row_key).cloned() else {
            return;
        };
        debug!(row_key, col_key, "row action");
        self.fire(DatatableEvent::RowAction { row, action });
    }

    /// A button cell was clicked. The action is the button column's type attributes.
    pub fn handle_cell_button_click(&mut self, row_key: &str, col_key: &str) {
        let Some(row) = user_row_by_key(&self.state, row_key).cloned() else {
            return;
        };
        let Some(definition) = self
            .state
            .header_indexes
            .internal_index(col_key)
            .and_then(|index| user_column_definition(&self.state, index))
        else {
            return;
        };
        let action = Value::Object(definition.type_attributes.clone());
        self.fire(DatatableEvent::RowAction { row, action });
    }

    /// The horizontal scroller moved to `scroll_left`.
    pub fn handle_horizontal_scroll(&mut self, scroll_left: f64) -> Result<(), GridError> {
        self.handle_panel_scroll(ScrollAxis::Horizontal, scroll_left)
    }

    /// The vertical scroller moved to `scroll_top`.
    pub fn handle_vertical_scroll(&mut self, scroll_top: f64) -> Result<(), GridError> {
        if should_load_more(&self.state, &self.host.scroll_metrics()) {
            self.fire(DatatableEvent::LoadMore);
        }
        self.handle_panel_scroll(ScrollAxis::Vertical, scroll_top)
    }

    fn handle_panel_scroll(&mut self, axis: ScrollAxis, position: f64) -> Result<(), GridError> {
        if panel_scrolled(&mut self.state, axis, position) {
            self.finish_inline_edit(FinishReason::LoosedFocus)?;
        }
        Ok(())
    }

    // --- inline edit --------------------------------------------------------------------------

    /// Opens the edit panel on a cell, finishing an open session first.
    pub fn edit_cell(&mut self, row_key: &str, col_key: &str) -> Result<(), GridError> {
        if self.state.inline_edit.is_panel_visible {
            self.finish_inline_edit(FinishReason::LoosedFocus)?;
        }
        open_inline_edit(&mut self.state, row_key, col_key);
        Ok(())
    }

    /// Ends the open edit session.
    ///
    /// The panel's value is committed when `reason` and the panel allow it, which emits
    /// `cellchange` and rebuilds the rows before focus moves.
    pub fn finish_inline_edit(&mut self, reason: FinishReason) -> Result<(), GridError> {
        if !self.state.inline_edit.is_panel_visible {
            return Ok(());
        }
        let panel = self.host.edit_panel();
        if let Some(draft_values) = commit_inline_edit(&mut self.state, reason, &panel) {
            self.fire(DatatableEvent::CellChange { draft_values });
            update_rows_and_cell_indexes(&mut self.state, &self.registry)?;
        }
        let effects = conclude_inline_edit(&mut self.state, reason);
        self.schedule(effects);
        Ok(())
    }

    /// The "apply to all selected rows" checkbox changed.
    pub fn handle_mass_checkbox_change(&mut self, checked: bool) {
        handle_mass_checkbox_change(&mut self.state, checked);
    }

    /// The status bar's save button was pressed.
    pub fn save(&mut self) -> Result<(), GridError> {
        self.finish_inline_edit(FinishReason::LoosedFocus)?;
        let draft_values = self.draft_values();
        self.fire(DatatableEvent::Save { draft_values });
        Ok(())
    }

    /// The status bar's cancel button was pressed.
    ///
    /// Unless the host prevents the `cancel` event, every pending edit and error is dropped.
    pub fn cancel(&mut self) -> Result<(), GridError> {
        self.finish_inline_edit(FinishReason::LoosedFocus)?;
        if self.fire(DatatableEvent::Cancel) == EventOutcome::Continue {
            cancel_inline_edit(&mut self.state);
            update_rows_and_cell_indexes(&mut self.state, &self.registry)?;
        }
        Ok(())
    }

    // --- overlays -----------------------------------------------------------------------------

    /// Shows a help bubble for `anchor`, kept inside the table's visible area.
    pub fn show_help<S: OverlayService + ?Sized>(
        &self,
        tooltip: &mut HelpTooltip,
        overlays: &mut S,
        anchor: Rect,
        bubble_size: Size,
    ) -> OverlayHandle {
        tooltip.show(overlays, anchor, self.host.viewable_rect(), bubble_size)
    }

    /// Moves a shown help bubble after its anchor moved.
    pub fn reposition_help<S: OverlayService + ?Sized>(
        &self,
        tooltip: &mut HelpTooltip,
        overlays: &mut S,
        anchor: Rect,
    ) -> bool {
        tooltip.reposition(overlays, anchor, self.host.viewable_rect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::keyboard::{ActiveCell, CellPosition};
    use crate::keys::RowPosition;
    use crate::overlay::{OverlayPool, VerticalPlacement};
    use serde_json::json;
    use std::time::Duration;

    /// Records every event and answers from canned values.
    #[derive(Debug, Default)]
    pub(crate) struct MockHost {
        pub(crate) events: Vec<DatatableEvent>,
        pub(crate) width: u32,
        pub(crate) metrics: ScrollMetrics,
        pub(crate) panel: PanelResult,
        pub(crate) prevent_cancel: bool,
    }

    impl MockHost {
        pub(crate) fn new() -> Self {
            Self {
                width: 600,
                ..Self::default()
            }
        }

        pub(crate) fn names(&self) -> Vec<&'static str> {
            self.events.iter().map(DatatableEvent::name).collect()
        }
    }

    impl GridHost for MockHost {
        fn available_width(&self) -> u32 {
            self.width
        }

        fn scroll_metrics(&self) -> ScrollMetrics {
            self.metrics
        }

        fn viewable_rect(&self) -> Rect {
            Rect::new(0.0, 0.0, f64::from(self.width), 400.0)
        }

        fn edit_panel(&self) -> PanelResult {
            self.panel.clone()
        }

        fn dispatch(&mut self, event: DatatableEvent) -> EventOutcome {
            let prevent = self.prevent_cancel && event == DatatableEvent::Cancel;
            self.events.push(event);
            if prevent {
                EventOutcome::PreventDefault
            } else {
                EventOutcome::Continue
            }
        }
    }

    fn options() -> Options {
        Options::from_value(json!({
            "keyField": "id",
            "columns": [
                { "label": "Name", "fieldName": "name", "type": "text", "editable": true },
                { "label": "Amount", "fieldName": "amount", "type": "number",
                  "actions": [{ "label": "Reset", "name": "reset" }] },
                { "label": "Open", "type": "button", "typeAttributes": { "label": "Open" } },
            ],
            "data": [
                { "id": "a", "name": "Alpha", "amount": 10 },
                { "id": "b", "name": "Bravo", "amount": 20 },
                { "id": "c", "name": "Charlie", "amount": 30 },
            ],
        }))
        .unwrap()
    }

    fn grid() -> Datatable<MockHost> {
        let mut grid = Datatable::from_options(MockHost::new(), &options()).unwrap();
        grid.after_render();
        grid.host_mut().events.clear();
        grid
    }

    #[test]
    fn options_build_a_complete_state() {
        let grid = grid();
        let state = grid.state();
        // row number (editable column), checkbox, three customer columns
        assert_eq!(state.columns.len(), 5);
        assert_eq!(state.rows.len(), 3);
        assert_eq!(
            state.keyboard.active_cell,
            Some(ActiveCell::new(RowId::row("a"), "name-text"))
        );
        assert_eq!(state.rows[0].cells[2].tab_index, 0, "active cell is the tab stop");
        assert!(has_defined_column_widths(state));
    }

    #[test]
    fn first_render_lays_out_and_reports_widths() {
        let mut grid = Datatable::from_options(MockHost::new(), &options()).unwrap();
        assert!(!has_defined_column_widths(grid.state()));
        grid.after_render();
        let DatatableEvent::Resize { column_widths } = &grid.host().events[0] else {
            panic!("expected a resize event, got {:?}", grid.host().events);
        };
        assert_eq!(column_widths.len(), 3, "customer columns only");

        grid.after_render();
        assert_eq!(grid.host().events.len(), 1, "later renders keep the layout");
    }

    #[test]
    fn invalid_sort_direction_is_an_error() {
        let mut grid = grid();
        assert!(grid.set_sorted_direction("sideways").is_err());
        grid.set_sorted_by(Some("amount"));
        grid.set_sorted_direction("desc").unwrap();
        assert_eq!(grid.state().sort.sorted_direction, Some(SortDirection::Desc));
    }

    #[test]
    fn selection_changes_are_reported() {
        let mut grid = grid();
        grid.handle_select_row("b", false);
        grid.handle_select_row("c", true);
        let Some(DatatableEvent::RowSelection { selected_rows }) = grid.host().events.last() else {
            panic!("expected rowselection");
        };
        assert_eq!(selected_rows.len(), 2);
        assert_eq!(selected_rows[0]["id"], json!("b"));

        grid.handle_deselect_all_rows();
        assert!(grid.selected_rows().is_empty());
        assert_eq!(grid.host().names(), ["rowselection", "rowselection", "rowselection"]);
    }

    #[test]
    fn removed_rows_leave_the_selection() {
        let mut grid = grid();
        grid.set_selected_rows(&json!(["a", "c"]));
        grid.after_render();
        grid.host_mut().events.clear();

        grid.set_data(&json!([{ "id": "a", "name": "Alpha" }])).unwrap();
        let Some(DatatableEvent::RowSelection { selected_rows }) = grid.host().events.last() else {
            panic!("expected rowselection, got {:?}", grid.host().events);
        };
        assert_eq!(selected_rows.len(), 1);
    }

    #[test]
    fn selected_rows_survive_until_the_next_render() {
        let mut grid = grid();
        grid.set_selected_rows(&json!(["d"]));
        grid.set_data(&json!([{ "id": "d", "name": "Delta" }])).unwrap();
        assert_eq!(grid.selected_rows().len(), 1, "keys set before the data arrived apply");
    }

    #[test]
    fn max_row_selection_resets_a_selection() {
        let mut grid = grid();
        grid.set_max_row_selection(&json!(2));
        assert!(grid.host().events.is_empty(), "nothing was selected");
        grid.handle_select_row("a", false);
        grid.set_max_row_selection(&json!(1));
        assert_eq!(grid.host().names(), ["rowselection", "rowselection"]);
        assert!(grid.selected_rows().is_empty());
    }

    #[test]
    fn keyboard_focus_moves_wait_for_the_render() {
        let mut grid = grid();
        grid.handle_focus_in();
        let _ = grid.after_render();
        assert!(grid.handle_table_keydown(Key::ArrowDown));
        let effects = grid.after_render();
        assert!(effects.iter().any(|e| matches!(
            e,
            FocusEffect::FocusCell { position, .. }
                if *position == CellPosition::new(RowPosition::Row(1), 2)
        )));
        assert!(grid.after_render().is_empty(), "effects are delivered once");
    }

    #[test]
    fn disconnected_grid_drops_focus_work() {
        let mut grid = grid();
        grid.handle_focus_in();
        grid.disconnect();
        grid.handle_table_keydown(Key::ArrowDown);
        assert!(grid.after_render().is_empty());
        assert!(grid.is_disconnected());

        grid.reconnect();
        grid.handle_table_keydown(Key::ArrowDown);
        assert!(!grid.after_render().is_empty());
    }

    #[test]
    fn deleting_the_focused_row_moves_focus() {
        let mut grid = grid();
        grid.handle_focus_in();
        grid.handle_cell_click(&RowId::row("c"), "amount-number");
        grid.after_render();

        grid.set_data(&json!([
            { "id": "a", "name": "Alpha", "amount": 10 },
            { "id": "b", "name": "Bravo", "amount": 20 },
        ]))
        .unwrap();
        let active = grid.state().keyboard.active_cell.clone().unwrap();
        assert_eq!(active.row, RowId::row("b"), "clamped to the new last row");
        let effects = grid.after_render();
        assert!(effects.iter().any(|e| matches!(e, FocusEffect::FocusCell { .. })));
        assert!(grid.state().keyboard.cell_to_focus_next.is_none());
    }

    #[test]
    fn inline_edit_commits_and_reports() {
        let mut grid = grid();
        grid.host_mut().panel = PanelResult {
            value: Some(json!("Alfa")),
            valid: true,
            mass_edit_checked: false,
        };
        grid.edit_cell("a", "name-text").unwrap();
        grid.finish_inline_edit(FinishReason::SubmitAction).unwrap();

        let Some(DatatableEvent::CellChange { draft_values }) = grid.host().events.first() else {
            panic!("expected cellchange");
        };
        assert_eq!(draft_values[0]["name"], json!("Alfa"));
        assert_eq!(draft_values[0]["id"], json!("a"));
        let cell = &grid.state().rows[0].cells[2];
        assert_eq!(cell.value, Some(json!("Alfa")), "the rebuild shows the dirty value");
        assert!(grid.show_status_bar());
        assert!(!grid.state().inline_edit.is_panel_visible);
    }

    #[test]
    fn opening_an_edit_finishes_the_open_one() {
        let mut grid = grid();
        grid.host_mut().panel = PanelResult {
            value: Some(json!("Alfa")),
            valid: true,
            mass_edit_checked: false,
        };
        grid.edit_cell("a", "name-text").unwrap();
        grid.edit_cell("b", "name-text").unwrap();
        assert_eq!(grid.host().names(), ["cellchange"], "no edit is lost");
        assert_eq!(grid.state().inline_edit.row_key.as_deref(), Some("b"));
    }

    #[test]
    fn save_and_cancel() {
        let mut grid = grid();
        grid.set_draft_values(&json!([{ "id": "b", "name": "Beta" }])).unwrap();
        grid.save().unwrap();
        let Some(DatatableEvent::Save { draft_values }) = grid.host().events.last() else {
            panic!("expected save");
        };
        assert_eq!(draft_values.len(), 1);

        grid.host_mut().prevent_cancel = true;
        grid.cancel().unwrap();
        assert_eq!(grid.draft_values().len(), 1, "prevented cancel keeps the drafts");

        grid.host_mut().prevent_cancel = false;
        grid.cancel().unwrap();
        assert!(grid.draft_values().is_empty());
        assert_eq!(grid.state().rows[1].cells[2].value, Some(json!("Bravo")));
    }

    #[test]
    fn scrolling_closes_the_panel() {
        let mut grid = grid();
        grid.edit_cell("a", "name-text").unwrap();
        grid.handle_vertical_scroll(100.0).unwrap();
        grid.handle_vertical_scroll(103.0).unwrap();
        assert!(grid.state().inline_edit.is_panel_visible);
        grid.handle_vertical_scroll(110.0).unwrap();
        assert!(!grid.state().inline_edit.is_panel_visible);
    }

    #[test]
    fn infinite_loading_asks_for_more() {
        let mut grid = grid();
        grid.set_enable_infinite_loading(&json!(true));
        grid.host_mut().metrics = ScrollMetrics {
            scroll_height: 1000.0,
            client_height: 400.0,
            scroll_top: 590.0,
            visible: true,
        };
        grid.handle_vertical_scroll(590.0).unwrap();
        assert_eq!(grid.host().names(), ["loadmore"]);

        grid.set_is_loading(&json!(true));
        grid.handle_vertical_scroll(595.0).unwrap();
        assert_eq!(grid.host().events.len(), 1, "no second request while loading");
    }

    #[test]
    fn short_content_prefetches_after_render() {
        let mut grid = grid();
        grid.set_enable_infinite_loading(&json!(true));
        grid.host_mut().metrics = ScrollMetrics {
            scroll_height: 120.0,
            client_height: 400.0,
            scroll_top: 0.0,
            visible: true,
        };
        grid.after_render();
        assert_eq!(grid.host().names(), ["loadmore"]);
    }

    #[test]
    fn header_and_row_actions() {
        let mut grid = grid();
        let reset = HeaderAction {
            label: "Reset".into(),
            name: "reset".into(),
            ..HeaderAction::default()
        };
        grid.handle_header_action("amount-number", reset, ActionType::Customer);
        let Some(DatatableEvent::HeaderAction { column_definition, .. }) = grid.host().events.last()
        else {
            panic!("expected headeraction");
        };
        assert_eq!(column_definition.field_name.as_deref(), Some("amount"));

        grid.handle_cell_button_click("b", "4-button");
        let Some(DatatableEvent::RowAction { row, action }) = grid.host().events.last() else {
            panic!("expected rowaction");
        };
        assert_eq!(row["id"], json!("b"));
        assert_eq!(action, &json!({ "label": "Open" }));

        let wrap = HeaderAction {
            name: crate::header_actions::WRAP_TEXT_ACTION.into(),
            ..HeaderAction::default()
        };
        grid.handle_header_action("name-text", wrap, ActionType::Internal);
        assert!(grid.state().rows[0].cells[2].wrap_text);
        assert_eq!(grid.host().events.len(), 2, "internal actions stay internal");
    }

    #[test]
    fn resize_drag_reports_customer_widths() {
        let mut grid = grid();
        let before = customer_column_widths(grid.state());
        grid.handle_resize_column(InternalColumnIndex(2), 0);
        assert!(grid.host().events.is_empty(), "zero deltas are ignored");
        grid.handle_resize_column(InternalColumnIndex(2), 40);
        let Some(DatatableEvent::Resize { column_widths }) = grid.host().events.last() else {
            panic!("expected resize");
        };
        assert_eq!(column_widths[0], before[0] + 40);
    }

    #[test]
    fn resize_observations_are_debounced() {
        let mut grid = grid();
        let start = Instant::now();
        grid.host_mut().width = 900;
        grid.observe_resize(start);
        grid.observe_resize(start + Duration::from_millis(100));
        assert!(!grid.poll_resize(start + Duration::from_millis(250)));
        assert!(grid.poll_resize(start + Duration::from_millis(301)));
        assert_eq!(grid.state().resizer.table_width, 900);
    }

    #[test]
    fn help_bubbles_stay_in_the_table() {
        let grid = grid();
        let mut pool = OverlayPool::new();
        let mut help = HelpTooltip::new("Total in euros");
        let handle = grid.show_help(
            &mut help,
            &mut pool,
            Rect::new(20.0, 5.0, 36.0, 21.0),
            Size::new(120.0, 30.0),
        );
        let bubble = pool.bubble(handle).unwrap();
        assert_eq!(bubble.placement.vertical, VerticalPlacement::Below);
        assert!(grid.reposition_help(&mut help, &mut pool, Rect::new(20.0, 200.0, 36.0, 216.0)));
        assert_eq!(pool.bubble(handle).unwrap().placement.vertical, VerticalPlacement::Above);
    }

    #[test]
    fn missing_key_field_degrades_quietly() {
        let mut grid = Datatable::new(MockHost::new());
        grid.set_columns(serde_json::from_value(json!([{ "fieldName": "name" }])).unwrap())
            .unwrap();
        grid.set_data(&json!([{ "name": "x" }])).unwrap();
        assert!(grid.state().rows.is_empty(), "rows wait for a key field");
        assert!(grid.set_key_field(&json!(3)).is_err());
        grid.set_key_field(&json!("name")).unwrap();
        assert_eq!(grid.state().rows[0].key, "x");
    }
}
