// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyboard navigation and focus bookkeeping.
//!
//! ## Modes
//!
//! - [`KeyboardMode::Navigation`]: the active cell (or row) wrapper has focus. Arrow keys move
//!   between cells and Enter or Space switch to action mode.
//! - [`KeyboardMode::Action`]: a control inside the active cell has focus. Tab walks through the
//!   cells of the grid until it reaches an exit cell, and Escape returns to navigation mode.
//!
//! Row mode is orthogonal and only available while a tree column exists. The focus unit is then
//! the whole row: Left and Right collapse or expand it, Up and Down move between rows.
//!
//! ## Effects
//!
//! Nothing here touches a rendering surface. Reactions mutate [`GridState`] and describe what the
//! host must do afterwards as [`FocusEffect`]s, which the orchestrator delivers once the next
//! render has settled.
//!
//! ## Tab index
//!
//! Exactly one cell (or row, in row mode) carries tab index `0`: the active one. Every reaction
//! that moves the active cell lowers the old one to `-1` before raising the new one.

use crate::columns::{Column, state_tree_column};
use crate::keys::{RowId, RowPosition};
use crate::rows::row_by_key;
use crate::state::GridState;

/// Keyboard interaction mode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum KeyboardMode {
    /// The cell or row wrapper has focus.
    #[default]
    Navigation,
    /// A control inside the active cell has focus.
    Action,
}

/// The focused cell, by identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveCell {
    /// Row of the cell.
    pub row: RowId,
    /// Column key of the cell.
    pub col_key: String,
}

impl ActiveCell {
    /// Creates an active cell.
    pub fn new(row: RowId, col_key: impl Into<String>) -> Self {
        Self {
            row,
            col_key: col_key.into(),
        }
    }
}

/// A cell, by position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellPosition {
    /// Row of the cell.
    pub row: RowPosition,
    /// Internal column index of the cell.
    pub col: usize,
}

impl CellPosition {
    /// Creates a position.
    pub fn new(row: RowPosition, col: usize) -> Self {
        Self { row, col }
    }
}

/// Keyboard slice of [`GridState`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyboardState {
    /// Current mode.
    pub mode: KeyboardMode,
    /// Whether rows, not cells, are the focus unit.
    pub row_mode: bool,
    /// The focused cell.
    pub active_cell: Option<ActiveCell>,
    /// Whether focus is inside the grid.
    pub focus_inside: bool,
    /// Position to fall back to when the active cell disappears in the next rebuild.
    pub cell_to_focus_next: Option<CellPosition>,
    /// Set when a click gave a cell focus before the grid saw a focus-in.
    pub cell_clicked: bool,
}

/// How a cell should pick its focused inner control when it receives focus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NavigationDirection {
    /// Coming from the left neighbour.
    Right,
    /// Coming from the right neighbour.
    Left,
    /// Start over from the first control.
    Reset,
    /// Keep the current control.
    UseCurrent,
}

/// Why a cell entered its current mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellAction {
    /// Enter was pressed.
    Enter,
    /// Space was pressed.
    Space,
    /// Tab moved focus into the cell.
    Tab,
}

/// Side effect the host must apply after a keyboard or focus reaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FocusEffect {
    /// Focus a cell, scroll it into view and put it in `mode`.
    FocusCell {
        /// The cell.
        position: CellPosition,
        /// Mode the cell should adopt.
        mode: KeyboardMode,
        /// How the cell picks its inner control.
        direction: Option<NavigationDirection>,
        /// What triggered the focus.
        action: Option<CellAction>,
    },
    /// Blur a cell and drop its focus styles.
    BlurCell {
        /// The cell.
        position: CellPosition,
    },
    /// Focus a row and scroll it into view.
    FocusRow {
        /// Row index.
        row: usize,
    },
    /// Blur a row.
    BlurRow {
        /// Row index.
        row: usize,
    },
    /// Switch a cell between navigation and action mode without moving focus.
    SetCellMode {
        /// The cell.
        position: CellPosition,
        /// New mode.
        mode: KeyboardMode,
        /// What triggered the switch.
        action: Option<CellAction>,
    },
    /// Draw focus styles on a cell without focusing it.
    ShowFocusStyles {
        /// The cell.
        position: CellPosition,
    },
    /// Remove focus styles from a cell.
    HideFocusStyles {
        /// The cell.
        position: CellPosition,
    },
    /// Expand or collapse a tree row.
    ToggleRow {
        /// Key of the row.
        row_key: String,
        /// Requested expansion state.
        next_expanded: bool,
    },
}

/// Keys the grid reacts to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Key {
    /// Left arrow.
    ArrowLeft,
    /// Right arrow.
    ArrowRight,
    /// Up arrow.
    ArrowUp,
    /// Down arrow.
    ArrowDown,
    /// Enter.
    Enter,
    /// Space.
    Space,
    /// Escape.
    Escape,
    /// Tab, with or without shift.
    Tab {
        /// Whether shift was held.
        shift: bool,
    },
}

/// Horizontal direction of a Tab move.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TabDirection {
    /// Shift+Tab.
    Left,
    /// Tab.
    Right,
}

/// Outcome of a key reaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyReaction {
    /// Effects for the host, in order.
    pub effects: Vec<FocusEffect>,
    /// Whether the host should suppress the key's default behavior and propagation.
    pub consumed: bool,
}

/// Makes `row`/`col_key` the active cell.
pub fn update_active_cell(state: &mut GridState, row: RowId, col_key: impl Into<String>) {
    state.keyboard.active_cell = Some(ActiveCell::new(row, col_key));
}

/// Whether `row`/`col_key` is the active cell.
pub fn is_active_cell(state: &GridState, row: &RowId, col_key: &str) -> bool {
    state
        .keyboard
        .active_cell
        .as_ref()
        .is_some_and(|active| active.row == *row && active.col_key == col_key)
}

/// Position of the cell `row`/`col_key`, if it exists.
pub fn indexes_by_keys(state: &GridState, row: &RowId, col_key: &str) -> Option<CellPosition> {
    match row {
        RowId::Header => state
            .header_indexes
            .internal_index(col_key)
            .map(|col| CellPosition::new(RowPosition::Header, col.0)),
        RowId::Row(key) => state
            .indexes
            .get(key)?
            .cell(col_key)
            .map(|(row, col)| CellPosition::new(RowPosition::Row(row), col)),
    }
}

/// Position of the active cell, if it still exists.
pub fn active_cell_position(state: &GridState) -> Option<CellPosition> {
    let active = state.keyboard.active_cell.as_ref()?;
    indexes_by_keys(state, &active.row, &active.col_key)
}

/// Whether the active cell still resolves against the current indexes.
pub fn still_valid_active_cell(state: &GridState) -> bool {
    active_cell_position(state).is_some()
}

/// Whether focus is inside the grid.
pub fn datatable_has_focus(state: &GridState) -> bool {
    state.keyboard.focus_inside || state.keyboard.cell_clicked
}

fn row_id_at(state: &GridState, row: RowPosition) -> Option<RowId> {
    match row {
        RowPosition::Header => Some(RowId::Header),
        RowPosition::Row(index) => state.rows.get(index).map(|r| RowId::Row(r.key.clone())),
    }
}

fn cell_at(state: &GridState, position: CellPosition) -> Option<ActiveCell> {
    let column = state.columns.get(position.col)?;
    Some(ActiveCell::new(
        row_id_at(state, position.row)?,
        column.col_key.clone(),
    ))
}

/// First data row (or the header) at the first customer column (or column 0).
pub fn default_active_cell(state: &GridState) -> Option<ActiveCell> {
    let col = state
        .columns
        .iter()
        .position(|c| !c.internal)
        .unwrap_or(0);
    let column = state.columns.get(col)?;
    let row = match state.rows.first() {
        Some(row) => RowId::Row(row.key.clone()),
        None => RowId::Header,
    };
    Some(ActiveCell::new(row, column.col_key.clone()))
}

fn set_next_active_cell_from_prev(state: &mut GridState, prev: CellPosition) {
    let rows = state.rows.len();
    let row = match prev.row {
        RowPosition::Row(index) if index >= rows => match rows.checked_sub(1) {
            Some(last) => RowPosition::Row(last),
            None => RowPosition::Header,
        },
        other => other,
    };
    let col = prev.col.min(state.columns.len().saturating_sub(1));
    state.keyboard.active_cell =
        cell_at(state, CellPosition::new(row, col)).or_else(|| default_active_cell(state));
    state.keyboard.mode = KeyboardMode::Navigation;
}

/// Re-validates the active cell after data or columns changed.
///
/// A still valid cell is kept. Otherwise the cell recorded by [`set_cell_to_focus_from_prev`]
/// is adopted (clamped to the new bounds) and the mode drops back to navigation. Without one,
/// [`default_active_cell`] is used.
pub fn sync_active_cell(state: &mut GridState) {
    if state.keyboard.active_cell.is_some() && still_valid_active_cell(state) {
        return;
    }
    match (&state.keyboard.active_cell, state.keyboard.cell_to_focus_next) {
        (Some(_), Some(prev)) => set_next_active_cell_from_prev(state, prev),
        _ => state.keyboard.active_cell = default_active_cell(state),
    }
}

/// Records where focus should go if the active cell disappears in the coming rebuild.
///
/// Only applies while the grid has focus. The hint points at the first column of the active row,
/// or at the last column when the active row is the last one.
pub fn set_cell_to_focus_from_prev(state: &mut GridState) {
    if state.keyboard.cell_to_focus_next.is_some() || !datatable_has_focus(state) {
        return;
    }
    let Some(position) = active_cell_position(state) else {
        return;
    };
    let mut next = CellPosition::new(position.row, 0);
    if position.row.index().is_some_and(|row| row + 1 == state.rows.len()) {
        next.col = state.columns.len().saturating_sub(1);
    }
    state.keyboard.cell_to_focus_next = Some(next);
}

/// Drops the fallback hint when the active cell survived the rebuild.
pub fn update_cell_to_focus_from_prev(state: &mut GridState) {
    if state.keyboard.cell_to_focus_next.is_some() && still_valid_active_cell(state) {
        state.keyboard.cell_to_focus_next = None;
    }
}

/// Drops the fallback hint. Called once a render completed.
pub fn reset_cell_to_focus_from_prev(state: &mut GridState) {
    state.keyboard.cell_to_focus_next = None;
}

/// Sets the tab index of a header or body cell.
pub fn update_tab_index(state: &mut GridState, position: CellPosition, index: i32) {
    match position.row {
        RowPosition::Header => {
            if let Some(column) = state.columns.get_mut(position.col) {
                column.tab_index = index;
            }
        }
        RowPosition::Row(row) => {
            if let Some(cell) = state
                .rows
                .get_mut(row)
                .and_then(|r| r.cells.get_mut(position.col))
            {
                cell.tab_index = index;
            }
        }
    }
}

/// Sets the tab index of a body row. The header row has none.
pub fn update_tab_index_row(state: &mut GridState, row: RowPosition, index: i32) {
    if let Some(row) = row.index().and_then(|r| state.rows.get_mut(r)) {
        row.tab_index = index;
    }
}

/// Re-asserts the tab index of the active cell, in cell mode.
pub fn update_tab_index_active_cell(state: &mut GridState, index: i32) {
    if state.keyboard.active_cell.is_some() && !still_valid_active_cell(state) {
        sync_active_cell(state);
    }
    if is_row_navigation_mode(state) {
        return;
    }
    if let Some(position) = active_cell_position(state) {
        update_tab_index(state, position, index);
    }
}

/// Re-asserts the tab index of the active row, in row mode.
pub fn update_tab_index_active_row(state: &mut GridState, index: i32) {
    if state.keyboard.active_cell.is_some() && !still_valid_active_cell(state) {
        sync_active_cell(state);
    }
    if !is_row_navigation_mode(state) {
        return;
    }
    if let Some(position) = active_cell_position(state) {
        update_tab_index_row(state, position.row, index);
    }
}

/// Enters row mode when a tree column appears and leaves it when the last one goes.
pub fn update_row_navigation_mode(had_tree_data_type_previously: bool, state: &mut GridState) {
    if !state.columns.iter().any(Column::is_tree) {
        state.keyboard.row_mode = false;
    } else if !state.keyboard.row_mode && !had_tree_data_type_previously {
        state.keyboard.row_mode = true;
    }
}

/// Whether rows are the focus unit right now.
pub fn is_row_navigation_mode(state: &GridState) -> bool {
    state.keyboard.mode == KeyboardMode::Navigation && state.keyboard.row_mode
}

/// Whether row mode could be entered.
pub fn can_be_row_navigation_mode(state: &GridState) -> bool {
    state_tree_column(state).is_some() && state.keyboard.mode == KeyboardMode::Navigation
}

/// Enters row mode, if possible.
pub fn set_row_navigation_mode(state: &mut GridState) {
    if can_be_row_navigation_mode(state) {
        state.keyboard.row_mode = true;
    }
}

/// Leaves row mode.
pub fn unset_row_navigation_mode(state: &mut GridState) {
    state.keyboard.row_mode = false;
}

/// Raises the active cell's tab index and asks the host to focus it.
pub fn set_focus_active_cell(
    state: &mut GridState,
    direction: Option<NavigationDirection>,
    action: Option<CellAction>,
    effects: &mut Vec<FocusEffect>,
) {
    let Some(position) = active_cell_position(state) else {
        return;
    };
    update_tab_index(state, position, 0);
    effects.push(FocusEffect::FocusCell {
        position,
        mode: state.keyboard.mode,
        direction,
        action,
    });
}

/// Lowers the active cell's tab index and asks the host to blur it.
pub fn set_blur_active_cell(state: &mut GridState, effects: &mut Vec<FocusEffect>) {
    if let Some(position) = active_cell_position(state) {
        effects.push(FocusEffect::BlurCell { position });
        update_tab_index(state, position, -1);
    }
}

/// Raises the active row's tab index and asks the host to focus it.
pub fn set_focus_active_row(state: &mut GridState, effects: &mut Vec<FocusEffect>) {
    if let Some(row) = active_cell_position(state).and_then(|p| p.row.index()) {
        update_tab_index_row(state, RowPosition::Row(row), 0);
        effects.push(FocusEffect::FocusRow { row });
    }
}

/// Lowers the active row's tab index and asks the host to blur it.
pub fn set_blur_active_row(state: &mut GridState, effects: &mut Vec<FocusEffect>) {
    if let Some(row) = active_cell_position(state).and_then(|p| p.row.index()) {
        effects.push(FocusEffect::BlurRow { row });
        update_tab_index_row(state, RowPosition::Row(row), -1);
    }
}

fn next_index_up(row: RowPosition) -> Option<RowPosition> {
    match row {
        RowPosition::Header => None,
        RowPosition::Row(0) => Some(RowPosition::Header),
        RowPosition::Row(index) => Some(RowPosition::Row(index - 1)),
    }
}

fn next_index_down(state: &GridState, row: RowPosition) -> Option<RowPosition> {
    let next = row.index().map_or(0, |index| index + 1);
    (next < state.rows.len()).then_some(RowPosition::Row(next))
}

fn next_index_up_wrapped(state: &GridState, row: RowPosition) -> RowPosition {
    match row {
        RowPosition::Row(0) => RowPosition::Header,
        RowPosition::Row(index) => RowPosition::Row(index - 1),
        RowPosition::Header => match state.rows.len().checked_sub(1) {
            Some(last) => RowPosition::Row(last),
            None => RowPosition::Header,
        },
    }
}

fn next_index_down_wrapped(state: &GridState, row: RowPosition) -> RowPosition {
    next_index_down(state, row).unwrap_or(RowPosition::Header)
}

/// Where Tab (or Shift+Tab) would move the active cell, wrapping across rows.
pub fn next_tab_position(state: &GridState, direction: TabDirection) -> Option<CellPosition> {
    let CellPosition { row, col } = active_cell_position(state)?;
    let columns = state.columns.len();
    Some(match direction {
        TabDirection::Right if col + 1 < columns => CellPosition::new(row, col + 1),
        TabDirection::Right => CellPosition::new(next_index_down_wrapped(state, row), 0),
        TabDirection::Left if col > 0 => CellPosition::new(row, col - 1),
        TabDirection::Left => CellPosition::new(
            next_index_up_wrapped(state, row),
            columns.saturating_sub(1),
        ),
    })
}

/// Whether tabbing in `direction` would leave the grid instead of wrapping.
///
/// The first header cell is an exit cell moving left and the last body cell is one moving right.
pub fn is_active_cell_an_exit_cell(state: &GridState, direction: TabDirection) -> bool {
    let (Some(current), Some(next)) = (
        active_cell_position(state),
        next_tab_position(state, direction),
    ) else {
        return false;
    };
    let header = RowPosition::Header;
    (current.row == header && current.col == 0 && next.row != header && next.col != 0)
        || (current.row != header && next.row == header && next.col == 0)
}

fn move_active_cell(
    state: &mut GridState,
    next: ActiveCell,
    direction: NavigationDirection,
    action: Option<CellAction>,
    effects: &mut Vec<FocusEffect>,
) {
    set_blur_active_cell(state, effects);
    state.keyboard.active_cell = Some(next);
    set_focus_active_cell(state, Some(direction), action, effects);
}

fn react_to_tab_in(state: &mut GridState, direction: TabDirection, effects: &mut Vec<FocusEffect>) {
    let Some(next) = next_tab_position(state, direction).and_then(|p| cell_at(state, p)) else {
        return;
    };
    let nav = match direction {
        TabDirection::Left => NavigationDirection::Left,
        TabDirection::Right => NavigationDirection::Right,
    };
    move_active_cell(state, next, nav, Some(CellAction::Tab), effects);
}

/// Moves the active cell one step right, wrapping to the next row.
pub fn react_to_tab_right(state: &mut GridState, effects: &mut Vec<FocusEffect>) {
    react_to_tab_in(state, TabDirection::Right, effects);
}

/// Moves the active cell one step left, wrapping to the previous row.
pub fn react_to_tab_left(state: &mut GridState, effects: &mut Vec<FocusEffect>) {
    react_to_tab_in(state, TabDirection::Left, effects);
}

fn react_to_arrow_right(state: &mut GridState, row: &RowId, col_key: &str, out: &mut KeyReaction) {
    let Some(position) = indexes_by_keys(state, row, col_key) else {
        return;
    };
    let Some(column) = state.columns.get(position.col + 1) else {
        return;
    };
    let next = ActiveCell::new(row.clone(), column.col_key.clone());
    move_active_cell(state, next, NavigationDirection::Right, None, &mut out.effects);
}

fn react_to_arrow_left(state: &mut GridState, row: &RowId, col_key: &str, out: &mut KeyReaction) {
    let Some(position) = indexes_by_keys(state, row, col_key) else {
        return;
    };
    if position.col == 0 && can_be_row_navigation_mode(state) {
        move_from_cell_to_row(state, &mut out.effects);
        return;
    }
    let Some(column) = position.col.checked_sub(1).and_then(|c| state.columns.get(c)) else {
        return;
    };
    let next = ActiveCell::new(row.clone(), column.col_key.clone());
    move_active_cell(state, next, NavigationDirection::Left, None, &mut out.effects);
}

fn react_to_vertical_arrow(
    state: &mut GridState,
    row: &RowId,
    col_key: &str,
    down: bool,
    out: &mut KeyReaction,
) {
    let Some(position) = indexes_by_keys(state, row, col_key) else {
        return;
    };
    let next = if down {
        next_index_down(state, position.row)
    } else {
        next_index_up(position.row)
    };
    let Some(next) = next else {
        return;
    };
    if state.hide_table_header && next == RowPosition::Header {
        return;
    }
    let Some(next_row) = row_id_at(state, next) else {
        return;
    };
    out.consumed = true;
    let next = ActiveCell::new(next_row, col_key);
    move_active_cell(state, next, NavigationDirection::UseCurrent, None, &mut out.effects);
}

fn react_to_enter(state: &mut GridState, key: Key, out: &mut KeyReaction) {
    if state.keyboard.mode != KeyboardMode::Navigation {
        return;
    }
    state.keyboard.mode = KeyboardMode::Action;
    out.consumed = true;
    let Some(position) = active_cell_position(state) else {
        return;
    };
    let action = if key == Key::Space {
        CellAction::Space
    } else {
        CellAction::Enter
    };
    out.effects.push(FocusEffect::SetCellMode {
        position,
        mode: KeyboardMode::Action,
        action: Some(action),
    });
    update_tab_index(state, position, -1);
}

fn set_mode_active_cell(state: &GridState, effects: &mut Vec<FocusEffect>) {
    if let Some(position) = active_cell_position(state) {
        effects.push(FocusEffect::SetCellMode {
            position,
            mode: state.keyboard.mode,
            action: None,
        });
    }
}

fn react_to_escape(state: &mut GridState, out: &mut KeyReaction) {
    if state.keyboard.mode != KeyboardMode::Action {
        return;
    }
    out.consumed = true;
    state.keyboard.mode = KeyboardMode::Navigation;
    set_mode_active_cell(state, &mut out.effects);
    set_focus_active_cell(state, Some(NavigationDirection::Reset), None, &mut out.effects);
}

fn react_to_tab(state: &mut GridState, shift: bool, out: &mut KeyReaction) {
    if state.keyboard.mode != KeyboardMode::Action {
        return;
    }
    let direction = if shift {
        TabDirection::Left
    } else {
        TabDirection::Right
    };
    if is_active_cell_an_exit_cell(state, direction) {
        state.keyboard.mode = KeyboardMode::Navigation;
        set_mode_active_cell(state, &mut out.effects);
    } else {
        out.consumed = true;
        react_to_tab_in(state, direction, &mut out.effects);
    }
}

fn react(state: &mut GridState, row: &RowId, col_key: &str, key: Key, out: &mut KeyReaction) {
    match key {
        Key::ArrowRight => react_to_arrow_right(state, row, col_key, out),
        Key::ArrowLeft => react_to_arrow_left(state, row, col_key, out),
        Key::ArrowDown => react_to_vertical_arrow(state, row, col_key, true, out),
        Key::ArrowUp => react_to_vertical_arrow(state, row, col_key, false, out),
        Key::Enter | Key::Space => react_to_enter(state, key, out),
        Key::Escape => react_to_escape(state, out),
        Key::Tab { shift } => react_to_tab(state, shift, out),
    }
}

/// Reacts to a key pressed inside the cell `row`/`col_key`.
pub fn react_to_keyboard(state: &mut GridState, row: &RowId, col_key: &str, key: Key) -> KeyReaction {
    let mut out = KeyReaction::default();
    react(state, row, col_key, key, &mut out);
    out
}

/// Reacts to a key pressed while a cell wrapper itself has focus.
///
/// Escape is ignored; there is no action mode to leave. Arrow keys and Enter/Space are always
/// consumed so the page does not scroll.
pub fn react_to_keyboard_in_nav_mode(state: &mut GridState, key: Key) -> KeyReaction {
    let mut out = KeyReaction::default();
    let Some(active) = state.keyboard.active_cell.clone() else {
        return out;
    };
    if key == Key::Escape {
        return out;
    }
    react(state, &active.row, &active.col_key, key, &mut out);
    if !matches!(key, Key::Tab { .. }) {
        out.consumed = true;
    }
    out
}

/// Index of the nearest row above `row_index` one level up, if any.
pub fn row_parent(state: &GridState, row_level: u32, row_index: usize) -> Option<usize> {
    let parent_level = row_level.checked_sub(1)?;
    (0..row_index)
        .rev()
        .find(|i| {
            state
                .rows
                .get(*i)
                .and_then(|row| row.tree)
                .is_some_and(|tree| tree.level == parent_level)
        })
}

fn move_from_cell_to_row(state: &mut GridState, effects: &mut Vec<FocusEffect>) {
    set_blur_active_cell(state, effects);
    set_row_navigation_mode(state);
    set_focus_active_row(state, effects);
}

fn move_from_row_to_cell(state: &mut GridState, effects: &mut Vec<FocusEffect>) {
    set_blur_active_row(state, effects);
    unset_row_navigation_mode(state);
    set_focus_active_cell(state, Some(NavigationDirection::UseCurrent), None, effects);
}

fn move_to_row(state: &mut GridState, row: usize, col_key: String, effects: &mut Vec<FocusEffect>) {
    let Some(key) = state.rows.get(row).map(|r| r.key.clone()) else {
        return;
    };
    set_blur_active_row(state, effects);
    update_active_cell(state, RowId::Row(key), col_key);
    set_focus_active_row(state, effects);
}

/// Reacts to a key pressed while the row `row_key` has focus in row mode.
///
/// - Right expands a collapsed parent, otherwise moves into the row's cells.
/// - Left collapses an expanded parent, otherwise moves to the parent row.
/// - Down and Up move to the adjacent row without wrapping.
pub fn react_to_keyboard_on_row(state: &mut GridState, row_key: &str, key: Key) -> KeyReaction {
    let mut out = KeyReaction::default();
    if !is_row_navigation_mode(state) {
        return out;
    }
    let Some(tree) = row_by_key(state, row_key).map(|row| row.tree.unwrap_or_default()) else {
        return out;
    };
    let expanded = tree.is_expanded == Some(true);
    let tree_col_key = state_tree_column(state).map(|c| c.col_key.clone());
    let row_index = state.indexes.get(row_key).map(|entry| entry.row_index);

    match key {
        Key::ArrowRight => {
            if tree.has_children && !expanded {
                out.effects.push(FocusEffect::ToggleRow {
                    row_key: row_key.to_owned(),
                    next_expanded: true,
                });
            } else {
                move_from_row_to_cell(state, &mut out.effects);
            }
        }
        Key::ArrowLeft => {
            if tree.has_children && expanded {
                out.effects.push(FocusEffect::ToggleRow {
                    row_key: row_key.to_owned(),
                    next_expanded: false,
                });
            } else if let (Some(col_key), Some(parent)) = (
                tree_col_key,
                row_index.and_then(|i| row_parent(state, tree.level, i)),
            ) {
                move_to_row(state, parent, col_key, &mut out.effects);
            }
        }
        Key::ArrowDown => {
            out.consumed = true;
            if let (Some(col_key), Some(RowPosition::Row(next))) = (
                tree_col_key,
                row_index.map(|i| next_index_down_wrapped(state, RowPosition::Row(i))),
            ) {
                move_to_row(state, next, col_key, &mut out.effects);
            }
        }
        Key::ArrowUp => {
            out.consumed = true;
            if let (Some(col_key), Some(RowPosition::Row(prev))) = (
                tree_col_key,
                row_index.map(|i| next_index_up_wrapped(state, RowPosition::Row(i))),
            ) {
                move_to_row(state, prev, col_key, &mut out.effects);
            }
        }
        _ => {}
    }
    out
}

/// Makes `row`/`col_key` the active cell without moving focus.
pub fn set_active_cell(
    state: &mut GridState,
    row: &RowId,
    col_key: &str,
    effects: &mut Vec<FocusEffect>,
) {
    let Some(position) = indexes_by_keys(state, row, col_key) else {
        return;
    };
    set_blur_active_cell(state, effects);
    update_active_cell(state, row.clone(), col_key);
    effects.push(FocusEffect::ShowFocusStyles { position });
    update_tab_index(state, position, 0);
}

fn leave_row_mode_for_click(state: &mut GridState) {
    if state.keyboard.row_mode && state.keyboard.active_cell.is_some() {
        unset_row_navigation_mode(state);
        if let Some(position) = active_cell_position(state) {
            update_tab_index_row(state, position.row, -1);
        }
    }
}

/// The grid itself received focus: focus the active cell or row.
pub fn handle_table_focus(state: &mut GridState) -> Vec<FocusEffect> {
    let mut effects = Vec::new();
    if state.keyboard.active_cell.is_none() {
        return effects;
    }
    state.keyboard.focus_inside = true;
    if state.keyboard.row_mode {
        set_focus_active_row(state, &mut effects);
    } else {
        set_focus_active_cell(state, Some(NavigationDirection::UseCurrent), None, &mut effects);
    }
    effects
}

/// A cell took focus through a click on its content.
pub fn handle_cell_focus_by_click(state: &mut GridState, row: &RowId, col_key: &str) -> Vec<FocusEffect> {
    let mut effects = Vec::new();
    if !is_active_cell(state, row, col_key) {
        leave_row_mode_for_click(state);
        set_active_cell(state, row, col_key, &mut effects);
    }
    if !datatable_has_focus(state) {
        state.keyboard.cell_clicked = true;
    }
    effects
}

/// A click landed on the padding of the cell `row`/`col_key`.
///
/// Unlike [`handle_cell_focus_by_click`], a click in row mode always moves back to cell mode.
pub fn handle_cell_click(state: &mut GridState, row: &RowId, col_key: &str) -> Vec<FocusEffect> {
    let mut effects = Vec::new();
    if state.keyboard.row_mode || !is_active_cell(state, row, col_key) {
        leave_row_mode_for_click(state);
        set_active_cell(state, row, col_key, &mut effects);
    }
    if !datatable_has_focus(state) {
        state.keyboard.cell_clicked = true;
    }
    effects
}

/// A cell lost focus to something that is not a real focus move; take it back.
pub fn handle_false_cell_blur(state: &mut GridState, row: &RowId, col_key: &str) -> Vec<FocusEffect> {
    let mut effects = Vec::new();
    if !is_active_cell(state, row, col_key) {
        set_active_cell(state, row, col_key, &mut effects);
    }
    set_focus_active_cell(state, None, None, &mut effects);
    effects
}

/// Focus left an element of the grid. `moved_inside` tells whether it went to another one.
pub fn handle_datatable_focus_out(state: &mut GridState, moved_inside: bool) -> Vec<FocusEffect> {
    let mut effects = Vec::new();
    if moved_inside {
        return effects;
    }
    if let Some(position) = active_cell_position(state) {
        if state.keyboard.row_mode {
            update_tab_index_row(state, position.row, -1);
        } else {
            effects.push(FocusEffect::HideFocusStyles { position });
            update_tab_index(state, position, -1);
        }
    }
    state.keyboard.focus_inside = false;
    effects
}

/// Focus entered the grid.
pub fn handle_datatable_focus_in(state: &mut GridState) -> Vec<FocusEffect> {
    let mut effects = Vec::new();
    if datatable_has_focus(state) {
        return effects;
    }
    if !state.keyboard.row_mode {
        if let Some(position) = active_cell_position(state) {
            effects.push(FocusEffect::ShowFocusStyles { position });
            update_tab_index(state, position, 0);
        }
    }
    state.keyboard.focus_inside = true;
    state.keyboard.cell_clicked = false;
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::update_rows_and_cell_indexes;
    use crate::registry::TypeRegistry;
    use crate::testing::{build, fixture_columns, fixture_state};
    use serde_json::json;

    fn active(state: &GridState) -> (RowId, String) {
        let cell = state.keyboard.active_cell.clone().unwrap();
        (cell.row, cell.col_key)
    }

    fn synced() -> GridState {
        let mut state = fixture_state();
        sync_active_cell(&mut state);
        update_tab_index_active_cell(&mut state, 0);
        state
    }

    fn tree_state() -> GridState {
        let mut state = build(
            json!([
                {
                    "fieldName": "name",
                    "type": "tree",
                    "typeAttributes": {
                        "hasChildren": { "fieldName": "hasChildren" },
                        "isExpanded": { "fieldName": "isExpanded" },
                        "level": { "fieldName": "level" }
                    }
                },
                { "fieldName": "size", "type": "number" }
            ]),
            json!([
                { "id": "p", "name": "Parent", "hasChildren": true, "isExpanded": true, "level": 1 },
                { "id": "c1", "name": "Child 1", "level": 2 },
                { "id": "c2", "name": "Child 2", "level": 2 },
                { "id": "q", "name": "Closed", "hasChildren": true, "isExpanded": false, "level": 1 },
            ]),
        );
        update_row_navigation_mode(false, &mut state);
        sync_active_cell(&mut state);
        state
    }

    #[test]
    fn default_active_cell_is_first_row_first_customer_column() {
        let state = synced();
        assert_eq!(active(&state), (RowId::row("a"), "name-text".into()));
        assert_eq!(state.rows[0].cells[0].tab_index, 0);
    }

    #[test]
    fn default_active_cell_without_rows_is_the_header() {
        let mut state = build(fixture_columns(), json!([]));
        sync_active_cell(&mut state);
        assert_eq!(active(&state), (RowId::Header, "name-text".into()));
    }

    #[test]
    fn default_active_cell_skips_internal_columns() {
        let mut state = fixture_state();
        state.columns[0].internal = true;
        sync_active_cell(&mut state);
        assert_eq!(active(&state), (RowId::row("a"), "amount-number".into()));
    }

    #[test]
    fn valid_active_cell_survives_sync() {
        let mut state = synced();
        update_active_cell(&mut state, RowId::row("b"), "email-text");
        sync_active_cell(&mut state);
        assert_eq!(active(&state), (RowId::row("b"), "email-text".into()));
    }

    #[test]
    fn exit_cells_depend_on_direction() {
        let mut state = synced();
        update_active_cell(&mut state, RowId::Header, "name-text");
        assert!(is_active_cell_an_exit_cell(&state, TabDirection::Left));
        assert!(!is_active_cell_an_exit_cell(&state, TabDirection::Right));

        update_active_cell(&mut state, RowId::row("c"), "email-text");
        assert!(is_active_cell_an_exit_cell(&state, TabDirection::Right));
        assert!(!is_active_cell_an_exit_cell(&state, TabDirection::Left));
    }

    #[test]
    fn arrows_move_between_cells_and_swap_tab_index() {
        let mut state = synced();
        let reaction = react_to_keyboard(&mut state, &RowId::row("a"), "name-text", Key::ArrowRight);
        assert_eq!(active(&state), (RowId::row("a"), "amount-number".into()));
        assert_eq!(state.rows[0].cells[0].tab_index, -1);
        assert_eq!(state.rows[0].cells[1].tab_index, 0);
        assert_eq!(
            reaction.effects,
            vec![
                FocusEffect::BlurCell { position: CellPosition::new(RowPosition::Row(0), 0) },
                FocusEffect::FocusCell {
                    position: CellPosition::new(RowPosition::Row(0), 1),
                    mode: KeyboardMode::Navigation,
                    direction: Some(NavigationDirection::Right),
                    action: None,
                },
            ]
        );

        react_to_keyboard(&mut state, &RowId::row("a"), "amount-number", Key::ArrowDown);
        assert_eq!(active(&state), (RowId::row("b"), "amount-number".into()));
    }

    #[test]
    fn arrows_stop_at_the_edges() {
        let mut state = synced();
        let reaction = react_to_keyboard(&mut state, &RowId::row("a"), "name-text", Key::ArrowLeft);
        assert!(reaction.effects.is_empty(), "no column left of the first one");

        update_active_cell(&mut state, RowId::row("c"), "name-text");
        let reaction = react_to_keyboard(&mut state, &RowId::row("c"), "name-text", Key::ArrowDown);
        assert!(reaction.effects.is_empty(), "no row below the last one");
    }

    #[test]
    fn arrow_up_reaches_the_header_unless_hidden() {
        let mut state = synced();
        react_to_keyboard(&mut state, &RowId::row("a"), "name-text", Key::ArrowUp);
        assert_eq!(active(&state), (RowId::Header, "name-text".into()));
        assert_eq!(state.columns[0].tab_index, 0);

        let mut state = synced();
        state.hide_table_header = true;
        let reaction = react_to_keyboard(&mut state, &RowId::row("a"), "name-text", Key::ArrowUp);
        assert!(reaction.effects.is_empty());
        assert_eq!(active(&state), (RowId::row("a"), "name-text".into()));
    }

    #[test]
    fn enter_and_escape_switch_modes() {
        let mut state = synced();
        let reaction = react_to_keyboard_in_nav_mode(&mut state, Key::Enter);
        assert_eq!(state.keyboard.mode, KeyboardMode::Action);
        assert!(reaction.consumed);
        assert_eq!(state.rows[0].cells[0].tab_index, -1, "inner control is the tab stop");

        let reaction = react_to_keyboard(&mut state, &RowId::row("a"), "name-text", Key::Escape);
        assert_eq!(state.keyboard.mode, KeyboardMode::Navigation);
        assert_eq!(state.rows[0].cells[0].tab_index, 0);
        assert!(matches!(
            reaction.effects.last(),
            Some(FocusEffect::FocusCell { direction: Some(NavigationDirection::Reset), .. })
        ));
    }

    #[test]
    fn escape_is_ignored_in_nav_mode_handler() {
        let mut state = synced();
        state.keyboard.mode = KeyboardMode::Action;
        let reaction = react_to_keyboard_in_nav_mode(&mut state, Key::Escape);
        assert!(reaction.effects.is_empty());
        assert_eq!(state.keyboard.mode, KeyboardMode::Action);
    }

    #[test]
    fn tab_walks_cells_in_action_mode_and_wraps_rows() {
        let mut state = synced();
        state.keyboard.mode = KeyboardMode::Action;
        update_active_cell(&mut state, RowId::row("a"), "email-text");
        let reaction = react_to_keyboard(&mut state, &RowId::row("a"), "email-text", Key::Tab { shift: false });
        assert!(reaction.consumed);
        assert_eq!(active(&state), (RowId::row("b"), "name-text".into()));

        react_to_keyboard(&mut state, &RowId::row("b"), "name-text", Key::Tab { shift: true });
        assert_eq!(active(&state), (RowId::row("a"), "email-text".into()));
    }

    #[test]
    fn tab_at_exit_cell_leaves_action_mode() {
        let mut state = synced();
        state.keyboard.mode = KeyboardMode::Action;
        update_active_cell(&mut state, RowId::row("c"), "email-text");
        let reaction = react_to_keyboard(&mut state, &RowId::row("c"), "email-text", Key::Tab { shift: false });
        assert!(!reaction.consumed, "focus leaves the grid");
        assert_eq!(state.keyboard.mode, KeyboardMode::Navigation);
        assert_eq!(active(&state), (RowId::row("c"), "email-text".into()));
    }

    #[test]
    fn tab_is_ignored_in_navigation_mode() {
        let mut state = synced();
        let reaction = react_to_keyboard_in_nav_mode(&mut state, Key::Tab { shift: false });
        assert!(!reaction.consumed);
        assert_eq!(active(&state), (RowId::row("a"), "name-text".into()));
    }

    #[test]
    fn removed_active_row_falls_back_to_the_recorded_cell() {
        let mut state = synced();
        state.keyboard.focus_inside = true;
        update_active_cell(&mut state, RowId::row("c"), "name-text");
        set_cell_to_focus_from_prev(&mut state);
        assert_eq!(
            state.keyboard.cell_to_focus_next,
            Some(CellPosition::new(RowPosition::Row(2), 2)),
            "last row points at the last column"
        );

        state.data.pop();
        update_rows_and_cell_indexes(&mut state, &TypeRegistry::new()).unwrap();
        update_cell_to_focus_from_prev(&mut state);
        assert!(state.keyboard.cell_to_focus_next.is_some());
        state.keyboard.mode = KeyboardMode::Action;
        sync_active_cell(&mut state);
        assert_eq!(active(&state), (RowId::row("b"), "email-text".into()));
        assert_eq!(state.keyboard.mode, KeyboardMode::Navigation);
    }

    #[test]
    fn surviving_active_cell_drops_the_hint() {
        let mut state = synced();
        state.keyboard.focus_inside = true;
        set_cell_to_focus_from_prev(&mut state);
        update_rows_and_cell_indexes(&mut state, &TypeRegistry::new()).unwrap();
        update_cell_to_focus_from_prev(&mut state);
        assert_eq!(state.keyboard.cell_to_focus_next, None);
    }

    #[test]
    fn hint_is_not_recorded_without_focus() {
        let mut state = synced();
        set_cell_to_focus_from_prev(&mut state);
        assert_eq!(state.keyboard.cell_to_focus_next, None);
    }

    #[test]
    fn tree_columns_enable_row_mode() {
        let mut state = tree_state();
        assert!(state.keyboard.row_mode);
        update_tab_index_active_row(&mut state, 0);
        assert_eq!(state.rows[0].tab_index, 0);

        update_row_navigation_mode(true, &mut state);
        assert!(state.keyboard.row_mode, "kept while the tree column stays");
        state.columns.retain(|c| !c.is_tree());
        update_row_navigation_mode(true, &mut state);
        assert!(!state.keyboard.row_mode);
    }

    #[test]
    fn row_mode_arrows_toggle_and_move() {
        let mut state = tree_state();
        let reaction = react_to_keyboard_on_row(&mut state, "p", Key::ArrowLeft);
        assert_eq!(
            reaction.effects,
            vec![FocusEffect::ToggleRow { row_key: "p".into(), next_expanded: false }]
        );

        react_to_keyboard_on_row(&mut state, "p", Key::ArrowDown);
        assert_eq!(active(&state), (RowId::row("c1"), "name-tree".into()));
        react_to_keyboard_on_row(&mut state, "c1", Key::ArrowDown);
        assert_eq!(active(&state), (RowId::row("c2"), "name-tree".into()));

        react_to_keyboard_on_row(&mut state, "c2", Key::ArrowLeft);
        assert_eq!(active(&state), (RowId::row("p"), "name-tree".into()), "left goes to the parent");

        let reaction = react_to_keyboard_on_row(&mut state, "q", Key::ArrowRight);
        assert_eq!(
            reaction.effects,
            vec![FocusEffect::ToggleRow { row_key: "q".into(), next_expanded: true }]
        );
    }

    #[test]
    fn rows_without_tree_state_act_as_top_level_leaves() {
        let mut state = tree_state();
        state.rows[0].tree = None;
        let reaction = react_to_keyboard_on_row(&mut state, "p", Key::ArrowLeft);
        assert!(reaction.effects.is_empty(), "no toggle and no parent to move to");
    }

    #[test]
    fn row_mode_up_stops_at_first_row() {
        let mut state = tree_state();
        let reaction = react_to_keyboard_on_row(&mut state, "p", Key::ArrowUp);
        assert!(reaction.effects.is_empty());
        assert!(reaction.consumed);
    }

    #[test]
    fn right_on_leaf_row_enters_cell_mode_and_left_returns() {
        let mut state = tree_state();
        update_active_cell(&mut state, RowId::row("c1"), "name-tree");
        let reaction = react_to_keyboard_on_row(&mut state, "c1", Key::ArrowRight);
        assert!(!state.keyboard.row_mode);
        assert!(matches!(reaction.effects[0], FocusEffect::BlurRow { row: 1 }));
        assert_eq!(state.rows[1].cells[0].tab_index, 0);

        react_to_keyboard(&mut state, &RowId::row("c1"), "name-tree", Key::ArrowLeft);
        assert!(state.keyboard.row_mode, "left from column 0 goes back to the row");
        assert_eq!(state.rows[1].tab_index, 0);
    }

    #[test]
    fn click_activates_cell_and_leaves_row_mode() {
        let mut state = tree_state();
        let effects = handle_cell_click(&mut state, &RowId::row("c2"), "size-number");
        assert!(!state.keyboard.row_mode);
        assert_eq!(active(&state), (RowId::row("c2"), "size-number".into()));
        assert!(state.keyboard.cell_clicked);
        assert!(effects.contains(&FocusEffect::ShowFocusStyles {
            position: CellPosition::new(RowPosition::Row(2), 1),
        }));
    }

    #[test]
    fn focus_in_and_out_track_the_grid_focus() {
        let mut state = synced();
        let effects = handle_datatable_focus_in(&mut state);
        assert!(datatable_has_focus(&state));
        assert_eq!(effects.len(), 1);

        assert!(handle_datatable_focus_out(&mut state, true).is_empty());
        assert!(datatable_has_focus(&state));

        handle_datatable_focus_out(&mut state, false);
        assert!(!datatable_has_focus(&state));
        assert_eq!(state.rows[0].cells[0].tab_index, -1);
    }

    #[test]
    fn false_blur_refocuses_the_cell() {
        let mut state = synced();
        let effects = handle_false_cell_blur(&mut state, &RowId::row("b"), "amount-number");
        assert_eq!(active(&state), (RowId::row("b"), "amount-number".into()));
        assert!(matches!(effects.last(), Some(FocusEffect::FocusCell { .. })));
    }
}
