// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Infinite loading: when to ask the application for more rows.

use serde_json::Value;
use tracing::warn;

use crate::state::GridState;
use crate::utils::{normalize_boolean, parse_positive_integer};

/// Default distance, in pixels, from the end of the content that triggers a load.
pub const DEFAULT_LOAD_MORE_OFFSET: u32 = 20;

/// Content taller than the viewport by no more than this is not scrollable.
pub const SCROLL_ALLOWANCE: f64 = 2.0;

/// Infinite loading slice of [`GridState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfiniteLoadingState {
    /// Whether scrolling near the end asks for more rows.
    pub enable_infinite_loading: bool,
    /// Trigger distance from the end of the content.
    pub load_more_offset: u32,
    /// Whether the application is loading rows.
    pub is_loading: bool,
}

impl Default for InfiniteLoadingState {
    fn default() -> Self {
        Self {
            enable_infinite_loading: false,
            load_more_offset: DEFAULT_LOAD_MORE_OFFSET,
            is_loading: false,
        }
    }
}

/// Geometry of the vertical scroller, as measured by the host.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    /// Height of the scrolled content.
    pub scroll_height: f64,
    /// Height of the viewport.
    pub client_height: f64,
    /// Current scroll offset.
    pub scroll_top: f64,
    /// Whether the scroller is laid out and visible.
    pub visible: bool,
}

impl ScrollMetrics {
    /// Distance between the bottom of the viewport and the end of the content.
    pub fn offset_from_end(&self) -> f64 {
        self.scroll_height - self.scroll_top - self.client_height
    }

    /// Whether the content overflows the viewport.
    pub fn is_scrollable(&self) -> bool {
        self.scroll_height > self.client_height + SCROLL_ALLOWANCE
    }
}

/// Enables or disables infinite loading.
pub fn set_infinite_loading(state: &mut GridState, value: &Value) {
    state.infinite_loading.enable_infinite_loading = normalize_boolean(value);
}

/// Records whether a load is in progress.
pub fn set_loading(state: &mut GridState, value: &Value) {
    state.infinite_loading.is_loading = normalize_boolean(value);
}

/// Sets the trigger distance. Anything but a non-negative integer resets it to the default.
pub fn set_load_more_offset(state: &mut GridState, value: &Value) {
    state.infinite_loading.load_more_offset = parse_positive_integer(value).unwrap_or_else(|| {
        warn!(
            attribute = "loadMoreOffset",
            %value,
            "loadMoreOffset should be an integer >= 0"
        );
        DEFAULT_LOAD_MORE_OFFSET
    });
}

/// Whether a scroll to `metrics` should ask for more rows.
pub fn should_load_more(state: &GridState, metrics: &ScrollMetrics) -> bool {
    let loading = &state.infinite_loading;
    loading.enable_infinite_loading
        && !loading.is_loading
        && metrics.offset_from_end() < f64::from(loading.load_more_offset)
}

/// Whether a render should ask for more rows because the content does not fill the viewport.
pub fn should_prefetch(state: &GridState, metrics: &ScrollMetrics) -> bool {
    let loading = &state.infinite_loading;
    loading.enable_infinite_loading
        && !loading.is_loading
        && !state.rows.is_empty()
        && metrics.visible
        && !metrics.is_scrollable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture_state;
    use serde_json::json;

    fn metrics(scroll_top: f64) -> ScrollMetrics {
        ScrollMetrics {
            scroll_height: 1000.0,
            client_height: 400.0,
            scroll_top,
            visible: true,
        }
    }

    fn enabled() -> GridState {
        let mut state = fixture_state();
        set_infinite_loading(&mut state, &json!(true));
        state
    }

    #[test]
    fn offset_is_validated() {
        let mut state = fixture_state();
        set_load_more_offset(&mut state, &json!(50));
        assert_eq!(state.infinite_loading.load_more_offset, 50);
        set_load_more_offset(&mut state, &json!(-3));
        assert_eq!(state.infinite_loading.load_more_offset, DEFAULT_LOAD_MORE_OFFSET);
        set_load_more_offset(&mut state, &json!("12"));
        assert_eq!(state.infinite_loading.load_more_offset, 12);
    }

    #[test]
    fn loads_near_the_end_only() {
        let mut state = enabled();
        assert!(!should_load_more(&state, &metrics(100.0)));
        assert!(should_load_more(&state, &metrics(590.0)), "10px from the end");

        set_loading(&mut state, &json!(true));
        assert!(!should_load_more(&state, &metrics(590.0)), "already loading");
    }

    #[test]
    fn disabled_never_loads() {
        let state = fixture_state();
        assert!(!should_load_more(&state, &metrics(600.0)));
        assert!(!should_prefetch(&state, &ScrollMetrics { visible: true, ..Default::default() }));
    }

    #[test]
    fn prefetch_when_content_does_not_fill_the_viewport() {
        let mut state = enabled();
        let short = ScrollMetrics {
            scroll_height: 401.0,
            client_height: 400.0,
            scroll_top: 0.0,
            visible: true,
        };
        assert!(should_prefetch(&state, &short), "within the allowance");
        assert!(!should_prefetch(&state, &metrics(0.0)));
        assert!(!should_prefetch(&state, &ScrollMetrics { visible: false, ..short }));

        state.rows.clear();
        assert!(!should_prefetch(&state, &short), "no rows yet");
    }
}
