// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay manager for help-tooltip bubbles.
//!
//! A bubble is a floating surface shown next to a trigger. Triggers do not own their bubble:
//! they borrow one from an [`OverlayService`] injected by the host, so a page with many help
//! icons shares a handful of bubbles without any process-wide state. [`OverlayPool`] is the
//! default service.
//!
//! ```
//! use kurbo::{Rect, Size};
//! use tessera_grid::overlay::{HelpTooltip, OverlayPool, OverlayService, VerticalPlacement};
//!
//! let mut pool = OverlayPool::new();
//! let mut help = HelpTooltip::new("Amounts are in euros");
//! let viewable = Rect::new(0.0, 0.0, 800.0, 600.0);
//!
//! let handle = help.show(&mut pool, Rect::new(100.0, 300.0, 116.0, 316.0), viewable, Size::new(200.0, 40.0));
//! let bubble = pool.bubble(handle).unwrap();
//! assert!(bubble.visible);
//! assert_eq!(bubble.placement.vertical, VerticalPlacement::Above);
//!
//! help.hide(&mut pool);
//! assert!(pool.bubble(handle).is_none());
//! ```

use kurbo::{Point, Rect, Size};
use tracing::debug;

/// Gap between a trigger and its bubble, room for the nubbin.
pub const NUBBIN_GAP: f64 = 8.0;

/// Handle of a pooled bubble.
///
/// Handles are generational: once released, a handle never refers to the bubble that later
/// reuses its slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct OverlayHandle(u32, u32);

impl OverlayHandle {
    const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Generation of the slot this handle was issued for.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

/// Where the bubble sits vertically relative to its trigger.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum VerticalPlacement {
    /// Bubble above the trigger, nubbin pointing down.
    #[default]
    Above,
    /// Bubble below the trigger, nubbin pointing up.
    Below,
}

/// Which trigger edge the bubble is aligned with.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlign {
    /// Bubble's left edge on the trigger's left edge.
    #[default]
    Left,
    /// Bubble's right edge on the trigger's right edge.
    Right,
    /// Bubble centered on the trigger.
    Center,
}

/// Resolved placement of a bubble.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Placement {
    /// Vertical side.
    pub vertical: VerticalPlacement,
    /// Horizontal alignment.
    pub horizontal: HorizontalAlign,
}

/// A floating help surface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bubble {
    /// Text shown in the bubble.
    pub content: String,
    /// Bubble bounds in the host's coordinate space.
    pub rect: Rect,
    /// How the bubble relates to its trigger.
    pub placement: Placement,
    /// Whether the bubble is shown.
    pub visible: bool,
}

/// Source of bubbles, injected into every trigger that needs one.
pub trait OverlayService {
    /// Hands out a hidden, empty bubble.
    fn acquire(&mut self) -> OverlayHandle;

    /// Returns a bubble to the service. Returns `false` for a stale handle.
    fn release(&mut self, handle: OverlayHandle) -> bool;

    /// The bubble behind `handle`, if it is still live.
    fn bubble(&self, handle: OverlayHandle) -> Option<&Bubble>;

    /// Mutable access to the bubble behind `handle`, if it is still live.
    fn bubble_mut(&mut self, handle: OverlayHandle) -> Option<&mut Bubble>;
}

/// Slot pool of bubbles with free-list reuse.
#[derive(Clone, Debug, Default)]
pub struct OverlayPool {
    slots: Vec<Option<Bubble>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl OverlayPool {
    /// An empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bubbles currently handed out.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Number of slots ever allocated.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether `handle` still refers to a live bubble.
    pub fn is_alive(&self, handle: OverlayHandle) -> bool {
        self.slots.get(handle.idx()).is_some_and(Option::is_some)
            && self.generations.get(handle.idx()) == Some(&handle.1)
    }
}

impl OverlayService for OverlayPool {
    fn acquire(&mut self) -> OverlayHandle {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.generations[idx] = self.generations[idx].wrapping_add(1);
            self.slots[idx] = Some(Bubble::default());
            idx
        } else {
            self.slots.push(Some(Bubble::default()));
            self.generations.push(1);
            self.slots.len() - 1
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "OverlayHandle uses 32-bit slot indices."
        )]
        let handle = OverlayHandle(idx as u32, self.generations[idx]);
        debug!(slot = idx, generation = handle.1, "overlay acquired");
        handle
    }

    fn release(&mut self, handle: OverlayHandle) -> bool {
        if !self.is_alive(handle) {
            return false;
        }
        self.slots[handle.idx()] = None;
        self.free_list.push(handle.idx());
        debug!(slot = handle.idx(), "overlay released");
        true
    }

    fn bubble(&self, handle: OverlayHandle) -> Option<&Bubble> {
        if !self.is_alive(handle) {
            return None;
        }
        self.slots.get(handle.idx())?.as_ref()
    }

    fn bubble_mut(&mut self, handle: OverlayHandle) -> Option<&mut Bubble> {
        if !self.is_alive(handle) {
            return None;
        }
        self.slots.get_mut(handle.idx())?.as_mut()
    }
}

/// Positions a bubble of `size` next to `anchor`, inside `viewable` when possible.
///
/// The bubble goes above the anchor. It flips below when it would overflow the top edge, unless
/// it would overflow the bottom edge too. Horizontally it starts at the anchor's left edge, moves
/// to the right edge when it overflows on the right, and centers on the anchor when both edges
/// would overflow but half the bubble fits on each side.
pub fn place_bubble(anchor: Rect, size: Size, viewable: Rect) -> (Rect, Placement) {
    let overflows_top = anchor.y0 - (size.height + NUBBIN_GAP) < viewable.y0;
    let overflows_bottom = anchor.y1 + size.height + NUBBIN_GAP > viewable.y1;
    let overflows_right = anchor.x0 + size.width > viewable.x1;
    let overflows_left = anchor.x1 - size.width < viewable.x0;
    let center_overflows_right = anchor.x0 + size.width / 2.0 > viewable.x1;
    let center_overflows_left = anchor.x1 - size.width / 2.0 < viewable.x0;

    let vertical = if overflows_top && !overflows_bottom {
        VerticalPlacement::Below
    } else {
        VerticalPlacement::Above
    };
    let horizontal = if overflows_left
        && overflows_right
        && !center_overflows_left
        && !center_overflows_right
    {
        HorizontalAlign::Center
    } else if overflows_right {
        HorizontalAlign::Right
    } else {
        HorizontalAlign::Left
    };

    let x = match horizontal {
        HorizontalAlign::Left => anchor.x0,
        HorizontalAlign::Right => anchor.x1 - size.width,
        HorizontalAlign::Center => anchor.center().x - size.width / 2.0,
    };
    let y = match vertical {
        VerticalPlacement::Above => anchor.y0 - NUBBIN_GAP - size.height,
        VerticalPlacement::Below => anchor.y1 + NUBBIN_GAP,
    };
    (
        Rect::from_origin_size(Point::new(x, y), size),
        Placement {
            vertical,
            horizontal,
        },
    )
}

/// A help icon that shows its content in a borrowed bubble.
#[derive(Clone, Debug)]
pub struct HelpTooltip {
    content: String,
    handle: Option<OverlayHandle>,
}

impl HelpTooltip {
    /// A hidden tooltip.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            handle: None,
        }
    }

    /// Text shown in the bubble.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replaces the text, updating a shown bubble.
    pub fn set_content<S: OverlayService + ?Sized>(
        &mut self,
        service: &mut S,
        content: impl Into<String>,
    ) {
        self.content = content.into();
        if let Some(bubble) = self.handle.and_then(|h| service.bubble_mut(h)) {
            bubble.content.clone_from(&self.content);
        }
    }

    /// The bubble handle while shown.
    pub fn handle(&self) -> Option<OverlayHandle> {
        self.handle
    }

    /// Whether the tooltip currently holds a bubble.
    pub fn is_shown(&self) -> bool {
        self.handle.is_some()
    }

    /// Shows the bubble next to `anchor`, acquiring one if needed.
    pub fn show<S: OverlayService + ?Sized>(
        &mut self,
        service: &mut S,
        anchor: Rect,
        viewable: Rect,
        bubble_size: Size,
    ) -> OverlayHandle {
        let handle = match self.handle {
            Some(handle) if service.bubble(handle).is_some() => handle,
            _ => service.acquire(),
        };
        self.handle = Some(handle);
        let (rect, placement) = place_bubble(anchor, bubble_size, viewable);
        if let Some(bubble) = service.bubble_mut(handle) {
            bubble.content.clone_from(&self.content);
            bubble.rect = rect;
            bubble.placement = placement;
            bubble.visible = true;
        }
        handle
    }

    /// Recomputes the position after the anchor moved (scroll, resize).
    ///
    /// Does nothing when the tooltip is hidden; returns whether a bubble was moved.
    pub fn reposition<S: OverlayService + ?Sized>(
        &mut self,
        service: &mut S,
        anchor: Rect,
        viewable: Rect,
    ) -> bool {
        let Some(bubble) = self.handle.and_then(|h| service.bubble_mut(h)) else {
            return false;
        };
        let (rect, placement) = place_bubble(anchor, bubble.rect.size(), viewable);
        bubble.rect = rect;
        bubble.placement = placement;
        true
    }

    /// Hides the bubble and gives it back to the service.
    pub fn hide<S: OverlayService + ?Sized>(&mut self, service: &mut S) {
        if let Some(handle) = self.handle.take() {
            if let Some(bubble) = service.bubble_mut(handle) {
                bubble.visible = false;
            }
            service.release(handle);
        }
    }
}
