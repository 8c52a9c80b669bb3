//! Sticky scrolling for the conversation region.
//!
//! A render that appends content keeps the viewport pinned to the bottom
//! only if the viewport was already at the bottom before the render.
//! Otherwise the user's scroll position is left alone.

/// How far from the bottom (in layout units) still counts as "at the bottom".
///
/// Absorbs fractional layout rounding.
pub const BOTTOM_TOLERANCE: f64 = 1.0;

/// A scrollable region whose content may change size.
pub trait Scrollable {
    /// Total extent of the content. Never less than [`Self::client_height`].
    fn scroll_height(&self) -> f64;
    /// Height of the visible viewport.
    fn client_height(&self) -> f64;
    /// Current scroll offset from the top.
    fn scroll_top(&self) -> f64;
    /// Set the scroll offset. Implementations clamp to the valid range.
    fn set_scroll_top(&mut self, top: f64);
}

/// Run `render` against `target`, re-pinning to the bottom if it was there.
///
/// The bottom test is made after the render: the distance from the bottom
/// edge must be within [`BOTTOM_TOLERANCE`] of the growth the render caused.
pub fn with_sticky_scroll<T, R, F>(target: &mut T, render: F) -> R
where
    T: Scrollable + ?Sized,
    F: FnOnce(&mut T) -> R,
{
    let before = target.scroll_height();
    let result = render(target);
    let after = target.scroll_height();

    let growth = after - before;
    let distance = after - target.client_height() - target.scroll_top();
    if (distance - growth).abs() <= BOTTOM_TOLERANCE {
        let bottom = after - target.client_height();
        target.set_scroll_top(bottom);
        tracing::trace!(bottom, growth, "re-pinned conversation to bottom");
    }

    result
}

/// Scroll state of a fixed-height viewport over variable-height content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    scroll_top: f64,
    client_height: f64,
}

impl Viewport {
    /// Create a viewport scrolled to the top.
    pub fn new(client_height: f64) -> Self {
        Self {
            scroll_top: 0.0,
            client_height: client_height.max(0.0),
        }
    }

    /// Visible height.
    pub fn client_height(&self) -> f64 {
        self.client_height
    }

    /// Change the visible height (terminal resize).
    pub fn set_client_height(&mut self, height: f64) {
        self.client_height = height.max(0.0);
    }

    /// Scrollable extent for the given content height.
    pub fn scroll_height(&self, content_height: f64) -> f64 {
        content_height.max(self.client_height)
    }

    /// Largest valid scroll offset for the given content height.
    pub fn max_scroll_top(&self, content_height: f64) -> f64 {
        self.scroll_height(content_height) - self.client_height
    }

    /// Scroll offset, clamped for the given content height.
    pub fn scroll_top(&self, content_height: f64) -> f64 {
        self.scroll_top
            .clamp(0.0, self.max_scroll_top(content_height))
    }

    /// Set the scroll offset, clamped for the given content height.
    pub fn set_scroll_top(&mut self, top: f64, content_height: f64) {
        self.scroll_top = top.clamp(0.0, self.max_scroll_top(content_height));
    }

    /// Re-clamp after the content changed size.
    pub fn clamp(&mut self, content_height: f64) {
        self.scroll_top = self.scroll_top(content_height);
    }

    /// Whether the viewport shows the end of the content.
    pub fn is_at_bottom(&self, content_height: f64) -> bool {
        self.max_scroll_top(content_height) - self.scroll_top(content_height) <= BOTTOM_TOLERANCE
    }
}
