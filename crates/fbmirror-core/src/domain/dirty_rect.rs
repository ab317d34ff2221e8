//! Dirty rectangle produced by each diff pass.
//!
//! # Accumulation rule
//!
//! Bounds are accumulated with a chained comparison rather than a true
//! running min/max:
//!
//! ```text
//! x:  if x < min_x { min_x = x } else if x > max_x { max_x = x }
//! y:  if y > max_y    { max_y = y    } else if y < min_y    { min_y = y    }
//! ```
//!
//! A candidate that lowers `min_x` is never compared against `max_x` in the
//! same step (and symmetrically for `y`, which checks the maximum first).
//! Downstream rectangle merging in the transport is tuned to the rectangles
//! this produces, so the rule is kept exactly as is.
//!
//! When the scan finishes, a bound still holding its sentinel collapses onto
//! its partner, and the reported rectangle is padded by +2 on the right edge
//! and +1 on the bottom edge.

const MIN_SENTINEL: i32 = i32::MAX;
const MAX_SENTINEL: i32 = -1;

/// Padding added to the right edge of a non-empty rectangle.
pub const RIGHT_PADDING: i32 = 2;

/// Padding added to the bottom edge of a non-empty rectangle.
pub const BOTTOM_PADDING: i32 = 1;

/// Bounding box of the pixels that changed in one diff pass.
///
/// `max_x`/`max_y` are the padded edges, so a rectangle covering the single
/// pixel `(x, y)` is `{x, y, x + 2, y + 1}`.  An empty rectangle has
/// `min > max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl DirtyRect {
    /// The "nothing changed" rectangle.
    pub const EMPTY: DirtyRect = DirtyRect {
        min_x: MIN_SENTINEL,
        min_y: MIN_SENTINEL,
        max_x: MAX_SENTINEL,
        max_y: MAX_SENTINEL,
    };

    /// A rectangle covering the whole `width` x `height` surface.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            min_x: 0,
            min_y: 0,
            max_x: width as i32,
            max_y: height as i32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Returns `true` if pixel `(x, y)` lies inside the padded rectangle.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        !self.is_empty() && x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    /// Clips the rectangle to a `width` x `height` surface.
    pub fn clipped(&self, width: u32, height: u32) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self {
            min_x: self.min_x.clamp(0, width as i32),
            min_y: self.min_y.clamp(0, height as i32),
            max_x: self.max_x.clamp(0, width as i32),
            max_y: self.max_y.clamp(0, height as i32),
        }
    }
}

impl Default for DirtyRect {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Running bounds for one diff pass.
///
/// Created fresh by every call to the differ; never persisted.
#[derive(Debug, Clone, Copy)]
pub struct BoundsTracker {
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
}

impl BoundsTracker {
    pub fn new() -> Self {
        Self {
            min_x: MIN_SENTINEL,
            min_y: MIN_SENTINEL,
            max_x: MAX_SENTINEL,
            max_y: MAX_SENTINEL,
        }
    }

    /// Records one changed pixel.
    #[inline]
    pub fn add(&mut self, x: i32, y: i32) {
        if x < self.min_x {
            self.min_x = x;
        } else if x > self.max_x {
            self.max_x = x;
        }

        if y > self.max_y {
            self.max_y = y;
        } else if y < self.min_y {
            self.min_y = y;
        }
    }

    pub fn is_touched(&self) -> bool {
        self.min_x != MIN_SENTINEL
    }

    /// Finishes the pass, collapsing sentinels and applying the padding.
    pub fn finish(self) -> DirtyRect {
        if !self.is_touched() {
            return DirtyRect::EMPTY;
        }
        let max_x = if self.max_x == MAX_SENTINEL { self.min_x } else { self.max_x };
        let min_y = if self.min_y == MIN_SENTINEL { self.max_y } else { self.min_y };
        DirtyRect {
            min_x: self.min_x,
            min_y,
            max_x: max_x + RIGHT_PADDING,
            max_y: self.max_y + BOTTOM_PADDING,
        }
    }
}

impl Default for BoundsTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
