#![forbid(unsafe_code)]

//! Geometric primitives in physical pixels.

/// Width and height in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels covered.
    #[inline]
    pub const fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check if either dimension is zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Scale both axes by `ratio`, truncating, and never going below one
    /// pixel on either axis.
    ///
    /// An empty size stays empty.
    #[must_use]
    pub fn scaled_at_least_one(&self, ratio: f64) -> Self {
        if self.is_empty() {
            return *self;
        }
        let scale = |v: u32| -> u32 {
            let scaled = (f64::from(v) * ratio).floor();
            if scaled.is_finite() && scaled >= 1.0 {
                (scaled as u32).min(v.max(1))
            } else {
                1
            }
        };
        Self::new(scale(self.width), scale(self.height))
    }

    /// Swap width and height.
    #[inline]
    #[must_use]
    pub const fn transposed(&self) -> Self {
        Self::new(self.height, self.width)
    }
}

/// An axis-aligned rectangle in physical pixels.
///
/// Origin at top-left; `x`/`y` inclusive, `right()`/`bottom()` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a point lies inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Overlapping area of two rectangles (empty when disjoint).
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if x < right && y < bottom {
            Rect::new(x, y, right - x, bottom - y)
        } else {
            Rect::default()
        }
    }

    /// Shrink from the top edge by `amount`, saturating at an empty rect.
    #[must_use]
    pub const fn inset_top(&self, amount: u32) -> Rect {
        let amount = if amount > self.height {
            self.height
        } else {
            amount
        };
        Rect::new(self.x, self.y + amount, self.width, self.height - amount)
    }
}
