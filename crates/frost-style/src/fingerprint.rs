#![forbid(unsafe_code)]

//! Cache keys for dialog backgrounds.
//!
//! Radii are `f32` in physical pixels. Equality and hashing compare the raw
//! bit patterns, so `0.0` and `-0.0` are distinct keys and `NaN` equals
//! itself.

use std::hash::{Hash, Hasher};

use frost_core::Argb;

/// Per-corner radii in layout direction order (start = left for LTR).
#[derive(Debug, Clone, Copy, Default)]
pub struct CornerRadii {
    pub top_start: f32,
    pub top_end: f32,
    pub bottom_start: f32,
    pub bottom_end: f32,
}

impl CornerRadii {
    #[must_use]
    pub const fn new(top_start: f32, top_end: f32, bottom_start: f32, bottom_end: f32) -> Self {
        Self {
            top_start,
            top_end,
            bottom_start,
            bottom_end,
        }
    }

    #[must_use]
    pub const fn uniform(radius: f32) -> Self {
        Self::new(radius, radius, radius, radius)
    }

    /// Multiply every corner by `density` (dp to px).
    #[must_use]
    pub fn scaled(self, density: f32) -> Self {
        Self::new(
            self.top_start * density,
            self.top_end * density,
            self.bottom_start * density,
            self.bottom_end * density,
        )
    }

    /// `[top_start, top_end, bottom_end, bottom_start]`, clockwise from top-left.
    #[must_use]
    pub const fn clockwise(&self) -> [f32; 4] {
        [self.top_start, self.top_end, self.bottom_end, self.bottom_start]
    }

    fn bits(&self) -> [u32; 4] {
        self.clockwise().map(f32::to_bits)
    }
}

impl PartialEq for CornerRadii {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for CornerRadii {}

impl Hash for CornerRadii {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

/// Where the modal indicator glyph comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IconSource {
    /// Built-in indicator glyph.
    #[default]
    Default,
    /// Host resource identifier.
    Resource(u32),
}

/// Icon drawn centered above the fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModalIndicator {
    pub icon: IconSource,
    /// Square edge length in physical pixels.
    pub size: u32,
}

impl ModalIndicator {
    #[must_use]
    pub const fn new(icon: IconSource, size: u32) -> Self {
        Self { icon, size }
    }
}

/// Everything that determines how a dialog background looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleFingerprint {
    pub radii: CornerRadii,
    pub background_color: Argb,
    pub modal_indicator: Option<ModalIndicator>,
    pub custom_drawable_id: Option<u32>,
}

impl StyleFingerprint {
    /// Plain fill with no indicator and no custom drawable.
    #[must_use]
    pub const fn new(radii: CornerRadii, background_color: Argb) -> Self {
        Self {
            radii,
            background_color,
            modal_indicator: None,
            custom_drawable_id: None,
        }
    }

    /// Build from density-independent radii, converting to pixels.
    #[must_use]
    pub fn from_dp(radii_dp: CornerRadii, density: f32, background_color: Argb) -> Self {
        Self::new(radii_dp.scaled(density), background_color)
    }

    #[must_use]
    pub const fn with_modal_indicator(mut self, indicator: ModalIndicator) -> Self {
        self.modal_indicator = Some(indicator);
        self
    }

    #[must_use]
    pub const fn with_custom_drawable(mut self, id: u32) -> Self {
        self.custom_drawable_id = Some(id);
        self
    }

    #[must_use]
    pub const fn show_modal_indicator(&self) -> bool {
        self.modal_indicator.is_some()
    }
}
