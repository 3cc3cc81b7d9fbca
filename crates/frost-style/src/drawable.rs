#![forbid(unsafe_code)]

//! Layered dialog backgrounds.
//!
//! A [`LayeredDrawable`] is an ordered list of paint operations, each with a
//! [`Placement`] fixed at construction. Painting happens back to front:
//! the first layer is the bottom-most.

use std::sync::Arc;

use frost_blur::PixelImage;
use frost_core::{Argb, Rect, Size};

use crate::fingerprint::{CornerRadii, IconSource, StyleFingerprint};

/// Where a layer sits inside the drawable's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Fill the bounds, leaving `inset_top` pixels uncovered at the top.
    Fill { inset_top: u32 },
    /// Centered horizontally, anchored to the top edge.
    TopCenter { width: u32, height: u32 },
}

impl Placement {
    /// Concrete rectangle for this placement inside `bounds`.
    #[must_use]
    pub fn resolve(&self, bounds: Rect) -> Rect {
        match *self {
            Self::Fill { inset_top } => bounds.inset_top(inset_top),
            Self::TopCenter { width, height } => {
                let w = width.min(bounds.width);
                let h = height.min(bounds.height);
                Rect::new(bounds.x + (bounds.width - w) / 2, bounds.y, w, h)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaintOp {
    /// Anti-aliased rounded rectangle.
    RoundRect { radii: CornerRadii, color: Argb },
    Icon(IconSource),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    pub op: PaintOp,
    pub placement: Placement,
}

/// Paints icon layers. Resource loading belongs to the host.
pub trait IconPainter {
    fn paint(&self, icon: IconSource, rect: Rect, target: &mut PixelImage);
}

/// Draws every icon as a filled circle inscribed in its rectangle.
#[derive(Debug, Clone, Copy)]
pub struct DotIcon {
    pub color: Argb,
}

impl Default for DotIcon {
    fn default() -> Self {
        Self {
            color: Argb::argb(0x99, 0x80, 0x80, 0x80),
        }
    }
}

impl IconPainter for DotIcon {
    fn paint(&self, _icon: IconSource, rect: Rect, target: &mut PixelImage) {
        if rect.is_empty() {
            return;
        }
        let r = rect.width.min(rect.height) as f32 / 2.0;
        let cx = rect.x as f32 + rect.width as f32 / 2.0;
        let cy = rect.y as f32 + rect.height as f32 / 2.0;
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let coverage = (r - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
                blend_coverage(target, x, y, self.color, coverage);
            }
        }
    }
}

/// Background built from a style fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct LayeredDrawable {
    layers: Vec<Layer>,
}

impl LayeredDrawable {
    #[must_use]
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    /// Rounded fill, with the modal indicator above it when requested.
    ///
    /// The indicator is centered on the top edge and the fill is pushed down
    /// by the indicator's height so the two never overlap.
    #[must_use]
    pub fn from_fingerprint(fp: &StyleFingerprint) -> Self {
        let fill = PaintOp::RoundRect {
            radii: fp.radii,
            color: fp.background_color,
        };
        let layers = match fp.modal_indicator {
            None => vec![Layer {
                op: fill,
                placement: Placement::Fill { inset_top: 0 },
            }],
            Some(indicator) => vec![
                Layer {
                    op: fill,
                    placement: Placement::Fill {
                        inset_top: indicator.size,
                    },
                },
                Layer {
                    op: PaintOp::Icon(indicator.icon),
                    placement: Placement::TopCenter {
                        width: indicator.size,
                        height: indicator.size,
                    },
                },
            ],
        };
        Self::new(layers)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Rectangle of every layer for a drawable of `size`, in paint order.
    #[must_use]
    pub fn layout(&self, size: Size) -> Vec<Rect> {
        let bounds = Rect::from_size(size);
        self.layers
            .iter()
            .map(|layer| layer.placement.resolve(bounds))
            .collect()
    }

    /// Rasterize with the built-in indicator glyph.
    #[must_use]
    pub fn rasterize(&self, size: Size) -> PixelImage {
        self.rasterize_with(size, &DotIcon::default())
    }

    #[must_use]
    pub fn rasterize_with(&self, size: Size, icons: &dyn IconPainter) -> PixelImage {
        let mut image = PixelImage::filled(size, Argb::TRANSPARENT);
        let bounds = Rect::from_size(size);
        for layer in &self.layers {
            let rect = layer.placement.resolve(bounds);
            match layer.op {
                PaintOp::RoundRect { radii, color } => fill_round_rect(&mut image, rect, radii, color),
                PaintOp::Icon(icon) => icons.paint(icon, rect, &mut image),
            }
        }
        image
    }
}

/// What a dialog window is painted with.
///
/// Two `Layered` values are equal only when they share the same allocation,
/// which is how cache hits are observed.
#[derive(Debug, Clone)]
pub enum Background {
    Layered(Arc<LayeredDrawable>),
    /// Host-owned drawable, applied by id and never cached.
    Resource(u32),
}

impl Background {
    #[must_use]
    pub fn as_layered(&self) -> Option<&Arc<LayeredDrawable>> {
        match self {
            Self::Layered(d) => Some(d),
            Self::Resource(_) => None,
        }
    }
}

impl PartialEq for Background {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Layered(a), Self::Layered(b)) => Arc::ptr_eq(a, b),
            (Self::Resource(a), Self::Resource(b)) => a == b,
            _ => false,
        }
    }
}

/// Corner radii clockwise from top-left, shrunk uniformly so adjacent
/// corners never overlap.
fn fitted_radii(radii: CornerRadii, width: f32, height: f32) -> [f32; 4] {
    let r = radii
        .clockwise()
        .map(|v| if v.is_finite() && v > 0.0 { v } else { 0.0 });
    let [tl, tr, br, bl] = r;
    let mut scale = 1.0f32;
    for (sum, edge) in [(tl + tr, width), (bl + br, width), (tl + bl, height), (tr + br, height)] {
        if sum > edge {
            scale = scale.min(edge / sum);
        }
    }
    r.map(|v| v * scale)
}

fn fill_round_rect(image: &mut PixelImage, rect: Rect, radii: CornerRadii, color: Argb) {
    if rect.is_empty() || color.a() == 0 {
        return;
    }
    let (w, h) = (rect.width as f32, rect.height as f32);
    let [tl, tr, br, bl] = fitted_radii(radii, w, h);

    for y in rect.y..rect.bottom() {
        let ly = (y - rect.y) as f32 + 0.5;
        for x in rect.x..rect.right() {
            let lx = (x - rect.x) as f32 + 0.5;
            let corner = if lx < tl && ly < tl {
                Some((tl, tl, tl))
            } else if lx > w - tr && ly < tr {
                Some((tr, w - tr, tr))
            } else if lx > w - br && ly > h - br {
                Some((br, w - br, h - br))
            } else if lx < bl && ly > h - bl {
                Some((bl, bl, h - bl))
            } else {
                None
            };
            let coverage = match corner {
                None => 1.0,
                Some((r, cx, cy)) => {
                    let (dx, dy) = (lx - cx, ly - cy);
                    (r - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0)
                }
            };
            blend_coverage(image, x, y, color, coverage);
        }
    }
}

fn blend_coverage(image: &mut PixelImage, x: u32, y: u32, color: Argb, coverage: f32) {
    if coverage <= 0.0 {
        return;
    }
    let alpha = (f32::from(color.a()) * coverage).round() as u8;
    image.blend_pixel(x, y, color.with_alpha(alpha));
}
