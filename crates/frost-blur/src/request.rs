#![forbid(unsafe_code)]

//! Validated blur requests.

use frost_core::Size;

use crate::error::RequestError;
use crate::image::PixelImage;
use crate::stack_blur::MAX_STACK_RADIUS;

/// Largest accepted blur radius.
pub const MAX_RADIUS: u32 = MAX_STACK_RADIUS;

/// An immutable, validated blur job.
///
/// Invariants (checked by [`BlurRequest::new`]):
/// - the image is non-empty and its buffer matches its dimensions;
/// - `radius <= MAX_RADIUS`;
/// - `0 < resize_ratio <= 1` and finite.
///
/// The working size derived from the ratio is clamped to at least one pixel
/// per axis, see [`BlurRequest::working_size`].
#[derive(Debug, Clone, PartialEq)]
pub struct BlurRequest {
    image: PixelImage,
    radius: u32,
    resize_ratio: f64,
}

impl BlurRequest {
    pub fn new(image: PixelImage, radius: u32, resize_ratio: f64) -> Result<Self, RequestError> {
        if image.size().is_empty() {
            return Err(RequestError::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }
        if radius > MAX_RADIUS {
            return Err(RequestError::RadiusTooLarge {
                radius,
                max: MAX_RADIUS,
            });
        }
        if !(resize_ratio.is_finite() && resize_ratio > 0.0 && resize_ratio <= 1.0) {
            return Err(RequestError::InvalidResizeRatio(resize_ratio));
        }
        Ok(Self {
            image,
            radius,
            resize_ratio,
        })
    }

    /// Build from a raw pixel buffer.
    pub fn from_raw(
        pixels: Vec<u32>,
        width: u32,
        height: u32,
        radius: u32,
        resize_ratio: f64,
    ) -> Result<Self, RequestError> {
        Self::new(PixelImage::new(width, height, pixels)?, radius, resize_ratio)
    }

    #[inline]
    pub fn image(&self) -> &PixelImage {
        &self.image
    }

    #[inline]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    #[inline]
    pub const fn resize_ratio(&self) -> f64 {
        self.resize_ratio
    }

    /// Size of the buffer the kernel actually runs on.
    #[must_use]
    pub fn working_size(&self) -> Size {
        self.image.size().scaled_at_least_one(self.resize_ratio)
    }

    /// Hand the source image back.
    pub fn into_image(self) -> PixelImage {
        self.image
    }
}
