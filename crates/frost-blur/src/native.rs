#![forbid(unsafe_code)]

//! The native compute boundary.
//!
//! [`NativeBlur::apply_blur`] mirrors the platform call
//! `applyBlur(image, width, height, radius, resizeRatio)`: raw pixel words and
//! raw integer parameters in, one of three outcomes out. Parameters are
//! validated by the caller; a backend performs no validation of its own beyond
//! refusing to index out of bounds.
//!
//! [`StackBlurBackend`] is the in-process implementation: shrink by the resize
//! ratio, stack-blur the working buffer, grow back to the input size.

use std::fmt;

use frost_core::Size;

use crate::image::PixelImage;
use crate::stack_blur::{self, MAX_STACK_RADIUS};

/// Raw result of crossing the native boundary.
#[derive(Clone, PartialEq, Eq)]
pub enum NativeOutcome {
    /// Processed pixels, row-major, same dimensions as the input.
    Image(Vec<u32>),
    /// The routine produced nothing.
    Null,
    /// The routine reported a fault.
    Fault(String),
}

impl fmt::Debug for NativeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(px) => write!(f, "Image({} px)", px.len()),
            Self::Null => write!(f, "Null"),
            Self::Fault(msg) => f.debug_tuple("Fault").field(msg).finish(),
        }
    }
}

/// A blur routine living behind the native boundary.
pub trait NativeBlur: Send + Sync {
    /// Human-readable backend name (used in logs).
    fn name(&self) -> &'static str {
        "native"
    }

    /// Blur `pixels` (`width * height`, row-major) and return new pixels.
    fn apply_blur(
        &self,
        pixels: &[u32],
        width: i32,
        height: i32,
        radius: i32,
        resize_ratio: f64,
    ) -> NativeOutcome;
}

impl<B: NativeBlur + ?Sized> NativeBlur for std::sync::Arc<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn apply_blur(
        &self,
        pixels: &[u32],
        width: i32,
        height: i32,
        radius: i32,
        resize_ratio: f64,
    ) -> NativeOutcome {
        (**self).apply_blur(pixels, width, height, radius, resize_ratio)
    }
}

impl<B: NativeBlur + ?Sized> NativeBlur for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn apply_blur(
        &self,
        pixels: &[u32],
        width: i32,
        height: i32,
        radius: i32,
        resize_ratio: f64,
    ) -> NativeOutcome {
        (**self).apply_blur(pixels, width, height, radius, resize_ratio)
    }
}

/// Adapts a closure into a backend; mostly useful for tests and shims.
pub struct FnBackend<F> {
    name: &'static str,
    f: F,
}

impl<F> FnBackend<F> {
    pub fn new(name: &'static str, f: F) -> Self
    where
        F: Fn(&[u32], i32, i32, i32, f64) -> NativeOutcome + Send + Sync,
    {
        Self { name, f }
    }
}

impl<F> fmt::Debug for FnBackend<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnBackend").field("name", &self.name).finish()
    }
}

impl<F> NativeBlur for FnBackend<F>
where
    F: Fn(&[u32], i32, i32, i32, f64) -> NativeOutcome + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply_blur(
        &self,
        pixels: &[u32],
        width: i32,
        height: i32,
        radius: i32,
        resize_ratio: f64,
    ) -> NativeOutcome {
        (self.f)(pixels, width, height, radius, resize_ratio)
    }
}

/// In-process downsample, stack blur, upsample.
#[derive(Debug, Clone, Copy)]
pub struct StackBlurBackend {
    workers: usize,
}

impl Default for StackBlurBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StackBlurBackend {
    /// Use every core the host offers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            workers: stack_blur::default_workers(),
        }
    }

    /// Bound the number of worker threads per pass (at least one).
    #[must_use]
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }
}

impl NativeBlur for StackBlurBackend {
    fn name(&self) -> &'static str {
        "stack-blur"
    }

    fn apply_blur(
        &self,
        pixels: &[u32],
        width: i32,
        height: i32,
        radius: i32,
        resize_ratio: f64,
    ) -> NativeOutcome {
        let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
            return NativeOutcome::Fault(format!("negative dimensions {width}x{height}"));
        };
        let image = match PixelImage::new(width, height, pixels.to_vec()) {
            Ok(image) => image,
            Err(err) => return NativeOutcome::Fault(err.to_string()),
        };
        let radius = radius.clamp(0, MAX_STACK_RADIUS as i32) as u32;
        if radius == 0 {
            return NativeOutcome::Image(image.into_pixels());
        }

        let full = image.size();
        let working: Size = full.scaled_at_least_one(resize_ratio);
        let mut small = image.resized(working);
        stack_blur::stack_blur(small.pixels_mut(), working, radius, self.workers);
        NativeOutcome::Image(small.resized(full).into_pixels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_dimensions_fault() {
        let outcome = StackBlurBackend::with_workers(1).apply_blur(&[], -1, 4, 3, 1.0);
        assert!(matches!(outcome, NativeOutcome::Fault(_)));
    }

    #[test]
    fn short_buffer_faults_instead_of_reading_past_end() {
        let outcome = StackBlurBackend::with_workers(1).apply_blur(&[0; 3], 2, 2, 3, 1.0);
        assert!(matches!(outcome, NativeOutcome::Fault(_)));
    }

    #[test]
    fn output_matches_input_dimensions() {
        let pixels = vec![0xff_33_66_99; 31 * 17];
        match StackBlurBackend::with_workers(2).apply_blur(&pixels, 31, 17, 5, 0.3) {
            NativeOutcome::Image(out) => assert_eq!(out.len(), pixels.len()),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn closure_backend_reports_its_name() {
        let backend = FnBackend::new("null", |_, _, _, _, _| NativeOutcome::Null);
        assert_eq!(backend.name(), "null");
        assert_eq!(backend.apply_blur(&[0], 1, 1, 1, 1.0), NativeOutcome::Null);
    }
}
