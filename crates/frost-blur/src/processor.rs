#![forbid(unsafe_code)]

//! Result-typed wrapper around the native boundary.
//!
//! Every abnormal outcome of a backend resolves to exactly one [`BlurError`]:
//!
//! | Backend behavior | Result |
//! |------------------|--------|
//! | `NativeOutcome::Image` with `width * height` pixels | `Ok(image)` |
//! | `NativeOutcome::Image` with any other length | `Err(NativeFault)` |
//! | `NativeOutcome::Null` | `Err(NullResult)` |
//! | `NativeOutcome::Fault(msg)` | `Err(NativeFault(msg))` |
//! | panic | `Err(NativeFault(panic message))` |

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use crate::error::{BlurError, BlurResult};
use crate::image::PixelImage;
use crate::native::{NativeBlur, NativeOutcome, StackBlurBackend};
use crate::request::BlurRequest;

/// Synchronous blur entry point.
#[derive(Debug, Clone, Default)]
pub struct NativeBlurProcessor<B = StackBlurBackend> {
    backend: B,
}

impl NativeBlurProcessor<StackBlurBackend> {
    /// Processor backed by the in-process stack blur.
    #[must_use]
    pub fn new() -> Self {
        Self::with_backend(StackBlurBackend::new())
    }
}

impl<B: NativeBlur> NativeBlurProcessor<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run the request through the backend and type the outcome.
    ///
    /// Blocks the calling thread. The request is only borrowed for the
    /// duration of the call.
    pub fn blur(&self, request: &BlurRequest) -> BlurResult {
        let image = request.image();
        let (width, height) = (image.width(), image.height());
        let span = tracing::debug_span!(
            "native_blur",
            backend = self.backend.name(),
            width,
            height,
            radius = request.radius(),
            ratio = request.resize_ratio(),
        );
        let _enter = span.enter();
        let start = Instant::now();

        // Dimensions were validated non-empty; anything past i32 is refused here
        // rather than truncated at the boundary.
        let (Ok(w), Ok(h)) = (i32::try_from(width), i32::try_from(height)) else {
            return Err(BlurError::NativeFault(format!(
                "dimensions {width}x{height} exceed the native boundary"
            )));
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.backend.apply_blur(
                image.pixels(),
                w,
                h,
                request.radius() as i32,
                request.resize_ratio(),
            )
        }));

        let result = match outcome {
            Err(payload) => Err(BlurError::NativeFault(panic_message(payload.as_ref()))),
            Ok(NativeOutcome::Null) => Err(BlurError::NullResult),
            Ok(NativeOutcome::Fault(msg)) => Err(BlurError::NativeFault(msg)),
            Ok(NativeOutcome::Image(pixels)) => {
                let actual = pixels.len();
                PixelImage::new(width, height, pixels).map_err(|_| {
                    BlurError::NativeFault(format!(
                        "backend returned {actual} pixels for a {width}x{height} image"
                    ))
                })
            }
        };

        match &result {
            Ok(_) => tracing::debug!(
                elapsed_us = start.elapsed().as_micros() as u64,
                "native blur complete"
            ),
            Err(err) => tracing::warn!(error = %err, "native blur failed"),
        }
        result
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic in native blur".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::FnBackend;
    use frost_core::{Argb, Size};

    fn request(radius: u32, ratio: f64) -> BlurRequest {
        let image = PixelImage::from_fn(Size::new(24, 16), |x, y| {
            Argb::rgb((x * 10) as u8, (y * 15) as u8, 77)
        });
        BlurRequest::new(image, radius, ratio).unwrap()
    }

    #[test]
    fn radius_zero_passes_through_unchanged() {
        let req = request(0, 0.25);
        let out = NativeBlurProcessor::new().blur(&req).unwrap();
        assert_eq!(&out, req.image());
    }

    #[test]
    fn null_outcome_maps_to_null_result() {
        let processor =
            NativeBlurProcessor::with_backend(FnBackend::new("null", |_, _, _, _, _| NativeOutcome::Null));
        assert_eq!(processor.blur(&request(4, 0.5)), Err(BlurError::NullResult));
    }

    #[test]
    fn fault_keeps_diagnostic() {
        let processor = NativeBlurProcessor::with_backend(FnBackend::new("fault", |_, _, _, _, _| {
            NativeOutcome::Fault("out of texture memory".into())
        }));
        let err = processor.blur(&request(4, 0.5)).unwrap_err();
        assert_eq!(err.diagnostic(), Some("out of texture memory"));
    }

    #[test]
    fn panic_becomes_native_fault() {
        let processor = NativeBlurProcessor::with_backend(FnBackend::new("boom", |_, _, _, _, _| {
            panic!("kernel exploded")
        }));
        let err = processor.blur(&request(4, 0.5)).unwrap_err();
        assert_eq!(err, BlurError::NativeFault("kernel exploded".into()));
    }

    #[test]
    fn truncated_output_is_never_success() {
        let processor = NativeBlurProcessor::with_backend(FnBackend::new("short", |px, _, _, _, _| {
            NativeOutcome::Image(px[..px.len() / 2].to_vec())
        }));
        assert!(matches!(
            processor.blur(&request(4, 0.5)),
            Err(BlurError::NativeFault(_))
        ));
    }

    #[test]
    #[tracing_test::traced_test]
    fn failures_are_logged_with_the_diagnostic() {
        let processor = NativeBlurProcessor::with_backend(FnBackend::new("fault", |_, _, _, _, _| {
            NativeOutcome::Fault("bitmap recycled".into())
        }));
        let _ = processor.blur(&request(2, 1.0));
        assert!(logs_contain("native blur failed"));
        assert!(logs_contain("bitmap recycled"));
    }
}
