#![forbid(unsafe_code)]

//! Every backend behavior maps to exactly one typed outcome.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use frost_blur::{
    BlurError, BlurRequest, FnBackend, NativeBlur, NativeBlurProcessor, NativeOutcome, PixelImage,
};
use frost_core::{Argb, Size};

fn gradient(width: u32, height: u32) -> PixelImage {
    PixelImage::from_fn(Size::new(width, height), |x, y| {
        Argb::argb(0xFF, (x * 7) as u8, (y * 5) as u8, ((x + y) * 3) as u8)
    })
}

#[test]
fn backend_sees_exact_request_parameters() {
    let seen = Arc::new(std::sync::Mutex::new(None));
    let sink = Arc::clone(&seen);
    let backend = FnBackend::new("recorder", move |px: &[u32], w, h, r, ratio| {
        *sink.lock().unwrap() = Some((px.len(), w, h, r, ratio));
        NativeOutcome::Image(px.to_vec())
    });
    let request = BlurRequest::new(gradient(30, 20), 12, 0.45).unwrap();
    NativeBlurProcessor::with_backend(backend)
        .blur(&request)
        .unwrap();
    assert_eq!(*seen.lock().unwrap(), Some((600, 30, 20, 12, 0.45)));
}

#[test]
fn null_output_is_null_result_not_success() {
    let processor =
        NativeBlurProcessor::with_backend(FnBackend::new("null", |_, _, _, _, _| NativeOutcome::Null));
    let request = BlurRequest::new(gradient(8, 8), 3, 0.5).unwrap();
    let err = processor.blur(&request).unwrap_err();
    assert_eq!(err, BlurError::NullResult);
    assert_eq!(err.diagnostic(), None);
}

#[test]
fn panic_with_formatted_payload_is_recovered() {
    let processor = NativeBlurProcessor::with_backend(FnBackend::new("boom", |_, w, _, _, _| {
        panic!("row {w} out of bounds")
    }));
    let request = BlurRequest::new(gradient(8, 4), 3, 0.5).unwrap();
    assert_eq!(
        processor.blur(&request),
        Err(BlurError::NativeFault("row 8 out of bounds".into()))
    );
}

#[test]
fn processor_stays_usable_after_a_fault() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let backend = FnBackend::new("flaky", move |px: &[u32], _, _, _, _| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("first call fails");
        }
        NativeOutcome::Image(px.to_vec())
    });
    let processor = NativeBlurProcessor::with_backend(backend);
    let request = BlurRequest::new(gradient(6, 6), 2, 1.0).unwrap();

    assert!(processor.blur(&request).is_err());
    assert_eq!(processor.blur(&request).unwrap(), *request.image());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn oversized_output_is_a_fault() {
    let processor = NativeBlurProcessor::with_backend(FnBackend::new("long", |px: &[u32], _, _, _, _| {
        let mut out = px.to_vec();
        out.push(0);
        NativeOutcome::Image(out)
    }));
    let request = BlurRequest::new(gradient(5, 5), 1, 1.0).unwrap();
    let err = processor.blur(&request).unwrap_err();
    assert!(err.diagnostic().is_some_and(|d| d.contains("26 pixels")));
}

#[test]
fn shared_backend_through_arc() {
    let backend: Arc<dyn NativeBlur> = Arc::new(frost_blur::StackBlurBackend::new());
    let processor = NativeBlurProcessor::with_backend(backend);
    let request = BlurRequest::new(gradient(40, 30), 10, 0.25).unwrap();
    let out = processor.blur(&request).unwrap();
    assert_eq!(out.size(), Size::new(40, 30));
    assert_ne!(out, *request.image());
}
