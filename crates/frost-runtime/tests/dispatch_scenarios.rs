#![forbid(unsafe_code)]

//! End-to-end strategy dispatch against a fake host window and view tree.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use frost_blur::{BlurError, FnBackend, MAX_RADIUS, NativeBlur, NativeOutcome, PixelImage};
use frost_core::capability_override::{CapabilityOverride, with_capability_override};
use frost_core::{Argb, PlatformCapabilities, Size};
use frost_runtime::{
    BackdropSource, BlurAttributes, BlurStrategy, BlurStrategyDispatcher, ContentRoot, Degradation,
    DialogBackdrop, DialogWindow, DimApplication, DimEncoding, EngineConfig, SurfaceLayoutHandle,
    SurfaceLifecycleState, SurfaceSignal,
};

// ── Fakes ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeWindow {
    background_radius: Option<u32>,
    behind_radius: Option<u32>,
    dim_amount: Option<f32>,
    capture: Option<PixelImage>,
    backdrop: Option<PixelImage>,
}

impl FakeWindow {
    fn capturing(image: PixelImage) -> Self {
        Self {
            capture: Some(image),
            ..Default::default()
        }
    }

    fn blur_untouched(&self) -> bool {
        self.background_radius.is_none() && self.behind_radius.is_none() && self.backdrop.is_none()
    }
}

impl DialogWindow for FakeWindow {
    fn set_background_blur_radius(&mut self, radius: u32) {
        self.background_radius = Some(radius);
    }

    fn set_blur_behind_radius(&mut self, radius: u32) {
        self.behind_radius = Some(radius);
    }

    fn set_dim_amount(&mut self, amount: f32) {
        self.dim_amount = Some(amount);
    }

    fn supports_backdrop_capture(&self) -> bool {
        self.capture.is_some()
    }

    fn capture_backdrop(&mut self) -> Option<PixelImage> {
        self.capture.clone()
    }

    fn set_backdrop_image(&mut self, image: PixelImage) {
        self.backdrop = Some(image);
    }
}

struct FakeRoot {
    surfaces: Vec<SurfaceLayoutHandle>,
    /// Surface state observed at insertion time.
    inserted_in: Vec<SurfaceLifecycleState>,
}

impl FakeRoot {
    fn new() -> Self {
        Self {
            surfaces: Vec::new(),
            inserted_in: Vec::new(),
        }
    }
}

impl ContentRoot for FakeRoot {
    fn insert_surface_at_bottom(&mut self, surface: SurfaceLayoutHandle) {
        surface.set_bounds(Size::new(32, 24));
        self.inserted_in.push(surface.state());
        self.surfaces.insert(0, surface);
    }

    fn backdrop_source(&self) -> Arc<dyn BackdropSource> {
        Arc::new(|size: Size| {
            Some(PixelImage::from_fn(size, |x, y| {
                Argb::rgb((x * 8) as u8, (y * 10) as u8, 200)
            }))
        })
    }
}

fn checkerboard() -> PixelImage {
    PixelImage::from_fn(Size::new(20, 20), |x, y| {
        if (x + y) % 2 == 0 { Argb::WHITE } else { Argb::BLACK }
    })
}

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

fn fast_config() -> EngineConfig {
    EngineConfig::default().with_frame_interval(Duration::from_millis(2))
}

// ── Scenarios ───────────────────────────────────────────────────────────

#[test]
fn compositor_radius_at_half_intensity_and_double_density() {
    let attrs = BlurAttributes {
        background_blur: true,
        background_blur_intensity: 50,
        ..Default::default()
    };
    let mut window = FakeWindow::default();
    let mut backdrop = DialogBackdrop::new();
    let outcome = BlurStrategyDispatcher::default().apply(
        &attrs,
        &PlatformCapabilities::modern(2.0),
        &mut window,
        &mut FakeRoot::new(),
        &mut backdrop,
    );
    assert_eq!(window.background_radius, Some(30));
    assert_eq!(window.behind_radius, None);
    assert!(matches!(outcome.strategy, BlurStrategy::Compositor { .. }));
    assert!(backdrop.renderer().is_none());
}

#[test]
fn no_blur_requested_means_no_blur_mutation() {
    let attrs = BlurAttributes {
        behind_blur_force: true,
        behind_blur_intensity: 90,
        dim: true,
        dim_intensity: 30,
        ..Default::default()
    };
    let mut window = FakeWindow::capturing(checkerboard());
    let mut root = FakeRoot::new();
    let mut backdrop = DialogBackdrop::new();
    let dispatcher =
        BlurStrategyDispatcher::new(EngineConfig::default().with_one_shot_fallback(true));
    let outcome = dispatcher.apply(
        &attrs,
        &PlatformCapabilities::legacy(1.0),
        &mut window,
        &mut root,
        &mut backdrop,
    );
    assert_eq!(outcome.strategy, BlurStrategy::None);
    assert!(window.blur_untouched());
    assert!(root.surfaces.is_empty());
    // Dim is independent of blur.
    assert_eq!(window.dim_amount, Some(0.3));
}

#[test]
fn forced_surface_gets_dim_overlay_and_renders() {
    let attrs = BlurAttributes {
        behind_blur: true,
        behind_blur_intensity: 40,
        behind_blur_force: true,
        dim: true,
        dim_intensity: 50,
        ..Default::default()
    };
    let mut window = FakeWindow::default();
    let mut root = FakeRoot::new();
    let mut backdrop = DialogBackdrop::new();
    let outcome = BlurStrategyDispatcher::new(fast_config()).apply(
        &attrs,
        &PlatformCapabilities::legacy(2.0),
        &mut window,
        &mut root,
        &mut backdrop,
    );

    assert_eq!(outcome.strategy, BlurStrategy::SurfaceRenderer { radius: 10 });
    assert_eq!(outcome.dim, Some(DimApplication::Overlay(Argb::argb(128, 0, 0, 0))));
    assert_eq!(window.dim_amount, None);
    assert_eq!(root.surfaces.len(), 1);

    let renderer = Arc::clone(backdrop.renderer().unwrap());
    assert_eq!(renderer.state(), SurfaceLifecycleState::Attached);
    assert_eq!(renderer.settings().radius, 10);
    assert_eq!(backdrop.signal(SurfaceSignal::Visible), Some(SurfaceLifecycleState::Rendering));
    assert!(wait_for(|| root.surfaces[0].latest_frame().is_some()));

    backdrop.signal(SurfaceSignal::Destroy);
    assert!(backdrop.renderer().is_none());
    assert_eq!(renderer.state(), SurfaceLifecycleState::Destroyed);
}

#[test]
fn surface_is_inserted_only_once_attached() {
    let attrs = BlurAttributes {
        behind_blur: true,
        behind_blur_intensity: 60,
        behind_blur_force: true,
        ..Default::default()
    };
    let mut root = FakeRoot::new();
    let mut backdrop = DialogBackdrop::new();
    let outcome = BlurStrategyDispatcher::new(fast_config()).apply(
        &attrs,
        &PlatformCapabilities::legacy(1.0),
        &mut FakeWindow::default(),
        &mut root,
        &mut backdrop,
    );
    assert_eq!(outcome.degraded, None);
    assert_eq!(root.inserted_in, [SurfaceLifecycleState::Attached]);
    assert_eq!(root.surfaces[0].state(), SurfaceLifecycleState::Attached);

    backdrop.signal(SurfaceSignal::Destroy);
    assert_eq!(root.surfaces[0].state(), SurfaceLifecycleState::Destroyed);
}

#[test]
fn oversized_surface_radius_is_clamped_to_kernel_limit() {
    let attrs = BlurAttributes {
        behind_blur: true,
        behind_blur_intensity: 100,
        behind_blur_force: true,
        ..Default::default()
    };
    let config = fast_config().with_surface_max_radius(300.0);
    assert!(config.validate().is_err());

    let mut root = FakeRoot::new();
    let mut backdrop = DialogBackdrop::new();
    let outcome = BlurStrategyDispatcher::new(config).apply(
        &attrs,
        &PlatformCapabilities::legacy(1.0),
        &mut FakeWindow::default(),
        &mut root,
        &mut backdrop,
    );
    assert_eq!(outcome.strategy, BlurStrategy::SurfaceRenderer { radius: MAX_RADIUS });
    assert_eq!(outcome.degraded, None);

    let renderer = Arc::clone(backdrop.renderer().unwrap());
    assert_eq!(renderer.settings().radius, MAX_RADIUS);
    backdrop.signal(SurfaceSignal::Visible);
    assert!(wait_for(|| renderer.frames_rendered() > 0));
    assert!(root.surfaces[0].latest_frame().is_some());
    backdrop.signal(SurfaceSignal::Destroy);
}

#[test]
fn oversized_one_shot_radius_is_clamped_and_blurs() {
    let attrs = BlurAttributes {
        behind_blur: true,
        behind_blur_intensity: 100,
        ..Default::default()
    };
    let config = EngineConfig::default()
        .with_one_shot_fallback(true)
        .with_surface_max_radius(300.0);
    let mut window = FakeWindow::capturing(checkerboard());
    let outcome = BlurStrategyDispatcher::new(config).apply(
        &attrs,
        &PlatformCapabilities::legacy(1.0),
        &mut window,
        &mut FakeRoot::new(),
        &mut DialogBackdrop::new(),
    );
    assert_eq!(outcome.strategy, BlurStrategy::NativeOneShot { radius: MAX_RADIUS });
    assert_eq!(outcome.degraded, None);
    assert!(window.backdrop.is_some());
}

#[test]
fn shifted_dim_encoding_on_surface() {
    let attrs = BlurAttributes {
        behind_blur: true,
        behind_blur_intensity: 100,
        behind_blur_force: true,
        dim: true,
        dim_intensity: 50,
        ..Default::default()
    };
    let config = fast_config().with_dim_encoding(DimEncoding::ShiftedPercent);
    let mut backdrop = DialogBackdrop::new();
    let outcome = BlurStrategyDispatcher::new(config).apply(
        &attrs,
        &PlatformCapabilities::unknown(),
        &mut FakeWindow::default(),
        &mut FakeRoot::new(),
        &mut backdrop,
    );
    assert_eq!(outcome.dim, Some(DimApplication::Overlay(Argb(0x3200_0000))));
    assert_eq!(backdrop.renderer().unwrap().background_color(), Argb(0x3200_0000));
}

#[test]
fn restyling_replaces_the_previous_renderer() {
    let attrs = BlurAttributes {
        behind_blur: true,
        behind_blur_intensity: 60,
        behind_blur_force: true,
        ..Default::default()
    };
    let dispatcher = BlurStrategyDispatcher::new(fast_config());
    let caps = PlatformCapabilities::legacy(1.0);
    let mut root = FakeRoot::new();
    let mut backdrop = DialogBackdrop::new();

    dispatcher.apply(&attrs, &caps, &mut FakeWindow::default(), &mut root, &mut backdrop);
    let first = Arc::clone(backdrop.renderer().unwrap());
    dispatcher.apply(&attrs, &caps, &mut FakeWindow::default(), &mut root, &mut backdrop);
    let second = Arc::clone(backdrop.renderer().unwrap());

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first.state(), SurfaceLifecycleState::Destroyed);
    assert_eq!(second.state(), SurfaceLifecycleState::Attached);
}

#[test]
fn destroy_while_rendering_stops_frames() {
    let attrs = BlurAttributes {
        behind_blur: true,
        behind_blur_intensity: 20,
        behind_blur_force: true,
        ..Default::default()
    };
    let mut root = FakeRoot::new();
    let mut backdrop = DialogBackdrop::new();
    BlurStrategyDispatcher::new(fast_config()).apply(
        &attrs,
        &PlatformCapabilities::legacy(1.0),
        &mut FakeWindow::default(),
        &mut root,
        &mut backdrop,
    );
    let renderer = Arc::clone(backdrop.renderer().unwrap());
    renderer.set_visible(true).unwrap();
    assert!(wait_for(|| renderer.frames_rendered() >= 2));

    renderer.destroy();
    let frames = renderer.frames_rendered();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(renderer.frames_rendered(), frames);
    assert_eq!(renderer.set_visible(true), Ok(SurfaceLifecycleState::Destroyed));
}

#[test]
fn native_null_result_degrades_to_dim_only() {
    let backend: Arc<dyn NativeBlur> =
        Arc::new(FnBackend::new("null", |_, _, _, _, _| NativeOutcome::Null));
    let dispatcher = BlurStrategyDispatcher::new(EngineConfig::default().with_one_shot_fallback(true))
        .with_backend(backend);
    let attrs = BlurAttributes {
        behind_blur: true,
        behind_blur_intensity: 70,
        dim: true,
        dim_intensity: 40,
        ..Default::default()
    };
    let mut window = FakeWindow::capturing(checkerboard());
    let outcome = dispatcher.apply(
        &attrs,
        &PlatformCapabilities::legacy(1.0),
        &mut window,
        &mut FakeRoot::new(),
        &mut DialogBackdrop::new(),
    );
    assert_eq!(outcome.strategy, BlurStrategy::NativeOneShot { radius: 17 });
    assert_eq!(outcome.degraded, Some(Degradation::Native(BlurError::NullResult)));
    assert!(window.backdrop.is_none());
    assert_eq!(window.dim_amount, Some(0.4));
}

#[test]
fn one_shot_installs_blurred_backdrop() {
    let dispatcher = BlurStrategyDispatcher::new(EngineConfig::default().with_one_shot_fallback(true));
    let attrs = BlurAttributes {
        behind_blur: true,
        behind_blur_intensity: 40,
        ..Default::default()
    };
    let source = checkerboard();
    let mut window = FakeWindow::capturing(source.clone());
    let outcome = dispatcher.apply(
        &attrs,
        &PlatformCapabilities::legacy(1.0),
        &mut window,
        &mut FakeRoot::new(),
        &mut DialogBackdrop::new(),
    );
    assert_eq!(outcome.degraded, None);
    let blurred = window.backdrop.expect("backdrop installed");
    assert_eq!(blurred.size(), source.size());
    assert_ne!(blurred, source);
}

#[test]
fn capability_override_drives_selection() {
    let dispatcher = BlurStrategyDispatcher::default();
    let attrs = BlurAttributes {
        behind_blur: true,
        behind_blur_intensity: 100,
        ..Default::default()
    };
    let base = PlatformCapabilities::modern(1.0);
    let strategy = with_capability_override(CapabilityOverride::legacy(), || {
        let caps = frost_core::capability_override::current_capabilities_with_base(base);
        dispatcher.select(&attrs, &caps, false)
    });
    assert_eq!(strategy, BlurStrategy::None);
    assert!(matches!(
        dispatcher.select(&attrs, &base, false),
        BlurStrategy::Compositor { behind_radius: Some(30), .. }
    ));
}
