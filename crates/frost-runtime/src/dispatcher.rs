#![forbid(unsafe_code)]

//! Blur strategy selection and application.
//!
//! Decision order for a dialog:
//!
//! 1. Neither behind nor background blur requested: no blur action.
//! 2. Compositor blur usable for a requested target: set window radii.
//! 3. Behind blur forced: attach a [`SurfaceBlurRenderer`].
//! 4. One-shot fallback enabled, capability known, backdrop capturable: blur a
//!    captured bitmap once through the native processor.
//! 5. Otherwise no blur.
//!
//! Dimming is applied independently of the chosen strategy. Nothing here
//! fails the dialog: every error degrades to less blur.

use std::sync::Arc;

use frost_blur::{BlurError, BlurRequest, MAX_RADIUS, NativeBlur, PixelImage};
use frost_core::{Argb, BlurTargets, PlatformCapabilities};

use crate::config::EngineConfig;
use crate::lifecycle::{SurfaceLifecycleState, SurfaceSignal, TransitionError};
use crate::surface::{BackdropSource, SurfaceBlurRenderer, SurfaceLayoutHandle, SurfaceSettings};
use crate::{SharedProcessor, default_processor};

/// Blur and dim settings of one dialog. Intensities are percentages (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlurAttributes {
    pub behind_blur: bool,
    pub behind_blur_intensity: u8,
    pub background_blur: bool,
    pub background_blur_intensity: u8,
    /// Use the surface renderer when the compositor cannot blur.
    pub behind_blur_force: bool,
    pub dim: bool,
    pub dim_intensity: u8,
}

impl BlurAttributes {
    #[must_use]
    pub const fn wants_blur(&self) -> bool {
        self.behind_blur || self.background_blur
    }

    /// Targets the caller asked for.
    #[must_use]
    pub fn requested_targets(&self) -> BlurTargets {
        let mut targets = BlurTargets::empty();
        targets.set(BlurTargets::BEHIND, self.behind_blur);
        targets.set(BlurTargets::BACKGROUND, self.background_blur);
        targets
    }
}

/// Window-side operations the dispatcher needs from the host.
pub trait DialogWindow {
    /// Compositor blur of the window's own background, in px.
    fn set_background_blur_radius(&mut self, radius: u32);
    /// Compositor blur of everything behind the window, in px.
    fn set_blur_behind_radius(&mut self, radius: u32);
    /// Enable window dimming at `amount` in `[0, 1]`.
    fn set_dim_amount(&mut self, amount: f32);

    fn supports_backdrop_capture(&self) -> bool {
        false
    }

    /// Pixels behind the dialog, for the one-shot fallback.
    fn capture_backdrop(&mut self) -> Option<PixelImage> {
        None
    }

    fn set_backdrop_image(&mut self, _image: PixelImage) {}
}

/// The dialog's root content view.
pub trait ContentRoot {
    /// Insert the surface below every other child.
    fn insert_surface_at_bottom(&mut self, surface: SurfaceLayoutHandle);
    /// Where the surface samples its backdrop from.
    fn backdrop_source(&self) -> Arc<dyn BackdropSource>;
}

/// Strategy chosen for a dialog, with its computed radii.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurStrategy {
    None,
    Compositor {
        background_radius: Option<u32>,
        behind_radius: Option<u32>,
    },
    SurfaceRenderer {
        radius: u32,
    },
    NativeOneShot {
        radius: u32,
    },
}

impl BlurStrategy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Compositor { .. } => "compositor",
            Self::SurfaceRenderer { .. } => "surface",
            Self::NativeOneShot { .. } => "native_one_shot",
        }
    }
}

/// How the dim was applied, if at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DimApplication {
    /// Overlay color on the surface renderer.
    Overlay(Argb),
    /// Window dim amount.
    WindowAmount(f32),
}

/// Degradation that happened while applying a strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Degradation {
    /// The native processor failed; the backdrop stays unblurred.
    Native(BlurError),
    /// The surface renderer could not be started or attached.
    Surface(TransitionError),
    /// Nothing to blur: capture failed or produced an unusable image.
    NoBackdrop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub strategy: BlurStrategy,
    pub dim: Option<DimApplication>,
    pub degraded: Option<Degradation>,
}

/// Per-dialog holder for the surface renderer; at most one at a time.
#[derive(Debug, Default)]
pub struct DialogBackdrop {
    renderer: Option<Arc<SurfaceBlurRenderer>>,
}

impl DialogBackdrop {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The attached renderer; hosts forward lifecycle signals to it.
    pub fn renderer(&self) -> Option<&Arc<SurfaceBlurRenderer>> {
        self.renderer.as_ref()
    }

    /// Forward a host signal to the attached renderer, if any.
    ///
    /// A renderer that reaches `Destroyed` is released.
    pub fn signal(&mut self, signal: SurfaceSignal) -> Option<SurfaceLifecycleState> {
        let renderer = self.renderer.as_ref()?;
        let state = match renderer.signal(signal) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(error = %err, "surface renderer dropped");
                SurfaceLifecycleState::Destroyed
            }
        };
        if state.is_terminal() {
            self.renderer = None;
        }
        Some(state)
    }

    /// Destroy and release the current renderer.
    pub fn clear(&mut self) {
        if let Some(old) = self.renderer.take() {
            old.destroy();
        }
    }

    fn install(&mut self, renderer: Arc<SurfaceBlurRenderer>) {
        self.clear();
        self.renderer = Some(renderer);
    }
}

impl Drop for DialogBackdrop {
    fn drop(&mut self) {
        self.clear();
    }
}

/// `intensity / 100 * max_radius`, truncated toward zero.
pub(crate) fn scaled_radius(intensity: u8, max_radius: f64) -> u32 {
    let intensity = f64::from(intensity.min(100));
    let radius = (intensity * max_radius / 100.0).trunc();
    if radius.is_finite() && radius > 0.0 {
        radius as u32
    } else {
        0
    }
}

pub struct BlurStrategyDispatcher {
    config: EngineConfig,
    processor: SharedProcessor,
}

impl Default for BlurStrategyDispatcher {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for BlurStrategyDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlurStrategyDispatcher")
            .field("config", &self.config)
            .field("backend", &self.processor.backend().name())
            .finish()
    }
}

impl BlurStrategyDispatcher {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            processor: default_processor(),
        }
    }

    /// Use `backend` for both the one-shot path and surface frames.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn NativeBlur>) -> Self {
        self.processor = SharedProcessor::with_backend(backend);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Pick a strategy without touching any host object.
    #[must_use]
    pub fn select(
        &self,
        attrs: &BlurAttributes,
        caps: &PlatformCapabilities,
        can_capture: bool,
    ) -> BlurStrategy {
        if !attrs.wants_blur() {
            return BlurStrategy::None;
        }

        let usable = caps.usable_compositor_targets() & attrs.requested_targets();
        if !usable.is_empty() {
            let max = f64::from(caps.dp_to_px(self.config.compositor_max_radius_dp));
            return BlurStrategy::Compositor {
                background_radius: usable
                    .contains(BlurTargets::BACKGROUND)
                    .then(|| scaled_radius(attrs.background_blur_intensity, max)),
                behind_radius: usable
                    .contains(BlurTargets::BEHIND)
                    .then(|| scaled_radius(attrs.behind_blur_intensity, max)),
            };
        }

        // App-side radii feed the stack blur tables.
        let surface_max = f64::from(self.config.surface_max_radius);
        let kernel_radius = scaled_radius(attrs.behind_blur_intensity, surface_max).min(MAX_RADIUS);
        if attrs.behind_blur_force {
            return BlurStrategy::SurfaceRenderer { radius: kernel_radius };
        }

        if self.config.one_shot_fallback && caps.is_capability_known() && can_capture {
            return BlurStrategy::NativeOneShot { radius: kernel_radius };
        }

        BlurStrategy::None
    }

    /// Select a strategy and wire it into the host.
    pub fn apply(
        &self,
        attrs: &BlurAttributes,
        caps: &PlatformCapabilities,
        window: &mut dyn DialogWindow,
        root: &mut dyn ContentRoot,
        backdrop: &mut DialogBackdrop,
    ) -> DispatchOutcome {
        let strategy = self.select(attrs, caps, window.supports_backdrop_capture());
        let span = tracing::debug_span!("blur_dispatch", strategy = strategy.as_str());
        let _enter = span.enter();

        let degraded = match strategy {
            BlurStrategy::None => None,
            BlurStrategy::Compositor {
                background_radius,
                behind_radius,
            } => {
                if let Some(radius) = background_radius {
                    window.set_background_blur_radius(radius);
                }
                if let Some(radius) = behind_radius {
                    window.set_blur_behind_radius(radius);
                }
                tracing::debug!(?background_radius, ?behind_radius, "compositor blur applied");
                None
            }
            BlurStrategy::SurfaceRenderer { radius } => self.attach_surface(radius, attrs, root, backdrop),
            BlurStrategy::NativeOneShot { radius } => self.run_one_shot(radius, window),
        };

        let dim = attrs.dim.then(|| self.apply_dim(attrs.dim_intensity, window, backdrop));
        DispatchOutcome {
            strategy,
            dim,
            degraded,
        }
    }

    fn attach_surface(
        &self,
        radius: u32,
        attrs: &BlurAttributes,
        root: &mut dyn ContentRoot,
        backdrop: &mut DialogBackdrop,
    ) -> Option<Degradation> {
        backdrop.clear();

        let mut settings = SurfaceSettings::from_config(&self.config, attrs.behind_blur_intensity);
        settings.radius = radius;
        let renderer = match SurfaceBlurRenderer::builder(settings)
            .processor(self.processor.clone())
            .spawn(root.backdrop_source())
        {
            Ok(renderer) => Arc::new(renderer),
            Err(err) => {
                tracing::warn!(error = %err, "surface renderer unavailable, no blur");
                return Some(Degradation::Surface(err));
            }
        };

        if let Err(err) = renderer.attach() {
            tracing::warn!(error = %err, "surface renderer failed to attach, no blur");
            return Some(Degradation::Surface(err));
        }
        root.insert_surface_at_bottom(renderer.layout_handle());
        tracing::debug!(radius, "surface renderer attached");
        backdrop.install(renderer);
        None
    }

    fn run_one_shot(&self, radius: u32, window: &mut dyn DialogWindow) -> Option<Degradation> {
        let Some(image) = window.capture_backdrop() else {
            tracing::warn!("backdrop capture failed, no blur");
            return Some(Degradation::NoBackdrop);
        };
        let request = match BlurRequest::new(image, radius, self.config.one_shot_resize_ratio) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = %err, "captured backdrop unusable, no blur");
                return Some(Degradation::NoBackdrop);
            }
        };
        match self.processor.blur(&request) {
            Ok(blurred) => {
                window.set_backdrop_image(blurred);
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "native blur failed, backdrop left unblurred");
                Some(Degradation::Native(err))
            }
        }
    }

    fn apply_dim(
        &self,
        intensity: u8,
        window: &mut dyn DialogWindow,
        backdrop: &DialogBackdrop,
    ) -> DimApplication {
        let intensity = intensity.min(100);
        match backdrop.renderer() {
            Some(renderer) => {
                let color = self.config.dim_encoding.overlay_color(intensity);
                renderer.set_background_color(color);
                DimApplication::Overlay(color)
            }
            None => {
                let amount = f32::from(intensity) / 100.0;
                window.set_dim_amount(amount);
                DimApplication::WindowAmount(amount)
            }
        }
    }
}
