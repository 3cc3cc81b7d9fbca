#![forbid(unsafe_code)]

//! One-call dialog styling: background, blur, then dim.

use std::sync::Arc;

use frost_blur::NativeBlur;
use frost_core::{Argb, PlatformCapabilities};
use frost_runtime::{
    BlurAttributes, BlurStrategyDispatcher, ContentRoot, DialogBackdrop, DialogWindow,
    DispatchOutcome, EngineConfig,
};
use frost_style::{
    Background, BackgroundDrawableCache, CornerRadii, IconSource, ModalIndicator, StyleFingerprint,
};

use crate::Result;

/// A dialog window that can also take a background.
pub trait StyledWindow: DialogWindow {
    fn set_background(&mut self, background: Background);
}

/// Visual attributes of one dialog. Intensities are percentages (0-100),
/// radii are in dp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleAttributes {
    pub behind_blur: bool,
    pub behind_blur_intensity: u8,
    pub background_blur: bool,
    pub background_blur_intensity: u8,
    pub behind_blur_force: bool,
    pub dim: bool,
    pub dim_intensity: u8,
    pub corner_radii: CornerRadii,
    pub background_color: Argb,
    /// Replaces the generated background entirely.
    pub custom_background_drawable_id: Option<u32>,
    pub show_modal_indicator: bool,
    /// Icon for the modal indicator; the built-in dot when unset.
    pub custom_modal_icon_id: Option<u32>,
}

impl Default for StyleAttributes {
    fn default() -> Self {
        Self {
            behind_blur: false,
            behind_blur_intensity: 0,
            background_blur: false,
            background_blur_intensity: 0,
            behind_blur_force: false,
            dim: false,
            dim_intensity: 0,
            corner_radii: CornerRadii::uniform(0.0),
            background_color: Argb::WHITE,
            custom_background_drawable_id: None,
            show_modal_indicator: false,
            custom_modal_icon_id: None,
        }
    }
}

impl StyleAttributes {
    #[must_use]
    pub const fn blur_attributes(&self) -> BlurAttributes {
        BlurAttributes {
            behind_blur: self.behind_blur,
            behind_blur_intensity: self.behind_blur_intensity,
            background_blur: self.background_blur,
            background_blur_intensity: self.background_blur_intensity,
            behind_blur_force: self.behind_blur_force,
            dim: self.dim,
            dim_intensity: self.dim_intensity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleOutcome {
    pub background: Background,
    pub dispatch: DispatchOutcome,
}

/// Applies [`StyleAttributes`] to a dialog host.
///
/// Backgrounds come from a shared [`BackgroundDrawableCache`]; clone the
/// `Arc` from [`DialogStyler::cache`] into another styler to share entries.
#[derive(Debug)]
pub struct DialogStyler {
    caps: PlatformCapabilities,
    cache: Arc<BackgroundDrawableCache>,
    dispatcher: BlurStrategyDispatcher,
}

impl Default for DialogStyler {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            caps: PlatformCapabilities::default(),
            cache: Arc::new(BackgroundDrawableCache::new(config.cache_capacity)),
            dispatcher: BlurStrategyDispatcher::new(config),
        }
    }
}

impl DialogStyler {
    /// Validate `config` and build a styler for a platform with `caps`.
    pub fn new(config: EngineConfig, caps: PlatformCapabilities) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            caps,
            cache: Arc::new(BackgroundDrawableCache::new(config.cache_capacity)),
            dispatcher: BlurStrategyDispatcher::new(config),
        })
    }

    /// Configuration from `FROST_*` variables, capabilities from detection
    /// plus any active override.
    pub fn from_env() -> Result<Self> {
        let config = EngineConfig::from_env()?;
        Self::new(config, PlatformCapabilities::with_overrides())
    }

    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn NativeBlur>) -> Self {
        self.dispatcher = self.dispatcher.with_backend(backend);
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<BackgroundDrawableCache>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_capabilities(mut self, caps: PlatformCapabilities) -> Self {
        self.caps = caps;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        self.dispatcher.config()
    }

    pub fn capabilities(&self) -> &PlatformCapabilities {
        &self.caps
    }

    pub fn cache(&self) -> &Arc<BackgroundDrawableCache> {
        &self.cache
    }

    pub fn dispatcher(&self) -> &BlurStrategyDispatcher {
        &self.dispatcher
    }

    /// Cache key for `attrs` at the current density.
    #[must_use]
    pub fn fingerprint(&self, attrs: &StyleAttributes) -> StyleFingerprint {
        let density = self.caps.density;
        let mut fp = StyleFingerprint::from_dp(attrs.corner_radii, density, attrs.background_color);
        if attrs.show_modal_indicator {
            let icon = attrs
                .custom_modal_icon_id
                .map_or(IconSource::Default, IconSource::Resource);
            let size = self.caps.dp_to_px(self.config().modal_indicator_dp);
            let size = if size.is_finite() && size > 0.0 { size as u32 } else { 0 };
            fp = fp.with_modal_indicator(ModalIndicator::new(icon, size));
        }
        if let Some(id) = attrs.custom_background_drawable_id {
            fp = fp.with_custom_drawable(id);
        }
        fp
    }

    /// Background for `attrs`, built on first use and cached afterwards.
    pub fn background(&self, attrs: &StyleAttributes) -> Background {
        self.cache.resolve(&self.fingerprint(attrs))
    }

    /// Set the background, then blur, then dim.
    pub fn apply<W: StyledWindow>(
        &self,
        attrs: &StyleAttributes,
        window: &mut W,
        root: &mut dyn ContentRoot,
        backdrop: &mut DialogBackdrop,
    ) -> StyleOutcome {
        let span = tracing::debug_span!("dialog_style", density = self.caps.density);
        let _enter = span.enter();

        let background = self.background(attrs);
        window.set_background(background.clone());

        let dispatch = self
            .dispatcher
            .apply(&attrs.blur_attributes(), &self.caps, window, root, backdrop);
        tracing::debug!(
            strategy = dispatch.strategy.as_str(),
            degraded = dispatch.degraded.is_some(),
            "dialog styled"
        );
        StyleOutcome {
            background,
            dispatch,
        }
    }
}
