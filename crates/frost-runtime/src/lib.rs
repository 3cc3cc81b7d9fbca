#![forbid(unsafe_code)]

//! Runtime side of Frost: deciding how a dialog backdrop is blurred and
//! keeping the legacy surface renderer alive for as long as the dialog is.
//!
//! - [`BlurStrategyDispatcher`] picks compositor blur, a forced
//!   [`SurfaceBlurRenderer`], a one-shot native blur, or nothing
//! - [`SurfaceBlurRenderer`] runs its own render thread driven by
//!   [`SurfaceSignal`]s
//! - [`EngineConfig`] holds every tunable

use std::sync::Arc;

use frost_blur::{NativeBlur, NativeBlurProcessor, StackBlurBackend};

pub mod config;
pub mod debug_trace;
pub mod dispatcher;
pub mod lifecycle;
pub mod surface;

pub use config::{ConfigError, ConfigResult, DimEncoding, EngineConfig};
pub use dispatcher::{
    BlurAttributes, BlurStrategy, BlurStrategyDispatcher, ContentRoot, Degradation, DialogBackdrop,
    DialogWindow, DimApplication, DispatchOutcome,
};
pub use lifecycle::{SurfaceLifecycleState, SurfaceSignal, TransitionError};
pub use surface::{
    BackdropSource, FrameSink, SurfaceBlurRenderer, SurfaceLayoutHandle, SurfaceRendererBuilder,
    SurfaceSettings,
};

/// Processor with a backend chosen at runtime, cheap to clone across threads.
pub type SharedProcessor = NativeBlurProcessor<Arc<dyn NativeBlur>>;

/// Processor over the in-process stack blur.
#[must_use]
pub fn default_processor() -> SharedProcessor {
    let backend: Arc<dyn NativeBlur> = Arc::new(StackBlurBackend::new());
    NativeBlurProcessor::with_backend(backend)
}
