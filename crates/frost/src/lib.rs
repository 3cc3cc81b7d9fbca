#![forbid(unsafe_code)]

//! Frost public facade crate.
//!
//! Re-exports the types a dialog host needs and provides [`DialogStyler`],
//! which applies a complete style pass: background drawable, blur strategy,
//! and dim.

use std::fmt;

mod styler;

pub use styler::{DialogStyler, StyleAttributes, StyleOutcome, StyledWindow};

// --- Core re-exports -------------------------------------------------------

pub use frost_core::capability_override::{CapabilityOverride, with_capability_override};
pub use frost_core::{Argb, BlurTargets, PlatformCapabilities, PlatformProfile, Rect, Size};

#[cfg(feature = "tracing-json")]
pub use frost_core::logging::init_json_subscriber;

// --- Blur re-exports -------------------------------------------------------

pub use frost_blur::{
    BlurError, BlurRequest, BlurResult, NativeBlur, NativeBlurProcessor, NativeOutcome, PixelImage,
    RequestError, StackBlurBackend,
};

// --- Style re-exports ------------------------------------------------------

pub use frost_style::{
    Background, BackgroundDrawableCache, CacheStats, CornerRadii, IconSource, LayeredDrawable,
    ModalIndicator, StyleFingerprint,
};

// --- Runtime re-exports ----------------------------------------------------

pub use frost_runtime::{
    BackdropSource, BlurAttributes, BlurStrategy, BlurStrategyDispatcher, ConfigError,
    ContentRoot, Degradation, DialogBackdrop, DialogWindow, DimApplication, DimEncoding,
    DispatchOutcome, EngineConfig, SurfaceBlurRenderer, SurfaceLayoutHandle,
    SurfaceLifecycleState, SurfaceSignal, TransitionError,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Frost.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Config(ConfigError),
    Request(RequestError),
    Blur(BlurError),
    Transition(TransitionError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Request(err) => write!(f, "{err}"),
            Self::Blur(err) => write!(f, "{err}"),
            Self::Transition(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Request(err) => Some(err),
            Self::Blur(err) => Some(err),
            Self::Transition(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<RequestError> for Error {
    fn from(err: RequestError) -> Self {
        Self::Request(err)
    }
}

impl From<BlurError> for Error {
    fn from(err: BlurError) -> Self {
        Self::Blur(err)
    }
}

impl From<TransitionError> for Error {
    fn from(err: TransitionError) -> Self {
        Self::Transition(err)
    }
}

/// Standard result type for Frost APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Argb, Background, BlurAttributes, ContentRoot, CornerRadii, DialogBackdrop, DialogStyler,
        DialogWindow, EngineConfig, Error, PlatformCapabilities, Result, Size, StyleAttributes,
        StyledWindow, SurfaceSignal,
    };

    pub use crate::{blur, core, runtime, style};
}

pub use frost_blur as blur;
pub use frost_core as core;
pub use frost_runtime as runtime;
pub use frost_style as style;
