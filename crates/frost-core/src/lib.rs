#![forbid(unsafe_code)]

//! Core: geometry, ARGB color, platform blur capabilities, and logging.

pub mod capability_override;
pub mod color;
pub mod geometry;
pub mod logging;
pub mod platform_capabilities;

pub use color::Argb;
pub use geometry::{Rect, Size};
pub use platform_capabilities::{BlurTargets, PlatformCapabilities, PlatformProfile};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, trace, warn};
