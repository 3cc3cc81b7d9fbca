#![forbid(unsafe_code)]

//! Dialog background styling for Frost.
//!
//! - [`StyleFingerprint`] - value-equality key over the style parameters
//! - [`LayeredDrawable`] - rounded-rect fill, optionally with a modal indicator
//! - [`Background`] - what a dialog window ends up painted with
//! - [`BackgroundDrawableCache`] - bounded LRU of built drawables
//!
//! # Example
//! ```
//! use frost_core::Argb;
//! use frost_style::{Background, BackgroundDrawableCache, CornerRadii, StyleFingerprint};
//!
//! let cache = BackgroundDrawableCache::with_default_capacity();
//! let fp = StyleFingerprint::new(CornerRadii::uniform(16.0), Argb::WHITE);
//!
//! let first = cache.resolve(&fp);
//! let second = cache.resolve(&fp);
//! assert_eq!(first, second);
//! assert_eq!(cache.stats().hits, 1);
//! assert!(matches!(first, Background::Layered(_)));
//! ```

pub mod cache;
pub mod drawable;
pub mod fingerprint;
pub mod lru;

pub use cache::{BackgroundDrawableCache, CacheStats, DEFAULT_CACHE_CAPACITY};
pub use drawable::{Background, DotIcon, IconPainter, Layer, LayeredDrawable, PaintOp, Placement};
pub use fingerprint::{CornerRadii, IconSource, ModalIndicator, StyleFingerprint};
pub use lru::ArenaLru;
