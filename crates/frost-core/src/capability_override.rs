#![forbid(unsafe_code)]

//! Thread-local capability overrides for tests and simulations.
//!
//! Overrides are scoped to the current thread, stack in push order, and are
//! removed by an RAII guard even on panic.
//!
//! # Example
//!
//! ```
//! use frost_core::capability_override::{with_capability_override, CapabilityOverride};
//! use frost_core::platform_capabilities::PlatformCapabilities;
//!
//! with_capability_override(CapabilityOverride::legacy(), || {
//!     let caps = PlatformCapabilities::with_overrides();
//!     assert!(!caps.supports_compositor_blur());
//! });
//! ```

use crate::platform_capabilities::{BlurTargets, PlatformCapabilities};
use std::cell::RefCell;

/// Capability fields to replace on top of a base profile.
///
/// `None` in any field leaves the base (or an earlier override) untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CapabilityOverride {
    /// `Some(None)` forces "capability unavailable".
    pub compositor_blur: Option<Option<bool>>,
    pub compositor_targets: Option<BlurTargets>,
    pub density: Option<f32>,
}

impl CapabilityOverride {
    /// Create a new empty override (no fields overridden).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            compositor_blur: None,
            compositor_targets: None,
            density: None,
        }
    }

    /// Compositor blur available for every target.
    #[must_use]
    pub const fn modern() -> Self {
        Self {
            compositor_blur: Some(Some(true)),
            compositor_targets: Some(BlurTargets::all()),
            density: None,
        }
    }

    /// Compositor blur reported as unsupported.
    #[must_use]
    pub const fn legacy() -> Self {
        Self {
            compositor_blur: Some(Some(false)),
            compositor_targets: Some(BlurTargets::empty()),
            density: None,
        }
    }

    /// Capability query cannot be answered.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            compositor_blur: Some(None),
            compositor_targets: Some(BlurTargets::empty()),
            density: None,
        }
    }

    /// Override compositor blur support.
    #[must_use]
    pub const fn compositor_blur(mut self, value: Option<Option<bool>>) -> Self {
        self.compositor_blur = value;
        self
    }

    /// Override compositor targets.
    #[must_use]
    pub const fn compositor_targets(mut self, value: Option<BlurTargets>) -> Self {
        self.compositor_targets = value;
        self
    }

    /// Override display density.
    #[must_use]
    pub const fn density(mut self, value: Option<f32>) -> Self {
        self.density = value;
        self
    }

    /// Check if any capability is overridden.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.compositor_blur.is_none() && self.compositor_targets.is_none() && self.density.is_none()
    }

    /// Apply this override on top of base capabilities.
    #[must_use]
    pub fn apply_to(&self, caps: PlatformCapabilities) -> PlatformCapabilities {
        let mut builder = PlatformCapabilities::builder()
            .compositor_blur(caps.compositor_blur)
            .compositor_targets(caps.compositor_targets)
            .density(caps.density);
        if let Some(v) = self.compositor_blur {
            builder = builder.compositor_blur(v);
        }
        if let Some(v) = self.compositor_targets {
            builder = builder.compositor_targets(v);
        }
        if let Some(v) = self.density {
            builder = builder.density(v);
        }
        builder.build()
    }
}

thread_local! {
    static OVERRIDE_STACK: RefCell<Vec<CapabilityOverride>> = const { RefCell::new(Vec::new()) };
}

/// RAII guard that removes an override when dropped.
#[must_use]
pub struct OverrideGuard {
    // Thread-local data; keep the guard !Send.
    _marker: std::marker::PhantomData<*const ()>,
}

impl Drop for OverrideGuard {
    fn drop(&mut self) {
        OVERRIDE_STACK.with(|stack| {
            if stack.borrow_mut().pop().is_none() {
                debug_assert!(false, "OverrideGuard dropped but stack was empty");
            }
        });
    }
}

/// Push an override onto the thread-local stack.
pub fn push_override(over: CapabilityOverride) -> OverrideGuard {
    OVERRIDE_STACK.with(|stack| stack.borrow_mut().push(over));
    crate::trace!(depth = override_depth(), "capability override pushed");
    OverrideGuard {
        _marker: std::marker::PhantomData,
    }
}

/// Run `f` with an override active.
pub fn with_capability_override<F, R>(over: CapabilityOverride, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = push_override(over);
    f()
}

/// Detected capabilities with every active override applied.
#[must_use]
pub fn current_capabilities() -> PlatformCapabilities {
    current_capabilities_with_base(PlatformCapabilities::detect())
}

/// `base` with every active override applied, bottom to top.
#[must_use]
pub fn current_capabilities_with_base(base: PlatformCapabilities) -> PlatformCapabilities {
    OVERRIDE_STACK.with(|stack| {
        let stack = stack.borrow();
        if stack.is_empty() {
            return base;
        }
        stack.iter().fold(base, |caps, over| over.apply_to(caps))
    })
}

/// Number of active overrides on this thread.
#[must_use]
pub fn override_depth() -> usize {
    OVERRIDE_STACK.with(|stack| stack.borrow().len())
}

impl PlatformCapabilities {
    /// Detect capabilities and apply any active thread-local overrides.
    #[must_use]
    pub fn with_overrides() -> Self {
        current_capabilities()
    }
}
