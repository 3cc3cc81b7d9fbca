#![forbid(unsafe_code)]

//! Platform blur capability model.
//!
//! Describes whether the host compositor can blur windows itself, which blur
//! targets it supports, and the display density used to convert dp radii into
//! physical pixels.
//!
//! # Detection Strategy
//!
//! Hosts usually construct capabilities explicitly from what the windowing
//! layer reports. [`PlatformCapabilities::detect`] exists for headless runs and
//! reads:
//! - `FROST_PLATFORM_PROFILE`: `modern`, `legacy`, or `unknown`
//! - `FROST_COMPOSITOR_BLUR`: `1`/`true` or `0`/`false`
//! - `FROST_DISPLAY_DENSITY`: positive float scale factor
//!
//! # Invariants
//!
//! 1. **Unknown is unsupported**: when the compositor capability cannot be
//!    answered (`compositor_blur == None`), [`supports_compositor_blur`]
//!    returns `false`. Callers never see an error for this.
//! 2. **Density is sane**: density is always finite and `> 0`; invalid input
//!    falls back to `1.0`.
//! 3. **Detection determinism**: the same environment always yields the same
//!    capabilities.
//!
//! [`supports_compositor_blur`]: PlatformCapabilities::supports_compositor_blur

use std::env;

bitflags::bitflags! {
    /// Blur targets a dialog can request or a compositor can provide.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BlurTargets: u8 {
        /// Blur everything behind the dialog window.
        const BEHIND     = 0b01;
        /// Blur the dialog window's own background surface.
        const BACKGROUND = 0b10;
    }
}

/// Density used when none is reported.
pub const DEFAULT_DENSITY: f32 = 1.0;

#[derive(Debug, Clone, Default)]
struct DetectInputs {
    profile: Option<String>,
    compositor_blur: Option<String>,
    density: Option<String>,
}

impl DetectInputs {
    fn from_env() -> Self {
        Self {
            profile: env::var("FROST_PLATFORM_PROFILE").ok(),
            compositor_blur: env::var("FROST_COMPOSITOR_BLUR").ok(),
            density: env::var("FROST_DISPLAY_DENSITY").ok(),
        }
    }
}

/// Known platform profile identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformProfile {
    /// Compositor blur available for both targets.
    Modern,
    /// Older platform without compositor blur.
    Legacy,
    /// Capability reporting unavailable.
    Unknown,
    /// Custom profile (user-defined).
    Custom,
    /// Auto-detected from environment.
    Detected,
}

impl PlatformProfile {
    /// Get the profile name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Modern => "modern",
            Self::Legacy => "legacy",
            Self::Unknown => "unknown",
            Self::Custom => "custom",
            Self::Detected => "detected",
        }
    }
}

impl std::str::FromStr for PlatformProfile {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "modern" | "compositor" => Ok(Self::Modern),
            "legacy" | "old" => Ok(Self::Legacy),
            "unknown" => Ok(Self::Unknown),
            "custom" => Ok(Self::Custom),
            "detected" | "auto" => Ok(Self::Detected),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for PlatformProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the platform can do for dialog backdrops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformCapabilities {
    profile: PlatformProfile,
    /// Compositor-level blur support; `None` when the platform cannot answer.
    pub compositor_blur: Option<bool>,
    /// Targets the compositor can blur when `compositor_blur` is `Some(true)`.
    pub compositor_targets: BlurTargets,
    /// Display density scale (physical px per dp).
    pub density: f32,
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self::unknown()
    }
}

impl PlatformCapabilities {
    /// The profile these capabilities were built from.
    #[must_use]
    pub const fn profile(&self) -> PlatformProfile {
        self.profile
    }

    /// Compositor blur with both targets at the given density.
    #[must_use]
    pub fn modern(density: f32) -> Self {
        Self {
            profile: PlatformProfile::Modern,
            compositor_blur: Some(true),
            compositor_targets: BlurTargets::all(),
            density: sanitize_density(density),
        }
    }

    /// No compositor blur at the given density.
    #[must_use]
    pub fn legacy(density: f32) -> Self {
        Self {
            profile: PlatformProfile::Legacy,
            compositor_blur: Some(false),
            compositor_targets: BlurTargets::empty(),
            density: sanitize_density(density),
        }
    }

    /// Capability reporting unavailable.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            profile: PlatformProfile::Unknown,
            compositor_blur: None,
            compositor_targets: BlurTargets::empty(),
            density: DEFAULT_DENSITY,
        }
    }

    /// Start a custom profile.
    #[must_use]
    pub fn builder() -> CapabilityProfileBuilder {
        CapabilityProfileBuilder::new()
    }

    /// Whether compositor blur is usable. Unknown counts as unsupported.
    #[inline]
    #[must_use]
    pub fn supports_compositor_blur(&self) -> bool {
        self.compositor_blur.unwrap_or(false)
    }

    /// Whether the platform answered the compositor capability query.
    #[inline]
    #[must_use]
    pub const fn is_capability_known(&self) -> bool {
        self.compositor_blur.is_some()
    }

    /// Compositor targets usable right now (empty unless supported).
    #[must_use]
    pub fn usable_compositor_targets(&self) -> BlurTargets {
        if self.supports_compositor_blur() {
            self.compositor_targets
        } else {
            BlurTargets::empty()
        }
    }

    /// Convert density-independent pixels to physical pixels.
    #[inline]
    #[must_use]
    pub fn dp_to_px(&self, dp: f32) -> f32 {
        dp * self.density
    }

    /// Detect capabilities from the environment.
    #[must_use]
    pub fn detect() -> Self {
        Self::detect_from_inputs(&DetectInputs::from_env())
    }

    fn detect_from_inputs(inputs: &DetectInputs) -> Self {
        let density = match inputs.density.as_deref() {
            Some(raw) => match raw.trim().parse::<f32>() {
                Ok(v) if v.is_finite() && v > 0.0 => v,
                _ => {
                    crate::warn!(value = raw, "ignoring invalid FROST_DISPLAY_DENSITY");
                    DEFAULT_DENSITY
                }
            },
            None => DEFAULT_DENSITY,
        };

        let mut caps = match inputs
            .profile
            .as_deref()
            .and_then(|p| p.parse::<PlatformProfile>().ok())
        {
            Some(PlatformProfile::Modern) => Self::modern(density),
            Some(PlatformProfile::Legacy) => Self::legacy(density),
            _ => Self {
                density,
                ..Self::unknown()
            },
        };

        if let Some(flag) = inputs.compositor_blur.as_deref().and_then(parse_flag) {
            caps.compositor_blur = Some(flag);
            caps.compositor_targets = if flag {
                BlurTargets::all()
            } else {
                BlurTargets::empty()
            };
        }

        caps.profile = PlatformProfile::Detected;
        crate::debug!(
            density = caps.density,
            compositor_blur = ?caps.compositor_blur,
            "platform capabilities detected"
        );
        caps
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn sanitize_density(density: f32) -> f32 {
    if density.is_finite() && density > 0.0 {
        density
    } else {
        DEFAULT_DENSITY
    }
}

/// Builder for custom capability profiles.
#[derive(Debug, Clone)]
pub struct CapabilityProfileBuilder {
    caps: PlatformCapabilities,
}

impl Default for CapabilityProfileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityProfileBuilder {
    /// Start from unknown capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self {
            caps: PlatformCapabilities {
                profile: PlatformProfile::Custom,
                ..PlatformCapabilities::unknown()
            },
        }
    }

    /// Build the capabilities.
    #[must_use]
    pub fn build(self) -> PlatformCapabilities {
        self.caps
    }

    /// Set compositor blur support (`None` = unavailable).
    #[must_use]
    pub fn compositor_blur(mut self, supported: Option<bool>) -> Self {
        self.caps.compositor_blur = supported;
        self
    }

    /// Set the compositor's supported targets.
    #[must_use]
    pub fn compositor_targets(mut self, targets: BlurTargets) -> Self {
        self.caps.compositor_targets = targets;
        self
    }

    /// Set display density.
    #[must_use]
    pub fn density(mut self, density: f32) -> Self {
        self.caps.density = sanitize_density(density);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(profile: Option<&str>, blur: Option<&str>, density: Option<&str>) -> DetectInputs {
        DetectInputs {
            profile: profile.map(str::to_string),
            compositor_blur: blur.map(str::to_string),
            density: density.map(str::to_string),
        }
    }

    #[test]
    fn empty_environment_is_unknown_and_unsupported() {
        let caps = PlatformCapabilities::detect_from_inputs(&DetectInputs::default());
        assert!(!caps.is_capability_known());
        assert!(!caps.supports_compositor_blur());
        assert_eq!(caps.density, DEFAULT_DENSITY);
        assert_eq!(caps.profile(), PlatformProfile::Detected);
    }

    #[test]
    fn modern_profile_from_env() {
        let caps = PlatformCapabilities::detect_from_inputs(&inputs(Some("modern"), None, Some("2.75")));
        assert!(caps.supports_compositor_blur());
        assert_eq!(caps.usable_compositor_targets(), BlurTargets::all());
        assert_eq!(caps.density, 2.75);
    }

    #[test]
    fn explicit_flag_overrides_profile() {
        let caps = PlatformCapabilities::detect_from_inputs(&inputs(Some("modern"), Some("off"), None));
        assert_eq!(caps.compositor_blur, Some(false));
        assert!(caps.usable_compositor_targets().is_empty());
    }

    #[test]
    fn garbage_values_fall_back() {
        let caps = PlatformCapabilities::detect_from_inputs(&inputs(Some("??"), Some("maybe"), Some("-3")));
        assert!(!caps.is_capability_known());
        assert_eq!(caps.density, DEFAULT_DENSITY);
    }

    #[test]
    fn unsupported_targets_are_hidden() {
        let caps = PlatformCapabilities::builder()
            .compositor_blur(Some(false))
            .compositor_targets(BlurTargets::all())
            .build();
        assert!(caps.usable_compositor_targets().is_empty());
    }

    #[test]
    fn dp_conversion_uses_density() {
        assert_eq!(PlatformCapabilities::modern(2.0).dp_to_px(30.0), 60.0);
    }

    #[test]
    fn profile_round_trips_through_str() {
        for p in [PlatformProfile::Modern, PlatformProfile::Legacy, PlatformProfile::Unknown] {
            assert_eq!(p.as_str().parse::<PlatformProfile>(), Ok(p));
        }
    }
}
