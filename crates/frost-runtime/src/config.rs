#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! Defaults reproduce the stock dialog look. Every field can be overridden
//! through builder methods, `FROST_*` environment variables, or (with the
//! `serde` feature) a JSON document.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `FROST_COMPOSITOR_MAX_RADIUS_DP` | [`EngineConfig::compositor_max_radius_dp`] |
//! | `FROST_SURFACE_MAX_RADIUS` | [`EngineConfig::surface_max_radius`] |
//! | `FROST_ONE_SHOT_FALLBACK` | [`EngineConfig::one_shot_fallback`] |
//! | `FROST_ONE_SHOT_RESIZE_RATIO` | [`EngineConfig::one_shot_resize_ratio`] |
//! | `FROST_SURFACE_RESIZE_RATIO` | [`EngineConfig::surface_resize_ratio`] |
//! | `FROST_FRAME_INTERVAL_MS` | [`EngineConfig::frame_interval_ms`] |
//! | `FROST_DIM_ENCODING` | [`EngineConfig::dim_encoding`] |
//! | `FROST_CACHE_CAPACITY` | [`EngineConfig::cache_capacity`] |
//! | `FROST_MODAL_INDICATOR_DP` | [`EngineConfig::modal_indicator_dp`] |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use frost_blur::MAX_RADIUS;
use frost_core::Argb;

/// How a dim intensity (0-100) becomes an overlay color on the surface path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DimEncoding {
    /// Black with alpha `round(intensity% * 255)`; matches the window dim amount.
    #[default]
    Proportional,
    /// Black with alpha equal to the raw intensity (`intensity << 24`).
    ShiftedPercent,
}

impl DimEncoding {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proportional => "proportional",
            Self::ShiftedPercent => "shifted_percent",
        }
    }

    /// Overlay color for `intensity`, clamped to 100.
    #[must_use]
    pub fn overlay_color(self, intensity: u8) -> Argb {
        let intensity = intensity.min(100);
        match self {
            Self::Proportional => {
                let alpha = (f32::from(intensity) / 100.0 * 255.0).round() as u8;
                Argb::argb(alpha, 0, 0, 0)
            }
            Self::ShiftedPercent => Argb(u32::from(intensity) << 24),
        }
    }
}

impl fmt::Display for DimEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DimEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "proportional" => Ok(Self::Proportional),
            "shifted_percent" | "shifted" => Ok(Self::ShiftedPercent),
            _ => Err(ConfigError::InvalidValue {
                key: "dim_encoding",
                value: s.to_string(),
                expected: "proportional | shifted_percent",
            }),
        }
    }
}

/// Configuration problems.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A value could not be parsed or is out of range.
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
    /// The configuration document is malformed.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                expected,
            } => write!(f, "invalid value {value:?} for {key}, expected {expected}"),
            Self::Parse(msg) => write!(f, "malformed configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunables for strategy selection, the surface renderer, and the cache.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Compositor blur radius at intensity 100, in dp.
    pub compositor_max_radius_dp: f32,
    /// Surface renderer blur radius at intensity 100, in px.
    pub surface_max_radius: f32,
    /// Run the native processor once on a captured backdrop when the
    /// compositor cannot blur and no surface is forced.
    pub one_shot_fallback: bool,
    pub one_shot_resize_ratio: f64,
    pub surface_resize_ratio: f64,
    /// Delay between surface frames.
    pub frame_interval_ms: u64,
    pub dim_encoding: DimEncoding,
    /// Background drawable cache size.
    pub cache_capacity: usize,
    /// Modal indicator edge length, in dp.
    pub modal_indicator_dp: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            compositor_max_radius_dp: 30.0,
            surface_max_radius: 25.0,
            one_shot_fallback: false,
            one_shot_resize_ratio: 0.45,
            surface_resize_ratio: 0.25,
            frame_interval_ms: 16,
            dim_encoding: DimEncoding::Proportional,
            cache_capacity: 10,
            modal_indicator_dp: 12.0,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_compositor_max_radius_dp(mut self, dp: f32) -> Self {
        self.compositor_max_radius_dp = dp;
        self
    }

    #[must_use]
    pub fn with_surface_max_radius(mut self, px: f32) -> Self {
        self.surface_max_radius = px;
        self
    }

    #[must_use]
    pub fn with_one_shot_fallback(mut self, enabled: bool) -> Self {
        self.one_shot_fallback = enabled;
        self
    }

    #[must_use]
    pub fn with_one_shot_resize_ratio(mut self, ratio: f64) -> Self {
        self.one_shot_resize_ratio = ratio;
        self
    }

    #[must_use]
    pub fn with_surface_resize_ratio(mut self, ratio: f64) -> Self {
        self.surface_resize_ratio = ratio;
        self
    }

    #[must_use]
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval_ms = interval.as_millis().max(1) as u64;
        self
    }

    #[must_use]
    pub fn with_dim_encoding(mut self, encoding: DimEncoding) -> Self {
        self.dim_encoding = encoding;
        self
    }

    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_modal_indicator_dp(mut self, dp: f32) -> Self {
        self.modal_indicator_dp = dp;
        self
    }

    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    /// Check every field is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        check_non_negative("compositor_max_radius_dp", self.compositor_max_radius_dp)?;
        check_non_negative("surface_max_radius", self.surface_max_radius)?;
        if self.surface_max_radius > MAX_RADIUS as f32 {
            return Err(invalid(
                "surface_max_radius",
                self.surface_max_radius.to_string(),
                "a radius no larger than 254",
            ));
        }
        check_non_negative("modal_indicator_dp", self.modal_indicator_dp)?;
        check_ratio("one_shot_resize_ratio", self.one_shot_resize_ratio)?;
        check_ratio("surface_resize_ratio", self.surface_resize_ratio)?;
        if self.frame_interval_ms == 0 {
            return Err(invalid("frame_interval_ms", "0", "a positive number of milliseconds"));
        }
        if self.cache_capacity == 0 {
            return Err(invalid("cache_capacity", "0", "at least 1"));
        }
        Ok(())
    }

    /// Defaults overlaid with `FROST_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup(variable_name)` onto `self`, then validate.
    ///
    /// Unset variables leave the field untouched.
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        if let Some(v) = lookup("FROST_COMPOSITOR_MAX_RADIUS_DP") {
            self.compositor_max_radius_dp = parse("compositor_max_radius_dp", &v, "a number")?;
        }
        if let Some(v) = lookup("FROST_SURFACE_MAX_RADIUS") {
            self.surface_max_radius = parse("surface_max_radius", &v, "a number")?;
        }
        if let Some(v) = lookup("FROST_ONE_SHOT_FALLBACK") {
            self.one_shot_fallback = parse_bool("one_shot_fallback", &v)?;
        }
        if let Some(v) = lookup("FROST_ONE_SHOT_RESIZE_RATIO") {
            self.one_shot_resize_ratio = parse("one_shot_resize_ratio", &v, "a number in (0, 1]")?;
        }
        if let Some(v) = lookup("FROST_SURFACE_RESIZE_RATIO") {
            self.surface_resize_ratio = parse("surface_resize_ratio", &v, "a number in (0, 1]")?;
        }
        if let Some(v) = lookup("FROST_FRAME_INTERVAL_MS") {
            self.frame_interval_ms = parse("frame_interval_ms", &v, "milliseconds")?;
        }
        if let Some(v) = lookup("FROST_DIM_ENCODING") {
            self.dim_encoding = v.parse()?;
        }
        if let Some(v) = lookup("FROST_CACHE_CAPACITY") {
            self.cache_capacity = parse("cache_capacity", &v, "a positive integer")?;
        }
        if let Some(v) = lookup("FROST_MODAL_INDICATOR_DP") {
            self.modal_indicator_dp = parse("modal_indicator_dp", &v, "a number")?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Parse a JSON document; missing fields keep their defaults.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn to_json_string(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

fn invalid(key: &'static str, value: impl Into<String>, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.into(),
        expected,
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str, expected: &'static str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| invalid(key, value, expected))
}

fn parse_bool(key: &'static str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "a boolean")),
    }
}

fn check_non_negative(key: &'static str, value: f32) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(key, value.to_string(), "a finite non-negative number"))
    }
}

fn check_ratio(key: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(key, value.to_string(), "a number in (0, 1]"))
    }
}
