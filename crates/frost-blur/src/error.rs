#![forbid(unsafe_code)]

//! Error types for blur requests and the native boundary.

use std::fmt;

/// A blur request that can never reach the native boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestError {
    /// Width or height is zero.
    EmptyImage { width: u32, height: u32 },
    /// Pixel buffer length does not match `width * height`.
    DimensionMismatch { expected: usize, actual: usize },
    /// Radius above what the kernel supports.
    RadiusTooLarge { radius: u32, max: u32 },
    /// Resize ratio outside `(0, 1]`.
    InvalidResizeRatio(f64),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyImage { width, height } => {
                write!(f, "image must be non-empty, got {width}x{height}")
            }
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "pixel buffer holds {actual} pixels, expected {expected}")
            }
            Self::RadiusTooLarge { radius, max } => {
                write!(f, "blur radius {radius} exceeds maximum {max}")
            }
            Self::InvalidResizeRatio(ratio) => {
                write!(f, "resize ratio {ratio} outside (0, 1]")
            }
        }
    }
}

impl std::error::Error for RequestError {}

/// Failure outcome of a native blur call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlurError {
    /// The native routine produced no output.
    NullResult,
    /// The native routine raised a fault; carries its diagnostic.
    NativeFault(String),
}

impl BlurError {
    /// Diagnostic text for a fault, `None` for a null result.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::NullResult => None,
            Self::NativeFault(msg) => Some(msg),
        }
    }
}

impl fmt::Display for BlurError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullResult => write!(f, "native blur produced no result"),
            Self::NativeFault(msg) => write!(f, "native blur fault: {msg}"),
        }
    }
}

impl std::error::Error for BlurError {}

/// Outcome of [`NativeBlurProcessor::blur`](crate::NativeBlurProcessor::blur).
pub type BlurResult = Result<crate::PixelImage, BlurError>;
