#![forbid(unsafe_code)]

//! Bitmap blur compute path.
//!
//! A [`BlurRequest`] is validated up front, handed to a [`NativeBlur`] backend
//! through [`NativeBlurProcessor`], and comes back as a [`BlurResult`]: either
//! a new image with the input's dimensions or a typed [`BlurError`].
//!
//! # Example
//!
//! ```
//! use frost_blur::{BlurRequest, NativeBlurProcessor, PixelImage};
//! use frost_core::{Argb, Size};
//!
//! let image = PixelImage::filled(Size::new(64, 48), Argb::rgb(40, 80, 120));
//! let request = BlurRequest::new(image, 8, 0.5).unwrap();
//! let blurred = NativeBlurProcessor::new().blur(&request).unwrap();
//! assert_eq!(blurred.size(), Size::new(64, 48));
//! ```
//!
//! The call blocks the invoking thread. There is no timeout: a backend that
//! never returns stalls the caller.

pub mod error;
pub mod image;
pub mod native;
pub mod processor;
pub mod request;
pub mod stack_blur;

pub use error::{BlurError, BlurResult, RequestError};
pub use image::PixelImage;
pub use native::{FnBackend, NativeBlur, NativeOutcome, StackBlurBackend};
pub use processor::NativeBlurProcessor;
pub use request::{BlurRequest, MAX_RADIUS};
