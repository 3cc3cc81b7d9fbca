#![forbid(unsafe_code)]

//! Owned ARGB pixel buffers and resampling.
//!
//! Pixels are row-major `0xAARRGGBB` words: `pixels[y * width + x]`.

use frost_core::{Argb, Size};

use crate::error::RequestError;

/// An owned, row-major ARGB image.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelImage {
    size: Size,
    pixels: Vec<u32>,
}

impl PixelImage {
    /// Wrap a pixel buffer, checking that it matches the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self, RequestError> {
        if width == 0 || height == 0 {
            return Err(RequestError::EmptyImage { width, height });
        }
        let size = Size::new(width, height);
        if pixels.len() != size.area() {
            return Err(RequestError::DimensionMismatch {
                expected: size.area(),
                actual: pixels.len(),
            });
        }
        Ok(Self { size, pixels })
    }

    /// A solid image. Empty sizes produce an empty buffer.
    #[must_use]
    pub fn filled(size: Size, color: Argb) -> Self {
        Self {
            size,
            pixels: vec![color.0; size.area()],
        }
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(size: Size, mut f: impl FnMut(u32, u32) -> Argb) -> Self {
        let mut pixels = Vec::with_capacity(size.area());
        for y in 0..size.height {
            for x in 0..size.width {
                pixels.push(f(x, y).0);
            }
        }
        Self { size, pixels }
    }

    #[inline]
    pub const fn size(&self) -> Size {
        self.size
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.size.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.size.height
    }

    /// Raw pixel words, row-major.
    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Give up ownership of the pixel words.
    #[inline]
    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }

    /// Pixel at `(x, y)`, or `None` out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Argb> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        Some(Argb(self.pixels[self.index(x, y)]))
    }

    /// Set pixel at `(x, y)`; out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Argb) {
        if x < self.size.width && y < self.size.height {
            let idx = self.index(x, y);
            self.pixels[idx] = color.0;
        }
    }

    /// Composite `color` over the pixel at `(x, y)`; out-of-bounds is ignored.
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Argb) {
        if x < self.size.width && y < self.size.height {
            let idx = self.index(x, y);
            self.pixels[idx] = color.over(Argb(self.pixels[idx])).0;
        }
    }

    /// Composite `color` over every pixel.
    pub fn overlay(&mut self, color: Argb) {
        if color.a() == 0 {
            return;
        }
        for p in &mut self.pixels {
            *p = color.over(Argb(*p)).0;
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.size.width as usize + x as usize
    }

    /// Resample to `target`.
    ///
    /// Shrinking averages every source pixel that falls into a destination
    /// pixel; growing (on either axis) interpolates bilinearly. Equal sizes
    /// return a copy.
    #[must_use]
    pub fn resized(&self, target: Size) -> Self {
        if target == self.size || self.size.is_empty() {
            return self.clone();
        }
        if target.is_empty() {
            return Self::filled(target, Argb::TRANSPARENT);
        }
        if target.width <= self.size.width && target.height <= self.size.height {
            self.downsample_area(target)
        } else {
            self.upsample_bilinear(target)
        }
    }

    fn downsample_area(&self, target: Size) -> Self {
        let (sw, sh) = (self.size.width as u64, self.size.height as u64);
        let (tw, th) = (target.width as u64, target.height as u64);
        let mut out = Vec::with_capacity(target.area());

        for dy in 0..th {
            let y0 = dy * sh / th;
            let y1 = ((dy + 1) * sh / th).max(y0 + 1).min(sh);
            for dx in 0..tw {
                let x0 = dx * sw / tw;
                let x1 = ((dx + 1) * sw / tw).max(x0 + 1).min(sw);

                let mut acc = [0u64; 4];
                for y in y0..y1 {
                    let row = (y * sw) as usize;
                    for x in x0..x1 {
                        let p = Argb(self.pixels[row + x as usize]);
                        acc[0] += p.a() as u64;
                        acc[1] += p.r() as u64;
                        acc[2] += p.g() as u64;
                        acc[3] += p.b() as u64;
                    }
                }
                let count = (y1 - y0) * (x1 - x0);
                let avg = |v: u64| ((v + count / 2) / count) as u8;
                out.push(Argb::argb(avg(acc[0]), avg(acc[1]), avg(acc[2]), avg(acc[3])).0);
            }
        }

        Self {
            size: target,
            pixels: out,
        }
    }

    fn upsample_bilinear(&self, target: Size) -> Self {
        let (sw, sh) = (self.size.width, self.size.height);
        let sx = sw as f32 / target.width as f32;
        let sy = sh as f32 / target.height as f32;
        let mut out = Vec::with_capacity(target.area());

        for dy in 0..target.height {
            let fy = ((dy as f32 + 0.5) * sy - 0.5).clamp(0.0, (sh - 1) as f32);
            let y0 = fy.floor() as u32;
            let y1 = (y0 + 1).min(sh - 1);
            let wy = fy - y0 as f32;

            for dx in 0..target.width {
                let fx = ((dx as f32 + 0.5) * sx - 0.5).clamp(0.0, (sw - 1) as f32);
                let x0 = fx.floor() as u32;
                let x1 = (x0 + 1).min(sw - 1);
                let wx = fx - x0 as f32;

                let p00 = Argb(self.pixels[self.index(x0, y0)]);
                let p10 = Argb(self.pixels[self.index(x1, y0)]);
                let p01 = Argb(self.pixels[self.index(x0, y1)]);
                let p11 = Argb(self.pixels[self.index(x1, y1)]);

                let lerp = |c00: u8, c10: u8, c01: u8, c11: u8| {
                    let top = c00 as f32 + (c10 as f32 - c00 as f32) * wx;
                    let bottom = c01 as f32 + (c11 as f32 - c01 as f32) * wx;
                    (top + (bottom - top) * wy).round().clamp(0.0, 255.0) as u8
                };

                out.push(
                    Argb::argb(
                        lerp(p00.a(), p10.a(), p01.a(), p11.a()),
                        lerp(p00.r(), p10.r(), p01.r(), p11.r()),
                        lerp(p00.g(), p10.g(), p01.g(), p11.g()),
                        lerp(p00.b(), p10.b(), p01.b(), p11.b()),
                    )
                    .0,
                );
            }
        }

        Self {
            size: target,
            pixels: out,
        }
    }
}

impl std::fmt::Debug for PixelImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelImage")
            .field("width", &self.size.width)
            .field("height", &self.size.height)
            .finish_non_exhaustive()
    }
}
