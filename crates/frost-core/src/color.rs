#![forbid(unsafe_code)]

//! Packed 32-bit ARGB color.
//!
//! Layout matches the platform's color ints: `0xAARRGGBB`. Channels are stored
//! as straight (non-premultiplied) alpha.

use std::fmt;

/// A packed `0xAARRGGBB` color.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Argb(pub u32);

impl Argb {
    /// Fully transparent (alpha = 0).
    pub const TRANSPARENT: Self = Self(0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Create an opaque RGB color (alpha = 255).
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::argb(255, r, g, b)
    }

    /// Create a color with explicit alpha.
    #[inline]
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    /// Alpha channel.
    #[inline]
    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Red channel.
    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Green channel.
    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Blue channel.
    #[inline]
    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    /// Same color with the alpha channel replaced.
    #[inline]
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self((self.0 & 0x00ff_ffff) | ((a as u32) << 24))
    }

    /// Same alpha with the color channels replaced by those of `rgb`.
    #[inline]
    #[must_use]
    pub const fn with_rgb_of(self, rgb: Self) -> Self {
        Self((self.0 & 0xff00_0000) | (rgb.0 & 0x00ff_ffff))
    }

    #[inline]
    const fn div_round_u8(numer: u64, denom: u64) -> u8 {
        debug_assert!(denom != 0);
        let v = (numer + (denom / 2)) / denom;
        if v > 255 { 255 } else { v as u8 }
    }

    /// Porter-Duff SourceOver: `self over dst`.
    ///
    /// Computed in exact rational form and rounded once at the end.
    #[inline]
    #[must_use]
    pub fn over(self, dst: Self) -> Self {
        let s_a = self.a() as u64;
        if s_a == 255 {
            return self;
        }
        if s_a == 0 {
            return dst;
        }

        let d_a = dst.a() as u64;
        let inv_s_a = 255 - s_a;

        // numer_a = 255*s_a + d_a*(255 - s_a), i.e. out_a in the 255^2 domain.
        let numer_a = 255 * s_a + d_a * inv_s_a;
        if numer_a == 0 {
            return Self::TRANSPARENT;
        }
        let out_a = Self::div_round_u8(numer_a, 255);

        let channel = |src: u8, dst: u8| {
            Self::div_round_u8(
                (src as u64) * s_a * 255 + (dst as u64) * d_a * inv_s_a,
                numer_a,
            )
        };

        Self::argb(
            out_a,
            channel(self.r(), dst.r()),
            channel(self.g(), dst.g()),
            channel(self.b(), dst.b()),
        )
    }
}

impl From<u32> for Argb {
    #[inline]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Argb> for u32 {
    #[inline]
    fn from(value: Argb) -> Self {
        value.0
    }
}

impl fmt::Debug for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Argb(#{:08X})", self.0)
    }
}

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_accessors_follow_argb_layout() {
        let c = Argb(0x80_11_22_33);
        assert_eq!((c.a(), c.r(), c.g(), c.b()), (0x80, 0x11, 0x22, 0x33));
        assert_eq!(Argb::argb(0x80, 0x11, 0x22, 0x33), c);
    }

    #[test]
    fn with_alpha_keeps_rgb() {
        let c = Argb::rgb(10, 20, 30).with_alpha(7);
        assert_eq!(c.a(), 7);
        assert_eq!((c.r(), c.g(), c.b()), (10, 20, 30));
    }

    #[test]
    fn over_with_extreme_alphas() {
        let src = Argb::rgb(200, 0, 0);
        let dst = Argb::rgb(0, 0, 200);
        assert_eq!(src.over(dst), src);
        assert_eq!(src.with_alpha(0).over(dst), dst);
    }

    #[test]
    fn half_black_over_white_is_mid_gray() {
        let out = Argb::BLACK.with_alpha(128).over(Argb::WHITE);
        assert_eq!(out.a(), 255);
        assert!((out.r() as i32 - 127).abs() <= 1);
        assert_eq!(out.r(), out.g());
        assert_eq!(out.g(), out.b());
    }

    #[test]
    fn debug_is_hex() {
        assert_eq!(format!("{:?}", Argb(0xFF00FF00)), "Argb(#FF00FF00)");
    }
}
