#![forbid(unsafe_code)]

//! Separable stack blur over ARGB words.
//!
//! A horizontal pass over rows followed by the same pass over the transposed
//! buffer. Each pass keeps a running weighted sum per channel, so the cost per
//! pixel is constant in the radius. Division by the kernel weight is replaced
//! with a multiply and shift from [`STACK_BLUR_MUL`] / [`STACK_BLUR_SHR`].
//!
//! Only R, G and B are blurred; every pixel keeps its own alpha.
//!
//! Rows are split into bands and processed on scoped worker threads.

use frost_core::Size;

/// Largest radius the lookup tables cover.
pub const MAX_STACK_RADIUS: u32 = 254;

/// Below this many pixels a pass runs on the calling thread only.
const PARALLEL_THRESHOLD: usize = 64 * 64;

/// Multiplication factors replacing division by the kernel weight, by radius.
#[rustfmt::skip]
pub const STACK_BLUR_MUL: [u32; 255] = [
    512,512,456,512,328,456,335,512,405,328,271,456,388,335,292,512,
    454,405,364,328,298,271,496,456,420,388,360,335,312,292,273,512,
    482,454,428,405,383,364,345,328,312,298,284,271,259,496,475,456,
    437,420,404,388,374,360,347,335,323,312,302,292,282,273,265,512,
    497,482,468,454,441,428,417,405,394,383,373,364,354,345,337,328,
    320,312,305,298,291,284,278,271,265,259,507,496,485,475,465,456,
    446,437,428,420,412,404,396,388,381,374,367,360,354,347,341,335,
    329,323,318,312,307,302,297,292,287,282,278,273,269,265,261,512,
    505,497,489,482,475,468,461,454,447,441,435,428,422,417,411,405,
    399,394,389,383,378,373,368,364,359,354,350,345,341,337,332,328,
    324,320,316,312,309,305,301,298,294,291,287,284,281,278,274,271,
    268,265,262,259,257,507,501,496,491,485,480,475,470,465,460,456,
    451,446,442,437,433,428,424,420,416,412,408,404,400,396,392,388,
    385,381,377,374,370,367,363,360,357,354,350,347,344,341,338,335,
    332,329,326,323,320,318,315,312,310,307,304,302,299,297,294,292,
    289,287,285,282,280,278,275,273,271,269,267,265,263,261,259,
];

/// Right-shift amounts paired with [`STACK_BLUR_MUL`], by radius.
#[rustfmt::skip]
pub const STACK_BLUR_SHR: [u32; 255] = [
     9, 11, 12, 13, 13, 14, 14, 15, 15, 15, 15, 16, 16, 16, 16, 17,
    17, 17, 17, 17, 17, 17, 18, 18, 18, 18, 18, 18, 18, 18, 18, 19,
    19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 19, 20, 20, 20,
    20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 21,
    21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 21,
    21, 21, 21, 21, 21, 21, 21, 21, 21, 21, 22, 22, 22, 22, 22, 22,
    22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22,
    22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 22, 23,
    23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23,
    23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23,
    23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23, 23,
    23, 23, 23, 23, 23, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24,
    24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24,
    24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24,
    24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24,
    24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24, 24,
];

/// Number of worker threads the host offers, at least one.
#[must_use]
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Blur `pixels` (row-major, `size.width * size.height`) in place.
///
/// `radius` is clamped to [`MAX_STACK_RADIUS`]; radius 0 leaves the buffer
/// untouched. `workers` bounds the number of threads per pass.
pub fn stack_blur(pixels: &mut [u32], size: Size, radius: u32, workers: usize) {
    if radius == 0 || size.is_empty() {
        return;
    }
    debug_assert_eq!(pixels.len(), size.area());
    let radius = radius.min(MAX_STACK_RADIUS) as usize;

    blur_rows(pixels, size.width as usize, radius, workers);

    let mut transposed = vec![0u32; pixels.len()];
    transpose(pixels, size, &mut transposed);
    blur_rows(&mut transposed, size.height as usize, radius, workers);
    transpose(&transposed, size.transposed(), pixels);
}

/// Copy `src` (of `size`) into `dst` with rows and columns swapped.
pub fn transpose(src: &[u32], size: Size, dst: &mut [u32]) {
    let (w, h) = (size.width as usize, size.height as usize);
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for (x, &p) in row.iter().enumerate() {
            dst[x * h + y] = p;
        }
    }
}

fn blur_rows(pixels: &mut [u32], width: usize, radius: usize, workers: usize) {
    let rows = pixels.len() / width;
    let workers = workers.clamp(1, rows.max(1));

    if workers == 1 || pixels.len() < PARALLEL_THRESHOLD {
        let mut stack = vec![0u32; radius * 2 + 1];
        for line in pixels.chunks_mut(width) {
            blur_line(line, radius, &mut stack);
        }
        return;
    }

    let rows_per_band = rows.div_ceil(workers);
    std::thread::scope(|scope| {
        for band in pixels.chunks_mut(rows_per_band * width) {
            scope.spawn(move || {
                let mut stack = vec![0u32; radius * 2 + 1];
                for line in band.chunks_mut(width) {
                    blur_line(line, radius, &mut stack);
                }
            });
        }
    });
}

#[inline]
fn channels(p: u32) -> [u64; 3] {
    [
        ((p >> 16) & 0xff) as u64,
        ((p >> 8) & 0xff) as u64,
        (p & 0xff) as u64,
    ]
}

/// One stack-blur pass over a single line, edges extended.
fn blur_line(line: &mut [u32], radius: usize, stack: &mut [u32]) {
    let len = line.len();
    if len == 0 {
        return;
    }
    let last = len - 1;
    let div = radius * 2 + 1;
    let mul = STACK_BLUR_MUL[radius] as u64;
    let shr = STACK_BLUR_SHR[radius];

    let mut sum = [0u64; 3];
    let mut sum_in = [0u64; 3];
    let mut sum_out = [0u64; 3];

    let first = line[0];
    let c = channels(first);
    for i in 0..=radius {
        stack[i] = first;
        let weight = (i + 1) as u64;
        for k in 0..3 {
            sum[k] += c[k] * weight;
            sum_out[k] += c[k];
        }
    }
    for i in 1..=radius {
        let p = line[i.min(last)];
        stack[i + radius] = p;
        let c = channels(p);
        let weight = (radius + 1 - i) as u64;
        for k in 0..3 {
            sum[k] += c[k] * weight;
            sum_in[k] += c[k];
        }
    }

    let mut stack_ptr = radius;
    let mut src = radius.min(last);

    for x in 0..len {
        let r = ((sum[0] * mul) >> shr) & 0xff;
        let g = ((sum[1] * mul) >> shr) & 0xff;
        let b = ((sum[2] * mul) >> shr) & 0xff;
        line[x] = (line[x] & 0xff00_0000) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32;

        for k in 0..3 {
            sum[k] -= sum_out[k];
        }

        let mut stack_start = stack_ptr + div - radius;
        if stack_start >= div {
            stack_start -= div;
        }
        let leaving = channels(stack[stack_start]);
        for k in 0..3 {
            sum_out[k] -= leaving[k];
        }

        if src < last {
            src += 1;
        }
        // Pixels ahead of `x` are still unblurred, so reading in place is safe.
        let entering = line[src];
        stack[stack_start] = entering;
        let c = channels(entering);
        for k in 0..3 {
            sum_in[k] += c[k];
            sum[k] += sum_in[k];
        }

        stack_ptr += 1;
        if stack_ptr >= div {
            stack_ptr = 0;
        }
        let c = channels(stack[stack_ptr]);
        for k in 0..3 {
            sum_out[k] += c[k];
            sum_in[k] -= c[k];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_zero_is_identity() {
        let mut pixels: Vec<u32> = (0..64).map(|i| 0xff00_0000 | (i * 0x030507)).collect();
        let before = pixels.clone();
        stack_blur(&mut pixels, Size::new(8, 8), 0, 4);
        assert_eq!(pixels, before);
    }

    #[test]
    fn solid_color_is_fixed_point() {
        let color = 0xff_40_80_c0;
        let mut pixels = vec![color; 50 * 30];
        stack_blur(&mut pixels, Size::new(50, 30), 7, 3);
        assert!(pixels.iter().all(|&p| p == color));
    }

    #[test]
    fn alpha_is_preserved_per_pixel() {
        let mut pixels: Vec<u32> = (0..100u32).map(|i| ((i * 2) << 24) | 0x00ff_ffff * (i % 2)).collect();
        let alphas: Vec<u32> = pixels.iter().map(|p| p >> 24).collect();
        stack_blur(&mut pixels, Size::new(10, 10), 3, 1);
        let after: Vec<u32> = pixels.iter().map(|p| p >> 24).collect();
        assert_eq!(alphas, after);
    }

    #[test]
    fn impulse_spreads_symmetrically() {
        let mut pixels = vec![0xff00_0000u32; 9];
        pixels[4] = 0xffff_ffff;
        stack_blur(&mut pixels, Size::new(9, 1), 2, 1);
        let red: Vec<u32> = pixels.iter().map(|p| (p >> 16) & 0xff).collect();
        assert_eq!(red[3], red[5]);
        assert_eq!(red[2], red[6]);
        assert!(red[4] > red[3] && red[3] > red[2]);
        assert_eq!(red[0], 0);
    }

    #[test]
    fn parallel_matches_serial() {
        let size = Size::new(97, 83);
        let source: Vec<u32> = (0..size.area() as u32)
            .map(|i| 0xff00_0000 | i.wrapping_mul(2_654_435_761) & 0x00ff_ffff)
            .collect();
        let mut serial = source.clone();
        let mut parallel = source;
        stack_blur(&mut serial, size, 9, 1);
        stack_blur(&mut parallel, size, 9, 4);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn oversize_radius_is_clamped() {
        let mut pixels = vec![0xff_10_20_30u32; 4 * 4];
        stack_blur(&mut pixels, Size::new(4, 4), 10_000, 1);
        assert!(pixels.iter().all(|&p| p == 0xff_10_20_30));
    }

    #[test]
    fn transpose_swaps_axes() {
        let src = [1, 2, 3, 4, 5, 6];
        let mut dst = [0; 6];
        transpose(&src, Size::new(3, 2), &mut dst);
        assert_eq!(dst, [1, 4, 2, 5, 3, 6]);
    }
}
