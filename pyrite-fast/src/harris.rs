//! Harris corner response via a 3x3 Sobel operator over a 6x6 window,
//! quantized to an 8-bit mini-float.

use pyrite_core::{Raster, RasterMut};

#[inline]
fn havg(a: i32, b: i32) -> i32 {
    (a + b) >> 1
}

/// Harris response at `(x, y)`, or 0 when the raw response does not exceed
/// `threshold`. Needs 4 pixels of margin on every side.
///
/// The gradients are built from truncating halving adds and subtracts, so
/// every intermediate fits a signed byte; this is what makes the result
/// reproducible regardless of how wide the arithmetic actually runs. Ixx
/// and Iyy are accumulated unsigned: the 36 per-pixel squares can pairwise
/// sum to 0x8000, which must not read back as negative. The >> 4 after
/// accumulation keeps (Ixx + Iyy)^2 inside 32 bits.
///
/// A positive response maps to the 8 bits at positions 20..28 of its
/// IEEE-754 single encoding: 5 exponent bits and 3 fraction bits, a
/// compact monotone log-like score.
pub fn harris_score(img: Raster<'_>, x: usize, y: usize, threshold: i32) -> u8 {
    debug_assert!(x >= 4 && y >= 4);

    // 8x8 patch; differences are valid on the inner 6x6.
    let mut p = [[0i32; 8]; 8];
    for (r, row) in p.iter_mut().enumerate() {
        let src = img.row(y + r - 3);
        for (j, v) in row.iter_mut().enumerate() {
            *v = src[x - 3 + j] as i32;
        }
    }

    let mut ixx: u32 = 0;
    let mut iyy: u32 = 0;
    let mut ixy: i32 = 0;

    for r in 0..6 {
        // halved vertical and horizontal differences
        let mut dv = [0i32; 8];
        for j in 0..8 {
            dv[j] = (p[r + 2][j] - p[r][j]) >> 1;
        }
        for j in 0..6 {
            let dy = havg(dv[j + 1], havg(dv[j], dv[j + 2]));

            let e0 = (p[r][j + 2] - p[r][j]) >> 1;
            let e1 = (p[r + 1][j + 2] - p[r + 1][j]) >> 1;
            let e2 = (p[r + 2][j + 2] - p[r + 2][j]) >> 1;
            let dx = havg(havg(e0, e2), e1);

            ixx += (dx * dx) as u32;
            iyy += (dy * dy) as u32;
            ixy += dx * dy;
        }
    }

    let ixx = ixx >> 4;
    let iyy = iyy >> 4;
    let ixy = ixy >> 4;

    let trace2 = (ixx + iyy).wrapping_mul(ixx + iyy) >> 4; // k = 1/16
    let det = (ixx.wrapping_mul(iyy) as i32).wrapping_sub(ixy.wrapping_mul(ixy));
    let score = det.wrapping_sub(trace2 as i32);

    if score > threshold {
        ((score as f32).to_bits() >> 20) as u8
    } else {
        0
    }
}

/// Replace every non-zero mark with the Harris response at its pixel.
/// Zero marks are skipped, so the cost tracks the detector's survivor
/// count rather than the image size.
pub fn fast_score_harris(
    width: usize,
    height: usize,
    border: usize,
    threshold: i32,
    img: Raster<'_>,
    marks: &mut RasterMut<'_>,
) {
    debug_assert!(border >= 4);

    for y in border..height.saturating_sub(border) {
        for x in border..width - border {
            if marks.at(y, x) == 0 {
                continue;
            }
            let score = harris_score(img, x, y, threshold);
            marks.set(y, x, score);
        }
    }
}
