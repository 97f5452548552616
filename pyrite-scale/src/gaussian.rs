//! Separable 5x5 Gaussian blur expressed through round-halving adds.

use pyrite_core::RasterMut;

/// Byte-exact average with round half up.
#[inline]
fn rhadd(a: u8, b: u8) -> u8 {
    ((a as u16 + b as u16 + 1) >> 1) as u8
}

/// One sample of the (1, 4, 6, 4, 1) / 16 stencil over [a, b, c, d, e].
/// The fixed chain of halving adds, not the real-valued kernel, defines
/// the output bits.
#[inline]
fn stencil(a: u8, b: u8, c: u8, d: u8, e: u8) -> u8 {
    let long = rhadd(rhadd(rhadd(a, e), c), c);
    let short = rhadd(b, d);
    rhadd(long, short)
}

/// In-place 5x5 Gaussian blur with reflective borders.
///
/// The vertical pass runs first, then the horizontal pass over its
/// output. Each pass rolls a five-sample window down its line, so the
/// write to position i never disturbs the reads at i + 1 and i + 2 and no
/// scratch buffer is needed. Out-of-range samples reflect around the
/// border without repeating the edge sample: position -1 reads sample 1,
/// position n reads sample n - 2.
///
/// `width` and `height` must be at least 5.
pub fn gaussian_5x5(width: usize, height: usize, img: &mut RasterMut<'_>) {
    debug_assert!(width >= 5 && height >= 5);
    debug_assert!(img.covers(width, height, 0));

    // vertical pass
    for j in 0..width {
        let mut a = img.at(2, j);
        let mut b = img.at(1, j);
        let mut c = img.at(0, j);
        let mut d = img.at(1, j);
        for i in 0..height {
            let e = if i == height - 2 {
                c
            } else if i == height - 1 {
                a
            } else {
                img.at(i + 2, j)
            };
            img.set(i, j, stencil(a, b, c, d, e));
            a = b;
            b = c;
            c = d;
            d = e;
        }
    }

    // horizontal pass
    for i in 0..height {
        let mut a = img.at(i, 2);
        let mut b = img.at(i, 1);
        let mut c = img.at(i, 0);
        let mut d = img.at(i, 1);
        for j in 0..width {
            let e = if j == width - 2 {
                c
            } else if j == width - 1 {
                a
            } else {
                img.at(i, j + 2)
            };
            img.set(i, j, stencil(a, b, c, d, e));
            a = b;
            b = c;
            c = d;
            d = e;
        }
    }
}
