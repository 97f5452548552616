//! The in-place kernels against independent direct evaluations: the blur
//! against a per-pixel stencil with explicit reflected indexing, the
//! downscalers against the whole-image tap formula applied to a pristine
//! copy of the input.

use pyrite_core::RasterMut;
use pyrite_scale::{bilinear_13_16, bilinear_7_8, gaussian_5x5};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_image(vstep: usize, width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut buf = vec![0u8; vstep * height];
    for y in 0..height {
        for x in 0..width {
            buf[y * vstep + x] = rng.gen();
        }
    }
    buf
}

fn rhadd(a: u8, b: u8) -> u8 {
    ((a as u16 + b as u16 + 1) >> 1) as u8
}

fn stencil(a: u8, b: u8, c: u8, d: u8, e: u8) -> u8 {
    rhadd(rhadd(rhadd(rhadd(a, e), c), c), rhadd(b, d))
}

/// Mirror an index into [0, n) without repeating the edge sample.
fn reflect(i: i64, n: i64) -> usize {
    let r = if i < 0 {
        -i
    } else if i >= n {
        2 * n - 2 - i
    } else {
        i
    };
    r as usize
}

fn direct_gaussian(vstep: usize, width: usize, height: usize, buf: &mut [u8]) {
    let (w, h) = (width as i64, height as i64);
    let src = buf.to_vec();
    for j in 0..width {
        for i in 0..height as i64 {
            let s = |r: i64| src[reflect(r, h) * vstep + j];
            buf[i as usize * vstep + j] =
                stencil(s(i - 2), s(i - 1), s(i), s(i + 1), s(i + 2));
        }
    }
    let src = buf.to_vec();
    for i in 0..height {
        for j in 0..width as i64 {
            let s = |c: i64| src[i * vstep + reflect(c, w)];
            buf[i * vstep + j as usize] =
                stencil(s(j - 2), s(j - 1), s(j), s(j + 1), s(j + 2));
        }
    }
}

fn rshr8(v: u32) -> u32 {
    (v + 128) >> 8
}

fn direct_7_8(vstep: usize, width: usize, height: usize, src: &[u8]) -> Vec<u8> {
    const F: [u32; 7] = [238, 201, 165, 128, 91, 55, 18];
    let mut out = vec![0u8; vstep * height];
    let p = |y: usize, x: usize| src[y * vstep + x] as u32;
    for (i, oi) in (0..height).step_by(8).zip((0..).step_by(7)) {
        for (j, oj) in (0..width).step_by(8).zip((0..).step_by(7)) {
            for y in 0..7 {
                for x in 0..7 {
                    let h0 = rshr8(p(i + y, j + x) * F[x] + p(i + y, j + x + 1) * F[6 - x]);
                    let h1 =
                        rshr8(p(i + y + 1, j + x) * F[x] + p(i + y + 1, j + x + 1) * F[6 - x]);
                    out[(oi + y) * vstep + oj + x] = rshr8(h0 * F[y] + h1 * F[6 - y]) as u8;
                }
            }
        }
    }
    out
}

fn direct_13_16(vstep: usize, width: usize, height: usize, src: &[u8]) -> Vec<u8> {
    const F: [u32; 13] = [226, 167, 108, 49, 246, 187, 128, 69, 10, 207, 138, 89, 30];
    let map = |i: usize| {
        let mut i = i;
        if i > 3 {
            i += 1;
        }
        if i > 9 {
            i += 1;
        }
        i
    };
    let mut out = vec![0u8; vstep * height];
    let p = |y: usize, x: usize| src[y * vstep + x] as u32;
    for (i, oi) in (0..height).step_by(16).zip((0..).step_by(13)) {
        for (j, oj) in (0..width).step_by(16).zip((0..).step_by(13)) {
            for y in 0..13 {
                for x in 0..13 {
                    let (sy, sx) = (i + map(y), j + map(x));
                    let h0 = rshr8(p(sy, sx) * F[x] + p(sy, sx + 1) * F[12 - x]);
                    let h1 = rshr8(p(sy + 1, sx) * F[x] + p(sy + 1, sx + 1) * F[12 - x]);
                    out[(oi + y) * vstep + oj + x] = rshr8(h0 * F[y] + h1 * F[12 - y]) as u8;
                }
            }
        }
    }
    out
}

#[test]
fn gaussian_matches_direct_evaluation() {
    let (vstep, width, height) = (40, 32, 24);
    for seed in 0..4 {
        let mut kernel = random_image(vstep, width, height, seed);
        let mut direct = kernel.clone();

        direct_gaussian(vstep, width, height, &mut direct);
        let mut view = RasterMut::new(&mut kernel, vstep);
        gaussian_5x5(width, height, &mut view);

        for y in 0..height {
            for x in 0..width {
                assert_eq!(
                    kernel[y * vstep + x],
                    direct[y * vstep + x],
                    "seed {} at ({}, {})",
                    seed,
                    x,
                    y
                );
            }
        }
    }
}

#[test]
fn bilinear_7_8_matches_direct_evaluation() {
    let (vstep, width, height) = (56, 48, 40);
    for seed in 10..14 {
        let mut kernel = random_image(vstep, width, height, seed);
        let direct = direct_7_8(vstep, width, height, &kernel);

        let mut view = RasterMut::new(&mut kernel, vstep);
        bilinear_7_8(width, height, &mut view);

        let (ow, oh) = (width * 7 / 8, height * 7 / 8);
        for y in 0..oh {
            for x in 0..ow {
                assert_eq!(
                    kernel[y * vstep + x],
                    direct[y * vstep + x],
                    "seed {} at ({}, {})",
                    seed,
                    x,
                    y
                );
            }
        }
    }
}

#[test]
fn bilinear_13_16_matches_direct_evaluation() {
    let (vstep, width, height) = (64, 48, 32);
    for seed in 20..24 {
        let mut kernel = random_image(vstep, width, height, seed);
        let direct = direct_13_16(vstep, width, height, &kernel);

        let mut view = RasterMut::new(&mut kernel, vstep);
        bilinear_13_16(width, height, &mut view);

        let (ow, oh) = (width * 13 / 16, height * 13 / 16);
        for y in 0..oh {
            for x in 0..ow {
                assert_eq!(
                    kernel[y * vstep + x],
                    direct[y * vstep + x],
                    "seed {} at ({}, {})",
                    seed,
                    x,
                    y
                );
            }
        }
    }
}

#[test]
fn constant_40x32_reduces_to_constant_35x28() {
    let vstep = 40;
    let mut buf = vec![128u8; vstep * 32];
    let mut view = RasterMut::new(&mut buf, vstep);
    bilinear_7_8(40, 32, &mut view);
    for y in 0..28 {
        for x in 0..35 {
            assert_eq!(buf[y * vstep + x], 128);
        }
    }
}
