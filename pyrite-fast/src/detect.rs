//! FAST-9-of-16 corner classification.

use pyrite_core::{Raster, RasterMut};

/// The radius-3 Bresenham ring as (dy, dx) offsets, clockwise from just
/// left of the top sample.
const RING: [(i32, i32); 16] = [
    (-3, -1),
    (-3, 0),
    (-3, 1),
    (-2, 2),
    (-1, 3),
    (0, 3),
    (1, 3),
    (2, 2),
    (3, 1),
    (3, 0),
    (3, -1),
    (2, -2),
    (1, -3),
    (0, -3),
    (-1, -3),
    (-2, -2),
];

/// True when the cyclic 16-bit mask contains a run of at least nine set
/// bits.
#[inline]
fn has_arc_of_nine(mask: u16) -> bool {
    let mut run = mask;
    for i in 1..9 {
        run &= mask.rotate_left(i);
        if run == 0 {
            return false;
        }
    }
    true
}

/// Classify every pixel of the bounded region, writing `0xFF` at FAST-9
/// corners and `0x00` elsewhere.
///
/// A ring sample qualifies as dark when it is strictly below
/// `saturating_sub(center, threshold)` and as light when strictly above
/// `saturating_add(center, threshold)`; a corner needs nine contiguous
/// qualifying samples of a single polarity.
///
/// When `width` is not a multiple of 16, `marks[y][width]` and
/// `marks[y][width + 1]` are zeroed on every processed row so the
/// extractor sees a clean right edge; the marks rows must therefore be
/// addressable two bytes past `width`. Marks outside the bounded region
/// are left untouched. The caller zero-initializes the marks raster
/// before the first frame if non-max suppression will follow.
///
/// `border` must be at least 3; at least 4 if the marks will be Harris
/// scored, and at least 15 if the points will be described.
pub fn fast_detect(
    width: usize,
    height: usize,
    border: usize,
    threshold: u8,
    img: Raster<'_>,
    marks: &mut RasterMut<'_>,
) {
    debug_assert!(border >= 3);
    debug_assert!(img.covers(width, height, 0));
    debug_assert!(marks.covers(width, height, if width % 16 != 0 { 2 } else { 0 }));

    for y in border..height.saturating_sub(border) {
        for x in border..width - border {
            let c = img.at(y, x);
            let dark = c.saturating_sub(threshold);
            let light = c.saturating_add(threshold);

            let mut d: u16 = 0;
            let mut l: u16 = 0;
            for (i, &(dy, dx)) in RING.iter().enumerate() {
                let p = img.at((y as i32 + dy) as usize, (x as i32 + dx) as usize);
                if p < dark {
                    d |= 1 << i;
                }
                if p > light {
                    l |= 1 << i;
                }
            }

            let corner = has_arc_of_nine(d) || has_arc_of_nine(l);
            marks.set(y, x, if corner { 0xff } else { 0x00 });
        }
        if width % 16 != 0 {
            marks.set(y, width, 0);
            marks.set(y, width + 1, 0);
        }
    }
}
