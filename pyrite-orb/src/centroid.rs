//! Intensity-weighted first moments over a radius-15 disk.

use pyrite_core::{keypoint, Raster};

/// Greatest |dy| sampled at each |dx|; the disk is the 31x31 patch
/// clipped to this profile, symmetric in both axes.
const MAX_DY: [i32; 16] = [15, 15, 15, 15, 15, 15, 14, 14, 13, 13, 12, 11, 10, 9, 7, 5];

/// Compute (mx, my) moments for each encoded keypoint.
///
/// mx = sum of dx * I[y + dy][x + dx], my likewise with dy, both over the
/// disk. Every keypoint needs 15 pixels of margin on all sides.
///
/// The output interleaves groups of four: indices 8k..8k+4 hold the mx of
/// points 4k..4k+4 and indices 8k+4..8k+8 the matching my, zero padded up
/// to a multiple of eight entries. [`crate::atan2_bins`] consumes this
/// layout directly.
pub fn orb_centroids(img: Raster<'_>, points: &[u32]) -> Vec<i32> {
    let mut centroids = vec![0i32; (2 * points.len() + 7) & !7];

    let mut out = 0;
    for &point in points {
        let x = keypoint::decode_x(point) as i32;
        let y = keypoint::decode_y(point) as i32;

        let mut mx = 0i32;
        let mut my = 0i32;
        for dx in -15i32..=15 {
            let span = MAX_DY[dx.unsigned_abs() as usize];
            for dy in -span..=span {
                let v = img.at((y + dy) as usize, (x + dx) as usize) as i32;
                mx += dx * v;
                my += dy * v;
            }
        }

        centroids[out] = mx;
        centroids[out + 4] = my;
        out += 1;
        if out % 4 == 0 {
            out += 4;
        }
    }

    centroids
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_core::keypoint::encode;

    const VSTEP: usize = 64;

    fn moments_at(img: &[u8], x: u32, y: u32) -> (i32, i32) {
        let points = [encode(0, x, y)];
        let m = orb_centroids(Raster::new(img, VSTEP), &points);
        (m[0], m[4])
    }

    #[test]
    fn symmetric_patch_has_zero_moments() {
        let img = vec![77u8; VSTEP * 64];
        let (mx, my) = moments_at(&img, 32, 32);
        assert_eq!((mx, my), (0, 0));
    }

    #[test]
    fn point_symmetric_noise_cancels() {
        // any 180-degree symmetric intensity field about the keypoint
        let mut img = vec![0u8; VSTEP * 64];
        let (cx, cy) = (32i32, 32i32);
        for dy in -15..=15i32 {
            for dx in -15..=15i32 {
                let v = (((dx * dx + 3 * dy * dy) % 200) + 20) as u8;
                img[((cy + dy) * VSTEP as i32 + cx + dx) as usize] = v;
                img[((cy - dy) * VSTEP as i32 + cx - dx) as usize] = v;
            }
        }
        let (mx, my) = moments_at(&img, 32, 32);
        assert_eq!((mx, my), (0, 0));
    }

    #[test]
    fn horizontal_gradient_pulls_mx_positive() {
        let mut img = vec![0u8; VSTEP * 64];
        for y in 0..64 {
            for x in 0..64 {
                img[y * VSTEP + x] = (x * 3) as u8;
            }
        }
        let (mx, my) = moments_at(&img, 32, 32);
        assert!(mx > 0);
        assert_eq!(my, 0);
    }

    #[test]
    fn vertical_gradient_pulls_my_positive() {
        let mut img = vec![0u8; VSTEP * 64];
        for y in 0..64 {
            for x in 0..64 {
                img[y * VSTEP + x] = (y * 3) as u8;
            }
        }
        let (mx, my) = moments_at(&img, 32, 32);
        assert_eq!(mx, 0);
        assert!(my > 0);
    }

    #[test]
    fn output_layout_interleaves_groups_of_four() {
        let mut img = vec![0u8; VSTEP * 64];
        for y in 0..64 {
            for x in 0..64 {
                img[y * VSTEP + x] = (x * 2) as u8;
            }
        }
        let points: Vec<u32> = (0..5).map(|i| encode(0, 20 + i, 30)).collect();
        let m = orb_centroids(Raster::new(&img, VSTEP), &points);

        assert_eq!(m.len(), 16);
        // first group: four mx then four my
        for i in 0..4 {
            assert!(m[i] > 0, "mx of point {}", i);
            assert_eq!(m[i + 4], 0, "my of point {}", i);
        }
        // fifth point opens the second group
        assert!(m[8] > 0);
        assert_eq!(m[12], 0);
        // padding lanes stay zero
        assert_eq!(m[9], 0);
        assert_eq!(m[13], 0);
    }
}
