//! Orientation and descriptor stage of the pyrite feature pipeline:
//! intensity centroids over a radius-15 disk, a binned approximate atan2,
//! and rotated BRIEF descriptors.

mod angle;
mod brief;
mod centroid;

pub use angle::atan2_bins;
pub use brief::{brief_describe, describe_with, rotated_pattern, ORIENTATION_BINS, PATTERN};
pub use centroid::orb_centroids;

use pyrite_core::{keypoint, Raster};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Compute descriptors for every encoded keypoint, appending
/// `words` 32-bit words per keypoint to `descriptors` in keypoint order.
///
/// Orientation comes from the intensity centroid of each keypoint's disk,
/// quantized to one of 30 bins. The keypoint list is then swept once per
/// pair of adjacent bins, describing the keypoints whose bin matches, so
/// at most two rotated pattern tables are live at a time. Every keypoint
/// needs 15 pixels of margin inside its level.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img, points, descriptors), fields(points = points.len(), words))
)]
pub fn orb_compute(img: Raster<'_>, words: usize, points: &[u32], descriptors: &mut Vec<u32>) {
    debug_assert!((1..=8).contains(&words));

    let centroids = orb_centroids(img, points);
    let bins = atan2_bins(&centroids);

    let base = descriptors.len();
    descriptors.resize(base + points.len() * words, 0);
    let out = &mut descriptors[base..];

    for pair in 0..ORIENTATION_BINS / 2 {
        let lo = rotated_pattern(2 * pair);
        let hi = rotated_pattern(2 * pair + 1);
        for (i, &point) in points.iter().enumerate() {
            let bin = bins[i] as u32;
            if bin / 2 != pair {
                continue;
            }
            let table = if bin % 2 == 0 { &lo } else { &hi };
            let x = keypoint::decode_x(point) as usize;
            let y = keypoint::decode_y(point) as usize;
            describe_with(table, img, x, y, &mut out[i * words..(i + 1) * words]);
        }
    }
}

#[derive(Debug, Clone)]
pub enum OrbError {
    InvalidWords { words: usize },
}

impl std::fmt::Display for OrbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrbError::InvalidWords { words } => {
                write!(f, "Invalid descriptor length: {} words (must be 1-8)", words)
            }
        }
    }
}

impl std::error::Error for OrbError {}

/// Descriptor front end with the word count validated once.
pub struct OrbExtractor {
    words: usize,
}

impl OrbExtractor {
    pub fn new(words: usize) -> Result<Self, OrbError> {
        if !(1..=8).contains(&words) {
            return Err(OrbError::InvalidWords { words });
        }
        Ok(Self { words })
    }

    pub fn words(&self) -> usize {
        self.words
    }

    /// See [`orb_compute`].
    pub fn compute(&self, img: Raster<'_>, points: &[u32], descriptors: &mut Vec<u32>) {
        orb_compute(img, self.words, points, descriptors);
    }
}
