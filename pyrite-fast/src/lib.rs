//! Corner detection and extraction for the pyrite feature pipeline.
//!
//! The raw kernels ([`fast_detect`], [`fast_score_harris`],
//! [`fast_extract`], [`fast_bucket`]) are total functions over
//! caller-owned rasters and never allocate the pyramid or keep state
//! between frames. [`FeaturePipeline`] wraps them behind a validated
//! constructor for callers that want the pre-conditions checked once
//! instead of promised per call.

mod detect;
mod error;
mod extract;
mod grid;
mod harris;

pub use detect::fast_detect;
pub use error::{FastError, FastResult};
pub use extract::fast_extract;
pub use grid::{fast_bucket, FeatureGrid};
pub use harris::{fast_score_harris, harris_score};

use pyrite_core::{PipelineConfig, Raster, RasterMut};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Encoded keypoint coordinates are 12 bits per axis.
const MAX_DIM: usize = 4095;

/// Detect-score-extract over one pyramid level, with the contract checked
/// at construction time.
pub struct FeaturePipeline {
    cfg: PipelineConfig,
    width: usize,
    height: usize,
    vstep: usize,
}

impl FeaturePipeline {
    /// Validates dimensions, border and stride for the given level
    /// geometry. The border must be at least 4 (detection plus Harris
    /// scoring); rasters must keep two spare bytes per row when the width
    /// is not a multiple of 16.
    pub fn new(
        cfg: PipelineConfig,
        width: usize,
        height: usize,
        vstep: usize,
    ) -> FastResult<Self> {
        if width == 0 || height == 0 || width > MAX_DIM || height > MAX_DIM {
            return Err(FastError::InvalidImageSize { width, height });
        }
        if cfg.border < 4 {
            return Err(FastError::InvalidBorder {
                border: cfg.border,
                min_border: 4,
            });
        }
        let required = width + Self::slack(width);
        if vstep < required {
            return Err(FastError::StrideTooSmall { vstep, required });
        }
        if cfg.log_bucket_size != 0 && cfg.bucket_limit == 0 {
            return Err(FastError::InvalidBucketLimit {
                bucket_limit: cfg.bucket_limit,
            });
        }
        Ok(Self {
            cfg,
            width,
            height,
            vstep,
        })
    }

    fn slack(width: usize) -> usize {
        if width % 16 != 0 {
            2
        } else {
            0
        }
    }

    fn check_buffers(&self, img: &[u8], marks: &[u8]) -> FastResult<()> {
        let img_len = (self.height - 1) * self.vstep + self.width;
        if img.len() < img_len {
            return Err(FastError::BufferTooSmall {
                expected_len: img_len,
                actual_len: img.len(),
            });
        }
        let marks_len = (self.height - 1) * self.vstep + self.width + Self::slack(self.width);
        if marks.len() < marks_len {
            return Err(FastError::BufferTooSmall {
                expected_len: marks_len,
                actual_len: marks.len(),
            });
        }
        Ok(())
    }

    /// Run detection, Harris scoring and extraction over one level,
    /// appending encoded keypoints to `keypoints`. The marks raster is
    /// caller-owned scratch; it must be zeroed before the first frame and
    /// is fully rewritten inside the bounded region on every call.
    /// Returns the number of keypoints appended.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, img, marks, keypoints), fields(width = self.width, height = self.height))
    )]
    pub fn run(
        &self,
        img: &[u8],
        marks: &mut [u8],
        keypoints: &mut Vec<u32>,
    ) -> FastResult<usize> {
        self.check_buffers(img, marks)?;

        let img = Raster::new(img, self.vstep);
        let mut marks = RasterMut::new(marks, self.vstep);

        fast_detect(
            self.width,
            self.height,
            self.cfg.border,
            self.cfg.threshold,
            img,
            &mut marks,
        );
        fast_score_harris(
            self.width,
            self.height,
            self.cfg.border,
            self.cfg.harris_threshold,
            img,
            &mut marks,
        );

        let before = keypoints.len();
        fast_extract(
            self.width,
            self.height,
            self.cfg.border,
            self.cfg.log_bucket_size,
            self.cfg.bucket_limit,
            marks.as_raster(),
            keypoints,
        );
        Ok(keypoints.len() - before)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}
