//! Shared types for the pyrite feature pipeline: borrowed stride-aware
//! raster views, the packed 32-bit keypoint word codec, and the
//! configuration record the stages agree on.

pub mod keypoint;

/// Borrowed single-channel 8-bit raster.
///
/// Rows start at offsets `y * vstep`; width and height are supplied per
/// call, not stored here. Bytes between a row's `width` and `vstep` must be
/// addressable but carry no meaning. Some kernels also write slightly past
/// `width` (see their contracts), so `vstep` is the real row capacity.
#[derive(Clone, Copy)]
pub struct Raster<'a> {
    data: &'a [u8],
    vstep: usize,
}

impl<'a> Raster<'a> {
    pub fn new(data: &'a [u8], vstep: usize) -> Self {
        debug_assert!(vstep > 0);
        Self { data, vstep }
    }

    #[inline]
    pub fn vstep(&self) -> usize {
        self.vstep
    }

    #[inline]
    pub fn at(&self, y: usize, x: usize) -> u8 {
        self.data[y * self.vstep + x]
    }

    /// Row `y` and everything after it, for callers that index within rows
    /// themselves.
    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.vstep..]
    }

    /// Whether the buffer can back a `width` x `height` image at this
    /// stride, with `slack` extra addressable bytes on every row.
    pub fn covers(&self, width: usize, height: usize, slack: usize) -> bool {
        if height == 0 {
            return true;
        }
        width + slack <= self.vstep && (height - 1) * self.vstep + width + slack <= self.data.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.data
    }
}

/// Exclusive variant of [`Raster`] for kernels that write.
pub struct RasterMut<'a> {
    data: &'a mut [u8],
    vstep: usize,
}

impl<'a> RasterMut<'a> {
    pub fn new(data: &'a mut [u8], vstep: usize) -> Self {
        debug_assert!(vstep > 0);
        Self { data, vstep }
    }

    #[inline]
    pub fn vstep(&self) -> usize {
        self.vstep
    }

    #[inline]
    pub fn at(&self, y: usize, x: usize) -> u8 {
        self.data[y * self.vstep + x]
    }

    #[inline]
    pub fn set(&mut self, y: usize, x: usize, v: u8) {
        self.data[y * self.vstep + x] = v;
    }

    pub fn covers(&self, width: usize, height: usize, slack: usize) -> bool {
        self.as_raster().covers(width, height, slack)
    }

    /// Shared view of the same buffer.
    #[inline]
    pub fn as_raster(&self) -> Raster<'_> {
        Raster {
            data: self.data,
            vstep: self.vstep,
        }
    }
}

/// Knobs shared across the detection and description stages.
///
/// The defaults suit a VGA-scale pyramid: FAST threshold 20, Harris
/// threshold 2^15, 16 pixel border (enough to describe), bucketing
/// disabled, full 256-bit descriptors.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// FAST contrast threshold, applied symmetrically to both polarities.
    pub threshold: u8,
    /// Raw Harris responses at or below this return a zero score.
    pub harris_threshold: i32,
    /// Pixels excluded on every side. At least 3 to detect, 4 to score,
    /// 15 to describe.
    pub border: usize,
    /// log2 of the extraction bucket cell side; 0 disables bucketing.
    pub log_bucket_size: u32,
    /// Per-bucket keypoint quota when bucketing is enabled.
    pub bucket_limit: usize,
    /// Descriptor length in 32-bit words, 1 to 8.
    pub descriptor_words: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: 20,
            harris_threshold: 1 << 15,
            border: 16,
            log_bucket_size: 0,
            bucket_limit: 5,
            descriptor_words: 8,
        }
    }
}
