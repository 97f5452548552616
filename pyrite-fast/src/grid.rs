//! Spatial feature grid: fixed-capacity sorted buckets over a coarse cell
//! grid, with quota reduction and area queries.

use pyrite_core::{keypoint, Raster};

use crate::extract::{bucket_insert, nms_sweep};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A 2-D grid of fixed-capacity keypoint buckets.
///
/// Cell (row, col) covers image rows
/// `[border + row * 2^log_bucket_size, border + (row + 1) * 2^log_bucket_size)`
/// and the matching column span. Each bucket keeps its entries in
/// ascending encoded order, weakest first, and never exceeds
/// `bucket_limit`. The grid owns its storage and is reused across frames
/// with [`FeatureGrid::reset`].
pub struct FeatureGrid {
    h_buckets: usize,
    v_buckets: usize,
    bucket_limit: usize,
    log_bucket_size: u32,
    border: usize,
    entries: Vec<u32>,
    counts: Vec<u32>,
    /// Per-bucket offsets into the sequence built by `extract_and_index`.
    starts: Vec<u32>,
}

impl FeatureGrid {
    pub fn new(
        width: usize,
        height: usize,
        border: usize,
        log_bucket_size: u32,
        bucket_limit: usize,
    ) -> Self {
        assert!(log_bucket_size > 0);
        assert!(bucket_limit > 0);
        assert!(width > 2 * border && height > 2 * border);
        let bucket_size = 1usize << log_bucket_size;
        let h_buckets = (width - 2 * border - 1) / bucket_size + 1;
        let v_buckets = (height - 2 * border - 1) / bucket_size + 1;
        let num = h_buckets * v_buckets;
        Self {
            h_buckets,
            v_buckets,
            bucket_limit,
            log_bucket_size,
            border,
            entries: vec![0; num * bucket_limit],
            counts: vec![0; num],
            starts: Vec::new(),
        }
    }

    #[inline]
    pub fn h_buckets(&self) -> usize {
        self.h_buckets
    }

    #[inline]
    pub fn v_buckets(&self) -> usize {
        self.v_buckets
    }

    #[inline]
    pub fn bucket_limit(&self) -> usize {
        self.bucket_limit
    }

    pub fn num_buckets(&self) -> usize {
        self.h_buckets * self.v_buckets
    }

    /// Total stored feature count.
    pub fn len(&self) -> usize {
        self.counts.iter().map(|&c| c as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Clear all buckets for the next frame. Capacity is retained.
    pub fn reset(&mut self) {
        self.counts.fill(0);
        self.starts.clear();
    }

    #[inline]
    fn cell(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.v_buckets && col < self.h_buckets);
        row * self.h_buckets + col
    }

    /// The ascending contents of one bucket.
    pub fn bucket(&self, row: usize, col: usize) -> &[u32] {
        let i = self.cell(row, col);
        let count = self.counts[i] as usize;
        &self.entries[i * self.bucket_limit..i * self.bucket_limit + count]
    }

    /// Insert an encoded keypoint into the bucket owning its coordinates.
    /// The coordinates must lie inside the bordered region the grid was
    /// sized for.
    pub fn insert(&mut self, word: u32) {
        let x = keypoint::decode_x(word) as usize;
        let y = keypoint::decode_y(word) as usize;
        debug_assert!(x >= self.border && y >= self.border);
        let col = (x - self.border) >> self.log_bucket_size;
        let row = (y - self.border) >> self.log_bucket_size;
        self.insert_into(row, col, word);
    }

    /// Insert an encoded keypoint into an explicit cell.
    pub fn insert_into(&mut self, row: usize, col: usize, word: u32) {
        let i = self.cell(row, col);
        let slot = &mut self.entries[i * self.bucket_limit..(i + 1) * self.bucket_limit];
        self.counts[i] = bucket_insert(slot, self.counts[i] as usize, word) as u32;
    }

    /// Drop the weakest entry (index 0) of a bucket.
    fn drop_weakest(&mut self, i: usize) {
        let count = self.counts[i] as usize;
        debug_assert!(count > 0);
        let base = i * self.bucket_limit;
        self.entries.copy_within(base + 1..base + count, base);
        self.counts[i] = (count - 1) as u32;
    }

    /// Thin the grid until either the total feature count is at most
    /// `target_total`, or every aligned 2x2 super-cell holds no more than
    /// `min_per_four` features. The allowance per super-cell counts down
    /// from `max_per_four` in steps of `step`; each trim removes the
    /// single weakest entry across the super-cell's four buckets, compared
    /// by their weakest entries, first found winning ties. Odd trailing
    /// rows and columns are never trimmed. Returns the final total count.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn reduce(
        &mut self,
        min_per_four: usize,
        max_per_four: usize,
        step: usize,
        target_total: usize,
    ) -> u32 {
        debug_assert!(step > 0);
        debug_assert!(min_per_four <= max_per_four);

        let mut total = self.len();
        let mut allowance = max_per_four;
        loop {
            for sy in (0..self.v_buckets & !1).step_by(2) {
                for sx in (0..self.h_buckets & !1).step_by(2) {
                    let cells = [
                        self.cell(sy, sx),
                        self.cell(sy + 1, sx),
                        self.cell(sy, sx + 1),
                        self.cell(sy + 1, sx + 1),
                    ];
                    let mut held: usize =
                        cells.iter().map(|&i| self.counts[i] as usize).sum();
                    while held > allowance {
                        if total <= target_total {
                            return total as u32;
                        }
                        let mut weakest: Option<(usize, u32)> = None;
                        for &i in &cells {
                            if self.counts[i] == 0 {
                                continue;
                            }
                            let head = self.entries[i * self.bucket_limit];
                            if weakest.map_or(true, |(_, w)| head < w) {
                                weakest = Some((i, head));
                            }
                        }
                        let Some((i, _)) = weakest else { break };
                        self.drop_weakest(i);
                        held -= 1;
                        total -= 1;
                    }
                }
            }
            if allowance <= min_per_four || total <= target_total {
                break;
            }
            allowance = allowance.saturating_sub(step).max(min_per_four);
        }
        total as u32
    }

    /// Append every stored feature to `out` in bucket-row, bucket-column,
    /// within-bucket order, remembering per-bucket offsets so that
    /// [`FeatureGrid::features_in_area`] can hand back indices into the
    /// same sequence.
    pub fn extract_and_index(&mut self, out: &mut Vec<u32>) {
        self.starts.clear();
        self.starts.reserve(self.num_buckets());
        for row in 0..self.v_buckets {
            for col in 0..self.h_buckets {
                self.starts.push(out.len() as u32);
                out.extend_from_slice(self.bucket(row, col));
            }
        }
    }

    /// Indices (as produced by the last `extract_and_index`) of every
    /// stored feature within the square of radius `r` around `(x, y)`.
    pub fn features_in_area(&self, x: u32, y: u32, r: u32, out: &mut Vec<u32>) {
        debug_assert_eq!(self.starts.len(), self.num_buckets());

        let lo_col = self.clamp_col(x as i64 - r as i64);
        let hi_col = self.clamp_col(x as i64 + r as i64);
        let lo_row = self.clamp_row(y as i64 - r as i64);
        let hi_row = self.clamp_row(y as i64 + r as i64);

        for row in lo_row..=hi_row {
            for col in lo_col..=hi_col {
                let start = self.starts[self.cell(row, col)];
                for (i, &word) in self.bucket(row, col).iter().enumerate() {
                    let fx = keypoint::decode_x(word) as i64;
                    let fy = keypoint::decode_y(word) as i64;
                    if (fx - x as i64).abs() <= r as i64 && (fy - y as i64).abs() <= r as i64 {
                        out.push(start + i as u32);
                    }
                }
            }
        }
    }

    fn clamp_col(&self, x: i64) -> usize {
        let c = (x - self.border as i64) >> self.log_bucket_size;
        c.clamp(0, self.h_buckets as i64 - 1) as usize
    }

    fn clamp_row(&self, y: i64) -> usize {
        let r = (y - self.border as i64) >> self.log_bucket_size;
        r.clamp(0, self.v_buckets as i64 - 1) as usize
    }
}

/// The extraction sweep of [`crate::fast_extract`], but feeding a
/// [`FeatureGrid`] keyed by each survivor's own coordinates instead of
/// flushing row buckets. The grid's geometry must match `width`, `height`
/// and `border`.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(marks, grid)))]
pub fn fast_bucket(
    width: usize,
    height: usize,
    border: usize,
    marks: Raster<'_>,
    grid: &mut FeatureGrid,
) {
    debug_assert_eq!(border, grid.border);
    nms_sweep(width, height, border, marks, |_, _, word| {
        grid.insert(word);
    });
}
