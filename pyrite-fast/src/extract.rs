//! Non-max suppression and keypoint extraction from a scored marks raster.

use pyrite_core::{keypoint, Raster};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Sweep the bounded region in 2x2 steps, testing the four interior cells
/// of each 4x4 window for dominance over their eight neighbours. At most
/// one of the four cells survives per step. `emit` receives the step
/// origin and the encoded survivor.
///
/// The dominance ladder fixes a >= / > split per branch: ties on the
/// leading side keep a candidate alive, ties on the trailing side kill
/// it, which makes the survivor set deterministic and independent of
/// arrival order.
pub(crate) fn nms_sweep(
    width: usize,
    height: usize,
    border: usize,
    marks: Raster<'_>,
    mut emit: impl FnMut(usize, usize, u32),
) {
    debug_assert!(border >= 3);

    let m = |yy: usize, xx: usize| marks.at(yy, xx);

    let mut y = border;
    while y + border < height {
        let mut x = border;
        while x + border < width {
            let v0 = m(y, x);
            let v1 = m(y, x + 1);
            let v2 = m(y + 1, x);
            let v3 = m(y + 1, x + 1);

            if (v0 | v1 | v2 | v3) == 0 {
                x += 2;
                continue;
            }

            let survivor = if v0 > v1 && v0 > v2 && v0 > v3 {
                if v0 >= m(y - 1, x - 1)
                    && v0 >= m(y, x - 1)
                    && v0 > m(y + 1, x - 1)
                    && v0 >= m(y - 1, x)
                    && v0 >= m(y - 1, x + 1)
                {
                    Some((x, y, v0))
                } else {
                    None
                }
            } else if v1 > v2 && v1 > v3 {
                if v1 >= m(y - 1, x)
                    && v1 >= m(y - 1, x + 1)
                    && v1 >= m(y - 1, x + 2)
                    && v1 > m(y, x + 2)
                    && v1 > m(y + 1, x + 2)
                {
                    Some((x + 1, y, v1))
                } else {
                    None
                }
            } else if v2 > v3 {
                if v2 >= m(y, x - 1)
                    && v2 >= m(y + 1, x - 1)
                    && v2 > m(y + 2, x - 1)
                    && v2 > m(y + 2, x)
                    && v2 > m(y + 2, x + 1)
                {
                    Some((x, y + 1, v2))
                } else {
                    None
                }
            } else if v3 > m(y + 2, x)
                && v3 > m(y + 2, x + 1)
                && v3 >= m(y, x + 2)
                && v3 > m(y + 1, x + 2)
                && v3 > m(y + 2, x + 2)
            {
                Some((x + 1, y + 1, v3))
            } else {
                None
            };

            if let Some((px, py, v)) = survivor {
                emit(x, y, keypoint::encode(v as u32, px as u32, py as u32));
            }
            x += 2;
        }
        y += 2;
    }
}

/// Insert `word` into an ascending fixed-capacity bucket, dropping the
/// weakest entry once full. Returns the new count.
#[inline]
pub(crate) fn bucket_insert(entries: &mut [u32], count: usize, word: u32) -> usize {
    let limit = entries.len();
    if count == 0 {
        entries[0] = word;
        1
    } else if count < limit {
        let mut i = count;
        while i > 0 && word < entries[i - 1] {
            entries[i] = entries[i - 1];
            i -= 1;
        }
        entries[i] = word;
        count + 1
    } else if word > entries[0] {
        let mut i = 1;
        while i < limit && word > entries[i] {
            entries[i - 1] = entries[i];
            i += 1;
        }
        entries[i - 1] = word;
        count
    } else {
        count
    }
}

/// Extract non-max-suppressed keypoints from a scored marks raster,
/// appending encoded words to `results`.
///
/// With `log_bucket_size` zero every survivor appends directly, in sweep
/// order. Otherwise survivors pass through a row of fixed-capacity
/// buckets, one per `2^log_bucket_size` columns, that retain the top
/// `bucket_limit` entries of each cell; at every stripe of
/// `2^log_bucket_size` rows the buckets flush to `results` in column
/// order and reset, with a final flush at the end.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(marks, results))
)]
pub fn fast_extract(
    width: usize,
    height: usize,
    border: usize,
    log_bucket_size: u32,
    bucket_limit: usize,
    marks: Raster<'_>,
    results: &mut Vec<u32>,
) {
    if log_bucket_size == 0 {
        nms_sweep(width, height, border, marks, |_, _, word| {
            results.push(word);
        });
        return;
    }

    debug_assert!(bucket_limit > 0);
    let bucket_size = 1usize << log_bucket_size;
    if width <= 2 * border {
        return;
    }
    let num_buckets = (width - 2 * border - 1) / bucket_size + 1;
    let mut entries = vec![0u32; num_buckets * bucket_limit];
    let mut counts = vec![0usize; num_buckets];

    fn flush(limit: usize, entries: &[u32], counts: &mut [usize], results: &mut Vec<u32>) {
        for (b, count) in counts.iter_mut().enumerate() {
            results.extend_from_slice(&entries[b * limit..b * limit + *count]);
            *count = 0;
        }
    }

    let mut last_stripe = 0;
    nms_sweep(width, height, border, marks, |x, y, word| {
        let stripe = (y - border) / bucket_size;
        if stripe != last_stripe {
            flush(bucket_limit, &entries, &mut counts, results);
            last_stripe = stripe;
        }
        let b = (x - border) >> log_bucket_size;
        let slot = &mut entries[b * bucket_limit..(b + 1) * bucket_limit];
        counts[b] = bucket_insert(slot, counts[b], word);
    });

    flush(bucket_limit, &entries, &mut counts, results);
}
