//! Time-based trailing windows.
//!
//! A window of width `w` ending at row `i` holds every row `j <= i` with
//! `t_i - w < t_j <= t_i`. Membership depends on elapsed time only, so
//! irregular sampling yields windows of varying length.

use chrono::{DateTime, Duration, Utc};
use std::ops::Range;

/// Compute the row range of the trailing window ending at each row.
///
/// `timestamps` must be non-decreasing. Rows sharing a timestamp only see
/// themselves and earlier rows.
pub fn trailing_bounds(timestamps: &[DateTime<Utc>], window: Duration) -> Vec<Range<usize>> {
    let mut bounds = Vec::with_capacity(timestamps.len());
    let mut start = 0;

    for (i, &t) in timestamps.iter().enumerate() {
        // A window reaching before the earliest representable time holds
        // every row so far.
        if let Some(cutoff) = t.checked_sub_signed(window) {
            while start < i && timestamps[start] <= cutoff {
                start += 1;
            }
        }
        bounds.push(start..i + 1);
    }

    bounds
}

/// Apply `f` to the finite samples of every trailing window.
///
/// Non-finite samples are skipped, so `f` may receive an empty slice.
pub fn rolling_apply<T, F>(series: &[f64], bounds: &[Range<usize>], mut f: F) -> Vec<T>
where
    F: FnMut(&[f64]) -> T,
{
    let mut buffer = Vec::new();
    bounds
        .iter()
        .map(|range| {
            buffer.clear();
            buffer.extend(series[range.clone()].iter().copied().filter(|x| x.is_finite()));
            f(&buffer)
        })
        .collect()
}
