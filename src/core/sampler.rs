//! Time-indexed sampling of dense per-vertex time series.

use crate::dataset::{ScalarField, TimeSeriesBuffer};

/// The last continuous time with a defined sample, i.e. the position of the
/// final discrete frame. `sample_at` has no value at or past this point.
pub fn max_time(ts: &TimeSeriesBuffer, frame_width: f64) -> f64 {
    ts.num_frames().saturating_sub(1) as f64 * frame_width
}

/// Sample the per-vertex field at continuous time `t` by linear
/// interpolation between the two bracketing discrete frames.
///
/// Returns `None` when `t` is negative or at/past [`max_time`]: the sampler
/// never extrapolates, callers clamp `t` into the valid domain beforehand.
/// Pure function of its inputs.
pub fn sample_at(ts: &TimeSeriesBuffer, frame_width: f64, t: f64) -> Option<ScalarField> {
    if !(frame_width > 0.0) || ts.num_frames() < 2 {
        return None;
    }
    if t < 0.0 || t >= max_time(ts, frame_width) {
        return None;
    }

    let t1 = (t / frame_width).floor() as usize;
    let w = ((t % frame_width) / frame_width) as f32;

    let v1 = ts.frame(t1).ok()?;
    let v2 = ts.frame(t1 + 1).ok()?;
    Some(
        v1.iter()
            .zip(v2)
            .map(|(a, b)| a + (b - a) * w)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TimeSeriesBuffer;

    const FRAME_WIDTH: f64 = 2200.0;

    fn two_frame_buffer() -> TimeSeriesBuffer {
        // frame 0: [0, 10, -4], frame 1: [2, 6, 4]
        TimeSeriesBuffer::load(vec![0.0, 10.0, -4.0, 2.0, 6.0, 4.0], 2, 3).unwrap()
    }

    #[test]
    fn sample_at_zero_is_exactly_frame_zero() {
        let ts = two_frame_buffer();
        let field = sample_at(&ts, FRAME_WIDTH, 0.0).unwrap();
        assert_eq!(field, vec![0.0, 10.0, -4.0]);
    }

    #[test]
    fn sample_at_half_frame_is_the_midpoint() {
        let ts = two_frame_buffer();
        let field = sample_at(&ts, FRAME_WIDTH, 1100.0).unwrap();
        assert_eq!(field.len(), 3);
        for (got, want) in field.iter().zip([1.0, 8.0, 0.0]) {
            assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
        }
    }

    #[test]
    fn sample_past_the_last_frame_is_none() {
        let ts = two_frame_buffer();
        assert_eq!(max_time(&ts, FRAME_WIDTH), 2200.0);
        assert!(sample_at(&ts, FRAME_WIDTH, 2200.0).is_none());
        assert!(sample_at(&ts, FRAME_WIDTH, 1_799_600.0).is_none());
        assert!(sample_at(&ts, FRAME_WIDTH, -1.0).is_none());
        // just inside the domain is still defined
        assert!(sample_at(&ts, FRAME_WIDTH, 2199.9).is_some());
    }

    #[test]
    fn single_frame_buffer_has_no_samples() {
        let ts = TimeSeriesBuffer::load(vec![1.0, 2.0], 1, 2).unwrap();
        assert!(sample_at(&ts, FRAME_WIDTH, 0.0).is_none());
    }

    #[test]
    fn reference_boundary_matches_the_819_frame_dataset() {
        // 819 frames spaced 2200 apart end at t = 1_799_600.
        let ts = TimeSeriesBuffer::load(vec![0.0; 819], 819, 1).unwrap();
        assert_eq!(max_time(&ts, FRAME_WIDTH), 1_799_600.0);
        assert!(sample_at(&ts, FRAME_WIDTH, 1_799_599.0).is_some());
        assert!(sample_at(&ts, FRAME_WIDTH, 1_799_600.0).is_none());
    }
}
