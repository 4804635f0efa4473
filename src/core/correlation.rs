//! Seed-based functional connectivity: Pearson correlation of a seed
//! vertex's connectivity row against every other vertex's row.
//!
//! This is the system's only long-running computation,
//! O(num_vertices * row_length) per hemisphere. The per-vertex passes are
//! embarrassingly parallel; with the `parallel` feature they run on rayon,
//! otherwise a single-threaded scalar loop is used.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use tracing::debug;

use crate::dataset::{ConnectivityBuffer, ScalarField};

/// Pearson correlation coefficient via the sum-based formula with
/// `n = x.len()`. Sums accumulate in f64.
///
/// Degenerate inputs resolve to `0.0` rather than NaN: a zero-variance
/// vector on either side zeroes the denominator, and that case is guarded
/// explicitly (a float-equality check against NaN would never fire).
pub fn pearson(x: &[f32], y: &[f32]) -> f32 {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len() as f64;

    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    let mut sum_xy = 0.0f64;
    let mut sum_x2 = 0.0f64;
    let mut sum_y2 = 0.0f64;
    for (&a, &b) in x.iter().zip(y) {
        let (a, b) = (a as f64, b as f64);
        sum_x += a;
        sum_y += b;
        sum_xy += a * b;
        sum_x2 += a * a;
        sum_y2 += b * b;
    }

    let num = n * sum_xy - sum_x * sum_y;
    let denom = ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    let r = num / denom;
    if r.is_finite() {
        r as f32
    } else {
        0.0
    }
}

/// Correlate `seed_row` against every vertex row of one hemisphere.
/// Output is one scalar per vertex, in vertex-index order.
pub fn seed_correlation(seed_row: &[f32], conn: &ConnectivityBuffer) -> ScalarField {
    #[cfg(feature = "parallel")]
    {
        conn.as_slice()
            .par_chunks_exact(conn.row_length())
            .map(|row| pearson(seed_row, row))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        conn.rows().map(|row| pearson(seed_row, row)).collect()
    }
}

/// Full whole-brain pass: correlate the seed row against both hemispheres.
/// The two passes have no data dependency on each other.
pub fn seed_correlation_pair(
    seed_row: &[f32],
    left: &ConnectivityBuffer,
    right: &ConnectivityBuffer,
) -> (ScalarField, ScalarField) {
    let started = std::time::Instant::now();

    #[cfg(feature = "parallel")]
    let (l, r) = rayon::join(
        || seed_correlation(seed_row, left),
        || seed_correlation(seed_row, right),
    );
    #[cfg(not(feature = "parallel"))]
    let (l, r) = (
        seed_correlation(seed_row, left),
        seed_correlation(seed_row, right),
    );

    debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        vertices = left.num_vertices() + right.num_vertices(),
        row_length = left.row_length(),
        "seed correlation pass"
    );
    (l, r)
}
