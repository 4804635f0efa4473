use core::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A per-vertex scalar vector, one entry per surface vertex.
///
/// Fields are ephemeral: recomputed per time step or per seed pick and
/// replaced wholesale. Missing entries are encoded as non-finite values
/// and resolve to the fallback color when mapped.
pub type ScalarField = Vec<f32>;

/// Cortical hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Hemisphere {
    Left,
    Right,
}

impl Hemisphere {
    pub fn name(self) -> &'static str {
        match self {
            Hemisphere::Left => "left",
            Hemisphere::Right => "right",
        }
    }

    /// Stable slot index for per-hemisphere arrays.
    pub fn index(self) -> usize {
        match self {
            Hemisphere::Left => 0,
            Hemisphere::Right => 1,
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Logical dimensions of a dataset.
///
/// `row_length` is the reduced seed basis of the connectivity matrix, not
/// the vertex count. `frame_width` is the spacing between discrete time
/// frames, in the same units as the continuous time coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DatasetDims {
    pub num_vertices: usize,
    pub row_length: usize,
    pub frame_width: f64,
}

impl DatasetDims {
    /// Dimensions of the reference dataset (32k-vertex fs_LR surfaces,
    /// 818-column seed basis, 2200 time-units between frames).
    pub const REFERENCE: DatasetDims = DatasetDims {
        num_vertices: 32492,
        row_length: 818,
        frame_width: 2200.0,
    };
}

impl Default for DatasetDims {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Dense per-vertex time series for one hemisphere.
///
/// Flat row-major storage: frame `n` occupies
/// `[n * num_vertices, (n + 1) * num_vertices)`. Read-only after load and
/// cheap to share with worker threads.
#[derive(Debug, Clone)]
pub struct TimeSeriesBuffer {
    data: Arc<Vec<f32>>,
    num_frames: usize,
    num_vertices: usize,
}

impl TimeSeriesBuffer {
    pub fn load(
        data: Vec<f32>,
        num_frames: usize,
        num_vertices: usize,
    ) -> Result<Self, CoreError> {
        let expected = num_frames * num_vertices;
        if data.len() != expected {
            return Err(CoreError::ShapeMismatch {
                what: "time series",
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data: Arc::new(data),
            num_frames,
            num_vertices,
        })
    }

    /// Load a flat buffer whose frame count is derived from its length.
    pub fn from_flat(data: Vec<f32>, num_vertices: usize) -> Result<Self, CoreError> {
        if num_vertices == 0 || data.len() % num_vertices != 0 {
            return Err(CoreError::ShapeMismatch {
                what: "time series",
                expected: num_vertices.max(1),
                actual: data.len(),
            });
        }
        let num_frames = data.len() / num_vertices;
        Self::load(data, num_frames, num_vertices)
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// The per-vertex values of discrete frame `n`.
    pub fn frame(&self, n: usize) -> Result<&[f32], CoreError> {
        if n >= self.num_frames {
            return Err(CoreError::IndexOutOfRange {
                what: "frame",
                index: n,
                len: self.num_frames,
            });
        }
        let start = n * self.num_vertices;
        Ok(&self.data[start..start + self.num_vertices])
    }
}

/// Dense connectivity ("dconn") matrix for one hemisphere.
///
/// Flat row-major storage: vertex `i`'s connectivity row occupies
/// `[i * row_length, (i + 1) * row_length)`.
#[derive(Debug, Clone)]
pub struct ConnectivityBuffer {
    data: Arc<Vec<f32>>,
    num_vertices: usize,
    row_length: usize,
}

impl ConnectivityBuffer {
    pub fn load(
        data: Vec<f32>,
        num_vertices: usize,
        row_length: usize,
    ) -> Result<Self, CoreError> {
        let expected = num_vertices * row_length;
        if data.len() != expected {
            return Err(CoreError::ShapeMismatch {
                what: "connectivity",
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data: Arc::new(data),
            num_vertices,
            row_length,
        })
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn row_length(&self) -> usize {
        self.row_length
    }

    /// Vertex `i`'s connectivity row.
    pub fn row(&self, i: usize) -> Result<&[f32], CoreError> {
        if i >= self.num_vertices {
            return Err(CoreError::IndexOutOfRange {
                what: "vertex",
                index: i,
                len: self.num_vertices,
            });
        }
        let start = i * self.row_length;
        Ok(&self.data[start..start + self.row_length])
    }

    /// All rows in vertex-index order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.row_length)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_series_load_rejects_wrong_length() {
        let err = TimeSeriesBuffer::load(vec![0.0; 5], 2, 3).unwrap_err();
        match err {
            CoreError::ShapeMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, 6);
                assert_eq!(actual, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn frame_view_is_the_right_slice() {
        let ts = TimeSeriesBuffer::load(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
        assert_eq!(ts.frame(0).unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(ts.frame(1).unwrap(), &[4.0, 5.0, 6.0]);
        assert!(matches!(
            ts.frame(2),
            Err(CoreError::IndexOutOfRange { index: 2, len: 2, .. })
        ));
    }

    #[test]
    fn from_flat_derives_frame_count() {
        let ts = TimeSeriesBuffer::from_flat(vec![0.0; 12], 4).unwrap();
        assert_eq!(ts.num_frames(), 3);
        assert!(TimeSeriesBuffer::from_flat(vec![0.0; 13], 4).is_err());
        assert!(TimeSeriesBuffer::from_flat(vec![0.0; 4], 0).is_err());
    }

    #[test]
    fn connectivity_rows_are_row_major() {
        let conn = ConnectivityBuffer::load(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        assert_eq!(conn.row(0).unwrap(), &[1.0, 2.0]);
        assert_eq!(conn.row(1).unwrap(), &[3.0, 4.0]);
        assert!(conn.row(2).is_err());
        let rows: Vec<&[f32]> = conn.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], &[3.0, 4.0]);
    }
}
