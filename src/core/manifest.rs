//! Dataset manifests: a small JSON description of where the four buffer
//! files live and what shape they have.
//!
//! ```json
//! {
//!   "data_dir": "Data/MSC01",
//!   "left": "left.dtseries",
//!   "right": "right.dtseries",
//!   "left_dconn": "left.dconn",
//!   "right_dconn": "right.dconn"
//! }
//! ```
//!
//! `dims` defaults to the reference dataset constants; `num_frames` is
//! optional and only needed to size compressed time-series reads.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::{DatasetDims, Hemisphere};
use crate::error::CoreError;
use crate::session::{BufferKind, Session};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Optional directory all four paths are resolved against.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    pub left: PathBuf,
    pub right: PathBuf,
    pub left_dconn: PathBuf,
    pub right_dconn: PathBuf,

    #[serde(default)]
    pub dims: DatasetDims,

    /// Frame count of the time series, when known up front.
    #[serde(default)]
    pub num_frames: Option<usize>,
}

impl Manifest {
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }

    /// The four `(kind, hemisphere, resolved path)` slots in load order.
    pub fn slots(&self) -> [(BufferKind, Hemisphere, PathBuf); 4] {
        [
            (
                BufferKind::TimeSeries,
                Hemisphere::Left,
                self.resolve(&self.left),
            ),
            (
                BufferKind::TimeSeries,
                Hemisphere::Right,
                self.resolve(&self.right),
            ),
            (
                BufferKind::Connectivity,
                Hemisphere::Left,
                self.resolve(&self.left_dconn),
            ),
            (
                BufferKind::Connectivity,
                Hemisphere::Right,
                self.resolve(&self.right_dconn),
            ),
        ]
    }
}

impl Session {
    /// Start background loads for all four manifest slots.
    pub fn load_manifest(&mut self, manifest: &Manifest) {
        for (kind, hemisphere, path) in manifest.slots() {
            self.begin_load(kind, hemisphere, path, manifest.num_frames);
        }
    }

    /// Load all four slots, blocking until every read has resolved.
    /// The first failure aborts the load and is returned.
    pub fn load_manifest_blocking(&mut self, manifest: &Manifest) -> Result<(), CoreError> {
        self.load_manifest(manifest);
        while self.loads_pending() > 0 {
            self.poll();
            if let Some(failure) = self.take_load_failures().into_iter().next() {
                return Err(failure.error);
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        if let Some(failure) = self.take_load_failures().into_iter().next() {
            return Err(failure.error);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_manifest_gets_reference_dims() {
        let m: Manifest = serde_json::from_str(
            r#"{
                "left": "left.dtseries",
                "right": "right.dtseries",
                "left_dconn": "left.dconn",
                "right_dconn": "right.dconn"
            }"#,
        )
        .unwrap();
        assert_eq!(m.dims, DatasetDims::REFERENCE);
        assert_eq!(m.dims.num_vertices, 32492);
        assert_eq!(m.dims.row_length, 818);
        assert!(m.num_frames.is_none());
    }

    #[test]
    fn data_dir_prefixes_every_slot() {
        let m: Manifest = serde_json::from_str(
            r#"{
                "data_dir": "Data/MSC01",
                "left": "left.dtseries",
                "right": "right.dtseries",
                "left_dconn": "left.dconn",
                "right_dconn": "right.dconn",
                "dims": { "num_vertices": 4, "row_length": 2, "frame_width": 100.0 }
            }"#,
        )
        .unwrap();
        let slots = m.slots();
        assert_eq!(slots[0].2, PathBuf::from("Data/MSC01/left.dtseries"));
        assert_eq!(slots[3].2, PathBuf::from("Data/MSC01/right.dconn"));
        assert_eq!(m.dims.num_vertices, 4);
    }

    #[test]
    fn blocking_load_through_a_session() {
        let dir = std::env::temp_dir().join(format!("cortiview_manifest_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let write = |name: &str, values: &[f32]| {
            let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            std::fs::write(dir.join(name), bytes).unwrap();
        };
        // 2 vertices, 2 frames, row length 2
        write("left.dtseries", &[0.0, 0.0, 2.0, 4.0]);
        write("right.dtseries", &[1.0, 1.0, 1.0, 1.0]);
        write("left.dconn", &[1.0, 2.0, 3.0, 4.0]);
        write("right.dconn", &[2.0, 1.0, 4.0, 3.0]);

        let m = Manifest {
            data_dir: Some(dir.clone()),
            left: "left.dtseries".into(),
            right: "right.dtseries".into(),
            left_dconn: "left.dconn".into(),
            right_dconn: "right.dconn".into(),
            dims: DatasetDims {
                num_vertices: 2,
                row_length: 2,
                frame_width: 2200.0,
            },
            num_frames: Some(2),
        };

        let mut session = Session::new(m.dims);
        session.load_manifest_blocking(&m).unwrap();
        assert!(session.time_series_loaded());
        assert!(session.connectivity_loaded());
        assert!(session.set_time(0.0).unwrap());

        std::fs::remove_dir_all(&dir).ok();
    }
}
