//! # cortiview
//!
//! Data-to-color and seed-correlation core for an interactive brain-surface
//! viewer.
//!
//! The presentation layer (mesh rendering, camera, picking, GUI) lives
//! elsewhere; this crate owns the numeric pipeline: time-indexed linear
//! interpolation over dense per-vertex time series, whole-brain Pearson
//! seed correlation over dense connectivity matrices, and scalar-to-color
//! mapping through a configurable lookup table.
//!
//! ## Quick Start
//!
//! ```
//! use cortiview::prelude::*;
//!
//! // A tiny synthetic dataset: 2 vertices, connectivity rows of length 2.
//! let dims = DatasetDims { num_vertices: 2, row_length: 2, frame_width: 2200.0 };
//! let mut session = Session::new(dims);
//! session
//!     .set_connectivity(
//!         Hemisphere::Left,
//!         ConnectivityBuffer::load(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap(),
//!     )
//!     .unwrap();
//! session
//!     .set_connectivity(
//!         Hemisphere::Right,
//!         ConnectivityBuffer::load(vec![2.0, 1.0, 4.0, 3.0], 2, 2).unwrap(),
//!     )
//!     .unwrap();
//!
//! // Pick a seed; the whole-brain pass runs on a worker thread.
//! session.set_mode(Mode::Seed);
//! assert_eq!(session.pick_seed(0, Hemisphere::Left), PickOutcome::Started);
//! while !session.poll() {
//!     std::thread::sleep(std::time::Duration::from_millis(1));
//! }
//!
//! // Per-vertex colors for both hemispheres, ready for mesh attributes.
//! let (left, right) = session.colors();
//! assert_eq!(left.len(), 2);
//! assert_eq!(right.len(), 2);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): serialization support and JSON dataset manifests
//! - `parallel`: parallel correlation passes via rayon
//!
//! ## Modules
//!
//! - [`dataset`]: validated dense buffers (time series, connectivity)
//! - [`sampler`]: time-indexed linear interpolation
//! - [`correlation`]: Pearson seed correlation
//! - [`lut`]: scalar-to-color lookup table
//! - [`session`]: the context object tying it all together
//! - [`storage`]: raw buffer files and background loads

#[path = "core/error.rs"]
pub mod error;

#[path = "core/dataset.rs"]
pub mod dataset;

#[path = "core/sampler.rs"]
pub mod sampler;

#[path = "core/correlation.rs"]
pub mod correlation;

#[path = "core/lut.rs"]
pub mod lut;

#[path = "core/storage.rs"]
pub mod storage;

#[path = "core/session.rs"]
pub mod session;

#[cfg(feature = "serde")]
#[path = "core/manifest.rs"]
pub mod manifest;

/// Prelude module for convenient imports.
///
/// ```
/// use cortiview::prelude::*;
/// ```
pub mod prelude {
    pub use crate::correlation::{pearson, seed_correlation, seed_correlation_pair};
    pub use crate::dataset::{
        ConnectivityBuffer, DatasetDims, Hemisphere, ScalarField, TimeSeriesBuffer,
    };
    pub use crate::error::CoreError;
    pub use crate::lut::{Lut, Palette, FALLBACK_COLOR};
    #[cfg(feature = "serde")]
    pub use crate::manifest::Manifest;
    pub use crate::sampler::{max_time, sample_at};
    pub use crate::session::{Mode, PickOutcome, SeedSelection, Session, Status};
}
