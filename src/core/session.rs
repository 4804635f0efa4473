//! Viewer session: the explicit context object the presentation layer owns.
//!
//! Holds the four buffer slots (time series and connectivity, per
//! hemisphere), the color lookup table, the current mode and seed
//! selection, and the in-flight state for background work. No ambient
//! globals: every core operation goes through `&mut Session`.
//!
//! Seed computation runs on a worker thread under a mutual-exclusion lock.
//! The lock is held from the accepted pick until [`Session::poll`]
//! integrates the finished result, so the active field pair is always the
//! most recently completed computation and a second pick during a
//! computation is refused. There is no cancellation: once started, a
//! computation runs to completion.

use core::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use tracing::{info, warn};

use crate::correlation::seed_correlation_pair;
use crate::dataset::{
    ConnectivityBuffer, DatasetDims, Hemisphere, ScalarField, TimeSeriesBuffer,
};
use crate::error::CoreError;
use crate::lut::{Lut, Palette, DEFAULT_RESOLUTION, FALLBACK_COLOR};
use crate::sampler;
use crate::storage::{spawn_read, LoadTask};

/// Coloring mode: time scrubbing or seed correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Mode {
    Time,
    Seed,
}

impl Mode {
    /// Recommended color domain for fields produced in this mode. Applied
    /// by [`Session::set_mode`]; the Lut itself has no mode knowledge.
    pub fn default_domain(self) -> (f32, f32) {
        match self {
            Mode::Time => (-2.0, 2.0),
            Mode::Seed => (-1.0, 1.0),
        }
    }
}

/// The currently selected seed: which connectivity row drives the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSelection {
    pub vertex: usize,
    pub hemisphere: Hemisphere,
}

/// What the viewer should tell the user right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    ComputingSeed,
    SeedSelected(SeedSelection),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => f.write_str("idle"),
            Status::ComputingSeed => f.write_str("computing seed..."),
            Status::SeedSelected(sel) => {
                write!(f, "seed {} on {} selected", sel.vertex, sel.hemisphere)
            }
        }
    }
}

/// Outcome of a seed pick request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    /// Accepted; a background computation now owns the lock.
    Started,
    /// A computation is already in flight; the pick was ignored.
    Busy,
    /// Picks only apply in seed mode.
    WrongMode,
    /// One or both connectivity buffers are still unloaded.
    NotLoaded,
    /// Vertex index outside `[0, num_vertices)`; callers clamp upstream.
    OutOfRange,
}

/// Which of the four buffer slots a load targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    TimeSeries,
    Connectivity,
}

/// A load that finished with an error, reported once via
/// [`Session::take_load_failures`].
#[derive(Debug)]
pub struct LoadFailure {
    pub kind: BufferKind,
    pub hemisphere: Hemisphere,
    pub error: CoreError,
}

/// Releases the seed lock when dropped, on every exit path: normal
/// completion (after the result is installed), worker panic, or a result
/// discarded by a mode change.
struct SeedLock {
    flag: Arc<AtomicBool>,
}

impl Drop for SeedLock {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

struct SeedOutcome {
    selection: SeedSelection,
    left: ScalarField,
    right: ScalarField,
    lock: SeedLock,
}

struct PendingLoad {
    kind: BufferKind,
    hemisphere: Hemisphere,
    task: LoadTask,
}

pub struct Session {
    dims: DatasetDims,
    time_series: [Option<TimeSeriesBuffer>; 2],
    connectivity: [Option<ConnectivityBuffer>; 2],

    lut: Lut,
    mode: Mode,
    seed: Option<SeedSelection>,
    /// Most recently completed (left, right) field pair.
    active: Option<(ScalarField, ScalarField)>,

    busy: Arc<AtomicBool>,
    seed_rx: Option<mpsc::Receiver<SeedOutcome>>,
    pending_loads: Vec<PendingLoad>,
    load_failures: Vec<LoadFailure>,
}

impl Session {
    pub fn new(dims: DatasetDims) -> Self {
        let mode = Mode::Time;
        let (min_v, max_v) = mode.default_domain();
        let mut lut = Lut::new(Palette::CoolToWarm, DEFAULT_RESOLUTION);
        lut.set_domain(min_v, max_v);
        Self {
            dims,
            time_series: [None, None],
            connectivity: [None, None],
            lut,
            mode,
            seed: None,
            active: None,
            busy: Arc::new(AtomicBool::new(false)),
            seed_rx: None,
            pending_loads: Vec::new(),
            load_failures: Vec::new(),
        }
    }

    pub fn dims(&self) -> DatasetDims {
        self.dims
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn lut(&self) -> &Lut {
        &self.lut
    }

    pub fn lut_mut(&mut self) -> &mut Lut {
        &mut self.lut
    }

    pub fn seed(&self) -> Option<SeedSelection> {
        self.seed
    }

    pub fn status(&self) -> Status {
        if self.busy.load(Ordering::Acquire) {
            Status::ComputingSeed
        } else if let Some(sel) = self.seed {
            Status::SeedSelected(sel)
        } else {
            Status::Idle
        }
    }

    /// Switch modes: clears the active fields and the seed selection, drops
    /// any undelivered seed result, and resets the Lut domain to the mode
    /// default.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.seed = None;
        self.active = None;
        // an undelivered outcome still carries the lock guard; dropping the
        // channel releases it
        self.seed_rx = None;
        let (min_v, max_v) = mode.default_domain();
        self.lut.set_domain(min_v, max_v);
    }

    // ---- buffer slots -----------------------------------------------------

    pub fn set_time_series(
        &mut self,
        hemisphere: Hemisphere,
        buffer: TimeSeriesBuffer,
    ) -> Result<(), CoreError> {
        if buffer.num_vertices() != self.dims.num_vertices {
            return Err(CoreError::ShapeMismatch {
                what: "time series",
                expected: self.dims.num_vertices,
                actual: buffer.num_vertices(),
            });
        }
        self.time_series[hemisphere.index()] = Some(buffer);
        Ok(())
    }

    pub fn set_connectivity(
        &mut self,
        hemisphere: Hemisphere,
        buffer: ConnectivityBuffer,
    ) -> Result<(), CoreError> {
        if buffer.num_vertices() != self.dims.num_vertices
            || buffer.row_length() != self.dims.row_length
        {
            return Err(CoreError::ShapeMismatch {
                what: "connectivity",
                expected: self.dims.num_vertices * self.dims.row_length,
                actual: buffer.num_vertices() * buffer.row_length(),
            });
        }
        self.connectivity[hemisphere.index()] = Some(buffer);
        Ok(())
    }

    pub fn time_series_loaded(&self) -> bool {
        self.time_series.iter().all(|s| s.is_some())
    }

    pub fn connectivity_loaded(&self) -> bool {
        self.connectivity.iter().all(|s| s.is_some())
    }

    pub fn loads_pending(&self) -> usize {
        self.pending_loads.len()
    }

    /// Load failures observed since the last call.
    pub fn take_load_failures(&mut self) -> Vec<LoadFailure> {
        std::mem::take(&mut self.load_failures)
    }

    /// Start reading a buffer file on a background thread. The slot stays
    /// unloaded until [`Session::poll`] integrates the finished read.
    ///
    /// `expected_frames` sizes time-series reads (required for `.lz4`
    /// files, a cross-check otherwise); connectivity reads are sized from
    /// the dataset dims.
    pub fn begin_load(
        &mut self,
        kind: BufferKind,
        hemisphere: Hemisphere,
        path: PathBuf,
        expected_frames: Option<usize>,
    ) {
        let expected_elements = match kind {
            BufferKind::TimeSeries => expected_frames.map(|f| f * self.dims.num_vertices),
            BufferKind::Connectivity => Some(self.dims.num_vertices * self.dims.row_length),
        };
        info!(path = %path.display(), ?kind, hemisphere = %hemisphere, "load started");
        self.pending_loads.push(PendingLoad {
            kind,
            hemisphere,
            task: spawn_read(path, expected_elements),
        });
    }

    fn install(
        &mut self,
        kind: BufferKind,
        hemisphere: Hemisphere,
        data: Vec<f32>,
    ) -> Result<(), CoreError> {
        match kind {
            BufferKind::TimeSeries => {
                let buffer = TimeSeriesBuffer::from_flat(data, self.dims.num_vertices)?;
                self.set_time_series(hemisphere, buffer)
            }
            BufferKind::Connectivity => {
                let buffer =
                    ConnectivityBuffer::load(data, self.dims.num_vertices, self.dims.row_length)?;
                self.set_connectivity(hemisphere, buffer)
            }
        }
    }

    fn poll_loads(&mut self) -> bool {
        if self.pending_loads.is_empty() {
            return false;
        }
        let mut changed = false;
        let mut still_pending = Vec::new();
        for pending in std::mem::take(&mut self.pending_loads) {
            match pending.task.try_take() {
                None => still_pending.push(pending),
                Some(Ok(data)) => {
                    match self.install(pending.kind, pending.hemisphere, data) {
                        Ok(()) => {
                            info!(
                                kind = ?pending.kind,
                                hemisphere = %pending.hemisphere,
                                "load finished"
                            );
                            changed = true;
                        }
                        Err(error) => {
                            warn!(
                                kind = ?pending.kind,
                                hemisphere = %pending.hemisphere,
                                %error,
                                "load failed"
                            );
                            self.load_failures.push(LoadFailure {
                                kind: pending.kind,
                                hemisphere: pending.hemisphere,
                                error,
                            });
                        }
                    }
                }
                Some(Err(error)) => {
                    warn!(
                        kind = ?pending.kind,
                        hemisphere = %pending.hemisphere,
                        %error,
                        "load failed"
                    );
                    self.load_failures.push(LoadFailure {
                        kind: pending.kind,
                        hemisphere: pending.hemisphere,
                        error,
                    });
                }
            }
        }
        self.pending_loads.extend(still_pending);
        changed
    }

    // ---- time mode --------------------------------------------------------

    /// The last continuous time with a defined sample, if time series are
    /// loaded (taken from the left hemisphere; both are expected to match).
    pub fn max_time(&self) -> Option<f64> {
        self.time_series[0]
            .as_ref()
            .map(|ts| sampler::max_time(ts, self.dims.frame_width))
    }

    /// Sample both hemispheres at continuous time `t` and install the pair
    /// as the active fields.
    ///
    /// Returns `Ok(true)` when a new pair was installed. `Ok(false)` means
    /// `t` was outside the valid domain (the active fields are cleared, the
    /// surfaces render blank) or the session is not in time mode.
    pub fn set_time(&mut self, t: f64) -> Result<bool, CoreError> {
        if self.mode != Mode::Time {
            return Ok(false);
        }
        let left = self.time_series[0]
            .as_ref()
            .ok_or(CoreError::NotLoaded("left time series"))?;
        let right = self.time_series[1]
            .as_ref()
            .ok_or(CoreError::NotLoaded("right time series"))?;

        let width = self.dims.frame_width;
        match (
            sampler::sample_at(left, width, t),
            sampler::sample_at(right, width, t),
        ) {
            (Some(l), Some(r)) => {
                self.active = Some((l, r));
                Ok(true)
            }
            _ => {
                self.active = None;
                Ok(false)
            }
        }
    }

    // ---- seed mode --------------------------------------------------------

    /// Request a seed computation for `vertex` on `hemisphere`.
    ///
    /// On acceptance the seed lock is taken and the whole-brain correlation
    /// pass runs on a worker thread; the result lands at the next
    /// [`Session::poll`] after completion. While the lock is held further
    /// picks return [`PickOutcome::Busy`] and mutate nothing.
    pub fn pick_seed(&mut self, vertex: usize, hemisphere: Hemisphere) -> PickOutcome {
        if self.mode != Mode::Seed {
            return PickOutcome::WrongMode;
        }
        if vertex >= self.dims.num_vertices {
            warn!(vertex, limit = self.dims.num_vertices, "seed pick out of range");
            return PickOutcome::OutOfRange;
        }
        let (Some(left), Some(right)) = (&self.connectivity[0], &self.connectivity[1]) else {
            return PickOutcome::NotLoaded;
        };

        if self.busy.swap(true, Ordering::AcqRel) {
            return PickOutcome::Busy;
        }
        // lock held from here; the guard travels with the computation and
        // releases on every exit path
        let lock = SeedLock {
            flag: Arc::clone(&self.busy),
        };

        let seed_conn = match hemisphere {
            Hemisphere::Left => left,
            Hemisphere::Right => right,
        };
        let seed_row = match seed_conn.row(vertex) {
            Ok(row) => row.to_vec(),
            Err(_) => return PickOutcome::OutOfRange, // unreachable after the bound check
        };

        let selection = SeedSelection { vertex, hemisphere };
        let left = left.clone();
        let right = right.clone();
        let (tx, rx) = mpsc::channel();
        info!(vertex, hemisphere = %hemisphere, "seed computation started");
        thread::spawn(move || {
            let (l, r) = seed_correlation_pair(&seed_row, &left, &right);
            let _ = tx.send(SeedOutcome {
                selection,
                left: l,
                right: r,
                lock,
            });
        });
        self.seed_rx = Some(rx);
        PickOutcome::Started
    }

    /// Integrate finished background work: buffer loads and the seed
    /// result. Returns whether anything visible changed. Call at the render
    /// cadence.
    pub fn poll(&mut self) -> bool {
        let mut changed = self.poll_loads();

        if let Some(rx) = &self.seed_rx {
            match rx.try_recv() {
                Ok(outcome) => {
                    let SeedOutcome {
                        selection,
                        left,
                        right,
                        lock,
                    } = outcome;
                    self.seed = Some(selection);
                    self.active = Some((left, right));
                    self.seed_rx = None;
                    info!(
                        vertex = selection.vertex,
                        hemisphere = %selection.hemisphere,
                        "seed computation finished"
                    );
                    // install first, then release
                    drop(lock);
                    changed = true;
                }
                Err(mpsc::TryRecvError::Disconnected) => {
                    warn!("seed computation ended without a result");
                    self.seed_rx = None;
                }
                Err(mpsc::TryRecvError::Empty) => {}
            }
        }
        changed
    }

    // ---- output -----------------------------------------------------------

    /// The active (left, right) field pair, if any.
    pub fn active_fields(&self) -> Option<(&ScalarField, &ScalarField)> {
        self.active.as_ref().map(|(l, r)| (l, r))
    }

    /// Per-vertex colors for both hemispheres. With no active data the
    /// surfaces are blank white, matching the unloaded state.
    pub fn colors(&self) -> (Vec<[f32; 3]>, Vec<[f32; 3]>) {
        match &self.active {
            Some((l, r)) => (self.lut.map_field(l), self.lut.map_field(r)),
            None => (
                vec![FALLBACK_COLOR; self.dims.num_vertices],
                vec![FALLBACK_COLOR; self.dims.num_vertices],
            ),
        }
    }
}
