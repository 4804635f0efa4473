use thiserror::Error;

/// Errors surfaced by the core. Shape mismatches are fatal at load time;
/// index errors indicate a caller bug and should be clamped upstream.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{what}: length {actual} does not match declared shape ({expected})")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("{0} buffer is not loaded")]
    NotLoaded(&'static str),

    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}
