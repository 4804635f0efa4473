//! Raw scalar buffer loading.
//!
//! Dataset files are flat little-endian f32 blobs (`.dtseries`, `.dconn`),
//! optionally LZ4 raw-block compressed (`.lz4` extension). Compressed files
//! need the expected element count supplied externally, the block carries
//! no length of its own.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use tracing::debug;

use crate::error::CoreError;

fn bytes_to_f32_le(bytes: &[u8]) -> Result<Vec<f32>, CoreError> {
    if bytes.len() % 4 != 0 {
        return Err(CoreError::ShapeMismatch {
            what: "raw f32 buffer (bytes)",
            expected: bytes.len() - bytes.len() % 4,
            actual: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn decompress_lz4(input: &[u8], expected_elements: usize) -> Result<Vec<u8>, CoreError> {
    lz4_flex::decompress(input, expected_elements * 4)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "lz4 decompression failed").into())
}

/// Read a buffer file into a flat f32 vector.
///
/// `expected_elements` is required for `.lz4` files and otherwise only
/// cross-checked when present; shape validation proper happens at
/// [`TimeSeriesBuffer::load`](crate::dataset::TimeSeriesBuffer::load) /
/// [`ConnectivityBuffer::load`](crate::dataset::ConnectivityBuffer::load).
pub fn read_f32_file(path: &Path, expected_elements: Option<usize>) -> Result<Vec<f32>, CoreError> {
    let bytes = std::fs::read(path)?;
    let compressed = path.extension().is_some_and(|e| e == "lz4");

    let data = if compressed {
        let expected = expected_elements.ok_or_else(|| {
            CoreError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "lz4 buffer needs an expected element count",
            ))
        })?;
        bytes_to_f32_le(&decompress_lz4(&bytes, expected)?)?
    } else {
        bytes_to_f32_le(&bytes)?
    };

    if let Some(expected) = expected_elements {
        if data.len() != expected {
            return Err(CoreError::ShapeMismatch {
                what: "buffer file",
                expected,
                actual: data.len(),
            });
        }
    }
    debug!(path = %path.display(), elements = data.len(), "buffer read");
    Ok(data)
}

/// Handle for a buffer read running on a background thread.
///
/// The owning slot stays unloaded until the task resolves; poll with
/// [`try_take`](LoadTask::try_take) from the render cadence, or block with
/// [`wait`](LoadTask::wait).
pub struct LoadTask {
    rx: mpsc::Receiver<Result<Vec<f32>, CoreError>>,
}

impl LoadTask {
    /// Non-blocking: `Some` once the read finished (ok or err), `None`
    /// while still in flight. Yields at most one result.
    pub fn try_take(&self) -> Option<Result<Vec<f32>, CoreError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(CoreError::Io(io::Error::new(
                io::ErrorKind::Other,
                "loader thread terminated without a result",
            )))),
        }
    }

    /// Block until the read finishes.
    pub fn wait(self) -> Result<Vec<f32>, CoreError> {
        match self.rx.recv() {
            Ok(result) => result,
            Err(_) => Err(CoreError::Io(io::Error::new(
                io::ErrorKind::Other,
                "loader thread terminated without a result",
            ))),
        }
    }
}

/// Start reading `path` on a background thread.
pub fn spawn_read(path: PathBuf, expected_elements: Option<usize>) -> LoadTask {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = read_f32_file(&path, expected_elements);
        let _ = tx.send(result);
    });
    LoadTask { rx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, bytes: &[u8]) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("cortiview_storage_test_{name}_{}", std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    fn raw_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn raw_file_round_trips() {
        let values = [1.0f32, -2.5, 0.0, 3.25];
        let path = temp_file("raw", &raw_bytes(&values));
        let data = read_f32_file(&path, Some(4)).unwrap();
        assert_eq!(data, values);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn misaligned_file_is_a_shape_error() {
        let path = temp_file("odd", &[0u8; 7]);
        assert!(matches!(
            read_f32_file(&path, None),
            Err(CoreError::ShapeMismatch { .. })
        ));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn wrong_element_count_is_a_shape_error() {
        let path = temp_file("count", &raw_bytes(&[1.0, 2.0]));
        assert!(matches!(
            read_f32_file(&path, Some(3)),
            Err(CoreError::ShapeMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn lz4_file_round_trips() {
        let values = [0.5f32, 1.5, -4.0];
        let compressed = lz4_flex::compress(&raw_bytes(&values));
        let mut path = std::env::temp_dir();
        path.push(format!("cortiview_storage_test_lz4_{}.lz4", std::process::id()));
        std::fs::write(&path, &compressed).unwrap();

        let data = read_f32_file(&path, Some(3)).unwrap();
        assert_eq!(data, values);
        // compressed reads refuse to guess the size
        assert!(read_f32_file(&path, None).is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn background_read_resolves_through_try_take() {
        let values = [9.0f32, 8.0, 7.0];
        let path = temp_file("bg", &raw_bytes(&values));
        let task = spawn_read(path.clone(), Some(3));
        let mut spins = 0;
        let data = loop {
            if let Some(result) = task.try_take() {
                break result.unwrap();
            }
            spins += 1;
            assert!(spins < 1000, "load never resolved");
            std::thread::sleep(std::time::Duration::from_millis(2));
        };
        assert_eq!(data, values);
        std::fs::remove_file(&path).ok();
    }
}
