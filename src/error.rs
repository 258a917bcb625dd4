//! Capture error types

use std::{io, path::PathBuf};
use thiserror::Error;

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

#[derive(Error, Debug)]
pub enum CaptureError {
    /// The capture file does not exist
    #[error("capture file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The capture file exists but could not be opened or read
    #[error("capture file unreadable: {}: {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Sample encoding name we don't know how to interpret
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Sample rate that can't scale a time axis
    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f64),

    /// Samples were requested before a successful `load()`
    #[error("IQ data not loaded yet for {}, call load() first", path.display())]
    NotLoaded { path: PathBuf },

    /// Writing a plot or capture file failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl CaptureError {
    /// Classify an open/read failure on a capture file
    pub(crate) fn from_read(path: PathBuf, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::FileUnreadable { path, source }
        }
    }
}
