use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a capture file could not be opened.
#[derive(Debug, Error)]
pub enum FileErrorKind {
    #[error("file does not exist")]
    Missing,
    #[error("file is empty")]
    Empty,
    #[error("file ends with a partial sample ({trailing_bytes} trailing bytes)")]
    Truncated { trailing_bytes: u64 },
    #[error(transparent)]
    Unreadable(#[from] io::Error),
}

/// A rejected view or display parameter. The previous value is always kept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("FFT size {0} is not a power of two")]
    FftSizeNotPowerOfTwo(usize),
    #[error("FFT size {size} outside {min}..={max}")]
    FftSizeOutOfRange { size: usize, min: usize, max: usize },
    #[error("zoom level {level} outside {min}..={max}")]
    ZoomOutOfRange { level: i32, min: i32, max: i32 },
    #[error("sample rate must be positive, got {0}")]
    SampleRate(i64),
    #[error("power range needs min < max, got min {min} dB, max {max} dB")]
    PowerRange { min: f32, max: f32 },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot open capture {}: {reason}", path.display())]
    File {
        path: PathBuf,
        #[source]
        reason: FileErrorKind,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] ParamError),

    #[error("no capture is open")]
    NoCapture,

    #[error("read of {count} samples at {offset} exceeds capture of {total} samples")]
    ReadOutOfRange { offset: u64, count: usize, total: u64 },
}

impl EngineError {
    pub(crate) fn file(path: impl Into<PathBuf>, reason: impl Into<FileErrorKind>) -> Self {
        EngineError::File {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
