//! Spectrogram engine for large raw IQ captures.
//!
//! A capture is memory-mapped and turned into display lines on demand: each
//! line is a windowed FFT of `fft_size` samples, lines are `stride` samples
//! apart, and computed lines are kept in a generation-versioned cache so a
//! change of FFT size or zoom can never surface stale rows.

pub mod coords;
pub mod data;
pub mod engine;
pub mod error;
pub mod processing;
pub mod rendering;
pub mod settings;

pub use coords::CoordinateMapper;
pub use data::{
    ByteOrder, DragGesture, PowerRange, SampleFormat, Selection, SelectionEvent, SelectionSummary,
    ViewParameters, WindowType,
};
pub use engine::{LineRequest, SpectrogramEngine, WheelModifier};
pub use error::{EngineError, EngineResult, FileErrorKind, ParamError};
pub use settings::Settings;
