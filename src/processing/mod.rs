pub mod fft_engine;
pub mod line_cache;
pub mod line_worker;
pub mod sample_source;
pub mod test_signal;

pub use fft_engine::{SpectralTransform, SILENT_DB};
pub use line_cache::{Line, LineCache, LineKey};
pub use line_worker::{compute_line, silent_line, LineWorker, WorkerMessage};
pub use sample_source::Capture;
pub use test_signal::TestSignal;
