pub mod power_range;
pub mod sample_format;
pub mod selection;
pub mod view_params;

pub use power_range::PowerRange;
pub use sample_format::{ByteOrder, SampleFormat};
pub use selection::{DragGesture, Selection, SelectionEvent, SelectionSummary};
pub use view_params::{
    derive_stride, ViewParameters, WindowType, MAX_FFT_SIZE, MAX_ZOOM_LEVEL, MIN_FFT_SIZE,
    MIN_ZOOM_LEVEL,
};
